//! Browser bindings
//!
//! Thin `wasm-bindgen` wrapper around [`MatchController`]. Structured data
//! crosses the boundary as JSON strings.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::controller::MatchController;
use crate::persistence::LocalStore;
use crate::settings::Settings;
use crate::sim::RosterEntry;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
}

/// Position and size of one fighter for the canvas renderer
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FighterView<'a> {
    id: &'a str,
    x: f32,
    y: f32,
    radius: f32,
    alive: bool,
    special_flash: bool,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Handle owned by the page
#[wasm_bindgen]
pub struct WebArena {
    controller: MatchController,
}

#[wasm_bindgen]
impl WebArena {
    /// Arena sized to the page's canvas; other settings come from LocalStorage
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32) -> WebArena {
        let store = LocalStore;
        let settings = Settings {
            arena_width: width,
            arena_height: height,
            ..Settings::load(&store)
        };
        WebArena {
            controller: MatchController::new(settings, Box::new(store)),
        }
    }

    /// Build a match from a JSON roster array
    #[wasm_bindgen(js_name = startNewMatch)]
    pub fn start_new_match(&mut self, roster_json: &str, autostart: bool) -> Result<(), JsValue> {
        let roster: Vec<RosterEntry> =
            serde_json::from_str(roster_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.controller
            .start_new_match(&roster, autostart)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Call once per animation frame with the elapsed seconds
    pub fn frame(&mut self, dt: f32) {
        self.controller.frame(dt);
    }

    pub fn resume(&mut self) -> bool {
        self.controller.resume()
    }

    #[wasm_bindgen(js_name = togglePause)]
    pub fn toggle_pause(&mut self) -> bool {
        self.controller.toggle_run()
    }

    #[wasm_bindgen(js_name = resetHp)]
    pub fn reset_hp(&mut self) -> bool {
        self.controller.reset_hp()
    }

    pub fn shutdown(&mut self) {
        self.controller.shutdown();
    }

    pub fn phase(&self) -> String {
        self.controller.phase().as_str().to_string()
    }

    /// Whole seconds left on the countdown, if counting down
    #[wasm_bindgen(js_name = countdownRemaining)]
    pub fn countdown_remaining(&self) -> Option<u32> {
        self.controller.countdown_remaining()
    }

    #[wasm_bindgen(js_name = hudJson)]
    pub fn hud_json(&self) -> Result<String, JsValue> {
        to_json(self.controller.hud())
    }

    /// Positions for drawing the arena
    #[wasm_bindgen(js_name = fightersJson)]
    pub fn fighters_json(&self) -> Result<String, JsValue> {
        let Some(arena) = self.controller.arena() else {
            return Ok("[]".to_string());
        };
        let views: Vec<FighterView<'_>> = arena
            .fighters
            .iter()
            .map(|f| FighterView {
                id: &f.id,
                x: f.pos.x,
                y: f.pos.y,
                radius: f.radius,
                alive: f.alive,
                special_flash: f.special_flash(arena.clock_ms),
            })
            .collect();
        to_json(&views)
    }

    #[wasm_bindgen(js_name = leaderboardJson)]
    pub fn leaderboard_json(&self) -> Result<Option<String>, JsValue> {
        self.controller.leaderboard().map(to_json).transpose()
    }

    /// Winner label or "Draw", once the match has ended
    pub fn winner(&self) -> Option<String> {
        self.controller.winner().map(|w| w.to_string())
    }

    #[wasm_bindgen(js_name = lastMatchJson)]
    pub fn last_match_json(&self) -> Result<Option<String>, JsValue> {
        self.controller.last_match().as_ref().map(to_json).transpose()
    }

    #[wasm_bindgen(js_name = winProbability)]
    pub fn win_probability(&self, id: &str) -> f64 {
        self.controller.win_probability(id)
    }
}
