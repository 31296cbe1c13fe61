//! Match settings and tuning
//!
//! Persisted separately from match telemetry under its own store key.

use serde::{Deserialize, Serialize};

use crate::consts::SPEED_CAP;
use crate::error::StoreError;
use crate::persistence::Store;

/// Physics knobs copied into each arena at build time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Speed multiplier applied on every wall bounce (1.0 = no change)
    pub wall_speedup: f32,
    /// Speed multiplier applied to both fighters on a closing contact
    pub hit_speedup: f32,
    /// Global speed ceiling (pixels/s)
    pub speed_cap: f32,
    /// Chance per contact that a fighter with special drinks unloads them
    pub special_proc_chance: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            wall_speedup: 1.0,
            hit_speedup: 1.0,
            speed_cap: SPEED_CAP,
            special_proc_chance: 0.05,
        }
    }
}

/// Match settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Arena width (pixels)
    pub arena_width: f32,
    /// Arena height (pixels)
    pub arena_height: f32,

    /// RNG seed for placement and combat rolls (None = seeded from the clock)
    pub seed: Option<u64>,

    /// Countdown before a non-autostarted match begins (seconds, 0 = none)
    pub countdown_secs: u32,
    /// HUD republish interval (seconds)
    pub hud_interval_secs: f32,

    /// Extra max HP per health drink
    pub hp_per_health_drink: u32,

    pub physics: PhysicsTuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arena_width: 900.0,
            arena_height: 520.0,
            seed: None,
            countdown_secs: 3,
            hud_interval_secs: 0.125,
            hp_per_health_drink: 0,
            physics: PhysicsTuning::default(),
        }
    }
}

impl Settings {
    /// Store key
    const STORAGE_KEY: &'static str = "arena:settings";

    /// Settings with a fixed seed (replayable matches)
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Arena dimensions with a floor so sizing math never divides by zero
    pub fn arena_size(&self) -> (f32, f32) {
        (self.arena_width.max(1.0), self.arena_height.max(1.0))
    }

    /// Load settings from the store, falling back to defaults
    pub fn load(store: &dyn Store) -> Self {
        if let Some(json) = store.get_item(Self::STORAGE_KEY) {
            if let Ok(settings) = serde_json::from_str(&json) {
                log::info!("Loaded settings from store");
                return settings;
            }
            log::warn!("Stored settings unreadable, using defaults");
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to the store
    pub fn save(&self, store: &mut dyn Store) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        store.set_item(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_load_defaults_when_absent() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::with_seed(42);
        settings.countdown_secs = 0;
        settings.physics.special_proc_chance = 0.15;
        settings.save(&mut store).unwrap();

        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_corrupt_settings_fall_back() {
        let mut store = MemoryStore::new();
        store.set_item(Settings::STORAGE_KEY, "{not json").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let mut store = MemoryStore::new();
        store
            .set_item(Settings::STORAGE_KEY, r#"{"arena_width": 640.0}"#)
            .unwrap();
        let settings = Settings::load(&store);
        assert_eq!(settings.arena_width, 640.0);
        assert_eq!(settings.arena_height, 520.0);
        assert_eq!(settings.physics, PhysicsTuning::default());
    }
}
