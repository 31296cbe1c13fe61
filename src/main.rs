//! Battle Box entry point
//!
//! Native: runs one headless match with the default roster and logs the
//! result. The browser build is driven through `web::WebArena` instead.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use battle_box::persistence::FileStore;
    use battle_box::sim::RosterEntry;
    use battle_box::{MatchController, MatchPhase, Settings};

    /// 60 fps frame budget
    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Give up after ten minutes of match time
    const MAX_FRAMES: u32 = 60 * 600;

    env_logger::init();
    log::info!("Battle Box (native) starting...");

    let store = FileStore::new(std::env::temp_dir().join("battle-box"));
    let mut settings = Settings::load(&store);
    if let Some(seed) = std::env::args().nth(1).and_then(|s| s.parse().ok()) {
        settings.seed = Some(seed);
    }

    let roster = vec![
        RosterEntry::new("1", 0).with_label("@leftplayer"),
        RosterEntry::new("2", 0).with_label("@rightplayer"),
        RosterEntry::new("3", 1).with_label("@third"),
        RosterEntry::new("4", 2).with_label("@fourth"),
    ];

    let mut controller = MatchController::new(settings, Box::new(store));
    if let Err(e) = controller.start_new_match(&roster, true) {
        log::error!("Could not start match: {}", e);
        return;
    }

    let mut frames = 0;
    while controller.phase() != MatchPhase::Ended && frames < MAX_FRAMES {
        controller.frame(FRAME_DT);
        frames += 1;
    }

    let Some(winner) = controller.winner() else {
        log::warn!("No result after {} frames", frames);
        return;
    };
    log::info!("Winner: {}", winner);
    for row in controller.leaderboard().unwrap_or_default() {
        log::info!("  #{} {} (hp {}, atk {})", row.place, row.label, row.hp, row.atk);
    }

    if let Some(snapshot) = controller.last_match() {
        log::info!(
            "Match {} lasted {:.1} s, {} samples per fighter",
            snapshot.game_id,
            snapshot.duration_ms as f64 / 1000.0,
            snapshot.series.values().next().map_or(0, Vec::len)
        );
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::start, this is just to satisfy the compiler
}
