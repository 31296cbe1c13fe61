//! Match lifecycle
//!
//! `Idle → Building → CountingDown → Running ⇄ Paused → Ended`
//!
//! The controller is the only thing the UI talks to. The host calls
//! [`MatchController::frame`] once per animation frame; every mutation of
//! fighter state happens inside that call. The HUD, telemetry and win
//! estimate copy values out of the arena rather than holding on to fighters.

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::leaderboard::{LeaderboardRow, MatchOutcome, Winner};
use crate::persistence::Store;
use crate::platform;
use crate::probability::{Contender, WinProbabilityEstimator};
use crate::settings::Settings;
use crate::sim::{Arena, FighterSeed, RosterEntry, clamp_dt, derive_stats, drink_count, tick};
use crate::telemetry::{self, TelemetryRecorder, TelemetrySnapshot};

/// Where the current match is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// No match built yet
    Idle,
    /// Validating the roster and placing fighters
    Building,
    /// Fighters placed, waiting for the countdown
    CountingDown,
    /// Simulation advancing every frame
    Running,
    /// Simulation frozen, observation continues
    Paused,
    /// Match decided
    Ended,
}

impl MatchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPhase::Idle => "idle",
            MatchPhase::Building => "building",
            MatchPhase::CountingDown => "countdown",
            MatchPhase::Running => "running",
            MatchPhase::Paused => "paused",
            MatchPhase::Ended => "ended",
        }
    }
}

/// Read-only per-fighter projection for the scoreboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HudRow {
    pub id: String,
    pub label: String,
    pub hp: u32,
    pub max_hp: u32,
    pub atk: u32,
    pub alive: bool,
    /// Special ring is lit
    pub special_flash: bool,
}

impl HudRow {
    fn contender(&self) -> Contender<'_> {
        Contender {
            id: &self.id,
            hp: self.hp,
            max_hp: self.max_hp,
            atk: self.atk,
            alive: self.alive,
        }
    }
}

/// Everything owned by one match; dropped wholesale on the next build
#[derive(Debug)]
struct Match {
    roster: Vec<RosterEntry>,
    arena: Arena,
    telemetry: TelemetryRecorder,
}

/// Sequences setup, countdown, running, pausing and match end
pub struct MatchController {
    settings: Settings,
    store: Box<dyn Store>,
    rng: Pcg32,
    phase: MatchPhase,
    current: Option<Match>,
    /// Seconds left on the countdown
    countdown_left: f32,
    hud: Vec<HudRow>,
    /// Seconds since the HUD was last published
    hud_timer: f32,
    estimator: WinProbabilityEstimator,
}

impl MatchController {
    pub fn new(settings: Settings, store: Box<dyn Store>) -> Self {
        let seed = settings.seed.unwrap_or_else(|| platform::now_ms() as u64);
        log::info!("Arena controller ready (seed {})", seed);
        Self {
            settings,
            store,
            rng: Pcg32::seed_from_u64(seed),
            phase: MatchPhase::Idle,
            current: None,
            countdown_left: 0.0,
            hud: Vec::new(),
            hud_timer: 0.0,
            estimator: WinProbabilityEstimator::new(),
        }
    }

    /// Build a fresh match from `roster`, replacing any match in progress.
    ///
    /// Fails without touching the current match if fewer than two valid
    /// entries remain after dropping blank and duplicate ids.
    pub fn start_new_match(
        &mut self,
        roster: &[RosterEntry],
        autostart: bool,
    ) -> Result<(), SetupError> {
        let entries = valid_entries(roster);
        if entries.len() < 2 {
            log::warn!("Rejected roster: {} valid fighters", entries.len());
            return Err(SetupError::NotEnoughFighters { found: entries.len() });
        }

        self.phase = MatchPhase::Building;
        log::info!("Building match with {} fighters", entries.len());

        let seeds: Vec<FighterSeed> = entries.iter().map(|e| self.fighter_seed(e)).collect();
        let (width, height) = self.settings.arena_size();
        let arena = Arena::build(seeds, width, height, self.settings.physics, &mut self.rng);

        let started_at = platform::now_ms();
        let match_id = self.new_match_id(started_at);
        let telemetry = TelemetryRecorder::begin(match_id, started_at, &arena.fighters);

        self.current = Some(Match {
            roster: entries,
            arena,
            telemetry,
        });
        self.estimator.reset();
        self.publish_hud();

        if autostart || self.settings.countdown_secs == 0 {
            self.phase = MatchPhase::Running;
            log::info!("Match started");
        } else {
            self.phase = MatchPhase::CountingDown;
            self.countdown_left = self.settings.countdown_secs as f32;
            log::info!("Match starts in {} s", self.settings.countdown_secs);
        }
        Ok(())
    }

    /// Start or continue the simulation (skips any remaining countdown)
    pub fn resume(&mut self) -> bool {
        match self.phase {
            MatchPhase::Paused | MatchPhase::CountingDown => {
                self.phase = MatchPhase::Running;
                self.countdown_left = 0.0;
                log::info!("Resumed");
                true
            }
            _ => false,
        }
    }

    /// Flip between running and paused. Returns whether anything changed.
    pub fn toggle_run(&mut self) -> bool {
        match self.phase {
            MatchPhase::Running => {
                self.phase = MatchPhase::Paused;
                log::info!("Paused");
                true
            }
            MatchPhase::Paused => {
                self.phase = MatchPhase::Running;
                log::info!("Resumed");
                true
            }
            _ => false,
        }
    }

    /// Heal everyone to full in place. Only while running or paused.
    pub fn reset_hp(&mut self) -> bool {
        if !matches!(self.phase, MatchPhase::Running | MatchPhase::Paused) {
            return false;
        }
        let Some(m) = self.current.as_mut() else {
            return false;
        };

        m.arena.reset_hp();
        m.telemetry.rebaseline(platform::now_ms(), &m.arena.fighters);
        self.estimator.reset();
        self.publish_hud();
        log::info!("HP reset");
        true
    }

    /// Per-frame host callback (`dt` in seconds)
    pub fn frame(&mut self, dt: f32) {
        let dt = dt.max(0.0);

        match self.phase {
            MatchPhase::CountingDown => {
                self.countdown_left -= dt;
                if self.countdown_left <= 0.0 {
                    self.countdown_left = 0.0;
                    self.phase = MatchPhase::Running;
                    log::info!("Fight!");
                }
            }
            MatchPhase::Running => self.step(dt),
            _ => {}
        }

        self.hud_timer += dt;
        if self.hud_timer >= self.settings.hud_interval_secs {
            self.hud_timer = 0.0;
            self.publish_hud();
        }
    }

    fn step(&mut self, dt: f32) {
        let Some(m) = self.current.as_mut() else {
            return;
        };

        let dt = clamp_dt(dt);
        tick(&mut m.arena, dt, &mut self.rng);
        m.telemetry.advance(dt, &m.arena.fighters);

        if m.arena.outcome.is_none() {
            return;
        }

        self.phase = MatchPhase::Ended;
        let snapshot = m.telemetry.snapshot();
        if let Err(e) = telemetry::save_last_match(self.store.as_mut(), &snapshot) {
            log::warn!("Could not save match telemetry: {}", e);
        }
        self.publish_hud();
    }

    fn publish_hud(&mut self) {
        let Some(m) = self.current.as_ref() else {
            self.hud.clear();
            return;
        };

        let now = m.arena.clock_ms;
        self.hud = m
            .arena
            .fighters
            .iter()
            .map(|f| HudRow {
                id: f.id.clone(),
                label: f.label.clone(),
                hp: f.hp,
                max_hp: f.max_hp,
                atk: f.atk,
                alive: f.alive,
                special_flash: f.special_flash(now),
            })
            .collect();

        let contenders: Vec<Contender<'_>> = self.hud.iter().map(HudRow::contender).collect();
        self.estimator.observe(&contenders);
    }

    fn fighter_seed(&self, entry: &RosterEntry) -> FighterSeed {
        let mut stats = derive_stats(entry.attack_drinks);
        let bonus =
            drink_count(entry.health_drinks).saturating_mul(self.settings.hp_per_health_drink);
        stats.max_hp = stats.max_hp.saturating_add(bonus);

        FighterSeed {
            id: entry.id.trim().to_string(),
            label: entry.display_label(),
            stats,
            special_pool: drink_count(entry.special_drinks),
        }
    }

    fn new_match_id(&mut self, started_at: f64) -> String {
        const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let suffix: String = (0..6)
            .map(|_| ALPHABET[self.rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        format!("{}-{}", started_at as u64, suffix)
    }

    /// Tear down the current match
    pub fn shutdown(&mut self) {
        self.current = None;
        self.hud.clear();
        self.estimator.reset();
        self.phase = MatchPhase::Idle;
        log::info!("Arena shut down");
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == MatchPhase::Running
    }

    /// Whole seconds left on the countdown, while counting down
    pub fn countdown_remaining(&self) -> Option<u32> {
        (self.phase == MatchPhase::CountingDown).then(|| self.countdown_left.ceil() as u32)
    }

    pub fn winner(&self) -> Option<&Winner> {
        self.outcome().map(|o| &o.winner)
    }

    pub fn leaderboard(&self) -> Option<&[LeaderboardRow]> {
        self.outcome().map(|o| o.leaderboard.as_slice())
    }

    fn outcome(&self) -> Option<&MatchOutcome> {
        self.current.as_ref()?.arena.outcome.as_ref()
    }

    /// Latest published scoreboard rows
    pub fn hud(&self) -> &[HudRow] {
        &self.hud
    }

    /// Smoothed win probability as of the last HUD publish
    pub fn win_probability(&self, id: &str) -> f64 {
        self.estimator.probability(id)
    }

    /// The live arena, for renderers
    pub fn arena(&self) -> Option<&Arena> {
        self.current.as_ref().map(|m| &m.arena)
    }

    /// Roster the current match was built from (valid entries only)
    pub fn roster(&self) -> Option<&[RosterEntry]> {
        self.current.as_ref().map(|m| m.roster.as_slice())
    }

    pub fn telemetry(&self) -> Option<&TelemetryRecorder> {
        self.current.as_ref().map(|m| &m.telemetry)
    }

    /// Most recent finished match from the store
    pub fn last_match(&self) -> Option<TelemetrySnapshot> {
        telemetry::load_last_match(self.store.as_ref())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// Entries with a non-blank id, first occurrence of each id only
fn valid_entries(roster: &[RosterEntry]) -> Vec<RosterEntry> {
    let mut seen = HashSet::new();
    roster
        .iter()
        .filter(|e| {
            let id = e.id.trim();
            if id.is_empty() {
                log::warn!("Dropping roster entry with blank id");
                return false;
            }
            if !seen.insert(id.to_string()) {
                log::warn!("Dropping duplicate roster entry {}", id);
                return false;
            }
            true
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    const DT: f32 = 1.0 / 60.0;

    fn controller() -> MatchController {
        MatchController::new(Settings::with_seed(1234), Box::new(MemoryStore::new()))
    }

    fn roster() -> Vec<RosterEntry> {
        vec![
            RosterEntry::new("1", 0).with_label("@leftplayer"),
            RosterEntry::new("2", 0).with_label("@rightplayer"),
            RosterEntry::new("3", 1).with_label("@third"),
            RosterEntry::new("4", 2).with_label("@fourth"),
        ]
    }

    /// Two glass cannons in a small box: the first exchange decides it
    fn quick_duel() -> (MatchController, Vec<RosterEntry>) {
        let settings = Settings {
            arena_width: 200.0,
            arena_height: 200.0,
            ..Settings::with_seed(77)
        };
        let c = MatchController::new(settings, Box::new(MemoryStore::new()));
        let roster = vec![RosterEntry::new("a", 200), RosterEntry::new("b", 200)];
        (c, roster)
    }

    fn run_until_ended(c: &mut MatchController) {
        for _ in 0..(60 * 600) {
            c.frame(DT);
            if c.phase() == MatchPhase::Ended {
                return;
            }
        }
        panic!("match never ended");
    }

    #[test]
    fn test_rejects_short_roster() {
        let mut c = controller();
        let err = c.start_new_match(&[RosterEntry::new("solo", 0)], true).unwrap_err();
        assert_eq!(err, SetupError::NotEnoughFighters { found: 1 });
        assert_eq!(c.phase(), MatchPhase::Idle);
        assert!(c.arena().is_none());
    }

    #[test]
    fn test_blank_and_duplicate_ids_dont_count() {
        let mut c = controller();
        let roster = vec![
            RosterEntry::new("a", 0),
            RosterEntry::new("  ", 0),
            RosterEntry::new("a", 3),
        ];
        assert!(c.start_new_match(&roster, true).is_err());

        let roster = vec![
            RosterEntry::new("a", 0),
            RosterEntry::new("", 0),
            RosterEntry::new("b", 0),
        ];
        c.start_new_match(&roster, true).unwrap();
        assert_eq!(c.roster().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_setup_keeps_running_match() {
        let mut c = controller();
        c.start_new_match(&roster(), true).unwrap();
        for _ in 0..10 {
            c.frame(DT);
        }
        let clock = c.arena().unwrap().clock_ms;

        assert!(c.start_new_match(&[], true).is_err());
        assert_eq!(c.phase(), MatchPhase::Running);
        assert_eq!(c.arena().unwrap().clock_ms, clock);
        assert_eq!(c.arena().unwrap().fighters.len(), 4);
    }

    #[test]
    fn test_countdown_then_running() {
        let mut c = controller();
        c.start_new_match(&roster(), false).unwrap();
        assert_eq!(c.phase(), MatchPhase::CountingDown);
        assert_eq!(c.countdown_remaining(), Some(3));

        // Nothing moves during the countdown
        let before: Vec<_> = c.arena().unwrap().fighters.iter().map(|f| f.pos).collect();
        for _ in 0..61 {
            c.frame(DT);
        }
        let after: Vec<_> = c.arena().unwrap().fighters.iter().map(|f| f.pos).collect();
        assert_eq!(before, after);
        assert_eq!(c.countdown_remaining(), Some(2));

        // Toggling is ignored until the fight starts
        assert!(!c.toggle_run());

        for _ in 0..130 {
            c.frame(DT);
        }
        assert_eq!(c.phase(), MatchPhase::Running);
        assert_eq!(c.countdown_remaining(), None);
    }

    #[test]
    fn test_resume_skips_countdown() {
        let mut c = controller();
        c.start_new_match(&roster(), false).unwrap();
        assert!(c.resume());
        assert!(c.is_running());
        assert!(!c.resume());
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut c = controller();
        c.start_new_match(&roster(), true).unwrap();
        c.frame(DT);
        assert!(c.toggle_run());
        assert_eq!(c.phase(), MatchPhase::Paused);

        let clock = c.arena().unwrap().clock_ms;
        for _ in 0..30 {
            c.frame(DT);
        }
        assert_eq!(c.arena().unwrap().clock_ms, clock);

        assert!(c.toggle_run());
        c.frame(DT);
        assert!(c.arena().unwrap().clock_ms > clock);
    }

    #[test]
    fn test_hud_published_on_build() {
        let mut c = controller();
        assert!(c.hud().is_empty());
        c.start_new_match(&roster(), false).unwrap();

        let hud = c.hud();
        assert_eq!(hud.len(), 4);
        assert_eq!(hud[0].label, "@leftplayer");
        assert_eq!(hud[3].hp, 496);
        assert_eq!(hud[3].atk, 3);
        assert!(hud.iter().all(|r| r.alive && !r.special_flash));

        let total: f64 = hud.iter().map(|r| c.win_probability(&r.id)).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_health_drinks_bonus_is_opt_in() {
        let entry = RosterEntry::new("a", 0).with_health_drinks(5);
        let roster = vec![entry, RosterEntry::new("b", 0)];

        let mut c = controller();
        c.start_new_match(&roster, true).unwrap();
        assert_eq!(c.hud()[0].max_hp, 500);

        let settings = Settings {
            hp_per_health_drink: 2,
            ..Settings::with_seed(1)
        };
        let mut c = MatchController::new(settings, Box::new(MemoryStore::new()));
        c.start_new_match(&roster, true).unwrap();
        assert_eq!(c.hud()[0].max_hp, 510);
        assert_eq!(c.hud()[0].hp, 510);
    }

    #[test]
    fn test_match_runs_to_end_and_persists() {
        let (mut c, roster) = quick_duel();
        assert!(c.last_match().is_none());
        c.start_new_match(&roster, true).unwrap();
        run_until_ended(&mut c);

        assert!(c.winner().is_some());
        let board = c.leaderboard().unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].place, 1);
        if let Some(Winner::Fighter(label)) = c.winner() {
            assert_eq!(&board[0].label, label);
            assert!(board[0].hp > 0);
        }

        // Ended is terminal
        assert!(!c.toggle_run());
        assert!(!c.reset_hp());
        let clock = c.arena().unwrap().clock_ms;
        c.frame(DT);
        assert_eq!(c.arena().unwrap().clock_ms, clock);

        let snap = c.last_match().unwrap();
        assert_eq!(snap.fighters.len(), 2);
        let expected = snap.duration_ms / 1000 + 1;
        for series in snap.series.values() {
            assert_eq!(series.len() as u64, expected);
            assert_eq!(series[0].t, 0);
            assert!(series.windows(2).all(|w| w[1].hp <= w[0].hp));
        }

        // The HUD shows the final state with the loser at zero
        assert!(c.hud().iter().any(|r| !r.alive && r.hp == 0));
        for row in c.hud().iter().filter(|r| !r.alive) {
            assert_eq!(c.win_probability(&row.id), 0.0);
        }
    }

    #[test]
    fn test_new_match_after_end() {
        let (mut c, roster) = quick_duel();
        c.start_new_match(&roster, true).unwrap();
        run_until_ended(&mut c);
        let first_id = c.last_match().unwrap().game_id;

        c.start_new_match(&roster, true).unwrap();
        assert_eq!(c.phase(), MatchPhase::Running);
        assert!(c.winner().is_none());
        assert!(c.arena().unwrap().fighters.iter().all(|f| f.alive));

        run_until_ended(&mut c);
        assert_ne!(c.last_match().unwrap().game_id, first_id);
    }

    #[test]
    fn test_reset_hp_mid_match() {
        let mut c = controller();
        let roster: Vec<_> = roster()
            .into_iter()
            .map(|e| RosterEntry {
                attack_drinks: 60.0,
                ..e
            })
            .collect();
        c.start_new_match(&roster, true).unwrap();

        // Brawl until someone is hurt
        for _ in 0..(60 * 120) {
            c.frame(DT);
            if c.arena().unwrap().fighters.iter().any(|f| f.hp < f.max_hp) {
                break;
            }
        }
        assert!(c.arena().unwrap().fighters.iter().any(|f| f.hp < f.max_hp));
        // 380 hp outlasts the first exchange
        assert_eq!(c.phase(), MatchPhase::Running);
        assert!(c.toggle_run());

        assert!(c.reset_hp());
        assert_eq!(c.phase(), MatchPhase::Paused);

        let arena = c.arena().unwrap();
        for (i, f) in arena.fighters.iter().enumerate() {
            assert_eq!(f.hp, f.max_hp);
            assert!(f.alive);
            assert!(arena.death_time(i).is_none());
            for j in 0..arena.fighters.len() {
                assert!(arena.last_clash(i, j).is_none());
            }
            let series = c.telemetry().unwrap().series(&f.id).unwrap();
            assert_eq!(series.len(), 1);
            assert_eq!(series[0].t, 0);
            assert_eq!(series[0].hp, f.max_hp);
        }
        assert!(c.hud().iter().all(|r| r.hp == r.max_hp));
    }

    #[test]
    fn test_reset_hp_needs_a_live_match() {
        let mut c = controller();
        assert!(!c.reset_hp());
        c.start_new_match(&roster(), false).unwrap();
        assert!(!c.reset_hp());
    }

    #[test]
    fn test_shutdown_drops_match() {
        let mut c = controller();
        c.start_new_match(&roster(), true).unwrap();
        c.shutdown();
        assert_eq!(c.phase(), MatchPhase::Idle);
        assert!(c.arena().is_none());
        assert!(c.hud().is_empty());
        c.frame(DT);
        assert_eq!(c.phase(), MatchPhase::Idle);
    }
}
