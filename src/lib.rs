//! Battle Box - A bouncing-fighter arena combat simulation
//!
//! Core modules:
//! - `sim`: Arena simulation (stats, physics, collisions, damage)
//! - `leaderboard`: Match outcome and final ranking
//! - `telemetry`: HP-over-time recording of the latest match
//! - `probability`: Smoothed live win-probability estimate
//! - `controller`: Match lifecycle (setup, countdown, run/pause, end)
//! - `persistence`: Key/value stores for the latest match and settings
//! - `platform`: Browser/native platform abstraction
//! - `settings`: Tunable configuration

pub mod controller;
pub mod error;
pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod probability;
pub mod settings;
pub mod sim;
pub mod telemetry;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use controller::{HudRow, MatchController, MatchPhase};
pub use error::{SetupError, StoreError};
pub use leaderboard::{LeaderboardRow, MatchOutcome, Winner};
pub use settings::{PhysicsTuning, Settings};
pub use telemetry::{TelemetryRecorder, TelemetrySnapshot};

/// Simulation constants
pub mod consts {
    /// Largest timestep a single tick will integrate (seconds)
    pub const MAX_TICK_DT: f32 = 0.033;

    /// Fighter speeds (pixels/s)
    pub const SPEED_MULT: f32 = 1.4;
    pub const BASE_SPEED: f32 = 250.0 * SPEED_MULT;
    pub const SPEED_CAP: f32 = 500.0 * SPEED_MULT;
    /// Slowest launch speed regardless of stats
    pub const MIN_START_SPEED: f32 = 40.0;

    /// Fighter sizing
    pub const MIN_RADIUS: f32 = 8.0;
    pub const MAX_RADIUS: f32 = 64.0;
    /// Fraction of the arena area shared out between living fighters
    pub const PACK_FACTOR: f32 = 0.25;
    /// Per-tick easing toward the target radius
    pub const RADIUS_LERP: f32 = 0.18;
    /// Knocked-out fighters shrink to this
    pub const DEAD_RADIUS: f32 = 12.0;

    /// Placement
    pub const SPAWN_MARGIN: f32 = 8.0;
    pub const SPAWN_SPACING: f32 = 6.0;
    pub const MAX_SPAWN_ATTEMPTS: u32 = 600;

    /// Contact resolution
    pub const SEPARATION_EPSILON: f32 = 0.25;
    /// Minimum time between damage exchanges for one pair (ms)
    pub const PAIR_COOLDOWN_MS: f64 = 250.0;

    /// Damage
    pub const MOMENTUM_REF_SPEED: f32 = 200.0;
    pub const CRIT_MULTIPLIER: f32 = 1.5;
    /// Bonus damage per special drink in the pool
    pub const SPECIAL_DAMAGE_MULT: u32 = 15;
    /// How long the special ring stays lit (ms)
    pub const SPECIAL_FLASH_MS: f64 = 140.0;
}
