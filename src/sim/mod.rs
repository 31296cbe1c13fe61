//! Deterministic arena simulation
//!
//! All combat logic lives here. Given the same fighters and the same seeded
//! RNG, a match replays identically:
//! - Every random roll goes through the injected `Rng`
//! - Stable iteration order (roster order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod state;
pub mod stats;
pub mod tick;

#[cfg(test)]
pub(crate) mod test_rng;

pub use collision::{Contact, compute_damage, momentum_scale, resolve_contact, roll_special};
pub use state::{Arena, ArenaEvent, Fighter, FighterSeed, PairKey, RosterEntry, target_radius};
pub use stats::{DerivedStats, derive_stats, drink_count};
pub use tick::{clamp_dt, tick};
