//! Fighter stats derived from drink counts
//!
//! Each attack drink costs 2 max HP and adds 1 ATK. Defense erodes slightly
//! with drinks; mass and speed follow from max HP.

use serde::{Deserialize, Serialize};

pub const BASE_HP: u32 = 500;
pub const BASE_ATK: u32 = 1;
pub const CRIT_CHANCE: f32 = 0.07;

/// Combat stats for one fighter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub max_hp: u32,
    pub atk: u32,
    /// Fractional damage reduction (0..1)
    pub def: f32,
    /// Informational only, the bounce treats everyone as equal mass
    pub mass: f32,
    /// Speed multiplier
    pub spd: f32,
    pub crit: f32,
}

/// Coerce a raw drink count to a whole number (NaN, negative, infinite → 0)
pub fn drink_count(raw: f64) -> u32 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    raw.floor().min(u32::MAX as f64) as u32
}

/// Stats for a fighter who had `drinks` attack drinks
pub fn derive_stats(drinks: f64) -> DerivedStats {
    let d = drink_count(drinks);

    let max_hp = BASE_HP.saturating_sub(d.saturating_mul(2)).max(1);
    let atk = BASE_ATK.saturating_add(d).max(1);

    // 6-25% reduction
    let def = (0.18 - 0.01 * d as f32).clamp(0.06, 0.25);

    let mass = 1.0 + max_hp as f32 / 40.0;
    let spd = (1.0 - max_hp as f32 / 120.0).clamp(0.75, 1.05);

    DerivedStats {
        max_hp,
        atk,
        def,
        mass,
        spd,
        crit: CRIT_CHANCE,
    }
}
