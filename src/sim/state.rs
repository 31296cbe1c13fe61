//! Arena state and core simulation types
//!
//! One `Arena` holds everything a single match mutates: fighters, the pair
//! cooldown table, the death-time table and the match clock. A new match
//! builds a new `Arena` instead of patching the old one.

use std::collections::HashMap;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

use super::stats::{DerivedStats, drink_count};
use crate::consts::*;
use crate::leaderboard::MatchOutcome;
use crate::settings::PhysicsTuning;

/// One line of the roster handed over by the setup screen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: String,
    /// Display name (falls back to `id`)
    #[serde(default)]
    pub label: Option<String>,
    /// Opaque avatar handle, never read by the simulation
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "lenient_drinks")]
    pub attack_drinks: f64,
    #[serde(default, deserialize_with = "lenient_drinks")]
    pub health_drinks: f64,
    #[serde(default, deserialize_with = "lenient_drinks")]
    pub special_drinks: f64,
}

impl RosterEntry {
    pub fn new(id: impl Into<String>, attack_drinks: u32) -> Self {
        Self {
            id: id.into(),
            attack_drinks: attack_drinks as f64,
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_special_drinks(mut self, drinks: u32) -> Self {
        self.special_drinks = drinks as f64;
        self
    }

    pub fn with_health_drinks(mut self, drinks: u32) -> Self {
        self.health_drinks = drinks as f64;
        self
    }

    /// Label shown in the HUD and leaderboard
    pub fn display_label(&self) -> String {
        match self.label.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => self.id.trim().to_string(),
        }
    }
}

/// Accept numbers, numeric strings and null for drink counts
fn lenient_drinks<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    let value = Value::deserialize(deserializer)?;
    let raw = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(drink_count(raw) as f64)
}

/// Everything needed to spawn one fighter
#[derive(Debug, Clone)]
pub struct FighterSeed {
    pub id: String,
    pub label: String,
    pub stats: DerivedStats,
    pub special_pool: u32,
}

/// A fighter entity
#[derive(Debug, Clone)]
pub struct Fighter {
    pub id: String,
    pub label: String,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub hp: u32,
    pub max_hp: u32,
    pub atk: u32,
    /// Fractional damage reduction (0..1)
    pub def: f32,
    pub mass: f32,
    pub spd: f32,
    pub crit: f32,
    /// Speed the velocity is renormalized to after every bounce
    pub cur_speed: f32,
    pub alive: bool,
    /// Damage exchanges taken part in
    pub hit_count: u32,
    /// Remaining special drinks
    pub special_pool: u32,
    /// Arena clock (ms) of the last special proc
    pub last_special_ms: Option<f64>,
}

impl Fighter {
    pub fn new(seed: FighterSeed, pos: Vec2, heading: f32, radius: f32, speed: f32) -> Self {
        let stats = seed.stats;
        Self {
            id: seed.id,
            label: seed.label,
            pos,
            vel: Vec2::from_angle(heading) * speed,
            radius,
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            atk: stats.atk,
            def: stats.def,
            mass: stats.mass,
            spd: stats.spd,
            crit: stats.crit,
            cur_speed: speed,
            alive: true,
            hit_count: 0,
            special_pool: seed.special_pool,
            last_special_ms: None,
        }
    }

    /// Rescale velocity to `speed`; a stalled fighter gets a random heading
    pub fn set_speed<R: Rng + ?Sized>(&mut self, speed: f32, rng: &mut R) {
        let current = self.vel.length();
        if current < 1e-6 {
            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            self.vel = Vec2::from_angle(angle) * speed;
        } else {
            self.vel *= speed / current;
        }
    }

    /// Subtract damage, flipping `alive` the first time hp reaches zero.
    /// Returns true if this hit was the knockout.
    pub fn take_damage(&mut self, damage: u32) -> bool {
        self.hp = self.hp.saturating_sub(damage);
        self.hit_count += 1;
        if self.hp == 0 && self.alive {
            self.alive = false;
            return true;
        }
        false
    }

    /// Whether the special ring should still be lit at `now_ms`
    pub fn special_flash(&self, now_ms: f64) -> bool {
        self.last_special_ms
            .is_some_and(|t| now_ms - t < SPECIAL_FLASH_MS)
    }
}

/// Order-independent key for a pair of fighter indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey(usize, usize);

impl PairKey {
    pub fn new(a: usize, b: usize) -> Self {
        Self(a.min(b), a.max(b))
    }
}

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum ArenaEvent {
    /// A damage exchange between two fighters (indices)
    Clash {
        first: usize,
        second: usize,
        damage_to_first: u32,
        damage_to_second: u32,
        at_ms: f64,
    },
    /// A fighter unloaded its special pool
    Special { fighter: usize, bonus: u32 },
    /// A fighter's hp reached zero
    Knockout { fighter: usize, at_ms: f64 },
}

/// Radius every living fighter grows or shrinks toward
pub fn target_radius(alive: usize, width: f32, height: f32) -> f32 {
    let n = alive.max(1) as f32;
    let area = width * height * PACK_FACTOR;
    let r = (area / (n * std::f32::consts::PI)).sqrt();
    r.round().clamp(MIN_RADIUS, MAX_RADIUS)
}

/// Complete state of one match
#[derive(Debug, Clone)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub tuning: PhysicsTuning,
    /// Fighters in roster order
    pub fighters: Vec<Fighter>,
    /// Arena clock (ms of simulated time)
    pub clock_ms: f64,
    /// Set once the match is decided
    pub outcome: Option<MatchOutcome>,
    /// Last damage exchange per pair (arena clock ms)
    pub(crate) cooldowns: HashMap<PairKey, f64>,
    /// Knockout time per fighter index (arena clock ms)
    pub(crate) deaths: HashMap<usize, f64>,
}

impl Arena {
    /// Arena with fighters already placed (tests, replays)
    pub fn with_fighters(
        width: f32,
        height: f32,
        tuning: PhysicsTuning,
        fighters: Vec<Fighter>,
    ) -> Self {
        Self {
            width,
            height,
            tuning,
            fighters,
            clock_ms: 0.0,
            outcome: None,
            cooldowns: HashMap::new(),
            deaths: HashMap::new(),
        }
    }

    /// Spawn fighters at random non-overlapping positions with random headings
    pub fn build<R: Rng + ?Sized>(
        seeds: Vec<FighterSeed>,
        width: f32,
        height: f32,
        tuning: PhysicsTuning,
        rng: &mut R,
    ) -> Self {
        let r0 = target_radius(seeds.len(), width, height);
        let margin = r0 + SPAWN_MARGIN;
        let span_x = (width - margin * 2.0).max(0.0);
        let span_y = (height - margin * 2.0).max(0.0);

        let mut fighters: Vec<Fighter> = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let mut pos;
            let mut tries = 0;
            loop {
                pos = Vec2::new(
                    margin + rng.random::<f32>() * span_x,
                    margin + rng.random::<f32>() * span_y,
                );
                tries += 1;
                let overlaps = fighters.iter().any(|p| {
                    let min_dist = p.radius + r0 + SPAWN_SPACING;
                    p.pos.distance_squared(pos) < min_dist * min_dist
                });
                if !overlaps {
                    break;
                }
                if tries >= MAX_SPAWN_ATTEMPTS {
                    log::warn!(
                        "No free spot for {} after {} attempts, placing anyway",
                        seed.id,
                        tries
                    );
                    break;
                }
            }

            let heading = rng.random::<f32>() * std::f32::consts::TAU;
            let speed = (BASE_SPEED * seed.stats.spd)
                .clamp(MIN_START_SPEED, tuning.speed_cap.max(MIN_START_SPEED));
            fighters.push(Fighter::new(seed, pos, heading, r0, speed));
        }

        Self::with_fighters(width, height, tuning, fighters)
    }

    pub fn alive_count(&self) -> usize {
        self.fighters.iter().filter(|f| f.alive).count()
    }

    /// Knockout time of a fighter, if it has been knocked out
    pub fn death_time(&self, index: usize) -> Option<f64> {
        self.deaths.get(&index).copied()
    }

    /// Last damage exchange between two fighters
    pub fn last_clash(&self, a: usize, b: usize) -> Option<f64> {
        self.cooldowns.get(&PairKey::new(a, b)).copied()
    }

    /// Restore every fighter to full health in place
    pub fn reset_hp(&mut self) {
        for f in &mut self.fighters {
            f.hp = f.max_hp;
            f.alive = true;
            f.hit_count = 0;
        }
        self.cooldowns.clear();
        self.deaths.clear();
        self.outcome = None;
    }
}
