//! Collision detection and response
//!
//! Fighters are circles bouncing inside an axis-aligned box. Contacts are
//! resolved Pong-style: the bounce reorients motion, but each fighter's
//! speed is governed by its own `cur_speed`.

use glam::Vec2;
use rand::Rng;

use super::state::Fighter;
use crate::consts::*;
use crate::settings::PhysicsTuning;

/// Geometry of a resolved fighter-fighter contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal from the first fighter toward the second
    pub normal: Vec2,
    /// Approach speed along the normal before the bounce (>0 = closing)
    pub rel_normal: f32,
}

impl Contact {
    /// Impact speed used for damage, whichever way the pair was moving
    pub fn impact_speed(&self) -> f32 {
        self.rel_normal.abs()
    }

    pub fn closing(&self) -> bool {
        self.rel_normal > 0.0
    }
}

/// Mutable references to two distinct fighters
pub fn pair_mut(fighters: &mut [Fighter], i: usize, j: usize) -> (&mut Fighter, &mut Fighter) {
    debug_assert!(i < j);
    let (head, tail) = fighters.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// Keep a fighter's circle inside the arena
pub fn clamp_to_walls(f: &mut Fighter, width: f32, height: f32) {
    if f.pos.x - f.radius < 0.0 {
        f.pos.x = f.radius;
    }
    if f.pos.x + f.radius > width {
        f.pos.x = width - f.radius;
    }
    if f.pos.y - f.radius < 0.0 {
        f.pos.y = f.radius;
    }
    if f.pos.y + f.radius > height {
        f.pos.y = height - f.radius;
    }
}

/// Reflect a fighter off any wall it crossed. Returns the number of bounces.
pub fn bounce_off_walls<R: Rng + ?Sized>(
    f: &mut Fighter,
    width: f32,
    height: f32,
    tuning: &PhysicsTuning,
    rng: &mut R,
) -> u32 {
    let mut bounces = 0;

    if f.pos.x - f.radius < 0.0 {
        f.pos.x = f.radius;
        f.vel.x = f.vel.x.abs();
        bounces += 1;
        wall_speedup(f, tuning, rng);
    }
    if f.pos.x + f.radius > width {
        f.pos.x = width - f.radius;
        f.vel.x = -f.vel.x.abs();
        bounces += 1;
        wall_speedup(f, tuning, rng);
    }
    if f.pos.y - f.radius < 0.0 {
        f.pos.y = f.radius;
        f.vel.y = f.vel.y.abs();
        bounces += 1;
        wall_speedup(f, tuning, rng);
    }
    if f.pos.y + f.radius > height {
        f.pos.y = height - f.radius;
        f.vel.y = -f.vel.y.abs();
        bounces += 1;
        wall_speedup(f, tuning, rng);
    }

    bounces
}

fn wall_speedup<R: Rng + ?Sized>(f: &mut Fighter, tuning: &PhysicsTuning, rng: &mut R) {
    f.cur_speed = (f.cur_speed * tuning.wall_speedup).min(tuning.speed_cap);
    f.set_speed(f.cur_speed, rng);
}

/// Separate two overlapping fighters and bounce them if they were closing.
///
/// Returns `None` when the circles do not overlap.
pub fn resolve_contact<R: Rng + ?Sized>(
    p: &mut Fighter,
    q: &mut Fighter,
    tuning: &PhysicsTuning,
    rng: &mut R,
) -> Option<Contact> {
    let delta = q.pos - p.pos;
    let min_dist = p.radius + q.radius;
    let dist2 = delta.length_squared();
    if dist2 >= min_dist * min_dist {
        return None;
    }

    let dist = dist2.sqrt().max(1e-6);
    let normal = delta / dist;
    let tangent = normal.perp();

    // Push apart to just touching
    let half = (min_dist - dist + SEPARATION_EPSILON) * 0.5;
    p.pos -= normal * half;
    q.pos += normal * half;

    let rel_normal = (p.vel - q.vel).dot(normal);

    if rel_normal > 0.0 {
        // Equal-mass elastic bounce: swap normal components
        let p_n = p.vel.dot(normal);
        let p_t = p.vel.dot(tangent);
        let q_n = q.vel.dot(normal);
        let q_t = q.vel.dot(tangent);

        p.vel = tangent * p_t + normal * q_n;
        q.vel = tangent * q_t + normal * p_n;

        p.cur_speed = (p.cur_speed * tuning.hit_speedup).min(tuning.speed_cap);
        q.cur_speed = (q.cur_speed * tuning.hit_speedup).min(tuning.speed_cap);
        p.set_speed(p.cur_speed, rng);
        q.set_speed(q.cur_speed, rng);
    }

    Some(Contact { normal, rel_normal })
}

/// Damage multiplier from impact speed (0.6 at rest, 1.8 at twice the reference)
pub fn momentum_scale(impact_speed: f32) -> f32 {
    0.6 + 0.6 * (impact_speed / MOMENTUM_REF_SPEED).min(2.0)
}

/// Damage `attacker` deals to `defender` for one exchange. Rolls one crit.
pub fn compute_damage<R: Rng + ?Sized>(
    attacker: &Fighter,
    defender: &Fighter,
    impact_speed: f32,
    rng: &mut R,
) -> u32 {
    let mut dmg = attacker.atk as f32 * momentum_scale(impact_speed);
    dmg *= 1.0 - defender.def;
    if rng.random::<f32>() < attacker.crit {
        dmg *= CRIT_MULTIPLIER;
    }
    dmg.round().max(1.0) as u32
}

/// Roll `fighter`'s special. On a proc the whole pool is spent and the bonus
/// damage is returned.
pub fn roll_special<R: Rng + ?Sized>(
    fighter: &mut Fighter,
    chance: f32,
    now_ms: f64,
    rng: &mut R,
) -> Option<u32> {
    if fighter.special_pool == 0 || rng.random::<f32>() >= chance {
        return None;
    }
    let bonus = SPECIAL_DAMAGE_MULT.saturating_mul(fighter.special_pool);
    fighter.special_pool = 0;
    fighter.last_special_ms = Some(now_ms);
    Some(bonus)
}
