//! Simulation tick
//!
//! Advances the arena by one frame in a fixed order: radius adaptation,
//! movement, pairwise collisions, then the match-end check.

use rand::Rng;

use super::collision::{
    bounce_off_walls, clamp_to_walls, compute_damage, pair_mut, resolve_contact, roll_special,
};
use super::state::{Arena, ArenaEvent, PairKey, target_radius};
use crate::consts::*;
use crate::leaderboard;

/// Timestep actually integrated for a frame of `dt` seconds
pub fn clamp_dt(dt: f32) -> f32 {
    dt.max(0.0).min(MAX_TICK_DT)
}

/// Advance the arena by `dt` seconds (capped at `MAX_TICK_DT`).
///
/// Does nothing once the match has an outcome.
pub fn tick<R: Rng + ?Sized>(arena: &mut Arena, dt: f32, rng: &mut R) -> Vec<ArenaEvent> {
    let mut events = Vec::new();
    if arena.outcome.is_some() {
        return events;
    }

    let dt = clamp_dt(dt);
    arena.clock_ms += f64::from(dt) * 1000.0;

    adapt_radii(arena);
    move_fighters(arena, dt, rng);
    resolve_collisions(arena, rng, &mut events);

    if let Some(outcome) = leaderboard::decide(&arena.fighters, &arena.deaths) {
        log::info!(
            "Match decided at {:.0} ms: winner {}",
            arena.clock_ms,
            outcome.winner
        );
        arena.outcome = Some(outcome);
    }

    events
}

/// Ease radii toward the size the living head count allows
fn adapt_radii(arena: &mut Arena) {
    let (w, h) = (arena.width, arena.height);
    let alive_target = target_radius(arena.alive_count(), w, h);

    for f in &mut arena.fighters {
        let desired = if f.alive {
            alive_target
        } else {
            f.radius.min(DEAD_RADIUS)
        };
        f.radius += (desired - f.radius) * RADIUS_LERP;
        f.radius = f.radius.clamp(MIN_RADIUS, MAX_RADIUS);
        clamp_to_walls(f, w, h);
    }
}

fn move_fighters<R: Rng + ?Sized>(arena: &mut Arena, dt: f32, rng: &mut R) {
    let (w, h) = (arena.width, arena.height);
    let tuning = arena.tuning;

    for f in arena.fighters.iter_mut().filter(|f| f.alive) {
        f.pos += f.vel * dt;
        bounce_off_walls(f, w, h, &tuning, rng);
    }
}

fn resolve_collisions<R: Rng + ?Sized>(
    arena: &mut Arena,
    rng: &mut R,
    events: &mut Vec<ArenaEvent>,
) {
    let now = arena.clock_ms;
    let tuning = arena.tuning;
    let n = arena.fighters.len();

    for i in 0..n {
        for j in (i + 1)..n {
            let (p, q) = pair_mut(&mut arena.fighters, i, j);
            if !p.alive || !q.alive {
                continue;
            }

            let Some(contact) = resolve_contact(p, q, &tuning, rng) else {
                continue;
            };

            // Damage on any contact, closing or not, at most once per cooldown
            let key = PairKey::new(i, j);
            let ready = arena
                .cooldowns
                .get(&key)
                .is_none_or(|&last| now - last >= PAIR_COOLDOWN_MS);
            if !ready {
                continue;
            }

            let impact = contact.impact_speed();
            let mut damage_to_p = compute_damage(q, p, impact, rng);
            let mut damage_to_q = compute_damage(p, q, impact, rng);

            if let Some(bonus) = roll_special(p, tuning.special_proc_chance, now, rng) {
                log::debug!("{} unloads a special for {} bonus damage", p.label, bonus);
                damage_to_q = damage_to_q.saturating_add(bonus);
                events.push(ArenaEvent::Special { fighter: i, bonus });
            }
            if let Some(bonus) = roll_special(q, tuning.special_proc_chance, now, rng) {
                log::debug!("{} unloads a special for {} bonus damage", q.label, bonus);
                damage_to_p = damage_to_p.saturating_add(bonus);
                events.push(ArenaEvent::Special { fighter: j, bonus });
            }

            let p_down = p.take_damage(damage_to_p);
            let q_down = q.take_damage(damage_to_q);

            events.push(ArenaEvent::Clash {
                first: i,
                second: j,
                damage_to_first: damage_to_p,
                damage_to_second: damage_to_q,
                at_ms: now,
            });

            if p_down {
                log::debug!("{} knocked out by {}", p.label, q.label);
                arena.deaths.insert(i, now);
                events.push(ArenaEvent::Knockout { fighter: i, at_ms: now });
            }
            if q_down {
                log::debug!("{} knocked out by {}", q.label, p.label);
                arena.deaths.insert(j, now);
                events.push(ArenaEvent::Knockout { fighter: j, at_ms: now });
            }

            arena.cooldowns.insert(key, now);
        }
    }
}
