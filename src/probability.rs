//! Live win-probability estimate
//!
//! A display-only heuristic: `score = hp%^ALPHA * atk^BETA`, normalized over
//! the living fighters and smoothed with an exponential moving average.
//! Never feeds back into the simulation.

use std::collections::HashMap;

/// Health exponent (>1 favors healthier fighters)
pub const ALPHA_HP: f64 = 1.25;
/// Attack exponent (<1 dampens extreme attack)
pub const BETA_ATK: f64 = 0.85;
/// Weight of the newest observation
pub const EMA_LAMBDA: f64 = 0.25;

/// What the estimator needs to know about one fighter
#[derive(Debug, Clone, PartialEq)]
pub struct Contender<'a> {
    pub id: &'a str,
    pub hp: u32,
    pub max_hp: u32,
    pub atk: u32,
    pub alive: bool,
}

impl Contender<'_> {
    fn standing(&self) -> bool {
        self.alive && self.max_hp > 0 && self.hp > 0
    }

    fn score(&self) -> f64 {
        let hp_pct = (self.hp as f64 / self.max_hp as f64).clamp(0.0, 1.0);
        let score = hp_pct.powf(ALPHA_HP) * (self.atk.max(1) as f64).powf(BETA_ATK);
        if score.is_finite() { score } else { 0.0 }
    }
}

/// Unsmoothed win probability per fighter id (dead fighters get 0)
pub fn instant_probabilities(contenders: &[Contender<'_>]) -> HashMap<String, f64> {
    let standing: Vec<&Contender<'_>> = contenders.iter().filter(|c| c.standing()).collect();
    let scores: Vec<f64> = standing.iter().map(|c| c.score()).collect();
    let total: f64 = scores.iter().sum();

    let mut probs: HashMap<String, f64> =
        contenders.iter().map(|c| (c.id.to_string(), 0.0)).collect();
    if total > 0.0 {
        for (c, score) in standing.iter().zip(&scores) {
            probs.insert(c.id.to_string(), score / total);
        }
    } else if !standing.is_empty() {
        // Scores collapsed: everyone still up is equally likely
        let p = 1.0 / standing.len() as f64;
        for c in &standing {
            probs.insert(c.id.to_string(), p);
        }
    }
    probs
}

/// Smoothed estimator, one per match
#[derive(Debug, Clone, Default)]
pub struct WinProbabilityEstimator {
    smoothed: HashMap<String, f64>,
}

impl WinProbabilityEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all history (new match or hp reset)
    pub fn reset(&mut self) {
        self.smoothed.clear();
    }

    /// Fold in one observation of the arena
    pub fn observe(&mut self, contenders: &[Contender<'_>]) {
        let instant = instant_probabilities(contenders);

        let mut next = HashMap::with_capacity(contenders.len());
        for c in contenders.iter().filter(|c| c.standing()) {
            let p_now = instant.get(c.id).copied().unwrap_or(0.0);
            let p_prev = self.smoothed.get(c.id).copied().unwrap_or(p_now);
            next.insert(c.id.to_string(), (1.0 - EMA_LAMBDA) * p_prev + EMA_LAMBDA * p_now);
        }

        // Knocked-out fighters drop out, so rescale what is left
        let total: f64 = next.values().sum();
        if total > 0.0 {
            for p in next.values_mut() {
                *p /= total;
            }
        }

        self.smoothed = next;
    }

    /// Smoothed probability for a fighter (0 if down or unknown)
    pub fn probability(&self, id: &str) -> f64 {
        self.smoothed.get(id).copied().unwrap_or(0.0)
    }
}
