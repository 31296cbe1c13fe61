//! Match outcome and final ranking
//!
//! The survivor (if any) takes first place; everyone else is ranked by
//! knockout time, most recent first.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sim::Fighter;

/// Who won
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    /// Label of the last fighter standing
    Fighter(String),
    /// The final fighters knocked each other out in the same exchange
    Draw,
}

impl Winner {
    pub fn as_str(&self) -> &str {
        match self {
            Winner::Fighter(label) => label,
            Winner::Draw => "Draw",
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    /// 1-indexed
    pub place: usize,
    pub id: String,
    pub label: String,
    pub hp: u32,
    pub atk: u32,
}

impl LeaderboardRow {
    fn new(place: usize, f: &Fighter) -> Self {
        Self {
            place,
            id: f.id.clone(),
            label: f.label.clone(),
            hp: f.hp,
            atk: f.atk,
        }
    }
}

/// Final result of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub winner: Winner,
    pub leaderboard: Vec<LeaderboardRow>,
}

/// Decide the match, or `None` while two or more fighters are still up.
///
/// `deaths` maps fighter index to knockout time. Fighters knocked out at the
/// same instant keep roster order.
pub fn decide(fighters: &[Fighter], deaths: &HashMap<usize, f64>) -> Option<MatchOutcome> {
    let alive: Vec<usize> = (0..fighters.len()).filter(|&i| fighters[i].alive).collect();

    if alive.len() > 1 || fighters.is_empty() {
        return None;
    }

    let mut eliminated: Vec<usize> = (0..fighters.len()).filter(|&i| !fighters[i].alive).collect();
    // Most recent knockout first
    eliminated.sort_by(|&a, &b| {
        let ta = deaths.get(&a).copied().unwrap_or(f64::NEG_INFINITY);
        let tb = deaths.get(&b).copied().unwrap_or(f64::NEG_INFINITY);
        tb.total_cmp(&ta)
    });

    let (winner, ranking) = match alive.first() {
        Some(&survivor) => {
            let mut ranking = vec![survivor];
            ranking.extend(eliminated);
            (Winner::Fighter(fighters[survivor].label.clone()), ranking)
        }
        None => (Winner::Draw, eliminated),
    };

    let leaderboard = ranking
        .iter()
        .enumerate()
        .map(|(i, &idx)| LeaderboardRow::new(i + 1, &fighters[idx]))
        .collect();

    Some(MatchOutcome { winner, leaderboard })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::FighterSeed;
    use crate::sim::stats::derive_stats;
    use glam::Vec2;

    fn roster(n: usize) -> Vec<Fighter> {
        (0..n)
            .map(|i| {
                let seed = FighterSeed {
                    id: format!("id{i}"),
                    label: format!("P{i}"),
                    stats: derive_stats(i as f64),
                    special_pool: 0,
                };
                Fighter::new(seed, Vec2::ZERO, 0.0, 10.0, 100.0)
            })
            .collect()
    }

    fn knock_out(fighters: &mut [Fighter], deaths: &mut HashMap<usize, f64>, i: usize, at: f64) {
        fighters[i].take_damage(u32::MAX);
        deaths.insert(i, at);
    }

    #[test]
    fn test_undecided_while_two_alive() {
        let mut fighters = roster(3);
        let mut deaths = HashMap::new();
        assert!(decide(&fighters, &deaths).is_none());
        knock_out(&mut fighters, &mut deaths, 0, 10.0);
        assert!(decide(&fighters, &deaths).is_none());
    }

    #[test]
    fn test_survivor_wins() {
        let mut fighters = roster(4);
        let mut deaths = HashMap::new();
        knock_out(&mut fighters, &mut deaths, 1, 100.0);
        knock_out(&mut fighters, &mut deaths, 3, 300.0);
        knock_out(&mut fighters, &mut deaths, 0, 200.0);

        let outcome = decide(&fighters, &deaths).unwrap();
        assert_eq!(outcome.winner, Winner::Fighter("P2".into()));
        let order: Vec<_> = outcome.leaderboard.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(order, ["P2", "P3", "P0", "P1"]);
        let places: Vec<_> = outcome.leaderboard.iter().map(|r| r.place).collect();
        assert_eq!(places, [1, 2, 3, 4]);
    }

    #[test]
    fn test_mutual_knockout_is_draw() {
        let mut fighters = roster(3);
        let mut deaths = HashMap::new();
        knock_out(&mut fighters, &mut deaths, 2, 50.0);
        knock_out(&mut fighters, &mut deaths, 0, 900.0);
        knock_out(&mut fighters, &mut deaths, 1, 900.0);

        let outcome = decide(&fighters, &deaths).unwrap();
        assert_eq!(outcome.winner, Winner::Draw);
        assert_eq!(outcome.winner.to_string(), "Draw");
        let order: Vec<_> = outcome.leaderboard.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, ["id0", "id1", "id2"]);
    }

    #[test]
    fn test_empty_roster_is_undecided() {
        assert!(decide(&[], &HashMap::new()).is_none());
    }
}
