//! HP-over-time telemetry
//!
//! Samples every fighter's hp once per second of match time and keeps the
//! latest finished match in the store under a single key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::persistence::Store;
use crate::sim::Fighter;

/// Store key for the most recent match
pub const LAST_GAME_KEY: &str = "arena:lastGame";

/// Time between samples (ms of match time)
pub const SAMPLE_INTERVAL_MS: u64 = 1000;

/// One point of an HP series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HpSample {
    /// Match time (ms)
    pub t: u64,
    pub hp: u32,
}

/// Fighter identity as recorded in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FighterMeta {
    pub id: String,
    pub label: String,
}

/// Everything recorded about one finished match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub game_id: String,
    /// Wall clock at match start (ms since epoch)
    pub started_at_ms: f64,
    pub duration_ms: u64,
    pub fighters: Vec<FighterMeta>,
    /// Series keyed by fighter id
    pub series: BTreeMap<String, Vec<HpSample>>,
}

/// Collects HP series for the match in progress
#[derive(Debug, Clone)]
pub struct TelemetryRecorder {
    match_id: String,
    started_at_ms: f64,
    /// Match time in whole microseconds; sampling and duration both read it
    elapsed_us: u64,
    next_sample_us: u64,
    fighters: Vec<FighterMeta>,
    /// Parallel to `fighters`
    series: Vec<Vec<HpSample>>,
}

impl TelemetryRecorder {
    /// Start recording; every series is seeded with a `(0, hp)` sample
    pub fn begin(match_id: impl Into<String>, started_at_ms: f64, fighters: &[Fighter]) -> Self {
        let mut recorder = Self {
            match_id: match_id.into(),
            started_at_ms,
            elapsed_us: 0,
            next_sample_us: SAMPLE_INTERVAL_MS * 1000,
            fighters: fighters
                .iter()
                .map(|f| FighterMeta {
                    id: f.id.clone(),
                    label: f.label.clone(),
                })
                .collect(),
            series: Vec::new(),
        };
        recorder.rebaseline(started_at_ms, fighters);
        recorder
    }

    /// Restart every series at `(0, current hp)`, keeping fighter identities
    pub fn rebaseline(&mut self, started_at_ms: f64, fighters: &[Fighter]) {
        self.started_at_ms = started_at_ms;
        self.elapsed_us = 0;
        self.next_sample_us = SAMPLE_INTERVAL_MS * 1000;
        self.series = fighters
            .iter()
            .map(|f| vec![HpSample { t: 0, hp: f.hp }])
            .collect();
    }

    /// Account for `dt` seconds of match time, sampling at each whole second
    pub fn advance(&mut self, dt: f32, fighters: &[Fighter]) {
        self.elapsed_us += (f64::from(dt.max(0.0)) * 1_000_000.0).round() as u64;

        while self.elapsed_us >= self.next_sample_us {
            let t = self.next_sample_us / 1000;
            for (series, f) in self.series.iter_mut().zip(fighters) {
                series.push(HpSample { t, hp: f.hp });
            }
            self.next_sample_us += SAMPLE_INTERVAL_MS * 1000;
        }
    }

    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    /// Match time recorded so far (ms)
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_us as f64 / 1000.0
    }

    /// Samples recorded for one fighter
    pub fn series(&self, id: &str) -> Option<&[HpSample]> {
        let idx = self.fighters.iter().position(|f| f.id == id)?;
        self.series.get(idx).map(Vec::as_slice)
    }

    /// Bundle the recording into a snapshot
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            game_id: self.match_id.clone(),
            started_at_ms: self.started_at_ms,
            duration_ms: self.elapsed_us / 1000,
            fighters: self.fighters.clone(),
            series: self
                .fighters
                .iter()
                .zip(&self.series)
                .map(|(meta, series)| (meta.id.clone(), series.clone()))
                .collect(),
        }
    }
}

/// Persist a snapshot, replacing the previous match
pub fn save_last_match(
    store: &mut dyn Store,
    snapshot: &TelemetrySnapshot,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(snapshot)?;
    store.set_item(LAST_GAME_KEY, &json)?;
    log::info!(
        "Saved match {} ({} ms, {} fighters)",
        snapshot.game_id,
        snapshot.duration_ms,
        snapshot.fighters.len()
    );
    Ok(())
}

/// The most recent finished match, if one was stored and is readable
pub fn load_last_match(store: &dyn Store) -> Option<TelemetrySnapshot> {
    let json = store.get_item(LAST_GAME_KEY)?;
    match serde_json::from_str(&json) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            log::warn!("Ignoring unreadable last match: {}", e);
            None
        }
    }
}
