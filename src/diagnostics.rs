//! Run diagnostics returned next to the probability volume.
//!
//! [`PredictionReport`] records which strategy ran, how many tiles reached the
//! model, how many were skipped and how long each phase took. It serializes
//! to camelCase JSON for the demo tooling.

use crate::padding::Padding;
use crate::predict::InferenceMode;
use serde::Serialize;
use std::time::Instant;

/// Timing entry for a single phase of a run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

/// Aggregated timings; `total_ms` covers the whole run.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn push(&mut self, label: impl Into<String>, elapsed_ms: f64) {
        self.stages.push(StageTiming {
            label: label.into(),
            elapsed_ms,
        });
    }

    /// Record the time elapsed since `start` under `label`.
    pub fn record(&mut self, label: impl Into<String>, start: Instant) {
        self.push(label, elapsed_ms(start));
    }

    pub fn stage_ms(&self, label: &str) -> Option<f64> {
        self.stages
            .iter()
            .find(|stage| stage.label == label)
            .map(|stage| stage.elapsed_ms)
    }
}

/// Tile counters kept by every strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileStats {
    /// Tiles passed to the model.
    pub invoked: usize,
    /// Tiles skipped as empty background or out-of-bounds patches.
    pub skipped: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionReport {
    pub mode: InferenceMode,
    pub input_shape: [usize; 3],
    pub output_shape: [usize; 4],
    pub tiles: TileStats,
    /// Padding applied to the working copy before tiling.
    pub padding: Padding,
    pub timings: TimingBreakdown,
}

pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
