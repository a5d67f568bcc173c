//! Error types surfaced by the predictor.
//!
//! Callers see exactly one error per failed run. Tile-level causes are logged
//! at the mode boundary and are not carried in the returned value.

use crate::predict::InferenceMode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SegmentationError {
    /// Settings that cannot drive the selected mode.
    #[error("invalid inference configuration: {reason}")]
    Configuration { reason: String },
    /// A strategy aborted; no partial probabilities are returned.
    #[error("Segmentation inference ({mode} mode) could not fully proceed.")]
    Inference { mode: InferenceMode },
}

impl SegmentationError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Mode that failed, when the error came from a strategy.
    pub fn mode(&self) -> Option<InferenceMode> {
        match self {
            Self::Inference { mode } => Some(*mode),
            Self::Configuration { .. } => None,
        }
    }
}
