#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod predict;
pub mod volume;

// Helpers shared by the predictor and the demo tooling.
pub mod io;
pub mod padding;

// --- High-level re-exports -------------------------------------------------

// Main entry points: predictor + single-call helper.
pub use crate::predict::{run_predictions, InferenceMode, Prediction, VolumePredictor};

// Inputs, outputs and the model seam.
pub use crate::config::InferenceParams;
pub use crate::error::SegmentationError;
pub use crate::model::{Model, ModelError};
pub use crate::volume::{ProbabilityVolume, SlicingPlane, Volume};

// Run diagnostics returned by the predictor.
pub use crate::diagnostics::{PredictionReport, TileStats, TimingBreakdown};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use volseg::prelude::*;
/// use ndarray::{Array3, ArrayD, ArrayViewD};
///
/// # fn main() -> Result<(), SegmentationError> {
/// let volume = Array3::<f32>::zeros((64, 64, 40));
/// let predictor = VolumePredictor::new(InferenceParams::slab(64, 64, 1));
///
/// let mut model = |input: ArrayViewD<'_, f32>| -> Result<Vec<ArrayD<f32>>, ModelError> {
///     Ok(vec![input.to_owned()])
/// };
/// let prediction = predictor.predict_with_diagnostics(&mut model, volume.view())?;
/// println!(
///     "mode={} tiles={} skipped={}",
///     prediction.report.mode, prediction.report.tiles.invoked, prediction.report.tiles.skipped
/// );
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::model::{Model, ModelError};
    pub use crate::{InferenceParams, SegmentationError, SlicingPlane, VolumePredictor};
}

// --- Tiling helpers (for tools & advanced users) ---------------------------

pub mod tiling {
    pub use crate::padding::{
        pad_both_ends, pad_both_ends_patchwise, pad_tail, patchwise_padding, strip, Padding,
    };
    pub use crate::predict::patch::{axis_positions, grid_steps, patch_bounds};
    pub use crate::volume::{has_foreground, FOREGROUND_THRESHOLD};
}
