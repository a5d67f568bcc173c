//! Volumetric predictor: picks a tiling strategy, runs the model tile by tile
//! and reassembles per-voxel class scores.
//!
//! Overview
//! - [`InferenceMode::select`] looks only at the declared model input size:
//!   three entries run the whole volume at once, two cut slabs along the
//!   slicing plane, anything else tiles 3D patches.
//! - Each strategy owns its accumulator for the duration of the run and
//!   returns it only when every tile succeeded.
//! - Any tile failure aborts the strategy. The cause is logged with its full
//!   chain and the caller receives a single mode-labelled
//!   [`SegmentationError::Inference`].
//!
//! Typical usage:
//! ```no_run
//! use volseg::{run_predictions, InferenceParams, Volume};
//! use volseg::model::ModelError;
//! use ndarray::{ArrayD, ArrayViewD};
//!
//! # fn example(volume: Volume) -> Result<(), volseg::SegmentationError> {
//! let params = InferenceParams::patch([64, 64, 64], [16, 16, 16]);
//! let mut model = |input: ArrayViewD<'_, f32>| -> Result<Vec<ArrayD<f32>>, ModelError> {
//!     Ok(vec![input.to_owned()])
//! };
//! let probabilities = run_predictions(volume.view(), &mut model, &params)?;
//! assert_eq!(&probabilities.shape()[..3], volume.shape());
//! # Ok(())
//! # }
//! ```

mod mode;
pub mod patch;
mod slab;
mod tile;
mod whole;

pub use mode::InferenceMode;

use crate::config::InferenceParams;
use crate::diagnostics::{elapsed_ms, PredictionReport, TileStats, TimingBreakdown};
use crate::error::SegmentationError;
use crate::model::Model;
use crate::padding::Padding;
use crate::volume::ProbabilityVolume;
use log::{debug, error};
use ndarray::ArrayView3;
use std::time::Instant;
use tile::error_chain;

/// What a strategy hands back on success.
pub(crate) struct StrategyOutput {
    pub probabilities: ProbabilityVolume,
    pub tiles: TileStats,
    pub padding: Padding,
    pub timings: TimingBreakdown,
}

/// Probabilities together with the run report.
#[derive(Clone, Debug)]
pub struct Prediction {
    pub probabilities: ProbabilityVolume,
    pub report: PredictionReport,
}

/// Predictor bound to a fixed set of [`InferenceParams`].
#[derive(Clone, Debug)]
pub struct VolumePredictor {
    params: InferenceParams,
    mode: InferenceMode,
}

impl VolumePredictor {
    pub fn new(params: InferenceParams) -> Self {
        let mode = InferenceMode::select(&params);
        Self { params, mode }
    }

    pub fn params(&self) -> &InferenceParams {
        &self.params
    }

    /// Strategy this predictor runs.
    pub fn mode(&self) -> InferenceMode {
        self.mode
    }

    /// Predict class scores for `volume`, shaped `volume.shape() + [classes]`.
    pub fn predict<M>(
        &self,
        model: &mut M,
        volume: ArrayView3<'_, f32>,
    ) -> Result<ProbabilityVolume, SegmentationError>
    where
        M: Model + ?Sized,
    {
        self.predict_with_diagnostics(model, volume)
            .map(|prediction| prediction.probabilities)
    }

    /// Predict and also return tile counts, padding and timings.
    pub fn predict_with_diagnostics<M>(
        &self,
        model: &mut M,
        volume: ArrayView3<'_, f32>,
    ) -> Result<Prediction, SegmentationError>
    where
        M: Model + ?Sized,
    {
        let mode = self.mode;
        self.params.validate(mode)?;
        debug!(
            "VolumePredictor::predict start shape={:?} mode={} classes={}",
            volume.shape(),
            mode,
            self.params.training_nb_classes
        );

        let total_start = Instant::now();
        let outcome = match mode {
            InferenceMode::Whole => whole::run(model, volume, &self.params),
            InferenceMode::Slab => slab::run(model, volume, &self.params),
            InferenceMode::Patch => patch::run(model, volume, &self.params),
        };
        let StrategyOutput {
            probabilities,
            tiles,
            padding,
            mut timings,
        } = outcome.map_err(|err| {
            error!(
                "Following error collected during model inference ({mode} mode):\n{}",
                error_chain(&err)
            );
            SegmentationError::Inference { mode }
        })?;
        timings.total_ms = elapsed_ms(total_start);

        let (d0, d1, d2) = volume.dim();
        let (o0, o1, o2, classes) = probabilities.dim();
        debug!(
            "VolumePredictor::predict done mode={} tiles={} skipped={} total_ms={:.3}",
            mode, tiles.invoked, tiles.skipped, timings.total_ms
        );
        Ok(Prediction {
            probabilities,
            report: PredictionReport {
                mode,
                input_shape: [d0, d1, d2],
                output_shape: [o0, o1, o2, classes],
                tiles,
                padding,
                timings,
            },
        })
    }
}

/// Run the strategy selected by `params` over `volume`.
///
/// Fails as a whole: on error no partial probabilities are returned.
pub fn run_predictions<M>(
    volume: ArrayView3<'_, f32>,
    model: &mut M,
    params: &InferenceParams,
) -> Result<ProbabilityVolume, SegmentationError>
where
    M: Model + ?Sized,
{
    VolumePredictor::new(params.clone()).predict(model, volume)
}
