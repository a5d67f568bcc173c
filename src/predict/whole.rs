//! Whole-volume strategy: one model call over the entire volume.

use super::tile::{first_batch, merge_classes, overwrite, run_tile, TileError};
use super::StrategyOutput;
use crate::config::InferenceParams;
use crate::diagnostics::{TileStats, TimingBreakdown};
use crate::model::Model;
use crate::padding::Padding;
use log::debug;
use ndarray::{Array4, ArrayView3, Axis, Ix5};
use std::time::Instant;

pub(crate) fn run<M>(
    model: &mut M,
    volume: ArrayView3<'_, f32>,
    params: &InferenceParams,
) -> Result<StrategyOutput, TileError>
where
    M: Model + ?Sized,
{
    let (d0, d1, d2) = volume.dim();
    debug!("whole mode: single call over volume {:?}", volume.shape());
    let mut timings = TimingBreakdown::default();

    let start = Instant::now();
    let tile = volume
        .insert_axis(Axis(0))
        .insert_axis(Axis(4))
        .to_owned()
        .into_dyn();
    let prediction = first_batch(run_tile::<_, Ix5>(model, tile)?)?;

    let mut probabilities = Array4::<f32>::zeros((d0, d1, d2, params.training_nb_classes));
    merge_classes(probabilities.view_mut(), prediction.view(), overwrite)?;
    timings.record("tiles", start);

    Ok(StrategyOutput {
        probabilities,
        tiles: TileStats {
            invoked: 1,
            skipped: 0,
        },
        padding: Padding::default(),
        timings,
    })
}
