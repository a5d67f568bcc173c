//! Patch strategy: overlapping 3D patches merged by element-wise maximum.
//!
//! The volume is first grown so every axis holds at least one patch. Patches
//! start every `patch - offset` voxels. A patch running past the far edge is
//! shifted back to sit flush against it; if the shift would move it before
//! the origin the patch is dropped. Overlapping predictions keep the highest
//! score, so the result does not depend on the visiting order.

use super::tile::{first_batch, keep_max, merge_classes, run_tile, TileError};
use super::StrategyOutput;
use crate::config::InferenceParams;
use crate::diagnostics::{TileStats, TimingBreakdown};
use crate::model::Model;
use crate::padding::{pad_both_ends_patchwise, strip};
use log::debug;
use ndarray::{s, Array4, ArrayView3, Axis, Ix5};
use std::ops::Range;
use std::time::Instant;

/// Voxel range covered by patch `index` along an axis of length `extent`.
///
/// Returns `None` when even a shifted patch does not fit.
pub fn patch_bounds(index: usize, patch: usize, offset: usize, extent: usize) -> Option<Range<usize>> {
    let start = index * patch.saturating_sub(offset);
    let end = start + patch;
    if end < extent {
        return Some(start..end);
    }
    let overflow = end - extent;
    if overflow > start {
        return None;
    }
    Some(start - overflow..end - overflow)
}

/// Number of patch positions visited along an axis: `ceil(extent / stride)`.
pub fn grid_steps(extent: usize, patch: usize, offset: usize) -> usize {
    extent.div_ceil(patch.saturating_sub(offset).max(1))
}

/// Every position visited along an axis; `None` marks a dropped patch.
pub fn axis_positions(extent: usize, patch: usize, offset: usize) -> Vec<Option<Range<usize>>> {
    (0..grid_steps(extent, patch, offset))
        .map(|index| patch_bounds(index, patch, offset, extent))
        .collect()
}

pub(crate) fn run<M>(
    model: &mut M,
    volume: ArrayView3<'_, f32>,
    params: &InferenceParams,
) -> Result<StrategyOutput, TileError>
where
    M: Model + ?Sized,
{
    let patch_size = params.training_patch_size;
    let patch_offset = params.training_patch_offset;
    debug!(
        "patch mode: volume={:?} patch={:?} offset={:?}",
        volume.shape(),
        patch_size,
        patch_offset
    );
    let mut timings = TimingBreakdown::default();
    let mut tiles = TileStats::default();

    let pad_start = Instant::now();
    let (padded, padding) = pad_both_ends_patchwise(volume, patch_size);
    timings.record("pad", pad_start);

    let (p0, p1, p2) = padded.dim();
    let mut accumulator = Array4::<f32>::zeros((p0, p1, p2, params.training_nb_classes));
    let [xs, ys, zs] =
        [0, 1, 2].map(|a| axis_positions(padded.shape()[a], patch_size[a], patch_offset[a]));

    let tiles_start = Instant::now();
    for bx in &xs {
        for by in &ys {
            for bz in &zs {
                let (Some(rx), Some(ry), Some(rz)) = (bx, by, bz) else {
                    tiles.skipped += 1;
                    continue;
                };
                let tile = padded
                    .slice(s![rx.clone(), ry.clone(), rz.clone()])
                    .insert_axis(Axis(0))
                    .insert_axis(Axis(4))
                    .to_owned()
                    .into_dyn();
                let prediction = first_batch(run_tile::<_, Ix5>(&mut *model, tile)?)?;
                let dst = accumulator.slice_mut(s![rx.clone(), ry.clone(), rz.clone(), ..]);
                merge_classes(dst, prediction.view(), keep_max)?;
                tiles.invoked += 1;
            }
        }
    }
    timings.record("tiles", tiles_start);
    debug!(
        "patch mode: {} patches invoked, {} dropped",
        tiles.invoked, tiles.skipped
    );

    let strip_start = Instant::now();
    let probabilities = strip(accumulator.view(), &padding);
    timings.record("strip", strip_start);

    Ok(StrategyOutput {
        probabilities,
        tiles,
        padding,
        timings,
    })
}
