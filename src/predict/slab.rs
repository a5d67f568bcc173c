//! Slab strategy: 2D or thin 3D slabs along the slicing plane.
//!
//! Two tilings are supported:
//! - non-overlapping: the slicing axis is tail-padded to a multiple of the
//!   slab size and cut into contiguous chunks; each chunk is written back in
//!   full except the last padded one, which only keeps the unpadded slices.
//! - sliding window: every original slice is predicted from its own window.
//!   With a slab size of 1 the slice itself is the window and empty slices
//!   are skipped. Larger slabs pad `slab_size / 2` on both ends, centre a
//!   window on each slice, and keep only the central output slice.
//!
//! Tiles are cut with [`SlicingPlane::permutation`] into `(rows, cols,
//! slices)` order and the accumulator is viewed through the same permutation
//! on write-back.

use super::tile::{
    first_batch, merge_classes, overwrite, run_tile, TileError, FROM_MODEL_ORDER,
    TO_MODEL_ORDER,
};
use super::StrategyOutput;
use crate::config::InferenceParams;
use crate::diagnostics::{TileStats, TimingBreakdown};
use crate::model::Model;
use crate::padding::{pad_both_ends, pad_tail, Padding};
use crate::volume::{has_foreground, SlicingPlane, FOREGROUND_THRESHOLD};
use log::debug;
use ndarray::{Array, Array4, Array5, ArrayView3, Axis, Dimension, IntoDimension, Ix4, Ix5, Slice};
use std::time::Instant;

pub(crate) fn run<M>(
    model: &mut M,
    volume: ArrayView3<'_, f32>,
    params: &InferenceParams,
) -> Result<StrategyOutput, TileError>
where
    M: Model + ?Sized,
{
    let mut tiler = SlabTiler::new(model, volume, params);
    debug!(
        "slab mode: plane={} slab_size={} upper_boundary={} non_overlapping={} fix_orientation={} deep_supervision={}",
        tiler.plane,
        tiler.slab_size,
        tiler.upper_boundary,
        params.predictions_non_overlapping,
        tiler.fix_orientation,
        params.training_deep_supervision
    );

    if params.predictions_non_overlapping {
        tiler.non_overlapping(volume)?;
    } else if tiler.slab_size == 1 {
        tiler.single_slices(volume)?;
    } else {
        tiler.centered_windows(volume)?;
    }

    debug!(
        "slab mode: {} slabs invoked, {} skipped",
        tiler.tiles.invoked, tiler.tiles.skipped
    );
    Ok(tiler.finish())
}

struct SlabTiler<'m, M: ?Sized> {
    model: &'m mut M,
    plane: SlicingPlane,
    slab_size: usize,
    /// In-plane model input size `(rows, cols)`.
    axial_size: [usize; 2],
    fix_orientation: bool,
    upper_boundary: usize,
    probabilities: Array4<f32>,
    tiles: TileStats,
    padding: Padding,
    timings: TimingBreakdown,
}

impl<'m, M> SlabTiler<'m, M>
where
    M: Model + ?Sized,
{
    fn new(model: &'m mut M, volume: ArrayView3<'_, f32>, params: &InferenceParams) -> Self {
        let plane = params.slicing_plane;
        let (d0, d1, d2) = volume.dim();
        let [rows_axis, cols_axis, _] = plane.permutation();
        let axial_size = params
            .slab_axial_size()
            .unwrap_or([volume.shape()[rows_axis], volume.shape()[cols_axis]]);
        Self {
            model,
            plane,
            slab_size: params.training_slab_size,
            axial_size,
            fix_orientation: params.fix_orientation,
            upper_boundary: volume.shape()[plane.axis()],
            probabilities: Array4::zeros((d0, d1, d2, params.training_nb_classes)),
            tiles: TileStats::default(),
            padding: Padding::default(),
            timings: TimingBreakdown::default(),
        }
    }

    fn finish(self) -> StrategyOutput {
        StrategyOutput {
            probabilities: self.probabilities,
            tiles: self.tiles,
            padding: self.padding,
            timings: self.timings,
        }
    }

    fn non_overlapping(&mut self, volume: ArrayView3<'_, f32>) -> Result<(), TileError> {
        let axis = self.plane.axis();
        let slab_size = self.slab_size;

        let pad_start = Instant::now();
        let (padded, pad) = pad_tail(volume, slab_size, self.plane);
        self.padding = Padding::along(axis, 0, pad);
        self.timings.record("pad", pad_start);

        let tiles_start = Instant::now();
        let chunks = self.upper_boundary.div_ceil(slab_size);
        for chunk in 0..chunks {
            let start = chunk * slab_size;
            let end = start + slab_size;
            let slab = padded
                .slice_axis(Axis(axis), Slice::from(start..end))
                .permuted_axes(self.plane.permutation());
            let tile = slab.insert_axis(Axis(0)).insert_axis(Axis(4)).to_owned();
            let prediction = self.invoke_slab(tile)?;

            // The padded last chunk writes to the end of the axis and keeps
            // only the slices that exist in the original volume.
            let (target, kept) = if chunk + 1 == chunks && pad != 0 {
                (Slice::from(start..), slab_size - pad)
            } else {
                (Slice::from(start..end), slab_size)
            };
            let kept = kept.min(prediction.len_of(Axis(2)));
            let source = prediction.slice_axis(Axis(2), Slice::from(..kept));
            let dst = self
                .probabilities
                .slice_axis_mut(Axis(axis), target)
                .permuted_axes(self.plane.permutation_with_classes());
            merge_classes(dst, source, overwrite)?;
            self.tiles.invoked += 1;
            debug!("slab chunk {}/{} written", chunk + 1, chunks);
        }
        self.timings.record("tiles", tiles_start);
        Ok(())
    }

    fn single_slices(&mut self, volume: ArrayView3<'_, f32>) -> Result<(), TileError> {
        let axis = self.plane.axis();
        let [rows, cols] = self.axial_size;

        let tiles_start = Instant::now();
        for index in 0..self.upper_boundary {
            let slice = volume.index_axis(Axis(axis), index);
            if !has_foreground(&slice, FOREGROUND_THRESHOLD) {
                self.tiles.skipped += 1;
                continue;
            }
            let tile = reshape_tile(slice.to_owned(), (1, rows, cols, 1))?;
            let output = run_tile::<_, Ix4>(&mut *self.model, tile.into_dyn())?;
            let prediction = first_batch(output)?;
            let dst = self.probabilities.index_axis_mut(Axis(axis), index);
            merge_classes(dst, prediction.view(), overwrite)?;
            self.tiles.invoked += 1;
        }
        self.timings.record("tiles", tiles_start);
        Ok(())
    }

    fn centered_windows(&mut self, volume: ArrayView3<'_, f32>) -> Result<(), TileError> {
        let axis = self.plane.axis();
        let slab_size = self.slab_size;
        let half = slab_size / 2;
        let [rows, cols] = self.axial_size;

        let pad_start = Instant::now();
        let padded = pad_both_ends(volume, slab_size, self.plane);
        self.padding = Padding::along(axis, half, half);
        self.timings.record("pad", pad_start);

        // Original slice `index` sits at `index + half` in the padded copy,
        // which is the centre of the window starting at `index`.
        let tiles_start = Instant::now();
        for index in 0..self.upper_boundary {
            let window = padded
                .slice_axis(Axis(axis), Slice::from(index..index + slab_size))
                .permuted_axes(self.plane.permutation());
            let tile = reshape_tile(window.to_owned(), (1, rows, cols, slab_size, 1))?;
            if !has_foreground(&tile, FOREGROUND_THRESHOLD) {
                self.tiles.skipped += 1;
                continue;
            }
            let prediction = self.invoke_slab(tile)?;
            if prediction.len_of(Axis(2)) <= half {
                return Err(TileError::Shape {
                    expected: vec![rows, cols, slab_size],
                    got: prediction.shape().to_vec(),
                });
            }
            let central = prediction.index_axis(Axis(2), half);
            let dst = self.probabilities.index_axis_mut(Axis(axis), index);
            merge_classes(dst, central, overwrite)?;
            self.tiles.invoked += 1;
        }
        self.timings.record("tiles", tiles_start);
        Ok(())
    }

    /// Run a `(1, rows, cols, slices, 1)` tile and return `(rows, cols, slices, classes)`.
    fn invoke_slab(&mut self, tile: Array5<f32>) -> Result<Array4<f32>, TileError> {
        let tile = if self.fix_orientation {
            tile.permuted_axes(TO_MODEL_ORDER)
        } else {
            tile
        };
        let mut output = run_tile::<_, Ix5>(&mut *self.model, tile.into_dyn())?;
        if self.fix_orientation {
            output = output.permuted_axes(FROM_MODEL_ORDER);
        }
        first_batch(output)
    }
}

/// Reshape a tile in row-major order, as the model expects it.
fn reshape_tile<D, E>(tile: Array<f32, D>, shape: E) -> Result<Array<f32, E::Dim>, TileError>
where
    D: Dimension,
    E: IntoDimension,
{
    let shape = shape.into_dimension();
    let from = tile.shape().to_vec();
    tile.as_standard_layout()
        .into_owned()
        .into_shape(shape.clone())
        .map_err(|source| TileError::Reshape {
            from,
            to: shape.slice().to_vec(),
            source,
        })
}
