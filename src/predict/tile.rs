//! Shared tile plumbing: model invocation, output unwrapping and checked
//! write-back into the probability accumulator.
//!
//! Every shape is verified before ndarray touches the accumulator, so a model
//! returning the wrong geometry becomes a [`TileError`] instead of a panic.

use crate::model::{primary_output, Model, ModelError, INPUT_NAME};
use ndarray::{
    Array, ArrayD, ArrayView, ArrayViewMut, Axis, Dimension, RemoveAxis, ShapeError, Slice, Zip,
};
use thiserror::Error;

/// Input layout fed to the model when `fix_orientation` is set:
/// `(batch, rows, cols, slices, channel)` → `(batch, slices, rows, cols, channel)`.
pub(crate) const TO_MODEL_ORDER: [usize; 5] = [0, 3, 1, 2, 4];
/// Inverse of [`TO_MODEL_ORDER`], applied to the model output.
pub(crate) const FROM_MODEL_ORDER: [usize; 5] = [0, 2, 3, 1, 4];

/// Failure of a single tile. Never leaves the strategy that raised it.
#[derive(Debug, Error)]
pub(crate) enum TileError {
    #[error("model invocation failed on input {input_shape:?}")]
    Model {
        input_shape: Vec<usize>,
        #[source]
        source: ModelError,
    },
    #[error("model returned no outputs")]
    NoOutput,
    #[error("expected a {expected}-d model output, got shape {shape:?}")]
    Rank { expected: usize, shape: Vec<usize> },
    #[error("model output {got:?} does not fit destination {expected:?}")]
    Shape { expected: Vec<usize>, got: Vec<usize> },
    #[error("cannot reshape tile {from:?} into {to:?}")]
    Reshape {
        from: Vec<usize>,
        to: Vec<usize>,
        #[source]
        source: ShapeError,
    },
    #[error("model produced {got} classes but only {max} are configured")]
    Classes { got: usize, max: usize },
}

/// Run one tile and return the primary output with a fixed rank.
pub(crate) fn run_tile<M, D>(model: &mut M, tile: ArrayD<f32>) -> Result<Array<f32, D>, TileError>
where
    M: Model + ?Sized,
    D: Dimension,
{
    let tile = tile.as_standard_layout();
    let outputs = model
        .invoke(&[(INPUT_NAME, tile.view())])
        .map_err(|source| TileError::Model {
            input_shape: tile.shape().to_vec(),
            source,
        })?;
    let output = primary_output(outputs).ok_or(TileError::NoOutput)?;
    let shape = output.shape().to_vec();
    output
        .into_dimensionality::<D>()
        .map_err(|_| TileError::Rank {
            expected: D::NDIM.unwrap_or(shape.len()),
            shape,
        })
}

/// First batch element of a model output.
pub(crate) fn first_batch<D>(output: Array<f32, D>) -> Result<Array<f32, D::Smaller>, TileError>
where
    D: RemoveAxis,
{
    if output.len_of(Axis(0)) == 0 {
        return Err(TileError::Shape {
            expected: vec![1],
            got: output.shape().to_vec(),
        });
    }
    Ok(output.index_axis_move(Axis(0), 0))
}

/// Combine `src` into `dst`, both laid out `(..spatial, class)`.
///
/// The spatial extents must match exactly. `src` may carry fewer classes than
/// `dst`; the remaining classes are left untouched.
pub(crate) fn merge_classes<D, F>(
    mut dst: ArrayViewMut<'_, f32, D>,
    src: ArrayView<'_, f32, D>,
    combine: F,
) -> Result<(), TileError>
where
    D: Dimension,
    F: Fn(&mut f32, f32),
{
    let class_axis = Axis(src.ndim() - 1);
    let classes = src.len_of(class_axis);
    let capacity = dst.len_of(class_axis);
    if classes > capacity {
        return Err(TileError::Classes {
            got: classes,
            max: capacity,
        });
    }
    let spatial = src.ndim() - 1;
    if src.shape()[..spatial] != dst.shape()[..spatial] {
        return Err(TileError::Shape {
            expected: dst.shape().to_vec(),
            got: src.shape().to_vec(),
        });
    }
    let target = dst.slice_axis_mut(class_axis, Slice::from(..classes));
    Zip::from(target).and(&src).for_each(|d, &s| combine(d, s));
    Ok(())
}

pub(crate) fn overwrite(d: &mut f32, s: f32) {
    *d = s;
}

pub(crate) fn keep_max(d: &mut f32, s: f32) {
    *d = d.max(s);
}

/// Full diagnostic chain of an error, outermost first.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str("\n  caused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3, Array5, Ix5, IxDyn};

    #[test]
    fn orientation_orders_are_inverse() {
        let input = Array5::<f32>::zeros((1, 6, 7, 3, 1));
        let fed = input.view().permuted_axes(TO_MODEL_ORDER);
        assert_eq!(fed.dim(), (1, 3, 6, 7, 1));
        let back = fed.permuted_axes(FROM_MODEL_ORDER);
        assert_eq!(back.dim(), (1, 6, 7, 3, 1));
    }

    #[test]
    fn merge_writes_leading_classes_only() {
        let mut dst = Array3::<f32>::zeros((2, 2, 3));
        let src = Array3::<f32>::from_elem((2, 2, 2), 0.7);
        merge_classes(dst.view_mut(), src.view(), overwrite).expect("fits");
        assert!(dst.slice(ndarray::s![.., .., ..2]).iter().all(|&v| v == 0.7));
        assert!(dst.slice(ndarray::s![.., .., 2]).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn merge_rejects_mismatched_geometry() {
        let mut dst = Array3::<f32>::zeros((2, 2, 2));
        let wide = Array3::<f32>::zeros((2, 3, 2));
        assert!(matches!(
            merge_classes(dst.view_mut(), wide.view(), overwrite),
            Err(TileError::Shape { .. })
        ));
        let many = Array3::<f32>::zeros((2, 2, 4));
        assert!(matches!(
            merge_classes(dst.view_mut(), many.view(), overwrite),
            Err(TileError::Classes { got: 4, max: 2 })
        ));
    }

    #[test]
    fn max_merge_keeps_highest_score() {
        let mut dst = Array2::<f32>::from_elem((2, 1), 0.4);
        let src = Array2::<f32>::from_shape_vec((2, 1), vec![0.9, 0.1]).expect("shape");
        merge_classes(dst.view_mut(), src.view(), keep_max).expect("fits");
        assert_eq!(dst.into_raw_vec(), vec![0.9, 0.4]);
    }

    #[test]
    fn run_tile_checks_rank_and_presence() {
        let tile = ArrayD::<f32>::zeros(IxDyn(&[1, 2, 2, 2, 1]));

        let mut echo = |input: ndarray::ArrayViewD<'_, f32>| -> Result<Vec<ArrayD<f32>>, ModelError> {
            Ok(vec![input.to_owned()])
        };
        let out = run_tile::<_, Ix5>(&mut echo, tile.clone()).expect("5-d echo");
        assert_eq!(out.dim(), (1, 2, 2, 2, 1));

        let mut flat = |input: ndarray::ArrayViewD<'_, f32>| -> Result<Vec<ArrayD<f32>>, ModelError> {
            Ok(vec![ndarray::Array1::from_iter(input.iter().copied()).into_dyn()])
        };
        assert!(matches!(
            run_tile::<_, Ix5>(&mut flat, tile.clone()),
            Err(TileError::Rank { expected: 5, .. })
        ));

        let mut silent =
            |_: ndarray::ArrayViewD<'_, f32>| -> Result<Vec<ArrayD<f32>>, ModelError> { Ok(Vec::new()) };
        assert!(matches!(
            run_tile::<_, Ix5>(&mut silent, tile),
            Err(TileError::NoOutput)
        ));
    }

    #[test]
    fn error_chain_lists_model_cause() {
        let err = TileError::Model {
            input_shape: vec![1, 2],
            source: "engine exploded".into(),
        };
        let chain = error_chain(&err);
        assert!(chain.contains("[1, 2]"));
        assert!(chain.contains("caused by: engine exploded"));
    }
}
