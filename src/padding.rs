//! Zero-fill padding used to make a volume tileable.
//!
//! All helpers are pure: they return a new padded working copy and leave the
//! input untouched. The amounts applied are reported as a [`Padding`] so the
//! caller can strip them from the reconstructed probabilities afterwards.
//!
//! - [`pad_tail`]: trailing pad along the slicing axis up to a multiple of
//!   the slab size (non-overlapping slab tiling).
//! - [`pad_both_ends`]: `slab_size / 2` slices on each end of the slicing axis
//!   so every original slice can sit at the centre of a window.
//! - [`pad_both_ends_patchwise`]: symmetric pad on every axis shorter than the
//!   patch (patch tiling).

use crate::volume::{ProbabilityVolume, SlicingPlane, Volume};
use ndarray::{s, Array3, ArrayView3, ArrayView4};
use serde::Serialize;

/// Per-end padding amounts for the three spatial axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Padding {
    pub leading: [usize; 3],
    pub trailing: [usize; 3],
}

impl Padding {
    /// Padding applied to a single axis.
    pub fn along(axis: usize, leading: usize, trailing: usize) -> Self {
        let mut pad = Self::default();
        pad.leading[axis] = leading;
        pad.trailing[axis] = trailing;
        pad
    }

    /// `(lead0, trail0, lead1, trail1, lead2, trail2)`.
    pub fn extra_dims(&self) -> [usize; 6] {
        [
            self.leading[0],
            self.trailing[0],
            self.leading[1],
            self.trailing[1],
            self.leading[2],
            self.trailing[2],
        ]
    }

    pub fn is_zero(&self) -> bool {
        self.leading.iter().chain(&self.trailing).all(|&p| p == 0)
    }

    /// Shape of a volume of `dims` once this padding is applied.
    pub fn padded_dims(&self, dims: [usize; 3]) -> [usize; 3] {
        [0, 1, 2].map(|a| dims[a] + self.leading[a] + self.trailing[a])
    }
}

/// Copy `volume` into a zero-filled buffer grown by `pad`.
pub fn apply(volume: ArrayView3<'_, f32>, pad: &Padding) -> Volume {
    let (d0, d1, d2) = volume.dim();
    let [p0, p1, p2] = pad.padded_dims([d0, d1, d2]);
    let [l0, l1, l2] = pad.leading;
    let mut out = Array3::<f32>::zeros((p0, p1, p2));
    out.slice_mut(s![l0..l0 + d0, l1..l1 + d1, l2..l2 + d2])
        .assign(&volume);
    out
}

/// Pad the trailing end of the slicing axis so its extent divides `slab_size`.
///
/// Returns the padded copy and the number of slices added.
pub fn pad_tail(
    volume: ArrayView3<'_, f32>,
    slab_size: usize,
    plane: SlicingPlane,
) -> (Volume, usize) {
    let axis = plane.axis();
    let extent = volume.shape()[axis];
    let remainder = extent % slab_size.max(1);
    let pad = if remainder == 0 { 0 } else { slab_size - remainder };
    (apply(volume, &Padding::along(axis, 0, pad)), pad)
}

/// Pad `slab_size / 2` slices on both ends of the slicing axis.
pub fn pad_both_ends(volume: ArrayView3<'_, f32>, slab_size: usize, plane: SlicingPlane) -> Volume {
    let half = slab_size / 2;
    apply(volume, &Padding::along(plane.axis(), half, half))
}

/// Amounts needed to grow every axis to at least `patch_size`.
///
/// The deficit is split with the smaller half leading.
pub fn patchwise_padding(dims: [usize; 3], patch_size: [usize; 3]) -> Padding {
    let mut pad = Padding::default();
    for axis in 0..3 {
        let deficit = patch_size[axis].saturating_sub(dims[axis]);
        pad.leading[axis] = deficit / 2;
        pad.trailing[axis] = deficit - deficit / 2;
    }
    pad
}

/// Pad each axis symmetrically so it is at least `patch_size` long.
pub fn pad_both_ends_patchwise(
    volume: ArrayView3<'_, f32>,
    patch_size: [usize; 3],
) -> (Volume, Padding) {
    let (d0, d1, d2) = volume.dim();
    let pad = patchwise_padding([d0, d1, d2], patch_size);
    (apply(volume, &pad), pad)
}

/// Remove `pad` from the spatial axes of a probability volume.
pub fn strip(probabilities: ArrayView4<'_, f32>, pad: &Padding) -> ProbabilityVolume {
    let (d0, d1, d2, _) = probabilities.dim();
    let [l0, l1, l2] = pad.leading;
    let [t0, t1, t2] = pad.trailing;
    probabilities
        .slice(s![l0..d0 - t0, l1..d1 - t1, l2..d2 - t2, ..])
        .to_owned()
}

/// Remove `pad` from a padded intensity volume.
pub fn strip_volume(volume: ArrayView3<'_, f32>, pad: &Padding) -> Volume {
    let (d0, d1, d2) = volume.dim();
    let [l0, l1, l2] = pad.leading;
    let [t0, t1, t2] = pad.trailing;
    volume
        .slice(s![l0..d0 - t0, l1..d1 - t1, l2..d2 - t2])
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, Array4, Axis};

    fn ramp(dims: (usize, usize, usize)) -> Array3<f32> {
        Array3::from_shape_fn(dims, |(x, y, z)| 1.0 + (x * 10_000 + y * 100 + z) as f32)
    }

    #[test]
    fn tail_padding_reaches_next_multiple() {
        let vol = ramp((4, 5, 10));
        let (padded, pad) = pad_tail(vol.view(), 4, SlicingPlane::Axial);
        assert_eq!(pad, 2);
        assert_eq!(padded.dim(), (4, 5, 12));
        assert!(padded.slice(s![.., .., 10..]).iter().all(|&v| v == 0.0));
        assert_eq!(strip_volume(padded.view(), &Padding::along(2, 0, pad)), vol);

        let (padded, pad) = pad_tail(vol.view(), 3, SlicingPlane::Sagittal);
        assert_eq!((pad, padded.dim()), (2, (6, 5, 10)));
        assert_eq!(strip_volume(padded.view(), &Padding::along(0, 0, pad)), vol);

        let (padded, pad) = pad_tail(vol.view(), 5, SlicingPlane::Coronal);
        assert_eq!((pad, padded.dim()), (0, (4, 5, 10)));
        assert_eq!(padded, vol);
    }

    #[test]
    fn both_ends_padding_centres_original_slices() {
        let vol = ramp((3, 4, 5));
        let padded = pad_both_ends(vol.view(), 4, SlicingPlane::Coronal);
        assert_eq!(padded.dim(), (3, 8, 5));
        assert_eq!(padded.index_axis(Axis(1), 2), vol.index_axis(Axis(1), 0));
        assert!(padded.index_axis(Axis(1), 1).iter().all(|&v| v == 0.0));
        assert!(padded.index_axis(Axis(1), 6).iter().all(|&v| v == 0.0));

        let restored = strip_volume(padded.view(), &Padding::along(1, 2, 2));
        assert_eq!(restored, vol);
    }

    #[test]
    fn patchwise_padding_only_grows_short_axes() {
        let vol = ramp((10, 40, 7));
        let (padded, pad) = pad_both_ends_patchwise(vol.view(), [16, 32, 16]);
        assert_eq!(pad.extra_dims(), [3, 3, 0, 0, 4, 5]);
        assert_eq!(padded.dim(), (16, 40, 16));
        assert_eq!(strip_volume(padded.view(), &pad), vol);
    }

    #[test]
    fn probability_strip_restores_spatial_shape() {
        let pad = Padding {
            leading: [1, 0, 2],
            trailing: [2, 0, 3],
        };
        let probs = Array4::<f32>::from_elem((7, 5, 9, 3), 0.5);
        let stripped = strip(probs.view(), &pad);
        assert_eq!(stripped.dim(), (4, 5, 4, 3));
    }

    #[test]
    fn zero_padding_is_a_plain_copy() {
        let vol = ramp((2, 3, 4));
        let pad = Padding::default();
        assert!(pad.is_zero());
        assert_eq!(apply(vol.view(), &pad), vol);
    }
}
