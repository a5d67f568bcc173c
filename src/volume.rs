//! Volume types and the slicing-plane lookup table.
//!
//! A [`Volume`] is a 3D intensity array ordered `(axis0, axis1, axis2)`; a
//! [`ProbabilityVolume`] adds a trailing class axis. Which anatomical plane an
//! axis corresponds to depends on the acquisition, so slab tiling is driven by
//! a [`SlicingPlane`] tag instead of hard-coded axes.
//!
//! Every plane maps a 3D block to `(rows, cols, slices)` through
//! [`SlicingPlane::permutation`]. Rows and cols are the two in-plane axes in
//! ascending order, slices is the slicing axis. The same permutation is used
//! to cut tiles out of the volume and to write model outputs back, so the two
//! directions cannot drift apart.

use ndarray::{Array3, Array4, ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Intensity volume, `(axis0, axis1, axis2)`.
pub type Volume = Array3<f32>;

/// Per-voxel class scores, `(axis0, axis1, axis2, class)`.
pub type ProbabilityVolume = Array4<f32>;

/// Intensity a voxel must exceed to count as foreground.
pub const FOREGROUND_THRESHOLD: f32 = 0.1;

/// Anatomical plane along which slabs are cut.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlicingPlane {
    #[default]
    Axial,
    Sagittal,
    Coronal,
}

impl SlicingPlane {
    pub const ALL: [SlicingPlane; 3] = [
        SlicingPlane::Axial,
        SlicingPlane::Sagittal,
        SlicingPlane::Coronal,
    ];

    /// Volume axis the slabs are stacked along.
    pub fn axis(self) -> usize {
        match self {
            SlicingPlane::Sagittal => 0,
            SlicingPlane::Coronal => 1,
            SlicingPlane::Axial => 2,
        }
    }

    /// Axis permutation taking a 3D block to `(rows, cols, slices)`.
    pub fn permutation(self) -> [usize; 3] {
        match self {
            SlicingPlane::Axial => [0, 1, 2],
            SlicingPlane::Sagittal => [1, 2, 0],
            SlicingPlane::Coronal => [0, 2, 1],
        }
    }

    /// Same permutation extended with an untouched trailing class axis.
    pub fn permutation_with_classes(self) -> [usize; 4] {
        let [r, c, s] = self.permutation();
        [r, c, s, 3]
    }

    pub fn name(self) -> &'static str {
        match self {
            SlicingPlane::Axial => "axial",
            SlicingPlane::Sagittal => "sagittal",
            SlicingPlane::Coronal => "coronal",
        }
    }
}

impl fmt::Display for SlicingPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SlicingPlane {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "axial" => Ok(SlicingPlane::Axial),
            "sagittal" => Ok(SlicingPlane::Sagittal),
            "coronal" => Ok(SlicingPlane::Coronal),
            other => Err(format!("Unknown slicing plane '{other}'")),
        }
    }
}

/// True when at least one voxel of `block` exceeds `threshold`.
///
/// With the `parallel` feature, contiguous blocks are scanned on the rayon pool.
pub fn has_foreground<S, D>(block: &ArrayBase<S, D>, threshold: f32) -> bool
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if let Some(values) = block.as_slice_memory_order() {
            return values.par_iter().any(|&v| v > threshold);
        }
    }
    block.iter().any(|&v| v > threshold)
}
