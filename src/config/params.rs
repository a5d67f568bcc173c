//! Parameters describing how a trained model expects to be fed.
//!
//! These mirror the training-time settings stored alongside a model: the
//! declared input size decides the inference mode, the slab/patch settings
//! drive tiling, and the orientation flags correct for transposed training
//! conventions. The predictor never mutates them.

use crate::error::SegmentationError;
use crate::predict::InferenceMode;
use crate::volume::SlicingPlane;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceParams {
    /// Declared spatial input size: 3 entries → whole volume, 2 → slabs,
    /// absent → patches.
    pub new_axial_size: Option<Vec<usize>>,
    /// Plane the slabs are cut along.
    pub slicing_plane: SlicingPlane,
    /// Number of slices per slab.
    pub training_slab_size: usize,
    /// Patch extent per axis.
    pub training_patch_size: [usize; 3],
    /// Overlap between consecutive patches per axis.
    pub training_patch_offset: [usize; 3],
    /// Number of classes predicted per voxel.
    pub training_nb_classes: usize,
    /// Tile slabs back to back instead of sliding a centred window.
    pub predictions_non_overlapping: bool,
    /// Swap the two entries of `new_axial_size` before use.
    pub swap_training_input: bool,
    /// Feed slabs slice-first and transpose the output back.
    pub fix_orientation: bool,
    /// The model emits auxiliary heads after the primary output.
    pub training_deep_supervision: bool,
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            new_axial_size: None,
            slicing_plane: SlicingPlane::Axial,
            training_slab_size: 32,
            training_patch_size: [128, 128, 128],
            training_patch_offset: [0, 0, 0],
            training_nb_classes: 2,
            predictions_non_overlapping: true,
            swap_training_input: false,
            fix_orientation: false,
            training_deep_supervision: false,
        }
    }
}

impl InferenceParams {
    /// Slab-mode parameters with the given in-plane size.
    pub fn slab(rows: usize, cols: usize, slab_size: usize) -> Self {
        Self {
            new_axial_size: Some(vec![rows, cols]),
            training_slab_size: slab_size,
            ..Self::default()
        }
    }

    /// Whole-volume parameters for a model taking `dims` at once.
    pub fn whole(dims: [usize; 3]) -> Self {
        Self {
            new_axial_size: Some(dims.to_vec()),
            ..Self::default()
        }
    }

    /// Patch-mode parameters.
    pub fn patch(patch_size: [usize; 3], patch_offset: [usize; 3]) -> Self {
        Self {
            new_axial_size: None,
            training_patch_size: patch_size,
            training_patch_offset: patch_offset,
            ..Self::default()
        }
    }

    pub fn with_classes(mut self, classes: usize) -> Self {
        self.training_nb_classes = classes;
        self
    }

    pub fn with_plane(mut self, plane: SlicingPlane) -> Self {
        self.slicing_plane = plane;
        self
    }

    /// In-plane slab size after applying `swap_training_input`.
    pub fn slab_axial_size(&self) -> Option<[usize; 2]> {
        match self.new_axial_size.as_deref() {
            Some(&[a, b]) if self.swap_training_input => Some([b, a]),
            Some(&[a, b]) => Some([a, b]),
            _ => None,
        }
    }

    /// Patch stride per axis (`patch - offset`), saturating at zero.
    pub fn patch_stride(&self) -> [usize; 3] {
        [0, 1, 2].map(|a| {
            self.training_patch_size[a].saturating_sub(self.training_patch_offset[a])
        })
    }

    /// Reject settings that cannot drive `mode` at all.
    ///
    /// Only settings that would make tiling ill-defined are checked here;
    /// anything else surfaces from the strategy itself.
    pub fn validate(&self, mode: InferenceMode) -> Result<(), SegmentationError> {
        if self.training_nb_classes == 0 {
            return Err(SegmentationError::configuration(
                "training_nb_classes must be at least 1",
            ));
        }
        match mode {
            InferenceMode::Whole => Ok(()),
            InferenceMode::Slab => {
                if self.training_slab_size == 0 {
                    return Err(SegmentationError::configuration(
                        "training_slab_size must be at least 1",
                    ));
                }
                Ok(())
            }
            InferenceMode::Patch => {
                if self.training_patch_size.contains(&0) {
                    return Err(SegmentationError::configuration(format!(
                        "training_patch_size {:?} has an empty axis",
                        self.training_patch_size
                    )));
                }
                if self.patch_stride().contains(&0) {
                    return Err(SegmentationError::configuration(format!(
                        "training_patch_offset {:?} must be smaller than training_patch_size {:?}",
                        self.training_patch_offset, self.training_patch_size
                    )));
                }
                Ok(())
            }
        }
    }
}
