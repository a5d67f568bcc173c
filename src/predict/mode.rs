//! Strategy selection from the declared model input size.

use crate::config::InferenceParams;
use serde::Serialize;
use std::fmt;

/// Inference strategy chosen for a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    /// The whole volume in a single model call.
    Whole,
    /// 2D or thin 3D slabs along the slicing plane.
    Slab,
    /// Overlapping 3D patches merged by maximum.
    Patch,
}

impl InferenceMode {
    /// `new_axial_size` of length 3 → whole, 2 → slab, anything else → patch.
    pub fn select(params: &InferenceParams) -> Self {
        match params.new_axial_size.as_ref().map(Vec::len) {
            Some(3) => InferenceMode::Whole,
            Some(2) => InferenceMode::Slab,
            _ => InferenceMode::Patch,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            InferenceMode::Whole => "whole",
            InferenceMode::Slab => "slab",
            InferenceMode::Patch => "patch",
        }
    }
}

impl fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
