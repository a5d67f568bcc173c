//! JSON configuration for the demo binary.
//!
//! ```json
//! {
//!   "phantom": { "shape": [64, 64, 40], "radius_fraction": 0.35 },
//!   "params": { "training_patch_size": [32, 32, 32], "training_patch_offset": [8, 8, 8] },
//!   "output": { "json_out": "out/report.json" }
//! }
//! ```
use super::InferenceParams;
use crate::io::read_json_file;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub phantom: PhantomConfig,
    #[serde(default)]
    pub params: InferenceParams,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Synthetic sphere used in place of a real scan.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PhantomConfig {
    pub shape: [usize; 3],
    /// Sphere radius relative to the shortest axis.
    pub radius_fraction: f32,
    /// Intensity inside the sphere; background is zero.
    pub intensity: f32,
}

impl Default for PhantomConfig {
    fn default() -> Self {
        Self {
            shape: [64, 64, 40],
            radius_fraction: 0.35,
            intensity: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OutputConfig {
    pub json_out: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    read_json_file(path).map_err(|e| format!("Invalid config: {e}"))
}
