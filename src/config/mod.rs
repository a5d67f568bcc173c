//! Configuration surfaces.
//!
//! - [`params`]: the read-only [`InferenceParams`] consumed by the predictor.
//! - [`runtime`]: JSON configuration for the demo binary.

pub mod params;
pub mod runtime;

pub use params::InferenceParams;
