//! Seam between the tiling core and an inference engine.
//!
//! The core never loads or owns a network. It hands a [`Model`] one tile at a
//! time under the input name [`INPUT_NAME`] and reads back an ordered list of
//! output tensors. The first output is the primary prediction; further
//! entries come from deep-supervision heads and are ignored.
//!
//! Closures taking the single input view implement [`Model`] directly, which
//! keeps engine adapters and test doubles small.

use ndarray::{ArrayD, ArrayViewD};

/// Name under which every tile is passed to the engine.
pub const INPUT_NAME: &str = "input";

/// Error raised by an engine while running a tile.
pub type ModelError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Named input tensor handed to [`Model::invoke`].
pub type NamedInput<'a> = (&'a str, ArrayViewD<'a, f32>);

/// Anything able to run a batch of named inputs through a network.
///
/// Inputs are always in standard (row-major, contiguous) layout. The model is
/// invoked sequentially and may keep internal state between calls.
pub trait Model {
    fn invoke(&mut self, inputs: &[NamedInput<'_>]) -> Result<Vec<ArrayD<f32>>, ModelError>;
}

impl<F> Model for F
where
    F: FnMut(ArrayViewD<'_, f32>) -> Result<Vec<ArrayD<f32>>, ModelError>,
{
    fn invoke(&mut self, inputs: &[NamedInput<'_>]) -> Result<Vec<ArrayD<f32>>, ModelError> {
        let (_, input) = inputs.first().ok_or("model invoked without inputs")?;
        self(input.view())
    }
}

/// Keep the primary output and drop deep-supervision heads.
pub fn primary_output(outputs: Vec<ArrayD<f32>>) -> Option<ArrayD<f32>> {
    outputs.into_iter().next()
}
