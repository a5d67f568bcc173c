use ndarray::{stack, Array3, Array4, ArrayD, ArrayViewD, Axis, IxDyn};
use volseg::model::{Model, ModelError, NamedInput, INPUT_NAME};

/// Class `c` of the echo output is `input + bias * (c + 1)`.
pub fn echo(input: ArrayViewD<'_, f32>, classes: usize, bias: f32) -> ArrayD<f32> {
    let channel = Axis(input.ndim() - 1);
    let base = input.index_axis(channel, 0);
    let maps: Vec<ArrayD<f32>> = (0..classes)
        .map(|c| base.mapv(|v| v + bias * (c as f32 + 1.0)))
        .collect();
    let views: Vec<_> = maps.iter().map(|m| m.view()).collect();
    stack(channel, &views).expect("echo maps share a shape")
}

/// What an echo model reconstructs for `volume` when every voxel is predicted.
pub fn expected_echo(volume: &Array3<f32>, classes: usize, bias: f32) -> Array4<f32> {
    let (d0, d1, d2) = volume.dim();
    Array4::from_shape_fn((d0, d1, d2, classes), |(x, y, z, c)| {
        volume[[x, y, z]] + bias * (c as f32 + 1.0)
    })
}

fn single_input<'a, 'b>(inputs: &'a [NamedInput<'b>]) -> Result<&'a ArrayViewD<'b, f32>, ModelError> {
    let (name, input) = inputs.first().ok_or("no inputs")?;
    if *name != INPUT_NAME {
        return Err(format!("unexpected input name {name}").into());
    }
    Ok(input)
}

/// Elementwise echo that records every input shape it receives.
pub struct EchoModel {
    pub classes: usize,
    pub bias: f32,
    /// Append an auxiliary head filled with a large sentinel.
    pub deep_supervision: bool,
    pub input_shapes: Vec<Vec<usize>>,
}

impl EchoModel {
    pub fn new(classes: usize, bias: f32) -> Self {
        Self {
            classes,
            bias,
            deep_supervision: false,
            input_shapes: Vec::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.input_shapes.len()
    }
}

impl Model for EchoModel {
    fn invoke(&mut self, inputs: &[NamedInput<'_>]) -> Result<Vec<ArrayD<f32>>, ModelError> {
        let input = single_input(inputs)?;
        self.input_shapes.push(input.shape().to_vec());
        let mut outputs = vec![echo(input.view(), self.classes, self.bias)];
        if self.deep_supervision {
            let aux = echo(input.view(), self.classes, 1.0e6);
            outputs.push(aux);
        }
        Ok(outputs)
    }
}

/// Fills every output with the 1-based call number.
pub struct CallIndexModel {
    pub classes: usize,
    pub calls: usize,
}

impl Model for CallIndexModel {
    fn invoke(&mut self, inputs: &[NamedInput<'_>]) -> Result<Vec<ArrayD<f32>>, ModelError> {
        let input = single_input(inputs)?;
        self.calls += 1;
        let mut shape = input.shape().to_vec();
        if let Some(last) = shape.last_mut() {
            *last = self.classes;
        }
        Ok(vec![ArrayD::from_elem(IxDyn(&shape), self.calls as f32)])
    }
}

/// Succeeds with an echo until call `fail_on` (1-based), which errors.
pub struct FailingModel {
    pub fail_on: usize,
    pub calls: usize,
}

impl Model for FailingModel {
    fn invoke(&mut self, inputs: &[NamedInput<'_>]) -> Result<Vec<ArrayD<f32>>, ModelError> {
        let input = single_input(inputs)?;
        self.calls += 1;
        if self.calls >= self.fail_on {
            return Err(format!("engine failure on call {}", self.calls).into());
        }
        Ok(vec![echo(input.view(), 2, 0.5)])
    }
}
