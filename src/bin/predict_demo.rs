use log::info;
use ndarray::{stack, Array3, ArrayD, Axis};
use std::env;
use volseg::config::runtime::{load_config, PhantomConfig};
use volseg::io::write_json_file;
use volseg::model::{Model, ModelError, NamedInput, INPUT_NAME};
use volseg::{Prediction, Volume, VolumePredictor};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "predict_demo".to_string());
    let config_path = args
        .next()
        .ok_or_else(|| format!("Usage: {program} <config.json>"))?;
    let config = load_config(config_path.as_ref())?;

    let volume = sphere_phantom(&config.phantom);
    info!(
        "phantom shape={:?} foreground_voxels={}",
        volume.shape(),
        volume.iter().filter(|&&v| v > 0.0).count()
    );

    let predictor = VolumePredictor::new(config.params.clone());
    let mut model = ThresholdModel {
        classes: config.params.training_nb_classes,
        threshold: 0.5 * config.phantom.intensity,
        calls: 0,
    };
    let prediction = predictor
        .predict_with_diagnostics(&mut model, volume.view())
        .map_err(|e| e.to_string())?;

    print_text_summary(&prediction, model.calls);

    if let Some(path) = &config.output.json_out {
        write_json_file(path, &prediction.report)?;
        println!("\nJSON report written to {}", path.display());
    }
    Ok(())
}

fn print_text_summary(prediction: &Prediction, calls: usize) {
    let report = &prediction.report;
    println!("Prediction summary");
    println!("  mode: {}", report.mode);
    println!("  input_shape: {:?}", report.input_shape);
    println!("  output_shape: {:?}", report.output_shape);
    println!(
        "  tiles: invoked={} skipped={} model_calls={}",
        report.tiles.invoked, report.tiles.skipped, calls
    );
    println!("  padding (extra dims): {:?}", report.padding.extra_dims());
    let classes = report.output_shape[3];
    if classes > 1 {
        let labelled = prediction
            .probabilities
            .lanes(Axis(3))
            .into_iter()
            .filter(|lane| lane.iter().skip(1).any(|&p| p > lane[0]))
            .count();
        println!("  foreground voxels: {labelled}");
    }
    println!("  total_ms: {:.3}", report.timings.total_ms);
    for stage in &report.timings.stages {
        println!("    {}: {:.3} ms", stage.label, stage.elapsed_ms);
    }
}

/// Zero background with a bright sphere in the middle.
fn sphere_phantom(config: &PhantomConfig) -> Volume {
    let [d0, d1, d2] = config.shape;
    let radius = config.radius_fraction * d0.min(d1).min(d2) as f32;
    let centre = config.shape.map(|d| (d as f32 - 1.0) * 0.5);
    Array3::from_shape_fn((d0, d1, d2), |(x, y, z)| {
        let dx = x as f32 - centre[0];
        let dy = y as f32 - centre[1];
        let dz = z as f32 - centre[2];
        if dx * dx + dy * dy + dz * dz <= radius * radius {
            config.intensity
        } else {
            0.0
        }
    })
}

/// Stand-in network: a soft intensity threshold split into class scores.
///
/// Works on any tile layout as long as the trailing axis is a single channel,
/// which holds for every mode the predictor runs.
struct ThresholdModel {
    classes: usize,
    threshold: f32,
    calls: usize,
}

impl Model for ThresholdModel {
    fn invoke(&mut self, inputs: &[NamedInput<'_>]) -> Result<Vec<ArrayD<f32>>, ModelError> {
        let (_, input) = inputs
            .iter()
            .find(|(name, _)| *name == INPUT_NAME)
            .ok_or("missing 'input' tensor")?;
        let channel = Axis(input.ndim().checked_sub(1).ok_or("scalar input")?);
        if input.len_of(channel) != 1 {
            return Err(format!("expected a single channel, got shape {:?}", input.shape()).into());
        }
        let threshold = self.threshold;
        let foreground = input
            .index_axis(channel, 0)
            .mapv(|v| 1.0 / (1.0 + (-(v - threshold) * 12.0).exp()));

        let maps: Vec<ArrayD<f32>> = match self.classes {
            0 | 1 => vec![foreground],
            n => {
                let share = (n - 1) as f32;
                let mut maps = vec![foreground.mapv(|p| 1.0 - p)];
                maps.extend((1..n).map(|_| foreground.mapv(|p| p / share)));
                maps
            }
        };
        let views: Vec<_> = maps.iter().map(|m| m.view()).collect();
        self.calls += 1;
        Ok(vec![stack(channel, &views)?])
    }
}
