mod common;

use common::init_logging;
use common::models::{expected_echo, CallIndexModel, EchoModel};
use common::synthetic_volume::ramp_volume;
use ndarray::{s, Array4};
use volseg::tiling::axis_positions;
use volseg::{InferenceMode, InferenceParams, VolumePredictor};

const BIAS: f32 = 0.25;

#[test]
fn boundary_patches_are_shifted_flush() {
    init_logging();
    let volume = ramp_volume((64, 64, 40));
    let params = InferenceParams::patch([32, 32, 32], [8, 8, 8]);
    let predictor = VolumePredictor::new(params);
    assert_eq!(predictor.mode(), InferenceMode::Patch);

    let mut model = EchoModel::new(2, BIAS);
    let prediction = predictor
        .predict_with_diagnostics(&mut model, volume.view())
        .expect("patch inference succeeds");

    // 3 positions on the 64-voxel axes, 2 on the 40-voxel axis.
    assert_eq!(prediction.report.tiles.invoked, 3 * 3 * 2);
    assert_eq!(prediction.report.tiles.skipped, 0);
    assert!(prediction.report.padding.is_zero());
    assert!(model
        .input_shapes
        .iter()
        .all(|shape| shape == &[1, 32, 32, 32, 1]));
    assert_eq!(prediction.probabilities, expected_echo(&volume, 2, BIAS));
}

#[test]
fn small_volume_is_padded_and_stripped() {
    let volume = ramp_volume((20, 40, 10));
    let params = InferenceParams::patch([32, 32, 16], [8, 8, 4]).with_classes(3);
    let mut model = EchoModel::new(3, BIAS);
    let prediction = VolumePredictor::new(params)
        .predict_with_diagnostics(&mut model, volume.view())
        .expect("patch inference succeeds");

    assert_eq!(prediction.report.padding.extra_dims(), [6, 6, 0, 0, 3, 3]);
    assert_eq!(prediction.report.output_shape, [20, 40, 10, 3]);
    assert_eq!(prediction.probabilities, expected_echo(&volume, 3, BIAS));
    // Two grid steps per axis; on the padded axes the second step is shifted
    // back onto the first one and evaluated again.
    assert_eq!(model.calls(), 8);
}

#[test]
fn overlapping_patches_keep_the_maximum() {
    let volume = ramp_volume((40, 24, 24));
    let patch = [16, 16, 16];
    let offset = [4, 8, 0];
    let params = InferenceParams::patch(patch, offset).with_classes(2);
    let mut model = CallIndexModel {
        classes: 2,
        calls: 0,
    };
    let probabilities = VolumePredictor::new(params)
        .predict(&mut model, volume.view())
        .expect("patch inference succeeds");

    // Replay the patch grid: each voxel ends with the highest call index
    // among the patches covering it, whatever the visiting order.
    let [xs, ys, zs] = [0, 1, 2].map(|a| axis_positions(volume.shape()[a], patch[a], offset[a]));
    let mut covering = Vec::new();
    for x in xs.iter().flatten() {
        for y in ys.iter().flatten() {
            for z in zs.iter().flatten() {
                covering.push((x.clone(), y.clone(), z.clone()));
            }
        }
    }
    assert_eq!(covering.len(), model.calls);

    let mut forward = Array4::<f32>::zeros((40, 24, 24, 2));
    for (call, (x, y, z)) in covering.iter().enumerate() {
        forward
            .slice_mut(s![x.clone(), y.clone(), z.clone(), ..])
            .mapv_inplace(|v| v.max((call + 1) as f32));
    }
    let mut backward = Array4::<f32>::zeros((40, 24, 24, 2));
    for (call, (x, y, z)) in covering.iter().enumerate().rev() {
        backward
            .slice_mut(s![x.clone(), y.clone(), z.clone(), ..])
            .mapv_inplace(|v| v.max((call + 1) as f32));
    }
    assert_eq!(forward, backward);
    assert_eq!(probabilities, forward);
    assert!(probabilities.iter().all(|&v| v >= 1.0), "every voxel covered");
}

#[test]
fn exact_tiling_visits_each_block_once() {
    let volume = ramp_volume((32, 32, 32));
    let params = InferenceParams::patch([16, 16, 16], [0, 0, 0]);
    let mut model = EchoModel::new(2, BIAS);
    let probabilities = VolumePredictor::new(params)
        .predict(&mut model, volume.view())
        .expect("patch inference succeeds");
    assert_eq!(model.calls(), 8);
    assert_eq!(probabilities, expected_echo(&volume, 2, BIAS));
}
