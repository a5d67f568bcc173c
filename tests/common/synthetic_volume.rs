use ndarray::{Array3, Axis};

/// Every voxel holds a distinct positive value, so any misplaced write shows.
pub fn ramp_volume(dims: (usize, usize, usize)) -> Array3<f32> {
    Array3::from_shape_fn(dims, |(x, y, z)| 1.0 + (x * 10_000 + y * 100 + z) as f32)
}

/// Bright sphere of `radius` voxels centred in a zero background.
pub fn sphere_volume(dims: (usize, usize, usize), radius: f32, intensity: f32) -> Array3<f32> {
    let centre = [dims.0, dims.1, dims.2].map(|d| (d as f32 - 1.0) * 0.5);
    Array3::from_shape_fn(dims, |(x, y, z)| {
        let dx = x as f32 - centre[0];
        let dy = y as f32 - centre[1];
        let dz = z as f32 - centre[2];
        if dx * dx + dy * dy + dz * dz <= radius * radius {
            intensity
        } else {
            0.0
        }
    })
}

/// Fill the given slices along `axis` with a sub-threshold value.
pub fn blank_slices(volume: &mut Array3<f32>, axis: usize, indices: &[usize], value: f32) {
    for &index in indices {
        volume.index_axis_mut(Axis(axis), index).fill(value);
    }
}
