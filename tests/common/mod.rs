//! Common test utilities for thermometry integration tests

use std::f64::consts::PI;

use prf_thermometry::{Geometry, VoxelGrid};

/// Wrap an angle into [-π, π)
pub fn wrap(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

/// Isotropic Gaussian bump with unit peak at `center`
pub fn gaussian(dims: (usize, usize, usize), center: (f64, f64, f64), sigma: f64) -> VoxelGrid {
    VoxelGrid::from_fn(dims, Geometry::default(), |i, j, k| {
        let d2 = (i as f64 - center.0).powi(2) + (j as f64 - center.1).powi(2) + (k as f64 - center.2).powi(2);
        (-d2 / (2.0 * sigma * sigma)).exp()
    })
}

/// Bump (1 - r²/R²)² with unit peak at `center`, exactly zero from `radius` on
pub fn compact_bump(dims: (usize, usize, usize), center: (f64, f64, f64), radius: f64) -> VoxelGrid {
    VoxelGrid::from_fn(dims, Geometry::default(), |i, j, k| {
        let d2 = (i as f64 - center.0).powi(2) + (j as f64 - center.1).powi(2) + (k as f64 - center.2).powi(2);
        let s = 1.0 - d2 / (radius * radius);
        if s > 0.0 { s * s } else { 0.0 }
    })
}

/// Smooth, deterministic background phase well inside (-π, π)
pub fn background_phase(dims: (usize, usize, usize)) -> VoxelGrid {
    VoxelGrid::from_fn(dims, Geometry::default(), |i, j, k| {
        0.6 * (0.21 * i as f64).sin() + 0.4 * (0.17 * j as f64 + 0.05 * k as f64).cos()
    })
}

/// Deterministic pseudo-random values in [-1, 1)
pub fn pseudo_noise(dims: (usize, usize, usize), seed: u64) -> VoxelGrid {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let (nx, ny, nz) = dims;
    let data = (0..nx * ny * nz)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
        })
        .collect();
    VoxelGrid::new(data, dims, Geometry::default()).unwrap()
}

/// Largest absolute elementwise difference
pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}

/// Compute RMSE between two arrays, only within mask (non-zero values)
pub fn rmse(a: &[f64], b: &[f64], mask: &[u8]) -> f64 {
    let mut sum_sq = 0.0;
    let mut count = 0usize;
    for i in 0..a.len() {
        if mask[i] > 0 {
            let diff = a[i] - b[i];
            sum_sq += diff * diff;
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    (sum_sq / count as f64).sqrt()
}
