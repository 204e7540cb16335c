//! Dipole kernel for susceptibility-induced field offsets
//!
//! In k-space the field induced by a susceptibility distribution is the
//! distribution's spectrum times
//!
//! D(k) = 1/3 - k_B0² / |k|²
//!
//! where k_B0 is the k-space coordinate along the image axis closest to the
//! main field. The grid is a normalized reciprocal-space grid, not physical
//! frequencies: each axis spans [-π(N-1)/N, π(N-1)/N] in N linear steps.

use std::f64::consts::PI;

use crate::fft::centered_index;
use crate::grid::{idx3d, Geometry};

/// Centered k-space coordinates for one axis of length n
pub fn kspace_axis(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![0.0; n];
    }
    let half_span = PI * (n as f64 - 1.0) / n as f64;
    let step = 2.0 * half_span / (n as f64 - 1.0);
    (0..n).map(|c| -half_span + c as f64 * step).collect()
}

/// Image axis (0 = i, 1 = j, 2 = k) best aligned with the world-frame B0
/// direction.
///
/// The direction is taken into the image-axis frame through the grid's
/// orientation matrix and the axis of largest absolute component wins; ties
/// go to the lower axis.
pub fn dominant_b0_axis(geometry: &Geometry, b0_dir: [f64; 3]) -> usize {
    let local = geometry.world_to_index_frame(b0_dir);
    let mut best = 0;
    for axis in 1..3 {
        if local[axis].abs() > local[best].abs() {
            best = axis;
        }
    }
    best
}

/// Generate the dipole kernel in FFT order (zero frequency at index 0)
///
/// # Arguments
/// * `dims` - Array dimensions (nx, ny, nz)
/// * `b0_axis` - Storage axis aligned with B0 (see `dominant_b0_axis`)
///
/// # Returns
/// Flattened kernel of size nx*ny*nz in Fortran order. A k = 0 sample, when
/// the grid has one, is set to 0. Even axes have no k = 0 sample: their DC bin
/// sits at k = π/n. D(DC) is therefore 0 only when every axis is odd or all
/// axes share one even length; otherwise it depends on the B0 axis.
pub fn dipole_kernel(dims: (usize, usize, usize), b0_axis: usize) -> Vec<f64> {
    let (nx, ny, nz) = dims;
    let mut d = vec![0.0; nx * ny * nz];

    let kx = kspace_axis(nx);
    let ky = kspace_axis(ny);
    let kz = kspace_axis(nz);

    let one_third = 1.0 / 3.0;

    for k in 0..nz {
        let kz_val = kz[centered_index(k, nz)];
        for j in 0..ny {
            let ky_val = ky[centered_index(j, ny)];
            for i in 0..nx {
                let kx_val = kx[centered_index(i, nx)];

                let k_b0 = match b0_axis {
                    0 => kx_val,
                    1 => ky_val,
                    _ => kz_val,
                };
                let k_squared = kx_val * kx_val + ky_val * ky_val + kz_val * kz_val;

                d[idx3d(i, j, k, nx, ny)] = if k_squared > 1e-20 {
                    one_third - (k_b0 * k_b0) / k_squared
                } else {
                    0.0
                };
            }
        }
    }

    d
}
