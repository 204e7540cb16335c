//! Laplacian phase unwrapping
//!
//! The Laplacian of the wrapped phase, built from wrapped neighbor
//! differences, equals the Laplacian of the true phase wherever neighbors
//! differ by less than π. Solving the Poisson equation in the Fourier domain
//! recovers the phase up to an additive constant (zero mean here). The caller
//! restores the level by aligning the result with the wrapped input.
//!
//! Reference:
//! Schofield MA, Zhu Y. Fast phase unwrapping algorithm for interferometric
//! applications. Optics letters. 2003 Jul 15;28(14):1194-6.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::fft::{wrap_angle, Fft3dWorkspace};
use crate::grid::idx3d;

/// (previous, next) index of every position on a periodic axis
fn periodic_neighbors(n: usize) -> Vec<(usize, usize)> {
    (0..n).map(|i| ((i + n - 1) % n, (i + 1) % n)).collect()
}

/// Eigenvalues of the periodic 1D second difference, in FFT bin order
fn second_difference_spectrum(n: usize, spacing: f64) -> Vec<f64> {
    let inv_h2 = 1.0 / (spacing * spacing);
    (0..n)
        .map(|bin| 2.0 * ((2.0 * PI * bin as f64 / n as f64).cos() - 1.0) * inv_h2)
        .collect()
}

/// Sum over axes of wrap(next - u) - wrap(u - prev), scaled by 1/h²
fn wrapped_laplacian(phase: &[f64], dims: (usize, usize, usize), spacing: [f64; 3]) -> Vec<f64> {
    let (nx, ny, nz) = dims;
    let (xn, yn, zn) = (periodic_neighbors(nx), periodic_neighbors(ny), periodic_neighbors(nz));
    let inv_h2 = spacing.map(|h| 1.0 / (h * h));

    let mut out = vec![0.0; phase.len()];
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let idx = idx3d(i, j, k, nx, ny);
                let u = phase[idx];
                let second = |prev: usize, next: usize| wrap_angle(phase[next] - u) - wrap_angle(u - phase[prev]);

                out[idx] = second(idx3d(xn[i].0, j, k, nx, ny), idx3d(xn[i].1, j, k, nx, ny)) * inv_h2[0]
                    + second(idx3d(i, yn[j].0, k, nx, ny), idx3d(i, yn[j].1, k, nx, ny)) * inv_h2[1]
                    + second(idx3d(i, j, zn[k].0, nx, ny), idx3d(i, j, zn[k].1, nx, ny)) * inv_h2[2];
            }
        }
    }
    out
}

/// Solve ∇²u = rhs with periodic boundaries; the zero-eigenvalue (DC) term is dropped
fn poisson_solve(rhs: &[f64], dims: (usize, usize, usize), spacing: [f64; 3]) -> Vec<f64> {
    let (nx, ny, nz) = dims;
    let (lx, ly, lz) = (
        second_difference_spectrum(nx, spacing[0]),
        second_difference_spectrum(ny, spacing[1]),
        second_difference_spectrum(nz, spacing[2]),
    );

    let mut workspace = Fft3dWorkspace::new(nx, ny, nz);
    let mut spectrum: Vec<Complex64> = rhs.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    workspace.fft3d(&mut spectrum);

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let idx = idx3d(i, j, k, nx, ny);
                let lambda = lx[i] + ly[j] + lz[k];
                spectrum[idx] = if lambda.abs() > 1e-20 { spectrum[idx] / lambda } else { Complex64::default() };
            }
        }
    }

    workspace.ifft3d(&mut spectrum);
    spectrum.into_iter().map(|c| c.re).collect()
}

/// Unwrap `phase` inside `mask`; voxels outside the mask are zero on output
///
/// `spacing` is the voxel size per axis.
pub fn laplacian_unwrap(phase: &[f64], mask: &[u8], dims: (usize, usize, usize), spacing: [f64; 3]) -> Vec<f64> {
    let keep = |values: Vec<f64>| -> Vec<f64> {
        values
            .into_iter()
            .zip(mask)
            .map(|(v, &m)| if m != 0 { v } else { 0.0 })
            .collect()
    };

    let rhs = keep(wrapped_laplacian(phase, dims, spacing));
    keep(poisson_solve(&rhs, dims, spacing))
}
