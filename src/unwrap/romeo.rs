//! Edge weights for quality-guided phase unwrapping
//!
//! Each edge between face-adjacent voxels gets a reliability score built
//! from phase coherence and, when a magnitude image is available, magnitude
//! coherence and magnitude weight. Scores are quantized to 0-255 for the
//! bucket priority queue.
//!
//! Reference:
//! Dymerska B, et al. Phase unwrapping with a rapid opensource minimum spanning
//! tree algorithm (ROMEO). Magnetic Resonance in Medicine. 2021;85(4):2294-2308.

use std::f64::consts::PI;

use crate::fft::wrap_angle;
use crate::grid::idx3d;

/// Calculate edge weights for region-growing unwrapping
///
/// # Arguments
/// * `phase` - Wrapped phase (nx * ny * nz)
/// * `mag` - Magnitude (nx * ny * nz), or empty slice when unavailable
/// * `mask` - Binary mask (nx * ny * nz), 1 = process
/// * `dims` - Array dimensions
///
/// # Returns
/// Weights of size 3 * nx * ny * nz, layout [dim][x][y][z]; edge (v, v+e_dim) is stored at v
pub fn calculate_weights(
    phase: &[f64],
    mag: &[f64],
    mask: &[u8],
    dims: (usize, usize, usize),
) -> Vec<u8> {
    let (nx, ny, nz) = dims;
    let n_total = nx * ny * nz;
    let mut weights = vec![0u8; 3 * n_total];

    let has_mag = !mag.is_empty();
    let half_max_mag = if has_mag {
        0.5 * mag.iter().cloned().fold(0.0_f64, f64::max) + 1e-12
    } else {
        1.0
    };

    for dim in 0..3_usize {
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let (ni, nj, nk) = match dim {
                        0 => (i + 1, j, k),
                        1 => (i, j + 1, k),
                        _ => (i, j, k + 1),
                    };
                    if ni >= nx || nj >= ny || nk >= nz {
                        continue;
                    }

                    let idx = idx3d(i, j, k, nx, ny);
                    let idx_n = idx3d(ni, nj, nk, nx, ny);
                    if mask[idx] == 0 || mask[idx_n] == 0 {
                        continue;
                    }

                    // Phase coherence: 1 - |wrap(diff)| / π
                    let mut weight = 1.0 - wrap_angle(phase[idx_n] - phase[idx]).abs() / PI;

                    if has_mag {
                        let (m1, m2) = (mag[idx], mag[idx_n]);
                        let mag_max = m1.max(m2);
                        weight *= if mag_max > 1e-12 { (m1.min(m2) / mag_max).powi(2) } else { 0.0 };
                        weight *= 0.5 + 0.5 * (m1 / half_max_mag).min(1.0);
                        weight *= 0.5 + 0.5 * (m2 / half_max_mag).min(1.0);
                    }

                    weights[dim * n_total + idx] = (weight.clamp(0.0, 1.0) * 255.0) as u8;
                }
            }
        }
    }

    weights
}
