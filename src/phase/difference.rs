//! Baseline-to-reference phase difference

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::error::Result;
use crate::grid::VoxelGrid;

const TWO_PI: f64 = 2.0 * PI;

/// How the phase difference is formed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DifferenceMode {
    /// reference - baseline, unbounded
    RealSubtraction,
    /// angle(e^{iθ_ref} / e^{iθ_base}), remapped to (shift - 2π, shift]
    ComplexDivision,
}

/// Remap an angle into (shift - 2π, shift] for any finite shift
#[inline]
pub fn apply_range_shift(angle: f64, shift: f64) -> f64 {
    let below = (shift - angle).rem_euclid(TWO_PI);
    // rem_euclid can round up to the modulus itself
    if below >= TWO_PI {
        shift
    } else {
        shift - below
    }
}

/// Compute the phase change from `baseline` to `reference`.
///
/// `phase_range_shift` (radians) only applies to `ComplexDivision`. The
/// output inherits the baseline's geometry.
pub fn compute_difference(
    baseline: &VoxelGrid,
    reference: &VoxelGrid,
    mode: DifferenceMode,
    phase_range_shift: f64,
) -> Result<VoxelGrid> {
    match mode {
        DifferenceMode::RealSubtraction => baseline.zip_map(reference, |b, r| r - b),
        DifferenceMode::ComplexDivision => baseline.zip_map(reference, |b, r| {
            let rot = Complex64::from_polar(1.0, r) / Complex64::from_polar(1.0, b);
            apply_range_shift(rot.arg(), phase_range_shift)
        }),
    }
}
