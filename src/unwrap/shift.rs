//! Global shift disambiguation after unwrapping
//!
//! Unwrapping algorithms fix the field only up to an additive constant. The
//! constant is recovered by scanning integer multiples of π and keeping the
//! one that brings the field closest (mean absolute difference) to a target.
//!
//! Before that scan, an unwrapped field is aligned voxel-wise with its own
//! wrapped input so the two differ only by whole turns inside the mask.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::ops::Range;

use crate::error::Result;
use crate::grid::VoxelGrid;

/// Candidate multiples for fields unwrapped from raw inputs
pub const RAW_SHIFT_CANDIDATES: Range<i32> = -4..4;

/// Candidate multiples for an unwrapped phase difference
pub const POST_SHIFT_CANDIDATES: Range<i32> = -2..3;

/// Circular mean of wrap(wrapped - unwrapped) over the non-zero voxels of `mask`
///
/// Returns 0 when the mask is empty or the residuals cancel out.
pub fn circular_offset(unwrapped: &[f64], wrapped: &[f64], mask: &[u8]) -> f64 {
    let (mut s, mut c) = (0.0, 0.0);
    for ((&u, &w), &m) in unwrapped.iter().zip(wrapped).zip(mask) {
        if m != 0 {
            let (sin, cos) = (w - u).sin_cos();
            s += sin;
            c += cos;
        }
    }
    if s.hypot(c) < 1e-12 {
        return 0.0;
    }
    s.atan2(c)
}

/// Most common whole-turn count round((unwrapped - wrapped) / 2π) inside `mask`
///
/// Ties go to the count closest to zero, then the lower one.
pub fn dominant_turns(unwrapped: &[f64], wrapped: &[f64], mask: &[u8]) -> i64 {
    let mut histogram: BTreeMap<i64, usize> = BTreeMap::new();
    for ((&u, &w), &m) in unwrapped.iter().zip(wrapped).zip(mask) {
        if m != 0 {
            *histogram.entry(((u - w) / (2.0 * PI)).round() as i64).or_default() += 1;
        }
    }
    histogram
        .into_iter()
        .max_by(|(a, ca), (b, cb)| ca.cmp(cb).then(b.abs().cmp(&a.abs())).then(b.cmp(a)))
        .map_or(0, |(turns, _)| turns)
}

/// Shift the masked voxels of `unwrapped` so they agree with `wrapped` modulo 2π
///
/// `continuous` also removes a non-integer offset (needed when the unwrapper
/// loses the field's mean level). Voxels outside the mask are left as they are.
pub fn align_to_wrapped(unwrapped: &mut [f64], wrapped: &[f64], mask: &[u8], continuous: bool) {
    let level = if continuous { circular_offset(unwrapped, wrapped, mask) } else { 0.0 };
    let turns = if level != 0.0 {
        let shifted: Vec<f64> = unwrapped.iter().map(|&u| u + level).collect();
        dominant_turns(&shifted, wrapped, mask)
    } else {
        dominant_turns(unwrapped, wrapped, mask)
    };

    let offset = level - turns as f64 * 2.0 * PI;
    if offset == 0.0 {
        return;
    }
    log::debug!("aligned unwrapped field by {:.6} rad ({} turn(s))", offset, -turns);
    for (u, &m) in unwrapped.iter_mut().zip(mask) {
        if m != 0 {
            *u += offset;
        }
    }
}

/// Mean of |field + nπ - target| over all voxels
fn mean_abs_offset(field: &[f64], target: &[f64], n: i32) -> f64 {
    if field.is_empty() {
        return 0.0;
    }
    let shift = n as f64 * PI;
    field.iter()
        .zip(target.iter())
        .map(|(&f, &t)| (f + shift - t).abs())
        .sum::<f64>()
        / field.len() as f64
}

/// Pick the multiple of π in `candidates` minimizing the mean absolute
/// difference to `target`; ties go to the first (lowest) candidate.
pub fn best_shift_multiple(field: &[f64], target: &[f64], candidates: Range<i32>) -> Option<i32> {
    let mut best: Option<(i32, f64)> = None;
    for n in candidates {
        let score = mean_abs_offset(field, target, n);
        if best.map_or(true, |(_, s)| score < s) {
            best = Some((n, score));
        }
    }
    best.map(|(n, _)| n)
}

/// Return `reference + n*π` for the winning multiple n.
///
/// An empty candidate range leaves the reference unshifted.
pub fn resolve_global_shift(
    reference: &VoxelGrid,
    baseline: &VoxelGrid,
    candidates: Range<i32>,
) -> Result<VoxelGrid> {
    reference.ensure_same_shape(baseline)?;

    let n = best_shift_multiple(reference.data(), baseline.data(), candidates).unwrap_or(0);
    log::debug!("global shift: selected {}π", n);

    let shift = n as f64 * PI;
    Ok(reference.map(|v| v + shift))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Geometry;

    fn grid(values: Vec<f64>) -> VoxelGrid {
        let n = values.len();
        VoxelGrid::new(values, (n, 1, 1), Geometry::default()).unwrap()
    }

    #[test]
    fn test_recovers_offset() {
        let baseline = grid(vec![0.1, 0.2, -0.3, 0.4]);
        let reference = baseline.map(|v| v - 2.0 * PI);

        let resolved = resolve_global_shift(&reference, &baseline, RAW_SHIFT_CANDIDATES).unwrap();
        for (r, b) in resolved.data().iter().zip(baseline.data()) {
            assert!((r - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_tie_breaks_to_first_candidate() {
        // field 0, target π/2: n = 0 and n = 1 are equally far
        let field = vec![0.0; 4];
        let target = vec![PI / 2.0; 4];
        assert_eq!(best_shift_multiple(&field, &target, -2..3), Some(0));
    }

    #[test]
    fn test_post_window_cannot_reach_large_offsets() {
        let target = vec![0.0; 3];
        let field = vec![4.0 * PI; 3];
        // best reachable is n = -2
        assert_eq!(best_shift_multiple(&field, &target, POST_SHIFT_CANDIDATES), Some(-2));
    }

    #[test]
    fn test_circular_offset_restores_lost_level() {
        let wrapped = vec![2.5, 2.6, -3.0, 2.4];
        // same field with its mean removed, one voxel a turn apart
        let mean = (2.5 + 2.6 + (-3.0 + 2.0 * PI) + 2.4) / 4.0;
        let unwrapped = vec![2.5 - mean, 2.6 - mean, -3.0 + 2.0 * PI - mean, 2.4 - mean];
        let offset = circular_offset(&unwrapped, &wrapped, &[1; 4]);
        assert!((offset - mean).abs() < 1e-12, "{} vs {}", offset, mean);
    }

    #[test]
    fn test_dominant_turns_ignores_masked_voxels() {
        let wrapped = vec![0.0; 5];
        let unwrapped = vec![2.0 * PI, 2.0 * PI, 0.0, -2.0 * PI, -2.0 * PI];
        assert_eq!(dominant_turns(&unwrapped, &wrapped, &[1, 1, 1, 0, 0]), 1);
        assert_eq!(dominant_turns(&unwrapped, &wrapped, &[0, 0, 1, 1, 1]), -1);
        // three-way tie goes to zero turns
        assert_eq!(dominant_turns(&unwrapped, &wrapped, &[1, 0, 1, 1, 0]), 0);
        assert_eq!(dominant_turns(&unwrapped, &wrapped, &[0; 5]), 0);
    }

    #[test]
    fn test_align_leaves_outside_voxels() {
        let wrapped = vec![1.0, 1.0, 1.0, 0.0];
        let mut unwrapped = vec![1.0 + 2.0 * PI, 1.0 + 2.0 * PI, 1.0, 0.0];
        align_to_wrapped(&mut unwrapped, &wrapped, &[1, 1, 1, 0], false);
        assert!((unwrapped[0] - 1.0).abs() < 1e-12);
        assert!((unwrapped[2] - (1.0 - 2.0 * PI)).abs() < 1e-12);
        assert_eq!(unwrapped[3], 0.0);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = grid(vec![0.0; 4]);
        let b = grid(vec![0.0; 5]);
        assert!(resolve_global_shift(&a, &b, RAW_SHIFT_CANDIDATES).is_err());
    }
}
