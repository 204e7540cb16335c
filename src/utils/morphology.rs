//! Binary morphology on 3D masks
//!
//! Structuring elements are digital balls: offsets with
//! dx² + dy² + dz² <= r(r + 1), i.e. within r + 0.5 voxels. Radius 1 is the
//! 18-neighborhood.

use crate::grid::idx3d;

/// Offsets of a ball structuring element of the given radius
pub fn ball_offsets(radius: usize) -> Vec<(isize, isize, isize)> {
    let r = radius as isize;
    let limit = r * (r + 1);
    let mut offsets = Vec::new();
    for dz in -r..=r {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy + dz * dz <= limit {
                    offsets.push((dx, dy, dz));
                }
            }
        }
    }
    offsets
}

#[inline]
fn shifted(
    (i, j, k): (usize, usize, usize),
    (dx, dy, dz): (isize, isize, isize),
    (nx, ny, nz): (usize, usize, usize),
) -> Option<usize> {
    let x = i as isize + dx;
    let y = j as isize + dy;
    let z = k as isize + dz;
    if x < 0 || y < 0 || z < 0 || x >= nx as isize || y >= ny as isize || z >= nz as isize {
        return None;
    }
    Some(idx3d(x as usize, y as usize, z as usize, nx, ny))
}

/// Binary dilation: a voxel is set if any voxel under the ball is set
pub fn dilate(mask: &[u8], dims: (usize, usize, usize), radius: usize) -> Vec<u8> {
    let (nx, ny, nz) = dims;
    let offsets = ball_offsets(radius);
    let mut out = vec![0u8; mask.len()];

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                if mask[idx3d(i, j, k, nx, ny)] == 0 {
                    continue;
                }
                for &off in &offsets {
                    if let Some(n) = shifted((i, j, k), off, dims) {
                        out[n] = 1;
                    }
                }
            }
        }
    }

    out
}

/// Binary erosion: a voxel survives if every in-bounds voxel under the ball
/// is set. Outside the volume counts as foreground, so objects touching the
/// border are not eaten away from it.
pub fn erode(mask: &[u8], dims: (usize, usize, usize), radius: usize) -> Vec<u8> {
    let (nx, ny, nz) = dims;
    let offsets = ball_offsets(radius);
    let mut out = vec![0u8; mask.len()];

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let idx = idx3d(i, j, k, nx, ny);
                if mask[idx] == 0 {
                    continue;
                }
                let keep = offsets
                    .iter()
                    .all(|&off| shifted((i, j, k), off, dims).map_or(true, |n| mask[n] != 0));
                if keep {
                    out[idx] = 1;
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(mask: &[u8]) -> usize {
        mask.iter().filter(|&&m| m != 0).count()
    }

    #[test]
    fn test_ball_sizes() {
        assert_eq!(ball_offsets(0).len(), 1);
        assert_eq!(ball_offsets(1).len(), 19);
        // r = 2: all offsets with squared norm <= 6
        assert_eq!(ball_offsets(2).len(), 81);
    }

    #[test]
    fn test_dilate_single_voxel() {
        let n = 5;
        let mut mask = vec![0u8; n * n * n];
        mask[idx3d(2, 2, 2, n, n)] = 1;
        let out = dilate(&mask, (n, n, n), 1);
        assert_eq!(count(&out), 19);
        assert_eq!(out[idx3d(3, 3, 2, n, n)], 1);
        assert_eq!(out[idx3d(3, 3, 3, n, n)], 0);
    }

    #[test]
    fn test_erode_removes_thin_objects() {
        let n = 7;
        let mut mask = vec![0u8; n * n * n];
        for i in 0..n {
            mask[idx3d(i, 3, 3, n, n)] = 1;
        }
        assert_eq!(count(&erode(&mask, (n, n, n), 1)), 0);
    }

    #[test]
    fn test_erode_full_volume_is_unchanged() {
        let n = 4;
        let mask = vec![1u8; n * n * n];
        assert_eq!(erode(&mask, (n, n, n), 2), mask);
    }

    #[test]
    fn test_erode_shrinks_cube() {
        let n = 9;
        let mut mask = vec![0u8; n * n * n];
        for k in 2..7 {
            for j in 2..7 {
                for i in 2..7 {
                    mask[idx3d(i, j, k, n, n)] = 1;
                }
            }
        }
        let out = erode(&mask, (n, n, n), 1);
        assert_eq!(out[idx3d(4, 4, 4, n, n)], 1);
        assert_eq!(out[idx3d(2, 4, 4, n, n)], 0);
        assert!(count(&out) < count(&mask));
    }
}
