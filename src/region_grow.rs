//! Quality-guided region growing for phase unwrapping

use std::f64::consts::PI;

use crate::grid::idx3d;
use crate::priority_queue::BucketQueue;

const TWO_PI: f64 = 2.0 * PI;

/// Neighbor offsets: (edge dimension, di, dj, dk)
const NEIGHBOR_OFFSETS: [(usize, isize, isize, isize); 6] = [
    (0, 1, 0, 0),
    (0, -1, 0, 0),
    (1, 0, 1, 0),
    (1, 0, -1, 0),
    (2, 0, 0, 1),
    (2, 0, 0, -1),
];

/// Voxel state while growing
pub const OUTSIDE: u8 = 0;
pub const PENDING: u8 = 1;
pub const VISITED: u8 = 2;

/// Queue item: (target voxel, reference voxel) as flat indices
type QueueItem = (usize, usize);

/// Grow one region from `seed`, unwrapping each voxel against the neighbor
/// it was reached from.
///
/// # Arguments
/// * `phase` - Phase values (nx * ny * nz), unwrapped in-place
/// * `weights` - Edge weights (3 * nx * ny * nz), layout [dim][x][y][z], edge stored at its lower voxel
/// * `state` - Per-voxel state: OUTSIDE, PENDING or VISITED (updated in-place)
/// * `dims` - Array dimensions
/// * `seed` - Seed voxel (i, j, k)
///
/// # Returns
/// Number of voxels visited, seed included
pub fn grow_region_unwrap(
    phase: &mut [f64],
    weights: &[u8],
    state: &mut [u8],
    dims: (usize, usize, usize),
    seed: (usize, usize, usize),
) -> usize {
    let (nx, ny, nz) = dims;
    let n_total = nx * ny * nz;
    let seed_idx = idx3d(seed.0, seed.1, seed.2, nx, ny);
    if state[seed_idx] != PENDING {
        return 0;
    }

    let mut pq: BucketQueue<QueueItem> = BucketQueue::new(256);
    state[seed_idx] = VISITED;
    let mut processed = 1usize;
    push_neighbors(&mut pq, seed, weights, state, dims);

    while let Some((target, reference)) = pq.pop() {
        if state[target] != PENDING {
            continue;
        }

        // new_val - 2π * round((new_val - old_val) / 2π)
        let diff = phase[target] - phase[reference];
        phase[target] -= TWO_PI * (diff / TWO_PI).round();

        state[target] = VISITED;
        processed += 1;

        let i = target % nx;
        let j = (target / nx) % ny;
        let k = target / (nx * ny);
        debug_assert!(target < n_total);
        push_neighbors(&mut pq, (i, j, k), weights, state, dims);
    }

    processed
}

fn push_neighbors(
    pq: &mut BucketQueue<QueueItem>,
    from: (usize, usize, usize),
    weights: &[u8],
    state: &[u8],
    dims: (usize, usize, usize),
) {
    let (nx, ny, nz) = dims;
    let n_total = nx * ny * nz;
    let (i, j, k) = from;
    let from_idx = idx3d(i, j, k, nx, ny);

    for &(dim, di, dj, dk) in &NEIGHBOR_OFFSETS {
        let ni = i as isize + di;
        let nj = j as isize + dj;
        let nk = k as isize + dk;
        if ni < 0 || nj < 0 || nk < 0 || ni >= nx as isize || nj >= ny as isize || nk >= nz as isize {
            continue;
        }
        let (ni, nj, nk) = (ni as usize, nj as usize, nk as usize);
        let n_idx = idx3d(ni, nj, nk, nx, ny);
        if state[n_idx] != PENDING {
            continue;
        }

        let edge = dim * n_total + idx3d(i.min(ni), j.min(nj), k.min(nk), nx, ny);
        let weight = weights[edge] as usize;
        if weight > 0 {
            pq.push(weight, (n_idx, from_idx));
        }
    }
}

/// Unwrap every masked voxel, reseeding until all connected pieces are done.
///
/// The first seed is the masked voxel closest to the volume center; later
/// seeds are taken in index order from whatever remains unvisited.
pub fn unwrap_all_regions(
    phase: &mut [f64],
    weights: &[u8],
    mask: &[u8],
    dims: (usize, usize, usize),
) -> usize {
    let (nx, ny, nz) = dims;
    let mut state: Vec<u8> = mask.iter().map(|&m| if m != 0 { PENDING } else { OUTSIDE }).collect();
    let mut regions = 0usize;

    if let Some(seed) = central_seed(&state, dims) {
        grow_region_unwrap(phase, weights, &mut state, dims, seed);
        regions += 1;
    }

    for idx in 0..state.len() {
        if state[idx] == PENDING {
            let seed = (idx % nx, (idx / nx) % ny, idx / (nx * ny));
            debug_assert!(seed.2 < nz);
            grow_region_unwrap(phase, weights, &mut state, dims, seed);
            regions += 1;
        }
    }

    regions
}

fn central_seed(state: &[u8], dims: (usize, usize, usize)) -> Option<(usize, usize, usize)> {
    let (nx, ny, nz) = dims;
    let (cx, cy, cz) = (nx as f64 / 2.0, ny as f64 / 2.0, nz as f64 / 2.0);
    let mut best: Option<((usize, usize, usize), f64)> = None;

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                if state[idx3d(i, j, k, nx, ny)] != PENDING {
                    continue;
                }
                let d2 = (i as f64 - cx).powi(2) + (j as f64 - cy).powi(2) + (k as f64 - cz).powi(2);
                if best.map_or(true, |(_, b)| d2 < b) {
                    best = Some(((i, j, k), d2));
                }
            }
        }
    }

    best.map(|(seed, _)| seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_unwrap() {
        let (nx, ny, nz) = (3, 3, 3);

        let mut phase = vec![0.0f64; nx * ny * nz];
        phase[idx3d(1, 0, 0, nx, ny)] = 0.1;
        phase[idx3d(2, 0, 0, nx, ny)] = 0.2 - TWO_PI;

        let weights = vec![255u8; 3 * nx * ny * nz];
        let mut state = vec![PENDING; nx * ny * nz];

        let processed = grow_region_unwrap(&mut phase, &weights, &mut state, (nx, ny, nz), (1, 1, 1));

        assert_eq!(processed, 27);
        let unwrapped_val = phase[idx3d(2, 0, 0, nx, ny)];
        assert!((unwrapped_val - 0.2).abs() < 1e-12, "Expected 0.2, got {}", unwrapped_val);
    }

    #[test]
    fn test_seed_outside_mask_does_nothing() {
        let mut phase = vec![0.0; 8];
        let weights = vec![255u8; 24];
        let mut state = vec![OUTSIDE; 8];
        assert_eq!(grow_region_unwrap(&mut phase, &weights, &mut state, (2, 2, 2), (0, 0, 0)), 0);
    }

    #[test]
    fn test_disconnected_regions_are_reseeded() {
        // Two voxels separated by a masked-out gap along x
        let (nx, ny, nz) = (5, 1, 1);
        let mut phase = vec![0.0, 0.0, 0.0, 1.0, 1.0 + TWO_PI];
        let mask = vec![1, 0, 0, 1, 1];
        let weights = vec![255u8; 3 * nx * ny * nz];

        let regions = unwrap_all_regions(&mut phase, &weights, &mask, (nx, ny, nz));

        assert_eq!(regions, 2);
        assert!((phase[4] - 1.0).abs() < 1e-12);
    }
}
