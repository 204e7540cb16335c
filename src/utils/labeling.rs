//! Connected component labeling for 3D binary masks
//!
//! Face connectivity (6 neighbors), BFS flood fill. Components are
//! relabeled by decreasing size so label 1 is always the largest survivor.

use std::collections::VecDeque;

use crate::grid::idx3d;

const NEIGHBORS: [(isize, isize, isize); 6] = [
    (-1, 0, 0), (1, 0, 0), (0, -1, 0), (0, 1, 0), (0, 0, -1), (0, 0, 1),
];

/// Result of labeling: per-voxel label (0 = background) and component sizes,
/// where `sizes[l - 1]` is the voxel count of label `l`
#[derive(Debug, Clone)]
pub struct Components {
    pub labels: Vec<u32>,
    pub sizes: Vec<usize>,
}

impl Components {
    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    /// Binary mask of a single label
    pub fn select(&self, label: u32) -> Vec<u8> {
        self.labels.iter().map(|&l| u8::from(l != 0 && l == label)).collect()
    }
}

/// Label face-connected components of `mask`
///
/// Provisional labels follow scan order; the final labels are sorted by
/// decreasing size (ties keep scan order) and components smaller than
/// `min_size` voxels are dropped to background.
pub fn label_components(mask: &[u8], dims: (usize, usize, usize), min_size: usize) -> Components {
    let (nx, ny, nz) = dims;
    let mut provisional = vec![0u32; mask.len()];
    let mut sizes: Vec<usize> = Vec::new();
    let mut queue: VecDeque<(usize, usize, usize)> = VecDeque::new();

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let start = idx3d(i, j, k, nx, ny);
                if mask[start] == 0 || provisional[start] != 0 {
                    continue;
                }

                sizes.push(0);
                let label = sizes.len() as u32;
                provisional[start] = label;
                queue.push_back((i, j, k));

                while let Some((x, y, z)) = queue.pop_front() {
                    sizes[label as usize - 1] += 1;
                    for &(dx, dy, dz) in &NEIGHBORS {
                        let xn = x as isize + dx;
                        let yn = y as isize + dy;
                        let zn = z as isize + dz;
                        if xn < 0 || yn < 0 || zn < 0 || xn >= nx as isize || yn >= ny as isize || zn >= nz as isize {
                            continue;
                        }
                        let n = idx3d(xn as usize, yn as usize, zn as usize, nx, ny);
                        if mask[n] != 0 && provisional[n] == 0 {
                            provisional[n] = label;
                            queue.push_back((xn as usize, yn as usize, zn as usize));
                        }
                    }
                }
            }
        }
    }

    // Relabel by decreasing size
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| sizes[b].cmp(&sizes[a]));

    let mut remap = vec![0u32; sizes.len() + 1];
    let mut kept_sizes = Vec::new();
    for &old in &order {
        if sizes[old] < min_size {
            continue;
        }
        kept_sizes.push(sizes[old]);
        remap[old + 1] = kept_sizes.len() as u32;
    }

    let labels = provisional.iter().map(|&l| remap[l as usize]).collect();

    Components { labels, sizes: kept_sizes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_box(mask: &mut [u8], dims: (usize, usize, usize), lo: (usize, usize, usize), hi: (usize, usize, usize)) {
        let (nx, ny, _) = dims;
        for k in lo.2..hi.2 {
            for j in lo.1..hi.1 {
                for i in lo.0..hi.0 {
                    mask[idx3d(i, j, k, nx, ny)] = 1;
                }
            }
        }
    }

    #[test]
    fn test_largest_component_gets_label_one() {
        let dims = (10, 10, 10);
        let mut mask = vec![0u8; 1000];
        fill_box(&mut mask, dims, (0, 0, 0), (2, 2, 2)); // 8 voxels
        fill_box(&mut mask, dims, (5, 5, 5), (9, 9, 9)); // 64 voxels

        let cc = label_components(&mask, dims, 0);
        assert_eq!(cc.count(), 2);
        assert_eq!(cc.sizes, vec![64, 8]);
        assert_eq!(cc.labels[idx3d(6, 6, 6, 10, 10)], 1);
        assert_eq!(cc.labels[0], 2);
    }

    #[test]
    fn test_small_components_dropped() {
        let dims = (10, 10, 10);
        let mut mask = vec![0u8; 1000];
        fill_box(&mut mask, dims, (0, 0, 0), (3, 3, 3)); // 27 voxels
        fill_box(&mut mask, dims, (5, 5, 5), (9, 9, 9)); // 64 voxels

        let cc = label_components(&mask, dims, 30);
        assert_eq!(cc.sizes, vec![64]);
        assert_eq!(cc.labels[0], 0);
        assert_eq!(cc.select(1).iter().filter(|&&m| m == 1).count(), 64);
    }

    #[test]
    fn test_diagonal_voxels_are_separate() {
        let dims = (2, 2, 1);
        let mask = vec![1, 0, 0, 1];
        let cc = label_components(&mask, dims, 0);
        assert_eq!(cc.count(), 2);
    }

    #[test]
    fn test_empty_mask() {
        let cc = label_components(&[0u8; 8], (2, 2, 2), 0);
        assert_eq!(cc.count(), 0);
        assert!(cc.select(1).iter().all(|&m| m == 0));
    }
}
