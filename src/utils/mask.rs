//! Mask generation utilities

use crate::error::Result;
use crate::grid::{idx3d, VoxelGrid};

/// Create a binary sphere mask on a 3D volume
///
/// Voxels within `radius` (in voxels) of the center are 1, all others 0.
/// Fortran order: index = x + y*nx + z*nx*ny.
pub fn create_sphere_mask(
    dims: (usize, usize, usize),
    center: (f64, f64, f64),
    radius: f64,
) -> Vec<u8> {
    let (nx, ny, nz) = dims;
    let mut mask = vec![0u8; nx * ny * nz];
    let r2 = radius * radius;

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let dx = i as f64 - center.0;
                let dy = j as f64 - center.1;
                let dz = k as f64 - center.2;
                if dx * dx + dy * dy + dz * dz <= r2 {
                    mask[idx3d(i, j, k, nx, ny)] = 1;
                }
            }
        }
    }

    mask
}

/// Synthetic disk mask centered in the grid (grid-relative (0.5, 0.5, 0.5)).
///
/// `radius_fraction` is relative to the largest grid dimension. On a single
/// slice this is a disk; on a volume it is a ball.
pub fn disk_mask(like: &VoxelGrid, radius_fraction: f64) -> Result<VoxelGrid> {
    let (nx, ny, nz) = like.dims();
    let center = (
        0.5 * (nx as f64 - 1.0),
        0.5 * (ny as f64 - 1.0),
        0.5 * (nz as f64 - 1.0),
    );
    let radius = radius_fraction * nx.max(ny).max(nz) as f64;

    let mask = create_sphere_mask(like.dims(), center, radius);
    VoxelGrid::from_mask(&mask, like.dims(), *like.geometry())
}

/// Zero every voxel where `mask` is zero
pub fn apply_mask(grid: &VoxelGrid, mask: &VoxelGrid) -> Result<VoxelGrid> {
    grid.zip_map(mask, |v, m| if m != 0.0 { v } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Geometry;

    #[test]
    fn test_sphere_mask_basic() {
        let mask = create_sphere_mask((10, 10, 10), (5.0, 5.0, 5.0), 3.0);
        assert_eq!(mask.len(), 1000);
        assert_eq!(mask[5 + 5 * 10 + 5 * 100], 1);
        assert_eq!(mask[0], 0);

        let count: usize = mask.iter().map(|&m| m as usize).sum();
        assert!(count > 50 && count < 200, "Sphere voxel count {} seems wrong", count);
    }

    #[test]
    fn test_disk_mask_on_single_slice() {
        let like = VoxelGrid::filled(0.0, (21, 21, 1), Geometry::default());
        let mask = disk_mask(&like, 0.25).unwrap();

        assert_eq!(mask.get(10, 10, 0), 1.0);
        assert_eq!(mask.get(0, 0, 0), 0.0);
        // radius 5.25 voxels around (10, 10)
        assert_eq!(mask.get(15, 10, 0), 1.0);
        assert_eq!(mask.get(16, 10, 0), 0.0);
    }

    #[test]
    fn test_apply_mask() {
        let g = VoxelGrid::filled(7.0, (2, 1, 1), Geometry::default());
        let m = VoxelGrid::new(vec![1.0, 0.0], (2, 1, 1), Geometry::default()).unwrap();
        assert_eq!(apply_mask(&g, &m).unwrap().data(), &[7.0, 0.0]);
    }
}
