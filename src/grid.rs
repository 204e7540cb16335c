//! 3D voxel grid with scanner geometry
//!
//! Samples are stored flat in Fortran order (column-major, matches the scanner volume and
//! the FFT helpers): index = i + j*nx + k*nx*ny, with i running along the
//! first geometric axis (x).

use crate::error::{Result, ThermometryError};

/// Index into a 3D array stored in Fortran order (column-major)
#[inline(always)]
pub fn idx3d(i: usize, j: usize, k: usize, nx: usize, ny: usize) -> usize {
    i + j * nx + k * nx * ny
}

/// Spatial placement of a voxel grid.
///
/// `direction` is row-major; its columns are the world-frame unit vectors of
/// the three image axes, so `world = origin + direction * diag(spacing) * index`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    pub origin: [f64; 3],
    pub spacing: [f64; 3],
    pub direction: [[f64; 3]; 3],
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            origin: [0.0; 3],
            spacing: [1.0; 3],
            direction: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }
}

impl Geometry {
    /// Express a world-frame vector in the image-axis frame (direction^T * v)
    pub fn world_to_index_frame(&self, v: [f64; 3]) -> [f64; 3] {
        let d = &self.direction;
        [
            d[0][0] * v[0] + d[1][0] * v[1] + d[2][0] * v[2],
            d[0][1] * v[0] + d[1][1] * v[1] + d[2][1] * v[2],
            d[0][2] * v[0] + d[1][2] * v[1] + d[2][2] * v[2],
        ]
    }
}

/// Immutable 3D array of f64 samples plus geometry.
///
/// Pipeline stages never mutate a grid after creation; each stage builds a
/// new grid, usually inheriting the geometry of its dominant input.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    data: Vec<f64>,
    dims: (usize, usize, usize),
    geometry: Geometry,
}

impl VoxelGrid {
    /// Wrap flat Fortran-order samples; fails if the length does not match `dims`.
    pub fn new(data: Vec<f64>, dims: (usize, usize, usize), geometry: Geometry) -> Result<Self> {
        let (nx, ny, nz) = dims;
        if data.len() != nx * ny * nz {
            return Err(ThermometryError::ShapeMismatch {
                expected: dims,
                found: (data.len(), 1, 1),
            });
        }
        Ok(Self { data, dims, geometry })
    }

    pub fn filled(value: f64, dims: (usize, usize, usize), geometry: Geometry) -> Self {
        let (nx, ny, nz) = dims;
        Self {
            data: vec![value; nx * ny * nz],
            dims,
            geometry,
        }
    }

    /// Build a grid by evaluating `f(i, j, k)` at every voxel
    pub fn from_fn<F>(dims: (usize, usize, usize), geometry: Geometry, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize) -> f64,
    {
        let (nx, ny, nz) = dims;
        let mut data = vec![0.0; nx * ny * nz];
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    data[idx3d(i, j, k, nx, ny)] = f(i, j, k);
                }
            }
        }
        Self { data, dims, geometry }
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        self.dims
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        let (nx, ny, _) = self.dims;
        self.data[idx3d(i, j, k, nx, ny)]
    }

    /// New grid with the same shape and geometry holding `data`
    pub fn with_data(&self, data: Vec<f64>) -> Result<Self> {
        Self::new(data, self.dims, self.geometry)
    }

    pub fn ensure_same_shape(&self, other: &VoxelGrid) -> Result<()> {
        if self.dims != other.dims {
            return Err(ThermometryError::ShapeMismatch {
                expected: self.dims,
                found: other.dims,
            });
        }
        Ok(())
    }

    /// Elementwise map; output inherits this grid's geometry
    pub fn map<F>(&self, f: F) -> VoxelGrid
    where
        F: Fn(f64) -> f64,
    {
        Self {
            data: self.data.iter().map(|&v| f(v)).collect(),
            dims: self.dims,
            geometry: self.geometry,
        }
    }

    /// Elementwise binary op; output inherits this grid's geometry
    pub fn zip_map<F>(&self, other: &VoxelGrid, f: F) -> Result<VoxelGrid>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.ensure_same_shape(other)?;
        Ok(Self {
            data: self.data.iter().zip(other.data.iter()).map(|(&a, &b)| f(a, b)).collect(),
            dims: self.dims,
            geometry: self.geometry,
        })
    }

    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    /// Finite [min, max] of the samples, for display-range metadata
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Binary view of the grid: 1 where the sample is non-zero
    pub fn to_mask(&self) -> Vec<u8> {
        self.data.iter().map(|&v| u8::from(v != 0.0)).collect()
    }

    pub fn from_mask(mask: &[u8], dims: (usize, usize, usize), geometry: Geometry) -> Result<Self> {
        Self::new(mask.iter().map(|&m| if m != 0 { 1.0 } else { 0.0 }).collect(), dims, geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = VoxelGrid::new(vec![0.0; 7], (2, 2, 2), Geometry::default()).unwrap_err();
        assert!(matches!(err, ThermometryError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_fortran_order() {
        let g = VoxelGrid::from_fn((3, 2, 2), Geometry::default(), |i, j, k| (i + 10 * j + 100 * k) as f64);
        assert_eq!(g.data()[1], 1.0);
        assert_eq!(g.data()[3], 10.0);
        assert_eq!(g.data()[6], 100.0);
        assert_eq!(g.get(2, 1, 1), 112.0);
    }

    #[test]
    fn test_zip_map_shape_mismatch() {
        let a = VoxelGrid::filled(1.0, (2, 2, 2), Geometry::default());
        let b = VoxelGrid::filled(1.0, (2, 2, 3), Geometry::default());
        assert!(a.zip_map(&b, |x, y| x + y).is_err());
    }

    #[test]
    fn test_geometry_inherited_from_left_operand() {
        let geom = Geometry { origin: [1.0, 2.0, 3.0], ..Geometry::default() };
        let a = VoxelGrid::filled(1.0, (2, 2, 2), geom);
        let b = VoxelGrid::filled(2.0, (2, 2, 2), Geometry::default());
        let c = a.zip_map(&b, |x, y| x + y).unwrap();
        assert_eq!(c.geometry().origin, [1.0, 2.0, 3.0]);
        assert!(c.data().iter().all(|&v| v == 3.0));
    }

    #[test]
    fn test_world_to_index_frame_permuted_axes() {
        // Image axis 0 points along world z, axis 2 along world x
        let geom = Geometry {
            direction: [[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
            ..Geometry::default()
        };
        let v = geom.world_to_index_frame([0.0, 0.0, 1.0]);
        assert_eq!(v, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_value_range() {
        let g = VoxelGrid::new(vec![3.0, -1.0, f64::NAN, 2.0], (4, 1, 1), Geometry::default()).unwrap();
        assert_eq!(g.value_range(), Some((-1.0, 3.0)));
    }
}
