//! Raw scanner phase intensities to radians

use std::f64::consts::PI;

use crate::error::{Result, ThermometryError};
use crate::grid::VoxelGrid;

/// How the scanner encodes phase in stored intensities.
///
/// Detecting the encoding from image metadata is the host's job; the core
/// only applies the affine map for the variant it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarEncoding {
    /// Signed intensities, [-4096, 4096] -> [-π, π] (scale π/4096)
    SignedNormalized,
    /// Unsigned 12-bit intensities, [0, 4095] -> [0, 2π) (scale 2π/4096)
    UnsignedNormalized,
    /// Unsigned 16-bit variant, [0, 2048] -> [-π, π]
    UnsignedShort,
}

impl ScalarEncoding {
    /// (scale, offset) of the affine map radians = raw * scale + offset
    fn affine(self) -> (f64, f64) {
        match self {
            ScalarEncoding::SignedNormalized => (PI / 4096.0, 0.0),
            ScalarEncoding::UnsignedNormalized => (2.0 * PI / 4096.0, 0.0),
            ScalarEncoding::UnsignedShort => (PI / 1024.0, -PI),
        }
    }

    /// Inclusive range of valid raw intensities
    pub fn raw_range(self) -> (f64, f64) {
        match self {
            ScalarEncoding::SignedNormalized => (-4096.0, 4096.0),
            ScalarEncoding::UnsignedNormalized => (0.0, 4095.0),
            ScalarEncoding::UnsignedShort => (0.0, 2048.0),
        }
    }

    #[inline]
    pub fn to_radians(self, raw: f64) -> f64 {
        let (scale, offset) = self.affine();
        raw * scale + offset
    }

    #[inline]
    pub fn from_radians(self, phase: f64) -> f64 {
        let (scale, offset) = self.affine();
        (phase - offset) / scale
    }
}

/// Convert a raw phase grid to radians.
///
/// Fails with `InvalidParameters` if any sample is non-finite or outside the
/// encoding's raw range.
pub fn to_radians(raw: &VoxelGrid, encoding: ScalarEncoding) -> Result<VoxelGrid> {
    let (lo, hi) = encoding.raw_range();
    let out_of_range = raw.data().iter().filter(|&&v| !(lo..=hi).contains(&v)).count();
    if out_of_range > 0 {
        return Err(ThermometryError::invalid(format!(
            "{} voxel(s) outside the {:?} range [{}, {}]",
            out_of_range, encoding, lo, hi
        )));
    }

    Ok(raw.map(|v| encoding.to_radians(v)))
}
