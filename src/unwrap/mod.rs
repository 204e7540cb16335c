//! Phase unwrapping
//!
//! - `romeo`: edge reliability weights for region growing
//! - `laplacian`: FFT Poisson-solver unwrapping
//! - `shift`: level alignment and global π-multiple disambiguation
//!
//! `PhaseUnwrapper` ties them together for whole voxel grids.

pub mod laplacian;
pub mod romeo;
pub mod shift;

pub use laplacian::*;
pub use romeo::*;
pub use shift::*;

use std::ops::Range;

use crate::error::{Result, ThermometryError};
use crate::grid::VoxelGrid;
use crate::region_grow::unwrap_all_regions;

/// 3D unwrapping algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnwrapMethod {
    /// Quality-guided region growing over phase-coherence edge weights
    #[default]
    RegionGrowing,
    /// FFT Laplacian unwrapping
    Laplacian,
}

/// Unwraps phase grids; the result is continuous and not bounded to [-π, π).
///
/// Inside the mask the output agrees with the input modulo 2π, taking the
/// whole-turn offset shared by most voxels.
#[derive(Debug, Clone, Default)]
pub struct PhaseUnwrapper {
    method: UnwrapMethod,
    mask: Option<Vec<u8>>,
}

impl PhaseUnwrapper {
    pub fn new(method: UnwrapMethod) -> Self {
        Self { method, mask: None }
    }

    /// Restrict unwrapping to the non-zero voxels of `mask`
    pub fn with_mask(mut self, mask: &VoxelGrid) -> Self {
        self.mask = Some(mask.to_mask());
        self
    }

    pub fn method(&self) -> UnwrapMethod {
        self.method
    }

    /// Unwrap a phase grid; geometry is copied from the input
    pub fn unwrap(&self, phase: &VoxelGrid) -> Result<VoxelGrid> {
        let dims = phase.dims();
        let mask = match &self.mask {
            Some(m) if m.len() == phase.len() => m.clone(),
            Some(m) => {
                return Err(ThermometryError::ShapeMismatch {
                    expected: dims,
                    found: (m.len(), 1, 1),
                })
            }
            None => vec![1u8; phase.len()],
        };

        let mut data = match self.method {
            UnwrapMethod::RegionGrowing => {
                let mut data = phase.data().to_vec();
                let weights = calculate_weights(&data, &[], &mask, dims);
                let regions = unwrap_all_regions(&mut data, &weights, &mask, dims);
                log::debug!("region growing unwrap: {} region(s)", regions);
                data
            }
            UnwrapMethod::Laplacian => laplacian_unwrap(phase.data(), &mask, dims, phase.geometry().spacing),
        };
        // Laplacian output loses the mean level; region growing keeps it up to whole turns
        align_to_wrapped(&mut data, phase.data(), &mask, self.method == UnwrapMethod::Laplacian);

        phase.with_data(data)
    }

    /// Unwrap, then pin the additive constant against the wrapped input
    pub fn unwrap_anchored(&self, phase: &VoxelGrid, candidates: Range<i32>) -> Result<VoxelGrid> {
        let unwrapped = self.unwrap(phase)?;
        resolve_global_shift(&unwrapped, phase, candidates)
    }
}
