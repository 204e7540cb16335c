//! Susceptibility artifact correction
//!
//! A foreign object with susceptibility different from tissue perturbs the
//! main field around it, which shows up as a spurious phase change. The
//! perturbation is estimated with a forward dipole model on the object mask
//! and subtracted from the phase difference before temperature conversion.

pub mod segmentation;

pub use segmentation::*;

use std::f64::consts::PI;

use crate::error::{Result, ThermometryError};
use crate::fft::Fft3dWorkspace;
use crate::grid::VoxelGrid;
use crate::kernels::{dipole_kernel, dominant_b0_axis};
use crate::temperature::PrfParameters;

/// How the object mask for susceptibility correction is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SusceptibilityMethod {
    #[default]
    Off,
    /// Caller supplies the object mask
    Manual,
    /// Object mask segmented from a magnitude pair
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SusceptibilityParameters {
    /// Susceptibility difference between object and tissue (ppm)
    pub delta_chi: f64,
    /// Main field direction, world frame (normalized on use)
    pub b0_direction: [f64; 3],
    pub method: SusceptibilityMethod,
}

impl Default for SusceptibilityParameters {
    fn default() -> Self {
        Self {
            delta_chi: 0.0,
            b0_direction: [0.0, 0.0, 1.0],
            method: SusceptibilityMethod::Off,
        }
    }
}

impl SusceptibilityParameters {
    pub fn validate(&self) -> Result<()> {
        if !self.delta_chi.is_finite() {
            return Err(ThermometryError::invalid("deltaChi must be finite"));
        }
        let norm = self.b0_direction.iter().map(|v| v * v).sum::<f64>().sqrt();
        if !norm.is_finite() || norm < 1e-12 {
            return Err(ThermometryError::invalid("B0 direction must be a non-zero finite vector"));
        }
        Ok(())
    }
}

/// Forward dipole-field model for a binary object mask
pub struct SusceptibilityCorrector {
    params: SusceptibilityParameters,
    gamma: f64,
    b0: f64,
    te: f64,
}

impl SusceptibilityCorrector {
    /// Only gamma (γ/2π), B0 and TE are taken from the PRF parameters
    pub fn new(params: SusceptibilityParameters, prf: &PrfParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            gamma: prf.gamma,
            b0: prf.b0,
            te: prf.te,
        })
    }

    pub fn params(&self) -> &SusceptibilityParameters {
        &self.params
    }

    /// Phase offset (radians) induced outside the object by its susceptibility.
    ///
    /// offset = real(ifft(D * fft(mask))) * γ·2π·B0·TE·Δχ, zeroed inside the
    /// object. Geometry is copied from the mask.
    pub fn estimate_field_offset(&self, object_mask: &VoxelGrid) -> Result<VoxelGrid> {
        let scale = self.gamma * 2.0 * PI * self.b0 * self.te * self.params.delta_chi;
        if scale == 0.0 {
            return Ok(object_mask.map(|_| 0.0));
        }

        let (nx, ny, nz) = object_mask.dims();
        let mask: Vec<f64> = object_mask.data().iter().map(|&m| if m != 0.0 { 1.0 } else { 0.0 }).collect();

        let axis = dominant_b0_axis(object_mask.geometry(), self.params.b0_direction);
        log::debug!("susceptibility: B0 aligned with image axis {}", axis);
        let kernel = dipole_kernel((nx, ny, nz), axis);

        let mut workspace = Fft3dWorkspace::new(nx, ny, nz);
        let field = workspace.convolve_real(&mask, &kernel);

        let offset: Vec<f64> = field
            .iter()
            .zip(mask.iter())
            .map(|(&f, &m)| f * scale * (1.0 - m))
            .collect();

        object_mask.with_data(offset)
    }

    /// Subtract the estimated offset from a phase difference
    pub fn correct(&self, phase_diff: &VoxelGrid, object_mask: &VoxelGrid) -> Result<VoxelGrid> {
        phase_diff.ensure_same_shape(object_mask)?;
        let offset = self.estimate_field_offset(object_mask)?;
        phase_diff.zip_map(&offset, |p, o| p - o)
    }
}
