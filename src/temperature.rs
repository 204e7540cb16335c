//! PRF-shift temperature conversion and output thresholding
//!
//! ΔT = Δφ / (α · 2π · γ · B0 · TE), T = ΔT + BT
//!
//! γ is stored pre-divided by 2π (42.576 MHz/T for ¹H) and α in ppm/°C, so
//! the MHz·ppm product is in Hz and the denominator is in rad/°C.

use std::f64::consts::PI;

use crate::error::{Result, ThermometryError};
use crate::grid::VoxelGrid;

/// PRF equation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrfParameters {
    /// PRF thermal coefficient (ppm/°C)
    pub alpha: f64,
    /// Gyromagnetic ratio / 2π (MHz/T)
    pub gamma: f64,
    /// Main field strength (T)
    pub b0: f64,
    /// Echo time (s)
    pub te: f64,
    /// Baseline body temperature (°C)
    pub bt: f64,
}

impl Default for PrfParameters {
    fn default() -> Self {
        Self {
            alpha: -0.01,
            gamma: 42.576,
            b0: 3.0,
            te: 0.01,
            bt: 37.0,
        }
    }
}

impl PrfParameters {
    /// Phase change per degree Celsius: α · 2π · γ · B0 · TE
    pub fn phase_per_degree(&self) -> f64 {
        self.alpha * 2.0 * PI * self.gamma * self.b0 * self.te
    }

    pub fn validate(&self) -> Result<()> {
        let values = [self.alpha, self.gamma, self.b0, self.te, self.bt];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ThermometryError::invalid(format!("PRF parameters must be finite: {:?}", self)));
        }
        let denom = self.phase_per_degree();
        if denom == 0.0 || !denom.is_finite() {
            return Err(ThermometryError::invalid(format!(
                "PRF denominator alpha*2pi*gamma*B0*TE is {} (alpha={}, gamma={}, B0={}, TE={})",
                denom, self.alpha, self.gamma, self.b0, self.te
            )));
        }
        Ok(())
    }
}

/// Convert a phase difference (radians) into temperature (°C)
pub fn to_temperature(phase_diff: &VoxelGrid, params: &PrfParameters) -> Result<VoxelGrid> {
    params.validate()?;
    let denom = params.phase_per_degree();
    let bt = params.bt;
    Ok(phase_diff.map(|p| p / denom + bt))
}

/// Inclusive acceptance window for output temperatures
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThresholdSpec {
    pub lower: f64,
    pub upper: f64,
}

impl ThresholdSpec {
    /// Window from optional bounds; a missing bound is open. None when both are missing.
    pub fn from_bounds(lower: Option<f64>, upper: Option<f64>) -> Option<Self> {
        if lower.is_none() && upper.is_none() {
            return None;
        }
        Some(Self {
            lower: lower.unwrap_or(f64::NEG_INFINITY),
            upper: upper.unwrap_or(f64::INFINITY),
        })
    }

    #[inline]
    pub fn accepts(&self, v: f64) -> bool {
        v >= self.lower && v <= self.upper
    }
}

/// Replace voxels outside [lower, upper] with 0.0 (not clamped).
///
/// Without a window the input is returned unchanged.
pub fn threshold(temp: &VoxelGrid, spec: Option<&ThresholdSpec>) -> VoxelGrid {
    match spec {
        None => temp.clone(),
        Some(spec) => temp.map(|v| if spec.accepts(v) { v } else { 0.0 }),
    }
}
