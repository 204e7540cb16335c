//! Run configuration for the thermometry orchestrators

use crate::error::{Result, ThermometryError};
use crate::phase::{DifferenceMode, ScalarEncoding};
use crate::susceptibility::{SusceptibilityMethod, SusceptibilityParameters};
use crate::temperature::{PrfParameters, ThresholdSpec};
use crate::unwrap::UnwrapMethod;

/// Every recognized processing parameter, with documented defaults.
///
/// The struct is built once per run and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ThermometryConfig {
    /// PRF thermal coefficient (ppm/°C)
    pub alpha: f64,
    /// Gyromagnetic ratio / 2π (MHz/T)
    pub gamma: f64,
    /// Field strength (T)
    pub b0: f64,
    /// Echo time (s)
    pub te: f64,
    /// Baseline body temperature (°C)
    pub bt: f64,
    /// Unwrap baseline and reference phase before differencing
    pub use_phase_unwrapping: bool,
    /// Unwrap the phase difference
    pub use_phase_unwrapping_post: bool,
    /// Complex division instead of real subtraction
    pub use_complex: bool,
    /// Upper end of the complex-difference output range (degrees)
    pub phase_range_shift_deg: f64,
    pub upper_threshold: Option<f64>,
    pub lower_threshold: Option<f64>,
    /// Synthetic disk mask radius as a fraction of the largest dimension
    pub simple_mask: Option<f64>,
    pub susceptibility_method: SusceptibilityMethod,
    /// Object-tissue susceptibility difference (ppm)
    pub delta_chi: f64,
    /// Main field direction in world coordinates
    pub b0_vector: [f64; 3],
    /// Raw phase encoding; `None` when inputs are already in radians
    pub encoding: Option<ScalarEncoding>,
    pub unwrap_method: UnwrapMethod,
}

impl Default for ThermometryConfig {
    fn default() -> Self {
        let prf = PrfParameters::default();
        Self {
            alpha: prf.alpha,
            gamma: prf.gamma,
            b0: prf.b0,
            te: prf.te,
            bt: prf.bt,
            use_phase_unwrapping: false,
            use_phase_unwrapping_post: false,
            use_complex: true,
            phase_range_shift_deg: 180.0,
            upper_threshold: None,
            lower_threshold: None,
            simple_mask: None,
            susceptibility_method: SusceptibilityMethod::Off,
            delta_chi: 0.0,
            b0_vector: [0.0, 0.0, 1.0],
            encoding: Some(ScalarEncoding::SignedNormalized),
            unwrap_method: UnwrapMethod::RegionGrowing,
        }
    }
}

impl ThermometryConfig {
    /// Check every parameter before any grid is touched
    pub fn validate(&self) -> Result<()> {
        self.prf().validate()?;
        self.susceptibility().validate()?;

        if !self.phase_range_shift_deg.is_finite() {
            return Err(ThermometryError::invalid("phase range shift must be finite"));
        }
        for (name, bound) in [("upper", self.upper_threshold), ("lower", self.lower_threshold)] {
            if bound.is_some_and(|b| b.is_nan()) {
                return Err(ThermometryError::invalid(format!("{} threshold is NaN", name)));
            }
        }
        if let (Some(lo), Some(hi)) = (self.lower_threshold, self.upper_threshold) {
            if lo > hi {
                return Err(ThermometryError::invalid(format!(
                    "lower threshold {} exceeds upper threshold {}",
                    lo, hi
                )));
            }
        }
        if let Some(r) = self.simple_mask {
            if !r.is_finite() || r <= 0.0 {
                return Err(ThermometryError::invalid(format!("disk mask radius must be positive, got {}", r)));
            }
        }
        Ok(())
    }

    pub fn prf(&self) -> PrfParameters {
        PrfParameters {
            alpha: self.alpha,
            gamma: self.gamma,
            b0: self.b0,
            te: self.te,
            bt: self.bt,
        }
    }

    pub fn susceptibility(&self) -> SusceptibilityParameters {
        SusceptibilityParameters {
            delta_chi: self.delta_chi,
            b0_direction: self.b0_vector,
            method: self.susceptibility_method,
        }
    }

    pub fn threshold_spec(&self) -> Option<ThresholdSpec> {
        ThresholdSpec::from_bounds(self.lower_threshold, self.upper_threshold)
    }

    pub fn difference_mode(&self) -> DifferenceMode {
        if self.use_complex {
            DifferenceMode::ComplexDivision
        } else {
            DifferenceMode::RealSubtraction
        }
    }

    pub fn phase_range_shift_rad(&self) -> f64 {
        self.phase_range_shift_deg.to_radians()
    }
}
