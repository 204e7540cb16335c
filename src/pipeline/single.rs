//! Single baseline/reference pair to temperature map
//!
//! Stages run in a fixed order with no branching back:
//!
//! mask -> radians -> unwrap raw -> difference -> unwrap post ->
//! susceptibility -> temperature -> threshold
//!
//! Every stage after the mask is optional except differencing and the
//! temperature conversion. Inputs are checked before the first stage runs,
//! so a failing call never yields a partial result.

use crate::error::{Result, ThermometryError};
use crate::grid::VoxelGrid;
use crate::phase::{compute_difference, to_radians};
use crate::susceptibility::{segment_object, SusceptibilityCorrector, SusceptibilityMethod};
use crate::temperature::{threshold, to_temperature};
use crate::unwrap::{PhaseUnwrapper, POST_SHIFT_CANDIDATES, RAW_SHIFT_CANDIDATES};
use crate::utils::{apply_mask, disk_mask};

use super::config::ThermometryConfig;

/// Where the susceptibility object mask comes from
#[derive(Debug, Clone, Copy, Default)]
pub enum SusceptibilitySource<'a> {
    #[default]
    None,
    /// Binary object mask (Manual)
    ObjectMask(&'a VoxelGrid),
    /// Magnitude pair to segment the object from (Auto)
    Magnitudes {
        baseline: &'a VoxelGrid,
        reference: &'a VoxelGrid,
    },
}

/// Everything one frame needs besides the configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInputs<'a> {
    pub baseline: Option<&'a VoxelGrid>,
    pub reference: Option<&'a VoxelGrid>,
    pub mask: Option<&'a VoxelGrid>,
    pub susceptibility: SusceptibilitySource<'a>,
}

/// Presence check for the two phase inputs.
///
/// Only presence is checked; the inputs are not compared with each other or
/// with any output here.
pub fn require_baseline_and_reference<'a>(
    baseline: Option<&'a VoxelGrid>,
    reference: Option<&'a VoxelGrid>,
) -> Result<(&'a VoxelGrid, &'a VoxelGrid)> {
    match (baseline, reference) {
        (Some(b), Some(r)) => Ok((b, r)),
        (None, Some(_)) => Err(ThermometryError::missing("baseline phase")),
        (Some(_), None) => Err(ThermometryError::missing("reference phase")),
        (None, None) => Err(ThermometryError::missing("baseline and reference phase")),
    }
}

#[derive(Debug, Clone)]
pub struct SingleFrameOrchestrator {
    config: ThermometryConfig,
}

impl SingleFrameOrchestrator {
    /// Fails with `InvalidParameters` if the configuration does not validate
    pub fn new(config: ThermometryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ThermometryConfig {
        &self.config
    }

    /// Temperature map (°C) for one pair, without susceptibility inputs
    pub fn run(
        &self,
        baseline: Option<&VoxelGrid>,
        reference: Option<&VoxelGrid>,
        mask: Option<&VoxelGrid>,
    ) -> Result<VoxelGrid> {
        self.run_frame(&FrameInputs {
            baseline,
            reference,
            mask,
            susceptibility: SusceptibilitySource::None,
        })
    }

    /// Temperature map (°C) for one pair. Output geometry is the baseline's.
    pub fn run_frame(&self, inputs: &FrameInputs) -> Result<VoxelGrid> {
        let (baseline, reference) = require_baseline_and_reference(inputs.baseline, inputs.reference)?;
        self.check_inputs(baseline, reference, inputs)?;

        let cfg = &self.config;
        let prf = cfg.prf();
        log::info!("Processing started: {:?} voxels", baseline.dims());

        // Mask; the synthetic disk wins over a supplied mask
        let mask = match (cfg.simple_mask, inputs.mask) {
            (Some(fraction), _) => Some(disk_mask(baseline, fraction)?),
            (None, Some(m)) => Some(m.clone()),
            (None, None) => None,
        };
        let (baseline, reference) = match &mask {
            Some(m) => (apply_mask(baseline, m)?, apply_mask(reference, m)?),
            None => (baseline.clone(), reference.clone()),
        };

        let (baseline, reference) = match cfg.encoding {
            Some(encoding) => (to_radians(&baseline, encoding)?, to_radians(&reference, encoding)?),
            None => (baseline, reference),
        };

        let unwrapper = match &mask {
            Some(m) => PhaseUnwrapper::new(cfg.unwrap_method).with_mask(m),
            None => PhaseUnwrapper::new(cfg.unwrap_method),
        };

        let (baseline, reference) = if cfg.use_phase_unwrapping {
            (
                unwrapper.unwrap_anchored(&baseline, RAW_SHIFT_CANDIDATES)?,
                unwrapper.unwrap_anchored(&reference, RAW_SHIFT_CANDIDATES)?,
            )
        } else {
            (baseline, reference)
        };

        let mut phase_diff = compute_difference(&baseline, &reference, cfg.difference_mode(), cfg.phase_range_shift_rad())?;

        if cfg.use_phase_unwrapping_post {
            phase_diff = unwrapper.unwrap_anchored(&phase_diff, POST_SHIFT_CANDIDATES)?;
        }

        if let Some(object_mask) = self.object_mask(&inputs.susceptibility)? {
            let corrector = SusceptibilityCorrector::new(cfg.susceptibility(), &prf)?;
            phase_diff = corrector.correct(&phase_diff, &object_mask)?;
        }

        let temperature = to_temperature(&phase_diff, &prf)?;
        let result = threshold(&temperature, cfg.threshold_spec().as_ref());

        log::info!("Processing completed");
        Ok(result)
    }

    /// Shape and availability checks for every grid the run will combine
    fn check_inputs(&self, baseline: &VoxelGrid, reference: &VoxelGrid, inputs: &FrameInputs) -> Result<()> {
        baseline.ensure_same_shape(reference)?;
        if let Some(mask) = inputs.mask {
            baseline.ensure_same_shape(mask)?;
        }

        match (self.config.susceptibility_method, inputs.susceptibility) {
            (SusceptibilityMethod::Off, _) => Ok(()),
            (SusceptibilityMethod::Manual, SusceptibilitySource::ObjectMask(object)) => baseline.ensure_same_shape(object),
            (SusceptibilityMethod::Manual, _) => Err(ThermometryError::missing("object mask for manual susceptibility correction")),
            (SusceptibilityMethod::Auto, SusceptibilitySource::Magnitudes { baseline: mb, reference: mr }) => {
                baseline.ensure_same_shape(mb)?;
                baseline.ensure_same_shape(mr)
            }
            (SusceptibilityMethod::Auto, _) => Err(ThermometryError::missing("magnitude pair for automatic susceptibility correction")),
        }
    }

    /// Object mask for the configured method, `None` when correction is off
    fn object_mask(&self, source: &SusceptibilitySource) -> Result<Option<VoxelGrid>> {
        match (self.config.susceptibility_method, source) {
            (SusceptibilityMethod::Off, _) => Ok(None),
            (SusceptibilityMethod::Manual, SusceptibilitySource::ObjectMask(object)) => Ok(Some((*object).clone())),
            (SusceptibilityMethod::Auto, SusceptibilitySource::Magnitudes { baseline, reference }) => {
                let object = segment_object(baseline, reference)?;
                log::debug!("auto segmentation: {} object voxel(s)", object.to_mask().iter().filter(|&&m| m != 0).count());
                Ok(Some(object))
            }
            (method, _) => Err(ThermometryError::missing(format!("object source for {:?} susceptibility correction", method))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Geometry;
    use crate::phase::ScalarEncoding;
    use std::f64::consts::PI;

    fn radians_config() -> ThermometryConfig {
        ThermometryConfig { encoding: None, ..Default::default() }
    }

    fn uniform(value: f64, dims: (usize, usize, usize)) -> VoxelGrid {
        VoxelGrid::filled(value, dims, Geometry::default())
    }

    #[test]
    fn test_missing_inputs() {
        let orch = SingleFrameOrchestrator::new(radians_config()).unwrap();
        let g = uniform(0.0, (4, 4, 4));
        for (b, r) in [(None, Some(&g)), (Some(&g), None), (None, None)] {
            assert!(matches!(orch.run(b, r, None), Err(ThermometryError::MissingInput(_))));
        }
    }

    #[test]
    fn test_identical_inputs_give_body_temperature() {
        let orch = SingleFrameOrchestrator::new(ThermometryConfig::default()).unwrap();
        let raw = VoxelGrid::from_fn((5, 5, 3), Geometry::default(), |i, j, k| (i * 300 + j * 40 + k) as f64 - 1000.0);
        let temp = orch.run(Some(&raw), Some(&raw), None).unwrap();
        assert!(temp.data().iter().all(|&t| (t - 37.0).abs() < 1e-12));
    }

    #[test]
    fn test_uniform_heating_recovered() {
        let cfg = radians_config();
        let per_degree = cfg.prf().phase_per_degree();
        let orch = SingleFrameOrchestrator::new(cfg).unwrap();

        let base = uniform(0.3, (4, 4, 4));
        let heated = uniform(0.3 + 8.0 * per_degree, (4, 4, 4));
        let temp = orch.run(Some(&base), Some(&heated), None).unwrap();
        for &t in temp.data() {
            assert!((t - 45.0).abs() < 1e-9, "got {}", t);
        }
    }

    #[test]
    fn test_encoded_inputs_are_converted() {
        let cfg = ThermometryConfig { encoding: Some(ScalarEncoding::SignedNormalized), ..Default::default() };
        let per_degree = cfg.prf().phase_per_degree();
        let orch = SingleFrameOrchestrator::new(cfg).unwrap();

        // 5 °C of heating expressed in raw signed units
        let raw_step = 5.0 * per_degree * 4096.0 / PI;
        let base = uniform(100.0, (3, 3, 3));
        let heated = uniform(100.0 + raw_step, (3, 3, 3));
        let temp = orch.run(Some(&base), Some(&heated), None).unwrap();
        assert!((temp.get(1, 1, 1) - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_disk_mask_takes_precedence() {
        let cfg = ThermometryConfig { simple_mask: Some(0.2), ..radians_config() };
        let per_degree = cfg.prf().phase_per_degree();
        let orch = SingleFrameOrchestrator::new(cfg).unwrap();

        let dims = (11, 11, 11);
        let base = uniform(0.0, dims);
        let heated = uniform(3.0 * per_degree, dims);
        // Supplied mask covers only a corner; the disk covers the center
        let corner = VoxelGrid::from_fn(dims, Geometry::default(), |i, j, k| if i + j + k < 3 { 1.0 } else { 0.0 });

        let temp = orch.run(Some(&base), Some(&heated), Some(&corner)).unwrap();
        assert!((temp.get(5, 5, 5) - 40.0).abs() < 1e-9);
        assert!((temp.get(0, 0, 0) - 37.0).abs() < 1e-9);
    }

    #[test]
    fn test_mask_shape_mismatch() {
        let orch = SingleFrameOrchestrator::new(radians_config()).unwrap();
        let g = uniform(0.0, (4, 4, 4));
        let mask = uniform(1.0, (4, 4, 3));
        assert!(matches!(orch.run(Some(&g), Some(&g), Some(&mask)), Err(ThermometryError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_manual_susceptibility_requires_object_mask() {
        let cfg = ThermometryConfig {
            susceptibility_method: SusceptibilityMethod::Manual,
            delta_chi: 9.0,
            ..radians_config()
        };
        let orch = SingleFrameOrchestrator::new(cfg).unwrap();
        let g = uniform(0.0, (6, 6, 6));
        assert!(matches!(orch.run(Some(&g), Some(&g), None), Err(ThermometryError::MissingInput(_))));

        let object = VoxelGrid::from_fn((6, 6, 6), Geometry::default(), |i, j, k| {
            if (2..4).contains(&i) && (2..4).contains(&j) && (2..4).contains(&k) { 1.0 } else { 0.0 }
        });
        let inputs = FrameInputs {
            baseline: Some(&g),
            reference: Some(&g),
            mask: None,
            susceptibility: SusceptibilitySource::ObjectMask(&object),
        };
        let temp = orch.run_frame(&inputs).unwrap();
        // Inside the object the offset is zero
        assert!((temp.get(2, 2, 2) - 37.0).abs() < 1e-9);
        assert!(temp.data().iter().any(|&t| (t - 37.0).abs() > 1e-6));
    }

    #[test]
    fn test_threshold_applied_last() {
        let cfg = ThermometryConfig { lower_threshold: Some(38.0), ..radians_config() };
        let orch = SingleFrameOrchestrator::new(cfg).unwrap();
        let g = uniform(0.0, (3, 3, 3));
        let temp = orch.run(Some(&g), Some(&g), None).unwrap();
        assert!(temp.data().iter().all(|&t| t == 0.0));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = ThermometryConfig { alpha: 0.0, ..Default::default() };
        assert!(matches!(SingleFrameOrchestrator::new(cfg), Err(ThermometryError::InvalidParameters(_))));
    }
}
