//! Temporal sequences of reference frames against one fixed baseline

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::error::{Result, ThermometryError};
use crate::grid::VoxelGrid;
use crate::susceptibility::SusceptibilityMethod;

use super::config::ThermometryConfig;
use super::single::SingleFrameOrchestrator;

/// Kind of the sequence index (e.g. acquisition time vs. a free-form label)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexType {
    #[default]
    Numeric,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceFrame {
    /// Index value as reported by the source, carried through verbatim
    pub index_value: String,
    pub grid: VoxelGrid,
}

/// Ordered frames sharing one index name, unit and type
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    pub index_name: String,
    pub index_unit: String,
    pub index_type: IndexType,
    pub frames: Vec<SequenceFrame>,
}

impl Sequence {
    pub fn new(index_name: impl Into<String>, index_unit: impl Into<String>, index_type: IndexType) -> Self {
        Self {
            index_name: index_name.into(),
            index_unit: index_unit.into(),
            index_type,
            frames: Vec::new(),
        }
    }

    pub fn push(&mut self, index_value: impl Into<String>, grid: VoxelGrid) {
        self.frames.push(SequenceFrame {
            index_value: index_value.into(),
            grid,
        });
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Same index metadata, no frames
    fn empty_like(&self) -> Self {
        Self {
            index_name: self.index_name.clone(),
            index_unit: self.index_unit.clone(),
            index_type: self.index_type,
            frames: Vec::with_capacity(self.frames.len()),
        }
    }
}

/// Runs the single-frame pipeline over every frame of a sequence.
///
/// Susceptibility correction is not available here: any requested method
/// is downgraded to `Off` when the orchestrator is built.
#[derive(Debug, Clone)]
pub struct MultiFrameOrchestrator {
    single: SingleFrameOrchestrator,
    mask: Option<VoxelGrid>,
    parallel: bool,
}

impl MultiFrameOrchestrator {
    pub fn new(mut config: ThermometryConfig) -> Result<Self> {
        if config.susceptibility_method != SusceptibilityMethod::Off {
            log::warn!(
                "susceptibility correction ({:?}) is not supported for sequences; running with Off",
                config.susceptibility_method
            );
            config.susceptibility_method = SusceptibilityMethod::Off;
        }
        Ok(Self {
            single: SingleFrameOrchestrator::new(config)?,
            mask: None,
            parallel: false,
        })
    }

    /// Region mask applied to every frame
    pub fn with_mask(mut self, mask: VoxelGrid) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Evaluate frames on the rayon pool. Output order is unchanged.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn config(&self) -> &ThermometryConfig {
        self.single.config()
    }

    /// Temperature sequence for `references`.
    ///
    /// Without an explicit baseline the first frame is the baseline for every
    /// frame, itself included. A failure on any frame aborts the whole run.
    /// An empty sequence yields an empty result when a baseline is given and
    /// `MissingInput` otherwise.
    pub fn run(&self, references: &Sequence, baseline: Option<&VoxelGrid>) -> Result<Sequence> {
        self.run_with_progress(references, baseline, |_, _| {})
    }

    /// Like `run`, reporting `(completed, total)` after each finished frame
    pub fn run_with_progress<F>(&self, references: &Sequence, baseline: Option<&VoxelGrid>, progress: F) -> Result<Sequence>
    where
        F: Fn(usize, usize) + Sync,
    {
        let baseline = match (baseline, references.frames.first()) {
            (Some(baseline), _) => baseline,
            (None, Some(first)) => &first.grid,
            (None, None) => {
                return Err(ThermometryError::missing("reference sequence has no frames and no baseline"));
            }
        };
        let total = references.len();
        log::info!(
            "sequence: {} frame(s) indexed by {} [{}]",
            total, references.index_name, references.index_unit
        );

        let completed = AtomicUsize::new(0);
        let process = |frame: &SequenceFrame| -> Result<SequenceFrame> {
            let grid = self.single.run(Some(baseline), Some(&frame.grid), self.mask.as_ref())?;
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            progress(done, total);
            Ok(SequenceFrame {
                index_value: frame.index_value.clone(),
                grid,
            })
        };

        let frames: Vec<SequenceFrame> = if self.parallel {
            references.frames.par_iter().map(process).collect::<Result<_>>()?
        } else {
            references.frames.iter().map(process).collect::<Result<_>>()?
        };

        let mut output = references.empty_like();
        output.frames = frames;
        Ok(output)
    }
}
