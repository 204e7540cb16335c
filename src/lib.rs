//! PRF-Thermometry: MR temperature mapping from phase images
//!
//! Converts a baseline/reference pair of MR phase images into a map of
//! absolute temperature (°C) using the proton resonance frequency shift,
//! with optional phase unwrapping and susceptibility artifact correction.
//!
//! # Modules
//! - `grid`: Voxel grid with scanner geometry
//! - `fft`: 3D FFT operations using rustfft
//! - `kernels`: Dipole kernel on the normalized k-space grid
//! - `unwrap`: Phase unwrapping (region growing, Laplacian) and global shift search
//! - `phase`: Raw intensity conversion and phase differencing
//! - `susceptibility`: Dipole field offset and object segmentation
//! - `temperature`: PRF conversion and output thresholding
//! - `utils`: Masks, thresholding, morphology, connected components
//! - `pipeline`: Single-frame and multi-frame orchestrators

// Core modules
pub mod error;
pub mod fft;
pub mod grid;
pub mod priority_queue;
pub mod region_grow;

// Algorithm modules
pub mod kernels;
pub mod phase;
pub mod susceptibility;
pub mod temperature;
pub mod unwrap;
pub mod utils;

// Orchestration
pub mod pipeline;

pub use error::{Result, ThermometryError};
pub use grid::{Geometry, VoxelGrid};
pub use phase::{DifferenceMode, ScalarEncoding};
pub use pipeline::{
    FrameInputs, IndexType, MultiFrameOrchestrator, Sequence, SequenceFrame, SingleFrameOrchestrator,
    SusceptibilitySource, ThermometryConfig,
};
pub use susceptibility::{SusceptibilityCorrector, SusceptibilityMethod, SusceptibilityParameters};
pub use temperature::{PrfParameters, ThresholdSpec};
pub use unwrap::{PhaseUnwrapper, UnwrapMethod};
