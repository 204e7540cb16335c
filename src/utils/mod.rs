//! Utility functions for thermometry processing
//!
//! - Synthetic masks (disk/sphere) and mask application
//! - Maximum-entropy automatic thresholding
//! - Binary morphology (ball dilation/erosion)
//! - Connected component labeling

pub mod labeling;
pub mod mask;
pub mod morphology;
pub mod threshold;

pub use labeling::*;
pub use mask::*;
pub use morphology::*;
pub use threshold::*;
