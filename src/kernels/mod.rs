//! Frequency-domain kernels
//!
//! - Dipole kernel on a normalized symmetric k-space grid

pub mod dipole;

pub use dipole::*;
