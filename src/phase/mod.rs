//! Phase conversion and phase-difference computation

pub mod convert;
pub mod difference;

pub use convert::*;
pub use difference::*;
