//! Orchestration of the thermometry stages
//!
//! - `config`: run parameters and their defaults
//! - `single`: one baseline/reference pair to one temperature map
//! - `sequence`: a temporal sequence against a fixed baseline

pub mod config;
pub mod sequence;
pub mod single;

pub use config::*;
pub use sequence::*;
pub use single::*;
