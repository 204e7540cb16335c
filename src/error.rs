//! Error taxonomy for the thermometry pipeline

use thiserror::Error;

/// Errors raised by the thermometry core.
///
/// All of them are detected before any output grid is produced. Empty
/// segmentations are not errors: they yield an all-zero object mask.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThermometryError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

impl ThermometryError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ThermometryError::InvalidParameters(msg.into())
    }

    pub(crate) fn missing(what: impl Into<String>) -> Self {
        ThermometryError::MissingInput(what.into())
    }
}

pub type Result<T> = std::result::Result<T, ThermometryError>;
