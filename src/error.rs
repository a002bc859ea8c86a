//! Error type shared by every engine component.
//!
//! Only malformed parameters are errors. Inputs that are well-formed but too
//! thin for a strong answer (a short forecast history, an empty sample set,
//! an indeterminate tournament) resolve to documented fallback values instead.

use thiserror::Error;

/// Errors returned by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A parameter was rejected before any computation started.
    ///
    /// Examples: an empty alternative set, a zero-sum weight map, an
    /// inverted constraint range, an unsupported ranking method.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl EngineError {
    /// Shorthand for [`EngineError::InvalidInput`].
    pub fn invalid(message: impl Into<String>) -> Self {
        EngineError::InvalidInput(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;
