//! Error type for configuration and boundary failures.
//!
//! Per-query failures (bad wavelength, batch overflow) never surface here:
//! they are logged and degrade to a zero or truncated result.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SwellError>;

#[derive(Debug, Error)]
pub enum SwellError {
    /// The geometry collaborator asked for a cascade with no levels.
    #[error("LOD count must be at least 1, got {0}")]
    InvalidLodCount(usize),

    /// A recognized option is outside its documented range.
    #[error("invalid configuration: `{field}` {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SwellError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig { field, reason: reason.into() }
    }
}
