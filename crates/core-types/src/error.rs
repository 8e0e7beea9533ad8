use thiserror::Error;

/// Raised when a series or table would break its ordering or naming invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid {0}: {1}")]
    InvalidInput(String, String),
}
