use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid uuid {input:?}: {reason}")]
    InvalidUuid { input: String, reason: String },
}
