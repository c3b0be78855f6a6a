//! Error types shared across the core

use thiserror::Error;

/// Violations of the capability set invariants
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid capability name {0:?}")]
    InvalidName(String),

    #[error("duplicate capability {0}")]
    Duplicate(String),
}

/// Reference database could not be used
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// The source could not produce a document (file absent, transport failed)
    #[error("reference database unavailable from {source_name}: {reason}")]
    Unavailable { source_name: String, reason: String },

    /// The document was obtained but is structurally invalid
    #[error("malformed reference database: {0}")]
    Malformed(String),
}

/// Report encoding and decoding failures
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("malformed report: {0}")]
    Malformed(String),

    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}
