// src/error.rs
// =============================================================================
// The error taxonomy for the acquisition pipeline.
//
// Every stage (classify, fetch, walk, select, format) reports failures with
// one of these variants. Only the pipeline orchestrator catches them, and it
// turns them into an error-report document instead of letting them escape.
//
// "Absence" is NOT an error here: a file that does not exist comes back as
// Ok(None) from the fetcher. NotFound is reserved for the case where the
// whole submission resolved to nothing.
// =============================================================================

use thiserror::Error;

/// Main error type for acquisition operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AcquireError {
    #[error("invalid GitHub URL: {0}")]
    InvalidUrl(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("no eligible files: {0}")]
    EmptyResult(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("could not decode content: {0}")]
    Decode(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AcquireError {
    /// Stable reason code embedded in error reports.
    ///
    /// The grading side keys rubric adjustments off this string, so these
    /// values must not change.
    pub fn reason_code(&self) -> &'static str {
        match self {
            AcquireError::InvalidUrl(_) => "invalid_url",
            AcquireError::NotFound(_) => "not_found",
            AcquireError::AccessDenied(_) => "access_denied",
            AcquireError::EmptyResult(_) => "empty_result",
            AcquireError::Timeout(_) => "timeout",
            AcquireError::Network(_) => "network_error",
            AcquireError::Decode(_) => "decode_error",
            AcquireError::Config(_) => "config_error",
        }
    }
}

/// Result alias used throughout the pipeline
pub type Result<T> = std::result::Result<T, AcquireError>;
