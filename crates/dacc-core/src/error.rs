//! Unified error types for the capacity-calculation workspace
//!
//! [`CcError`] carries one variant per failure class the orchestration layer
//! distinguishes (input validation, optimization failure, lookup misses and
//! internal invariant breaches) plus the ambient I/O, parsing and configuration
//! errors every crate needs. Crate-local error enums convert into it at API
//! boundaries.
//!
//! # Example
//!
//! ```ignore
//! use dacc_core::{CcError, CcResult};
//!
//! fn load_day(raw: &str) -> CcResult<BusinessInterval> {
//!     let day = BusinessInterval::parse(raw)?;
//!     Ok(day)
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all capacity-calculation operations.
#[derive(Error, Debug)]
pub enum CcError {
    /// Malformed day interval or missing per-hour input, raised before dispatch.
    #[error("Input validation error: {0}")]
    InputValidation(String),

    /// Engine-reported business error, timeout or transport failure.
    #[error("Optimization failure: {0}")]
    OptimizationFailure(String),

    /// Interval or position lookup with no matching hour.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Redelivered completion or aggregation re-entry.
    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),

    /// Parsing errors (instants, intervals, documents)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (artifact store, configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors (JSON, TOML)
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Error taxonomy without payloads, for callers that branch on the class only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InputValidation,
    OptimizationFailure,
    NotFound,
    InternalInvariant,
    Parse,
    Config,
    Io,
    Serialization,
    Other,
}

impl CcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CcError::InputValidation(_) => ErrorKind::InputValidation,
            CcError::OptimizationFailure(_) => ErrorKind::OptimizationFailure,
            CcError::NotFound(_) => ErrorKind::NotFound,
            CcError::InternalInvariant(_) => ErrorKind::InternalInvariant,
            CcError::Parse(_) => ErrorKind::Parse,
            CcError::Config(_) => ErrorKind::Config,
            CcError::Io(_) => ErrorKind::Io,
            CcError::Serialization(_) => ErrorKind::Serialization,
            CcError::Other(_) => ErrorKind::Other,
        }
    }
}

/// Convenience type alias for Results using CcError.
pub type CcResult<T> = Result<T, CcError>;

impl From<anyhow::Error> for CcError {
    fn from(err: anyhow::Error) -> Self {
        CcError::Other(err.to_string())
    }
}

impl From<String> for CcError {
    fn from(s: String) -> Self {
        CcError::Other(s)
    }
}

impl From<&str> for CcError {
    fn from(s: &str) -> Self {
        CcError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for CcError {
    fn from(err: serde_json::Error) -> Self {
        CcError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for CcError {
    fn from(err: chrono::ParseError) -> Self {
        CcError::Parse(err.to_string())
    }
}
