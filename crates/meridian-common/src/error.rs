//! Error handling for Meridian.
//!
//! This module provides the unified error type used across the crates of
//! the execution layer. Benchmark transaction bodies intentionally do not
//! return `Result`: their error protocol is the sticky first-error slot of
//! the transaction skeleton, which ultimately surfaces through the wire
//! transaction's abort reason.

use thiserror::Error;

/// Result type alias for Meridian operations.
pub type MeridianResult<T> = std::result::Result<T, MeridianError>;

/// Unified error type for configuration, wire, and client-side failures.
#[derive(Debug, Error)]
pub enum MeridianError {
    /// The configuration is structurally invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A transaction description (JSON or wire) could not be interpreted.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// A workload parameter string could not be parsed.
    #[error("invalid workload parameter: {0}")]
    InvalidParameter(String),

    /// A sunflower schedule file is malformed.
    #[error("invalid sunflower schedule: {0}")]
    InvalidSunflower(String),

    /// Underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
