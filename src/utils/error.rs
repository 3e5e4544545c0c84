//! Error types for the optimization pipeline.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.
//!
//! Two families exist on purpose: [`OptimizerError`] carries the failures that
//! are allowed to reach a caller (bad input, file IO), while [`StageError`]
//! carries per-stage processing failures. Stage failures are logged where they
//! occur and the pipeline falls back to its last good intermediate; they are
//! never returned from [`crate::ImageOptimizer::optimize`].

use std::io;
use thiserror::Error;
use serde::Serialize;

/// Errors that can surface from the public pipeline entry points.
#[derive(Error, Debug, Serialize)]
pub enum OptimizerError {
    /// Caller handed us something that is not an image blob. Raised
    /// synchronously, before any processing starts.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File IO error (only from the disk convenience helpers)
    #[error("IO error: {0}")]
    IO(String),

    /// Unsupported or unrecognized image format
    #[error("Format error: {0}")]
    Format(String),
}

/// Convenience result type for optimizer operations.
pub type OptimizerResult<T> = Result<T, OptimizerError>;

/// Failures internal to a single pipeline stage.
///
/// Every variant is recoverable: the stage's output is discarded wholesale
/// and the previous intermediate continues down the pipeline.
#[derive(Error, Debug, Serialize)]
pub enum StageError {
    /// Dimension probe could not read the blob's header
    #[error("dimension probe failed: {0}")]
    Probe(String),

    /// Preparatory downsample failed
    #[error("smart resize failed: {0}")]
    Resize(String),

    /// Size/quality compression pass failed
    #[error("compression failed: {0}")]
    Compression(String),

    /// Final format conversion failed
    #[error("format conversion failed: {0}")]
    Conversion(String),

    /// Decode/draw/encode primitive failed inside a backend
    #[error("codec error: {0}")]
    Codec(String),
}

// Helper methods for error creation
impl OptimizerError {
    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn io<T: Into<String>>(msg: T) -> Self {
        Self::IO(msg.into())
    }

    pub fn format<T: Into<String>>(msg: T) -> Self {
        Self::Format(msg.into())
    }
}

impl StageError {
    pub fn probe<T: Into<String>>(msg: T) -> Self {
        Self::Probe(msg.into())
    }

    pub fn resize<T: Into<String>>(msg: T) -> Self {
        Self::Resize(msg.into())
    }

    pub fn compression<T: Into<String>>(msg: T) -> Self {
        Self::Compression(msg.into())
    }

    pub fn conversion<T: Into<String>>(msg: T) -> Self {
        Self::Conversion(msg.into())
    }

    pub fn codec<T: Into<String>>(msg: T) -> Self {
        Self::Codec(msg.into())
    }
}

// Convert std::io::Error to OptimizerError
impl From<io::Error> for OptimizerError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}
