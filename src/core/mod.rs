//! Core pipeline types.
//!
//! This module contains the fundamental types used throughout the crate:
//! - [`ImageFile`]: An in-memory image blob moving through the pipeline
//! - [`OptimizationOptions`]: Caller-supplied partial options
//! - [`OptimizationSummary`]: Outcome statistics for one optimized file
//! - [`ProgressReporter`]: Monotone 0-100 progress signal for a run

mod file;
mod progress;
mod types;

pub use file::ImageFile;
pub use progress::{BatchProgress, ProgressReporter, checkpoint, remap_progress};
pub use types::{
    BatchItem, Dimensions, OptimizationOptions, OptimizationSummary, ResolvedOptions,
};
