pub mod error;
pub mod formats;

pub use error::{OptimizerError, OptimizerResult, StageError};
pub use formats::{ImageFormat, format_for_file, format_from_extension};
