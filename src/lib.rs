// Module declarations in dependency order
pub mod utils;
pub mod core;
pub mod capability;
pub mod native;
pub mod processing;
pub mod client;

// Public exports for external consumers
pub use crate::core::{
    ImageFile, OptimizationOptions, OptimizationSummary, ProgressReporter, checkpoint,
};
pub use crate::processing::{ImageOptimizer, SKIP_THRESHOLD_BYTES, calculate_smart_dimensions};
pub use crate::utils::{OptimizerError, OptimizerResult, StageError};
pub use crate::client::{ClientHandle, NotificationCounter};
