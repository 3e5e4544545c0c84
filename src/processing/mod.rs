mod batch;
mod dimensions;
mod pipeline;
mod validation;
mod webp;

pub use dimensions::{SMART_ANCHOR_PX, calculate_smart_dimensions};
pub use pipeline::{ImageOptimizer, SKIP_THRESHOLD_BYTES};
pub use validation::validate_input;
pub use webp::convert_to_webp;
