//! Capability seams between the pipeline and image backends.
//!
//! The pipeline only orchestrates; every pixel-touching operation goes
//! through one of these traits. [`crate::native`] provides the default
//! implementations on top of the `image` and `webp` crates, and tests swap
//! in mock backends to drive the fallback policy.
//!
//! Implementations run under `spawn_blocking`, so they are free to do
//! CPU-heavy synchronous work. A panic inside a capability is caught at the
//! dispatch point and treated like a stage failure.

use crate::core::{Dimensions, ImageFile};
use crate::utils::{ImageFormat, StageError};

/// Decoded raster image handed between codec operations.
pub type Bitmap = image::DynamicImage;

/// Header-only dimension measurement.
pub trait DimensionProbe: Send + Sync {
    fn measure(&self, file: &ImageFile) -> Result<Dimensions, StageError>;
}

/// Options forwarded to the size/quality compression pass.
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// Target output size in megabytes
    pub max_size_mb: f64,
    /// Upper bound (px) the pass may downscale to
    pub max_width_or_height: u32,
    /// Quality of the first encode pass, 0-1
    pub initial_quality: f64,
    /// MIME type the output should keep
    pub file_type: String,
}

/// Generic size/quality compression.
pub trait Compressor: Send + Sync {
    /// Compress `file` toward the size budget in `opts`.
    ///
    /// `on_progress` receives this pass's native 0-100 signal; the caller
    /// remaps it into the pipeline's range.
    fn compress(
        &self,
        file: &ImageFile,
        opts: &CompressOptions,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<ImageFile, StageError>;
}

/// Decode/draw/encode primitives used by smart resize and WebP conversion.
pub trait BitmapCodec: Send + Sync {
    fn decode(&self, file: &ImageFile) -> Result<Bitmap, StageError>;

    /// Redraw at exactly `width` x `height`
    fn draw_scaled(&self, bitmap: &Bitmap, width: u32, height: u32) -> Result<Bitmap, StageError>;

    /// Composite onto an opaque white surface of the same size
    fn flatten_white(&self, bitmap: &Bitmap) -> Bitmap;

    fn encode(
        &self,
        bitmap: &Bitmap,
        format: ImageFormat,
        quality: f32,
    ) -> Result<Vec<u8>, StageError>;

    /// Whether this codec can produce WebP output
    fn supports_webp(&self) -> bool;
}
