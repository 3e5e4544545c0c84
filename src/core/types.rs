//! Core types for optimization options and results.

use serde::{Deserialize, Serialize};

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Length of the longer side in pixels
    pub fn longest(&self) -> u32 {
        self.width.max(self.height)
    }
}

/// Caller-supplied optimization options.
///
/// Every field is optional; absent fields fall back to the defaults in
/// [`ResolvedOptions::default`]. Merging a partial record over the defaults
/// never drops a field the caller did not set.
///
/// The progress callback is deliberately not part of this record; it is
/// passed separately to the `*_with_progress` entry points.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizationOptions {
    /// Upper bound (px) the compression pass may downscale to
    pub max_width_or_height: Option<u32>,
    /// Target output size in megabytes for the compression pass
    #[serde(rename = "maxSizeMB")]
    pub max_size_mb: Option<f64>,
    /// Final compression quality in 0-1
    pub quality: Option<f64>,
    /// Whether to attempt WebP conversion as the last stage
    #[serde(rename = "useWebP")]
    pub use_webp: Option<bool>,
    /// Whether to run the preparatory downsample on oversized images
    pub enable_smart_resize: Option<bool>,
    /// Accepted for compatibility; the downsample target is currently
    /// anchored at a fixed 200 px regardless (see
    /// [`crate::processing::calculate_smart_dimensions`])
    pub max_smart_dimension: Option<u32>,
    /// Longest-side size (px) above which the downsample triggers
    pub resize_threshold: Option<u32>,
    /// Log per-stage details at info level instead of debug
    pub debug: Option<bool>,
}

impl OptimizationOptions {
    /// Merge this partial record over the defaults.
    pub fn resolve(&self) -> ResolvedOptions {
        let defaults = ResolvedOptions::default();
        ResolvedOptions {
            max_width_or_height: self
                .max_width_or_height
                .unwrap_or(defaults.max_width_or_height),
            max_size_mb: self.max_size_mb.unwrap_or(defaults.max_size_mb),
            quality: clamp_quality(self.quality.unwrap_or(defaults.quality)),
            use_webp: self.use_webp.unwrap_or(defaults.use_webp),
            enable_smart_resize: self
                .enable_smart_resize
                .unwrap_or(defaults.enable_smart_resize),
            max_smart_dimension: self
                .max_smart_dimension
                .unwrap_or(defaults.max_smart_dimension),
            resize_threshold: self.resize_threshold.unwrap_or(defaults.resize_threshold),
            debug: self.debug.unwrap_or(defaults.debug),
        }
    }
}

/// Options with every field concrete, after merging over the defaults.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedOptions {
    pub max_width_or_height: u32,
    pub max_size_mb: f64,
    pub quality: f64,
    pub use_webp: bool,
    pub enable_smart_resize: bool,
    pub max_smart_dimension: u32,
    pub resize_threshold: u32,
    pub debug: bool,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        Self {
            max_width_or_height: 1920,
            max_size_mb: 1.0,
            quality: 0.8,
            use_webp: true,
            enable_smart_resize: true,
            max_smart_dimension: 400,
            resize_threshold: 800,
            debug: false,
        }
    }
}

// Quality outside 0-1 would confuse the encoders downstream
fn clamp_quality(quality: f64) -> f64 {
    if quality.is_finite() {
        quality.clamp(0.0, 1.0)
    } else {
        ResolvedOptions::default().quality
    }
}

/// Outcome statistics for a single optimized file.
///
/// Attached to batch progress events and returned by the reporting entry
/// points alongside the output file.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationSummary {
    /// Input file name
    pub file_name: String,
    /// Original file size in bytes
    pub original_size: u64,
    /// Final file size in bytes
    pub optimized_size: u64,
    /// Bytes saved (can be negative if file grew)
    #[serde(rename = "savedBytes")]
    pub saved_bytes: i64,
    /// Compression ratio as a percentage
    #[serde(rename = "compressionRatio")]
    pub compression_ratio: f64,
    /// Whether the preparatory downsample ran
    pub resized: bool,
    /// Whether the output was converted to WebP
    pub webp_converted: bool,
}

impl OptimizationSummary {
    pub fn new(
        file_name: impl Into<String>,
        original_size: u64,
        optimized_size: u64,
        resized: bool,
        webp_converted: bool,
    ) -> Self {
        let saved_bytes = original_size as i64 - optimized_size as i64;
        let compression_ratio = if original_size > 0 {
            saved_bytes as f64 / original_size as f64 * 100.0
        } else {
            0.0
        };

        Self {
            file_name: file_name.into(),
            original_size,
            optimized_size,
            saved_bytes,
            compression_ratio,
            resized,
            webp_converted,
        }
    }
}

/// Per-file outcome of a batch run.
///
/// A rejected input records its error here instead of aborting the batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    /// Input file name
    pub name: String,
    /// Whether this item produced an output file
    pub success: bool,
    /// Error message when the input was rejected
    pub error: Option<String>,
    /// Outcome statistics, present when `success`
    pub summary: Option<OptimizationSummary>,
    /// The optimized file, present when `success`
    #[serde(skip)]
    pub file: Option<crate::core::ImageFile>,
}
