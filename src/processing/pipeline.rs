//! Sequential optimization pipeline with per-stage fallbacks.

use std::sync::Arc;

use tokio::task;
use tracing::{debug, info, warn};

use crate::capability::{BitmapCodec, CompressOptions, Compressor, DimensionProbe};
use crate::core::{
    Dimensions, ImageFile, OptimizationOptions, OptimizationSummary, ProgressReporter,
    ResolvedOptions, checkpoint, remap_progress,
};
use crate::native::{NativeCodec, NativeCompressor, NativeProbe};
use crate::processing::dimensions::calculate_smart_dimensions;
use crate::processing::validation::validate_input;
use crate::processing::webp::convert_to_webp;
use crate::utils::{OptimizerResult, StageError};

/// Inputs at or below this size are returned untouched.
pub const SKIP_THRESHOLD_BYTES: usize = 50 * 1024;

/// Quality for the preparatory downsample, deliberately above the user
/// quality since the heavy compression happens later.
const RESIZE_QUALITY: f32 = 0.95;

/// Initial compression quality after a downsample already ran.
const RESIZED_INITIAL_QUALITY: f64 = 0.9;

/// Multi-stage image optimizer.
///
/// Runs validate → skip check → dimension probe → smart resize → compress →
/// WebP conversion, where every stage after validation degrades to the last
/// good intermediate instead of failing. The only error [`optimize`] ever
/// returns is [`crate::utils::OptimizerError::InvalidInput`], raised before
/// any processing starts; in the worst case the caller gets the original
/// file back, bit for bit.
///
/// [`optimize`]: ImageOptimizer::optimize
#[derive(Clone)]
pub struct ImageOptimizer {
    probe: Arc<dyn DimensionProbe>,
    compressor: Arc<dyn Compressor>,
    codec: Arc<dyn BitmapCodec>,
}

impl ImageOptimizer {
    /// Optimizer backed by the built-in pure-Rust capabilities.
    pub fn new() -> Self {
        Self::with_backends(
            Arc::new(NativeProbe),
            Arc::new(NativeCompressor::default()),
            Arc::new(NativeCodec),
        )
    }

    /// Optimizer with caller-provided capability implementations.
    pub fn with_backends(
        probe: Arc<dyn DimensionProbe>,
        compressor: Arc<dyn Compressor>,
        codec: Arc<dyn BitmapCodec>,
    ) -> Self {
        Self {
            probe,
            compressor,
            codec,
        }
    }

    /// Optimize a single file.
    pub async fn optimize(
        &self,
        file: ImageFile,
        options: &OptimizationOptions,
    ) -> OptimizerResult<ImageFile> {
        let (file, _) = self
            .run(file, options, ProgressReporter::disabled())
            .await?;
        Ok(file)
    }

    /// Optimize with a 0-100 progress callback.
    ///
    /// The callback sees a monotone sequence ending at exactly 100 whether
    /// the run optimized, skipped, or fell back at every stage.
    pub async fn optimize_with_progress(
        &self,
        file: ImageFile,
        options: &OptimizationOptions,
        on_progress: impl Fn(u8) + Send + Sync + 'static,
    ) -> OptimizerResult<ImageFile> {
        let (file, _) = self
            .run(file, options, ProgressReporter::new(on_progress))
            .await?;
        Ok(file)
    }

    /// Optimize and also return the outcome statistics.
    pub async fn optimize_with_report(
        &self,
        file: ImageFile,
        options: &OptimizationOptions,
        progress: ProgressReporter,
    ) -> OptimizerResult<(ImageFile, OptimizationSummary)> {
        self.run(file, options, progress).await
    }

    async fn run(
        &self,
        file: ImageFile,
        options: &OptimizationOptions,
        progress: ProgressReporter,
    ) -> OptimizerResult<(ImageFile, OptimizationSummary)> {
        validate_input(&file)?;

        let opts = options.resolve();
        let original = file.clone();
        let original_size = file.len();

        if original_size <= SKIP_THRESHOLD_BYTES {
            debug!(
                "'{}' is {} bytes, below the transcode threshold; skipping",
                file.name, original_size
            );
            progress.finish();
            let summary = OptimizationSummary::new(
                &original.name,
                original_size as u64,
                original_size as u64,
                false,
                false,
            );
            return Ok((file, summary));
        }

        progress.report(checkpoint::VALIDATED);

        let dimensions = self.probe_dimensions(&file).await;
        progress.report(checkpoint::PROBED);

        let (file, resized) = self.smart_resize(file, dimensions, &opts).await;
        progress.report(checkpoint::RESIZED);

        let file = self.compress(file, &opts, resized, &progress).await;
        progress.report(checkpoint::COMPRESSED);

        let (file, webp_converted) = self.maybe_convert_webp(file, &opts).await;
        progress.report(checkpoint::CONVERTED);

        // The run as a whole must never hand back more bytes than it got
        let (file, resized, webp_converted) = if file.len() > original_size {
            debug!(
                "result for '{}' grew ({} -> {} bytes); keeping original",
                original.name,
                original_size,
                file.len()
            );
            (original.clone(), false, false)
        } else {
            (file, resized, webp_converted)
        };

        let summary = OptimizationSummary::new(
            &original.name,
            original_size as u64,
            file.len() as u64,
            resized,
            webp_converted,
        );
        if opts.debug {
            info!(
                "'{}' optimized: {} -> {} bytes ({:.1}% saved)",
                summary.file_name,
                summary.original_size,
                summary.optimized_size,
                summary.compression_ratio
            );
        } else {
            debug!(
                "'{}' optimized: {} -> {} bytes ({:.1}% saved)",
                summary.file_name,
                summary.original_size,
                summary.optimized_size,
                summary.compression_ratio
            );
        }

        progress.finish();
        Ok((file, summary))
    }

    /// Non-fatal header probe. `None` disables the smart-resize stage.
    async fn probe_dimensions(&self, file: &ImageFile) -> Option<Dimensions> {
        let probe = Arc::clone(&self.probe);
        let input = file.clone();
        match task::spawn_blocking(move || probe.measure(&input)).await {
            Ok(Ok(dimensions)) => {
                debug!(
                    "'{}' measures {}x{}",
                    file.name, dimensions.width, dimensions.height
                );
                Some(dimensions)
            }
            Ok(Err(e)) => {
                warn!("dimension probe failed for '{}': {}", file.name, e);
                None
            }
            Err(e) => {
                warn!("dimension probe panicked for '{}': {}", file.name, e);
                None
            }
        }
    }

    /// Preparatory downsample. Falls back to the unresized file on any
    /// failure; the bool reports whether the downsample actually happened.
    async fn smart_resize(
        &self,
        file: ImageFile,
        dimensions: Option<Dimensions>,
        opts: &ResolvedOptions,
    ) -> (ImageFile, bool) {
        let Some(dimensions) = dimensions else {
            return (file, false);
        };
        if !opts.enable_smart_resize || dimensions.longest() <= opts.resize_threshold {
            return (file, false);
        }

        let target = calculate_smart_dimensions(dimensions.width, dimensions.height);
        debug!(
            "downsampling '{}' from {}x{} to {}x{}",
            file.name, dimensions.width, dimensions.height, target.width, target.height
        );

        let codec = Arc::clone(&self.codec);
        let input = file.clone();
        match task::spawn_blocking(move || resize_to_target(codec.as_ref(), &input, target)).await {
            Ok(Ok(resized)) => (resized, true),
            Ok(Err(e)) => {
                warn!("smart resize failed for '{}': {}", file.name, e);
                (file, false)
            }
            Err(e) => {
                warn!("smart resize panicked for '{}': {}", file.name, e);
                (file, false)
            }
        }
    }

    /// Size/quality compression. Keeps the pre-compression file when the
    /// stage fails or when its result is larger than its input.
    async fn compress(
        &self,
        file: ImageFile,
        opts: &ResolvedOptions,
        resized: bool,
        progress: &ProgressReporter,
    ) -> ImageFile {
        let compress_opts = CompressOptions {
            max_size_mb: opts.max_size_mb,
            max_width_or_height: opts.max_width_or_height,
            initial_quality: if resized {
                RESIZED_INITIAL_QUALITY
            } else {
                opts.quality
            },
            file_type: if file.content_type.is_empty() {
                "image/jpeg".to_string()
            } else {
                file.content_type.clone()
            },
        };

        let compressor = Arc::clone(&self.compressor);
        let input = file.clone();
        let band = progress.clone();
        let outcome = task::spawn_blocking(move || {
            let mut on_progress = |native: u8| {
                band.report(remap_progress(
                    native,
                    checkpoint::RESIZED,
                    checkpoint::COMPRESSED,
                ));
            };
            compressor.compress(&input, &compress_opts, &mut on_progress)
        })
        .await;

        match outcome {
            Ok(Ok(compressed)) => {
                if compressed.len() > file.len() {
                    debug!(
                        "compression grew '{}' ({} -> {} bytes); keeping previous",
                        file.name,
                        file.len(),
                        compressed.len()
                    );
                    file
                } else {
                    compressed
                }
            }
            Ok(Err(e)) => {
                warn!("compression failed for '{}': {}", file.name, e);
                file
            }
            Err(e) => {
                warn!("compression panicked for '{}': {}", file.name, e);
                file
            }
        }
    }

    /// Optional WebP conversion. The converted file is adopted only when it
    /// is strictly smaller than the file going in.
    async fn maybe_convert_webp(
        &self,
        file: ImageFile,
        opts: &ResolvedOptions,
    ) -> (ImageFile, bool) {
        if !opts.use_webp || !self.codec.supports_webp() || file.is_webp() {
            return (file, false);
        }

        let codec = Arc::clone(&self.codec);
        let input = file.clone();
        let quality = opts.quality as f32;
        let outcome =
            task::spawn_blocking(move || convert_to_webp(codec.as_ref(), &input, quality)).await;

        match outcome {
            Ok(Ok(converted)) => {
                if converted.len() < file.len() {
                    debug!(
                        "adopted conversion for '{}' ({} -> {} bytes)",
                        file.name,
                        file.len(),
                        converted.len()
                    );
                    let is_webp = converted.is_webp();
                    (converted, is_webp)
                } else {
                    debug!(
                        "conversion result for '{}' not smaller ({} vs {} bytes); keeping previous",
                        file.name,
                        converted.len(),
                        file.len()
                    );
                    (file, false)
                }
            }
            Ok(Err(e)) => {
                warn!("conversion failed for '{}': {}", file.name, e);
                (file, false)
            }
            Err(e) => {
                warn!("conversion panicked for '{}': {}", file.name, e);
                (file, false)
            }
        }
    }
}

impl Default for ImageOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Redraw `file` at exactly `target`, re-encoded in its own format at the
/// fixed preparatory quality.
fn resize_to_target(
    codec: &dyn BitmapCodec,
    file: &ImageFile,
    target: Dimensions,
) -> Result<ImageFile, StageError> {
    let format = file
        .format()
        .map_err(|e| StageError::resize(e.to_string()))?;
    let bitmap = codec
        .decode(file)
        .map_err(|e| StageError::resize(e.to_string()))?;
    let drawn = codec
        .draw_scaled(&bitmap, target.width, target.height)
        .map_err(|e| StageError::resize(e.to_string()))?;
    let encoded = codec
        .encode(&drawn, format, RESIZE_QUALITY)
        .map_err(|e| StageError::resize(e.to_string()))?;

    Ok(ImageFile::new(
        file.name.clone(),
        file.content_type.clone(),
        encoded,
    ))
}
