//! Size/quality compression pass.

use tracing::debug;

use crate::capability::{Bitmap, BitmapCodec, CompressOptions, Compressor};
use crate::core::ImageFile;
use crate::native::NativeCodec;
use crate::utils::{ImageFormat, StageError};

type Result<T> = std::result::Result<T, StageError>;

/// Quality multiplier between lossy encode passes
const QUALITY_STEP: f64 = 0.8;
/// Lowest quality a descent pass may reach
const QUALITY_FLOOR: f64 = 0.3;
/// Dimension multiplier between lossless shrink passes
const DIMENSION_STEP: f64 = 0.9;
/// Upper bound on lossless shrink passes
const MAX_DIMENSION_PASSES: u32 = 4;

/// Compresses toward a byte budget with descending-quality encode passes.
///
/// Lossy formats walk a quality ladder from `initial_quality` down to the
/// floor; PNG (and GIF, which is re-encoded as PNG) gets one lossless
/// re-encode followed by dimension shrink passes. The smallest attempt wins
/// even when the budget is never met. Input dimensions are only ever reduced.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCompressor {
    codec: NativeCodec,
}

impl Compressor for NativeCompressor {
    fn compress(
        &self,
        file: &ImageFile,
        opts: &CompressOptions,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<ImageFile> {
        let budget = (opts.max_size_mb * 1024.0 * 1024.0) as usize;
        let format = output_format(&opts.file_type);

        let bitmap = self
            .codec
            .decode(file)
            .map_err(|e| StageError::compression(e.to_string()))?;
        on_progress(10);

        let bitmap = self.shrink_to_bound(bitmap, opts.max_width_or_height)?;
        on_progress(20);

        let encoded = if format.is_lossy() {
            self.lossy_descent(&bitmap, format, opts.initial_quality, budget, on_progress)?
        } else {
            self.lossless_descent(&bitmap, budget, on_progress)?
        };
        on_progress(100);

        debug!(
            "compressed '{}': {} -> {} bytes (budget {})",
            file.name,
            file.len(),
            encoded.len(),
            budget
        );

        // Keep the caller's MIME string unless the container changed
        if ImageFormat::from_mime(&opts.file_type) != Some(format) {
            Ok(ImageFile::new(
                file.name_with_extension(format.primary_extension()),
                format.mime(),
                encoded,
            ))
        } else {
            Ok(ImageFile::new(
                file.name.clone(),
                file.content_type.clone(),
                encoded,
            ))
        }
    }
}

impl NativeCompressor {
    /// Downscale so the longer side fits `bound`, preserving aspect ratio.
    /// Smaller images pass through untouched.
    fn shrink_to_bound(&self, bitmap: Bitmap, bound: u32) -> Result<Bitmap> {
        let longest = bitmap.width().max(bitmap.height());
        if bound == 0 || longest <= bound {
            return Ok(bitmap);
        }

        let scale = bound as f64 / longest as f64;
        let width = (bitmap.width() as f64 * scale).round().max(1.0) as u32;
        let height = (bitmap.height() as f64 * scale).round().max(1.0) as u32;
        self.codec
            .draw_scaled(&bitmap, width, height)
            .map_err(|e| StageError::compression(e.to_string()))
    }

    fn lossy_descent(
        &self,
        bitmap: &Bitmap,
        format: ImageFormat,
        initial_quality: f64,
        budget: usize,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<Vec<u8>> {
        let ladder = quality_ladder(initial_quality);
        let total = ladder.len();
        let mut best: Option<Vec<u8>> = None;

        for (pass, quality) in ladder.into_iter().enumerate() {
            let attempt = self
                .codec
                .encode(bitmap, format, quality as f32)
                .map_err(|e| StageError::compression(e.to_string()))?;
            let fits = attempt.len() <= budget;

            if best.as_ref().map_or(true, |b| attempt.len() < b.len()) {
                best = Some(attempt);
            }
            on_progress(pass_progress(pass + 1, total));
            if fits {
                break;
            }
        }

        // Ladder is never empty, so best is always set
        best.ok_or_else(|| StageError::compression("no encode pass produced output"))
    }

    fn lossless_descent(
        &self,
        bitmap: &Bitmap,
        budget: usize,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<Vec<u8>> {
        let mut best = self
            .codec
            .encode(bitmap, ImageFormat::PNG, 1.0)
            .map_err(|e| StageError::compression(e.to_string()))?;
        on_progress(40);

        if best.len() <= budget {
            return Ok(best);
        }

        // Quality does not apply to PNG; shrink the canvas instead
        let mut current = bitmap.clone();
        for pass in 1..=MAX_DIMENSION_PASSES {
            let width = (current.width() as f64 * DIMENSION_STEP).round().max(1.0) as u32;
            let height = (current.height() as f64 * DIMENSION_STEP).round().max(1.0) as u32;
            current = self
                .codec
                .draw_scaled(&current, width, height)
                .map_err(|e| StageError::compression(e.to_string()))?;

            let attempt = self
                .codec
                .encode(&current, ImageFormat::PNG, 1.0)
                .map_err(|e| StageError::compression(e.to_string()))?;
            if attempt.len() < best.len() {
                best = attempt;
            }
            on_progress(40 + (pass as usize * 60 / MAX_DIMENSION_PASSES as usize) as u8);
            if best.len() <= budget {
                break;
            }
        }

        Ok(best)
    }
}

/// Descending quality sequence starting at `initial`, stepping by
/// [`QUALITY_STEP`] down to [`QUALITY_FLOOR`]. An initial value at or below
/// the floor yields a single pass at that value.
fn quality_ladder(initial: f64) -> Vec<f64> {
    let initial = initial.clamp(0.0, 1.0);
    let mut ladder = vec![initial];
    let mut quality = initial;
    while quality > QUALITY_FLOOR {
        quality = (quality * QUALITY_STEP).max(QUALITY_FLOOR);
        ladder.push(quality);
    }
    ladder
}

// Passes map onto 20-100
fn pass_progress(done: usize, total: usize) -> u8 {
    (20 + done * 80 / total.max(1)) as u8
}

/// The container the output keeps: preserved from the requested MIME type,
/// except GIF which is re-encoded as PNG, and unknown types which fall back
/// to JPEG.
fn output_format(file_type: &str) -> ImageFormat {
    match ImageFormat::from_mime(file_type) {
        Some(ImageFormat::GIF) => ImageFormat::PNG,
        Some(format) => format,
        None => ImageFormat::JPEG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_descends_to_the_floor() {
        let ladder = quality_ladder(0.9);
        assert_eq!(ladder.first(), Some(&0.9));
        assert_eq!(ladder.last(), Some(&QUALITY_FLOOR));
        assert!(ladder.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn ladder_below_floor_is_a_single_pass() {
        assert_eq!(quality_ladder(0.2), vec![0.2]);
        assert_eq!(quality_ladder(QUALITY_FLOOR), vec![QUALITY_FLOOR]);
    }

    #[test]
    fn pass_progress_spans_the_native_range() {
        assert_eq!(pass_progress(1, 4), 40);
        assert_eq!(pass_progress(4, 4), 100);
        assert_eq!(pass_progress(1, 1), 100);
    }

    #[test]
    fn output_format_maps_gif_and_unknown() {
        assert_eq!(output_format("image/gif"), ImageFormat::PNG);
        assert_eq!(output_format("application/pdf"), ImageFormat::JPEG);
        assert_eq!(output_format("image/webp"), ImageFormat::WebP);
        assert_eq!(output_format("image/jpeg"), ImageFormat::JPEG);
    }
}
