//! Bitmap primitives on top of the `image` and `webp` crates.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, Rgba, RgbaImage};

use crate::capability::{Bitmap, BitmapCodec};
use crate::core::ImageFile;
use crate::utils::{ImageFormat, StageError};

type Result<T> = std::result::Result<T, StageError>;

/// Default codec, pure Rust, no system libraries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCodec;

impl BitmapCodec for NativeCodec {
    fn decode(&self, file: &ImageFile) -> Result<Bitmap> {
        image::load_from_memory(&file.data)
            .map_err(|e| StageError::codec(format!("decode failed: {e}")))
    }

    fn draw_scaled(&self, bitmap: &Bitmap, width: u32, height: u32) -> Result<Bitmap> {
        if width == 0 || height == 0 {
            return Err(StageError::codec(format!(
                "invalid target size {width}x{height}"
            )));
        }
        Ok(bitmap.resize_exact(width, height, FilterType::Lanczos3))
    }

    fn flatten_white(&self, bitmap: &Bitmap) -> Bitmap {
        let mut canvas = RgbaImage::from_pixel(
            bitmap.width(),
            bitmap.height(),
            Rgba([255, 255, 255, 255]),
        );
        imageops::overlay(&mut canvas, &bitmap.to_rgba8(), 0, 0);
        Bitmap::ImageRgba8(canvas)
    }

    fn encode(&self, bitmap: &Bitmap, format: ImageFormat, quality: f32) -> Result<Vec<u8>> {
        match format {
            ImageFormat::JPEG => encode_jpeg(bitmap, quality),
            ImageFormat::PNG => encode_png(bitmap),
            ImageFormat::WebP => Ok(encode_webp(bitmap, quality)),
            // No GIF encoder is wired up; callers re-encode GIF sources as PNG
            ImageFormat::GIF => Err(StageError::codec("gif output is not supported")),
        }
    }

    fn supports_webp(&self) -> bool {
        true
    }
}

// q in 0-1 → encoder scale 0-100
fn percent(quality: f32) -> f32 {
    quality.clamp(0.0, 1.0) * 100.0
}

fn encode_jpeg(bitmap: &Bitmap, quality: f32) -> Result<Vec<u8>> {
    // JPEG has no alpha channel
    let rgb = bitmap.to_rgb8();
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, percent(quality).round() as u8);
    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| StageError::codec(format!("jpeg encode failed: {e}")))?;
    Ok(buf)
}

fn encode_png(bitmap: &Bitmap) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut buf),
        CompressionType::Best,
        PngFilter::Adaptive,
    );
    bitmap
        .write_with_encoder(encoder)
        .map_err(|e| StageError::codec(format!("png encode failed: {e}")))?;
    Ok(buf)
}

fn encode_webp(bitmap: &Bitmap, quality: f32) -> Vec<u8> {
    let rgba = bitmap.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    encoder.encode(percent(quality)).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> Bitmap {
        Bitmap::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        }))
    }

    #[test]
    fn draw_scaled_hits_exact_dimensions() {
        let codec = NativeCodec;
        let scaled = codec.draw_scaled(&checker(64, 32), 40, 20).unwrap();
        assert_eq!((scaled.width(), scaled.height()), (40, 20));
    }

    #[test]
    fn draw_scaled_rejects_zero_target() {
        let codec = NativeCodec;
        assert!(codec.draw_scaled(&checker(8, 8), 0, 4).is_err());
    }

    #[test]
    fn flatten_white_makes_transparent_pixels_opaque() {
        let codec = NativeCodec;
        let transparent = Bitmap::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 0])));
        let flattened = codec.flatten_white(&transparent).to_rgba8();
        assert_eq!(flattened.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn encode_covers_every_supported_format() {
        let codec = NativeCodec;
        let bitmap = checker(16, 16);
        for format in [ImageFormat::JPEG, ImageFormat::PNG, ImageFormat::WebP] {
            let bytes = codec.encode(&bitmap, format, 0.8).unwrap();
            assert!(!bytes.is_empty(), "{format:?} produced no bytes");
        }
        assert!(codec.encode(&bitmap, ImageFormat::GIF, 0.8).is_err());
    }
}
