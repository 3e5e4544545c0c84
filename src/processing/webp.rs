//! WebP conversion stage.

use tracing::warn;

use crate::capability::BitmapCodec;
use crate::core::ImageFile;
use crate::utils::{ImageFormat, StageError};

type Result<T> = std::result::Result<T, StageError>;

/// Re-encode `file` as WebP at the given quality.
///
/// The source is composited onto an opaque white surface first so that
/// transparent regions flatten cleanly instead of producing alpha artifacts.
/// A WebP encoder that yields zero bytes triggers a JPEG fallback at the same
/// quality; a fallback that also yields nothing is a stage failure, since an
/// empty file must never leave this stage.
pub fn convert_to_webp(
    codec: &dyn BitmapCodec,
    file: &ImageFile,
    quality: f32,
) -> Result<ImageFile> {
    let bitmap = codec
        .decode(file)
        .map_err(|e| StageError::conversion(e.to_string()))?;
    let flattened = codec.flatten_white(&bitmap);

    let encoded = codec
        .encode(&flattened, ImageFormat::WebP, quality)
        .map_err(|e| StageError::conversion(e.to_string()))?;

    if !encoded.is_empty() {
        return Ok(ImageFile::new(
            file.name_with_extension("webp"),
            ImageFormat::WebP.mime(),
            encoded,
        ));
    }

    warn!(
        "WebP encoder produced no bytes for '{}', falling back to JPEG",
        file.name
    );
    let fallback = codec
        .encode(&flattened, ImageFormat::JPEG, quality)
        .map_err(|e| StageError::conversion(e.to_string()))?;
    if fallback.is_empty() {
        return Err(StageError::conversion("fallback encoder produced no bytes"));
    }

    Ok(ImageFile::new(
        file.name_with_extension("jpg"),
        ImageFormat::JPEG.mime(),
        fallback,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Bitmap;
    use image::RgbaImage;

    /// Codec whose WebP output is configurable, for exercising the fallback.
    struct FixedCodec {
        webp_bytes: Vec<u8>,
        jpeg_bytes: Vec<u8>,
    }

    impl BitmapCodec for FixedCodec {
        fn decode(&self, _file: &ImageFile) -> Result<Bitmap> {
            Ok(Bitmap::ImageRgba8(RgbaImage::new(2, 2)))
        }

        fn draw_scaled(&self, bitmap: &Bitmap, _w: u32, _h: u32) -> Result<Bitmap> {
            Ok(bitmap.clone())
        }

        fn flatten_white(&self, bitmap: &Bitmap) -> Bitmap {
            bitmap.clone()
        }

        fn encode(&self, _bitmap: &Bitmap, format: ImageFormat, _quality: f32) -> Result<Vec<u8>> {
            match format {
                ImageFormat::WebP => Ok(self.webp_bytes.clone()),
                ImageFormat::JPEG => Ok(self.jpeg_bytes.clone()),
                other => Err(StageError::codec(format!("unexpected format {other:?}"))),
            }
        }

        fn supports_webp(&self) -> bool {
            true
        }
    }

    fn source() -> ImageFile {
        ImageFile::new("photo.png", "image/png", vec![0; 16])
    }

    #[test]
    fn successful_conversion_renames_and_retypes() {
        let codec = FixedCodec {
            webp_bytes: vec![1, 2, 3],
            jpeg_bytes: vec![9; 10],
        };
        let converted = convert_to_webp(&codec, &source(), 0.8).unwrap();
        assert_eq!(converted.name, "photo.webp");
        assert_eq!(converted.content_type, "image/webp");
        assert_eq!(converted.data.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn empty_webp_output_falls_back_to_jpeg() {
        let codec = FixedCodec {
            webp_bytes: Vec::new(),
            jpeg_bytes: vec![7, 7],
        };
        let converted = convert_to_webp(&codec, &source(), 0.8).unwrap();
        assert_eq!(converted.name, "photo.jpg");
        assert_eq!(converted.content_type, "image/jpeg");
        assert_eq!(converted.data.as_ref(), &[7, 7]);
    }

    #[test]
    fn empty_fallback_is_a_stage_failure() {
        let codec = FixedCodec {
            webp_bytes: Vec::new(),
            jpeg_bytes: Vec::new(),
        };
        assert!(convert_to_webp(&codec, &source(), 0.8).is_err());
    }
}
