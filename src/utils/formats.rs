use serde::{Deserialize, Serialize};
use std::str::FromStr;
use crate::utils::OptimizerError;

/// Image formats the pipeline knows how to carry.
///
/// GIF is accepted on input (it decodes fine) but is never produced as an
/// output format; compression re-encodes it as PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    JPEG,
    PNG,
    WebP,
    GIF,
}

impl ImageFormat {
    /// MIME type carried in [`crate::core::ImageFile::content_type`]
    pub fn mime(&self) -> &'static str {
        match self {
            Self::JPEG => "image/jpeg",
            Self::PNG => "image/png",
            Self::WebP => "image/webp",
            Self::GIF => "image/gif",
        }
    }

    /// Resolve a format from a MIME type string
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::JPEG),
            "image/png" => Some(Self::PNG),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::GIF),
            _ => None,
        }
    }

    /// Whether encoders for this format take a quality factor
    pub fn is_lossy(&self) -> bool {
        matches!(self, Self::JPEG | Self::WebP)
    }

    /// Get file extensions associated with this format
    pub fn extensions(&self) -> &[&str] {
        match self {
            Self::JPEG => &["jpg", "jpeg"],
            Self::PNG => &["png"],
            Self::WebP => &["webp"],
            Self::GIF => &["gif"],
        }
    }

    /// Check if the extension matches this format
    pub fn matches_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.extensions().contains(&ext.as_str())
    }

    /// Get the primary extension for this format
    pub fn primary_extension(&self) -> &str {
        self.extensions()[0]
    }
}

impl FromStr for ImageFormat {
    type Err = OptimizerError;

    fn from_str(ext: &str) -> Result<Self, Self::Err> {
        [Self::JPEG, Self::PNG, Self::WebP, Self::GIF]
            .into_iter()
            .find(|format| format.matches_extension(ext))
            .ok_or_else(|| OptimizerError::format(format!(
                "Unsupported image format: {}", ext
            )))
    }
}

/// Get format from a file name's extension
pub fn format_from_extension(path: &str) -> Result<ImageFormat, OptimizerError> {
    let ext = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| OptimizerError::format(
            format!("File has no extension: {}", path)
        ))?;

    ImageFormat::from_str(ext)
}

/// Resolve a format from MIME type, falling back to the file name's extension.
///
/// Browsers occasionally deliver blobs with an empty or generic content type;
/// the extension is the tiebreaker.
pub fn format_for_file(content_type: &str, name: &str) -> Result<ImageFormat, OptimizerError> {
    if let Some(format) = ImageFormat::from_mime(content_type) {
        return Ok(format);
    }
    format_from_extension(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!("JPEG".parse::<ImageFormat>().unwrap(), ImageFormat::JPEG);
        assert_eq!("jpg".parse::<ImageFormat>().unwrap(), ImageFormat::JPEG);
        assert!(ImageFormat::JPEG.matches_extension("JPG"));
        assert!(!ImageFormat::PNG.matches_extension("jpg"));
        assert!("svg".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn format_from_extension_requires_a_known_extension() {
        assert_eq!(format_from_extension("shot.PNG").unwrap(), ImageFormat::PNG);
        assert!(format_from_extension("archive.tar").is_err());
        assert!(format_from_extension("no_extension").is_err());
    }
}
