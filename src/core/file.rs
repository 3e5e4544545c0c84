//! In-memory image file representation.

use std::path::Path;
use std::sync::Arc;
use tokio::fs;

use crate::utils::{format_for_file, ImageFormat, OptimizerError, OptimizerResult};

/// An image blob moving through the pipeline.
///
/// Values are immutable; each stage produces a fresh one. The byte buffer is
/// reference-counted, so cloning a file (and keeping the pre-stage fallback
/// around) never copies pixel data.
#[derive(Debug, Clone)]
pub struct ImageFile {
    /// File name including extension, e.g. `photo.jpg`
    pub name: String,
    /// MIME type, e.g. `image/jpeg`
    pub content_type: String,
    /// Encoded image bytes
    pub data: Arc<[u8]>,
}

impl ImageFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Size of the encoded bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Resolve the container format from MIME type, falling back to the
    /// file name's extension
    pub fn format(&self) -> OptimizerResult<ImageFormat> {
        format_for_file(&self.content_type, &self.name)
    }

    pub fn is_webp(&self) -> bool {
        matches!(self.format(), Ok(ImageFormat::WebP))
    }

    /// The file name with its extension swapped, e.g. `photo.jpg` → `photo.webp`
    pub fn name_with_extension(&self, extension: &str) -> String {
        let stem = Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name);
        format!("{}.{}", stem, extension)
    }

    /// Load a file from disk, inferring the MIME type from its extension
    pub async fn read(path: impl AsRef<Path>) -> OptimizerResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                OptimizerError::io(format!("Path has no file name: {}", path.display()))
            })?
            .to_string();
        let format = crate::utils::format_from_extension(&name)?;

        let data = fs::read(path)
            .await
            .map_err(|e| OptimizerError::io(format!("Failed to read {}: {}", path.display(), e)))?;

        Ok(Self::new(name, format.mime(), data))
    }

    /// Write the encoded bytes to disk
    pub async fn write(&self, path: impl AsRef<Path>) -> OptimizerResult<()> {
        let path = path.as_ref();
        fs::write(path, &self.data)
            .await
            .map_err(|e| OptimizerError::io(format!("Failed to write {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_prefers_content_type_over_extension() {
        let file = ImageFile::new("shot.png", "image/jpeg", vec![1, 2, 3]);
        assert_eq!(file.format().unwrap(), ImageFormat::JPEG);
    }

    #[test]
    fn format_falls_back_to_extension() {
        let file = ImageFile::new("shot.png", "application/octet-stream", vec![1, 2, 3]);
        assert_eq!(file.format().unwrap(), ImageFormat::PNG);
    }

    #[test]
    fn name_with_extension_swaps_suffix() {
        let file = ImageFile::new("holiday.photo.jpg", "image/jpeg", vec![0]);
        assert_eq!(file.name_with_extension("webp"), "holiday.photo.webp");

        let bare = ImageFile::new("screenshot", "image/png", vec![0]);
        assert_eq!(bare.name_with_extension("webp"), "screenshot.webp");
    }

    #[test]
    fn clone_shares_the_byte_buffer() {
        let file = ImageFile::new("a.png", "image/png", vec![9; 64]);
        let copy = file.clone();
        assert!(Arc::ptr_eq(&file.data, &copy.data));
    }
}
