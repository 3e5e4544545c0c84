//! Header-only dimension measurement.

use std::io::Cursor;

use image::ImageReader;

use crate::capability::DimensionProbe;
use crate::core::{Dimensions, ImageFile};
use crate::utils::StageError;

type Result<T> = std::result::Result<T, StageError>;

/// Reads dimensions from the container header without decoding pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeProbe;

impl DimensionProbe for NativeProbe {
    fn measure(&self, file: &ImageFile) -> Result<Dimensions> {
        let reader = ImageReader::new(Cursor::new(file.data.as_ref()))
            .with_guessed_format()
            .map_err(|e| StageError::probe(format!("could not sniff format: {e}")))?;

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| StageError::probe(format!("could not read header: {e}")))?;

        Ok(Dimensions::new(width, height))
    }
}
