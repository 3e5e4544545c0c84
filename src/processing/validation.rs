use crate::core::ImageFile;
use crate::utils::{OptimizerError, OptimizerResult};

/// Validates a blob before any processing starts.
///
/// This is the only check whose failure surfaces to the caller; everything
/// after it degrades instead of failing.
pub fn validate_input(file: &ImageFile) -> OptimizerResult<()> {
    if !file.content_type.to_lowercase().starts_with("image/") {
        return Err(OptimizerError::invalid_input(format!(
            "'{}' is not an image (content type '{}')",
            file.name, file.content_type
        )));
    }

    if file.is_empty() {
        return Err(OptimizerError::invalid_input(format!(
            "'{}' contains no data",
            file.name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::OptimizerError;

    #[test]
    fn accepts_any_image_subtype() {
        let file = ImageFile::new("x.heic", "image/heic", vec![1]);
        assert!(validate_input(&file).is_ok());
    }

    #[test]
    fn rejects_non_image_content_type() {
        let file = ImageFile::new("notes.txt", "text/plain", vec![1, 2]);
        let err = validate_input(&file).unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidInput(_)));
    }

    #[test]
    fn rejects_empty_data() {
        let file = ImageFile::new("ghost.png", "image/png", Vec::new());
        let err = validate_input(&file).unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidInput(_)));
    }

    #[test]
    fn content_type_check_is_case_insensitive() {
        let file = ImageFile::new("x.png", "IMAGE/PNG", vec![1]);
        assert!(validate_input(&file).is_ok());
    }
}
