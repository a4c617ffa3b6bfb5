//! Utility functions for image handling.
//!
//! This module provides functions for loading page rasters and converting
//! between image formats for the clustering pipeline.

use crate::core::PipelineError;
use image::{DynamicImage, GrayImage};

/// Converts a DynamicImage to a GrayImage.
///
/// # Arguments
///
/// * `img` - The DynamicImage to convert
///
/// # Returns
///
/// * `GrayImage` - The converted grayscale image
pub fn dynamic_to_gray(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Loads a page raster from a file path.
///
/// Any format supported by the image crate is accepted; the decoded
/// raster is returned as-is so the layout extractor can pick its own
/// working representation.
///
/// # Errors
///
/// Returns [`PipelineError::ImageLoad`] if the file cannot be read or
/// decoded as a valid raster.
pub fn load_image(path: &std::path::Path) -> Result<DynamicImage, PipelineError> {
    image::open(path).map_err(PipelineError::ImageLoad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_missing_file_is_a_load_error() {
        let err = load_image(std::path::Path::new("/nonexistent/page.png")).unwrap_err();
        assert!(matches!(err, PipelineError::ImageLoad(_)));
    }

    #[test]
    fn test_gray_conversion_preserves_dimensions() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 30, Luma([128])));
        let gray = dynamic_to_gray(&img);
        assert_eq!(gray.dimensions(), (20, 30));
    }
}
