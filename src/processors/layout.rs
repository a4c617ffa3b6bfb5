//! Layout descriptor extraction.
//!
//! This module turns one page raster into a fixed-length numeric vector
//! capturing the page's visual text geography: text-block geometry, ink
//! density by region, and ruling-line presence. The descriptor is what the
//! fusion stage combines with the semantic text embedding.
//!
//! The detection pipeline binarizes the page with an Otsu threshold
//! (inverted, so ink pixels are on), bridges intra-line character gaps
//! with a wide rectangular dilation, and reads text blocks off the
//! external contours of the resulting blobs.

use crate::core::constants::{
    CANNY_HIGH_THRESHOLD, CANNY_LOW_THRESHOLD, HORIZONTAL_ANGLE_DEGREES, INK_BRIGHTNESS_THRESHOLD,
    LINE_COUNT_NORMALIZER, LINE_SUPPRESSION_RADIUS, LINE_VOTE_THRESHOLD, VERTICAL_ANGLE_DEGREES,
};
use crate::core::{LayoutConfig, PipelineError, PipelineResult};
use crate::domain::TextBlock;
use crate::utils::dynamic_to_gray;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::edges::canny;
use imageproc::hough::{detect_lines, LineDetectionOptions};

/// Extracts layout descriptors from page rasters.
///
/// One extractor is built per pipeline and shared across the batch; it
/// holds no per-document state, so extraction over independent images is
/// safe to run in parallel.
#[derive(Debug, Clone)]
pub struct LayoutExtractor {
    config: LayoutConfig,
}

impl LayoutExtractor {
    /// Creates a new extractor with the given configuration.
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Length of the layout vector this extractor produces.
    pub fn feature_len(&self) -> usize {
        self.config.feature_len()
    }

    /// Extracts the layout descriptor and the detected text blocks from a
    /// page raster.
    ///
    /// The returned vector always has [`Self::feature_len`] entries, even
    /// for a blank page (zero blocks, zero total area, 0.5 mean vertical
    /// center, zero spread, zero line counts).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ImageDecode`] when the raster has a zero
    /// dimension and cannot be analyzed.
    pub fn extract(&self, image: &DynamicImage) -> PipelineResult<(Vec<f32>, Vec<TextBlock>)> {
        let gray = dynamic_to_gray(image);
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::image_decode(format!(
                "zero-dimension raster ({width}x{height})"
            )));
        }

        let text_blocks = self.detect_text_blocks(&gray);
        let features = self.layout_features(&gray, &text_blocks);
        debug_assert_eq!(features.len(), self.feature_len());

        Ok((features, text_blocks))
    }

    /// Detects text blocks on the binarized, dilated ink mask.
    fn detect_text_blocks(&self, gray: &GrayImage) -> Vec<TextBlock> {
        let (width, height) = gray.dimensions();

        let level = otsu_level(gray);
        let mut ink = threshold(gray, level, ThresholdType::BinaryInverted);

        let radius_x = self.config.dilation_kernel_width / 2;
        let radius_y = self.config.dilation_kernel_height / 2;
        for _ in 0..self.config.dilation_iterations {
            ink = dilate_rect(&ink, radius_x, radius_y);
        }

        let page_area = f64::from(width) * f64::from(height);
        let min_area = page_area * self.config.min_block_area_fraction;

        let mut blocks = Vec::new();
        for contour in find_contours::<u32>(&ink) {
            // Top-level outer contours only; holes inside a blob are not blocks.
            if contour.parent.is_some() || contour.points.is_empty() {
                continue;
            }

            let mut min_x = u32::MAX;
            let mut min_y = u32::MAX;
            let mut max_x = 0u32;
            let mut max_y = 0u32;
            for point in &contour.points {
                min_x = min_x.min(point.x);
                min_y = min_y.min(point.y);
                max_x = max_x.max(point.x);
                max_y = max_y.max(point.y);
            }

            let block_width = max_x - min_x + 1;
            let block_height = max_y - min_y + 1;
            if f64::from(block_width) * f64::from(block_height) < min_area {
                continue;
            }

            let norm_width = block_width as f32 / width as f32;
            let norm_height = block_height as f32 / height as f32;
            blocks.push(TextBlock {
                x: min_x as f32 / width as f32,
                y: min_y as f32 / height as f32,
                width: norm_width,
                height: norm_height,
                area: norm_width * norm_height,
            });
        }

        blocks.sort_by(|a, b| a.y.total_cmp(&b.y));
        blocks
    }

    /// Assembles the layout vector from the grayscale page and the
    /// detected blocks.
    fn layout_features(&self, gray: &GrayImage, blocks: &[TextBlock]) -> Vec<f32> {
        let mut features = Vec::with_capacity(self.feature_len());

        features.push(blocks.len() as f32);
        features.push(blocks.iter().map(|b| b.area).sum());

        features.extend(self.grid_densities(gray));

        if blocks.is_empty() {
            features.push(0.5);
            features.push(0.0);
        } else {
            let centers: Vec<f32> = blocks.iter().map(TextBlock::vertical_center).collect();
            let mean = centers.iter().sum::<f32>() / centers.len() as f32;
            features.push(mean);
            if centers.len() < 2 {
                features.push(0.0);
            } else {
                let variance = centers.iter().map(|c| (c - mean).powi(2)).sum::<f32>()
                    / centers.len() as f32;
                features.push(variance.sqrt());
            }
        }

        let (horizontal, vertical) = self.count_ruling_lines(gray);
        features.push((horizontal as f32 / LINE_COUNT_NORMALIZER).min(1.0));
        features.push((vertical as f32 / LINE_COUNT_NORMALIZER).min(1.0));

        features
    }

    /// Fraction of ink pixels per grid cell, row-major.
    ///
    /// Cells are `height / rows` by `width / cols` pixels; the remainder
    /// rows/columns at the page edges are ignored. Degenerate cells (page
    /// smaller than the grid) contribute zero density.
    fn grid_densities(&self, gray: &GrayImage) -> Vec<f32> {
        let (width, height) = gray.dimensions();
        let rows = self.config.grid_rows as u32;
        let cols = self.config.grid_cols as u32;
        let cell_height = height / rows;
        let cell_width = width / cols;

        let mut densities = Vec::with_capacity((rows * cols) as usize);
        for row in 0..rows {
            for col in 0..cols {
                if cell_height == 0 || cell_width == 0 {
                    densities.push(0.0);
                    continue;
                }
                let mut dark = 0u64;
                for y in row * cell_height..(row + 1) * cell_height {
                    for x in col * cell_width..(col + 1) * cell_width {
                        if gray.get_pixel(x, y)[0] < INK_BRIGHTNESS_THRESHOLD {
                            dark += 1;
                        }
                    }
                }
                densities.push(dark as f32 / (cell_height * cell_width) as f32);
            }
        }
        densities
    }

    /// Counts near-horizontal and near-vertical straight lines, a signal
    /// for ruled forms and tables.
    ///
    /// Canny edges feed a Hough transform; the polar angle of each
    /// detected line is the angle of its normal, so a deviation of the
    /// normal from 90 degrees is the line's deviation from horizontal.
    fn count_ruling_lines(&self, gray: &GrayImage) -> (usize, usize) {
        let (width, height) = gray.dimensions();
        // Canny needs a 3x3 neighborhood.
        if width < 3 || height < 3 {
            return (0, 0);
        }

        let edges = canny(gray, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD);
        let lines = detect_lines(
            &edges,
            LineDetectionOptions {
                vote_threshold: LINE_VOTE_THRESHOLD,
                suppression_radius: LINE_SUPPRESSION_RADIUS,
            },
        );

        let mut horizontal = 0usize;
        let mut vertical = 0usize;
        for line in lines {
            let from_horizontal = (line.angle_in_degrees as f32 - 90.0).abs();
            if from_horizontal < HORIZONTAL_ANGLE_DEGREES {
                horizontal += 1;
            } else if from_horizontal > VERTICAL_ANGLE_DEGREES {
                vertical += 1;
            }
        }
        (horizontal, vertical)
    }
}

/// Dilates a binary mask with a rectangular structuring element, given as
/// half-extents per axis.
///
/// Separable: a horizontal pass marks every pixel within `radius_x` of an
/// on pixel in its row, then a vertical pass does the same per column on
/// the intermediate mask. Each pass is a two-sweep distance scan, so the
/// cost is linear in the pixel count.
fn dilate_rect(mask: &GrayImage, radius_x: u32, radius_y: u32) -> GrayImage {
    let horizontal = dilate_axis(mask, radius_x, true);
    dilate_axis(&horizontal, radius_y, false)
}

fn dilate_axis(mask: &GrayImage, radius: u32, horizontal: bool) -> GrayImage {
    let (width, height) = mask.dimensions();
    if radius == 0 {
        return mask.clone();
    }

    let mut out = GrayImage::new(width, height);
    let (outer, inner) = if horizontal {
        (height, width)
    } else {
        (width, height)
    };

    let pixel = |line: u32, pos: u32| {
        if horizontal {
            mask.get_pixel(pos, line)[0] > 0
        } else {
            mask.get_pixel(line, pos)[0] > 0
        }
    };

    for line in 0..outer {
        let mut forward = u32::MAX;
        for pos in 0..inner {
            forward = if pixel(line, pos) {
                0
            } else {
                forward.saturating_add(1)
            };
            if forward <= radius {
                let (x, y) = if horizontal { (pos, line) } else { (line, pos) };
                out.put_pixel(x, y, Luma([255]));
            }
        }
        let mut backward = u32::MAX;
        for pos in (0..inner).rev() {
            backward = if pixel(line, pos) {
                0
            } else {
                backward.saturating_add(1)
            };
            if backward <= radius {
                let (x, y) = if horizontal { (pos, line) } else { (line, pos) };
                out.put_pixel(x, y, Luma([255]));
            }
        }
    }
    out
}
