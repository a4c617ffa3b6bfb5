//! Feature fusion.
//!
//! Combines the semantic text embedding matrix and the layout descriptor
//! matrix into one fused matrix per batch. The two families have
//! unrelated native scales, so each is standardized independently before
//! the configured weights are applied; without that, whichever family has
//! the larger raw magnitudes would dominate every distance computation
//! downstream.
//!
//! Standardization is a pure function of the current batch. Nothing is
//! fitted once and reused: each feature family gets its own independent
//! mean/variance computation per call.

use crate::core::{PipelineError, PipelineResult};
use ndarray::{concatenate, Array1, Array2, Axis};

/// Rescales every column of `matrix` to zero mean and unit variance,
/// returning the rescaled matrix along with the per-column means and
/// standard deviations it computed.
///
/// Columns with zero variance are left centered but unscaled (their
/// reported deviation is the neutral 1.0), so constant features cannot
/// produce non-finite values.
pub fn standardize(matrix: &Array2<f32>) -> (Array2<f32>, Array1<f32>, Array1<f32>) {
    let rows = matrix.nrows();
    let cols = matrix.ncols();
    if rows == 0 || cols == 0 {
        return (matrix.clone(), Array1::zeros(cols), Array1::ones(cols));
    }

    let means = matrix
        .mean_axis(Axis(0))
        .expect("row count checked above");

    let mut stds = Array1::ones(cols);
    for (col, std) in stds.iter_mut().enumerate() {
        let column = matrix.column(col);
        let mean = means[col];
        let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / rows as f32;
        let deviation = variance.sqrt();
        if deviation > f32::EPSILON {
            *std = deviation;
        }
    }

    let mut standardized = matrix.clone();
    for mut row in standardized.rows_mut() {
        for (col, value) in row.iter_mut().enumerate() {
            *value = (*value - means[col]) / stds[col];
        }
    }

    (standardized, means, stds)
}

/// Fuses the text and layout matrices into one weighted matrix, one row
/// per document.
///
/// Each family is standardized independently over the current batch,
/// multiplied by its weight, and the results are concatenated row-wise,
/// so `dim(fused) = dim(text) + dim(layout)`.
///
/// # Errors
///
/// * [`PipelineError::DimensionMismatch`] when the two matrices disagree
///   on row count; this is an upstream contract violation, not retryable.
/// * [`PipelineError::InvalidWeight`] when either weight is negative.
pub fn fuse(
    text_vectors: &Array2<f32>,
    layout_vectors: &Array2<f32>,
    text_weight: f32,
    layout_weight: f32,
) -> PipelineResult<Array2<f32>> {
    if text_vectors.nrows() != layout_vectors.nrows() {
        return Err(PipelineError::dimension_mismatch(
            "fusion rows",
            text_vectors.nrows(),
            layout_vectors.nrows(),
        ));
    }
    if text_weight < 0.0 {
        return Err(PipelineError::invalid_weight("text_weight", text_weight));
    }
    if layout_weight < 0.0 {
        return Err(PipelineError::invalid_weight("layout_weight", layout_weight));
    }

    let (text_standardized, _, _) = standardize(text_vectors);
    let (layout_standardized, _, _) = standardize(layout_vectors);

    let weighted_text = text_standardized * text_weight;
    let weighted_layout = layout_standardized * layout_weight;

    Ok(concatenate(
        Axis(1),
        &[weighted_text.view(), weighted_layout.view()],
    )?)
}
