//! Constants used throughout the clustering pipeline.
//!
//! Values the specification treats as fixed live here; everything an
//! operator may tune lives in [`crate::core::config`] instead.

/// Default number of batch items above which extraction switches to
/// parallel processing.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4;

/// Substituted for empty or whitespace-only OCR text before embedding so
/// that every document yields a vector.
pub const EMPTY_TEXT_PLACEHOLDER: &str = "empty document";

/// Pixels darker than this count as ink when computing grid densities.
pub const INK_BRIGHTNESS_THRESHOLD: u8 = 128;

/// Low threshold for Canny edge detection ahead of line detection.
pub const CANNY_LOW_THRESHOLD: f32 = 50.0;

/// High threshold for Canny edge detection ahead of line detection.
pub const CANNY_HIGH_THRESHOLD: f32 = 150.0;

/// Accumulator votes a line needs before it is reported. Roughly the
/// minimum supported segment length in pixels.
pub const LINE_VOTE_THRESHOLD: u32 = 100;

/// Suppression radius for near-duplicate detected lines, in accumulator
/// cells. Roughly the tolerated gap between collinear segments.
pub const LINE_SUPPRESSION_RADIUS: u32 = 10;

/// Line counts are divided by this before being capped at 1.0.
pub const LINE_COUNT_NORMALIZER: f32 = 100.0;

/// Segments deviating less than this many degrees from horizontal count
/// as horizontal ruling lines.
pub const HORIZONTAL_ANGLE_DEGREES: f32 = 10.0;

/// Segments deviating more than this many degrees from horizontal count
/// as vertical ruling lines.
pub const VERTICAL_ANGLE_DEGREES: f32 = 80.0;

/// Seed for centroid initialization, fixed for reproducible runs.
pub const KMEANS_SEED: u64 = 42;

/// Number of centroid-clustering restarts; the best run by inertia wins.
pub const KMEANS_RESTARTS: usize = 10;

/// Maximum Lloyd iterations per centroid-clustering restart.
pub const KMEANS_MAX_ITERATIONS: usize = 300;

/// Centroid shift below which a centroid-clustering run is converged.
pub const KMEANS_CONVERGENCE_THRESHOLD: f32 = 1e-4;
