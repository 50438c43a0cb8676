//! Error types for reference extraction, configuration and fitting.

use thiserror::Error;

/// Errors that can occur while preparing or running a fit.
#[derive(Debug, Error)]
pub enum FitError {
    /// The reference mask has no foreground pixels.
    #[error("reference mask has no foreground pixels")]
    EmptyMask,

    /// Contour tracing found no outer border.
    #[error("no outer contour found in reference mask")]
    NoContour,

    /// A column sampled for the right-edge extension has no foreground.
    #[error("boundary column {column} has no foreground pixels")]
    EmptyBoundaryColumn {
        /// Image column that was sampled.
        column: u32,
    },

    /// Skeletonization left no pixels inside the original image width.
    #[error("skeleton of reference mask is empty")]
    EmptySkeleton,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for fitting operations.
pub type Result<T> = std::result::Result<T, FitError>;
