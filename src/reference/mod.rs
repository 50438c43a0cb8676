//! Reference feature extraction from a binary catheter mask.
//!
//! The reference image is reduced once per run to three fixed targets:
//!
//! - the ordered boundary of the largest silhouette (`contour`)
//! - a one-pixel-wide centerline (`skeleton`), recovered after extending the
//!   mask past the right image edge
//! - the tip, the first skeleton pixel

pub mod contour;
pub mod extension;
pub mod skeleton;

pub use contour::{largest_outer_contour, polygon_area};
pub use extension::{extend_right_edge, EdgeExtension};
pub use skeleton::{ordered_pixels, zhang_suen_thin, SkeletonOrder};

use crate::error::{FitError, Result};
use image::GrayImage;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Tunables of the right-edge extension and skeleton ordering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Columns added on the right before thinning.
    pub pad_width: u32,
    /// Near boundary column is `width - near_column_offset`.
    pub near_column_offset: u32,
    /// Far boundary column is `width - far_column_offset`.
    pub far_column_offset: u32,
    /// Horizontal distance between the two slope sample points.
    pub slope_baseline: f64,
    /// Added to a zero vertical slope component.
    pub slope_epsilon: f64,
    /// Fail when the mask does not touch the near boundary column.
    pub require_edge_contact: bool,
    pub skeleton_order: SkeletonOrder,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            pad_width: 60,
            near_column_offset: 1,
            far_column_offset: 10,
            slope_baseline: 5.0,
            slope_epsilon: 1e-8,
            require_edge_contact: false,
            skeleton_order: SkeletonOrder::TipToBase,
        }
    }
}

/// Fixed targets extracted from the reference mask.
#[derive(Clone, Debug, Serialize)]
pub struct ReferenceFeatures {
    /// Boundary pixels `(x, y)` of the largest outer contour.
    pub contour: Vec<Vector2<f64>>,
    /// Centerline pixels `(x, y)`, tip first.
    pub skeleton: Vec<Vector2<f64>>,
    pub tip: Vector2<f64>,
    pub extension: Option<EdgeExtension>,
    pub width: u32,
    pub height: u32,
}

/// Extract contour, skeleton and tip from a binary mask (non-zero = catheter).
pub fn extract_features(mask: &GrayImage, config: &ExtractorConfig) -> Result<ReferenceFeatures> {
    let (width, height) = mask.dimensions();
    if !mask.pixels().any(|p| p[0] > 0) {
        return Err(FitError::EmptyMask);
    }

    let contour = largest_outer_contour(mask)?;

    let (padded, extension) = extend_right_edge(mask, config)?;
    let thinned = zhang_suen_thin(&padded);
    let skeleton = ordered_pixels(&thinned, width, config.skeleton_order);
    let tip = *skeleton.first().ok_or(FitError::EmptySkeleton)?;

    debug!(
        contour_points = contour.len(),
        skeleton_points = skeleton.len(),
        extended = extension.is_some(),
        "Extracted reference features"
    );
    info!(tip_x = tip.x, tip_y = tip.y, "Reference tip located");

    Ok(ReferenceFeatures {
        contour,
        skeleton,
        tip,
        extension,
        width,
        height,
    })
}
