//! Right-edge extension of the reference mask before skeletonization.
//!
//! Thinning needs foreground context on both sides of a pixel, so a catheter
//! that leaves the frame on the right would have its centerline cut short. The
//! mask is padded on the right and the catheter silhouette is continued into
//! the padding along the slope observed between two columns near the edge.

use super::ExtractorConfig;
use crate::error::{FitError, Result};
use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use serde::Serialize;
use tracing::debug;

/// Quadrilateral filled into the padding.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EdgeExtension {
    /// Corners `(x, y)`: upper and lower edge points at the image border, then
    /// lower and upper points at the far end of the padding.
    pub corners: [(i32, i32); 4],
    /// dx/dy of the boundary direction between the two sampled columns.
    pub slope: f64,
}

/// Rows with foreground in `column`, top to bottom.
fn foreground_rows(mask: &GrayImage, column: u32) -> Vec<u32> {
    (0..mask.height()).filter(|&y| mask.get_pixel(column, y)[0] > 0).collect()
}

/// Copy `mask` into a 0/1 image `pad_width` columns wider.
fn pad_right(mask: &GrayImage, pad_width: u32) -> GrayImage {
    let (w, h) = mask.dimensions();
    let mut padded = GrayImage::new(w + pad_width, h);
    for (x, y, p) in mask.enumerate_pixels() {
        if p[0] > 0 {
            padded.put_pixel(x, y, Luma([1]));
        }
    }
    padded
}

/// Pad `mask` on the right and fill the continuation of the catheter into the padding.
///
/// Returns the padded 0/1 mask and the filled quadrilateral, or `None` when the
/// catheter does not touch the near column and edge contact is optional.
pub fn extend_right_edge(mask: &GrayImage, config: &ExtractorConfig) -> Result<(GrayImage, Option<EdgeExtension>)> {
    let width = mask.width();
    if config.near_column_offset == 0 || config.near_column_offset > width || config.far_column_offset > width {
        return Err(FitError::InvalidConfig(format!(
            "boundary column offsets {}/{} do not fit an image {} px wide",
            config.near_column_offset, config.far_column_offset, width
        )));
    }
    if config.far_column_offset == 0 {
        return Err(FitError::InvalidConfig("far_column_offset must be at least 1".into()));
    }

    let mut padded = pad_right(mask, config.pad_width);
    if config.pad_width == 0 {
        return Ok((padded, None));
    }

    let near_column = width - config.near_column_offset;
    let far_column = width - config.far_column_offset;
    let near = foreground_rows(mask, near_column);
    let far = foreground_rows(mask, far_column);

    let (near_rows, far_rows) = match (near.first().zip(near.last()), far.first().zip(far.last())) {
        (Some(a), Some(b)) => (a, b),
        (None, _) if !config.require_edge_contact => {
            debug!(near_column, far_column, "Catheter does not reach the right edge, skipping extension");
            return Ok((padded, None));
        }
        (None, _) => return Err(FitError::EmptyBoundaryColumn { column: near_column }),
        (_, None) => return Err(FitError::EmptyBoundaryColumn { column: far_column }),
    };

    let w = f64::from(width);
    let (a_top, a_bottom) = (f64::from(*near_rows.0), f64::from(*near_rows.1));
    let (b_top, b_bottom) = (f64::from(*far_rows.0), f64::from(*far_rows.1));

    let edge_mid = (w, (a_top + a_bottom) / 2.0);
    let inner_mid = (w - config.slope_baseline, (b_top + b_bottom) / 2.0);
    let dx = inner_mid.0 - edge_mid.0;
    let mut dy = inner_mid.1 - edge_mid.1;
    if dy == 0.0 {
        dy += config.slope_epsilon;
    }
    let slope = dx / dy;

    let intercept_up = w - slope * a_top;
    let intercept_down = w - slope * a_bottom;
    let far_x = w + f64::from(config.pad_width);

    let corners = [
        (width as i32, *near_rows.0 as i32),
        (width as i32, *near_rows.1 as i32),
        (far_x as i32, ((far_x - intercept_down) / slope) as i32),
        (far_x as i32, ((far_x - intercept_up) / slope) as i32),
    ];

    let polygon: Vec<Point<i32>> = corners.iter().map(|&(x, y)| Point::new(x, y)).collect();
    draw_polygon_mut(&mut padded, &polygon, Luma([1]));

    debug!(slope, ?corners, "Extended reference mask into right padding");
    Ok((padded, Some(EdgeExtension { corners, slope })))
}
