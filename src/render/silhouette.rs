//! Binary silhouette of the catheter tube.
//!
//! Each projected centerline sample is drawn as a filled disc whose radius is
//! the tube radius at that depth, fx · r / Z. Used to synthesize reference
//! masks with known ground truth.

use crate::config::ModelConfig;
use crate::core::bezier::{evaluate_curve, CurveParameters};
use crate::core::camera::Camera;
use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_circle_mut;
use nalgebra::Vector3;

/// Render a 0/1 mask of the tube described by `start` and `params`.
///
/// Samples with depth at or below `model.depth_epsilon` are left out, as are
/// discs that do not touch the image.
pub fn render_silhouette(start: &Vector3<f64>, params: &CurveParameters, model: &ModelConfig, camera: &Camera) -> GrayImage {
    let mut mask = GrayImage::new(camera.width, camera.height);
    let curve = evaluate_curve(start, params, model.num_samples, model.encoding, model.rule);

    let w = f64::from(camera.width);
    let h = f64::from(camera.height);
    let max_radius = w.max(h);

    for p in &curve.position {
        let pc = camera.world_to_camera(p);
        if pc.z <= model.depth_epsilon {
            continue;
        }
        let center = camera.project(&pc);
        let radius = (camera.fx() * model.radius / pc.z).min(max_radius);

        if center.x + radius < 0.0 || center.y + radius < 0.0 || center.x - radius >= w || center.y - radius >= h {
            continue;
        }

        draw_filled_circle_mut(
            &mut mask,
            (center.x.round() as i32, center.y.round() as i32),
            radius.round().max(1.0) as i32,
            Luma([1]),
        );
    }

    mask
}
