//! Diagnostic overlay of the current fit on the reference mask.

use crate::core::bezier::CurveParameters;
use crate::core::context::ExecutionContext;
use crate::diff::graph::{forward, GraphInputs};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_circle_mut;
use nalgebra::Vector2;

const MASK: Rgb<u8> = Rgb([70, 70, 70]);
const CONTOUR: Rgb<u8> = Rgb([0, 200, 0]);
const SKELETON: Rgb<u8> = Rgb([0, 120, 255]);
const TUBE: Rgb<u8> = Rgb([220, 40, 40]);
const CENTERLINE: Rgb<u8> = Rgb([255, 220, 0]);
const REFERENCE_TIP: Rgb<u8> = Rgb([0, 255, 255]);
const PROJECTED_TIP: Rgb<u8> = Rgb([255, 0, 255]);

fn plot(img: &mut RgbImage, p: &Vector2<f64>, color: Rgb<u8>) {
    let x = p.x.round();
    let y = p.y.round();
    if x.is_finite() && y.is_finite() && x >= 0.0 && y >= 0.0 && x < f64::from(img.width()) && y < f64::from(img.height()) {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn ring(img: &mut RgbImage, p: &Vector2<f64>, radius: i32, color: Rgb<u8>) {
    if p.x.is_finite() && p.y.is_finite() {
        draw_hollow_circle_mut(img, (p.x.round() as i32, p.y.round() as i32), radius, color);
    }
}

/// Draw the reference features and the projection of `params` over `mask`.
///
/// The forward pass runs on the workers of `ctx`.
pub fn render_overlay(
    ctx: &ExecutionContext,
    mask: &GrayImage,
    inputs: &GraphInputs<'_>,
    params: &CurveParameters,
) -> RgbImage {
    let mut out = RgbImage::new(mask.width(), mask.height());
    for (x, y, p) in mask.enumerate_pixels() {
        if p[0] > 0 {
            out.put_pixel(x, y, MASK);
        }
    }

    let reference = inputs.reference;
    for p in &reference.contour {
        plot(&mut out, p, CONTOUR);
    }
    for p in &reference.skeleton {
        plot(&mut out, p, SKELETON);
    }

    let tape = ctx.install(|| forward(inputs, params));
    for p in &tape.tube_projection.pixels {
        plot(&mut out, p, TUBE);
    }
    for p in &tape.centerline_projection.pixels {
        plot(&mut out, p, CENTERLINE);
    }

    ring(&mut out, &reference.tip, 5, REFERENCE_TIP);
    if let Some(tip) = tape.projected_tip() {
        ring(&mut out, &tip, 5, PROJECTED_TIP);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FitConfig;
    use crate::reference::{extract_features, ExtractorConfig};
    use crate::render::silhouette::render_silhouette;

    #[test]
    fn test_overlay_marks_reference_and_projection() {
        let mut config = FitConfig::default();
        config.model.num_samples = 31;
        config.model.angular_resolution = 8;

        let gt = CurveParameters([0.02003904, 0.0016096, 0.13205799, 0.00489567, -0.03695673, 0.196168896]);
        let mask = render_silhouette(&config.start, &gt, &config.model, &config.camera);
        let reference = extract_features(&mask, &ExtractorConfig::default()).unwrap();
        let inputs = GraphInputs {
            start: &config.start,
            model: &config.model,
            camera: &config.camera,
            reference: &reference,
            weights: config.weights,
        };

        let ctx = ExecutionContext::new(2).unwrap();
        let img = render_overlay(&ctx, &mask, &inputs, &config.initial);
        assert_eq!(img.dimensions(), (640, 480));
        assert!(img.pixels().any(|p| *p == CONTOUR));
        assert!(img.pixels().any(|p| *p == TUBE));
        assert!(img.pixels().any(|p| *p == PROJECTED_TIP));

        let single = ExecutionContext::single_threaded().unwrap();
        assert_eq!(render_overlay(&single, &mask, &inputs, &config.initial), img);
    }
}
