//! Silhouette contour of the reference mask.
//!
//! Border following (Suzuki–Abe) via `imageproc::contours::find_contours`;
//! among the outer borders the one enclosing the largest area is the catheter.

use crate::error::{FitError, Result};
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use nalgebra::Vector2;

/// Absolute shoelace area of a closed polygon.
pub fn polygon_area(points: &[Vector2<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        twice_area += a.x * b.y - b.x * a.y;
    }
    twice_area.abs() / 2.0
}

/// Ordered boundary pixels `(x, y)` of the largest outer contour.
pub fn largest_outer_contour(mask: &GrayImage) -> Result<Vec<Vector2<f64>>> {
    let contours = find_contours::<i32>(mask);

    let mut best: Option<(f64, Vec<Vector2<f64>>)> = None;
    for contour in contours.into_iter().filter(|c| c.border_type == BorderType::Outer) {
        let points: Vec<Vector2<f64>> = contour
            .points
            .iter()
            .map(|p| Vector2::new(f64::from(p.x), f64::from(p.y)))
            .collect();
        let area = polygon_area(&points);
        match &best {
            Some((best_area, _)) if area <= *best_area => {}
            _ => best = Some((area, points)),
        }
    }

    best.map(|(_, points)| points).ok_or(FitError::NoContour)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fill_rect(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Luma([1]));
            }
        }
    }

    #[test]
    fn test_polygon_area_unit_square() {
        let sq = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
        ];
        assert_eq!(polygon_area(&sq), 1.0);
        assert_eq!(polygon_area(&sq[..2]), 0.0);
    }

    #[test]
    fn test_largest_component_wins() {
        let mut img = GrayImage::new(40, 40);
        fill_rect(&mut img, 2, 2, 6, 6);
        fill_rect(&mut img, 15, 10, 35, 30);
        let contour = largest_outer_contour(&img).unwrap();

        assert!(contour.iter().all(|p| p.x >= 15.0 && p.x <= 34.0 && p.y >= 10.0 && p.y <= 29.0));
        // Boundary pixel centers of a 20×20 block enclose 19×19.
        assert_eq!(polygon_area(&contour), 361.0);
    }

    #[test]
    fn test_empty_mask_has_no_contour() {
        let img = GrayImage::new(10, 10);
        assert!(matches!(largest_outer_contour(&img), Err(FitError::NoContour)));
    }
}
