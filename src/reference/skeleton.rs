//! Zhang–Suen thinning and skeleton pixel ordering.

use image::GrayImage;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Order in which skeleton pixels are reported. The first pixel is the tip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkeletonOrder {
    /// Decreasing geodesic distance from the base (the right-most skeleton pixel).
    #[default]
    TipToBase,
    /// Row-major order.
    Raster,
}

/// Neighbors P2..P9, clockwise starting north.
const NEIGHBORS: [(i64, i64); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

struct Grid {
    width: i64,
    height: i64,
    cells: Vec<u8>,
}

impl Grid {
    fn get(&self, x: i64, y: i64) -> u8 {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            0
        } else {
            self.cells[(y * self.width + x) as usize]
        }
    }

    fn ring(&self, x: i64, y: i64) -> [u8; 8] {
        let mut p = [0u8; 8];
        for (k, (dx, dy)) in NEIGHBORS.iter().enumerate() {
            p[k] = self.get(x + dx, y + dy);
        }
        p
    }
}

/// Whether the pixel at `(x, y)` is removable in the given sub-iteration.
fn removable(grid: &Grid, x: i64, y: i64, second_pass: bool) -> bool {
    let p = grid.ring(x, y);
    let b: u8 = p.iter().sum();
    if !(2..=6).contains(&b) {
        return false;
    }
    let transitions = (0..8).filter(|&k| p[k] == 0 && p[(k + 1) % 8] == 1).count();
    if transitions != 1 {
        return false;
    }
    let [p2, _, p4, _, p6, _, p8, _] = p;
    if second_pass {
        p2 * p4 * p8 == 0 && p2 * p6 * p8 == 0
    } else {
        p2 * p4 * p6 == 0 && p4 * p6 * p8 == 0
    }
}

/// Thin a binary mask (non-zero = foreground) to a one-pixel-wide skeleton of 0/1 values.
///
/// A sub-iteration that would erase every remaining foreground pixel keeps the
/// first one, so small blobs such as a 2×2 block collapse to a point instead
/// of disappearing.
pub fn zhang_suen_thin(mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();
    let mut grid = Grid {
        width: i64::from(w),
        height: i64::from(h),
        cells: mask.pixels().map(|p| u8::from(p[0] > 0)).collect(),
    };

    let mut foreground: Vec<usize> = (0..grid.cells.len()).filter(|&i| grid.cells[i] == 1).collect();

    loop {
        let mut changed = false;
        for second_pass in [false, true] {
            let mut marked: Vec<usize> = foreground
                .iter()
                .copied()
                .filter(|&i| {
                    let x = i as i64 % grid.width;
                    let y = i as i64 / grid.width;
                    removable(&grid, x, y, second_pass)
                })
                .collect();

            if !marked.is_empty() && marked.len() == foreground.len() {
                marked.remove(0);
            }
            if marked.is_empty() {
                continue;
            }

            for &i in &marked {
                grid.cells[i] = 0;
            }
            foreground.retain(|&i| grid.cells[i] == 1);
            changed = true;
        }
        if !changed {
            break;
        }
    }

    GrayImage::from_raw(w, h, grid.cells).unwrap_or_else(|| GrayImage::new(w, h))
}

/// Skeleton pixels `(x, y)` with `x < max_x`, in the requested order.
pub fn ordered_pixels(skeleton: &GrayImage, max_x: u32, order: SkeletonOrder) -> Vec<Vector2<f64>> {
    let raster: Vec<(u32, u32)> = skeleton
        .enumerate_pixels()
        .filter(|(x, _, p)| *x < max_x && p[0] > 0)
        .map(|(x, y, _)| (x, y))
        .collect();

    let ordered = match order {
        SkeletonOrder::Raster => raster,
        SkeletonOrder::TipToBase => order_tip_to_base(&raster, max_x.min(skeleton.width()), skeleton.height()),
    };

    ordered
        .into_iter()
        .map(|(x, y)| Vector2::new(f64::from(x), f64::from(y)))
        .collect()
}

fn order_tip_to_base(raster: &[(u32, u32)], width: u32, height: u32) -> Vec<(u32, u32)> {
    // Right-most pixel; on ties the first in raster order.
    let Some(base) = raster
        .iter()
        .enumerate()
        .fold(None::<(usize, u32)>, |best, (k, &(x, _))| match best {
            Some((_, bx)) if x <= bx => best,
            _ => Some((k, x)),
        })
        .map(|(k, _)| k)
    else {
        return Vec::new();
    };

    let w = width as usize;
    let mut index_of = vec![usize::MAX; w * height as usize];
    for (k, &(x, y)) in raster.iter().enumerate() {
        index_of[y as usize * w + x as usize] = k;
    }

    let mut distance = vec![usize::MAX; raster.len()];
    distance[base] = 0;
    let mut queue = VecDeque::from([base]);
    while let Some(k) = queue.pop_front() {
        let (x, y) = raster[k];
        for (dx, dy) in NEIGHBORS {
            let nx = i64::from(x) + dx;
            let ny = i64::from(y) + dy;
            if nx < 0 || ny < 0 || nx >= i64::from(width) || ny >= i64::from(height) {
                continue;
            }
            let n = index_of[ny as usize * w + nx as usize];
            if n != usize::MAX && distance[n] == usize::MAX {
                distance[n] = distance[k] + 1;
                queue.push_back(n);
            }
        }
    }

    let mut connected: Vec<usize> = (0..raster.len()).filter(|&k| distance[k] != usize::MAX).collect();
    connected.sort_by(|&a, &b| distance[b].cmp(&distance[a]));
    let unconnected = (0..raster.len()).filter(|&k| distance[k] == usize::MAX);

    connected.into_iter().chain(unconnected).map(|k| raster[k]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn block(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
        let mut img = GrayImage::new(w, h);
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Luma([1]));
            }
        }
        img
    }

    fn count(img: &GrayImage) -> usize {
        img.pixels().filter(|p| p[0] > 0).count()
    }

    #[test]
    fn test_thick_bar_thins_to_single_row() {
        let img = block(40, 15, 5, 5, 35, 10);
        let skel = zhang_suen_thin(&img);

        assert!(count(&skel) > 0);
        for x in 0..40 {
            let column = (0..15).filter(|&y| skel.get_pixel(x, y)[0] > 0).count();
            assert!(column <= 1, "column {} has {} pixels", x, column);
        }
        // Skeleton stays inside the bar.
        for (x, y, p) in skel.enumerate_pixels() {
            if p[0] > 0 {
                assert!((5..35).contains(&x) && (5..10).contains(&y));
            }
        }
    }

    #[test]
    fn test_small_block_keeps_a_pixel() {
        let img = block(6, 6, 2, 2, 4, 4);
        assert_eq!(count(&zhang_suen_thin(&img)), 1);
    }

    #[test]
    fn test_one_pixel_line_is_unchanged() {
        let img = block(20, 5, 2, 2, 18, 3);
        assert_eq!(zhang_suen_thin(&img), img);
    }

    #[test]
    fn test_tip_to_base_starts_far_from_right_edge() {
        // Diagonal line from (2, 2) to (12, 12): right-most pixel is the base.
        let mut img = GrayImage::new(20, 20);
        for i in 2..=12 {
            img.put_pixel(i, i, Luma([1]));
        }
        let ordered = ordered_pixels(&img, 20, SkeletonOrder::TipToBase);
        assert_eq!(ordered.len(), 11);
        assert_eq!(ordered[0], Vector2::new(2.0, 2.0));
        assert_eq!(ordered[10], Vector2::new(12.0, 12.0));
    }

    #[test]
    fn test_raster_order_and_crop() {
        let mut img = GrayImage::new(10, 4);
        img.put_pixel(7, 0, Luma([1]));
        img.put_pixel(1, 2, Luma([1]));
        img.put_pixel(9, 3, Luma([1]));
        let ordered = ordered_pixels(&img, 8, SkeletonOrder::Raster);
        assert_eq!(ordered, vec![Vector2::new(7.0, 0.0), Vector2::new(1.0, 2.0)]);
    }

    #[test]
    fn test_unconnected_pixels_follow_connected_ones() {
        let mut img = GrayImage::new(10, 10);
        img.put_pixel(1, 1, Luma([1]));
        for x in 4..=8 {
            img.put_pixel(x, 6, Luma([1]));
        }
        let ordered = ordered_pixels(&img, 10, SkeletonOrder::TipToBase);
        assert_eq!(ordered[0], Vector2::new(4.0, 6.0));
        assert_eq!(ordered[4], Vector2::new(8.0, 6.0));
        assert_eq!(ordered[5], Vector2::new(1.0, 1.0));
    }
}
