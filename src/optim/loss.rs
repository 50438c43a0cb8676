//! Image-space losses between the projected catheter and the reference features.
//!
//! Each loss returns `(loss, d_projected)`; the reference side is fixed.

use nalgebra::Vector2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Weights of the combined loss `contour · chamfer + tip · tip_loss`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossWeights {
    pub contour: f64,
    pub tip: f64,
}

impl Default for LossWeights {
    fn default() -> Self {
        Self { contour: 1.0, tip: 3.0 }
    }
}

impl LossWeights {
    pub fn combine(&self, contour: f64, tip: f64) -> f64 {
        self.contour * contour + self.tip * tip
    }
}

/// Loss values of one forward pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LossState {
    /// Weighted sum of the two differentiated terms.
    pub total: f64,
    pub contour: f64,
    pub tip: f64,
    /// Euclidean pixel distance between projected and reference tip. Not differentiated.
    pub tip_distance: f64,
}

/// Index and distance of the nearest point in `set` to `p`. Ties keep the first index.
fn nearest(p: &Vector2<f64>, set: &[Vector2<f64>]) -> (usize, f64) {
    let mut best = (0usize, f64::INFINITY);
    for (j, q) in set.iter().enumerate() {
        let d2 = (p - q).norm_squared();
        if d2 < best.1 {
            best = (j, d2);
        }
    }
    (best.0, best.1.sqrt())
}

/// d‖p − q‖/dp, zero when the points coincide.
fn distance_grad(p: &Vector2<f64>, q: &Vector2<f64>, distance: f64) -> Vector2<f64> {
    if distance > 0.0 {
        (p - q) / distance
    } else {
        Vector2::zeros()
    }
}

/// Full two-sided Chamfer distance, returning (loss, d_projected).
///
/// loss = Σᵢ minⱼ ‖Pᵢ − Qⱼ‖ + Σⱼ minᵢ ‖Pᵢ − Qⱼ‖
///
/// Both nearest-neighbor searches run on the current rayon pool. The distance
/// matrix is never materialized. Returns zero loss when either set is empty.
pub fn chamfer_loss_and_grad(projected: &[Vector2<f64>], reference: &[Vector2<f64>]) -> (f64, Vec<Vector2<f64>>) {
    let mut d = vec![Vector2::<f64>::zeros(); projected.len()];
    if projected.is_empty() || reference.is_empty() {
        return (0.0, d);
    }

    let forward: Vec<(usize, f64)> = projected.par_iter().map(|p| nearest(p, reference)).collect();
    let backward: Vec<(usize, f64)> = reference.par_iter().map(|q| nearest(q, projected)).collect();

    let mut loss = 0.0;
    for (i, &(j, dist)) in forward.iter().enumerate() {
        loss += dist;
        d[i] += distance_grad(&projected[i], &reference[j], dist);
    }
    for (j, &(i, dist)) in backward.iter().enumerate() {
        loss += dist;
        d[i] += distance_grad(&projected[i], &reference[j], dist);
    }

    (loss, d)
}

/// Mean over the two axes of the squared tip offset, returning (loss, d_projected_tip).
pub fn tip_loss_and_grad(projected_tip: &Vector2<f64>, reference_tip: &Vector2<f64>) -> (f64, Vector2<f64>) {
    let diff = projected_tip - reference_tip;
    (diff.norm_squared() / 2.0, diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pts(raw: &[(f64, f64)]) -> Vec<Vector2<f64>> {
        raw.iter().map(|&(x, y)| Vector2::new(x, y)).collect()
    }

    #[test]
    fn test_chamfer_of_identical_sets_is_zero() {
        let a = pts(&[(0.0, 0.0), (3.0, 4.0), (10.0, -2.0)]);
        let (loss, grad) = chamfer_loss_and_grad(&a, &a);
        assert_eq!(loss, 0.0);
        assert!(grad.iter().all(|g| *g == Vector2::zeros()));
    }

    #[test]
    fn test_chamfer_counts_both_directions() {
        // P = {(0,0)}, Q = {(3,4), (6,8)}: forward 5, backward 5 + 10.
        let p = pts(&[(0.0, 0.0)]);
        let q = pts(&[(3.0, 4.0), (6.0, 8.0)]);
        let (loss, grad) = chamfer_loss_and_grad(&p, &q);
        assert_relative_eq!(loss, 20.0, epsilon = 1e-12);
        // Every term pulls (0,0) toward +(3,4) direction.
        assert_relative_eq!(grad[0], Vector2::new(-0.6, -0.8) * 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_chamfer_grad_matches_finite_difference() {
        let p = pts(&[(1.0, 2.0), (4.0, 0.5), (-2.0, 3.0)]);
        let q = pts(&[(0.0, 0.0), (5.0, 1.0), (-1.0, 4.0), (2.0, 2.5)]);
        let (_, grad) = chamfer_loss_and_grad(&p, &q);

        let h = 1e-6;
        for i in 0..p.len() {
            for axis in 0..2 {
                let mut plus = p.clone();
                let mut minus = p.clone();
                plus[i][axis] += h;
                minus[i][axis] -= h;
                let num = (chamfer_loss_and_grad(&plus, &q).0 - chamfer_loss_and_grad(&minus, &q).0) / (2.0 * h);
                assert_relative_eq!(grad[i][axis], num, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_chamfer_empty_set() {
        let p = pts(&[(1.0, 1.0)]);
        let (loss, grad) = chamfer_loss_and_grad(&p, &[]);
        assert_eq!(loss, 0.0);
        assert_eq!(grad.len(), 1);
    }

    #[test]
    fn test_tip_loss() {
        let (loss, grad) = tip_loss_and_grad(&Vector2::new(13.0, 4.0), &Vector2::new(10.0, 0.0));
        assert_relative_eq!(loss, 12.5, epsilon = 1e-12);
        assert_relative_eq!(grad, Vector2::new(3.0, 4.0), epsilon = 1e-12);
    }

    #[test]
    fn test_default_weights() {
        let w = LossWeights::default();
        assert_relative_eq!(w.combine(2.0, 1.0), 5.0, epsilon = 1e-12);
    }
}
