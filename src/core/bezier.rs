//! Cubic Bezier catheter model.
//!
//! The catheter centerline is a cubic Bezier curve anchored at a fixed start
//! point. Six free parameters encode a middle point and an end point; the two
//! interior Bezier handles are derived so the curve passes through the middle
//! point at s = 0.5:
//!
//! c1 = 4/3·mid − 1/3·start
//! c2 = 4/3·mid − 1/3·end
//!
//! Every sample (position, first and second derivative) is therefore a linear
//! combination of `start`, `mid` and `end`. `CurveWeights` stores those
//! per-sample coefficients so the backward pass in `diff::bezier_grad` is a
//! plain weighted sum.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// How the six optimized scalars map to the middle and end points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterEncoding {
    /// `[mid, end]` are absolute 3D positions.
    #[default]
    Absolute,
    /// `[mid, end]` are offsets from the start point.
    RelativeToStart,
}

/// Which handle is built from the start point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlPointRule {
    /// c1 = 4/3·mid − 1/3·start, c2 = 4/3·mid − 1/3·end
    #[default]
    StartFirst,
    /// c1 = 4/3·mid − 1/3·end, c2 = 4/3·mid − 1/3·start
    EndFirst,
}

/// The six optimized shape parameters: `[mid.x, mid.y, mid.z, end.x, end.y, end.z]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveParameters(pub [f64; 6]);

impl CurveParameters {
    pub fn new(mid: Vector3<f64>, end: Vector3<f64>) -> Self {
        Self([mid.x, mid.y, mid.z, end.x, end.y, end.z])
    }

    pub fn mid(&self) -> Vector3<f64> {
        Vector3::new(self.0[0], self.0[1], self.0[2])
    }

    pub fn end(&self) -> Vector3<f64> {
        Vector3::new(self.0[3], self.0[4], self.0[5])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.0
    }

    /// Resolve the parameters into absolute control points.
    pub fn control_points(&self, start: &Vector3<f64>, encoding: ParameterEncoding) -> ControlPoints {
        let (mid, end) = match encoding {
            ParameterEncoding::Absolute => (self.mid(), self.end()),
            ParameterEncoding::RelativeToStart => (start + self.mid(), start + self.end()),
        };
        ControlPoints {
            start: *start,
            mid,
            end,
        }
    }
}

/// Start, middle and end point of the catheter in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoints {
    pub start: Vector3<f64>,
    pub mid: Vector3<f64>,
    pub end: Vector3<f64>,
}

impl ControlPoints {
    /// The two interior Bezier handles `(c1, c2)`.
    pub fn handles(&self, rule: ControlPointRule) -> (Vector3<f64>, Vector3<f64>) {
        let near_start = self.mid * (4.0 / 3.0) - self.start / 3.0;
        let near_end = self.mid * (4.0 / 3.0) - self.end / 3.0;
        match rule {
            ControlPointRule::StartFirst => (near_start, near_end),
            ControlPointRule::EndFirst => (near_end, near_start),
        }
    }
}

/// Coefficients of one sample quantity on `(start, mid, end)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointWeights {
    pub start: f64,
    pub mid: f64,
    pub end: f64,
}

impl PointWeights {
    fn apply(&self, cp: &ControlPoints) -> Vector3<f64> {
        cp.start * self.start + cp.mid * self.mid + cp.end * self.end
    }
}

/// Per-sample coefficients for position, first and second derivative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveWeights {
    pub position: PointWeights,
    pub first: PointWeights,
    pub second: PointWeights,
}

/// Fold Bernstein-basis weights on `(P0, C1, C2, P3)` into `(start, mid, end)`.
fn fold_basis(basis: [f64; 4], rule: ControlPointRule) -> PointWeights {
    let [w0, w1, w2, w3] = basis;
    // The handle built from `start` contributes -1/3 of its weight to start,
    // the other handle -1/3 of its weight to end; both contribute 4/3 to mid.
    let (from_start, from_end) = match rule {
        ControlPointRule::StartFirst => (w1, w2),
        ControlPointRule::EndFirst => (w2, w1),
    };
    PointWeights {
        start: w0 - from_start / 3.0,
        mid: (w1 + w2) * (4.0 / 3.0),
        end: w3 - from_end / 3.0,
    }
}

/// Weights of the cubic basis, its derivative and second derivative at `s`.
pub fn curve_weights(s: f64, rule: ControlPointRule) -> CurveWeights {
    let t = 1.0 - s;
    let position = [t * t * t, 3.0 * s * t * t, 3.0 * t * s * s, s * s * s];
    let first = [
        -3.0 * t * t,
        3.0 * t * t - 6.0 * s * t,
        6.0 * s * t - 3.0 * s * s,
        3.0 * s * s,
    ];
    let second = [6.0 * t, -12.0 * t + 6.0 * s, 6.0 * t - 12.0 * s, 6.0 * s];
    CurveWeights {
        position: fold_basis(position, rule),
        first: fold_basis(first, rule),
        second: fold_basis(second, rule),
    }
}

/// `n` parameter values evenly spaced over [0, 1], both ends included.
pub fn sample_parameters(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n).map(|i| i as f64 / (n - 1) as f64).collect(),
    }
}

/// A curve sampled at evenly spaced parameter values.
///
/// Index 0 is the start point (s = 0), the last index is the tip (s = 1).
#[derive(Clone, Debug)]
pub struct SampledCurve {
    pub s: Vec<f64>,
    pub position: Vec<Vector3<f64>>,
    pub first_derivative: Vec<Vector3<f64>>,
    pub second_derivative: Vec<Vector3<f64>>,
    /// Linear coefficients used to produce each sample, kept for the backward pass.
    pub weights: Vec<CurveWeights>,
    pub control_points: ControlPoints,
}

impl SampledCurve {
    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Position of the last sample (the modeled tip).
    pub fn tip(&self) -> Option<Vector3<f64>> {
        self.position.last().copied()
    }
}

/// Evaluate the catheter curve at `num_samples` evenly spaced points.
pub fn evaluate_curve(
    start: &Vector3<f64>,
    params: &CurveParameters,
    num_samples: usize,
    encoding: ParameterEncoding,
    rule: ControlPointRule,
) -> SampledCurve {
    let control_points = params.control_points(start, encoding);
    let s = sample_parameters(num_samples);

    let weights: Vec<CurveWeights> = s.iter().map(|&si| curve_weights(si, rule)).collect();
    let position = weights.iter().map(|w| w.position.apply(&control_points)).collect();
    let first_derivative = weights.iter().map(|w| w.first.apply(&control_points)).collect();
    let second_derivative = weights.iter().map(|w| w.second.apply(&control_points)).collect();

    SampledCurve {
        s,
        position,
        first_derivative,
        second_derivative,
        weights,
        control_points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reference_bezier(cp: &ControlPoints, rule: ControlPointRule, s: f64) -> Vector3<f64> {
        let (c1, c2) = cp.handles(rule);
        let t = 1.0 - s;
        cp.start * (t * t * t) + c1 * (3.0 * s * t * t) + c2 * (3.0 * t * s * s) + cp.end * (s * s * s)
    }

    #[test]
    fn test_endpoints_are_exact() {
        let start = Vector3::new(0.02, 0.002, 0.0);
        let params = CurveParameters([0.0365, 0.0036, 0.1202, 0.0056, -0.0166, 0.1645]);
        for n in [2usize, 3, 17, 101] {
            let curve = evaluate_curve(&start, &params, n, ParameterEncoding::Absolute, ControlPointRule::StartFirst);
            assert_eq!(curve.position[0], start);
            assert_eq!(curve.position[n - 1], params.end());
        }
    }

    #[test]
    fn test_relative_encoding_tip_is_start_plus_offset() {
        let start = Vector3::new(0.01, -0.02, 0.03);
        let params = CurveParameters([0.01, 0.0, 0.05, 0.02, 0.01, 0.1]);
        let curve = evaluate_curve(&start, &params, 11, ParameterEncoding::RelativeToStart, ControlPointRule::StartFirst);
        assert_eq!(curve.position[0], start);
        assert_eq!(curve.position[10], start + params.end());
    }

    #[test]
    fn test_curve_passes_through_mid_point() {
        let start = Vector3::new(0.0, 0.0, 0.0);
        let params = CurveParameters([0.03, 0.01, 0.1, -0.02, 0.04, 0.2]);
        for rule in [ControlPointRule::StartFirst, ControlPointRule::EndFirst] {
            let curve = evaluate_curve(&start, &params, 3, ParameterEncoding::Absolute, rule);
            assert_relative_eq!(curve.position[1], params.mid(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_folded_weights_match_bernstein_form() {
        let cp = ControlPoints {
            start: Vector3::new(0.1, 0.2, 0.3),
            mid: Vector3::new(-0.4, 0.5, 0.9),
            end: Vector3::new(0.7, -0.1, 1.5),
        };
        for rule in [ControlPointRule::StartFirst, ControlPointRule::EndFirst] {
            for &s in &[0.0, 0.13, 0.5, 0.77, 1.0] {
                let w = curve_weights(s, rule);
                assert_relative_eq!(w.position.apply(&cp), reference_bezier(&cp, rule, s), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_derivatives_match_finite_difference() {
        let cp = ControlPoints {
            start: Vector3::new(0.02, 0.002, 0.0),
            mid: Vector3::new(0.03, 0.01, 0.1),
            end: Vector3::new(-0.01, 0.03, 0.2),
        };
        let rule = ControlPointRule::StartFirst;
        let h = 1e-5;
        for &s in &[0.1, 0.4, 0.9] {
            let p = |x: f64| reference_bezier(&cp, rule, x);
            let num_first = (p(s + h) - p(s - h)) / (2.0 * h);
            let num_second = (p(s + h) - p(s) * 2.0 + p(s - h)) / (h * h);
            let w = curve_weights(s, rule);
            assert_relative_eq!(w.first.apply(&cp), num_first, epsilon = 1e-7);
            assert_relative_eq!(w.second.apply(&cp), num_second, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_sample_parameters_strictly_increasing() {
        let s = sample_parameters(101);
        assert_eq!(s[0], 0.0);
        assert_eq!(s[100], 1.0);
        assert!(s.windows(2).all(|w| w[0] < w[1]));
    }
}
