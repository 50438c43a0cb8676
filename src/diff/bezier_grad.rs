//! Gradients of curve evaluation.
//!
//! Positions and derivatives are linear in `(start, mid, end)` (see
//! `core::bezier::CurveWeights`), so the backward pass is a weighted sum of the
//! upstream gradients. Both parameter encodings map `mid`/`end` to the six
//! parameters with an identity Jacobian.

use crate::core::bezier::SampledCurve;
use nalgebra::Vector3;

/// Upstream dL/d(sample quantity) for every curve sample.
#[derive(Clone, Debug)]
pub struct CurveGrad {
    pub position: Vec<Vector3<f64>>,
    pub first: Vec<Vector3<f64>>,
    pub second: Vec<Vector3<f64>>,
}

impl CurveGrad {
    pub fn zeros(num_samples: usize) -> Self {
        Self {
            position: vec![Vector3::zeros(); num_samples],
            first: vec![Vector3::zeros(); num_samples],
            second: vec![Vector3::zeros(); num_samples],
        }
    }
}

/// dL/d(start, mid, end).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlPointsGrad {
    pub start: Vector3<f64>,
    pub mid: Vector3<f64>,
    pub end: Vector3<f64>,
}

/// Backward of `evaluate_curve` to the control points.
pub fn evaluate_curve_grad_control_points(curve: &SampledCurve, d_curve: &CurveGrad) -> ControlPointsGrad {
    let mut grad = ControlPointsGrad {
        start: Vector3::zeros(),
        mid: Vector3::zeros(),
        end: Vector3::zeros(),
    };

    for (i, w) in curve.weights.iter().enumerate() {
        for (pw, g) in [
            (&w.position, &d_curve.position[i]),
            (&w.first, &d_curve.first[i]),
            (&w.second, &d_curve.second[i]),
        ] {
            grad.start += g * pw.start;
            grad.mid += g * pw.mid;
            grad.end += g * pw.end;
        }
    }

    grad
}

/// dL/d[mid.x, mid.y, mid.z, end.x, end.y, end.z].
pub fn control_points_grad_params(d_cp: &ControlPointsGrad) -> [f64; 6] {
    [d_cp.mid.x, d_cp.mid.y, d_cp.mid.z, d_cp.end.x, d_cp.end.y, d_cp.end.z]
}
