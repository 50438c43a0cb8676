//! Frenet-like frame (tangent, normal, binormal) along a sampled curve.
//!
//! With d = first derivative and a = second derivative:
//!
//! T = d / ‖d‖
//! N = (d × (a × d)) / (‖d‖ · ‖a × d‖)
//! B = (d × a) / ‖d × a‖
//!
//! The frame is undefined where ‖d‖ or ‖d × a‖ vanishes (straight segments,
//! or a second derivative parallel to the first). Such samples are flagged as
//! degenerate and their undefined vectors are set to zero instead of NaN.

use super::bezier::SampledCurve;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Default threshold below which a frame denominator counts as zero.
pub const DEFAULT_FRAME_EPSILON: f64 = 1e-12;

/// Per-sample orthonormal frame.
#[derive(Clone, Debug)]
pub struct CurveFrame {
    pub tangent: Vec<Vector3<f64>>,
    pub normal: Vec<Vector3<f64>>,
    pub binormal: Vec<Vector3<f64>>,
    /// Indices of samples whose frame could not be formed.
    pub degenerate: Vec<usize>,
}

impl CurveFrame {
    pub fn len(&self) -> usize {
        self.tangent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tangent.is_empty()
    }

    pub fn is_degenerate(&self, index: usize) -> bool {
        self.degenerate.binary_search(&index).is_ok()
    }
}

/// Frame at one sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameAt {
    pub tangent: Vector3<f64>,
    pub normal: Vector3<f64>,
    pub binormal: Vector3<f64>,
    pub degenerate: bool,
}

/// Frame vectors from first derivative `d` and second derivative `a`.
pub fn frame_at(d: &Vector3<f64>, a: &Vector3<f64>, epsilon: f64) -> FrameAt {
    let d_norm = d.norm();
    let u = a.cross(d);
    let u_norm = u.norm();
    let w = d.cross(a);
    let w_norm = w.norm();

    let tangent = if d_norm > epsilon { d / d_norm } else { Vector3::zeros() };

    let normal_denom = d_norm * u_norm;
    let normal = if d_norm > epsilon && u_norm > epsilon {
        d.cross(&u) / normal_denom
    } else {
        Vector3::zeros()
    };

    let binormal = if w_norm > epsilon { w / w_norm } else { Vector3::zeros() };

    FrameAt {
        tangent,
        normal,
        binormal,
        degenerate: d_norm <= epsilon || u_norm <= epsilon,
    }
}

/// Build the frame at every sample of `curve`.
pub fn build_frame(curve: &SampledCurve, epsilon: f64) -> CurveFrame {
    let n = curve.len();
    let mut frame = CurveFrame {
        tangent: Vec::with_capacity(n),
        normal: Vec::with_capacity(n),
        binormal: Vec::with_capacity(n),
        degenerate: Vec::new(),
    };

    for i in 0..n {
        let f = frame_at(&curve.first_derivative[i], &curve.second_derivative[i], epsilon);
        frame.tangent.push(f.tangent);
        frame.normal.push(f.normal);
        frame.binormal.push(f.binormal);
        if f.degenerate {
            frame.degenerate.push(i);
        }
    }

    frame
}
