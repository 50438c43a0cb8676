//! Tube surface swept around the catheter centerline.
//!
//! Every curve sample gets a ring of `angular_resolution` points:
//!
//! p(i, j) = c(i) + r · (−N cos θⱼ + B sin θⱼ)
//!
//! where (N, B) is the normal/binormal pair of ONE fixed sample shared by the
//! whole tube, not a per-sample frame. Rings away from that sample are not
//! perpendicular to the centerline.

use super::bezier::SampledCurve;
use super::frame::CurveFrame;
use nalgebra::Vector3;
use std::f64::consts::PI;

/// `n` angles evenly spaced over [0, 2π], both ends included.
pub fn tube_angles(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n).map(|j| 2.0 * PI * j as f64 / (n - 1) as f64).collect(),
    }
}

/// Grid of surface points, stored row-major as (sample, angle).
#[derive(Clone, Debug)]
pub struct TubeMesh {
    pub num_samples: usize,
    pub angular_resolution: usize,
    pub radius: f64,
    /// Sample whose normal/binormal orient every ring.
    pub frame_sample: usize,
    pub angles: Vec<f64>,
    pub points: Vec<Vector3<f64>>,
}

impl TubeMesh {
    pub fn point(&self, sample: usize, angle: usize) -> Vector3<f64> {
        self.points[sample * self.angular_resolution + angle]
    }

    /// Points belonging to one sample's ring.
    pub fn ring(&self, sample: usize) -> &[Vector3<f64>] {
        let start = sample * self.angular_resolution;
        &self.points[start..start + self.angular_resolution]
    }

    /// Flattened points of the rings `first_sample..num_samples`.
    pub fn rings_from(&self, first_sample: usize) -> &[Vector3<f64>] {
        let start = first_sample.min(self.num_samples) * self.angular_resolution;
        &self.points[start..]
    }
}

/// Sweep a circle of `radius` along `curve` using the frame of `frame_sample`.
///
/// `frame_sample` must be a valid sample index.
pub fn build_tube(
    curve: &SampledCurve,
    frame: &CurveFrame,
    radius: f64,
    angular_resolution: usize,
    frame_sample: usize,
) -> TubeMesh {
    let angles = tube_angles(angular_resolution);
    let normal = frame.normal[frame_sample];
    let binormal = frame.binormal[frame_sample];

    let offsets: Vec<Vector3<f64>> = angles
        .iter()
        .map(|&theta| (-normal * theta.cos() + binormal * theta.sin()) * radius)
        .collect();

    let mut points = Vec::with_capacity(curve.len() * angular_resolution);
    for center in &curve.position {
        for offset in &offsets {
            points.push(center + offset);
        }
    }

    TubeMesh {
        num_samples: curve.len(),
        angular_resolution,
        radius,
        frame_sample,
        angles,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bezier::{evaluate_curve, ControlPointRule, CurveParameters, ParameterEncoding};
    use crate::core::frame::{build_frame, DEFAULT_FRAME_EPSILON};
    use approx::assert_relative_eq;

    #[test]
    fn test_tube_shape_and_radius() {
        let start = Vector3::new(0.02, 0.002, 0.0);
        let params = CurveParameters([0.0365, 0.0036, 0.1202, 0.0056, -0.0166, 0.1645]);
        let curve = evaluate_curve(&start, &params, 21, ParameterEncoding::Absolute, ControlPointRule::StartFirst);
        let frame = build_frame(&curve, DEFAULT_FRAME_EPSILON);
        let tube = build_tube(&curve, &frame, 0.0015, 8, 1);

        assert_eq!(tube.points.len(), 21 * 8);
        assert_eq!(tube.ring(20).len(), 8);
        for i in 0..21 {
            for p in tube.ring(i) {
                assert_relative_eq!((p - curve.position[i]).norm(), 0.0015, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_rings_share_one_orientation() {
        let start = Vector3::new(0.0, 0.0, 0.01);
        let params = CurveParameters([0.03, 0.01, 0.1, -0.02, 0.04, 0.2]);
        let curve = evaluate_curve(&start, &params, 11, ParameterEncoding::Absolute, ControlPointRule::StartFirst);
        let frame = build_frame(&curve, DEFAULT_FRAME_EPSILON);
        let tube = build_tube(&curve, &frame, 0.002, 5, 1);

        let first = tube.point(0, 2) - curve.position[0];
        let last = tube.point(10, 2) - curve.position[10];
        assert_relative_eq!(first, last, epsilon = 1e-12);
    }

    #[test]
    fn test_angles_include_both_ends() {
        let a = tube_angles(50);
        assert_eq!(a[0], 0.0);
        assert_relative_eq!(a[49], 2.0 * PI, epsilon = 1e-12);
        assert_eq!(tube_angles(1), vec![0.0]);
    }
}
