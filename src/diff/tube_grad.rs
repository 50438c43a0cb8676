//! Gradient of the tube sweep.
//!
//! p(i, j) = c(i) + r · (−N cos θⱼ + B sin θⱼ), with one (N, B) for the whole tube.

use crate::core::tube::TubeMesh;
use nalgebra::Vector3;

/// dL/d(inputs of `build_tube`).
#[derive(Clone, Debug)]
pub struct TubeGrad {
    /// dL/dc(i) for every centerline sample.
    pub position: Vec<Vector3<f64>>,
    /// dL/dN of the shared frame sample.
    pub normal: Vector3<f64>,
    /// dL/dB of the shared frame sample.
    pub binormal: Vector3<f64>,
}

/// Backward of `build_tube` given dL/dp for every surface point (row-major, like `TubeMesh::points`).
pub fn build_tube_grad(tube: &TubeMesh, d_points: &[Vector3<f64>]) -> TubeGrad {
    assert_eq!(d_points.len(), tube.points.len());

    let m = tube.angular_resolution;
    let mut position = vec![Vector3::zeros(); tube.num_samples];
    let mut normal = Vector3::zeros();
    let mut binormal = Vector3::zeros();

    for (i, d_center) in position.iter_mut().enumerate() {
        for (j, theta) in tube.angles.iter().enumerate() {
            let g = d_points[i * m + j];
            *d_center += g;
            normal -= g * (tube.radius * theta.cos());
            binormal += g * (tube.radius * theta.sin());
        }
    }

    TubeGrad {
        position,
        normal,
        binormal,
    }
}
