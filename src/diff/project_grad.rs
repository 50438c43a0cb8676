//! Gradients for camera projection.
//!
//! Forward (see `core::camera`):
//! - Extrinsics `[X, Y, Z] = R · p + t`
//! - Pinhole `u = K00 · X/Z + K01 · Y/Z + K02`, `v = K10 · X/Z + K11 · Y/Z + K12`
//!
//! We keep these functions small so they can be composed in tests.

use crate::core::camera::Camera;
use nalgebra::{Matrix3, Vector2, Vector3};

/// Gradient of `Camera::project` w.r.t. `point_cam`, given upstream `d_uv`.
///
/// Returns dL/d[X, Y, Z]. No guard on Z; near-zero depths are reported by the
/// forward pass.
pub fn project_point_grad_point_cam(point_cam: &Vector3<f64>, intrinsics: &Matrix3<f64>, d_uv: &Vector2<f64>) -> Vector3<f64> {
    let x = point_cam.x;
    let y = point_cam.y;
    let z = point_cam.z;

    let z_inv = 1.0 / z;
    let z_inv2 = z_inv * z_inv;

    // dL/d(X/Z), dL/d(Y/Z)
    let d_xn = d_uv.x * intrinsics[(0, 0)] + d_uv.y * intrinsics[(1, 0)];
    let d_yn = d_uv.x * intrinsics[(0, 1)] + d_uv.y * intrinsics[(1, 1)];

    let d_x = d_xn * z_inv;
    let d_y = d_yn * z_inv;
    let d_z = -(d_xn * x + d_yn * y) * z_inv2;

    Vector3::new(d_x, d_y, d_z)
}

/// Backward of `Camera::project_points`: world-space gradients for a batch.
pub fn project_points_grad(camera: &Camera, camera_points: &[Vector3<f64>], d_pixels: &[Vector2<f64>]) -> Vec<Vector3<f64>> {
    assert_eq!(camera_points.len(), d_pixels.len());
    let r_t = camera.rotation().transpose();
    camera_points
        .iter()
        .zip(d_pixels)
        .map(|(pc, d_uv)| r_t * project_point_grad_point_cam(pc, &camera.intrinsics, d_uv))
        .collect()
}
