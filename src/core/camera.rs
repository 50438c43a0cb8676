//! Camera model (pinhole camera with intrinsics and extrinsics).
//!
//! Cameras are used to:
//! - Transform world points (w = 1) into camera space
//! - Project camera-space points to pixel coordinates
//!
//! There is no clipping and no distortion model. Points behind or at the
//! camera plane are projected anyway; `ProjectedPoints` counts the ones whose
//! depth is close enough to zero to blow up the perspective divide.

use nalgebra::{Matrix3, Matrix4, Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// Default |Z| below which a projected point is reported as near-zero depth.
pub const DEFAULT_DEPTH_EPSILON: f64 = 1e-6;

/// A pinhole camera with intrinsic and extrinsic parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// K: [[fx, s, cx], [0, fy, cy], [0, 0, 1]]
    pub intrinsics: Matrix3<f64>,

    /// World to camera transform [R | t; 0 0 0 1]
    pub extrinsics: Matrix4<f64>,

    /// Image width (pixels)
    pub width: u32,

    /// Image height (pixels)
    pub height: u32,
}

impl Default for Camera {
    /// 640×480 camera at the origin, fx = fy = 10 / 7.248 · 640, principal point at the center.
    fn default() -> Self {
        let f = 10.0 / 7.248 * 640.0;
        Self::from_pinhole(f, f, 320.0, 240.0, 640, 480)
    }
}

impl Camera {
    pub fn new(intrinsics: Matrix3<f64>, extrinsics: Matrix4<f64>, width: u32, height: u32) -> Self {
        Self {
            intrinsics,
            extrinsics,
            width,
            height,
        }
    }

    /// Camera at the world origin looking down +Z.
    pub fn from_pinhole(fx: f64, fy: f64, cx: f64, cy: f64, width: u32, height: u32) -> Self {
        let intrinsics = Matrix3::new(fx, 0.0, cx, 0.0, fy, cy, 0.0, 0.0, 1.0);
        Self::new(intrinsics, Matrix4::identity(), width, height)
    }

    pub fn with_extrinsics(mut self, extrinsics: Matrix4<f64>) -> Self {
        self.extrinsics = extrinsics;
        self
    }

    pub fn fx(&self) -> f64 {
        self.intrinsics[(0, 0)]
    }

    pub fn fy(&self) -> f64 {
        self.intrinsics[(1, 1)]
    }

    /// Upper-left 3×3 block of the extrinsics.
    pub fn rotation(&self) -> Matrix3<f64> {
        self.extrinsics.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Transform a point from world coordinates to camera coordinates.
    ///
    /// [X, Y, Z, _] = E · [x, y, z, 1]; the homogeneous row is dropped.
    pub fn world_to_camera(&self, point_world: &Vector3<f64>) -> Vector3<f64> {
        let h = self.extrinsics * Vector4::new(point_world.x, point_world.y, point_world.z, 1.0);
        Vector3::new(h.x, h.y, h.z)
    }

    /// Project a point in camera coordinates to pixel coordinates.
    ///
    /// [u, v] = K[0..2, :] · [X/Z, Y/Z, 1]
    pub fn project(&self, point_camera: &Vector3<f64>) -> Vector2<f64> {
        let k = &self.intrinsics;
        let x = point_camera.x / point_camera.z;
        let y = point_camera.y / point_camera.z;
        Vector2::new(
            k[(0, 0)] * x + k[(0, 1)] * y + k[(0, 2)],
            k[(1, 0)] * x + k[(1, 1)] * y + k[(1, 2)],
        )
    }

    /// Project a point from world coordinates directly to pixel coordinates.
    pub fn world_to_pixel(&self, point_world: &Vector3<f64>) -> Vector2<f64> {
        self.project(&self.world_to_camera(point_world))
    }

    /// Project a batch of world points.
    pub fn project_points(&self, points_world: &[Vector3<f64>], depth_epsilon: f64) -> ProjectedPoints {
        let mut camera_points = Vec::with_capacity(points_world.len());
        let mut pixels = Vec::with_capacity(points_world.len());
        let mut near_zero_depth = 0usize;

        for p in points_world {
            let pc = self.world_to_camera(p);
            if pc.z.abs() < depth_epsilon {
                near_zero_depth += 1;
            }
            pixels.push(self.project(&pc));
            camera_points.push(pc);
        }

        ProjectedPoints {
            camera_points,
            pixels,
            near_zero_depth,
        }
    }
}

/// Output of a batch projection.
#[derive(Clone, Debug, Default)]
pub struct ProjectedPoints {
    /// Camera-space points, kept for the backward pass.
    pub camera_points: Vec<Vector3<f64>>,
    /// Pixel coordinates (x = column, y = row).
    pub pixels: Vec<Vector2<f64>>,
    /// Number of points with |Z| below the depth epsilon.
    pub near_zero_depth: usize,
}
