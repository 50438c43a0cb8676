//! Core data structures and geometric operations.
//!
//! This module contains the forward model of the catheter:
//! - `bezier`: curve parameters and cubic Bezier evaluation
//! - `frame`: tangent/normal/binormal frame along the curve
//! - `tube`: circular tube surface swept around the curve
//! - `camera`: pinhole projection to pixel coordinates
//! - `context`: per-run execution context (thread pool)
//!
//! Gradients of these operations live in `diff`.

pub mod bezier;
pub mod camera;
pub mod context;
pub mod frame;
pub mod tube;

// Re-export public types
pub use bezier::{
    evaluate_curve, ControlPointRule, ControlPoints, CurveParameters, ParameterEncoding, SampledCurve,
};
pub use camera::{Camera, ProjectedPoints, DEFAULT_DEPTH_EPSILON};
pub use context::ExecutionContext;
pub use frame::{build_frame, CurveFrame, DEFAULT_FRAME_EPSILON};
pub use tube::{build_tube, TubeMesh};
