//! Static computation graph of one fit iteration.
//!
//! The pipeline is fixed:
//!
//! ```text
//! CurveEval → FrameBuild → TubeBuild → Project → ChamferLoss
//!                                         └────→ TipLoss
//! ```
//!
//! `forward` records every activation on a `Tape`; `backward` walks `PIPELINE`
//! in reverse and applies each node's chain rule to the accumulated adjoints,
//! ending with dL/d(parameters).

use super::bezier_grad::{control_points_grad_params, evaluate_curve_grad_control_points, CurveGrad};
use super::frame_grad::{binormal_grad, normal_grad};
use super::project_grad::project_points_grad;
use super::tube_grad::build_tube_grad;
use crate::config::ModelConfig;
use crate::core::bezier::{evaluate_curve, CurveParameters, SampledCurve};
use crate::core::camera::{Camera, ProjectedPoints};
use crate::core::frame::{build_frame, CurveFrame};
use crate::core::tube::{build_tube, TubeMesh};
use crate::optim::loss::{chamfer_loss_and_grad, tip_loss_and_grad, LossState, LossWeights};
use crate::reference::ReferenceFeatures;
use nalgebra::{Vector2, Vector3};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Node {
    CurveEval,
    FrameBuild,
    TubeBuild,
    Project,
    ChamferLoss,
    TipLoss,
}

/// Nodes in forward (topological) order.
pub const PIPELINE: [Node; 6] = [
    Node::CurveEval,
    Node::FrameBuild,
    Node::TubeBuild,
    Node::Project,
    Node::ChamferLoss,
    Node::TipLoss,
];

/// Everything held fixed during a run.
#[derive(Clone, Copy, Debug)]
pub struct GraphInputs<'a> {
    pub start: &'a Vector3<f64>,
    pub model: &'a ModelConfig,
    pub camera: &'a Camera,
    pub reference: &'a ReferenceFeatures,
    pub weights: LossWeights,
}

/// Activations of one forward pass.
#[derive(Clone, Debug)]
pub struct Tape {
    pub curve: SampledCurve,
    pub frame: CurveFrame,
    pub tube: TubeMesh,
    /// First curve sample that was projected.
    pub first_projected: usize,
    /// Tube rings `first_projected..`, flattened.
    pub tube_projection: ProjectedPoints,
    /// Centerline samples `first_projected..`.
    pub centerline_projection: ProjectedPoints,
    /// dChamfer/d(tube pixels), unweighted.
    pub d_contour: Vec<Vector2<f64>>,
    /// dTip/d(projected tip), unweighted.
    pub d_tip: Vector2<f64>,
    pub loss: LossState,
}

impl Tape {
    /// Projected modeled tip.
    pub fn projected_tip(&self) -> Option<Vector2<f64>> {
        self.centerline_projection.pixels.last().copied()
    }

    /// Whether the frame orienting the tube was degenerate.
    pub fn frame_degenerate(&self) -> bool {
        self.frame.is_degenerate(self.tube.frame_sample)
    }

    /// Projected points (tube and centerline) with near-zero depth.
    pub fn near_zero_depth(&self) -> usize {
        self.tube_projection.near_zero_depth + self.centerline_projection.near_zero_depth
    }
}

/// Run every node forward.
///
/// Panics if `model.frame_sample` is not a valid sample index; `FitConfig::validate` rejects that.
pub fn forward(inputs: &GraphInputs<'_>, params: &CurveParameters) -> Tape {
    let model = inputs.model;

    let curve = evaluate_curve(inputs.start, params, model.num_samples, model.encoding, model.rule);
    let frame = build_frame(&curve, model.frame_epsilon);
    let tube = build_tube(&curve, &frame, model.radius, model.angular_resolution, model.frame_sample);

    let first_projected = model.skip_base_samples.min(curve.len());
    let tube_projection = inputs
        .camera
        .project_points(tube.rings_from(first_projected), model.depth_epsilon);
    let centerline_projection = inputs
        .camera
        .project_points(&curve.position[first_projected..], model.depth_epsilon);

    let (contour, d_contour) = chamfer_loss_and_grad(&tube_projection.pixels, &inputs.reference.contour);

    let reference_tip = inputs.reference.tip;
    let (tip, d_tip, tip_distance) = match centerline_projection.pixels.last() {
        Some(p) => {
            let (loss, grad) = tip_loss_and_grad(p, &reference_tip);
            (loss, grad, (p - reference_tip).norm())
        }
        None => (0.0, Vector2::zeros(), 0.0),
    };

    let loss = LossState {
        total: inputs.weights.combine(contour, tip),
        contour,
        tip,
        tip_distance,
    };

    Tape {
        curve,
        frame,
        tube,
        first_projected,
        tube_projection,
        centerline_projection,
        d_contour,
        d_tip,
        loss,
    }
}

/// Reverse-mode pass: dL/d(parameters) of the weighted total loss.
pub fn backward(inputs: &GraphInputs<'_>, tape: &Tape) -> [f64; 6] {
    let weights = inputs.weights;
    let model = inputs.model;
    let m = tape.tube.angular_resolution;
    let first = tape.first_projected;

    let mut d_tube_pixels = vec![Vector2::<f64>::zeros(); tape.tube_projection.pixels.len()];
    let mut d_center_pixels = vec![Vector2::<f64>::zeros(); tape.centerline_projection.pixels.len()];
    let mut d_tube_points = vec![Vector3::<f64>::zeros(); tape.tube.points.len()];
    let mut d_curve = CurveGrad::zeros(tape.curve.len());
    let mut d_normal = Vector3::zeros();
    let mut d_binormal = Vector3::zeros();
    let mut d_params = [0.0; 6];

    for node in PIPELINE.iter().rev() {
        match node {
            Node::TipLoss => {
                if let Some(d_tip) = d_center_pixels.last_mut() {
                    *d_tip += tape.d_tip * weights.tip;
                }
            }
            Node::ChamferLoss => {
                for (d, g) in d_tube_pixels.iter_mut().zip(&tape.d_contour) {
                    *d += g * weights.contour;
                }
            }
            Node::Project => {
                let tube_world = project_points_grad(inputs.camera, &tape.tube_projection.camera_points, &d_tube_pixels);
                for (d, g) in d_tube_points[first * m..].iter_mut().zip(tube_world) {
                    *d += g;
                }
                let center_world =
                    project_points_grad(inputs.camera, &tape.centerline_projection.camera_points, &d_center_pixels);
                for (d, g) in d_curve.position[first..].iter_mut().zip(center_world) {
                    *d += g;
                }
            }
            Node::TubeBuild => {
                let grad = build_tube_grad(&tape.tube, &d_tube_points);
                for (d, g) in d_curve.position.iter_mut().zip(&grad.position) {
                    *d += g;
                }
                d_normal += grad.normal;
                d_binormal += grad.binormal;
            }
            Node::FrameBuild => {
                let i = tape.tube.frame_sample;
                let d = tape.curve.first_derivative[i];
                let a = tape.curve.second_derivative[i];
                let (nd, na) = normal_grad(&d, &a, &d_normal, model.frame_epsilon);
                let (bd, ba) = binormal_grad(&d, &a, &d_binormal, model.frame_epsilon);
                d_curve.first[i] += nd + bd;
                d_curve.second[i] += na + ba;
            }
            Node::CurveEval => {
                let d_cp = evaluate_curve_grad_control_points(&tape.curve, &d_curve);
                d_params = control_points_grad_params(&d_cp);
            }
        }
    }

    d_params
}

/// Forward then backward at `params`.
pub fn evaluate(inputs: &GraphInputs<'_>, params: &CurveParameters) -> (Tape, [f64; 6]) {
    let tape = forward(inputs, params);
    let grad = backward(inputs, &tape);
    (tape, grad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order() {
        assert_eq!(PIPELINE[0], Node::CurveEval);
        assert_eq!(PIPELINE.iter().position(|n| *n == Node::Project), Some(3));
        assert!(PIPELINE[4..].contains(&Node::ChamferLoss) && PIPELINE[4..].contains(&Node::TipLoss));
    }
}
