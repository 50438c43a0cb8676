//! Fit orchestration.
//!
//! `Init → Iterate → {Converged | MaxIterationsReached} → Finalize`
//!
//! Reference features are extracted once. Each iteration evaluates the loss
//! and its gradient at the current parameters, records them, takes one Adam
//! step and feeds the total loss to the plateau window. After the loop one
//! more forward pass gives the final loss. Non-convergence is a valid outcome,
//! not an error.

use crate::config::{FitConfig, OptimizerConfig};
use crate::core::bezier::{ControlPoints, CurveParameters};
use crate::core::context::ExecutionContext;
use crate::diff::graph::{self, GraphInputs};
use crate::error::Result;
use crate::io::load_binary_mask;
use crate::optim::adam::Adam;
use crate::optim::convergence::ConvergenceWindow;
use crate::optim::loss::LossState;
use crate::reference::{extract_features, ReferenceFeatures};
use anyhow::Context;
use image::GrayImage;
use nalgebra::Vector2;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Loss, gradient and numerical health at one parameter vector.
#[derive(Clone, Debug)]
pub struct Evaluation {
    pub loss: LossState,
    pub gradient: [f64; 6],
    pub frame_degenerate: bool,
    pub near_zero_depth: usize,
    pub projected_tip: Option<Vector2<f64>>,
}

/// A differentiable scalar objective over the six curve parameters.
pub trait Objective {
    fn evaluate(&self, params: &CurveParameters) -> Evaluation;

    /// Absolute control points for 3D diagnostics, when the objective has a curve model.
    fn control_points(&self, _params: &CurveParameters) -> Option<ControlPoints> {
        None
    }
}

/// Catheter projection loss against fixed reference features.
pub struct CatheterObjective<'a> {
    ctx: &'a ExecutionContext,
    inputs: GraphInputs<'a>,
}

impl<'a> CatheterObjective<'a> {
    pub fn new(ctx: &'a ExecutionContext, config: &'a FitConfig, reference: &'a ReferenceFeatures) -> Self {
        Self {
            ctx,
            inputs: GraphInputs {
                start: &config.start,
                model: &config.model,
                camera: &config.camera,
                reference,
                weights: config.weights,
            },
        }
    }
}

impl Objective for CatheterObjective<'_> {
    fn evaluate(&self, params: &CurveParameters) -> Evaluation {
        let inputs = &self.inputs;
        let (tape, gradient) = self.ctx.install(|| graph::evaluate(inputs, params));
        Evaluation {
            loss: tape.loss,
            gradient,
            frame_degenerate: tape.frame_degenerate(),
            near_zero_depth: tape.near_zero_depth(),
            projected_tip: tape.projected_tip(),
        }
    }

    fn control_points(&self, params: &CurveParameters) -> Option<ControlPoints> {
        Some(params.control_points(self.inputs.start, self.inputs.model.encoding))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Plateau detected after the step of this iteration.
    Converged { iteration: usize },
    MaxIterationsReached,
}

/// One row of the loss history, taken before the iteration's parameter update.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub params: CurveParameters,
    pub total: f64,
    pub contour: f64,
    pub tip: f64,
    pub tip_pixel_distance: f64,
    /// 3D distance between current and ground-truth end points.
    pub end_effector_distance: Option<f64>,
    /// 3D distance between current and ground-truth middle points.
    pub mid_control_distance: Option<f64>,
    pub frame_degenerate: bool,
    pub near_zero_depth: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct LossHistory {
    pub records: Vec<IterationRecord>,
}

impl LossHistory {
    pub fn push(&mut self, record: IterationRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&IterationRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&IterationRecord> {
        self.records.last()
    }

    pub fn totals(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.total).collect()
    }
}

/// Result of `Optimizer::run`.
#[derive(Clone, Debug)]
pub struct OptimizationResult {
    pub params: CurveParameters,
    pub history: LossHistory,
    pub outcome: Outcome,
    /// Evaluation at the final parameters.
    pub last: Evaluation,
}

/// Adam loop with the sliding-window stopping rule.
pub struct Optimizer {
    config: OptimizerConfig,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn run<O: Objective>(
        &self,
        objective: &O,
        initial: CurveParameters,
        ground_truth: Option<&ControlPoints>,
    ) -> OptimizationResult {
        let mut params = initial;
        let mut adam = Adam::from_config(&self.config);
        let mut window = ConvergenceWindow::new(self.config.window, self.config.threshold);
        let mut history = LossHistory::default();
        let mut outcome = Outcome::MaxIterationsReached;
        let mut warned_frame = false;
        let mut warned_depth = false;

        info!(
            max_iterations = self.config.max_iterations,
            lr = self.config.learning_rate,
            window = self.config.window,
            threshold = self.config.threshold,
            "Starting optimization"
        );

        for iteration in 0..self.config.max_iterations {
            let eval = objective.evaluate(&params);

            if eval.frame_degenerate && !warned_frame {
                warn!(iteration, "Tube frame is degenerate, tube collapses onto the centerline");
                warned_frame = true;
            }
            if eval.near_zero_depth > 0 && !warned_depth {
                warn!(iteration, count = eval.near_zero_depth, "Projected points at near-zero depth");
                warned_depth = true;
            }
            if !eval.loss.total.is_finite() {
                warn!(iteration, total = eval.loss.total, "Non-finite loss");
            }

            let record = self.record(objective, iteration, &params, &eval, ground_truth);
            debug!(
                iteration,
                total = record.total,
                contour = record.contour,
                tip = record.tip,
                tip_px = record.tip_pixel_distance,
                "Iteration"
            );
            history.push(record);

            adam.step(params.as_mut_slice(), &eval.gradient);
            window.push(eval.loss.total);

            if window.is_converged() {
                info!(iteration, total = eval.loss.total, "Converged");
                outcome = Outcome::Converged { iteration };
                break;
            }
        }

        if outcome == Outcome::MaxIterationsReached {
            info!(iterations = self.config.max_iterations, "Iteration budget exhausted");
        }

        let last = objective.evaluate(&params);
        OptimizationResult {
            params,
            history,
            outcome,
            last,
        }
    }

    fn record<O: Objective>(
        &self,
        objective: &O,
        iteration: usize,
        params: &CurveParameters,
        eval: &Evaluation,
        ground_truth: Option<&ControlPoints>,
    ) -> IterationRecord {
        let distances = ground_truth.zip(objective.control_points(params)).map(|(gt, cp)| {
            ((cp.end - gt.end).norm(), (cp.mid - gt.mid).norm())
        });
        IterationRecord {
            iteration,
            params: *params,
            total: eval.loss.total,
            contour: eval.loss.contour,
            tip: eval.loss.tip,
            tip_pixel_distance: eval.loss.tip_distance,
            end_effector_distance: distances.map(|d| d.0),
            mid_control_distance: distances.map(|d| d.1),
            frame_degenerate: eval.frame_degenerate,
            near_zero_depth: eval.near_zero_depth,
        }
    }
}

/// Output of a complete fit.
#[derive(Clone, Debug, Serialize)]
pub struct FitReport {
    pub params: CurveParameters,
    /// Start, middle and end point reconstructed from `params`.
    pub control_points: ControlPoints,
    pub history: LossHistory,
    pub outcome: Outcome,
    /// Loss at the final parameters.
    pub final_loss: LossState,
    pub final_projected_tip: Option<Vector2<f64>>,
    pub reference_tip: Vector2<f64>,
}

impl FitReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Fit against already extracted reference features.
pub fn fit_with_reference(ctx: &ExecutionContext, reference: &ReferenceFeatures, config: &FitConfig) -> Result<FitReport> {
    config.validate()?;

    let objective = CatheterObjective::new(ctx, config, reference);
    let ground_truth = config
        .ground_truth
        .map(|gt| gt.control_points(&config.start, config.model.encoding));

    let result = Optimizer::new(config.optimizer.clone()).run(&objective, config.initial, ground_truth.as_ref());

    info!(
        outcome = ?result.outcome,
        final_total = result.last.loss.total,
        iterations = result.history.len(),
        "Fit finished"
    );

    Ok(FitReport {
        params: result.params,
        control_points: result.params.control_points(&config.start, config.model.encoding),
        history: result.history,
        outcome: result.outcome,
        final_loss: result.last.loss,
        final_projected_tip: result.last.projected_tip,
        reference_tip: reference.tip,
    })
}

/// Extract reference features from `mask` and fit.
pub fn fit(mask: &GrayImage, config: &FitConfig) -> Result<FitReport> {
    config.validate()?;
    if mask.dimensions() != (config.camera.width, config.camera.height) {
        warn!(
            mask_width = mask.width(),
            mask_height = mask.height(),
            camera_width = config.camera.width,
            camera_height = config.camera.height,
            "Reference mask size differs from camera image size"
        );
    }

    let ctx = ExecutionContext::new(config.threads)?;
    let reference = extract_features(mask, &config.extractor)?;
    fit_with_reference(&ctx, &reference, config)
}

/// Load the mask image (and optionally a JSON config) from disk and fit.
pub fn fit_from_files(mask_path: &Path, config_path: Option<&Path>) -> anyhow::Result<FitReport> {
    let config = match config_path {
        Some(path) => FitConfig::from_json_file(path)
            .with_context(|| format!("Failed to load fit config {}", path.display()))?,
        None => FitConfig::default(),
    };
    let mask = load_binary_mask(mask_path)
        .with_context(|| format!("Failed to load reference mask {}", mask_path.display()))?;
    let report = fit(&mask, &config).context("Fit failed")?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// f(x) = Σ (xᵢ − targetᵢ)², a smooth bowl.
    struct Bowl {
        target: [f64; 6],
    }

    impl Objective for Bowl {
        fn evaluate(&self, params: &CurveParameters) -> Evaluation {
            let mut gradient = [0.0; 6];
            let mut total = 0.0;
            for i in 0..6 {
                let d = params.0[i] - self.target[i];
                total += d * d;
                gradient[i] = 2.0 * d;
            }
            Evaluation {
                loss: LossState {
                    total,
                    contour: total,
                    tip: 0.0,
                    tip_distance: 0.0,
                },
                gradient,
                frame_degenerate: false,
                near_zero_depth: 0,
                projected_tip: None,
            }
        }
    }

    #[test]
    fn test_optimizer_descends_bowl() {
        let bowl = Bowl {
            target: [0.1, -0.2, 0.3, 0.0, 0.5, -0.4],
        };
        let config = OptimizerConfig {
            learning_rate: 0.05,
            max_iterations: 500,
            threshold: 1e-9,
            ..Default::default()
        };
        let result = Optimizer::new(config).run(&bowl, CurveParameters([0.0; 6]), None);

        assert!(result.last.loss.total < 1e-3);
        assert!(result.history.first().unwrap().total > result.last.loss.total);
        assert!(result.history.records.iter().all(|r| r.end_effector_distance.is_none()));
    }

    struct Counting {
        calls: Cell<usize>,
    }

    impl Objective for Counting {
        fn evaluate(&self, _params: &CurveParameters) -> Evaluation {
            self.calls.set(self.calls.get() + 1);
            Bowl { target: [0.0; 6] }.evaluate(&CurveParameters([1.0; 6]))
        }
    }

    #[test]
    fn test_budget_exhaustion_runs_every_iteration_plus_final() {
        let obj = Counting { calls: Cell::new(0) };
        let config = OptimizerConfig {
            max_iterations: 7,
            threshold: 0.0,
            ..Default::default()
        };
        let result = Optimizer::new(config).run(&obj, CurveParameters([0.0; 6]), None);
        assert_eq!(result.outcome, Outcome::MaxIterationsReached);
        assert_eq!(result.history.len(), 7);
        assert_eq!(obj.calls.get(), 8);
    }
}
