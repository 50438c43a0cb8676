//! Optimization components.
//!
//! - Adam optimizer
//! - Chamfer and tip losses
//! - Sliding-window convergence test
//! - Fit orchestration

pub mod adam;
pub mod convergence;
pub mod loss;
pub mod trainer;

pub use adam::Adam;
pub use convergence::ConvergenceWindow;
pub use loss::{chamfer_loss_and_grad, tip_loss_and_grad, LossState, LossWeights};
pub use trainer::{
    fit, fit_from_files, fit_with_reference, CatheterObjective, Evaluation, FitReport, IterationRecord, LossHistory,
    Objective, OptimizationResult, Optimizer, Outcome,
};
