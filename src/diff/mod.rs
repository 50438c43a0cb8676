//! Differentiable operations (backward passes).
//!
//! Each submodule holds the hand-derived chain rule of one forward operation
//! in `core`; `graph` composes them into the per-iteration pipeline.

pub mod bezier_grad;
pub mod frame_grad;
pub mod graph;
pub mod project_grad;
pub mod tube_grad;

pub use graph::{backward, evaluate, forward, GraphInputs, Node, Tape, PIPELINE};
