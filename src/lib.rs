//! # catheter-recon: 3D catheter shape from a single image
//!
//! This crate fits a cubic Bezier model of a flexible catheter to one binary
//! reference image. The curve is swept into a tube, projected through a
//! pinhole camera and compared with the silhouette contour and tip extracted
//! from the image; Adam refines the six shape parameters until the loss
//! plateaus.
//!
//! ## Architecture
//!
//! - `core`: Forward model (Bezier curve, frame, tube, camera, execution context)
//! - `reference`: Feature extraction from the reference mask (contour, skeleton, tip)
//! - `diff`: Hand-derived backward passes and the static per-iteration graph
//! - `optim`: Adam, Chamfer/tip losses, convergence window, fit orchestration
//! - `render`: Synthetic silhouettes and diagnostic overlays
//! - `io`: Mask loading and saving
//! - `config`: `FitConfig` and its JSON form
//!
//! All gradients are analytic and verified against finite differences in
//! `tests/gradient_check.rs`.

// Forward model
pub mod core;

// Reference feature extraction
pub mod reference;

// Differentiable operations (backward passes)
pub mod diff;

// Optimization (losses, Adam, fit loop)
pub mod optim;

// Silhouettes and overlays
pub mod render;

// Mask I/O
pub mod io;

pub mod config;
pub mod error;

// Re-export commonly used types at crate root for convenience
pub use config::{FitConfig, ModelConfig, OptimizerConfig};
pub use core::{Camera, ControlPoints, CurveParameters, ExecutionContext};
pub use error::{FitError, Result};
pub use optim::{fit, fit_from_files, FitReport, Outcome};
pub use reference::{extract_features, ExtractorConfig, ReferenceFeatures};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
