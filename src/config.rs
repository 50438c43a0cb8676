//! Run configuration.
//!
//! Every tunable of a fit lives in `FitConfig`. All sections default, so a
//! JSON file only needs the values it changes.

use crate::core::bezier::{ControlPointRule, CurveParameters, ParameterEncoding};
use crate::core::camera::{Camera, DEFAULT_DEPTH_EPSILON};
use crate::core::frame::DEFAULT_FRAME_EPSILON;
use crate::error::{FitError, Result};
use crate::optim::loss::LossWeights;
use crate::reference::ExtractorConfig;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Curve sampling and tube geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Curve samples over s ∈ [0, 1].
    pub num_samples: usize,
    /// Points per tube ring.
    pub angular_resolution: usize,
    /// Tube radius in world units.
    pub radius: f64,
    /// Sample whose normal/binormal orient the whole tube.
    pub frame_sample: usize,
    /// Leading samples left out of projection.
    pub skip_base_samples: usize,
    pub encoding: ParameterEncoding,
    pub rule: ControlPointRule,
    pub frame_epsilon: f64,
    pub depth_epsilon: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            num_samples: 101,
            angular_resolution: 50,
            radius: 0.0015,
            frame_sample: 1,
            skip_base_samples: 1,
            encoding: ParameterEncoding::Absolute,
            rule: ControlPointRule::StartFirst,
            frame_epsilon: DEFAULT_FRAME_EPSILON,
            depth_epsilon: DEFAULT_DEPTH_EPSILON,
        }
    }
}

/// Adam hyperparameters and stopping rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    pub max_iterations: usize,
    /// Number of recent total losses compared by the plateau test.
    pub window: usize,
    /// Plateau when max − min over the window is below this.
    pub threshold: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-2,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            max_iterations: 200,
            window: 5,
            threshold: 0.1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Fixed catheter base point.
    pub start: Vector3<f64>,
    /// Initial guess of the six shape parameters.
    pub initial: CurveParameters,
    /// Known parameters, only used for 3D distance diagnostics.
    pub ground_truth: Option<CurveParameters>,
    pub model: ModelConfig,
    pub camera: Camera,
    pub extractor: ExtractorConfig,
    pub weights: LossWeights,
    pub optimizer: OptimizerConfig,
    /// Worker threads for the run (0 = rayon default).
    pub threads: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            start: Vector3::new(0.02, 0.002, 0.0),
            initial: CurveParameters([0.0365, 0.0036, 0.1202, 0.0056, -0.0166, 0.1645]),
            ground_truth: None,
            model: ModelConfig::default(),
            camera: Camera::default(),
            extractor: ExtractorConfig::default(),
            weights: LossWeights::default(),
            optimizer: OptimizerConfig::default(),
            threads: 0,
        }
    }
}

fn invalid(msg: impl Into<String>) -> FitError {
    FitError::InvalidConfig(msg.into())
}

impl FitConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges that would otherwise surface as panics or NaNs mid-run.
    pub fn validate(&self) -> Result<()> {
        let m = &self.model;
        if m.num_samples < 2 {
            return Err(invalid(format!("num_samples must be at least 2, got {}", m.num_samples)));
        }
        if m.angular_resolution == 0 {
            return Err(invalid("angular_resolution must be at least 1"));
        }
        if m.frame_sample >= m.num_samples {
            return Err(invalid(format!(
                "frame_sample {} is outside {} samples",
                m.frame_sample, m.num_samples
            )));
        }
        if m.skip_base_samples >= m.num_samples {
            return Err(invalid(format!(
                "skip_base_samples {} leaves no samples out of {}",
                m.skip_base_samples, m.num_samples
            )));
        }
        if !(m.radius > 0.0) {
            return Err(invalid(format!("radius must be positive, got {}", m.radius)));
        }
        if m.frame_epsilon < 0.0 || m.depth_epsilon < 0.0 {
            return Err(invalid("epsilons must be non-negative"));
        }

        let o = &self.optimizer;
        if !(o.learning_rate > 0.0) {
            return Err(invalid(format!("learning_rate must be positive, got {}", o.learning_rate)));
        }
        if !(0.0..1.0).contains(&o.beta1) || !(0.0..1.0).contains(&o.beta2) {
            return Err(invalid("Adam betas must lie in [0, 1)"));
        }
        if o.window == 0 {
            return Err(invalid("convergence window must be at least 1"));
        }
        if !(o.threshold >= 0.0) {
            return Err(invalid("convergence threshold must be non-negative"));
        }

        if !(self.weights.contour >= 0.0) || !(self.weights.tip >= 0.0) {
            return Err(invalid("loss weights must be non-negative"));
        }

        let e = &self.extractor;
        if e.near_column_offset == 0 || e.far_column_offset == 0 {
            return Err(invalid("boundary column offsets must be at least 1"));
        }
        if !(e.slope_baseline > 0.0) {
            return Err(invalid("slope_baseline must be positive"));
        }

        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(invalid("camera image size must be non-zero"));
        }

        Ok(())
    }
}
