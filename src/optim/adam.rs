//! Adam optimizer over a flat `f64` parameter slice.

use crate::config::OptimizerConfig;

pub struct Adam {
    pub lr: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    t: u32,
    m: Vec<f64>,
    v: Vec<f64>,
}

impl Adam {
    pub fn new(lr: f64, beta1: f64, beta2: f64, eps: f64) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            eps,
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self::new(config.learning_rate, config.beta1, config.beta2, config.epsilon)
    }

    /// Number of steps taken.
    pub fn timestep(&self) -> u32 {
        self.t
    }

    pub fn ensure_len(&mut self, len: usize) {
        if self.m.len() != len {
            self.m.resize(len, 0.0);
            self.v.resize(len, 0.0);
        }
    }

    pub fn step(&mut self, params: &mut [f64], grads: &[f64]) {
        assert_eq!(params.len(), grads.len());
        self.ensure_len(params.len());

        self.t += 1;
        let t = self.t as i32;
        let b1 = self.beta1;
        let b2 = self.beta2;

        let bias1 = 1.0 - b1.powi(t);
        let bias2 = 1.0 - b2.powi(t);

        for i in 0..params.len() {
            let g = grads[i];
            self.m[i] = self.m[i] * b1 + g * (1.0 - b1);
            self.v[i] = self.v[i] * b2 + g * g * (1.0 - b2);

            let m_hat = self.m[i] / bias1;
            let v_hat = self.v[i] / bias2;

            params[i] -= self.lr * m_hat / (v_hat.sqrt() + self.eps);
        }
    }
}
