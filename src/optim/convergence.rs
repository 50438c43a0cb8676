//! Sliding-window plateau test on the total loss.

use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub struct ConvergenceWindow {
    size: usize,
    threshold: f64,
    values: VecDeque<f64>,
}

impl ConvergenceWindow {
    pub fn new(size: usize, threshold: f64) -> Self {
        Self {
            size: size.max(1),
            threshold,
            values: VecDeque::with_capacity(size.max(1)),
        }
    }

    /// Record a loss, evicting the oldest once the window is full.
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.size {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// max − min over the window, `None` until it is full.
    pub fn spread(&self) -> Option<f64> {
        if self.values.len() < self.size {
            return None;
        }
        let (lo, hi) = self
            .values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Some(hi - lo)
    }

    /// Full window whose spread is below the threshold. A NaN in the window never converges.
    pub fn is_converged(&self) -> bool {
        if self.values.iter().any(|v| v.is_nan()) {
            return false;
        }
        self.spread().is_some_and(|s| s < self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_needs_full_window() {
        let mut w = ConvergenceWindow::new(3, 0.1);
        w.push(1.0);
        w.push(1.0);
        assert!(!w.is_converged());
        w.push(1.0);
        assert!(w.is_converged());
    }

    #[test]
    fn test_old_values_are_evicted() {
        let mut w = ConvergenceWindow::new(3, 0.1);
        for v in [10.0, 5.0, 5.02, 5.04] {
            w.push(v);
        }
        assert_relative_eq!(w.spread().unwrap(), 0.04, epsilon = 1e-12);
        assert!(w.is_converged());
    }

    #[test]
    fn test_spread_at_threshold_is_not_converged() {
        let mut w = ConvergenceWindow::new(2, 0.5);
        w.push(1.0);
        w.push(1.5);
        assert!(!w.is_converged());
    }

    #[test]
    fn test_nan_never_converges() {
        let mut w = ConvergenceWindow::new(2, 1.0);
        w.push(f64::NAN);
        w.push(f64::NAN);
        assert!(!w.is_converged());
    }
}
