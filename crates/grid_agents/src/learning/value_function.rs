//! Linear value function approximation.
//!
//! The value of a feature vector `φ` is `V(φ) = w · φ + b`. Updates use a
//! normalised least-mean-squares step,
//!
//! ```text
//! w += α · (target - V(φ)) · φ / (1 + ‖φ‖²)
//! b += α · (target - V(φ)) / (1 + ‖φ‖²)
//! ```
//!
//! so the effective step size stays bounded even when the features are raw grid
//! coordinates.

use serde::{Deserialize, Serialize};

/// A linear regressor over a fixed-width feature vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearValueFunction {
    /// The vector of weights for the linear function.
    weights: Vec<f64>,
    bias: f64,
    /// The number of features expected in the feature vector.
    num_features: usize,
    /// Number of updates applied.
    update_count: u64,
}

impl LinearValueFunction {
    /// Creates a zero-initialised function over `num_features` features.
    pub fn new(num_features: usize) -> Self {
        Self {
            weights: vec![0.0; num_features],
            bias: 0.0,
            num_features,
            update_count: 0,
        }
    }

    /// Evaluates the function. Features beyond the width are ignored and missing ones
    /// count as zero.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(features.iter())
            .map(|(w, f)| w * f)
            .sum::<f64>()
            + self.bias
    }

    /// Moves the prediction for `features` towards `target`.
    ///
    /// Non-finite targets and features are ignored.
    pub fn update(&mut self, features: &[f64], target: f64, learning_rate: f64) {
        if !target.is_finite() || features.iter().any(|f| !f.is_finite()) {
            return;
        }

        let error = target - self.evaluate(features);
        let norm: f64 = features
            .iter()
            .take(self.num_features)
            .map(|f| f * f)
            .sum();
        let step = learning_rate * error / (1.0 + norm);

        for (w, f) in self.weights.iter_mut().zip(features.iter()) {
            *w += step * f;
        }
        self.bias += step;
        self.update_count += 1;
    }

    /// Returns a slice of the current weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Returns the number of features the function is configured for.
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn reset(&mut self) {
        self.weights.fill(0.0);
        self.bias = 0.0;
        self.update_count = 0;
    }
}

impl Default for LinearValueFunction {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_value_function() {
        let mut vf = LinearValueFunction::new(3);
        let features = vec![1.0, 2.0, 3.0];

        assert_eq!(vf.evaluate(&features), 0.0);

        vf.update(&features, 10.0, 0.1);
        let value = vf.evaluate(&features);
        assert!(value > 0.0 && value < 10.0);
        assert_eq!(vf.num_features(), 3);
        assert_eq!(vf.update_count(), 1);
    }

    #[test]
    fn test_repeated_updates_converge() {
        let mut vf = LinearValueFunction::new(4);
        let features = [9.0, 9.0, -3.0, 3.0];
        for _ in 0..2000 {
            vf.update(&features, 5.0, 0.1);
        }
        assert!((vf.evaluate(&features) - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_large_features_do_not_diverge() {
        let mut vf = LinearValueFunction::new(2);
        for i in 0..500 {
            let features = [(i % 10) as f64 * 10.0, -((i % 7) as f64) * 10.0];
            vf.update(&features, 1.0, 1.0);
        }
        assert!(vf.weights().iter().all(|w| w.is_finite()));
        assert!(vf.bias().is_finite());
    }

    #[test]
    fn test_non_finite_target_is_ignored() {
        let mut vf = LinearValueFunction::new(2);
        vf.update(&[1.0, 1.0], f64::NAN, 0.1);
        vf.update(&[f64::INFINITY, 1.0], 1.0, 0.1);
        assert_eq!(vf.update_count(), 0);
        assert_eq!(vf.evaluate(&[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut vf = LinearValueFunction::new(2);
        vf.update(&[1.0, 0.0], 1.0, 0.5);
        vf.reset();
        assert_eq!(vf.evaluate(&[1.0, 0.0]), 0.0);
    }
}
