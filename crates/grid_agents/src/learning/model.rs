//! Per-action linear value model.

use super::value_function::LinearValueFunction;
use crate::action::Action;
use crate::observation::Perception;
use crate::types::Orientation;
use serde::{Deserialize, Serialize};

/// Estimates `Q(s, a)` with one [`LinearValueFunction`] per action.
///
/// Regressors are indexed by [`Action::index`], so the model always covers the full
/// vocabulary regardless of what a given state allows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningModel {
    regressors: Vec<LinearValueFunction>,
    feature_width: usize,
    learning_rate: f64,
}

impl LearningModel {
    pub fn new(feature_width: usize, learning_rate: f64) -> Self {
        Self {
            regressors: Action::ALL
                .iter()
                .map(|_| LinearValueFunction::new(feature_width))
                .collect(),
            feature_width,
            learning_rate,
        }
    }

    /// Maps a belief to a fixed-width feature vector.
    ///
    /// Layout: `x, y`, one-hot orientation (`up, right, down, left`), signed
    /// distance to the goal `dx, dy`, then `|dx|, |dy|`. Unknown fields contribute
    /// zeros; the vector is zero-padded or truncated to `width`.
    pub fn features(perception: &Perception, width: usize) -> Vec<f64> {
        let mut features = Vec::with_capacity(10.max(width));

        let (x, y) = perception
            .position
            .map(|p| (p.x as f64, p.y as f64))
            .unwrap_or((0.0, 0.0));
        features.push(x);
        features.push(y);

        for orientation in Orientation::CLOCKWISE {
            let hot = perception.orientation == Some(orientation);
            features.push(if hot { 1.0 } else { 0.0 });
        }

        let (dx, dy) = match (perception.position, perception.goal_position) {
            (Some(p), Some(g)) => ((g.x - p.x) as f64, (g.y - p.y) as f64),
            _ => (0.0, 0.0),
        };
        features.extend([dx, dy, dx.abs(), dy.abs()]);

        features.resize(width, 0.0);
        features
    }

    /// Predicted value of every action, in [`Action::ALL`] order.
    pub fn action_values(&self, perception: &Perception) -> Vec<f64> {
        let features = Self::features(perception, self.feature_width);
        self.regressors.iter().map(|r| r.evaluate(&features)).collect()
    }

    /// Predicted value of one action.
    pub fn value(&self, perception: &Perception, action: Action) -> f64 {
        let features = Self::features(perception, self.feature_width);
        self.regressors[action.index()].evaluate(&features)
    }

    /// The highest predicted value over all actions.
    pub fn max_value(&self, perception: &Perception) -> f64 {
        self.action_values(perception)
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// The action with the highest predicted value. Ties go to the earlier action.
    pub fn predict(&self, perception: &Perception) -> Action {
        let values = self.action_values(perception);
        let mut best = 0;
        for (i, value) in values.iter().enumerate().skip(1) {
            if *value > values[best] {
                best = i;
            }
        }
        Action::from_index(best).unwrap_or(Action::Wait)
    }

    /// One incremental fit step of `action`'s regressor towards `target`.
    pub fn update(&mut self, perception: &Perception, action: Action, target: f64) {
        let features = Self::features(perception, self.feature_width);
        self.regressors[action.index()].update(&features, target, self.learning_rate);
    }

    pub fn feature_width(&self) -> usize {
        self.feature_width
    }

    /// Total number of regressor updates.
    pub fn update_count(&self) -> u64 {
        self.regressors.iter().map(|r| r.update_count()).sum()
    }

    pub fn reset(&mut self) {
        self.regressors.iter_mut().for_each(|r| r.reset());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::GridState;
    use crate::types::Position;

    fn belief() -> Perception {
        Perception::from(&GridState::new(
            Position::new(2, 3),
            Orientation::Down,
            Position::new(9, 1),
        ))
    }

    #[test]
    fn test_feature_layout() {
        let features = LearningModel::features(&belief(), 10);
        assert_eq!(
            features,
            vec![2.0, 3.0, 0.0, 0.0, 1.0, 0.0, 7.0, -2.0, 7.0, 2.0]
        );
    }

    #[test]
    fn test_feature_width_pads_and_truncates() {
        assert_eq!(LearningModel::features(&belief(), 4), vec![2.0, 3.0, 0.0, 0.0]);
        let wide = LearningModel::features(&belief(), 12);
        assert_eq!(wide.len(), 12);
        assert_eq!(&wide[10..], &[0.0, 0.0]);
        assert!(LearningModel::features(&Perception::default(), 10)
            .iter()
            .all(|f| *f == 0.0));
    }

    #[test]
    fn test_predict_follows_updates() {
        let mut model = LearningModel::new(10, 0.1);
        let state = belief();
        assert_eq!(model.predict(&state), Action::MoveForward);

        for _ in 0..50 {
            model.update(&state, Action::TurnRight, 5.0);
        }
        assert_eq!(model.predict(&state), Action::TurnRight);
        assert!(model.value(&state, Action::TurnRight) > 1.0);
        assert!((model.max_value(&state) - model.value(&state, Action::TurnRight)).abs() < 1e-12);
        assert_eq!(model.update_count(), 50);
    }
}
