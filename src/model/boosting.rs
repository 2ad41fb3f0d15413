//! Gradient boosting regressor for squared loss: start from the target mean,
//! then stage-wise fit shallow trees to the current residuals and add them in
//! with a shrinkage factor.

use super::forest::normalize;
use super::tree::{DecisionTree, TreeParams};

#[derive(Debug, Clone)]
pub struct BoostingParams {
    pub n_stages: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_stages: 100,
            max_depth: 5,
            learning_rate: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GradientBoostingRegressor {
    base: f64,
    learning_rate: f64,
    stages: Vec<DecisionTree>,
    n_features: usize,
}

impl GradientBoostingRegressor {
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], params: &BoostingParams) -> Self {
        let n = rows.len();
        let n_features = rows.first().map_or(0, Vec::len);
        let indices: Vec<usize> = (0..n).collect();
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            ..TreeParams::default()
        };

        let base = targets.iter().sum::<f64>() / n as f64;
        let mut current: Vec<f64> = vec![base; n];
        let mut residuals = vec![0.0; n];
        let mut stages = Vec::with_capacity(params.n_stages);

        for _ in 0..params.n_stages {
            for i in 0..n {
                residuals[i] = targets[i] - current[i];
            }
            let tree = DecisionTree::fit(rows, &residuals, &indices, &tree_params);
            for i in 0..n {
                current[i] += params.learning_rate * tree.predict_row(&rows[i]);
            }
            stages.push(tree);
        }

        Self {
            base,
            learning_rate: params.learning_rate,
            stages,
            n_features,
        }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut y = self.base;
        for tree in &self.stages {
            y += self.learning_rate * tree.predict_row(row);
        }
        y
    }

    /// Summed impurity decrease per feature across stages, normalized to sum 1.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut acc = vec![0.0; self.n_features];
        for tree in &self.stages {
            for (slot, v) in acc.iter_mut().zip(tree.importances()) {
                *slot += v;
            }
        }
        normalize(&mut acc);
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drives_training_residuals_down() {
        let rows: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..30).map(|i| (i * i) as f64).collect();

        let model = GradientBoostingRegressor::fit(&rows, &targets, &BoostingParams::default());
        let max_err = rows
            .iter()
            .zip(&targets)
            .map(|(r, t)| (model.predict_row(r) - t).abs())
            .fold(0.0f64, f64::max);
        // Quadratic target over 30 points: 100 depth-5 stages should fit tightly.
        assert!(max_err < 20.0, "max_err {max_err}");
    }

    #[test]
    fn constant_target_predicts_the_mean() {
        let rows: Vec<Vec<f64>> = (0..12).map(|i| vec![i as f64]).collect();
        let targets = vec![7.5; 12];
        let model = GradientBoostingRegressor::fit(&rows, &targets, &BoostingParams::default());
        assert!((model.predict_row(&[3.0]) - 7.5).abs() < 1e-9);
    }
}
