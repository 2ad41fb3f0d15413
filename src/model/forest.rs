//! Random forest regressor: bootstrap-bagged regression trees, prediction by
//! averaging. Tree splits are scale-invariant, so the forest consumes the
//! unstandardized feature matrix.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::tree::{DecisionTree, TreeParams};

#[derive(Debug, Clone)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForestRegressor {
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], params: &ForestParams) -> Self {
        let n = rows.len();
        let n_features = rows.first().map_or(0, Vec::len);
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            ..TreeParams::default()
        };

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);
        let mut sample = vec![0usize; n];
        for _ in 0..params.n_trees {
            for slot in sample.iter_mut() {
                *slot = rng.random_range(0..n);
            }
            trees.push(DecisionTree::fit(rows, targets, &sample, &tree_params));
        }

        Self { trees, n_features }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Mean impurity decrease per feature across trees, normalized to sum 1.
    /// All zeros (degenerate fit) yields a uniform zero vector.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut acc = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (slot, v) in acc.iter_mut().zip(tree.importances()) {
                *slot += v;
            }
        }
        normalize(&mut acc);
        acc
    }
}

pub(super) fn normalize(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        for v in values.iter_mut() {
            *v /= total;
        }
    }
}
