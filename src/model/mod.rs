//! Regression model families and the fitted-model value handed back to
//! callers.
//!
//! The family set is closed on purpose: selection logic only ever needs the
//! uniform predict surface plus evaluation metrics, so adding a family means
//! adding a variant here and one fit call in the trainer, nothing else.

mod boosting;
mod forest;
mod linear;
mod tree;

pub use boosting::{BoostingParams, GradientBoostingRegressor};
pub use forest::{ForestParams, RandomForestRegressor};
pub use linear::LinearRegression;
pub use tree::{DecisionTree, TreeParams};

use serde::{Deserialize, Serialize};

/// The three trained algorithm families, chosen for materially different
/// inductive biases on a mixed categorical/numeric feature space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFamily {
    LinearRegression,
    RandomForest,
    GradientBoosting,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 3] = [
        ModelFamily::LinearRegression,
        ModelFamily::RandomForest,
        ModelFamily::GradientBoosting,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelFamily::LinearRegression => "Linear Regression",
            ModelFamily::RandomForest => "Random Forest",
            ModelFamily::GradientBoosting => "Gradient Boosting",
        }
    }

    /// Tree ensembles export feature importances; the linear model does not.
    pub fn is_tree_ensemble(self) -> bool {
        matches!(self, ModelFamily::RandomForest | ModelFamily::GradientBoosting)
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-feature standardization (zero mean, unit variance) fitted on the
/// training split only. Constant columns keep a unit scale so they pass
/// through unchanged instead of dividing by zero.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let d = rows.first().map_or(0, Vec::len);
        let n = rows.len().max(1) as f64;

        let mut means = vec![0.0; d];
        for row in rows {
            for (m, x) in means.iter_mut().zip(row) {
                *m += x;
            }
        }
        for m in means.iter_mut() {
            *m /= n;
        }

        let mut scales = vec![0.0; d];
        for row in rows {
            for ((s, m), x) in scales.iter_mut().zip(&means).zip(row) {
                let c = x - m;
                *s += c * c;
            }
        }
        for s in scales.iter_mut() {
            *s = (*s / n).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Self { means, scales }
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((x, m), s)| (x - m) / s)
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}

/// A fitted regressor from one of the closed set of families.
#[derive(Debug, Clone)]
pub enum FittedRegressor {
    Linear(LinearRegression),
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
}

impl FittedRegressor {
    fn predict_row(&self, row: &[f64]) -> f64 {
        match self {
            FittedRegressor::Linear(m) => m.predict_row(row),
            FittedRegressor::RandomForest(m) => m.predict_row(row),
            FittedRegressor::GradientBoosting(m) => m.predict_row(row),
        }
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        match self {
            FittedRegressor::Linear(_) => None,
            FittedRegressor::RandomForest(m) => Some(m.feature_importances()),
            FittedRegressor::GradientBoosting(m) => Some(m.feature_importances()),
        }
    }
}

/// Result of fitting one family: the opaque fitted parameters, the ordered
/// feature names it was trained on, whether the target was log-transformed,
/// and the scaler when the family trains on standardized features.
///
/// Created fresh per training call and never persisted; callers hold it by
/// value and pass it back into prediction explicitly.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub family: ModelFamily,
    pub feature_names: Vec<String>,
    pub log_target: bool,
    regressor: FittedRegressor,
    scaler: Option<StandardScaler>,
}

impl TrainedModel {
    pub(crate) fn new(
        family: ModelFamily,
        feature_names: Vec<String>,
        log_target: bool,
        regressor: FittedRegressor,
        scaler: Option<StandardScaler>,
    ) -> Self {
        Self {
            family,
            feature_names,
            log_target,
            regressor,
            scaler,
        }
    }

    /// Predict on the real (inverse-transformed) scale for one raw feature
    /// row ordered as `feature_names`.
    pub fn predict(&self, row: &[f64]) -> f64 {
        let y = match &self.scaler {
            Some(scaler) => self.regressor.predict_row(&scaler.transform_row(row)),
            None => self.regressor.predict_row(row),
        };
        if self.log_target {
            y.exp_m1()
        } else {
            y
        }
    }

    /// Normalized importances paired with feature names, sorted descending.
    /// `None` for the linear family.
    pub fn feature_importances(&self) -> Option<Vec<(String, f64)>> {
        let raw = self.regressor.feature_importances()?;
        let mut pairs: Vec<(String, f64)> =
            self.feature_names.iter().cloned().zip(raw).collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        Some(pairs)
    }
}
