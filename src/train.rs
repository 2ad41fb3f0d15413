//! Model training, evaluation, and selection.
//!
//! The target is log1p-transformed before fitting (popularity metrics are
//! heavily right-skewed), but every reported metric is computed after the
//! inverse transform, on the real scale, because that is what the numbers
//! mean operationally. Evaluation uses a single seeded 80/20 hold-out rather
//! than k-fold; in the small-sample regime this engine runs in, one split is
//! the accepted trade-off and the seed keeps it reproducible.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::features::{build_features, FeatureTable};
use crate::item::ContentItem;
use crate::model::{
    BoostingParams, FittedRegressor, ForestParams, GradientBoostingRegressor, LinearRegression,
    ModelFamily, RandomForestRegressor, StandardScaler, TrainedModel,
};

/// Pre-publication features every training run uses, in matrix order.
/// One-hot category columns and momentum columns are appended when present.
const BASE_FEATURES: [&str; 8] = [
    "duration_secs",
    "hour",
    "day_of_week",
    "month",
    "is_weekend",
    "title_length",
    "has_uppercase",
    "title_word_count",
];

/// Held-out evaluation of one fitted family, all on the real scale.
#[derive(Debug, Clone, Serialize)]
pub struct ModelScore {
    pub family: ModelFamily,
    pub r2: f64,
    pub mae: f64,
    pub rmse: f64,
    pub predictions: Vec<f64>,
    pub actuals: Vec<f64>,
}

/// One comparison entry: the fitted model plus its held-out score.
#[derive(Debug, Clone)]
pub struct ModelEntry {
    pub model: TrainedModel,
    pub score: ModelScore,
}

/// Output of a training run: every family's entry, the selected winner, and
/// importances when the winner is a tree ensemble.
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub entries: Vec<ModelEntry>,
    pub best: ModelFamily,
    pub feature_names: Vec<String>,
    /// Normalized, sorted descending. `None` when the linear model won.
    pub importances: Option<Vec<(String, f64)>>,
}

impl ComparisonReport {
    pub fn entry(&self, family: ModelFamily) -> Option<&ModelEntry> {
        self.entries.iter().find(|e| e.score.family == family)
    }

    pub fn best_entry(&self) -> &ModelEntry {
        self.entry(self.best).expect("winner is always one of the entries")
    }

    /// The forest model, the one next-item prediction runs on.
    pub fn forest(&self) -> Option<&TrainedModel> {
        self.entry(ModelFamily::RandomForest).map(|e| &e.model)
    }

    /// Held-out scores of every family as one JSON array, the payload the
    /// dashboard's comparison tab renders.
    pub fn scores_json(&self) -> serde_json::Result<String> {
        let scores: Vec<&ModelScore> = self.entries.iter().map(|e| &e.score).collect();
        serde_json::to_string(&scores)
    }
}

/// Train the three families on the item table and pick a winner by held-out
/// R² (ties broken by lower MAE).
///
/// The outcome metric is `view_count`. Fails with `InsufficientData` when
/// fewer than `cfg.min_training_rows` complete feature rows survive.
pub fn train_comparison(items: &[ContentItem], cfg: &AnalyticsConfig) -> Result<ComparisonReport> {
    let table = build_features(items, cfg);
    let (feature_names, rows, targets_raw) = training_matrix(&table);

    // Whatever the configured floor, a hold-out split needs one row on each
    // side, so two rows is the structural minimum.
    let floor = cfg.min_training_rows.max(2);
    if rows.len() < floor {
        return Err(AnalyticsError::insufficient("model training", floor, rows.len()));
    }

    // Log-scale the heavy-tailed target before fitting.
    let targets: Vec<f64> = targets_raw.iter().map(|v| v.ln_1p()).collect();

    let (train_idx, test_idx) = holdout_split(rows.len(), cfg.test_fraction, cfg.split_seed);
    debug!(
        rows = rows.len(),
        train = train_idx.len(),
        test = test_idx.len(),
        features = feature_names.len(),
        "training split ready"
    );

    let train_rows: Vec<Vec<f64>> = train_idx.iter().map(|&i| rows[i].clone()).collect();
    let train_y: Vec<f64> = train_idx.iter().map(|&i| targets[i]).collect();
    let test_rows: Vec<Vec<f64>> = test_idx.iter().map(|&i| rows[i].clone()).collect();
    let test_actuals: Vec<f64> = test_idx.iter().map(|&i| targets_raw[i]).collect();

    let mut entries = Vec::with_capacity(ModelFamily::ALL.len());
    for family in ModelFamily::ALL {
        let model = fit_family(family, &feature_names, &train_rows, &train_y, cfg);
        let predictions: Vec<f64> = test_rows.iter().map(|r| model.predict(r)).collect();
        let score = evaluate(family, &predictions, &test_actuals);
        info!(
            model = family.name(),
            r2 = score.r2,
            mae = score.mae,
            rmse = score.rmse,
            "evaluated on hold-out"
        );
        entries.push(ModelEntry { model, score });
    }

    let best = select_winner(&entries);
    let importances = entries
        .iter()
        .find(|e| e.score.family == best)
        .and_then(|e| e.model.feature_importances());
    info!(winner = best.name(), "model selected");

    Ok(ComparisonReport {
        entries,
        best,
        feature_names,
        importances,
    })
}

/// Restrict the full feature table to the training allow-list and drop any
/// row carrying a non-finite value. Returns (names, rows, raw targets).
fn training_matrix(table: &FeatureTable) -> (Vec<String>, Vec<Vec<f64>>, Vec<f64>) {
    let mut names: Vec<String> = BASE_FEATURES.iter().map(|s| s.to_string()).collect();
    names.extend(table.category_columns().iter().map(|s| s.to_string()));
    if table.has_momentum {
        for name in [
            "days_since_prev",
            "avg_gap_5",
            "prev_views",
            "avg_views_3",
            "avg_views_5",
            "views_trend",
        ] {
            names.push(name.to_string());
        }
    }

    let columns: Vec<usize> = names
        .iter()
        .filter_map(|n| table.column_index(n))
        .collect();

    let mut rows = Vec::with_capacity(table.rows.len());
    let mut targets = Vec::with_capacity(table.rows.len());
    for (i, full_row) in table.rows.iter().enumerate() {
        let row: Vec<f64> = columns.iter().map(|&j| full_row[j]).collect();
        if row.iter().any(|v| !v.is_finite()) {
            continue;
        }
        rows.push(row);
        targets.push(table.items[i].view_count as f64);
    }
    (names, rows, targets)
}

/// Seeded shuffle, then carve off `test_fraction` (at least one row) as the
/// hold-out. Identical input and seed give an identical split. Requires
/// `n >= 2`; the trainer's floor check enforces that upstream.
fn holdout_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_n = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);
    let test = indices.split_off(n - test_n);
    (indices, test)
}

fn fit_family(
    family: ModelFamily,
    feature_names: &[String],
    train_rows: &[Vec<f64>],
    train_y: &[f64],
    cfg: &AnalyticsConfig,
) -> TrainedModel {
    match family {
        // The linear model wants comparable feature scales.
        ModelFamily::LinearRegression => {
            let scaler = StandardScaler::fit(train_rows);
            let scaled = scaler.transform(train_rows);
            let fitted = LinearRegression::fit(&scaled, train_y);
            TrainedModel::new(
                family,
                feature_names.to_vec(),
                true,
                FittedRegressor::Linear(fitted),
                Some(scaler),
            )
        }
        // Tree splits are scale-invariant, so the ensembles train raw.
        ModelFamily::RandomForest => {
            let params = ForestParams {
                seed: cfg.split_seed,
                ..ForestParams::default()
            };
            let fitted = RandomForestRegressor::fit(train_rows, train_y, &params);
            TrainedModel::new(
                family,
                feature_names.to_vec(),
                true,
                FittedRegressor::RandomForest(fitted),
                None,
            )
        }
        ModelFamily::GradientBoosting => {
            let fitted =
                GradientBoostingRegressor::fit(train_rows, train_y, &BoostingParams::default());
            TrainedModel::new(
                family,
                feature_names.to_vec(),
                true,
                FittedRegressor::GradientBoosting(fitted),
                None,
            )
        }
    }
}

/// R², MAE, RMSE on the real scale.
fn evaluate(family: ModelFamily, predictions: &[f64], actuals: &[f64]) -> ModelScore {
    let n = actuals.len() as f64;
    let mean = actuals.iter().sum::<f64>() / n;

    let ss_res: f64 = predictions
        .iter()
        .zip(actuals)
        .map(|(p, a)| (a - p) * (a - p))
        .sum();
    let ss_tot: f64 = actuals.iter().map(|a| (a - mean) * (a - mean)).sum();
    let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    let mae = predictions
        .iter()
        .zip(actuals)
        .map(|(p, a)| (a - p).abs())
        .sum::<f64>()
        / n;
    let rmse = (ss_res / n).sqrt();

    ModelScore {
        family,
        r2,
        mae,
        rmse,
        predictions: predictions.to_vec(),
        actuals: actuals.to_vec(),
    }
}

/// Highest R² wins; equal R² falls back to lower MAE.
fn select_winner(entries: &[ModelEntry]) -> ModelFamily {
    let mut best = &entries[0].score;
    for entry in &entries[1..] {
        let s = &entry.score;
        if s.r2 > best.r2 || (s.r2 == best.r2 && s.mae < best.mae) {
            best = s;
        }
    }
    best.family
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn synthetic_items(n: usize) -> Vec<ContentItem> {
        (0..n)
            .map(|i| {
                let views = 500 + 400 * (i as u64 % 7) + 90 * i as u64;
                ContentItem {
                    id: format!("v{i}"),
                    title: if i % 3 == 0 {
                        format!("BIG update number {i}")
                    } else {
                        format!("Quiet devlog number {i}")
                    },
                    published_at: Utc
                        .with_ymd_and_hms(2024, 1, 1, (9 + i % 12) as u32, 0, 0)
                        .unwrap()
                        + chrono::Duration::days((i as i64) * 2),
                    duration_secs: 240 + 60 * (i as u32 % 5),
                    category: Some(if i % 2 == 0 { "gaming" } else { "music" }.to_string()),
                    view_count: views,
                    like_count: views / 12,
                    comment_count: views / 80,
                    engagement_rate: 0.04 + 0.01 * (i % 4) as f64,
                }
            })
            .collect()
    }

    #[test]
    fn trains_all_three_families() {
        let report = train_comparison(&synthetic_items(24), &AnalyticsConfig::default()).unwrap();
        assert_eq!(report.entries.len(), 3);
        for family in ModelFamily::ALL {
            let entry = report.entry(family).unwrap();
            assert_eq!(entry.score.predictions.len(), entry.score.actuals.len());
            // Real-scale outputs: view counts, not their logs.
            assert!(entry.score.actuals.iter().all(|&a| a > 100.0));
        }
        assert!(report.forest().is_some());
    }

    #[test]
    fn below_floor_is_a_hard_error() {
        let err = train_comparison(&synthetic_items(9), &AnalyticsConfig::default()).unwrap_err();
        match err {
            AnalyticsError::InsufficientData { required, actual, .. } => {
                assert_eq!(required, 10);
                assert_eq!(actual, 9);
            }
        }
    }

    #[test]
    fn split_is_reproducible_and_disjoint() {
        let (train_a, test_a) = holdout_split(20, 0.2, 42);
        let (train_b, test_b) = holdout_split(20, 0.2, 42);
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
        assert_eq!(test_a.len(), 4);
        for i in &test_a {
            assert!(!train_a.contains(i));
        }

        let (_, test_c) = holdout_split(20, 0.2, 7);
        assert_ne!(test_a, test_c, "different seed, different split");
    }

    #[test]
    fn importances_only_for_tree_winners() {
        let report = train_comparison(&synthetic_items(30), &AnalyticsConfig::default()).unwrap();
        match report.best.is_tree_ensemble() {
            true => {
                let imp = report.importances.as_ref().unwrap();
                let total: f64 = imp.iter().map(|(_, v)| v).sum();
                assert!((total - 1.0).abs() < 1e-9);
                assert!(imp.windows(2).all(|w| w[0].1 >= w[1].1), "sorted descending");
                assert!(imp.iter().all(|(_, v)| *v >= 0.0));
            }
            false => assert!(report.importances.is_none()),
        }
    }

    #[test]
    fn scores_serialize_as_one_entry_per_family() {
        let report = train_comparison(&synthetic_items(20), &AnalyticsConfig::default()).unwrap();
        let json = report.scores_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        let entries = parsed.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        for entry in entries {
            assert!(entry["r2"].is_number());
            assert!(entry["mae"].is_number());
            assert!(entry["rmse"].is_number());
        }
    }

    #[test]
    fn winner_selection_prefers_r2_then_mae() {
        let score = |family, r2, mae| ModelScore {
            family,
            r2,
            mae,
            rmse: 0.0,
            predictions: vec![],
            actuals: vec![],
        };
        let dummy_model = || {
            let fitted = LinearRegression::fit(&[vec![0.0], vec![1.0]], &[0.0, 1.0]);
            TrainedModel::new(
                ModelFamily::LinearRegression,
                vec!["x".into()],
                false,
                FittedRegressor::Linear(fitted),
                None,
            )
        };
        let entries = vec![
            ModelEntry {
                model: dummy_model(),
                score: score(ModelFamily::LinearRegression, 0.5, 10.0),
            },
            ModelEntry {
                model: dummy_model(),
                score: score(ModelFamily::RandomForest, 0.5, 5.0),
            },
            ModelEntry {
                model: dummy_model(),
                score: score(ModelFamily::GradientBoosting, 0.4, 1.0),
            },
        ];
        assert_eq!(select_winner(&entries), ModelFamily::RandomForest);
    }
}
