//! Engine configuration.
//!
//! All tunables ship with the documented defaults so the engine works with
//! `AnalyticsConfig::default()` and no file on disk. A TOML file can override
//! individual knobs; out-of-range values are snapped back to defaults rather
//! than rejected, so a half-edited config never takes the dashboard down.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

fn default_top_categories() -> usize {
    5
}
fn default_min_training_rows() -> usize {
    10
}
fn default_min_forecast_days() -> usize {
    7
}
fn default_forecast_horizon() -> usize {
    30
}
fn default_level_alpha() -> f64 {
    0.3
}
fn default_trend_beta() -> f64 {
    0.1
}
fn default_split_seed() -> u64 {
    42
}
fn default_test_fraction() -> f64 {
    0.2
}

/// Fixed editorial weights for the composite performance score.
/// They reflect relative signal strength of each metric as a popularity
/// proxy; they are a documented choice, not learned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub views: f64,
    pub likes: f64,
    pub comments: f64,
    pub engagement: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            views: 0.4,
            likes: 0.3,
            comments: 0.2,
            engagement: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// How many most-frequent categories keep their own one-hot column;
    /// the rest collapse into "other".
    #[serde(default = "default_top_categories")]
    pub top_categories: usize,
    /// Hard floor on complete feature rows before training is attempted.
    #[serde(default = "default_min_training_rows")]
    pub min_training_rows: usize,
    /// Hard floor on distinct observed days before forecasting is attempted.
    #[serde(default = "default_min_forecast_days")]
    pub min_forecast_days: usize,
    /// Default forecast horizon in days.
    #[serde(default = "default_forecast_horizon")]
    pub forecast_horizon: usize,
    /// Holt level smoothing constant (alpha).
    #[serde(default = "default_level_alpha")]
    pub level_alpha: f64,
    /// Holt trend smoothing constant (beta).
    #[serde(default = "default_trend_beta")]
    pub trend_beta: f64,
    /// Seed for the reproducible train/test split and model internals.
    #[serde(default = "default_split_seed")]
    pub split_seed: u64,
    /// Held-out fraction for the single 80/20 evaluation split.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default)]
    pub score_weights: ScoreWeights,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_categories: default_top_categories(),
            min_training_rows: default_min_training_rows(),
            min_forecast_days: default_min_forecast_days(),
            forecast_horizon: default_forecast_horizon(),
            level_alpha: default_level_alpha(),
            trend_beta: default_trend_beta(),
            split_seed: default_split_seed(),
            test_fraction: default_test_fraction(),
            score_weights: ScoreWeights::default(),
        }
    }
}

impl AnalyticsConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: AnalyticsConfig = toml::from_str(&data)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Snap out-of-range smoothing/split knobs back to defaults.
    fn sanitize(&mut self) {
        if !(0.0..=1.0).contains(&self.level_alpha) {
            self.level_alpha = default_level_alpha();
        }
        if !(0.0..=1.0).contains(&self.trend_beta) {
            self.trend_beta = default_trend_beta();
        }
        if !(0.0..1.0).contains(&self.test_fraction) || self.test_fraction == 0.0 {
            self.test_fraction = default_test_fraction();
        }
        if self.top_categories == 0 {
            self.top_categories = default_top_categories();
        }
        // The hold-out split needs at least one row on each side.
        if self.min_training_rows < 2 {
            self.min_training_rows = default_min_training_rows();
        }
    }
}
