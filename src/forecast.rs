//! Short-horizon growth forecasting, independent of the trained regressors.
//!
//! Holt's linear trend method (double exponential smoothing) over daily view
//! totals. Deliberately simple and interpretable: channel histories are short
//! and noisy, and a level-plus-trend extrapolation is easy to reason about
//! where a full ARIMA fit would mostly chase variance.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::item::ContentItem;

/// One forecasted day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Ordered, strictly future-dated forecast of daily view totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Forecast aggregate daily views `horizon` days past the last observed date
/// (default horizon from config).
///
/// Smoothing runs over observed days only; calendar gaps between uploads are
/// not zero-filled. Fails with `InsufficientData` below
/// `cfg.min_forecast_days` distinct days of history.
pub fn forecast_growth(
    items: &[ContentItem],
    cfg: &AnalyticsConfig,
    horizon: Option<usize>,
) -> Result<ForecastSeries> {
    let horizon = horizon.unwrap_or(cfg.forecast_horizon);
    let daily = daily_totals(items);

    if daily.len() < cfg.min_forecast_days {
        return Err(AnalyticsError::insufficient(
            "growth forecasting",
            cfg.min_forecast_days,
            daily.len(),
        ));
    }

    let totals: Vec<f64> = daily.values().copied().collect();
    let (level, trend) = holt_smooth(&totals, cfg.level_alpha, cfg.trend_beta);
    info!(
        observed_days = totals.len(),
        level, trend, horizon, "holt smoothing converged"
    );

    let last_date = *daily.keys().next_back().expect("non-empty daily totals");
    let points = (1..=horizon)
        .map(|i| ForecastPoint {
            date: last_date + Days::new(i as u64),
            value: (level + i as f64 * trend).max(0.0),
        })
        .collect();

    Ok(ForecastSeries { points })
}

/// Sum views per distinct publish date, keyed in ascending date order.
fn daily_totals(items: &[ContentItem]) -> BTreeMap<NaiveDate, f64> {
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for item in items {
        *daily.entry(item.published_at.date_naive()).or_default() += item.view_count as f64;
    }
    daily
}

/// Run the Holt recurrence over the observed totals and return the final
/// (level, trend) state.
///
/// Level starts at the first observation, trend at the average slope between
/// the first and last.
fn holt_smooth(totals: &[f64], alpha: f64, beta: f64) -> (f64, f64) {
    let mut level = totals[0];
    let mut trend = (totals[totals.len() - 1] - totals[0]) / totals.len() as f64;

    for &value in totals {
        let prev_level = level;
        level = alpha * value + (1.0 - alpha) * (level + trend);
        trend = beta * (level - prev_level) + (1.0 - beta) * trend;
    }
    (level, trend)
}
