//! Next-item reach prediction.
//!
//! Runs on the random-forest model from a comparison report, on purpose:
//! the ensemble handles the mixed one-hot/numeric feature space without the
//! standardization path the linear model needs at inference time. When the
//! report carries no forest the result is `None`: an expected ordering
//! dependency (train first), not an anomaly worth an error.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::item::{ContentItem, NextItemParams};
use crate::train::ComparisonReport;

const DEFAULT_DURATION_SECS: u32 = 600;
const DEFAULT_HOUR: u32 = 12;
const DEFAULT_TITLE_LENGTH: u32 = 50;
/// Rough characters-per-word ratio used to approximate the word count from
/// a planned title length.
const CHARS_PER_WORD: u32 = 6;

/// Predict expected views for a hypothetical unpublished item.
///
/// Momentum context comes from the actual most recent items in `history`;
/// the gap since the last publish is measured against the current time.
/// Hypothetical attributes are not validated here; the clean-input contract
/// sits with the upstream collaborator.
pub fn predict_next_item(
    report: &ComparisonReport,
    history: &[ContentItem],
    params: &NextItemParams,
) -> Option<u64> {
    predict_next_item_at(report, history, params, Utc::now())
}

/// Same as [`predict_next_item`] with an explicit "now", for reproducible
/// evaluation.
pub fn predict_next_item_at(
    report: &ComparisonReport,
    history: &[ContentItem],
    params: &NextItemParams,
    now: DateTime<Utc>,
) -> Option<u64> {
    let model = report.forest()?;

    let day_of_week = params.day_of_week.unwrap_or(0).min(6);
    let title_length = params.title_length.unwrap_or(DEFAULT_TITLE_LENGTH);
    let month = params
        .month
        .unwrap_or_else(|| chrono::Datelike::month(&now))
        .clamp(1, 12);

    let mut sorted: Vec<&ContentItem> = history.iter().collect();
    sorted.sort_by_key(|it| it.published_at);
    let active_cat_column = active_category_column(&model.feature_names, &sorted);

    let mut row = Vec::with_capacity(model.feature_names.len());
    for name in &model.feature_names {
        let value = match name.as_str() {
            "duration_secs" => f64::from(params.duration_secs.unwrap_or(DEFAULT_DURATION_SECS)),
            "hour" => f64::from(params.hour.unwrap_or(DEFAULT_HOUR).min(23)),
            "day_of_week" => f64::from(day_of_week),
            "month" => f64::from(month),
            "is_weekend" => {
                if day_of_week >= 5 {
                    1.0
                } else {
                    0.0
                }
            }
            "title_length" => f64::from(title_length),
            "has_uppercase" => {
                if params.has_uppercase.unwrap_or(false) {
                    1.0
                } else {
                    0.0
                }
            }
            "title_word_count" => f64::from(title_length / CHARS_PER_WORD),
            "days_since_prev" | "avg_gap_5" => days_since_last(&sorted, now),
            "prev_views" => last_views(&sorted),
            "avg_views_3" => tail_mean(&sorted, 3),
            "avg_views_5" => tail_mean(&sorted, 5),
            "views_trend" => tail_trend(&sorted, 5),
            cat if cat.starts_with("cat_") => {
                if Some(cat) == active_cat_column.as_deref() {
                    1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };
        row.push(value);
    }

    let estimate = model.predict(&row).max(0.0) as u64;
    debug!(estimate, features = row.len(), "next-item prediction");
    Some(estimate)
}

/// The hypothetical item inherits the most frequent historical category:
/// the one-hot column that gets the 1, or "cat_other" when the modal
/// category kept no column of its own. Frequency ties go to the
/// lexicographically smallest name for determinism.
fn active_category_column(feature_names: &[String], sorted: &[&ContentItem]) -> Option<String> {
    use std::collections::HashMap;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in sorted {
        if let Some(cat) = item.category.as_deref() {
            *counts.entry(cat).or_default() += 1;
        }
    }
    let modal = counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
        .map(|(cat, _)| cat)?;

    let direct = format!("cat_{modal}");
    if feature_names.contains(&direct) {
        Some(direct)
    } else if feature_names.iter().any(|n| n == "cat_other") {
        Some("cat_other".to_string())
    } else {
        None
    }
}

fn days_since_last(sorted: &[&ContentItem], now: DateTime<Utc>) -> f64 {
    match sorted.last() {
        Some(last) => (now - last.published_at).num_days().max(0) as f64,
        None => 0.0,
    }
}

fn last_views(sorted: &[&ContentItem]) -> f64 {
    sorted.last().map_or(0.0, |it| it.view_count as f64)
}

/// Mean views over the trailing `width` items, falling back to what exists.
fn tail_mean(sorted: &[&ContentItem], width: usize) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let start = sorted.len().saturating_sub(width);
    let tail = &sorted[start..];
    tail.iter().map(|it| it.view_count as f64).sum::<f64>() / tail.len() as f64
}

/// (last - first) / width over the trailing `width` items; zero when the
/// history is shorter than the window.
fn tail_trend(sorted: &[&ContentItem], width: usize) -> f64 {
    if sorted.len() < width {
        return 0.0;
    }
    let tail = &sorted[sorted.len() - width..];
    (tail[width - 1].view_count as f64 - tail[0].view_count as f64) / width as f64
}
