//! Channel coverage statistics and dataset filters.
//!
//! These sit next to the predictive engine rather than inside it: they read
//! the raw item table and the upstream account totals, and feed the coverage
//! cards and filter controls in the presentation layer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::item::{ChannelSummary, ContentItem};

/// Coverage threshold below which the fetched sample is flagged as partial.
const COVERAGE_WARN_PERCENT: f64 = 95.0;

/// Window length for the recent filter and the engagement comparison.
const RECENT_WINDOW_DAYS: u64 = 30;

/// Statistics over the fetched sample, set against the channel totals the
/// upstream API reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelStats {
    pub fetched_count: usize,
    pub fetched_views: u64,
    pub fetched_likes: u64,
    pub fetched_comments: u64,
    /// (likes + comments) / channel views, in percent.
    pub engagement_rate_percent: f64,
    /// Share of the channel's items present in the fetched sample.
    pub coverage_percent: f64,
    pub engagement_comparison: Option<EngagementComparison>,
}

/// Mean engagement rate over the last 30 days vs the 30 days before that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementComparison {
    pub recent_avg: f64,
    pub previous_avg: f64,
    pub change_percent: f64,
}

/// Compute sample totals, calculated engagement, and coverage.
/// Logs a warning when the sample covers less than 95% of the channel.
pub fn summarize_channel(items: &[ContentItem], channel: &ChannelSummary) -> ChannelStats {
    let fetched_views: u64 = items.iter().map(|it| it.view_count).sum();
    let fetched_likes: u64 = items.iter().map(|it| it.like_count).sum();
    let fetched_comments: u64 = items.iter().map(|it| it.comment_count).sum();

    let engagement_rate_percent = if channel.total_views > 0 {
        (fetched_likes + fetched_comments) as f64 / channel.total_views as f64 * 100.0
    } else {
        0.0
    };
    let coverage_percent = if channel.total_items > 0 {
        items.len() as f64 / channel.total_items as f64 * 100.0
    } else {
        0.0
    };

    if coverage_percent < COVERAGE_WARN_PERCENT {
        warn!(
            fetched = items.len(),
            channel_total = channel.total_items,
            coverage = format!("{coverage_percent:.1}%"),
            "partial channel coverage"
        );
    }

    ChannelStats {
        fetched_count: items.len(),
        fetched_views,
        fetched_likes,
        fetched_comments,
        engagement_rate_percent,
        coverage_percent,
        engagement_comparison: engagement_comparison(items),
    }
}

/// Keep items published inside the inclusive date range.
pub fn filter_by_date(items: &[ContentItem], start: NaiveDate, end: NaiveDate) -> Vec<ContentItem> {
    items
        .iter()
        .filter(|it| {
            let d = it.published_at.date_naive();
            d >= start && d <= end
        })
        .cloned()
        .collect()
}

/// Keep items at or above the 75th percentile of views
/// (linear-interpolated quantile, matching the upstream table's definition).
pub fn filter_top_performing(items: &[ContentItem]) -> Vec<ContentItem> {
    if items.is_empty() {
        return Vec::new();
    }
    let mut views: Vec<f64> = items.iter().map(|it| it.view_count as f64).collect();
    views.sort_by(f64::total_cmp);
    let threshold = quantile(&views, 0.75);
    items
        .iter()
        .filter(|it| it.view_count as f64 >= threshold)
        .cloned()
        .collect()
}

/// Keep items published within 30 days of the newest item.
pub fn filter_recent(items: &[ContentItem]) -> Vec<ContentItem> {
    let Some(newest) = items.iter().map(|it| it.published_at).max() else {
        return Vec::new();
    };
    let cutoff = newest - chrono::Duration::days(RECENT_WINDOW_DAYS as i64);
    items
        .iter()
        .filter(|it| it.published_at >= cutoff)
        .cloned()
        .collect()
}

/// Linear-interpolated quantile over sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

/// Mean engagement in the trailing 30 days vs the 30 days before, anchored at
/// the newest item. `None` when either window is empty.
fn engagement_comparison(items: &[ContentItem]) -> Option<EngagementComparison> {
    let newest: DateTime<Utc> = items.iter().map(|it| it.published_at).max()?;
    let recent_cutoff = newest - chrono::Duration::days(RECENT_WINDOW_DAYS as i64);
    let previous_cutoff = recent_cutoff - chrono::Duration::days(RECENT_WINDOW_DAYS as i64);

    let mean = |window: Vec<f64>| {
        if window.is_empty() {
            None
        } else {
            Some(window.iter().sum::<f64>() / window.len() as f64)
        }
    };

    let recent_avg = mean(
        items
            .iter()
            .filter(|it| it.published_at > recent_cutoff)
            .map(|it| it.engagement_rate)
            .collect(),
    )?;
    let previous_avg = mean(
        items
            .iter()
            .filter(|it| it.published_at > previous_cutoff && it.published_at <= recent_cutoff)
            .map(|it| it.engagement_rate)
            .collect(),
    )?;

    let change_percent = if previous_avg != 0.0 {
        (recent_avg - previous_avg) / previous_avg * 100.0
    } else {
        0.0
    };

    Some(EngagementComparison {
        recent_avg,
        previous_avg,
        change_percent,
    })
}
