//! Leakage-safe feature derivation.
//!
//! Everything here is computable *before* an item is published: calendar
//! placement, title shape, category membership, and channel momentum read off
//! strictly earlier items. The table is produced by one sort-then-scan pass so
//! the lag-1 contract is mechanically visible: a row's momentum columns are
//! filled from window slices that end at the previous row, never at the row
//! itself.

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::config::AnalyticsConfig;
use crate::item::ContentItem;

/// Two or more consecutive capitals, the classic clickbait marker.
static UPPER_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]{2,}").expect("uppercase regex"));

/// Sentinel bucket for categories outside the top-K.
pub const OTHER_CATEGORY: &str = "other";

/// Minimum item count before momentum columns are emitted at all.
/// Below this the columns are omitted entirely, not null-filled.
pub const MOMENTUM_MIN_ITEMS: usize = 6;

const MOMENTUM_COLUMNS: [&str; 6] = [
    "days_since_prev",
    "avg_gap_5",
    "prev_views",
    "avg_views_3",
    "avg_views_5",
    "views_trend",
];

/// Feature matrix aligned with a publish-date-sorted copy of the input items:
/// `rows[i]` describes `items[i]`, and `items` ascends by `published_at`.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub items: Vec<ContentItem>,
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub has_momentum: bool,
}

impl FeatureTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|n| n == name)
    }

    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        self.column_index(name).map(|j| self.rows[row][j])
    }

    /// Names of the one-hot category columns, in table order.
    pub fn category_columns(&self) -> Vec<&str> {
        self.feature_names
            .iter()
            .filter(|n| n.starts_with("cat_"))
            .map(String::as_str)
            .collect()
    }
}

/// Derive the full feature table from raw items.
///
/// The input order is irrelevant; the output is sorted ascending by publish
/// timestamp with one feature row per item.
pub fn build_features(items: &[ContentItem], cfg: &AnalyticsConfig) -> FeatureTable {
    let mut sorted: Vec<ContentItem> = items.to_vec();
    sorted.sort_by_key(|it| it.published_at);

    let mut feature_names: Vec<String> = [
        "duration_secs",
        "hour",
        "day_of_week",
        "day_of_month",
        "month",
        "year",
        "is_weekend",
        "duration_minutes",
        "title_length",
        "has_uppercase",
        "title_word_count",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let category_names = retained_categories(&sorted, cfg.top_categories);
    for cat in &category_names {
        feature_names.push(format!("cat_{cat}"));
    }

    let has_momentum = sorted.len() >= MOMENTUM_MIN_ITEMS;
    if has_momentum {
        feature_names.extend(MOMENTUM_COLUMNS.iter().map(|s| s.to_string()));
    }

    let momentum = has_momentum.then(|| momentum_columns(&sorted));

    let mut rows = Vec::with_capacity(sorted.len());
    for (i, item) in sorted.iter().enumerate() {
        let mut row = Vec::with_capacity(feature_names.len());

        // Time features
        row.push(f64::from(item.duration_secs));
        row.push(f64::from(item.publish_hour()));
        row.push(f64::from(item.publish_weekday()));
        row.push(f64::from(item.published_at.day()));
        row.push(f64::from(item.published_at.month()));
        row.push(item.published_at.year() as f64);
        row.push(if item.publish_weekday() >= 5 { 1.0 } else { 0.0 });

        // Content features
        row.push(f64::from(item.duration_secs) / 60.0);
        row.push(item.title.chars().count() as f64);
        row.push(if UPPER_RUN.is_match(&item.title) { 1.0 } else { 0.0 });
        row.push(item.title.split_whitespace().count() as f64);

        // Category one-hot over top-K + "other"
        if !category_names.is_empty() {
            let grouped = grouped_category(item, &category_names);
            for cat in &category_names {
                row.push(if *cat == grouped { 1.0 } else { 0.0 });
            }
        }

        if let Some(m) = &momentum {
            row.push(m.days_since_prev[i]);
            row.push(m.avg_gap_5[i]);
            row.push(m.prev_views[i]);
            row.push(m.avg_views_3[i]);
            row.push(m.avg_views_5[i]);
            row.push(m.views_trend[i]);
        }

        rows.push(row);
    }

    FeatureTable {
        items: sorted,
        feature_names,
        rows,
        has_momentum,
    }
}

/// Top-K categories by frequency (ties broken by first occurrence), sorted
/// alphabetically for a stable column order, with the "other" bucket last.
/// Empty when no item carries a category at all.
fn retained_categories(items: &[ContentItem], top_k: usize) -> Vec<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut seen = 0usize;
    for item in items {
        if let Some(cat) = item.category.as_deref() {
            let entry = counts.entry(cat).or_insert((0, seen));
            entry.0 += 1;
            seen += 1;
        }
    }
    if counts.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<(&str, usize, usize)> =
        counts.into_iter().map(|(c, (n, first))| (c, n, first)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(top_k);

    let mut names: Vec<String> = ranked.into_iter().map(|(c, _, _)| c.to_string()).collect();
    names.sort();
    names.push(OTHER_CATEGORY.to_string());
    names
}

/// Map an item's category into the retained set, defaulting to "other".
fn grouped_category<'a>(item: &'a ContentItem, retained: &'a [String]) -> &'a str {
    match item.category.as_deref() {
        Some(cat) if retained.iter().any(|r| r == cat) => cat,
        _ => OTHER_CATEGORY,
    }
}

struct MomentumColumns {
    days_since_prev: Vec<f64>,
    avg_gap_5: Vec<f64>,
    prev_views: Vec<f64>,
    avg_views_3: Vec<f64>,
    avg_views_5: Vec<f64>,
    views_trend: Vec<f64>,
}

/// Windowed scan over the sorted items.
///
/// The gap columns may include the current row's own gap (it is known before
/// publishing), while every view-derived column is shifted by one so a row
/// never reads its own outcome.
fn momentum_columns(sorted: &[ContentItem]) -> MomentumColumns {
    let n = sorted.len();
    let views: Vec<f64> = sorted.iter().map(|it| it.view_count as f64).collect();

    let mut days_since_prev = vec![0.0; n];
    for i in 1..n {
        let gap = sorted[i].published_at - sorted[i - 1].published_at;
        days_since_prev[i] = gap.num_days() as f64;
    }

    let mut avg_gap_5 = vec![0.0; n];
    for i in 0..n {
        let start = i.saturating_sub(4);
        let window = &days_since_prev[start..=i];
        avg_gap_5[i] = window.iter().sum::<f64>() / window.len() as f64;
    }

    let mut prev_views = vec![0.0; n];
    let mut avg_views_3 = vec![0.0; n];
    let mut avg_views_5 = vec![0.0; n];
    let mut views_trend = vec![0.0; n];
    for i in 1..n {
        let prev = i - 1;
        prev_views[i] = views[prev];
        avg_views_3[i] = trailing_mean(&views, prev, 3);
        avg_views_5[i] = trailing_mean(&views, prev, 5);
        views_trend[i] = trailing_slope(&views, prev, 5);
    }

    MomentumColumns {
        days_since_prev,
        avg_gap_5,
        prev_views,
        avg_views_3,
        avg_views_5,
        views_trend,
    }
}

/// Mean over the window of up to `width` values ending at `end` (inclusive).
fn trailing_mean(values: &[f64], end: usize, width: usize) -> f64 {
    let start = end.saturating_sub(width - 1);
    let window = &values[start..=end];
    window.iter().sum::<f64>() / window.len() as f64
}

/// (last - first) / len over the window ending at `end`; zero when the
/// window holds fewer than two points.
fn trailing_slope(values: &[f64], end: usize, width: usize) -> f64 {
    let start = end.saturating_sub(width - 1);
    let window = &values[start..=end];
    if window.len() < 2 {
        return 0.0;
    }
    (window[window.len() - 1] - window[0]) / window.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(id: &str, day: u32, hour: u32, views: u64, category: Option<&str>) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            title: format!("Video {id}"),
            published_at: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
            duration_secs: 300,
            category: category.map(str::to_string),
            view_count: views,
            like_count: views / 10,
            comment_count: views / 100,
            engagement_rate: 0.05,
        }
    }

    #[test]
    fn sorts_ascending_and_derives_calendar_features() {
        let items = vec![item("b", 5, 18, 200, None), item("a", 1, 9, 100, None)];
        let cfg = AnalyticsConfig::default();
        let table = build_features(&items, &cfg);

        assert_eq!(table.items[0].id, "a");
        assert_eq!(table.value(0, "hour"), Some(9.0));
        assert_eq!(table.value(1, "hour"), Some(18.0));
        assert_eq!(table.value(0, "month"), Some(3.0));
        assert_eq!(table.value(0, "year"), Some(2024.0));
        // 2024-03-01 was a Friday, 2024-03-05 a Tuesday.
        assert_eq!(table.value(0, "is_weekend"), Some(0.0));
        assert_eq!(table.value(0, "duration_minutes"), Some(5.0));
    }

    #[test]
    fn uppercase_run_flag_needs_two_consecutive_capitals() {
        let mut a = item("a", 1, 9, 100, None);
        a.title = "Calm Title Here".into();
        let mut b = item("b", 2, 9, 100, None);
        b.title = "HUGE news today".into();
        let cfg = AnalyticsConfig::default();
        let table = build_features(&[a, b], &cfg);
        assert_eq!(table.value(0, "has_uppercase"), Some(0.0));
        assert_eq!(table.value(1, "has_uppercase"), Some(1.0));
    }

    #[test]
    fn category_one_hot_groups_tail_into_other() {
        let items: Vec<ContentItem> = (1..=8)
            .map(|d| {
                let cat = match d {
                    1..=3 => "gaming",
                    4..=5 => "music",
                    _ => match d {
                        6 => "news",
                        7 => "travel",
                        _ => "food",
                    },
                };
                item(&format!("i{d}"), d, 10, 100 * d as u64, Some(cat))
            })
            .collect();
        let cfg = AnalyticsConfig {
            top_categories: 2,
            ..AnalyticsConfig::default()
        };
        let table = build_features(&items, &cfg);

        let cats = table.category_columns();
        assert_eq!(cats, vec!["cat_gaming", "cat_music", "cat_other"]);
        // First item is gaming.
        assert_eq!(table.value(0, "cat_gaming"), Some(1.0));
        assert_eq!(table.value(0, "cat_other"), Some(0.0));
        // The singleton categories all collapse into "other".
        assert_eq!(table.value(5, "cat_other"), Some(1.0));
    }

    #[test]
    fn momentum_omitted_below_six_items() {
        let items: Vec<ContentItem> =
            (1..=5).map(|d| item(&format!("i{d}"), d, 10, 100, None)).collect();
        let table = build_features(&items, &AnalyticsConfig::default());
        assert!(!table.has_momentum);
        assert!(table.column_index("prev_views").is_none());
        assert!(table.column_index("days_since_prev").is_none());
    }

    #[test]
    fn momentum_is_lag_shifted() {
        let views = [100u64, 200, 300, 400, 500, 600, 700];
        let items: Vec<ContentItem> = views
            .iter()
            .enumerate()
            .map(|(i, v)| item(&format!("i{i}"), (i + 1) as u32 * 2, 10, *v, None))
            .collect();
        let table = build_features(&items, &AnalyticsConfig::default());
        assert!(table.has_momentum);

        // Row 0 has no history.
        assert_eq!(table.value(0, "days_since_prev"), Some(0.0));
        assert_eq!(table.value(0, "prev_views"), Some(0.0));
        assert_eq!(table.value(0, "views_trend"), Some(0.0));

        // Uploads are two days apart.
        assert_eq!(table.value(3, "days_since_prev"), Some(2.0));

        // Row 3 sees outcomes of rows 0..=2 only.
        assert_eq!(table.value(3, "prev_views"), Some(300.0));
        assert_eq!(table.value(3, "avg_views_3"), Some(200.0));
        assert_eq!(table.value(3, "avg_views_5"), Some(200.0));

        // Trend at row 1 comes from the single-point window at row 0.
        assert_eq!(table.value(1, "views_trend"), Some(0.0));
        // Trend at row 6: window rows 1..=5, (600 - 200) / 5.
        assert_eq!(table.value(6, "views_trend"), Some(80.0));
    }

    #[test]
    fn features_ignore_future_outcomes() {
        // Permuting the outcomes of later rows must not change earlier rows.
        let mut items: Vec<ContentItem> = (0..8)
            .map(|i| item(&format!("i{i}"), i + 1, 10, 100 * (i as u64 + 1), None))
            .collect();
        let cfg = AnalyticsConfig::default();
        let before = build_features(&items, &cfg);

        items[6].view_count = 999_999;
        items[7].view_count = 1;
        let after = build_features(&items, &cfg);

        for row in 0..=5 {
            assert_eq!(before.rows[row], after.rows[row], "row {row} changed");
        }
    }
}
