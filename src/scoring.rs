//! Composite performance scoring and tiering.
//!
//! Each raw metric is min-max normalized to 0-100 across the supplied item
//! set; a constant metric pins to the 50 midpoint so it neither divides by
//! zero nor drags the composite. The composite is a fixed-weight sum (an
//! editorial choice, not a learned one) and maps onto four ordered tiers.

use serde::{Deserialize, Serialize};

use crate::config::ScoreWeights;
use crate::item::ContentItem;

/// Normalized score assigned when a metric is constant across the set.
const CONSTANT_METRIC_SCORE: f64 = 50.0;

/// Discrete performance bucket from composite-score bins.
/// Upper edges are inclusive: exactly 25.0 is still Poor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl Tier {
    /// Fixed-boundary classification over [0, 100].
    pub fn from_score(score: f64) -> Self {
        if score <= 25.0 {
            Tier::Poor
        } else if score <= 50.0 {
            Tier::Fair
        } else if score <= 75.0 {
            Tier::Good
        } else {
            Tier::Excellent
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::Poor => "Poor",
            Tier::Fair => "Fair",
            Tier::Good => "Good",
            Tier::Excellent => "Excellent",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A content item with its normalized sub-scores, composite score, and tier.
/// Recomputed on every scoring request; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item: ContentItem,
    pub views_score: f64,
    pub likes_score: f64,
    pub comments_score: f64,
    pub engagement_score: f64,
    pub performance_score: f64,
    pub tier: Tier,
}

/// Score every item against the rest of the supplied set.
/// Output order matches input order; empty input yields an empty table.
pub fn score_items(items: &[ContentItem], weights: &ScoreWeights) -> Vec<ScoredItem> {
    let views = normalized(items, |it| it.view_count as f64);
    let likes = normalized(items, |it| it.like_count as f64);
    let comments = normalized(items, |it| it.comment_count as f64);
    let engagement = normalized(items, |it| it.engagement_rate);

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let performance_score = views[i] * weights.views
                + likes[i] * weights.likes
                + comments[i] * weights.comments
                + engagement[i] * weights.engagement;
            ScoredItem {
                item: item.clone(),
                views_score: views[i],
                likes_score: likes[i],
                comments_score: comments[i],
                engagement_score: engagement[i],
                performance_score,
                tier: Tier::from_score(performance_score),
            }
        })
        .collect()
}

/// Min-max normalize one metric to 0-100; constant metrics pin to 50.
fn normalized(items: &[ContentItem], metric: impl Fn(&ContentItem) -> f64) -> Vec<f64> {
    let values: Vec<f64> = items.iter().map(metric).collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max > min {
        values.iter().map(|v| (v - min) / (max - min) * 100.0).collect()
    } else {
        vec![CONSTANT_METRIC_SCORE; values.len()]
    }
}
