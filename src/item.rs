//! Core value types exchanged with the collaborators (data-fetch clients and
//! the rendering layer): published content items, the upstream channel
//! summary, and the sparse what-if parameters for a not-yet-published item.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// One published unit of content (video/post).
///
/// Count fields are non-negative by construction; `published_at` is treated as
/// immutable once the item is instantiated (the engine never rewrites it).
/// Timestamp sanity (monotonicity, non-placeholder dates) is the caller's
/// contract; the engine does not repair malformed input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    /// Publish timestamp, normalized to UTC upstream.
    pub published_at: DateTime<Utc>,
    pub duration_secs: u32,
    /// Platform category identifier, when the platform has one.
    pub category: Option<String>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    /// Precomputed (likes + comments) / views ratio from the fetch layer.
    pub engagement_rate: f64,
}

impl ContentItem {
    /// Publish hour in [0, 23].
    pub fn publish_hour(&self) -> u32 {
        self.published_at.hour()
    }

    /// Day of week with Monday = 0 .. Sunday = 6.
    pub fn publish_weekday(&self) -> u32 {
        self.published_at.weekday().num_days_from_monday()
    }
}

/// Account-level totals reported by the upstream API, used for coverage
/// reporting (how much of the channel the fetched sample represents).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub total_items: u64,
    pub total_views: u64,
    pub total_subscribers: u64,
}

/// Sparse what-if attributes for an unpublished item. Every field is
/// optional; defaults mirror a typical mid-day upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NextItemParams {
    /// Planned duration in seconds (default 600).
    pub duration_secs: Option<u32>,
    /// Planned publish hour 0-23 (default 12).
    pub hour: Option<u32>,
    /// Planned day of week, Monday = 0 (default 0).
    pub day_of_week: Option<u32>,
    /// Planned month 1-12 (default: current month).
    pub month: Option<u32>,
    /// Planned title length in characters (default 50).
    pub title_length: Option<u32>,
    /// Whether the title will carry a run of uppercase letters (default false).
    pub has_uppercase: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn weekday_is_monday_based() {
        // 2024-01-01 was a Monday.
        let item = ContentItem {
            id: "a".into(),
            title: "t".into(),
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap(),
            duration_secs: 60,
            category: None,
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            engagement_rate: 0.0,
        };
        assert_eq!(item.publish_weekday(), 0);
        assert_eq!(item.publish_hour(), 15);
    }
}
