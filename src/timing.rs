//! Publish-timing analysis: aggregate historical performance by hour and by
//! day of week, then recommend the best slot.
//!
//! Ties on mean views keep the earliest group in ascending key order (hour
//! 0..23, Monday..Sunday): deterministic, and identical to taking the first
//! maximum over a sorted group index.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::item::ContentItem;

/// Aggregates for one hour or weekday group. Only observed groups appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotStats {
    pub mean_views: f64,
    pub mean_engagement: f64,
    pub item_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourSlot {
    pub hour: u32,
    #[serde(flatten)]
    pub stats: SlotStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySlot {
    pub day: Weekday,
    #[serde(flatten)]
    pub stats: SlotStats,
}

/// Timing recommendation plus the per-group tables behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingReport {
    pub best_hour: u32,
    pub best_day: Weekday,
    pub by_hour: Vec<HourSlot>,
    pub by_day: Vec<DaySlot>,
}

/// Analyze historical publish timing. `None` on an empty table.
pub fn analyze_timing(items: &[ContentItem]) -> Option<TimingReport> {
    if items.is_empty() {
        return None;
    }

    let by_hour: Vec<HourSlot> = group_stats(items, |it| it.publish_hour())
        .into_iter()
        .map(|(hour, stats)| HourSlot { hour, stats })
        .collect();
    let by_day: Vec<DaySlot> = group_stats(items, |it| it.publish_weekday())
        .into_iter()
        .map(|(dow, stats)| DaySlot {
            day: weekday_from_monday_index(dow),
            stats,
        })
        .collect();

    // Strictly-greater scan keeps the first maximum in key order.
    let best_hour = first_max(&by_hour, |s| s.stats.mean_views)?.hour;
    let best_day = first_max(&by_day, |s| s.stats.mean_views)?.day;

    Some(TimingReport {
        best_hour,
        best_day,
        by_hour,
        by_day,
    })
}

/// Mean views, mean engagement, and count per group key, in ascending key
/// order.
fn group_stats(items: &[ContentItem], key: impl Fn(&ContentItem) -> u32) -> BTreeMap<u32, SlotStats> {
    let mut acc: BTreeMap<u32, (f64, f64, usize)> = BTreeMap::new();
    for item in items {
        let entry = acc.entry(key(item)).or_default();
        entry.0 += item.view_count as f64;
        entry.1 += item.engagement_rate;
        entry.2 += 1;
    }
    acc.into_iter()
        .map(|(k, (views, engagement, count))| {
            (
                k,
                SlotStats {
                    mean_views: views / count as f64,
                    mean_engagement: engagement / count as f64,
                    item_count: count,
                },
            )
        })
        .collect()
}

fn first_max<T>(slots: &[T], value: impl Fn(&T) -> f64) -> Option<&T> {
    let mut best: Option<&T> = None;
    for slot in slots {
        match best {
            Some(b) if value(slot) <= value(b) => {}
            _ => best = Some(slot),
        }
    }
    best
}

fn weekday_from_monday_index(index: u32) -> Weekday {
    match index {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}
