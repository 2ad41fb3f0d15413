// src/lib.rs
// Public library surface for the predictive analytics engine.
//
// The dashboard's presentation layer and data-fetch clients live elsewhere;
// this crate consumes an in-memory table of published content items (plus the
// upstream channel totals) and produces: a trained-model comparison report, a
// next-item reach estimate, a growth forecast series, a scored/tiered item
// table, a publish-timing report, and channel coverage statistics.
//
// Everything is synchronous and stateless across calls: the only state that
// crosses a call boundary is the TrainedModel value training hands back and
// prediction takes in; no ambient "currently selected model".

pub mod config;
pub mod error;
pub mod features;
pub mod forecast;
pub mod item;
pub mod model;
pub mod predict;
pub mod scoring;
pub mod summary;
pub mod timing;
pub mod train;

// ---- Re-exports for stable public API ----
pub use crate::config::{AnalyticsConfig, ScoreWeights};
pub use crate::error::{AnalyticsError, Result};
pub use crate::features::{build_features, FeatureTable};
pub use crate::forecast::{forecast_growth, ForecastPoint, ForecastSeries};
pub use crate::item::{ChannelSummary, ContentItem, NextItemParams};
pub use crate::model::{ModelFamily, TrainedModel};
pub use crate::predict::{predict_next_item, predict_next_item_at};
pub use crate::scoring::{score_items, ScoredItem, Tier};
pub use crate::summary::{summarize_channel, ChannelStats, EngagementComparison};
pub use crate::timing::{analyze_timing, TimingReport};
pub use crate::train::{train_comparison, ComparisonReport, ModelEntry, ModelScore};
