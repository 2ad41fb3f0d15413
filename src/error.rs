//! Error taxonomy for the analytics engine.
//!
//! Only structurally insufficient input is a hard error. Sparse-data numeric
//! edge cases (constant metrics, short trend windows, missing categories) fall
//! back to documented neutral values instead of failing, and a prediction
//! requested before training surfaces as `None` rather than an error.

use thiserror::Error;

/// Errors surfaced by training and forecasting entry points.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Sample-size floor not met. Recoverable by fetching more history;
    /// never silently degraded into a misleading result.
    #[error("not enough data for {context}: need at least {required}, got {actual}")]
    InsufficientData {
        context: &'static str,
        required: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

impl AnalyticsError {
    pub(crate) fn insufficient(context: &'static str, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            context,
            required,
            actual,
        }
    }
}
