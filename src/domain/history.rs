//! History log types.
//!
//! The remote service keeps an append-only log of predictions; these types
//! mirror what `GET /history` returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::metrics::HealthMetrics;
use super::prediction::Classification;

/// One entry of the remote prediction log. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub input: HealthMetrics,
    pub classification: Classification,
    pub probability: f64,
}

/// A page of the remote log, chronologically ascending as returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    /// Total entries the service has logged (may exceed `entries.len()`).
    pub total: u64,
    pub entries: Vec<HistoryEntry>,
    /// Service-side time of the read.
    pub reported_at: DateTime<Utc>,
}

impl HistoryPage {
    /// An empty log is a valid terminal state, not an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
