//! Model metadata and service usage statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Evaluation metrics reported for the deployed model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub f1_score: f64,
    pub precision: f64,
    pub recall: f64,
}

/// Description of the model behind the scoring service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub version: String,
    pub algorithm: String,
    /// Opaque date string as reported by the service.
    pub training_date: String,
    pub metrics: ModelMetrics,
    pub required_features: Vec<String>,
}

/// Aggregate usage counters for the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_api_calls: u64,
    /// Calls per endpoint, sorted by endpoint name.
    pub endpoint_usage: BTreeMap<String, u64>,
    pub total_predictions: u64,
    pub reported_at: DateTime<Utc>,
}
