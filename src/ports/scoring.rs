//! Scoring port: Trait for the remote diabetes scoring service.
//!
//! This trait abstracts the HTTP service from the application logic. Each
//! operation is independent and stateless: no caching, no retries. Retry
//! policy, if any, belongs to the caller.

use crate::domain::{
    DetailedPrediction, Feature, FeatureContribution, HealthMetrics, HistoryPage, ModelDescriptor,
    Prediction, RecommendationGroup, RiskTier, UsageStats, WhatIfOutcome,
};

/// Failure modes of the remote scoring service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScoringError {
    /// No usable response: connectivity failure or timeout.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service responded with a non-success status.
    #[error("service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The service responded successfully but the body was not decodable.
    #[error("malformed service response: {0}")]
    Decode(String),
}

/// Trait for remote scoring operations.
///
/// Implementations take already-validated domain data; a failing
/// validation must never reach this trait.
pub trait ScoringService: Send + Sync {
    /// Score one set of metrics.
    ///
    /// # Errors
    /// `ScoringError` on transport, service or decode failure.
    fn predict(&self, input: &HealthMetrics) -> Result<Prediction, ScoringError>;

    /// Score one set of metrics with per-feature contributions, risk
    /// factors and recommendation strings.
    ///
    /// # Errors
    /// `ScoringError` on transport, service or decode failure.
    fn predict_detailed(&self, input: &HealthMetrics) -> Result<DetailedPrediction, ScoringError>;

    /// Classify each feature value against the service's normal-range
    /// table.
    ///
    /// # Errors
    /// `ScoringError` on transport, service or decode failure.
    fn assess_risk(&self, input: &HealthMetrics) -> Result<Vec<RiskTier>, ScoringError>;

    /// Fetch grouped lifestyle recommendations for the input.
    ///
    /// # Errors
    /// `ScoringError` on transport, service or decode failure.
    fn recommend(&self, input: &HealthMetrics) -> Result<Vec<RecommendationGroup>, ScoringError>;

    /// Re-score the baseline with exactly one feature overridden.
    ///
    /// The baseline and the override are logically separate inputs; how
    /// they travel on the wire is an adapter concern.
    ///
    /// # Errors
    /// `ScoringError` on transport, service or decode failure.
    fn what_if(
        &self,
        baseline: &HealthMetrics,
        feature: Feature,
        new_value: f64,
    ) -> Result<WhatIfOutcome, ScoringError>;

    /// Read the most recent `limit` entries of the prediction log.
    ///
    /// # Errors
    /// `ScoringError` on transport, service or decode failure.
    fn read_history(&self, limit: usize) -> Result<HistoryPage, ScoringError>;

    /// Clear the remote prediction log.
    ///
    /// # Errors
    /// `ScoringError` on transport or service failure.
    fn clear_history(&self) -> Result<(), ScoringError>;

    /// Global feature importance of the deployed model.
    ///
    /// # Errors
    /// `ScoringError` on transport, service or decode failure.
    fn feature_importance(&self) -> Result<Vec<FeatureContribution>, ScoringError>;

    /// Metadata of the deployed model.
    ///
    /// # Errors
    /// `ScoringError` on transport, service or decode failure.
    fn model_info(&self) -> Result<ModelDescriptor, ScoringError>;

    /// Aggregate usage counters of the service.
    ///
    /// # Errors
    /// `ScoringError` on transport, service or decode failure.
    fn usage_stats(&self) -> Result<UsageStats, ScoringError>;
}
