//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no external dependencies.
//! Validation runs here, before anything touches the network.

mod history;
mod metrics;
mod model;
mod prediction;
mod risk;

pub use history::{HistoryEntry, HistoryPage};
pub use metrics::{Feature, HealthMetrics, MetricsDraft, ValidationError};
pub use model::{ModelDescriptor, ModelMetrics, UsageStats};
pub use prediction::{
    Classification, ConfidenceLevel, DetailedPrediction, FeatureContribution, Prediction,
    WhatIfOutcome, WhatIfScenario,
};
pub use risk::{RecommendationGroup, RiskBand, RiskTier};
