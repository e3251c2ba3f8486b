//! Prediction result types.
//!
//! Represents the output of the remote diabetes scoring service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::metrics::{Feature, HealthMetrics};

/// Binary screening outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Diabetic,
    NonDiabetic,
}

impl Classification {
    /// Parse the service's label. Anything that is not "diabetic"
    /// (case-insensitive) is the negative class.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("diabetic") {
            Self::Diabetic
        } else {
            Self::NonDiabetic
        }
    }

    #[must_use]
    pub fn is_diabetic(&self) -> bool {
        matches!(self, Self::Diabetic)
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Diabetic => write!(f, "Diabetic"),
            Self::NonDiabetic => write!(f, "Non-Diabetic"),
        }
    }
}

/// Confidence bucket reported alongside a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// Parse the service's label, accepting common casings and
    /// "moderate" as a synonym for the middle bucket.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "moderate" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Base prediction for one set of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub classification: Classification,
    /// Probability of the positive class (0.0 to 1.0)
    pub probability: f64,
    /// Integer risk score (0 to 100)
    pub risk_score: u8,
    pub confidence: ConfidenceLevel,
}

/// One feature's contribution to a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    pub weight: f64,
}

/// Detailed prediction: the base result plus explanatory data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedPrediction {
    pub prediction: Prediction,
    /// Per-feature contributions, in canonical feature order as delivered.
    pub contributions: Vec<FeatureContribution>,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Raw outcome of the service's what-if operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhatIfOutcome {
    pub original_classification: Classification,
    pub original_probability: f64,
    pub modified_classification: Classification,
    pub modified_probability: f64,
    /// Change as reported by the service. Kept for display; the local
    /// delta is always derived from the session baseline.
    pub probability_change: f64,
}

/// A transient single-field counterfactual probe against the session
/// baseline.
///
/// `probability_delta` is `modified probability − baseline probability`:
/// negative means the override lowers the diabetes probability.
#[derive(Debug, Clone, PartialEq)]
pub struct WhatIfScenario {
    pub baseline_input: HealthMetrics,
    pub feature: Feature,
    pub override_value: f64,
    pub baseline: Prediction,
    pub modified_classification: Classification,
    pub modified_probability: f64,
    pub probability_delta: f64,
}

impl WhatIfScenario {
    /// Whether the override improves (lowers) the diabetes probability.
    #[must_use]
    pub fn is_improvement(&self) -> bool {
        self.probability_delta < 0.0
    }
}
