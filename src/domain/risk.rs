//! Per-feature risk assessment types.
//!
//! Tiers and normal ranges are supplied by the remote risk-assessment
//! operation; nothing here recomputes thresholds locally.

use serde::{Deserialize, Serialize};

/// Categorical risk tier for one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    /// Parse the service's label, accepting common casings and
    /// "moderate" as a synonym for the middle band.
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

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// One feature's observed value classified against the service's
/// normal-range table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTier {
    pub feature: String,
    pub value: f64,
    /// Free-text status, e.g. "Elevated".
    pub status: String,
    pub band: RiskBand,
    /// Human-readable normal range, e.g. "70-99 mg/dL". Opaque data.
    pub normal_range: String,
}

/// A group of lifestyle recommendations for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationGroup {
    pub category: String,
    pub items: Vec<String>,
    pub priority: String,
}
