//! Derived analytics: pure transformations over already-fetched data.
//!
//! Nothing here performs I/O; callers fetch raw responses through the
//! scoring port and hand them in.

use chrono::{DateTime, Utc};

use crate::domain::{Classification, FeatureContribution, HistoryEntry, RiskBand, RiskTier};

/// Aggregation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AnalyticsError {
    /// An aggregate was requested over zero records.
    #[error("no entries to aggregate")]
    EmptyInput,
}

/// Tier counts across one risk assessment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierSummary {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TierSummary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// One chartable point of the history trend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    /// Position in the original chronological order.
    pub index: usize,
    /// Probability as a percentage, rounded to two decimals.
    pub probability_percent: f64,
    pub timestamp: DateTime<Utc>,
}

/// Classification counts across a history page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistorySummary {
    pub diabetic: usize,
    pub non_diabetic: usize,
}

/// Sort contributions by weight, descending. The sort is stable: equal
/// weights keep their input order.
#[must_use]
pub fn rank_contributions(mut contributions: Vec<FeatureContribution>) -> Vec<FeatureContribution> {
    contributions.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    contributions
}

/// Partition a risk assessment by tier. Counts always sum to the input
/// length.
#[must_use]
pub fn summarize_risk_tiers(tiers: &[RiskTier]) -> TierSummary {
    let mut summary = TierSummary::default();
    for tier in tiers {
        match tier.band {
            RiskBand::High => summary.high += 1,
            RiskBand::Medium => summary.medium += 1,
            RiskBand::Low => summary.low += 1,
        }
    }
    summary
}

/// Map history entries to chartable points, preserving chronological
/// order.
#[must_use]
pub fn build_trend_series(entries: &[HistoryEntry]) -> Vec<TrendPoint> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| TrendPoint {
            index,
            probability_percent: round2(entry.probability * 100.0),
            timestamp: entry.timestamp,
        })
        .collect()
}

/// Arithmetic mean of `probability * 100` over all entries.
///
/// # Errors
/// `AnalyticsError::EmptyInput` when the list is empty, so callers never
/// see a NaN from a zero division.
pub fn average_risk_score(entries: &[HistoryEntry]) -> Result<f64, AnalyticsError> {
    if entries.is_empty() {
        return Err(AnalyticsError::EmptyInput);
    }
    let sum: f64 = entries.iter().map(|entry| entry.probability * 100.0).sum();
    Ok(sum / entries.len() as f64)
}

/// Count entries per classification.
#[must_use]
pub fn summarize_history(entries: &[HistoryEntry]) -> HistorySummary {
    let mut summary = HistorySummary::default();
    for entry in entries {
        match entry.classification {
            Classification::Diabetic => summary.diabetic += 1,
            Classification::NonDiabetic => summary.non_diabetic += 1,
        }
    }
    summary
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
