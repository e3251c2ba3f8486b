//! HTTP adapter for the remote scoring service.
//!
//! Blocking JSON client implementing the [`ScoringService`] port. One
//! method per remote endpoint; no caching, no retries.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::{
    Classification, ConfidenceLevel, DetailedPrediction, Feature, FeatureContribution,
    HealthMetrics, HistoryEntry, HistoryPage, ModelDescriptor, Prediction, RecommendationGroup,
    RiskBand, RiskTier, UsageStats, WhatIfOutcome,
};
use crate::ports::{ScoringError, ScoringService};

const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Scoring service connection settings.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ServiceConfig {
    /// Read settings from the environment.
    ///
    /// `GLYCOSCOPE_SERVICE_URL` (default `http://127.0.0.1:8000`) and
    /// `GLYCOSCOPE_HTTP_TIMEOUT_SECS` (default 30).
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("GLYCOSCOPE_SERVICE_URL")
            .unwrap_or_else(|_| DEFAULT_SERVICE_URL.to_string());
        let timeout = std::env::var("GLYCOSCOPE_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS), Duration::from_secs);
        Self { base_url, timeout }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Blocking HTTP client for the scoring service.
pub struct HttpScoringClient {
    config: ServiceConfig,
    agent: ureq::Agent,
}

impl HttpScoringClient {
    /// Create a client with the given settings.
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { config, agent }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, ScoringError> {
        let mut request = self.agent.get(&self.url(path));
        for (key, value) in query {
            request = request.query(key, value);
        }
        tracing::debug!("GET {}", path);
        read_body(request.call())
    }

    fn post(&self, path: &str, query: &[(&str, String)], body: &HealthMetrics) -> Result<String, ScoringError> {
        let mut request = self.agent.post(&self.url(path));
        for (key, value) in query {
            request = request.query(key, value);
        }
        tracing::debug!("POST {}", path);
        read_body(request.send_json(body))
    }
}

impl ScoringService for HttpScoringClient {
    fn predict(&self, input: &HealthMetrics) -> Result<Prediction, ScoringError> {
        let body = self.post("/predict", &[], input)?;
        decode::<PredictResponse>(&body)?.into_domain()
    }

    fn predict_detailed(&self, input: &HealthMetrics) -> Result<DetailedPrediction, ScoringError> {
        let body = self.post("/predict/detailed", &[], input)?;
        decode::<DetailedResponse>(&body)?.into_domain()
    }

    fn assess_risk(&self, input: &HealthMetrics) -> Result<Vec<RiskTier>, ScoringError> {
        let body = self.post("/risk_assessment", &[], input)?;
        decode::<Vec<RiskRow>>(&body)?
            .into_iter()
            .map(RiskRow::into_domain)
            .collect()
    }

    fn recommend(&self, input: &HealthMetrics) -> Result<Vec<RecommendationGroup>, ScoringError> {
        let body = self.post("/recommendations", &[], input)?;
        Ok(decode::<Vec<RecommendationRow>>(&body)?
            .into_iter()
            .map(RecommendationRow::into_domain)
            .collect())
    }

    fn what_if(
        &self,
        baseline: &HealthMetrics,
        feature: Feature,
        new_value: f64,
    ) -> Result<WhatIfOutcome, ScoringError> {
        // Override travels as query parameters, baseline as the body.
        let query = [
            ("modified_feature", feature.name().to_string()),
            ("new_value", new_value.to_string()),
        ];
        let body = self.post("/what_if", &query, baseline)?;
        Ok(decode::<WhatIfResponse>(&body)?.into_domain())
    }

    fn read_history(&self, limit: usize) -> Result<HistoryPage, ScoringError> {
        let body = self.get("/history", &[("limit", limit.to_string())])?;
        decode::<HistoryResponse>(&body)?.into_domain()
    }

    fn clear_history(&self) -> Result<(), ScoringError> {
        tracing::debug!("DELETE /history");
        read_body(self.agent.delete(&self.url("/history")).call()).map(|_| ())
    }

    fn feature_importance(&self) -> Result<Vec<FeatureContribution>, ScoringError> {
        let body = self.get("/feature_importance", &[])?;
        Ok(decode::<Vec<ImportanceRow>>(&body)?
            .into_iter()
            .map(|row| FeatureContribution {
                feature: row.feature,
                weight: row.importance,
            })
            .collect())
    }

    fn model_info(&self) -> Result<ModelDescriptor, ScoringError> {
        let body = self.get("/model_info", &[])?;
        decode(&body)
    }

    fn usage_stats(&self) -> Result<UsageStats, ScoringError> {
        let body = self.get("/stats", &[])?;
        decode::<StatsResponse>(&body)?.into_domain()
    }
}

fn read_body(result: Result<ureq::Response, ureq::Error>) -> Result<String, ScoringError> {
    match result {
        Ok(response) => response
            .into_string()
            .map_err(|e| ScoringError::Transport(e.to_string())),
        Err(ureq::Error::Status(status, response)) => Err(ScoringError::Service {
            status,
            message: service_message(response),
        }),
        Err(other) => Err(ScoringError::Transport(other.to_string())),
    }
}

/// Extract the human-readable reason from an error body.
///
/// FastAPI-style services report it in a `detail` field; fall back to the
/// raw body.
fn service_message(response: ureq::Response) -> String {
    let body = response.into_string().unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str().map(str::to_owned)))
        .unwrap_or(body)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ScoringError> {
    serde_json::from_str(body).map_err(|e| ScoringError::Decode(e.to_string()))
}

/// Parse a service timestamp.
///
/// Accepts RFC 3339, and naive ISO-8601 (assumed UTC) since the service
/// emits `datetime.isoformat()` without an offset.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ScoringError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| ScoringError::Decode(format!("unparseable timestamp \"{raw}\"")))
}

fn parse_confidence(label: &str) -> Result<ConfidenceLevel, ScoringError> {
    ConfidenceLevel::from_label(label)
        .ok_or_else(|| ScoringError::Decode(format!("unknown confidence level \"{label}\"")))
}

fn parse_band(label: &str) -> Result<RiskBand, ScoringError> {
    RiskBand::from_label(label)
        .ok_or_else(|| ScoringError::Decode(format!("unknown risk level \"{label}\"")))
}

fn clamp_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

/// Materialize the unordered contributions map canonically: known
/// features in declaration order, unknown features after, alphabetically.
fn order_contributions(map: HashMap<String, f64>) -> Vec<FeatureContribution> {
    let mut rows: Vec<FeatureContribution> = map
        .into_iter()
        .map(|(feature, weight)| FeatureContribution { feature, weight })
        .collect();
    rows.sort_by(|a, b| {
        contribution_rank(&a.feature)
            .cmp(&contribution_rank(&b.feature))
            .then_with(|| a.feature.cmp(&b.feature))
    });
    rows
}

fn contribution_rank(name: &str) -> usize {
    Feature::parse(name).map_or(Feature::ALL.len(), |f| f.canonical_index())
}

// Wire shapes

#[derive(Debug, Deserialize)]
struct PredictResponse {
    prediction: String,
    probability: f64,
    risk_score: f64,
    confidence_level: String,
}

impl PredictResponse {
    fn into_domain(self) -> Result<Prediction, ScoringError> {
        Ok(Prediction {
            classification: Classification::from_label(&self.prediction),
            probability: self.probability,
            risk_score: clamp_score(self.risk_score),
            confidence: parse_confidence(&self.confidence_level)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DetailedResponse {
    prediction: String,
    probability: f64,
    risk_score: f64,
    confidence_level: String,
    feature_contributions: HashMap<String, f64>,
    risk_factors: Vec<String>,
    recommendations: Vec<String>,
    timestamp: String,
}

impl DetailedResponse {
    fn into_domain(self) -> Result<DetailedPrediction, ScoringError> {
        Ok(DetailedPrediction {
            prediction: Prediction {
                classification: Classification::from_label(&self.prediction),
                probability: self.probability,
                risk_score: clamp_score(self.risk_score),
                confidence: parse_confidence(&self.confidence_level)?,
            },
            contributions: order_contributions(self.feature_contributions),
            risk_factors: self.risk_factors,
            recommendations: self.recommendations,
            generated_at: parse_timestamp(&self.timestamp)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RiskRow {
    feature: String,
    value: f64,
    status: String,
    risk_level: String,
    normal_range: String,
}

impl RiskRow {
    fn into_domain(self) -> Result<RiskTier, ScoringError> {
        Ok(RiskTier {
            band: parse_band(&self.risk_level)?,
            feature: self.feature,
            value: self.value,
            status: self.status,
            normal_range: self.normal_range,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RecommendationRow {
    category: String,
    recommendations: Vec<String>,
    priority: String,
}

impl RecommendationRow {
    fn into_domain(self) -> RecommendationGroup {
        RecommendationGroup {
            category: self.category,
            items: self.recommendations,
            priority: self.priority,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WhatIfResponse {
    original_prediction: String,
    original_probability: f64,
    modified_prediction: String,
    modified_probability: f64,
    probability_change: f64,
}

impl WhatIfResponse {
    fn into_domain(self) -> WhatIfOutcome {
        WhatIfOutcome {
            original_classification: Classification::from_label(&self.original_prediction),
            original_probability: self.original_probability,
            modified_classification: Classification::from_label(&self.modified_prediction),
            modified_probability: self.modified_probability,
            probability_change: self.probability_change,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    timestamp: String,
    input: HealthMetrics,
    prediction: String,
    probability: f64,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    total_predictions: u64,
    recent_predictions: Vec<HistoryRow>,
    timestamp: String,
}

impl HistoryResponse {
    fn into_domain(self) -> Result<HistoryPage, ScoringError> {
        let entries = self
            .recent_predictions
            .into_iter()
            .map(|row| {
                Ok(HistoryEntry {
                    timestamp: parse_timestamp(&row.timestamp)?,
                    input: row.input,
                    classification: Classification::from_label(&row.prediction),
                    probability: row.probability,
                })
            })
            .collect::<Result<Vec<_>, ScoringError>>()?;
        Ok(HistoryPage {
            total: self.total_predictions,
            entries,
            reported_at: parse_timestamp(&self.timestamp)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ImportanceRow {
    feature: String,
    importance: f64,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    total_api_calls: u64,
    endpoint_usage: std::collections::BTreeMap<String, u64>,
    total_predictions: u64,
    timestamp: String,
}

impl StatsResponse {
    fn into_domain(self) -> Result<UsageStats, ScoringError> {
        Ok(UsageStats {
            total_api_calls: self.total_api_calls,
            endpoint_usage: self.endpoint_usage,
            total_predictions: self.total_predictions,
            reported_at: parse_timestamp(&self.timestamp)?,
        })
    }
}
