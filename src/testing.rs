//! Test support: a programmable stub for the scoring port plus small
//! fixture builders. Compiled for tests only.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use crate::application::{Revision, SessionSnapshot};
use crate::domain::{
    Classification, ConfidenceLevel, DetailedPrediction, Feature, FeatureContribution,
    HealthMetrics, HistoryEntry, HistoryPage, ModelDescriptor, ModelMetrics, Prediction,
    RecommendationGroup, RiskTier, UsageStats, WhatIfOutcome,
};
use crate::ports::{ScoringError, ScoringService};

/// Build a complete draft from canonical-order values.
pub fn draft(values: [f64; 5]) -> crate::domain::MetricsDraft {
    crate::domain::MetricsDraft {
        pregnancies: Some(values[0]),
        glucose: Some(values[1]),
        blood_pressure: Some(values[2]),
        bmi: Some(values[3]),
        age: Some(values[4]),
    }
}

/// Build validated metrics from canonical-order values.
pub fn metrics(values: [f64; 5]) -> HealthMetrics {
    HealthMetrics {
        pregnancies: values[0],
        glucose: values[1],
        blood_pressure: values[2],
        bmi: values[3],
        age: values[4],
    }
}

pub fn prediction(
    classification: Classification,
    probability: f64,
    risk_score: u8,
    confidence: ConfidenceLevel,
) -> Prediction {
    Prediction {
        classification,
        probability,
        risk_score,
        confidence,
    }
}

/// A detailed prediction wrapping the given base result.
pub fn detailed_for(base: Prediction) -> DetailedPrediction {
    DetailedPrediction {
        prediction: base,
        contributions: vec![
            FeatureContribution {
                feature: "Glucose".to_string(),
                weight: 0.45,
            },
            FeatureContribution {
                feature: "BMI".to_string(),
                weight: 0.30,
            },
        ],
        risk_factors: vec!["Glucose above normal".to_string()],
        recommendations: vec!["Increase physical activity".to_string()],
        generated_at: Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap(),
    }
}

/// A history page from (probability, diabetic) pairs, chronologically
/// ascending.
pub fn history_page(rows: &[(f64, bool)]) -> HistoryPage {
    let entries = rows
        .iter()
        .enumerate()
        .map(|(i, (probability, diabetic))| HistoryEntry {
            timestamp: Utc.with_ymd_and_hms(2026, 8, 7, 9, i as u32, 0).unwrap(),
            input: metrics([2.0, 130.0, 70.0, 28.5, 45.0]),
            classification: if *diabetic {
                Classification::Diabetic
            } else {
                Classification::NonDiabetic
            },
            probability: *probability,
        })
        .collect::<Vec<_>>();
    HistoryPage {
        total: entries.len() as u64,
        entries,
        reported_at: Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap(),
    }
}

/// A session snapshot at the given revision.
pub fn snapshot_for(revision: Revision, result: Prediction) -> SessionSnapshot {
    SessionSnapshot {
        revision,
        input: metrics([2.0, 130.0, 70.0, 28.5, 45.0]),
        result,
        committed_at: Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap(),
    }
}

/// Programmable in-memory stand-in for the remote scoring service.
pub struct StubScoring {
    prediction: Mutex<Prediction>,
    detailed: Mutex<Option<DetailedPrediction>>,
    tiers: Mutex<Vec<RiskTier>>,
    groups: Mutex<Vec<RecommendationGroup>>,
    what_if_outcome: Mutex<Option<WhatIfOutcome>>,
    history: Mutex<HistoryPage>,

    next_predict_error: Mutex<Option<ScoringError>>,
    next_detailed_error: Mutex<Option<ScoringError>>,
    detailed_gate: Mutex<Option<Receiver<()>>>,

    predict_calls: AtomicUsize,
    what_if_calls: AtomicUsize,
    history_reads: AtomicUsize,
    clear_calls: AtomicUsize,
    last_what_if: Mutex<Option<(HealthMetrics, Feature, f64)>>,
}

impl Default for StubScoring {
    fn default() -> Self {
        Self::returning(prediction(
            Classification::NonDiabetic,
            0.2,
            20,
            ConfidenceLevel::Medium,
        ))
    }
}

impl StubScoring {
    pub fn returning(result: Prediction) -> Self {
        Self {
            prediction: Mutex::new(result),
            detailed: Mutex::new(None),
            tiers: Mutex::new(vec![RiskTier {
                feature: "Glucose".to_string(),
                value: 130.0,
                status: "Elevated".to_string(),
                band: crate::domain::RiskBand::Medium,
                normal_range: "70-99 mg/dL".to_string(),
            }]),
            groups: Mutex::new(vec![RecommendationGroup {
                category: "Lifestyle".to_string(),
                items: vec!["Increase physical activity".to_string()],
                priority: "High".to_string(),
            }]),
            what_if_outcome: Mutex::new(None),
            history: Mutex::new(history_page(&[])),
            next_predict_error: Mutex::new(None),
            next_detailed_error: Mutex::new(None),
            detailed_gate: Mutex::new(None),
            predict_calls: AtomicUsize::new(0),
            what_if_calls: AtomicUsize::new(0),
            history_reads: AtomicUsize::new(0),
            clear_calls: AtomicUsize::new(0),
            last_what_if: Mutex::new(None),
        }
    }

    pub fn with_detailed(self, detailed: DetailedPrediction) -> Self {
        *self.detailed.lock().unwrap() = Some(detailed);
        self
    }

    pub fn with_what_if(self, outcome: WhatIfOutcome) -> Self {
        *self.what_if_outcome.lock().unwrap() = Some(outcome);
        self
    }

    pub fn with_history(self, page: HistoryPage) -> Self {
        *self.history.lock().unwrap() = page;
        self
    }

    pub fn set_history(&self, page: HistoryPage) {
        *self.history.lock().unwrap() = page;
    }

    pub fn fail_next_predict(&self, error: ScoringError) {
        *self.next_predict_error.lock().unwrap() = Some(error);
    }

    pub fn fail_next_detailed(&self, error: ScoringError) {
        *self.next_detailed_error.lock().unwrap() = Some(error);
    }

    /// Block every detailed fetch until a token arrives on the channel.
    pub fn hold_detailed(&self, gate: Receiver<()>) {
        *self.detailed_gate.lock().unwrap() = Some(gate);
    }

    pub fn predict_calls(&self) -> usize {
        self.predict_calls.load(Ordering::SeqCst)
    }

    pub fn what_if_calls(&self) -> usize {
        self.what_if_calls.load(Ordering::SeqCst)
    }

    pub fn history_reads(&self) -> usize {
        self.history_reads.load(Ordering::SeqCst)
    }

    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    pub fn last_what_if(&self) -> Option<(HealthMetrics, Feature, f64)> {
        *self.last_what_if.lock().unwrap()
    }
}

impl ScoringService for StubScoring {
    fn predict(&self, _input: &HealthMetrics) -> Result<Prediction, ScoringError> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.next_predict_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(*self.prediction.lock().unwrap())
    }

    fn predict_detailed(&self, _input: &HealthMetrics) -> Result<DetailedPrediction, ScoringError> {
        {
            let gate = self.detailed_gate.lock().unwrap();
            if let Some(rx) = gate.as_ref() {
                let _ = rx.recv_timeout(Duration::from_secs(5));
            }
        }
        if let Some(error) = self.next_detailed_error.lock().unwrap().take() {
            return Err(error);
        }
        let configured = self.detailed.lock().unwrap().clone();
        Ok(configured.unwrap_or_else(|| detailed_for(*self.prediction.lock().unwrap())))
    }

    fn assess_risk(&self, _input: &HealthMetrics) -> Result<Vec<RiskTier>, ScoringError> {
        Ok(self.tiers.lock().unwrap().clone())
    }

    fn recommend(&self, _input: &HealthMetrics) -> Result<Vec<RecommendationGroup>, ScoringError> {
        Ok(self.groups.lock().unwrap().clone())
    }

    fn what_if(
        &self,
        baseline: &HealthMetrics,
        feature: Feature,
        new_value: f64,
    ) -> Result<WhatIfOutcome, ScoringError> {
        self.what_if_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_what_if.lock().unwrap() = Some((*baseline, feature, new_value));
        let outcome = *self.what_if_outcome.lock().unwrap();
        outcome.ok_or_else(|| ScoringError::Decode("no what-if outcome configured".to_string()))
    }

    fn read_history(&self, limit: usize) -> Result<HistoryPage, ScoringError> {
        self.history_reads.fetch_add(1, Ordering::SeqCst);
        let mut page = self.history.lock().unwrap().clone();
        page.entries.truncate(limit);
        Ok(page)
    }

    fn clear_history(&self) -> Result<(), ScoringError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        *self.history.lock().unwrap() = history_page(&[]);
        Ok(())
    }

    fn feature_importance(&self) -> Result<Vec<FeatureContribution>, ScoringError> {
        Ok(Feature::ALL
            .iter()
            .enumerate()
            .map(|(i, feature)| FeatureContribution {
                feature: feature.name().to_string(),
                weight: 0.5 - 0.1 * i as f64,
            })
            .collect())
    }

    fn model_info(&self) -> Result<ModelDescriptor, ScoringError> {
        Ok(ModelDescriptor {
            version: "1.0.0".to_string(),
            algorithm: "GradientBoosting".to_string(),
            training_date: "2026-05-01".to_string(),
            metrics: ModelMetrics {
                accuracy: 0.89,
                f1_score: 0.84,
                precision: 0.86,
                recall: 0.82,
            },
            required_features: Feature::ALL.iter().map(|f| f.name().to_string()).collect(),
        })
    }

    fn usage_stats(&self) -> Result<UsageStats, ScoringError> {
        Ok(UsageStats {
            total_api_calls: (self.predict_calls() + self.history_reads()) as u64,
            endpoint_usage: std::collections::BTreeMap::new(),
            total_predictions: self.predict_calls() as u64,
            reported_at: Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap(),
        })
    }
}
