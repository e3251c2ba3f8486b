//! Insight board: state of the dependent views for the current session.
//!
//! One board holds the detailed breakdown, the per-feature risk map and
//! the recommendation panels. On every commit it launches a refresh
//! worker for the new revision; on poll it applies only updates whose
//! stamp still matches the store's current revision and silently drops
//! the rest.

use std::sync::Arc;

use crate::application::session::{SessionService, SessionSnapshot, Stamped};
use crate::application::worker::{RefreshUpdate, RefreshWorker, RefreshWorkerHandle};
use crate::domain::{DetailedPrediction, RecommendationGroup, RiskTier};
use crate::ports::ScoringService;

/// Dependent-view state fed by revision-stamped fetches.
#[derive(Default)]
pub struct InsightBoard {
    detailed: Option<Stamped<DetailedPrediction>>,
    risk_profile: Option<Stamped<Vec<RiskTier>>>,
    recommendations: Option<Stamped<Vec<RecommendationGroup>>>,
    stage_errors: Vec<String>,
    worker: Option<RefreshWorkerHandle>,
}

impl InsightBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// React to a new canonical snapshot: start fetching the dependent
    /// views for its revision.
    ///
    /// A previous in-flight worker is abandoned; whatever it still
    /// delivers would fail the staleness check anyway.
    pub fn on_commit<C>(&mut self, client: &Arc<C>, snapshot: &SessionSnapshot)
    where
        C: ScoringService + 'static,
    {
        self.stage_errors.clear();
        self.worker = Some(RefreshWorker::spawn(client.clone(), snapshot.clone()));
    }

    /// Drain pending worker updates, applying each only if its revision
    /// is still the store's current one.
    ///
    /// Stale arrivals are dropped without touching any panel: a slow
    /// response for an old input must never overwrite a newer input's
    /// view.
    pub fn poll<C: ScoringService>(&mut self, session: &SessionService<C>) {
        loop {
            let update = match self.worker.as_ref().and_then(|worker| worker.try_recv()) {
                Some(update) => update,
                None => break,
            };

            if matches!(update.value, RefreshUpdate::Finished) {
                self.worker = None;
                break;
            }

            if !session.is_current(update.revision) {
                tracing::debug!(
                    "Dropping stale view update for revision {} (current {})",
                    update.revision,
                    session.revision()
                );
                continue;
            }

            let revision = update.revision;
            match update.value {
                RefreshUpdate::Detailed(detailed) => {
                    self.detailed = Some(Stamped::new(revision, detailed));
                }
                RefreshUpdate::RiskProfile(tiers) => {
                    self.risk_profile = Some(Stamped::new(revision, tiers));
                }
                RefreshUpdate::Recommendations(groups) => {
                    self.recommendations = Some(Stamped::new(revision, groups));
                }
                RefreshUpdate::StageFailed { stage, message } => {
                    tracing::warn!("View refresh stage '{}' failed: {}", stage, message);
                    self.stage_errors.push(format!("{stage}: {message}"));
                }
                RefreshUpdate::Finished => unreachable!("handled above"),
            }
        }
    }

    /// Whether a refresh is still in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.worker.is_some()
    }

    #[must_use]
    pub fn detailed(&self) -> Option<&Stamped<DetailedPrediction>> {
        self.detailed.as_ref()
    }

    #[must_use]
    pub fn risk_profile(&self) -> Option<&Stamped<Vec<RiskTier>>> {
        self.risk_profile.as_ref()
    }

    #[must_use]
    pub fn recommendations(&self) -> Option<&Stamped<Vec<RecommendationGroup>>> {
        self.recommendations.as_ref()
    }

    /// Per-stage fetch failures collected since the last commit.
    #[must_use]
    pub fn stage_errors(&self) -> &[String] {
        &self.stage_errors
    }
}
