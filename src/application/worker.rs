//! Background refresh worker for the dependent views.
//!
//! After a commit, the detailed breakdown, the per-feature risk map and
//! the recommendations are fetched off the calling thread so a slow
//! service never blocks the session. Every update carries the revision
//! it was issued for; consumers drop updates whose revision is no longer
//! current.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::application::session::{SessionSnapshot, Stamped};
use crate::domain::{DetailedPrediction, RecommendationGroup, RiskTier};
use crate::ports::ScoringService;

/// Updates streamed by the refresh worker.
#[derive(Debug, Clone)]
pub enum RefreshUpdate {
    Detailed(DetailedPrediction),
    RiskProfile(Vec<RiskTier>),
    Recommendations(Vec<RecommendationGroup>),
    /// One fetch failed; the remaining fetches still run.
    StageFailed {
        stage: &'static str,
        message: String,
    },
    /// All fetches for this revision have completed or failed.
    Finished,
}

/// Handle to a running refresh worker.
pub struct RefreshWorkerHandle {
    progress_rx: Receiver<Stamped<RefreshUpdate>>,
    _handle: JoinHandle<()>,
}

impl RefreshWorkerHandle {
    /// Try to receive the next update (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<Stamped<RefreshUpdate>> {
        self.progress_rx.try_recv().ok()
    }

    /// Receive the next update, waiting up to `timeout`.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Stamped<RefreshUpdate>> {
        self.progress_rx.recv_timeout(timeout).ok()
    }
}

/// Worker that fetches the dependent views for one snapshot.
pub struct RefreshWorker;

impl RefreshWorker {
    /// Spawn a background refresh for the given snapshot.
    ///
    /// Each dependent fetch is independent; a failing stage is reported
    /// and the rest still run.
    pub fn spawn<C>(client: Arc<C>, snapshot: SessionSnapshot) -> RefreshWorkerHandle
    where
        C: ScoringService + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::run(&client, &snapshot, &tx);
        });

        RefreshWorkerHandle {
            progress_rx: rx,
            _handle: handle,
        }
    }

    fn run<C>(client: &Arc<C>, snapshot: &SessionSnapshot, tx: &Sender<Stamped<RefreshUpdate>>)
    where
        C: ScoringService,
    {
        let revision = snapshot.revision;
        let input = &snapshot.input;

        let detailed = match client.predict_detailed(input) {
            Ok(detailed) => RefreshUpdate::Detailed(detailed),
            Err(e) => RefreshUpdate::StageFailed {
                stage: "detailed",
                message: e.to_string(),
            },
        };
        let _ = tx.send(Stamped::new(revision, detailed));

        let risk = match client.assess_risk(input) {
            Ok(tiers) => RefreshUpdate::RiskProfile(tiers),
            Err(e) => RefreshUpdate::StageFailed {
                stage: "risk",
                message: e.to_string(),
            },
        };
        let _ = tx.send(Stamped::new(revision, risk));

        let recommendations = match client.recommend(input) {
            Ok(groups) => RefreshUpdate::Recommendations(groups),
            Err(e) => RefreshUpdate::StageFailed {
                stage: "recommendations",
                message: e.to_string(),
            },
        };
        let _ = tx.send(Stamped::new(revision, recommendations));

        let _ = tx.send(Stamped::new(revision, RefreshUpdate::Finished));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Classification, ConfidenceLevel};
    use crate::ports::ScoringError;
    use crate::testing::{detailed_for, prediction, snapshot_for, StubScoring};

    fn drain(handle: &RefreshWorkerHandle) -> Vec<Stamped<RefreshUpdate>> {
        let mut updates = Vec::new();
        loop {
            match handle.recv_timeout(Duration::from_secs(5)) {
                Some(update) => {
                    let finished = matches!(update.value, RefreshUpdate::Finished);
                    updates.push(update);
                    if finished {
                        break;
                    }
                }
                None => panic!("worker did not finish in time"),
            }
        }
        updates
    }

    #[test]
    fn test_all_updates_carry_the_issue_revision() {
        let base = prediction(Classification::Diabetic, 0.67, 67, ConfidenceLevel::High);
        let stub = Arc::new(
            StubScoring::returning(base).with_detailed(detailed_for(base)),
        );
        let snapshot = snapshot_for(3, base);

        let handle = RefreshWorker::spawn(stub, snapshot);
        let updates = drain(&handle);

        assert_eq!(updates.len(), 4);
        assert!(updates.iter().all(|u| u.revision == 3));
        assert!(matches!(updates[0].value, RefreshUpdate::Detailed(_)));
        assert!(matches!(updates[1].value, RefreshUpdate::RiskProfile(_)));
        assert!(matches!(updates[2].value, RefreshUpdate::Recommendations(_)));
    }

    #[test]
    fn test_failing_stage_does_not_abort_the_rest() {
        let base = prediction(Classification::NonDiabetic, 0.2, 20, ConfidenceLevel::Low);
        let stub = Arc::new(StubScoring::returning(base));
        stub.fail_next_detailed(ScoringError::Transport("connection refused".to_string()));

        let handle = RefreshWorker::spawn(stub, snapshot_for(1, base));
        let updates = drain(&handle);

        assert!(matches!(
            updates[0].value,
            RefreshUpdate::StageFailed { stage: "detailed", .. }
        ));
        assert!(matches!(updates[1].value, RefreshUpdate::RiskProfile(_)));
        assert!(matches!(updates[2].value, RefreshUpdate::Recommendations(_)));
    }
}
