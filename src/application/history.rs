//! History ledger cache: local mirror of the remote prediction log.
//!
//! The remote log is append-only; the mirror is replaced wholesale on
//! every refresh and never merged incrementally. A committed prediction
//! becomes visible here eventually, not atomically with the commit, so
//! the session store only signals staleness and consumers re-read on
//! their own schedule.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::application::session::{SessionService, SubscriptionId};
use crate::domain::HistoryEntry;
use crate::ports::ScoringService;
use crate::{GlycoscopeError, Result};

/// Local reflection of the remote log at the last refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryMirror {
    /// Entries in the order the service returned them (chronologically
    /// ascending).
    pub entries: Vec<HistoryEntry>,
    /// Total entries the service has logged.
    pub total: u64,
    pub synced_at: Option<DateTime<Utc>>,
}

impl HistoryMirror {
    /// An empty log is a valid terminal state, not an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Read-through, invalidate-on-signal cache of the remote log.
pub struct HistoryLedger<C: ScoringService> {
    client: Arc<C>,
    mirror: Mutex<HistoryMirror>,
    stale: AtomicBool,
}

impl<C: ScoringService> HistoryLedger<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            mirror: Mutex::new(HistoryMirror::default()),
            // Nothing mirrored yet, so the first consumer read fetches.
            stale: AtomicBool::new(true),
        }
    }

    /// Mark the mirror out of date. Called from the session store's
    /// revision signal; performs no fetch of its own.
    pub fn invalidate(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    /// Re-read the remote log and replace the mirror wholesale.
    ///
    /// # Errors
    /// `GlycoscopeError::Scoring` if the read fails; the previous mirror
    /// stays in place in that case.
    pub fn refresh(&self, limit: usize) -> Result<HistoryMirror> {
        let page = self.client.read_history(limit)?;
        let mirror = HistoryMirror {
            entries: page.entries,
            total: page.total,
            synced_at: Some(Utc::now()),
        };

        let mut guard = self
            .mirror
            .lock()
            .map_err(|_| GlycoscopeError::State("history mirror poisoned".to_string()))?;
        *guard = mirror.clone();
        self.stale.store(false, Ordering::SeqCst);

        tracing::debug!(
            "History mirror refreshed: {} of {} entries",
            mirror.entries.len(),
            mirror.total
        );
        Ok(mirror)
    }

    /// Refresh only if a revision signal (or nothing-yet-mirrored) marked
    /// the mirror stale.
    ///
    /// # Errors
    /// Same as [`refresh`](Self::refresh).
    pub fn refresh_if_stale(&self, limit: usize) -> Result<Option<HistoryMirror>> {
        if self.is_stale() {
            self.refresh(limit).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Clear the remote log, then refresh the mirror.
    ///
    /// # Errors
    /// `GlycoscopeError::Scoring` if either step fails.
    pub fn clear(&self, limit: usize) -> Result<HistoryMirror> {
        self.client.clear_history()?;
        tracing::info!("Remote prediction log cleared");
        self.refresh(limit)
    }

    /// Copy of the current mirror.
    #[must_use]
    pub fn snapshot(&self) -> HistoryMirror {
        self.mirror.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Subscribe a ledger to the store's revision signal: every
    /// successful commit marks the mirror stale.
    pub fn attach(ledger: &Arc<Self>, session: &SessionService<C>) -> SubscriptionId
    where
        C: 'static,
    {
        let ledger = Arc::clone(ledger);
        session.subscribe(move |snapshot| {
            tracing::debug!(
                "History mirror invalidated by revision {}",
                snapshot.revision
            );
            ledger.invalidate();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Classification, ConfidenceLevel};
    use crate::testing::{draft, history_page, prediction, StubScoring};

    #[test]
    fn test_refresh_replaces_wholesale() {
        let stub = Arc::new(
            StubScoring::default().with_history(history_page(&[(0.67, true), (0.12, false)])),
        );
        let ledger = HistoryLedger::new(stub.clone());

        assert!(ledger.is_stale());
        let mirror = ledger.refresh(20).unwrap();
        assert_eq!(mirror.entries.len(), 2);
        assert_eq!(mirror.total, 2);
        assert!(!ledger.is_stale());

        // A shorter remote log replaces, never merges.
        stub.set_history(history_page(&[(0.4, false)]));
        let mirror = ledger.refresh(20).unwrap();
        assert_eq!(mirror.entries.len(), 1);
        assert_eq!(ledger.snapshot().total, 1);
    }

    #[test]
    fn test_empty_log_is_valid() {
        let stub = Arc::new(StubScoring::default().with_history(history_page(&[])));
        let ledger = HistoryLedger::new(stub);

        let mirror = ledger.refresh(20).unwrap();
        assert!(mirror.is_empty());
        assert!(mirror.entries.is_empty());
        assert!(mirror.synced_at.is_some());
    }

    #[test]
    fn test_clear_calls_remote_then_refreshes() {
        let stub = Arc::new(
            StubScoring::default().with_history(history_page(&[(0.67, true), (0.12, false)])),
        );
        let ledger = HistoryLedger::new(stub.clone());
        ledger.refresh(20).unwrap();

        let mirror = ledger.clear(20).unwrap();
        assert_eq!(stub.clear_calls(), 1);
        assert!(mirror.is_empty());
        assert!(ledger.snapshot().entries.is_empty());
    }

    #[test]
    fn test_refresh_if_stale_only_fetches_when_signaled() {
        let stub = Arc::new(StubScoring::default().with_history(history_page(&[(0.5, true)])));
        let ledger = HistoryLedger::new(stub.clone());

        assert!(ledger.refresh_if_stale(20).unwrap().is_some());
        let reads = stub.history_reads();
        assert!(ledger.refresh_if_stale(20).unwrap().is_none());
        assert_eq!(stub.history_reads(), reads);

        ledger.invalidate();
        assert!(ledger.refresh_if_stale(20).unwrap().is_some());
        assert_eq!(stub.history_reads(), reads + 1);
    }

    #[test]
    fn test_attach_invalidates_on_commit() {
        let stub = Arc::new(
            StubScoring::returning(prediction(
                Classification::Diabetic,
                0.67,
                67,
                ConfidenceLevel::High,
            ))
            .with_history(history_page(&[])),
        );
        let session = SessionService::new(stub.clone());
        let ledger = Arc::new(HistoryLedger::new(stub));
        HistoryLedger::attach(&ledger, &session);

        ledger.refresh(20).unwrap();
        assert!(!ledger.is_stale());

        session.commit(&draft([2.0, 130.0, 70.0, 28.5, 45.0])).unwrap();
        assert!(ledger.is_stale());
    }
}
