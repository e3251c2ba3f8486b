//! Session state store: the single source of truth for the current
//! screening input and its prediction.
//!
//! A commit validates the candidate input, scores it remotely, and only
//! then installs the new canonical pair under a bumped revision. Dependent
//! views subscribe to learn about new revisions and stamp their own
//! fetches with the revision active at issue time.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::domain::{HealthMetrics, MetricsDraft, Prediction};
use crate::ports::ScoringService;
use crate::{GlycoscopeError, Result};

/// Monotonic counter identifying the canonical session state.
///
/// Revision 0 means "no commit yet".
pub type Revision = u64;

/// A payload tagged with the revision active when its fetch was issued.
///
/// On arrival, consumers compare the stamp against the store's current
/// revision and drop the payload if the session has moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamped<T> {
    pub revision: Revision,
    pub value: T,
}

impl<T> Stamped<T> {
    pub fn new(revision: Revision, value: T) -> Self {
        Self { revision, value }
    }
}

/// The canonical (input, result, revision) triple.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub revision: Revision,
    pub input: HealthMetrics,
    pub result: Prediction,
    pub committed_at: DateTime<Utc>,
}

/// Handle for removing a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type SubscriberFn = dyn Fn(&SessionSnapshot) + Send + Sync;

#[derive(Default)]
struct SubscriberRegistry {
    next_id: u64,
    entries: Vec<(SubscriptionId, Arc<SubscriberFn>)>,
}

#[derive(Default)]
struct SessionState {
    revision: Revision,
    current: Option<SessionSnapshot>,
}

/// Single-owner store for the canonical prediction session.
///
/// There is exactly one live pair at a time; committed history lives in
/// the separate history ledger, never here.
pub struct SessionService<C: ScoringService> {
    client: Arc<C>,
    session_id: String,
    /// Serializes whole commits: validate, score and install never
    /// interleave between two callers.
    commit_gate: Mutex<()>,
    state: Mutex<SessionState>,
    subscribers: Mutex<SubscriberRegistry>,
}

impl<C: ScoringService> SessionService<C> {
    /// Create a store bound to a scoring client.
    pub fn new(client: Arc<C>) -> Self {
        let session_id = uuid_v4();
        tracing::info!("Session {} opened", session_id);
        Self {
            client,
            session_id,
            commit_gate: Mutex::new(()),
            state: Mutex::new(SessionState::default()),
            subscribers: Mutex::new(SubscriberRegistry::default()),
        }
    }

    /// Correlation id for this session, used in logs only.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Validate and score a candidate input, then install it as the new
    /// canonical pair.
    ///
    /// Commits are processed to completion one at a time. On success the
    /// revision advances by one and subscribers are notified synchronously
    /// with the new snapshot. On any failure the previous canonical pair
    /// stays untouched.
    ///
    /// # Errors
    /// `GlycoscopeError::Validation` if the draft fails local validation
    /// (the network is never reached in that case);
    /// `GlycoscopeError::Scoring` if the scoring service fails.
    pub fn commit(&self, draft: &MetricsDraft) -> Result<SessionSnapshot> {
        let _gate = self
            .commit_gate
            .lock()
            .map_err(|_| GlycoscopeError::State("commit gate poisoned".to_string()))?;

        let input = draft.validate()?;
        let result = self.client.predict(&input)?;

        let snapshot = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| GlycoscopeError::State("session state poisoned".to_string()))?;
            state.revision += 1;
            let snapshot = SessionSnapshot {
                revision: state.revision,
                input,
                result,
                committed_at: Utc::now(),
            };
            state.current = Some(snapshot.clone());
            snapshot
        };

        tracing::info!(
            "Session {} advanced to revision {}: {} (risk score {})",
            self.session_id,
            snapshot.revision,
            snapshot.result.classification,
            snapshot.result.risk_score
        );

        // Notify outside the state lock so callbacks can read `current()`.
        let callbacks: Vec<Arc<SubscriberFn>> = {
            let registry = self
                .subscribers
                .lock()
                .map_err(|_| GlycoscopeError::State("subscriber registry poisoned".to_string()))?;
            registry.entries.iter().map(|(_, cb)| cb.clone()).collect()
        };
        for callback in callbacks {
            callback(&snapshot);
        }

        Ok(snapshot)
    }

    /// Register a callback invoked synchronously on every successful
    /// commit.
    ///
    /// Callbacks run while the commit gate is held; a callback that
    /// commits would deadlock. Subscribers should only record the signal
    /// (e.g. mark a mirror stale) and fetch on their own schedule.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SessionSnapshot) + Send + Sync + 'static,
    {
        let mut registry = match self.subscribers.lock() {
            Ok(registry) => registry,
            Err(poisoned) => poisoned.into_inner(),
        };
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry.entries.push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscriber. Returns false if the id was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = match self.subscribers.lock() {
            Ok(registry) => registry,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = registry.entries.len();
        registry.entries.retain(|(entry_id, _)| *entry_id != id);
        registry.entries.len() < before
    }

    /// Read-only snapshot of the canonical pair; `None` before the first
    /// successful commit.
    #[must_use]
    pub fn current(&self) -> Option<SessionSnapshot> {
        self.state.lock().ok().and_then(|state| state.current.clone())
    }

    /// The current revision (0 before the first commit).
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.state.lock().map(|state| state.revision).unwrap_or(0)
    }

    /// Staleness predicate for stamped responses.
    #[must_use]
    pub fn is_current(&self, revision: Revision) -> bool {
        self.revision() == revision
    }
}

/// Generate a UUID v4 (random) correlation id using a CSPRNG.
///
/// ChaCha20 seeded from OS entropy, so ids are unpredictable on all
/// platforms.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}
