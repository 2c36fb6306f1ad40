//! Status-polling reconciliation engine.
//!
//! Given a batch of UIDs, the reconciler repeatedly queries the upstream
//! batch-status endpoint until every UID reaches a terminal state or the
//! round budget runs out. Each round issues exactly one batch call, so there
//! is no per-UID concurrency inside a reconciliation; independent
//! reconciliations share no mutable state by construction.
//!
//! ## State machine (per UID)
//!
//! ```text
//! Pending -> Success   (terminal, never revisited)
//! Pending -> Error     (terminal, never revisited)
//! Pending -> Pending   (up to the round budget, then returned as Pending)
//! ```
//!
//! The request payload carries the full original UID list every round, not
//! just the unresolved subset. This mirrors the observed upstream contract;
//! resolved UIDs are simply never re-applied to the state map.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::classify::classify;
use crate::error::AdapterError;
use crate::types::{RawRecord, UidState};

/// A capability that can fetch per-UID status records in one batch call.
///
/// Implementations perform exactly one network call per invocation and do
/// not retry internally - retry-via-polling is the reconciler's job.
#[async_trait]
pub trait StatusBackend: Send + Sync {
    /// Fetch the raw status records for the given UIDs.
    ///
    /// A non-2xx response or transport failure is a single batch-level
    /// failure reported through `Err`; per-UID failures come back as
    /// records inside `Ok`.
    async fn fetch_batch(&self, uids: &[String]) -> Result<Vec<RawRecord>, AdapterError>;
}

/// Clock used for the fixed inter-round delay.
///
/// Injectable so tests drive the reconciler without real time passing.
#[async_trait]
pub trait PollClock: Send + Sync {
    /// Suspend for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl PollClock for SystemClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Tunables for one reconciliation.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Maximum number of polling rounds.
    pub max_rounds: u32,
    /// Fixed delay between rounds. Not exponential: the upstream
    /// confirmation interval is roughly known, so a fixed wait keeps the
    /// worst-case duration predictable (`max_rounds × poll_interval`).
    pub poll_interval: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_rounds: 6,
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// The polling reconciler.
///
/// Owns the per-UID state map for the duration of one [`reconcile`] call;
/// holds no state across calls.
///
/// [`reconcile`]: PollingReconciler::reconcile
pub struct PollingReconciler<'a> {
    backend: &'a dyn StatusBackend,
    clock: &'a dyn PollClock,
    config: ReconcileConfig,
}

impl<'a> PollingReconciler<'a> {
    /// Create a reconciler over the given backend and clock.
    pub fn new(
        backend: &'a dyn StatusBackend,
        clock: &'a dyn PollClock,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            backend,
            clock,
            config,
        }
    }

    /// Poll the backend until every UID is terminal or the round budget is
    /// exhausted.
    ///
    /// Returns one state per requested UID (duplicates collapse to one
    /// entry). UIDs still unconfirmed at the end come back as `Pending`,
    /// never as errors. This method does not fail: batch-level failures are
    /// folded into per-UID `Error` states.
    #[instrument(skip(self, uids), fields(uid_count = uids.len()))]
    pub async fn reconcile(&self, uids: &[String]) -> Vec<UidState> {
        // Deduplicate while preserving request order for a deterministic
        // result shape; callers compare by UID, not position.
        let mut ordered: Vec<String> = Vec::with_capacity(uids.len());
        let mut states: HashMap<String, UidState> = HashMap::with_capacity(uids.len());
        for uid in uids {
            if !states.contains_key(uid) {
                states.insert(uid.clone(), UidState::initial(uid));
                ordered.push(uid.clone());
            }
        }

        if ordered.is_empty() {
            return Vec::new();
        }

        for round in 1..=self.config.max_rounds {
            match self.backend.fetch_batch(&ordered).await {
                Ok(records) => {
                    self.apply_round(&mut states, records, round);
                },
                Err(err) => {
                    warn!(round, error = %err, "status batch call failed");
                    escalate_unresolved(&mut states, &err.to_string());
                    break;
                },
            }

            // Stop condition is evaluated against the post-round state.
            let pending = states.values().filter(|s| s.is_pending()).count();
            if pending == 0 {
                debug!(round, "all UIDs resolved");
                break;
            }
            if round == self.config.max_rounds {
                debug!(pending, "round budget exhausted, returning pending UIDs as-is");
                break;
            }

            debug!(round, pending, "UIDs still pending, waiting before next round");
            self.clock.sleep(self.config.poll_interval).await;
        }

        ordered
            .iter()
            .filter_map(|uid| states.remove(uid))
            .collect()
    }

    /// Apply one round's classified records to the state map.
    ///
    /// Only UIDs currently `Pending` are updated; terminal states are never
    /// overwritten. Records for UIDs we never requested are ignored, and
    /// requested UIDs the response omits keep their state for this round.
    fn apply_round(
        &self,
        states: &mut HashMap<String, UidState>,
        records: Vec<RawRecord>,
        round: u32,
    ) {
        for record in records {
            match states.get_mut(&record.uid) {
                Some(slot) if slot.is_pending() => {
                    let next = classify(&record);
                    debug!(round, uid = %record.uid, terminal = next.is_terminal(), "UID classified");
                    *slot = next;
                },
                Some(_) => {
                    // Already terminal; per the state-machine contract this
                    // UID is never revisited.
                    debug!(round, uid = %record.uid, "ignoring record for resolved UID");
                },
                None => {
                    warn!(round, uid = %record.uid, "upstream returned record for unrequested UID");
                },
            }
        }
    }
}

/// Transition every still-pending UID to an error carrying the batch
/// failure detail. Already-resolved UIDs are left untouched.
fn escalate_unresolved(states: &mut HashMap<String, UidState>, detail: &str) {
    for state in states.values_mut() {
        if state.is_pending() {
            *state = UidState::Error {
                uid: state.uid().to_string(),
                message: format!("Status batch call failed: {detail}"),
            };
        }
    }
}
