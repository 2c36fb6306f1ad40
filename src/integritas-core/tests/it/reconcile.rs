//! End-to-end reconciliation scenarios through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use integritas_core::status::status_response;
use integritas_core::{
    AdapterError, EnvelopeStatus, PollClock, PollingReconciler, RawRecord, ReconcileConfig,
    StatusBackend, UidState,
};

/// Backend that replays scripted round outcomes.
struct ScriptedBackend {
    rounds: Mutex<Vec<Result<Vec<RawRecord>, AdapterError>>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    fn new(rounds: Vec<Result<Vec<RawRecord>, AdapterError>>) -> Self {
        Self {
            rounds: Mutex::new(rounds),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl StatusBackend for ScriptedBackend {
    async fn fetch_batch(&self, _uids: &[String]) -> Result<Vec<RawRecord>, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut rounds = self.rounds.lock().unwrap();
        assert!(!rounds.is_empty(), "backend called more times than scripted");
        rounds.remove(0)
    }
}

/// Clock that never sleeps.
struct NoopClock;

#[async_trait]
impl PollClock for NoopClock {
    async fn sleep(&self, _duration: Duration) {}
}

fn record(uid: &str, status: bool, onchain: bool, proof: Option<&str>) -> RawRecord {
    RawRecord {
        uid: uid.into(),
        status,
        onchain,
        proof: proof.map(str::to_string),
        error: None,
        data: None,
        number: if onchain { Some(201) } else { None },
        root: None,
        address: None,
        datecreated: Some("2025-09-02 07:37:15".into()),
        datestamped: if onchain {
            Some("2025-09-02 07:38:03".into())
        } else {
            None
        },
    }
}

fn uids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn config(rounds: u32) -> ReconcileConfig {
    ReconcileConfig {
        max_rounds: rounds,
        poll_interval: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn mixed_batch_reaches_all_success_and_shapes_envelope() {
    // Round 1: A on chain, B still pending. Round 2: B on chain.
    let backend = ScriptedBackend::new(vec![
        Ok(vec![
            record("A", true, true, Some("0x0001")),
            record("B", true, false, None),
        ]),
        Ok(vec![record("B", true, true, Some("0x0002"))]),
    ]);
    let clock = NoopClock;
    let reconciler = PollingReconciler::new(&backend, &clock, config(6));

    let states = reconciler.reconcile(&uids(&["A", "B"])).await;

    assert_eq!(states.len(), 2);
    assert!(states.iter().all(|s| matches!(s, UidState::Success(_))));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);

    let response = status_response(&states, "req-42");
    assert_eq!(response.request_id, "req-42");
    assert_eq!(
        response.structured_content.status,
        Some(EnvelopeStatus::Finalized)
    );
    assert_eq!(
        response.summary.as_deref(),
        Some("2 confirmed, 0 pending, 0 failed")
    );
}

#[tokio::test]
async fn exhausted_budget_reports_pending_envelope() {
    let backend = ScriptedBackend::new(vec![
        Ok(vec![record("X", true, false, None)]),
        Ok(vec![record("X", true, false, None)]),
        Ok(vec![record("X", true, false, None)]),
    ]);
    let clock = NoopClock;
    let reconciler = PollingReconciler::new(&backend, &clock, config(3));

    let states = reconciler.reconcile(&uids(&["X"])).await;

    assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    assert!(matches!(states[0], UidState::Pending { .. }));

    let response = status_response(&states, "req-43");
    assert_eq!(
        response.structured_content.status,
        Some(EnvelopeStatus::Pending)
    );
}

#[tokio::test]
async fn batch_failure_mid_flight_produces_failed_envelope() {
    let backend = ScriptedBackend::new(vec![
        Ok(vec![
            record("A", true, true, Some("0x0001")),
            record("B", true, false, None),
        ]),
        Err(AdapterError::Transient {
            message: "Upstream request failed with status 502".into(),
        }),
    ]);
    let clock = NoopClock;
    let reconciler = PollingReconciler::new(&backend, &clock, config(6));

    let states = reconciler.reconcile(&uids(&["A", "B"])).await;

    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    assert!(matches!(
        states.iter().find(|s| s.uid() == "A").unwrap(),
        UidState::Success(_)
    ));
    match states.iter().find(|s| s.uid() == "B").unwrap() {
        UidState::Error { message, .. } => assert!(message.contains("502")),
        other => panic!("expected Error for B, got {other:?}"),
    }

    let response = status_response(&states, "req-44");
    assert_eq!(
        response.structured_content.status,
        Some(EnvelopeStatus::Failed)
    );
    assert_eq!(
        response.summary.as_deref(),
        Some("1 confirmed, 0 pending, 1 failed")
    );
}

#[tokio::test]
async fn proof_error_marker_fails_immediately() {
    let backend = ScriptedBackend::new(vec![Ok(vec![record("A", true, false, Some("ERROR"))])]);
    let clock = NoopClock;
    let reconciler = PollingReconciler::new(&backend, &clock, config(6));

    let states = reconciler.reconcile(&uids(&["A"])).await;

    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    match &states[0] {
        UidState::Error { message, .. } => assert_eq!(message, "Proof error"),
        other => panic!("expected Error, got {other:?}"),
    }
}
