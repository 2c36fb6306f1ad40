//! Classification of raw upstream records into UID states.
//!
//! The four rules below are exhaustive and mutually exclusive over the
//! validated record shape. A record the upstream failed to populate
//! deserializes with `status: false` and lands in rule 1 with a diagnostic
//! message, so one malformed record never aborts the rest of the batch.

use crate::types::{OnchainStamp, RawRecord, UidState};

/// Marker value upstream uses in `proof` to signal proof-generation failure.
const PROOF_ERROR_MARKER: &str = "ERROR";

/// Classify one raw per-UID record.
///
/// Rules, in order:
/// 1. `status == false` -> Error (upstream rejects or does not know the UID)
/// 2. `onchain == true` -> Success with the full attestation payload
/// 3. `proof == "ERROR"` -> Error (proof-generation failure)
/// 4. otherwise -> Pending (accepted, awaiting confirmation)
///
/// Pure function: classifying the same record twice yields the same state.
pub fn classify(record: &RawRecord) -> UidState {
    if !record.status {
        return UidState::Error {
            uid: record.uid.clone(),
            message: record
                .error
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string()),
        };
    }

    if record.onchain {
        return UidState::Success(OnchainStamp::from_record(record));
    }

    if record.proof.as_deref() == Some(PROOF_ERROR_MARKER) {
        return UidState::Error {
            uid: record.uid.clone(),
            message: record
                .error
                .clone()
                .unwrap_or_else(|| "Proof error".to_string()),
        };
    }

    UidState::Pending {
        uid: record.uid.clone(),
        created_at: record.datecreated.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(uid: &str) -> RawRecord {
        RawRecord {
            uid: uid.into(),
            status: true,
            onchain: false,
            proof: None,
            error: None,
            data: None,
            number: None,
            root: None,
            address: None,
            datecreated: None,
            datestamped: None,
        }
    }

    #[test]
    fn test_status_false_is_error_with_upstream_message() {
        let mut rec = record("0xAB");
        rec.status = false;
        rec.error = Some("UID not found".into());

        match classify(&rec) {
            UidState::Error { uid, message } => {
                assert_eq!(uid, "0xAB");
                assert_eq!(message, "UID not found");
            },
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn test_status_false_without_message_gets_diagnostic() {
        let mut rec = record("0xAB");
        rec.status = false;

        match classify(&rec) {
            UidState::Error { message, .. } => assert_eq!(message, "Unknown error"),
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn test_onchain_is_success_with_payload() {
        let mut rec = record("0xAB");
        rec.onchain = true;
        rec.number = Some(201);
        rec.root = Some("0xEE0E".into());
        rec.datestamped = Some("2025-09-02 07:38:03".into());

        match classify(&rec) {
            UidState::Success(stamp) => {
                assert_eq!(stamp.uid, "0xAB");
                assert_eq!(stamp.number, Some(201));
                assert_eq!(stamp.root.as_deref(), Some("0xEE0E"));
            },
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[test]
    fn test_proof_error_marker_is_error() {
        let mut rec = record("0xAB");
        rec.proof = Some("ERROR".into());

        match classify(&rec) {
            UidState::Error { message, .. } => assert_eq!(message, "Proof error"),
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn test_proof_error_prefers_upstream_message() {
        let mut rec = record("0xAB");
        rec.proof = Some("ERROR".into());
        rec.error = Some("proof generation failed".into());

        match classify(&rec) {
            UidState::Error { message, .. } => assert_eq!(message, "proof generation failed"),
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn test_accepted_not_onchain_is_pending() {
        let mut rec = record("0xAB");
        rec.proof = Some("0x0001".into());
        rec.datecreated = Some("2025-09-02 07:37:15".into());

        match classify(&rec) {
            UidState::Pending { uid, created_at } => {
                assert_eq!(uid, "0xAB");
                assert_eq!(created_at.as_deref(), Some("2025-09-02 07:37:15"));
            },
            other => panic!("expected Pending, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_is_idempotent() {
        let mut rec = record("0xAB");
        rec.onchain = true;
        assert_eq!(classify(&rec), classify(&rec));

        rec.onchain = false;
        rec.status = false;
        assert_eq!(classify(&rec), classify(&rec));
    }
}
