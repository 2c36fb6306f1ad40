//! Wire types for upstream per-UID status records and their classified
//! states.
//!
//! The upstream batch-status endpoint answers with one raw JSON record per
//! UID. Deserialization into [`RawRecord`] happens at the client boundary so
//! the classifier operates on a validated shape instead of probing dynamic
//! JSON for field presence.

use serde::{Deserialize, Serialize};

/// One raw per-UID record as returned by the upstream batch-status call.
///
/// Only `uid` is mandatory; every other field is defaulted so a partially
/// populated record still deserializes and gets classified (a record with a
/// defaulted `status: false` surfaces as an Error rather than aborting the
/// whole batch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Correlation identifier for the stamping operation.
    pub uid: String,
    /// Whether the upstream recognizes the UID at all. `false` means the
    /// UID is unknown or the operation failed.
    #[serde(default)]
    pub status: bool,
    /// Whether the stamp has a confirmed blockchain attestation.
    #[serde(default)]
    pub onchain: bool,
    /// Proof data. The literal string `"ERROR"` marks a proof-generation
    /// failure (a distinct upstream failure mode).
    #[serde(default)]
    pub proof: Option<String>,
    /// Error detail supplied by the upstream, if any.
    #[serde(default)]
    pub error: Option<String>,
    /// The stamped hash.
    #[serde(default)]
    pub data: Option<String>,
    /// Block number of the attestation.
    #[serde(default)]
    pub number: Option<u64>,
    /// Merkle root of the attestation.
    #[serde(default)]
    pub root: Option<String>,
    /// On-chain address of the attestation.
    #[serde(default)]
    pub address: Option<String>,
    /// When the stamp request was created (upstream-formatted timestamp).
    #[serde(default)]
    pub datecreated: Option<String>,
    /// When the stamp landed on chain (upstream-formatted timestamp).
    #[serde(default)]
    pub datestamped: Option<String>,
}

/// Full on-chain attestation payload carried by a successful UID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnchainStamp {
    /// Correlation identifier.
    pub uid: String,
    /// The stamped hash.
    pub data: Option<String>,
    /// Block number of the attestation.
    pub number: Option<u64>,
    /// Merkle root of the attestation.
    pub root: Option<String>,
    /// Proof data.
    pub proof: Option<String>,
    /// On-chain address.
    pub address: Option<String>,
    /// When the stamp request was created.
    pub created_at: Option<String>,
    /// When the stamp landed on chain.
    pub stamped_at: Option<String>,
}

impl OnchainStamp {
    /// Extract the attestation fields from a raw record.
    pub fn from_record(record: &RawRecord) -> Self {
        Self {
            uid: record.uid.clone(),
            data: record.data.clone(),
            number: record.number,
            root: record.root.clone(),
            proof: record.proof.clone(),
            address: record.address.clone(),
            created_at: record.datecreated.clone(),
            stamped_at: record.datestamped.clone(),
        }
    }
}

/// Classified state of one UID within a reconciliation request.
///
/// `Success` and `Error` are terminal; `Pending` may transition on a later
/// polling round or persist to the end of the round budget, in which case it
/// is the final answer (still-unconfirmed is not a failure).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UidState {
    /// Terminal: the stamp is confirmed on chain.
    Success(OnchainStamp),
    /// Non-terminal: the stamp is accepted but not yet confirmed.
    Pending {
        /// Correlation identifier.
        uid: String,
        /// When the stamp request was created, if known.
        created_at: Option<String>,
    },
    /// Terminal: the UID failed (unknown UID, proof failure, or a
    /// batch-level polling failure).
    Error {
        /// Correlation identifier.
        uid: String,
        /// Human-readable failure reason.
        message: String,
    },
}

impl UidState {
    /// The UID this state belongs to.
    pub fn uid(&self) -> &str {
        match self {
            Self::Success(stamp) => &stamp.uid,
            Self::Pending { uid, .. } | Self::Error { uid, .. } => uid,
        }
    }

    /// Whether this state is still awaiting confirmation.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Whether this state is terminal (Success or Error).
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// Initial state for a freshly requested UID.
    pub fn initial(uid: &str) -> Self {
        Self::Pending {
            uid: uid.to_string(),
            created_at: None,
        }
    }
}
