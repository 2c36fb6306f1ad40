//! # integritas-core
//!
//! Core adapter logic for the Integritas MCP server - the bridge between
//! MCP tool calls and the upstream blockchain-timestamping API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Tool services                             │
//! │                                                              │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
//! │  │ stamp        │  │ status       │  │ verify       │      │
//! │  │ (hash->uid)  │  │ (uid->proof) │  │ (proof->ok)  │      │
//! │  └──────────────┘  └──────┬───────┘  └──────────────┘      │
//! │                           │                                  │
//! │                           ▼                                  │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │              PollingReconciler                    │      │
//! │  │   (per-UID state map, round budget, poll delay)     │      │
//! │  └──────────────────────────────────────────────────┘      │
//! │                           │                                  │
//! │                           ▼                                  │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │              UpstreamClient                       │      │
//! │  │      (batch status, stamp, verify, health)       │      │
//! │  └──────────────────────────────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reconciliation Properties
//!
//! - **Complete**: every requested UID appears exactly once in the result
//! - **Monotonic**: a UID that reached Success or Error is never revisited
//! - **Honest timeouts**: a UID still unconfirmed when the round budget is
//!   exhausted is returned as Pending, not as a failure
//! - **Batch failure escalation**: a failed polling round turns every
//!   still-unresolved UID into an Error carrying the failure detail

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)] // Allow Type in module::Type
#![allow(clippy::must_use_candidate)] // Not all functions need must_use

pub mod classify;
pub mod config;
pub mod envelope;
pub mod error;
pub mod hash;
pub mod health;
pub mod reconcile;
pub mod secrets;
pub mod stamp;
pub mod status;
pub mod types;
pub mod upstream;
pub mod verify;

pub use classify::classify;
pub use config::Settings;
pub use envelope::{
    generate_request_id, utc_iso, EnvelopeStatus, ToolLink, ToolResponse, ToolResultEnvelopeV1,
};
pub use error::AdapterError;
pub use hash::normalize_hash;
pub use health::{check_readiness, HealthReport, HealthStatus};
pub use reconcile::{PollClock, PollingReconciler, ReconcileConfig, StatusBackend, SystemClock};
pub use secrets::ApiKeyStore;
pub use stamp::{perform_stamp, StampReceipt};
pub use status::perform_stamp_status;
pub use types::{OnchainStamp, RawRecord, UidState};
pub use upstream::{RequestContext, UpstreamClient};
pub use verify::{perform_verify, VerifyOutcome};
