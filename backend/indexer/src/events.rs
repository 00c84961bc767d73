//! Canonical event types emitted by the confidential ledger contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/confidential_ledger/src/events.rs`.  Event payloads on-chain
//! carry ciphertext handles, never plaintext amounts, so the indexer stores
//! handles (hex-encoded) plus whatever public metadata the event exposes.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the confidential ledger contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A new project was registered (`created` topic).
    ProjectCreated,
    /// A contribution was recorded (`contrib` topic).
    ContributionReceived,
    /// Finalization was requested and a decryption is pending (`fin_req` topic).
    FinalizeRequested,
    /// A project reached a terminal status (`finalized` topic).
    ProjectFinalized,
    /// The raised total was released to the creator (`withdrawn` topic).
    FundsWithdrawn,
    /// A contributor reclaimed their amount from a failed project (`refunded` topic).
    ContributionRefunded,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::ProjectCreated,
            "contrib" => Self::ContributionReceived,
            "fin_req" => Self::FinalizeRequested,
            "finalized" => Self::ProjectFinalized,
            "withdrawn" => Self::FundsWithdrawn,
            "refunded" => Self::ContributionRefunded,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectCreated => "project_created",
            Self::ContributionReceived => "contribution_received",
            Self::FinalizeRequested => "finalize_requested",
            Self::ProjectFinalized => "project_finalized",
            Self::FundsWithdrawn => "funds_withdrawn",
            Self::ContributionRefunded => "contribution_refunded",
            Self::Unknown => "unknown",
        }
    }
}

/// A fully decoded ledger event, ready to be stored in the database.
///
/// `amount_handle` is the hex-encoded ciphertext handle from the payload.
/// `detail` carries the kind-specific public scalar: the backer count for
/// contributions, the request id for finalize requests, and the terminal
/// status for finalizations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub event_type: String,
    pub project_id: Option<String>,
    pub actor: Option<String>,
    pub amount_handle: Option<String>,
    pub detail: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_type: String,
    pub project_id: Option<String>,
    pub actor: Option<String>,
    pub amount_handle: Option<String>,
    pub detail: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}
