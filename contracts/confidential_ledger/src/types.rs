//! # Types
//!
//! Shared data structures used across all modules of the confidential ledger.
//!
//! ## Design decisions
//!
//! ### Config / State split
//!
//! A `Project` is internally stored as two separate ledger entries:
//!
//! - [`ProjectConfig`] — written once at creation; never mutated.
//! - [`ProjectState`] — written on every contribution and on finalization.
//!
//! The public API exposes the reconstructed [`Project`] struct, which carries
//! only plaintext metadata. Encrypted fields are reachable solely through
//! `get_project_amounts`, which is authorization-gated.
//!
//! ### Status as a Finite-State Machine
//!
//! [`ProjectStatus`] enforces a strict forward-only lifecycle:
//!
//! ```text
//! Active ──► Successful ──► Withdrawn
//!     └────► Failed
//! ```
//!
//! All transitions go through [`ProjectStatus::transition`], a pure function
//! that pattern-matches on `(current, event)` and rejects every illegal pair.
//! No entry point mutates the status directly.
//!
//! ### Encrypted values carry their capability set
//!
//! An [`EncryptedValue`] is a ciphertext handle plus the list of principals
//! that were granted decryption on it. Bare handles (`BytesN<32>`) returned
//! by engine operations have no capabilities; only `permissions::seal` turns
//! a handle into a storable `EncryptedValue`, so a value that reached storage
//! has by construction been granted to the ledger and its intended holders.

use soroban_sdk::{contracttype, Address, BytesN, String, Vec};

/// Lifecycle status of a project.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProjectStatus {
    /// Accepting contributions; deadline not yet evaluated.
    Active,
    /// Deadline passed and the private comparison `current >= target` held.
    Successful,
    /// Deadline passed and the target was not reached.
    Failed,
    /// Raised funds released to the creator. Final.
    Withdrawn,
}

/// Events that may drive a status transition.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StatusEvent {
    /// Finalization decrypted the goal comparison to true.
    GoalMet,
    /// Finalization decrypted the goal comparison to false.
    GoalMissed,
    /// The creator withdrew the raised funds.
    Withdraw,
}

/// Why a status transition was rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransitionError {
    /// Finalization attempted on a project that is no longer `Active`.
    AlreadyFinalized,
    /// Withdrawal attempted on a project that is not `Successful`.
    NotSuccessful,
}

impl ProjectStatus {
    /// Compute the successor status for `event`, or reject the pair.
    ///
    /// This is the only place transition legality is encoded; callers map
    /// [`TransitionError`] onto their own error codes.
    pub fn transition(&self, event: StatusEvent) -> Result<ProjectStatus, TransitionError> {
        match (self, event) {
            (ProjectStatus::Active, StatusEvent::GoalMet) => Ok(ProjectStatus::Successful),
            (ProjectStatus::Active, StatusEvent::GoalMissed) => Ok(ProjectStatus::Failed),
            (ProjectStatus::Successful, StatusEvent::Withdraw) => Ok(ProjectStatus::Withdrawn),
            (_, StatusEvent::Withdraw) => Err(TransitionError::NotSuccessful),
            (_, _) => Err(TransitionError::AlreadyFinalized),
        }
    }

    /// True once no further finalization transition is possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProjectStatus::Active)
    }
}

/// An opaque ciphertext handle together with the principals granted
/// decryption on it.
///
/// The handle is produced by the external homomorphic engine and is never a
/// plaintext. `capabilities` mirrors the engine-side ACL so that readers can
/// see (and tests can assert) who may decrypt without calling out to the
/// engine.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncryptedValue {
    pub handle: BytesN<32>,
    pub capabilities: Vec<Address>,
}

impl EncryptedValue {
    /// True if `principal` was granted decryption on this value.
    pub fn can_decrypt(&self, principal: &Address) -> bool {
        self.capabilities.contains(principal)
    }
}

/// Presence marker for an encrypted running total.
///
/// `Option<EncryptedValue>` cannot cross the contract ABI, so absence is
/// modelled as an explicit variant instead. A total is `None` until the
/// first contribution lands; absence being structural rather than a
/// sentinel ciphertext is also what lets an empty project finalize without
/// a decryption round-trip.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MaybeEncrypted {
    None,
    Some(EncryptedValue),
}

impl MaybeEncrypted {
    /// Borrow-free view as a plain `Option`, for callers outside storage.
    pub fn to_option(&self) -> Option<EncryptedValue> {
        match self {
            MaybeEncrypted::None => None,
            MaybeEncrypted::Some(value) => Some(value.clone()),
        }
    }
}

/// Immutable project configuration, written once at creation.
///
/// `target_amount` is encrypted at creation and never changes; its
/// capability set is {ledger, creator}.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectConfig {
    pub id: u64,
    pub creator: Address,
    pub title: String,
    pub description: String,
    pub category: String,
    pub target_amount: EncryptedValue,
    pub deadline: u64,
    pub created_at: u64,
    pub metadata_hash: BytesN<32>,
}

/// Mutable project state, updated on contributions, finalization and
/// withdrawal.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectState {
    /// Encrypted running total; [`MaybeEncrypted::None`] until the first
    /// contribution lands.
    pub current_amount: MaybeEncrypted,
    pub status: ProjectStatus,
    pub funds_withdrawn: bool,
    pub backer_count: u32,
}

/// Public view of a project: plaintext metadata only.
///
/// Reconstructed from the split `ProjectConfig` + `ProjectState` entries.
/// Encrypted amounts are deliberately absent; see [`ProjectAmounts`].
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Project {
    /// Unique identifier (auto-incremented).
    pub id: u64,
    /// Address that created the project and may withdraw on success.
    pub creator: Address,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Ledger timestamp after which the project may be finalized.
    pub deadline: u64,
    pub created_at: u64,
    /// Current lifecycle status.
    pub status: ProjectStatus,
    pub funds_withdrawn: bool,
    /// Number of distinct contributors.
    pub backer_count: u32,
    /// Content hash of off-chain project metadata.
    pub metadata_hash: BytesN<32>,
}

/// Encrypted amount handles for a project, returned only to the creator or
/// a past contributor.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectAmounts {
    pub project_id: u64,
    pub target_amount: EncryptedValue,
    pub current_amount: MaybeEncrypted,
}

/// One contributor's record for one project, keyed by
/// `(project_id, contributor)`.
///
/// Repeat contributions are summed homomorphically into `amount`
/// (cumulative policy). The record is never deleted: `refunded` flips to
/// true at most once, which is the double-refund guard.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Contribution {
    pub project_id: u64,
    pub contributor: Address,
    pub amount: EncryptedValue,
    /// Timestamp of the most recent contribution.
    pub timestamp: u64,
    pub refunded: bool,
    pub message: Option<String>,
}

/// A decryption request issued by `request_finalize` and still awaiting its
/// engine callback.
///
/// `request_id` ties the eventual `complete_finalize` call to this exact
/// request; a callback carrying any other id is ignored. `requested_at`
/// drives stale-request recovery.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingFinalize {
    pub request_id: u64,
    pub requested_at: u64,
}

/// Outcome of `request_finalize`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FinalizeOutcome {
    /// A decryption request was issued (or is still outstanding); the status
    /// transition happens in `complete_finalize`.
    Pending(u64),
    /// The project finalized synchronously (no contributions to compare).
    Finalized(ProjectStatus),
}

/// Platform-wide project counts by status.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlatformStats {
    pub total_projects: u64,
    pub active: u64,
    pub successful: u64,
    pub failed: u64,
    pub withdrawn: u64,
}

impl PlatformStats {
    pub fn zero() -> Self {
        PlatformStats {
            total_projects: 0,
            active: 0,
            successful: 0,
            failed: 0,
            withdrawn: 0,
        }
    }
}
