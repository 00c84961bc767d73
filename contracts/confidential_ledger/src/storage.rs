//! # Storage
//!
//! Typed helpers over the three Soroban storage tiers used by the ledger:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key            | Type            | Description                         |
//! |----------------|-----------------|-------------------------------------|
//! | `ProjectCount` | `u64`           | Auto-increment project ID counter   |
//! | `Engine`       | `Address`       | Homomorphic engine contract address |
//! | `Stats`        | `PlatformStats` | Project counts by status            |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                  | Type            | Description                    |
//! |----------------------|-----------------|--------------------------------|
//! | `ProjConfig(id)`     | `ProjectConfig` | Immutable project configuration|
//! | `ProjState(id)`      | `ProjectState`  | Mutable project state          |
//! | `Contrib(id, addr)`  | `Contribution`  | Per-(project, contributor) record |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! ## Temporary storage
//!
//! | Key                  | Type              | Description                  |
//! |----------------------|-------------------|------------------------------|
//! | `PendingFin(id)`     | `PendingFinalize` | Outstanding decryption request |
//!
//! A pending finalization is short-lived bookkeeping between the request and
//! its callback, so it lives in the temporary tier and is removed explicitly
//! on completion.
//!
//! Lookups return `Option`; the entry points map absence onto their own
//! error codes so that `ProjectNotFound` and `NoContribution` stay
//! distinguishable.

use soroban_sdk::{contracttype, Address, Env};

use crate::types::{Contribution, PendingFinalize, PlatformStats, Project, ProjectConfig, ProjectState};

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

/// All contract storage keys.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Global auto-increment counter for project IDs (Instance).
    ProjectCount,
    /// Homomorphic engine contract address (Instance).
    Engine,
    /// Platform-wide status counters (Instance).
    Stats,
    /// Immutable project configuration keyed by ID (Persistent).
    ProjConfig(u64),
    /// Mutable project state keyed by ID (Persistent).
    ProjState(u64),
    /// Contribution record keyed by (project ID, contributor) (Persistent).
    Contrib(u64, Address),
    /// Outstanding finalization request keyed by project ID (Temporary).
    PendingFin(u64),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Atomically reads, increments, and stores the project counter.
/// Returns the ID to use for the *current* project (pre-increment value).
pub fn get_and_increment_project_id(env: &Env) -> u64 {
    bump_instance(env);
    let current: u64 = env
        .storage()
        .instance()
        .get(&DataKey::ProjectCount)
        .unwrap_or(0);
    env.storage()
        .instance()
        .set(&DataKey::ProjectCount, &(current + 1));
    current
}

/// Store the homomorphic engine contract address. One-shot at `init`.
pub fn set_engine(env: &Env, engine: &Address) {
    env.storage().instance().set(&DataKey::Engine, engine);
    bump_instance(env);
}

/// Retrieve the homomorphic engine contract address, if initialised.
pub fn get_engine(env: &Env) -> Option<Address> {
    bump_instance(env);
    env.storage().instance().get(&DataKey::Engine)
}

/// Load the platform counters, defaulting to all-zero before first use.
pub fn load_stats(env: &Env) -> PlatformStats {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Stats)
        .unwrap_or_else(PlatformStats::zero)
}

/// Persist the platform counters.
pub fn save_stats(env: &Env, stats: &PlatformStats) {
    env.storage().instance().set(&DataKey::Stats, stats);
}

// ── Persistent Storage Helpers ───────────────────────────────────────

/// Extend the TTL for a persistent storage key.
fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Save both the immutable config and the initial mutable state for a new
/// project.
pub fn save_new_project(env: &Env, config: &ProjectConfig, state: &ProjectState) {
    let config_key = DataKey::ProjConfig(config.id);
    let state_key = DataKey::ProjState(config.id);

    env.storage().persistent().set(&config_key, config);
    env.storage().persistent().set(&state_key, state);
    bump_persistent(env, &config_key);
    bump_persistent(env, &state_key);
}

/// Load the public `Project` view by combining config and state.
pub fn load_project(env: &Env, id: u64) -> Option<Project> {
    let config = load_project_config(env, id)?;
    let state = load_project_state(env, id)?;
    Some(Project {
        id: config.id,
        creator: config.creator,
        title: config.title,
        description: config.description,
        category: config.category,
        deadline: config.deadline,
        created_at: config.created_at,
        status: state.status,
        funds_withdrawn: state.funds_withdrawn,
        backer_count: state.backer_count,
        metadata_hash: config.metadata_hash,
    })
}

/// Load only the immutable project configuration.
pub fn load_project_config(env: &Env, id: u64) -> Option<ProjectConfig> {
    let key = DataKey::ProjConfig(id);
    let config: Option<ProjectConfig> = env.storage().persistent().get(&key);
    if config.is_some() {
        bump_persistent(env, &key);
    }
    config
}

/// Load only the mutable project state.
pub fn load_project_state(env: &Env, id: u64) -> Option<ProjectState> {
    let key = DataKey::ProjState(id);
    let state: Option<ProjectState> = env.storage().persistent().get(&key);
    if state.is_some() {
        bump_persistent(env, &key);
    }
    state
}

/// Save only the mutable project state (the high-frequency write path).
pub fn save_project_state(env: &Env, id: u64, state: &ProjectState) {
    let key = DataKey::ProjState(id);
    env.storage().persistent().set(&key, state);
    bump_persistent(env, &key);
}

/// Load one contributor's record for a project.
pub fn load_contribution(env: &Env, project_id: u64, contributor: &Address) -> Option<Contribution> {
    let key = DataKey::Contrib(project_id, contributor.clone());
    let contribution: Option<Contribution> = env.storage().persistent().get(&key);
    if contribution.is_some() {
        bump_persistent(env, &key);
    }
    contribution
}

/// Save one contributor's record. Records are only ever created or updated
/// in place, never removed.
pub fn save_contribution(env: &Env, contribution: &Contribution) {
    let key = DataKey::Contrib(contribution.project_id, contribution.contributor.clone());
    env.storage().persistent().set(&key, contribution);
    bump_persistent(env, &key);
}

// ── Temporary Storage Helpers ────────────────────────────────────────

/// Load the outstanding finalization request for a project, if any.
pub fn load_pending_finalize(env: &Env, project_id: u64) -> Option<PendingFinalize> {
    env.storage()
        .temporary()
        .get(&DataKey::PendingFin(project_id))
}

/// Record an outstanding finalization request.
pub fn save_pending_finalize(env: &Env, project_id: u64, pending: &PendingFinalize) {
    env.storage()
        .temporary()
        .set(&DataKey::PendingFin(project_id), pending);
}

/// Remove the outstanding finalization request once its callback landed.
pub fn clear_pending_finalize(env: &Env, project_id: u64) {
    env.storage()
        .temporary()
        .remove(&DataKey::PendingFin(project_id));
}
