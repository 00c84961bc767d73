//! # Confidential Contribution Ledger
//!
//! A funding ledger whose monetary amounts stay opaque to observers and to
//! the ledger itself. Contributions arrive as ciphertext handles produced by
//! an external homomorphic engine; the ledger aggregates them
//! homomorphically, compares the running total against a private target
//! after the deadline, and releases or refunds funds exactly once.
//!
//! | Phase        | Entry Point(s)                                   |
//! |--------------|--------------------------------------------------|
//! | Bootstrap    | [`ConfidentialLedger::init`]                     |
//! | Creation     | [`ConfidentialLedger::create_project`]           |
//! | Funding      | [`ConfidentialLedger::contribute`]               |
//! | Finalization | [`ConfidentialLedger::request_finalize`], [`ConfidentialLedger::complete_finalize`] |
//! | Distribution | [`ConfidentialLedger::withdraw`], [`ConfidentialLedger::request_refund`] |
//! | Queries      | `get_project`, `get_project_amounts`, `get_contribution`, `get_platform_stats` |
//!
//! ## Architecture
//!
//! Cryptography is fully delegated to the engine behind [`engine`]'s narrow
//! trait. Capability grants are fully delegated to [`permissions`]. Storage
//! access is fully delegated to [`storage`]. Status transitions are fully
//! delegated to the FSM in [`types`]. This file contains only the public
//! entry points, their validation order, and event emission.
//!
//! ## Atomicity
//!
//! Every entry point is one Soroban invocation: any panic rolls the whole
//! operation back, so there is no partial commit to reason about. The only
//! suspension point in the protocol is the decryption round-trip between
//! `request_finalize` and `complete_finalize`, which is bridged by a
//! pending-request record rather than by held state.

#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, panic_with_error, vec, Address, Bytes, BytesN, Env,
    String,
};

pub mod engine;
mod events;
mod permissions;
mod storage;
mod types;

#[cfg(any(test, feature = "testutils"))]
pub mod mock_engine;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_finalize;
#[cfg(test)]
mod test_permissions;

use engine::EngineFailure;
use types::StatusEvent;
pub use types::{
    Contribution, EncryptedValue, FinalizeOutcome, MaybeEncrypted, PendingFinalize, PlatformStats,
    Project, ProjectAmounts, ProjectStatus,
};

/// Minimum funding period: 7 days.
pub const MIN_FUNDING_PERIOD: u64 = 7 * 86_400;

/// How long an outstanding finalization request stays authoritative. After
/// this window a new `request_finalize` call supersedes it, which is the
/// recovery path for an engine that never delivered its callback.
pub const FINALIZE_RETRY_AFTER: u64 = 86_400;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    ValidationError = 3,
    ProofInvalid = 4,
    ZeroAmount = 5,
    CapabilityDenied = 6,
    ProjectNotFound = 7,
    ProjectNotActive = 8,
    DeadlineNotReached = 9,
    AlreadyFinalized = 10,
    NotCreator = 11,
    NotSuccessful = 12,
    AlreadyWithdrawn = 13,
    NotFailed = 14,
    AlreadyRefunded = 15,
    NoContribution = 16,
    Unauthorized = 17,
}

#[contract]
pub struct ConfidentialLedger;

#[contractimpl]
impl ConfidentialLedger {
    // ─────────────────────────────────────────────────────────
    // Bootstrap
    // ─────────────────────────────────────────────────────────

    /// Bind this ledger to its homomorphic engine contract.
    ///
    /// Must be called exactly once after deployment; subsequent calls fail
    /// with `AlreadyInitialized`. The engine address is also the only
    /// principal allowed to deliver decryption callbacks.
    pub fn init(env: Env, engine: Address) {
        if storage::get_engine(&env).is_some() {
            panic_with_error!(&env, Error::AlreadyInitialized);
        }
        storage::set_engine(&env, &engine);
    }

    // ─────────────────────────────────────────────────────────
    // Creation
    // ─────────────────────────────────────────────────────────

    /// Open a new project.
    ///
    /// - `target` / `target_proof` — the raw encrypted funding target and
    ///   its input proof. A proof that fails verification, or that certifies
    ///   a zero target, fails with `ValidationError`.
    /// - `funding_period` — seconds until the deadline; at least
    ///   [`MIN_FUNDING_PERIOD`].
    ///
    /// The sealed target is decryptable by the ledger and the creator.
    /// Returns the new project id.
    pub fn create_project(
        env: Env,
        creator: Address,
        title: String,
        description: String,
        category: String,
        target: Bytes,
        target_proof: Bytes,
        funding_period: u64,
        metadata_hash: BytesN<32>,
    ) -> u64 {
        creator.require_auth();
        let engine_addr = require_engine(&env);

        if title.len() == 0 {
            panic_with_error!(&env, Error::ValidationError);
        }
        if funding_period < MIN_FUNDING_PERIOD {
            panic_with_error!(&env, Error::ValidationError);
        }

        let target_handle =
            match engine::encrypt_with_proof(&env, &engine_addr, &target, &target_proof, &creator)
            {
                Ok(handle) => handle,
                // At creation both a bad proof and a zero target are
                // malformed input, not a funding-flow condition.
                Err(_) => panic_with_error!(&env, Error::ValidationError),
            };
        let target_amount =
            permissions::seal(&env, &engine_addr, target_handle, &vec![&env, creator.clone()]);

        let now = env.ledger().timestamp();
        let deadline = match now.checked_add(funding_period) {
            Some(deadline) => deadline,
            None => panic_with_error!(&env, Error::ValidationError),
        };
        let id = storage::get_and_increment_project_id(&env);

        let config = types::ProjectConfig {
            id,
            creator: creator.clone(),
            title,
            description,
            category,
            target_amount: target_amount.clone(),
            deadline,
            created_at: now,
            metadata_hash,
        };
        let state = types::ProjectState {
            current_amount: MaybeEncrypted::None,
            status: ProjectStatus::Active,
            funds_withdrawn: false,
            backer_count: 0,
        };
        storage::save_new_project(&env, &config, &state);

        let mut stats = storage::load_stats(&env);
        stats.total_projects += 1;
        stats.active += 1;
        storage::save_stats(&env, &stats);

        events::emit_project_created(&env, id, creator, config.deadline, target_amount.handle);
        id
    }

    // ─────────────────────────────────────────────────────────
    // Funding
    // ─────────────────────────────────────────────────────────

    /// Contribute an encrypted amount to an active project.
    ///
    /// Repeat contributions from the same contributor are summed
    /// homomorphically into one record (cumulative policy). Zero amounts are
    /// rejected at submission time: a valid input proof certifies a positive
    /// amount, so the engine refuses zero commitments.
    ///
    /// Capability grants performed here, per the double-grant rule:
    /// - the contribution record's amount: {ledger, contributor};
    /// - the project's new running total: {ledger, creator}.
    ///
    /// Returns the project's backer count after this contribution.
    pub fn contribute(
        env: Env,
        project_id: u64,
        contributor: Address,
        amount: Bytes,
        proof: Bytes,
        message: Option<String>,
    ) -> u32 {
        contributor.require_auth();
        let engine_addr = require_engine(&env);

        let config = load_config_or_panic(&env, project_id);
        let mut state = load_state_or_panic(&env, project_id);

        if state.status != ProjectStatus::Active {
            panic_with_error!(&env, Error::ProjectNotActive);
        }
        // Past the deadline the project no longer accepts funds, even if
        // nobody has called request_finalize yet.
        let now = env.ledger().timestamp();
        if now >= config.deadline {
            panic_with_error!(&env, Error::ProjectNotActive);
        }

        let fresh = encrypt_amount(&env, &engine_addr, &amount, &proof, &contributor);

        // Per-contributor record: create on first contribution, sum after.
        let contributor_caps = vec![&env, contributor.clone()];
        let contribution = match storage::load_contribution(&env, project_id, &contributor) {
            Some(existing) => {
                let summed =
                    engine::homomorphic_add(&env, &engine_addr, &existing.amount.handle, &fresh);
                Contribution {
                    project_id: existing.project_id,
                    contributor: existing.contributor,
                    amount: permissions::seal(&env, &engine_addr, summed, &contributor_caps),
                    timestamp: now,
                    refunded: existing.refunded,
                    message: message.or(existing.message),
                }
            }
            None => {
                state.backer_count += 1;
                Contribution {
                    project_id,
                    contributor: contributor.clone(),
                    amount: permissions::seal(&env, &engine_addr, fresh.clone(), &contributor_caps),
                    timestamp: now,
                    refunded: false,
                    message,
                }
            }
        };

        // Running total. The first contribution re-encrypts the input so the
        // project total and the contribution record never share a ciphertext.
        let creator_caps = vec![&env, config.creator.clone()];
        let new_total = match &state.current_amount {
            MaybeEncrypted::Some(current) => {
                engine::homomorphic_add(&env, &engine_addr, &current.handle, &fresh)
            }
            MaybeEncrypted::None => {
                encrypt_amount(&env, &engine_addr, &amount, &proof, &contributor)
            }
        };
        state.current_amount =
            MaybeEncrypted::Some(permissions::seal(&env, &engine_addr, new_total, &creator_caps));

        storage::save_contribution(&env, &contribution);
        storage::save_project_state(&env, project_id, &state);

        events::emit_contribution_received(
            &env,
            project_id,
            contributor,
            contribution.amount.handle.clone(),
            state.backer_count,
        );
        state.backer_count
    }

    // ─────────────────────────────────────────────────────────
    // Finalization (two-phase)
    // ─────────────────────────────────────────────────────────

    /// First phase: after the deadline, ask the engine to decrypt the
    /// private comparison `current_amount >= target_amount`.
    ///
    /// - Before the deadline: `DeadlineNotReached`.
    /// - On a project that already finalized: `AlreadyFinalized`.
    /// - With no contributions there is nothing to decrypt and the target is
    ///   known positive, so the project finalizes to `Failed` synchronously.
    /// - While a request issued less than [`FINALIZE_RETRY_AFTER`] ago is
    ///   outstanding, returns the same request id. Once that window lapses a
    ///   fresh request supersedes the stale one and the old callback becomes
    ///   a no-op.
    pub fn request_finalize(env: Env, project_id: u64) -> FinalizeOutcome {
        let engine_addr = require_engine(&env);
        let config = load_config_or_panic(&env, project_id);
        let mut state = load_state_or_panic(&env, project_id);

        if state.status != ProjectStatus::Active {
            panic_with_error!(&env, Error::AlreadyFinalized);
        }
        let now = env.ledger().timestamp();
        if now < config.deadline {
            panic_with_error!(&env, Error::DeadlineNotReached);
        }

        if let Some(pending) = storage::load_pending_finalize(&env, project_id) {
            if now < pending.requested_at + FINALIZE_RETRY_AFTER {
                return FinalizeOutcome::Pending(pending.request_id);
            }
        }

        let current = match &state.current_amount {
            MaybeEncrypted::Some(current) => current.clone(),
            MaybeEncrypted::None => {
                // Nothing was contributed: current (0) < target (> 0).
                let status = apply_finalize(&env, project_id, &mut state, StatusEvent::GoalMissed);
                return FinalizeOutcome::Finalized(status);
            }
        };

        let comparison = engine::homomorphic_compare_ge(
            &env,
            &engine_addr,
            &current.handle,
            &config.target_amount.handle,
        );
        // The encrypted bool is for the ledger's own branching only; nobody
        // else is ever granted on it.
        let sealed = permissions::seal(&env, &engine_addr, comparison, &vec![&env]);

        let request_id = match engine::request_decryption(&env, &engine_addr, &sealed.handle) {
            Ok(id) => id,
            Err(_) => panic_with_error!(&env, Error::CapabilityDenied),
        };

        storage::save_pending_finalize(
            &env,
            project_id,
            &PendingFinalize {
                request_id,
                requested_at: now,
            },
        );
        events::emit_finalize_requested(&env, project_id, request_id);
        FinalizeOutcome::Pending(request_id)
    }

    /// Second phase: the engine delivers the decrypted comparison.
    ///
    /// Only the engine address may call this. The transition is applied
    /// exactly once: callbacks for an already-finalized project, or carrying
    /// a request id that is not the outstanding one, are accepted and
    /// ignored (the current status is returned either way), so engine
    /// retries and out-of-order deliveries are harmless.
    pub fn complete_finalize(env: Env, project_id: u64, request_id: u64, goal_met: bool) -> ProjectStatus {
        let engine_addr = require_engine(&env);
        engine_addr.require_auth();

        let mut state = load_state_or_panic(&env, project_id);
        if state.status.is_terminal() {
            return state.status;
        }

        match storage::load_pending_finalize(&env, project_id) {
            Some(pending) if pending.request_id == request_id => {}
            _ => return state.status,
        }

        let event = if goal_met {
            StatusEvent::GoalMet
        } else {
            StatusEvent::GoalMissed
        };
        apply_finalize(&env, project_id, &mut state, event)
    }

    // ─────────────────────────────────────────────────────────
    // Funds distribution
    // ─────────────────────────────────────────────────────────

    /// Release the raised total to the creator of a successful project.
    ///
    /// Exactly once: marks the funds withdrawn, moves the status to
    /// `Withdrawn` and returns the sealed total — all in this one
    /// invocation, so funds and state can never disagree.
    pub fn withdraw(env: Env, project_id: u64, creator: Address) -> EncryptedValue {
        creator.require_auth();
        let engine_addr = require_engine(&env);

        let config = load_config_or_panic(&env, project_id);
        let mut state = load_state_or_panic(&env, project_id);

        if creator != config.creator {
            panic_with_error!(&env, Error::NotCreator);
        }
        if state.funds_withdrawn {
            panic_with_error!(&env, Error::AlreadyWithdrawn);
        }
        state.status = match state.status.transition(StatusEvent::Withdraw) {
            Ok(next) => next,
            Err(_) => panic_with_error!(&env, Error::NotSuccessful),
        };

        // A Successful project has at least one contribution.
        let current = match &state.current_amount {
            MaybeEncrypted::Some(current) => current.clone(),
            MaybeEncrypted::None => panic_with_error!(&env, Error::NotSuccessful),
        };
        let released = permissions::extend(&env, &engine_addr, &current, &creator);

        state.current_amount = MaybeEncrypted::Some(released.clone());
        state.funds_withdrawn = true;
        storage::save_project_state(&env, project_id, &state);

        let mut stats = storage::load_stats(&env);
        stats.successful = stats.successful.saturating_sub(1);
        stats.withdrawn += 1;
        storage::save_stats(&env, &stats);

        events::emit_funds_withdrawn(&env, project_id, creator, released.handle.clone());
        released
    }

    /// Return a contributor's sealed amount after a project failed.
    ///
    /// The record is marked refunded but never deleted, which is what makes
    /// a second refund impossible rather than merely unlikely.
    pub fn request_refund(env: Env, project_id: u64, contributor: Address) -> EncryptedValue {
        contributor.require_auth();

        let state = load_state_or_panic(&env, project_id);
        if state.status != ProjectStatus::Failed {
            panic_with_error!(&env, Error::NotFailed);
        }

        let mut contribution = match storage::load_contribution(&env, project_id, &contributor) {
            Some(contribution) => contribution,
            None => panic_with_error!(&env, Error::NoContribution),
        };
        if contribution.refunded {
            panic_with_error!(&env, Error::AlreadyRefunded);
        }

        contribution.refunded = true;
        storage::save_contribution(&env, &contribution);

        events::emit_contribution_refunded(
            &env,
            project_id,
            contributor,
            contribution.amount.handle.clone(),
        );
        contribution.amount
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    /// Plaintext project metadata. No encrypted fields.
    pub fn get_project(env: Env, project_id: u64) -> Project {
        match storage::load_project(&env, project_id) {
            Some(project) => project,
            None => panic_with_error!(&env, Error::ProjectNotFound),
        }
    }

    /// Encrypted target and running-total handles.
    ///
    /// Restricted to the creator and past contributors; anyone else fails
    /// with `Unauthorized`.
    pub fn get_project_amounts(env: Env, project_id: u64, caller: Address) -> ProjectAmounts {
        caller.require_auth();

        let config = load_config_or_panic(&env, project_id);
        let state = load_state_or_panic(&env, project_id);

        let is_creator = caller == config.creator;
        let is_contributor = storage::load_contribution(&env, project_id, &caller).is_some();
        if !is_creator && !is_contributor {
            panic_with_error!(&env, Error::Unauthorized);
        }

        ProjectAmounts {
            project_id,
            target_amount: config.target_amount,
            current_amount: state.current_amount,
        }
    }

    /// One contributor's record for a project.
    pub fn get_contribution(env: Env, project_id: u64, contributor: Address) -> Contribution {
        load_config_or_panic(&env, project_id);
        match storage::load_contribution(&env, project_id, &contributor) {
            Some(contribution) => contribution,
            None => panic_with_error!(&env, Error::NoContribution),
        }
    }

    /// Platform-wide project counts by status.
    pub fn get_platform_stats(env: Env) -> PlatformStats {
        storage::load_stats(&env)
    }
}

// ─────────────────────────────────────────────────────────
// Internal helpers
// ─────────────────────────────────────────────────────────

fn require_engine(env: &Env) -> Address {
    match storage::get_engine(env) {
        Some(engine) => engine,
        None => panic_with_error!(env, Error::NotInitialized),
    }
}

fn load_config_or_panic(env: &Env, project_id: u64) -> types::ProjectConfig {
    match storage::load_project_config(env, project_id) {
        Some(config) => config,
        None => panic_with_error!(env, Error::ProjectNotFound),
    }
}

fn load_state_or_panic(env: &Env, project_id: u64) -> types::ProjectState {
    match storage::load_project_state(env, project_id) {
        Some(state) => state,
        None => panic_with_error!(env, Error::ProjectNotFound),
    }
}

/// Encrypt a contribution input, distinguishing zero commitments from
/// malformed proofs.
fn encrypt_amount(
    env: &Env,
    engine_addr: &Address,
    amount: &Bytes,
    proof: &Bytes,
    submitter: &Address,
) -> BytesN<32> {
    match engine::encrypt_with_proof(env, engine_addr, amount, proof, submitter) {
        Ok(handle) => handle,
        Err(EngineFailure::ZeroAmount) => panic_with_error!(env, Error::ZeroAmount),
        Err(_) => panic_with_error!(env, Error::ProofInvalid),
    }
}

/// Apply a finalization transition, persist it, keep the stats in step,
/// clear any pending request and emit the event. Callers guarantee the
/// project is currently `Active`.
fn apply_finalize(
    env: &Env,
    project_id: u64,
    state: &mut types::ProjectState,
    event: StatusEvent,
) -> ProjectStatus {
    let next = match state.status.transition(event) {
        Ok(next) => next,
        Err(_) => panic_with_error!(env, Error::AlreadyFinalized),
    };

    let mut stats = storage::load_stats(env);
    stats.active = stats.active.saturating_sub(1);
    match next {
        ProjectStatus::Successful => stats.successful += 1,
        ProjectStatus::Failed => stats.failed += 1,
        _ => {}
    }
    storage::save_stats(env, &stats);

    state.status = next.clone();
    storage::save_project_state(env, project_id, state);
    storage::clear_pending_finalize(env, project_id);

    events::emit_project_finalized(env, project_id, next.clone());
    next
}
