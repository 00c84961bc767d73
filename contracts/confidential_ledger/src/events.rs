//! # Events
//!
//! Typed event payloads and emit helpers. One rule applies everywhere:
//! payloads never contain a plaintext amount, only ciphertext handles.
//! Observers (including the off-chain indexer) learn that something
//! happened, never how much it was worth.

use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env};

use crate::types::ProjectStatus;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectCreated {
    pub project_id: u64,
    pub creator: Address,
    pub deadline: u64,
    /// Handle of the encrypted funding target.
    pub target_handle: BytesN<32>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContributionReceived {
    pub project_id: u64,
    pub contributor: Address,
    /// Handle of the contributor's (cumulative) encrypted amount.
    pub amount_handle: BytesN<32>,
    pub backer_count: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FinalizeRequested {
    pub project_id: u64,
    pub request_id: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectFinalized {
    pub project_id: u64,
    pub status: ProjectStatus,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundsWithdrawn {
    pub project_id: u64,
    pub creator: Address,
    /// Handle of the encrypted raised total handed to the creator.
    pub amount_handle: BytesN<32>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContributionRefunded {
    pub project_id: u64,
    pub contributor: Address,
    /// Handle of the contributor's encrypted refunded amount.
    pub amount_handle: BytesN<32>,
}

pub fn emit_project_created(
    env: &Env,
    project_id: u64,
    creator: Address,
    deadline: u64,
    target_handle: BytesN<32>,
) {
    let topics = (symbol_short!("created"), project_id);
    let data = ProjectCreated {
        project_id,
        creator,
        deadline,
        target_handle,
    };
    env.events().publish(topics, data);
}

pub fn emit_contribution_received(
    env: &Env,
    project_id: u64,
    contributor: Address,
    amount_handle: BytesN<32>,
    backer_count: u32,
) {
    let topics = (symbol_short!("contrib"), project_id);
    let data = ContributionReceived {
        project_id,
        contributor,
        amount_handle,
        backer_count,
    };
    env.events().publish(topics, data);
}

pub fn emit_finalize_requested(env: &Env, project_id: u64, request_id: u64) {
    let topics = (symbol_short!("fin_req"), project_id);
    let data = FinalizeRequested {
        project_id,
        request_id,
    };
    env.events().publish(topics, data);
}

pub fn emit_project_finalized(env: &Env, project_id: u64, status: ProjectStatus) {
    let topics = (symbol_short!("finalized"), project_id);
    let data = ProjectFinalized { project_id, status };
    env.events().publish(topics, data);
}

pub fn emit_funds_withdrawn(
    env: &Env,
    project_id: u64,
    creator: Address,
    amount_handle: BytesN<32>,
) {
    let topics = (symbol_short!("withdrawn"), project_id);
    let data = FundsWithdrawn {
        project_id,
        creator,
        amount_handle,
    };
    env.events().publish(topics, data);
}

pub fn emit_contribution_refunded(
    env: &Env,
    project_id: u64,
    contributor: Address,
    amount_handle: BytesN<32>,
) {
    let topics = (symbol_short!("refunded"), project_id);
    let data = ContributionRefunded {
        project_id,
        contributor,
        amount_handle,
    };
    env.events().publish(topics, data);
}
