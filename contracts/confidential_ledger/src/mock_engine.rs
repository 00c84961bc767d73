//! # Mock homomorphic engine
//!
//! Test-only implementation of [`HomomorphicEngine`] backed by plaintext
//! `i128` arithmetic. Handles are opaque 32-byte counters; the plaintext
//! behind each handle lives in this contract's own storage and is reachable
//! through the oracle entry points below, which exist purely so tests can
//! close the asynchronous decryption loop and assert on sums.
//!
//! ## Conventions
//!
//! - An input is the big-endian byte encoding of a non-negative integer
//!   (at most 16 bytes).
//! - A proof is valid iff it is non-empty and its first byte is `0x01`;
//!   anything else fails with `ProofInvalid`. A valid proof over a zero
//!   input fails with `ZeroAmount` — the mock's rendition of a non-zero
//!   commitment check.
//! - Homomorphic operations are allowed for a handle's producer or any ACL
//!   member (provenance rule). Decryption requests are strictly ACL-gated:
//!   a freshly produced handle cannot be decrypted by anyone, the producing
//!   ledger included, until `grant_capability` is called.

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, panic_with_error, vec, Address, Bytes,
    BytesN, Env, Vec,
};

use crate::engine::HomomorphicEngine;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum MockEngineError {
    ProofInvalid = 1,
    ZeroAmount = 2,
    CapabilityDenied = 3,
    UnknownHandle = 4,
    UnknownRequest = 5,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MockKey {
    /// Plaintext behind a handle.
    Plain(BytesN<32>),
    /// Decrypt ACL of a handle.
    Acl(BytesN<32>),
    /// Principal that produced a handle (provenance).
    Producer(BytesN<32>),
    /// Handle counter.
    HandleCount,
    /// Decryption request counter.
    RequestCount,
    /// Outstanding decryption request: the handle it refers to.
    Request(u64),
}

#[contract]
pub struct MockEngine;

fn fresh_handle(env: &Env) -> BytesN<32> {
    let count: u64 = env
        .storage()
        .instance()
        .get(&MockKey::HandleCount)
        .unwrap_or(0);
    env.storage()
        .instance()
        .set(&MockKey::HandleCount, &(count + 1));

    let mut raw = [0u8; 32];
    raw[24..32].copy_from_slice(&count.to_be_bytes());
    BytesN::from_array(env, &raw)
}

fn store_value(env: &Env, handle: &BytesN<32>, plain: i128, producer: &Address) {
    env.storage()
        .instance()
        .set(&MockKey::Plain(handle.clone()), &plain);
    env.storage()
        .instance()
        .set(&MockKey::Producer(handle.clone()), producer);
}

fn plain_of(env: &Env, handle: &BytesN<32>) -> i128 {
    match env.storage().instance().get(&MockKey::Plain(handle.clone())) {
        Some(v) => v,
        None => panic_with_error!(env, MockEngineError::UnknownHandle),
    }
}

fn acl_of(env: &Env, handle: &BytesN<32>) -> Vec<Address> {
    env.storage()
        .instance()
        .get(&MockKey::Acl(handle.clone()))
        .unwrap_or_else(|| vec![env])
}

/// Provenance rule for homomorphic operations.
fn require_can_operate(env: &Env, handle: &BytesN<32>, caller: &Address) {
    let producer: Option<Address> = env
        .storage()
        .instance()
        .get(&MockKey::Producer(handle.clone()));
    match producer {
        None => panic_with_error!(env, MockEngineError::UnknownHandle),
        Some(p) if p == *caller => {}
        Some(_) => {
            if !acl_of(env, handle).contains(caller) {
                panic_with_error!(env, MockEngineError::CapabilityDenied);
            }
        }
    }
}

fn parse_amount(env: &Env, input: &Bytes) -> i128 {
    if input.len() == 0 || input.len() > 16 {
        panic_with_error!(env, MockEngineError::ProofInvalid);
    }
    let mut value: i128 = 0;
    for byte in input.iter() {
        value = (value << 8) | byte as i128;
    }
    value
}

#[contractimpl]
impl HomomorphicEngine for MockEngine {
    fn encrypt_with_proof(
        env: Env,
        input: Bytes,
        proof: Bytes,
        ledger: Address,
        _submitter: Address,
    ) -> BytesN<32> {
        if proof.len() == 0 || proof.get(0) != Some(1) {
            panic_with_error!(&env, MockEngineError::ProofInvalid);
        }
        let amount = parse_amount(&env, &input);
        if amount == 0 {
            panic_with_error!(&env, MockEngineError::ZeroAmount);
        }

        let handle = fresh_handle(&env);
        // The ledger operating on behalf of the submitter is the producer:
        // it may compute on the fresh input within its own flow.
        store_value(&env, &handle, amount, &ledger);
        handle
    }

    fn homomorphic_add(env: Env, a: BytesN<32>, b: BytesN<32>, caller: Address) -> BytesN<32> {
        require_can_operate(&env, &a, &caller);
        require_can_operate(&env, &b, &caller);

        let sum = plain_of(&env, &a) + plain_of(&env, &b);
        let handle = fresh_handle(&env);
        store_value(&env, &handle, sum, &caller);
        handle
    }

    fn homomorphic_compare_ge(
        env: Env,
        a: BytesN<32>,
        b: BytesN<32>,
        caller: Address,
    ) -> BytesN<32> {
        require_can_operate(&env, &a, &caller);
        require_can_operate(&env, &b, &caller);

        let result = if plain_of(&env, &a) >= plain_of(&env, &b) {
            1i128
        } else {
            0i128
        };
        let handle = fresh_handle(&env);
        store_value(&env, &handle, result, &caller);
        handle
    }

    fn grant_capability(env: Env, handle: BytesN<32>, principal: Address) {
        if !env
            .storage()
            .instance()
            .has(&MockKey::Plain(handle.clone()))
        {
            panic_with_error!(&env, MockEngineError::UnknownHandle);
        }
        let mut acl = acl_of(&env, &handle);
        if !acl.contains(&principal) {
            acl.push_back(principal);
        }
        env.storage()
            .instance()
            .set(&MockKey::Acl(handle.clone()), &acl);
    }

    fn request_decryption(env: Env, handle: BytesN<32>, requester: Address) -> u64 {
        // Strict ACL check: provenance does not confer decryption.
        if !acl_of(&env, &handle).contains(&requester) {
            panic_with_error!(&env, MockEngineError::CapabilityDenied);
        }

        let count: u64 = env
            .storage()
            .instance()
            .get(&MockKey::RequestCount)
            .unwrap_or(0);
        let id = count + 1;
        env.storage().instance().set(&MockKey::RequestCount, &id);
        env.storage()
            .instance()
            .set(&MockKey::Request(id), &handle);
        id
    }
}

/// Test oracle surface, outside the engine trait. Real engines expose
/// nothing like this; tests use it to read plaintexts and to play the role
/// of the callback transaction.
#[contractimpl]
impl MockEngine {
    /// Plaintext behind a handle, bypassing the ACL. Test assertions only.
    pub fn plaintext(env: Env, handle: BytesN<32>) -> i128 {
        plain_of(&env, &handle)
    }

    /// ACL-checked synchronous decryption, for exercising the capability
    /// invariant directly.
    pub fn decrypt(env: Env, handle: BytesN<32>, requester: Address) -> i128 {
        if !acl_of(&env, &handle).contains(&requester) {
            panic_with_error!(&env, MockEngineError::CapabilityDenied);
        }
        plain_of(&env, &handle)
    }

    /// Resolve an outstanding decryption request to its plaintext, so a test
    /// can forward the result to the ledger's completion entry point.
    pub fn decrypted_result(env: Env, request_id: u64) -> i128 {
        let handle: BytesN<32> = match env.storage().instance().get(&MockKey::Request(request_id)) {
            Some(h) => h,
            None => panic_with_error!(&env, MockEngineError::UnknownRequest),
        };
        plain_of(&env, &handle)
    }
}
