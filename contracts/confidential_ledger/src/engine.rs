//! # Homomorphic engine boundary
//!
//! The ledger never performs cryptography itself. Everything ciphertext-
//! related goes through the [`HomomorphicEngine`] trait, implemented by an
//! external contract whose address is injected at `init`. The contract only
//! depends on the engine guaranteeing that:
//!
//! - a ciphertext handle is unforgeable without a valid input proof, and
//! - decryption only succeeds for principals in the handle's ACL.
//!
//! Homomorphic operations are authenticated by provenance: the contract that
//! produced a handle may keep computing on it, while decryption is strictly
//! ACL-gated. Tests run against [`crate::mock_engine::MockEngine`], which
//! implements the same trait over plaintext integers.
//!
//! ## Error codes
//!
//! Engine failures cross the contract boundary as numeric error codes; the
//! wrappers below translate them into an [`EngineFailure`] so entry points
//! can map proof problems, zero commitments and missing capabilities onto
//! their own error variants.

use soroban_sdk::{contractclient, Address, Bytes, BytesN, Env};

/// Input proof failed the binding or validity check.
pub const ENGINE_ERR_PROOF_INVALID: u32 = 1;
/// Input proof certified a zero amount.
pub const ENGINE_ERR_ZERO_AMOUNT: u32 = 2;
/// Operation attempted without a capability on the handle.
pub const ENGINE_ERR_CAPABILITY_DENIED: u32 = 3;

/// Contract interface the external homomorphic engine must expose.
#[contractclient(name = "EngineClient")]
pub trait HomomorphicEngine {
    /// Verify `proof` binds `input` to `(ledger, submitter)` and produce a
    /// ciphertext handle. Fails with [`ENGINE_ERR_PROOF_INVALID`] or
    /// [`ENGINE_ERR_ZERO_AMOUNT`].
    fn encrypt_with_proof(
        env: Env,
        input: Bytes,
        proof: Bytes,
        ledger: Address,
        submitter: Address,
    ) -> BytesN<32>;

    /// Homomorphic addition; the result is a fresh handle with an empty ACL.
    fn homomorphic_add(env: Env, a: BytesN<32>, b: BytesN<32>, caller: Address) -> BytesN<32>;

    /// Homomorphic `a >= b`; the result is a fresh encrypted-bool handle
    /// with an empty ACL.
    fn homomorphic_compare_ge(
        env: Env,
        a: BytesN<32>,
        b: BytesN<32>,
        caller: Address,
    ) -> BytesN<32>;

    /// Add `principal` to the handle's ACL. Idempotent.
    fn grant_capability(env: Env, handle: BytesN<32>, principal: Address);

    /// Ask for `handle` to be decrypted for `requester`. Returns an engine
    /// request id; the plaintext arrives later as a callback transaction.
    /// Fails with [`ENGINE_ERR_CAPABILITY_DENIED`] unless `requester` is in
    /// the handle's ACL.
    fn request_decryption(env: Env, handle: BytesN<32>, requester: Address) -> u64;
}

/// A classified engine failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EngineFailure {
    ProofInvalid,
    ZeroAmount,
    CapabilityDenied,
    /// Anything else (engine unreachable, malformed return value). Treated
    /// as a proof problem by input paths since the caller can always retry.
    Other,
}

impl EngineFailure {
    fn classify(err: soroban_sdk::Error) -> Self {
        if err == soroban_sdk::Error::from_contract_error(ENGINE_ERR_ZERO_AMOUNT) {
            EngineFailure::ZeroAmount
        } else if err == soroban_sdk::Error::from_contract_error(ENGINE_ERR_PROOF_INVALID) {
            EngineFailure::ProofInvalid
        } else if err == soroban_sdk::Error::from_contract_error(ENGINE_ERR_CAPABILITY_DENIED) {
            EngineFailure::CapabilityDenied
        } else {
            EngineFailure::Other
        }
    }
}

/// Verify and encrypt a raw input, classifying engine rejections.
pub fn encrypt_with_proof(
    env: &Env,
    engine: &Address,
    input: &Bytes,
    proof: &Bytes,
    submitter: &Address,
) -> Result<BytesN<32>, EngineFailure> {
    let client = EngineClient::new(env, engine);
    let ledger = env.current_contract_address();
    match client.try_encrypt_with_proof(input, proof, &ledger, submitter) {
        Ok(Ok(handle)) => Ok(handle),
        Err(Ok(err)) => Err(EngineFailure::classify(err)),
        _ => Err(EngineFailure::Other),
    }
}

/// Homomorphically add two handles on behalf of the ledger.
///
/// Operand capabilities were established when the operands were sealed (or
/// by provenance for fresh inputs), so a failure here is a programming
/// error and is allowed to propagate as a panic.
pub fn homomorphic_add(env: &Env, engine: &Address, a: &BytesN<32>, b: &BytesN<32>) -> BytesN<32> {
    let client = EngineClient::new(env, engine);
    client.homomorphic_add(a, b, &env.current_contract_address())
}

/// Homomorphic `a >= b` on behalf of the ledger.
pub fn homomorphic_compare_ge(
    env: &Env,
    engine: &Address,
    a: &BytesN<32>,
    b: &BytesN<32>,
) -> BytesN<32> {
    let client = EngineClient::new(env, engine);
    client.homomorphic_compare_ge(a, b, &env.current_contract_address())
}

/// Mirror a capability grant into the engine-side ACL.
pub fn grant_capability(env: &Env, engine: &Address, handle: &BytesN<32>, principal: &Address) {
    let client = EngineClient::new(env, engine);
    client.grant_capability(handle, principal);
}

/// Request decryption of `handle` for the ledger itself.
pub fn request_decryption(
    env: &Env,
    engine: &Address,
    handle: &BytesN<32>,
) -> Result<u64, EngineFailure> {
    let client = EngineClient::new(env, engine);
    match client.try_request_decryption(handle, &env.current_contract_address()) {
        Ok(Ok(id)) => Ok(id),
        Err(Ok(err)) => Err(EngineFailure::classify(err)),
        _ => Err(EngineFailure::Other),
    }
}
