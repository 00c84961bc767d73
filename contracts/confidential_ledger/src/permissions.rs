//! # Permissions
//!
//! The single place where decrypt-capabilities are granted.
//!
//! Every engine operation returns a bare `BytesN<32>` handle with an empty
//! ACL. Storage only accepts [`EncryptedValue`]s, and the only way to build
//! one is [`seal`], which performs the double grant the whole design hinges
//! on: the **ledger itself** (so later homomorphic operations and the
//! finalization decryption keep working) plus every **holder** that must
//! eventually decrypt the value (creator for totals, contributor for their
//! own amount). Forgetting either half is therefore unrepresentable in the
//! rest of the codebase rather than a runtime surprise.

use soroban_sdk::{vec, Address, BytesN, Env, Vec};

use crate::engine;
use crate::types::EncryptedValue;

/// Grant the ledger and each holder decryption on `handle`, mirroring the
/// grants into the engine-side ACL, and return the sealed value.
///
/// Grants are additive and idempotent; sealing the same handle twice with
/// overlapping holders is harmless.
pub fn seal(
    env: &Env,
    engine_addr: &Address,
    handle: BytesN<32>,
    holders: &Vec<Address>,
) -> EncryptedValue {
    let ledger = env.current_contract_address();

    let mut capabilities: Vec<Address> = vec![env, ledger.clone()];
    engine::grant_capability(env, engine_addr, &handle, &ledger);

    for holder in holders.iter() {
        if !capabilities.contains(&holder) {
            capabilities.push_back(holder.clone());
        }
        engine::grant_capability(env, engine_addr, &handle, &holder);
    }

    EncryptedValue {
        handle,
        capabilities,
    }
}

/// Extend an already-sealed value's capability set with one more holder.
///
/// Used by `withdraw`, which re-seals the final total for the creator before
/// handing it back.
pub fn extend(
    env: &Env,
    engine_addr: &Address,
    value: &EncryptedValue,
    holder: &Address,
) -> EncryptedValue {
    let mut capabilities = value.capabilities.clone();
    if !capabilities.contains(holder) {
        capabilities.push_back(holder.clone());
    }
    engine::grant_capability(env, engine_addr, &value.handle, holder);

    EncryptedValue {
        handle: value.handle.clone(),
        capabilities,
    }
}
