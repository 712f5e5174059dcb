// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! Response signing: the time-bounded envelope the on-chain verifier
//! checks before trusting a gateway answer
//!
//! The packing and the personal-message wrapping below must match the
//! verifier contract exactly; it recovers the signer address from the
//! wrapped digest and compares it against its configured gateway signer.

use crate::codec::{abi, keccak256};
use crate::crypto::keypair::GatewaySigner;
use crate::error::GatewayError;
use std::time::{SystemTime, UNIX_EPOCH};

/// Prefix applied by the `eth_sign`/`personal_sign` convention for a
/// 32-byte payload
const ETH_SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Domain tag fixed by the verifier contract's packing
const DOMAIN_TAG: [u8; 2] = [0x19, 0x00];

/// The message hash the verifier reconstructs:
/// `keccak256(0x1900 || sender || expires || keccak256(request) || keccak256(result))`
/// with `expires` packed as a big-endian u64.
pub fn message_hash(sender: &[u8; 20], expires: u64, request: &[u8], result: &[u8]) -> [u8; 32] {
    let mut packed = Vec::with_capacity(2 + 20 + 8 + 32 + 32);
    packed.extend_from_slice(&DOMAIN_TAG);
    packed.extend_from_slice(sender);
    packed.extend_from_slice(&expires.to_be_bytes());
    packed.extend_from_slice(&keccak256(request));
    packed.extend_from_slice(&keccak256(result));
    keccak256(&packed)
}

fn personal_sign_digest(hash: &[u8; 32]) -> [u8; 32] {
    let mut packed = Vec::with_capacity(ETH_SIGNED_MESSAGE_PREFIX.len() + 32);
    packed.extend_from_slice(ETH_SIGNED_MESSAGE_PREFIX);
    packed.extend_from_slice(hash);
    keccak256(&packed)
}

/// Sign a resolution result for `sender`, valid for `ttl_secs` from now.
///
/// Returns the ABI-encoded `(bytes result, uint64 expires, bytes
/// signature)` envelope. Single attempt: a signer failure fails the
/// whole request, the caller maps it to a server error.
pub fn sign_response(
    signer: &GatewaySigner,
    sender: &[u8; 20],
    request: &[u8],
    result: &[u8],
    ttl_secs: u64,
) -> Result<Vec<u8>, GatewayError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| GatewayError::Signing(e.to_string()))?
        .as_secs();
    let expires = now + ttl_secs;

    let hash = message_hash(sender, expires, request, result);
    let digest = personal_sign_digest(&hash);
    let signature = signer.sign_digest(&digest)?;

    Ok(abi::encode_response_envelope(result, expires, &signature))
}
