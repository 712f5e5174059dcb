// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! Resolution dispatcher
//!
//! Decodes an ENSIP-10 `resolve(bytes,bytes)` call, looks the name up in
//! the record store, and ABI-encodes the answer for the requested field.
//! An unset field resolves to empty bytes, never an error: the on-chain
//! verifier must always receive something it can decode.

use crate::codec::{abi, decode_dns_name, namehash, Node};
use crate::constants::{
    COIN_TYPE_ETH, SELECTOR_ADDR, SELECTOR_ADDR_COIN, SELECTOR_CONTENTHASH, SELECTOR_TEXT,
};
use crate::error::GatewayError;
use crate::record::store::RecordStore;
use crate::record::EntityRecord;
use serde_json::Value;

/// Outcome of one resolution: the decoded name and node travel along so
/// callers can log a reconstructable trail
#[derive(Debug)]
pub struct ResolveOutcome {
    pub name: String,
    pub node: Node,
    pub result: Vec<u8>,
}

fn parse_eth_address(raw: &str) -> Option<[u8; 20]> {
    let raw = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(raw).ok()?;
    bytes.try_into().ok()
}

fn record_address(record: &EntityRecord) -> Option<[u8; 20]> {
    record.address.as_deref().and_then(parse_eth_address)
}

/// Resolve a text key: the free-form texts map first, then a same-named
/// non-empty top-level scalar as the fallback
fn resolve_text(record: &EntityRecord, key: &str) -> Option<String> {
    if let Some(value) = record.texts.get(key) {
        return Some(value.clone());
    }
    match record.get_field(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

/// Dispatch one decoded inner call against a record (which may be absent)
fn dispatch(record: Option<&EntityRecord>, inner: &[u8]) -> Result<Vec<u8>, GatewayError> {
    if inner.len() < 4 {
        return Err(GatewayError::Decode(
            "inner call shorter than a selector".to_string(),
        ));
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&inner[..4]);
    let args = &inner[4..];

    let result = match selector {
        SELECTOR_ADDR => record
            .and_then(record_address)
            .map(|addr| abi::encode_address(&addr))
            .unwrap_or_default(),

        SELECTOR_ADDR_COIN => {
            let (_, coin_type) = abi::decode_bytes32_uint(args)
                .map_err(|e| GatewayError::Decode(e.to_string()))?;
            if coin_type == Some(COIN_TYPE_ETH) {
                record
                    .and_then(record_address)
                    .map(|addr| abi::encode_bytes(&addr))
                    .unwrap_or_default()
            } else {
                Vec::new()
            }
        }

        SELECTOR_TEXT => {
            let (_, key) = abi::decode_bytes32_string(args)
                .map_err(|e| GatewayError::Decode(e.to_string()))?;
            record
                .and_then(|r| resolve_text(r, &key))
                .map(|value| abi::encode_string(&value))
                .unwrap_or_default()
        }

        SELECTOR_CONTENTHASH => record
            .and_then(|r| r.contenthash.as_deref())
            .and_then(|h| hex::decode(h.strip_prefix("0x").unwrap_or(h)).ok())
            .map(|bytes| abi::encode_bytes(&bytes))
            .unwrap_or_default(),

        // Unsupported fields resolve to empty rather than reverting
        other => {
            tracing::debug!(selector = %hex::encode(other), "unknown resolution selector");
            Vec::new()
        }
    };

    Ok(result)
}

/// Decode and dispatch a full `resolve(bytes name, bytes data)` call.
///
/// `Decode` errors map to a client error upstream; an absent record or
/// unset field is a successful empty result.
pub fn resolve_call(
    store: &dyn RecordStore,
    calldata: &[u8],
) -> Result<ResolveOutcome, GatewayError> {
    let (wire_name, inner) =
        abi::decode_resolve_calldata(calldata).map_err(|e| GatewayError::Decode(e.to_string()))?;

    let name = decode_dns_name(&wire_name).map_err(|e| GatewayError::Decode(e.to_string()))?;
    let node = namehash(&name);
    let record = store.get(&node);

    tracing::info!(name = %name, node = %node, found = record.is_some(), "resolving");

    let result = dispatch(record.as_ref(), &inner)?;
    Ok(ResolveOutcome { name, node, result })
}

/// Encode an inner `addr(bytes32)` call; client-side helper used by tests
pub fn encode_addr_call(node: &Node) -> Vec<u8> {
    let mut out = Vec::with_capacity(36);
    out.extend_from_slice(&SELECTOR_ADDR);
    out.extend_from_slice(node.as_bytes());
    out
}

/// Encode an inner `text(bytes32,string)` call
pub fn encode_text_call(node: &Node, key: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&SELECTOR_TEXT);
    out.extend_from_slice(node.as_bytes());
    // string head: offset 0x40 from the start of the argument area
    let mut offset = [0u8; 32];
    offset[31] = 0x40;
    out.extend_from_slice(&offset);
    let mut len = [0u8; 32];
    len[24..].copy_from_slice(&(key.len() as u64).to_be_bytes());
    out.extend_from_slice(&len);
    out.extend_from_slice(key.as_bytes());
    out.resize(out.len() + (32 - key.len() % 32) % 32, 0);
    out
}
