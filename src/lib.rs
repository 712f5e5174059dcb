// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! EnsGate - CCIP-Read offchain gateway
//!
//! Answers offchain resolution queries for ENS wildcard subdomains
//! (EIP-3668 + ENSIP-10): looks up structured entity records, ABI-encodes
//! answers, and signs them so the on-chain verifier can authenticate the
//! response without trusting the transport.

pub mod codec;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod record;
pub mod resolve;
pub mod server;

pub use constants::*;

// Re-export commonly used types
pub use codec::{decode_dns_name, encode_dns_name, keccak256, namehash, Node};
pub use crypto::{load_signer, sign_response, GatewaySigner};
pub use error::GatewayError;
pub use record::{
    build_entity, compute_constitution_hash, normalize_label, register_entity, set_field_update,
    EntityRecord, MemoryStore, RecordStore,
};
pub use resolve::resolve_call;

/// Common error type for gateway operations
pub type Result<T> = std::result::Result<T, anyhow::Error>;
