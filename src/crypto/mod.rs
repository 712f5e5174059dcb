// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! Gateway signing key and response signatures

pub mod keypair;
pub mod signer;

pub use keypair::{load_signer, save_signer, GatewaySigner};
pub use signer::{message_hash, sign_response};
