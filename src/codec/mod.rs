// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! Name and call-data codecs

pub mod abi;
pub mod dns;
pub mod namehash;

pub use dns::{decode_dns_name, encode_dns_name};
pub use namehash::{keccak256, namehash, Node};
