// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! ENS namehash and the 32-byte node identifier
//!
//! The recursive hash must match the on-chain algorithm bit-for-bit;
//! any divergence breaks resolution for every name under the root.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Keccak-256 digest of `data`
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// A record key: the namehash of a fully-qualified dotted name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Node(pub [u8; 32]);

impl Node {
    pub const ZERO: Node = Node([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex form with `0x` prefix, as used in JSON bodies and query strings
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Node {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Node(arr))
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Compute the namehash of a dot-separated name.
///
/// Starting from the all-zero node, each label from rightmost to leftmost
/// folds in as `keccak256(node || keccak256(label))`. The empty name is
/// the all-zero node.
pub fn namehash(name: &str) -> Node {
    let mut node = [0u8; 32];

    if name.is_empty() {
        return Node(node);
    }

    for label in name.split('.').rev() {
        let label_hash = keccak256(label.as_bytes());
        let mut packed = [0u8; 64];
        packed[..32].copy_from_slice(&node);
        packed[32..].copy_from_slice(&label_hash);
        node = keccak256(&packed);
    }

    Node(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_is_zero_node() {
        assert_eq!(namehash(""), Node::ZERO);
    }

    #[test]
    fn test_known_vectors() {
        // Reference vectors from EIP-137
        assert_eq!(
            namehash("eth").to_hex(),
            "0x93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            namehash("foo.eth").to_hex(),
            "0xde9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
        );
    }

    #[test]
    fn test_label_order_matters() {
        assert_ne!(namehash("a.b"), namehash("b.a"));
    }

    #[test]
    fn test_node_hex_round_trip() {
        let node = namehash("alice.test.divicompany.eth");
        let parsed: Node = node.to_hex().parse().unwrap();
        assert_eq!(parsed, node);
    }
}
