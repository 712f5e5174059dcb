// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! Gateway signing key management and storage

use crate::codec::keccak256;
use crate::constants::PRIVATE_KEY_ENV;
use crate::error::GatewayError;
use anyhow::{Context, Result};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use std::path::PathBuf;

/// The gateway's secp256k1 signing identity. One key per deployment;
/// the on-chain verifier is configured with its address.
#[derive(Debug, Clone)]
pub struct GatewaySigner {
    signing_key: SigningKey,
}

impl GatewaySigner {
    /// Generate a new random key
    pub fn generate() -> Self {
        GatewaySigner {
            signing_key: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Create from a 32-byte hex private key, with or without 0x prefix
    pub fn from_hex(key_hex: &str) -> Result<Self> {
        let key_hex = key_hex.trim().strip_prefix("0x").unwrap_or(key_hex.trim());
        let bytes = hex::decode(key_hex).context("Invalid hex in private key")?;
        let signing_key =
            SigningKey::from_slice(&bytes).context("Invalid private key, expected 32 bytes")?;
        Ok(GatewaySigner { signing_key })
    }

    /// Private key as hex (no prefix)
    pub fn to_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Ethereum address of the signer: keccak256 of the uncompressed
    /// public key, last 20 bytes
    pub fn address_bytes(&self) -> [u8; 20] {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        let digest = keccak256(&point.as_bytes()[1..]);
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&digest[12..]);
        addr
    }

    /// Ethereum address as a 0x-hex string
    pub fn address(&self) -> String {
        format!("0x{}", hex::encode(self.address_bytes()))
    }

    /// Sign a 32-byte digest, returning the 65-byte recoverable
    /// signature `r || s || v` the verifier contract expects
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; 65], GatewayError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|e| GatewayError::Signing(e.to_string()))?;

        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = 27 + recovery_id.to_byte();
        Ok(out)
    }
}

/// Get the directory where the gateway key is stored
pub fn get_key_dir() -> Result<PathBuf> {
    let home = directories::BaseDirs::new().context("Failed to determine home directory")?;
    Ok(home.data_local_dir().join("ensgate"))
}

fn key_file_path() -> Result<PathBuf> {
    Ok(get_key_dir()?.join("gateway-key.txt"))
}

/// Save the signer's private key to local storage
pub fn save_signer(signer: &GatewaySigner) -> Result<PathBuf> {
    let key_dir = get_key_dir()?;
    std::fs::create_dir_all(&key_dir).context("Failed to create key directory")?;

    let key_file = key_dir.join("gateway-key.txt");
    std::fs::write(&key_file, signer.to_hex()).context("Failed to write private key file")?;

    let meta_file = key_dir.join("gateway-key.json");
    let metadata = serde_json::json!({
        "address": signer.address(),
        "created": chrono::Utc::now().to_rfc3339(),
    });
    std::fs::write(&meta_file, serde_json::to_string_pretty(&metadata)?)
        .context("Failed to write key metadata")?;

    Ok(key_file)
}

/// Load the signer: the `GATEWAY_PRIVATE_KEY` environment variable wins,
/// otherwise the locally stored key file
pub fn load_signer() -> Result<GatewaySigner> {
    if let Ok(key_hex) = std::env::var(PRIVATE_KEY_ENV) {
        return GatewaySigner::from_hex(&key_hex)
            .with_context(|| format!("Invalid key in {}", PRIVATE_KEY_ENV));
    }

    let key_file = key_file_path()?;
    let key_hex = std::fs::read_to_string(&key_file).with_context(|| {
        format!(
            "No signing key: set {} or run 'ensgate keys generate' (looked in {})",
            PRIVATE_KEY_ENV,
            key_file.display()
        )
    })?;

    GatewaySigner::from_hex(&key_hex)
}
