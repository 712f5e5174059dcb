// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! DNS wire-format name encoding as used in ENSIP-10 `resolve` calls
//!
//! Each label is prefixed with its length byte; a zero-length label
//! terminates the sequence. `\x05alice\x04test\x0bdivicompany\x03eth\x00`
//! decodes to `alice.test.divicompany.eth`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum NameError {
    #[error("truncated DNS-encoded name")]
    Truncated,
    #[error("label is not valid UTF-8")]
    InvalidLabel,
    #[error("label exceeds 255 bytes: {0}")]
    LabelTooLong(String),
    #[error("empty label in name")]
    EmptyLabel,
}

/// Decode a DNS-encoded name into a dot-separated string.
///
/// A lone zero byte decodes to the empty string (the root). Input that
/// runs out before the terminator is an error, never a partial name.
pub fn decode_dns_name(data: &[u8]) -> Result<String, NameError> {
    let mut labels = Vec::new();
    let mut offset = 0usize;

    loop {
        let len = *data.get(offset).ok_or(NameError::Truncated)? as usize;
        if len == 0 {
            break;
        }
        offset += 1;
        let label = data
            .get(offset..offset + len)
            .ok_or(NameError::Truncated)?;
        let label = std::str::from_utf8(label).map_err(|_| NameError::InvalidLabel)?;
        labels.push(label.to_string());
        offset += len;
    }

    Ok(labels.join("."))
}

/// Encode a dot-separated name into DNS wire format.
pub fn encode_dns_name(name: &str) -> Result<Vec<u8>, NameError> {
    let mut out = Vec::with_capacity(name.len() + 2);

    if !name.is_empty() {
        for label in name.split('.') {
            if label.is_empty() {
                return Err(NameError::EmptyLabel);
            }
            if label.len() > 255 {
                return Err(NameError::LabelTooLong(label.to_string()));
            }
            out.push(label.len() as u8);
            out.extend_from_slice(label.as_bytes());
        }
    }

    out.push(0);
    Ok(out)
}
