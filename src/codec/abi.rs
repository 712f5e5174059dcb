// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! Minimal Ethereum ABI subset for the resolver call surface
//!
//! Covers exactly what the gateway exchanges with the on-chain verifier:
//! the `resolve(bytes,bytes)` outer call, the inner argument tuples, the
//! single-value returns, and the signed `(bytes,uint64,bytes)` envelope.

use crate::constants::SELECTOR_RESOLVE;
use thiserror::Error;

const WORD: usize = 32;

#[derive(Debug, Error, PartialEq)]
pub enum AbiError {
    #[error("call data too short")]
    Truncated,
    #[error("unexpected function selector")]
    Selector,
    #[error("offset or length out of bounds")]
    Bounds,
    #[error("string argument is not valid UTF-8")]
    Utf8,
}

fn pad_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

/// Read a 32-byte word at `offset` as usize. Words larger than u64 (or
/// usize) cannot address anything in a real call and are rejected.
fn read_usize(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    let word = data.get(offset..offset + WORD).ok_or(AbiError::Truncated)?;
    if word[..24].iter().any(|&b| b != 0) {
        return Err(AbiError::Bounds);
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(buf)).map_err(|_| AbiError::Bounds)
}

/// Read a dynamic `bytes` value whose head word sits at `head` within
/// `args` (offsets are relative to the start of the argument area).
/// Strict: the tail must be present up to its word-padded end, the way
/// every conforming encoder emits it.
fn read_dynamic_bytes(args: &[u8], head: usize) -> Result<Vec<u8>, AbiError> {
    let offset = read_usize(args, head)?;
    let len = read_usize(args, offset)?;
    let start = offset.checked_add(WORD).ok_or(AbiError::Bounds)?;
    let end = start.checked_add(len).ok_or(AbiError::Bounds)?;
    let padded_end = start.checked_add(pad_len(len)).ok_or(AbiError::Bounds)?;
    if padded_end > args.len() {
        return Err(AbiError::Bounds);
    }
    let payload = args.get(start..end).ok_or(AbiError::Bounds)?;
    Ok(payload.to_vec())
}

fn write_word_u64(out: &mut Vec<u8>, value: u64) {
    let mut word = [0u8; WORD];
    word[24..].copy_from_slice(&value.to_be_bytes());
    out.extend_from_slice(&word);
}

fn write_dynamic_tail(out: &mut Vec<u8>, payload: &[u8]) {
    write_word_u64(out, payload.len() as u64);
    out.extend_from_slice(payload);
    out.resize(out.len() + pad_len(payload.len()) - payload.len(), 0);
}

/// Decode a `resolve(bytes name, bytes data)` outer call into the
/// DNS-encoded name and the inner call bytes.
pub fn decode_resolve_calldata(data: &[u8]) -> Result<(Vec<u8>, Vec<u8>), AbiError> {
    let selector = data.get(..4).ok_or(AbiError::Truncated)?;
    if selector != SELECTOR_RESOLVE {
        return Err(AbiError::Selector);
    }
    let args = &data[4..];
    let name = read_dynamic_bytes(args, 0)?;
    let inner = read_dynamic_bytes(args, WORD)?;
    Ok((name, inner))
}

/// Encode a `resolve(bytes,bytes)` call. The inverse of
/// [`decode_resolve_calldata`]; used by client tooling and tests.
pub fn encode_resolve_calldata(wire_name: &[u8], inner: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&SELECTOR_RESOLVE);
    write_word_u64(&mut out, (2 * WORD) as u64);
    write_word_u64(&mut out, (2 * WORD + WORD + pad_len(wire_name.len())) as u64);
    write_dynamic_tail(&mut out, wire_name);
    write_dynamic_tail(&mut out, inner);
    out
}

/// Decode `(bytes32, uint256)` arguments, e.g. `addr(node, coinType)`.
/// A uint wider than 64 bits decodes as `None`: it is well-formed call
/// data, it just can never match a coin type the gateway serves.
pub fn decode_bytes32_uint(args: &[u8]) -> Result<([u8; 32], Option<u64>), AbiError> {
    let word = args.get(..WORD).ok_or(AbiError::Truncated)?;
    let mut node = [0u8; 32];
    node.copy_from_slice(word);

    let uint_word = args.get(WORD..2 * WORD).ok_or(AbiError::Truncated)?;
    let value = if uint_word[..24].iter().all(|&b| b == 0) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&uint_word[24..]);
        Some(u64::from_be_bytes(buf))
    } else {
        None
    };
    Ok((node, value))
}

/// Decode `(bytes32, string)` arguments, e.g. `text(node, key)`.
pub fn decode_bytes32_string(args: &[u8]) -> Result<([u8; 32], String), AbiError> {
    let word = args.get(..WORD).ok_or(AbiError::Truncated)?;
    let mut node = [0u8; 32];
    node.copy_from_slice(word);
    let payload = read_dynamic_bytes(args, WORD)?;
    let s = String::from_utf8(payload).map_err(|_| AbiError::Utf8)?;
    Ok((node, s))
}

/// Encode a single `address` return value
pub fn encode_address(addr: &[u8; 20]) -> Vec<u8> {
    let mut out = vec![0u8; WORD];
    out[12..].copy_from_slice(addr);
    out
}

/// Encode a single dynamic `bytes` return value
pub fn encode_bytes(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 * WORD + pad_len(payload.len()));
    write_word_u64(&mut out, WORD as u64);
    write_dynamic_tail(&mut out, payload);
    out
}

/// Encode a single `string` return value
pub fn encode_string(value: &str) -> Vec<u8> {
    encode_bytes(value.as_bytes())
}

/// Encode the signed response envelope `(bytes result, uint64 expires,
/// bytes signature)` exactly as the verifier contract decodes it.
pub fn encode_response_envelope(result: &[u8], expires: u64, signature: &[u8]) -> Vec<u8> {
    let result_tail = WORD + pad_len(result.len());
    let mut out = Vec::new();
    write_word_u64(&mut out, (3 * WORD) as u64);
    write_word_u64(&mut out, expires);
    write_word_u64(&mut out, (3 * WORD + result_tail) as u64);
    write_dynamic_tail(&mut out, result);
    write_dynamic_tail(&mut out, signature);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_calldata_round_trip() {
        let wire_name = b"\x05alice\x04test\x0bdivicompany\x03eth\x00".to_vec();
        let inner = vec![0x3b, 0x3b, 0x57, 0xde, 1, 2, 3];
        let calldata = encode_resolve_calldata(&wire_name, &inner);
        let (name_out, inner_out) = decode_resolve_calldata(&calldata).unwrap();
        assert_eq!(name_out, wire_name);
        assert_eq!(inner_out, inner);
    }

    #[test]
    fn test_decode_rejects_wrong_selector() {
        let calldata = encode_resolve_calldata(b"\x00", &[0u8; 4]);
        let mut bad = calldata.clone();
        bad[0] ^= 0xff;
        assert_eq!(decode_resolve_calldata(&bad), Err(AbiError::Selector));
    }

    #[test]
    fn test_decode_rejects_truncated() {
        let calldata = encode_resolve_calldata(b"\x03eth\x00", &[0u8; 4]);
        // missing tail padding is rejected, not silently accepted
        assert!(decode_resolve_calldata(&calldata[..calldata.len() - 8]).is_err());
        // truncation into the payload itself
        assert!(decode_resolve_calldata(&calldata[..calldata.len() - 40]).is_err());
        assert_eq!(decode_resolve_calldata(&[0x90, 0x61]), Err(AbiError::Truncated));
    }

    #[test]
    fn test_encode_address_layout() {
        let addr = [0x11u8; 20];
        let encoded = encode_address(&addr);
        assert_eq!(encoded.len(), 32);
        assert_eq!(&encoded[..12], &[0u8; 12]);
        assert_eq!(&encoded[12..], &addr);
    }

    #[test]
    fn test_encode_string_layout() {
        let encoded = encode_string("hi");
        assert_eq!(encoded.len(), 96);
        // head word: offset 0x20
        assert_eq!(encoded[31], 0x20);
        // length word
        assert_eq!(encoded[63], 2);
        assert_eq!(&encoded[64..66], b"hi");
        assert_eq!(&encoded[66..], &[0u8; 30]);
    }

    #[test]
    fn test_bytes32_uint_args() {
        let mut args = vec![0xabu8; 32];
        let mut coin = [0u8; 32];
        coin[31] = 60;
        args.extend_from_slice(&coin);
        assert_eq!(decode_bytes32_uint(&args).unwrap(), ([0xabu8; 32], Some(60)));

        // a uint that overflows u64 still decodes, as None
        let mut args = vec![0xabu8; 32];
        args.extend_from_slice(&[0xff; 32]);
        assert_eq!(decode_bytes32_uint(&args).unwrap(), ([0xabu8; 32], None));

        assert_eq!(decode_bytes32_uint(&[0u8; 32]), Err(AbiError::Truncated));
    }

    #[test]
    fn test_bytes32_string_args() {
        // Build (bytes32, string) by hand: node word, offset, len, payload
        let mut args = vec![0xabu8; 32];
        args.extend_from_slice(&{
            let mut w = [0u8; 32];
            w[31] = 0x40;
            w
        });
        args.extend_from_slice(&{
            let mut w = [0u8; 32];
            w[31] = 6;
            w
        });
        args.extend_from_slice(b"avatar");
        args.extend_from_slice(&[0u8; 26]);

        let (node, key) = decode_bytes32_string(&args).unwrap();
        assert_eq!(node, [0xabu8; 32]);
        assert_eq!(key, "avatar");
    }

    #[test]
    fn test_envelope_layout() {
        let result = vec![0xaa; 5];
        let sig = vec![0xbb; 65];
        let encoded = encode_response_envelope(&result, 1234, &sig);

        // head: offset(result)=0x60, expires, offset(sig)=0x60+0x40
        assert_eq!(encoded[31], 0x60);
        assert_eq!(&encoded[56..64], &1234u64.to_be_bytes());
        assert_eq!(encoded[95], 0xa0);
        // result tail
        assert_eq!(encoded[127], 5);
        assert_eq!(&encoded[128..133], &result[..]);
        // signature tail
        assert_eq!(encoded[191], 65);
        assert_eq!(&encoded[192..257], &sig[..]);
        // padded to word boundary
        assert_eq!(encoded.len(), 192 + 32 + 64);
    }
}
