// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! Gateway error taxonomy

use thiserror::Error;

/// Errors surfaced by the resolution and record-management engine.
///
/// Each variant maps to one HTTP status. Resolution queries are the one
/// exception: an unset field is a successful empty-bytes answer there,
/// never a `NotFound`.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed outer or inner call data
    #[error("failed to decode call data: {0}")]
    Decode(String),

    /// Record (or addressed field) does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Registration collides with an existing node
    #[error("already registered: {0}")]
    Conflict(String),

    /// Signing key unavailable or signer failure; never retried
    #[error("signing failed: {0}")]
    Signing(String),

    /// Request is structurally invalid (missing name, empty key, bad hex)
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl GatewayError {
    /// HTTP status code this error maps to on the direct APIs
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Decode(_) | GatewayError::BadRequest(_) => 400,
            GatewayError::NotFound(_) => 404,
            GatewayError::Conflict(_) => 409,
            GatewayError::Signing(_) => 500,
        }
    }
}
