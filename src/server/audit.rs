// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! Append-only audit trail
//!
//! One JSON line per significant event (startup, registration, mutation,
//! resolution). Purely diagnostic: never reloaded at startup, and a
//! failed write must not fail the request that produced it.

use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;

pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        AuditLog { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Append one event. `data` should be a JSON object; its fields are
    /// merged beside the timestamp and message.
    pub fn append(&self, message: &str, data: Value) {
        let mut entry = serde_json::json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "message": message,
        });
        if let (Value::Object(entry_map), Value::Object(data_map)) = (&mut entry, data) {
            for (key, value) in data_map {
                entry_map.insert(key, value);
            }
        }

        tracing::info!(message, "audit");

        let line = entry.to_string();
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{}", line));

        if let Err(e) = result {
            tracing::warn!("Failed to write audit log {}: {}", self.path.display(), e);
        }
    }
}
