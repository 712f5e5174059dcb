// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! HTTP gateway server

pub mod audit;
pub mod http;

pub use audit::AuditLog;
pub use http::{run, AppState};
