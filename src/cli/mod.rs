// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! CLI command implementations

pub mod keys;
pub mod server;
