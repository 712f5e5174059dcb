// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

/// Root domain all offchain entity identifiers live under
pub const ROOT_DOMAIN: &str = "divicompany.eth";

/// Registrar tag used when a registration does not name one
pub const DEFAULT_REGISTRAR: &str = "test";

/// Default HTTP gateway port
pub const GATEWAY_PORT: u16 = 3001;

/// Signature validity window: 100 days, in seconds
pub const DEFAULT_TTL_SECS: u64 = 3600 * 24 * 100;

/// Default audit log file, one JSON entry per line
pub const AUDIT_LOG_FILE: &str = "subdomain-registrations.log";

/// Environment variable holding the gateway signing key (hex)
pub const PRIVATE_KEY_ENV: &str = "GATEWAY_PRIVATE_KEY";

/// `resolve(bytes,bytes)`, the ENSIP-10 wildcard entry point
pub const SELECTOR_RESOLVE: [u8; 4] = [0x90, 0x61, 0xb9, 0x23];

/// `addr(bytes32)`
pub const SELECTOR_ADDR: [u8; 4] = [0x3b, 0x3b, 0x57, 0xde];

/// `addr(bytes32,uint256)`
pub const SELECTOR_ADDR_COIN: [u8; 4] = [0xf1, 0xcb, 0x7e, 0x06];

/// `text(bytes32,string)`
pub const SELECTOR_TEXT: [u8; 4] = [0x59, 0xd1, 0xd4, 0x3c];

/// `contenthash(bytes32)`
pub const SELECTOR_CONTENTHASH: [u8; 4] = [0xbc, 0x1c, 0x58, 0xd1];

/// SLIP-44 coin type for the network-native coin (ETH)
pub const COIN_TYPE_ETH: u64 = 60;

/// Fields that participate in the constitution hash commitment.
/// The set and its canonical encoding must never change once commitments
/// computed against them exist on chain.
pub const CONSTITUTION_FIELDS: &[&str] = &[
    "address",
    "arbitrationRules",
    "arbitrator",
    "birthdate",
    "companyName",
    "companyType",
    "entityid",
    "jurisdiction",
    "legalForm",
    "lei",
    "name",
    "partners",
    "registrar",
    "registrationNumber",
];

/// Key prefixes carried through unmodified at registration time
pub const EXTRA_FIELD_PREFIXES: &[&str] = &["token", "location", "aiagent", "source"];
