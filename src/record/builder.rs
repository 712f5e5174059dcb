// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! Entity builder: constructs a record from a flat registration request
//!
//! The node a record is stored under is the namehash of the *derived*
//! entityid, not the literal input name. That indirection lets multiple
//! spellings of the same company collapse onto one canonical identity.

use crate::codec::{keccak256, namehash, Node};
use crate::constants::{CONSTITUTION_FIELDS, DEFAULT_REGISTRAR, EXTRA_FIELD_PREFIXES, ROOT_DOMAIN};
use crate::error::GatewayError;
use crate::record::mutation::MutationCommand;
use crate::record::store::RecordStore;
use crate::record::{
    value_to_string, ChangelogEntry, EntityRecord, Partner, RegisterRequest, FLAG_FIELDS,
    SCALAR_FIELDS,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Punctuation stripped before hyphenation
const STRIPPED_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '\'', '"', '!', '?', '(', ')', '[', ']', '{', '}', '&', '@', '#', '$',
    '%', '^', '*', '+', '=', '/', '\\', '|', '<', '>', '~', '`',
];

/// Normalize a label into its canonical entityid segment: lower-case,
/// strip punctuation, whitespace runs become single hyphens, repeated
/// hyphens collapse, anything outside `[a-z0-9-]` is dropped. The result
/// never starts or ends with a hyphen.
pub fn normalize_label(label: &str) -> String {
    let lowered = label.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();

    let mut out = String::with_capacity(stripped.len());
    let mut last_hyphen = false;
    for c in stripped.chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' {
            if !last_hyphen {
                out.push('-');
            }
            last_hyphen = true;
        } else if c.is_ascii_alphanumeric() {
            out.push(c);
            last_hyphen = false;
        }
        // anything else outside [a-z0-9-] is dropped without breaking
        // a hyphen run
    }
    out.trim_matches('-').to_string()
}

/// Derive the canonical entity identifier for a label under a registrar
pub fn derive_entityid(label: &str, registrar: &str) -> String {
    format!("{}.{}.{}", normalize_label(label), registrar, ROOT_DOMAIN).to_lowercase()
}

/// Values treated as "empty" and excluded from the commitment
fn is_empty_sentinel(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "false" || s == "NULL",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Compute the constitution hash commitment for a record.
///
/// The allow-listed fields are collected into a key-sorted map, empty
/// sentinels dropped, and the map serialized as compact JSON before
/// hashing. Insertion order therefore never leaks into the digest.
/// The encoding is load-bearing: existing on-chain commitments were
/// computed against exactly this byte layout.
pub fn compute_constitution_hash(record: &EntityRecord) -> String {
    let mut committed: BTreeMap<&str, Value> = BTreeMap::new();
    for field in CONSTITUTION_FIELDS {
        if let Some(value) = record.get_field(field) {
            if !is_empty_sentinel(&value) {
                committed.insert(field, value);
            }
        }
    }

    // BTreeMap iterates key-sorted; serde_json emits no insignificant
    // whitespace, so the serialization is canonical.
    let serialized = serde_json::to_vec(&committed).unwrap_or_default();
    format!("0x{}", hex::encode(keccak256(&serialized)))
}

/// Parse a caller-supplied `partners` array, defaulting roles to manager
fn parse_partner_array(items: &[Value]) -> Vec<Partner> {
    items
        .iter()
        .map(|item| serde_json::from_value(item.clone()).unwrap_or_default())
        .collect()
}

/// Assemble partners from flat `partner__[i]__field` keys, auto-growing
/// with default entries for any index gap
fn collect_flat_partners(request: &RegisterRequest) -> Vec<Partner> {
    let mut partners: Vec<Partner> = Vec::new();

    for (key, value) in request {
        match MutationCommand::parse(key, value) {
            MutationCommand::SetPartnerField { index, field } => {
                partner_at(&mut partners, index).set_field(&field, value);
            }
            MutationCommand::SetPartnerRole {
                index,
                role,
                enabled,
            } => {
                let partner = partner_at(&mut partners, index);
                if enabled {
                    partner.add_role(&role);
                } else {
                    partner.remove_role(&role);
                }
            }
            _ => {}
        }
    }

    partners
}

fn partner_at(partners: &mut Vec<Partner>, index: usize) -> &mut Partner {
    while partners.len() <= index {
        partners.push(Partner::default());
    }
    &mut partners[index]
}

fn is_consumed_key(key: &str) -> bool {
    matches!(
        key,
        "name" | "registrar" | "owner" | "address" | "partners" | "texts" | "contenthash"
    ) || SCALAR_FIELDS.contains(&key)
        || FLAG_FIELDS.contains(&key)
        || key.starts_with("partner__[")
}

/// Build an entity record from a registration request.
///
/// Returns the record together with the node it must be stored under.
/// Pure construction; duplicate-node rejection happens in
/// [`register_entity`].
pub fn build_entity(
    name: &str,
    request: &RegisterRequest,
) -> Result<(Node, EntityRecord), GatewayError> {
    if name.is_empty() {
        return Err(GatewayError::BadRequest("name is required".to_string()));
    }

    let label = name.split('.').next().unwrap_or_default();
    let registrar = request
        .get("registrar")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_REGISTRAR)
        .to_lowercase();

    let entityid = derive_entityid(label, &registrar);
    let node = namehash(&entityid);

    let mut record = EntityRecord {
        name: name.to_string(),
        entityid,
        registrar,
        ..Default::default()
    };

    if let Some(owner) = request.get("owner").or_else(|| request.get("address")) {
        record.set_field("address", owner);
    }

    for field in SCALAR_FIELDS {
        if let Some(value) = request.get(*field) {
            record.set_field(field, value);
        }
    }
    for field in FLAG_FIELDS {
        if let Some(value) = request.get(*field) {
            record.set_field(field, value);
        }
    }

    record.partners = match request.get("partners") {
        Some(Value::Array(items)) => parse_partner_array(items),
        _ => collect_flat_partners(request),
    };

    if let Some(Value::Object(texts)) = request.get("texts") {
        record.texts = texts
            .iter()
            .map(|(k, v)| (k.clone(), value_to_string(v)))
            .collect();
    }

    if let Some(contenthash) = request.get("contenthash") {
        record.set_field("contenthash", contenthash);
    }

    // Carry through recognized pass-through keys unmodified
    for (key, value) in request {
        if is_consumed_key(key) {
            continue;
        }
        let lowered = key.to_lowercase();
        if EXTRA_FIELD_PREFIXES
            .iter()
            .any(|prefix| lowered.starts_with(prefix))
        {
            record.extra.insert(key.clone(), value.clone());
        }
    }

    record.changelogs.push(ChangelogEntry {
        node,
        changed_properties: record.snapshot_fields(),
        source_function: "register".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    });

    record.constitutionhash = compute_constitution_hash(&record);

    Ok((node, record))
}

/// Build and store a new entity. A node that is already registered is a
/// conflict and the stored record stays untouched.
pub fn register_entity(
    store: &mut dyn RecordStore,
    name: &str,
    request: &RegisterRequest,
) -> Result<(Node, EntityRecord), GatewayError> {
    let (node, record) = build_entity(name, request)?;
    if store.has(&node) {
        return Err(GatewayError::Conflict(format!(
            "node {} already registered",
            node
        )));
    }
    store.put(node, record.clone());
    Ok((node, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> RegisterRequest {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("Acme, Inc."), "acme-inc");
        assert_eq!(normalize_label("  Wide   Gaps  "), "wide-gaps");
        assert_eq!(normalize_label("a--b---c"), "a-b-c");
        assert_eq!(normalize_label("Ümlaut Ltd"), "mlaut-ltd");
        assert_eq!(normalize_label("plain"), "plain");
    }

    #[test]
    fn test_normalize_label_trims_edge_hyphens() {
        // leading/trailing whitespace must not survive as hyphens
        assert_eq!(normalize_label("  edge  "), "edge");
        assert_eq!(normalize_label("-dashed-"), "dashed");
        assert_eq!(normalize_label(" - mixed - "), "mixed");
        assert_eq!(
            derive_entityid("  Wide   Gaps  ", "test"),
            "wide-gaps.test.divicompany.eth"
        );
    }

    #[test]
    fn test_entityid_derivation() {
        assert_eq!(
            derive_entityid("Alice", "test"),
            "alice.test.divicompany.eth"
        );
    }

    #[test]
    fn test_build_entity_basics() {
        let req = request(json!({
            "owner": "0x1234567890123456789012345678901234567890",
            "description": "first entity",
            "tokenSymbol": "DIVI",
            "ignoredKey": "dropped",
        }));
        let (node, record) = build_entity("alice.test.divicompany.eth", &req).unwrap();

        assert_eq!(node, namehash("alice.test.divicompany.eth"));
        assert_eq!(record.entityid, "alice.test.divicompany.eth");
        assert_eq!(record.registrar, "test");
        assert_eq!(
            record.address.as_deref(),
            Some("0x1234567890123456789012345678901234567890")
        );
        assert_eq!(record.description, "first entity");
        // recognized prefix carried through, unrecognized dropped
        assert_eq!(record.extra.get("tokenSymbol"), Some(&json!("DIVI")));
        assert!(!record.extra.contains_key("ignoredKey"));
    }

    #[test]
    fn test_initial_changelog_is_register() {
        let (node, record) = build_entity("alice.test.divicompany.eth", &request(json!({}))).unwrap();
        assert_eq!(record.changelogs.len(), 1);
        let entry = &record.changelogs[0];
        assert_eq!(entry.source_function, "register");
        assert_eq!(entry.node, node);
        assert!(entry.changed_properties.contains_key("entityid"));
        assert!(!entry.changed_properties.contains_key("changelogs"));
    }

    #[test]
    fn test_flat_partner_keys() {
        let req = request(json!({
            "partner__[0]__name": "Bob",
            "partner__[0]__shares": "40",
            "partner__[2]__name": "Carol",
            "partner__[0]__is__signer": "true",
        }));
        let (_, record) = build_entity("acme.test.divicompany.eth", &req).unwrap();

        assert_eq!(record.partners.len(), 3);
        assert_eq!(record.partners[0].name, "Bob");
        assert_eq!(record.partners[0].shares, "40");
        assert_eq!(record.partners[0].roles, vec!["manager", "signer"]);
        // gap filled with a default entry
        assert_eq!(record.partners[1], Partner::default());
        assert_eq!(record.partners[2].name, "Carol");
    }

    #[test]
    fn test_typed_partner_array_wins() {
        let req = request(json!({
            "partners": [{"name": "Dora", "shares": "100"}],
            "partner__[0]__name": "ignored",
        }));
        let (_, record) = build_entity("acme.test.divicompany.eth", &req).unwrap();
        assert_eq!(record.partners.len(), 1);
        assert_eq!(record.partners[0].name, "Dora");
        assert_eq!(record.partners[0].roles, vec!["manager"]);
    }

    #[test]
    fn test_constitution_hash_order_independent() {
        let mut a = EntityRecord::default();
        let mut b = EntityRecord::default();

        // Same values assigned in different order
        a.set_field("companyName", &json!("Acme"));
        a.set_field("jurisdiction", &json!("CH"));
        b.set_field("jurisdiction", &json!("CH"));
        b.set_field("companyName", &json!("Acme"));

        assert_eq!(compute_constitution_hash(&a), compute_constitution_hash(&b));
    }

    #[test]
    fn test_constitution_hash_ignores_empty_sentinels() {
        let base = EntityRecord::default();
        let mut with_empties = EntityRecord::default();
        with_empties.set_field("companyName", &json!(""));
        with_empties.set_field("lei", &json!("NULL"));
        with_empties.set_field("arbitrator", &json!("false"));

        assert_eq!(
            compute_constitution_hash(&base),
            compute_constitution_hash(&with_empties)
        );

        let mut changed = EntityRecord::default();
        changed.set_field("companyName", &json!("Acme"));
        assert_ne!(
            compute_constitution_hash(&base),
            compute_constitution_hash(&changed)
        );
    }

    #[test]
    fn test_duplicate_registration_is_conflict() {
        use crate::record::store::MemoryStore;

        let mut store = MemoryStore::new();
        let (node, _) = register_entity(
            &mut store,
            "alice.test.divicompany.eth",
            &request(json!({ "description": "first" })),
        )
        .unwrap();

        let err = register_entity(
            &mut store,
            "alice.test.divicompany.eth",
            &request(json!({ "description": "second" })),
        )
        .unwrap_err();
        assert!(matches!(err, GatewayError::Conflict(_)));

        // the stored record must be the first one, untouched
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&node).unwrap().description, "first");
    }

    #[test]
    fn test_constitution_hash_set_on_creation() {
        let (_, record) = build_entity("alice.test.divicompany.eth", &request(json!({}))).unwrap();
        assert!(record.constitutionhash.starts_with("0x"));
        assert_eq!(record.constitutionhash.len(), 66);
        assert_eq!(record.constitutionhash, compute_constitution_hash(&record));
    }
}
