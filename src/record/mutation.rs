// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! Field-mutation engine
//!
//! Update keys arrive in a flat string convention
//! (`partner__[0]__is__signer`, `image__[1]`, `description`). They are
//! parsed once at the boundary into a closed command type and dispatched
//! without any further string pattern-matching.

use crate::codec::Node;
use crate::error::GatewayError;
use crate::record::builder::compute_constitution_hash;
use crate::record::store::RecordStore;
use crate::record::{value_is_truthy, value_to_string, ChangelogEntry, EntityRecord};
use serde_json::Value;
use std::collections::BTreeMap;

/// One parsed update command
#[derive(Debug, Clone, PartialEq)]
pub enum MutationCommand {
    /// Direct assignment of a top-level field
    SetScalar { key: String },
    /// Set or delete index `index` of array field `base`
    SetArrayIndex { base: String, index: usize },
    /// Set one field of partner `index`
    SetPartnerField { index: usize, field: String },
    /// Toggle a role tag on partner `index`
    SetPartnerRole {
        index: usize,
        role: String,
        enabled: bool,
    },
}

/// Split `prefix__[i]__rest` style keys: returns (index, rest-after-`]__`)
fn parse_indexed(key: &str, prefix: &str) -> Option<(usize, String)> {
    let rest = key.strip_prefix(prefix)?;
    let close = rest.find(']')?;
    let index: usize = rest[..close].parse().ok()?;
    let tail = rest[close + 1..].strip_prefix("__")?;
    Some((index, tail.to_string()))
}

impl MutationCommand {
    /// Parse an update key. The value participates only to resolve role
    /// flags into their enabled/disabled form.
    pub fn parse(key: &str, value: &Value) -> MutationCommand {
        if let Some((index, field)) = parse_indexed(key, "partner__[") {
            if let Some(role) = field.strip_prefix("is__") {
                return MutationCommand::SetPartnerRole {
                    index,
                    role: role.to_string(),
                    enabled: value_is_truthy(value),
                };
            }
            return MutationCommand::SetPartnerField { index, field };
        }

        // <base>__[<i>]
        if let Some(open) = key.find("__[") {
            if let Some(inner) = key[open + 3..].strip_suffix(']') {
                if let Ok(index) = inner.parse::<usize>() {
                    return MutationCommand::SetArrayIndex {
                        base: key[..open].to_string(),
                        index,
                    };
                }
            }
        }

        MutationCommand::SetScalar {
            key: key.to_string(),
        }
    }
}

/// Apply an indexed-array update to a record. Array bases live in the
/// pass-through map. An empty-string value deletes the index (shift-left);
/// a non-array base is replaced by a single-element array.
fn apply_array_index(
    record: &mut EntityRecord,
    base: &str,
    index: usize,
    value: &Value,
) -> Value {
    let delete = matches!(value, Value::String(s) if s.is_empty());
    let current = record.extra.get(base).cloned();

    let mut items = match current {
        Some(Value::Array(items)) => items,
        _ => {
            if delete {
                return Value::Null;
            }
            record
                .extra
                .insert(base.to_string(), Value::Array(vec![value.clone()]));
            return Value::Null;
        }
    };

    let prior = items.get(index).cloned().unwrap_or(Value::Null);
    if delete {
        if index < items.len() {
            items.remove(index);
        }
    } else {
        while items.len() <= index {
            items.push(Value::String(String::new()));
        }
        items[index] = value.clone();
    }
    record.extra.insert(base.to_string(), Value::Array(items));
    prior
}

/// Apply a parsed command, returning the prior value for the changelog
pub fn apply_mutation(record: &mut EntityRecord, command: &MutationCommand, value: &Value) -> Value {
    match command {
        MutationCommand::SetScalar { key } => record.set_field(key, value),
        MutationCommand::SetArrayIndex { base, index } => {
            apply_array_index(record, base, *index, value)
        }
        MutationCommand::SetPartnerField { index, field } => {
            let partner = record.partner_at(*index);
            let prior = partner.get_field(field).unwrap_or(Value::Null);
            partner.set_field(field, value);
            prior
        }
        MutationCommand::SetPartnerRole {
            index,
            role,
            enabled,
        } => {
            let partner = record.partner_at(*index);
            let prior = serde_json::to_value(&partner.roles).unwrap_or(Value::Null);
            if *enabled {
                partner.add_role(role);
            } else {
                partner.remove_role(role);
            }
            prior
        }
    }
}

/// Apply one targeted update to the record stored at `node`.
///
/// Appends exactly one changelog entry recording the field's prior value
/// and recomputes the constitution hash before the record is written
/// back. Returns the updated record.
pub fn set_field_update(
    store: &mut dyn RecordStore,
    node: &Node,
    key: &str,
    value: &Value,
) -> Result<EntityRecord, GatewayError> {
    if key.is_empty() {
        return Err(GatewayError::BadRequest("key is required".to_string()));
    }

    let mut record = store
        .get(node)
        .ok_or_else(|| GatewayError::NotFound(format!("no record for node {}", node)))?;

    let command = MutationCommand::parse(key, value);
    let prior = apply_mutation(&mut record, &command, value);

    let mut changed = BTreeMap::new();
    changed.insert(key.to_string(), prior);
    record.changelogs.push(ChangelogEntry {
        node: *node,
        changed_properties: changed,
        source_function: "setText".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    });

    record.constitutionhash = compute_constitution_hash(&record);

    store.put(*node, record.clone());

    tracing::debug!(
        node = %node,
        key,
        value = %value_to_string(value),
        "record field updated"
    );

    Ok(record)
}
