// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! Entity record data model

pub mod builder;
pub mod mutation;
pub mod query;
pub mod store;

pub use builder::{build_entity, compute_constitution_hash, normalize_label, register_entity};
pub use mutation::{set_field_update, MutationCommand};
pub use query::{EntityQuery, SortDir};
pub use store::{MemoryStore, RecordStore};

use crate::codec::Node;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Named scalar fields with an empty-string default, by JSON name.
/// Grouped: provenance, company, legal entity, arbitrator, profile.
pub const SCALAR_FIELDS: &[&str] = &[
    "birthdate",
    "source",
    "companyName",
    "companyType",
    "jurisdiction",
    "registrationNumber",
    "legalForm",
    "lei",
    "arbitrator",
    "arbitrationRules",
    "avatar",
    "description",
    "location",
    "url",
    "email",
    "keywords",
    "category",
];

/// Boolean visibility and feature flags, default false
pub const FLAG_FIELDS: &[&str] = &["publicProfile", "showPartners", "aiAgentEnabled"];

/// A partner sub-record. `roles` behaves as an ordered set; a partner
/// created implicitly always starts as a manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Partner {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub partner_type: String,
    #[serde(default)]
    pub walletaddress: String,
    #[serde(default)]
    pub shares: String,
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
    #[serde(default)]
    pub birthdate: String,
    #[serde(default)]
    pub location: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_roles() -> Vec<String> {
    vec!["manager".to_string()]
}

impl Default for Partner {
    fn default() -> Self {
        Partner {
            name: String::new(),
            partner_type: String::new(),
            walletaddress: String::new(),
            shares: String::new(),
            roles: default_roles(),
            birthdate: String::new(),
            location: String::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl Partner {
    /// Add a role if absent; idempotent
    pub fn add_role(&mut self, role: &str) {
        if !self.roles.iter().any(|r| r == role) {
            self.roles.push(role.to_string());
        }
    }

    pub fn remove_role(&mut self, role: &str) {
        self.roles.retain(|r| r != role);
    }

    /// Set one named partner field; unknown names land in `extra`
    pub fn set_field(&mut self, field: &str, value: &Value) {
        match field {
            "name" => self.name = value_to_string(value),
            "type" => self.partner_type = value_to_string(value),
            "walletaddress" => self.walletaddress = value_to_string(value),
            "shares" => self.shares = value_to_string(value),
            "birthdate" => self.birthdate = value_to_string(value),
            "location" => self.location = value_to_string(value),
            "roles" => {
                if let Value::Array(items) = value {
                    self.roles = items.iter().map(value_to_string).collect();
                }
            }
            _ => {
                self.extra.insert(field.to_string(), value.clone());
            }
        }
    }

    /// Read one named partner field as a JSON value
    pub fn get_field(&self, field: &str) -> Option<Value> {
        match field {
            "name" => Some(Value::String(self.name.clone())),
            "type" => Some(Value::String(self.partner_type.clone())),
            "walletaddress" => Some(Value::String(self.walletaddress.clone())),
            "shares" => Some(Value::String(self.shares.clone())),
            "birthdate" => Some(Value::String(self.birthdate.clone())),
            "location" => Some(Value::String(self.location.clone())),
            "roles" => serde_json::to_value(&self.roles).ok(),
            _ => self.extra.get(field).cloned(),
        }
    }
}

/// One append-only change entry. Never mutated once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub node: Node,
    #[serde(rename = "changedProperties")]
    pub changed_properties: BTreeMap<String, Value>,
    #[serde(rename = "sourceFunction")]
    pub source_function: String,
    pub timestamp: String,
}

/// A structured entity record, keyed in the store by its node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub entityid: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub registrar: String,
    #[serde(default)]
    pub birthdate: String,
    #[serde(default)]
    pub source: String,

    // Company info
    #[serde(rename = "companyName", default)]
    pub company_name: String,
    #[serde(rename = "companyType", default)]
    pub company_type: String,
    #[serde(default)]
    pub jurisdiction: String,
    #[serde(rename = "registrationNumber", default)]
    pub registration_number: String,

    // Legal entity info
    #[serde(rename = "legalForm", default)]
    pub legal_form: String,
    #[serde(default)]
    pub lei: String,

    // Arbitrator info
    #[serde(default)]
    pub arbitrator: String,
    #[serde(rename = "arbitrationRules", default)]
    pub arbitration_rules: String,

    // Profile
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub partners: Vec<Partner>,

    /// Free-form resolver text records; the backward-compatible path
    #[serde(default)]
    pub texts: BTreeMap<String, String>,

    /// Content hash blob, 0x-hex
    #[serde(default)]
    pub contenthash: Option<String>,

    #[serde(default)]
    pub changelogs: Vec<ChangelogEntry>,

    /// Commitment over the allow-listed field set, 0x-hex keccak256
    #[serde(default)]
    pub constitutionhash: String,

    // Visibility and feature flags
    #[serde(rename = "publicProfile", default)]
    pub public_profile: bool,
    #[serde(rename = "showPartners", default)]
    pub show_partners: bool,
    #[serde(rename = "aiAgentEnabled", default)]
    pub ai_agent_enabled: bool,

    /// Pass-through fields (recognized prefixes) and dynamic array bases
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Render any JSON value as the string form mutations store
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Loose boolean reading for role flags: true, "true", "1", nonzero
pub fn value_is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true" || s == "1",
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        _ => false,
    }
}

impl EntityRecord {
    /// Read a top-level field by its JSON name. Unknown names fall back
    /// to the pass-through map.
    pub fn get_field(&self, key: &str) -> Option<Value> {
        match key {
            "name" => Some(Value::String(self.name.clone())),
            "entityid" => Some(Value::String(self.entityid.clone())),
            "address" | "owner" => Some(match &self.address {
                Some(a) => Value::String(a.clone()),
                None => Value::Null,
            }),
            "registrar" => Some(Value::String(self.registrar.clone())),
            "birthdate" => Some(Value::String(self.birthdate.clone())),
            "source" => Some(Value::String(self.source.clone())),
            "companyName" => Some(Value::String(self.company_name.clone())),
            "companyType" => Some(Value::String(self.company_type.clone())),
            "jurisdiction" => Some(Value::String(self.jurisdiction.clone())),
            "registrationNumber" => Some(Value::String(self.registration_number.clone())),
            "legalForm" => Some(Value::String(self.legal_form.clone())),
            "lei" => Some(Value::String(self.lei.clone())),
            "arbitrator" => Some(Value::String(self.arbitrator.clone())),
            "arbitrationRules" => Some(Value::String(self.arbitration_rules.clone())),
            "avatar" => Some(Value::String(self.avatar.clone())),
            "description" => Some(Value::String(self.description.clone())),
            "location" => Some(Value::String(self.location.clone())),
            "url" => Some(Value::String(self.url.clone())),
            "email" => Some(Value::String(self.email.clone())),
            "keywords" => Some(Value::String(self.keywords.clone())),
            "category" => Some(Value::String(self.category.clone())),
            "partners" => serde_json::to_value(&self.partners).ok(),
            "texts" => serde_json::to_value(&self.texts).ok(),
            "contenthash" => Some(match &self.contenthash {
                Some(h) => Value::String(h.clone()),
                None => Value::Null,
            }),
            "constitutionhash" => Some(Value::String(self.constitutionhash.clone())),
            "publicProfile" => Some(Value::Bool(self.public_profile)),
            "showPartners" => Some(Value::Bool(self.show_partners)),
            "aiAgentEnabled" => Some(Value::Bool(self.ai_agent_enabled)),
            _ => self.extra.get(key).cloned(),
        }
    }

    /// Assign a top-level field by its JSON name, returning the prior
    /// value for the changelog. Unknown names are stored as-is in the
    /// pass-through map.
    pub fn set_field(&mut self, key: &str, value: &Value) -> Value {
        let prior = self.get_field(key).unwrap_or(Value::Null);
        match key {
            "name" => self.name = value_to_string(value),
            "entityid" => self.entityid = value_to_string(value),
            "address" | "owner" => {
                self.address = match value {
                    Value::Null => None,
                    v => {
                        let s = value_to_string(v);
                        if s.is_empty() {
                            None
                        } else {
                            Some(s)
                        }
                    }
                }
            }
            "registrar" => self.registrar = value_to_string(value),
            "birthdate" => self.birthdate = value_to_string(value),
            "source" => self.source = value_to_string(value),
            "companyName" => self.company_name = value_to_string(value),
            "companyType" => self.company_type = value_to_string(value),
            "jurisdiction" => self.jurisdiction = value_to_string(value),
            "registrationNumber" => self.registration_number = value_to_string(value),
            "legalForm" => self.legal_form = value_to_string(value),
            "lei" => self.lei = value_to_string(value),
            "arbitrator" => self.arbitrator = value_to_string(value),
            "arbitrationRules" => self.arbitration_rules = value_to_string(value),
            "avatar" => self.avatar = value_to_string(value),
            "description" => self.description = value_to_string(value),
            "location" => self.location = value_to_string(value),
            "url" => self.url = value_to_string(value),
            "email" => self.email = value_to_string(value),
            "keywords" => self.keywords = value_to_string(value),
            "category" => self.category = value_to_string(value),
            "partners" => {
                if let Ok(partners) = serde_json::from_value(value.clone()) {
                    self.partners = partners;
                }
            }
            "texts" => {
                if let Ok(texts) = serde_json::from_value(value.clone()) {
                    self.texts = texts;
                }
            }
            "contenthash" => {
                self.contenthash = match value {
                    Value::Null => None,
                    v => Some(value_to_string(v)),
                }
            }
            "publicProfile" => self.public_profile = value_is_truthy(value),
            "showPartners" => self.show_partners = value_is_truthy(value),
            "aiAgentEnabled" => self.ai_agent_enabled = value_is_truthy(value),
            _ => {
                self.extra.insert(key.to_string(), value.clone());
            }
        }
        prior
    }

    /// Partner at `index`, growing the list with default entries
    pub fn partner_at(&mut self, index: usize) -> &mut Partner {
        while self.partners.len() <= index {
            self.partners.push(Partner::default());
        }
        &mut self.partners[index]
    }

    /// Full field snapshot for the initial changelog entry
    pub fn snapshot_fields(&self) -> BTreeMap<String, Value> {
        let mut map = BTreeMap::new();
        if let Ok(Value::Object(obj)) = serde_json::to_value(self) {
            for (key, value) in obj {
                if key == "changelogs" {
                    continue;
                }
                map.insert(key, value);
            }
        }
        map
    }

    /// Record as a JSON object with its node attached, the shape the
    /// listing endpoints return
    pub fn to_json_with_node(&self, node: &Node) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(obj) = &mut value {
            obj.insert("node".to_string(), Value::String(node.to_hex()));
        }
        value
    }
}

/// Typed view of a flat `/register` request body
pub type RegisterRequest = Map<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partner_roles_are_a_set() {
        let mut partner = Partner::default();
        assert_eq!(partner.roles, vec!["manager"]);

        partner.add_role("signer");
        partner.add_role("signer");
        assert_eq!(partner.roles, vec!["manager", "signer"]);

        partner.remove_role("manager");
        assert_eq!(partner.roles, vec!["signer"]);
    }

    #[test]
    fn test_set_field_returns_prior_value() {
        let mut record = EntityRecord::default();
        let prior = record.set_field("description", &json!("a company"));
        assert_eq!(prior, json!(""));
        let prior = record.set_field("description", &json!("changed"));
        assert_eq!(prior, json!("a company"));
        assert_eq!(record.description, "changed");
    }

    #[test]
    fn test_unknown_field_lands_in_extra() {
        let mut record = EntityRecord::default();
        record.set_field("tokenSymbol", &json!("DIVI"));
        assert_eq!(record.get_field("tokenSymbol"), Some(json!("DIVI")));
        assert_eq!(record.extra.get("tokenSymbol"), Some(&json!("DIVI")));
    }

    #[test]
    fn test_extra_fields_serialize_flat() {
        let mut record = EntityRecord::default();
        record.name = "alice.test.divicompany.eth".to_string();
        record.extra.insert("tokenSymbol".to_string(), json!("DIVI"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["tokenSymbol"], json!("DIVI"));
        assert_eq!(value["name"], json!("alice.test.divicompany.eth"));
    }

    #[test]
    fn test_owner_aliases_address() {
        let mut record = EntityRecord::default();
        record.set_field("owner", &json!("0x1234"));
        assert_eq!(record.address.as_deref(), Some("0x1234"));
        assert_eq!(record.get_field("address"), Some(json!("0x1234")));
    }
}
