// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! Entity listing: filter, sort, paginate

use crate::codec::Node;
use crate::record::{value_to_string, EntityRecord};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// Registrar filter: `any`, one exact tag, or a comma-separated set
#[derive(Debug, Clone, Default)]
pub enum RegistrarFilter {
    #[default]
    Any,
    OneOf(Vec<String>),
}

impl RegistrarFilter {
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() || raw == "any" {
            return RegistrarFilter::Any;
        }
        RegistrarFilter::OneOf(
            raw.split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    fn matches(&self, registrar: &str) -> bool {
        match self {
            RegistrarFilter::Any => true,
            RegistrarFilter::OneOf(tags) => tags.iter().any(|t| t == &registrar.to_lowercase()),
        }
    }
}

/// Fields scanned by the case-insensitive substring match
const SUBSTRING_FIELDS: &[&str] = &["name", "companyName", "keywords", "description"];

const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct EntityQuery {
    pub registrar: RegistrarFilter,
    pub page: usize,
    pub limit: usize,
    pub name_substring: Option<String>,
    pub sort_field: String,
    pub sort_dir: SortDir,
}

impl Default for EntityQuery {
    fn default() -> Self {
        EntityQuery {
            registrar: RegistrarFilter::Any,
            page: 0,
            limit: DEFAULT_LIMIT,
            name_substring: None,
            sort_field: "name".to_string(),
            sort_dir: SortDir::Asc,
        }
    }
}

impl EntityQuery {
    /// Build a query from decoded URL query parameters
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let mut query = EntityQuery::default();

        if let Some(registrar) = params.get("registrar") {
            query.registrar = RegistrarFilter::parse(registrar);
        }
        if let Some(page) = params.get("page").and_then(|p| p.parse().ok()) {
            query.page = page;
        }
        if let Some(limit) = params.get("limit").and_then(|l| l.parse().ok()) {
            query.limit = limit;
        }
        if let Some(substring) = params.get("nameSubstring").filter(|s| !s.is_empty()) {
            query.name_substring = Some(substring.to_lowercase());
        }
        if let Some(field) = params.get("sortField").filter(|s| !s.is_empty()) {
            query.sort_field = field.clone();
        }
        if params.get("sortDir").map(String::as_str) == Some("desc") {
            query.sort_dir = SortDir::Desc;
        }

        query
    }

    fn matches(&self, record: &EntityRecord) -> bool {
        if !self.registrar.matches(&record.registrar) {
            return false;
        }
        if let Some(needle) = &self.name_substring {
            return SUBSTRING_FIELDS.iter().any(|field| {
                record
                    .get_field(field)
                    .map(|v| value_to_string(&v).to_lowercase().contains(needle))
                    .unwrap_or(false)
            });
        }
        true
    }

    /// Filter, sort, and slice one page out of the full record list
    pub fn run(&self, records: Vec<(Node, EntityRecord)>) -> Vec<(Node, EntityRecord)> {
        let mut filtered: Vec<(Node, EntityRecord)> = records
            .into_iter()
            .filter(|(_, record)| self.matches(record))
            .collect();

        filtered.sort_by(|(_, a), (_, b)| {
            let ka = a
                .get_field(&self.sort_field)
                .map(|v| value_to_string(&v))
                .unwrap_or_default();
            let kb = b
                .get_field(&self.sort_field)
                .map(|v| value_to_string(&v))
                .unwrap_or_default();
            let ord = ka.cmp(&kb);
            match self.sort_dir {
                SortDir::Asc => ord,
                SortDir::Desc => ord.reverse(),
            }
        });

        let start = self.page.saturating_mul(self.limit);
        if start >= filtered.len() {
            return Vec::new();
        }
        filtered.into_iter().skip(start).take(self.limit).collect()
    }
}

/// Total count of records matching the filter, before pagination
pub fn count_matching(query: &EntityQuery, records: &[(Node, EntityRecord)]) -> usize {
    records.iter().filter(|(_, r)| query.matches(r)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::namehash;

    fn record(name: &str, registrar: &str, company: &str) -> (Node, EntityRecord) {
        let record = EntityRecord {
            name: name.to_string(),
            registrar: registrar.to_string(),
            company_name: company.to_string(),
            ..Default::default()
        };
        (namehash(name), record)
    }

    fn sample() -> Vec<(Node, EntityRecord)> {
        vec![
            record("c.test.divicompany.eth", "test", "Gamma Corp"),
            record("a.test.divicompany.eth", "test", "Alpha AG"),
            record("b.test2.divicompany.eth", "test2", "Beta Ltd"),
        ]
    }

    #[test]
    fn test_registrar_filter() {
        let mut query = EntityQuery::default();
        query.registrar = RegistrarFilter::parse("test2");
        let page = query.run(sample());
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].1.name, "b.test2.divicompany.eth");

        query.registrar = RegistrarFilter::parse("test,test2");
        assert_eq!(query.run(sample()).len(), 3);

        query.registrar = RegistrarFilter::parse("any");
        assert_eq!(query.run(sample()).len(), 3);
    }

    #[test]
    fn test_substring_matches_company_name() {
        let mut query = EntityQuery::default();
        query.name_substring = Some("alpha".to_string());
        let page = query.run(sample());
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].1.company_name, "Alpha AG");
    }

    #[test]
    fn test_sorting() {
        let query = EntityQuery::default();
        let names: Vec<String> = query.run(sample()).into_iter().map(|(_, r)| r.name).collect();
        assert_eq!(
            names,
            vec![
                "a.test.divicompany.eth",
                "b.test2.divicompany.eth",
                "c.test.divicompany.eth"
            ]
        );

        let mut desc = EntityQuery::default();
        desc.sort_dir = SortDir::Desc;
        let names: Vec<String> = desc.run(sample()).into_iter().map(|(_, r)| r.name).collect();
        assert_eq!(names[0], "c.test.divicompany.eth");
    }

    #[test]
    fn test_pagination() {
        let records: Vec<(Node, EntityRecord)> = (0..25)
            .map(|i| record(&format!("e{:02}.test.divicompany.eth", i), "test", ""))
            .collect();

        let mut query = EntityQuery::default();
        query.page = 1;
        query.limit = 10;
        let page = query.run(records.clone());
        assert_eq!(page.len(), 10);
        assert_eq!(page[0].1.name, "e10.test.divicompany.eth");
        assert_eq!(page[9].1.name, "e19.test.divicompany.eth");

        // past the end: empty page, not an error
        query.page = 10;
        assert!(query.run(records).is_empty());
    }
}
