// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! Record store abstraction
//!
//! The gateway currently keeps everything in memory with no persistence
//! across restarts. The trait exists so a durable backing store can be
//! substituted without touching the builder, dispatcher, or mutation
//! engine.

use crate::codec::Node;
use crate::record::EntityRecord;
use std::collections::HashMap;

pub trait RecordStore: Send + Sync {
    fn get(&self, node: &Node) -> Option<EntityRecord>;
    fn put(&mut self, node: Node, record: EntityRecord);
    fn has(&self, node: &Node) -> bool;
    /// All records in insertion order. The order carries no meaning
    /// beyond stable pagination within one process lifetime.
    fn list(&self) -> Vec<(Node, EntityRecord)>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store, insertion-ordered
#[derive(Default)]
pub struct MemoryStore {
    records: HashMap<Node, EntityRecord>,
    order: Vec<Node>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, node: &Node) -> Option<EntityRecord> {
        self.records.get(node).cloned()
    }

    fn put(&mut self, node: Node, record: EntityRecord) {
        if self.records.insert(node, record).is_none() {
            self.order.push(node);
        }
    }

    fn has(&self, node: &Node) -> bool {
        self.records.contains_key(node)
    }

    fn list(&self) -> Vec<(Node, EntityRecord)> {
        self.order
            .iter()
            .filter_map(|node| self.records.get(node).map(|r| (*node, r.clone())))
            .collect()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::namehash;

    fn record(name: &str) -> EntityRecord {
        EntityRecord {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_put_get_has() {
        let mut store = MemoryStore::new();
        let node = namehash("a.test.divicompany.eth");
        assert!(!store.has(&node));
        assert!(store.get(&node).is_none());

        store.put(node, record("a.test.divicompany.eth"));
        assert!(store.has(&node));
        assert_eq!(store.get(&node).unwrap().name, "a.test.divicompany.eth");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut store = MemoryStore::new();
        let names = ["c.test.divicompany.eth", "a.test.divicompany.eth", "b.test.divicompany.eth"];
        for name in names {
            store.put(namehash(name), record(name));
        }

        let listed: Vec<String> = store.list().into_iter().map(|(_, r)| r.name).collect();
        assert_eq!(listed, names);
    }

    #[test]
    fn test_put_replaces_without_reordering() {
        let mut store = MemoryStore::new();
        let node = namehash("a.test.divicompany.eth");
        store.put(node, record("a.test.divicompany.eth"));
        store.put(namehash("b.test.divicompany.eth"), record("b.test.divicompany.eth"));
        store.put(node, record("a.test.divicompany.eth"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.list()[0].1.name, "a.test.divicompany.eth");
    }
}
