//! LATTICE Store - Document Store Trait and In-Memory Implementation
//!
//! Defines the document-store abstraction the proxy persists into. The
//! store is schemaless: records are JSON documents grouped by namespace,
//! upserted by id, and searchable with the small query DSL in
//! [`query`]. A remote search backend implements the same trait; the
//! in-memory implementation here backs tests and single-process
//! deployments.

pub mod query;

pub use query::{MatchClause, SearchQuery};

use async_trait::async_trait;
use lattice_core::StoreError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store abstraction.
///
/// Namespaces are independent; ids are opaque strings. `write` is an
/// upsert that replaces the whole document. `search` returns at most
/// `size` documents ordered most-relevant-first, where relevance is
/// backend-defined but must rank fresher writes ahead of older ones.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get a document by id, or None if absent.
    async fn get(&self, namespace: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Upsert a document by id.
    async fn write(&self, namespace: &str, id: &str, record: Value) -> StoreResult<()>;

    /// Search a namespace, newest-relevant-first, at most `size` hits.
    async fn search(
        &self,
        namespace: &str,
        query: &SearchQuery,
        size: usize,
    ) -> StoreResult<Vec<Value>>;
}

/// In-memory document store.
///
/// Documents are kept per namespace in write order; search walks them
/// newest-first so "most recent by relevance" holds for the query shapes
/// the core issues.
#[derive(Default)]
pub struct MemoryStore {
    namespaces: RwLock<HashMap<String, Vec<(String, Value)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a namespace.
    pub fn len(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .map(|ns| ns.get(namespace).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, namespace: &str, id: &str) -> StoreResult<Option<Value>> {
        let namespaces = self.namespaces.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(namespaces
            .get(namespace)
            .and_then(|docs| docs.iter().find(|(doc_id, _)| doc_id == id))
            .map(|(_, doc)| doc.clone()))
    }

    async fn write(&self, namespace: &str, id: &str, record: Value) -> StoreResult<()> {
        let mut namespaces = self.namespaces.write().map_err(|_| StoreError::LockPoisoned)?;
        let docs = namespaces.entry(namespace.to_string()).or_default();
        // an upsert counts as the freshest write: drop any old slot and
        // append at the tail
        docs.retain(|(doc_id, _)| doc_id != id);
        docs.push((id.to_string(), record));
        Ok(())
    }

    async fn search(
        &self,
        namespace: &str,
        query: &SearchQuery,
        size: usize,
    ) -> StoreResult<Vec<Value>> {
        let namespaces = self.namespaces.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(namespaces
            .get(namespace)
            .map(|docs| {
                docs.iter()
                    .rev()
                    .filter(|(_, doc)| query.matches(doc))
                    .take(size)
                    .map(|(_, doc)| doc.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}
