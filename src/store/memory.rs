//! In-memory [`VectorStore`] for tests and local runs.
//!
//! Records live in a per-namespace `HashMap` behind `std::sync::RwLock`.
//! A namespace keeps the dimension of its first record and rejects
//! vectors of any other size, as a hosted index would.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::{check_batch, VectorStore};
use crate::error::{IngestError, Result};
use crate::models::IndexRecord;

#[derive(Default)]
struct Namespace {
    dims: Option<usize>,
    records: HashMap<String, IndexRecord>,
}

/// In-memory vector index.
#[derive(Default)]
pub struct InMemoryStore {
    namespaces: RwLock<HashMap<String, Namespace>>,
    /// Size of every successful upsert batch, in call order.
    upserts: RwLock<Vec<usize>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful upsert calls so far.
    pub fn upsert_calls(&self) -> usize {
        self.upserts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Batch sizes of the successful upsert calls, in order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.upserts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of records stored in `namespace`.
    pub fn len(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(namespace)
            .map(|ns| ns.records.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }

    /// Sorted record ids in `namespace`.
    pub fn ids(&self, namespace: &str) -> Vec<String> {
        let namespaces = self.namespaces.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = namespaces
            .get(namespace)
            .map(|ns| ns.records.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn get(&self, namespace: &str, id: &str) -> Option<IndexRecord> {
        self.namespaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(namespace)
            .and_then(|ns| ns.records.get(id).cloned())
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upsert(&self, namespace: &str, records: &[IndexRecord]) -> Result<()> {
        let dims = check_batch(records)?;

        let mut namespaces = self
            .namespaces
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let ns = namespaces.entry(namespace.to_string()).or_default();
        if let Some(existing) = ns.dims {
            if existing != dims {
                return Err(IngestError::StoreWrite(format!(
                    "namespace '{}' holds {}-dimensional vectors, got {}",
                    namespace, existing, dims
                )));
            }
        }
        ns.dims = Some(dims);
        for record in records {
            ns.records.insert(record.id.clone(), record.clone());
        }
        drop(namespaces);

        self.upserts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(records.len());
        Ok(())
    }
}
