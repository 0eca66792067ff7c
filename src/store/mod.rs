//! Vector store abstraction.
//!
//! The [`VectorStore`] trait persists batches of [`IndexRecord`]s into a
//! namespace with insert-or-replace-by-id semantics. A call either lands
//! the whole batch or fails with [`IngestError::StoreWrite`]; there is no
//! partial-success reporting.
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`PineconeStore`] | Pinecone data-plane REST API |
//! | [`InMemoryStore`] | tests and local runs |

pub mod memory;
pub mod pinecone;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::error::{IngestError, Result};
use crate::models::IndexRecord;

pub use memory::InMemoryStore;
pub use pinecone::PineconeStore;

/// A namespaced vector index.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short backend name used in logs (e.g. `"pinecone"`).
    fn name(&self) -> &str;

    /// Upserts `records` into `namespace` as one operation.
    ///
    /// `records` must be non-empty.
    async fn upsert(&self, namespace: &str, records: &[IndexRecord]) -> Result<()>;
}

/// Rejects empty batches and batches whose vectors disagree on dimension.
pub(crate) fn check_batch(records: &[IndexRecord]) -> Result<usize> {
    let first = records
        .first()
        .ok_or_else(|| IngestError::StoreWrite("upsert batch must not be empty".to_string()))?;
    let dims = first.values.len();
    if let Some(bad) = records.iter().find(|r| r.values.len() != dims) {
        return Err(IngestError::StoreWrite(format!(
            "record {} has dimension {}, batch dimension is {}",
            bad.id,
            bad.values.len(),
            dims
        )));
    }
    Ok(dims)
}

/// Builds the configured store.
pub fn create_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn VectorStore>> {
    match config.provider.as_str() {
        "pinecone" => {
            let host = config
                .index_host
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("store.index_host required for Pinecone"))?;
            let api_key = std::env::var("PINECONE_API_KEY")
                .map_err(|_| anyhow::anyhow!("PINECONE_API_KEY environment variable not set"))?;
            Ok(Arc::new(PineconeStore::new(
                host,
                api_key,
                Duration::from_secs(config.timeout_secs),
            )?))
        }
        "memory" => Ok(Arc::new(InMemoryStore::new())),
        other => anyhow::bail!("Unknown store provider: {}", other),
    }
}
