//! Core data models that flow through the ingestion pipeline.
//!
//! Only [`IndexRecord`]s outlive an invocation; everything else is
//! computed and dropped once the document's batch has been upserted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Timestamp format written to record metadata (UTC, second precision).
pub const METADATA_TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A word-window of one document's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub document_ref: String,
    pub chunk_index: usize,
    pub text: String,
}

impl Chunk {
    /// Id of the index record this chunk is stored under.
    pub fn record_id(&self) -> String {
        record_id(&self.document_ref, self.chunk_index)
    }

    /// SHA-256 hex digest of the chunk text.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Deterministic record id: `{document_ref}_{chunk_index}`.
///
/// Re-ingesting an unchanged document produces the same ids, so the store
/// overwrites instead of duplicating.
pub fn record_id(document_ref: &str, chunk_index: usize) -> String {
    format!("{}_{}", document_ref, chunk_index)
}

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub source_file_id: String,
    pub order: usize,
    pub ts: String,
    pub chunk_hash: String,
}

impl RecordMetadata {
    pub fn for_chunk(chunk: &Chunk, ingested_at: DateTime<Utc>) -> Self {
        Self {
            source_file_id: chunk.document_ref.clone(),
            order: chunk.chunk_index,
            ts: ingested_at.format(METADATA_TS_FORMAT).to_string(),
            chunk_hash: chunk.hash(),
        }
    }
}

/// The persisted unit: id, embedding vector, metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

impl IndexRecord {
    pub fn new(chunk: &Chunk, values: Vec<f32>, ingested_at: DateTime<Utc>) -> Self {
        Self {
            id: chunk.record_id(),
            values,
            metadata: RecordMetadata::for_chunk(chunk, ingested_at),
        }
    }
}
