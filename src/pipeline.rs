//! Ingestion pipeline orchestration.
//!
//! Runs fetch → extract → chunk → embed → upsert for each document
//! reference, strictly one document at a time. The first failure aborts
//! the whole invocation: later documents are not attempted and the error
//! is returned to the caller. Records already upserted for earlier
//! documents stay in the store.
//!
//! Collaborators are injected as trait objects so tests can substitute
//! fakes:
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use pdf_ingest::config::Config;
//! # use pdf_ingest::pipeline::{Pipeline, PipelineSettings};
//! # use pdf_ingest::source::FilesystemSource;
//! # use pdf_ingest::store::InMemoryStore;
//! # async fn example(embedder: Arc<dyn pdf_ingest::embedding::Embedder>) -> anyhow::Result<()> {
//! let settings = PipelineSettings::from_config(&Config::default())?;
//! let pipeline = Pipeline::new(
//!     Arc::new(FilesystemSource::new("./pdfs")),
//!     embedder,
//!     Arc::new(InMemoryStore::new()),
//!     settings,
//! );
//! let report = pipeline.ingest(&["handbook.pdf".to_string()]).await?;
//! println!("{}", report.job_id);
//! # Ok(())
//! # }
//! ```

use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use crate::chunk::Chunker;
use crate::config::Config;
use crate::embedding::{create_embedder, embed_in_batches, Embedder};
use crate::error::{IngestError, Result};
use crate::extract::extract_pdf_text;
use crate::models::{Chunk, IndexRecord};
use crate::source::{create_source, DocumentSource};
use crate::store::{create_store, VectorStore};

/// Message returned to callers when every document was ingested.
pub const COMPLETED_MESSAGE: &str = "Ingestion complete";

/// Where a document is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Extracting,
    Chunking,
    Embedding,
    Upserting,
    Completed,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Extracting => "extracting",
            Stage::Chunking => "chunking",
            Stage::Embedding => "embedding",
            Stage::Upserting => "upserting",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tunables resolved from config.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub chunker: Chunker,
    pub namespace: String,
    pub batch_size: usize,
    /// Deadline for a whole invocation. On expiry in-flight work is dropped.
    pub timeout: Option<Duration>,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.embedding.batch_size == 0 {
            return Err(IngestError::Config(
                "embedding.batch_size must be > 0".to_string(),
            ));
        }
        Ok(Self {
            chunker: Chunker::new(config.chunking.size, config.chunking.overlap)?,
            namespace: config.store.namespace.clone(),
            batch_size: config.embedding.batch_size,
            timeout: config.pipeline.timeout_secs.map(Duration::from_secs),
        })
    }
}

/// Outcome for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub reference: String,
    pub chunks: usize,
    pub records_upserted: usize,
}

/// Outcome of a successful invocation.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Fresh run identifier: 32 lowercase hex digits.
    pub job_id: String,
    pub documents: Vec<DocumentReport>,
}

impl IngestReport {
    pub fn message(&self) -> &'static str {
        COMPLETED_MESSAGE
    }

    pub fn total_records(&self) -> usize {
        self.documents.iter().map(|d| d.records_upserted).sum()
    }
}

/// Rejects an empty reference list or blank references.
pub fn validate_references(references: &[String]) -> Result<()> {
    if references.is_empty() {
        return Err(IngestError::RequestValidation(
            "openai_file_ids array required".to_string(),
        ));
    }
    if references.iter().any(|r| r.trim().is_empty()) {
        return Err(IngestError::RequestValidation(
            "openai_file_ids must not contain empty ids".to_string(),
        ));
    }
    Ok(())
}

pub struct Pipeline {
    source: Arc<dyn DocumentSource>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            embedder,
            store,
            settings,
        }
    }

    /// Builds the pipeline and its clients from config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let settings = PipelineSettings::from_config(config)?;
        Ok(Self::new(
            create_source(&config.source)?,
            create_embedder(&config.embedding)?,
            create_store(&config.store)?,
            settings,
        ))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Ingests every reference in order. Fails fast on the first error.
    pub async fn ingest(&self, references: &[String]) -> Result<IngestReport> {
        validate_references(references)?;

        let job_id = Uuid::new_v4().simple().to_string();
        let span = tracing::info_span!("ingest", run_id = %job_id);

        let run = async {
            tracing::info!(
                documents = references.len(),
                source = self.source.name(),
                store = self.store.name(),
                model = self.embedder.model_name(),
                "ingestion started"
            );
            let mut documents = Vec::with_capacity(references.len());
            for reference in references {
                documents.push(self.ingest_document(reference).await?);
            }
            Ok::<_, IngestError>(documents)
        }
        .instrument(span.clone());

        let documents = match self.settings.timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| IngestError::Timeout(limit))
                .and_then(|r| r),
            None => run.await,
        };

        match documents {
            Ok(documents) => {
                let report = IngestReport { job_id, documents };
                tracing::info!(parent: &span, records = report.total_records(), "ingestion complete");
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(parent: &span, kind = e.kind(), error = %e, "ingestion aborted");
                Err(e)
            }
        }
    }

    async fn ingest_document(&self, reference: &str) -> Result<DocumentReport> {
        let mut stage = Stage::Received;
        let result = self.run_document(reference, &mut stage).await;
        match &result {
            Ok(report) => tracing::info!(
                reference,
                stage = %Stage::Completed,
                chunks = report.chunks,
                records = report.records_upserted,
                "document ingested"
            ),
            Err(e) => tracing::warn!(
                reference,
                stage = %Stage::Failed,
                failed_during = %stage,
                kind = e.kind(),
                error = %e,
                "document failed"
            ),
        }
        result
    }

    async fn run_document(&self, reference: &str, stage: &mut Stage) -> Result<DocumentReport> {
        let bytes = self.source.fetch(reference).await?;
        tracing::debug!(reference, bytes = bytes.len(), "fetched document");

        advance(stage, Stage::Extracting, reference);
        let text = tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
            .await
            .map_err(|e| IngestError::Extraction(format!("extraction task failed: {}", e)))??;

        advance(stage, Stage::Chunking, reference);
        let chunks: Vec<Chunk> = self
            .settings
            .chunker
            .chunk_document(reference, &text)
            .collect();
        if chunks.is_empty() {
            tracing::info!(reference, "no text extracted, nothing to upsert");
            return Ok(DocumentReport {
                reference: reference.to_string(),
                chunks: 0,
                records_upserted: 0,
            });
        }

        advance(stage, Stage::Embedding, reference);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors =
            embed_in_batches(self.embedder.as_ref(), &texts, self.settings.batch_size).await?;

        let ingested_at = Utc::now();
        let records: Vec<IndexRecord> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, values)| IndexRecord::new(chunk, values, ingested_at))
            .collect();

        advance(stage, Stage::Upserting, reference);
        self.store
            .upsert(&self.settings.namespace, &records)
            .await?;

        Ok(DocumentReport {
            reference: reference.to_string(),
            chunks: chunks.len(),
            records_upserted: records.len(),
        })
    }
}

fn advance(stage: &mut Stage, next: Stage, reference: &str) {
    tracing::debug!(reference, from = %stage, to = %next, "stage");
    *stage = next;
}
