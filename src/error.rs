//! Error taxonomy for the ingestion pipeline.
//!
//! Every variant aborts the current invocation. Nothing is retried and
//! there is no partial-success reporting: one failing document fails the
//! whole request.

use std::time::Duration;

use thiserror::Error;

/// Errors produced while validating a request or running the pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Malformed or missing input. Raised before any side effect.
    #[error("{0}")]
    RequestValidation(String),

    /// Invalid configuration, e.g. a chunk overlap that does not advance the window.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The document source could not deliver the bytes for a reference.
    #[error("failed to fetch document '{reference}': {message}")]
    DocumentFetch { reference: String, message: String },

    /// The byte stream is not a parseable PDF.
    #[error("failed to extract text: {0}")]
    Extraction(String),

    /// Transport failure, rate limit, or malformed response from the embedding service.
    #[error("embedding service error: {0}")]
    EmbeddingService(String),

    /// The vector store rejected or failed the upsert.
    #[error("vector store write failed: {0}")]
    StoreWrite(String),

    /// The invocation deadline expired before all documents were processed.
    #[error("ingestion timed out after {0:?}")]
    Timeout(Duration),
}

impl IngestError {
    /// Whether this error is the caller's fault (a 400 at the HTTP boundary).
    pub fn is_client_error(&self) -> bool {
        matches!(self, IngestError::RequestValidation(_))
    }

    /// Short machine-readable name of the error kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::RequestValidation(_) => "request_validation",
            IngestError::Config(_) => "config",
            IngestError::DocumentFetch { .. } => "document_fetch",
            IngestError::Extraction(_) => "extraction",
            IngestError::EmbeddingService(_) => "embedding_service",
            IngestError::StoreWrite(_) => "store_write",
            IngestError::Timeout(_) => "timeout",
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
