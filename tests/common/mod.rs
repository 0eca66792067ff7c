//! Shared fixtures for integration tests: PDF builder, fake collaborators,
//! and an in-process HTTP server helper.

#![allow(dead_code)]

mod pdf;

pub use pdf::{pdf_with_pages, pdf_with_undefined_font_on_first_page};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pdf_ingest::chunk::Chunker;
use pdf_ingest::embedding::Embedder;
use pdf_ingest::error::{IngestError, Result};
use pdf_ingest::pipeline::{Pipeline, PipelineSettings};
use pdf_ingest::source::DocumentSource;
use pdf_ingest::store::InMemoryStore;

pub const NAMESPACE: &str = "shared_memory";
pub const DIMS: usize = 8;

/// `n` distinct words: `w0 w1 … w{n-1}`.
pub fn numbered_words(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("w{}", i)).collect()
}

/// Serves documents from a map.
#[derive(Default)]
pub struct StaticSource {
    docs: HashMap<String, Vec<u8>>,
}

impl StaticSource {
    pub fn with(mut self, reference: &str, bytes: Vec<u8>) -> Self {
        self.docs.insert(reference.to_string(), bytes);
        self
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        self.docs
            .get(reference)
            .cloned()
            .ok_or_else(|| IngestError::DocumentFetch {
                reference: reference.to_string(),
                message: "no such document".to_string(),
            })
    }
}

/// Behavior of [`FakeEmbedder`].
#[derive(Clone, Copy)]
pub enum EmbedMode {
    Ok,
    Fail,
    Sleep(Duration),
}

/// Deterministic embedder that records every text it sees.
pub struct FakeEmbedder {
    mode: EmbedMode,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl FakeEmbedder {
    pub fn new(mode: EmbedMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn model_name(&self) -> &str {
        "fake-embedding"
    }

    fn dims(&self) -> usize {
        DIMS
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            EmbedMode::Fail => {
                return Err(IngestError::EmbeddingService(
                    "rate limited (429 Too Many Requests)".to_string(),
                ))
            }
            EmbedMode::Sleep(d) => tokio::time::sleep(d).await,
            EmbedMode::Ok => {}
        }
        self.seen.lock().unwrap().extend(texts.iter().cloned());
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0f32; DIMS];
                v[0] = t.split_whitespace().count() as f32;
                v[1] = t.len() as f32;
                v
            })
            .collect())
    }
}

pub fn settings(size: usize, overlap: usize, timeout: Option<Duration>) -> PipelineSettings {
    PipelineSettings {
        chunker: Chunker::new(size, overlap).unwrap(),
        namespace: NAMESPACE.to_string(),
        batch_size: 4,
        timeout,
    }
}

pub fn pipeline(
    source: StaticSource,
    embedder: Arc<FakeEmbedder>,
    store: Arc<InMemoryStore>,
    settings: PipelineSettings,
) -> Pipeline {
    Pipeline::new(Arc::new(source), embedder, store, settings)
}

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
