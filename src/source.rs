//! Document sources: fetch raw bytes for a document reference.
//!
//! - **[`OpenAIFileSource`]** downloads `GET {base_url}/files/{id}/content`.
//! - **[`FilesystemSource`]** reads `{root}/{reference}`; references must
//!   stay inside `root`.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::SourceConfig;
use crate::error::{IngestError, Result};

/// Fetches the bytes behind a document reference.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>>;
}

fn fetch_error(reference: &str, message: impl Into<String>) -> IngestError {
    IngestError::DocumentFetch {
        reference: reference.to_string(),
        message: message.into(),
    }
}

// ============ OpenAI Files ============

pub struct OpenAIFileSource {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl OpenAIFileSource {
    /// Builds the client, reading the key from `OPENAI_API_KEY`.
    pub fn new(config: &SourceConfig) -> anyhow::Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &SourceConfig, api_key: String) -> anyhow::Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing OpenAI API key");
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .with_context(|| format!("invalid source.base_url: {}", config.base_url))?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "source.base_url must be an http(s) URL: {}",
            config.base_url
        );
        Ok(Self {
            client,
            base_url,
            api_key: api_key.trim().to_string(),
        })
    }

    /// `{base_url}/files/{reference}/content`, with the reference encoded as
    /// exactly one path segment.
    pub fn content_url(&self, reference: &str) -> Result<Url> {
        // `.` and `..` would be dropped or resolved by the URL parser, and a
        // percent sign could smuggle them in encoded.
        let is_dot_segment = matches!(reference, "" | "." | "..");
        if is_dot_segment || reference.contains(['/', '\\', '%']) {
            return Err(fetch_error(reference, "invalid file id"));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| fetch_error(reference, "base URL cannot hold a path"))?
            .pop_if_empty()
            .extend(["files", reference, "content"]);
        Ok(url)
    }
}

#[async_trait]
impl DocumentSource for OpenAIFileSource {
    fn name(&self) -> &str {
        "openai"
    }

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        let url = self.content_url(reference)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| fetch_error(reference, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(fetch_error(
                reference,
                format!("OpenAI API error {}: {}", status, body),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_error(reference, e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

// ============ Filesystem ============

pub struct FilesystemSource {
    root: PathBuf,
}

impl FilesystemSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves a reference to a path under the root, rejecting anything
    /// that could escape it.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf> {
        let relative = Path::new(reference);
        let only_normal = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if reference.is_empty() || !only_normal {
            return Err(fetch_error(
                reference,
                "reference must be a relative path inside the source root",
            ));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DocumentSource for FilesystemSource {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        let path = self.resolve(reference)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| fetch_error(reference, format!("{}: {}", path.display(), e)))
    }
}

/// Builds the configured document source.
pub fn create_source(config: &SourceConfig) -> anyhow::Result<Arc<dyn DocumentSource>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIFileSource::new(config)?)),
        "filesystem" => {
            let root = config
                .root
                .clone()
                .ok_or_else(|| anyhow::anyhow!("source.root required for filesystem source"))?;
            if !root.is_dir() {
                anyhow::bail!("Filesystem source root does not exist: {}", root.display());
            }
            Ok(Arc::new(FilesystemSource::new(root)))
        }
        other => anyhow::bail!("Unknown source provider: {}", other),
    }
}
