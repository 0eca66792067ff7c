//! TOML configuration.
//!
//! Every section is optional. The defaults are 350/50 word chunks,
//! `text-embedding-3-large` at 3072 dimensions, and namespace
//! `shared_memory`. The store defaults to Pinecone, so a config without
//! `[store].index_host` fails validation; the in-memory store is opt-in.
//!
//! Secrets are never read from the file: API keys come from
//! `OPENAI_API_KEY` and `PINECONE_API_KEY`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Words per chunk.
    #[serde(default = "default_chunk_size")]
    pub size: usize,
    /// Words shared between consecutive chunks. Must be smaller than `size`.
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    350
}
fn default_chunk_overlap() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    /// Chunks sent per embedding request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dims: default_dims(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            base_url: default_openai_base_url(),
        }
    }
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-large".to_string()
}
fn default_dims() -> usize {
    3072
}
fn default_batch_size() -> usize {
    16
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_provider")]
    pub provider: String,
    /// Data-plane host of the index, e.g. `https://kitt3n-abc123.svc.us-east-1.pinecone.io`.
    #[serde(default)]
    pub index_host: Option<String>,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: default_store_provider(),
            index_host: None,
            namespace: default_namespace(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_store_provider() -> String {
    "pinecone".to_string()
}
fn default_namespace() -> String {
    "shared_memory".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_source_provider")]
    pub provider: String,
    /// Directory that filesystem references are resolved against.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            provider: default_source_provider(),
            root: None,
            base_url: default_openai_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_source_provider() -> String {
    "openai".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PipelineConfig {
    /// Wall-clock budget for one invocation. `None` means no deadline.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

/// Reads and validates a config file. A missing file yields the defaults,
/// which still need `[store].index_host` to validate.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = read_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Reads a config file without validating it. A missing file yields the
/// defaults. Used by commands that never reach an external service.
pub fn read_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content).with_context(|| "Failed to parse config file")
}

/// Parses and validates config from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    if config.chunking.size == 0 {
        bail!("chunking.size must be > 0");
    }
    if config.chunking.overlap >= config.chunking.size {
        bail!(
            "chunking.overlap ({}) must be smaller than chunking.size ({})",
            config.chunking.overlap,
            config.chunking.size
        );
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "openai" => {}
        other => bail!("Unknown embedding provider: '{}'. Must be openai.", other),
    }
    if config.embedding.dims == 0 {
        bail!("embedding.dims must be > 0");
    }
    if config.embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }
    if config.embedding.model.trim().is_empty() {
        bail!("embedding.model must not be empty");
    }

    // Validate store
    match config.store.provider.as_str() {
        "pinecone" => {
            if config.store.index_host.is_none() {
                bail!("store.index_host is required when provider is 'pinecone'");
            }
        }
        "memory" => {}
        other => bail!(
            "Unknown store provider: '{}'. Must be pinecone or memory.",
            other
        ),
    }
    if config.store.namespace.trim().is_empty() {
        bail!("store.namespace must not be empty");
    }

    // Validate source
    match config.source.provider.as_str() {
        "openai" => {}
        "filesystem" => {
            if config.source.root.is_none() {
                bail!("source.root is required when provider is 'filesystem'");
            }
        }
        other => bail!(
            "Unknown source provider: '{}'. Must be openai or filesystem.",
            other
        ),
    }

    if config.pipeline.timeout_secs == Some(0) {
        bail!("pipeline.timeout_secs must be > 0 when set");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PINECONE_HOST: &str = "[store]\nindex_host = \"https://idx.example.io\"\n";

    #[test]
    fn test_defaults_write_to_pinecone() {
        let config = Config::default();
        assert_eq!(config.store.provider, "pinecone");
        assert_eq!(config.chunking.size, 350);
        assert_eq!(config.chunking.overlap, 50);
        assert_eq!(config.embedding.model, "text-embedding-3-large");
        assert_eq!(config.store.namespace, "shared_memory");

        // No index host means no place to write: refuse to start.
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("index_host"));
    }

    #[test]
    fn test_host_only_file_uses_defaults() {
        let config = parse_config(PINECONE_HOST).unwrap();
        assert_eq!(config.store.provider, "pinecone");
        assert_eq!(config.chunking.size, 350);
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert!(config.pipeline.timeout_secs.is_none());
    }

    #[test]
    fn test_memory_store_is_opt_in() {
        let config = parse_config("[store]\nprovider = \"memory\"\n").unwrap();
        assert_eq!(config.store.provider, "memory");
        assert!(config.store.index_host.is_none());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let err = parse_config("[chunking]\nsize = 50\noverlap = 50\n").unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn test_pinecone_requires_host() {
        let err = parse_config("[store]\nprovider = \"pinecone\"\n").unwrap_err();
        assert!(err.to_string().contains("index_host"));

        let ok = parse_config(
            "[store]\nprovider = \"pinecone\"\nindex_host = \"https://idx.example.io\"\n",
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_filesystem_requires_root() {
        let toml = format!("{}[source]\nprovider = \"filesystem\"\n", PINECONE_HOST);
        let err = parse_config(&toml).unwrap_err();
        assert!(err.to_string().contains("source.root"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(parse_config("[embedding]\nprovider = \"carrier-pigeon\"\n").is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let missing = Path::new("/definitely/not/here.toml");
        let config = read_config(missing).unwrap();
        assert_eq!(config.embedding.dims, 3072);
        assert!(load_config(missing).is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let config = parse_config(include_str!("../config/ingest.example.toml")).unwrap();
        assert_eq!(config.store.provider, "pinecone");
        assert_eq!(config.chunking.size, 350);
        assert!(config.pipeline.timeout_secs.is_none());
    }
}
