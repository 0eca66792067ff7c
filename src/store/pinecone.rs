//! Pinecone data-plane client.
//!
//! Upserts go to `POST {index_host}/vectors/upsert` authenticated with the
//! `Api-Key` header. The whole batch is sent in one request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{check_batch, VectorStore};
use crate::error::{IngestError, Result};
use crate::models::{IndexRecord, RecordMetadata};

/// REST API version pinned in every request.
const API_VERSION: &str = "2024-07";

pub struct PineconeStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl PineconeStore {
    /// `index_host` may be given with or without a scheme; `https://` is assumed.
    pub fn new(index_host: &str, api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        anyhow::ensure!(!index_host.trim().is_empty(), "missing Pinecone index host");
        anyhow::ensure!(!api_key.trim().is_empty(), "missing Pinecone API key");
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/vectors/upsert", normalize_host(index_host)),
            api_key: api_key.trim().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<PineconeVector<'a>>,
    namespace: &'a str,
}

#[derive(Serialize)]
struct PineconeVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a RecordMetadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    upserted_count: usize,
}

#[async_trait]
impl VectorStore for PineconeStore {
    fn name(&self) -> &str {
        "pinecone"
    }

    async fn upsert(&self, namespace: &str, records: &[IndexRecord]) -> Result<()> {
        check_batch(records)?;

        let request = UpsertRequest {
            vectors: records
                .iter()
                .map(|r| PineconeVector {
                    id: &r.id,
                    values: &r.values,
                    metadata: &r.metadata,
                })
                .collect(),
            namespace,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| IngestError::StoreWrite(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IngestError::StoreWrite(e.to_string()))?;
        if !status.is_success() {
            return Err(IngestError::StoreWrite(format!(
                "Pinecone API error {}: {}",
                status, body
            )));
        }

        let parsed: UpsertResponse = serde_json::from_str(&body).map_err(|e| {
            IngestError::StoreWrite(format!("invalid Pinecone response: {}", e))
        })?;
        if parsed.upserted_count != records.len() {
            return Err(IngestError::StoreWrite(format!(
                "Pinecone upserted {} of {} records",
                parsed.upserted_count,
                records.len()
            )));
        }
        Ok(())
    }
}
