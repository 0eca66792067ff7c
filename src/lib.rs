//! # pdf-ingest
//!
//! Synchronous PDF ingestion into a namespaced vector index.
//!
//! Each invocation takes a list of document references and, one document
//! at a time, fetches the bytes, extracts the text, splits it into
//! overlapping word windows, embeds the windows, and upserts one batch of
//! records per document. Record ids are `{reference}_{chunk_index}`, so
//! re-ingesting a document overwrites its records instead of duplicating
//! them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌────────┐   ┌──────────┐   ┌─────────────┐
//! │  Source  │──▶│ Extract │──▶│ Chunk  │──▶│  Embed   │──▶│ VectorStore │
//! │ OpenAI/FS│   │   PDF   │   │ windows│   │  OpenAI  │   │  Pinecone   │
//! └──────────┘   └─────────┘   └────────┘   └──────────┘   └─────────────┘
//!        ▲                                                        │
//!        └──────────────── Pipeline (fail-fast) ◀─────────────────┘
//!                              ▲
//!                      ┌───────┴───────┐
//!                      │ CLI  │  HTTP  │
//!                      └───────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Chunks, index records, metadata |
//! | [`source`] | Document sources |
//! | [`extract`] | PDF text extraction |
//! | [`chunk`] | Word-window chunking |
//! | [`embedding`] | Embedding service abstraction |
//! | [`store`] | Vector store abstraction |
//! | [`pipeline`] | Orchestration |
//! | [`server`] | HTTP server |

pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod source;
pub mod store;
