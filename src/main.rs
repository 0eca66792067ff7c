//! # pdf-ingest CLI
//!
//! ```bash
//! pdf-ingest --config ./config/ingest.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pdf-ingest serve` | Start the HTTP server |
//! | `pdf-ingest ingest <REF>...` | Ingest documents once and print the report |
//! | `pdf-ingest inspect <PATH>` | Extract and chunk a local PDF without external calls |

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pdf_ingest::chunk::Chunker;
use pdf_ingest::config;
use pdf_ingest::extract::extract_pdf_text;
use pdf_ingest::pipeline::Pipeline;
use pdf_ingest::server;

/// Ingest PDF documents into a vector index.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means built-in defaults, which `serve` and
/// `ingest` reject until `[store].index_host` is set.
#[derive(Parser)]
#[command(name = "pdf-ingest", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ingest.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind` and serves `POST /api/ingest_pdf`.
    Serve,

    /// Ingest documents by reference and print a summary.
    ///
    /// References are OpenAI file ids or paths under `[source].root`,
    /// depending on the configured source.
    Ingest {
        /// Document references, processed in order.
        #[arg(required = true)]
        references: Vec<String>,
    },

    /// Extract and chunk a local PDF without calling any service.
    Inspect {
        /// Path to the PDF file.
        path: PathBuf,

        /// Print every chunk.
        #[arg(long)]
        chunks: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pdf_ingest=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            let cfg = config::load_config(&cli.config)?;
            server::run_server(&cfg).await?;
        }
        Commands::Ingest { references } => {
            let cfg = config::load_config(&cli.config)?;
            let pipeline = Pipeline::from_config(&cfg)?;
            let report = pipeline.ingest(&references).await?;
            println!("ingest");
            for doc in &report.documents {
                println!(
                    "  {}: {} chunks, {} records",
                    doc.reference, doc.chunks, doc.records_upserted
                );
            }
            println!("  namespace: {}", pipeline.settings().namespace);
            println!("  job_id: {}", report.job_id);
            println!("{}", report.message());
        }
        Commands::Inspect { path, chunks } => {
            let cfg = config::read_config(&cli.config)?;
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let text = extract_pdf_text(&bytes)?;
            let chunker = Chunker::new(cfg.chunking.size, cfg.chunking.overlap)?;
            let windows = chunker.windows(&text);

            println!("inspect {}", path.display());
            println!("  characters: {}", text.chars().count());
            println!("  words: {}", windows.word_count());
            println!(
                "  chunks: {} (size {}, overlap {})",
                windows.len(),
                chunker.size(),
                chunker.overlap()
            );
            if chunks {
                for (i, chunk) in windows.enumerate() {
                    println!("--- chunk {} ---", i);
                    println!("{}", chunk);
                }
            }
        }
    }

    Ok(())
}
