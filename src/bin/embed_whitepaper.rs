//! One-time batch job: embed the whitepaper sections.
//!
//! Reads `data/whitepaper.txt`, splits it into sections on blank lines
//! (dropping fragments of 200 characters or fewer), embeds each section
//! via the Gemini API, and persists the collection to
//! `data/embeddings.json` for the query-serving process to load.
//!
//! ```bash
//! GEMINI_API_KEY=... cargo run --bin embed-whitepaper
//! ```

use std::path::Path;

use anyhow::Context;

use crypgpt_assistant::config::AssistantConfig;
use crypgpt_assistant::whitepaper::embedder::{embed_sections, split_sections, GeminiEmbedder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AssistantConfig::from_env();
    anyhow::ensure!(
        config.gemini_api_key.is_some(),
        "GEMINI_API_KEY not set; embeddings cannot be generated"
    );

    let data_dir = Path::new(&config.data_dir);
    let whitepaper_path = data_dir.join("whitepaper.txt");
    let raw = std::fs::read_to_string(&whitepaper_path)
        .with_context(|| format!("reading {}", whitepaper_path.display()))?;

    let inputs = split_sections(&raw);
    anyhow::ensure!(!inputs.is_empty(), "whitepaper produced no usable sections");
    tracing::info!(sections = inputs.len(), "whitepaper split into sections");

    let embedder = GeminiEmbedder::new(config.gemini_api_key.clone(), config.request_timeout);
    let model = embedder.model().to_string();
    let collection = embed_sections(&embedder, &model, &inputs).await;

    anyhow::ensure!(
        !collection.sections.is_empty(),
        "no sections were embedded; check the API key and connectivity"
    );

    let out_path = data_dir.join("embeddings.json");
    let json = serde_json::to_string_pretty(&collection)?;
    std::fs::write(&out_path, json)
        .with_context(|| format!("writing {}", out_path.display()))?;

    tracing::info!(
        embedded = collection.sections.len(),
        path = %out_path.display(),
        "generated embeddings"
    );
    Ok(())
}
