//! Embedding collaborator: turns text into vectors via the Gemini
//! `embedContent` API.
//!
//! The same client serves the per-query hot path (where failure is
//! non-fatal and maps to `None`) and the one-time corpus batch job run by
//! the `embed-whitepaper` binary.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{EmbeddingCollection, WhitepaperSection};

const GEMINI_EMBED_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/embedding-001:embedContent";

/// External embedding collaborator.
///
/// `None` covers every failure mode (missing credentials, transport
/// errors, malformed responses) — callers degrade by omitting whitepaper
/// context rather than failing the request.
#[async_trait]
pub trait QueryEmbedder: Send + Sync {
    async fn embed_query(&self, text: &str) -> Option<Vec<f32>>;
}

/// Gemini embedding client.
pub struct GeminiEmbedder {
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl GeminiEmbedder {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            api_key,
            model: "embedding-001".to_string(),
            client,
        }
    }

    /// Model identifier recorded in the persisted collection.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let api_key = self.api_key.as_deref()?;

        let body = serde_json::json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [{ "text": text }] }
        });

        let response = self
            .client
            .post(GEMINI_EMBED_URL)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "embedding request rejected");
            return None;
        }

        let json: Value = response.json().await.ok()?;
        let values = json.get("embedding")?.get("values")?.as_array()?;

        values
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect()
    }
}

#[async_trait]
impl QueryEmbedder for GeminiEmbedder {
    async fn embed_query(&self, text: &str) -> Option<Vec<f32>> {
        self.embed(text).await
    }
}

/// A whitepaper section awaiting embedding.
#[derive(Debug, Clone)]
pub struct SectionInput {
    pub id: String,
    pub title: String,
    pub content: String,
}

/// Embed a batch of whitepaper sections into a persistable collection.
///
/// Sections whose embedding fails are skipped with an error log, matching
/// the hot path's degrade-don't-fail posture. Offline use only.
pub async fn embed_sections(
    embedder: &dyn QueryEmbedder,
    model: &str,
    inputs: &[SectionInput],
) -> EmbeddingCollection {
    let mut sections = Vec::with_capacity(inputs.len());

    for input in inputs {
        match embedder.embed_query(&input.content).await {
            Some(vector) => sections.push(WhitepaperSection {
                id: input.id.clone(),
                title: input.title.clone(),
                content: input.content.clone(),
                vector,
                created_at: Utc::now(),
            }),
            None => {
                tracing::error!(section = %input.id, "error embedding section; skipped");
            }
        }
    }

    EmbeddingCollection {
        sections,
        model: Some(model.to_string()),
        generated_at: Some(Utc::now()),
    }
}

/// Split raw whitepaper text into sections: blocks separated by blank
/// lines, ignoring fragments of 200 characters or fewer.
pub fn split_sections(raw: &str) -> Vec<SectionInput> {
    static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("static pattern"));

    BLANK_LINE
        .split(raw)
        .map(str::trim)
        .filter(|block| block.len() > 200)
        .enumerate()
        .map(|(i, block)| {
            let title = block
                .lines()
                .next()
                .unwrap_or_default()
                .chars()
                .take(80)
                .collect::<String>();
            SectionInput {
                id: format!("section-{}", i + 1),
                title,
                content: block.to_string(),
            }
        })
        .collect()
}
