//! Semantic retrieval over precomputed whitepaper-section embeddings.
//!
//! The persisted collection is produced once by the `embed-whitepaper`
//! batch binary and loaded fresh on each process start. Retrieval degrades
//! gracefully at every step: a missing collection file loads empty, and an
//! unavailable embedding collaborator yields no context instead of an
//! error.

pub mod embedder;

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use embedder::QueryEmbedder;

/// A contiguous text block extracted from the whitepaper, with its
/// fixed-dimensionality embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitepaperSection {
    pub id: String,
    pub title: String,
    pub content: String,
    pub vector: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

/// The persisted embedding collection (`data/embeddings.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingCollection {
    #[serde(default)]
    pub sections: Vec<WhitepaperSection>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

/// A retrieval hit with the embedding stripped.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredSection {
    pub id: String,
    pub title: String,
    pub content: String,
    pub similarity: f32,
}

/// Cosine similarity of two equal-length vectors.
///
/// Defined as 0 when the lengths differ or either magnitude is zero, so
/// it never divides by zero and never panics.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

/// Read-only nearest-neighbor index over the whitepaper sections.
pub struct EmbeddingStore {
    sections: Vec<WhitepaperSection>,
    embedder: Arc<dyn QueryEmbedder>,
}

impl EmbeddingStore {
    /// Build from an in-memory collection.
    pub fn new(collection: EmbeddingCollection, embedder: Arc<dyn QueryEmbedder>) -> Self {
        Self {
            sections: collection.sections,
            embedder,
        }
    }

    /// Load the persisted collection. A missing or unreadable file yields
    /// an empty store with a warning; whitepaper context simply becomes
    /// absent.
    pub fn load(path: &Path, embedder: Arc<dyn QueryEmbedder>) -> Self {
        let collection = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<EmbeddingCollection>(&content) {
                Ok(collection) => collection,
                Err(err) => {
                    tracing::error!(%err, "error parsing embeddings file");
                    EmbeddingCollection::default()
                }
            },
            Err(err) => {
                tracing::warn!(%err, path = %path.display(), "embeddings file not loaded");
                EmbeddingCollection::default()
            }
        };

        if collection.sections.is_empty() {
            tracing::warn!("no embeddings found; whitepaper sections cannot be retrieved");
        }

        Self::new(collection, embedder)
    }

    /// Number of indexed sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Find the `k` most relevant sections for a query, ordered by
    /// descending cosine similarity.
    ///
    /// Returns an empty list when the index is empty or the embedding
    /// collaborator is unavailable.
    pub async fn find_relevant(&self, query: &str, k: usize) -> Vec<ScoredSection> {
        if self.sections.is_empty() {
            return Vec::new();
        }

        let Some(query_vector) = self.embedder.embed_query(query).await else {
            tracing::debug!("query embedding unavailable; skipping whitepaper retrieval");
            return Vec::new();
        };

        let mut scored: Vec<ScoredSection> = self
            .sections
            .iter()
            .map(|section| ScoredSection {
                id: section.id.clone(),
                title: section.title.clone(),
                content: section.content.clone(),
                similarity: cosine_similarity(&query_vector, &section.vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        scored.truncate(k);
        scored
    }
}
