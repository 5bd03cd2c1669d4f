//! Semantic retrieval over the fixed knowledge corpus.
//!
//! The fallback's answer generation is an external service; the retrieval
//! half is small enough to live here. Corpus entries are embedded once at
//! construction, queries are ranked by cosine similarity, entries above a
//! fixed threshold are kept, and the top K become the generation context.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use anyhow::Context;

/// Minimum similarity score for an entry to count as relevant.
pub const SIMILARITY_THRESHOLD: f32 = 0.7;
/// Number of top results to retrieve.
pub const TOP_K_RESULTS: usize = 3;
/// Context placeholder used when nothing clears the threshold.
pub const NO_CONTEXT: &str =
    "No specific context was retrieved for this query. The knowledge base may not contain relevant information.";

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Text-to-vector boundary. The production implementation calls an embedding
/// model; tests and the offline REPL use [`HashEmbedder`].
pub trait EmbeddingProvider {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Deterministic bag-of-words embedder: each lowercased word is hashed into a
/// fixed-dimension bucket. Crude, but it makes retrieval self-contained and
/// repeatable, which is what the tests and the offline console need.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dim];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % self.dim as u64) as usize] += 1.0;
        }
        Ok(vector)
    }
}

struct IndexedEntry {
    label: String,
    text: String,
    embedding: Vec<f32>,
}

/// One ranked retrieval hit.
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub label: String,
    pub text: String,
    pub similarity: f32,
}

/// In-memory vector index over a fixed corpus.
pub struct Retriever {
    entries: Vec<IndexedEntry>,
    threshold: f32,
    top_k: usize,
}

impl Retriever {
    /// Embed every corpus entry up front.
    pub fn index(
        provider: &dyn EmbeddingProvider,
        corpus: &[(&str, &str)],
    ) -> anyhow::Result<Self> {
        let mut entries = Vec::with_capacity(corpus.len());
        for (label, text) in corpus {
            let embedding = provider
                .embed(text)
                .with_context(|| format!("embedding corpus entry '{label}'"))?;
            entries.push(IndexedEntry {
                label: label.to_string(),
                text: text.to_string(),
                embedding,
            });
        }
        log::info!("indexed {} knowledge entries", entries.len());
        Ok(Self {
            entries,
            threshold: SIMILARITY_THRESHOLD,
            top_k: TOP_K_RESULTS,
        })
    }

    #[cfg(test)]
    fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Rank the corpus against a query embedding: sort by similarity, keep
    /// entries above the threshold, take the top K.
    pub fn rank(&self, query_embedding: &[f32]) -> Vec<ScoredEntry> {
        let mut scored: Vec<ScoredEntry> = self
            .entries
            .iter()
            .map(|entry| ScoredEntry {
                label: entry.label.clone(),
                text: entry.text.clone(),
                similarity: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.retain(|entry| entry.similarity > self.threshold);
        scored.truncate(self.top_k);
        scored
    }

    /// Render ranked hits into the generation context block, or the explicit
    /// no-context placeholder when nothing was relevant.
    pub fn context_block(hits: &[ScoredEntry]) -> String {
        if hits.is_empty() {
            return NO_CONTEXT.to_string();
        }
        hits.iter()
            .map(|hit| format!("Concept: {}\nContent:\n{}", hit.label, hit.text))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
