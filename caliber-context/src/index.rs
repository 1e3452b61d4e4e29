//! Predicate vector index (C1's "Predicate Index", spec.md §3), grounded
//! structurally on `caliber_core::embedding::EmbeddingVector::cosine_similarity`
//! and on the source's `chromadb.Client().get_or_create_collection(...)`
//! usage in `src/guard/agent.py` — a content-addressed in-memory index
//! queried by top-k nearest neighbor.

use caliber_core::{EmbeddingVector, OracleError, VectorError};
use caliber_llm::EmbeddingFunction;
use std::collections::HashMap;

/// One indexed document: the predicate name it was keyed under, plus
/// its embedding.
#[derive(Debug, Clone)]
struct IndexedEntry {
    document: String,
    vector: EmbeddingVector,
}

/// An in-memory content-addressed vector index over predicate records.
/// The key is the predicate name; the document text is the predicate's
/// serialized record (spec.md §3).
#[derive(Debug, Clone, Default)]
pub struct PredicateIndex {
    entries: HashMap<String, IndexedEntry>,
}

/// The result of a top-k query: ids and their distances, ordered by
/// increasing distance (spec.md §6 "Vector index (consumed)").
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub ids: Vec<String>,
    pub distances: Vec<f32>,
}

impl PredicateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a document under `id`, embedding it with
    /// `embedder`.
    pub async fn add(
        &mut self,
        id: impl Into<String>,
        document: impl Into<String>,
        embedder: &dyn EmbeddingFunction,
    ) -> Result<(), OracleError> {
        let id = id.into();
        let document = document.into();
        let vector = embedder.embed(&document).await?;
        self.entries.insert(
            id,
            IndexedEntry {
                document,
                vector,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn document(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(|e| e.document.as_str())
    }

    /// Top-k nearest neighbors to `text` by cosine distance (`1 -
    /// cosine_similarity`, so smaller is closer), stable for identical
    /// queries because ties are broken by id (spec.md §6's "must be
    /// stable for identical queries").
    pub async fn query(
        &self,
        text: &str,
        n: usize,
        embedder: &dyn EmbeddingFunction,
    ) -> Result<QueryResult, OracleError> {
        let query_vector = embedder.embed(text).await?;
        let mut scored: Vec<(String, f32)> = Vec::with_capacity(self.entries.len());
        for (id, entry) in &self.entries {
            let similarity = query_vector
                .cosine_similarity(&entry.vector)
                .map_err(|e: VectorError| OracleError::Transport {
                    reason: e.to_string(),
                })?;
            scored.push((id.clone(), 1.0 - similarity));
        }
        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(n);
        let (ids, distances) = scored.into_iter().unzip();
        Ok(QueryResult { ids, distances })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct DeterministicEmbedder;

    #[async_trait]
    impl EmbeddingFunction for DeterministicEmbedder {
        async fn embed(&self, text: &str) -> Result<EmbeddingVector, OracleError> {
            let mut data = vec![0.0f32; 8];
            for (i, byte) in text.bytes().enumerate() {
                data[i % 8] += byte as f32;
            }
            Ok(EmbeddingVector::new(data, "deterministic"))
        }
    }

    #[tokio::test]
    async fn query_returns_closest_first() {
        let embedder = DeterministicEmbedder;
        let mut index = PredicateIndex::new();
        index.add("share_external", "predicate about sharing data externally", &embedder).await.unwrap();
        index.add("is_deleting", "predicate about deleting files", &embedder).await.unwrap();
        let result = index.query("sharing data externally", 1, &embedder).await.unwrap();
        assert_eq!(result.ids, vec!["share_external".to_string()]);
    }

    #[tokio::test]
    async fn query_is_stable_for_identical_queries() {
        let embedder = DeterministicEmbedder;
        let mut index = PredicateIndex::new();
        index.add("a", "alpha document", &embedder).await.unwrap();
        index.add("b", "beta document", &embedder).await.unwrap();
        let r1 = index.query("alpha", 2, &embedder).await.unwrap();
        let r2 = index.query("alpha", 2, &embedder).await.unwrap();
        assert_eq!(r1, r2);
    }

    #[tokio::test]
    async fn truncates_to_n() {
        let embedder = DeterministicEmbedder;
        let mut index = PredicateIndex::new();
        for i in 0..5 {
            index.add(format!("p{i}"), format!("document {i}"), &embedder).await.unwrap();
        }
        let result = index.query("document", 3, &embedder).await.unwrap();
        assert_eq!(result.ids.len(), 3);
    }
}
