//! Embedding-function capability (spec.md §6), consumed by the predicate
//! vector index (C1) built in `caliber-context`.

use async_trait::async_trait;
use caliber_core::{EmbeddingVector, OracleError};

/// Maps text to a vector. Backs the predicate similarity index.
#[async_trait]
pub trait EmbeddingFunction: Send + Sync {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, OracleError>;
}
