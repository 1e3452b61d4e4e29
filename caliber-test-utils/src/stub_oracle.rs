//! Deterministic stub oracles for guard integration tests, grounded on
//! `MockEmbeddingProvider`'s hash-derived determinism: every stub here
//! is fully reproducible given its construction arguments, no RNG and
//! no real network call.

use async_trait::async_trait;
use caliber_core::{EmbeddingVector, OracleError};
use caliber_llm::cancellation::CancellationToken;
use caliber_llm::embedding::EmbeddingFunction;
use caliber_llm::oracle::{Oracle, OracleMessage};
use std::collections::VecDeque;
use std::sync::Mutex;

/// An oracle that returns the same fixed text for every call.
#[derive(Debug)]
pub struct FixedOracle {
    response: String,
}

impl FixedOracle {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl Oracle for FixedOracle {
    async fn create(
        &self,
        _messages: &[OracleMessage],
        _json_output_hint: bool,
        _cancellation_token: Option<&CancellationToken>,
    ) -> Result<caliber_llm::oracle::OracleResponse, OracleError> {
        Ok(caliber_llm::oracle::OracleResponse {
            content: self.response.clone(),
        })
    }
}

/// An oracle that plays back a fixed script of responses in order, one
/// per call, for tests asserting a specific multi-step call sequence
/// (e.g. "Judge denies, then Chief Judge denies").
#[derive(Debug)]
pub struct ScriptedOracle {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedOracle {
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn create(
        &self,
        _messages: &[OracleMessage],
        _json_output_hint: bool,
        _cancellation_token: Option<&CancellationToken>,
    ) -> Result<caliber_llm::oracle::OracleResponse, OracleError> {
        let mut responses = self.responses.lock().expect("stub oracle mutex poisoned");
        let content = responses
            .pop_front()
            .expect("ScriptedOracle ran out of scripted responses");
        Ok(caliber_llm::oracle::OracleResponse { content })
    }
}

/// A deterministic hash-derived embedding function mirroring
/// `MockEmbeddingProvider::generate_embedding`, adapted to the oracle
/// crate's [`EmbeddingFunction`] capability instead of a provider trait.
#[derive(Debug, Clone)]
pub struct DeterministicEmbedder {
    dimensions: usize,
}

impl DeterministicEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for DeterministicEmbedder {
    fn default() -> Self {
        Self::new(16)
    }
}

#[async_trait]
impl EmbeddingFunction for DeterministicEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, OracleError> {
        let mut data = vec![0.0f32; self.dimensions];
        for (i, byte) in text.bytes().enumerate() {
            data[i % self.dimensions] += (byte as f32) / 255.0;
        }
        let norm: f32 = data.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut data {
                *x /= norm;
            }
        }
        Ok(EmbeddingVector::new(data, "deterministic-test-embedder"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_oracle_always_returns_the_same_response() {
        let oracle = FixedOracle::new(r#"{"decision": true}"#);
        let r1 = oracle.create(&[], false, None).await.unwrap();
        let r2 = oracle.create(&[], false, None).await.unwrap();
        assert_eq!(r1.content, r2.content);
    }

    #[tokio::test]
    async fn scripted_oracle_plays_back_in_order() {
        let oracle = ScriptedOracle::new(["first", "second"]);
        assert_eq!(oracle.create(&[], false, None).await.unwrap().content, "first");
        assert_eq!(oracle.create(&[], false, None).await.unwrap().content, "second");
    }

    #[tokio::test]
    async fn deterministic_embedder_is_reproducible() {
        let embedder = DeterministicEmbedder::default();
        let v1 = embedder.embed("hello world").await.unwrap();
        let v2 = embedder.embed("hello world").await.unwrap();
        assert_eq!(v1.data, v2.data);
    }
}
