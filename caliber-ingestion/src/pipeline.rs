//! Policy ingestion pipeline (C9, spec.md §4.8), grounded on
//! `original_source/src/guard/utils/extraction.py`'s `PolicyAgent`: a
//! four-stage oracle chain (extract -> logicize -> verify -> refine)
//! over each chunk, with per-file disk caching and cross-file raw-text
//! accumulation.

use crate::cache::{self, IngestionRecord};
use crate::chunk::chunk_document;
use caliber_core::{GuardError, GuardResult, IngestionError};
use caliber_llm::cancellation::CancellationToken;
use caliber_llm::oracle::{Oracle, OracleMessage};
use std::path::Path;
use std::sync::Arc;

const POLICY_EXTRACTION_SYSTEM: &str = "\
Extract every concrete, enforceable rule from the policy document below, \
along with definitions for any term needed to interpret it without the \
surrounding document. Use the document's own wording for each rule; do \
not paraphrase. Respond as prose, one rule per paragraph.";

const LOGIC_EXTRACTION_SYSTEM: &str = "\
Translate each extracted rule into a propositional-logic expression over \
atomic, positively framed, directly observable predicates, using NOT, \
AND, OR, and IMPLIES. For each predicate, propose a name, a one-sentence \
description, a few retrieval keywords, and a default truth value. \
Respond as prose describing each rule's logic and its predicates.";

const VERIFY_PREDICATE_SYSTEM: &str = "\
Review the predicates proposed below. A predicate must be verifiable \
from direct observation, concrete, atomic (one fact per predicate), and \
necessary (not redundant or assumed by default). Split, rename, or drop \
predicates that fail these criteria, and describe the corrected set in \
prose.";

const REFINE_PREDICATE_SYSTEM: &str = "\
Merge or prune predicates across the rules below that describe the same \
underlying fact under different names, preserving the full meaning and \
coverage of every rule. Respond with a JSON array of objects, each \
shaped {\"predicates\": [[name, description, [keywords...], default]...], \
\"logic\": \"<propositional logic expression>\", \"description\": \"<rule \
description>\"} and nothing else.";

/// The four-stage LLM extraction pipeline plus its on-disk cache and
/// cross-file raw-text accumulation (spec.md §4.8).
pub struct PolicyIngestion {
    oracle: Arc<dyn Oracle>,
    chunk_size: usize,
    accumulated_raw_text: Option<String>,
}

impl PolicyIngestion {
    pub fn new(oracle: Arc<dyn Oracle>, chunk_size: usize) -> Self {
        Self {
            oracle,
            chunk_size,
            accumulated_raw_text: None,
        }
    }

    /// Ingest one file, returning its extracted `[{predicates, logic,
    /// description}]` records. If `<path>.cache.json` already exists it
    /// is used verbatim and no oracle calls are made (spec.md §4.8
    /// "Caching").
    ///
    /// Prepends the raw text of every previously ingested file in this
    /// session before chunking (spec.md §4.8 "Concatenation policy"),
    /// then extends the accumulation with this file's own content for
    /// the next call.
    pub async fn extract_from_file(
        &mut self,
        path: &Path,
        cancellation_token: Option<&CancellationToken>,
    ) -> GuardResult<Vec<IngestionRecord>> {
        let content = std::fs::read_to_string(path).map_err(|e| IngestionError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let full_content = match &self.accumulated_raw_text {
            Some(prior) => format!("{prior}\n\n{content}"),
            None => content.clone(),
        };
        self.accumulated_raw_text = Some(full_content.clone());

        if let Some(cached) = cache::load_cache(path)? {
            tracing::debug!(path = %path.display(), "ingestion cache hit, skipping extraction");
            return Ok(cached);
        }

        let chunks = chunk_document(&full_content, self.chunk_size);
        let mut records = Vec::new();
        for chunk in chunks {
            records.extend(self.extract_from_chunk(&chunk, cancellation_token).await?);
        }

        cache::write_cache(path, &records)?;
        Ok(records)
    }

    /// Run the four stages over one chunk of text: extract the natural
    /// language rules, translate to logic, verify the predicates, then
    /// refine/merge them into the final JSON records. Only the final
    /// stage's output is parsed as JSON; the intermediate stages are
    /// opaque natural-language text passed straight to the next stage.
    pub async fn extract_from_chunk(
        &self,
        chunk: &str,
        cancellation_token: Option<&CancellationToken>,
    ) -> GuardResult<Vec<IngestionRecord>> {
        let extracted = self
            .call_stage(POLICY_EXTRACTION_SYSTEM, chunk, cancellation_token)
            .await?;
        let logicized = self
            .call_stage(LOGIC_EXTRACTION_SYSTEM, &extracted, cancellation_token)
            .await?;
        let verified = self
            .call_stage(VERIFY_PREDICATE_SYSTEM, &logicized, cancellation_token)
            .await?;
        let refined = self
            .call_stage(REFINE_PREDICATE_SYSTEM, &verified, cancellation_token)
            .await?;

        let records: Vec<IngestionRecord> = caliber_llm::json_extract::extract_json(&refined)
            .map_err(GuardError::Oracle)?;
        Ok(records)
    }

    async fn call_stage(
        &self,
        system_prompt: &str,
        content: &str,
        cancellation_token: Option<&CancellationToken>,
    ) -> Result<String, GuardError> {
        let messages = [
            OracleMessage::system(system_prompt),
            OracleMessage::user(content),
        ];
        let response = self
            .oracle
            .create(&messages, false, cancellation_token)
            .await
            .map_err(GuardError::Oracle)?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use caliber_llm::oracle::OracleResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StageCountingOracle {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Oracle for StageCountingOracle {
        async fn create(
            &self,
            _messages: &[OracleMessage],
            _json_output_hint: bool,
            _cancellation_token: Option<&CancellationToken>,
        ) -> Result<OracleResponse, caliber_core::OracleError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let content = if n == 3 {
                r#"[{"predicates": [["share_external", "sharing data externally", ["share"], false]], "logic": "share_external IMPLIES is_authorized", "description": "no unauthorized sharing"}]"#.to_string()
            } else {
                "intermediate stage text".to_string()
            };
            Ok(OracleResponse { content })
        }
    }

    #[tokio::test]
    async fn four_stages_run_in_order_and_only_the_last_is_parsed() {
        let oracle = Arc::new(StageCountingOracle {
            calls: AtomicUsize::new(0),
        });
        let pipeline = PolicyIngestion::new(oracle.clone(), 10_000);
        let records = pipeline.extract_from_chunk("some policy text", None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].logic, "share_external IMPLIES is_authorized");
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn cache_hit_skips_every_oracle_call() {
        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("policy.md");
        std::fs::write(&doc_path, "some policy document").unwrap();
        let record = IngestionRecord {
            predicates: vec![crate::cache::PredicateRecord(
                "x".to_string(),
                "x desc".to_string(),
                vec![],
                false,
            )],
            logic: "x".to_string(),
            description: "d".to_string(),
        };
        cache::write_cache(&doc_path, &[record.clone()]).unwrap();

        let oracle = Arc::new(StageCountingOracle {
            calls: AtomicUsize::new(0),
        });
        let mut pipeline = PolicyIngestion::new(oracle.clone(), 10_000);
        let records = pipeline.extract_from_file(&doc_path, None).await.unwrap();
        assert_eq!(records, vec![record]);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn second_file_accumulates_the_first_files_raw_text() {
        let dir = tempfile::tempdir().unwrap();
        let path_a = dir.path().join("a.md");
        let path_b = dir.path().join("b.md");
        std::fs::write(&path_a, "rule about a").unwrap();
        std::fs::write(&path_b, "rule about b").unwrap();

        let oracle = Arc::new(StageCountingOracle {
            calls: AtomicUsize::new(0),
        });
        let mut pipeline = PolicyIngestion::new(oracle, 10_000);
        pipeline.extract_from_file(&path_a, None).await.unwrap();
        assert_eq!(pipeline.accumulated_raw_text.as_deref(), Some("rule about a"));
        pipeline.extract_from_file(&path_b, None).await.unwrap();
        assert_eq!(
            pipeline.accumulated_raw_text.as_deref(),
            Some("rule about a\n\nrule about b")
        );
    }
}
