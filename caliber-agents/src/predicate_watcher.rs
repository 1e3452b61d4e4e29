//! Predicate Watcher (C3, spec.md §4.2), grounded on
//! `src/guard/agents/predicate.py`'s `PredicateWatcher.on_message`: format
//! the predicate subset and observation into a prompt, then
//! `retry_extract_json` the response.

use crate::prompts;
use caliber_core::OracleError;
use caliber_llm::cancellation::CancellationToken;
use caliber_llm::oracle::{Oracle, OracleMessage};
use caliber_policy::Predicate;
use std::collections::{BTreeMap, HashMap};

/// The two observation strings C3/C6 are built from (spec.md §4.2).
#[derive(Debug, Clone)]
pub struct Observation {
    pub initial_user_request: String,
    pub current_conversation: String,
}

impl Observation {
    pub fn as_text(&self) -> String {
        format!(
            "Initial User Request: {}\nCurrent Conversation: {}",
            self.initial_user_request, self.current_conversation
        )
    }
}

/// Serializable view of a predicate subset sent to the watcher, mirroring
/// the `{name: {description, keywords, value}}` dict the source passes.
fn predicates_to_json(predicates: &BTreeMap<caliber_core::PredicateName, Predicate>) -> String {
    let map: serde_json::Map<String, serde_json::Value> = predicates
        .iter()
        .map(|(name, p)| {
            (
                name.as_str().to_string(),
                serde_json::json!({
                    "description": p.description,
                    "keywords": p.keywords,
                    "value": p.value,
                }),
            )
        })
        .collect();
    serde_json::Value::Object(map).to_string()
}

/// Oracle-backed predicate watcher.
pub struct PredicateWatcher {
    oracle: std::sync::Arc<dyn Oracle>,
}

impl PredicateWatcher {
    pub fn new(oracle: std::sync::Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Determine which predicates in `subset` changed value given
    /// `observation`. Only names present in `subset` are meaningful in
    /// the output; spec.md §4.2 requires the caller (C7) to ignore any
    /// other name the model might hallucinate, so this function filters
    /// the raw response down to `subset`'s keys itself.
    ///
    /// On a persistent [`OracleError::JsonFailure`] (after the 3-attempt
    /// retry in `retry_extract_json`), returns the error for the caller
    /// to fail-open on (spec.md §7: "treated as 'no change'").
    pub async fn watch(
        &self,
        subset: &BTreeMap<caliber_core::PredicateName, Predicate>,
        observation: &Observation,
        cancellation_token: Option<&CancellationToken>,
    ) -> Result<HashMap<String, bool>, OracleError> {
        let predicates_json = predicates_to_json(subset);
        let prompt = prompts::predicate_watcher_user(&predicates_json, &observation.as_text());
        let messages = [
            OracleMessage::system(prompts::PREDICATE_WATCHER_SYSTEM),
            OracleMessage::user(prompt),
        ];
        let raw: HashMap<String, bool> =
            caliber_llm::json_extract::retry_extract_json(self.oracle.as_ref(), &messages, cancellation_token)
                .await?;
        Ok(raw
            .into_iter()
            .filter(|(name, _)| subset.contains_key(name.as_str()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use caliber_core::PredicateName;
    use caliber_llm::oracle::OracleResponse;

    struct StubOracle(&'static str);

    #[async_trait]
    impl Oracle for StubOracle {
        async fn create(
            &self,
            _messages: &[OracleMessage],
            _json_output_hint: bool,
            _cancellation_token: Option<&CancellationToken>,
        ) -> Result<OracleResponse, OracleError> {
            Ok(OracleResponse {
                content: self.0.to_string(),
            })
        }
    }

    fn subset_with(name: &str) -> BTreeMap<PredicateName, Predicate> {
        let mut m = BTreeMap::new();
        m.insert(
            PredicateName::from(name),
            Predicate {
                name: PredicateName::from(name),
                description: name.to_string(),
                keywords: vec![],
                value: false,
                default: false,
            },
        );
        m
    }

    #[tokio::test]
    async fn filters_unknown_names_out_of_the_response() {
        let watcher = PredicateWatcher::new(std::sync::Arc::new(StubOracle(
            r#"{"share_external": true, "made_up_predicate": true}"#,
        )));
        let subset = subset_with("share_external");
        let observation = Observation {
            initial_user_request: "do the thing".to_string(),
            current_conversation: "[]".to_string(),
        };
        let result = watcher.watch(&subset, &observation, None).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("share_external"), Some(&true));
    }
}
