//! Threat Watcher (C4, spec.md §4.3), grounded on
//! `quadsentinel/agents/threat.py`'s `ThreatWatcher.on_message`: the
//! oracle returns an absolute new level; the caller clamps to `[0,4]`
//! and applies `max()` contagion to the recipient (spec.md §4.3's
//! contract says the transition itself is "delegated to the LLM oracle,
//! but constrained" — clamping and contagion are this crate's job, not
//! the oracle's).

use crate::prompts;
use caliber_core::{OracleError, ThreatLevel};
use caliber_llm::cancellation::CancellationToken;
use caliber_llm::oracle::{Oracle, OracleMessage};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ThreatResponse {
    threat_level: i32,
}

/// Oracle-backed threat watcher.
pub struct ThreatWatcher {
    oracle: std::sync::Arc<dyn Oracle>,
}

impl ThreatWatcher {
    pub fn new(oracle: std::sync::Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Assess the sender's new threat level from their windowed history
    /// (already including the newest observation) and current level.
    /// The result is clamped into `[0,4]` regardless of what the oracle
    /// returns (spec.md §4.3).
    pub async fn assess(
        &self,
        history_text: &str,
        current_level: ThreatLevel,
        cancellation_token: Option<&CancellationToken>,
    ) -> Result<ThreatLevel, OracleError> {
        let prompt = prompts::threat_watcher_user(history_text, current_level.value());
        let messages = [
            OracleMessage::system(prompts::THREAT_WATCHER_SYSTEM),
            OracleMessage::user(prompt),
        ];
        let response: ThreatResponse =
            caliber_llm::json_extract::retry_extract_json(self.oracle.as_ref(), &messages, cancellation_token)
                .await?;
        Ok(ThreatLevel::clamp(response.threat_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
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

    #[tokio::test]
    async fn clamps_an_out_of_range_oracle_response() {
        let watcher = ThreatWatcher::new(std::sync::Arc::new(StubOracle(r#"{"threat_level": 9}"#)));
        let level = watcher
            .assess("[]", ThreatLevel::TRUSTED, None)
            .await
            .unwrap();
        assert_eq!(level, ThreatLevel::CRITICAL);
    }

    #[tokio::test]
    async fn accepts_a_valid_level() {
        let watcher = ThreatWatcher::new(std::sync::Arc::new(StubOracle(r#"{"threat_level": 2}"#)));
        let level = watcher
            .assess("[]", ThreatLevel::LOW, None)
            .await
            .unwrap();
        assert_eq!(level, ThreatLevel::MODERATE);
    }
}
