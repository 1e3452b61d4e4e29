//! JSON extraction with bounded retry, ported from
//! `quadsentinel/utils/functions.py`'s `extract_json`/`retry_extract_json`
//! (spec.md §4.2, §7 `OracleJSONFailure`).

use crate::cancellation::CancellationToken;
use crate::oracle::{Oracle, OracleMessage};
use caliber_core::OracleError;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF: Duration = Duration::from_secs(1);

/// Strip a ```json fenced code block, if present, then parse.
///
/// Tolerates responses that wrap their JSON in prose or markdown fences,
/// which models reliably do despite being asked for raw JSON.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, OracleError> {
    let fence = Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("static regex is valid");
    let candidate = fence
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);

    serde_json::from_str(candidate).map_err(|e| OracleError::JsonFailure {
        attempts: 1,
        reason: e.to_string(),
    })
}

/// Call the oracle and parse its response as JSON, retrying up to
/// [`MAX_ATTEMPTS`] times with a fixed one-second backoff between
/// attempts. A persistent failure after all attempts is an
/// [`OracleError::JsonFailure`] — callers (C3/C4/C6) treat this as a
/// fail-open condition per spec.md §7, never as a denial.
pub async fn retry_extract_json<T: DeserializeOwned>(
    oracle: &dyn Oracle,
    messages: &[OracleMessage],
    cancellation_token: Option<&CancellationToken>,
) -> Result<T, OracleError> {
    let mut last_reason = String::new();
    for attempt in 1..=MAX_ATTEMPTS {
        if let Some(token) = cancellation_token {
            if token.is_cancelled() {
                return Err(OracleError::Cancelled);
            }
        }
        let response = oracle
            .create(messages, true, cancellation_token)
            .await?;
        match extract_json::<T>(&response.content) {
            Ok(value) => return Ok(value),
            Err(OracleError::JsonFailure { reason, .. }) => {
                tracing::warn!(attempt, reason, "oracle response was not valid JSON, retrying");
                last_reason = reason;
            }
            Err(other) => return Err(other),
        }
        if attempt < MAX_ATTEMPTS {
            tokio::time::sleep(BACKOFF).await;
        }
    }
    Err(OracleError::JsonFailure {
        attempts: MAX_ATTEMPTS,
        reason: last_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::OracleResponse;
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        decision: bool,
    }

    #[test]
    fn extracts_raw_json() {
        let parsed: Sample = extract_json(r#"{"decision": true}"#).unwrap();
        assert_eq!(parsed, Sample { decision: true });
    }

    #[test]
    fn extracts_fenced_json() {
        let text = "Sure, here you go:\n```json\n{\"decision\": false}\n```\nThanks.";
        let parsed: Sample = extract_json(text).unwrap();
        assert_eq!(parsed, Sample { decision: false });
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(extract_json::<Sample>("not json at all").is_err());
    }

    struct FlakyOracle {
        calls: AtomicU32,
        succeed_on: u32,
    }

    #[async_trait]
    impl Oracle for FlakyOracle {
        async fn create(
            &self,
            _messages: &[OracleMessage],
            _json_output_hint: bool,
            _cancellation_token: Option<&CancellationToken>,
        ) -> Result<OracleResponse, OracleError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.succeed_on {
                Ok(OracleResponse {
                    content: r#"{"decision": true}"#.to_string(),
                })
            } else {
                Ok(OracleResponse {
                    content: "garbage".to_string(),
                })
            }
        }
    }

    #[tokio::test]
    async fn retries_up_to_three_times_then_succeeds() {
        let oracle = FlakyOracle {
            calls: AtomicU32::new(0),
            succeed_on: 3,
        };
        let result: Sample = retry_extract_json(&oracle, &[], None).await.unwrap();
        assert_eq!(result, Sample { decision: true });
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn persistent_failure_surfaces_json_failure() {
        let oracle = FlakyOracle {
            calls: AtomicU32::new(0),
            succeed_on: 99,
        };
        let result: Result<Sample, OracleError> = retry_extract_json(&oracle, &[], None).await;
        assert!(matches!(result, Err(OracleError::JsonFailure { attempts: 3, .. })));
    }

    #[tokio::test]
    async fn cancellation_short_circuits_without_calling_oracle() {
        let oracle = FlakyOracle {
            calls: AtomicU32::new(0),
            succeed_on: 1,
        };
        let token = CancellationToken::new();
        token.cancel();
        let result: Result<Sample, OracleError> =
            retry_extract_json(&oracle, &[], Some(&token)).await;
        assert!(matches!(result, Err(OracleError::Cancelled)));
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }
}
