//! Refusal classifier (C8, spec.md §4.7), grounded on
//! `src/guard/utils/intervention.py`'s `check_refusal`: a strict
//! forced-choice "Yes"/"No" oracle call distinguishing a *safety*
//! refusal from a capability/tooling limitation, plus a consecutive
//! counter and a GPT-family literal-substring shortcut.

use async_trait::async_trait;
use caliber_core::OracleError;
use caliber_llm::cancellation::CancellationToken;
use caliber_llm::oracle::{Oracle, OracleMessage};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// The default refusal-classifier system prompt (spec.md §4.7:
/// "distinguishes *safety* refusals from capability/tooling
/// limitations"), overridable by the host.
pub const DEFAULT_REFUSAL_SYSTEM: &str = "\
You judge whether an assistant's message is a refusal made for *safety* \
reasons (the assistant believes the request is unsafe, disallowed, or \
against policy) as opposed to a refusal made for capability or tooling \
reasons (the assistant cannot perform the action, lacks a tool, or hit \
an error). Answer with exactly one word, \"Yes\" or \"No\", and nothing \
else. Answer \"Yes\" only if the message cites a safety or policy reason \
for declining.";

/// A housekeeping message the host framework injects that must never be
/// misread as a refusal (spec.md §4.7 supplement).
const FACT_SHEET_SENTINEL: &str = "Here is an initial fact sheet to consider";

/// A literal substring that, for GPT-family hosts, triggers immediate
/// termination without calling the classifier (spec.md §4.7).
const GPT_SHORTCUT_SENTINEL: &str = "I'm sorry";

/// A consecutive-refusal counter backed by an LLM yes/no classifier.
/// Once [`RefusalClassifier::check`] reaches the configured threshold,
/// every subsequent call also signals termination: spec.md's end-to-end
/// scenario 7 notes termination is irrevocable once hit, because the
/// counter-reset rule only fires on an explicit "No" answer.
pub struct RefusalClassifier {
    oracle: Arc<dyn Oracle>,
    system_prompt: String,
    threshold: u32,
    consecutive: AtomicU32,
    gpt_shortcut: bool,
}

impl RefusalClassifier {
    pub fn new(oracle: Arc<dyn Oracle>, threshold: u32, gpt_shortcut: bool) -> Self {
        Self {
            oracle,
            system_prompt: DEFAULT_REFUSAL_SYSTEM.to_string(),
            threshold,
            consecutive: AtomicU32::new(0),
            gpt_shortcut,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Returns `true` if this message should cause the adapter to signal
    /// external termination. Skipped entirely (no oracle call, counter
    /// untouched, returns `false`) for a tool-summary message or for the
    /// fact-sheet housekeeping sentinel (spec.md §4.7 supplement).
    pub async fn check(
        &self,
        message: &str,
        is_tool_summary: bool,
        cancellation_token: Option<&CancellationToken>,
    ) -> Result<bool, OracleError> {
        if is_tool_summary || message.contains(FACT_SHEET_SENTINEL) {
            return Ok(false);
        }
        if self.gpt_shortcut && message.contains(GPT_SHORTCUT_SENTINEL) {
            self.consecutive.store(self.threshold, Ordering::SeqCst);
            return Ok(true);
        }

        let messages = [
            OracleMessage::system(self.system_prompt.clone()),
            OracleMessage::user(message),
        ];
        let response = self.oracle.create(&messages, false, cancellation_token).await?;
        let is_refusal = response.content.trim().eq_ignore_ascii_case("yes");

        if is_refusal {
            let count = self.consecutive.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(count >= self.threshold)
        } else {
            self.consecutive.store(0, Ordering::SeqCst);
            Ok(false)
        }
    }

    pub fn consecutive_refusals(&self) -> u32 {
        self.consecutive.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    async fn second_consecutive_yes_hits_the_default_threshold() {
        let classifier = RefusalClassifier::new(Arc::new(StubOracle("Yes")), 2, false);
        assert!(!classifier.check("I cannot help with that due to policy", false, None).await.unwrap());
        assert!(classifier.check("I cannot help with that due to policy", false, None).await.unwrap());
    }

    #[tokio::test]
    async fn a_no_answer_resets_the_counter() {
        let classifier = RefusalClassifier::new(Arc::new(StubOracle("Yes")), 2, false);
        assert!(!classifier.check("message one", false, None).await.unwrap());
        assert_eq!(classifier.consecutive_refusals(), 1);
    }

    #[tokio::test]
    async fn tool_summary_messages_are_skipped_entirely() {
        let classifier = RefusalClassifier::new(Arc::new(StubOracle("Yes")), 1, false);
        assert!(!classifier.check("I'm sorry, policy violation", true, None).await.unwrap());
        assert_eq!(classifier.consecutive_refusals(), 0);
    }

    #[tokio::test]
    async fn fact_sheet_sentinel_is_never_misread_as_a_refusal() {
        let classifier = RefusalClassifier::new(Arc::new(StubOracle("Yes")), 1, false);
        let msg = "Here is an initial fact sheet to consider before you begin.";
        assert!(!classifier.check(msg, false, None).await.unwrap());
    }

    #[tokio::test]
    async fn gpt_shortcut_terminates_immediately_without_calling_the_oracle() {
        let classifier = RefusalClassifier::new(Arc::new(StubOracle("No")), 5, true);
        let terminated = classifier.check("I'm sorry, I can't do that.", false, None).await.unwrap();
        assert!(terminated);
    }

    #[tokio::test]
    async fn gpt_shortcut_is_inert_when_disabled() {
        let classifier = RefusalClassifier::new(Arc::new(StubOracle("No")), 5, false);
        let terminated = classifier.check("I'm sorry, I can't do that.", false, None).await.unwrap();
        assert!(!terminated);
    }
}
