//! Judge / Chief Judge (C6, spec.md §4.5), grounded on
//! `quadsentinel/agents/judge.py`'s `JudgeAgent` (two prompt modes, one
//! type, two registered instances backed by different model clients —
//! the escalation asymmetry lives in the mediator, not here).

use crate::prompts;
use caliber_core::{OracleError, ThreatLevel};
use caliber_llm::cancellation::CancellationToken;
use caliber_llm::oracle::{Oracle, OracleMessage};
use serde::Deserialize;

/// A tool descriptor passed to the judge in action mode.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub arguments: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JudgeVerdict {
    pub decision: bool,
    pub reason: String,
}

/// An LLM-backed adjudicator. The same type serves as both Judge and
/// Chief Judge (spec.md §4.5: "identical contracts but different
/// underlying models") — construct two instances with different
/// `Oracle`s.
pub struct Judge {
    oracle: std::sync::Arc<dyn Oracle>,
}

impl Judge {
    pub fn new(oracle: std::sync::Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Action-mode adjudication (spec.md §4.5): observation, threat
    /// level, violated-rule reasons, tool descriptor.
    pub async fn judge_action(
        &self,
        observation: &str,
        threat_level: ThreatLevel,
        violated_rules: &[String],
        tool: &ToolDescriptor,
        cancellation_token: Option<&CancellationToken>,
    ) -> Result<JudgeVerdict, OracleError> {
        let rules_text = format!("{violated_rules:?}");
        let prompt = prompts::judge_action_user(
            observation,
            threat_level.label(),
            &tool.name,
            &tool.description,
            &tool.arguments,
            &rules_text,
        );
        let messages = [
            OracleMessage::system(prompts::JUDGE_SYSTEM),
            OracleMessage::user(prompt),
        ];
        caliber_llm::json_extract::retry_extract_json(self.oracle.as_ref(), &messages, cancellation_token).await
    }

    /// Message-mode adjudication (spec.md §4.5): observation,
    /// violated-rule reasons only (no tool, no threat level).
    pub async fn judge_message(
        &self,
        observation: &str,
        violated_rules: &[String],
        cancellation_token: Option<&CancellationToken>,
    ) -> Result<JudgeVerdict, OracleError> {
        let rules_text = format!("{violated_rules:?}");
        let prompt = prompts::judge_message_user(observation, &rules_text);
        let messages = [
            OracleMessage::system(prompts::JUDGE_SYSTEM_MSG),
            OracleMessage::user(prompt),
        ];
        caliber_llm::json_extract::retry_extract_json(self.oracle.as_ref(), &messages, cancellation_token).await
    }
}
