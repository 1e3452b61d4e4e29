//! The narrow LLM capability the core consumes (spec.md §6, §9 "Polymorphism
//! over oracles"). Every LLM-backed component (predicate watcher, threat
//! watcher, judge/chief judge, refusal classifier, ingestion stages) speaks
//! to its backing model only through this trait — no inheritance hierarchy,
//! one interface, one adapter per provider.

use crate::cancellation::CancellationToken;
use async_trait::async_trait;
use caliber_core::OracleError;
use serde::{Deserialize, Serialize};

/// The role of a message in an oracle conversation. The source only ever
/// sends `system` and `user` messages (no assistant turns in-context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single message in an oracle request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleMessage {
    pub role: Role,
    pub content: String,
    /// Optional source label (mirrors `UserMessage(source=...)` upstream);
    /// purely informational, not interpreted by the oracle trait itself.
    pub source: Option<String>,
}

impl OracleMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            source: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            source: Some("user".to_string()),
        }
    }
}

/// The oracle's reply. Only the text content matters to this core; token
/// accounting and other provider metadata are the provider's business.
#[derive(Debug, Clone)]
pub struct OracleResponse {
    pub content: String,
}

/// Capability trait every model-client backend implements (spec.md §6).
///
/// `json_output_hint` asks the provider to use structured-output mode when
/// it supports one; callers must still treat the response as raw text and
/// parse it themselves (see [`crate::json_extract`]), since not every
/// provider honors the hint.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn create(
        &self,
        messages: &[OracleMessage],
        json_output_hint: bool,
        cancellation_token: Option<&CancellationToken>,
    ) -> Result<OracleResponse, OracleError>;
}
