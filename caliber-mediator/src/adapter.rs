//! Interception adapter (C8, spec.md §4.7), grounded on
//! `original_source/src/guard/utils/intervention.py`'s
//! `GuardInterventionHandler`: classify an intercepted host-runtime
//! event, route it through the [`Guard`], and signal external
//! termination on any denial (or on the synthetic `refuse_termination`
//! hard-deny tool, or on a confirmed safety refusal).
//!
//! The host agent framework that produces these events is explicitly
//! out of scope (spec.md §1); this adapter only requires the three
//! hook shapes spec.md §4.7/§6 describe, with sender/recipient already
//! resolved to [`AgentLabel`]s the way the source resolves
//! `message_context.sender.type` / `message_context.topic_id.type`
//! before ever reaching the handler body.

use caliber_core::AgentLabel;
use caliber_events::{classify, Dispatch, EventContent, SourceKind};
use caliber_llm::cancellation::{CancellationToken, OneShotFlag};

use crate::guard::Guard;

/// Sender/recipient already resolved from the host's publish/send
/// context, matching spec.md §4.7's `on_publish`/`on_send` extraction
/// (`ctx.sender.type`, `ctx.topic_id.type` / the explicit `recipient`
/// argument).
#[derive(Debug, Clone, Default)]
pub struct PublishContext {
    pub sender: Option<AgentLabel>,
    pub recipient: Option<AgentLabel>,
}

/// Wires event classification, the optional refusal classifier, and
/// the [`Guard`] mediator together, enforcing external termination on
/// denial (spec.md §4.7).
pub struct InterceptionAdapter {
    guard: Guard,
    termination: OneShotFlag,
    refusal_classifier: Option<caliber_events::RefusalClassifier>,
}

impl InterceptionAdapter {
    pub fn new(guard: Guard, termination: OneShotFlag, refusal_classifier: Option<caliber_events::RefusalClassifier>) -> Self {
        Self {
            guard,
            termination,
            refusal_classifier,
        }
    }

    pub fn guard(&self) -> &Guard {
        &self.guard
    }

    pub fn guard_mut(&mut self) -> &mut Guard {
        &mut self.guard
    }

    /// The one-shot flag the host observes to learn the workflow has
    /// been terminated (spec.md §6).
    pub fn termination(&self) -> &OneShotFlag {
        &self.termination
    }

    /// A broadcast event (spec.md §4.7 `on_publish`): sender/recipient
    /// have already been extracted by the caller from
    /// `ctx.sender.type`/`ctx.topic_id.type`.
    pub async fn on_publish(
        &mut self,
        content: &EventContent,
        source: SourceKind,
        ctx: &PublishContext,
        cancellation_token: Option<&CancellationToken>,
    ) {
        self.dispatch(content, source, ctx.sender.as_ref(), ctx.recipient.as_ref(), cancellation_token)
            .await;
    }

    /// A unicast event (spec.md §4.7 `on_send`): `recipient` is the
    /// explicit argument the host passes rather than a context field.
    pub async fn on_send(
        &mut self,
        content: &EventContent,
        source: SourceKind,
        sender: Option<&AgentLabel>,
        recipient: Option<&AgentLabel>,
        cancellation_token: Option<&CancellationToken>,
    ) {
        self.dispatch(content, source, sender, recipient, cancellation_token).await;
    }

    /// `on_response` is a passthrough (spec.md §4.7: "not enforced in
    /// this design").
    pub async fn on_response(&mut self, _sender: Option<&AgentLabel>, _recipient: Option<&AgentLabel>) {}

    async fn dispatch(
        &mut self,
        content: &EventContent,
        source: SourceKind,
        sender: Option<&AgentLabel>,
        recipient: Option<&AgentLabel>,
        cancellation_token: Option<&CancellationToken>,
    ) {
        if self.termination.is_set() {
            return;
        }
        match classify(content, source) {
            Dispatch::Ignore => {}
            Dispatch::Pass => {}
            Dispatch::LogAndPass => {
                tracing::warn!("unrecognized intercepted event, passing through");
            }
            Dispatch::RouteMessage { text, k, run_refusal_check } => {
                if run_refusal_check {
                    if let Some(classifier) = &self.refusal_classifier {
                        match classifier.check(&text, false, cancellation_token).await {
                            Ok(true) => {
                                self.termination.set();
                                return;
                            }
                            Ok(false) => {}
                            Err(_) => {} // fail-open: refusal classifier failures do not terminate
                        }
                    }
                }
                match self.guard.handle_message(&text, k, sender, recipient, cancellation_token).await {
                    Ok((true, _)) => {}
                    Ok((false, reason)) => {
                        tracing::warn!(reason, "message blocked");
                        self.termination.set();
                    }
                    Err(_) => {} // fail-open (spec.md §7)
                }
            }
            Dispatch::RouteActions(calls) => {
                for call in calls {
                    let hard_deny = call.is_hard_deny();
                    match self
                        .guard
                        .handle_action(&call.tool, &call.arguments, call.description.as_deref(), sender, cancellation_token)
                        .await
                    {
                        Ok((allow, reason)) => {
                            if !allow || hard_deny {
                                if !reason.is_empty() {
                                    tracing::warn!(reason, "action blocked");
                                }
                                self.termination.set();
                                return;
                            }
                        }
                        Err(_) => {
                            // fail-open on oracle failure (spec.md §7), but the
                            // synthetic hard-deny tool is still a hard deny.
                            if hard_deny {
                                self.termination.set();
                                return;
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caliber_core::{GuardConfig, ToolName};
    use caliber_events::ToolCall;
    use caliber_test_utils::stub_oracle::{DeterministicEmbedder, FixedOracle};
    use std::sync::Arc;

    fn plain_guard() -> Guard {
        let config = GuardConfig::source_defaults();
        let oracle = Arc::new(FixedOracle::new(r#"{"decision": true, "reason": ""}"#));
        let embedder = Arc::new(DeterministicEmbedder::default());
        Guard::new(config, oracle.clone(), oracle.clone(), oracle, embedder).unwrap()
    }

    #[tokio::test]
    async fn refuse_termination_tool_always_terminates() {
        let guard = plain_guard();
        let termination = OneShotFlag::new();
        let mut adapter = InterceptionAdapter::new(guard, termination.clone(), None);
        let calls = vec![ToolCall {
            tool: ToolName::from(caliber_events::REFUSE_TERMINATION_TOOL),
            description: None,
            arguments: "{}".to_string(),
        }];
        adapter
            .on_publish(
                &EventContent::ToolCallRequest(calls),
                SourceKind::NonUser,
                &PublishContext::default(),
                None,
            )
            .await;
        assert!(termination.is_set());
    }

    #[tokio::test]
    async fn tool_execution_event_never_terminates() {
        let guard = plain_guard();
        let termination = OneShotFlag::new();
        let mut adapter = InterceptionAdapter::new(guard, termination.clone(), None);
        adapter
            .on_publish(&EventContent::ToolExecution, SourceKind::NonUser, &PublishContext::default(), None)
            .await;
        assert!(!termination.is_set());
    }
}
