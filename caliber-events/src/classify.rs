//! Interception event classification (C8, spec.md §4.7), grounded on
//! `src/guard/utils/intervention.py`'s dispatch table in
//! `GuardSentinelTeam.on_publish`/`on_send`: a host runtime event is
//! classified into one of a fixed set of kinds, each routed to a fixed
//! action, before the adapter ever calls the mediator.

use caliber_core::ToolName;

/// Sentinel k value meaning "use the whole predicate set, no similarity
/// filtering" (spec.md §4.6 step 4, §4.7 tool-summary row).
pub const FULL_PREDICATE_SET: i64 = -1;

/// The synthetic tool name that, when called, is always a hard deny
/// regardless of policy (spec.md §4.7).
pub const REFUSE_TERMINATION_TOOL: &str = "refuse_termination";

/// One requested tool call carried by a tool-call-request event.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub tool: ToolName,
    pub description: Option<String>,
    pub arguments: String,
}

impl ToolCall {
    /// Whether this call is the synthetic hard-deny tool (spec.md §4.7).
    pub fn is_hard_deny(&self) -> bool {
        self.tool.as_str() == REFUSE_TERMINATION_TOOL
    }
}

/// The shape of an intercepted host-runtime event, reduced to the
/// fields §4.7's classification table actually discriminates on.
#[derive(Debug, Clone)]
pub enum EventContent {
    /// A tool-execution event (the tool actually ran; not a request).
    ToolExecution,
    /// A textual tool-result summary message.
    ToolSummary(String),
    /// A message carrying plain text content.
    Text(String),
    /// A message-bearing event whose `.content` is not a string (e.g. a
    /// multimodal or structured payload).
    NonStringContent,
    /// One or more function-call requests.
    ToolCallRequest(Vec<ToolCall>),
    /// A group-chat reset or an agent's own response event.
    GroupChatResetOrAgentResponse,
    /// Anything the adapter does not recognize.
    Unknown,
}

/// Whether the event's source is the conversation's human user (used to
/// decide whether a text message needs the optional refusal check).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    User,
    NonUser,
}

/// What the adapter should do with a classified event, before any
/// mediator call is made.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Tool-execution events carry no decision-relevant content.
    Ignore,
    /// Route as a message to the mediator. `k = None` means "use the
    /// guard's configured default"; `Some(FULL_PREDICATE_SET)` means no
    /// similarity filtering.
    RouteMessage {
        text: String,
        k: Option<i64>,
        run_refusal_check: bool,
    },
    /// Route each call as an action. The adapter is responsible for
    /// checking [`ToolCall::is_hard_deny`] before calling the mediator.
    RouteActions(Vec<ToolCall>),
    /// No mediator call; continue the host workflow.
    Pass,
    /// No mediator call; log the event as unrecognized, then continue.
    LogAndPass,
}

/// Classify a host-runtime event per spec.md §4.7's table.
pub fn classify(content: &EventContent, source: SourceKind) -> Dispatch {
    match content {
        EventContent::ToolExecution => Dispatch::Ignore,
        EventContent::ToolSummary(text) => Dispatch::RouteMessage {
            text: text.clone(),
            k: Some(FULL_PREDICATE_SET),
            run_refusal_check: false,
        },
        EventContent::Text(text) => Dispatch::RouteMessage {
            text: text.clone(),
            k: None,
            run_refusal_check: source == SourceKind::NonUser,
        },
        EventContent::NonStringContent => Dispatch::RouteMessage {
            text: String::new(),
            k: Some(FULL_PREDICATE_SET),
            run_refusal_check: false,
        },
        EventContent::ToolCallRequest(calls) => Dispatch::RouteActions(calls.clone()),
        EventContent::GroupChatResetOrAgentResponse => Dispatch::Pass,
        EventContent::Unknown => Dispatch::LogAndPass,
    }
}
