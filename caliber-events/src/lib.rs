//! Interception adapter (C8, spec.md §4.7): event classification and the
//! refusal classifier that sit between a host runtime and the mediator.

pub mod classify;
pub mod refusal;

pub use classify::{classify, Dispatch, EventContent, SourceKind, ToolCall, FULL_PREDICATE_SET, REFUSE_TERMINATION_TOOL};
pub use refusal::RefusalClassifier;
