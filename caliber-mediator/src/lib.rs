//! The CALIBER guard mediator: the Guard orchestrator (C7, spec.md
//! §4.6) and the interception adapter (C8, spec.md §4.7) that wires
//! classified host-runtime events to it.

pub mod adapter;
pub mod guard;

pub use adapter::{InterceptionAdapter, PublishContext};
pub use guard::Guard;
