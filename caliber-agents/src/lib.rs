//! Oracle-backed observer and adjudicator agents for the CALIBER guard
//! (spec.md §4.2-§4.5: Predicate Watcher, Threat Watcher, Judge/Chief
//! Judge). Escalation orchestration between these agents belongs to
//! `caliber-mediator`; this crate only provides the individual contracts.

pub mod judge;
pub mod predicate_watcher;
pub mod prompts;
pub mod threat_watcher;

pub use judge::{Judge, JudgeVerdict, ToolDescriptor};
pub use predicate_watcher::{Observation, PredicateWatcher};
pub use threat_watcher::ThreatWatcher;
