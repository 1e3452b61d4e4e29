//! Conversation context, per-sender history, and the predicate vector
//! index for the CALIBER guard (spec.md §3, §4.6 step 4).

pub mod history;
pub mod index;

pub use history::{ConversationContext, SenderHistory};
pub use index::{PredicateIndex, QueryResult};
