//! Opaque string identifiers for the four name spaces the guard keeps
//! separate: predicates, rules, agents (senders/recipients), and tools.
//!
//! These are thin newtypes rather than database entity IDs; predicate
//! and rule names are user-authored opaque identifiers, so no UUID
//! backing is introduced.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! define_name {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

define_name!(PredicateName, "The unique name of a predicate.");
define_name!(RuleName, "The unique name of a rule within its policy set.");
define_name!(AgentLabel, "The identity label of a sender or recipient.");
define_name!(ToolName, "The name of a registered tool.");
