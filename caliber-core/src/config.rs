//! Guard-wide configuration. Every field is explicit; there is no
//! `Default` impl by design — callers must state every option.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Configuration for the guard mediator and its supporting components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Capacity of the conversation context FIFO.
    pub message_buffer_size: usize,
    /// Default `k` for top-k predicate retrieval when the caller does
    /// not override it.
    pub default_predicate_update_size: i64,
    /// Fixed capacity of each sender's windowed history.
    pub per_sender_history_capacity: usize,
    /// Consecutive refusal-classifier "Yes" answers before termination.
    pub refusal_threshold: u32,
    /// Maximum characters per ingestion chunk.
    pub ingestion_chunk_size: usize,
    /// Maximum characters of message text used as a similarity query.
    pub similarity_query_truncation: usize,
    /// Whether `handle_message` always checks the message policy,
    /// regardless of threat level.
    pub force_message_check: bool,
}

impl GuardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.message_buffer_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "message_buffer_size".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.per_sender_history_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "per_sender_history_capacity".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.refusal_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "refusal_threshold".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.ingestion_chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ingestion_chunk_size".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// The configuration the source implementation observably used.
    /// Not a `Default` impl: callers opt into these values explicitly.
    pub fn source_defaults() -> Self {
        Self {
            message_buffer_size: 5,
            default_predicate_update_size: 5,
            per_sender_history_capacity: 5,
            refusal_threshold: 2,
            ingestion_chunk_size: 10_000,
            similarity_query_truncation: 8_000,
            force_message_check: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_defaults_validate() {
        assert!(GuardConfig::source_defaults().validate().is_ok());
    }

    #[test]
    fn zero_buffer_size_is_rejected() {
        let mut cfg = GuardConfig::source_defaults();
        cfg.message_buffer_size = 0;
        assert!(cfg.validate().is_err());
    }
}
