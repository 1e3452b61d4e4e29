//! Shared data types, identifiers, error taxonomy, and configuration
//! for the CALIBER guard.

pub mod config;
pub mod embedding;
pub mod error;
pub mod ids;
pub mod threat;

pub use config::GuardConfig;
pub use embedding::EmbeddingVector;
pub use error::{
    ConfigError, GuardError, GuardResult, IngestionError, LogicError, OracleError, VectorError,
};
pub use ids::{AgentLabel, PredicateName, RuleName, ToolName};
pub use threat::ThreatLevel;
