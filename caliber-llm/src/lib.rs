//! Oracle capability trait, JSON-extraction retry, cancellation
//! primitives, and model-provider clients for the CALIBER guard (spec.md
//! §6's "Model-client oracle (consumed)" and "Embedding function
//! (consumed)").

pub mod cancellation;
pub mod embedding;
pub mod json_extract;
pub mod oracle;
pub mod providers;

pub use cancellation::{CancellationToken, OneShotFlag};
pub use embedding::EmbeddingFunction;
pub use json_extract::{extract_json, retry_extract_json};
pub use oracle::{Oracle, OracleMessage, OracleResponse, Role};
pub use providers::anthropic::AnthropicOracle;
pub use providers::openai::OpenAiOracle;
