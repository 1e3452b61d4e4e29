//! Error types for the CALIBER guard.

use thiserror::Error;

/// Logic-evaluation errors (C2).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LogicError {
    #[error("malformed logic expression: {reason}")]
    MalformedExpression { reason: String },

    #[error("unresolved identifier after predicate substitution: {name}")]
    UnresolvedIdentifier { name: String },

    #[error("unexpected end of expression")]
    UnexpectedEof,

    #[error("unexpected token: {found}")]
    UnexpectedToken { found: String },
}

/// Oracle (LLM-backed capability) errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("oracle response was not valid JSON after {attempts} attempts: {reason}")]
    JsonFailure { attempts: u32, reason: String },

    #[error("oracle transport failure: {reason}")]
    Transport { reason: String },

    #[error("oracle call was cancelled")]
    Cancelled,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Vector operation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VectorError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: i32, got: i32 },

    #[error("invalid vector: {reason}")]
    InvalidVector { reason: String },
}

/// Ingestion pipeline errors (C9).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestionError {
    #[error("failed to read policy document {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("failed to read or write ingestion cache {path}: {reason}")]
    CacheFailed { path: String, reason: String },

    #[error("malformed ingestion record: {reason}")]
    MalformedRecord { reason: String },
}

/// Master error type for all CALIBER guard operations.
#[derive(Debug, Clone, Error)]
pub enum GuardError {
    #[error("logic error: {0}")]
    Logic(#[from] LogicError),

    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("vector error: {0}")]
    Vector(#[from] VectorError),

    #[error("ingestion error: {0}")]
    Ingestion(#[from] IngestionError),
}

/// Result type alias for CALIBER guard operations.
pub type GuardResult<T> = Result<T, GuardError>;
