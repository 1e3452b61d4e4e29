//! Policy document ingestion pipeline (C9, spec.md §4.8): chunking,
//! the four-stage extraction chain, and the on-disk cache.

pub mod cache;
pub mod chunk;
pub mod pipeline;

pub use cache::{IngestionRecord, PredicateRecord};
pub use chunk::chunk_document;
pub use pipeline::PolicyIngestion;
