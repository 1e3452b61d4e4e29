//! Concrete `Oracle` implementations per model-client backend.

pub mod anthropic;
pub mod openai;
