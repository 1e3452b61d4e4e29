//! Test infrastructure shared across the CALIBER workspace: stub
//! oracles, a deterministic embedder, and canned policy fixtures.

pub mod fixtures;
pub mod stub_oracle;

pub use stub_oracle::{DeterministicEmbedder, FixedOracle, ScriptedOracle};
