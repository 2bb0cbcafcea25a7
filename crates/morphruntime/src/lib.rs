//! Chain execution runtime
//!
//! This crate provides the engine that runs manipulation chains: the block
//! registry, link validation, cycle checking, deterministic topological
//! ordering and strictly sequential execution.

mod executor;
mod registry;
mod runtime;

pub use executor::{ChainExecutor, RunOutcome, RunReport};
pub use registry::{BlockFactory, BlockMetadata, BlockRegistry};
pub use runtime::{MorphRuntime, RuntimeConfig};
