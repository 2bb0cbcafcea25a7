//! Core abstractions for the morph engine
//!
//! This crate provides the fundamental types that all other components
//! depend on: typed tags, type-erased data containers, port declarations,
//! the block trait, the serializable chain description and the run event
//! bus. It contains no execution logic.

mod block;
mod chain;
mod compat;
mod container;
mod error;
mod events;
pub mod geometry;
mod port;
mod tag;
mod value;

pub use block::{parse_coord, Block, BlockContext, BlockOutput, BlockState};
pub use chain::{BlockId, BlockSpec, Chain, ChainId, Link};
pub use compat::{CompatibilityTable, Converter};
pub use container::DataContainer;
pub use error::{BlockError, ChainError, MorphError, TypeMismatch};
pub use events::{BlockMessage, EventBus, EventEmitter, RunEvent, RunId};
pub use geometry::{Coord3, TriMesh};
pub use port::{PortDecl, PortDirection};
pub use tag::{Arity, DataKind, TypeTag};
pub use value::GeoValue;

/// Result type for morph operations
pub type Result<T> = std::result::Result<T, MorphError>;
