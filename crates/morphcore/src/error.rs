use crate::chain::{BlockId, ChainId};
use crate::port::PortDirection;
use crate::tag::TypeTag;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MorphError {
    #[error("Block error: {0}")]
    Block(#[from] BlockError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Tag disagreement when retrieving from a [`DataContainer`](crate::DataContainer).
///
/// Raised on tag equality checks, never by reinterpreting stored data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("type mismatch: expected {expected}, got {actual}")]
pub struct TypeMismatch {
    pub expected: TypeTag,
    pub actual: TypeTag,
}

#[derive(Error, Debug, Clone)]
pub enum BlockError {
    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),

    #[error("Config error for '{key}': {reason}")]
    ConfigParse { key: String, reason: String },

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Block construction failed: {0}")]
    ConstructionFailed(String),
}

#[derive(Error, Debug, Clone)]
pub enum ChainError {
    #[error("Chain not found: {0}")]
    NotFound(ChainId),

    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    #[error("Block {block} has no {direction} port named '{port}'")]
    PortNotFound {
        block: BlockId,
        direction: PortDirection,
        port: String,
    },

    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),

    #[error("Block type '{0}' is already registered with a different factory")]
    DuplicateRegistration(String),

    #[error("Failed to construct block of type '{block_type}': {source}")]
    ConstructionFailed {
        block_type: String,
        #[source]
        source: BlockError,
    },

    #[error(
        "Port '{from_port}' ({from_tag}) on block {from_block} cannot feed \
         port '{to_port}' ({to_tag}) on block {to_block}"
    )]
    TypeIncompatible {
        from_block: BlockId,
        from_port: String,
        from_tag: TypeTag,
        to_block: BlockId,
        to_port: String,
        to_tag: TypeTag,
    },

    #[error("Input port '{port}' on block {block} is already connected")]
    AlreadyConnected { block: BlockId, port: String },

    #[error("Mandatory input port '{port}' on block {block} is not connected")]
    NotConnected { block: BlockId, port: String },

    #[error("Cyclic dependency among blocks: {0:?}")]
    CyclicDependency(Vec<BlockId>),

    /// Ordering-invariant violation: a linked upstream block had not
    /// completed when its consumer was scheduled. Indicates an engine bug,
    /// not a user error.
    #[error("No data on port '{port}' of block {block}: upstream not executed")]
    NoData { block: BlockId, port: String },

    #[error("Block {block} failed: {source}")]
    BlockFailed {
        block: BlockId,
        #[source]
        source: BlockError,
    },

    #[error("Invalid chain: {0}")]
    Invalid(String),
}
