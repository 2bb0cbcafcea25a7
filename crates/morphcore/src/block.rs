use crate::chain::BlockId;
use crate::container::DataContainer;
use crate::error::BlockError;
use crate::events::EventEmitter;
use crate::geometry::Coord3;
use crate::port::PortDecl;
use crate::value::GeoValue;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Core trait every manipulation block implements.
///
/// A block declares its ports and transforms the inputs handed to it into
/// published outputs. Blocks never reach into each other; all data moves
/// through the declared links, driven by the executor.
#[async_trait]
pub trait Block: Send + Sync {
    /// Type identifier (e.g. "manip.translate", "source.mesh")
    fn block_type(&self) -> &str;

    /// Input ports, in declaration order.
    fn input_ports(&self) -> Vec<PortDecl>;

    /// Output ports, in declaration order.
    fn output_ports(&self) -> Vec<PortDecl>;

    /// Execute one step: read inputs, transform, publish outputs.
    async fn execute(&self, ctx: BlockContext) -> Result<BlockOutput, BlockError>;
}

impl std::fmt::Debug for dyn Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("block_type", &self.block_type())
            .finish()
    }
}

/// Execution state of a block within one chain run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockState {
    NotExecuted,
    Executed,
    Failed,
    /// Not executed because an upstream block failed.
    Skipped,
}

/// Execution context passed to each block
#[derive(Clone)]
pub struct BlockContext {
    /// Block instance id within the chain
    pub block_id: BlockId,

    /// Input containers resolved along the block's links
    pub inputs: HashMap<String, DataContainer>,

    /// Static configuration record; all values are text and each block
    /// parses its own keys
    pub config: HashMap<String, String>,

    /// Event emitter for progress and diagnostics
    pub events: EventEmitter,
}

impl BlockContext {
    pub fn new(block_id: BlockId, events: EventEmitter) -> Self {
        Self {
            block_id,
            inputs: HashMap::new(),
            config: HashMap::new(),
            events,
        }
    }

    pub fn input(&self, name: &str) -> Option<&DataContainer> {
        self.inputs.get(name)
    }

    /// Get required input or return error
    pub fn require_input(&self, name: &str) -> Result<&DataContainer, BlockError> {
        self.inputs
            .get(name)
            .ok_or_else(|| BlockError::MissingInput(name.to_string()))
    }

    /// Get config with default. Structured config belongs to the factory;
    /// this covers the runtime toggles a block reads per execution.
    pub fn config_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.config.get(key).map(String::as_str).unwrap_or(default)
    }
}

pub fn parse_coord(raw: &str) -> Option<Coord3> {
    let mut parts = raw.split_whitespace().map(str::parse::<f64>);
    let coord = [
        parts.next()?.ok()?,
        parts.next()?.ok()?,
        parts.next()?.ok()?,
    ];
    if parts.next().is_some() {
        return None;
    }
    Some(coord)
}

/// Output from one block execution: a fresh container per published port.
#[derive(Debug, Clone, Default)]
pub struct BlockOutput {
    pub outputs: HashMap<String, DataContainer>,
}

impl BlockOutput {
    pub fn new() -> Self {
        Self {
            outputs: HashMap::new(),
        }
    }

    pub fn with_output(mut self, port: impl Into<String>, value: impl Into<GeoValue>) -> Self {
        self.outputs
            .insert(port.into(), DataContainer::store(value));
        self
    }

    pub fn with_container(mut self, port: impl Into<String>, container: DataContainer) -> Self {
        self.outputs.insert(port.into(), container);
        self
    }
}
