use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub type ChainId = Uuid;
pub type BlockId = Uuid;

/// Serializable description of a manipulation pipeline: an ordered list of
/// block descriptors plus the links between their ports.
///
/// The order of `blocks` is the insertion order and is the tie-breaker for
/// execution ordering, so a given construction sequence always replays the
/// same way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    pub id: ChainId,
    pub name: String,
    pub description: Option<String>,
    pub blocks: Vec<BlockSpec>,
    pub links: Vec<Link>,
}

impl Chain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            blocks: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn add_block(&mut self, block: BlockSpec) -> BlockId {
        let id = block.id;
        self.blocks.push(block);
        id
    }

    /// Links an output port to an input port.
    ///
    /// Fails with [`ChainError::AlreadyConnected`] if the input port already
    /// has a link; replacing a link must go through [`Chain::reconnect`] so
    /// data-flow never changes silently. Type compatibility is checked when
    /// the chain is assembled against a registry, since port tags belong to
    /// the block implementations.
    pub fn connect(
        &mut self,
        from_block: BlockId,
        from_port: impl Into<String>,
        to_block: BlockId,
        to_port: impl Into<String>,
    ) -> Result<(), ChainError> {
        let (from_port, to_port) = (from_port.into(), to_port.into());
        for id in [from_block, to_block] {
            if self.find_block(id).is_none() {
                return Err(ChainError::BlockNotFound(id));
            }
        }
        if self.link_into(to_block, &to_port).is_some() {
            return Err(ChainError::AlreadyConnected {
                block: to_block,
                port: to_port,
            });
        }
        self.links.push(Link {
            from_block,
            from_port,
            to_block,
            to_port,
        });
        Ok(())
    }

    /// Explicitly replaces whatever link currently feeds the input port.
    ///
    /// The existing link survives a failed reconnect: both endpoints are
    /// checked before anything is removed.
    pub fn reconnect(
        &mut self,
        from_block: BlockId,
        from_port: impl Into<String>,
        to_block: BlockId,
        to_port: impl Into<String>,
    ) -> Result<(), ChainError> {
        let to_port = to_port.into();
        for id in [from_block, to_block] {
            if self.find_block(id).is_none() {
                return Err(ChainError::BlockNotFound(id));
            }
        }
        self.disconnect(to_block, &to_port);
        self.connect(from_block, from_port, to_block, to_port)
    }

    /// Removes the link into an input port; a no-op when unlinked.
    pub fn disconnect(&mut self, to_block: BlockId, to_port: &str) {
        self.links
            .retain(|l| !(l.to_block == to_block && l.to_port == to_port));
    }

    pub fn find_block(&self, id: BlockId) -> Option<&BlockSpec> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// The link feeding an input port, if any. An input port holds at most
    /// one link.
    pub fn link_into(&self, to_block: BlockId, to_port: &str) -> Option<&Link> {
        self.links
            .iter()
            .find(|l| l.to_block == to_block && l.to_port == to_port)
    }

    pub fn links_into_block(&self, id: BlockId) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.to_block == id)
    }

    pub fn links_from_block(&self, id: BlockId) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.from_block == id)
    }
}

/// Block descriptor in a chain: a type name resolved through the registry
/// plus a text-valued configuration record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSpec {
    pub id: BlockId,
    pub block_type: String,
    pub name: Option<String>,
    pub config: HashMap<String, String>,
}

impl BlockSpec {
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            block_type: block_type.into(),
            name: None,
            config: HashMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Human-readable label for logs: the given name, else the type name.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.block_type)
    }
}

/// A typed connection from one output port to one input port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from_block: BlockId,
    pub from_port: String,
    pub to_block: BlockId,
    pub to_port: String,
}
