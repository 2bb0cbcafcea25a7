use morphcore::{Block, BlockError, ChainError, PortDecl};
use std::collections::HashMap;
use std::sync::Arc;

/// Factory trait for creating block instances
pub trait BlockFactory: Send + Sync {
    /// Create a new instance of the block from its configuration record
    fn create(&self, config: &HashMap<String, String>) -> Result<Box<dyn Block>, BlockError>;

    /// Block type identifier (e.g. "manip.translate")
    fn block_type(&self) -> &str;

    /// Optional: metadata about the block type (description, port schema)
    fn metadata(&self) -> BlockMetadata {
        BlockMetadata::default()
    }
}

/// Metadata about a block type
#[derive(Debug, Clone)]
pub struct BlockMetadata {
    pub description: String,
    pub category: String,
    pub inputs: Vec<PortDecl>,
    pub outputs: Vec<PortDecl>,
}

impl Default for BlockMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            category: "general".to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

/// Registry of available block types.
///
/// Populated once at startup, before the first chain is assembled; read-only
/// afterwards. A type name may not be rebound to a different factory.
pub struct BlockRegistry {
    factories: HashMap<String, Arc<dyn BlockFactory>>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a block factory.
    ///
    /// Registering the identical factory for its own name again is a no-op;
    /// binding a name already taken by a different factory fails with
    /// [`ChainError::DuplicateRegistration`].
    pub fn register(&mut self, factory: Arc<dyn BlockFactory>) -> Result<(), ChainError> {
        let block_type = factory.block_type().to_string();
        if let Some(existing) = self.factories.get(&block_type) {
            if Arc::ptr_eq(existing, &factory) {
                return Ok(());
            }
            return Err(ChainError::DuplicateRegistration(block_type));
        }
        tracing::info!("Registering block type: {}", block_type);
        self.factories.insert(block_type, factory);
        Ok(())
    }

    /// Create a block instance from a type name and config record
    pub fn create_block(
        &self,
        block_type: &str,
        config: &HashMap<String, String>,
    ) -> Result<Box<dyn Block>, ChainError> {
        let factory = self
            .factories
            .get(block_type)
            .ok_or_else(|| ChainError::UnknownBlockType(block_type.to_string()))?;

        factory
            .create(config)
            .map_err(|e| ChainError::ConstructionFailed {
                block_type: block_type.to_string(),
                source: e,
            })
    }

    /// All registered block type names, sorted
    pub fn list_block_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn get_metadata(&self, block_type: &str) -> Option<BlockMetadata> {
        self.factories.get(block_type).map(|f| f.metadata())
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
