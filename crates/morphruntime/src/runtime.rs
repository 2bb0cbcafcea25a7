use crate::{registry::BlockRegistry, ChainExecutor, RunReport};
use morphcore::{Chain, ChainError, ChainId, CompatibilityTable, EventBus, MorphError, RunEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Main runtime for executing manipulation chains
pub struct MorphRuntime {
    registry: Arc<BlockRegistry>,
    executor: Arc<ChainExecutor>,
    event_bus: Arc<EventBus>,
    chains: Arc<RwLock<HashMap<ChainId, Chain>>>,
}

impl MorphRuntime {
    /// Create a new runtime with default settings
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a new runtime with custom configuration
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::with_registry(Arc::new(BlockRegistry::new()), config)
    }

    /// Create a new runtime with a pre-populated registry
    pub fn with_registry(registry: Arc<BlockRegistry>, config: RuntimeConfig) -> Self {
        let executor = Arc::new(ChainExecutor::new(Arc::new(config.compatibility)));
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));

        Self {
            registry,
            executor,
            event_bus,
            chains: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Access the block registry
    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    /// Store a chain for execution by id
    pub async fn register_chain(&self, chain: Chain) {
        let mut chains = self.chains.write().await;
        chains.insert(chain.id, chain);
    }

    /// Execute a stored chain by id
    pub async fn execute_chain(&self, chain_id: ChainId) -> Result<RunReport, MorphError> {
        let chains = self.chains.read().await;
        let chain = chains
            .get(&chain_id)
            .ok_or(ChainError::NotFound(chain_id))?;

        Ok(self
            .executor
            .execute(chain, &self.registry, &self.event_bus)
            .await)
    }

    /// Execute a chain directly (without registration)
    pub async fn execute(&self, chain: &Chain) -> RunReport {
        self.executor
            .execute(chain, &self.registry, &self.event_bus)
            .await
    }

    /// Subscribe to run events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<RunEvent> {
        self.event_bus.subscribe()
    }

    /// Direct access to the event bus
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }
}

impl Default for MorphRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the runtime
pub struct RuntimeConfig {
    pub event_buffer_size: usize,
    /// Which (producer, consumer) tag pairs are connectable, and how data
    /// converts across them.
    pub compatibility: CompatibilityTable,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 1000,
            compatibility: CompatibilityTable::standard(),
        }
    }
}
