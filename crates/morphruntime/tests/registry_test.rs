use async_trait::async_trait;
use morphcore::{Block, BlockContext, BlockError, BlockOutput, ChainError, PortDecl, TypeTag};
use morphruntime::{BlockFactory, BlockMetadata, BlockRegistry};
use std::collections::HashMap;
use std::sync::Arc;

struct Noop;

#[async_trait]
impl Block for Noop {
    fn block_type(&self) -> &str {
        "test.noop"
    }

    fn input_ports(&self) -> Vec<PortDecl> {
        Vec::new()
    }

    fn output_ports(&self) -> Vec<PortDecl> {
        vec![PortDecl::output("done", TypeTag::int())]
    }

    async fn execute(&self, _ctx: BlockContext) -> Result<BlockOutput, BlockError> {
        Ok(BlockOutput::new().with_output("done", 1i64))
    }
}

struct NoopFactory;

impl BlockFactory for NoopFactory {
    fn create(&self, _config: &HashMap<String, String>) -> Result<Box<dyn Block>, BlockError> {
        Ok(Box::new(Noop))
    }

    fn block_type(&self) -> &str {
        "test.noop"
    }

    fn metadata(&self) -> BlockMetadata {
        BlockMetadata {
            description: "Does nothing".to_string(),
            category: "test".to_string(),
            inputs: Vec::new(),
            outputs: vec![PortDecl::output("done", TypeTag::int())],
        }
    }
}

/// Factory whose constructor demands a "key" entry in the config record.
struct NeedsKeyFactory;

impl BlockFactory for NeedsKeyFactory {
    fn create(&self, config: &HashMap<String, String>) -> Result<Box<dyn Block>, BlockError> {
        if !config.contains_key("key") {
            return Err(BlockError::ConfigParse {
                key: "key".to_string(),
                reason: "missing".to_string(),
            });
        }
        Ok(Box::new(Noop))
    }

    fn block_type(&self) -> &str {
        "test.needs_key"
    }
}

#[test]
fn registering_the_same_factory_twice_is_a_noop() {
    let factory: Arc<dyn BlockFactory> = Arc::new(NoopFactory);
    let mut registry = BlockRegistry::new();

    registry.register(Arc::clone(&factory)).unwrap();
    registry.register(factory).unwrap();

    assert_eq!(registry.list_block_types(), vec!["test.noop"]);
}

#[test]
fn rebinding_a_name_to_a_different_factory_fails() {
    let mut registry = BlockRegistry::new();
    registry.register(Arc::new(NoopFactory)).unwrap();

    let err = registry
        .register(Arc::new(NoopFactory))
        .expect_err("a second instance is a different factory");
    assert!(matches!(
        err,
        ChainError::DuplicateRegistration(ref t) if t == "test.noop"
    ));
}

#[test]
fn unknown_type_is_reported() {
    let registry = BlockRegistry::new();
    let err = registry
        .create_block("test.noop", &HashMap::new())
        .expect_err("nothing registered");
    assert!(matches!(
        err,
        ChainError::UnknownBlockType(ref t) if t == "test.noop"
    ));
}

#[test]
fn construction_failure_names_the_block_type() {
    let mut registry = BlockRegistry::new();
    registry.register(Arc::new(NeedsKeyFactory)).unwrap();

    let err = registry
        .create_block("test.needs_key", &HashMap::new())
        .expect_err("config is missing the key");
    assert!(matches!(
        err,
        ChainError::ConstructionFailed { ref block_type, .. } if block_type == "test.needs_key"
    ));

    let mut config = HashMap::new();
    config.insert("key".to_string(), "value".to_string());
    assert!(registry.create_block("test.needs_key", &config).is_ok());
}

#[test]
fn block_types_are_listed_sorted_with_metadata() {
    let mut registry = BlockRegistry::new();
    registry.register(Arc::new(NeedsKeyFactory)).unwrap();
    registry.register(Arc::new(NoopFactory)).unwrap();

    assert_eq!(
        registry.list_block_types(),
        vec!["test.needs_key", "test.noop"]
    );

    let metadata = registry.get_metadata("test.noop").expect("has metadata");
    assert_eq!(metadata.category, "test");
    assert_eq!(metadata.outputs.len(), 1);
    assert!(registry.get_metadata("test.unknown").is_none());
}
