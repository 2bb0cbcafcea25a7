use async_trait::async_trait;
use morphcore::{Block, BlockContext, BlockError, BlockOutput, PortDecl, TypeTag};
use morphruntime::{BlockFactory, BlockMetadata};
use std::collections::HashMap;

/// Stitches a second geometry onto the first, offsetting its connectivity
/// past the first mesh's vertex array. The second input may stay unlinked,
/// in which case the first geometry passes through unchanged.
pub struct StitchBlock;

#[async_trait]
impl Block for StitchBlock {
    fn block_type(&self) -> &str {
        "geo.stitch"
    }

    fn input_ports(&self) -> Vec<PortDecl> {
        vec![
            PortDecl::mandatory("geometry", TypeTag::mesh()),
            PortDecl::optional("geometry2", TypeTag::mesh()),
        ]
    }

    fn output_ports(&self) -> Vec<PortDecl> {
        vec![PortDecl::output("geometry", TypeTag::mesh())]
    }

    async fn execute(&self, ctx: BlockContext) -> Result<BlockOutput, BlockError> {
        let mut stitched = ctx.require_input("geometry")?.as_mesh()?.clone();

        if let Some(container) = ctx.input("geometry2") {
            let other = container.as_mesh()?;
            stitched.append(other);
            ctx.events.info(format!(
                "stitched {} extra vertices, total {}",
                other.vertex_count(),
                stitched.vertex_count()
            ));
        }

        Ok(BlockOutput::new().with_output("geometry", stitched))
    }
}

pub struct StitchBlockFactory;

impl BlockFactory for StitchBlockFactory {
    fn create(&self, _config: &HashMap<String, String>) -> Result<Box<dyn Block>, BlockError> {
        Ok(Box::new(StitchBlock))
    }

    fn block_type(&self) -> &str {
        "geo.stitch"
    }

    fn metadata(&self) -> BlockMetadata {
        BlockMetadata {
            description: "Merges two geometries into one mesh".to_string(),
            category: "geohandler".to_string(),
            inputs: StitchBlock.input_ports(),
            outputs: StitchBlock.output_ports(),
        }
    }
}
