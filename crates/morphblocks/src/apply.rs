use async_trait::async_trait;
use morphcore::{Block, BlockContext, BlockError, BlockOutput, PortDecl, TypeTag};
use morphruntime::{BlockFactory, BlockMetadata};
use std::collections::HashMap;

/// Applies a per-vertex displacement field to a geometry, producing the
/// deformed mesh.
pub struct ApplyBlock;

#[async_trait]
impl Block for ApplyBlock {
    fn block_type(&self) -> &str {
        "manip.apply"
    }

    fn input_ports(&self) -> Vec<PortDecl> {
        vec![
            PortDecl::mandatory("geometry", TypeTag::mesh()),
            PortDecl::mandatory("displacements", TypeTag::coord_field()),
        ]
    }

    fn output_ports(&self) -> Vec<PortDecl> {
        vec![PortDecl::output("geometry", TypeTag::mesh())]
    }

    async fn execute(&self, ctx: BlockContext) -> Result<BlockOutput, BlockError> {
        let mesh = ctx.require_input("geometry")?.as_mesh()?;
        let field = ctx.require_input("displacements")?.as_coord_field()?;

        let stray = field.keys().filter(|&&vid| vid as usize >= mesh.vertex_count()).count();
        if stray > 0 {
            ctx.events.warn(format!(
                "{} displacement keys have no matching vertex",
                stray
            ));
        }

        let deformed = mesh.displaced(field);
        ctx.events
            .info(format!("applied {} displacements", field.len() - stray));
        Ok(BlockOutput::new().with_output("geometry", deformed))
    }
}

pub struct ApplyBlockFactory;

impl BlockFactory for ApplyBlockFactory {
    fn create(&self, _config: &HashMap<String, String>) -> Result<Box<dyn Block>, BlockError> {
        Ok(Box::new(ApplyBlock))
    }

    fn block_type(&self) -> &str {
        "manip.apply"
    }

    fn metadata(&self) -> BlockMetadata {
        BlockMetadata {
            description: "Applies a displacement field to a geometry".to_string(),
            category: "manipulator".to_string(),
            inputs: ApplyBlock.input_ports(),
            outputs: ApplyBlock.output_ports(),
        }
    }
}
