use async_trait::async_trait;
use morphcore::{
    Block, BlockContext, BlockError, BlockOutput, GeoValue, PortDecl, TypeTag,
};
use morphruntime::{BlockFactory, BlockMetadata};
use std::collections::HashMap;

/// Inspection block: logs a one-line summary of every connected input and
/// forwards it unchanged.
pub struct InspectBlock;

fn describe(value: &GeoValue) -> String {
    match value {
        GeoValue::Mesh(m) => format!(
            "mesh with {} vertices, {} triangles",
            m.vertex_count(),
            m.triangle_count()
        ),
        GeoValue::Coords(c) => format!("{} points", c.len()),
        GeoValue::CoordField(f) => format!("displacement field over {} vertices", f.len()),
        GeoValue::Scalars(s) => format!("{} scalars", s.len()),
        GeoValue::ScalarField(f) => format!("scalar field over {} vertices", f.len()),
        other => format!("{:?}", other),
    }
}

#[async_trait]
impl Block for InspectBlock {
    fn block_type(&self) -> &str {
        "debug.inspect"
    }

    fn input_ports(&self) -> Vec<PortDecl> {
        vec![
            PortDecl::optional("geometry", TypeTag::mesh()),
            PortDecl::optional("points", TypeTag::coords()),
            PortDecl::optional("field", TypeTag::coord_field()),
        ]
    }

    fn output_ports(&self) -> Vec<PortDecl> {
        vec![
            PortDecl::output("geometry", TypeTag::mesh()),
            PortDecl::output("points", TypeTag::coords()),
            PortDecl::output("field", TypeTag::coord_field()),
        ]
    }

    async fn execute(&self, ctx: BlockContext) -> Result<BlockOutput, BlockError> {
        let mut output = BlockOutput::new();
        let mut names: Vec<&String> = ctx.inputs.keys().collect();
        names.sort();
        for name in names {
            let container = &ctx.inputs[name];
            ctx.events
                .info(format!("{}: {}", name, describe(container.value())));
            output = output.with_container(name.clone(), container.clone());
        }
        Ok(output)
    }
}

pub struct InspectBlockFactory;

impl BlockFactory for InspectBlockFactory {
    fn create(&self, _config: &HashMap<String, String>) -> Result<Box<dyn Block>, BlockError> {
        Ok(Box::new(InspectBlock))
    }

    fn block_type(&self) -> &str {
        "debug.inspect"
    }

    fn metadata(&self) -> BlockMetadata {
        BlockMetadata {
            description: "Logs a summary of connected inputs and forwards them".to_string(),
            category: "debug".to_string(),
            inputs: InspectBlock.input_ports(),
            outputs: InspectBlock.output_ports(),
        }
    }
}
