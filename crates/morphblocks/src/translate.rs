use crate::config;
use async_trait::async_trait;
use morphcore::{
    geometry, Block, BlockContext, BlockError, BlockOutput, Coord3, PortDecl, TypeTag,
};
use morphruntime::{BlockFactory, BlockMetadata};
use std::collections::{BTreeMap, HashMap};

/// Rigid translation: emits the same displacement for every vertex of the
/// incoming geometry.
///
/// Config: `direction` ("x y z", required) and `magnitude` (defaults to the
/// direction's length).
pub struct TranslateBlock {
    direction: Coord3,
    magnitude: f64,
}

#[async_trait]
impl Block for TranslateBlock {
    fn block_type(&self) -> &str {
        "manip.translate"
    }

    fn input_ports(&self) -> Vec<PortDecl> {
        vec![PortDecl::mandatory("geometry", TypeTag::mesh())]
    }

    fn output_ports(&self) -> Vec<PortDecl> {
        vec![PortDecl::output("displacements", TypeTag::coord_field())]
    }

    async fn execute(&self, ctx: BlockContext) -> Result<BlockOutput, BlockError> {
        let mesh = ctx.require_input("geometry")?.as_mesh()?;
        let step = geometry::scale(geometry::normalized(self.direction), self.magnitude);

        let field: BTreeMap<u64, Coord3> = (0..mesh.vertex_count() as u64)
            .map(|vid| (vid, step))
            .collect();

        ctx.events.info(format!(
            "translating {} vertices by [{}, {}, {}]",
            field.len(),
            step[0],
            step[1],
            step[2]
        ));
        Ok(BlockOutput::new().with_output("displacements", field))
    }
}

pub struct TranslateBlockFactory;

impl BlockFactory for TranslateBlockFactory {
    fn create(&self, config: &HashMap<String, String>) -> Result<Box<dyn Block>, BlockError> {
        let direction = config::require_coord(config, "direction")?;
        let magnitude = config::f64_or(config, "magnitude", geometry::norm(direction))?;
        Ok(Box::new(TranslateBlock {
            direction,
            magnitude,
        }))
    }

    fn block_type(&self) -> &str {
        "manip.translate"
    }

    fn metadata(&self) -> BlockMetadata {
        BlockMetadata {
            description: "Emits a rigid per-vertex translation field".to_string(),
            category: "manipulator".to_string(),
            inputs: vec![PortDecl::mandatory("geometry", TypeTag::mesh())],
            outputs: vec![PortDecl::output("displacements", TypeTag::coord_field())],
        }
    }
}
