use async_trait::async_trait;
use morphcore::{
    geometry, Block, BlockContext, BlockError, BlockOutput, Coord3, PortDecl, TriMesh, TypeTag,
};
use morphruntime::{BlockFactory, BlockMetadata};
use std::collections::HashMap;

/// Projects a geometry onto a target surface: every vertex moves to its
/// closest point on the target's triangles, connectivity is kept.
pub struct ProjectBlock;

/// Closest point to `p` on triangle `abc`, via barycentric region tests.
fn closest_on_triangle(p: Coord3, a: Coord3, b: Coord3, c: Coord3) -> Coord3 {
    let ab = geometry::sub(b, a);
    let ac = geometry::sub(c, a);
    let ap = geometry::sub(p, a);

    let d1 = geometry::dot(ab, ap);
    let d2 = geometry::dot(ac, ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = geometry::sub(p, b);
    let d3 = geometry::dot(ab, bp);
    let d4 = geometry::dot(ac, bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return geometry::add(a, geometry::scale(ab, v));
    }

    let cp = geometry::sub(p, c);
    let d5 = geometry::dot(ab, cp);
    let d6 = geometry::dot(ac, cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return geometry::add(a, geometry::scale(ac, w));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return geometry::add(b, geometry::scale(geometry::sub(c, b), w));
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    geometry::add(a, geometry::add(geometry::scale(ab, v), geometry::scale(ac, w)))
}

fn closest_on_surface(p: Coord3, surface: &TriMesh) -> Coord3 {
    let mut best = p;
    let mut best_dist = f64::INFINITY;
    for t in &surface.triangles {
        let q = closest_on_triangle(
            p,
            surface.vertices[t[0]],
            surface.vertices[t[1]],
            surface.vertices[t[2]],
        );
        let d = geometry::dist(p, q);
        if d < best_dist {
            best_dist = d;
            best = q;
        }
    }
    best
}

#[async_trait]
impl Block for ProjectBlock {
    fn block_type(&self) -> &str {
        "geo.project"
    }

    fn input_ports(&self) -> Vec<PortDecl> {
        vec![
            PortDecl::mandatory("geometry", TypeTag::mesh()),
            PortDecl::mandatory("target", TypeTag::mesh()),
        ]
    }

    fn output_ports(&self) -> Vec<PortDecl> {
        vec![PortDecl::output("geometry", TypeTag::mesh())]
    }

    async fn execute(&self, ctx: BlockContext) -> Result<BlockOutput, BlockError> {
        let mesh = ctx.require_input("geometry")?.as_mesh()?;
        let target = ctx.require_input("target")?.as_mesh()?;

        if target.triangle_count() == 0 {
            return Err(BlockError::ExecutionFailed(
                "target surface has no triangles".to_string(),
            ));
        }

        let mut projected = mesh.clone();
        for v in &mut projected.vertices {
            *v = closest_on_surface(*v, target);
        }

        ctx.events.info(format!(
            "projected {} vertices onto {} target triangles",
            projected.vertex_count(),
            target.triangle_count()
        ));
        Ok(BlockOutput::new().with_output("geometry", projected))
    }
}

pub struct ProjectBlockFactory;

impl BlockFactory for ProjectBlockFactory {
    fn create(&self, _config: &HashMap<String, String>) -> Result<Box<dyn Block>, BlockError> {
        Ok(Box::new(ProjectBlock))
    }

    fn block_type(&self) -> &str {
        "geo.project"
    }

    fn metadata(&self) -> BlockMetadata {
        BlockMetadata {
            description: "Moves every vertex to its closest point on a target surface"
                .to_string(),
            category: "geohandler".to_string(),
            inputs: ProjectBlock.input_ports(),
            outputs: ProjectBlock.output_ports(),
        }
    }
}
