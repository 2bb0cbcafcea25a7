use async_trait::async_trait;
use morphcore::{
    parse_coord, Block, BlockContext, BlockError, BlockOutput, Coord3, PortDecl, TypeTag,
};
use morphruntime::{BlockFactory, BlockMetadata};
use std::collections::{BTreeMap, HashMap};

/// Free-form lattice deformation: a structured box of control nodes is laid
/// over the geometry, and displacing the nodes morphs every vertex the box
/// contains.
///
/// The per-vertex displacement is the tensor-product Bernstein blend of the
/// nodal displacements at the vertex's normalized lattice coordinates.
/// Vertices outside the box are untouched. The box defaults to the
/// geometry's bounding box; `origin` and `span` config override it.
pub struct FfdLatticeBlock {
    origin: Option<Coord3>,
    span: Option<Coord3>,
    dims: [usize; 3],
}

fn binomial(n: usize, k: usize) -> f64 {
    let mut acc = 1.0;
    for i in 0..k.min(n - k) {
        acc = acc * (n - i) as f64 / (i + 1) as f64;
    }
    acc
}

fn bernstein(degree: usize, i: usize, t: f64) -> f64 {
    binomial(degree, i) * t.powi(i as i32) * (1.0 - t).powi((degree - i) as i32)
}

fn parse_dims(raw: &str) -> Option<[usize; 3]> {
    let mut parts = raw.split_whitespace().map(str::parse::<usize>);
    let dims = [parts.next()?.ok()?, parts.next()?.ok()?, parts.next()?.ok()?];
    if parts.next().is_some() {
        return None;
    }
    Some(dims)
}

impl FfdLatticeBlock {
    /// Blend the nodal displacements at normalized coordinates `u`.
    /// Node ordering is x-fastest: index = (k * ny + j) * nx + i.
    fn blend(&self, u: Coord3, controls: &[Coord3]) -> Coord3 {
        let [nx, ny, nz] = self.dims;
        let mut d = [0.0; 3];
        for k in 0..nz {
            let bz = bernstein(nz - 1, k, u[2]);
            for j in 0..ny {
                let byz = bernstein(ny - 1, j, u[1]) * bz;
                for i in 0..nx {
                    let w = bernstein(nx - 1, i, u[0]) * byz;
                    let node = controls[(k * ny + j) * nx + i];
                    for c in 0..3 {
                        d[c] += w * node[c];
                    }
                }
            }
        }
        d
    }
}

#[async_trait]
impl Block for FfdLatticeBlock {
    fn block_type(&self) -> &str {
        "manip.ffd"
    }

    fn input_ports(&self) -> Vec<PortDecl> {
        vec![
            PortDecl::mandatory("geometry", TypeTag::mesh()),
            PortDecl::mandatory("displacements", TypeTag::coords()),
        ]
    }

    fn output_ports(&self) -> Vec<PortDecl> {
        vec![PortDecl::output("displacements", TypeTag::coord_field())]
    }

    async fn execute(&self, ctx: BlockContext) -> Result<BlockOutput, BlockError> {
        let mesh = ctx.require_input("geometry")?.as_mesh()?;
        let controls = ctx.require_input("displacements")?.as_coords()?;

        let [nx, ny, nz] = self.dims;
        let expected = nx * ny * nz;
        if controls.len() != expected {
            return Err(BlockError::ExecutionFailed(format!(
                "{}x{}x{} lattice needs {} node displacements, got {}",
                nx,
                ny,
                nz,
                expected,
                controls.len()
            )));
        }

        let (origin, span) = match (self.origin, self.span) {
            (Some(origin), Some(span)) => (origin, span),
            _ => {
                let (min, max) = mesh.bounds().ok_or_else(|| {
                    BlockError::ExecutionFailed("empty geometry, no lattice box".to_string())
                })?;
                (
                    self.origin.unwrap_or(min),
                    self.span.unwrap_or(morphcore::geometry::sub(max, min)),
                )
            }
        };

        let mut inside = 0usize;
        let field: BTreeMap<u64, Coord3> = mesh
            .vertices
            .iter()
            .enumerate()
            .map(|(vid, v)| {
                let mut u = [0.0; 3];
                let mut contained = true;
                for c in 0..3 {
                    // A flat axis pins the coordinate to the lattice face.
                    u[c] = if span[c] == 0.0 {
                        0.0
                    } else {
                        (v[c] - origin[c]) / span[c]
                    };
                    if !(0.0..=1.0).contains(&u[c]) {
                        contained = false;
                    }
                }
                let d = if contained {
                    inside += 1;
                    self.blend(u, controls)
                } else {
                    [0.0; 3]
                };
                (vid as u64, d)
            })
            .collect();

        ctx.events.info(format!(
            "morphed {} of {} vertices inside the lattice",
            inside,
            mesh.vertex_count()
        ));
        Ok(BlockOutput::new().with_output("displacements", field))
    }
}

pub struct FfdLatticeBlockFactory;

impl BlockFactory for FfdLatticeBlockFactory {
    fn create(&self, config: &HashMap<String, String>) -> Result<Box<dyn Block>, BlockError> {
        let dims_raw = config.get("dims").map(String::as_str).unwrap_or("2 2 2");
        let dims = parse_dims(dims_raw).ok_or_else(|| BlockError::ConfigParse {
            key: "dims".to_string(),
            reason: "expected three node counts 'nx ny nz'".to_string(),
        })?;
        if dims.iter().any(|&n| n < 2) {
            return Err(BlockError::ConfigParse {
                key: "dims".to_string(),
                reason: "each axis needs at least 2 nodes".to_string(),
            });
        }

        let coord_key = |key: &str| -> Result<Option<Coord3>, BlockError> {
            match config.get(key) {
                None => Ok(None),
                Some(raw) => parse_coord(raw).map(Some).ok_or_else(|| {
                    BlockError::ConfigParse {
                        key: key.to_string(),
                        reason: "expected three numbers 'x y z'".to_string(),
                    }
                }),
            }
        };
        Ok(Box::new(FfdLatticeBlock {
            origin: coord_key("origin")?,
            span: coord_key("span")?,
            dims,
        }))
    }

    fn block_type(&self) -> &str {
        "manip.ffd"
    }

    fn metadata(&self) -> BlockMetadata {
        BlockMetadata {
            description: "Morphs a geometry through a lattice of displaced control nodes"
                .to_string(),
            category: "manipulator".to_string(),
            inputs: vec![
                PortDecl::mandatory("geometry", TypeTag::mesh()),
                PortDecl::mandatory("displacements", TypeTag::coords()),
            ],
            outputs: vec![PortDecl::output("displacements", TypeTag::coord_field())],
        }
    }
}
