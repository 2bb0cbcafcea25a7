use crate::config;
use async_trait::async_trait;
use morphcore::{
    geometry, Block, BlockContext, BlockError, BlockOutput, Coord3, PortDecl, TypeTag,
};
use morphruntime::{BlockFactory, BlockMetadata};
use std::collections::{BTreeMap, HashMap};

/// Radial basis function used to spread control-point displacements over
/// the geometry. The kernel is a swappable strategy selected by config, not
/// part of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RbfKernel {
    /// Wendland C2, compactly supported on the unit ball.
    WendlandC2,
    Gaussian,
    Multiquadric,
}

impl RbfKernel {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "wendland_c2" => Some(RbfKernel::WendlandC2),
            "gaussian" => Some(RbfKernel::Gaussian),
            "multiquadric" => Some(RbfKernel::Multiquadric),
            _ => None,
        }
    }

    /// Evaluate at a distance already scaled by the support radius.
    pub fn eval(&self, r: f64) -> f64 {
        match self {
            RbfKernel::WendlandC2 => {
                if r >= 1.0 {
                    0.0
                } else {
                    let t = 1.0 - r;
                    t * t * t * t * (4.0 * r + 1.0)
                }
            }
            RbfKernel::Gaussian => (-r * r).exp(),
            RbfKernel::Multiquadric => (1.0 + r * r).sqrt(),
        }
    }
}

/// RBF warp: interpolates control-point displacements onto every vertex of
/// the incoming geometry.
///
/// Weights come from a dense solve of the kernel collocation system, one
/// right-hand side per displacement component.
pub struct RbfWarpBlock {
    kernel: RbfKernel,
    radius: f64,
}

/// Gaussian elimination with partial pivoting, three right-hand sides.
/// Returns `None` for a singular system.
fn solve_dense(mut a: Vec<Vec<f64>>, mut b: Vec<Coord3>) -> Option<Vec<Coord3>> {
    let n = a.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            for c in 0..3 {
                b[row][c] -= factor * b[col][c];
            }
        }
    }

    let mut x = vec![[0.0; 3]; n];
    for row in (0..n).rev() {
        let mut acc = b[row];
        for k in row + 1..n {
            for c in 0..3 {
                acc[c] -= a[row][k] * x[k][c];
            }
        }
        for c in 0..3 {
            x[row][c] = acc[c] / a[row][row];
        }
    }
    Some(x)
}

#[async_trait]
impl Block for RbfWarpBlock {
    fn block_type(&self) -> &str {
        "manip.rbf"
    }

    fn input_ports(&self) -> Vec<PortDecl> {
        vec![
            PortDecl::mandatory("geometry", TypeTag::mesh()),
            PortDecl::mandatory("nodes", TypeTag::coords()),
            PortDecl::mandatory("displacements", TypeTag::coords()),
        ]
    }

    fn output_ports(&self) -> Vec<PortDecl> {
        vec![PortDecl::output("displacements", TypeTag::coord_field())]
    }

    async fn execute(&self, ctx: BlockContext) -> Result<BlockOutput, BlockError> {
        let mesh = ctx.require_input("geometry")?.as_mesh()?;
        let nodes = ctx.require_input("nodes")?.as_coords()?;
        let controls = ctx.require_input("displacements")?.as_coords()?;

        if nodes.is_empty() {
            return Err(BlockError::ExecutionFailed(
                "no RBF control nodes".to_string(),
            ));
        }
        if nodes.len() != controls.len() {
            return Err(BlockError::ExecutionFailed(format!(
                "{} control nodes but {} displacements",
                nodes.len(),
                controls.len()
            )));
        }

        let n = nodes.len();
        let a: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| self.kernel.eval(geometry::dist(nodes[i], nodes[j]) / self.radius))
                    .collect()
            })
            .collect();

        let weights = solve_dense(a, controls.to_vec()).ok_or_else(|| {
            BlockError::ExecutionFailed("singular RBF collocation system".to_string())
        })?;
        ctx.events
            .info(format!("solved {n}x{n} collocation system"));

        let field: BTreeMap<u64, Coord3> = mesh
            .vertices
            .iter()
            .enumerate()
            .map(|(vid, v)| {
                let mut d = [0.0; 3];
                for (w, node) in weights.iter().zip(nodes) {
                    let phi = self.kernel.eval(geometry::dist(*v, *node) / self.radius);
                    for c in 0..3 {
                        d[c] += w[c] * phi;
                    }
                }
                (vid as u64, d)
            })
            .collect();

        Ok(BlockOutput::new().with_output("displacements", field))
    }
}

pub struct RbfWarpBlockFactory;

impl BlockFactory for RbfWarpBlockFactory {
    fn create(&self, config: &HashMap<String, String>) -> Result<Box<dyn Block>, BlockError> {
        let kernel_name = config
            .get("kernel")
            .map(String::as_str)
            .unwrap_or("wendland_c2");
        let kernel = RbfKernel::parse(kernel_name).ok_or_else(|| BlockError::ConfigParse {
            key: "kernel".to_string(),
            reason: format!("unknown kernel '{}'", kernel_name),
        })?;
        let radius = config::f64_or(config, "radius", 1.0)?;
        if radius <= 0.0 {
            return Err(BlockError::ConfigParse {
                key: "radius".to_string(),
                reason: "support radius must be positive".to_string(),
            });
        }
        Ok(Box::new(RbfWarpBlock { kernel, radius }))
    }

    fn block_type(&self) -> &str {
        "manip.rbf"
    }

    fn metadata(&self) -> BlockMetadata {
        BlockMetadata {
            description: "Interpolates control displacements over a geometry with radial basis functions"
                .to_string(),
            category: "manipulator".to_string(),
            inputs: vec![
                PortDecl::mandatory("geometry", TypeTag::mesh()),
                PortDecl::mandatory("nodes", TypeTag::coords()),
                PortDecl::mandatory("displacements", TypeTag::coords()),
            ],
            outputs: vec![PortDecl::output("displacements", TypeTag::coord_field())],
        }
    }
}
