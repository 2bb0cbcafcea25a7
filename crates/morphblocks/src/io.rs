use crate::config;
use async_trait::async_trait;
use morphcore::{
    parse_coord, Block, BlockContext, BlockError, BlockOutput, Coord3, PortDecl, TriMesh, TypeTag,
};
use morphruntime::{BlockFactory, BlockMetadata};
use std::collections::HashMap;
use std::path::PathBuf;

/// Emits a point set from inline config text or a CSV file.
///
/// Inline points are semicolon- or newline-separated `x y z` triplets; CSV
/// rows may separate components with commas or whitespace. Lines starting
/// with `#` are ignored.
pub struct PointSourceBlock {
    inline: Option<Vec<Coord3>>,
    file: Option<PathBuf>,
}

fn parse_rows(text: &str) -> Result<Vec<Coord3>, BlockError> {
    let mut points = Vec::new();
    for row in text.replace(';', "\n").lines() {
        let row = row.trim().replace(',', " ");
        if row.is_empty() || row.starts_with('#') {
            continue;
        }
        let coord = parse_coord(&row).ok_or_else(|| {
            BlockError::ExecutionFailed(format!("invalid point row: '{}'", row))
        })?;
        points.push(coord);
    }
    Ok(points)
}

#[async_trait]
impl Block for PointSourceBlock {
    fn block_type(&self) -> &str {
        "source.points"
    }

    fn input_ports(&self) -> Vec<PortDecl> {
        vec![]
    }

    fn output_ports(&self) -> Vec<PortDecl> {
        vec![PortDecl::output("points", TypeTag::coords())]
    }

    async fn execute(&self, ctx: BlockContext) -> Result<BlockOutput, BlockError> {
        let points = match (&self.inline, &self.file) {
            (Some(points), _) => points.clone(),
            (None, Some(path)) => {
                let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                    BlockError::ExecutionFailed(format!("cannot read {}: {}", path.display(), e))
                })?;
                parse_rows(&text)?
            }
            (None, None) => Vec::new(),
        };
        ctx.events.info(format!("emitting {} points", points.len()));
        Ok(BlockOutput::new().with_output("points", points))
    }
}

pub struct PointSourceBlockFactory;

impl BlockFactory for PointSourceBlockFactory {
    fn create(&self, config: &HashMap<String, String>) -> Result<Box<dyn Block>, BlockError> {
        let inline = match config.get("points") {
            Some(raw) => Some(parse_rows(raw).map_err(|e| BlockError::ConfigParse {
                key: "points".to_string(),
                reason: e.to_string(),
            })?),
            None => None,
        };
        let file = config.get("file").map(PathBuf::from);
        if inline.is_none() && file.is_none() {
            return Err(BlockError::ConfigParse {
                key: "points".to_string(),
                reason: "need either 'points' or 'file'".to_string(),
            });
        }
        Ok(Box::new(PointSourceBlock { inline, file }))
    }

    fn block_type(&self) -> &str {
        "source.points"
    }

    fn metadata(&self) -> BlockMetadata {
        BlockMetadata {
            description: "Emits a point set from inline text or a CSV file".to_string(),
            category: "source".to_string(),
            inputs: vec![],
            outputs: vec![PortDecl::output("points", TypeTag::coords())],
        }
    }
}

/// Reads a Wavefront OBJ surface into a triangle mesh.
///
/// Only `v` and `f` records are honored; polygonal faces are fanned into
/// triangles.
pub struct MeshSourceBlock {
    file: PathBuf,
}

fn parse_obj(text: &str) -> Result<TriMesh, BlockError> {
    let mut vertices: Vec<Coord3> = Vec::new();
    let mut triangles: Vec<[usize; 3]> = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let rest: Vec<&str> = parts.collect();
                let coord = parse_coord(&rest.join(" ")).ok_or_else(|| {
                    BlockError::ExecutionFailed(format!("invalid vertex at line {}", lineno + 1))
                })?;
                vertices.push(coord);
            }
            Some("f") => {
                let mut corners = Vec::new();
                for token in parts {
                    // "7/1/3" carries texture/normal refs; only the vertex
                    // index matters here. OBJ indices are 1-based.
                    let index: usize = token
                        .split('/')
                        .next()
                        .unwrap_or("")
                        .parse()
                        .ok()
                        .filter(|&i| i >= 1)
                        .ok_or_else(|| {
                            BlockError::ExecutionFailed(format!(
                                "invalid face index '{}' at line {}",
                                token,
                                lineno + 1
                            ))
                        })?;
                    corners.push(index - 1);
                }
                if corners.len() < 3 {
                    return Err(BlockError::ExecutionFailed(format!(
                        "face with fewer than 3 corners at line {}",
                        lineno + 1
                    )));
                }
                for i in 1..corners.len() - 1 {
                    triangles.push([corners[0], corners[i], corners[i + 1]]);
                }
            }
            _ => {}
        }
    }

    for t in &triangles {
        if t.iter().any(|&i| i >= vertices.len()) {
            return Err(BlockError::ExecutionFailed(
                "face index out of range".to_string(),
            ));
        }
    }
    Ok(TriMesh::new(vertices, triangles))
}

#[async_trait]
impl Block for MeshSourceBlock {
    fn block_type(&self) -> &str {
        "source.mesh"
    }

    fn input_ports(&self) -> Vec<PortDecl> {
        vec![]
    }

    fn output_ports(&self) -> Vec<PortDecl> {
        vec![PortDecl::output("geometry", TypeTag::mesh())]
    }

    async fn execute(&self, ctx: BlockContext) -> Result<BlockOutput, BlockError> {
        let text = tokio::fs::read_to_string(&self.file).await.map_err(|e| {
            BlockError::ExecutionFailed(format!("cannot read {}: {}", self.file.display(), e))
        })?;
        let mesh = parse_obj(&text)?;
        ctx.events.info(format!(
            "loaded {} vertices, {} triangles from {}",
            mesh.vertex_count(),
            mesh.triangle_count(),
            self.file.display()
        ));
        Ok(BlockOutput::new().with_output("geometry", mesh))
    }
}

pub struct MeshSourceBlockFactory;

impl BlockFactory for MeshSourceBlockFactory {
    fn create(&self, config: &HashMap<String, String>) -> Result<Box<dyn Block>, BlockError> {
        let file = PathBuf::from(config::require(config, "file")?);
        Ok(Box::new(MeshSourceBlock { file }))
    }

    fn block_type(&self) -> &str {
        "source.mesh"
    }

    fn metadata(&self) -> BlockMetadata {
        BlockMetadata {
            description: "Reads a Wavefront OBJ surface into a triangle mesh".to_string(),
            category: "source".to_string(),
            inputs: vec![],
            outputs: vec![PortDecl::output("geometry", TypeTag::mesh())],
        }
    }
}

/// Writes the incoming mesh to a Wavefront OBJ file.
pub struct ObjWriterBlock {
    file: PathBuf,
}

fn format_obj(mesh: &TriMesh) -> String {
    let mut out = String::new();
    for v in &mesh.vertices {
        out.push_str(&format!("v {} {} {}\n", v[0], v[1], v[2]));
    }
    for t in &mesh.triangles {
        out.push_str(&format!("f {} {} {}\n", t[0] + 1, t[1] + 1, t[2] + 1));
    }
    out
}

#[async_trait]
impl Block for ObjWriterBlock {
    fn block_type(&self) -> &str {
        "sink.obj"
    }

    fn input_ports(&self) -> Vec<PortDecl> {
        vec![PortDecl::mandatory("geometry", TypeTag::mesh())]
    }

    fn output_ports(&self) -> Vec<PortDecl> {
        vec![PortDecl::output("file", TypeTag::text())]
    }

    async fn execute(&self, ctx: BlockContext) -> Result<BlockOutput, BlockError> {
        let mesh = ctx.require_input("geometry")?.as_mesh()?;
        tokio::fs::write(&self.file, format_obj(mesh))
            .await
            .map_err(|e| {
                BlockError::ExecutionFailed(format!("cannot write {}: {}", self.file.display(), e))
            })?;
        ctx.events.info(format!(
            "wrote {} vertices, {} triangles to {}",
            mesh.vertex_count(),
            mesh.triangle_count(),
            self.file.display()
        ));
        Ok(BlockOutput::new().with_output("file", self.file.display().to_string()))
    }
}

pub struct ObjWriterBlockFactory;

impl BlockFactory for ObjWriterBlockFactory {
    fn create(&self, config: &HashMap<String, String>) -> Result<Box<dyn Block>, BlockError> {
        let file = PathBuf::from(config::require(config, "file")?);
        Ok(Box::new(ObjWriterBlock { file }))
    }

    fn block_type(&self) -> &str {
        "sink.obj"
    }

    fn metadata(&self) -> BlockMetadata {
        BlockMetadata {
            description: "Writes the incoming mesh to a Wavefront OBJ file".to_string(),
            category: "sink".to_string(),
            inputs: vec![PortDecl::mandatory("geometry", TypeTag::mesh())],
            outputs: vec![PortDecl::output("file", TypeTag::text())],
        }
    }
}
