//! Standard block library
//!
//! Built-in manipulation blocks: point and mesh sources, rigid translation,
//! lattice morphing, radial-basis-function warping, displacement
//! application, mesh stitching, surface projection and an OBJ sink.

mod apply;
mod config;
mod debug;
mod io;
mod lattice;
mod project;
mod rbf;
mod stitch;
mod translate;

pub use apply::{ApplyBlock, ApplyBlockFactory};
pub use debug::{InspectBlock, InspectBlockFactory};
pub use io::{
    MeshSourceBlock, MeshSourceBlockFactory, ObjWriterBlock, ObjWriterBlockFactory,
    PointSourceBlock, PointSourceBlockFactory,
};
pub use lattice::{FfdLatticeBlock, FfdLatticeBlockFactory};
pub use project::{ProjectBlock, ProjectBlockFactory};
pub use rbf::{RbfKernel, RbfWarpBlock, RbfWarpBlockFactory};
pub use stitch::{StitchBlock, StitchBlockFactory};
pub use translate::{TranslateBlock, TranslateBlockFactory};

use morphcore::ChainError;
use morphruntime::BlockRegistry;
use std::sync::Arc;

/// Register all standard blocks with a registry
pub fn register_all(registry: &mut BlockRegistry) -> Result<(), ChainError> {
    registry.register(Arc::new(apply::ApplyBlockFactory))?;
    registry.register(Arc::new(debug::InspectBlockFactory))?;
    registry.register(Arc::new(io::MeshSourceBlockFactory))?;
    registry.register(Arc::new(io::ObjWriterBlockFactory))?;
    registry.register(Arc::new(io::PointSourceBlockFactory))?;
    registry.register(Arc::new(lattice::FfdLatticeBlockFactory))?;
    registry.register(Arc::new(project::ProjectBlockFactory))?;
    registry.register(Arc::new(rbf::RbfWarpBlockFactory))?;
    registry.register(Arc::new(stitch::StitchBlockFactory))?;
    registry.register(Arc::new(translate::TranslateBlockFactory))?;
    Ok(())
}
