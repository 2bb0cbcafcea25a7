//! Minimal geometry types shared by the engine and the block library.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point or displacement in 3D space.
pub type Coord3 = [f64; 3];

pub fn add(a: Coord3, b: Coord3) -> Coord3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn sub(a: Coord3, b: Coord3) -> Coord3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(a: Coord3, s: f64) -> Coord3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub fn dot(a: Coord3, b: Coord3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn norm(a: Coord3) -> f64 {
    (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt()
}

pub fn dist(a: Coord3, b: Coord3) -> f64 {
    norm(sub(a, b))
}

/// Normalize to unit length; zero vectors are returned unchanged.
pub fn normalized(a: Coord3) -> Coord3 {
    let n = norm(a);
    if n == 0.0 {
        a
    } else {
        scale(a, 1.0 / n)
    }
}

/// A triangulated surface mesh: a vertex array plus triangles indexing it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriMesh {
    pub vertices: Vec<Coord3>,
    pub triangles: Vec<[usize; 3]>,
}

impl TriMesh {
    pub fn new(vertices: Vec<Coord3>, triangles: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Axis-aligned bounding box as (min, max); `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Coord3, Coord3)> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
        }
        Some((min, max))
    }

    /// Returns a copy with the keyed displacements added to the matching
    /// vertices. Keys with no matching vertex are ignored.
    pub fn displaced(&self, displacements: &BTreeMap<u64, Coord3>) -> TriMesh {
        let mut out = self.clone();
        for (&vid, d) in displacements {
            if let Some(v) = out.vertices.get_mut(vid as usize) {
                *v = add(*v, *d);
            }
        }
        out
    }

    /// Appends another mesh, offsetting its triangle indices past the
    /// current vertex array.
    pub fn append(&mut self, other: &TriMesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles.extend(
            other
                .triangles
                .iter()
                .map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]),
        );
    }
}
