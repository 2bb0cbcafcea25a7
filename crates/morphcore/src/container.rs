use crate::error::TypeMismatch;
use crate::geometry::{Coord3, TriMesh};
use crate::tag::TypeTag;
use crate::value::GeoValue;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Type-erased holder for one published value.
///
/// A container is immutable once stored: republishing a port replaces the
/// container rather than mutating it, so a reader still holding the old
/// reference from a prior step observes a consistent value. Clones share
/// the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DataContainer {
    tag: TypeTag,
    value: Arc<GeoValue>,
}

impl DataContainer {
    /// Stores a value; the tag is derived from the variant.
    pub fn store(value: impl Into<GeoValue>) -> Self {
        let value = value.into();
        Self {
            tag: value.tag(),
            value: Arc::new(value),
        }
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn value(&self) -> &GeoValue {
        &self.value
    }

    fn mismatch(&self, expected: TypeTag) -> TypeMismatch {
        TypeMismatch {
            expected,
            actual: self.tag,
        }
    }

    pub fn as_real(&self) -> Result<f64, TypeMismatch> {
        self.value
            .as_real()
            .ok_or_else(|| self.mismatch(TypeTag::real()))
    }

    pub fn as_int(&self) -> Result<i64, TypeMismatch> {
        self.value
            .as_int()
            .ok_or_else(|| self.mismatch(TypeTag::int()))
    }

    pub fn as_text(&self) -> Result<&str, TypeMismatch> {
        self.value
            .as_text()
            .ok_or_else(|| self.mismatch(TypeTag::text()))
    }

    pub fn as_point(&self) -> Result<Coord3, TypeMismatch> {
        self.value
            .as_point()
            .ok_or_else(|| self.mismatch(TypeTag::point()))
    }

    pub fn as_coords(&self) -> Result<&[Coord3], TypeMismatch> {
        self.value
            .as_coords()
            .ok_or_else(|| self.mismatch(TypeTag::coords()))
    }

    pub fn as_coord_field(&self) -> Result<&BTreeMap<u64, Coord3>, TypeMismatch> {
        self.value
            .as_coord_field()
            .ok_or_else(|| self.mismatch(TypeTag::coord_field()))
    }

    pub fn as_scalars(&self) -> Result<&[f64], TypeMismatch> {
        self.value
            .as_scalars()
            .ok_or_else(|| self.mismatch(TypeTag::scalars()))
    }

    pub fn as_scalar_field(&self) -> Result<&BTreeMap<u64, f64>, TypeMismatch> {
        self.value
            .as_scalar_field()
            .ok_or_else(|| self.mismatch(TypeTag::scalar_field()))
    }

    pub fn as_mesh(&self) -> Result<&TriMesh, TypeMismatch> {
        self.value
            .as_mesh()
            .ok_or_else(|| self.mismatch(TypeTag::mesh()))
    }
}
