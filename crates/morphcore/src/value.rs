use crate::geometry::{Coord3, TriMesh};
use crate::tag::TypeTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tagged union of every payload that can travel across a port link.
///
/// Each variant maps to exactly one [`TypeTag`]; keyed variants are fields
/// over vertex ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value")]
pub enum GeoValue {
    Real(f64),
    Int(i64),
    Text(String),
    Point(Coord3),
    Coords(Vec<Coord3>),
    CoordField(BTreeMap<u64, Coord3>),
    Scalars(Vec<f64>),
    ScalarField(BTreeMap<u64, f64>),
    Mesh(TriMesh),
}

impl GeoValue {
    pub fn tag(&self) -> TypeTag {
        match self {
            GeoValue::Real(_) => TypeTag::real(),
            GeoValue::Int(_) => TypeTag::int(),
            GeoValue::Text(_) => TypeTag::text(),
            GeoValue::Point(_) => TypeTag::point(),
            GeoValue::Coords(_) => TypeTag::coords(),
            GeoValue::CoordField(_) => TypeTag::coord_field(),
            GeoValue::Scalars(_) => TypeTag::scalars(),
            GeoValue::ScalarField(_) => TypeTag::scalar_field(),
            GeoValue::Mesh(_) => TypeTag::mesh(),
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            GeoValue::Real(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            GeoValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            GeoValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Coord3> {
        match self {
            GeoValue::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_coords(&self) -> Option<&[Coord3]> {
        match self {
            GeoValue::Coords(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_coord_field(&self) -> Option<&BTreeMap<u64, Coord3>> {
        match self {
            GeoValue::CoordField(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_scalars(&self) -> Option<&[f64]> {
        match self {
            GeoValue::Scalars(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_scalar_field(&self) -> Option<&BTreeMap<u64, f64>> {
        match self {
            GeoValue::ScalarField(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_mesh(&self) -> Option<&TriMesh> {
        match self {
            GeoValue::Mesh(m) => Some(m),
            _ => None,
        }
    }
}

impl From<f64> for GeoValue {
    fn from(n: f64) -> Self {
        GeoValue::Real(n)
    }
}

impl From<i64> for GeoValue {
    fn from(n: i64) -> Self {
        GeoValue::Int(n)
    }
}

impl From<String> for GeoValue {
    fn from(s: String) -> Self {
        GeoValue::Text(s)
    }
}

impl From<&str> for GeoValue {
    fn from(s: &str) -> Self {
        GeoValue::Text(s.to_string())
    }
}

impl From<Coord3> for GeoValue {
    fn from(p: Coord3) -> Self {
        GeoValue::Point(p)
    }
}

impl From<Vec<Coord3>> for GeoValue {
    fn from(c: Vec<Coord3>) -> Self {
        GeoValue::Coords(c)
    }
}

impl From<BTreeMap<u64, Coord3>> for GeoValue {
    fn from(f: BTreeMap<u64, Coord3>) -> Self {
        GeoValue::CoordField(f)
    }
}

impl From<Vec<f64>> for GeoValue {
    fn from(s: Vec<f64>) -> Self {
        GeoValue::Scalars(s)
    }
}

impl From<BTreeMap<u64, f64>> for GeoValue {
    fn from(f: BTreeMap<u64, f64>) -> Self {
        GeoValue::ScalarField(f)
    }
}

impl From<TriMesh> for GeoValue {
    fn from(m: TriMesh) -> Self {
        GeoValue::Mesh(m)
    }
}
