use serde::{Deserialize, Serialize};
use std::fmt;

/// Base type carried on a port, independent of container shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    Coord,
    Scalar,
    Int,
    Text,
    Mesh,
}

/// Container shape of a port payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arity {
    /// One value.
    Single,
    /// An ordered sequence of values.
    Sequence,
    /// Values keyed by vertex id.
    Keyed,
}

/// Runtime descriptor of a port's data type.
///
/// Two tags are equal iff both the kind and the arity match exactly; tag
/// equality is the connection-compatibility key used when linking ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeTag {
    pub kind: DataKind,
    pub arity: Arity,
}

impl TypeTag {
    pub const fn new(kind: DataKind, arity: Arity) -> Self {
        Self { kind, arity }
    }

    pub const fn real() -> Self {
        Self::new(DataKind::Scalar, Arity::Single)
    }

    pub const fn int() -> Self {
        Self::new(DataKind::Int, Arity::Single)
    }

    pub const fn text() -> Self {
        Self::new(DataKind::Text, Arity::Single)
    }

    pub const fn point() -> Self {
        Self::new(DataKind::Coord, Arity::Single)
    }

    pub const fn coords() -> Self {
        Self::new(DataKind::Coord, Arity::Sequence)
    }

    pub const fn coord_field() -> Self {
        Self::new(DataKind::Coord, Arity::Keyed)
    }

    pub const fn scalars() -> Self {
        Self::new(DataKind::Scalar, Arity::Sequence)
    }

    pub const fn scalar_field() -> Self {
        Self::new(DataKind::Scalar, Arity::Keyed)
    }

    pub const fn mesh() -> Self {
        Self::new(DataKind::Mesh, Arity::Single)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DataKind::Coord => "coord",
            DataKind::Scalar => "scalar",
            DataKind::Int => "int",
            DataKind::Text => "text",
            DataKind::Mesh => "mesh",
        };
        match self.arity {
            Arity::Single => write!(f, "{}", kind),
            Arity::Sequence => write!(f, "{}[]", kind),
            Arity::Keyed => write!(f, "{}{{}}", kind),
        }
    }
}
