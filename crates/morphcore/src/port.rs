use crate::tag::TypeTag;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    In,
    Out,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::In => write!(f, "input"),
            PortDirection::Out => write!(f, "output"),
        }
    }
}

/// A named, typed attachment point declared by a block.
///
/// Blocks only declare their ports; link state belongs to the chain. The
/// mandatory flag is meaningful for input ports: a mandatory input must be
/// linked before the chain may run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDecl {
    pub name: String,
    pub tag: TypeTag,
    pub mandatory: bool,
}

impl PortDecl {
    /// An input port that must be linked before execution.
    pub fn mandatory(name: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            tag,
            mandatory: true,
        }
    }

    /// An input port that may stay unlinked.
    pub fn optional(name: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            tag,
            mandatory: false,
        }
    }

    /// An output port; outputs carry no mandatory flag.
    pub fn output(name: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            tag,
            mandatory: false,
        }
    }
}
