//! Type annotation AST nodes
//!
//! Annotations are parsed and kept in the tree but never enforced.

use serde::{Deserialize, Serialize};

/// Written type annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    /// Unit type ()
    Unit,
    /// Any named type: `int`, `str`, `bool`, ...
    Named(String),
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Unit => write!(f, "()"),
            Type::Named(name) => write!(f, "{name}"),
        }
    }
}
