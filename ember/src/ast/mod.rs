//! Abstract Syntax Tree definitions

mod expr;
mod span;
mod types;

pub use expr::*;
pub use span::*;
pub use types::*;

use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// A program is a sequence of top-level statements, optionally ending in a
/// trailing expression whose value is the program's result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub stmts: Vec<Spanned<Stmt>>,
    pub tail: Option<Box<Spanned<Expr>>>,
}

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `let name = value`
    Let {
        name: Spanned<Binder>,
        ty: Option<Spanned<Type>>,
        value: Spanned<Expr>,
    },

    /// `fn name(params) -> ty { body }`, the name is in scope inside the body
    FnDecl {
        name: Spanned<String>,
        func: Rc<FnLit>,
    },

    /// `for var in iter { body }`
    For {
        var: Spanned<Binder>,
        iter: Spanned<Expr>,
        body: Block,
    },

    /// Expression evaluated for its side effects
    Expr(Spanned<Expr>),
}

/// Left-hand side of a `let` or `for`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Binder {
    Name(String),
    /// `_`: evaluate but bind nothing
    Discard,
}

impl std::fmt::Display for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binder::Name(name) => write!(f, "{name}"),
            Binder::Discard => write!(f, "_"),
        }
    }
}

/// Block: `{ stmt; stmt; tail }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
    pub tail: Option<Box<Spanned<Expr>>>,
    pub span: Span,
}

/// Function literal shared by declarations, `fn(..) { .. }` and `|..| ..`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FnLit {
    /// Declared name, `None` for anonymous functions
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub ret_ty: Option<Spanned<Type>>,
    pub body: Block,
    pub span: Span,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Spanned<String>,
    pub ty: Option<Spanned<Type>>,
}
