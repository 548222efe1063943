//! Tree-walking interpreter

mod builtins;
mod env;
mod error;
mod eval;
mod host;
mod value;

pub use builtins::{BuiltinCtx, BuiltinFn};
pub use env::{child_env, visible_bindings, EnvRef, Environment};
pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::Interpreter;
pub use host::{CaptureHost, Host, StdHost};
pub use value::{Closure, RangeValue, Value};
