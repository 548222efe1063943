//! Ember Interpreter Library
//!
//! A small expression-oriented scripting language: lexer, parser and a
//! tree-walking evaluator.

pub mod ast;
pub mod config;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;

pub use ast::Span;
pub use config::Config;
pub use error::{CompileError, Diagnostic, DiagnosticKind, Result};
pub use interp::{CaptureHost, ErrorKind, Host, StdHost, Value};

use ast::LineIndex;
use interp::Interpreter;

/// Final value of a program, or the one diagnostic that stopped it
pub type RunResult = std::result::Result<Value, Diagnostic>;

/// Run a program with the default configuration, writing to stdout
pub fn run(source: &str) -> RunResult {
    run_with(source, &Config::default(), &mut StdHost)
}

/// Run a program with a custom configuration and host
pub fn run_with(source: &str, config: &Config, host: &mut dyn Host) -> RunResult {
    let _span = tracing::debug_span!("run", bytes = source.len()).entered();
    let index = LineIndex::new(source);

    let tokens = lexer::tokenize(source).map_err(|e| Diagnostic::from_compile(e, &index))?;
    let program = parser::parse(tokens).map_err(|e| Diagnostic::from_compile(e, &index))?;

    let mut interp = Interpreter::new(config.clone(), host);
    interp
        .run_program(&program)
        .map_err(|e| Diagnostic::from_runtime(e, &index))
}
