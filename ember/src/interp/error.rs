//! Runtime errors for the interpreter

use crate::ast::Span;
use std::fmt;

/// Runtime error during interpretation
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// Source range of the failing expression
    pub span: Span,
}

/// Kinds of runtime errors
#[derive(Debug, Clone)]
pub enum ErrorKind {
    /// Name not bound in any enclosing scope
    UndefinedVariable,
    /// Operand or argument of the wrong type
    TypeMismatch,
    /// Argument count mismatch
    ArityMismatch,
    /// Division or remainder by zero
    DivisionByZero,
    /// No match arm accepted the subject
    NonExhaustiveMatch,
    /// `for` over something that is not a range
    NotIterable,
    /// Call depth limit exceeded
    StackOverflow,
    /// `assert_eq` saw different values
    AssertionFailure { actual: String, expected: String },
    /// Checked integer arithmetic overflowed
    IntegerOverflow,
    /// The host output sink failed
    Io,
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        // Payloads are already part of the message
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl RuntimeError {
    fn new(kind: ErrorKind, message: String) -> Self {
        RuntimeError {
            kind,
            message,
            span: Span::default(),
        }
    }

    /// Attach the source range the error is reported at
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn undefined_variable(name: &str) -> Self {
        Self::new(
            ErrorKind::UndefinedVariable,
            format!("undefined variable: {name}"),
        )
    }

    pub fn type_mismatch(expected: &str, got: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("type mismatch: expected {expected}, got {got}"),
        )
    }

    /// Two operand types an operator cannot combine
    pub fn invalid_operands(op: &str, left: &str, right: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("type mismatch: cannot apply '{op}' to {left} and {right}"),
        )
    }

    pub fn not_comparable(got: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("type mismatch: {got} values cannot be compared"),
        )
    }

    pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> Self {
        Self::new(
            ErrorKind::ArityMismatch,
            format!("function {name} expects {expected} argument(s), got {got}"),
        )
    }

    pub fn division_by_zero() -> Self {
        Self::new(ErrorKind::DivisionByZero, "division by zero".to_string())
    }

    pub fn non_exhaustive_match(subject: &str) -> Self {
        Self::new(
            ErrorKind::NonExhaustiveMatch,
            format!("no match arm matched value: {subject}"),
        )
    }

    pub fn not_iterable(got: &str) -> Self {
        Self::new(
            ErrorKind::NotIterable,
            format!("cannot iterate over {got}, expected a range"),
        )
    }

    pub fn stack_overflow(limit: usize) -> Self {
        Self::new(
            ErrorKind::StackOverflow,
            format!("stack overflow: call depth exceeded {limit}"),
        )
    }

    pub fn assertion_failure(actual: String, expected: String) -> Self {
        let message = format!("assertion failed: expected {expected}, got {actual}");
        Self::new(ErrorKind::AssertionFailure { actual, expected }, message)
    }

    pub fn integer_overflow(op: &str) -> Self {
        Self::new(
            ErrorKind::IntegerOverflow,
            format!("integer overflow in '{op}'"),
        )
    }

    pub fn io_error(msg: &str) -> Self {
        Self::new(ErrorKind::Io, format!("IO error: {msg}"))
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        RuntimeError::io_error(&err.to_string())
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error: {}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;
