//! Error types and reporting

use crate::ast::{LineIndex, Position, Span};
use crate::interp::{ErrorKind, RuntimeError};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CompileError>;

/// Front-end error: malformed token or grammar violation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("Lexer error at {span}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span}: {message}")]
    Parser {
        message: String,
        span: Span,
        expected: String,
        found: String,
    },
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        let expected = expected.into();
        let found = found.into();
        Self::Parser {
            message: format!("expected {expected}, found {found}"),
            span,
            expected,
            found,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Lexer { span, .. } | Self::Parser { span, .. } => *span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Lexer { message, .. } | Self::Parser { message, .. } => message,
        }
    }
}

/// Which stage of a run produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lex,
    Parse,
    Runtime,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::Lex => write!(f, "Lexer"),
            DiagnosticKind::Parse => write!(f, "Parser"),
            DiagnosticKind::Runtime => write!(f, "Runtime"),
        }
    }
}

/// The single failure a run reports to its host
#[derive(Debug, Clone, Error)]
#[error("{kind} error at {position}: {message}")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub position: Position,
    pub span: Span,
    pub message: String,
    /// Set for runtime failures
    pub runtime: Option<ErrorKind>,
}

impl Diagnostic {
    pub fn from_compile(error: CompileError, index: &LineIndex<'_>) -> Self {
        let kind = match &error {
            CompileError::Lexer { .. } => DiagnosticKind::Lex,
            CompileError::Parser { .. } => DiagnosticKind::Parse,
        };
        let span = error.span();
        Diagnostic {
            kind,
            position: index.position(span.start),
            span,
            message: error.message().to_string(),
            runtime: None,
        }
    }

    pub fn from_runtime(error: RuntimeError, index: &LineIndex<'_>) -> Self {
        Diagnostic {
            kind: DiagnosticKind::Runtime,
            position: index.position(error.span.start),
            span: error.span,
            message: error.message,
            runtime: Some(error.kind),
        }
    }

    pub fn runtime_kind(&self) -> Option<&ErrorKind> {
        self.runtime.as_ref()
    }
}

/// Report a diagnostic with ariadne on stderr
pub fn report_diagnostic(
    filename: &str,
    source: &str,
    diagnostic: &Diagnostic,
) -> std::io::Result<()> {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let range = diagnostic.span.start..diagnostic.span.end.max(diagnostic.span.start);

    Report::build(ReportKind::Error, (filename, range.clone()))
        .with_message(format!("{} error", diagnostic.kind))
        .with_label(
            Label::new((filename, range))
                .with_message(&diagnostic.message)
                .with_color(Color::Red),
        )
        .finish()
        .eprint((filename, Source::from(source)))
}
