//! Error types for QBET
//!
//! Every stage reports failures through [`QbetError`]. The error kind decides
//! which category (lexical, syntax, name, type, division, runtime) it belongs
//! to; the hosting shell is responsible for printing it.

use crate::token::Span;
use std::fmt;

/// Broad error category, one per stage/condition of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    LexError,
    SyntaxError,
    NameError,
    TypeError,
    DivisionByZeroError,
    RuntimeError,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::LexError => "LexError",
            ErrorCategory::SyntaxError => "SyntaxError",
            ErrorCategory::NameError => "NameError",
            ErrorCategory::TypeError => "TypeError",
            ErrorCategory::DivisionByZeroError => "DivisionByZeroError",
            ErrorCategory::RuntimeError => "RuntimeError",
        };
        write!(f, "{}", name)
    }
}

/// Error kinds in QBET
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    // Lexer errors
    UnexpectedCharacter(char),
    UnterminatedString,
    InvalidNumber(String),

    // Parser errors
    UnexpectedToken(String),
    ExpectedToken(String, String),
    ExpectedExpression(String),
    InvalidAssignmentTarget,

    // Name errors
    UndefinedVariable(String),

    // Type errors
    TypeMismatch {
        message: String,
        expected: Option<String>,
        got: Option<String>,
    },

    DivisionByZero,

    // Runtime errors
    NotCallable(String),
    WrongArity {
        name: String,
        expected: String,
        got: usize,
    },
    IndexOutOfRange {
        index: i64,
        len: usize,
    },
    UndefinedMember {
        type_name: String,
        member: String,
    },
    ReturnOutsideFunction,
    CallDepthExceeded(usize),
    Runtime(String),
}

impl ErrorKind {
    /// Shorthand for a type mismatch with known expected/actual kinds.
    pub fn type_mismatch(message: impl Into<String>, expected: &str, got: &str) -> Self {
        ErrorKind::TypeMismatch {
            message: message.into(),
            expected: Some(expected.to_string()),
            got: Some(got.to_string()),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::UnexpectedCharacter(_)
            | ErrorKind::UnterminatedString
            | ErrorKind::InvalidNumber(_) => ErrorCategory::LexError,
            ErrorKind::UnexpectedToken(_)
            | ErrorKind::ExpectedToken(_, _)
            | ErrorKind::ExpectedExpression(_)
            | ErrorKind::InvalidAssignmentTarget => ErrorCategory::SyntaxError,
            ErrorKind::UndefinedVariable(_) => ErrorCategory::NameError,
            ErrorKind::TypeMismatch { .. } => ErrorCategory::TypeError,
            ErrorKind::DivisionByZero => ErrorCategory::DivisionByZeroError,
            ErrorKind::NotCallable(_)
            | ErrorKind::WrongArity { .. }
            | ErrorKind::IndexOutOfRange { .. }
            | ErrorKind::UndefinedMember { .. }
            | ErrorKind::ReturnOutsideFunction
            | ErrorKind::CallDepthExceeded(_)
            | ErrorKind::Runtime(_) => ErrorCategory::RuntimeError,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UnexpectedCharacter(c) => write!(f, "unexpected character '{}'", c),
            ErrorKind::UnterminatedString => write!(f, "unterminated string"),
            ErrorKind::InvalidNumber(s) => write!(f, "invalid number '{}'", s),
            ErrorKind::UnexpectedToken(t) => write!(f, "unexpected token '{}'", t),
            ErrorKind::ExpectedToken(expected, got) => {
                write!(f, "{}, got '{}'", expected, got)
            }
            ErrorKind::ExpectedExpression(got) => {
                write!(f, "expected expression, got '{}'", got)
            }
            ErrorKind::InvalidAssignmentTarget => write!(f, "invalid assignment target"),
            ErrorKind::UndefinedVariable(name) => write!(f, "'{}' is not defined", name),
            ErrorKind::TypeMismatch { message, expected, got } => match (expected, got) {
                (Some(expected), Some(got)) => {
                    write!(f, "{}: expected {}, got {}", message, expected, got)
                }
                _ => write!(f, "{}", message),
            },
            ErrorKind::DivisionByZero => write!(f, "division by zero"),
            ErrorKind::NotCallable(type_name) => {
                write!(f, "value of type {} is not callable", type_name)
            }
            ErrorKind::WrongArity { name, expected, got } => {
                write!(f, "{} expects {} arguments, got {}", name, expected, got)
            }
            ErrorKind::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range for array of length {}", index, len)
            }
            ErrorKind::UndefinedMember { type_name, member } => {
                write!(f, "{} has no member '{}'", type_name, member)
            }
            ErrorKind::ReturnOutsideFunction => write!(f, "return outside of function"),
            ErrorKind::CallDepthExceeded(limit) => {
                write!(f, "maximum call depth of {} exceeded", limit)
            }
            ErrorKind::Runtime(msg) => write!(f, "{}", msg),
        }
    }
}

/// A QBET error with optional location information
#[derive(Debug, Clone)]
pub struct QbetError {
    pub kind: ErrorKind,
    pub span: Option<Span>,
    pub source_line: Option<String>,
}

impl QbetError {
    pub fn new(kind: ErrorKind, span: Option<Span>) -> Self {
        Self {
            kind,
            span,
            source_line: None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Attach a location if the error does not carry one yet.
    pub fn or_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        if let Some(span) = &self.span {
            let lines: Vec<&str> = source.lines().collect();
            if span.line > 0 && span.line <= lines.len() {
                self.source_line = Some(lines[span.line - 1].to_string());
            }
        }
        self
    }
}

impl From<ErrorKind> for QbetError {
    fn from(kind: ErrorKind) -> Self {
        QbetError::new(kind, None)
    }
}

impl fmt::Display for QbetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(span) = &self.span {
            write!(
                f,
                "[line {}:{}] {}: {}",
                span.line,
                span.column,
                self.category(),
                self.kind
            )?;

            if let Some(ref line) = self.source_line {
                write!(f, "\n  | {}", line)?;
                write!(f, "\n  | {}^", " ".repeat(span.column.saturating_sub(1)))?;
            }
        } else {
            write!(f, "{}: {}", self.category(), self.kind)?;
        }
        Ok(())
    }
}

impl std::error::Error for QbetError {}

/// Result type for QBET operations
pub type Result<T> = std::result::Result<T, QbetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(ErrorKind::UnterminatedString.category(), ErrorCategory::LexError);
        assert_eq!(
            ErrorKind::InvalidAssignmentTarget.category(),
            ErrorCategory::SyntaxError
        );
        assert_eq!(
            ErrorKind::UndefinedVariable("x".into()).category(),
            ErrorCategory::NameError
        );
        assert_eq!(ErrorKind::DivisionByZero.category(), ErrorCategory::DivisionByZeroError);
        assert_eq!(ErrorKind::ReturnOutsideFunction.category(), ErrorCategory::RuntimeError);
    }

    #[test]
    fn test_display_with_source() {
        let err = QbetError::new(ErrorKind::DivisionByZero, Some(Span::new(4, 5, 2, 3)))
            .with_source("x = 1\ny / 0");
        let text = err.to_string();
        assert!(text.starts_with("[line 2:3] DivisionByZeroError: division by zero"));
        assert!(text.contains("  | y / 0"));
        assert!(text.ends_with("  |   ^"));
    }

    #[test]
    fn test_display_without_span() {
        let err: QbetError = ErrorKind::UndefinedVariable("ghost".into()).into();
        assert_eq!(err.to_string(), "NameError: 'ghost' is not defined");
    }
}
