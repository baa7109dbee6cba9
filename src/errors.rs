use std::fmt;

use crate::token::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JSONPathErrorType {
    SyntaxError,
    EvaluationError,
}

impl fmt::Display for JSONPathErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JSONPathErrorType::SyntaxError => f.write_str("syntax error"),
            JSONPathErrorType::EvaluationError => f.write_str("evaluation error"),
        }
    }
}

/// The only error type that escapes the engine.
///
/// Syntax errors cite the 1-based line and column of the offending token.
/// Evaluation errors indicate a malformed query built by hand and carry
/// line and column `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct JSONPathError {
    pub kind: JSONPathErrorType,
    pub msg: String,
    pub line: usize,
    pub column: usize,
}

impl JSONPathError {
    pub fn new(kind: JSONPathErrorType, msg: String, position: Position) -> Self {
        Self {
            kind,
            msg,
            line: position.line,
            column: position.column,
        }
    }

    pub fn syntax(msg: String, position: Position) -> Self {
        Self::new(JSONPathErrorType::SyntaxError, msg, position)
    }

    pub fn evaluation(msg: String) -> Self {
        Self {
            kind: JSONPathErrorType::EvaluationError,
            msg,
            line: 0,
            column: 0,
        }
    }

    pub fn is_syntax_error(&self) -> bool {
        self.kind == JSONPathErrorType::SyntaxError
    }
}

impl std::error::Error for JSONPathError {}

impl fmt::Display for JSONPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            JSONPathErrorType::SyntaxError => write!(
                f,
                "{}: {} ({}:{})",
                self.kind, self.msg, self.line, self.column
            ),
            JSONPathErrorType::EvaluationError => write!(f, "{}: {}", self.kind, self.msg),
        }
    }
}
