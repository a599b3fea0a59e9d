use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::span::Span;
use crate::token::SyntaxKind;

/// Which stage produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// Unrecognized character or unterminated literal; the lexer skips on.
    Lexical,
    /// Grammar violation; the parser recovers or aborts.
    Syntax,
    /// A defect in the front end itself, not in the user's source.
    Internal,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DiagnosticKind::Lexical => "lexical error",
            DiagnosticKind::Syntax => "syntax error",
            DiagnosticKind::Internal => "internal error",
        };
        f.write_str(label)
    }
}

/// A problem found while parsing one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn lexical(message: impl Into<String>, span: Span) -> Self {
        Diagnostic::new(DiagnosticKind::Lexical, message, span)
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Diagnostic::new(DiagnosticKind::Syntax, message, span)
    }

    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        Diagnostic::new(DiagnosticKind::Internal, message, span)
    }

    /// Flat JSON form used by `apex parse --output json`.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "kind":    self.kind,
            "message": self.message,
            "line":    self.span.start_line,
            "column":  self.span.start_column,
            "end_line":   self.span.end_line,
            "end_column": self.span.end_column,
        })
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.span.start_line, self.span.start_column, self.kind, self.message
        )
    }
}

/// Receives lexical diagnostics as the lexer finds them.
pub trait ErrorSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl ErrorSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// A reduction produced a node whose shape the symbol builder does not
/// recognize. Always a front-end defect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    #[error("{parent:?} node has no {expected:?} child")]
    MissingChild {
        parent: SyntaxKind,
        expected: SyntaxKind,
        span: Span,
    },

    #[error("{kind:?} node has no declared type")]
    MissingType { kind: SyntaxKind, span: Span },
}

impl ContractError {
    pub fn span(&self) -> Span {
        match self {
            ContractError::MissingChild { span, .. } | ContractError::MissingType { span, .. } => {
                *span
            }
        }
    }
}

impl From<ContractError> for Diagnostic {
    fn from(err: ContractError) -> Self {
        Diagnostic::internal(err.to_string(), err.span())
    }
}
