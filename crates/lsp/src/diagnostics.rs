//! Parse diagnostics as LSP diagnostics.
//!
//! Apex positions are 1-based, LSP positions 0-based.

use apex_core::{DiagnosticKind, ParseResult};
use lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Position, Range};

pub fn to_lsp(diagnostic: &apex_core::Diagnostic) -> Diagnostic {
    let span = diagnostic.span;
    let start = Position::new(
        span.start_line.saturating_sub(1),
        span.start_column.saturating_sub(1),
    );
    let end = Position::new(
        span.end_line.saturating_sub(1),
        span.end_column.saturating_sub(1),
    );
    let code = match diagnostic.kind {
        DiagnosticKind::Lexical => "lexical",
        DiagnosticKind::Syntax => "syntax",
        DiagnosticKind::Internal => "internal",
    };
    Diagnostic {
        range: Range::new(start, end),
        severity: Some(DiagnosticSeverity::ERROR),
        code: Some(NumberOrString::String(code.to_owned())),
        source: Some("apex".to_string()),
        message: diagnostic.message.clone(),
        ..Default::default()
    }
}

/// Every diagnostic of a parse, in source order.
pub fn compute_diagnostics(result: &ParseResult) -> Vec<Diagnostic> {
    result.diagnostics.iter().map(to_lsp).collect()
}
