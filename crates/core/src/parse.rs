//! One-call parse of a source file into symbols and diagnostics.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::Engine;
use crate::error::Diagnostic;
use crate::factory::SemanticFactory;
use crate::grammar::apex_table;
use crate::lexer::{Lexer, LexerOptions};
use crate::symbols::{SymbolTable, TypeReference};

/// Everything one parse produces.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParseResult {
    /// The top-level type; `None` when the parse was aborted.
    pub symbol_table: Option<SymbolTable>,
    /// Every type mention, in source order.
    pub type_references: Vec<TypeReference>,
    /// Lexical, syntax and internal problems, by start offset.
    pub diagnostics: Vec<Diagnostic>,
    /// The input reached the end of the grammar, possibly after recovering
    /// from syntax errors.
    pub accepted: bool,
}

impl ParseResult {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Parse one Apex compilation unit.
pub fn parse_source(source: &str) -> ParseResult {
    let mut lexer = Lexer::new(source, LexerOptions::default());
    let mut factory = SemanticFactory::new();
    let outcome = Engine::new(apex_table()).parse(&mut lexer, &mut factory);

    let (table, type_references, contract) = factory.finish();
    let mut diagnostics = lexer.into_sink();
    diagnostics.extend(outcome.diagnostics);
    diagnostics.extend(contract.map(Diagnostic::from));
    diagnostics.sort_by_key(|d| d.span.start_offset);

    let symbol_table = if outcome.accepted { table } else { None };
    debug!(
        accepted = outcome.accepted,
        diagnostics = diagnostics.len(),
        type_references = type_references.len(),
        table = symbol_table.as_ref().map(|t| t.name.as_str()),
        "parsed source"
    );

    ParseResult {
        symbol_table,
        type_references,
        diagnostics,
        accepted: outcome.accepted,
    }
}
