//! apex-core: Apex language front end.
//!
//! Turns one Apex source file into a symbol table, a list of type
//! references and diagnostics. The pipeline is lexer, LALR(1) parse engine
//! and a semantic factory that builds symbols from reductions.
//!
//! # Public API
//!
//! - [`parse_source()`] -- parse a compilation unit in one call
//! - [`ParseResult`] -- symbol table, type references and diagnostics
//! - [`SymbolTable`] and the member records in [`symbols`]
//! - [`Diagnostic`] -- lexical, syntax and internal problems
//! - [`lexer::tokenize()`] -- token dump, trivia included on request
//!
//! The engine and table builder are usable with other grammars; see
//! [`grammar::Grammar`], [`lalr::build()`] and [`engine::Engine`].

pub mod engine;
pub mod error;
pub mod factory;
pub mod grammar;
pub mod lalr;
pub mod lexer;
pub mod parse;
pub mod pending;
pub mod span;
pub mod symbols;
pub mod syntax;
pub mod table;
pub mod token;

// ── Convenience re-exports: key types ────────────────────────────────

pub use error::{ContractError, Diagnostic, DiagnosticKind};
pub use lexer::LexerOptions;
pub use parse::ParseResult;
pub use span::{Span, TextPosition};
pub use symbols::{
    Constructor, Field, Method, Parameter, Property, Symbol, SymbolTable, TypeKind,
    TypeReference, VariableScope, Visibility,
};
pub use syntax::SyntaxNode;
pub use token::{SyntaxKind, Token};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use lexer::tokenize;
pub use parse::parse_source;
