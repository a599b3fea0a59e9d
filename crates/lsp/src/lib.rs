//! Apex language services for IDE integration.
//!
//! Provides the language manager (parse, cache, complete), a shared symbol
//! cache backed by `apex-storage`, diagnostics conversion and a stdio LSP
//! server started by the `apex lsp` CLI subcommand.

pub mod cache;
pub mod completion;
pub mod diagnostics;
pub mod document;
pub mod manager;
pub mod server;

pub use cache::SymbolCache;
pub use manager::{LanguageManager, ManagerConfig};

/// Run the LSP server over stdio. This is the public entry point
/// called by `apex lsp`.
pub fn run(config: &ManagerConfig) -> Result<(), Box<dyn std::error::Error>> {
    server::run(config)
}
