use std::sync::OnceLock;

use apex_core::SymbolTable;
use tracing::{debug, warn};

const BUILTINS_JSON: &str = include_str!("../resources/builtins.json");

/// Platform types (`System`, `String`, `Math`, ...) shipped with the crate,
/// decoded on first use. Namespaced types carry their full name, e.g.
/// `System.String`.
pub fn builtin_tables() -> &'static [SymbolTable] {
    static TABLES: OnceLock<Vec<SymbolTable>> = OnceLock::new();
    TABLES.get_or_init(|| match serde_json::from_str::<Vec<SymbolTable>>(BUILTINS_JSON) {
        Ok(tables) => {
            debug!(count = tables.len(), "loaded builtin symbol tables");
            tables
        }
        Err(err) => {
            warn!(error = %err, "bundled builtin symbol tables are unreadable");
            Vec::new()
        }
    })
}
