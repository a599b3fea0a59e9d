use apex_core::SymbolTable;
use tracing::warn;

use crate::error::StorageError;

/// Durable storage for top-level symbol tables.
///
/// Names are case-insensitive: `Foo`, `foo` and `FOO` address the same
/// table. Only top-level tables are stored; nested classes travel inside
/// their parent.
///
/// Implementations must be `Send + Sync` so a store can sit behind the
/// language manager's shared cache.
pub trait SymbolStore: Send + Sync {
    /// Read the table stored under `name`.
    ///
    /// Returns `Err(StorageError::NotFound)` if nothing is stored there.
    fn load(&self, name: &str) -> Result<SymbolTable, StorageError>;

    /// Store `table` under its own name, replacing any previous version.
    fn save(&self, table: &SymbolTable) -> Result<(), StorageError>;

    /// Delete the table stored under `name`.
    ///
    /// Returns `Err(StorageError::NotFound)` if nothing is stored there.
    fn remove(&self, name: &str) -> Result<(), StorageError>;

    /// Lowercased names of every stored table, sorted.
    fn names(&self) -> Result<Vec<String>, StorageError>;

    /// Every stored table. Entries that cannot be read are skipped with a
    /// warning so one corrupt file does not hide the rest.
    fn load_all(&self) -> Result<Vec<SymbolTable>, StorageError> {
        let mut tables = Vec::new();
        for name in self.names()? {
            match self.load(&name) {
                Ok(table) => tables.push(table),
                Err(err) => warn!(%name, error = %err, "skipping unreadable symbol table"),
            }
        }
        Ok(tables)
    }
}
