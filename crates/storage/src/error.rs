use std::path::PathBuf;

/// All errors that can be returned by a [`SymbolStore`](crate::SymbolStore).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No table is stored under this name.
    #[error("symbol table not found: {name}")]
    NotFound { name: String },

    /// The name cannot be used as a storage key.
    #[error("invalid symbol table name: {name:?}")]
    InvalidName { name: String },

    /// Reading or writing the backing file failed.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored table is not valid JSON for a symbol table.
    #[error("cannot decode {}: {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Anything else a backend needs to report.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}
