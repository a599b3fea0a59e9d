//! Language manager: the entry point editors and tools talk to.

use std::path::PathBuf;
use std::sync::Arc;

use apex_core::{parse_source, ParseResult, SymbolTable, TextPosition};
use apex_storage::{FolderStore, StorageError, SymbolStore};
use lsp_types::CompletionItem;
use tracing::{debug, warn};

use crate::cache::SymbolCache;
use crate::completion;

/// How a [`LanguageManager`] finds and keeps symbols.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Folder mirroring parsed tables as JSON. `None` keeps everything in
    /// memory.
    pub symbols_folder: Option<PathBuf>,
    /// Seed the cache with the bundled platform types.
    pub load_builtins: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            symbols_folder: None,
            load_builtins: true,
        }
    }
}

/// Parses documents and keeps their symbols in a shared cache.
#[derive(Clone)]
pub struct LanguageManager {
    cache: Arc<SymbolCache>,
}

impl LanguageManager {
    pub fn new(config: &ManagerConfig) -> Result<Self, StorageError> {
        let store = match &config.symbols_folder {
            Some(folder) => Some(Arc::new(FolderStore::open(folder)?) as Arc<dyn SymbolStore>),
            None => None,
        };
        let cache = SymbolCache::new(store);
        if config.load_builtins {
            cache.load_builtins();
        }
        cache.load_persisted()?;
        debug!(types = cache.len(), "language manager ready");
        Ok(LanguageManager {
            cache: Arc::new(cache),
        })
    }

    pub fn cache(&self) -> &SymbolCache {
        &self.cache
    }

    /// Parse `text`, cache its table (replacing and persisting) and return
    /// the full result.
    pub fn parse_document(&self, text: &str) -> ParseResult {
        let result = parse_source(text);
        if let Some(table) = &result.symbol_table {
            if let Err(err) = self.cache.upsert(table.clone(), true, true) {
                warn!(name = %table.name, error = %err, "cannot persist symbol table");
            }
        }
        result
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolTable> {
        self.cache.lookup(name)
    }

    /// Externally visible members of the cached type `type_name`.
    pub fn member_completions(&self, type_name: &str, static_only: bool) -> Vec<CompletionItem> {
        self.cache
            .lookup(type_name)
            .map(|t| completion::member_completions(&t, static_only))
            .unwrap_or_default()
    }

    /// Variables and class members available at `position` in `table`.
    pub fn scope_completions(
        &self,
        table: &SymbolTable,
        position: TextPosition,
    ) -> Vec<CompletionItem> {
        completion::scope_completions(table, position)
    }
}
