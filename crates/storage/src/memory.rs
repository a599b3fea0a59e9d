use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use apex_core::SymbolTable;

use crate::error::StorageError;
use crate::traits::SymbolStore;

/// A store that forgets everything when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<BTreeMap<String, SymbolTable>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut BTreeMap<String, SymbolTable>) -> R) -> R {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut tables)
    }
}

impl SymbolStore for MemoryStore {
    fn load(&self, name: &str) -> Result<SymbolTable, StorageError> {
        self.with(|tables| tables.get(&name.to_ascii_lowercase()).cloned())
            .ok_or_else(|| StorageError::NotFound {
                name: name.to_owned(),
            })
    }

    fn save(&self, table: &SymbolTable) -> Result<(), StorageError> {
        self.with(|tables| tables.insert(table.name.to_ascii_lowercase(), table.clone()));
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        self.with(|tables| tables.remove(&name.to_ascii_lowercase()))
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound {
                name: name.to_owned(),
            })
    }

    fn names(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.with(|tables| tables.keys().cloned().collect()))
    }
}
