//! Shared symbol cache with an optional persistent mirror.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use apex_core::SymbolTable;
use apex_storage::{builtin_tables, StorageError, SymbolStore};
use tracing::{debug, warn};

/// Namespace tried for bare names that miss.
const SYSTEM_PREFIX: &str = "system.";

/// Every known type, keyed by lowercased qualified name. Nested classes are
/// registered as `outer.inner` next to their parent.
///
/// All access goes through one mutex; readers receive clones.
pub struct SymbolCache {
    tables: Mutex<BTreeMap<String, SymbolTable>>,
    store: Option<Arc<dyn SymbolStore>>,
}

impl Default for SymbolCache {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SymbolCache {
    pub fn new(store: Option<Arc<dyn SymbolStore>>) -> Self {
        SymbolCache {
            tables: Mutex::new(BTreeMap::new()),
            store,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, SymbolTable>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the bundled platform types without overwriting anything.
    pub fn load_builtins(&self) {
        let mut tables = self.lock();
        for table in builtin_tables() {
            register(&mut tables, String::new(), table.clone(), false);
        }
        debug!(count = tables.len(), "builtin types cached");
    }

    /// Pull every table from the persistent mirror into memory, replacing
    /// cached versions.
    pub fn load_persisted(&self) -> Result<usize, StorageError> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let loaded = store.load_all()?;
        let count = loaded.len();
        let mut tables = self.lock();
        for table in loaded {
            evict(&mut tables, &table.name.to_ascii_lowercase());
            register(&mut tables, String::new(), table, true);
        }
        debug!(count, "persisted types cached");
        Ok(count)
    }

    /// Find a type by qualified name, case-insensitively. A bare name that
    /// misses is retried in the `System` namespace; a name missing from
    /// memory is looked up in the persistent mirror and cached.
    pub fn lookup(&self, name: &str) -> Option<SymbolTable> {
        let key = name.to_ascii_lowercase();
        let mut tables = self.lock();
        let found = match tables.get(&key) {
            Some(found) => Some(found),
            None if !key.contains('.') => tables.get(&format!("{SYSTEM_PREFIX}{key}")),
            None => None,
        };
        if let Some(found) = found {
            return Some(found.clone());
        }

        let store = self.store.as_ref()?;
        match store.load(&key) {
            Ok(table) => {
                register(&mut tables, String::new(), table.clone(), false);
                Some(table)
            }
            Err(err) if err.is_not_found() => None,
            Err(err) => {
                warn!(name = %key, error = %err, "unreadable persisted symbol table");
                None
            }
        }
    }

    /// Cache `table` and its nested classes. With `replace` false, names
    /// already cached keep their current table; with `replace` true the
    /// previous table's nested classes are evicted first. With `persist`,
    /// the table is also written to the mirror under the same lock, after
    /// memory is updated. A failed write leaves memory updated and is
    /// returned.
    pub fn upsert(
        &self,
        table: SymbolTable,
        replace: bool,
        persist: bool,
    ) -> Result<(), StorageError> {
        let mut tables = self.lock();
        let key = table.name.to_ascii_lowercase();
        if replace {
            evict(&mut tables, &key);
        }
        let store = self.store.as_ref().filter(|_| persist);
        match store {
            Some(store) => {
                register(&mut tables, String::new(), table.clone(), replace);
                store.save(&table)
            }
            None => {
                register(&mut tables, String::new(), table, replace);
                Ok(())
            }
        }
    }

    /// Evict `name` and its nested classes from memory and the mirror.
    /// Returns whether anything was cached under that name.
    pub fn remove(&self, name: &str) -> Result<bool, StorageError> {
        let key = name.to_ascii_lowercase();
        let mut tables = self.lock();
        let removed = evict(&mut tables, &key);
        if let Some(store) = &self.store {
            match store.remove(&key) {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }
        Ok(removed)
    }

    /// A copy of every cached table by key.
    pub fn snapshot(&self) -> BTreeMap<String, SymbolTable> {
        self.lock().clone()
    }

    /// Cached keys, sorted.
    pub fn class_names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn register(
    tables: &mut BTreeMap<String, SymbolTable>,
    prefix: String,
    table: SymbolTable,
    replace: bool,
) {
    let key = format!("{prefix}{}", table.name.to_ascii_lowercase());
    for inner in &table.inner_classes {
        register(tables, format!("{key}."), inner.clone(), replace);
    }
    if replace || !tables.contains_key(&key) {
        tables.insert(key, table);
    }
}

/// Remove the table cached under `key` together with the keys of its
/// nested classes. Unrelated tables sharing the prefix stay.
fn evict(tables: &mut BTreeMap<String, SymbolTable>, key: &str) -> bool {
    let Some(old) = tables.remove(key) else {
        return false;
    };
    let mut nested = Vec::new();
    nested_keys(&old, key, &mut nested);
    for k in nested {
        tables.remove(&k);
    }
    true
}

fn nested_keys(table: &SymbolTable, key: &str, out: &mut Vec<String>) {
    for inner in &table.inner_classes {
        let inner_key = format!("{key}.{}", inner.name.to_ascii_lowercase());
        nested_keys(inner, &inner_key, out);
        out.push(inner_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apex_storage::MemoryStore;

    /// Accepts reads, refuses every write.
    struct ReadOnlyStore;

    impl SymbolStore for ReadOnlyStore {
        fn load(&self, name: &str) -> Result<SymbolTable, StorageError> {
            Err(StorageError::NotFound {
                name: name.to_owned(),
            })
        }

        fn save(&self, _table: &SymbolTable) -> Result<(), StorageError> {
            Err(StorageError::Backend("read-only".into()))
        }

        fn remove(&self, _name: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("read-only".into()))
        }

        fn names(&self) -> Result<Vec<String>, StorageError> {
            Ok(Vec::new())
        }
    }

    fn table(name: &str, inner: &[&str]) -> SymbolTable {
        SymbolTable {
            name: name.to_owned(),
            inner_classes: inner
                .iter()
                .map(|n| SymbolTable {
                    name: (*n).to_owned(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn nested_classes_get_qualified_keys() {
        let cache = SymbolCache::default();
        cache.upsert(table("Outer", &["Inner"]), true, false).unwrap();
        assert_eq!(cache.class_names(), vec!["outer", "outer.inner"]);
        assert_eq!(cache.lookup("OUTER.Inner").map(|t| t.name), Some("Inner".into()));
    }

    #[test]
    fn upsert_without_replace_keeps_existing() {
        let cache = SymbolCache::default();
        let mut first = table("Foo", &[]);
        first.interfaces = vec!["First".into()];
        cache.upsert(first, true, false).unwrap();
        cache.upsert(table("Foo", &[]), false, false).unwrap();
        assert_eq!(cache.lookup("foo").map(|t| t.interfaces), Some(vec!["First".into()]));
        cache.upsert(table("Foo", &[]), true, false).unwrap();
        assert_eq!(cache.lookup("foo").map(|t| t.interfaces.len()), Some(0));
    }

    #[test]
    fn bare_names_fall_back_to_system() {
        let cache = SymbolCache::default();
        cache.load_builtins();
        assert_eq!(cache.lookup("string").map(|t| t.name), Some("System.String".into()));
        assert!(cache.lookup("System").is_some());
        assert!(cache.lookup("NoSuchType").is_none());
    }

    #[test]
    fn remove_evicts_nested_and_persisted() {
        let store = Arc::new(MemoryStore::new());
        let cache = SymbolCache::new(Some(store.clone()));
        cache.upsert(table("Outer", &["Inner"]), true, true).unwrap();
        assert_eq!(store.names().unwrap(), vec!["outer"]);

        assert!(cache.remove("Outer").unwrap());
        assert!(cache.is_empty());
        assert!(store.names().unwrap().is_empty());
        assert!(!cache.remove("Outer").unwrap());
    }

    #[test]
    fn lookup_reads_through_to_the_store() {
        let store = Arc::new(MemoryStore::new());
        store.save(&table("Stored", &["Part"])).unwrap();
        let cache = SymbolCache::new(Some(store));
        assert!(cache.is_empty());
        assert!(cache.lookup("stored").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_persist_still_updates_memory() {
        let cache = SymbolCache::new(Some(Arc::new(ReadOnlyStore)));
        let err = cache
            .upsert(table("Account", &["Line"]), true, true)
            .expect_err("save refused");
        assert!(matches!(err, StorageError::Backend(_)));
        assert_eq!(cache.lookup("account").map(|t| t.name), Some("Account".into()));
        assert!(cache.lookup("account.line").is_some());
    }

    #[test]
    fn failed_remove_reports_the_store_error() {
        let cache = SymbolCache::new(Some(Arc::new(ReadOnlyStore)));
        cache.upsert(table("Account", &[]), true, false).unwrap();
        assert!(cache.remove("Account").is_err());
        assert!(cache.lookup("account").is_none());
    }

    #[test]
    fn replace_evicts_nested_classes_of_the_old_table() {
        let cache = SymbolCache::default();
        cache.upsert(table("Outer", &["Inner", "Gone"]), true, false).unwrap();
        assert_eq!(cache.class_names(), vec!["outer", "outer.gone", "outer.inner"]);

        cache.upsert(table("Outer", &["Inner"]), true, false).unwrap();
        assert_eq!(cache.class_names(), vec!["outer", "outer.inner"]);
        assert!(cache.lookup("Outer.Gone").is_none());

        cache.upsert(table("Outer", &[]), true, false).unwrap();
        assert_eq!(cache.class_names(), vec!["outer"]);
    }

    #[test]
    fn replace_keeps_unrelated_tables_sharing_the_prefix() {
        let cache = SymbolCache::default();
        cache.load_builtins();
        assert!(cache.lookup("System.String").is_some());
        cache.upsert(table("System", &[]), true, false).unwrap();
        assert!(cache.lookup("System.String").is_some());
        assert!(cache.remove("System").unwrap());
        assert!(cache.lookup("System.Math").is_some());
    }

    #[test]
    fn system_fallback_applies_to_bare_names_only() {
        let cache = SymbolCache::default();
        cache.load_builtins();
        assert!(cache.lookup("Math").is_some());
        assert!(cache.lookup("Foo.Math").is_none());
    }

    #[test]
    fn concurrent_upserts_leave_memory_and_store_agreeing() {
        let store = Arc::new(MemoryStore::new());
        let cache = SymbolCache::new(Some(store.clone()));
        std::thread::scope(|scope| {
            for i in 0..8 {
                let cache = &cache;
                scope.spawn(move || {
                    for round in 0..20 {
                        let mut t = table("Shared", &[]);
                        t.interfaces = vec![format!("T{i}_{round}")];
                        cache.upsert(t, true, true).unwrap();
                    }
                });
            }
        });
        let cached = cache.lookup("shared").expect("cached");
        let stored = store.load("shared").expect("stored");
        assert_eq!(cached.interfaces, stored.interfaces);
    }
}
