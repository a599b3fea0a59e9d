use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use apex_core::SymbolTable;
use tracing::debug;

use crate::error::StorageError;
use crate::traits::SymbolStore;

const EXTENSION: &str = "json";

/// Mirrors tables into a folder, one pretty-printed JSON file per type,
/// named by the lowercased type name: `Foo` lives in `foo.json`.
#[derive(Debug, Clone)]
pub struct FolderStore {
    root: PathBuf,
}

impl FolderStore {
    /// Use `root` as the mirror folder, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(FolderStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds (or would hold) the table named `name`. Names that
    /// could leave the folder are rejected.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(StorageError::InvalidName {
                name: name.to_owned(),
            });
        }
        Ok(self
            .root
            .join(format!("{}.{EXTENSION}", name.to_ascii_lowercase())))
    }

    fn not_found_or_io(name: &str, path: PathBuf, source: io::Error) -> StorageError {
        if source.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound {
                name: name.to_owned(),
            }
        } else {
            StorageError::Io { path, source }
        }
    }
}

impl SymbolStore for FolderStore {
    fn load(&self, name: &str) -> Result<SymbolTable, StorageError> {
        let path = self.path_for(name)?;
        let text = fs::read_to_string(&path)
            .map_err(|source| Self::not_found_or_io(name, path.clone(), source))?;
        serde_json::from_str(&text).map_err(|source| StorageError::Serialization { path, source })
    }

    fn save(&self, table: &SymbolTable) -> Result<(), StorageError> {
        let path = self.path_for(&table.name)?;
        let json = serde_json::to_string_pretty(table).map_err(|source| {
            StorageError::Serialization {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&path, json).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "saved symbol table");
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        fs::remove_file(&path).map_err(|source| Self::not_found_or_io(name, path, source))
    }

    fn names(&self) -> Result<Vec<String>, StorageError> {
        let io_err = |source: io::Error| StorageError::Io {
            path: self.root.clone(),
            source,
        };
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().is_some_and(|e| e == EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_ascii_lowercase());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_lowercased() {
        let store = FolderStore {
            root: PathBuf::from("symbols"),
        };
        assert_eq!(
            store.path_for("AccountService").unwrap(),
            Path::new("symbols").join("accountservice.json")
        );
    }

    #[test]
    fn names_that_escape_the_folder_are_rejected() {
        let store = FolderStore {
            root: PathBuf::from("symbols"),
        };
        for name in ["../x", "a/b", "a\\b", "..", ""] {
            assert!(
                matches!(store.path_for(name), Err(StorageError::InvalidName { .. })),
                "{name:?} accepted"
            );
        }
        assert!(store.path_for("Outer.Inner").is_ok());
    }
}
