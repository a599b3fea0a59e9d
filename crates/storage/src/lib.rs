//! apex-storage: where symbol tables live between parses.
//!
//! - [`SymbolStore`] -- the storage trait
//! - [`FolderStore`] -- one JSON file per top-level type
//! - [`MemoryStore`] -- a map, for tests and throwaway sessions
//! - [`builtin_tables()`] -- platform types bundled with the crate

mod builtins;
mod error;
mod folder;
mod memory;
mod traits;

pub use builtins::builtin_tables;
pub use error::StorageError;
pub use folder::FolderStore;
pub use memory::MemoryStore;
pub use traits::SymbolStore;
