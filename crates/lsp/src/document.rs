//! Document state management for open files in the editor.

use std::collections::HashMap;

use apex_core::SymbolTable;

/// Tracks which documents are currently open in the editor.
#[derive(Default)]
pub struct DocumentState {
    documents: HashMap<String, DocumentInfo>,
}

/// Information about a single open document.
pub struct DocumentInfo {
    /// Editor-reported version number.
    pub version: i32,
    /// Latest content from the editor.
    pub content: String,
    /// Symbols from the last parse that produced a table. Kept across
    /// broken edits so completion still has scope information.
    pub table: Option<SymbolTable>,
}

impl DocumentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly opened document.
    pub fn open(&mut self, uri: &str, version: i32, content: String) {
        self.documents.insert(
            uri.to_owned(),
            DocumentInfo {
                version,
                content,
                table: None,
            },
        );
    }

    /// Update content for an already-open document. Changes that are not
    /// newer than the tracked version are dropped; returns whether the
    /// content was applied.
    pub fn change(&mut self, uri: &str, version: i32, content: String) -> bool {
        match self.documents.get_mut(uri) {
            Some(doc) if version > doc.version => {
                doc.version = version;
                doc.content = content;
                true
            }
            _ => false,
        }
    }

    /// Record the symbols of a successful parse.
    pub fn set_table(&mut self, uri: &str, table: SymbolTable) {
        if let Some(doc) = self.documents.get_mut(uri) {
            doc.table = Some(table);
        }
    }

    /// Remove a closed document from tracking.
    pub fn close(&mut self, uri: &str) {
        self.documents.remove(uri);
    }

    /// Get information about an open document.
    pub fn get(&self, uri: &str) -> Option<&DocumentInfo> {
        self.documents.get(uri)
    }
}
