//! LSP server main loop with request/notification dispatch.
//!
//! Uses `lsp-server` (synchronous, crossbeam-based) for the transport.
//! Every open or changed document is reparsed in full; its symbols go into
//! the manager's cache so other documents can complete against them.

use lsp_server::{Connection, Message, Notification, Response};
use lsp_types::notification::{
    DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, Notification as _,
    PublishDiagnostics,
};
use lsp_types::request::Completion;
use lsp_types::{
    CompletionOptions, CompletionResponse, PublishDiagnosticsParams, ServerCapabilities,
    TextDocumentSyncCapability, TextDocumentSyncKind, TextDocumentSyncOptions, Uri,
};
use tracing::{debug, info};

use crate::completion;
use crate::diagnostics;
use crate::document::DocumentState;
use crate::manager::{LanguageManager, ManagerConfig};

/// Run the LSP server over stdio until shutdown.
pub fn run(config: &ManagerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let manager = LanguageManager::new(config)?;
    let (connection, io_threads) = Connection::stdio();

    // ── Initialize handshake ──────────────────────────────────────────
    let server_capabilities = build_capabilities();
    let init_json = serde_json::to_value(&server_capabilities)?;
    connection.initialize(init_json)?;
    info!(types = manager.cache().len(), "apex language server initialized");

    // ── Main loop ─────────────────────────────────────────────────────
    let mut doc_state = DocumentState::new();

    for msg in &connection.receiver {
        match msg {
            Message::Request(req) => {
                if connection.handle_shutdown(&req)? {
                    break;
                }
                handle_request(&connection, &manager, &doc_state, req)?;
            }
            Message::Notification(not) => {
                handle_notification(&connection, &manager, &mut doc_state, not)?;
            }
            Message::Response(_) => {}
        }
    }

    io_threads.join()?;
    Ok(())
}

fn build_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                ..Default::default()
            },
        )),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec![".".into()]),
            resolve_provider: Some(false),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn handle_request(
    connection: &Connection,
    manager: &LanguageManager,
    doc_state: &DocumentState,
    req: lsp_server::Request,
) -> Result<(), Box<dyn std::error::Error>> {
    use lsp_types::request::Request as _;

    if req.method == Completion::METHOD {
        let params: lsp_types::CompletionParams = serde_json::from_value(req.params.clone())?;
        let uri = params.text_document_position.text_document.uri.as_str();
        let position = params.text_document_position.position;
        let items = match doc_state.get(uri) {
            Some(doc) => completion::compute_completions(
                manager.cache(),
                doc.table.as_ref(),
                &doc.content,
                position,
            ),
            None => Vec::new(),
        };
        let result = CompletionResponse::Array(items);
        let resp = Response::new_ok(req.id, serde_json::to_value(result)?);
        connection.sender.send(Message::Response(resp))?;
    } else {
        let resp = Response::new_err(
            req.id,
            lsp_server::ErrorCode::MethodNotFound as i32,
            format!("method not found: {}", req.method),
        );
        connection.sender.send(Message::Response(resp))?;
    }
    Ok(())
}

fn handle_notification(
    connection: &Connection,
    manager: &LanguageManager,
    doc_state: &mut DocumentState,
    not: Notification,
) -> Result<(), Box<dyn std::error::Error>> {
    match not.method.as_str() {
        m if m == DidOpenTextDocument::METHOD => {
            let params: lsp_types::DidOpenTextDocumentParams = serde_json::from_value(not.params)?;
            let uri = params.text_document.uri;
            doc_state.open(
                uri.as_str(),
                params.text_document.version,
                params.text_document.text,
            );
            reparse(connection, manager, doc_state, uri)?;
        }
        m if m == DidChangeTextDocument::METHOD => {
            let params: lsp_types::DidChangeTextDocumentParams =
                serde_json::from_value(not.params)?;
            let uri = params.text_document.uri;
            // FULL sync: last content change has the entire document
            if let Some(change) = params.content_changes.into_iter().last() {
                if doc_state.change(uri.as_str(), params.text_document.version, change.text) {
                    reparse(connection, manager, doc_state, uri)?;
                } else {
                    debug!(uri = uri.as_str(), "dropping stale change");
                }
            }
        }
        m if m == DidCloseTextDocument::METHOD => {
            let params: lsp_types::DidCloseTextDocumentParams = serde_json::from_value(not.params)?;
            doc_state.close(params.text_document.uri.as_str());
            publish_diagnostics(connection, params.text_document.uri, Vec::new(), None)?;
        }
        _ => {}
    }
    Ok(())
}

/// Parse the current content of `uri`, keep its symbols and publish its
/// diagnostics.
fn reparse(
    connection: &Connection,
    manager: &LanguageManager,
    doc_state: &mut DocumentState,
    uri: Uri,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(doc) = doc_state.get(uri.as_str()) else {
        return Ok(());
    };
    let version = doc.version;
    let result = manager.parse_document(&doc.content);
    debug!(
        uri = uri.as_str(),
        diagnostics = result.diagnostics.len(),
        "document reparsed"
    );
    let diags = diagnostics::compute_diagnostics(&result);
    if let Some(table) = result.symbol_table {
        doc_state.set_table(uri.as_str(), table);
    }
    publish_diagnostics(connection, uri, diags, Some(version))
}

/// Send `textDocument/publishDiagnostics` notification to the client.
fn publish_diagnostics(
    connection: &Connection,
    uri: Uri,
    diagnostics: Vec<lsp_types::Diagnostic>,
    version: Option<i32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let params = PublishDiagnosticsParams {
        uri,
        diagnostics,
        version,
    };
    let not = Notification::new(PublishDiagnostics::METHOD.to_string(), params);
    connection.sender.send(Message::Notification(not))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_advertise_full_sync_and_dot_completion() {
        let caps = build_capabilities();
        assert_eq!(
            caps.text_document_sync,
            Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                ..Default::default()
            }))
        );
        let completion = caps.completion_provider.unwrap_or_default();
        assert_eq!(completion.trigger_characters, Some(vec![".".to_string()]));
    }
}
