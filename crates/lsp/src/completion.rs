//! Completion lists built from cached symbol tables.
//!
//! After `receiver.` the members of the receiver's type are offered: a
//! variable or field receiver lists instance and static members of its
//! declared type, any other name is treated as a type and lists its static
//! members. Everywhere else the variables in scope and the enclosing
//! class's own members are offered.

use apex_core::{SymbolTable, TextPosition};
use lsp_types::{CompletionItem, CompletionItemKind, Position};

use crate::cache::SymbolCache;

/// What the cursor is completing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionContext {
    /// After `receiver.`, possibly with a partial member name.
    Member { receiver: String },
    /// A plain identifier position.
    Scope,
}

/// Classify the cursor from the text on its line before it.
pub fn completion_context(line_prefix: &str) -> CompletionContext {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let before_partial = line_prefix.trim_end_matches(is_word);
    let Some(before_dot) = before_partial.strip_suffix('.') else {
        return CompletionContext::Scope;
    };
    let receiver_start = before_dot
        .char_indices()
        .rev()
        .find(|&(_, c)| !(is_word(c) || c == '.'))
        .map_or(0, |(i, c)| i + c.len_utf8());
    let receiver = &before_dot[receiver_start..];
    if receiver.is_empty() || receiver.starts_with('.') {
        CompletionContext::Scope
    } else {
        CompletionContext::Member {
            receiver: receiver.to_owned(),
        }
    }
}

fn item(label: &str, kind: CompletionItemKind, detail: String) -> CompletionItem {
    CompletionItem {
        label: label.to_owned(),
        kind: Some(kind),
        detail: Some(detail),
        ..Default::default()
    }
}

/// Members of `table` visible from other types (public and global).
pub fn member_completions(table: &SymbolTable, static_only: bool) -> Vec<CompletionItem> {
    let wanted = |visible: bool, is_static: bool| visible && (is_static || !static_only);
    let mut items = Vec::new();
    for f in &table.fields {
        if wanted(f.visibility.is_external(), f.is_static) {
            items.push(item(&f.name, CompletionItemKind::FIELD, f.type_name.clone()));
        }
    }
    for p in &table.properties {
        if wanted(p.visibility.is_external(), p.is_static) {
            items.push(item(&p.name, CompletionItemKind::PROPERTY, p.type_name.clone()));
        }
    }
    for m in &table.methods {
        if wanted(m.visibility.is_external(), m.is_static) {
            items.push(item(&m.name, CompletionItemKind::METHOD, m.signature()));
        }
    }
    for inner in &table.inner_classes {
        if inner.visibility.is_external() {
            items.push(item(&inner.name, CompletionItemKind::CLASS, inner.name.clone()));
        }
    }
    items
}

/// Variables in scope at `position` followed by every member of the
/// innermost class around it, private ones included.
pub fn scope_completions(table: &SymbolTable, position: TextPosition) -> Vec<CompletionItem> {
    let mut items: Vec<CompletionItem> = table
        .variables_at(position)
        .into_iter()
        .map(|v| {
            item(
                &v.name,
                CompletionItemKind::VARIABLE,
                v.type_name.clone().unwrap_or_default(),
            )
        })
        .collect();

    let owner = table.table_at(position).unwrap_or(table);
    items.extend(
        owner
            .fields
            .iter()
            .map(|f| item(&f.name, CompletionItemKind::FIELD, f.type_name.clone())),
    );
    items.extend(
        owner
            .properties
            .iter()
            .map(|p| item(&p.name, CompletionItemKind::PROPERTY, p.type_name.clone())),
    );
    items.extend(
        owner
            .methods
            .iter()
            .map(|m| item(&m.name, CompletionItemKind::METHOD, m.signature())),
    );
    items.extend(
        owner
            .inner_classes
            .iter()
            .map(|c| item(&c.name, CompletionItemKind::CLASS, c.name.clone())),
    );
    items
}

/// Strip type arguments and array brackets: `List<String>[]` is looked up
/// as `List`.
fn base_type_name(type_name: &str) -> &str {
    let end = type_name.find(&['<', '['][..]).unwrap_or(type_name.len());
    &type_name[..end]
}

/// The declared type of `name` if it is a variable in scope or a field or
/// property of the enclosing class.
fn declared_type_of(table: &SymbolTable, name: &str, position: TextPosition) -> Option<String> {
    if let Some(var) = table
        .variables_at(position)
        .into_iter()
        .rev()
        .find(|v| v.name.eq_ignore_ascii_case(name))
    {
        return var.type_name.clone();
    }
    let owner = table.table_at(position).unwrap_or(table);
    owner
        .field(name)
        .map(|f| f.type_name.clone())
        .or_else(|| owner.property(name).map(|p| p.type_name.clone()))
}

/// Completions at an LSP position in `content`, using `table` (the last
/// good parse of the document) for scope information.
pub fn compute_completions(
    cache: &SymbolCache,
    table: Option<&SymbolTable>,
    content: &str,
    position: Position,
) -> Vec<CompletionItem> {
    let line = content.lines().nth(position.line as usize).unwrap_or("");
    let prefix: String = line.chars().take(position.character as usize).collect();
    let at = TextPosition::new(position.line + 1, position.character + 1);

    match completion_context(&prefix) {
        CompletionContext::Member { receiver } => {
            let declared = table.and_then(|t| declared_type_of(t, &receiver, at));
            let (type_name, static_only) = match &declared {
                Some(type_name) => (base_type_name(type_name), false),
                None => (receiver.as_str(), true),
            };
            cache
                .lookup(type_name)
                .map(|t| member_completions(&t, static_only))
                .unwrap_or_default()
        }
        CompletionContext::Scope => table
            .map(|t| scope_completions(t, at))
            .unwrap_or_default(),
    }
}
