//! Immutable syntax tree nodes built by reductions.

use crate::span::Span;
use crate::token::SyntaxKind;

/// An n-ary tree node: a kind, a span, optional literal text and ordered
/// children. A node without children is a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    kind: SyntaxKind,
    span: Span,
    text: Option<String>,
    children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn leaf(kind: SyntaxKind, span: Span, text: Option<String>) -> Self {
        SyntaxNode {
            kind,
            span,
            text,
            children: Vec::new(),
        }
    }

    pub fn branch(kind: SyntaxKind, span: Span, children: Vec<SyntaxNode>) -> Self {
        SyntaxNode {
            kind,
            span,
            text: None,
            children,
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[SyntaxNode] {
        &self.children
    }

    pub fn into_children(self) -> Vec<SyntaxNode> {
        self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Literal text for identifiers and literals, the fixed spelling for
    /// keywords and punctuation, empty otherwise.
    pub fn display_text(&self) -> &str {
        match &self.text {
            Some(text) => text,
            None if self.kind.is_keyword() || self.kind.is_punctuation() => {
                self.kind.canonical_text()
            }
            None => "",
        }
    }

    /// Pre-order traversal, starting with `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// First node of `kind` in pre-order, `self` included.
    pub fn find_first(&self, kind: SyntaxKind) -> Option<&SyntaxNode> {
        self.descendants().find(|n| n.kind == kind)
    }

    pub fn find_all(&self, kind: SyntaxKind) -> Vec<&SyntaxNode> {
        self.descendants().filter(|n| n.kind == kind).collect()
    }

    /// First immediate child of `kind`.
    pub fn child(&self, kind: SyntaxKind) -> Option<&SyntaxNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.descendants().filter(|n| n.is_leaf())
    }

    pub fn leaf_kinds(&self) -> Vec<SyntaxKind> {
        self.leaves().map(|n| n.kind).collect()
    }

    /// Display text of every leaf, concatenated: `a.b.C`,
    /// `Map<String,Integer>`.
    pub fn leaf_text(&self) -> String {
        self.leaves().map(SyntaxNode::display_text).collect()
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SyntaxKind::*;

    fn ident(name: &str, offset: usize) -> SyntaxNode {
        let end = offset + name.len();
        SyntaxNode::leaf(
            Identifier,
            Span::new(offset, end, 1, offset as u32 + 1, 1, end as u32 + 1),
            Some(name.to_owned()),
        )
    }

    fn punct(kind: SyntaxKind, offset: usize) -> SyntaxNode {
        SyntaxNode::leaf(
            kind,
            Span::new(offset, offset + 1, 1, offset as u32 + 1, 1, offset as u32 + 2),
            None,
        )
    }

    /// `a.b.C`
    fn dotted() -> SyntaxNode {
        let parts = vec![
            ident("a", 0),
            punct(Dot, 1),
            ident("b", 2),
            punct(Dot, 3),
            ident("C", 4),
        ];
        let span = parts[0].span().merge(&parts[4].span());
        SyntaxNode::branch(QualifiedName, span, parts)
    }

    #[test]
    fn leaf_text_reconstructs_dotted_name() {
        assert_eq!(dotted().leaf_text(), "a.b.C");
    }

    #[test]
    fn leaf_text_of_generic_type() {
        let qn = |name: &str, at: usize| {
            SyntaxNode::branch(QualifiedName, Span::default(), vec![ident(name, at)])
        };
        let list = SyntaxNode::branch(
            TypeList,
            Span::default(),
            vec![qn("String", 4), punct(Comma, 10), qn("Integer", 11)],
        );
        let args = SyntaxNode::branch(
            TypeArguments,
            Span::default(),
            vec![punct(Lt, 3), list, punct(Gt, 18)],
        );
        let generic = SyntaxNode::branch(GenericType, Span::default(), vec![qn("Map", 0), args]);
        assert_eq!(generic.leaf_text(), "Map<String,Integer>");
        assert_eq!(
            generic.leaf_kinds(),
            vec![Identifier, Lt, Identifier, Comma, Identifier, Gt]
        );
    }

    #[test]
    fn find_first_is_preorder_and_includes_self() {
        let root = dotted();
        assert_eq!(root.find_first(QualifiedName).map(|n| n.kind()), Some(QualifiedName));
        assert_eq!(root.find_first(Identifier).and_then(|n| n.text()), Some("a"));
        assert!(root.find_first(ClassType).is_none());
    }

    #[test]
    fn find_all_collects_in_source_order() {
        let root = dotted();
        let names: Vec<&str> = root
            .find_all(Identifier)
            .into_iter()
            .filter_map(SyntaxNode::text)
            .collect();
        assert_eq!(names, vec!["a", "b", "C"]);
    }

    #[test]
    fn child_only_looks_one_level_down() {
        let inner = dotted();
        let wrapper = SyntaxNode::branch(ClassType, inner.span(), vec![inner]);
        assert!(wrapper.child(Identifier).is_none());
        assert!(wrapper.child(QualifiedName).is_some());
        assert!(wrapper.find_first(Identifier).is_some());
    }

    #[test]
    fn keyword_leaf_displays_canonical_spelling() {
        let kw = SyntaxNode::leaf(VoidKw, Span::default(), None);
        assert_eq!(kw.display_text(), "void");
        let err = SyntaxNode::leaf(Error, Span::default(), None);
        assert_eq!(err.display_text(), "");
        let empty = SyntaxNode::branch(Modifiers, Span::default(), Vec::new());
        assert!(empty.is_leaf());
        assert_eq!(empty.leaf_text(), "");
    }
}
