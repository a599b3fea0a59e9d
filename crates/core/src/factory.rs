//! Reduction handler that builds syntax nodes and collects declarations.
//!
//! Most reductions only shape the tree: single-child wrappers in the
//! expression and statement chains are passed through, left-recursive lists
//! are flattened into one node. Declaration reductions additionally record
//! symbols on the [`PendingDeclarations`] stacks.

use tracing::{trace, warn};

use crate::engine::{ReduceHandler, ReduceSignal};
use crate::error::ContractError;
use crate::pending::PendingDeclarations;
use crate::span::Span;
use crate::symbols::{
    Constructor, Field, Method, Parameter, Property, Symbol, SymbolTable, TypeKind,
    TypeReference, Visibility,
};
use crate::syntax::SyntaxNode;
use crate::token::{SyntaxKind, Token};

/// Kinds that never wrap a single child in a node of their own.
fn is_transparent(kind: SyntaxKind) -> bool {
    use SyntaxKind::*;
    matches!(
        kind,
        TypeDeclaration
            | ClassBodyDeclaration
            | BlockStatement
            | Statement
            | StatementExpression
            | Expression
            | AssignmentExpression
            | ConditionalExpression
            | ConditionalOrExpression
            | ConditionalAndExpression
            | InclusiveOrExpression
            | ExclusiveOrExpression
            | AndExpression
            | EqualityExpression
            | RelationalExpression
            | AdditiveExpression
            | MultiplicativeExpression
            | UnaryExpression
            | UnaryNotPlusMinusExpression
            | PostfixExpression
            | Primary
            | PrimaryNoNewArray
            | LeftHandSide
            | VariableInitializer
            | Modifier
            | AssignmentOperator
            | Literal
            | Type
            | ExpressionOpt
            | ForInit
            | ForUpdate
            | DmlOperation
    )
}

/// Left-recursive list kinds, flattened into a single node.
fn is_list(kind: SyntaxKind) -> bool {
    use SyntaxKind::*;
    matches!(
        kind,
        QualifiedName
            | Modifiers
            | ClassBodyDeclarations
            | BlockStatements
            | VariableDeclarators
            | FormalParameterList
            | ArgumentList
            | TypeList
            | ClassTypeList
            | EnumConstantList
            | CollectionItemList
            | AccessorDeclarations
            | InterfaceMemberDeclarations
            | Catches
            | AnnotationPairs
            | StatementExpressionList
    )
}

/// A node that stands for no source text: an empty reduction.
fn is_empty_node(node: &SyntaxNode) -> bool {
    !node.kind().is_terminal() && node.is_leaf()
}

/// First-to-last span over the children that cover source text, or
/// `fallback` when none do. Leading empty reductions (a missing modifier
/// list) would otherwise pull the start back to the previous token.
fn covering_span(children: &[SyntaxNode], fallback: Span) -> Span {
    let mut covered = children.iter().filter(|c| !is_empty_node(c));
    match (covered.next(), children.iter().rev().find(|c| !is_empty_node(c))) {
        (Some(first), Some(last)) => first.span().merge(&last.span()),
        _ => fallback,
    }
}

fn build_node(kind: SyntaxKind, children: Vec<SyntaxNode>, span: Span) -> SyntaxNode {
    let children = if is_list(kind) && children.first().is_some_and(|c| c.kind() == kind) {
        let mut iter = children.into_iter();
        let mut flat = iter.next().map(SyntaxNode::into_children).unwrap_or_default();
        flat.extend(iter);
        flat
    } else {
        children
    };
    let span = covering_span(&children, span);
    SyntaxNode::branch(kind, span, children)
}

// ──────────────────────────────────────────────
// Node accessors
// ──────────────────────────────────────────────

fn require(node: &SyntaxNode, expected: SyntaxKind) -> Result<&SyntaxNode, ContractError> {
    node.child(expected).ok_or(ContractError::MissingChild {
        parent: node.kind(),
        expected,
        span: node.span(),
    })
}

fn identifier(node: &SyntaxNode) -> Result<(String, Span), ContractError> {
    let ident = require(node, SyntaxKind::Identifier)?;
    Ok((ident.display_text().to_owned(), ident.span()))
}

/// The declared type child of a declaration node.
fn declared_type(node: &SyntaxNode) -> Result<&SyntaxNode, ContractError> {
    node.children()
        .iter()
        .find(|c| matches!(c.kind(), SyntaxKind::ClassType | SyntaxKind::ArrayType))
        .ok_or(ContractError::MissingType {
            kind: node.kind(),
            span: node.span(),
        })
}

/// Declared return type, `void` included.
fn return_type(node: &SyntaxNode) -> Result<String, ContractError> {
    if node.child(SyntaxKind::VoidKw).is_some() {
        return Ok("void".to_owned());
    }
    Ok(declared_type(node)?.leaf_text())
}

#[derive(Debug, Clone, Copy, Default)]
struct ModifierSet {
    visibility: Visibility,
    is_static: bool,
}

/// `private` or `protected` anywhere makes the member private; otherwise
/// `global` beats `public`. No visibility keyword means private.
fn modifiers(node: &SyntaxNode) -> Result<ModifierSet, ContractError> {
    let list = require(node, SyntaxKind::Modifiers)?;
    let mut set = ModifierSet::default();
    let (mut private, mut public, mut global) = (false, false, false);
    for modifier in list.children() {
        match modifier.kind() {
            SyntaxKind::PublicKw => public = true,
            SyntaxKind::GlobalKw => global = true,
            SyntaxKind::PrivateKw | SyntaxKind::ProtectedKw => private = true,
            SyntaxKind::StaticKw => set.is_static = true,
            _ => {}
        }
    }
    set.visibility = if private {
        Visibility::Private
    } else if global {
        Visibility::Global
    } else if public {
        Visibility::Public
    } else {
        Visibility::default()
    };
    Ok(set)
}

fn parameters(node: &SyntaxNode) -> Result<Vec<(Parameter, Span)>, ContractError> {
    let params = require(node, SyntaxKind::FormalParameters)?;
    params
        .find_all(SyntaxKind::FormalParameter)
        .into_iter()
        .map(|param| {
            let (name, span) = identifier(param)?;
            let type_name = declared_type(param)?.leaf_text();
            Ok((Parameter { name, type_name }, span))
        })
        .collect()
}

fn parameter_symbols(params: &[(Parameter, Span)]) -> Vec<Symbol> {
    params
        .iter()
        .map(|(p, span)| Symbol {
            location: span.start(),
            name: p.name.clone(),
            type_name: Some(p.type_name.clone()),
        })
        .collect()
}

/// `(name, span)` of every declarator in a `VariableDeclarators` child.
fn declarators(node: &SyntaxNode) -> Result<Vec<(String, Span)>, ContractError> {
    require(node, SyntaxKind::VariableDeclarators)?
        .children()
        .iter()
        .filter(|c| c.kind() == SyntaxKind::VariableDeclarator)
        .map(identifier)
        .collect()
}

/// The dotted name at the root of a type, if the node is one.
fn type_root(node: &SyntaxNode) -> Option<&SyntaxNode> {
    match node.kind() {
        SyntaxKind::QualifiedName => Some(node),
        SyntaxKind::GenericType => node.child(SyntaxKind::QualifiedName),
        _ => None,
    }
}

// ──────────────────────────────────────────────
// Factory
// ──────────────────────────────────────────────

/// Builds the syntax tree and symbol tables for one compilation unit.
#[derive(Debug, Default)]
pub struct SemanticFactory {
    pending: PendingDeclarations,
    error: Option<ContractError>,
}

impl SemanticFactory {
    pub fn new() -> Self {
        SemanticFactory::default()
    }

    /// The outermost symbol table, type references in source order, and the
    /// contract violation that stopped the parse, if any.
    pub fn finish(self) -> (Option<SymbolTable>, Vec<TypeReference>, Option<ContractError>) {
        let (table, references) = self.pending.finish();
        (table, references, self.error)
    }

    fn reference(&mut self, name_node: &SyntaxNode) {
        self.pending
            .add_type_reference(name_node.leaf_text(), name_node.span().start());
    }

    fn declare(&mut self, node: &SyntaxNode) -> Result<(), ContractError> {
        use SyntaxKind::*;
        match node.kind() {
            ClassType | ArrayType => {
                if let Some(root) = node.children().first().and_then(type_root) {
                    self.reference(root);
                }
            }
            CastExpression => self.declare_cast(node),
            FieldDeclaration => self.declare_field(node)?,
            PropertyDeclaration => self.declare_property(node)?,
            MethodDeclaration => self.declare_method(node)?,
            InterfaceMethodDeclaration => self.declare_interface_method(node)?,
            ConstructorDeclaration => self.declare_constructor(node)?,
            InitializerBlock => {
                let block = require(node, Block)?;
                self.pending.close_scope(block.span(), Vec::new());
            }
            LocalVariableDeclaration => {
                let type_name = declared_type(node)?.leaf_text();
                for (name, span) in declarators(node)? {
                    self.pending.push_local(Symbol {
                        location: span.start(),
                        name,
                        type_name: Some(type_name.clone()),
                    });
                }
            }
            ForEachHeader => {
                let (name, span) = identifier(node)?;
                let type_name = declared_type(node)?.leaf_text();
                self.pending.push_local(Symbol {
                    location: span.start(),
                    name,
                    type_name: Some(type_name),
                });
            }
            CatchHeader => {
                let param = require(node, FormalParameter)?;
                let (name, span) = identifier(param)?;
                let type_name = declared_type(param)?.leaf_text();
                self.pending.push_local(Symbol {
                    location: span.start(),
                    name,
                    type_name: Some(type_name),
                });
            }
            ClassDeclaration => self.declare_class(node)?,
            InterfaceDeclaration => self.declare_interface(node)?,
            EnumDeclaration => self.declare_enum(node)?,
            _ => {}
        }
        Ok(())
    }

    /// `(Foo) x`, `(Foo[]) x` and `(List<Foo>) x`. The parenthesized form is
    /// only a type when the expression is a bare name.
    fn declare_cast(&mut self, node: &SyntaxNode) {
        let Some(inner) = node.children().get(1) else {
            return;
        };
        if inner.kind() == SyntaxKind::QualifiedName {
            self.reference(inner);
        }
    }

    fn declare_field(&mut self, node: &SyntaxNode) -> Result<(), ContractError> {
        let mods = modifiers(node)?;
        let type_name = declared_type(node)?.leaf_text();
        for (name, span) in declarators(node)? {
            self.pending.push_field(Field {
                location: span.start(),
                name,
                type_name: type_name.clone(),
                visibility: mods.visibility,
                is_static: mods.is_static,
            });
        }
        Ok(())
    }

    fn declare_property(&mut self, node: &SyntaxNode) -> Result<(), ContractError> {
        let mods = modifiers(node)?;
        let type_name = declared_type(node)?.leaf_text();
        let (name, span) = identifier(node)?;
        let accessors = require(node, SyntaxKind::AccessorDeclarations)?;
        let mut property = Property {
            location: span.start(),
            name,
            type_name,
            visibility: mods.visibility,
            is_static: mods.is_static,
            ..Default::default()
        };
        for accessor in accessors.children() {
            let (word, _) = identifier(accessor)?;
            if word.eq_ignore_ascii_case("get") {
                property.has_getter = true;
            } else if word.eq_ignore_ascii_case("set") {
                property.has_setter = true;
            } else {
                trace!(accessor = %word, "ignoring unknown accessor");
            }
        }
        self.pending.close_scope(node.span(), Vec::new());
        self.pending.push_property(property);
        Ok(())
    }

    fn declare_method(&mut self, node: &SyntaxNode) -> Result<(), ContractError> {
        let header = require(node, SyntaxKind::MethodHeader)?;
        let body = require(node, SyntaxKind::MethodBody)?;
        let mods = modifiers(header)?;
        let (name, span) = identifier(header)?;
        let params = parameters(header)?;
        if let Some(block) = body.child(SyntaxKind::Block) {
            self.pending
                .close_scope(block.span(), parameter_symbols(&params));
        }
        self.pending.push_method(Method {
            location: span.start(),
            name,
            return_type: return_type(header)?,
            visibility: mods.visibility,
            is_static: mods.is_static,
            parameters: params.into_iter().map(|(p, _)| p).collect(),
            span: node.span(),
        });
        Ok(())
    }

    fn declare_interface_method(&mut self, node: &SyntaxNode) -> Result<(), ContractError> {
        if node.child(SyntaxKind::Error).is_some() {
            return Ok(());
        }
        let mods = modifiers(node)?;
        let (name, span) = identifier(node)?;
        let params = parameters(node)?;
        self.pending.push_method(Method {
            location: span.start(),
            name,
            return_type: return_type(node)?,
            visibility: Visibility::Public,
            is_static: mods.is_static,
            parameters: params.into_iter().map(|(p, _)| p).collect(),
            span: node.span(),
        });
        Ok(())
    }

    fn declare_constructor(&mut self, node: &SyntaxNode) -> Result<(), ContractError> {
        let mods = modifiers(node)?;
        let (name, span) = identifier(node)?;
        let params = parameters(node)?;
        let block = require(node, SyntaxKind::Block)?;
        self.pending
            .close_scope(block.span(), parameter_symbols(&params));
        self.pending.push_constructor(Constructor {
            location: span.start(),
            name,
            visibility: mods.visibility,
            parameters: params.into_iter().map(|(p, _)| p).collect(),
            span: node.span(),
        });
        Ok(())
    }

    fn new_table(node: &SyntaxNode, kind: TypeKind) -> Result<SymbolTable, ContractError> {
        let mods = modifiers(node)?;
        let (name, span) = identifier(node)?;
        Ok(SymbolTable {
            name,
            kind,
            location: span.start(),
            span: node.span(),
            visibility: mods.visibility,
            ..Default::default()
        })
    }

    fn declare_class(&mut self, node: &SyntaxNode) -> Result<(), ContractError> {
        let mut table = Self::new_table(node, TypeKind::Class)?;
        table.base_class = require(node, SyntaxKind::SuperClass)?
            .child(SyntaxKind::ClassType)
            .map(SyntaxNode::leaf_text);
        table.interfaces = implemented(require(node, SyntaxKind::Interfaces)?);
        trace!(name = %table.name, "class declared");
        self.pending.complete_type(table);
        Ok(())
    }

    fn declare_interface(&mut self, node: &SyntaxNode) -> Result<(), ContractError> {
        let mut table = Self::new_table(node, TypeKind::Interface)?;
        table.interfaces = implemented(require(node, SyntaxKind::InterfaceExtends)?);
        trace!(name = %table.name, "interface declared");
        self.pending.complete_type(table);
        Ok(())
    }

    fn declare_enum(&mut self, node: &SyntaxNode) -> Result<(), ContractError> {
        let table = Self::new_table(node, TypeKind::Enum)?;
        let constants = require(node, SyntaxKind::EnumConstants)?;
        for constant in constants.find_all(SyntaxKind::Identifier) {
            self.pending.push_field(Field {
                location: constant.span().start(),
                name: constant.display_text().to_owned(),
                type_name: table.name.clone(),
                visibility: Visibility::Public,
                is_static: true,
            });
        }
        trace!(name = %table.name, "enum declared");
        self.pending.complete_type(table);
        Ok(())
    }
}

/// Names in an `implements` or interface `extends` clause.
fn implemented(clause: &SyntaxNode) -> Vec<String> {
    clause
        .child(SyntaxKind::ClassTypeList)
        .map(|list| {
            list.children()
                .iter()
                .filter(|c| c.kind() == SyntaxKind::ClassType)
                .map(SyntaxNode::leaf_text)
                .collect()
        })
        .unwrap_or_default()
}

impl ReduceHandler for SemanticFactory {
    type Value = SyntaxNode;

    fn shift(&mut self, token: Token) -> SyntaxNode {
        SyntaxNode::leaf(token.kind, token.span, token.text)
    }

    fn reduce(
        &mut self,
        _rule: usize,
        lhs: SyntaxKind,
        mut children: Vec<SyntaxNode>,
        span: Span,
    ) -> ReduceSignal<SyntaxNode> {
        if children.len() == 1 && is_transparent(lhs) {
            if let Some(node) = children.pop() {
                return ReduceSignal::Continue {
                    span: node.span(),
                    value: node,
                };
            }
        }

        let node = build_node(lhs, children, span);
        if let Err(err) = self.declare(&node) {
            warn!(error = %err, "malformed reduction");
            self.error = Some(err);
            return ReduceSignal::Abort;
        }
        ReduceSignal::Continue {
            span: node.span(),
            value: node,
        }
    }
}
