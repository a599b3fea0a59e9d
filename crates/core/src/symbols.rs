//! Symbol records produced by the semantic factory.
//!
//! Everything here is plain data with serde derives so tables can be cached
//! on disk and shipped as builtins.

use serde::{Deserialize, Serialize};

use crate::span::{Span, TextPosition};

/// Declared visibility. `protected` folds into `Private`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
    Global,
}

impl Visibility {
    /// Visible from outside the declaring type.
    pub fn is_external(self) -> bool {
        matches!(self, Visibility::Public | Visibility::Global)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Enum,
}

/// A named thing at a position: a local variable, parameter or catch
/// variable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Symbol {
    pub location: TextPosition,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Field {
    pub location: TextPosition,
    pub name: String,
    pub type_name: String,
    pub visibility: Visibility,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Property {
    pub location: TextPosition,
    pub name: String,
    pub type_name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub has_getter: bool,
    pub has_setter: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Method {
    pub location: TextPosition,
    pub name: String,
    /// Declared return type, `void` included.
    pub return_type: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub parameters: Vec<Parameter>,
    pub span: Span,
}

impl Method {
    /// `name(Type, Type): Return`, as shown in completion lists.
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self
            .parameters
            .iter()
            .map(|p| p.type_name.as_str())
            .collect();
        format!("{}({}): {}", self.name, params.join(", "), self.return_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Constructor {
    pub location: TextPosition,
    pub name: String,
    pub visibility: Visibility,
    pub parameters: Vec<Parameter>,
    pub span: Span,
}

/// Variables visible inside a method, constructor, property or
/// initializer body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableScope {
    pub span: Span,
    pub variables: Vec<Symbol>,
}

/// One mention of a type name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeReference {
    pub location: TextPosition,
    pub name: String,
}

/// Everything declared by one class, interface or enum.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolTable {
    pub name: String,
    pub kind: TypeKind,
    pub location: TextPosition,
    pub span: Span,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_class: Option<String>,
    pub interfaces: Vec<String>,
    pub constructors: Vec<Constructor>,
    pub fields: Vec<Field>,
    pub properties: Vec<Property>,
    pub methods: Vec<Method>,
    pub inner_classes: Vec<SymbolTable>,
    pub variable_scopes: Vec<VariableScope>,
}

impl SymbolTable {
    pub fn inner_class(&self, name: &str) -> Option<&SymbolTable> {
        self.inner_classes
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Every overload named `name`.
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Method> + 'a {
        self.methods
            .iter()
            .filter(move |m| m.name.eq_ignore_ascii_case(name))
    }

    /// Variables in scope at `position`: those of every scope containing it,
    /// nested classes included, declared at or before `position`.
    pub fn variables_at(&self, position: TextPosition) -> Vec<&Symbol> {
        let mut found = Vec::new();
        self.collect_variables(position, &mut found);
        found
    }

    fn collect_variables<'a>(&'a self, position: TextPosition, found: &mut Vec<&'a Symbol>) {
        for scope in &self.variable_scopes {
            if scope.span.contains(position) {
                found.extend(scope.variables.iter().filter(|v| v.location <= position));
            }
        }
        for inner in &self.inner_classes {
            if inner.span.contains(position) {
                inner.collect_variables(position, found);
            }
        }
    }

    /// Innermost table whose span contains `position`.
    pub fn table_at(&self, position: TextPosition) -> Option<&SymbolTable> {
        if !self.span.contains(position) {
            return None;
        }
        self.inner_classes
            .iter()
            .find_map(|inner| inner.table_at(position))
            .or(Some(self))
    }

    /// Number of tables in this tree, `self` included.
    pub fn table_count(&self) -> usize {
        1 + self
            .inner_classes
            .iter()
            .map(SymbolTable::table_count)
            .sum::<usize>()
    }
}
