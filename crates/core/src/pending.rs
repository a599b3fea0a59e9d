//! Declarations waiting for their enclosing type.
//!
//! Reductions complete inner constructs before outer ones, so members are
//! known before the class that owns them. Each member kind waits on its own
//! stack in source order; when a type declaration is reduced it takes every
//! entry whose location lies inside its span. Because nested types are
//! reduced first, their members are already gone by the time the outer type
//! harvests.

use crate::span::{Span, TextPosition};
use crate::symbols::{
    Constructor, Field, Method, Property, Symbol, SymbolTable, TypeReference, VariableScope,
};

/// Anything with a source location to test for containment.
pub trait Located {
    fn location(&self) -> TextPosition;
}

impl Located for Symbol {
    fn location(&self) -> TextPosition {
        self.location
    }
}

impl Located for Field {
    fn location(&self) -> TextPosition {
        self.location
    }
}

impl Located for Property {
    fn location(&self) -> TextPosition {
        self.location
    }
}

impl Located for Method {
    fn location(&self) -> TextPosition {
        self.location
    }
}

impl Located for Constructor {
    fn location(&self) -> TextPosition {
        self.location
    }
}

impl Located for SymbolTable {
    fn location(&self) -> TextPosition {
        self.location
    }
}

impl Located for VariableScope {
    fn location(&self) -> TextPosition {
        self.span.start()
    }
}

/// A stack kept in source order.
#[derive(Debug)]
pub struct PositionStack<T> {
    items: Vec<T>,
}

impl<T> Default for PositionStack<T> {
    fn default() -> Self {
        PositionStack { items: Vec::new() }
    }
}

impl<T: Located> PositionStack<T> {
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Pop every entry on top whose location lies inside `span`, returned
    /// in source order.
    pub fn harvest(&mut self, span: &Span) -> Vec<T> {
        let mut taken = Vec::new();
        while self
            .items
            .last()
            .is_some_and(|top| span.contains(top.location()))
        {
            if let Some(item) = self.items.pop() {
                taken.push(item);
            }
        }
        taken.reverse();
        taken
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }
}

/// Fields and properties share one stack so they keep their relative order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberVariable {
    Field(Field),
    Property(Property),
}

impl Located for MemberVariable {
    fn location(&self) -> TextPosition {
        match self {
            MemberVariable::Field(f) => f.location,
            MemberVariable::Property(p) => p.location,
        }
    }
}

#[derive(Debug, Default)]
pub struct PendingDeclarations {
    variables: PositionStack<MemberVariable>,
    constructors: PositionStack<Constructor>,
    methods: PositionStack<Method>,
    classes: PositionStack<SymbolTable>,
    locals: PositionStack<Symbol>,
    scopes: PositionStack<VariableScope>,
    type_references: Vec<TypeReference>,
}

impl PendingDeclarations {
    pub fn new() -> Self {
        PendingDeclarations::default()
    }

    pub fn push_field(&mut self, field: Field) {
        self.variables.push(MemberVariable::Field(field));
    }

    pub fn push_property(&mut self, property: Property) {
        self.variables.push(MemberVariable::Property(property));
    }

    pub fn push_method(&mut self, method: Method) {
        self.methods.push(method);
    }

    pub fn push_constructor(&mut self, constructor: Constructor) {
        self.constructors.push(constructor);
    }

    pub fn push_local(&mut self, local: Symbol) {
        self.locals.push(local);
    }

    /// Type references arrive out of order (`Map<K, V>` reduces `K` and `V`
    /// before `Map`) and are sorted in [`finish`](Self::finish).
    pub fn add_type_reference(&mut self, name: String, location: TextPosition) {
        self.type_references.push(TypeReference { location, name });
    }

    /// Close a body: the locals declared inside `span`, after `seed`
    /// (parameters), become one scope.
    pub fn close_scope(&mut self, span: Span, seed: Vec<Symbol>) {
        let mut variables = seed;
        variables.extend(self.locals.harvest(&span));
        self.scopes.push(VariableScope { span, variables });
    }

    /// Attach every pending member inside `table.span` to `table` and put
    /// the finished table on the class stack.
    pub fn complete_type(&mut self, mut table: SymbolTable) {
        let span = table.span;
        table.constructors = self.constructors.harvest(&span);
        for variable in self.variables.harvest(&span) {
            match variable {
                MemberVariable::Field(f) => table.fields.push(f),
                MemberVariable::Property(p) => table.properties.push(p),
            }
        }
        table.methods = self.methods.harvest(&span);
        table.inner_classes = self.classes.harvest(&span);
        table.variable_scopes = self.scopes.harvest(&span);
        self.classes.push(table);
    }

    /// The outermost finished table (if any) and every type reference in
    /// source order.
    pub fn finish(mut self) -> (Option<SymbolTable>, Vec<TypeReference>) {
        let table = self.classes.pop();
        self.type_references
            .sort_by_key(|r| (r.location.line, r.location.column));
        (table, self.type_references)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: u32, column: u32) -> TextPosition {
        TextPosition::new(line, column)
    }

    fn field(name: &str, line: u32) -> Field {
        Field {
            location: at(line, 13),
            name: name.to_owned(),
            type_name: "Integer".to_owned(),
            ..Default::default()
        }
    }

    fn method(name: &str, line: u32) -> Method {
        Method {
            location: at(line, 17),
            name: name.to_owned(),
            return_type: "void".to_owned(),
            span: Span::new(0, 0, line, 5, line, 30),
            ..Default::default()
        }
    }

    fn class(name: &str, start: u32, end: u32) -> SymbolTable {
        SymbolTable {
            name: name.to_owned(),
            location: at(start, 14),
            span: Span::new(0, 0, start, 1, end, 2),
            ..Default::default()
        }
    }

    struct Mark(TextPosition);

    impl Located for Mark {
        fn location(&self) -> TextPosition {
            self.0
        }
    }

    #[test]
    fn harvest_stops_at_first_outside_entry() {
        let mut stack = PositionStack::default();
        for line in [1, 5, 6, 7] {
            stack.push(Mark(at(line, 1)));
        }
        let taken = stack.harvest(&Span::new(0, 0, 4, 1, 8, 1));
        let lines: Vec<u32> = taken.iter().map(|m| m.0.line).collect();
        assert_eq!(lines, vec![5, 6, 7]);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn harvest_with_nothing_inside_takes_nothing() {
        let mut stack = PositionStack::default();
        stack.push(Mark(at(2, 1)));
        assert!(stack.harvest(&Span::new(0, 0, 5, 1, 9, 1)).is_empty());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn nested_type_takes_its_members_first() {
        let mut pending = PendingDeclarations::new();
        pending.push_field(field("outerBefore", 2));
        pending.push_field(field("innerField", 4));
        pending.push_method(method("innerMethod", 5));
        pending.complete_type(class("Inner", 3, 6));
        pending.push_method(method("outerAfter", 8));
        pending.push_property(Property {
            location: at(9, 20),
            name: "label".into(),
            type_name: "String".into(),
            ..Default::default()
        });
        pending.complete_type(class("Outer", 1, 10));

        let (table, _) = pending.finish();
        let outer = table.expect("outer table");
        assert_eq!(outer.name, "Outer");
        assert_eq!(
            outer.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            vec!["outerBefore"]
        );
        assert_eq!(outer.properties.len(), 1);
        assert_eq!(
            outer.methods.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
            vec!["outerAfter"]
        );
        assert_eq!(outer.inner_classes.len(), 1);
        let inner = &outer.inner_classes[0];
        assert_eq!(inner.fields[0].name, "innerField");
        assert_eq!(inner.methods[0].name, "innerMethod");
    }

    #[test]
    fn close_scope_puts_seed_before_locals() {
        let mut pending = PendingDeclarations::new();
        let local = |name: &str, line| Symbol {
            location: at(line, 9),
            name: name.to_owned(),
            type_name: None,
        };
        pending.push_local(local("x", 3));
        pending.push_local(local("y", 4));
        pending.close_scope(Span::new(0, 0, 2, 5, 5, 6), vec![local("param", 2)]);
        pending.complete_type(class("C", 1, 6));
        let (table, _) = pending.finish();
        let scopes = table.map(|t| t.variable_scopes).unwrap_or_default();
        assert_eq!(scopes.len(), 1);
        let names: Vec<&str> = scopes[0].variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["param", "x", "y"]);
    }

    #[test]
    fn type_references_come_back_sorted() {
        let mut pending = PendingDeclarations::new();
        pending.add_type_reference("String".into(), at(1, 5));
        pending.add_type_reference("Integer".into(), at(1, 12));
        pending.add_type_reference("Map".into(), at(1, 1));
        let (table, refs) = pending.finish();
        assert!(table.is_none());
        let names: Vec<&str> = refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Map", "String", "Integer"]);
    }
}
