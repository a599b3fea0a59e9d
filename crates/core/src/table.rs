//! Parse tables consumed by the engine.

use std::collections::HashMap;

use crate::token::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Shift(usize),
    Reduce(usize),
    Accept,
}

/// Left-hand side and length of one grammar rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleInfo {
    pub lhs: SyntaxKind,
    pub len: usize,
}

/// One automaton state. A terminal missing from `actions` is an error unless
/// `default` is set.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub actions: HashMap<SyntaxKind, Action>,
    pub gotos: HashMap<SyntaxKind, usize>,
    /// Taken without consulting the lookahead when `actions` is empty.
    pub default: Option<Action>,
}

impl State {
    pub fn action(&self, terminal: SyntaxKind) -> Option<Action> {
        self.actions.get(&terminal).copied().or(self.default)
    }

    pub fn shifts_error(&self) -> Option<usize> {
        match self.actions.get(&SyntaxKind::Error) {
            Some(Action::Shift(target)) => Some(*target),
            _ => None,
        }
    }

    /// Terminals with an explicit action, in kind order.
    pub fn expected(&self) -> Vec<SyntaxKind> {
        let mut expected: Vec<SyntaxKind> = self
            .actions
            .keys()
            .copied()
            .filter(|k| *k != SyntaxKind::Error)
            .collect();
        expected.sort();
        expected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

/// A table conflict and how it was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: usize,
    pub terminal: SyntaxKind,
    pub kind: ConflictKind,
    pub kept: Action,
    pub dropped: Action,
}

#[derive(Debug, Clone, Default)]
pub struct ParseTable {
    pub states: Vec<State>,
    pub rules: Vec<RuleInfo>,
    pub conflicts: Vec<Conflict>,
}

impl ParseTable {
    pub fn state(&self, id: usize) -> Option<&State> {
        self.states.get(id)
    }

    pub fn rule(&self, id: usize) -> Option<RuleInfo> {
        self.rules.get(id).copied()
    }
}
