//! LALR(1) table construction.
//!
//! States are built from LR(1) item sets whose lookaheads are merged per
//! LR(0) core: when a goto lands on an existing core, the new lookaheads are
//! unioned in and the target state is revisited until nothing changes.
//!
//! Conflicts are settled the usual way: shift beats reduce, and between two
//! reductions the earlier rule wins. Every settled conflict is recorded in
//! [`ParseTable::conflicts`].

use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::debug;

use crate::grammar::Grammar;
use crate::table::{Action, Conflict, ConflictKind, ParseTable, RuleInfo, State};
use crate::token::SyntaxKind;

const TERM_WORDS: usize = (SyntaxKind::TERMINAL_COUNT + 63) / 64;

/// Dense set of terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct TermSet([u64; TERM_WORDS]);

impl TermSet {
    fn insert(&mut self, kind: SyntaxKind) -> bool {
        let (word, bit) = (kind.index() / 64, 1u64 << (kind.index() % 64));
        let fresh = self.0[word] & bit == 0;
        self.0[word] |= bit;
        fresh
    }

    #[cfg(test)]
    fn contains(&self, kind: SyntaxKind) -> bool {
        self.0[kind.index() / 64] & (1u64 << (kind.index() % 64)) != 0
    }

    fn union_with(&mut self, other: &TermSet) -> bool {
        let mut changed = false;
        for (mine, theirs) in self.0.iter_mut().zip(other.0.iter()) {
            let merged = *mine | *theirs;
            changed |= merged != *mine;
            *mine = merged;
        }
        changed
    }

    fn iter(&self) -> impl Iterator<Item = SyntaxKind> + '_ {
        SyntaxKind::TERMINALS
            .iter()
            .copied()
            .filter(move |k| self.0[k.index() / 64] & (1u64 << (k.index() % 64)) != 0)
    }
}

type Item = (usize, usize);

/// A closed item set with per-item lookaheads.
#[derive(Default)]
struct ItemSet {
    items: Vec<Item>,
    lookaheads: Vec<TermSet>,
    index: HashMap<Item, usize>,
}

impl ItemSet {
    fn add(&mut self, item: Item, lookahead: TermSet) -> usize {
        let id = self.items.len();
        self.items.push(item);
        self.lookaheads.push(lookahead);
        self.index.insert(item, id);
        id
    }
}

struct StateBuild {
    kernel: Vec<Item>,
    lookaheads: Vec<TermSet>,
    transitions: BTreeMap<SyntaxKind, usize>,
}

struct Analysis<'g> {
    grammar: &'g Grammar,
    nullable: Vec<bool>,
    first: Vec<TermSet>,
    by_lhs: Vec<Vec<usize>>,
}

impl<'g> Analysis<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let kinds = SyntaxKind::ALL.len();
        let mut by_lhs = vec![Vec::new(); kinds];
        for (id, rule) in grammar.rules().iter().enumerate() {
            by_lhs[rule.lhs.index()].push(id);
        }

        let mut nullable = vec![false; kinds];
        let mut changed = true;
        while changed {
            changed = false;
            for rule in grammar.rules() {
                if !nullable[rule.lhs.index()]
                    && rule
                        .rhs
                        .iter()
                        .all(|s| !s.is_terminal() && nullable[s.index()])
                {
                    nullable[rule.lhs.index()] = true;
                    changed = true;
                }
            }
        }

        let mut first = vec![TermSet::default(); kinds];
        let mut changed = true;
        while changed {
            changed = false;
            for rule in grammar.rules() {
                let mut acc = first[rule.lhs.index()];
                for &sym in &rule.rhs {
                    if sym.is_terminal() {
                        acc.insert(sym);
                        break;
                    }
                    acc.union_with(&first[sym.index()]);
                    if !nullable[sym.index()] {
                        break;
                    }
                }
                changed |= first[rule.lhs.index()].union_with(&acc);
            }
        }

        Analysis {
            grammar,
            nullable,
            first,
            by_lhs,
        }
    }

    /// FIRST of `seq` followed by anything in `follow`.
    fn first_of_sequence(&self, seq: &[SyntaxKind], follow: &TermSet) -> TermSet {
        let mut out = TermSet::default();
        for &sym in seq {
            if sym.is_terminal() {
                out.insert(sym);
                return out;
            }
            out.union_with(&self.first[sym.index()]);
            if !self.nullable[sym.index()] {
                return out;
            }
        }
        out.union_with(follow);
        out
    }

    fn closure(&self, kernel: &[Item], lookaheads: &[TermSet]) -> ItemSet {
        let rules = self.grammar.rules();
        let mut set = ItemSet::default();
        let mut work = Vec::new();
        for (item, la) in kernel.iter().zip(lookaheads) {
            work.push(set.add(*item, *la));
        }

        while let Some(i) = work.pop() {
            let (rule, dot) = set.items[i];
            let rhs = &rules[rule].rhs;
            let Some(&next) = rhs.get(dot) else {
                continue;
            };
            if next.is_terminal() {
                continue;
            }
            let la = self.first_of_sequence(&rhs[dot + 1..], &set.lookaheads[i]);
            for &r in &self.by_lhs[next.index()] {
                match set.index.get(&(r, 0)).copied() {
                    Some(j) => {
                        if set.lookaheads[j].union_with(&la) {
                            work.push(j);
                        }
                    }
                    None => work.push(set.add((r, 0), la)),
                }
            }
        }
        set
    }
}

/// Build the LALR(1) table for `grammar`. Rule 0 must be the augmented
/// start rule `Accept -> start Eof`.
pub fn build(grammar: &Grammar) -> ParseTable {
    let analysis = Analysis::new(grammar);
    let rules = grammar.rules();

    let mut states = vec![StateBuild {
        kernel: vec![(0, 0)],
        lookaheads: vec![TermSet::default()],
        transitions: BTreeMap::new(),
    }];
    let mut by_kernel: HashMap<Vec<Item>, usize> = HashMap::new();
    by_kernel.insert(vec![(0, 0)], 0);
    let mut queued = vec![true];
    let mut work = VecDeque::from([0usize]);

    while let Some(s) = work.pop_front() {
        queued[s] = false;
        let set = analysis.closure(&states[s].kernel, &states[s].lookaheads);

        let mut groups: BTreeMap<SyntaxKind, Vec<(Item, TermSet)>> = BTreeMap::new();
        for (i, &(rule, dot)) in set.items.iter().enumerate() {
            let Some(&next) = rules[rule].rhs.get(dot) else {
                continue;
            };
            // the end marker is never shifted; the state before it accepts
            if rule == 0 && next == SyntaxKind::Eof {
                continue;
            }
            groups
                .entry(next)
                .or_default()
                .push(((rule, dot + 1), set.lookaheads[i]));
        }

        for (symbol, mut items) in groups {
            items.sort_by_key(|(item, _)| *item);
            let kernel: Vec<Item> = items.iter().map(|(item, _)| *item).collect();
            let lookaheads: Vec<TermSet> = items.iter().map(|(_, la)| *la).collect();

            let target = match by_kernel.get(&kernel).copied() {
                Some(t) => {
                    let mut changed = false;
                    for (dst, src) in states[t].lookaheads.iter_mut().zip(&lookaheads) {
                        changed |= dst.union_with(src);
                    }
                    if changed && !queued[t] {
                        queued[t] = true;
                        work.push_back(t);
                    }
                    t
                }
                None => {
                    let t = states.len();
                    states.push(StateBuild {
                        kernel: kernel.clone(),
                        lookaheads,
                        transitions: BTreeMap::new(),
                    });
                    by_kernel.insert(kernel, t);
                    queued.push(true);
                    work.push_back(t);
                    t
                }
            };
            states[s].transitions.insert(symbol, target);
        }
    }

    let mut conflicts = Vec::new();
    let mut table_states = Vec::with_capacity(states.len());
    for (id, build) in states.iter().enumerate() {
        let set = analysis.closure(&build.kernel, &build.lookaheads);
        let mut state = State::default();

        for (&symbol, &target) in &build.transitions {
            if symbol.is_terminal() {
                state.actions.insert(symbol, Action::Shift(target));
            } else {
                state.gotos.insert(symbol, target);
            }
        }

        for (i, &(rule, dot)) in set.items.iter().enumerate() {
            if rule == 0 {
                if dot == 1 {
                    state.actions.insert(SyntaxKind::Eof, Action::Accept);
                }
                continue;
            }
            if dot < rules[rule].rhs.len() {
                continue;
            }
            for terminal in set.lookaheads[i].iter() {
                add_reduce(&mut state, id, terminal, rule, &mut conflicts);
            }
        }

        compress_default(&mut state);
        table_states.push(state);
    }

    let table = ParseTable {
        states: table_states,
        rules: rules
            .iter()
            .map(|r| RuleInfo {
                lhs: r.lhs,
                len: r.rhs.len(),
            })
            .collect(),
        conflicts,
    };
    debug!(
        states = table.states.len(),
        rules = table.rules.len(),
        conflicts = table.conflicts.len(),
        "built LALR(1) table"
    );
    table
}

fn add_reduce(
    state: &mut State,
    id: usize,
    terminal: SyntaxKind,
    rule: usize,
    conflicts: &mut Vec<Conflict>,
) {
    let reduce = Action::Reduce(rule);
    let (kept, dropped, kind) = match state.actions.get(&terminal).copied() {
        None => {
            state.actions.insert(terminal, reduce);
            return;
        }
        Some(Action::Reduce(other)) if other == rule => return,
        Some(Action::Reduce(other)) => {
            let (kept, dropped) = if other < rule {
                (Action::Reduce(other), reduce)
            } else {
                (reduce, Action::Reduce(other))
            };
            state.actions.insert(terminal, kept);
            (kept, dropped, ConflictKind::ReduceReduce)
        }
        Some(existing) => (existing, reduce, ConflictKind::ShiftReduce),
    };
    debug!(state = id, ?terminal, ?kind, ?kept, ?dropped, "resolved conflict");
    conflicts.push(Conflict {
        state: id,
        terminal,
        kind,
        kept,
        dropped,
    });
}

/// A state whose every action reduces by the same rule reduces without
/// looking at the next token.
fn compress_default(state: &mut State) {
    let mut actions = state.actions.values();
    let Some(&first) = actions.next() else {
        return;
    };
    if matches!(first, Action::Reduce(_)) && actions.all(|a| *a == first) {
        state.actions.clear();
        state.default = Some(first);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SyntaxKind::*;

    /// E -> E + T | T ; T -> T * F | F ; F -> ( E ) | int
    fn arithmetic() -> Grammar {
        let mut g = Grammar::new(AdditiveExpression);
        g.rule(AdditiveExpression, &[AdditiveExpression, Plus, MultiplicativeExpression]);
        g.rule(AdditiveExpression, &[MultiplicativeExpression]);
        g.rule(MultiplicativeExpression, &[MultiplicativeExpression, Star, Primary]);
        g.rule(MultiplicativeExpression, &[Primary]);
        g.rule(Primary, &[LParen, AdditiveExpression, RParen]);
        g.rule(Primary, &[IntegerLiteral]);
        g
    }

    #[test]
    fn arithmetic_grammar_is_conflict_free() {
        let table = build(&arithmetic());
        assert!(table.conflicts.is_empty(), "{:?}", table.conflicts);
        assert_eq!(table.rules.len(), 7);
        assert_eq!(table.rules[1].len, 3);
        let start = &table.states[0];
        assert!(matches!(start.actions.get(&IntegerLiteral), Some(Action::Shift(_))));
        assert!(matches!(start.actions.get(&LParen), Some(Action::Shift(_))));
        assert!(start.gotos.contains_key(&AdditiveExpression));
        assert!(table
            .states
            .iter()
            .any(|s| s.actions.get(&Eof) == Some(&Action::Accept)));
    }

    #[test]
    fn dangling_else_prefers_shift() {
        let mut g = Grammar::new(Statement);
        g.rule(Statement, &[IfKw, Statement]);
        g.rule(Statement, &[IfKw, Statement, ElseKw, Statement]);
        g.rule(Statement, &[Identifier]);
        let table = build(&g);
        assert_eq!(table.conflicts.len(), 1);
        let c = &table.conflicts[0];
        assert_eq!(c.kind, ConflictKind::ShiftReduce);
        assert_eq!(c.terminal, ElseKw);
        assert!(matches!(c.kept, Action::Shift(_)));
        assert_eq!(c.dropped, Action::Reduce(1));
    }

    #[test]
    fn reduce_reduce_keeps_earlier_rule() {
        let mut g = Grammar::new(Statement);
        g.rule(Statement, &[Expression]);
        g.rule(Statement, &[Type]);
        let early = g.rule(Expression, &[Identifier]);
        let late = g.rule(Type, &[Identifier]);
        let table = build(&g);
        assert_eq!(table.conflicts.len(), 1);
        let c = &table.conflicts[0];
        assert_eq!(c.kind, ConflictKind::ReduceReduce);
        assert_eq!(c.kept, Action::Reduce(early));
        assert_eq!(c.dropped, Action::Reduce(late));
        // the only action left is a reduction, so it became the default
        assert_eq!(table.states[c.state].default, Some(Action::Reduce(early)));
        assert!(table.states[c.state].actions.is_empty());
    }

    #[test]
    fn nullable_and_first_sets() {
        let mut g = Grammar::new(ClassDeclaration);
        g.rule(ClassDeclaration, &[Modifiers, ClassKw, Identifier]);
        g.rule(Modifiers, &[]);
        g.rule(Modifiers, &[Modifiers, Modifier]);
        g.rule(Modifier, &[PublicKw]);
        g.rule(Modifier, &[StaticKw]);
        let a = Analysis::new(&g);
        assert!(a.nullable[Modifiers.index()]);
        assert!(!a.nullable[ClassDeclaration.index()]);

        let first = a.first[ClassDeclaration.index()];
        assert!(first.contains(PublicKw));
        assert!(first.contains(StaticKw));
        assert!(first.contains(ClassKw));
        assert!(!first.contains(Identifier));

        let mut follow = TermSet::default();
        follow.insert(Eof);
        let seq = a.first_of_sequence(&[Modifiers], &follow);
        assert!(seq.contains(Eof));
        assert!(seq.contains(PublicKw));
    }

    #[test]
    fn empty_rule_state_uses_default_reduction() {
        let mut g = Grammar::new(Block);
        g.rule(Block, &[LBrace, BlockStatements, RBrace]);
        g.rule(BlockStatements, &[]);
        let table = build(&g);
        assert!(table.conflicts.is_empty());
        let after_brace = match table.states[0].actions.get(&LBrace) {
            Some(Action::Shift(t)) => *t,
            other => panic!("expected shift on '{{', got {other:?}"),
        };
        assert_eq!(table.states[after_brace].default, Some(Action::Reduce(2)));
    }
}
