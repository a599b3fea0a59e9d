//! Table-driven shift-reduce parser.
//!
//! The engine knows nothing about Apex: it pulls tokens from a
//! [`TokenSource`], follows a [`ParseTable`], and hands every shift and
//! reduction to a [`ReduceHandler`] that builds whatever values it likes.

use tracing::trace;

use crate::error::{Diagnostic, ErrorSink};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::table::{Action, ParseTable};
use crate::token::{SyntaxKind, Token};

/// Error recovery ends after this many tokens are shifted without a new
/// error.
pub const RECOVERY_SHIFTS: usize = 5;

/// Expected-token lists longer than this are left out of diagnostics.
pub const MAX_EXPECTED_LISTED: usize = 5;

pub trait TokenSource {
    /// Next token; `Eof` once input is exhausted, repeatedly.
    fn next_token(&mut self) -> Token;
}

impl<S: ErrorSink> TokenSource for Lexer<'_, S> {
    fn next_token(&mut self) -> Token {
        Lexer::next_token(self)
    }
}

/// What a reduction callback wants the engine to do next.
#[derive(Debug)]
pub enum ReduceSignal<V> {
    /// Push `value` with `span` and continue.
    Continue { value: V, span: Span },
    /// Stop successfully with `value`.
    Accept(V),
    /// Stop without a result.
    Abort,
}

pub trait ReduceHandler {
    type Value;

    fn shift(&mut self, token: Token) -> Self::Value;

    /// Called for every reduction by `rule`. `span` is the default span:
    /// the child's span for one child, first-to-last for several, and the
    /// gap between the previous and next token for none.
    fn reduce(
        &mut self,
        rule: usize,
        lhs: SyntaxKind,
        children: Vec<Self::Value>,
        span: Span,
    ) -> ReduceSignal<Self::Value>;
}

#[derive(Debug)]
pub struct ParseOutcome<V> {
    pub value: Option<V>,
    /// True when the input was accepted, possibly after recovering from
    /// errors.
    pub accepted: bool,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Engine<'t> {
    table: &'t ParseTable,
}

struct Run<'e, 't, T: TokenSource, H: ReduceHandler> {
    table: &'t ParseTable,
    source: &'e mut T,
    handler: &'e mut H,
    states: Vec<usize>,
    values: Vec<(H::Value, Span)>,
    lookahead: Option<Token>,
    last_end: Span,
    recovering: bool,
    shifted_since_error: usize,
    diagnostics: Vec<Diagnostic>,
}

enum Step<V> {
    Next,
    Done(Option<V>, bool),
}

impl<'t> Engine<'t> {
    pub fn new(table: &'t ParseTable) -> Self {
        Engine { table }
    }

    pub fn parse<T, H>(&self, source: &mut T, handler: &mut H) -> ParseOutcome<H::Value>
    where
        T: TokenSource,
        H: ReduceHandler,
    {
        let mut run = Run {
            table: self.table,
            source,
            handler,
            states: vec![0],
            values: Vec::new(),
            lookahead: None,
            last_end: Span::default(),
            recovering: false,
            shifted_since_error: 0,
            diagnostics: Vec::new(),
        };
        loop {
            if let Step::Done(value, accepted) = run.step() {
                return ParseOutcome {
                    value,
                    accepted,
                    diagnostics: run.diagnostics,
                };
            }
        }
    }
}

impl<T: TokenSource, H: ReduceHandler> Run<'_, '_, T, H> {
    fn peek(&mut self) -> &Token {
        let source = &mut *self.source;
        self.lookahead.get_or_insert_with(|| source.next_token())
    }

    fn take_lookahead(&mut self) -> Token {
        match self.lookahead.take() {
            Some(token) => token,
            None => self.source.next_token(),
        }
    }

    fn top(&self) -> usize {
        self.states.last().copied().unwrap_or(0)
    }

    fn step(&mut self) -> Step<H::Value> {
        let table = self.table;
        let Some(state) = table.state(self.top()) else {
            return self.internal_abort(format!("parse state {} does not exist", self.top()));
        };

        // default reductions do not need the next token
        let action = if state.actions.is_empty() {
            state.default
        } else {
            let kind = self.peek().kind;
            state.action(kind)
        };

        match action {
            Some(Action::Shift(target)) => {
                let token = self.take_lookahead();
                self.shift(token, target);
                Step::Next
            }
            Some(Action::Reduce(rule)) => self.reduce(rule),
            Some(Action::Accept) => {
                let value = self.values.pop().map(|(v, _)| v);
                Step::Done(value, true)
            }
            None => self.recover(),
        }
    }

    fn shift(&mut self, token: Token, target: usize) {
        let span = token.span;
        self.last_end = span.end_point();
        let value = self.handler.shift(token);
        self.values.push((value, span));
        self.states.push(target);
        if self.recovering {
            self.shifted_since_error += 1;
            if self.shifted_since_error >= RECOVERY_SHIFTS {
                trace!("recovery complete");
                self.recovering = false;
            }
        }
    }

    fn reduce(&mut self, rule: usize) -> Step<H::Value> {
        let Some(info) = self.table.rule(rule) else {
            return self.internal_abort(format!("rule {rule} does not exist"));
        };
        if info.len > self.values.len() {
            return self.internal_abort(format!(
                "rule {rule} pops {} values from a stack of {}",
                info.len,
                self.values.len()
            ));
        }

        let base = self.values.len() - info.len;
        let span = match info.len {
            0 => {
                let next = self.peek().span.start_point();
                self.last_end.merge(&next)
            }
            1 => self.values[base].1,
            _ => self.values[base].1.merge(&self.values[self.values.len() - 1].1),
        };
        let children: Vec<H::Value> = self.values.drain(base..).map(|(v, _)| v).collect();
        self.states.truncate(self.states.len() - info.len);

        match self.handler.reduce(rule, info.lhs, children, span) {
            ReduceSignal::Continue { value, span } => {
                let goto = self
                    .table
                    .state(self.top())
                    .and_then(|s| s.gotos.get(&info.lhs).copied());
                match goto {
                    Some(target) => {
                        self.values.push((value, span));
                        self.states.push(target);
                        Step::Next
                    }
                    None => self.internal_abort(format!(
                        "no goto on {:?} from state {}",
                        info.lhs,
                        self.top()
                    )),
                }
            }
            ReduceSignal::Accept(value) => Step::Done(Some(value), true),
            ReduceSignal::Abort => Step::Done(None, false),
        }
    }

    fn recover(&mut self) -> Step<H::Value> {
        let token = self.take_lookahead();

        if self.recovering && self.shifted_since_error == 0 {
            // still inside the stretch that caused the last error
            if token.is_eof() {
                return Step::Done(None, false);
            }
            trace!(token = %token.describe(), "discarding token");
            return Step::Next;
        }

        if !self.recovering {
            let message = self.unexpected_message(&token);
            self.diagnostics.push(Diagnostic::syntax(message, token.span));
        }

        let target = loop {
            let state = self.table.state(self.top());
            if let Some(target) = state.and_then(|s| s.shifts_error()) {
                break target;
            }
            if self.states.len() <= 1 {
                trace!("no state accepts an error token");
                return Step::Done(None, false);
            }
            self.states.pop();
            self.values.pop();
        };

        self.recovering = false;
        self.shift(Token::error(token.span.start_point()), target);

        let mut token = token;
        loop {
            let has_action = self
                .table
                .state(target)
                .is_some_and(|s| s.default.is_some() || s.actions.contains_key(&token.kind));
            if has_action {
                break;
            }
            if token.is_eof() {
                return Step::Done(None, false);
            }
            trace!(token = %token.describe(), "discarding token");
            token = self.source.next_token();
        }

        self.lookahead = Some(token);
        self.recovering = true;
        self.shifted_since_error = 0;
        Step::Next
    }

    fn unexpected_message(&self, token: &Token) -> String {
        let expected = self
            .table
            .state(self.top())
            .map(|s| s.expected())
            .unwrap_or_default();
        let mut message = format!("unexpected {}", token.describe());
        if !expected.is_empty() && expected.len() <= MAX_EXPECTED_LISTED {
            let names: Vec<String> = expected.iter().map(|k| k.describe()).collect();
            message.push_str(", expected ");
            if names.len() == 1 {
                message.push_str(&names[0]);
            } else {
                message.push_str("one of ");
                message.push_str(&names.join(", "));
            }
        }
        message
    }

    fn internal_abort(&mut self, message: String) -> Step<H::Value> {
        let span = self.last_end;
        self.diagnostics.push(Diagnostic::internal(message, span));
        Step::Done(None, false)
    }
}
