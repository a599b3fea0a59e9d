//! Apex lexer.
//!
//! Multi-character constructs (whitespace runs, comments, string and query
//! literals) are scanned inside a *frame*: entering the construct pushes a
//! frame, every character scanned while it is open is appended to its text,
//! and leaving pops it and yields one token covering the whole construct.
//! Frames nest; a string inside a query literal is scanned in a discarded
//! frame on top of the query's.
//!
//! `>>` and `>>>` are scanned as one lexeme but produced as independent `>`
//! tokens so the parser can close nested type arguments. The extra tokens wait
//! in a FIFO queue that `next_token` drains before scanning again.

use std::collections::VecDeque;

use tracing::trace;

use crate::error::{Diagnostic, ErrorSink};
use crate::span::Span;
use crate::token::{SyntaxKind, Token};

/// Lexer construction flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexerOptions {
    /// Surface whitespace and comment tokens instead of discarding them.
    pub include_trivia: bool,
}

impl LexerOptions {
    pub fn with_trivia() -> Self {
        LexerOptions {
            include_trivia: true,
        }
    }
}

/// An open multi-character construct.
#[derive(Debug)]
struct Frame {
    kind: SyntaxKind,
    start: Mark,
    text: String,
    discard: bool,
}

/// Scan cursor snapshot. `column` is 0-based.
#[derive(Debug, Clone, Copy)]
struct Mark {
    offset: usize,
    line: u32,
    column: u32,
}

pub struct Lexer<'src, S: ErrorSink = Vec<Diagnostic>> {
    src: &'src str,
    pos: usize,
    line: u32,
    column: u32,
    options: LexerOptions,
    frames: Vec<Frame>,
    pending: VecDeque<Token>,
    sink: S,
}

impl<'src> Lexer<'src, Vec<Diagnostic>> {
    pub fn new(src: &'src str, options: LexerOptions) -> Self {
        Lexer::with_sink(src, options, Vec::new())
    }
}

impl<'src, S: ErrorSink> Lexer<'src, S> {
    pub fn with_sink(src: &'src str, options: LexerOptions, sink: S) -> Self {
        Lexer {
            src,
            pos: 0,
            line: 1,
            column: 0,
            options,
            frames: Vec::new(),
            pending: VecDeque::new(),
            sink,
        }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Next token in source order. Returns `Eof` forever once the input is
    /// exhausted.
    pub fn next_token(&mut self) -> Token {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return token;
            }
            let Some(c) = self.peek() else {
                return Token::new(
                    SyntaxKind::Eof,
                    Span::point(self.pos, self.line, self.column + 1),
                    None,
                );
            };

            let scanned = match c {
                c if c.is_whitespace() => self.scan_whitespace(),
                '/' if self.peek_at(1) == Some('/') => self.scan_line_comment(),
                '/' if self.peek_at(1) == Some('*') => self.scan_block_comment(),
                '\'' => self.scan_string(false),
                '[' if self.query_follows() => self.scan_query(),
                c if c.is_ascii_alphabetic() || c == '_' => Some(self.scan_word()),
                c if c.is_ascii_digit() => Some(self.scan_number()),
                _ => self.scan_operator(),
            };
            if let Some(token) = scanned {
                return token;
            }
        }
    }

    // ──────────────────────────────────────────────
    // Cursor
    // ──────────────────────────────────────────────

    fn rest(&self) -> &'src str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn mark(&self) -> Mark {
        Mark {
            offset: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    /// Consume one character, appending it to every open frame.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        for frame in &mut self.frames {
            frame.text.push(c);
        }
        Some(c)
    }

    fn span_from(&self, start: Mark) -> Span {
        Span::new(
            start.offset,
            self.pos,
            start.line,
            start.column + 1,
            self.line,
            self.column + 1,
        )
    }

    fn report(&mut self, message: impl Into<String>, span: Span) {
        self.sink.report(Diagnostic::lexical(message, span));
    }

    // ──────────────────────────────────────────────
    // Frames
    // ──────────────────────────────────────────────

    fn enter(&mut self, kind: SyntaxKind, discard: bool) {
        self.frames.push(Frame {
            kind,
            start: self.mark(),
            text: String::new(),
            discard,
        });
    }

    fn leave(&mut self) -> Option<Token> {
        let frame = self.frames.pop()?;
        if frame.discard {
            return None;
        }
        Some(Token::new(
            frame.kind,
            self.span_from(frame.start),
            Some(frame.text),
        ))
    }

    fn trivia_discarded(&self) -> bool {
        !self.options.include_trivia
    }

    // ──────────────────────────────────────────────
    // Sub-modes
    // ──────────────────────────────────────────────

    fn scan_whitespace(&mut self) -> Option<Token> {
        self.enter(SyntaxKind::Whitespace, self.trivia_discarded());
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.leave()
    }

    fn scan_line_comment(&mut self) -> Option<Token> {
        self.enter(SyntaxKind::LineComment, self.trivia_discarded());
        while self.peek().is_some_and(|c| c != '\n') {
            self.bump();
        }
        self.leave()
    }

    fn scan_block_comment(&mut self) -> Option<Token> {
        let start = self.mark();
        self.enter(SyntaxKind::BlockComment, self.trivia_discarded());
        self.bump();
        self.bump();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start);
                    self.report("unterminated block comment", span);
                    break;
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.bump();
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        self.leave()
    }

    /// Single-quoted string with backslash escapes. Strings may not span
    /// lines.
    fn scan_string(&mut self, discard: bool) -> Option<Token> {
        let start = self.mark();
        self.enter(SyntaxKind::StringLiteral, discard);
        self.bump();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    let span = self.span_from(start);
                    self.report("unterminated string literal", span);
                    break;
                }
                Some('\\') => {
                    self.bump();
                    if self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                Some('\'') => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        self.leave()
    }

    /// `[` opens an inline query when the first word inside is `select` or
    /// `find`.
    fn query_follows(&self) -> bool {
        let inner = self.rest()[1..].trim_start();
        let word: String = inner
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        word.eq_ignore_ascii_case("select") || word.eq_ignore_ascii_case("find")
    }

    fn scan_query(&mut self) -> Option<Token> {
        let start = self.mark();
        self.enter(SyntaxKind::QueryLiteral, false);
        self.bump();
        let mut depth = 1usize;
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start);
                    self.report("unterminated query", span);
                    break;
                }
                Some('[') => {
                    depth += 1;
                    self.bump();
                }
                Some(']') => {
                    self.bump();
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Some('\'') => {
                    // brackets inside quoted values do not nest
                    self.scan_string(true);
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        self.leave()
    }

    // ──────────────────────────────────────────────
    // Single tokens
    // ──────────────────────────────────────────────

    /// Identifier or keyword. Keywords are case-insensitive.
    fn scan_word(&mut self) -> Token {
        let start = self.mark();
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
        }
        let text = &self.src[start.offset..self.pos];
        let span = self.span_from(start);
        match SyntaxKind::from_keyword(&text.to_ascii_lowercase()) {
            Some(kind) => Token::new(kind, span, None),
            None => Token::new(SyntaxKind::Identifier, span, Some(text.to_owned())),
        }
    }

    /// Integer, long (`L` suffix) or decimal literal. Decimals take a
    /// fraction, an exponent or a `d` suffix.
    fn scan_number(&mut self) -> Token {
        let start = self.mark();
        let mut kind = SyntaxKind::IntegerLiteral;
        self.eat_digits();

        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            kind = SyntaxKind::DecimalLiteral;
            self.bump();
            self.eat_digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                kind = SyntaxKind::DecimalLiteral;
                self.bump();
                if signed {
                    self.bump();
                }
                self.eat_digits();
            }
        }
        match self.peek() {
            Some('l' | 'L') if kind == SyntaxKind::IntegerLiteral => {
                self.bump();
                kind = SyntaxKind::LongLiteral;
            }
            Some('d' | 'D') => {
                self.bump();
                kind = SyntaxKind::DecimalLiteral;
            }
            _ => {}
        }
        let text = self.src[start.offset..self.pos].to_owned();
        Token::new(kind, self.span_from(start), Some(text))
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    /// Longest punctuation match, with `>>`/`>>>` split into single `>`
    /// tokens. Unknown characters are reported and skipped.
    fn scan_operator(&mut self) -> Option<Token> {
        let rest = self.rest();
        if rest.starts_with(">>") && !rest.starts_with(">>=") && !rest.starts_with(">>>=") {
            let run = rest.chars().take(3).take_while(|&c| c == '>').count();
            return Some(self.split_angles(run));
        }

        let longest = SyntaxKind::PUNCTUATION
            .iter()
            .copied()
            .filter(|kind| rest.starts_with(kind.canonical_text()))
            .max_by_key(|kind| kind.canonical_text().len());

        let start = self.mark();
        match longest {
            Some(kind) => {
                for _ in 0..kind.canonical_text().len() {
                    self.bump();
                }
                Some(Token::new(kind, self.span_from(start), None))
            }
            None => {
                let c = self.bump();
                let span = self.span_from(start);
                if let Some(c) = c {
                    self.report(format!("unexpected character '{c}'"), span);
                }
                None
            }
        }
    }

    /// Consume a run of `run` `>` characters, return the first as a token
    /// and queue the rest with their own one-character spans.
    fn split_angles(&mut self, run: usize) -> Token {
        let start = self.mark();
        for _ in 0..run {
            self.bump();
        }
        let angle = |i: usize| {
            let column = start.column + i as u32 + 1;
            Token::new(
                SyntaxKind::Gt,
                Span::new(
                    start.offset + i,
                    start.offset + i + 1,
                    start.line,
                    column,
                    start.line,
                    column + 1,
                ),
                None,
            )
        };
        for i in 1..run {
            self.pending.push_back(angle(i));
        }
        trace!(run, line = start.line, "split angle brackets");
        angle(0)
    }
}

/// Lex a whole source, returning every token (ending with `Eof`) and the
/// lexical diagnostics.
pub fn tokenize(src: &str, options: LexerOptions) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut lexer = Lexer::new(src, options);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.is_eof();
        tokens.push(token);
        if done {
            break;
        }
    }
    (tokens, lexer.into_sink())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;
    use SyntaxKind::*;

    fn kinds(src: &str) -> Vec<SyntaxKind> {
        tokenize(src, LexerOptions::default())
            .0
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            kinds("PUBLIC Class foo"),
            vec![PublicKw, ClassKw, Identifier, Eof]
        );
    }

    #[test]
    fn identifier_keeps_original_case() {
        let (tokens, _) = tokenize("Account__c", LexerOptions::default());
        assert_eq!(tokens[0].kind, Identifier);
        assert_eq!(tokens[0].text.as_deref(), Some("Account__c"));
    }

    #[test]
    fn nested_generic_closers_are_separate_tokens() {
        let (tokens, diags) = tokenize("List<List<Integer>>", LexerOptions::default());
        assert!(diags.is_empty());
        let gts: Vec<&Token> = tokens.iter().filter(|t| t.kind == Gt).collect();
        assert_eq!(gts.len(), 2);
        assert_eq!((gts[0].span.start_offset, gts[0].span.end_offset), (17, 18));
        assert_eq!((gts[1].span.start_offset, gts[1].span.end_offset), (18, 19));
        assert_eq!(gts[0].span.start_column, 18);
        assert_eq!(gts[1].span.start_column, 19);
        assert!(gts[0].span.end_offset <= gts[1].span.start_offset);
    }

    #[test]
    fn triple_closer_splits_three_ways() {
        assert_eq!(kinds("a>>>b"), vec![Identifier, Gt, Gt, Gt, Identifier, Eof]);
    }

    #[test]
    fn shift_assignments_stay_whole() {
        assert_eq!(kinds("a >>= b"), vec![Identifier, ShrAssign, Identifier, Eof]);
        assert_eq!(kinds("a >>>= b"), vec![Identifier, UshrAssign, Identifier, Eof]);
        assert_eq!(kinds("a >= b"), vec![Identifier, GtEq, Identifier, Eof]);
    }

    #[test]
    fn longest_punctuation_wins() {
        assert_eq!(
            kinds("a?.b === c !== d => e <<= 1"),
            vec![
                Identifier, SafeDot, Identifier, EqEqEq, Identifier, NotEqEq, Identifier,
                FatArrow, Identifier, ShlAssign, IntegerLiteral, Eof
            ]
        );
    }

    #[test]
    fn number_literal_kinds() {
        assert_eq!(
            kinds("1 2L 3.5 4e10 5d 6.0E-2"),
            vec![
                IntegerLiteral,
                LongLiteral,
                DecimalLiteral,
                DecimalLiteral,
                DecimalLiteral,
                DecimalLiteral,
                Eof
            ]
        );
    }

    #[test]
    fn trivia_hidden_by_default() {
        assert_eq!(kinds("a /* b */ // c\n d"), vec![Identifier, Identifier, Eof]);
    }

    #[test]
    fn trivia_surfaced_on_request() {
        let (tokens, _) = tokenize("a /* b */\n// c", LexerOptions::with_trivia());
        let ks: Vec<SyntaxKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            ks,
            vec![Identifier, Whitespace, BlockComment, Whitespace, LineComment, Eof]
        );
        assert_eq!(tokens[2].text.as_deref(), Some("/* b */"));
        assert_eq!(tokens[4].text.as_deref(), Some("// c"));
        assert_eq!(tokens[4].span.start_line, 2);
    }

    #[test]
    fn multiline_comment_span_tracks_lines() {
        let (tokens, _) = tokenize("/* one\n two */x", LexerOptions::with_trivia());
        let comment = &tokens[0];
        assert_eq!(comment.kind, BlockComment);
        assert!(comment.span.is_multiline());
        assert_eq!(comment.span.end_line, 2);
        assert_eq!(comment.span.end_column, 8);
        assert_eq!(tokens[1].span.start_column, 8);
    }

    #[test]
    fn string_literal_keeps_quotes_and_escapes() {
        let (tokens, diags) = tokenize(r"'it\'s'", LexerOptions::default());
        assert!(diags.is_empty());
        assert_eq!(tokens[0].kind, StringLiteral);
        assert_eq!(tokens[0].text.as_deref(), Some(r"'it\'s'"));
    }

    #[test]
    fn unterminated_string_reports_and_continues() {
        let (tokens, diags) = tokenize("'abc\nx", LexerOptions::default());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::Lexical);
        assert_eq!(tokens[0].kind, StringLiteral);
        assert_eq!(tokens[1].kind, Identifier);
    }

    #[test]
    fn inline_query_is_one_token() {
        let src = "x = [SELECT Id FROM Account WHERE Name = 'a]b' AND Id IN :ids[0]];";
        let (tokens, diags) = tokenize(src, LexerOptions::default());
        assert!(diags.is_empty());
        let ks: Vec<SyntaxKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(ks, vec![Identifier, Assign, QueryLiteral, Semicolon, Eof]);
        assert_eq!(
            tokens[2].text.as_deref(),
            Some("[SELECT Id FROM Account WHERE Name = 'a]b' AND Id IN :ids[0]]")
        );
    }

    #[test]
    fn bracket_without_query_word_is_punctuation() {
        assert_eq!(
            kinds("a[selected]"),
            vec![Identifier, LBracket, Identifier, RBracket, Eof]
        );
    }

    #[test]
    fn unknown_character_is_skipped() {
        let (tokens, diags) = tokenize("a # b", LexerOptions::default());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].span.start_column, 3);
        let ks: Vec<SyntaxKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(ks, vec![Identifier, Identifier, Eof]);
    }

    #[test]
    fn eof_repeats() {
        let mut lexer = Lexer::new("x", LexerOptions::default());
        assert_eq!(lexer.next_token().kind, Identifier);
        let first = lexer.next_token();
        let second = lexer.next_token();
        assert!(first.is_eof() && second.is_eof());
        assert_eq!(first.span, second.span);
        assert_eq!(first.span.start_column, 2);
    }

    #[test]
    fn columns_are_one_based_and_end_exclusive() {
        let (tokens, _) = tokenize("ab cd", LexerOptions::default());
        assert_eq!(tokens[1].span.start_column, 4);
        assert_eq!(tokens[1].span.end_column, 6);
        assert_eq!(tokens[1].span.start_offset, 3);
        assert_eq!(tokens[1].span.end_offset, 5);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn lexing_never_panics_and_ends_with_eof(src in "\\PC{0,80}") {
            let (tokens, _) = tokenize(&src, LexerOptions::with_trivia());
            prop_assert!(tokens.last().is_some_and(Token::is_eof));
        }

        #[test]
        fn token_spans_are_ordered_and_disjoint(src in "[a-z0-9 <>=;(){}.\\[\\]'\\n]{0,60}") {
            let (tokens, _) = tokenize(&src, LexerOptions::with_trivia());
            for pair in tokens.windows(2) {
                prop_assert!(pair[0].span.start_offset <= pair[0].span.end_offset);
                prop_assert!(pair[0].span.end_offset <= pair[1].span.start_offset);
            }
        }

        #[test]
        fn angle_runs_become_single_closers(n in 1usize..8) {
            let src = ">".repeat(n);
            let (tokens, diags) = tokenize(&src, LexerOptions::default());
            prop_assert!(diags.is_empty());
            prop_assert_eq!(tokens.len(), n + 1);
            prop_assert!(tokens[..n].iter().all(|t| t.kind == SyntaxKind::Gt));
        }
    }
}
