//! Token kinds and tokens.
//!
//! `SyntaxKind` covers both terminals (what the lexer produces) and
//! nonterminals (what the parser reduces to). Terminals come first so that
//! `kind as usize < SyntaxKind::TERMINAL_COUNT` identifies them, which lets the
//! table builder use dense bitsets over terminals.

use serde::{Deserialize, Serialize};

use crate::span::Span;

macro_rules! syntax_kinds {
    (
        special { $($special:ident => $special_text:literal,)* }
        keywords { $($kw:ident => $kw_text:literal,)* }
        punctuation { $($punct:ident => $punct_text:literal,)* }
        nonterminals { $($nt:ident,)* }
    ) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[repr(u16)]
        pub enum SyntaxKind {
            $($special,)*
            $($kw,)*
            $($punct,)*
            $($nt,)*
        }

        impl SyntaxKind {
            /// Every kind, in declaration order (`ALL[k as usize] == k`).
            pub const ALL: &'static [SyntaxKind] = &[
                $(SyntaxKind::$special,)*
                $(SyntaxKind::$kw,)*
                $(SyntaxKind::$punct,)*
                $(SyntaxKind::$nt,)*
            ];

            pub const TERMINALS: &'static [SyntaxKind] = &[
                $(SyntaxKind::$special,)*
                $(SyntaxKind::$kw,)*
                $(SyntaxKind::$punct,)*
            ];

            pub const PUNCTUATION: &'static [SyntaxKind] = &[$(SyntaxKind::$punct,)*];

            pub const TERMINAL_COUNT: usize = Self::TERMINALS.len();

            /// Fixed textual form: the source spelling for keywords and
            /// punctuation, a description for literal classes, the kind name
            /// for nonterminals.
            pub fn canonical_text(self) -> &'static str {
                match self {
                    $(SyntaxKind::$special => $special_text,)*
                    $(SyntaxKind::$kw => $kw_text,)*
                    $(SyntaxKind::$punct => $punct_text,)*
                    $(SyntaxKind::$nt => stringify!($nt),)*
                }
            }

            /// Keyword lookup. `word` must already be lowercased.
            pub fn from_keyword(word: &str) -> Option<SyntaxKind> {
                match word {
                    $($kw_text => Some(SyntaxKind::$kw),)*
                    _ => None,
                }
            }

            pub fn is_keyword(self) -> bool {
                matches!(self, $(SyntaxKind::$kw)|*)
            }

            pub fn is_punctuation(self) -> bool {
                matches!(self, $(SyntaxKind::$punct)|*)
            }
        }
    };
}

syntax_kinds! {
    special {
        Eof => "end of file",
        Error => "error",
        Whitespace => "whitespace",
        LineComment => "line comment",
        BlockComment => "block comment",
        Identifier => "identifier",
        IntegerLiteral => "integer literal",
        LongLiteral => "long literal",
        DecimalLiteral => "decimal literal",
        StringLiteral => "string literal",
        QueryLiteral => "query literal",
    }
    keywords {
        AbstractKw => "abstract",
        BreakKw => "break",
        CatchKw => "catch",
        ClassKw => "class",
        ContinueKw => "continue",
        DeleteKw => "delete",
        DoKw => "do",
        ElseKw => "else",
        EnumKw => "enum",
        ExtendsKw => "extends",
        FalseKw => "false",
        FinalKw => "final",
        FinallyKw => "finally",
        ForKw => "for",
        GlobalKw => "global",
        IfKw => "if",
        ImplementsKw => "implements",
        InheritedKw => "inherited",
        InsertKw => "insert",
        InstanceofKw => "instanceof",
        InterfaceKw => "interface",
        MergeKw => "merge",
        NewKw => "new",
        NullKw => "null",
        OverrideKw => "override",
        PrivateKw => "private",
        ProtectedKw => "protected",
        PublicKw => "public",
        ReturnKw => "return",
        SharingKw => "sharing",
        StaticKw => "static",
        SuperKw => "super",
        TestMethodKw => "testmethod",
        ThisKw => "this",
        ThrowKw => "throw",
        TransientKw => "transient",
        TrueKw => "true",
        TryKw => "try",
        UndeleteKw => "undelete",
        UpdateKw => "update",
        UpsertKw => "upsert",
        VirtualKw => "virtual",
        VoidKw => "void",
        WebServiceKw => "webservice",
        WhileKw => "while",
        WithKw => "with",
        WithoutKw => "without",
    }
    punctuation {
        LParen => "(",
        RParen => ")",
        LBrace => "{",
        RBrace => "}",
        LBracket => "[",
        RBracket => "]",
        Semicolon => ";",
        Comma => ",",
        Dot => ".",
        SafeDot => "?.",
        At => "@",
        Question => "?",
        Colon => ":",
        FatArrow => "=>",
        Assign => "=",
        PlusAssign => "+=",
        MinusAssign => "-=",
        StarAssign => "*=",
        SlashAssign => "/=",
        AmpAssign => "&=",
        PipeAssign => "|=",
        CaretAssign => "^=",
        ShlAssign => "<<=",
        ShrAssign => ">>=",
        UshrAssign => ">>>=",
        EqEq => "==",
        EqEqEq => "===",
        NotEq => "!=",
        NotEqEq => "!==",
        Lt => "<",
        LtEq => "<=",
        Gt => ">",
        GtEq => ">=",
        AndAnd => "&&",
        OrOr => "||",
        Bang => "!",
        Tilde => "~",
        Plus => "+",
        Minus => "-",
        Star => "*",
        Slash => "/",
        PlusPlus => "++",
        MinusMinus => "--",
        Amp => "&",
        Pipe => "|",
        Caret => "^",
        Shl => "<<",
    }
    nonterminals {
        Accept,
        CompilationUnit,
        TypeDeclaration,
        Modifiers,
        Modifier,
        SharingModifier,
        Annotation,
        AnnotationPairs,
        AnnotationPair,
        ClassDeclaration,
        SuperClass,
        Interfaces,
        ClassBody,
        ClassBodyDeclarations,
        ClassBodyDeclaration,
        FieldDeclaration,
        VariableDeclarators,
        VariableDeclarator,
        VariableInitializer,
        MethodDeclaration,
        MethodHeader,
        MethodBody,
        FormalParameters,
        FormalParameterList,
        FormalParameter,
        ConstructorDeclaration,
        PropertyDeclaration,
        AccessorDeclarations,
        AccessorDeclaration,
        AccessorBody,
        InitializerBlock,
        InterfaceDeclaration,
        InterfaceExtends,
        InterfaceBody,
        InterfaceMemberDeclarations,
        InterfaceMethodDeclaration,
        EnumDeclaration,
        EnumConstants,
        EnumConstantList,
        Type,
        ClassType,
        GenericType,
        TypeArguments,
        TypeList,
        ArrayType,
        ClassTypeList,
        QualifiedName,
        Block,
        BlockStatements,
        BlockStatement,
        LocalVariableDeclarationStatement,
        LocalVariableDeclaration,
        Statement,
        EmptyStatement,
        ExpressionStatement,
        StatementExpression,
        IfThenStatement,
        IfThenElseStatement,
        WhileStatement,
        DoStatement,
        ForStatement,
        ForInit,
        ForUpdate,
        StatementExpressionList,
        ExpressionOpt,
        ForEachStatement,
        ForEachHeader,
        ReturnStatement,
        BreakStatement,
        ContinueStatement,
        ThrowStatement,
        TryStatement,
        Catches,
        CatchClause,
        CatchHeader,
        FinallyClause,
        DmlStatement,
        DmlOperation,
        ConstructorInvocation,
        Expression,
        AssignmentExpression,
        Assignment,
        LeftHandSide,
        AssignmentOperator,
        ConditionalExpression,
        ConditionalOrExpression,
        ConditionalAndExpression,
        InclusiveOrExpression,
        ExclusiveOrExpression,
        AndExpression,
        EqualityExpression,
        RelationalExpression,
        AdditiveExpression,
        MultiplicativeExpression,
        UnaryExpression,
        PreIncrementExpression,
        PreDecrementExpression,
        UnaryNotPlusMinusExpression,
        PostfixExpression,
        PostIncrementExpression,
        PostDecrementExpression,
        CastExpression,
        Primary,
        PrimaryNoNewArray,
        Literal,
        ClassInstanceCreation,
        ArrayCreation,
        CollectionItems,
        CollectionItemList,
        CollectionItem,
        Arguments,
        ArgumentList,
        FieldAccess,
        MethodInvocation,
        ArrayAccess,
    }
}

impl SyntaxKind {
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<SyntaxKind> {
        SyntaxKind::ALL.get(index).copied()
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        (self as usize) < Self::TERMINAL_COUNT
    }

    /// Whitespace and comments.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::Whitespace | SyntaxKind::LineComment | SyntaxKind::BlockComment
        )
    }

    /// Human-readable name used in diagnostics: quoted source spelling for
    /// keywords and punctuation, plain description otherwise.
    pub fn describe(self) -> String {
        if self.is_keyword() || self.is_punctuation() {
            format!("'{}'", self.canonical_text())
        } else {
            self.canonical_text().to_owned()
        }
    }
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical_text())
    }
}

/// A classified lexical unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: Span,
    /// Source text for identifiers, literals and trivia. `None` for
    /// keywords and punctuation, whose text is fixed by the kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Token {
    pub fn new(kind: SyntaxKind, span: Span, text: Option<String>) -> Self {
        Token { kind, span, text }
    }

    /// The synthetic token shifted by error recovery.
    pub fn error(span: Span) -> Self {
        Token::new(SyntaxKind::Error, span, None)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == SyntaxKind::Eof
    }

    /// Text as written: the stored text, or the fixed spelling for
    /// keywords and punctuation.
    pub fn lexeme(&self) -> &str {
        match &self.text {
            Some(text) => text,
            None if self.kind.is_keyword() || self.kind.is_punctuation() => {
                self.kind.canonical_text()
            }
            None => "",
        }
    }

    /// Diagnostic description, e.g. `identifier 'y'` or `'}'`.
    pub fn describe(&self) -> String {
        match (&self.text, self.kind) {
            (Some(text), SyntaxKind::Identifier) => format!("identifier '{text}'"),
            (Some(text), kind) if !kind.is_trivia() => format!("{} {text}", kind.canonical_text()),
            _ => self.kind.describe(),
        }
    }
}
