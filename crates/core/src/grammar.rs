//! Grammar definition and the Apex grammar.

use std::sync::OnceLock;

use tracing::debug;

use crate::lalr;
use crate::table::ParseTable;
use crate::token::SyntaxKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub lhs: SyntaxKind,
    pub rhs: Vec<SyntaxKind>,
}

/// A context-free grammar over [`SyntaxKind`]. Rule 0 is always the
/// augmented start rule `Accept -> start Eof`.
#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Vec<Rule>,
}

impl Grammar {
    pub fn new(start: SyntaxKind) -> Self {
        Grammar {
            rules: vec![Rule {
                lhs: SyntaxKind::Accept,
                rhs: vec![start, SyntaxKind::Eof],
            }],
        }
    }

    /// Add a rule, returning its index.
    pub fn rule(&mut self, lhs: SyntaxKind, rhs: &[SyntaxKind]) -> usize {
        debug_assert!(!lhs.is_terminal(), "{lhs:?} is a terminal");
        self.rules.push(Rule {
            lhs,
            rhs: rhs.to_vec(),
        });
        self.rules.len() - 1
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn start(&self) -> SyntaxKind {
        self.rules[0].rhs[0]
    }
}

/// The Apex parse table, built on first use.
pub fn apex_table() -> &'static ParseTable {
    static TABLE: OnceLock<ParseTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let table = lalr::build(&apex_grammar());
        debug!(
            states = table.states.len(),
            conflicts = table.conflicts.len(),
            "apex parse table ready"
        );
        table
    })
}

/// The Apex grammar.
///
/// Type productions come before expression productions: where a dotted name
/// inside parentheses could close either a type argument list or a
/// comparison, the earlier rule (the type) wins.
pub fn apex_grammar() -> Grammar {
    use SyntaxKind::*;

    let mut g = Grammar::new(CompilationUnit);

    g.rule(CompilationUnit, &[TypeDeclaration]);
    g.rule(TypeDeclaration, &[ClassDeclaration]);
    g.rule(TypeDeclaration, &[InterfaceDeclaration]);
    g.rule(TypeDeclaration, &[EnumDeclaration]);

    // ── Modifiers ────────────────────────────────────────────────────
    g.rule(Modifiers, &[]);
    g.rule(Modifiers, &[Modifiers, Modifier]);
    for kw in [
        PublicKw,
        PrivateKw,
        ProtectedKw,
        GlobalKw,
        StaticKw,
        FinalKw,
        AbstractKw,
        VirtualKw,
        OverrideKw,
        TransientKw,
        TestMethodKw,
        WebServiceKw,
    ] {
        g.rule(Modifier, &[kw]);
    }
    g.rule(Modifier, &[Annotation]);
    g.rule(Modifier, &[SharingModifier]);
    g.rule(SharingModifier, &[WithKw, SharingKw]);
    g.rule(SharingModifier, &[WithoutKw, SharingKw]);
    g.rule(SharingModifier, &[InheritedKw, SharingKw]);
    g.rule(Annotation, &[At, QualifiedName]);
    g.rule(Annotation, &[At, QualifiedName, LParen, RParen]);
    g.rule(Annotation, &[At, QualifiedName, LParen, AnnotationPairs, RParen]);
    g.rule(AnnotationPairs, &[AnnotationPair]);
    g.rule(AnnotationPairs, &[AnnotationPairs, AnnotationPair]);
    g.rule(AnnotationPairs, &[AnnotationPairs, Comma, AnnotationPair]);
    g.rule(AnnotationPair, &[Identifier, Assign, Literal]);
    g.rule(AnnotationPair, &[Literal]);

    // ── Classes ──────────────────────────────────────────────────────
    g.rule(
        ClassDeclaration,
        &[Modifiers, ClassKw, Identifier, SuperClass, Interfaces, ClassBody],
    );
    g.rule(SuperClass, &[]);
    g.rule(SuperClass, &[ExtendsKw, ClassType]);
    g.rule(Interfaces, &[]);
    g.rule(Interfaces, &[ImplementsKw, ClassTypeList]);
    g.rule(ClassTypeList, &[ClassType]);
    g.rule(ClassTypeList, &[ClassTypeList, Comma, ClassType]);
    g.rule(ClassBody, &[LBrace, ClassBodyDeclarations, RBrace]);
    g.rule(ClassBodyDeclarations, &[]);
    g.rule(
        ClassBodyDeclarations,
        &[ClassBodyDeclarations, ClassBodyDeclaration],
    );
    for member in [
        FieldDeclaration,
        MethodDeclaration,
        ConstructorDeclaration,
        PropertyDeclaration,
        ClassDeclaration,
        InterfaceDeclaration,
        EnumDeclaration,
        InitializerBlock,
    ] {
        g.rule(ClassBodyDeclaration, &[member]);
    }
    g.rule(ClassBodyDeclaration, &[Error, Semicolon]);

    g.rule(
        FieldDeclaration,
        &[Modifiers, Type, VariableDeclarators, Semicolon],
    );
    g.rule(VariableDeclarators, &[VariableDeclarator]);
    g.rule(
        VariableDeclarators,
        &[VariableDeclarators, Comma, VariableDeclarator],
    );
    g.rule(VariableDeclarator, &[Identifier]);
    g.rule(
        VariableDeclarator,
        &[Identifier, Assign, VariableInitializer],
    );
    g.rule(VariableInitializer, &[Expression]);

    g.rule(MethodDeclaration, &[MethodHeader, MethodBody]);
    g.rule(
        MethodHeader,
        &[Modifiers, Type, Identifier, LParen, FormalParameters, RParen],
    );
    g.rule(
        MethodHeader,
        &[Modifiers, VoidKw, Identifier, LParen, FormalParameters, RParen],
    );
    g.rule(MethodBody, &[Block]);
    g.rule(MethodBody, &[Semicolon]);
    g.rule(FormalParameters, &[]);
    g.rule(FormalParameters, &[FormalParameterList]);
    g.rule(FormalParameterList, &[FormalParameter]);
    g.rule(
        FormalParameterList,
        &[FormalParameterList, Comma, FormalParameter],
    );
    g.rule(FormalParameter, &[Type, Identifier]);
    g.rule(FormalParameter, &[FinalKw, Type, Identifier]);

    g.rule(
        ConstructorDeclaration,
        &[Modifiers, Identifier, LParen, FormalParameters, RParen, Block],
    );

    g.rule(
        PropertyDeclaration,
        &[Modifiers, Type, Identifier, LBrace, AccessorDeclarations, RBrace],
    );
    g.rule(AccessorDeclarations, &[AccessorDeclaration]);
    g.rule(
        AccessorDeclarations,
        &[AccessorDeclarations, AccessorDeclaration],
    );
    g.rule(AccessorDeclaration, &[Modifiers, Identifier, AccessorBody]);
    g.rule(AccessorBody, &[Semicolon]);
    g.rule(AccessorBody, &[Block]);

    g.rule(InitializerBlock, &[Modifiers, Block]);

    // ── Interfaces and enums ─────────────────────────────────────────
    g.rule(
        InterfaceDeclaration,
        &[Modifiers, InterfaceKw, Identifier, InterfaceExtends, InterfaceBody],
    );
    g.rule(InterfaceExtends, &[]);
    g.rule(InterfaceExtends, &[ExtendsKw, ClassTypeList]);
    g.rule(
        InterfaceBody,
        &[LBrace, InterfaceMemberDeclarations, RBrace],
    );
    g.rule(InterfaceMemberDeclarations, &[]);
    g.rule(
        InterfaceMemberDeclarations,
        &[InterfaceMemberDeclarations, InterfaceMethodDeclaration],
    );
    g.rule(
        InterfaceMethodDeclaration,
        &[
            Modifiers,
            Type,
            Identifier,
            LParen,
            FormalParameters,
            RParen,
            Semicolon,
        ],
    );
    g.rule(
        InterfaceMethodDeclaration,
        &[
            Modifiers,
            VoidKw,
            Identifier,
            LParen,
            FormalParameters,
            RParen,
            Semicolon,
        ],
    );
    g.rule(InterfaceMethodDeclaration, &[Error, Semicolon]);

    g.rule(
        EnumDeclaration,
        &[Modifiers, EnumKw, Identifier, LBrace, EnumConstants, RBrace],
    );
    g.rule(EnumConstants, &[]);
    g.rule(EnumConstants, &[EnumConstantList]);
    g.rule(EnumConstantList, &[Identifier]);
    g.rule(EnumConstantList, &[EnumConstantList, Comma, Identifier]);

    // ── Types ────────────────────────────────────────────────────────
    g.rule(Type, &[ClassType]);
    g.rule(Type, &[ArrayType]);
    g.rule(ClassType, &[QualifiedName]);
    g.rule(ClassType, &[GenericType]);
    g.rule(GenericType, &[QualifiedName, TypeArguments]);
    g.rule(TypeArguments, &[Lt, TypeList, Gt]);
    g.rule(TypeList, &[Type]);
    g.rule(TypeList, &[TypeList, Comma, Type]);
    g.rule(ArrayType, &[QualifiedName, LBracket, RBracket]);
    g.rule(ArrayType, &[GenericType, LBracket, RBracket]);
    g.rule(ArrayType, &[ArrayType, LBracket, RBracket]);
    g.rule(QualifiedName, &[Identifier]);
    g.rule(QualifiedName, &[QualifiedName, Dot, Identifier]);
    // platform methods named after DML verbs, and `Trigger.new`
    for kw in [
        InsertKw, UpdateKw, UpsertKw, DeleteKw, UndeleteKw, MergeKw, NewKw,
    ] {
        g.rule(QualifiedName, &[QualifiedName, Dot, kw]);
    }

    // ── Blocks and statements ────────────────────────────────────────
    g.rule(Block, &[LBrace, BlockStatements, RBrace]);
    g.rule(BlockStatements, &[]);
    g.rule(BlockStatements, &[BlockStatements, BlockStatement]);
    g.rule(BlockStatement, &[LocalVariableDeclarationStatement]);
    g.rule(BlockStatement, &[Statement]);
    g.rule(
        LocalVariableDeclarationStatement,
        &[LocalVariableDeclaration, Semicolon],
    );
    g.rule(LocalVariableDeclaration, &[Type, VariableDeclarators]);
    g.rule(
        LocalVariableDeclaration,
        &[FinalKw, Type, VariableDeclarators],
    );

    for statement in [
        Block,
        EmptyStatement,
        ExpressionStatement,
        IfThenStatement,
        IfThenElseStatement,
        WhileStatement,
        DoStatement,
        ForStatement,
        ForEachStatement,
        ReturnStatement,
        BreakStatement,
        ContinueStatement,
        ThrowStatement,
        TryStatement,
        DmlStatement,
        ConstructorInvocation,
    ] {
        g.rule(Statement, &[statement]);
    }
    g.rule(Statement, &[Error, Semicolon]);

    g.rule(EmptyStatement, &[Semicolon]);
    g.rule(ExpressionStatement, &[StatementExpression, Semicolon]);
    for expr in [
        Assignment,
        PreIncrementExpression,
        PreDecrementExpression,
        PostIncrementExpression,
        PostDecrementExpression,
        MethodInvocation,
        ClassInstanceCreation,
    ] {
        g.rule(StatementExpression, &[expr]);
    }

    g.rule(
        IfThenStatement,
        &[IfKw, LParen, Expression, RParen, Statement],
    );
    g.rule(
        IfThenElseStatement,
        &[IfKw, LParen, Expression, RParen, Statement, ElseKw, Statement],
    );
    g.rule(
        WhileStatement,
        &[WhileKw, LParen, Expression, RParen, Statement],
    );
    g.rule(
        DoStatement,
        &[
            DoKw, Statement, WhileKw, LParen, Expression, RParen, Semicolon,
        ],
    );
    g.rule(
        ForStatement,
        &[
            ForKw,
            LParen,
            ForInit,
            Semicolon,
            ExpressionOpt,
            Semicolon,
            ForUpdate,
            RParen,
            Statement,
        ],
    );
    g.rule(ForInit, &[]);
    g.rule(ForInit, &[StatementExpressionList]);
    g.rule(ForInit, &[LocalVariableDeclaration]);
    g.rule(ForUpdate, &[]);
    g.rule(ForUpdate, &[StatementExpressionList]);
    g.rule(StatementExpressionList, &[StatementExpression]);
    g.rule(
        StatementExpressionList,
        &[StatementExpressionList, Comma, StatementExpression],
    );
    g.rule(ExpressionOpt, &[]);
    g.rule(ExpressionOpt, &[Expression]);
    g.rule(ForEachStatement, &[ForEachHeader, Statement]);
    g.rule(
        ForEachHeader,
        &[ForKw, LParen, Type, Identifier, Colon, Expression, RParen],
    );

    g.rule(ReturnStatement, &[ReturnKw, ExpressionOpt, Semicolon]);
    g.rule(BreakStatement, &[BreakKw, Semicolon]);
    g.rule(ContinueStatement, &[ContinueKw, Semicolon]);
    g.rule(ThrowStatement, &[ThrowKw, Expression, Semicolon]);

    g.rule(TryStatement, &[TryKw, Block, Catches]);
    g.rule(TryStatement, &[TryKw, Block, Catches, FinallyClause]);
    g.rule(TryStatement, &[TryKw, Block, FinallyClause]);
    g.rule(Catches, &[CatchClause]);
    g.rule(Catches, &[Catches, CatchClause]);
    g.rule(CatchClause, &[CatchHeader, Block]);
    g.rule(CatchHeader, &[CatchKw, LParen, FormalParameter, RParen]);
    g.rule(FinallyClause, &[FinallyKw, Block]);

    for verb in [InsertKw, UpdateKw, UpsertKw, DeleteKw, UndeleteKw, MergeKw] {
        g.rule(DmlOperation, &[verb]);
    }
    g.rule(DmlStatement, &[DmlOperation, Expression, Semicolon]);
    g.rule(
        DmlStatement,
        &[DmlOperation, Expression, Expression, Semicolon],
    );

    g.rule(
        ConstructorInvocation,
        &[ThisKw, LParen, Arguments, RParen, Semicolon],
    );
    g.rule(
        ConstructorInvocation,
        &[SuperKw, LParen, Arguments, RParen, Semicolon],
    );

    // ── Expressions ──────────────────────────────────────────────────
    g.rule(Expression, &[AssignmentExpression]);
    g.rule(AssignmentExpression, &[ConditionalExpression]);
    g.rule(AssignmentExpression, &[Assignment]);
    g.rule(
        Assignment,
        &[LeftHandSide, AssignmentOperator, AssignmentExpression],
    );
    g.rule(LeftHandSide, &[QualifiedName]);
    g.rule(LeftHandSide, &[FieldAccess]);
    g.rule(LeftHandSide, &[ArrayAccess]);
    for op in [
        Assign,
        PlusAssign,
        MinusAssign,
        StarAssign,
        SlashAssign,
        AmpAssign,
        PipeAssign,
        CaretAssign,
        ShlAssign,
        ShrAssign,
        UshrAssign,
    ] {
        g.rule(AssignmentOperator, &[op]);
    }

    g.rule(ConditionalExpression, &[ConditionalOrExpression]);
    g.rule(
        ConditionalExpression,
        &[
            ConditionalOrExpression,
            Question,
            Expression,
            Colon,
            ConditionalExpression,
        ],
    );
    g.rule(ConditionalOrExpression, &[ConditionalAndExpression]);
    g.rule(
        ConditionalOrExpression,
        &[ConditionalOrExpression, OrOr, ConditionalAndExpression],
    );
    g.rule(ConditionalAndExpression, &[InclusiveOrExpression]);
    g.rule(
        ConditionalAndExpression,
        &[ConditionalAndExpression, AndAnd, InclusiveOrExpression],
    );
    g.rule(InclusiveOrExpression, &[ExclusiveOrExpression]);
    g.rule(
        InclusiveOrExpression,
        &[InclusiveOrExpression, Pipe, ExclusiveOrExpression],
    );
    g.rule(ExclusiveOrExpression, &[AndExpression]);
    g.rule(
        ExclusiveOrExpression,
        &[ExclusiveOrExpression, Caret, AndExpression],
    );
    g.rule(AndExpression, &[EqualityExpression]);
    g.rule(AndExpression, &[AndExpression, Amp, EqualityExpression]);
    g.rule(EqualityExpression, &[RelationalExpression]);
    for op in [EqEq, NotEq, EqEqEq, NotEqEq] {
        g.rule(
            EqualityExpression,
            &[EqualityExpression, op, RelationalExpression],
        );
    }

    g.rule(RelationalExpression, &[AdditiveExpression]);
    for op in [Lt, Gt, LtEq, GtEq, Shl] {
        g.rule(
            RelationalExpression,
            &[RelationalExpression, op, AdditiveExpression],
        );
    }
    // `a < b` with a plain name on the left, kept apart so that `(Name<`
    // can still open a generic cast
    g.rule(
        RelationalExpression,
        &[QualifiedName, Lt, AdditiveExpression],
    );
    // `>>` and `>>>` arrive as separate `>` tokens
    g.rule(
        RelationalExpression,
        &[RelationalExpression, Gt, Gt, AdditiveExpression],
    );
    g.rule(
        RelationalExpression,
        &[RelationalExpression, Gt, Gt, Gt, AdditiveExpression],
    );
    g.rule(
        RelationalExpression,
        &[RelationalExpression, InstanceofKw, Type],
    );

    g.rule(AdditiveExpression, &[MultiplicativeExpression]);
    for op in [Plus, Minus] {
        g.rule(
            AdditiveExpression,
            &[AdditiveExpression, op, MultiplicativeExpression],
        );
    }
    g.rule(MultiplicativeExpression, &[UnaryExpression]);
    for op in [Star, Slash] {
        g.rule(
            MultiplicativeExpression,
            &[MultiplicativeExpression, op, UnaryExpression],
        );
    }

    g.rule(UnaryExpression, &[PreIncrementExpression]);
    g.rule(UnaryExpression, &[PreDecrementExpression]);
    g.rule(UnaryExpression, &[Plus, UnaryExpression]);
    g.rule(UnaryExpression, &[Minus, UnaryExpression]);
    g.rule(UnaryExpression, &[UnaryNotPlusMinusExpression]);
    g.rule(PreIncrementExpression, &[PlusPlus, UnaryExpression]);
    g.rule(PreDecrementExpression, &[MinusMinus, UnaryExpression]);
    g.rule(UnaryNotPlusMinusExpression, &[PostfixExpression]);
    g.rule(UnaryNotPlusMinusExpression, &[Tilde, UnaryExpression]);
    g.rule(UnaryNotPlusMinusExpression, &[Bang, UnaryExpression]);
    g.rule(UnaryNotPlusMinusExpression, &[CastExpression]);
    g.rule(PostfixExpression, &[Primary]);
    g.rule(PostfixExpression, &[QualifiedName]);
    g.rule(PostfixExpression, &[PostIncrementExpression]);
    g.rule(PostfixExpression, &[PostDecrementExpression]);
    g.rule(PostIncrementExpression, &[PostfixExpression, PlusPlus]);
    g.rule(PostDecrementExpression, &[PostfixExpression, MinusMinus]);

    g.rule(
        CastExpression,
        &[LParen, Expression, RParen, UnaryNotPlusMinusExpression],
    );
    g.rule(
        CastExpression,
        &[
            LParen,
            QualifiedName,
            LBracket,
            RBracket,
            RParen,
            UnaryNotPlusMinusExpression,
        ],
    );
    g.rule(
        CastExpression,
        &[
            LParen,
            QualifiedName,
            TypeArguments,
            RParen,
            UnaryNotPlusMinusExpression,
        ],
    );

    g.rule(Primary, &[PrimaryNoNewArray]);
    g.rule(Primary, &[ArrayCreation]);
    g.rule(PrimaryNoNewArray, &[Literal]);
    g.rule(PrimaryNoNewArray, &[ThisKw]);
    g.rule(PrimaryNoNewArray, &[LParen, Expression, RParen]);
    g.rule(PrimaryNoNewArray, &[ClassInstanceCreation]);
    g.rule(PrimaryNoNewArray, &[FieldAccess]);
    g.rule(PrimaryNoNewArray, &[MethodInvocation]);
    g.rule(PrimaryNoNewArray, &[ArrayAccess]);
    for lit in [
        IntegerLiteral,
        LongLiteral,
        DecimalLiteral,
        StringLiteral,
        QueryLiteral,
        TrueKw,
        FalseKw,
        NullKw,
    ] {
        g.rule(Literal, &[lit]);
    }

    g.rule(
        ClassInstanceCreation,
        &[NewKw, ClassType, LParen, Arguments, RParen],
    );
    g.rule(
        ClassInstanceCreation,
        &[NewKw, ClassType, LBrace, CollectionItems, RBrace],
    );
    g.rule(
        ArrayCreation,
        &[NewKw, ClassType, LBracket, Expression, RBracket],
    );
    g.rule(
        ArrayCreation,
        &[
            NewKw,
            ClassType,
            LBracket,
            RBracket,
            LBrace,
            CollectionItems,
            RBrace,
        ],
    );
    g.rule(CollectionItems, &[]);
    g.rule(CollectionItems, &[CollectionItemList]);
    g.rule(CollectionItemList, &[CollectionItem]);
    g.rule(
        CollectionItemList,
        &[CollectionItemList, Comma, CollectionItem],
    );
    g.rule(CollectionItem, &[Expression]);
    g.rule(CollectionItem, &[Expression, FatArrow, Expression]);

    g.rule(Arguments, &[]);
    g.rule(Arguments, &[ArgumentList]);
    g.rule(ArgumentList, &[Expression]);
    g.rule(ArgumentList, &[ArgumentList, Comma, Expression]);

    g.rule(FieldAccess, &[Primary, Dot, Identifier]);
    g.rule(FieldAccess, &[Primary, SafeDot, Identifier]);
    g.rule(FieldAccess, &[QualifiedName, SafeDot, Identifier]);
    g.rule(FieldAccess, &[SuperKw, Dot, Identifier]);

    g.rule(
        MethodInvocation,
        &[QualifiedName, LParen, Arguments, RParen],
    );
    for dot in [Dot, SafeDot] {
        g.rule(
            MethodInvocation,
            &[Primary, dot, Identifier, LParen, Arguments, RParen],
        );
    }
    g.rule(
        MethodInvocation,
        &[QualifiedName, SafeDot, Identifier, LParen, Arguments, RParen],
    );
    g.rule(
        MethodInvocation,
        &[SuperKw, Dot, Identifier, LParen, Arguments, RParen],
    );

    g.rule(
        ArrayAccess,
        &[QualifiedName, LBracket, Expression, RBracket],
    );
    g.rule(
        ArrayAccess,
        &[PrimaryNoNewArray, LBracket, Expression, RBracket],
    );

    g
}
