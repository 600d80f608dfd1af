//! Statement nodes.

use serde::{Deserialize, Serialize};

use super::expr::Expr;
use super::types::TypeNode;
use super::{Mutability, Name, Visibility};
use crate::span::Span;

/// A statement. Top-level module items and function-body statements share
/// this one category; analysis decides what is legal where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Def(DefStmt),
    Use(UseStmt),
    Let(LetStmt),
    Func(FuncDecl),
    Block(BlockStmt),
    Test(TestStmt),
    Return(ReturnStmt),
    Defer(DeferStmt),
    Throw(ThrowStmt),
    While(WhileStmt),
    Do(DoStmt),
    For(ForStmt),
    Expr(ExprStmt),
    Break(BreakStmt),
    Continue(ContinueStmt),
}

/// `def Name = <type>` - binds a type shape (struct, enum, error set, alias)
/// to a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefStmt {
    pub name: Name,
    pub ty: TypeNode,
    pub visibility: Visibility,
    pub span: Span,
}

/// `use other.module` and its member/wildcard forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseStmt {
    pub module: Name,
    pub members: UseMembers,
    pub alias: Option<Name>,
    pub visibility: Visibility,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UseMembers {
    /// Import the module itself as one symbol.
    Module,
    /// `use m.*` - every export of the target.
    Wildcard,
    /// `use m.{a, b.c}` - explicit member paths.
    Named(Vec<UsePath>),
}

/// Dotted member path within an import (`point.Vec2.len`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsePath {
    pub segments: Vec<Name>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetStmt {
    pub name: Name,
    pub ty: Option<TypeNode>,
    pub init: Option<Expr>,
    pub mutability: Mutability,
    pub visibility: Visibility,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: Name,
    pub params: Vec<Param>,
    pub ret: Option<TypeNode>,
    /// Declared error type; shapes what `throw` accepts in the body.
    pub error_ty: Option<TypeNode>,
    pub body: Vec<Stmt>,
    pub visibility: Visibility,
    pub is_static: bool,
    /// Marked callable during constant evaluation.
    pub is_comptime: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Name,
    pub ty: Option<TypeNode>,
    pub default: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStmt {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestStmt {
    pub name: Option<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferStmt {
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrowStmt {
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoStmt {
    pub body: Vec<Stmt>,
    pub cond: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    pub binding: Name,
    pub iterable: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakStmt {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinueStmt {
    pub span: Span,
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Self::Def(s) => s.span,
            Self::Use(s) => s.span,
            Self::Let(s) => s.span,
            Self::Func(s) => s.span,
            Self::Block(s) => s.span,
            Self::Test(s) => s.span,
            Self::Return(s) => s.span,
            Self::Defer(s) => s.span,
            Self::Throw(s) => s.span,
            Self::While(s) => s.span,
            Self::Do(s) => s.span,
            Self::For(s) => s.span,
            Self::Expr(s) => s.span,
            Self::Break(s) => s.span,
            Self::Continue(s) => s.span,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Def(_) => "def",
            Self::Use(_) => "use",
            Self::Let(_) => "let",
            Self::Func(_) => "fn",
            Self::Block(_) => "block",
            Self::Test(_) => "test",
            Self::Return(_) => "return",
            Self::Defer(_) => "defer",
            Self::Throw(_) => "throw",
            Self::While(_) => "while",
            Self::Do(_) => "do",
            Self::For(_) => "for",
            Self::Expr(_) => "expression",
            Self::Break(_) => "break",
            Self::Continue(_) => "continue",
        }
    }
}
