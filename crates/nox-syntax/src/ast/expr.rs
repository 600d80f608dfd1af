//! Expression nodes.

use serde::{Deserialize, Serialize};

use super::ops::{BinaryOp, UnaryOp};
use super::stmt::Stmt;
use super::types::TypeNode;
use super::Name;
use crate::span::Span;

/// An expression. Every variant carries its own span; `Expr::span` is total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(LiteralExpr),
    Ident(IdentExpr),
    /// Sigil-prefixed builtin reference (`@sizeOf`, `@intCast`, ...).
    Builtin(BuiltinExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Assign(AssignExpr),
    Call(CallExpr),
    Field(FieldExpr),
    Index(IndexExpr),
    StructInit(StructInitExpr),
    Cast(CastExpr),
    SizeOf(SizeOfExpr),
    If(IfExpr),
    Switch(SwitchExpr),
    Try(TryExpr),
    Catch(CatchExpr),
    Paren(ParenExpr),
}

/// Discriminant-only view of an expression, used as a cache key component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExprKind {
    Literal,
    Ident,
    Builtin,
    Unary,
    Binary,
    Assign,
    Call,
    Field,
    Index,
    StructInit,
    Cast,
    SizeOf,
    If,
    Switch,
    Try,
    Catch,
    Paren,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i128),
    Float(f64),
    Bool(bool),
    Str(String),
    Char(char),
    Null,
    Undefined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralExpr {
    pub value: Literal,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentExpr {
    pub name: Name,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltinExpr {
    /// Name without the sigil.
    pub name: Name,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignExpr {
    pub target: Box<Expr>,
    /// `Some` for compound assignment (`+=` etc.).
    pub op: Option<BinaryOp>,
    pub value: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldExpr {
    pub base: Box<Expr>,
    pub field: Name,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexExpr {
    pub base: Box<Expr>,
    pub index: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructInitExpr {
    /// Named construction (`Point{..}`); anonymous when `None`.
    pub ty: Option<Name>,
    pub fields: Vec<FieldInit>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInit {
    pub name: Name,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastExpr {
    pub ty: TypeNode,
    pub value: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeOfExpr {
    pub ty: TypeNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfExpr {
    pub cond: Box<Expr>,
    pub then_body: Vec<Stmt>,
    pub else_body: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchExpr {
    pub scrutinee: Box<Expr>,
    pub arms: Vec<SwitchArm>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchArm {
    pub pattern: SwitchPattern,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SwitchPattern {
    Expr(Expr),
    /// The `else` arm.
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryExpr {
    pub inner: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchExpr {
    pub inner: Box<Expr>,
    pub binding: Option<Name>,
    pub handler: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParenExpr {
    pub inner: Box<Expr>,
    pub span: Span,
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Ident(e) => e.name.span,
            Self::Builtin(e) => e.name.span,
            Self::Unary(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Assign(e) => e.span,
            Self::Call(e) => e.span,
            Self::Field(e) => e.span,
            Self::Index(e) => e.span,
            Self::StructInit(e) => e.span,
            Self::Cast(e) => e.span,
            Self::SizeOf(e) => e.span,
            Self::If(e) => e.span,
            Self::Switch(e) => e.span,
            Self::Try(e) => e.span,
            Self::Catch(e) => e.span,
            Self::Paren(e) => e.span,
        }
    }

    pub fn kind(&self) -> ExprKind {
        match self {
            Self::Literal(_) => ExprKind::Literal,
            Self::Ident(_) => ExprKind::Ident,
            Self::Builtin(_) => ExprKind::Builtin,
            Self::Unary(_) => ExprKind::Unary,
            Self::Binary(_) => ExprKind::Binary,
            Self::Assign(_) => ExprKind::Assign,
            Self::Call(_) => ExprKind::Call,
            Self::Field(_) => ExprKind::Field,
            Self::Index(_) => ExprKind::Index,
            Self::StructInit(_) => ExprKind::StructInit,
            Self::Cast(_) => ExprKind::Cast,
            Self::SizeOf(_) => ExprKind::SizeOf,
            Self::If(_) => ExprKind::If,
            Self::Switch(_) => ExprKind::Switch,
            Self::Try(_) => ExprKind::Try,
            Self::Catch(_) => ExprKind::Catch,
            Self::Paren(_) => ExprKind::Paren,
        }
    }

    /// Strip any number of surrounding parens.
    pub fn unparenthesized(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Paren(p) = expr {
            expr = &p.inner;
        }
        expr
    }

    /// The identifier text if this is a plain identifier expression.
    pub fn as_ident(&self) -> Option<&Name> {
        match self.unparenthesized() {
            Expr::Ident(e) => Some(&e.name),
            _ => None,
        }
    }
}
