//! Closed sum types for the Nox AST.
//!
//! Every node category is a tagged enum with one payload struct per
//! variant, so analysis code pattern-matches exhaustively instead of
//! comparing kind strings:
//! - `stmt` - statements (declarations and control flow)
//! - `expr` - expressions
//! - `types` - type nodes
//! - `ops` - operator enums
//! - `program` - the module table handed to analysis

mod expr;
mod ops;
mod program;
mod stmt;
mod types;

use serde::{Deserialize, Serialize};

pub use expr::{
    AssignExpr, BinaryExpr, BuiltinExpr, CallExpr, CastExpr, CatchExpr, Expr, ExprKind, FieldExpr,
    FieldInit, IdentExpr, IfExpr, IndexExpr, Literal, LiteralExpr, ParenExpr, SizeOfExpr,
    StructInitExpr, SwitchArm, SwitchExpr, SwitchPattern, TryExpr, UnaryExpr,
};
pub use ops::{BinaryOp, UnaryOp};
pub use program::{Module, Program};
pub use stmt::{
    BlockStmt, BreakStmt, ContinueStmt, DefStmt, DeferStmt, DoStmt, ExprStmt, ForStmt, FuncDecl,
    LetStmt, Param, ReturnStmt, Stmt, TestStmt, ThrowStmt, UseMembers, UsePath, UseStmt, WhileStmt,
};
pub use types::{
    ArrayType, EnumType, EnumVariant, ErrSetType, FunctionType, IdentType, OptionalType,
    ParenType, PointerType, Primitive, PrimitiveType, StructField, StructType, TupleType,
    TypeNode, UnionType,
};

use crate::span::Span;

/// An identifier together with the span it was written at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Name {
    pub text: String,
    pub span: Span,
}

impl Name {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Declared visibility of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Private,
    Public,
    Static,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }

    pub fn is_static(self) -> bool {
        matches!(self, Visibility::Static)
    }
}

/// Whether a binding can be reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mutability {
    Mutable,
    #[default]
    Immutable,
}

impl Mutability {
    pub fn is_mutable(self) -> bool {
        matches!(self, Mutability::Mutable)
    }
}
