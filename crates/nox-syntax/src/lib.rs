//! AST data model for the Nox language.
//!
//! This crate defines the tree the parser hands to semantic analysis:
//! - `span` - source offset ranges attached to every node
//! - `ast` - closed sum types for statements, expressions, and type nodes
//!
//! The tree is read-mostly: the analyzer records everything it learns in
//! its own tables and never mutates nodes in place.

pub mod ast;
pub mod span;

pub use ast::{
    Expr, ExprKind, Literal, Module, Mutability, Name, Program, Stmt, TypeNode, Visibility,
};
pub use span::Span;
