//! AST builders shared by the phase tests.
//!
//! Spans are handed in as `(start, end)` pairs; the defining name's span
//! is derived from the construct's start so that unrelated constructs
//! never overlap and never merge in the deduplicator.

use nox_syntax::ast::{
    BinaryExpr, BinaryOp, CallExpr, FieldExpr, FuncDecl, IdentExpr, Literal, LiteralExpr,
    Mutability, Name, Param, Primitive, StructField, UseMembers, UseStmt, Visibility,
};
use nox_syntax::{Expr, Module, Program, Span, Stmt, TypeNode};

use crate::analyzer::{AnalysisResult, Analyzer, AnalyzerConfig};
use crate::diagnostics::DiagnosticCode;
pub use crate::types::primitive as prim;

pub fn sp(start: u32, end: u32) -> Span {
    Span::new(start, end)
}

pub fn nm(text: &str, at: (u32, u32)) -> Name {
    Name::new(text, sp(at.0, at.1))
}

fn name_at(text: &str, start: u32) -> Name {
    Name::new(text, Span::new(start, start + text.len() as u32))
}

pub fn int(value: i128, at: (u32, u32)) -> Expr {
    Expr::Literal(LiteralExpr {
        value: Literal::Int(value),
        span: sp(at.0, at.1),
    })
}

pub fn boolean(value: bool, at: (u32, u32)) -> Expr {
    Expr::Literal(LiteralExpr {
        value: Literal::Bool(value),
        span: sp(at.0, at.1),
    })
}

pub fn ident(text: &str, at: (u32, u32)) -> Expr {
    Expr::Ident(IdentExpr { name: nm(text, at) })
}

pub fn field(base: Expr, member: &str, at: (u32, u32)) -> Expr {
    let member_start = at.1 - member.len() as u32;
    Expr::Field(FieldExpr {
        base: Box::new(base),
        field: nm(member, (member_start, at.1)),
        span: sp(at.0, at.1),
    })
}

pub fn call(callee: Expr, args: Vec<Expr>, at: (u32, u32)) -> Expr {
    Expr::Call(CallExpr {
        callee: Box::new(callee),
        args,
        span: sp(at.0, at.1),
    })
}

pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, at: (u32, u32)) -> Expr {
    Expr::Binary(BinaryExpr {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        span: sp(at.0, at.1),
    })
}

pub fn ty_ident(text: &str, at: (u32, u32)) -> TypeNode {
    TypeNode::Ident(nox_syntax::ast::IdentType { name: nm(text, at) })
}

pub fn let_stmt(name: &str, at: (u32, u32), ty: Option<TypeNode>, init: Option<Expr>) -> Stmt {
    Stmt::Let(nox_syntax::ast::LetStmt {
        name: name_at(name, at.0),
        ty,
        init,
        mutability: Mutability::Immutable,
        visibility: Visibility::Private,
        span: sp(at.0, at.1),
    })
}

pub fn let_mut(name: &str, at: (u32, u32), ty: Option<TypeNode>, init: Option<Expr>) -> Stmt {
    match let_stmt(name, at, ty, init) {
        Stmt::Let(mut stmt) => {
            stmt.mutability = Mutability::Mutable;
            Stmt::Let(stmt)
        }
        other => other,
    }
}

pub fn param(name: &str, at: (u32, u32), ty: Option<TypeNode>) -> Param {
    Param {
        name: name_at(name, at.0),
        ty,
        default: None,
        span: sp(at.0, at.1),
    }
}

pub fn param_default(name: &str, at: (u32, u32), ty: Option<TypeNode>, default: Expr) -> Param {
    Param {
        name: name_at(name, at.0),
        ty,
        default: Some(default),
        span: sp(at.0, at.1),
    }
}

pub fn func(name: &str, at: (u32, u32), params: Vec<Param>, ret: Option<TypeNode>, body: Vec<Stmt>) -> Stmt {
    Stmt::Func(func_decl(name, at, params, ret, body))
}

pub fn func_decl(
    name: &str,
    at: (u32, u32),
    params: Vec<Param>,
    ret: Option<TypeNode>,
    body: Vec<Stmt>,
) -> FuncDecl {
    FuncDecl {
        name: name_at(name, at.0),
        params,
        ret,
        error_ty: None,
        body,
        visibility: Visibility::Private,
        is_static: false,
        is_comptime: false,
        span: sp(at.0, at.1),
    }
}

pub fn def_stmt(name: &str, at: (u32, u32), ty: TypeNode) -> Stmt {
    Stmt::Def(nox_syntax::ast::DefStmt {
        name: name_at(name, at.0),
        ty,
        visibility: Visibility::Private,
        span: sp(at.0, at.1),
    })
}

pub fn struct_field(name: &str, at: (u32, u32), ty: TypeNode) -> StructField {
    StructField {
        name: name_at(name, at.0),
        ty,
        default: None,
        is_static: false,
        visibility: Visibility::Private,
        span: sp(at.0, at.1),
    }
}

pub fn use_module(target: &str, at: (u32, u32)) -> Stmt {
    Stmt::Use(UseStmt {
        module: name_at(target, at.0),
        members: UseMembers::Module,
        alias: None,
        visibility: Visibility::Private,
        span: sp(at.0, at.1),
    })
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    let span = expr.span();
    Stmt::Expr(nox_syntax::ast::ExprStmt { expr, span })
}

pub fn ret_stmt(value: Option<Expr>, at: (u32, u32)) -> Stmt {
    Stmt::Return(nox_syntax::ast::ReturnStmt {
        value,
        span: sp(at.0, at.1),
    })
}

pub fn module(name: &str, stmts: Vec<Stmt>) -> Module {
    Module::new(name, format!("{name}.nx"), stmts)
}

pub fn program(modules: Vec<Module>) -> Program {
    let mut program = Program::new();
    for module in modules {
        program.add_module(module);
    }
    program
}

pub fn program_with_entry(entry: &str, modules: Vec<Module>) -> Program {
    let mut program = program(modules);
    program.entry_module = Some(entry.to_string());
    program
}

pub fn i32_ty() -> TypeNode {
    prim(Primitive::I32)
}

pub fn bool_ty() -> TypeNode {
    prim(Primitive::Bool)
}

pub fn analyze(program: &Program) -> AnalysisResult {
    Analyzer::new(AnalyzerConfig::default()).analyze(program)
}

/// Deduplicated diagnostic codes from a full four-phase run.
pub fn codes(program: &Program) -> Vec<DiagnosticCode> {
    analyze(program).diagnostics.iter().map(|d| d.code).collect()
}

pub fn count_of(codes: &[DiagnosticCode], code: DiagnosticCode) -> usize {
    codes.iter().filter(|&&c| c == code).count()
}
