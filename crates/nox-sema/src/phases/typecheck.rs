//! Phase 3: type validation.
//!
//! Walks every statement with resolution's scope tree in hand, checking
//! annotations against initializers, call signatures against arguments,
//! conditions against `bool`, and `throw` against the declared error
//! type. Constant-foldable expressions run through the evaluator here,
//! which is where overflow and division-by-zero surface.

use nox_syntax::ast::{
    AssignExpr, BinaryOp, CallExpr, FuncDecl, Mutability, Primitive, StructInitExpr, SwitchExpr,
    SwitchPattern, UnaryOp,
};
use nox_syntax::{Expr, Literal, Program, Span, Stmt, TypeNode};
use rustc_hash::FxHashSet;

use super::Services;
use crate::context::{ContextTracker, ExprContextKind};
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::eval::{EvalContext, ExpressionEvaluator, Value};
use crate::scope::{ScopeId, ScopeManager, SymbolKind};
use crate::types::{display_type, is_compatible, InferContext, TypeEnv, TypeInference};

pub(crate) fn run(services: &mut Services, program: &Program) {
    for (name, module) in program.iter() {
        let Some(&scope) = services.module_scopes.get(name) else {
            continue;
        };
        services.enter_module(name, &module.path);
        let mut checker = Checker {
            scopes: &mut services.scopes,
            tracker: &mut services.tracker,
            diagnostics: &mut services.diagnostics,
            evaluator: &mut services.evaluator,
            inference: &mut services.inference,
            module_name: name,
            fn_stack: Vec::new(),
            loop_depth: 0,
        };
        checker.check_stmts(scope, &module.stmts);
    }
    services.leave_module();
}

/// Signature of the function whose body is being checked.
struct FnSig {
    ret: Option<TypeNode>,
    error_ty: Option<TypeNode>,
}

struct Checker<'a> {
    scopes: &'a mut ScopeManager,
    tracker: &'a mut ContextTracker,
    diagnostics: &'a mut Diagnostics,
    evaluator: &'a mut ExpressionEvaluator,
    inference: &'a mut TypeInference,
    module_name: &'a str,
    fn_stack: Vec<FnSig>,
    loop_depth: u32,
}

impl Checker<'_> {
    fn check_stmts(&mut self, scope: ScopeId, stmts: &[Stmt]) {
        for stmt in stmts {
            let cp = self.tracker.checkpoint();
            self.check_stmt(scope, stmt);
            self.tracker.restore(cp);
        }
    }

    fn check_stmt(&mut self, scope: ScopeId, stmt: &Stmt) {
        self.tracker.push_context_span(stmt.span());
        self.diagnostics.set_ambient_span(Some(stmt.span()));
        match stmt {
            Stmt::Def(def) => self.check_type_sizes(scope, &def.ty),
            Stmt::Use(_) => {}
            Stmt::Let(stmt) => self.check_let(scope, stmt),
            Stmt::Func(decl) => self.check_function(scope, decl),
            Stmt::Block(block) => {
                if let Some(inner) = self.scopes.find_child_at(scope, block.span) {
                    self.check_stmts(inner, &block.stmts);
                }
            }
            Stmt::Test(test) => {
                if let Some(inner) = self.scopes.find_child_at(scope, test.span) {
                    self.check_stmts(inner, &test.body);
                }
            }
            Stmt::Return(stmt) => self.check_return(scope, stmt.value.as_ref(), stmt.span),
            Stmt::Defer(stmt) => self.check_stmt(scope, &stmt.body),
            Stmt::Throw(stmt) => self.check_throw(scope, &stmt.value, stmt.span),
            Stmt::While(stmt) => {
                self.expect_bool(scope, &stmt.cond);
                self.check_expr(scope, &stmt.cond);
                if let Some(inner) = self.scopes.find_child_at(scope, stmt.span) {
                    self.loop_depth += 1;
                    self.check_stmts(inner, &stmt.body);
                    self.loop_depth -= 1;
                }
            }
            Stmt::Do(stmt) => {
                if let Some(inner) = self.scopes.find_child_at(scope, stmt.span) {
                    self.loop_depth += 1;
                    self.check_stmts(inner, &stmt.body);
                    self.loop_depth -= 1;
                }
                self.expect_bool(scope, &stmt.cond);
                self.check_expr(scope, &stmt.cond);
            }
            Stmt::For(stmt) => {
                self.check_expr(scope, &stmt.iterable);
                if let Some(inner) = self.scopes.find_child_at(scope, stmt.span) {
                    self.loop_depth += 1;
                    self.check_stmts(inner, &stmt.body);
                    self.loop_depth -= 1;
                }
            }
            Stmt::Expr(stmt) => {
                self.check_expr(scope, &stmt.expr);
            }
            Stmt::Break(stmt) => {
                if self.loop_depth == 0 {
                    self.diagnostics
                        .report(DiagnosticCode::BreakOutsideLoop)
                        .target(stmt.span)
                        .emit();
                }
            }
            Stmt::Continue(stmt) => {
                if self.loop_depth == 0 {
                    self.diagnostics
                        .report(DiagnosticCode::ContinueOutsideLoop)
                        .target(stmt.span)
                        .emit();
                }
            }
        }
        self.tracker.pop_context_span();
    }

    fn check_let(&mut self, scope: ScopeId, stmt: &nox_syntax::ast::LetStmt) {
        if stmt.ty.is_none() && stmt.init.is_none() {
            self.diagnostics
                .report(DiagnosticCode::TypeAnnotationRequired)
                .message(format!("`{}` has neither a type nor an initializer", stmt.name.text))
                .target(stmt.name.span)
                .emit();
            return;
        }
        if let Some(ty) = &stmt.ty {
            self.check_type_sizes(scope, ty);
        }

        let Some(init) = &stmt.init else {
            return;
        };
        self.tracker
            .push_expr_context(ExprContextKind::VariableInitializer, stmt.ty.clone());
        self.check_expr(scope, init);
        self.tracker.pop_expr_context();

        let inferred = self.infer(scope, init);
        if let Some(source) = &inferred {
            if source.as_primitive() == Some(Primitive::Void) {
                self.diagnostics
                    .report(DiagnosticCode::VoidValueUsed)
                    .target(init.span())
                    .emit();
                return;
            }
            if let Some(target) = &stmt.ty
                && !self.compatible(scope, target, source)
            {
                self.mismatch(DiagnosticCode::TypeMismatch, target, source, init.span());
            }
        }

        // Fold the initializer; immutable bindings with a constant value
        // become visible to later constant expressions.
        let mut cx = EvalContext {
            scopes: self.scopes,
            diagnostics: self.diagnostics,
            scope,
        };
        let folded = self.evaluator.eval(init, stmt.ty.as_ref(), &mut cx);

        if let Some(id) = self.scopes.lookup_local(scope, &stmt.name.text) {
            if stmt.ty.is_none()
                && let Some(ty) = inferred
            {
                self.scopes.set_symbol_type(id, ty);
            }
            if let Ok(value) = folded
                && stmt.mutability == Mutability::Immutable
            {
                self.evaluator.record_const(id, value);
            }
            if let Some(symbol) = self.scopes.symbol_mut(id) {
                symbol.flags.type_checked = true;
            }
        }
    }

    fn check_function(&mut self, scope: ScopeId, decl: &FuncDecl) {
        let Some(fn_scope) = self.scopes.find_child_at(scope, decl.span) else {
            return;
        };
        for param in &decl.params {
            if let Some(ty) = &param.ty {
                self.check_type_sizes(fn_scope, ty);
            }
            if let Some(default) = &param.default {
                self.tracker
                    .push_expr_context(ExprContextKind::ParameterDefault, param.ty.clone());
                self.check_expr(fn_scope, default);
                self.tracker.pop_expr_context();
                if let Some(target) = &param.ty
                    && let Some(source) = self.infer(fn_scope, default)
                    && !self.compatible(fn_scope, target, &source)
                {
                    self.mismatch(
                        DiagnosticCode::TypeMismatch,
                        target,
                        &source,
                        default.span(),
                    );
                }
            }
        }
        self.fn_stack.push(FnSig {
            ret: decl.ret.clone(),
            error_ty: decl.error_ty.clone(),
        });
        let saved_depth = self.loop_depth;
        self.loop_depth = 0;
        self.check_stmts(fn_scope, &decl.body);
        self.loop_depth = saved_depth;
        self.fn_stack.pop();
    }

    fn check_return(&mut self, scope: ScopeId, value: Option<&Expr>, span: Span) {
        let Some(sig) = self.fn_stack.last() else {
            self.diagnostics
                .report(DiagnosticCode::ReturnOutsideFunction)
                .target(span)
                .emit();
            return;
        };
        let declared = sig.ret.clone();
        let returns_void = declared
            .as_ref()
            .is_none_or(|t| t.as_primitive() == Some(Primitive::Void));
        match value {
            None => {
                if !returns_void {
                    let target = declared.as_ref().map(|t| display_type(t)).unwrap_or_default();
                    self.diagnostics
                        .report(DiagnosticCode::ReturnTypeMismatch)
                        .message(format!("expected `{target}`, found no value"))
                        .target(span)
                        .emit();
                }
            }
            Some(value) => {
                self.tracker
                    .push_expr_context(ExprContextKind::ReturnExpression, declared.clone());
                self.check_expr(scope, value);
                self.tracker.pop_expr_context();
                if returns_void {
                    if self
                        .infer(scope, value)
                        .is_some_and(|t| t.as_primitive() != Some(Primitive::Void))
                    {
                        self.diagnostics
                            .report(DiagnosticCode::ReturnTypeMismatch)
                            .message("function does not return a value")
                            .target(value.span())
                            .emit();
                    }
                } else if let Some(target) = &declared
                    && let Some(source) = self.infer(scope, value)
                    && !self.compatible(scope, target, &source)
                {
                    self.mismatch(
                        DiagnosticCode::ReturnTypeMismatch,
                        target,
                        &source,
                        value.span(),
                    );
                }
            }
        }
    }

    fn check_throw(&mut self, scope: ScopeId, value: &Expr, span: Span) {
        let Some(sig) = self.fn_stack.last() else {
            self.check_expr(scope, value);
            self.diagnostics
                .report(DiagnosticCode::ThrowOutsideFunction)
                .target(span)
                .emit();
            return;
        };
        let Some(error_ty) = sig.error_ty.clone() else {
            self.check_expr(scope, value);
            self.diagnostics
                .report(DiagnosticCode::ThrowWithoutErrorType)
                .target(span)
                .emit();
            return;
        };

        let underlying = TypeEnv::new(self.scopes, scope).underlying(&error_ty);
        if let TypeNode::ErrSet(set) = &underlying {
            // Thrown error-set values name a variant, either bare or
            // through a `Set.Variant` access. Variant names are matched
            // against the set directly rather than via member lookup.
            let variant = match value.unparenthesized() {
                Expr::Field(field) => Some(&field.field),
                Expr::Ident(ident) => Some(&ident.name),
                _ => None,
            };
            if let Some(variant) = variant {
                if !set.variants.iter().any(|v| v.text == variant.text) {
                    self.diagnostics
                        .report(DiagnosticCode::UnknownErrorVariant)
                        .message(&variant.text)
                        .target(variant.span)
                        .emit();
                }
                return;
            }
        }
        self.check_expr(scope, value);
        if let Some(source) = self.infer(scope, value)
            && !self.compatible(scope, &error_ty, &source)
        {
            self.mismatch(
                DiagnosticCode::ThrowTypeMismatch,
                &error_ty,
                &source,
                value.span(),
            );
        }
    }

    // ===== expressions =====

    fn check_expr(&mut self, scope: ScopeId, expr: &Expr) {
        match expr.unparenthesized() {
            Expr::Literal(_) | Expr::Ident(_) | Expr::Builtin(_) => {}
            Expr::Unary(e) => {
                self.check_expr(scope, &e.operand);
                self.check_unary(scope, e.op, &e.operand, e.span);
            }
            Expr::Binary(e) => {
                self.check_expr(scope, &e.lhs);
                self.check_expr(scope, &e.rhs);
                self.check_binary_operands(scope, e);
                // Fold constant subtrees; hard failures report themselves.
                let mut cx = EvalContext {
                    scopes: self.scopes,
                    diagnostics: self.diagnostics,
                    scope,
                };
                let _ = self.evaluator.eval(expr, None, &mut cx);
            }
            Expr::Assign(e) => self.check_assign(scope, e),
            Expr::Call(e) => self.check_call(scope, e),
            Expr::Field(e) => {
                self.check_expr(scope, &e.base);
                if let Some(base) = self.infer(scope, &e.base)
                    && !self.has_member(scope, &base, &e.field.text)
                {
                    self.diagnostics
                        .report(DiagnosticCode::UndefinedMember)
                        .message(&e.field.text)
                        .target(e.field.span)
                        .emit();
                }
            }
            Expr::Index(e) => {
                self.check_expr(scope, &e.base);
                self.check_expr(scope, &e.index);
                if let Some(base) = self.infer(scope, &e.base) {
                    let shape = TypeEnv::new(self.scopes, scope).underlying(&base);
                    let indexable = matches!(shape, TypeNode::Array(_) | TypeNode::Pointer(_))
                        || shape.as_primitive() == Some(Primitive::Any)
                        || shape.as_primitive() == Some(Primitive::Str);
                    if !indexable {
                        self.diagnostics
                            .report(DiagnosticCode::NotIndexable)
                            .message(format!("`{}` cannot be indexed", display_type(&base)))
                            .target(e.base.span())
                            .emit();
                    }
                }
            }
            Expr::StructInit(e) => self.check_struct_init(scope, e),
            Expr::Cast(e) => {
                self.check_expr(scope, &e.value);
                self.check_type_sizes(scope, &e.ty);
                if let (Some(target), Some(source)) = (
                    e.ty.as_primitive(),
                    self.infer(scope, &e.value).and_then(|t| t.as_primitive()),
                ) && target != source
                    && !(target.is_numeric() && source.is_numeric())
                    && target != Primitive::Any
                    && source != Primitive::Any
                {
                    self.diagnostics
                        .report(DiagnosticCode::InvalidCast)
                        .message(format!("`{}` to `{}`", source.name(), target.name()))
                        .target(e.span)
                        .emit();
                }
            }
            Expr::SizeOf(e) => self.check_type_sizes(scope, &e.ty),
            Expr::If(e) => {
                self.expect_bool(scope, &e.cond);
                self.check_expr(scope, &e.cond);
                if let Some(inner) = self.scopes.find_child_at(scope, e.span) {
                    self.check_stmts(inner, &e.then_body);
                    if let Some(else_body) = &e.else_body {
                        self.check_stmts(inner, else_body);
                    }
                }
            }
            Expr::Switch(e) => self.check_switch(scope, e),
            Expr::Try(e) => {
                if let Some(inner) = self.scopes.find_child_at(scope, e.span) {
                    self.check_expr(inner, &e.inner);
                } else {
                    self.check_expr(scope, &e.inner);
                }
                if self.callee_cannot_fail(scope, &e.inner) {
                    self.diagnostics
                        .report(DiagnosticCode::TryWithoutErrorType)
                        .target(e.span)
                        .emit();
                }
            }
            Expr::Catch(e) => {
                self.check_expr(scope, &e.inner);
                if let Some(inner) = self.scopes.find_child_at(scope, e.span) {
                    self.check_stmts(inner, &e.handler);
                }
            }
            Expr::Paren(_) => {}
        }
    }

    fn check_unary(&mut self, scope: ScopeId, op: UnaryOp, operand: &Expr, span: Span) {
        let Some(ty) = self.infer(scope, operand) else {
            return;
        };
        let shape = TypeEnv::new(self.scopes, scope).underlying(&ty);
        if shape.as_primitive() == Some(Primitive::Any) {
            return;
        }
        match op {
            UnaryOp::Deref => {
                if !matches!(shape, TypeNode::Pointer(_)) {
                    self.diagnostics
                        .report(DiagnosticCode::DerefNonPointer)
                        .message(format!("`{}` is not a pointer", display_type(&ty)))
                        .target(span)
                        .emit();
                }
            }
            UnaryOp::Neg => {
                if !shape.as_primitive().is_some_and(Primitive::is_numeric) {
                    self.invalid_unary(&ty, "-", span);
                }
            }
            UnaryOp::BitNot => {
                if !shape.as_primitive().is_some_and(Primitive::is_integer) {
                    self.invalid_unary(&ty, "~", span);
                }
            }
            UnaryOp::Not => {
                if shape.as_primitive() != Some(Primitive::Bool) {
                    self.invalid_unary(&ty, "!", span);
                }
            }
            UnaryOp::AddrOf => {}
        }
    }

    fn invalid_unary(&mut self, ty: &TypeNode, op: &str, span: Span) {
        self.diagnostics
            .report(DiagnosticCode::InvalidUnaryOperand)
            .message(format!("`{op}` cannot be applied to `{}`", display_type(ty)))
            .target(span)
            .emit();
    }

    fn check_binary_operands(&mut self, scope: ScopeId, e: &nox_syntax::ast::BinaryExpr) {
        let lhs = self.infer(scope, &e.lhs);
        let rhs = self.infer(scope, &e.rhs);
        for ty in [&lhs, &rhs] {
            let Some(ty) = ty else { continue };
            let Some(prim) = TypeEnv::new(self.scopes, scope).underlying(ty).as_primitive()
            else {
                // Non-primitive operands only make sense for equality.
                if !matches!(e.op, BinaryOp::Eq | BinaryOp::Ne) {
                    self.invalid_operand(ty, e.op, e.span);
                }
                continue;
            };
            if prim == Primitive::Any {
                continue;
            }
            let ok = if e.op.is_logical() {
                prim == Primitive::Bool
            } else if e.op.is_bitwise() {
                prim.is_integer()
            } else if e.op.is_arithmetic() {
                prim.is_numeric()
            } else {
                true
            };
            if !ok {
                self.invalid_operand(ty, e.op, e.span);
            }
        }
    }

    fn invalid_operand(&mut self, ty: &TypeNode, op: BinaryOp, span: Span) {
        self.diagnostics
            .report(DiagnosticCode::InvalidOperandType)
            .message(format!(
                "`{}` cannot be applied to `{}`",
                op.symbol(),
                display_type(ty)
            ))
            .target(span)
            .emit();
    }

    fn check_assign(&mut self, scope: ScopeId, e: &AssignExpr) {
        self.check_expr(scope, &e.value);
        match e.target.unparenthesized() {
            Expr::Ident(ident) => {
                let found = self
                    .scopes
                    .lookup_in_scope_chain(scope, &ident.name.text)
                    .and_then(|id| self.scopes.symbol(id));
                if let Some(symbol) = found {
                    if matches!(symbol.kind, SymbolKind::Variable | SymbolKind::Parameter)
                        && symbol.mutability == Mutability::Immutable
                    {
                        self.diagnostics
                            .report(DiagnosticCode::ImmutableAssignment)
                            .message(format!("`{}` is not mutable", ident.name.text))
                            .target(ident.name.span)
                            .emit();
                    }
                    if let Some(target) = symbol.ty.clone()
                        && let Some(source) = self.infer(scope, &e.value)
                        && !self.compatible(scope, &target, &source)
                    {
                        self.mismatch(
                            DiagnosticCode::TypeMismatch,
                            &target,
                            &source,
                            e.value.span(),
                        );
                    }
                }
            }
            Expr::Field(_) | Expr::Index(_) => self.check_expr(scope, &e.target),
            Expr::Unary(unary) if unary.op == UnaryOp::Deref => self.check_expr(scope, &e.target),
            _ => {
                self.diagnostics
                    .report(DiagnosticCode::InvalidAssignTarget)
                    .target(e.target.span())
                    .emit();
            }
        }
    }

    fn check_call(&mut self, scope: ScopeId, e: &CallExpr) {
        self.check_expr(scope, &e.callee);

        // Signature checks use the recorded callable metadata when the
        // callee is a plain name; other callees fall back to the shape.
        let meta = e.callee.as_ident().and_then(|name| {
            self.scopes
                .lookup_in_scope_chain(scope, &name.text)
                .and_then(|id| self.scopes.symbol(id))
                .and_then(|s| s.callable().cloned())
        });

        for (index, arg) in e.args.iter().enumerate() {
            let expected = meta
                .as_ref()
                .and_then(|m| m.params.get(index))
                .and_then(|p| p.ty.clone());
            self.tracker
                .push_expr_context(ExprContextKind::CallArgument, expected);
            self.check_expr(scope, arg);
            self.tracker.pop_expr_context();
        }

        if let Some(name) = e.callee.as_ident() {
            if let Some(meta) = meta {
                let required = meta.params.iter().filter(|p| !p.has_default).count();
                if e.args.len() < required || e.args.len() > meta.params.len() {
                    let expected = if required == meta.params.len() {
                        format!("{required}")
                    } else {
                        format!("{required} to {}", meta.params.len())
                    };
                    self.diagnostics
                        .report(DiagnosticCode::ArgumentCountMismatch)
                        .message(format!(
                            "`{}` takes {expected} argument(s), found {}",
                            name.text,
                            e.args.len()
                        ))
                        .target(e.span)
                        .emit();
                }
                for (arg, param) in e.args.iter().zip(&meta.params) {
                    if let Some(target) = &param.ty
                        && let Some(source) = self.infer(scope, arg)
                        && !self.compatible(scope, target, &source)
                    {
                        self.mismatch(
                            DiagnosticCode::ArgumentTypeMismatch,
                            target,
                            &source,
                            arg.span(),
                        );
                    }
                }
                return;
            }
        }
        if let Some(callee) = self.infer(scope, &e.callee) {
            let shape = TypeEnv::new(self.scopes, scope).underlying(&callee);
            if !matches!(shape, TypeNode::Function(_))
                && shape.as_primitive() != Some(Primitive::Any)
            {
                self.diagnostics
                    .report(DiagnosticCode::NotCallable)
                    .message(format!("`{}` is not a function", display_type(&callee)))
                    .target(e.callee.span())
                    .emit();
            }
        }
    }

    fn check_struct_init(&mut self, scope: ScopeId, e: &StructInitExpr) {
        for field in &e.fields {
            self.check_expr(scope, &field.value);
        }
        // Named inits carry their own type; anonymous ones take the
        // expected type recorded for the surrounding position. The
        // missing-field target stays off the provided fields so
        // field-level diagnostics are not blanketed.
        let (target, missing_span) = match &e.ty {
            Some(name) => (
                TypeNode::Ident(nox_syntax::ast::IdentType { name: name.clone() }),
                name.span,
            ),
            None => {
                let Some(expected) = self.tracker.expected_type().cloned() else {
                    return;
                };
                (expected, e.span)
            }
        };
        let TypeNode::Struct(def) = TypeEnv::new(self.scopes, scope).underlying(&target) else {
            return;
        };

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for init in &e.fields {
            if !seen.insert(init.name.text.as_str()) {
                self.diagnostics
                    .report(DiagnosticCode::DuplicateFieldInit)
                    .message(&init.name.text)
                    .target(init.name.span)
                    .emit();
                continue;
            }
            let Some(field) = def.fields.iter().find(|f| f.name.text == init.name.text) else {
                self.diagnostics
                    .report(DiagnosticCode::UnknownField)
                    .message(&init.name.text)
                    .target(init.name.span)
                    .emit();
                continue;
            };
            if field.is_static {
                self.diagnostics
                    .report(DiagnosticCode::StaticFieldInit)
                    .message(format!("`{}` is a static field", init.name.text))
                    .target(init.name.span)
                    .emit();
                continue;
            }
            if let Some(source) = self.infer(scope, &init.value)
                && !self.compatible(scope, &field.ty, &source)
            {
                self.mismatch(
                    DiagnosticCode::TypeMismatch,
                    &field.ty,
                    &source,
                    init.value.span(),
                );
            }
        }
        for field in &def.fields {
            if !field.is_static
                && field.default.is_none()
                && !seen.contains(field.name.text.as_str())
            {
                self.diagnostics
                    .report(DiagnosticCode::MissingRequiredField)
                    .message(&field.name.text)
                    .target(missing_span)
                    .context(e.span)
                    .emit();
            }
        }
    }

    fn check_switch(&mut self, scope: ScopeId, e: &SwitchExpr) {
        self.check_expr(scope, &e.scrutinee);
        let inner = self.scopes.find_child_at(scope, e.span);

        let mut has_default = false;
        let mut covered_names: FxHashSet<String> = FxHashSet::default();
        let mut covered_ints: FxHashSet<i128> = FxHashSet::default();
        let mut covered_bools: FxHashSet<bool> = FxHashSet::default();
        for arm in &e.arms {
            match &arm.pattern {
                SwitchPattern::Default => {
                    if has_default {
                        self.diagnostics
                            .report(DiagnosticCode::SwitchDuplicateArm)
                            .raw_message("duplicate `else` arm".to_string())
                            .target(arm.span)
                            .emit();
                    }
                    has_default = true;
                }
                SwitchPattern::Expr(pattern) => {
                    self.check_expr(scope, pattern);
                    let duplicate = match pattern.unparenthesized() {
                        Expr::Literal(lit) => match &lit.value {
                            Literal::Int(v) => !covered_ints.insert(*v),
                            Literal::Bool(v) => !covered_bools.insert(*v),
                            _ => false,
                        },
                        Expr::Ident(ident) => !covered_names.insert(ident.name.text.clone()),
                        Expr::Field(field) => !covered_names.insert(field.field.text.clone()),
                        _ => false,
                    };
                    if duplicate {
                        self.diagnostics
                            .report(DiagnosticCode::SwitchDuplicateArm)
                            .target(pattern.span())
                            .emit();
                    }
                }
            }
            if let Some(inner) = inner {
                self.check_stmts(inner, &arm.body);
            }
        }

        if has_default {
            return;
        }
        let Some(ty) = self.infer(scope, &e.scrutinee) else {
            return;
        };
        match TypeEnv::new(self.scopes, scope).underlying(&ty) {
            TypeNode::Enum(def) => {
                let missing: Vec<&str> = def
                    .variants
                    .iter()
                    .filter(|v| !covered_names.contains(&v.name.text))
                    .map(|v| v.name.text.as_str())
                    .collect();
                if !missing.is_empty() {
                    self.diagnostics
                        .report(DiagnosticCode::SwitchNotExhaustive)
                        .message(format!("uncovered variant(s): {}", missing.join(", ")))
                        .target(e.span)
                        .emit();
                }
            }
            shape if shape.as_primitive() == Some(Primitive::Bool) => {
                if !(covered_bools.contains(&true) && covered_bools.contains(&false)) {
                    self.diagnostics
                        .report(DiagnosticCode::SwitchNotExhaustive)
                        .message("`bool` needs both `true` and `false` arms or an `else`")
                        .target(e.span)
                        .emit();
                }
            }
            _ => {}
        }
    }

    // ===== helpers =====

    fn infer(&mut self, scope: ScopeId, expr: &Expr) -> Option<TypeNode> {
        let cx = InferContext {
            scopes: self.scopes,
            module: self.module_name,
            scope,
        };
        self.inference.infer(expr, &cx)
    }

    fn compatible(&self, scope: ScopeId, target: &TypeNode, source: &TypeNode) -> bool {
        let env = TypeEnv::new(self.scopes, scope);
        is_compatible(&env, target, source)
    }

    fn mismatch(&mut self, code: DiagnosticCode, target: &TypeNode, source: &TypeNode, span: Span) {
        self.diagnostics
            .report(code)
            .message(format!(
                "expected `{}`, found `{}`",
                display_type(target),
                display_type(source)
            ))
            .target(span)
            .emit();
    }

    fn expect_bool(&mut self, scope: ScopeId, cond: &Expr) {
        let Some(ty) = self.infer(scope, cond) else {
            return;
        };
        let prim = TypeEnv::new(self.scopes, scope).underlying(&ty).as_primitive();
        if !matches!(prim, Some(Primitive::Bool) | Some(Primitive::Any)) {
            self.diagnostics
                .report(DiagnosticCode::ConditionNotBool)
                .message(format!("found `{}`", display_type(&ty)))
                .target(cond.span())
                .emit();
        }
    }

    fn has_member(&self, scope: ScopeId, base: &TypeNode, member: &str) -> bool {
        match TypeEnv::new(self.scopes, scope).underlying(base) {
            TypeNode::Struct(s) => {
                s.fields.iter().any(|f| f.name.text == member)
                    || s.methods.iter().any(|m| m.name.text == member)
            }
            TypeNode::Enum(e) => e.variants.iter().any(|v| v.name.text == member),
            TypeNode::ErrSet(e) => e.variants.iter().any(|v| v.text == member),
            shape => shape.as_primitive() == Some(Primitive::Any),
        }
    }

    /// `try` is only meaningful on a call whose callee declares an error
    /// type; anything unknown passes.
    fn callee_cannot_fail(&self, scope: ScopeId, inner: &Expr) -> bool {
        let Expr::Call(call) = inner.unparenthesized() else {
            return false;
        };
        let Some(name) = call.callee.as_ident() else {
            return false;
        };
        self.scopes
            .lookup_in_scope_chain(scope, &name.text)
            .and_then(|id| self.scopes.symbol(id))
            .and_then(|s| s.callable())
            .is_some_and(|meta| meta.error_ty.is_none())
    }

    /// Walk a type node and validate every fixed array size in it.
    fn check_type_sizes(&mut self, scope: ScopeId, ty: &TypeNode) {
        match ty.unparenthesized() {
            TypeNode::Array(array) => {
                self.check_type_sizes(scope, &array.elem);
                let Some(size) = array.size.as_deref() else {
                    return;
                };
                let mut cx = EvalContext {
                    scopes: self.scopes,
                    diagnostics: self.diagnostics,
                    scope,
                };
                match self.evaluator.eval(size, None, &mut cx) {
                    Ok(Value::Int(v)) if v < 0 => {
                        self.diagnostics
                            .report(DiagnosticCode::ArraySizeNegative)
                            .message(format!("size is {v}"))
                            .target(size.span())
                            .emit();
                    }
                    Ok(Value::Int(_)) => {}
                    Ok(_) | Err(_) => {
                        self.diagnostics
                            .report(DiagnosticCode::ArraySizeNotConstant)
                            .target(size.span())
                            .emit();
                    }
                }
            }
            TypeNode::Optional(t) => self.check_type_sizes(scope, &t.inner),
            TypeNode::Pointer(t) => self.check_type_sizes(scope, &t.pointee),
            TypeNode::Tuple(t) => {
                for elem in &t.elems {
                    self.check_type_sizes(scope, elem);
                }
            }
            TypeNode::Struct(t) => {
                for field in &t.fields {
                    self.check_type_sizes(scope, &field.ty);
                }
            }
            TypeNode::Union(t) => {
                for member in &t.members {
                    self.check_type_sizes(scope, member);
                }
            }
            _ => {}
        }
    }
}
