//! Phase 1: symbol collection.
//!
//! Builds the scope tree and symbol entries from the AST. Per module,
//! top-level statements are collected in three ordered sub-passes —
//! definitions/variables/functions, then imports, then everything else —
//! so later phases see a fully populated export table regardless of
//! source order.

use nox_syntax::ast::{
    CatchExpr, EnumType, ErrSetType, FuncDecl, IfExpr, Literal, Mutability, Name, Primitive,
    StructType, SwitchExpr, UseMembers, Visibility,
};
use nox_syntax::{Expr, Module, Program, Span, Stmt, TypeNode};
use rustc_hash::FxHashSet;

use super::Services;
use crate::context::ContextTracker;
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::scope::{
    BindingKind, CallableMeta, ImportMeta, ParamMeta, ScopeId, ScopeKind, ScopeManager,
    SymbolId, SymbolKind, SymbolMeta, SymbolOptions, TypeScopeKind,
};
use crate::types::primitive;

/// Nesting ceiling for type bodies; deeper is treated as runaway
/// recursion rather than legitimate indirection.
const MAX_TYPE_DEPTH: u32 = 100;

pub(crate) fn run(services: &mut Services, program: &Program) {
    for (name, module) in program.iter() {
        let scope = services
            .scopes
            .create_scope(ScopeKind::Module, name, ScopeId::GLOBAL);
        services.module_scopes.insert(name.to_string(), scope);
        services.enter_module(name, &module.path);

        let mut collector = Collector {
            scopes: &mut services.scopes,
            tracker: &mut services.tracker,
            diagnostics: &mut services.diagnostics,
            visited_types: FxHashSet::default(),
            type_depth: 0,
        };
        collector.collect_module(scope, module);
    }
    services.leave_module();
}

struct Collector<'a> {
    scopes: &'a mut ScopeManager,
    tracker: &'a mut ContextTracker,
    diagnostics: &'a mut Diagnostics,
    visited_types: FxHashSet<(&'static str, Span, Option<String>)>,
    type_depth: u32,
}

impl Collector<'_> {
    fn collect_module(&mut self, scope: ScopeId, module: &Module) {
        self.tracker.set_scope(scope);

        let mut definitions = Vec::new();
        let mut imports = Vec::new();
        let mut rest = Vec::new();
        for stmt in &module.stmts {
            match stmt {
                Stmt::Def(_) | Stmt::Let(_) | Stmt::Func(_) => definitions.push(stmt),
                Stmt::Use(_) => imports.push(stmt),
                _ => rest.push(stmt),
            }
        }
        for stmt in definitions.into_iter().chain(imports).chain(rest) {
            let cp = self.tracker.checkpoint();
            self.collect_stmt(scope, stmt);
            self.tracker.restore(cp);
        }
    }

    fn collect_stmt(&mut self, scope: ScopeId, stmt: &Stmt) {
        self.tracker.push_context_span(stmt.span());
        match stmt {
            Stmt::Def(def) => {
                let symbol = self.define_checked(
                    scope,
                    &def.name,
                    SymbolKind::Definition,
                    SymbolOptions {
                        ty: Some(def.ty.clone()),
                        context_span: Some(def.span),
                        target_span: Some(def.name.span),
                        visibility: def.visibility,
                        declared: true,
                        initialized: true,
                        ..SymbolOptions::default()
                    },
                );
                if let Some(symbol) = symbol {
                    self.build_type_body(scope, symbol, &def.name, &def.ty);
                    self.check_type_cycles(scope, Some(def.name.text.clone()), &def.ty);
                }
            }
            Stmt::Use(import) => self.collect_import(scope, import),
            Stmt::Let(stmt) => {
                self.define_checked(
                    scope,
                    &stmt.name,
                    SymbolKind::Variable,
                    SymbolOptions {
                        ty: stmt.ty.clone(),
                        context_span: Some(stmt.span),
                        target_span: Some(stmt.name.span),
                        visibility: stmt.visibility,
                        mutability: stmt.mutability,
                        declared: true,
                        initialized: stmt.init.is_some(),
                        ..SymbolOptions::default()
                    },
                );
                if let Some(init) = &stmt.init {
                    self.collect_expr(scope, init);
                }
            }
            Stmt::Func(decl) => self.collect_function(scope, decl, None),
            Stmt::Block(block) => {
                let inner = self.scopes.create_scope(ScopeKind::Block, "block", scope);
                self.scopes.set_scope_span(inner, block.span);
                for stmt in &block.stmts {
                    self.collect_stmt(inner, stmt);
                }
            }
            Stmt::Test(test) => {
                let name = test.name.as_deref().unwrap_or("test");
                let inner = self.scopes.create_scope(ScopeKind::Block, name, scope);
                self.scopes.set_scope_span(inner, test.span);
                for stmt in &test.body {
                    self.collect_stmt(inner, stmt);
                }
            }
            Stmt::While(stmt) => {
                self.collect_expr(scope, &stmt.cond);
                let inner = self.scopes.create_scope(ScopeKind::Loop, "while", scope);
                self.scopes.set_scope_span(inner, stmt.span);
                for stmt in &stmt.body {
                    self.collect_stmt(inner, stmt);
                }
            }
            Stmt::Do(stmt) => {
                let inner = self.scopes.create_scope(ScopeKind::Loop, "do", scope);
                self.scopes.set_scope_span(inner, stmt.span);
                for stmt in &stmt.body {
                    self.collect_stmt(inner, stmt);
                }
                self.collect_expr(scope, &stmt.cond);
            }
            Stmt::For(stmt) => {
                self.collect_expr(scope, &stmt.iterable);
                let inner = self.scopes.create_scope(ScopeKind::Loop, "for", scope);
                self.scopes.set_scope_span(inner, stmt.span);
                self.define_checked(
                    inner,
                    &stmt.binding,
                    SymbolKind::Variable,
                    SymbolOptions {
                        context_span: Some(stmt.span),
                        target_span: Some(stmt.binding.span),
                        declared: true,
                        initialized: true,
                        ..SymbolOptions::default()
                    },
                );
                for stmt in &stmt.body {
                    self.collect_stmt(inner, stmt);
                }
            }
            Stmt::Return(stmt) => {
                if let Some(value) = &stmt.value {
                    self.collect_expr(scope, value);
                }
            }
            Stmt::Throw(stmt) => self.collect_expr(scope, &stmt.value),
            Stmt::Defer(stmt) => self.collect_stmt(scope, &stmt.body),
            Stmt::Expr(stmt) => self.collect_expr(scope, &stmt.expr),
            Stmt::Break(_) | Stmt::Continue(_) => {}
        }
        self.tracker.pop_context_span();
    }

    fn collect_import(&mut self, scope: ScopeId, import: &nox_syntax::ast::UseStmt) {
        let meta = |member_path: Vec<String>, wildcard: bool| ImportMeta {
            source_module: import.module.text.clone(),
            alias: import.alias.as_ref().map(|a| a.text.clone()),
            member_path,
            wildcard,
        };
        match &import.members {
            UseMembers::Module | UseMembers::Wildcard => {
                let wildcard = matches!(import.members, UseMembers::Wildcard);
                // A wildcard without an alias has no name to bind; phase 2
                // reports it.
                let binding = import.alias.as_ref().unwrap_or(&import.module);
                self.define_checked(
                    scope,
                    binding,
                    SymbolKind::Use,
                    SymbolOptions {
                        context_span: Some(import.span),
                        target_span: Some(binding.span),
                        visibility: import.visibility,
                        meta: SymbolMeta::Import(meta(Vec::new(), wildcard)),
                        declared: true,
                        initialized: true,
                        ..SymbolOptions::default()
                    },
                );
            }
            UseMembers::Named(paths) => {
                for path in paths {
                    let Some(last) = path.segments.last() else {
                        continue;
                    };
                    let segments: Vec<String> =
                        path.segments.iter().map(|s| s.text.clone()).collect();
                    self.define_checked(
                        scope,
                        last,
                        SymbolKind::Use,
                        SymbolOptions {
                            context_span: Some(import.span),
                            target_span: Some(last.span),
                            visibility: import.visibility,
                            meta: SymbolMeta::Import(meta(segments, false)),
                            declared: true,
                            initialized: true,
                            ..SymbolOptions::default()
                        },
                    );
                }
            }
        }
    }

    fn collect_function(&mut self, scope: ScopeId, decl: &FuncDecl, receiver: Option<&Name>) {
        let meta = CallableMeta {
            params: decl
                .params
                .iter()
                .map(|p| ParamMeta {
                    name: p.name.text.clone(),
                    ty: p.ty.clone(),
                    has_default: p.default.is_some(),
                })
                .collect(),
            ret: decl.ret.clone(),
            error_ty: decl.error_ty.clone(),
            is_static: decl.is_static,
            is_comptime: decl.is_comptime,
            body: decl.is_comptime.then(|| decl.body.clone()),
        };
        let symbol = self.define_checked(
            scope,
            &decl.name,
            SymbolKind::Function,
            SymbolOptions {
                ty: Some(function_type(decl)),
                context_span: Some(decl.span),
                target_span: Some(decl.name.span),
                visibility: decl.visibility,
                meta: SymbolMeta::Callable(meta),
                declared: true,
                initialized: true,
                ..SymbolOptions::default()
            },
        );

        let fn_scope = self
            .scopes
            .create_scope(ScopeKind::Function, &decl.name.text, scope);
        self.scopes.set_scope_span(fn_scope, decl.span);
        if let Some(s) = self.scopes.scope_mut(fn_scope) {
            s.metadata.owner = symbol;
            s.metadata.is_static_method = decl.is_static;
        }

        // Instance methods get a synthetic receiver bound to the
        // enclosing struct's identifier type.
        if let Some(receiver) = receiver
            && !decl.is_static
        {
            self.scopes.define_in(
                fn_scope,
                "self",
                SymbolKind::Parameter,
                SymbolOptions {
                    ty: Some(TypeNode::Ident(nox_syntax::ast::IdentType {
                        name: receiver.clone(),
                    })),
                    binding: BindingKind::SelfParam,
                    declared: true,
                    initialized: true,
                    ..SymbolOptions::default()
                },
            );
        }
        // An inline error set becomes reachable as `selferr.Member`.
        if let Some(error_ty) = &decl.error_ty
            && error_ty.is_error_shaped()
        {
            self.scopes.define_in(
                fn_scope,
                "selferr",
                SymbolKind::Definition,
                SymbolOptions {
                    ty: Some(error_ty.clone()),
                    binding: BindingKind::SelfError,
                    declared: true,
                    initialized: true,
                    ..SymbolOptions::default()
                },
            );
        }

        for param in &decl.params {
            self.define_checked(
                fn_scope,
                &param.name,
                SymbolKind::Parameter,
                SymbolOptions {
                    ty: param.ty.clone(),
                    context_span: Some(param.span),
                    target_span: Some(param.name.span),
                    mutability: Mutability::Immutable,
                    declared: true,
                    initialized: true,
                    ..SymbolOptions::default()
                },
            );
            if let Some(default) = &param.default {
                self.collect_expr(fn_scope, default);
            }
        }

        for stmt in &decl.body {
            self.collect_stmt(fn_scope, stmt);
        }
    }

    // ===== type bodies =====

    /// Create the Type scope and member symbols for a named definition.
    fn build_type_body(&mut self, scope: ScopeId, owner: SymbolId, name: &Name, ty: &TypeNode) {
        match ty.unparenthesized() {
            TypeNode::Struct(body) => self.build_struct(scope, owner, name, body),
            TypeNode::Enum(body) => self.build_enum(scope, owner, name, body),
            TypeNode::ErrSet(body) => self.build_errset(scope, owner, name, body),
            _ => {}
        }
    }

    fn build_struct(&mut self, scope: ScopeId, owner: SymbolId, name: &Name, body: &StructType) {
        let type_scope = self.scopes.create_scope(ScopeKind::Type, &name.text, scope);
        self.scopes.set_scope_span(type_scope, body.span);
        if let Some(s) = self.scopes.scope_mut(type_scope) {
            s.metadata.type_kind = Some(TypeScopeKind::Struct);
            s.metadata.owner = Some(owner);
        }
        for field in &body.fields {
            self.define_checked(
                type_scope,
                &field.name,
                SymbolKind::StructField,
                SymbolOptions {
                    ty: Some(field.ty.clone()),
                    context_span: Some(field.span),
                    target_span: Some(field.name.span),
                    visibility: field.visibility,
                    meta: SymbolMeta::Field {
                        is_static: field.is_static,
                        has_default: field.default.is_some(),
                    },
                    declared: true,
                    initialized: field.default.is_some(),
                    ..SymbolOptions::default()
                },
            );
            if let Some(default) = &field.default {
                self.collect_expr(type_scope, default);
            }
        }
        for method in &body.methods {
            self.collect_function(type_scope, method, Some(name));
        }
    }

    fn build_enum(&mut self, scope: ScopeId, owner: SymbolId, name: &Name, body: &EnumType) {
        let type_scope = self.scopes.create_scope(ScopeKind::Type, &name.text, scope);
        self.scopes.set_scope_span(type_scope, body.span);
        if let Some(s) = self.scopes.scope_mut(type_scope) {
            s.metadata.type_kind = Some(TypeScopeKind::Enum);
            s.metadata.owner = Some(owner);
        }
        for variant in &body.variants {
            let value = match &variant.value {
                Some(Expr::Literal(lit)) => match lit.value {
                    Literal::Int(v) => Some(v),
                    _ => None,
                },
                _ => None,
            };
            self.define_checked(
                type_scope,
                &variant.name,
                SymbolKind::EnumVariant,
                SymbolOptions {
                    context_span: Some(variant.span),
                    target_span: Some(variant.name.span),
                    visibility: Visibility::Public,
                    meta: SymbolMeta::Variant { value },
                    declared: true,
                    initialized: true,
                    ..SymbolOptions::default()
                },
            );
        }
    }

    fn build_errset(&mut self, scope: ScopeId, owner: SymbolId, name: &Name, body: &ErrSetType) {
        let type_scope = self.scopes.create_scope(ScopeKind::Type, &name.text, scope);
        self.scopes.set_scope_span(type_scope, body.span);
        if let Some(s) = self.scopes.scope_mut(type_scope) {
            s.metadata.type_kind = Some(TypeScopeKind::ErrSet);
            s.metadata.owner = Some(owner);
        }
        for variant in &body.variants {
            self.define_checked(
                type_scope,
                variant,
                SymbolKind::Error,
                SymbolOptions {
                    target_span: Some(variant.span),
                    visibility: Visibility::Public,
                    declared: true,
                    initialized: true,
                    ..SymbolOptions::default()
                },
            );
        }
    }

    /// Walk a type tree chasing named references, reporting revisits.
    /// A revisit through a pointer is a legitimate recursive type, so it
    /// is only a warning; nesting past the depth ceiling is an error.
    fn check_type_cycles(&mut self, scope: ScopeId, name: Option<String>, ty: &TypeNode) {
        // Primitives name no symbol and cannot close a cycle; keying
        // them would collide on repeated same-primitive members.
        if matches!(ty.unparenthesized(), TypeNode::Primitive(_)) {
            return;
        }
        let key = (ty.kind_name(), ty.span(), name.clone());
        if !self.visited_types.insert(key) {
            let label = name.unwrap_or_else(|| ty.kind_name().to_string());
            self.diagnostics
                .report(DiagnosticCode::TypeCycleDetected)
                .message(&label)
                .target(ty.span())
                .emit();
            return;
        }
        self.type_depth += 1;
        if self.type_depth > MAX_TYPE_DEPTH {
            self.diagnostics
                .report(DiagnosticCode::TypeNestingTooDeep)
                .target(ty.span())
                .emit();
            self.type_depth -= 1;
            return;
        }
        match ty.unparenthesized() {
            TypeNode::Ident(ident) => {
                let referenced = self
                    .scopes
                    .lookup_in_parent_scopes(scope, &ident.name.text)
                    .and_then(|id| self.scopes.symbol(id))
                    .and_then(|s| s.ty.clone());
                if let Some(referenced) = referenced {
                    self.check_type_cycles(scope, Some(ident.name.text.clone()), &referenced);
                }
            }
            TypeNode::Optional(t) => self.check_type_cycles(scope, None, &t.inner),
            TypeNode::Pointer(t) => self.check_type_cycles(scope, None, &t.pointee),
            TypeNode::Array(t) => self.check_type_cycles(scope, None, &t.elem),
            TypeNode::Tuple(t) => {
                for elem in &t.elems {
                    self.check_type_cycles(scope, None, elem);
                }
            }
            TypeNode::Struct(t) => {
                for field in &t.fields {
                    self.check_type_cycles(scope, None, &field.ty);
                }
            }
            TypeNode::Union(t) => {
                for member in &t.members {
                    self.check_type_cycles(scope, None, member);
                }
            }
            TypeNode::Function(t) => {
                for param in &t.params {
                    self.check_type_cycles(scope, None, param);
                }
                self.check_type_cycles(scope, None, &t.ret);
            }
            TypeNode::Primitive(_) | TypeNode::Enum(_) | TypeNode::ErrSet(_) | TypeNode::Paren(_) => {}
        }
        self.type_depth -= 1;
    }

    // ===== expressions =====

    /// Branching expressions open Expression scopes; everything else just
    /// recurses looking for them.
    fn collect_expr(&mut self, scope: ScopeId, expr: &Expr) {
        match expr.unparenthesized() {
            Expr::If(expr) => self.collect_if(scope, expr),
            Expr::Switch(expr) => self.collect_switch(scope, expr),
            Expr::Try(expr) => {
                let inner = self.scopes.create_scope(ScopeKind::Expression, "try", scope);
                self.scopes.set_scope_span(inner, expr.span);
                self.collect_expr(inner, &expr.inner);
            }
            Expr::Catch(expr) => self.collect_catch(scope, expr),
            Expr::Unary(e) => self.collect_expr(scope, &e.operand),
            Expr::Binary(e) => {
                self.collect_expr(scope, &e.lhs);
                self.collect_expr(scope, &e.rhs);
            }
            Expr::Assign(e) => {
                self.collect_expr(scope, &e.target);
                self.collect_expr(scope, &e.value);
            }
            Expr::Call(e) => {
                self.collect_expr(scope, &e.callee);
                for arg in &e.args {
                    self.collect_expr(scope, arg);
                }
            }
            Expr::Field(e) => self.collect_expr(scope, &e.base),
            Expr::Index(e) => {
                self.collect_expr(scope, &e.base);
                self.collect_expr(scope, &e.index);
            }
            Expr::StructInit(e) => {
                for field in &e.fields {
                    self.collect_expr(scope, &field.value);
                }
            }
            Expr::Cast(e) => self.collect_expr(scope, &e.value),
            Expr::Literal(_) | Expr::Ident(_) | Expr::Builtin(_) | Expr::SizeOf(_) => {}
            Expr::Paren(_) => {}
        }
    }

    fn collect_if(&mut self, scope: ScopeId, expr: &IfExpr) {
        self.collect_expr(scope, &expr.cond);
        let inner = self.scopes.create_scope(ScopeKind::Expression, "if", scope);
        self.scopes.set_scope_span(inner, expr.span);
        for stmt in &expr.then_body {
            self.collect_stmt(inner, stmt);
        }
        if let Some(else_body) = &expr.else_body {
            for stmt in else_body {
                self.collect_stmt(inner, stmt);
            }
        }
    }

    fn collect_switch(&mut self, scope: ScopeId, expr: &SwitchExpr) {
        self.collect_expr(scope, &expr.scrutinee);
        let inner = self
            .scopes
            .create_scope(ScopeKind::Expression, "switch", scope);
        self.scopes.set_scope_span(inner, expr.span);
        for arm in &expr.arms {
            for stmt in &arm.body {
                self.collect_stmt(inner, stmt);
            }
        }
    }

    fn collect_catch(&mut self, scope: ScopeId, expr: &CatchExpr) {
        self.collect_expr(scope, &expr.inner);
        let inner = self
            .scopes
            .create_scope(ScopeKind::Expression, "catch", scope);
        self.scopes.set_scope_span(inner, expr.span);
        if let Some(binding) = &expr.binding {
            self.define_checked(
                inner,
                binding,
                SymbolKind::Variable,
                SymbolOptions {
                    target_span: Some(binding.span),
                    declared: true,
                    initialized: true,
                    ..SymbolOptions::default()
                },
            );
        }
        for stmt in &expr.handler {
            self.collect_stmt(inner, stmt);
        }
    }

    // ===== definitions =====

    /// Shadowing matrix: same-scope redefinition is an error (with a
    /// kind-specific code); a Variable/Function/Parameter that merely
    /// shadows an outer scope is a warning; redefining a synthetic
    /// binding and reserved-prefix names are hard errors.
    fn define_checked(
        &mut self,
        scope: ScopeId,
        name: &Name,
        kind: SymbolKind,
        opts: SymbolOptions,
    ) -> Option<SymbolId> {
        let text = name.text.as_str();
        if text.starts_with('@') {
            self.diagnostics
                .report(DiagnosticCode::ReservedPrefix)
                .target(name.span)
                .emit();
            return None;
        }

        if let Some(existing) = self.scopes.lookup_local(scope, text) {
            let prior = self.scopes.symbol(existing);
            let code = match prior.map(|s| s.binding) {
                Some(BindingKind::SelfParam | BindingKind::SelfError) => {
                    DiagnosticCode::SelfCollision
                }
                _ => duplicate_code(kind),
            };
            let prior_span = prior.and_then(|s| s.target_span);
            let mut report = self
                .diagnostics
                .report(code)
                .message(text)
                .target(name.span);
            if let Some(span) = prior_span {
                report = report.related_to(span, "first defined here");
            }
            report.emit();
            return None;
        }

        if matches!(
            kind,
            SymbolKind::Variable | SymbolKind::Function | SymbolKind::Parameter
        ) && let Some(parent) = self.scopes.scope(scope).and_then(|s| s.parent)
            && let Some(outer) = self.scopes.lookup_in_parent_scopes(parent, text)
            && self.scopes.symbol(outer).is_some_and(|s| !s.is_builtin())
        {
            let outer_span = self.scopes.symbol(outer).and_then(|s| s.target_span);
            let mut report = self
                .diagnostics
                .report(DiagnosticCode::ShadowedSymbol)
                .message(text)
                .target(name.span);
            if let Some(span) = outer_span {
                report = report.related_to(span, "shadowed declaration");
            }
            report.emit();
        }

        self.scopes.define_in(scope, text, kind, opts)
    }
}

fn duplicate_code(kind: SymbolKind) -> DiagnosticCode {
    match kind {
        SymbolKind::Parameter => DiagnosticCode::DuplicateParameter,
        SymbolKind::StructField => DiagnosticCode::DuplicateField,
        SymbolKind::EnumVariant => DiagnosticCode::DuplicateEnumVariant,
        SymbolKind::Error => DiagnosticCode::DuplicateErrorVariant,
        SymbolKind::Use => DiagnosticCode::ImportDuplicate,
        _ => DiagnosticCode::DuplicateSymbol,
    }
}

fn function_type(decl: &FuncDecl) -> TypeNode {
    TypeNode::Function(nox_syntax::ast::FunctionType {
        params: decl
            .params
            .iter()
            .map(|p| p.ty.clone().unwrap_or_else(|| primitive(Primitive::Any)))
            .collect(),
        ret: Box::new(decl.ret.clone().unwrap_or_else(|| primitive(Primitive::Void))),
        error: decl.error_ty.clone().map(Box::new),
        span: decl.span,
    })
}
