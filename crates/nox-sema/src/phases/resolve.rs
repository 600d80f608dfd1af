//! Phase 2: symbol resolution.
//!
//! Re-walks every module, wiring identifiers, imports, and type
//! references to their symbols. Declared flags of non-import,
//! non-parameter symbols are cleared first and re-set in statement
//! order, which is what makes use-before-declaration detection
//! meaningful for names collection already knows about.

use nox_syntax::ast::{FieldExpr, FuncDecl, Name, UseMembers, UseStmt};
use nox_syntax::{Expr, Program, Span, Stmt, TypeNode};
use rustc_hash::FxHashMap;

use super::Services;
use crate::context::{ContextTracker, ExprContextKind};
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::scope::{
    BindingKind, ScopeId, ScopeKind, ScopeManager, SymbolId, SymbolKind, SymbolMeta,
};

type MemoKey = (String, String, Span);

pub(crate) fn run(services: &mut Services, program: &Program) {
    let mut memo: FxHashMap<MemoKey, SymbolId> = FxHashMap::default();
    for (name, module) in program.iter() {
        let Some(&scope) = services.module_scopes.get(name) else {
            services
                .diagnostics
                .report(DiagnosticCode::InternalError)
                .raw_message(format!("module `{name}` has no collected scope"))
                .emit();
            continue;
        };
        services.enter_module(name, &module.path);
        reset_declared_flags(&mut services.scopes, scope);

        let mut resolver = Resolver {
            scopes: &mut services.scopes,
            tracker: &mut services.tracker,
            diagnostics: &mut services.diagnostics,
            module_scopes: &services.module_scopes,
            module_name: name,
            memo: &mut memo,
        };
        resolver.resolve_stmts(scope, &module.stmts);
    }
    services.leave_module();
}

/// Clear `declared` on everything resolution re-declares in order.
/// Imports and parameters keep theirs; so do synthetic bindings.
fn reset_declared_flags(scopes: &mut ScopeManager, module_scope: ScopeId) {
    for scope in scopes.subtree(module_scope) {
        scopes.for_each_symbol_mut(scope, |symbol| {
            if symbol.kind != SymbolKind::Use
                && symbol.kind != SymbolKind::Parameter
                && symbol.binding == BindingKind::Ordinary
            {
                symbol.flags.declared = false;
            }
        });
    }
}

struct Resolver<'a> {
    scopes: &'a mut ScopeManager,
    tracker: &'a mut ContextTracker,
    diagnostics: &'a mut Diagnostics,
    module_scopes: &'a FxHashMap<String, ScopeId>,
    module_name: &'a str,
    memo: &'a mut FxHashMap<MemoKey, SymbolId>,
}

impl Resolver<'_> {
    fn resolve_stmts(&mut self, scope: ScopeId, stmts: &[Stmt]) {
        for stmt in stmts {
            let cp = self.tracker.checkpoint();
            self.resolve_stmt(scope, stmt);
            self.tracker.restore(cp);
        }
    }

    fn resolve_stmt(&mut self, scope: ScopeId, stmt: &Stmt) {
        self.tracker.push_context_span(stmt.span());
        self.diagnostics.set_ambient_span(Some(stmt.span()));
        match stmt {
            Stmt::Def(def) => {
                self.mark_declared(scope, &def.name.text);
                self.resolve_type(scope, &def.ty);
                self.resolve_type_body(scope, def);
            }
            Stmt::Use(import) => self.resolve_import(scope, import),
            Stmt::Let(stmt) => {
                self.tracker
                    .start_declaration(&stmt.name.text, stmt.span, None);
                if let Some(ty) = &stmt.ty {
                    self.resolve_type(scope, ty);
                }
                if let Some(init) = &stmt.init {
                    self.tracker.start_initialization(&stmt.name.text);
                    self.tracker
                        .push_expr_context(ExprContextKind::VariableInitializer, stmt.ty.clone());
                    self.resolve_expr(scope, init);
                    self.tracker.pop_expr_context();
                }
                let id = self.mark_declared(scope, &stmt.name.text);
                self.tracker.complete_declaration(&stmt.name.text, id);
                for span in self.tracker.take_pending_forward(&stmt.name.text) {
                    self.diagnostics
                        .report(DiagnosticCode::UseBeforeDeclaration)
                        .message(&stmt.name.text)
                        .target(span)
                        .emit();
                }
            }
            Stmt::Func(decl) => {
                self.mark_declared(scope, &decl.name.text);
                self.resolve_function(scope, decl);
            }
            Stmt::Block(block) => {
                if let Some(inner) = self.child_scope(scope, block.span) {
                    self.resolve_stmts(inner, &block.stmts);
                }
            }
            Stmt::Test(test) => {
                if let Some(inner) = self.child_scope(scope, test.span) {
                    self.resolve_stmts(inner, &test.body);
                }
            }
            Stmt::While(stmt) => {
                self.tracker
                    .push_expr_context(ExprContextKind::Condition, None);
                self.resolve_expr(scope, &stmt.cond);
                self.tracker.pop_expr_context();
                if let Some(inner) = self.child_scope(scope, stmt.span) {
                    self.resolve_stmts(inner, &stmt.body);
                }
            }
            Stmt::Do(stmt) => {
                if let Some(inner) = self.child_scope(scope, stmt.span) {
                    self.resolve_stmts(inner, &stmt.body);
                }
                self.tracker
                    .push_expr_context(ExprContextKind::Condition, None);
                self.resolve_expr(scope, &stmt.cond);
                self.tracker.pop_expr_context();
            }
            Stmt::For(stmt) => {
                self.resolve_expr(scope, &stmt.iterable);
                if let Some(inner) = self.child_scope(scope, stmt.span) {
                    self.mark_declared(inner, &stmt.binding.text);
                    self.resolve_stmts(inner, &stmt.body);
                }
            }
            Stmt::Return(stmt) => {
                if let Some(value) = &stmt.value {
                    self.tracker
                        .push_expr_context(ExprContextKind::ReturnExpression, None);
                    self.resolve_expr(scope, value);
                    self.tracker.pop_expr_context();
                }
            }
            Stmt::Throw(stmt) => {
                self.tracker
                    .push_expr_context(ExprContextKind::ThrowValue, None);
                self.resolve_expr(scope, &stmt.value);
                self.tracker.pop_expr_context();
            }
            Stmt::Defer(stmt) => self.resolve_stmt(scope, &stmt.body),
            Stmt::Expr(stmt) => self.resolve_expr(scope, &stmt.expr),
            Stmt::Break(_) | Stmt::Continue(_) => {}
        }
        self.tracker.pop_context_span();
    }

    fn resolve_function(&mut self, scope: ScopeId, decl: &FuncDecl) {
        let Some(fn_scope) = self.child_scope(scope, decl.span) else {
            return;
        };
        for (index, param) in decl.params.iter().enumerate() {
            if let Some(ty) = &param.ty {
                self.resolve_type(fn_scope, ty);
            }
            if let Some(default) = &param.default {
                self.tracker
                    .start_declaration(&param.name.text, param.span, Some(index));
                self.tracker.start_initialization(&param.name.text);
                self.tracker
                    .push_expr_context(ExprContextKind::ParameterDefault, param.ty.clone());
                self.resolve_expr(fn_scope, default);
                self.tracker.pop_expr_context();
                self.tracker.complete_declaration(&param.name.text, None);
            }
        }
        if let Some(ret) = &decl.ret {
            self.resolve_type(fn_scope, ret);
        }
        if let Some(error_ty) = &decl.error_ty {
            self.resolve_type(fn_scope, error_ty);
        }
        self.resolve_stmts(fn_scope, &decl.body);
    }

    /// Resolve struct/enum/error-set member types and method bodies in
    /// their Type scope.
    fn resolve_type_body(&mut self, scope: ScopeId, def: &nox_syntax::ast::DefStmt) {
        let Some(owner) = self.scopes.lookup_local(scope, &def.name.text) else {
            return;
        };
        let Some(type_scope) = self.scopes.type_scope_of(owner) else {
            return;
        };
        if let TypeNode::Struct(body) = def.ty.unparenthesized() {
            for field in &body.fields {
                self.resolve_type(type_scope, &field.ty);
                if let Some(default) = &field.default {
                    self.tracker
                        .push_expr_context(ExprContextKind::StructFieldValue, Some(field.ty.clone()));
                    self.resolve_expr(type_scope, default);
                    self.tracker.pop_expr_context();
                }
            }
            for method in &body.methods {
                self.mark_declared(type_scope, &method.name.text);
                self.resolve_function(type_scope, method);
            }
        }
    }

    fn resolve_import(&mut self, scope: ScopeId, import: &UseStmt) {
        if import.module.text == self.module_name {
            self.diagnostics
                .report(DiagnosticCode::ImportSelf)
                .target(import.module.span)
                .emit();
            return;
        }
        let Some(&target) = self.module_scopes.get(&import.module.text) else {
            self.diagnostics
                .report(DiagnosticCode::ImportModuleNotFound)
                .message(&import.module.text)
                .target(import.module.span)
                .emit();
            return;
        };

        match &import.members {
            UseMembers::Wildcard => {
                if import.alias.is_none() {
                    self.diagnostics
                        .report(DiagnosticCode::ImportWildcardNoAlias)
                        .target(import.span)
                        .emit();
                }
            }
            UseMembers::Module => {}
            UseMembers::Named(paths) => {
                for path in paths {
                    self.resolve_member_path(scope, target, &path.segments);
                }
            }
        }
    }

    /// Walk a dotted member path through the target module, descending
    /// through Type scopes for nested members.
    fn resolve_member_path(&mut self, scope: ScopeId, target: ScopeId, segments: &[Name]) {
        let mut current = target;
        for (position, segment) in segments.iter().enumerate() {
            let found = self
                .scopes
                .scope(current)
                .and_then(|s| s.symbol(&segment.text))
                .map(|s| (s.id, s.flags.exported, s.visibility.is_public()));
            let Some((id, exported, public)) = found else {
                self.diagnostics
                    .report(DiagnosticCode::ImportMemberNotFound)
                    .message(&segment.text)
                    .target(segment.span)
                    .emit();
                return;
            };
            let last = position == segments.len() - 1;
            if last {
                if !exported && !public {
                    self.diagnostics
                        .report(DiagnosticCode::ImportNotExported)
                        .message(&segment.text)
                        .target(segment.span)
                        .emit();
                }
                self.scopes.mark_used(id);
                // Attach the source type to the local import binding.
                let source_ty = self.scopes.symbol(id).and_then(|s| s.ty.clone());
                if let Some(local) = self.scopes.lookup_local(scope, &segment.text)
                    && let Some(ty) = source_ty
                {
                    self.scopes.set_symbol_type(local, ty);
                }
                return;
            }
            let Some(next) = self.scopes.type_scope_of(id) else {
                self.diagnostics
                    .report(DiagnosticCode::ImportMemberNotFound)
                    .message(&segment.text)
                    .target(segment.span)
                    .emit();
                return;
            };
            current = next;
        }
    }

    // ===== expressions =====

    fn resolve_expr(&mut self, scope: ScopeId, expr: &Expr) {
        match expr.unparenthesized() {
            Expr::Literal(_) => {}
            Expr::Ident(e) => {
                self.resolve_ident(scope, &e.name);
            }
            Expr::Builtin(e) => self.resolve_builtin(scope, &e.name),
            Expr::Unary(e) => self.resolve_expr(scope, &e.operand),
            Expr::Binary(e) => {
                self.resolve_expr(scope, &e.lhs);
                self.resolve_expr(scope, &e.rhs);
            }
            Expr::Assign(e) => {
                self.tracker
                    .push_expr_context(ExprContextKind::AssignValue, None);
                self.resolve_expr(scope, &e.value);
                self.tracker.pop_expr_context();
                self.tracker
                    .push_expr_context(ExprContextKind::AssignTarget, None);
                self.resolve_expr(scope, &e.target);
                self.tracker.pop_expr_context();
                // The write counts as initialization from here on.
                if let Some(name) = e.target.as_ident()
                    && let Some(id) = self.scopes.lookup_in_scope_chain(scope, &name.text)
                    && let Some(symbol) = self.scopes.symbol_mut(id)
                {
                    symbol.flags.initialized = true;
                }
            }
            Expr::Call(e) => {
                self.resolve_expr(scope, &e.callee);
                for arg in &e.args {
                    self.tracker
                        .push_expr_context(ExprContextKind::CallArgument, None);
                    self.resolve_expr(scope, arg);
                    self.tracker.pop_expr_context();
                }
            }
            Expr::Field(e) => self.resolve_field(scope, e),
            Expr::Index(e) => {
                self.resolve_expr(scope, &e.base);
                self.tracker
                    .push_expr_context(ExprContextKind::IndexExpression, None);
                self.resolve_expr(scope, &e.index);
                self.tracker.pop_expr_context();
            }
            Expr::StructInit(e) => {
                if let Some(name) = &e.ty
                    && self.scopes.lookup_in_scope_chain(scope, &name.text).is_none()
                {
                    self.diagnostics
                        .report(DiagnosticCode::UndefinedType)
                        .message(&name.text)
                        .target(name.span)
                        .emit();
                }
                for field in &e.fields {
                    self.tracker
                        .push_expr_context(ExprContextKind::StructFieldValue, None);
                    self.resolve_expr(scope, &field.value);
                    self.tracker.pop_expr_context();
                }
            }
            Expr::Cast(e) => {
                self.resolve_type(scope, &e.ty);
                self.resolve_expr(scope, &e.value);
            }
            Expr::SizeOf(e) => self.resolve_type(scope, &e.ty),
            Expr::If(e) => {
                self.tracker
                    .push_expr_context(ExprContextKind::Condition, None);
                self.resolve_expr(scope, &e.cond);
                self.tracker.pop_expr_context();
                if let Some(inner) = self.child_scope(scope, e.span) {
                    self.resolve_stmts(inner, &e.then_body);
                    if let Some(else_body) = &e.else_body {
                        self.resolve_stmts(inner, else_body);
                    }
                }
            }
            Expr::Switch(e) => {
                self.tracker
                    .push_expr_context(ExprContextKind::SwitchScrutinee, None);
                self.resolve_expr(scope, &e.scrutinee);
                self.tracker.pop_expr_context();
                if let Some(inner) = self.child_scope(scope, e.span) {
                    for arm in &e.arms {
                        if let nox_syntax::ast::SwitchPattern::Expr(pattern) = &arm.pattern {
                            self.resolve_expr(scope, pattern);
                        }
                        self.resolve_stmts(inner, &arm.body);
                    }
                }
            }
            Expr::Try(e) => {
                if let Some(inner) = self.child_scope(scope, e.span) {
                    self.resolve_expr(inner, &e.inner);
                }
            }
            Expr::Catch(e) => {
                self.resolve_expr(scope, &e.inner);
                if let Some(inner) = self.child_scope(scope, e.span) {
                    if let Some(binding) = &e.binding {
                        self.mark_declared(inner, &binding.text);
                    }
                    self.resolve_stmts(inner, &e.handler);
                }
            }
            Expr::Paren(_) => {}
        }
    }

    /// Member access whose base is a module or wildcard import alias is
    /// checked against the target module's exports here. Members of
    /// ordinary values are left to type validation.
    fn resolve_field(&mut self, scope: ScopeId, e: &FieldExpr) {
        self.resolve_expr(scope, &e.base);

        let Some(base) = e.base.as_ident() else {
            return;
        };
        let source = self
            .scopes
            .lookup_in_scope_chain(scope, &base.text)
            .and_then(|id| self.scopes.symbol(id))
            .and_then(|s| match &s.meta {
                SymbolMeta::Import(meta) if meta.member_path.is_empty() => {
                    Some(meta.source_module.clone())
                }
                _ => None,
            });
        let Some(source) = source else {
            return;
        };
        let Some(&target) = self.module_scopes.get(&source) else {
            return;
        };
        let found = self
            .scopes
            .scope(target)
            .and_then(|s| s.symbol(&e.field.text))
            .map(|s| (s.id, s.flags.exported, s.visibility.is_public()));
        match found {
            Some((id, exported, public)) => {
                if !exported && !public {
                    self.diagnostics
                        .report(DiagnosticCode::ImportNotExported)
                        .message(&e.field.text)
                        .target(e.field.span)
                        .emit();
                }
                self.scopes.mark_used(id);
            }
            None => {
                self.diagnostics
                    .report(DiagnosticCode::UndefinedMember)
                    .message(&e.field.text)
                    .target(e.field.span)
                    .emit();
            }
        }
    }

    /// Resolve one identifier use. The checks run in a fixed order:
    /// parameter forward reference, self-reference, `self` handling,
    /// static-method field restriction, then the memoized chain lookup.
    fn resolve_ident(&mut self, scope: ScopeId, name: &Name) -> Option<SymbolId> {
        let text = name.text.as_str();

        if let Some(index) = self.param_index_of(scope, text)
            && self.tracker.check_parameter_forward_reference(index)
        {
            self.diagnostics
                .report(DiagnosticCode::ParameterForwardReference)
                .message(text)
                .target(name.span)
                .emit();
            return None;
        }

        if self.tracker.check_self_reference(text).is_some() {
            let code = if self.tracker.current_param_index().is_some() {
                DiagnosticCode::ParameterForwardReference
            } else {
                DiagnosticCode::VariableSelfInit
            };
            self.diagnostics
                .report(code)
                .message(text)
                .target(name.span)
                .emit();
            return None;
        }

        let memo_key = (self.module_name.to_string(), text.to_string(), name.span);
        if let Some(&id) = self.memo.get(&memo_key) {
            self.scopes.mark_used(id);
            return Some(id);
        }

        let Some(id) = self.scopes.lookup_in_scope_chain(scope, text) else {
            if text == "self" {
                let code = if self.in_static_method(scope) {
                    DiagnosticCode::SelfInStaticMethod
                } else {
                    DiagnosticCode::SelfOutsideMethod
                };
                self.diagnostics.report(code).target(name.span).emit();
                return None;
            }
            self.tracker.add_pending_forward(text, name.span);
            self.diagnostics
                .report(DiagnosticCode::UndefinedIdentifier)
                .message(text)
                .target(name.span)
                .emit();
            return None;
        };

        let Some(symbol) = self.scopes.symbol(id) else {
            self.diagnostics
                .report(DiagnosticCode::InternalError)
                .raw_message(format!("symbol index lost `{text}`"))
                .emit();
            return None;
        };

        if symbol.kind == SymbolKind::Variable
            && symbol.binding == BindingKind::Ordinary
            && !symbol.flags.declared
        {
            self.diagnostics
                .report(DiagnosticCode::UseBeforeDeclaration)
                .message(text)
                .target(name.span)
                .emit();
        } else if symbol.kind == SymbolKind::Variable && !symbol.flags.initialized {
            self.diagnostics
                .report(DiagnosticCode::UseBeforeInitialization)
                .message(text)
                .target(name.span)
                .emit();
        }

        if symbol.kind == SymbolKind::StructField
            && matches!(symbol.meta, SymbolMeta::Field { is_static: false, .. })
            && self.in_static_method(scope)
        {
            self.diagnostics
                .report(DiagnosticCode::NonStaticFieldInStaticMethod)
                .message(text)
                .target(name.span)
                .emit();
        }

        self.scopes.mark_used(id);
        self.tracker.mark_resolved(id);
        self.memo.insert(memo_key, id);
        Some(id)
    }

    fn resolve_builtin(&mut self, scope: ScopeId, name: &Name) {
        let found = self
            .scopes
            .lookup_in_scope_chain(scope, &name.text)
            .filter(|&id| self.scopes.symbol(id).is_some_and(|s| s.is_builtin()));
        match found {
            Some(id) => self.scopes.mark_used(id),
            None => self
                .diagnostics
                .report(DiagnosticCode::UndefinedBuiltin)
                .message(&name.text)
                .target(name.span)
                .emit(),
        }
    }

    // ===== types =====

    fn resolve_type(&mut self, scope: ScopeId, ty: &TypeNode) {
        match ty.unparenthesized() {
            TypeNode::Primitive(_) => {}
            TypeNode::Ident(ident) => {
                match self.scopes.lookup_in_scope_chain(scope, &ident.name.text) {
                    Some(id) => self.scopes.mark_used(id),
                    None => self
                        .diagnostics
                        .report(DiagnosticCode::UndefinedType)
                        .message(&ident.name.text)
                        .target(ident.name.span)
                        .emit(),
                }
            }
            TypeNode::Optional(t) => self.resolve_type(scope, &t.inner),
            TypeNode::Pointer(t) => self.resolve_type(scope, &t.pointee),
            TypeNode::Array(t) => {
                self.resolve_type(scope, &t.elem);
                if let Some(size) = &t.size {
                    self.tracker
                        .push_expr_context(ExprContextKind::ArraySize, None);
                    self.resolve_expr(scope, size);
                    self.tracker.pop_expr_context();
                }
            }
            TypeNode::Tuple(t) => {
                for elem in &t.elems {
                    self.resolve_type(scope, elem);
                }
            }
            TypeNode::Struct(t) => {
                for field in &t.fields {
                    self.resolve_type(scope, &field.ty);
                }
            }
            TypeNode::Enum(_) | TypeNode::ErrSet(_) => {}
            TypeNode::Function(t) => {
                for param in &t.params {
                    self.resolve_type(scope, param);
                }
                self.resolve_type(scope, &t.ret);
                if let Some(error) = &t.error {
                    self.resolve_type(scope, error);
                }
            }
            TypeNode::Union(t) => {
                for member in &t.members {
                    self.resolve_type(scope, member);
                }
            }
            TypeNode::Paren(_) => {}
        }
    }

    // ===== helpers =====

    fn child_scope(&mut self, parent: ScopeId, span: Span) -> Option<ScopeId> {
        let found = self.scopes.find_child_at(parent, span);
        if found.is_none() {
            self.diagnostics
                .report(DiagnosticCode::InternalError)
                .raw_message("collected scope missing for construct".to_string())
                .target(span)
                .emit();
        }
        found
    }

    fn mark_declared(&mut self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let id = self.scopes.lookup_local(scope, name)?;
        if let Some(symbol) = self.scopes.symbol_mut(id) {
            symbol.flags.declared = true;
        }
        Some(id)
    }

    /// Declaration index of `name` among the enclosing function's
    /// ordinary parameters.
    fn param_index_of(&self, scope: ScopeId, name: &str) -> Option<usize> {
        let function = self.scopes.enclosing(scope, ScopeKind::Function)?;
        function
            .symbols
            .values()
            .filter(|s| s.kind == SymbolKind::Parameter && s.binding == BindingKind::Ordinary)
            .position(|s| s.name == name)
    }

    fn in_static_method(&self, scope: ScopeId) -> bool {
        self.scopes
            .enclosing(scope, ScopeKind::Function)
            .is_some_and(|s| s.metadata.is_static_method)
    }
}
