//! Scope tree and symbol table.
//!
//! Scopes live in a single arena (a vector indexed by id) with parent
//! and child links as plain ids, so the whole graph is cheap to walk
//! and trivially copyable. Symbols are owned by value by the scope they
//! are defined in; a flat id index exists only as a fast weak lookup.

mod lookup;
mod symbol;

#[cfg(test)]
mod scope_tests;

use indexmap::IndexMap;
use nox_syntax::ast::{Mutability, Visibility};
use nox_syntax::{Span, TypeNode};
use nox_syntax::ast::{FunctionType, Primitive, PrimitiveType};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::trace::Tracer;

pub use symbol::{
    BindingKind, CallableMeta, ImportMeta, ParamMeta, Symbol, SymbolFlags, SymbolId, SymbolKind,
    SymbolMeta, SymbolOptions,
};

/// A lightweight handle to a scope. Ids are strictly increasing within
/// one run; the global scope is always id 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ScopeId(u32);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(1);

    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize - 1
    }
}

/// Syntactic category a scope represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKind {
    Global,
    Module,
    Function,
    Loop,
    Block,
    /// Branching expressions: `if`, `switch`, `try`, `catch`.
    Expression,
    /// Struct/enum/error-set bodies.
    Type,
}

impl ScopeKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Module => "module",
            Self::Function => "function",
            Self::Loop => "loop",
            Self::Block => "block",
            Self::Expression => "expression",
            Self::Type => "type",
        }
    }
}

/// What kind of type body a Type scope represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeScopeKind {
    Struct,
    Enum,
    ErrSet,
}

/// Free-form scope annotations.
#[derive(Debug, Clone, Default)]
pub struct ScopeMetadata {
    pub type_kind: Option<TypeScopeKind>,
    /// Symbol the scope belongs to (the struct's definition, the
    /// function's symbol).
    pub owner: Option<SymbolId>,
    /// Set on function scopes of static methods.
    pub is_static_method: bool,
}

/// A node in the scope tree.
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub name: String,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub symbols: IndexMap<String, Symbol>,
    /// Root is 0; always parent level + 1.
    pub level: u32,
    pub span: Option<Span>,
    pub metadata: ScopeMetadata,
}

impl Scope {
    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }
}

/// Owns the scope tree and every symbol in it.
#[derive(Debug)]
pub struct ScopeManager {
    scopes: Vec<Scope>,
    current: ScopeId,
    next_symbol: u32,
    /// Weak index: symbol id to its owning scope and slot.
    index: FxHashMap<SymbolId, (ScopeId, usize)>,
    tracer: Tracer,
}

impl ScopeManager {
    pub fn new(tracer: Tracer) -> Self {
        let mut manager = Self {
            scopes: Vec::new(),
            current: ScopeId::GLOBAL,
            next_symbol: 1,
            index: FxHashMap::default(),
            tracer,
        };
        manager.bootstrap();
        manager
    }

    /// Drop everything and recreate the global scope with its builtins.
    pub fn reset(&mut self) {
        self.scopes.clear();
        self.index.clear();
        self.next_symbol = 1;
        self.current = ScopeId::GLOBAL;
        self.bootstrap();
    }

    fn bootstrap(&mut self) {
        let global = Scope {
            id: ScopeId::GLOBAL,
            kind: ScopeKind::Global,
            name: "global".to_string(),
            parent: None,
            children: Vec::new(),
            symbols: IndexMap::new(),
            level: 0,
            span: None,
            metadata: ScopeMetadata::default(),
        };
        self.scopes.push(global);
        self.inject_builtins();
    }

    /// Builtin symbols live in the global scope, already typed, and are
    /// referenced with the `@` sigil.
    fn inject_builtins(&mut self) {
        let builtins: &[(&str, SymbolKind, Primitive)] = &[
            ("print", SymbolKind::Function, Primitive::Void),
            ("println", SymbolKind::Function, Primitive::Void),
            ("panic", SymbolKind::Function, Primitive::Void),
            ("len", SymbolKind::Function, Primitive::U64),
            ("sizeOf", SymbolKind::Function, Primitive::U64),
            ("intCast", SymbolKind::Function, Primitive::Any),
            ("floatCast", SymbolKind::Function, Primitive::Any),
            ("typeName", SymbolKind::Function, Primitive::Str),
            ("min", SymbolKind::Definition, Primitive::Any),
            ("max", SymbolKind::Definition, Primitive::Any),
        ];
        for &(name, kind, ret) in builtins {
            let ty = TypeNode::Function(FunctionType {
                params: Vec::new(),
                ret: Box::new(TypeNode::Primitive(PrimitiveType {
                    prim: ret,
                    span: Span::default(),
                })),
                error: None,
                span: Span::default(),
            });
            let ty = if kind == SymbolKind::Definition {
                TypeNode::Primitive(PrimitiveType {
                    prim: ret,
                    span: Span::default(),
                })
            } else {
                ty
            };
            self.define_in(
                ScopeId::GLOBAL,
                name,
                kind,
                SymbolOptions {
                    ty: Some(ty),
                    visibility: Visibility::Public,
                    mutability: Mutability::Immutable,
                    binding: BindingKind::Builtin,
                    declared: true,
                    initialized: true,
                    ..SymbolOptions::default()
                },
            );
        }
    }

    // ===== scope creation and navigation =====

    /// Append a new scope under `parent`. Level is always parent + 1.
    pub fn create_scope(&mut self, kind: ScopeKind, name: &str, parent: ScopeId) -> ScopeId {
        let id = ScopeId::from_raw(self.scopes.len() as u32 + 1);
        let level = self
            .scope(parent)
            .map(|p| p.level + 1)
            .unwrap_or_default();
        self.scopes.push(Scope {
            id,
            kind,
            name: name.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            symbols: IndexMap::new(),
            level,
            span: None,
            metadata: ScopeMetadata::default(),
        });
        if let Some(parent_scope) = self.scope_mut(parent) {
            parent_scope.children.push(id);
        }
        self.tracer.scope("create", kind.name(), id.as_u32());
        id
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.index())
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        self.scopes.get_mut(id.index())
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn iter_scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    /// Switch to `id`, returning the previous current scope.
    pub fn enter_scope(&mut self, id: ScopeId) -> ScopeId {
        let previous = self.current;
        self.current = id;
        self.tracer.scope("enter", "", id.as_u32());
        previous
    }

    /// Move to the parent of the current scope, returning the scope left.
    pub fn exit_scope(&mut self) -> ScopeId {
        let left = self.current;
        if let Some(parent) = self.scope(left).and_then(|s| s.parent) {
            self.current = parent;
        } else {
            self.current = ScopeId::GLOBAL;
        }
        self.tracer.scope("exit", "", left.as_u32());
        left
    }

    /// Run `f` with `id` as the current scope, restoring the previous
    /// current scope afterward. The mandatory idiom for tree recursion.
    pub fn with_scope<R>(&mut self, id: ScopeId, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.enter_scope(id);
        let result = f(self);
        self.current = previous;
        result
    }

    pub fn set_scope_span(&mut self, id: ScopeId, span: Span) {
        if let Some(scope) = self.scope_mut(id) {
            scope.span = Some(span);
        }
    }

    /// Direct child of `parent` whose recorded span is exactly `span`.
    /// Collection stamps every body scope with its construct's span, so
    /// later phases re-find scopes this way.
    pub fn find_child_at(&self, parent: ScopeId, span: Span) -> Option<ScopeId> {
        let parent = self.scope(parent)?;
        parent
            .children
            .iter()
            .copied()
            .find(|&id| self.scope(id).is_some_and(|s| s.span == Some(span)))
    }

    /// Direct child of `parent` with the given kind and name.
    pub fn find_child(&self, parent: ScopeId, kind: ScopeKind, name: &str) -> Option<ScopeId> {
        let parent = self.scope(parent)?;
        parent.children.iter().copied().find(|&id| {
            self.scope(id)
                .is_some_and(|s| s.kind == kind && s.name == name)
        })
    }

    /// The Type scope owned by a definition symbol, if one was built.
    pub fn type_scope_of(&self, owner: SymbolId) -> Option<ScopeId> {
        self.scopes
            .iter()
            .find(|s| s.kind == ScopeKind::Type && s.metadata.owner == Some(owner))
            .map(|s| s.id)
    }

    /// All scope ids in the subtree rooted at `root`, depth-first.
    pub fn subtree(&self, root: ScopeId) -> Vec<ScopeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(scope) = self.scope(id) {
                stack.extend(scope.children.iter().copied());
            }
        }
        out
    }

    /// Nearest enclosing scope of the given kind, starting at `from`.
    pub fn enclosing(&self, from: ScopeId, kind: ScopeKind) -> Option<&Scope> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let scope = self.scope(id)?;
            if scope.kind == kind {
                return Some(scope);
            }
            cursor = scope.parent;
        }
        None
    }

    // ===== symbols =====

    /// Insert a symbol into the current scope. Fails silently on a
    /// duplicate name; shadowing checks are the caller's job.
    pub fn define_symbol(
        &mut self,
        name: &str,
        kind: SymbolKind,
        opts: SymbolOptions,
    ) -> Option<SymbolId> {
        self.define_in(self.current, name, kind, opts)
    }

    /// Insert a symbol into an explicit scope.
    pub fn define_in(
        &mut self,
        scope_id: ScopeId,
        name: &str,
        kind: SymbolKind,
        opts: SymbolOptions,
    ) -> Option<SymbolId> {
        let scope = self.scopes.get_mut(scope_id.index())?;
        if scope.symbols.contains_key(name) {
            return None;
        }
        let id = SymbolId::from_raw(self.next_symbol);
        self.next_symbol += 1;
        let exported = opts.visibility.is_public();
        let symbol = Symbol {
            id,
            name: name.to_string(),
            kind,
            ty: opts.ty,
            scope: scope_id,
            context_span: opts.context_span,
            target_span: opts.target_span,
            flags: SymbolFlags {
                declared: opts.declared,
                initialized: opts.initialized,
                used: false,
                type_checked: false,
                exported,
            },
            visibility: opts.visibility,
            mutability: opts.mutability,
            binding: opts.binding,
            meta: opts.meta,
        };
        let slot = scope.symbols.len();
        scope.symbols.insert(name.to_string(), symbol);
        self.index.insert(id, (scope_id, slot));
        self.tracer.symbol("define", name, scope_id.as_u32());
        Some(id)
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        let &(scope_id, slot) = self.index.get(&id)?;
        self.scope(scope_id)?.symbols.get_index(slot).map(|(_, s)| s)
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        let &(scope_id, slot) = self.index.get(&id)?;
        self.scopes
            .get_mut(scope_id.index())?
            .symbols
            .get_index_mut(slot)
            .map(|(_, s)| s)
    }

    pub fn symbol_count(&self) -> usize {
        self.index.len()
    }

    /// Apply `f` to every symbol defined directly in `scope`.
    pub fn for_each_symbol_mut(&mut self, scope: ScopeId, mut f: impl FnMut(&mut Symbol)) {
        if let Some(scope) = self.scopes.get_mut(scope.index()) {
            for symbol in scope.symbols.values_mut() {
                f(symbol);
            }
        }
    }

    pub fn mark_used(&mut self, id: SymbolId) {
        if let Some(symbol) = self.symbol_mut(id) {
            symbol.flags.used = true;
        }
    }

    pub fn set_symbol_type(&mut self, id: SymbolId, ty: TypeNode) {
        if let Some(symbol) = self.symbol_mut(id) {
            symbol.ty = Some(ty);
        }
    }
}
