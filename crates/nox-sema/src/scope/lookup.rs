//! Symbol lookup strategies.
//!
//! Three independent strategies used in different situations:
//! 1. module-boundary-aware chain walk (ordinary identifier resolution)
//! 2. plain parent-chain walk (intra-construct shadowing checks)
//! 3. position-based lookup (IDE hover/completion callers)

use nox_syntax::Span;

use super::{Scope, ScopeId, ScopeKind, ScopeManager, SymbolId};

impl ScopeManager {
    /// Walk from `from` toward the root, checking every scope inside the
    /// originating module. Once the module scope has been checked, only
    /// global symbols that are imports or builtins are considered, so
    /// names from other modules never leak through the global scope.
    pub fn lookup_in_scope_chain(&self, from: ScopeId, name: &str) -> Option<SymbolId> {
        let mut cursor = Some(from);
        let mut crossed_module = false;
        while let Some(id) = cursor {
            let scope = self.scope(id)?;
            if let Some(symbol) = scope.symbol(name) {
                if scope.kind == ScopeKind::Global {
                    if symbol.is_import() || symbol.is_builtin() {
                        return Some(symbol.id);
                    }
                } else if !crossed_module {
                    return Some(symbol.id);
                }
            }
            if scope.kind == ScopeKind::Module {
                crossed_module = true;
            }
            cursor = scope.parent;
        }
        None
    }

    /// Plain parent-chain walk with no module boundary, used for
    /// shadowing checks.
    pub fn lookup_in_parent_scopes(&self, from: ScopeId, name: &str) -> Option<SymbolId> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let scope = self.scope(id)?;
            if let Some(symbol) = scope.symbol(name) {
                return Some(symbol.id);
            }
            cursor = scope.parent;
        }
        None
    }

    /// Lookup restricted to one scope, no chain walk.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scope(scope)?.symbol(name).map(|s| s.id)
    }

    /// Most deeply nested scope whose recorded span contains `pos`.
    pub fn find_narrowest_scope_at(&self, pos: u32) -> Option<ScopeId> {
        let mut best: Option<&Scope> = None;
        for scope in self.iter_scopes() {
            let Some(span) = scope.span else { continue };
            if !span.contains(pos) {
                continue;
            }
            match best {
                Some(current) if current.level >= scope.level => {}
                _ => best = Some(scope),
            }
        }
        best.map(|s| s.id)
    }

    /// Fallback for scopes without span metadata: the scope whose
    /// symbols sit closest to `pos`.
    pub fn find_scope_by_symbol_proximity(&self, pos: u32) -> Option<ScopeId> {
        let mut best: Option<(u32, ScopeId)> = None;
        for scope in self.iter_scopes() {
            for symbol in scope.symbols.values() {
                let Some(span) = symbol.target_span.or(symbol.context_span) else {
                    continue;
                };
                let distance = span.distance_to(pos);
                match best {
                    Some((current, _)) if current <= distance => {}
                    _ => best = Some((distance, scope.id)),
                }
            }
        }
        best.map(|(_, id)| id)
    }

    /// Position-based lookup for IDE callers. Tries the narrowest
    /// span-carrying scope, falls back to symbol proximity, then to the
    /// global scope, and resolves `name` from there.
    pub fn lookup_from_position(&self, pos: u32, name: &str) -> Option<SymbolId> {
        let scope = self
            .find_narrowest_scope_at(pos)
            .or_else(|| self.find_scope_by_symbol_proximity(pos))
            .unwrap_or(ScopeId::GLOBAL);
        self.lookup_in_scope_chain(scope, name)
            .or_else(|| self.lookup_in_parent_scopes(scope, name))
    }

    /// Narrowest scope containing `span`, by its start offset.
    pub fn scope_at_span(&self, span: Span) -> Option<ScopeId> {
        self.find_narrowest_scope_at(span.start)
    }
}
