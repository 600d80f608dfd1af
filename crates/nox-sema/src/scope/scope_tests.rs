use nox_syntax::Span;

use super::*;
use crate::trace::Tracer;

fn manager() -> ScopeManager {
    ScopeManager::new(Tracer::default())
}

fn define(m: &mut ScopeManager, scope: ScopeId, name: &str) -> SymbolId {
    m.define_in(scope, name, SymbolKind::Variable, SymbolOptions::default())
        .unwrap()
}

#[test]
fn global_scope_exists_with_builtins() {
    let m = manager();
    assert_eq!(m.scope_count(), 1);
    let global = m.scope(ScopeId::GLOBAL).unwrap();
    assert_eq!(global.kind, ScopeKind::Global);
    assert_eq!(global.level, 0);
    let print = global.symbol("print").unwrap();
    assert!(print.is_builtin());
    assert!(print.flags.declared && print.flags.initialized);
}

#[test]
fn symbol_ids_are_monotonic() {
    let mut m = manager();
    let module = m.create_scope(ScopeKind::Module, "main", ScopeId::GLOBAL);
    let a = define(&mut m, module, "a");
    let b = define(&mut m, module, "b");
    let c = define(&mut m, module, "c");
    assert!(a.as_u32() < b.as_u32());
    assert!(b.as_u32() < c.as_u32());
}

#[test]
fn duplicate_definition_is_rejected() {
    let mut m = manager();
    let module = m.create_scope(ScopeKind::Module, "main", ScopeId::GLOBAL);
    define(&mut m, module, "x");
    let dup = m.define_in(module, "x", SymbolKind::Variable, SymbolOptions::default());
    assert!(dup.is_none());
    assert_eq!(m.scope(module).unwrap().symbols.len(), 1);
}

#[test]
fn levels_follow_parents() {
    let mut m = manager();
    let module = m.create_scope(ScopeKind::Module, "main", ScopeId::GLOBAL);
    let func = m.create_scope(ScopeKind::Function, "f", module);
    let block = m.create_scope(ScopeKind::Block, "", func);
    assert_eq!(m.scope(module).unwrap().level, 1);
    assert_eq!(m.scope(func).unwrap().level, 2);
    assert_eq!(m.scope(block).unwrap().level, 3);
    assert_eq!(m.scope(func).unwrap().children, vec![block]);
}

#[test]
fn with_scope_restores_current() {
    let mut m = manager();
    let module = m.create_scope(ScopeKind::Module, "main", ScopeId::GLOBAL);
    m.enter_scope(module);
    let inner = m.create_scope(ScopeKind::Block, "", module);
    let seen = m.with_scope(inner, |m| m.current_scope());
    assert_eq!(seen, inner);
    assert_eq!(m.current_scope(), module);
}

#[test]
fn chain_lookup_stops_at_module_boundary() {
    let mut m = manager();
    let lib = m.create_scope(ScopeKind::Module, "lib", ScopeId::GLOBAL);
    define(&mut m, lib, "secret");
    let main = m.create_scope(ScopeKind::Module, "main", ScopeId::GLOBAL);
    let func = m.create_scope(ScopeKind::Function, "f", main);
    let local = define(&mut m, func, "local");

    assert_eq!(m.lookup_in_scope_chain(func, "local"), Some(local));
    // `secret` lives in a sibling module; the chain walk must not see it.
    assert_eq!(m.lookup_in_scope_chain(func, "secret"), None);
}

#[test]
fn chain_lookup_reaches_builtins_past_module() {
    let mut m = manager();
    let main = m.create_scope(ScopeKind::Module, "main", ScopeId::GLOBAL);
    let func = m.create_scope(ScopeKind::Function, "f", main);
    let id = m.lookup_in_scope_chain(func, "print").unwrap();
    assert!(m.symbol(id).unwrap().is_builtin());
}

#[test]
fn global_fallback_excludes_ordinary_symbols() {
    let mut m = manager();
    let stray = m.define_in(
        ScopeId::GLOBAL,
        "stray",
        SymbolKind::Variable,
        SymbolOptions::default(),
    );
    assert!(stray.is_some());
    let main = m.create_scope(ScopeKind::Module, "main", ScopeId::GLOBAL);
    assert_eq!(m.lookup_in_scope_chain(main, "stray"), None);
    // The plain parent walk still finds it.
    assert!(m.lookup_in_parent_scopes(main, "stray").is_some());
}

#[test]
fn parent_lookup_prefers_innermost() {
    let mut m = manager();
    let module = m.create_scope(ScopeKind::Module, "main", ScopeId::GLOBAL);
    let outer = define(&mut m, module, "x");
    let func = m.create_scope(ScopeKind::Function, "f", module);
    let inner = define(&mut m, func, "x");
    assert_eq!(m.lookup_in_parent_scopes(func, "x"), Some(inner));
    assert_eq!(m.lookup_in_parent_scopes(module, "x"), Some(outer));
}

#[test]
fn narrowest_scope_wins_at_position() {
    let mut m = manager();
    let module = m.create_scope(ScopeKind::Module, "main", ScopeId::GLOBAL);
    m.set_scope_span(module, Span::new(0, 100));
    let func = m.create_scope(ScopeKind::Function, "f", module);
    m.set_scope_span(func, Span::new(10, 60));
    let block = m.create_scope(ScopeKind::Block, "", func);
    m.set_scope_span(block, Span::new(20, 40));

    assert_eq!(m.find_narrowest_scope_at(30), Some(block));
    assert_eq!(m.find_narrowest_scope_at(50), Some(func));
    assert_eq!(m.find_narrowest_scope_at(90), Some(module));
    assert_eq!(m.find_narrowest_scope_at(200), None);
}

#[test]
fn proximity_fallback_picks_closest_symbols() {
    let mut m = manager();
    let near = m.create_scope(ScopeKind::Module, "near", ScopeId::GLOBAL);
    m.define_in(
        near,
        "a",
        SymbolKind::Variable,
        SymbolOptions {
            target_span: Some(Span::new(10, 12)),
            ..SymbolOptions::default()
        },
    );
    let far = m.create_scope(ScopeKind::Module, "far", ScopeId::GLOBAL);
    m.define_in(
        far,
        "b",
        SymbolKind::Variable,
        SymbolOptions {
            target_span: Some(Span::new(500, 505)),
            ..SymbolOptions::default()
        },
    );
    assert_eq!(m.find_scope_by_symbol_proximity(15), Some(near));
    assert_eq!(m.find_scope_by_symbol_proximity(490), Some(far));
}

#[test]
fn position_lookup_resolves_through_chain() {
    let mut m = manager();
    let module = m.create_scope(ScopeKind::Module, "main", ScopeId::GLOBAL);
    m.set_scope_span(module, Span::new(0, 100));
    let value = define(&mut m, module, "value");
    let func = m.create_scope(ScopeKind::Function, "f", module);
    m.set_scope_span(func, Span::new(10, 60));
    assert_eq!(m.lookup_from_position(30, "value"), Some(value));
    assert_eq!(m.lookup_from_position(30, "missing"), None);
}

#[test]
fn reset_restarts_ids_and_keeps_builtins() {
    let mut m = manager();
    let module = m.create_scope(ScopeKind::Module, "main", ScopeId::GLOBAL);
    define(&mut m, module, "x");
    let symbols_before = m.symbol_count();
    m.reset();
    assert_eq!(m.scope_count(), 1);
    assert_eq!(m.symbol_count(), symbols_before - 1);
    assert!(m.scope(ScopeId::GLOBAL).unwrap().symbol("print").is_some());
    assert_eq!(m.current_scope(), ScopeId::GLOBAL);
}

#[test]
fn mark_used_and_type_stick() {
    let mut m = manager();
    let module = m.create_scope(ScopeKind::Module, "main", ScopeId::GLOBAL);
    let id = define(&mut m, module, "x");
    assert!(!m.symbol(id).unwrap().flags.used);
    m.mark_used(id);
    assert!(m.symbol(id).unwrap().flags.used);
    assert!(m.symbol(id).unwrap().ty.is_none());
}
