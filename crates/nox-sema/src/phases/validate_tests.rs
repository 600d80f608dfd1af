use nox_syntax::ast::Visibility;
use nox_syntax::Stmt;

use super::testutil::*;
use crate::diagnostics::DiagnosticCode as C;

fn public_main(ret: Option<nox_syntax::TypeNode>) -> Stmt {
    let mut decl = func_decl("main", (0, 40), vec![], ret, vec![]);
    decl.visibility = Visibility::Public;
    Stmt::Func(decl)
}

#[test]
fn missing_entry_module_is_reported() {
    let p = program_with_entry("app", vec![module("main", vec![public_main(None)])]);
    assert!(codes(&p).contains(&C::EntryModuleNotFound));
}

#[test]
fn entry_module_must_define_main() {
    let p = program_with_entry(
        "main",
        vec![module("main", vec![let_stmt("_x", (0, 10), None, Some(int(1, (8, 9))))])],
    );
    assert!(codes(&p).contains(&C::EntryModuleNoMain));
}

#[test]
fn entry_main_must_be_public() {
    let p = program_with_entry(
        "main",
        vec![module("main", vec![func("main", (0, 40), vec![], None, vec![])])],
    );
    assert!(codes(&p).contains(&C::EntryModulePrivateMain));
}

#[test]
fn entry_main_return_type_is_constrained() {
    let bad = program_with_entry("main", vec![module("main", vec![public_main(Some(bool_ty()))])]);
    assert!(codes(&bad).contains(&C::EntryMainInvalidReturn));

    let good = program_with_entry(
        "main",
        vec![module(
            "main",
            vec![public_main(Some(i32_ty()))],
        )],
    );
    assert!(!codes(&good).contains(&C::EntryMainInvalidReturn));
}

#[test]
fn untouched_private_bindings_are_flagged() {
    let p = program(vec![module(
        "main",
        vec![let_stmt("orphan", (0, 14), None, Some(int(1, (12, 13))))],
    )]);
    let result = analyze(&p);
    let found = result
        .diagnostics
        .iter()
        .find(|d| d.code == C::UnusedVariable)
        .expect("unused binding not reported");
    assert!(found.message.contains("orphan"));
    // A warning, not an error.
    assert!(result.success);
}

#[test]
fn underscore_prefix_suppresses_the_unused_warning() {
    let p = program(vec![module(
        "main",
        vec![let_stmt("_scratch", (0, 16), None, Some(int(1, (14, 15))))],
    )]);
    assert!(!codes(&p).contains(&C::UnusedVariable));
}

#[test]
fn exported_bindings_are_never_flagged_unused() {
    let mut stmt = let_stmt("shared", (0, 14), None, Some(int(1, (12, 13))));
    if let Stmt::Let(inner) = &mut stmt {
        inner.visibility = Visibility::Public;
    }
    let p = program(vec![module("main", vec![stmt])]);
    assert!(!codes(&p).contains(&C::UnusedVariable));
}

#[test]
fn main_is_exempt_from_the_unused_sweep() {
    let p = program(vec![module(
        "main",
        vec![func("main", (0, 40), vec![], None, vec![])],
    )]);
    assert!(!codes(&p).contains(&C::UnusedFunction));
}

#[test]
fn imports_are_exempt_from_the_unused_sweep() {
    let lib = module("lib", vec![let_stmt("_v", (0, 10), None, Some(int(1, (8, 9))))]);
    let p = program(vec![lib, module("main", vec![use_module("lib", (0, 12))])]);
    let result = analyze(&p);
    assert!(result.diagnostics.is_empty());
    assert!(result.success);
}

#[test]
fn empty_modules_are_flagged() {
    let p = program(vec![module("hollow", vec![])]);
    assert!(codes(&p).contains(&C::EmptyModule));
}

#[test]
fn an_import_cycle_is_reported_exactly_once() {
    let a = module("a", vec![use_module("b", (0, 10))]);
    let b = module("b", vec![use_module("a", (0, 10))]);
    let p = program(vec![a, b]);
    let result = analyze(&p);
    let cycles: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == C::ImportCircularDependency)
        .collect();
    assert_eq!(cycles.len(), 1);
    assert!(cycles[0].message.contains("->"));
}
