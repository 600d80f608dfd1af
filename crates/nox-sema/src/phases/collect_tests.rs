use nox_syntax::ast::{EnumType, EnumVariant, StructType, TypeNode};

use super::testutil::*;
use super::{run_collection, Services};
use crate::diagnostics::DiagnosticCode as C;
use crate::trace::TraceLevel;

#[test]
fn same_scope_redefinition_is_an_error() {
    let p = program(vec![module(
        "main",
        vec![
            let_stmt("x", (0, 10), None, Some(int(1, (8, 9)))),
            let_stmt("x", (20, 30), None, Some(int(2, (28, 29)))),
        ],
    )]);
    assert!(codes(&p).contains(&C::DuplicateSymbol));
}

#[test]
fn shadowing_an_outer_binding_is_only_a_warning() {
    let p = program(vec![module(
        "main",
        vec![
            let_stmt("x", (0, 10), None, Some(int(1, (8, 9)))),
            func(
                "f",
                (20, 80),
                vec![],
                None,
                vec![let_stmt("x", (40, 52), None, Some(int(2, (50, 51))))],
            ),
        ],
    )]);
    let cs = codes(&p);
    assert!(cs.contains(&C::ShadowedSymbol));
    assert!(!cs.contains(&C::DuplicateSymbol));
}

#[test]
fn duplicate_parameters_get_their_own_code() {
    let p = program(vec![module(
        "main",
        vec![func(
            "f",
            (0, 60),
            vec![
                param("a", (6, 12), Some(i32_ty())),
                param("a", (14, 20), Some(i32_ty())),
            ],
            None,
            vec![],
        )],
    )]);
    let cs = codes(&p);
    assert!(cs.contains(&C::DuplicateParameter));
    assert!(!cs.contains(&C::DuplicateSymbol));
}

#[test]
fn reserved_prefix_names_are_rejected() {
    let p = program(vec![module(
        "main",
        vec![let_stmt("@x", (0, 12), None, Some(int(1, (10, 11))))],
    )]);
    assert!(codes(&p).contains(&C::ReservedPrefix));
}

#[test]
fn parameter_named_self_collides_with_the_receiver() {
    let method = func_decl("area", (20, 70), vec![param("self", (28, 36), None)], None, vec![]);
    let body = StructType {
        fields: vec![struct_field("x", (10, 18), i32_ty())],
        methods: vec![method],
        span: sp(8, 72),
    };
    let p = program(vec![module(
        "main",
        vec![def_stmt("Point", (0, 74), TypeNode::Struct(body))],
    )]);
    assert!(codes(&p).contains(&C::SelfCollision));
}

#[test]
fn duplicate_struct_fields_and_enum_variants() {
    let point = StructType {
        fields: vec![
            struct_field("x", (10, 18), i32_ty()),
            struct_field("x", (20, 28), i32_ty()),
        ],
        methods: vec![],
        span: sp(8, 30),
    };
    let color = EnumType {
        variants: vec![
            EnumVariant {
                name: nm("Red", (50, 53)),
                value: None,
                span: sp(50, 53),
            },
            EnumVariant {
                name: nm("Red", (55, 58)),
                value: None,
                span: sp(55, 58),
            },
        ],
        span: sp(48, 60),
    };
    let p = program(vec![module(
        "main",
        vec![
            def_stmt("Point", (0, 32), TypeNode::Struct(point)),
            def_stmt("Color", (40, 62), TypeNode::Enum(color)),
        ],
    )]);
    let cs = codes(&p);
    assert!(cs.contains(&C::DuplicateField));
    assert!(cs.contains(&C::DuplicateEnumVariant));
}

#[test]
fn mutually_recursive_aliases_report_a_cycle() {
    let p = program(vec![module(
        "main",
        vec![
            def_stmt("A", (0, 12), ty_ident("B", (8, 9))),
            def_stmt("B", (20, 32), ty_ident("A", (28, 29))),
        ],
    )]);
    let cs = codes(&p);
    assert!(cs.contains(&C::TypeCycleDetected));
}

#[test]
fn repeated_primitive_members_are_not_a_cycle() {
    // Builder-made primitive nodes share a default span; two fields of
    // the same primitive must not read as a revisit.
    let body = StructType {
        fields: vec![
            struct_field("x", (10, 18), i32_ty()),
            struct_field("y", (20, 28), i32_ty()),
        ],
        methods: vec![],
        span: sp(8, 30),
    };
    let p = program(vec![module(
        "main",
        vec![def_stmt("Point", (0, 32), TypeNode::Struct(body))],
    )]);
    assert!(!codes(&p).contains(&C::TypeCycleDetected));
}

#[test]
fn comptime_functions_keep_their_body() {
    let mut decl = func_decl(
        "sq",
        (0, 60),
        vec![param("n", (8, 14), Some(i32_ty()))],
        Some(i32_ty()),
        vec![ret_stmt(Some(ident("n", (30, 31))), (22, 40))],
    );
    decl.is_comptime = true;
    let other = func_decl("plain", (70, 110), vec![], None, vec![]);
    let p = program(vec![module(
        "main",
        vec![nox_syntax::Stmt::Func(decl), nox_syntax::Stmt::Func(other)],
    )]);

    let mut services = Services::new(TraceLevel::Off, false, None);
    run_collection(&mut services, &p);

    let scope = services.module_scopes["main"];
    let sq = services.scopes.lookup_local(scope, "sq").unwrap();
    let plain = services.scopes.lookup_local(scope, "plain").unwrap();
    let body_of = |id| {
        services
            .scopes
            .symbol(id)
            .and_then(|s| s.callable())
            .map(|m| m.body.is_some())
    };
    assert_eq!(body_of(sq), Some(true));
    assert_eq!(body_of(plain), Some(false));
}

#[test]
fn top_level_names_are_visible_regardless_of_order() {
    // A call above the function it targets must still resolve; the
    // definition sub-pass runs before everything else.
    let p = program(vec![module(
        "main",
        vec![
            expr_stmt(call(ident("late", (0, 4)), vec![], (0, 6))),
            func("late", (10, 40), vec![], None, vec![]),
        ],
    )]);
    let cs = codes(&p);
    assert!(!cs.contains(&C::UndefinedIdentifier));
    assert!(!cs.contains(&C::UseBeforeDeclaration));
}
