use nox_syntax::ast::{
    ArrayType, AssignExpr, ErrSetType, FieldInit, StructInitExpr, StructType, SwitchArm,
    SwitchExpr, SwitchPattern, ThrowStmt, TypeNode, WhileStmt,
};
use nox_syntax::{Expr, Stmt};

use super::testutil::*;
use crate::diagnostics::DiagnosticCode as C;

fn assign(target: Expr, value: Expr, at: (u32, u32)) -> Expr {
    Expr::Assign(AssignExpr {
        target: Box::new(target),
        op: None,
        value: Box::new(value),
        span: sp(at.0, at.1),
    })
}

fn array_of(elem: TypeNode, size: Option<Expr>, at: (u32, u32)) -> TypeNode {
    TypeNode::Array(ArrayType {
        elem: Box::new(elem),
        size: size.map(Box::new),
        span: sp(at.0, at.1),
    })
}

#[test]
fn annotation_and_initializer_must_agree() {
    let p = program(vec![module(
        "main",
        vec![let_stmt("x", (0, 16), Some(bool_ty()), Some(int(1, (14, 15))))],
    )]);
    assert!(codes(&p).contains(&C::TypeMismatch));
}

#[test]
fn initializer_must_fit_the_annotated_width() {
    let p = program(vec![module(
        "main",
        vec![let_stmt(
            "x",
            (0, 18),
            Some(prim(nox_syntax::ast::Primitive::U8)),
            Some(int(300, (14, 17))),
        )],
    )]);
    let result = analyze(&p);
    let found = result
        .diagnostics
        .iter()
        .find(|d| d.code == C::ArithmeticOverflow)
        .expect("overflow not reported");
    assert!(found.message.contains("u8"));
}

#[test]
fn constant_division_by_zero_is_caught() {
    use nox_syntax::ast::BinaryOp;
    let p = program(vec![module(
        "main",
        vec![expr_stmt(binary(
            BinaryOp::Div,
            int(5, (0, 1)),
            int(0, (4, 5)),
            (0, 5),
        ))],
    )]);
    assert!(codes(&p).contains(&C::DivisionByZero));
}

#[test]
fn loop_conditions_must_be_bool() {
    let p = program(vec![module(
        "main",
        vec![Stmt::While(WhileStmt {
            cond: int(1, (6, 7)),
            body: vec![],
            span: sp(0, 20),
        })],
    )]);
    assert!(codes(&p).contains(&C::ConditionNotBool));
}

#[test]
fn immutable_bindings_cannot_be_reassigned() {
    let p = program(vec![module(
        "main",
        vec![
            let_stmt("x", (0, 10), None, Some(int(1, (8, 9)))),
            expr_stmt(assign(ident("x", (20, 21)), int(2, (24, 25)), (20, 25))),
        ],
    )]);
    assert!(codes(&p).contains(&C::ImmutableAssignment));
}

#[test]
fn mutable_bindings_can_be_reassigned() {
    let p = program(vec![module(
        "main",
        vec![
            let_mut("x", (0, 14), Some(i32_ty()), Some(int(1, (12, 13)))),
            expr_stmt(assign(ident("x", (20, 21)), int(2, (24, 25)), (20, 25))),
        ],
    )]);
    assert!(!codes(&p).contains(&C::ImmutableAssignment));
}

#[test]
fn call_arity_respects_defaults() {
    let p = program(vec![module(
        "main",
        vec![
            func(
                "f",
                (0, 40),
                vec![
                    param("a", (6, 14), Some(i32_ty())),
                    param_default("b", (16, 28), Some(i32_ty()), int(0, (26, 27))),
                ],
                None,
                vec![],
            ),
            // One argument satisfies `a`; `b` has a default.
            expr_stmt(call(ident("f", (50, 51)), vec![int(1, (52, 53))], (50, 55))),
            // Zero arguments leaves `a` unfilled.
            expr_stmt(call(ident("f", (60, 61)), vec![], (60, 63))),
        ],
    )]);
    let cs = codes(&p);
    assert_eq!(count_of(&cs, C::ArgumentCountMismatch), 1);
}

#[test]
fn argument_types_are_checked() {
    let p = program(vec![module(
        "main",
        vec![
            func("f", (0, 40), vec![param("a", (6, 14), Some(i32_ty()))], None, vec![]),
            expr_stmt(call(
                ident("f", (50, 51)),
                vec![boolean(true, (52, 56))],
                (50, 57),
            )),
        ],
    )]);
    assert!(codes(&p).contains(&C::ArgumentTypeMismatch));
}

#[test]
fn calling_a_non_function_is_an_error() {
    let p = program(vec![module(
        "main",
        vec![
            let_stmt("v", (0, 10), Some(i32_ty()), Some(int(1, (8, 9)))),
            expr_stmt(call(ident("v", (20, 21)), vec![], (20, 23))),
        ],
    )]);
    assert!(codes(&p).contains(&C::NotCallable));
}

fn point_def() -> Stmt {
    let body = StructType {
        fields: vec![
            struct_field("x", (10, 18), i32_ty()),
            struct_field("y", (20, 28), i32_ty()),
        ],
        methods: vec![],
        span: sp(8, 30),
    };
    def_stmt("Point", (0, 32), TypeNode::Struct(body))
}

fn point_init(fields: Vec<FieldInit>, at: (u32, u32)) -> Expr {
    Expr::StructInit(StructInitExpr {
        ty: Some(nm("Point", (at.0, at.0 + 5))),
        fields,
        span: sp(at.0, at.1),
    })
}

fn field_init(name: &str, at: (u32, u32), value: Expr) -> FieldInit {
    FieldInit {
        name: nm(name, (at.0, at.0 + name.len() as u32)),
        value,
        span: sp(at.0, at.1),
    }
}

#[test]
fn struct_init_requires_every_defaultless_field() {
    let p = program(vec![module(
        "main",
        vec![
            point_def(),
            expr_stmt(point_init(
                vec![field_init("x", (50, 56), int(1, (54, 55)))],
                (44, 58),
            )),
        ],
    )]);
    let result = analyze(&p);
    let found = result
        .diagnostics
        .iter()
        .find(|d| d.code == C::MissingRequiredField)
        .expect("missing field not reported");
    assert!(found.message.contains('y'));
}

#[test]
fn anonymous_struct_literals_use_the_annotated_type() {
    let p = program(vec![module(
        "main",
        vec![
            point_def(),
            let_stmt(
                "p",
                (40, 80),
                Some(ty_ident("Point", (47, 52))),
                Some(Expr::StructInit(StructInitExpr {
                    ty: None,
                    fields: vec![field_init("x", (60, 66), int(1, (64, 65)))],
                    span: sp(56, 78),
                })),
            ),
        ],
    )]);
    let result = analyze(&p);
    let found = result
        .diagnostics
        .iter()
        .find(|d| d.code == C::MissingRequiredField)
        .expect("missing field not reported");
    assert!(found.message.contains('y'));
}

#[test]
fn anonymous_argument_literals_use_the_parameter_type() {
    let p = program(vec![module(
        "main",
        vec![
            point_def(),
            func(
                "consume",
                (40, 80),
                vec![param("pt", (51, 62), Some(ty_ident("Point", (55, 60))))],
                None,
                vec![],
            ),
            expr_stmt(call(
                ident("consume", (90, 97)),
                vec![Expr::StructInit(StructInitExpr {
                    ty: None,
                    fields: vec![field_init("x", (100, 106), int(1, (104, 105)))],
                    span: sp(98, 118),
                })],
                (90, 120),
            )),
        ],
    )]);
    let result = analyze(&p);
    let found = result
        .diagnostics
        .iter()
        .find(|d| d.code == C::MissingRequiredField)
        .expect("missing field not reported");
    assert!(found.message.contains('y'));
}

#[test]
fn struct_init_rejects_unknown_and_duplicate_fields() {
    let p = program(vec![module(
        "main",
        vec![
            point_def(),
            expr_stmt(point_init(
                vec![
                    field_init("x", (50, 56), int(1, (54, 55))),
                    field_init("x", (58, 64), int(2, (62, 63))),
                    field_init("z", (66, 72), int(3, (70, 71))),
                ],
                (44, 74),
            )),
        ],
    )]);
    let cs = codes(&p);
    assert!(cs.contains(&C::DuplicateFieldInit));
    assert!(cs.contains(&C::UnknownField));
}

#[test]
fn return_value_must_match_the_signature() {
    let p = program(vec![module(
        "main",
        vec![func(
            "f",
            (0, 50),
            vec![],
            Some(i32_ty()),
            vec![ret_stmt(Some(boolean(true, (30, 34))), (22, 36))],
        )],
    )]);
    assert!(codes(&p).contains(&C::ReturnTypeMismatch));
}

#[test]
fn return_and_break_need_their_enclosing_construct() {
    let p = program(vec![module(
        "main",
        vec![
            ret_stmt(None, (0, 7)),
            Stmt::Break(nox_syntax::ast::BreakStmt { span: sp(10, 15) }),
        ],
    )]);
    let cs = codes(&p);
    assert!(cs.contains(&C::ReturnOutsideFunction));
    assert!(cs.contains(&C::BreakOutsideLoop));
}

#[test]
fn throw_requires_a_declared_error_type() {
    let p = program(vec![module(
        "main",
        vec![func(
            "f",
            (0, 50),
            vec![],
            None,
            vec![Stmt::Throw(ThrowStmt {
                value: int(1, (30, 31)),
                span: sp(24, 32),
            })],
        )],
    )]);
    assert!(codes(&p).contains(&C::ThrowWithoutErrorType));
}

#[test]
fn thrown_variant_must_belong_to_the_error_set() {
    let mut decl = func_decl("f", (0, 90), vec![], None, vec![]);
    decl.error_ty = Some(TypeNode::ErrSet(ErrSetType {
        variants: vec![nm("NotFound", (10, 18))],
        span: sp(8, 20),
    }));
    decl.body = vec![Stmt::Throw(ThrowStmt {
        value: field(ident("selferr", (40, 47)), "Missing", (40, 55)),
        span: sp(34, 56),
    })];
    let p = program(vec![module("main", vec![Stmt::Func(decl)])]);
    assert!(codes(&p).contains(&C::UnknownErrorVariant));
}

#[test]
fn thrown_value_must_match_a_plain_error_type() {
    let mut decl = func_decl("f", (0, 60), vec![], None, vec![]);
    decl.error_ty = Some(i32_ty());
    decl.body = vec![Stmt::Throw(ThrowStmt {
        value: boolean(true, (30, 34)),
        span: sp(24, 35),
    })];
    let p = program(vec![module("main", vec![Stmt::Func(decl)])]);
    assert!(codes(&p).contains(&C::ThrowTypeMismatch));
}

fn color_def() -> Stmt {
    use nox_syntax::ast::{EnumType, EnumVariant};
    let body = EnumType {
        variants: vec![
            EnumVariant {
                name: nm("Red", (10, 13)),
                value: None,
                span: sp(10, 13),
            },
            EnumVariant {
                name: nm("Green", (15, 20)),
                value: None,
                span: sp(15, 20),
            },
        ],
        span: sp(8, 22),
    };
    def_stmt("Color", (0, 24), TypeNode::Enum(body))
}

#[test]
fn enum_switch_must_cover_every_variant() {
    let p = program(vec![module(
        "main",
        vec![
            color_def(),
            let_stmt(
                "c",
                (30, 60),
                Some(ty_ident("Color", (37, 42))),
                Some(field(ident("Color", (45, 50)), "Red", (45, 54))),
            ),
            expr_stmt(Expr::Switch(SwitchExpr {
                scrutinee: Box::new(ident("c", (77, 78))),
                arms: vec![SwitchArm {
                    pattern: SwitchPattern::Expr(field(
                        ident("Color", (82, 87)),
                        "Red",
                        (82, 91),
                    )),
                    body: vec![],
                    span: sp(82, 95),
                }],
                span: sp(70, 100),
            })),
        ],
    )]);
    let result = analyze(&p);
    let found = result
        .diagnostics
        .iter()
        .find(|d| d.code == C::SwitchNotExhaustive)
        .expect("non-exhaustive switch not reported");
    assert!(found.message.contains("Green"));
}

#[test]
fn duplicate_switch_arms_are_reported() {
    let p = program(vec![module(
        "main",
        vec![
            let_stmt("n", (0, 10), Some(i32_ty()), Some(int(1, (8, 9)))),
            expr_stmt(Expr::Switch(SwitchExpr {
                scrutinee: Box::new(ident("n", (27, 28))),
                arms: vec![
                    SwitchArm {
                        pattern: SwitchPattern::Expr(int(1, (32, 33))),
                        body: vec![],
                        span: sp(32, 36),
                    },
                    SwitchArm {
                        pattern: SwitchPattern::Expr(int(1, (40, 41))),
                        body: vec![],
                        span: sp(40, 44),
                    },
                    SwitchArm {
                        pattern: SwitchPattern::Default,
                        body: vec![],
                        span: sp(48, 52),
                    },
                ],
                span: sp(20, 56),
            })),
        ],
    )]);
    assert!(codes(&p).contains(&C::SwitchDuplicateArm));
}

#[test]
fn array_sizes_must_be_nonnegative_constants() {
    let p = program(vec![module(
        "main",
        vec![
            let_mut("n", (0, 14), Some(i32_ty()), Some(int(4, (12, 13)))),
            let_stmt(
                "a",
                (20, 40),
                Some(array_of(i32_ty(), Some(ident("n", (28, 29))), (26, 34))),
                None,
            ),
            let_stmt(
                "b",
                (50, 70),
                Some(array_of(i32_ty(), Some(int(-3, (56, 58))), (54, 64))),
                None,
            ),
        ],
    )]);
    let cs = codes(&p);
    assert!(cs.contains(&C::ArraySizeNotConstant));
    assert!(cs.contains(&C::ArraySizeNegative));
}

#[test]
fn immutable_constants_flow_into_array_sizes() {
    let p = program(vec![module(
        "main",
        vec![
            let_stmt("size", (0, 14), None, Some(int(4, (12, 13)))),
            let_stmt(
                "a",
                (20, 44),
                Some(array_of(i32_ty(), Some(ident("size", (28, 32))), (26, 38))),
                None,
            ),
        ],
    )]);
    let cs = codes(&p);
    assert!(!cs.contains(&C::ArraySizeNotConstant));
    assert!(!cs.contains(&C::ArraySizeNegative));
}

#[test]
fn bindings_need_a_type_or_an_initializer() {
    let p = program(vec![module("main", vec![let_stmt("x", (0, 6), None, None)])]);
    assert!(codes(&p).contains(&C::TypeAnnotationRequired));
}
