use nox_syntax::ast::{
    BinaryExpr, BinaryOp, CallExpr, CastExpr, FieldExpr, IdentExpr, Literal, LiteralExpr, Name,
    Primitive, StructField, StructType, UnaryExpr, UnaryOp, Visibility,
};
use nox_syntax::{Expr, Span, TypeNode};

use super::*;
use crate::scope::{ScopeId, ScopeKind, ScopeManager, SymbolKind, SymbolOptions};
use crate::trace::Tracer;

fn lit_int(v: i128, span: Span) -> Expr {
    Expr::Literal(LiteralExpr {
        value: Literal::Int(v),
        span,
    })
}

fn ident(text: &str, span: Span) -> Expr {
    Expr::Ident(IdentExpr {
        name: Name {
            text: text.to_string(),
            span,
        },
    })
}

struct Fixture {
    scopes: ScopeManager,
    inference: TypeInference,
    module: ScopeId,
}

impl Fixture {
    fn new() -> Self {
        let mut scopes = ScopeManager::new(Tracer::default());
        let module = scopes.create_scope(ScopeKind::Module, "main", ScopeId::GLOBAL);
        Self {
            scopes,
            inference: TypeInference::new(),
            module,
        }
    }

    fn define(&mut self, name: &str, ty: TypeNode) {
        self.scopes
            .define_in(
                self.module,
                name,
                SymbolKind::Variable,
                SymbolOptions {
                    ty: Some(ty),
                    ..SymbolOptions::default()
                },
            )
            .unwrap();
    }

    fn infer(&mut self, expr: &Expr) -> Option<TypeNode> {
        let cx = InferContext {
            scopes: &self.scopes,
            module: "main",
            scope: self.module,
        };
        self.inference.infer(expr, &cx)
    }
}

#[test]
fn literals_infer_comptime_types() {
    let mut f = Fixture::new();
    assert_eq!(
        f.infer(&lit_int(1, Span::new(0, 1))).and_then(|t| t.as_primitive()),
        Some(Primitive::ComptimeInt)
    );
    let b = Expr::Literal(LiteralExpr {
        value: Literal::Bool(true),
        span: Span::new(2, 6),
    });
    assert_eq!(
        f.infer(&b).and_then(|t| t.as_primitive()),
        Some(Primitive::Bool)
    );
}

#[test]
fn identifiers_infer_their_symbol_type() {
    let mut f = Fixture::new();
    f.define("x", primitive(Primitive::I32));
    let t = f.infer(&ident("x", Span::new(0, 1)));
    assert_eq!(t.and_then(|t| t.as_primitive()), Some(Primitive::I32));
    assert!(f.infer(&ident("missing", Span::new(5, 12))).is_none());
}

#[test]
fn comparisons_are_bool_arithmetic_unifies() {
    let mut f = Fixture::new();
    f.define("a", primitive(Primitive::I32));
    f.define("b", primitive(Primitive::I64));
    let cmp = Expr::Binary(BinaryExpr {
        op: BinaryOp::Lt,
        lhs: Box::new(ident("a", Span::new(0, 1))),
        rhs: Box::new(ident("b", Span::new(4, 5))),
        span: Span::new(0, 5),
    });
    assert_eq!(
        f.infer(&cmp).and_then(|t| t.as_primitive()),
        Some(Primitive::Bool)
    );
    let sum = Expr::Binary(BinaryExpr {
        op: BinaryOp::Add,
        lhs: Box::new(ident("a", Span::new(10, 11))),
        rhs: Box::new(ident("b", Span::new(14, 15))),
        span: Span::new(10, 15),
    });
    // The wider operand wins.
    assert_eq!(
        f.infer(&sum).and_then(|t| t.as_primitive()),
        Some(Primitive::I64)
    );
}

#[test]
fn comptime_operand_adopts_the_sized_side() {
    let mut f = Fixture::new();
    f.define("n", primitive(Primitive::U8));
    let sum = Expr::Binary(BinaryExpr {
        op: BinaryOp::Add,
        lhs: Box::new(ident("n", Span::new(0, 1))),
        rhs: Box::new(lit_int(1, Span::new(4, 5))),
        span: Span::new(0, 5),
    });
    assert_eq!(
        f.infer(&sum).and_then(|t| t.as_primitive()),
        Some(Primitive::U8)
    );
}

#[test]
fn negation_keeps_operand_not_turns_bool() {
    let mut f = Fixture::new();
    f.define("x", primitive(Primitive::I16));
    let neg = Expr::Unary(UnaryExpr {
        op: UnaryOp::Neg,
        operand: Box::new(ident("x", Span::new(1, 2))),
        span: Span::new(0, 2),
    });
    assert_eq!(
        f.infer(&neg).and_then(|t| t.as_primitive()),
        Some(Primitive::I16)
    );
    let not = Expr::Unary(UnaryExpr {
        op: UnaryOp::Not,
        operand: Box::new(ident("x", Span::new(5, 6))),
        span: Span::new(4, 6),
    });
    assert_eq!(
        f.infer(&not).and_then(|t| t.as_primitive()),
        Some(Primitive::Bool)
    );
}

#[test]
fn casts_and_sizeof_have_fixed_types() {
    let mut f = Fixture::new();
    let cast = Expr::Cast(CastExpr {
        ty: primitive(Primitive::F32),
        value: Box::new(lit_int(1, Span::new(0, 1))),
        span: Span::new(0, 9),
    });
    assert_eq!(
        f.infer(&cast).and_then(|t| t.as_primitive()),
        Some(Primitive::F32)
    );
}

#[test]
fn field_access_resolves_through_named_struct() {
    let mut f = Fixture::new();
    let point = TypeNode::Struct(StructType {
        fields: vec![StructField {
            name: Name {
                text: "x".to_string(),
                span: Span::default(),
            },
            ty: primitive(Primitive::F64),
            default: None,
            is_static: false,
            visibility: Visibility::Private,
            span: Span::default(),
        }],
        methods: Vec::new(),
        span: Span::default(),
    });
    f.scopes
        .define_in(
            f.module,
            "Point",
            SymbolKind::Definition,
            SymbolOptions {
                ty: Some(point),
                ..SymbolOptions::default()
            },
        )
        .unwrap();
    f.define(
        "p",
        TypeNode::Ident(nox_syntax::ast::IdentType {
            name: Name {
                text: "Point".to_string(),
                span: Span::default(),
            },
        }),
    );
    let access = Expr::Field(FieldExpr {
        base: Box::new(ident("p", Span::new(0, 1))),
        field: Name {
            text: "x".to_string(),
            span: Span::new(2, 3),
        },
        span: Span::new(0, 3),
    });
    assert_eq!(
        f.infer(&access).and_then(|t| t.as_primitive()),
        Some(Primitive::F64)
    );
}

#[test]
fn builtin_calls_infer_return_type() {
    let mut f = Fixture::new();
    let call = Expr::Call(CallExpr {
        callee: Box::new(Expr::Builtin(nox_syntax::ast::BuiltinExpr {
            name: Name {
                text: "len".to_string(),
                span: Span::new(0, 4),
            },
        })),
        args: vec![ident("xs", Span::new(5, 7))],
        span: Span::new(0, 8),
    });
    assert_eq!(
        f.infer(&call).and_then(|t| t.as_primitive()),
        Some(Primitive::U64)
    );
}

#[test]
fn memo_returns_identical_results() {
    let mut f = Fixture::new();
    f.define("x", primitive(Primitive::I32));
    let e = ident("x", Span::new(0, 1));
    let first = f.infer(&e);
    let second = f.infer(&e);
    assert_eq!(first, second);
    assert!(first.is_some());
}
