//! Expression type inference.
//!
//! A memoized, cycle-guarded dispatch over expression shapes. The memo is
//! keyed by `(module, span, expression kind)` and capacity-bounded: when
//! full, the oldest half is evicted. Re-entering a key already in flight
//! returns unknown instead of recursing forever.

use indexmap::IndexMap;
use nox_syntax::ast::{
    FuncDecl, FunctionType, Literal, OptionalType, PointerType, Primitive, UnaryOp,
};
use nox_syntax::{Expr, ExprKind, Span, TypeNode};
use rustc_hash::FxHashSet;

use super::compat::TypeEnv;
use super::primitive;
use crate::scope::{ScopeId, ScopeManager};

const MEMO_CAPACITY: usize = 1024;

type InferKey = (String, Span, ExprKind);

/// Borrowed analysis state one inference query runs against.
pub struct InferContext<'a> {
    pub scopes: &'a ScopeManager,
    pub module: &'a str,
    pub scope: ScopeId,
}

/// Long-lived inference state for one analysis run. `None` results mean
/// "unknown"; callers decide whether that is worth a diagnostic.
#[derive(Debug, Default)]
pub struct TypeInference {
    memo: IndexMap<InferKey, Option<TypeNode>>,
    in_flight: FxHashSet<InferKey>,
}

impl TypeInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn infer(&mut self, expr: &Expr, cx: &InferContext<'_>) -> Option<TypeNode> {
        let key = (cx.module.to_string(), expr.span(), expr.kind());
        if let Some(cached) = self.memo.get(&key) {
            return cached.clone();
        }
        if !self.in_flight.insert(key.clone()) {
            return None;
        }
        let result = self.infer_uncached(expr, cx);
        self.in_flight.remove(&key);

        if self.memo.len() >= MEMO_CAPACITY {
            // Oldest half goes; insertion order is the age order.
            let keep = self.memo.split_off(MEMO_CAPACITY / 2);
            self.memo = keep;
        }
        self.memo.insert(key, result.clone());
        result
    }

    fn infer_uncached(&mut self, expr: &Expr, cx: &InferContext<'_>) -> Option<TypeNode> {
        match expr.unparenthesized() {
            Expr::Literal(lit) => Some(literal_type(&lit.value)),
            Expr::Ident(ident) => {
                let id = cx.scopes.lookup_in_scope_chain(cx.scope, &ident.name.text)?;
                cx.scopes.symbol(id)?.ty.clone()
            }
            Expr::Builtin(builtin) => {
                let id = cx
                    .scopes
                    .lookup_in_scope_chain(cx.scope, &builtin.name.text)?;
                let symbol = cx.scopes.symbol(id)?;
                symbol.is_builtin().then(|| symbol.ty.clone())?
            }
            Expr::Unary(unary) => {
                let operand = self.infer(&unary.operand, cx)?;
                match unary.op {
                    UnaryOp::Not => Some(primitive(Primitive::Bool)),
                    UnaryOp::Neg | UnaryOp::BitNot => Some(operand),
                    UnaryOp::Deref => match TypeEnv::new(cx.scopes, cx.scope).underlying(&operand)
                    {
                        TypeNode::Pointer(ptr) => Some(*ptr.pointee),
                        _ => None,
                    },
                    UnaryOp::AddrOf => Some(TypeNode::Pointer(PointerType {
                        pointee: Box::new(operand),
                        mutable: false,
                        span: unary.span,
                    })),
                }
            }
            Expr::Binary(binary) => {
                if binary.op.is_comparison() || binary.op.is_logical() {
                    return Some(primitive(Primitive::Bool));
                }
                let lhs = self.infer(&binary.lhs, cx)?;
                let rhs = self.infer(&binary.rhs, cx)?;
                unify_numeric(&lhs, &rhs)
            }
            Expr::Assign(_) => Some(primitive(Primitive::Void)),
            Expr::Call(call) => {
                let callee = self.infer(&call.callee, cx)?;
                match TypeEnv::new(cx.scopes, cx.scope).underlying(&callee) {
                    TypeNode::Function(f) => Some(*f.ret),
                    _ => None,
                }
            }
            Expr::Field(field) => {
                let base = self.infer(&field.base, cx)?;
                member_type(cx, &base, &field.field.text)
            }
            Expr::Index(index) => {
                let base = self.infer(&index.base, cx)?;
                match TypeEnv::new(cx.scopes, cx.scope).underlying(&base) {
                    TypeNode::Array(a) => Some(*a.elem),
                    TypeNode::Pointer(p) => Some(*p.pointee),
                    _ => None,
                }
            }
            Expr::StructInit(init) => init.ty.as_ref().map(|name| {
                TypeNode::Ident(nox_syntax::ast::IdentType { name: name.clone() })
            }),
            Expr::Cast(cast) => Some(cast.ty.clone()),
            Expr::SizeOf(_) => Some(primitive(Primitive::U64)),
            Expr::Try(t) => self.infer(&t.inner, cx),
            Expr::Catch(c) => self.infer(&c.inner, cx),
            // Branching expressions carry no single static type here.
            Expr::If(_) | Expr::Switch(_) => None,
            Expr::Paren(_) => None,
        }
    }
}

fn literal_type(value: &Literal) -> TypeNode {
    match value {
        Literal::Int(_) => primitive(Primitive::ComptimeInt),
        Literal::Float(_) => primitive(Primitive::ComptimeFloat),
        Literal::Bool(_) => primitive(Primitive::Bool),
        Literal::Str(_) => primitive(Primitive::Str),
        Literal::Char(_) => primitive(Primitive::U8),
        Literal::Null | Literal::Undefined => TypeNode::Optional(OptionalType {
            inner: Box::new(primitive(Primitive::Any)),
            span: Span::default(),
        }),
    }
}

/// Result type of an arithmetic operation over two numeric operands:
/// comptime literals adopt the other side, floats win over integers,
/// wider widths win over narrower.
fn unify_numeric(lhs: &TypeNode, rhs: &TypeNode) -> Option<TypeNode> {
    let a = lhs.as_primitive()?;
    let b = rhs.as_primitive()?;
    if !a.is_numeric() || !b.is_numeric() {
        return None;
    }
    if a.is_comptime() && !b.is_comptime() {
        return Some(rhs.clone());
    }
    if b.is_comptime() && !a.is_comptime() {
        return Some(lhs.clone());
    }
    if a.is_float() != b.is_float() {
        return Some(if a.is_float() { lhs.clone() } else { rhs.clone() });
    }
    match (a.bit_width(), b.bit_width()) {
        (Some(wa), Some(wb)) if wb > wa => Some(rhs.clone()),
        _ => Some(lhs.clone()),
    }
}

/// Type of `base.member` for struct fields/methods and enum variants.
fn member_type(cx: &InferContext<'_>, base: &TypeNode, member: &str) -> Option<TypeNode> {
    let env = TypeEnv::new(cx.scopes, cx.scope);
    match env.underlying(base) {
        TypeNode::Struct(s) => {
            if let Some(field) = s.fields.iter().find(|f| f.name.text == member) {
                return Some(field.ty.clone());
            }
            s.methods
                .iter()
                .find(|m| m.name.text == member)
                .map(method_type)
        }
        // A variant reference has the enum's own type.
        TypeNode::Enum(e) => e
            .variants
            .iter()
            .any(|v| v.name.text == member)
            .then(|| base.unparenthesized().clone()),
        TypeNode::ErrSet(e) => e
            .variants
            .iter()
            .any(|v| v.text == member)
            .then(|| base.unparenthesized().clone()),
        _ => None,
    }
}

fn method_type(decl: &FuncDecl) -> TypeNode {
    TypeNode::Function(FunctionType {
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
