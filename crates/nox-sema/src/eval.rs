//! Compile-time constant evaluation.
//!
//! Folds literals, immutable constant bindings, and operator/cast/sizeof
//! expressions into values during type validation. Arithmetic is checked
//! against the bit-width bounds of the requested target type instead of
//! wrapping, and every defined failure (overflow, division by zero, shift
//! out of range) surfaces as a diagnostic rather than a host panic.

use nox_syntax::ast::{BinaryOp, Literal, Mutability, Primitive, UnaryOp};
use nox_syntax::{Expr, Span, Stmt, TypeNode};
use rustc_hash::FxHashMap;

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::scope::{ScopeId, ScopeManager, SymbolId};

/// Largest exponent `**` folds; beyond this evaluation refuses rather
/// than burn unbounded time.
const MAX_POW_EXPONENT: i128 = 10_000;

/// Deepest comptime-call inlining chain before evaluation gives up.
const MAX_CALL_DEPTH: u32 = 64;

/// A folded compile-time value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i128),
    Float(f64),
    Bool(bool),
    Null,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Null => "null",
        }
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// The expression is not a compile-time constant. Hard failures
/// (overflow, division by zero) have already been reported when this is
/// returned; "just not constant" cases are silent and left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotConst;

pub type EvalResult = Result<Value, NotConst>;

/// Hashable identity of a value, for the comptime-call cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ValueKey {
    Int(i128),
    Float(u64),
    Bool(bool),
    Null,
}

impl From<&Value> for ValueKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Int(v) => Self::Int(*v),
            Value::Float(v) => Self::Float(v.to_bits()),
            Value::Bool(v) => Self::Bool(*v),
            Value::Null => Self::Null,
        }
    }
}

/// Borrowed analysis state one evaluation runs against.
pub struct EvalContext<'a> {
    pub scopes: &'a ScopeManager,
    pub diagnostics: &'a mut Diagnostics,
    pub scope: ScopeId,
}

/// Long-lived evaluator state: known constant bindings and the
/// comptime-call result cache. One instance lives for a whole analysis
/// run; per-evaluation state is passed in as [`EvalContext`].
#[derive(Debug, Default)]
pub struct ExpressionEvaluator {
    consts: FxHashMap<SymbolId, Value>,
    call_cache: FxHashMap<(SymbolId, Vec<ValueKey>), Value>,
    frames: Vec<FxHashMap<String, Value>>,
    call_depth: u32,
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the folded value of an immutable binding so later
    /// identifier references fold to it.
    pub fn record_const(&mut self, symbol: SymbolId, value: Value) {
        self.consts.insert(symbol, value);
    }

    pub fn const_value(&self, symbol: SymbolId) -> Option<&Value> {
        self.consts.get(&symbol)
    }

    /// Fold `expr` to a value, bounds-checking integer arithmetic against
    /// `target` (default: signed 64-bit).
    pub fn eval(&mut self, expr: &Expr, target: Option<&TypeNode>, cx: &mut EvalContext<'_>) -> EvalResult {
        match expr.unparenthesized() {
            Expr::Literal(lit) => match &lit.value {
                Literal::Int(v) => self.check_int(*v, target, lit.span, cx),
                Literal::Float(v) => Ok(Value::Float(*v)),
                Literal::Bool(v) => Ok(Value::Bool(*v)),
                Literal::Char(c) => self.check_int(*c as i128, target, lit.span, cx),
                Literal::Null | Literal::Undefined => Ok(Value::Null),
                Literal::Str(_) => Err(NotConst),
            },
            Expr::Ident(ident) => self.eval_ident(&ident.name.text, cx),
            Expr::Unary(unary) => {
                let operand = self.eval(&unary.operand, target, cx)?;
                self.apply_unary(unary.op, operand, target, unary.span, cx)
            }
            Expr::Binary(binary) => self.eval_binary(binary, target, cx),
            Expr::Cast(cast) => {
                let value = self.eval(&cast.value, None, cx)?;
                self.apply_cast(value, &cast.ty, cast.span, cx)
            }
            Expr::SizeOf(sizeof) => size_of_type(&sizeof.ty).map(Value::Int).ok_or(NotConst),
            Expr::Call(call) => self.eval_call(call, target, cx),
            _ => Err(NotConst),
        }
    }

    fn eval_ident(&mut self, name: &str, cx: &mut EvalContext<'_>) -> EvalResult {
        // Inlined call parameters shadow everything else.
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.get(name) {
                return Ok(value.clone());
            }
        }
        let id = cx
            .scopes
            .lookup_in_scope_chain(cx.scope, name)
            .ok_or(NotConst)?;
        let symbol = cx.scopes.symbol(id).ok_or(NotConst)?;
        if symbol.mutability != Mutability::Immutable {
            return Err(NotConst);
        }
        self.consts.get(&id).cloned().ok_or(NotConst)
    }

    fn eval_binary(
        &mut self,
        binary: &nox_syntax::ast::BinaryExpr,
        target: Option<&TypeNode>,
        cx: &mut EvalContext<'_>,
    ) -> EvalResult {
        // Logical operators short-circuit so the dead side cannot raise
        // spurious arithmetic diagnostics.
        if matches!(binary.op, BinaryOp::And | BinaryOp::Or) {
            let lhs = self.eval(&binary.lhs, None, cx)?;
            let Value::Bool(lhs) = lhs else {
                return Err(NotConst);
            };
            if (binary.op == BinaryOp::And && !lhs) || (binary.op == BinaryOp::Or && lhs) {
                return Ok(Value::Bool(lhs));
            }
            return match self.eval(&binary.rhs, None, cx)? {
                Value::Bool(rhs) => Ok(Value::Bool(rhs)),
                _ => Err(NotConst),
            };
        }

        let operand_target = if binary.op.is_comparison() { None } else { target };
        let lhs = self.eval(&binary.lhs, operand_target, cx)?;
        let rhs = self.eval(&binary.rhs, operand_target, cx)?;
        self.apply_binary(binary.op, lhs, rhs, target, binary.span, cx)
    }

    fn apply_binary(
        &mut self,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
        target: Option<&TypeNode>,
        span: Span,
        cx: &mut EvalContext<'_>,
    ) -> EvalResult {
        use Value as V;

        if op.is_comparison() {
            return compare(op, &lhs, &rhs).ok_or(NotConst);
        }

        match (lhs, rhs) {
            (V::Int(a), V::Int(b)) => self.int_op(op, a, b, target, span, cx),
            (V::Float(a), V::Float(b)) => float_op(op, a, b),
            // Mixed numeric operands fold in float.
            (V::Int(a), V::Float(b)) => float_op(op, a as f64, b),
            (V::Float(a), V::Int(b)) => float_op(op, a, b as f64),
            _ => Err(NotConst),
        }
    }

    fn int_op(
        &mut self,
        op: BinaryOp,
        a: i128,
        b: i128,
        target: Option<&TypeNode>,
        span: Span,
        cx: &mut EvalContext<'_>,
    ) -> EvalResult {
        use BinaryOp as Op;
        let result = match op {
            Op::Add => a.checked_add(b),
            Op::Sub => a.checked_sub(b),
            Op::Mul => a.checked_mul(b),
            Op::Div => {
                if b == 0 {
                    cx.diagnostics
                        .report(DiagnosticCode::DivisionByZero)
                        .target(span)
                        .emit();
                    return Err(NotConst);
                }
                a.checked_div(b)
            }
            Op::Mod => {
                if b == 0 {
                    cx.diagnostics
                        .report(DiagnosticCode::ModuloByZero)
                        .target(span)
                        .emit();
                    return Err(NotConst);
                }
                a.checked_rem(b)
            }
            Op::Pow => {
                if !(0..=MAX_POW_EXPONENT).contains(&b) {
                    cx.diagnostics
                        .report(DiagnosticCode::ExponentTooLarge)
                        .message(format!("exponent {b} is outside 0..={MAX_POW_EXPONENT}"))
                        .target(span)
                        .emit();
                    return Err(NotConst);
                }
                a.checked_pow(b as u32)
            }
            Op::Shl | Op::Shr => {
                if !(0..=63).contains(&b) {
                    cx.diagnostics
                        .report(DiagnosticCode::ShiftOutOfRange)
                        .message(format!("shift amount {b} is outside 0..=63"))
                        .target(span)
                        .emit();
                    return Err(NotConst);
                }
                if op == BinaryOp::Shl {
                    a.checked_shl(b as u32)
                } else {
                    a.checked_shr(b as u32)
                }
            }
            Op::BitAnd => Some(a & b),
            Op::BitOr => Some(a | b),
            Op::BitXor => Some(a ^ b),
            _ => return Err(NotConst),
        };
        match result {
            Some(value) => self.check_int(value, target, span, cx),
            None => {
                self.report_overflow(target, span, cx);
                Err(NotConst)
            }
        }
    }

    fn apply_unary(
        &mut self,
        op: UnaryOp,
        operand: Value,
        target: Option<&TypeNode>,
        span: Span,
        cx: &mut EvalContext<'_>,
    ) -> EvalResult {
        match (op, operand) {
            (UnaryOp::Neg, Value::Int(v)) => match v.checked_neg() {
                Some(v) => self.check_int(v, target, span, cx),
                None => {
                    self.report_overflow(target, span, cx);
                    Err(NotConst)
                }
            },
            (UnaryOp::Neg, Value::Float(v)) => Ok(Value::Float(-v)),
            (UnaryOp::Not, Value::Bool(v)) => Ok(Value::Bool(!v)),
            (UnaryOp::BitNot, Value::Int(v)) => self.check_int(!v, target, span, cx),
            _ => Err(NotConst),
        }
    }

    fn apply_cast(
        &mut self,
        value: Value,
        ty: &TypeNode,
        span: Span,
        cx: &mut EvalContext<'_>,
    ) -> EvalResult {
        let Some(prim) = ty.as_primitive() else {
            return Err(NotConst);
        };
        match value {
            Value::Int(v) if prim.is_integer() => self.check_int(v, Some(ty), span, cx),
            Value::Int(v) if prim.is_float() => Ok(Value::Float(v as f64)),
            Value::Float(v) if prim.is_float() => Ok(Value::Float(v)),
            Value::Float(v) if prim.is_integer() => self.check_int(v.trunc() as i128, Some(ty), span, cx),
            Value::Bool(v) if prim == Primitive::Bool => Ok(Value::Bool(v)),
            _ => Err(NotConst),
        }
    }

    /// Inline a call to a constant-evaluable function. Only bodies made
    /// of `let` bindings followed by one terminal `return` fold.
    fn eval_call(
        &mut self,
        call: &nox_syntax::ast::CallExpr,
        target: Option<&TypeNode>,
        cx: &mut EvalContext<'_>,
    ) -> EvalResult {
        let name = call.callee.as_ident().ok_or(NotConst)?;
        let id = cx
            .scopes
            .lookup_in_scope_chain(cx.scope, &name.text)
            .ok_or(NotConst)?;
        let symbol = cx.scopes.symbol(id).ok_or(NotConst)?;
        let meta = symbol.callable().ok_or(NotConst)?;
        if !meta.is_comptime {
            cx.diagnostics
                .report(DiagnosticCode::ComptimeCallNotConst)
                .message(format!("`{}` is not marked constant-evaluable", name.text))
                .target(call.span)
                .emit();
            return Err(NotConst);
        }
        let body = meta.body.clone().ok_or(NotConst)?;
        let params: Vec<String> = meta.params.iter().map(|p| p.name.clone()).collect();

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval(arg, None, cx)?);
        }
        if args.len() != params.len() {
            return Err(NotConst);
        }

        let cache_key = (id, args.iter().map(ValueKey::from).collect::<Vec<_>>());
        if let Some(cached) = self.call_cache.get(&cache_key) {
            return Ok(cached.clone());
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            cx.diagnostics
                .report(DiagnosticCode::NotComptimeEvaluable)
                .message("call nesting too deep for constant evaluation")
                .target(call.span)
                .emit();
            return Err(NotConst);
        }

        let frame: FxHashMap<String, Value> = params.into_iter().zip(args).collect();
        self.frames.push(frame);
        self.call_depth += 1;
        let result = self.eval_comptime_body(&body, target, call.span, cx);
        self.call_depth -= 1;
        self.frames.pop();

        if let Ok(value) = &result {
            self.call_cache.insert(cache_key, value.clone());
        }
        result
    }

    fn eval_comptime_body(
        &mut self,
        body: &[Stmt],
        target: Option<&TypeNode>,
        call_span: Span,
        cx: &mut EvalContext<'_>,
    ) -> EvalResult {
        for (position, stmt) in body.iter().enumerate() {
            match stmt {
                Stmt::Let(stmt) => {
                    let init = stmt.init.as_ref().ok_or(NotConst)?;
                    let value = self.eval(init, stmt.ty.as_ref(), cx)?;
                    if let Some(frame) = self.frames.last_mut() {
                        frame.insert(stmt.name.text.clone(), value);
                    }
                }
                Stmt::Return(stmt) if position == body.len() - 1 => {
                    let value = stmt.value.as_ref().ok_or(NotConst)?;
                    return self.eval(value, target, cx);
                }
                Stmt::Expr(stmt) if position == body.len() - 1 => {
                    return self.eval(&stmt.expr, target, cx);
                }
                _ => {
                    cx.diagnostics
                        .report(DiagnosticCode::ComptimeCallUnsupportedBody)
                        .message(format!(
                            "only `let` bindings and a final `return` fold; found `{}`",
                            stmt.kind_name()
                        ))
                        .target(call_span)
                        .emit();
                    return Err(NotConst);
                }
            }
        }
        Err(NotConst)
    }

    fn check_int(
        &mut self,
        value: i128,
        target: Option<&TypeNode>,
        span: Span,
        cx: &mut EvalContext<'_>,
    ) -> EvalResult {
        let (lo, hi) = int_bounds(target);
        if value < lo || value > hi {
            self.report_overflow(target, span, cx);
            return Err(NotConst);
        }
        Ok(Value::Int(value))
    }

    fn report_overflow(&mut self, target: Option<&TypeNode>, span: Span, cx: &mut EvalContext<'_>) {
        let ty = target
            .and_then(TypeNode::as_primitive)
            .unwrap_or(Primitive::I64);
        cx.diagnostics
            .report(DiagnosticCode::ArithmeticOverflow)
            .message(format!("result does not fit in `{}`", ty.name()))
            .target(span)
            .emit();
    }
}

/// Inclusive integer bounds for the target type; signed 64-bit when the
/// target carries no sized integer primitive.
fn int_bounds(target: Option<&TypeNode>) -> (i128, i128) {
    let prim = target.and_then(TypeNode::as_primitive);
    match prim {
        Some(p) if p.is_integer() => match p.bit_width() {
            Some(width) if p.is_signed() => (-(1i128 << (width - 1)), (1i128 << (width - 1)) - 1),
            Some(width) => (0, (1i128 << width) - 1),
            None => (i64::MIN as i128, i64::MAX as i128),
        },
        _ => (i64::MIN as i128, i64::MAX as i128),
    }
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> EvalResult {
    use BinaryOp as Op;
    let result = match op {
        Op::Add => a + b,
        Op::Sub => a - b,
        Op::Mul => a * b,
        Op::Div => a / b,
        Op::Mod => a % b,
        Op::Pow => a.powf(b),
        _ => return Err(NotConst),
    };
    Ok(Value::Float(result))
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> Option<Value> {
    use std::cmp::Ordering;
    use BinaryOp as Op;
    use Value as V;

    if matches!(op, Op::Eq | Op::Ne) {
        let equal = match (lhs, rhs) {
            (V::Int(a), V::Float(b)) | (V::Float(b), V::Int(a)) => (*a as f64) == *b,
            (a, b) => a == b,
        };
        return Some(Value::Bool(if op == Op::Eq { equal } else { !equal }));
    }

    let ordering = match (lhs, rhs) {
        (V::Int(a), V::Int(b)) => a.partial_cmp(b)?,
        (V::Float(a), V::Float(b)) => a.partial_cmp(b)?,
        (V::Int(a), V::Float(b)) => (*a as f64).partial_cmp(b)?,
        (V::Float(a), V::Int(b)) => a.partial_cmp(&(*b as f64))?,
        _ => return None,
    };
    let result = match op {
        Op::Lt => ordering == Ordering::Less,
        Op::Le => ordering != Ordering::Greater,
        Op::Gt => ordering == Ordering::Greater,
        Op::Ge => ordering != Ordering::Less,
        _ => return None,
    };
    Some(Value::Bool(result))
}

/// Byte size of a type when it is statically known.
fn size_of_type(ty: &TypeNode) -> Option<i128> {
    match ty.unparenthesized() {
        TypeNode::Primitive(t) => match t.prim {
            Primitive::Bool => Some(1),
            p => p.bit_width().map(|bits| i128::from(bits / 8)),
        },
        TypeNode::Pointer(_) => Some(8),
        _ => None,
    }
}
