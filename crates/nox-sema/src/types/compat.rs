//! Type compatibility.
//!
//! `is_compatible(target, source)` asks whether a value of `source` type
//! can be used where `target` is expected. Both sides are normalized
//! first: parentheses stripped, named identifier types resolved to their
//! underlying definition through the symbol table.

use nox_syntax::ast::{ArrayType, Literal, Primitive};
use nox_syntax::{Expr, TypeNode};

use crate::scope::{ScopeId, ScopeManager, SymbolId};

/// Recursion ceiling for structural comparison; deeper nesting is
/// treated as incompatible rather than risking a runaway walk.
const MAX_COMPAT_DEPTH: u32 = 100;

/// Lookup surface compatibility checks resolve named types against.
pub struct TypeEnv<'a> {
    scopes: &'a ScopeManager,
    scope: ScopeId,
}

impl<'a> TypeEnv<'a> {
    pub fn new(scopes: &'a ScopeManager, scope: ScopeId) -> Self {
        Self { scopes, scope }
    }

    /// Symbol a named identifier type resolves to, if any.
    pub fn named_symbol(&self, ty: &TypeNode) -> Option<SymbolId> {
        match ty.unparenthesized() {
            TypeNode::Ident(ident) => self
                .scopes
                .lookup_in_scope_chain(self.scope, &ident.name.text),
            _ => None,
        }
    }

    /// Strip parens and chase identifier types to the underlying shape.
    /// Cyclic aliases bottom out on the last named link.
    pub fn underlying(&self, ty: &TypeNode) -> TypeNode {
        let mut current = ty.unparenthesized().clone();
        let mut seen: Vec<SymbolId> = Vec::new();
        while let TypeNode::Ident(ident) = &current {
            let Some(id) = self
                .scopes
                .lookup_in_scope_chain(self.scope, &ident.name.text)
            else {
                break;
            };
            if seen.contains(&id) {
                break;
            }
            seen.push(id);
            let Some(next) = self.scopes.symbol(id).and_then(|s| s.ty.clone()) else {
                break;
            };
            current = next.unparenthesized().clone();
        }
        current
    }
}

/// Whether a `source`-typed value is usable where `target` is expected.
pub fn is_compatible(env: &TypeEnv<'_>, target: &TypeNode, source: &TypeNode) -> bool {
    compatible(env, target, source, 0)
}

fn compatible(env: &TypeEnv<'_>, target: &TypeNode, source: &TypeNode, depth: u32) -> bool {
    if depth > MAX_COMPAT_DEPTH {
        return false;
    }

    // Two names resolving to the same definition are the same type,
    // whatever their spelling.
    if let (Some(a), Some(b)) = (env.named_symbol(target), env.named_symbol(source))
        && a == b
    {
        return true;
    }

    let target = env.underlying(target);
    let source = env.underlying(source);

    // `any` is dynamic on both sides; null/undefined infer as `?any`.
    if target.as_primitive() == Some(Primitive::Any) || source.as_primitive() == Some(Primitive::Any)
    {
        return true;
    }
    if let TypeNode::ErrSet(_) = target
        && source.is_error_shaped()
    {
        return true;
    }
    if same_shape(&target, &source) {
        return true;
    }

    if let (Some(t), Some(s)) = (target.as_primitive(), source.as_primitive()) {
        return numeric_compatible(t, s);
    }

    match (&target, &source) {
        (TypeNode::Union(t), TypeNode::Union(s)) => s
            .members
            .iter()
            .all(|sm| t.members.iter().any(|tm| compatible(env, tm, sm, depth + 1))),
        (TypeNode::Union(t), _) => t
            .members
            .iter()
            .any(|tm| compatible(env, tm, &source, depth + 1)),
        (_, TypeNode::Union(s)) => s
            .members
            .iter()
            .all(|sm| compatible(env, &target, sm, depth + 1)),

        (TypeNode::Optional(t), TypeNode::Optional(s)) => {
            compatible(env, &t.inner, &s.inner, depth + 1)
        }
        (TypeNode::Optional(t), _) => compatible(env, &t.inner, &source, depth + 1),

        (TypeNode::Array(t), TypeNode::Array(s)) => {
            if !compatible(env, &t.elem, &s.elem, depth + 1) {
                return false;
            }
            match (literal_size(t), literal_size(s)) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
        }

        (TypeNode::Pointer(t), TypeNode::Pointer(s)) => {
            if t.mutable && !s.mutable {
                return false;
            }
            if compatible(env, &t.pointee, &s.pointee, depth + 1) {
                return true;
            }
            // An optional pointee unwraps one level.
            if let TypeNode::Optional(inner) = t.pointee.unparenthesized() {
                return compatible(env, &inner.inner, &s.pointee, depth + 1);
            }
            false
        }

        (TypeNode::Struct(t), TypeNode::Struct(s)) => t.fields.iter().all(|tf| {
            s.fields
                .iter()
                .find(|sf| sf.name.text == tf.name.text)
                .is_some_and(|sf| compatible(env, &tf.ty, &sf.ty, depth + 1))
        }),

        // Enums (and anything else) require exact identity, already
        // handled by the shape check above.
        _ => false,
    }
}

/// Numeric widening: comptime literals adopt any numeric target; sized
/// sources must not exceed the target width; bool is never numeric.
fn numeric_compatible(target: Primitive, source: Primitive) -> bool {
    if target == Primitive::Any {
        return true;
    }
    if !target.is_numeric() || !source.is_numeric() {
        return false;
    }
    if source == Primitive::ComptimeInt {
        return true;
    }
    if source == Primitive::ComptimeFloat {
        return target.is_float();
    }
    if target.is_float() != source.is_float() {
        return false;
    }
    match (target.bit_width(), source.bit_width()) {
        (Some(t), Some(s)) => s <= t,
        _ => false,
    }
}

/// Structural equality ignoring spans.
pub fn same_shape(a: &TypeNode, b: &TypeNode) -> bool {
    use TypeNode as T;
    match (a.unparenthesized(), b.unparenthesized()) {
        (T::Primitive(a), T::Primitive(b)) => a.prim == b.prim,
        (T::Ident(a), T::Ident(b)) => a.name.text == b.name.text,
        (T::Optional(a), T::Optional(b)) => same_shape(&a.inner, &b.inner),
        (T::Pointer(a), T::Pointer(b)) => {
            a.mutable == b.mutable && same_shape(&a.pointee, &b.pointee)
        }
        (T::Array(a), T::Array(b)) => {
            same_shape(&a.elem, &b.elem) && literal_size(a) == literal_size(b)
        }
        (T::Tuple(a), T::Tuple(b)) => {
            a.elems.len() == b.elems.len()
                && a.elems.iter().zip(&b.elems).all(|(x, y)| same_shape(x, y))
        }
        (T::Struct(a), T::Struct(b)) => {
            a.fields.len() == b.fields.len()
                && a.fields.iter().zip(&b.fields).all(|(x, y)| {
                    x.name.text == y.name.text && same_shape(&x.ty, &y.ty)
                })
        }
        (T::Enum(a), T::Enum(b)) => {
            a.variants.len() == b.variants.len()
                && a.variants
                    .iter()
                    .zip(&b.variants)
                    .all(|(x, y)| x.name.text == y.name.text)
        }
        (T::ErrSet(a), T::ErrSet(b)) => {
            a.variants.len() == b.variants.len()
                && a.variants.iter().zip(&b.variants).all(|(x, y)| x.text == y.text)
        }
        (T::Function(a), T::Function(b)) => {
            a.params.len() == b.params.len()
                && a.params.iter().zip(&b.params).all(|(x, y)| same_shape(x, y))
                && same_shape(&a.ret, &b.ret)
        }
        (T::Union(a), T::Union(b)) => {
            a.members.len() == b.members.len()
                && a.members.iter().zip(&b.members).all(|(x, y)| same_shape(x, y))
        }
        _ => false,
    }
}

/// Literal array size, when the size expression is a plain integer.
fn literal_size(array: &ArrayType) -> Option<i128> {
    match array.size.as_deref()?.unparenthesized() {
        Expr::Literal(lit) => match lit.value {
            Literal::Int(v) => Some(v),
            _ => None,
        },
        _ => None,
    }
}

/// Human-readable rendering for diagnostics.
pub fn display_type(ty: &TypeNode) -> String {
    match ty {
        TypeNode::Primitive(t) => t.prim.name().to_string(),
        TypeNode::Ident(t) => t.name.text.clone(),
        TypeNode::Optional(t) => format!("?{}", display_type(&t.inner)),
        TypeNode::Pointer(t) => {
            if t.mutable {
                format!("*mut {}", display_type(&t.pointee))
            } else {
                format!("*{}", display_type(&t.pointee))
            }
        }
        TypeNode::Array(t) => match literal_size(t) {
            Some(n) => format!("[{n}]{}", display_type(&t.elem)),
            None => format!("[]{}", display_type(&t.elem)),
        },
        TypeNode::Tuple(t) => {
            let elems: Vec<String> = t.elems.iter().map(display_type).collect();
            format!("({})", elems.join(", "))
        }
        TypeNode::Struct(t) => format!("struct with {} field(s)", t.fields.len()),
        TypeNode::Enum(t) => format!("enum with {} variant(s)", t.variants.len()),
        TypeNode::ErrSet(t) => {
            let names: Vec<&str> = t.variants.iter().map(|n| n.text.as_str()).collect();
            format!("error{{{}}}", names.join(", "))
        }
        TypeNode::Function(t) => {
            let params: Vec<String> = t.params.iter().map(display_type).collect();
            format!("fn({}) -> {}", params.join(", "), display_type(&t.ret))
        }
        TypeNode::Union(t) => {
            let members: Vec<String> = t.members.iter().map(display_type).collect();
            members.join(" | ")
        }
        TypeNode::Paren(t) => display_type(&t.inner),
    }
}
