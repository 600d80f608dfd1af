//! Type compatibility and inference rules.

mod compat;
mod infer;

#[cfg(test)]
mod infer_tests;

pub use compat::{display_type, is_compatible, same_shape, TypeEnv};
pub use infer::{InferContext, TypeInference};

use nox_syntax::ast::{Primitive, PrimitiveType};
use nox_syntax::{Span, TypeNode};

/// Span-less primitive type node, for synthesized types.
pub fn primitive(prim: Primitive) -> TypeNode {
    TypeNode::Primitive(PrimitiveType {
        prim,
        span: Span::default(),
    })
}
