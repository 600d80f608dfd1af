//! Type nodes.
//!
//! The closed set of type shapes the parser can produce. Struct, enum,
//! and error-set bodies are inline type nodes; `def Point = struct {..}`
//! binds one to a name.

use serde::{Deserialize, Serialize};

use super::expr::Expr;
use super::stmt::FuncDecl;
use super::{Name, Visibility};
use crate::span::Span;

/// Built-in primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Str,
    Void,
    Any,
    /// Untyped integer literal; adopts any numeric target.
    ComptimeInt,
    /// Untyped float literal; adopts any float target.
    ComptimeFloat,
}

impl Primitive {
    /// Bit width for sized numeric primitives, `None` otherwise.
    pub fn bit_width(self) -> Option<u32> {
        match self {
            Self::I8 | Self::U8 => Some(8),
            Self::I16 | Self::U16 => Some(16),
            Self::I32 | Self::U32 | Self::F32 => Some(32),
            Self::I64 | Self::U64 | Self::F64 => Some(64),
            _ => None,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::ComptimeInt
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
                | Self::ComptimeInt
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64 | Self::ComptimeFloat)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_comptime(self) -> bool {
        matches!(self, Self::ComptimeInt | Self::ComptimeFloat)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Bool => "bool",
            Self::Str => "str",
            Self::Void => "void",
            Self::Any => "any",
            Self::ComptimeInt => "comptime_int",
            Self::ComptimeFloat => "comptime_float",
        }
    }
}

impl std::fmt::Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A type as written in source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeNode {
    Primitive(PrimitiveType),
    Ident(IdentType),
    Optional(OptionalType),
    Pointer(PointerType),
    Array(ArrayType),
    Tuple(TupleType),
    Struct(StructType),
    Enum(EnumType),
    ErrSet(ErrSetType),
    Function(FunctionType),
    Union(UnionType),
    Paren(ParenType),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveType {
    pub prim: Primitive,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentType {
    pub name: Name,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionalType {
    pub inner: Box<TypeNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerType {
    pub pointee: Box<TypeNode>,
    pub mutable: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayType {
    pub elem: Box<TypeNode>,
    /// Evaluated at compile time; `None` for slices.
    pub size: Option<Box<Expr>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleType {
    pub elems: Vec<TypeNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructType {
    pub fields: Vec<StructField>,
    pub methods: Vec<FuncDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructField {
    pub name: Name,
    pub ty: TypeNode,
    pub default: Option<Expr>,
    pub is_static: bool,
    pub visibility: Visibility,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    pub variants: Vec<EnumVariant>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumVariant {
    pub name: Name,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrSetType {
    pub variants: Vec<Name>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionType {
    pub params: Vec<TypeNode>,
    pub ret: Box<TypeNode>,
    pub error: Option<Box<TypeNode>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionType {
    pub members: Vec<TypeNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParenType {
    pub inner: Box<TypeNode>,
    pub span: Span,
}

impl TypeNode {
    pub fn span(&self) -> Span {
        match self {
            Self::Primitive(t) => t.span,
            Self::Ident(t) => t.name.span,
            Self::Optional(t) => t.span,
            Self::Pointer(t) => t.span,
            Self::Array(t) => t.span,
            Self::Tuple(t) => t.span,
            Self::Struct(t) => t.span,
            Self::Enum(t) => t.span,
            Self::ErrSet(t) => t.span,
            Self::Function(t) => t.span,
            Self::Union(t) => t.span,
            Self::Paren(t) => t.span,
        }
    }

    /// Strip any number of surrounding parens.
    pub fn unparenthesized(&self) -> &TypeNode {
        let mut node = self;
        while let TypeNode::Paren(p) = node {
            node = &p.inner;
        }
        node
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::Ident(_) => "identifier",
            Self::Optional(_) => "optional",
            Self::Pointer(_) => "pointer",
            Self::Array(_) => "array",
            Self::Tuple(_) => "tuple",
            Self::Struct(_) => "struct",
            Self::Enum(_) => "enum",
            Self::ErrSet(_) => "error set",
            Self::Function(_) => "function",
            Self::Union(_) => "union",
            Self::Paren(_) => "parenthesized",
        }
    }

    /// Whether this resolves to an error-shaped type without further lookup.
    pub fn is_error_shaped(&self) -> bool {
        matches!(self.unparenthesized(), TypeNode::ErrSet(_))
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self.unparenthesized() {
            TypeNode::Primitive(t) => Some(t.prim),
            _ => None,
        }
    }
}
