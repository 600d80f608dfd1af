//! Symbol entries.
//!
//! A symbol is created once during collection and mutated in place by
//! later phases (flags, resolved type, metadata). It is never replaced
//! or deleted within a run.

use nox_syntax::ast::{Mutability, Visibility};
use nox_syntax::{Span, Stmt, TypeNode};
use serde::{Deserialize, Serialize};

use super::ScopeId;

/// A lightweight handle to a symbol. Ids are strictly increasing within
/// one run and restart at 1 after a reset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SymbolId(u32);

impl SymbolId {
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Syntactic category of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    /// An import binding.
    Use,
    /// A named definition (`def`).
    Definition,
    Variable,
    Function,
    Parameter,
    StructField,
    EnumVariant,
    Type,
    Error,
}

impl SymbolKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Use => "import",
            Self::Definition => "definition",
            Self::Variable => "variable",
            Self::Function => "function",
            Self::Parameter => "parameter",
            Self::StructField => "field",
            Self::EnumVariant => "variant",
            Self::Type => "type",
            Self::Error => "error",
        }
    }
}

/// How a symbol came to exist. Synthetic bindings (`self`, `selferr`,
/// builtins) are matched structurally on this, never by comparing names
/// to magic strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BindingKind {
    #[default]
    Ordinary,
    /// Synthetic receiver parameter of an instance method.
    SelfParam,
    /// Synthetic binding for a function's inline error set.
    SelfError,
    /// Injected builtin, referenced with the `@` sigil.
    Builtin,
}

/// Lifecycle flags, set as phases learn more about the symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolFlags {
    pub declared: bool,
    pub initialized: bool,
    pub used: bool,
    pub type_checked: bool,
    pub exported: bool,
}

/// Signature recorded for callable symbols.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallableMeta {
    pub params: Vec<ParamMeta>,
    pub ret: Option<TypeNode>,
    pub error_ty: Option<TypeNode>,
    pub is_static: bool,
    pub is_comptime: bool,
    /// Body kept only for constant-evaluable functions.
    pub body: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamMeta {
    pub name: String,
    pub ty: Option<TypeNode>,
    pub has_default: bool,
}

/// Source recorded for import symbols.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportMeta {
    pub source_module: String,
    pub alias: Option<String>,
    pub member_path: Vec<String>,
    pub wildcard: bool,
}

/// Kind-specific payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SymbolMeta {
    #[default]
    None,
    Callable(CallableMeta),
    Import(ImportMeta),
    Field {
        is_static: bool,
        has_default: bool,
    },
    Variant {
        value: Option<i128>,
    },
}

/// A named entity in some scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    /// Resolved type, attached during resolution/validation.
    pub ty: Option<TypeNode>,
    pub scope: ScopeId,
    /// Span of the whole declaring construct.
    pub context_span: Option<Span>,
    /// Span of just the defining identifier.
    pub target_span: Option<Span>,
    pub flags: SymbolFlags,
    pub visibility: Visibility,
    pub mutability: Mutability,
    pub binding: BindingKind,
    pub meta: SymbolMeta,
}

impl Symbol {
    pub fn is_import(&self) -> bool {
        self.kind == SymbolKind::Use
    }

    pub fn is_builtin(&self) -> bool {
        self.binding == BindingKind::Builtin
    }

    pub fn callable(&self) -> Option<&CallableMeta> {
        match &self.meta {
            SymbolMeta::Callable(meta) => Some(meta),
            _ => None,
        }
    }

    pub fn import(&self) -> Option<&ImportMeta> {
        match &self.meta {
            SymbolMeta::Import(meta) => Some(meta),
            _ => None,
        }
    }
}

/// Everything optional about a symbol at definition time.
#[derive(Debug, Clone, Default)]
pub struct SymbolOptions {
    pub ty: Option<TypeNode>,
    pub context_span: Option<Span>,
    pub target_span: Option<Span>,
    pub visibility: Visibility,
    pub mutability: Mutability,
    pub binding: BindingKind,
    pub meta: SymbolMeta,
    pub declared: bool,
    pub initialized: bool,
}
