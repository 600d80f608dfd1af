//! Diagnostic codes.
//!
//! The closed set of issues analysis can report. Each code carries a
//! default severity, a wire name, a fixed merge priority, and message
//! templates. Family predicates drive the deduplication engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // Internal invariant violations
    InternalError,
    UnsupportedFeature,

    // Identifier resolution
    UndefinedIdentifier,
    UndefinedType,
    UndefinedFunction,
    UndefinedMember,
    UndefinedBuiltin,
    UseBeforeDeclaration,
    UseBeforeInitialization,
    VariableSelfInit,
    ParameterForwardReference,
    SelfOutsideMethod,
    SelfInStaticMethod,
    SelfErrOutsideFunction,
    NonStaticFieldInStaticMethod,
    ReservedPrefix,

    // Imports
    ImportModuleNotFound,
    ImportMemberNotFound,
    ImportNotExported,
    ImportWildcardNoAlias,
    ImportSelf,
    ImportDuplicate,
    ImportCircularDependency,

    // Duplicates and shadowing
    DuplicateSymbol,
    DuplicateParameter,
    DuplicateField,
    DuplicateEnumVariant,
    DuplicateErrorVariant,
    DuplicateFieldInit,
    ShadowedSymbol,
    SelfCollision,

    // Type validation
    TypeMismatch,
    ArgumentTypeMismatch,
    ReturnTypeMismatch,
    ConditionNotBool,
    InvalidOperandType,
    InvalidUnaryOperand,
    NotCallable,
    NotIndexable,
    ArgumentCountMismatch,
    UnknownField,
    MissingRequiredField,
    StaticFieldInit,
    ArraySizeMismatch,
    ArraySizeNotConstant,
    ArraySizeNegative,
    PointerMutabilityMismatch,
    DerefNonPointer,
    ImmutableAssignment,
    InvalidAssignTarget,
    InvalidCast,
    SwitchNotExhaustive,
    SwitchDuplicateArm,
    TypeAnnotationRequired,
    VoidValueUsed,
    TypeInferenceFailed,

    // Constant evaluation
    ArithmeticOverflow,
    DivisionByZero,
    ModuloByZero,
    ShiftOutOfRange,
    ExponentTooLarge,
    NotComptimeEvaluable,
    ComptimeCallNotConst,
    ComptimeCallUnsupportedBody,

    // Throw / error sets
    ThrowTypeMismatch,
    ThrowWithoutErrorType,
    ThrowOutsideFunction,
    UnknownErrorVariant,
    ErrorSetMismatch,
    TryWithoutErrorType,

    // Structure
    TypeCycleDetected,
    TypeNestingTooDeep,
    ReturnOutsideFunction,
    BreakOutsideLoop,
    ContinueOutsideLoop,

    // Whole-program checks
    EntryModuleNotFound,
    EntryModuleNoMain,
    EntryModulePrivateMain,
    EntryMainInvalidReturn,
    EmptyModule,
    UnusedVariable,
    UnusedFunction,
    UnusedParameter,
    UnusedDefinition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    #[default]
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl DiagnosticCode {
    /// Wire name, stable for external consumers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InternalError => "INTERNAL_ERROR",
            Self::UnsupportedFeature => "UNSUPPORTED_FEATURE",
            Self::UndefinedIdentifier => "UNDEFINED_IDENTIFIER",
            Self::UndefinedType => "UNDEFINED_TYPE",
            Self::UndefinedFunction => "UNDEFINED_FUNCTION",
            Self::UndefinedMember => "UNDEFINED_MEMBER",
            Self::UndefinedBuiltin => "UNDEFINED_BUILTIN",
            Self::UseBeforeDeclaration => "USE_BEFORE_DECLARATION",
            Self::UseBeforeInitialization => "USE_BEFORE_INITIALIZATION",
            Self::VariableSelfInit => "VARIABLE_SELF_INIT",
            Self::ParameterForwardReference => "PARAMETER_FORWARD_REFERENCE",
            Self::SelfOutsideMethod => "SELF_OUTSIDE_METHOD",
            Self::SelfInStaticMethod => "SELF_IN_STATIC_METHOD",
            Self::SelfErrOutsideFunction => "SELFERR_OUTSIDE_FUNCTION",
            Self::NonStaticFieldInStaticMethod => "NONSTATIC_FIELD_IN_STATIC_METHOD",
            Self::ReservedPrefix => "RESERVED_PREFIX",
            Self::ImportModuleNotFound => "IMPORT_MODULE_NOT_FOUND",
            Self::ImportMemberNotFound => "IMPORT_MEMBER_NOT_FOUND",
            Self::ImportNotExported => "IMPORT_NOT_EXPORTED",
            Self::ImportWildcardNoAlias => "IMPORT_WILDCARD_NO_ALIAS",
            Self::ImportSelf => "IMPORT_SELF",
            Self::ImportDuplicate => "IMPORT_DUPLICATE",
            Self::ImportCircularDependency => "IMPORT_CIRCULAR_DEPENDENCY",
            Self::DuplicateSymbol => "DUPLICATE_SYMBOL",
            Self::DuplicateParameter => "DUPLICATE_PARAMETER",
            Self::DuplicateField => "DUPLICATE_FIELD",
            Self::DuplicateEnumVariant => "DUPLICATE_ENUM_VARIANT",
            Self::DuplicateErrorVariant => "DUPLICATE_ERROR_VARIANT",
            Self::DuplicateFieldInit => "DUPLICATE_FIELD_INIT",
            Self::ShadowedSymbol => "SHADOWED_SYMBOL",
            Self::SelfCollision => "SELF_COLLISION",
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::ArgumentTypeMismatch => "ARGUMENT_TYPE_MISMATCH",
            Self::ReturnTypeMismatch => "RETURN_TYPE_MISMATCH",
            Self::ConditionNotBool => "CONDITION_NOT_BOOL",
            Self::InvalidOperandType => "INVALID_OPERAND_TYPE",
            Self::InvalidUnaryOperand => "INVALID_UNARY_OPERAND",
            Self::NotCallable => "NOT_CALLABLE",
            Self::NotIndexable => "NOT_INDEXABLE",
            Self::ArgumentCountMismatch => "ARGUMENT_COUNT_MISMATCH",
            Self::UnknownField => "UNKNOWN_FIELD",
            Self::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            Self::StaticFieldInit => "STATIC_FIELD_INIT",
            Self::ArraySizeMismatch => "ARRAY_SIZE_MISMATCH",
            Self::ArraySizeNotConstant => "ARRAY_SIZE_NOT_CONSTANT",
            Self::ArraySizeNegative => "ARRAY_SIZE_NEGATIVE",
            Self::PointerMutabilityMismatch => "POINTER_MUTABILITY_MISMATCH",
            Self::DerefNonPointer => "DEREF_NON_POINTER",
            Self::ImmutableAssignment => "IMMUTABLE_ASSIGNMENT",
            Self::InvalidAssignTarget => "INVALID_ASSIGN_TARGET",
            Self::InvalidCast => "INVALID_CAST",
            Self::SwitchNotExhaustive => "SWITCH_NOT_EXHAUSTIVE",
            Self::SwitchDuplicateArm => "SWITCH_DUPLICATE_ARM",
            Self::TypeAnnotationRequired => "TYPE_ANNOTATION_REQUIRED",
            Self::VoidValueUsed => "VOID_VALUE_USED",
            Self::TypeInferenceFailed => "TYPE_INFERENCE_FAILED",
            Self::ArithmeticOverflow => "ARITHMETIC_OVERFLOW",
            Self::DivisionByZero => "DIVISION_BY_ZERO",
            Self::ModuloByZero => "MODULO_BY_ZERO",
            Self::ShiftOutOfRange => "SHIFT_OUT_OF_RANGE",
            Self::ExponentTooLarge => "EXPONENT_TOO_LARGE",
            Self::NotComptimeEvaluable => "NOT_COMPTIME_EVALUABLE",
            Self::ComptimeCallNotConst => "COMPTIME_CALL_NOT_CONST",
            Self::ComptimeCallUnsupportedBody => "COMPTIME_CALL_UNSUPPORTED_BODY",
            Self::ThrowTypeMismatch => "THROW_TYPE_MISMATCH",
            Self::ThrowWithoutErrorType => "THROW_WITHOUT_ERROR_TYPE",
            Self::ThrowOutsideFunction => "THROW_OUTSIDE_FUNCTION",
            Self::UnknownErrorVariant => "UNKNOWN_ERROR_VARIANT",
            Self::ErrorSetMismatch => "ERROR_SET_MISMATCH",
            Self::TryWithoutErrorType => "TRY_WITHOUT_ERROR_TYPE",
            // Truncated spelling kept for consumers that match on the
            // literal; see DESIGN.md.
            Self::TypeCycleDetected => "TYPE_CYCLE_DETECTE",
            Self::TypeNestingTooDeep => "TYPE_NESTING_TOO_DEEP",
            Self::ReturnOutsideFunction => "RETURN_OUTSIDE_FUNCTION",
            Self::BreakOutsideLoop => "BREAK_OUTSIDE_LOOP",
            Self::ContinueOutsideLoop => "CONTINUE_OUTSIDE_LOOP",
            Self::EntryModuleNotFound => "ENTRY_MODULE_NOT_FOUND",
            Self::EntryModuleNoMain => "ENTRY_MODULE_NO_MAIN",
            Self::EntryModulePrivateMain => "ENTRY_MODULE_PRIVATE_MAIN",
            Self::EntryMainInvalidReturn => "ENTRY_MAIN_INVALID_RETURN",
            Self::EmptyModule => "EMPTY_MODULE",
            Self::UnusedVariable => "UNUSED_VARIABLE",
            Self::UnusedFunction => "UNUSED_FUNCTION",
            Self::UnusedParameter => "UNUSED_PARAMETER",
            Self::UnusedDefinition => "UNUSED_DEFINITION",
        }
    }

    /// Default severity. Warnings never block analysis success.
    pub fn default_severity(self) -> Severity {
        match self {
            Self::ShadowedSymbol
            | Self::ImportCircularDependency
            | Self::TypeCycleDetected
            | Self::EmptyModule
            | Self::UnusedVariable
            | Self::UnusedFunction
            | Self::UnusedParameter
            | Self::UnusedDefinition => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Merge priority for duplicate resolution: higher wins. Codes not in
    /// the table sit at 50.
    pub fn priority(self) -> u8 {
        match self {
            Self::InternalError => 100,
            Self::UndefinedIdentifier
            | Self::UndefinedType
            | Self::UndefinedFunction
            | Self::UndefinedMember
            | Self::UndefinedBuiltin => 90,
            Self::UseBeforeDeclaration
            | Self::UseBeforeInitialization
            | Self::VariableSelfInit
            | Self::ParameterForwardReference => 85,
            Self::DuplicateSymbol
            | Self::DuplicateParameter
            | Self::DuplicateField
            | Self::SelfCollision => 80,
            Self::ImportModuleNotFound
            | Self::ImportMemberNotFound
            | Self::ImportNotExported => 78,
            Self::ArithmeticOverflow
            | Self::DivisionByZero
            | Self::ModuloByZero
            | Self::ShiftOutOfRange
            | Self::ExponentTooLarge => 75,
            Self::ThrowTypeMismatch
            | Self::ThrowWithoutErrorType
            | Self::UnknownErrorVariant
            | Self::ErrorSetMismatch => 70,
            Self::MissingRequiredField | Self::UnknownField => 65,
            Self::ArgumentTypeMismatch | Self::ReturnTypeMismatch => 62,
            Self::TypeMismatch => 60,
            Self::InvalidOperandType | Self::InvalidUnaryOperand => 55,
            Self::TypeInferenceFailed => 20,
            Self::ShadowedSymbol => 15,
            Self::UnusedVariable
            | Self::UnusedFunction
            | Self::UnusedParameter
            | Self::UnusedDefinition => 10,
            _ => 50,
        }
    }

    /// Codes that are never merged with anything, however their spans lie.
    pub fn is_always_distinct(self) -> bool {
        matches!(
            self,
            Self::InternalError
                | Self::ImportCircularDependency
                | Self::EmptyModule
                | Self::EntryModuleNotFound
                | Self::EntryModuleNoMain
                | Self::EntryModulePrivateMain
                | Self::EntryMainInvalidReturn
        )
    }

    /// Duplicate/shadowing family; members merge with each other on overlap.
    pub fn is_duplicate_family(self) -> bool {
        matches!(
            self,
            Self::DuplicateSymbol
                | Self::DuplicateParameter
                | Self::DuplicateField
                | Self::DuplicateEnumVariant
                | Self::DuplicateErrorVariant
                | Self::DuplicateFieldInit
                | Self::ShadowedSymbol
                | Self::SelfCollision
                | Self::ImportDuplicate
        )
    }

    /// Type-error family; members with the same context span collapse.
    pub fn is_type_error(self) -> bool {
        matches!(
            self,
            Self::TypeMismatch
                | Self::ArgumentTypeMismatch
                | Self::ReturnTypeMismatch
                | Self::ConditionNotBool
                | Self::InvalidOperandType
                | Self::InvalidUnaryOperand
                | Self::InvalidCast
                | Self::PointerMutabilityMismatch
                | Self::ArraySizeMismatch
                | Self::TypeInferenceFailed
        )
    }

    /// Known (root cause, cascade) pairs: the cascade is noise once the
    /// root cause is reported at an overlapping spot.
    pub fn cascades_from(self, root: DiagnosticCode) -> bool {
        use DiagnosticCode as C;
        matches!(
            (root, self),
            (C::UndefinedIdentifier, C::TypeMismatch)
                | (C::UndefinedIdentifier, C::TypeInferenceFailed)
                | (C::UndefinedIdentifier, C::NotCallable)
                | (C::UndefinedIdentifier, C::InvalidOperandType)
                | (C::UndefinedType, C::TypeMismatch)
                | (C::UndefinedType, C::TypeInferenceFailed)
                | (C::UndefinedFunction, C::ArgumentTypeMismatch)
                | (C::UndefinedFunction, C::ArgumentCountMismatch)
                | (C::UndefinedMember, C::TypeMismatch)
                | (C::UseBeforeDeclaration, C::TypeMismatch)
                | (C::UseBeforeInitialization, C::TypeMismatch)
                | (C::TypeMismatch, C::ReturnTypeMismatch)
                | (C::TypeMismatch, C::ArgumentTypeMismatch)
                | (C::NotComptimeEvaluable, C::ArraySizeNotConstant)
                | (C::ImportModuleNotFound, C::UndefinedIdentifier)
                | (C::ImportMemberNotFound, C::UndefinedIdentifier)
        )
    }

    /// Base message used when the caller supplies no detail.
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::InternalError => "internal analysis error",
            Self::UnsupportedFeature => "unsupported language feature",
            Self::UndefinedIdentifier => "undefined identifier",
            Self::UndefinedType => "undefined type",
            Self::UndefinedFunction => "undefined function",
            Self::UndefinedMember => "undefined member",
            Self::UndefinedBuiltin => "unknown builtin",
            Self::UseBeforeDeclaration => "used before declaration",
            Self::UseBeforeInitialization => "used before initialization",
            Self::VariableSelfInit => "variable references itself in its initializer",
            Self::ParameterForwardReference => {
                "parameter default references a later parameter"
            }
            Self::SelfOutsideMethod => "`self` is only valid inside a method",
            Self::SelfInStaticMethod => "`self` is not available in a static method",
            Self::SelfErrOutsideFunction => {
                "`selferr` is only valid inside a function with an inline error set"
            }
            Self::NonStaticFieldInStaticMethod => {
                "cannot reference an instance field from a static method"
            }
            Self::ReservedPrefix => "names starting with `@` are reserved for builtins",
            Self::ImportModuleNotFound => "imported module not found",
            Self::ImportMemberNotFound => "imported member not found",
            Self::ImportNotExported => "symbol is not exported",
            Self::ImportWildcardNoAlias => "wildcard import requires an alias",
            Self::ImportSelf => "module cannot import itself",
            Self::ImportDuplicate => "duplicate import",
            Self::ImportCircularDependency => "circular import dependency",
            Self::DuplicateSymbol => "name is already defined in this scope",
            Self::DuplicateParameter => "duplicate parameter name",
            Self::DuplicateField => "duplicate field name",
            Self::DuplicateEnumVariant => "duplicate enum variant",
            Self::DuplicateErrorVariant => "duplicate error variant",
            Self::DuplicateFieldInit => "field initialized twice",
            Self::ShadowedSymbol => "name shadows a declaration in an outer scope",
            Self::SelfCollision => "`self` cannot be redefined",
            Self::TypeMismatch => "type mismatch",
            Self::ArgumentTypeMismatch => "argument type mismatch",
            Self::ReturnTypeMismatch => "return value does not match declared return type",
            Self::ConditionNotBool => "condition must be `bool`",
            Self::InvalidOperandType => "invalid operand type for operator",
            Self::InvalidUnaryOperand => "invalid operand type for unary operator",
            Self::NotCallable => "expression is not callable",
            Self::NotIndexable => "expression cannot be indexed",
            Self::ArgumentCountMismatch => "wrong number of arguments",
            Self::UnknownField => "no such field",
            Self::MissingRequiredField => "missing required field",
            Self::StaticFieldInit => "static field cannot be set in a constructor",
            Self::ArraySizeMismatch => "array sizes differ",
            Self::ArraySizeNotConstant => "array size must be a compile-time constant",
            Self::ArraySizeNegative => "array size cannot be negative",
            Self::PointerMutabilityMismatch => {
                "cannot use an immutable pointer where a mutable pointer is expected"
            }
            Self::DerefNonPointer => "cannot dereference a non-pointer",
            Self::ImmutableAssignment => "cannot assign to an immutable binding",
            Self::InvalidAssignTarget => "invalid assignment target",
            Self::InvalidCast => "invalid cast",
            Self::SwitchNotExhaustive => "switch does not cover all cases",
            Self::SwitchDuplicateArm => "duplicate switch arm",
            Self::TypeAnnotationRequired => "type annotation required",
            Self::VoidValueUsed => "void value used as an expression",
            Self::TypeInferenceFailed => "could not infer type",
            Self::ArithmeticOverflow => "arithmetic overflow",
            Self::DivisionByZero => "division by zero",
            Self::ModuloByZero => "modulo by zero",
            Self::ShiftOutOfRange => "shift amount out of range",
            Self::ExponentTooLarge => "exponent too large for compile-time evaluation",
            Self::NotComptimeEvaluable => "expression cannot be evaluated at compile time",
            Self::ComptimeCallNotConst => "function is not constant-evaluable",
            Self::ComptimeCallUnsupportedBody => {
                "function body is too complex for compile-time evaluation"
            }
            Self::ThrowTypeMismatch => "thrown value does not match the declared error type",
            Self::ThrowWithoutErrorType => "function does not declare an error type",
            Self::ThrowOutsideFunction => "`throw` outside of a function",
            Self::UnknownErrorVariant => "not a variant of the error set",
            Self::ErrorSetMismatch => "error set mismatch",
            Self::TryWithoutErrorType => "`try` on an expression that cannot fail",
            Self::TypeCycleDetected => "type refers to itself through a cycle",
            Self::TypeNestingTooDeep => "type nesting exceeds the supported depth",
            Self::ReturnOutsideFunction => "`return` outside of a function",
            Self::BreakOutsideLoop => "`break` outside of a loop",
            Self::ContinueOutsideLoop => "`continue` outside of a loop",
            Self::EntryModuleNotFound => "entry module not found",
            Self::EntryModuleNoMain => "entry module has no `main` function",
            Self::EntryModulePrivateMain => "`main` must be public",
            Self::EntryMainInvalidReturn => "`main` must return void, i32, or u8",
            Self::EmptyModule => "module contains no statements",
            Self::UnusedVariable => "unused variable",
            Self::UnusedFunction => "unused function",
            Self::UnusedParameter => "unused parameter",
            Self::UnusedDefinition => "unused definition",
        }
    }

    /// Template for caller-supplied detail; `{}` is replaced with it.
    pub fn custom_message(self) -> String {
        match self {
            Self::UndefinedIdentifier => "`{}` is not defined".to_string(),
            Self::UndefinedType => "type `{}` is not defined".to_string(),
            Self::UndefinedFunction => "function `{}` is not defined".to_string(),
            Self::UndefinedMember => "`{}` is not a member".to_string(),
            Self::UndefinedBuiltin => "`@{}` is not a known builtin".to_string(),
            Self::UseBeforeDeclaration => "`{}` used before its declaration".to_string(),
            Self::UseBeforeInitialization => "`{}` used before it is initialized".to_string(),
            Self::VariableSelfInit => "`{}` references itself in its initializer".to_string(),
            Self::ParameterForwardReference => {
                "default value references later parameter `{}`".to_string()
            }
            Self::DuplicateSymbol => "`{}` is already defined in this scope".to_string(),
            Self::DuplicateParameter => "parameter `{}` is declared twice".to_string(),
            Self::DuplicateField => "field `{}` is declared twice".to_string(),
            Self::DuplicateEnumVariant => "variant `{}` is declared twice".to_string(),
            Self::DuplicateErrorVariant => "error variant `{}` is declared twice".to_string(),
            Self::DuplicateFieldInit => "field `{}` is initialized twice".to_string(),
            Self::ShadowedSymbol => "`{}` shadows a declaration in an outer scope".to_string(),
            Self::ImportModuleNotFound => "module `{}` not found".to_string(),
            Self::ImportMemberNotFound => "`{}` not found in the imported module".to_string(),
            Self::ImportNotExported => "`{}` is private to its module".to_string(),
            Self::ImportDuplicate => "`{}` is already imported".to_string(),
            Self::ImportCircularDependency => "circular import: {}".to_string(),
            Self::UnknownField => "no field `{}`".to_string(),
            Self::MissingRequiredField => "missing required field `{}`".to_string(),
            Self::UnknownErrorVariant => "`{}` is not a variant of the error set".to_string(),
            Self::UnusedVariable => "variable `{}` is never used".to_string(),
            Self::UnusedFunction => "function `{}` is never used".to_string(),
            Self::UnusedParameter => "parameter `{}` is never used".to_string(),
            Self::UnusedDefinition => "definition `{}` is never used".to_string(),
            Self::EntryModuleNotFound => "entry module `{}` not found".to_string(),
            Self::TypeCycleDetected => "type `{}` refers to itself through a cycle".to_string(),
            _ => format!("{}: {{}}", self.fallback_message()),
        }
    }

    /// Render the final message: fallback when no detail, template otherwise.
    pub fn message(self, detail: Option<&str>) -> String {
        match detail {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
