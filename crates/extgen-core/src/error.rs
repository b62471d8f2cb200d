//! Error types for method compilation.
//!
//! ## Error Hierarchy
//!
//! ```text
//! CompilationError   - aborts compilation of the enclosing method
//! ArgumentTypeError  - raised at call time by generated guard code
//! ```
//!
//! Every compile-time variant carries the [`Span`] of the offending
//! declaration except `UnsupportedDeclarationType` and `Internal`, which
//! describe states the front end should never be able to produce.

use thiserror::Error;

use crate::{LiteralKind, LowLevelType, Span};

/// Errors that abort compilation of a single method.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    /// Two modifiers that cannot be combined were given.
    #[error("at {span}: method '{method}' cannot be both {first} and {second}")]
    VisibilityConflict {
        method: String,
        first: &'static str,
        second: &'static str,
        span: Span,
    },

    /// A constructor or destructor carries a modifier it cannot have.
    #[error("at {span}: {role} '{method}' cannot be {modifier}")]
    IllegalConstructorModifier {
        method: String,
        role: &'static str,
        modifier: &'static str,
        span: Span,
    },

    /// A class-constrained parameter has a default other than `null`.
    #[error(
        "at {span}: parameter '{parameter}' is constrained to '{class}' and can only default to null"
    )]
    InvalidCastDefault {
        parameter: String,
        class: String,
        span: Span,
    },

    /// A literal default cannot seed the target type.
    #[error("at {span}: default value of kind {literal} cannot initialize '{name}' of type {target}")]
    UnsupportedDefaultConversion {
        name: String,
        target: LowLevelType,
        literal: LiteralKind,
        span: Span,
    },

    /// A parameter type is outside the set the binder recognizes.
    #[error("at {span}: parameter '{parameter}' has unsupported type {ty}")]
    UnsupportedParameterType {
        parameter: String,
        ty: LowLevelType,
        span: Span,
    },

    /// A variable reached the declaration stage with an unresolved type.
    #[error("internal error: cannot declare variable '{name}' of type {ty}")]
    UnsupportedDeclarationType { name: String, ty: LowLevelType },

    /// The body may fall off the end despite declared return-type hints.
    #[error(
        "at {span}: reached end of method '{method}' without returning a value of the declared return type"
    )]
    MissingReturnOnTypedMethod { method: String, span: Span },

    /// A parameter's backing variable is already taken by another parameter.
    #[error("at {span}: parameter '{parameter}' needs variable '{variable}', which is already declared")]
    ParameterNameClash {
        parameter: String,
        variable: String,
        span: Span,
    },

    /// A variable was redeclared with a different low-level type.
    #[error("at {span}: variable '{name}' redeclared as {requested}, previously {existing}")]
    VariableTypeConflict {
        name: String,
        existing: LowLevelType,
        requested: LowLevelType,
        span: Span,
    },

    /// Internal compiler error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CompilationError {
    /// Source location of the error, if it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            CompilationError::VisibilityConflict { span, .. }
            | CompilationError::IllegalConstructorModifier { span, .. }
            | CompilationError::InvalidCastDefault { span, .. }
            | CompilationError::UnsupportedDefaultConversion { span, .. }
            | CompilationError::UnsupportedParameterType { span, .. }
            | CompilationError::MissingReturnOnTypedMethod { span, .. }
            | CompilationError::ParameterNameClash { span, .. }
            | CompilationError::VariableTypeConflict { span, .. } => Some(*span),
            CompilationError::UnsupportedDeclarationType { .. }
            | CompilationError::Internal { .. } => None,
        }
    }

    /// Whether the error points at a compiler defect rather than user input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            CompilationError::UnsupportedDeclarationType { .. } | CompilationError::Internal { .. }
        )
    }
}

/// An incoming argument failed a strict or class-cast check at call time.
///
/// This is never returned by the compiler; its message is rendered into the
/// generated guard and raised by the target runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentTypeError {
    #[error("Parameter '{parameter}' must be of the type {expected}")]
    WrongType { parameter: String, expected: String },

    #[error("Parameter '{parameter}' must be an instance of '{expected}'")]
    NotAnInstance { parameter: String, expected: String },
}

impl ArgumentTypeError {
    pub fn parameter(&self) -> &str {
        match self {
            ArgumentTypeError::WrongType { parameter, .. }
            | ArgumentTypeError::NotAnInstance { parameter, .. } => parameter,
        }
    }

    pub fn expected(&self) -> &str {
        match self {
            ArgumentTypeError::WrongType { expected, .. }
            | ArgumentTypeError::NotAnInstance { expected, .. } => expected,
        }
    }
}
