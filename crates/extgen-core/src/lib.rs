//! Shared vocabulary for the extension method compiler.
//!
//! ## Modules
//!
//! - [`span`]: source locations
//! - [`type_hash`]: class identity
//! - [`types`]: the closed set of low-level types
//! - [`literal`]: literal defaults
//! - [`decl`]: method and parameter declarations
//! - [`error`]: compile-time and runtime error types
//! - [`diagnostics`]: non-fatal messages
//! - [`constants`]: process-wide boxed singletons

pub mod constants;
pub mod decl;
pub mod diagnostics;
pub mod error;
pub mod literal;
pub mod span;
pub mod type_hash;
pub mod types;

pub use constants::{RuntimeConstants, SingletonKind};
pub use decl::{
    MethodDecl, MethodKind, Modifiers, ParamKind, ParameterDecl, ReturnHint, Visibility,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{ArgumentTypeError, CompilationError};
pub use literal::{Literal, LiteralKind, c_string_literal};
pub use span::Span;
pub use type_hash::{ClassName, TypeHash};
pub use types::{LowLevelType, UnknownTypeName};
