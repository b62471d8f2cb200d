//! Method compilation core of the extension generator.
//!
//! This crate re-exports the shared vocabulary from `extgen-core` and the
//! compiler from `extgen-compiler`.
//!
//! # Example
//!
//! ```ignore
//! use extgen::prelude::*;
//!
//! let ctx = CompileContext::new("App\\Greeter");
//! let decl = MethodDecl::new("greet")
//!     .with_param(ParameterDecl::typed("name", LowLevelType::String).mandatory());
//!
//! let mut diagnostics = Diagnostics::new();
//! let method = compile(&decl, &ctx, &mut EmptyBody, &mut diagnostics)?;
//! println!("{}", method.code);
//! ```

pub use extgen_compiler::*;
pub use extgen_core::{
    ArgumentTypeError, ClassName, Diagnostic, DiagnosticKind, Diagnostics, Literal, LiteralKind,
    LowLevelType, MethodDecl, MethodKind, Modifiers, ParamKind, ParameterDecl, ReturnHint,
    RuntimeConstants, SingletonKind, Span, TypeHash, Visibility,
};

pub mod prelude {
    pub use extgen_compiler::{
        BodyCompiler, BodyContext, BodyOutcome, CompileContext, CompiledMethod, CompilerOptions,
        EmptyBody, MethodCompiler, OptimizationFacts, PassFlags, ReturnMacro, StatementKind,
        compile,
    };
    pub use extgen_core::{
        CompilationError, Diagnostics, Literal, LowLevelType, MethodDecl, MethodKind, Modifiers,
        ParameterDecl, ReturnHint, Span,
    };
}
