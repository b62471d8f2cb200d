//! Method compiler for generated extension code.
//!
//! Turns one method declaration plus its compiled body into a finalized C
//! `PHP_METHOD` definition for the managed runtime.
//!
//! ## Architecture
//!
//! - **Binding**: parameters are materialized into the Variable Model and
//!   the receive/check/convert prologue is emitted
//! - **Body**: the statement compiler runs against the populated model
//! - **Finalize**: the stack-growth decision is read once and every frame
//!   placeholder in the buffer is resolved
//!
//! ## Modules
//!
//! - [`symbols`]: the Variable Model
//! - [`defaults`]: literal default synthesis
//! - [`params`]: parameter binding and argument guards
//! - [`emit`]: emission buffer, frame placeholders and the growth arbiter
//! - [`declarations`]: the declaration block
//! - [`mutation`]: mutation and inference facts from the optimization passes
//! - [`options`]: unit-level configuration
//! - [`body`]: the body compiler seam
//! - [`method`]: the method compilation unit

pub mod body;
pub mod declarations;
pub mod defaults;
pub mod emit;
pub mod method;
pub mod mutation;
pub mod options;
pub mod params;
pub mod symbols;

pub use body::{BodyCompiler, BodyContext, BodyOutcome, EmptyBody, StatementKind};
pub use declarations::{DeclarationBlock, DeclarationEmitter};
pub use defaults::{DefaultSynthesizer, Initialization};
pub use emit::{EmissionBuffer, FinalizedBody, FrameToken, ReturnMacro, StackGrowth};
pub use method::{
    CompileContext, CompiledMethod, MethodCompiler, MethodEntry, access_flags, compile,
    validate_modifiers,
};
pub use mutation::{
    ConservativeWriteDetector, InferredTypes, MutationEstimate, MutationProvider,
    OptimizationFacts, PreciseMutationCounts,
};
pub use options::{CompilerOptions, PassFlags};
pub use params::{ArgumentGuard, BoundParameters, BoxTag, ParameterBinder, Requirement, ValueProbe};
pub use symbols::{InitState, SymbolTable, VarFlags, Variable};

// Re-export CompilationError from core for convenience
pub use extgen_core::CompilationError;

pub type Result<T> = std::result::Result<T, CompilationError>;
