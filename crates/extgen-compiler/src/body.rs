//! The seam between the method compiler and the statement compiler.
//!
//! A [`BodyCompiler`] generates the statements of a method against the
//! already-populated Variable Model. It talks to the compilation unit only
//! through [`BodyContext`], which records stack-growth requests through the
//! same arbiter the parameter binder uses.
//!
//! # Example
//!
//! ```ignore
//! struct Hello;
//!
//! impl BodyCompiler for Hello {
//!     fn compile_body(&mut self, body: &mut BodyContext<'_>) -> Result<BodyOutcome> {
//!         body.emit(0, "php_printf(\"hello\");");
//!         Ok(BodyOutcome::ending_with(StatementKind::Other))
//!     }
//! }
//! ```

use extgen_core::{LowLevelType, Span};

use crate::Result;
use crate::emit::{EmissionBuffer, FrameToken, ReturnMacro, StackGrowth};
use crate::symbols::{SymbolTable, Variable};

/// Kind of the last statement in a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Return,
    Throw,
    Other,
}

/// What the body compiler reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BodyOutcome {
    /// `None` for an empty body.
    pub last_statement: Option<StatementKind>,
}

impl BodyOutcome {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ending_with(kind: StatementKind) -> Self {
        Self {
            last_statement: Some(kind),
        }
    }

    /// Whether control can reach the end of the method.
    pub fn falls_through(&self) -> bool {
        !matches!(
            self.last_statement,
            Some(StatementKind::Return | StatementKind::Throw)
        )
    }
}

/// Generates the statements of one method.
pub trait BodyCompiler {
    fn compile_body(&mut self, body: &mut BodyContext<'_>) -> Result<BodyOutcome>;
}

/// A body with no statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyBody;

impl BodyCompiler for EmptyBody {
    fn compile_body(&mut self, _body: &mut BodyContext<'_>) -> Result<BodyOutcome> {
        Ok(BodyOutcome::empty())
    }
}

/// The compilation unit as seen by a body compiler.
pub struct BodyContext<'u> {
    method: &'u str,
    symbols: &'u mut SymbolTable,
    growth: &'u mut StackGrowth,
    out: EmissionBuffer,
}

impl<'u> BodyContext<'u> {
    /// Body statements sit one level inside the method braces.
    const BASE_INDENT: usize = 1;

    pub fn new(method: &'u str, symbols: &'u mut SymbolTable, growth: &'u mut StackGrowth) -> Self {
        Self {
            method,
            symbols,
            growth,
            out: EmissionBuffer::new(),
        }
    }

    pub fn method_name(&self) -> &str {
        self.method
    }

    // ==========================================================================
    // Variable Model
    // ==========================================================================

    /// Declare a local on first reference.
    pub fn declare_local(&mut self, name: &str, ty: LowLevelType, span: Span) -> Result<&mut Variable> {
        self.symbols.declare(name, ty, span)
    }

    /// Count one reference to `name`.
    pub fn record_use(&mut self, name: &str) -> Result<u32> {
        self.symbols.record_use(name)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.symbols.get(name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.symbols.get_mut(name)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &*self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut *self.symbols
    }

    // ==========================================================================
    // Emission
    // ==========================================================================

    /// Record that emitted code needs a managed frame.
    pub fn request_stack_growth(&mut self) {
        self.growth.request();
    }

    /// Emit a line, `indent` levels inside the method body.
    pub fn emit(&mut self, indent: usize, code: impl Into<String>) {
        self.out.code(Self::BASE_INDENT + indent, code);
    }

    pub fn blank(&mut self) {
        self.out.blank();
    }

    /// Emit a terminal return.
    pub fn emit_return(&mut self, indent: usize, ret: ReturnMacro) {
        self.out.frame(Self::BASE_INDENT + indent, FrameToken::Return(ret));
    }

    /// Emit a frame restoration ahead of a non-returning exit.
    pub fn emit_restore(&mut self, indent: usize) {
        self.out.frame(Self::BASE_INDENT + indent, FrameToken::Restore);
    }

    /// Throw `exception` and leave the method.
    pub fn emit_throw(&mut self, indent: usize, exception: &str) {
        self.emit(indent, format!("zephir_throw_exception_debug({exception}, \"\", 0);"));
        self.emit_restore(indent);
        self.emit(indent, "return;");
    }

    pub(crate) fn into_buffer(self) -> EmissionBuffer {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_fall_through() {
        assert!(BodyOutcome::empty().falls_through());
        assert!(BodyOutcome::ending_with(StatementKind::Other).falls_through());
        assert!(!BodyOutcome::ending_with(StatementKind::Return).falls_through());
        assert!(!BodyOutcome::ending_with(StatementKind::Throw).falls_through());
    }

    #[test]
    fn emission_is_indented_inside_method() {
        let mut symbols = SymbolTable::new();
        let mut growth = StackGrowth::new();
        let mut body = BodyContext::new("run", &mut symbols, &mut growth);

        body.emit(0, "a();");
        body.emit(1, "b();");
        body.emit_return(0, ReturnMacro::Null);

        let buffer = body.into_buffer();
        assert_eq!(buffer.render(false), "\ta();\n\t\tb();\n\tRETURN_NULL();\n");
    }

    #[test]
    fn locals_go_into_the_unit_table() {
        let mut symbols = SymbolTable::new();
        let mut growth = StackGrowth::new();
        {
            let mut body = BodyContext::new("run", &mut symbols, &mut growth);
            body.declare_local("tmp", LowLevelType::Variable, Span::default())
                .unwrap();
            assert_eq!(body.record_use("tmp").unwrap(), 1);
            body.request_stack_growth();
        }
        assert_eq!(symbols.get("tmp").unwrap().uses(), 1);
        assert_eq!(growth.request_count(), 1);
    }

    #[test]
    fn throw_restores_before_leaving() {
        let mut symbols = SymbolTable::new();
        let mut growth = StackGrowth::new();
        let mut body = BodyContext::new("run", &mut symbols, &mut growth);
        body.emit_throw(0, "&ex");

        assert_eq!(
            body.into_buffer().render(true),
            "\tzephir_throw_exception_debug(&ex, \"\", 0);\n\tZEPHIR_MM_RESTORE();\n\treturn;\n"
        );
    }

    #[test]
    fn empty_body_reports_no_statement() {
        let mut symbols = SymbolTable::new();
        let mut growth = StackGrowth::new();
        let mut body = BodyContext::new("run", &mut symbols, &mut growth);
        assert_eq!(EmptyBody.compile_body(&mut body).unwrap(), BodyOutcome::empty());
    }
}
