//! Unit-level compiler configuration.

use bitflags::bitflags;

bitflags! {
    /// Optimization passes that ran over the method before code generation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PassFlags: u8 {
        /// Precise per-variable mutation counting.
        const MUTATION_ANALYSIS = 1 << 0;
        /// Dynamic-to-static type inference.
        const TYPE_INFERENCE    = 1 << 1;
        /// Call-site cache gathering.
        const CALL_GATHERING    = 1 << 2;
    }
}

/// Options shared by every method compiled with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    pub passes: PassFlags,
    /// Report unused variables as diagnostics.
    pub report_unused: bool,
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self {
            passes: PassFlags::empty(),
            report_unused: true,
        }
    }

    pub fn with_passes(mut self, passes: PassFlags) -> Self {
        self.passes |= passes;
        self
    }

    pub fn without_unused_reports(mut self) -> Self {
        self.report_unused = false;
        self
    }

    pub fn ran(&self, pass: PassFlags) -> bool {
        self.passes.contains(pass)
    }
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self::new()
    }
}
