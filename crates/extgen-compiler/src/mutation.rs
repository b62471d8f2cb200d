//! Facts supplied by the optimization passes.
//!
//! Exactly one mutation provider is active per unit: the precise counter when
//! mutation analysis ran, otherwise the conservative write detector. Both are
//! consulted through [`MutationProvider`] so the separation and copy-vs-share
//! decisions always read the same source.

use extgen_core::LowLevelType;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::options::{CompilerOptions, PassFlags};

/// What the active provider knows about how often a variable is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationEstimate {
    Exact(u32),
    Written(bool),
}

impl MutationEstimate {
    /// The variable must be separated from the caller's storage before its
    /// first in-place mutation.
    pub fn needs_separation(self) -> bool {
        match self {
            MutationEstimate::Exact(count) => count > 1,
            MutationEstimate::Written(written) => written,
        }
    }

    /// The variable is rebound at most once, so it may point at a shared
    /// singleton.
    pub fn shares_singleton(self) -> bool {
        !self.needs_separation()
    }
}

/// Source of mutation estimates.
pub trait MutationProvider {
    fn estimate(&self, name: &str) -> MutationEstimate;
}

/// Per-variable mutation counts from the mutation analysis pass.
#[derive(Debug, Clone, Default)]
pub struct PreciseMutationCounts {
    counts: FxHashMap<String, u32>,
}

impl PreciseMutationCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, count: u32) {
        self.counts.insert(name.into(), count);
    }

    pub fn with(mut self, name: impl Into<String>, count: u32) -> Self {
        self.set(name, count);
        self
    }

    pub fn mutations_of(&self, name: &str) -> u32 {
        self.counts.get(name).copied().unwrap_or(0)
    }
}

impl MutationProvider for PreciseMutationCounts {
    fn estimate(&self, name: &str) -> MutationEstimate {
        MutationEstimate::Exact(self.mutations_of(name))
    }
}

/// Whole-body detector that only knows whether a variable is written at all.
#[derive(Debug, Clone, Default)]
pub struct ConservativeWriteDetector {
    written: FxHashSet<String>,
}

impl ConservativeWriteDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_written(&mut self, name: impl Into<String>) {
        self.written.insert(name.into());
    }

    pub fn with_written(mut self, name: impl Into<String>) -> Self {
        self.mark_written(name);
        self
    }

    pub fn was_written(&self, name: &str) -> bool {
        self.written.contains(name)
    }
}

impl MutationProvider for ConservativeWriteDetector {
    fn estimate(&self, name: &str) -> MutationEstimate {
        MutationEstimate::Written(self.was_written(name))
    }
}

/// Result of dynamic-type inference for untyped variables.
#[derive(Debug, Clone, Default)]
pub struct InferredTypes {
    types: FxHashMap<String, LowLevelType>,
}

impl InferredTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, ty: LowLevelType) {
        self.types.insert(name.into(), ty);
    }

    pub fn inferred_type_of(&self, name: &str) -> Option<LowLevelType> {
        self.types.get(name).copied()
    }
}

/// Everything the optimization passes produced for one method.
#[derive(Debug, Clone, Default)]
pub struct OptimizationFacts {
    pub mutation_counts: PreciseMutationCounts,
    pub writes: ConservativeWriteDetector,
    pub inferred: InferredTypes,
}

impl OptimizationFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mutation_counts(mut self, counts: PreciseMutationCounts) -> Self {
        self.mutation_counts = counts;
        self
    }

    pub fn with_writes(mut self, writes: ConservativeWriteDetector) -> Self {
        self.writes = writes;
        self
    }

    pub fn with_inferred(mut self, inferred: InferredTypes) -> Self {
        self.inferred = inferred;
        self
    }

    /// Pick the single provider for a unit compiled with `options`.
    pub fn mutation_provider(&self, options: &CompilerOptions) -> &dyn MutationProvider {
        if options.ran(PassFlags::MUTATION_ANALYSIS) {
            &self.mutation_counts
        } else {
            &self.writes
        }
    }

    /// The inference table, if the inference pass ran.
    pub fn inference(&self, options: &CompilerOptions) -> Option<&InferredTypes> {
        options
            .ran(PassFlags::TYPE_INFERENCE)
            .then_some(&self.inferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precise_counts_separate_above_one() {
        let counts = PreciseMutationCounts::new().with("a", 1).with("b", 2);
        assert!(!counts.estimate("a").needs_separation());
        assert!(counts.estimate("b").needs_separation());
        assert_eq!(counts.estimate("missing"), MutationEstimate::Exact(0));
    }

    #[test]
    fn conservative_detector_separates_any_write() {
        let writes = ConservativeWriteDetector::new().with_written("a");
        assert!(writes.estimate("a").needs_separation());
        assert!(writes.estimate("b").shares_singleton());
    }

    #[test]
    fn provider_follows_pass_flags() {
        let facts = OptimizationFacts::new()
            .with_mutation_counts(PreciseMutationCounts::new().with("a", 1))
            .with_writes(ConservativeWriteDetector::new().with_written("a"));

        let precise = CompilerOptions::new().with_passes(PassFlags::MUTATION_ANALYSIS);
        assert_eq!(facts.mutation_provider(&precise).estimate("a"), MutationEstimate::Exact(1));

        let fallback = CompilerOptions::new();
        assert_eq!(
            facts.mutation_provider(&fallback).estimate("a"),
            MutationEstimate::Written(true)
        );
    }

    #[test]
    fn inference_only_when_pass_ran() {
        let mut inferred = InferredTypes::new();
        inferred.set("x", LowLevelType::Int);
        let facts = OptimizationFacts::new().with_inferred(inferred);

        assert!(facts.inference(&CompilerOptions::new()).is_none());
        let options = CompilerOptions::new().with_passes(PassFlags::TYPE_INFERENCE);
        assert_eq!(
            facts.inference(&options).and_then(|t| t.inferred_type_of("x")),
            Some(LowLevelType::Int)
        );
    }
}
