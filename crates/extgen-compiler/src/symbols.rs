//! Variable Model: the per-method symbol table.
//!
//! This module provides [`SymbolTable`] for tracking every variable a method
//! compiles to. It handles:
//! - Idempotent declaration (same name and type returns the existing entry)
//! - Initialization state and storage-shape flags
//! - Use counting for dead-variable diagnostics
//! - Class constraints on object variables
//!
//! Variables are never removed individually; the table is dropped with the
//! compilation unit that owns it.

use bitflags::bitflags;
use extgen_core::{ClassName, CompilationError, Diagnostics, Literal, LowLevelType, Span, TypeHash};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::Result;

/// Name of the implicit receiver variable.
pub const THIS_VAR: &str = "this";
/// Name of the implicit return slot.
pub const RETURN_VAR: &str = "return_value";

// ============================================================================
// Types
// ============================================================================

/// How a variable must be initialized before first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InitState {
    #[default]
    Uninitialized,
    /// Declared with an explicit null initializer.
    MustInitNull,
    Initialized,
}

bitflags! {
    /// Storage and provenance flags of a variable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VarFlags: u8 {
        /// Came from a parameter.
        const EXTERNAL       = 1 << 0;
        const READ_ONLY      = 1 << 1;
        /// Boxed value stored inline on the C stack instead of behind a pointer.
        const LOCAL_ONLY     = 1 << 2;
        /// Extra indirection, used for reference out-parameters.
        const DOUBLE_POINTER = 1 << 3;
        /// `this` and the return slot; never declared or reported.
        const IMPLICIT       = 1 << 4;
        /// Auxiliary `<name>_param` slot receiving the raw argument.
        const PARAM_SLOT     = 1 << 5;
    }
}

/// A variable in a method's symbol table.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    ty: LowLevelType,
    init: InitState,
    flags: VarFlags,
    uses: u32,
    class_constraints: Vec<ClassName>,
    constraint_hashes: FxHashSet<TypeHash>,
    default_init: Option<Literal>,
    span: Span,
}

impl Variable {
    fn new(name: String, ty: LowLevelType, span: Span) -> Self {
        Self {
            name,
            ty,
            init: InitState::Uninitialized,
            flags: VarFlags::empty(),
            uses: 0,
            class_constraints: Vec::new(),
            constraint_hashes: FxHashSet::default(),
            default_init: None,
            span,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> LowLevelType {
        self.ty
    }

    pub fn init_state(&self) -> InitState {
        self.init
    }

    pub fn flags(&self) -> VarFlags {
        self.flags
    }

    pub fn uses(&self) -> u32 {
        self.uses
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn class_constraints(&self) -> &[ClassName] {
        &self.class_constraints
    }

    pub fn default_init_value(&self) -> Option<&Literal> {
        self.default_init.as_ref()
    }

    pub fn is_external(&self) -> bool {
        self.flags.contains(VarFlags::EXTERNAL)
    }

    pub fn is_read_only(&self) -> bool {
        self.flags.contains(VarFlags::READ_ONLY)
    }

    pub fn is_local_only(&self) -> bool {
        self.flags.contains(VarFlags::LOCAL_ONLY)
    }

    pub fn is_double_pointer(&self) -> bool {
        self.flags.contains(VarFlags::DOUBLE_POINTER)
    }

    pub fn is_implicit(&self) -> bool {
        self.flags.contains(VarFlags::IMPLICIT)
    }

    pub fn is_param_slot(&self) -> bool {
        self.flags.contains(VarFlags::PARAM_SLOT)
    }

    /// Declared but never referenced, and not owed to a caller.
    pub fn is_dead(&self) -> bool {
        self.uses == 0 && !self.is_external() && !self.is_implicit()
    }

    /// Expression yielding a `zval *` for this variable.
    ///
    /// Inline (local-only) boxed values need their address taken; pointer
    /// storage is used as is.
    pub fn boxed_ref(&self) -> String {
        if self.is_local_only() {
            format!("&{}", self.name)
        } else {
            self.name.clone()
        }
    }

    pub fn set_flag(&mut self, flag: VarFlags) {
        self.flags |= flag;
    }

    pub fn set_init_state(&mut self, init: InitState) {
        self.init = init;
    }
}

// ============================================================================
// SymbolTable
// ============================================================================

/// Symbol table for one method.
///
/// Iteration follows declaration order so rendered output is stable.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    variables: Vec<Variable>,
    index: FxHashMap<String, usize>,
}

impl SymbolTable {
    /// Create a table holding only the implicit receiver and return slot.
    pub fn new() -> Self {
        let mut table = Self {
            variables: Vec::new(),
            index: FxHashMap::default(),
        };
        table.insert_implicit(THIS_VAR, LowLevelType::Object);
        table.insert_implicit(RETURN_VAR, LowLevelType::Variable);
        table
    }

    fn insert_implicit(&mut self, name: &str, ty: LowLevelType) {
        let mut var = Variable::new(name.to_string(), ty, Span::default());
        var.flags = VarFlags::IMPLICIT | VarFlags::READ_ONLY;
        var.init = InitState::Initialized;
        self.index.insert(var.name.clone(), self.variables.len());
        self.variables.push(var);
    }

    // ==========================================================================
    // Declaration
    // ==========================================================================

    /// Declare a variable, or return the existing one.
    ///
    /// Redeclaring with the same type is a no-op; a different type is an error.
    pub fn declare(&mut self, name: &str, ty: LowLevelType, span: Span) -> Result<&mut Variable> {
        if let Some(&slot) = self.index.get(name) {
            let existing = &mut self.variables[slot];
            if existing.ty != ty {
                return Err(CompilationError::VariableTypeConflict {
                    name: name.to_string(),
                    existing: existing.ty,
                    requested: ty,
                    span,
                });
            }
            return Ok(existing);
        }

        let slot = self.variables.len();
        self.variables.push(Variable::new(name.to_string(), ty, span));
        self.index.insert(name.to_string(), slot);
        Ok(&mut self.variables[slot])
    }

    pub fn mark_external(&mut self, name: &str) -> Result<()> {
        self.require_mut(name)?.flags |= VarFlags::EXTERNAL;
        Ok(())
    }

    pub fn mark_initialized(&mut self, name: &str) -> Result<()> {
        self.require_mut(name)?.init = InitState::Initialized;
        Ok(())
    }

    /// Count one reference to `name`, returning the new total.
    pub fn record_use(&mut self, name: &str) -> Result<u32> {
        let var = self.require_mut(name)?;
        var.uses += 1;
        Ok(var.uses)
    }

    pub fn set_default_init_value(&mut self, name: &str, value: Literal) -> Result<()> {
        self.require_mut(name)?.default_init = Some(value);
        Ok(())
    }

    /// Require `name` to be an instance of `class`.
    ///
    /// Only object variables carry constraints. Adding the same class twice
    /// keeps a single entry.
    pub fn add_class_constraint(&mut self, name: &str, class: ClassName) -> Result<()> {
        let var = self.require_mut(name)?;
        if var.ty != LowLevelType::Object {
            return Err(CompilationError::Internal {
                message: format!(
                    "class constraint '{class}' on non-object variable '{name}' of type {}",
                    var.ty
                ),
            });
        }
        if var.constraint_hashes.insert(class.hash()) {
            var.class_constraints.push(class);
        }
        Ok(())
    }

    fn require_mut(&mut self, name: &str) -> Result<&mut Variable> {
        match self.index.get(name) {
            Some(&slot) => Ok(&mut self.variables[slot]),
            None => Err(CompilationError::Internal {
                message: format!("reference to undeclared variable '{name}'"),
            }),
        }
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.index.get(name).map(|&slot| &self.variables[slot])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.index.get(name).map(|&slot| &mut self.variables[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    /// Number of entries, implicit variables included.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Declarable variables grouped by low-level type.
    ///
    /// Groups follow the type ordinal; members keep declaration order.
    pub fn variables_by_type(&self) -> Vec<(LowLevelType, Vec<&Variable>)> {
        let mut groups: Vec<(LowLevelType, Vec<&Variable>)> = Vec::new();
        for var in self.variables.iter().filter(|v| !v.is_implicit()) {
            match groups.iter_mut().find(|(ty, _)| *ty == var.ty) {
                Some((_, members)) => members.push(var),
                None => groups.push((var.ty, vec![var])),
            }
        }
        groups.sort_by_key(|(ty, _)| u8::from(*ty));
        groups
    }

    /// Locals that were declared but never used.
    pub fn dead_variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter().filter(|v| v.is_dead())
    }

    /// Parameters the body never reads.
    pub fn unused_parameters(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter().filter(|v| {
            v.uses == 0 && v.is_external() && !v.is_implicit() && !v.is_param_slot()
        })
    }

    /// Report unused variables.
    ///
    /// Locals are warnings; parameters are informational because the caller
    /// must still supply them.
    pub fn report_unused(&self, method: &str, diagnostics: &mut Diagnostics) {
        for var in self.dead_variables() {
            log::warn!("unused variable '{}' in method '{}'", var.name, method);
            diagnostics.warn(format!("variable '{}' declared but not used in {method}", var.name), var.span);
        }
        for var in self.unused_parameters() {
            diagnostics.info(format!("parameter '{}' is never used in {method}", var.name), var.span);
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
