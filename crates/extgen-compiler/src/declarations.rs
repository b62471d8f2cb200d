//! Declaration Emitter.
//!
//! Renders the variable declaration block of a method: one C declaration
//! per low-level type group, with storage shape and initializer chosen
//! per variable. The implicit receiver and return slot are never declared.

use extgen_core::{CompilationError, LowLevelType};

use crate::Result;
use crate::defaults::scalar_value;
use crate::symbols::{InitState, SymbolTable, Variable};

/// Rendered declaration block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationBlock {
    /// One statement per type group, e.g. `zval *a = NULL, b;`.
    pub declarations: Vec<String>,
    /// `ZVAL_UNDEF` lines for boxed values stored inline.
    pub initializers: Vec<String>,
}

impl DeclarationBlock {
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty() && self.initializers.is_empty()
    }
}

/// Renders the declarations of a symbol table.
pub struct DeclarationEmitter<'s> {
    symbols: &'s SymbolTable,
}

impl<'s> DeclarationEmitter<'s> {
    pub fn new(symbols: &'s SymbolTable) -> Self {
        Self { symbols }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn emit(&self) -> Result<DeclarationBlock> {
        let mut block = DeclarationBlock::default();

        for (ty, members) in self.symbols.variables_by_type() {
            let c_type = ty.c_type().ok_or_else(|| CompilationError::UnsupportedDeclarationType {
                name: members
                    .first()
                    .map(|v| v.name().to_string())
                    .unwrap_or_default(),
                ty,
            })?;

            let mut declarators = Vec::with_capacity(members.len());
            for var in members {
                declarators.push(declarator(var)?);
                if ty.is_boxed() && var.is_local_only() {
                    block.initializers.push(format!("ZVAL_UNDEF(&{});", var.name()));
                }
            }
            block
                .declarations
                .push(format!("{c_type} {};", declarators.join(", ")));
        }

        Ok(block)
    }
}

/// Name with indirection and optional initializer.
fn declarator(var: &Variable) -> Result<String> {
    let ty = var.ty();
    let name = var.name();

    if ty.is_boxed() {
        if var.is_local_only() {
            return Ok(name.to_string());
        }
        let stars = if var.is_double_pointer() { "**" } else { "*" };
        return Ok(match var.init_state() {
            InitState::MustInitNull => format!("{stars}{name} = NULL"),
            _ => format!("{stars}{name}"),
        });
    }

    if ty.is_pointer_type() {
        let stars = if var.is_double_pointer() { "**" } else { "*" };
        return Ok(match (var.init_state(), ty) {
            (InitState::MustInitNull, _) | (_, LowLevelType::FcallCache) => {
                format!("{stars}{name} = NULL")
            }
            _ => format!("{stars}{name}"),
        });
    }

    let prefix = if var.is_double_pointer() { "*" } else { "" };
    if let Some(literal) = var.default_init_value() {
        let value = scalar_value(ty, literal).ok_or_else(|| {
            CompilationError::UnsupportedDefaultConversion {
                name: name.to_string(),
                target: ty,
                literal: literal.kind(),
                span: var.span(),
            }
        })?;
        return Ok(format!("{prefix}{name} = {value}"));
    }
    if var.init_state() == InitState::MustInitNull {
        return Ok(format!("{prefix}{name} = 0"));
    }
    Ok(format!("{prefix}{name}"))
}
