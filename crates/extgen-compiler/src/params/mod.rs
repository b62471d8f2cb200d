//! Parameter Binder.
//!
//! Materializes declared parameters into the Variable Model and emits the
//! prologue that receives, checks and converts each incoming argument.
//!
//! Every parameter gets a typed local named after it. Parameters with a
//! native representation also get an auxiliary `<name>_param` slot that
//! receives the raw boxed argument before conversion; polymorphic
//! parameters receive the argument directly.

mod guard;

pub use guard::{ArgumentGuard, BoxTag, Requirement, ValueProbe};

use extgen_core::{CompilationError, Literal, LowLevelType, ParamKind, ParameterDecl};

use crate::Result;
use crate::defaults::DefaultSynthesizer;
use crate::emit::{EmissionBuffer, FrameToken, StackGrowth};
use crate::mutation::{InferredTypes, MutationProvider};
use crate::symbols::{InitState, SymbolTable, VarFlags};

/// Result of binding a method's parameters.
#[derive(Debug, Clone, Default)]
pub struct BoundParameters {
    /// The fetch-parameters placeholder; `None` for a method without parameters.
    pub fetch: Option<FrameToken>,
    /// Receive/check/convert code, in declaration order.
    pub code: EmissionBuffer,
    pub required: usize,
    pub optional: usize,
    /// Parameters given a copy-on-write separation.
    pub separated: Vec<String>,
    /// Guards generated for the prologue, keyed by parameter name.
    pub guards: Vec<(String, ArgumentGuard)>,
    /// Untyped parameters the inference pass proposed a native type for.
    pub inferred: Vec<(String, LowLevelType)>,
}

/// Binds the parameters of one method compilation unit.
pub struct ParameterBinder<'u> {
    symbols: &'u mut SymbolTable,
    growth: &'u mut StackGrowth,
    mutations: &'u dyn MutationProvider,
    synthesizer: DefaultSynthesizer<'u>,
    inference: Option<&'u InferredTypes>,
    indent: usize,
}

/// How one parameter is received.
struct Plan<'p> {
    decl: &'p ParameterDecl,
    ty: LowLevelType,
    /// The variable named in the fetch call.
    slot: String,
    separate: bool,
}

impl<'u> ParameterBinder<'u> {
    pub fn new(
        symbols: &'u mut SymbolTable,
        growth: &'u mut StackGrowth,
        mutations: &'u dyn MutationProvider,
        synthesizer: DefaultSynthesizer<'u>,
    ) -> Self {
        Self {
            symbols,
            growth,
            mutations,
            synthesizer,
            inference: None,
            indent: 1,
        }
    }

    /// Consult `inferred` for untyped parameters.
    pub fn with_inference(mut self, inferred: Option<&'u InferredTypes>) -> Self {
        self.inference = inferred;
        self
    }

    /// Bind `params` in declaration order.
    pub fn bind(mut self, params: &[ParameterDecl]) -> Result<BoundParameters> {
        let mut bound = BoundParameters::default();
        let mut fetch_args = Vec::with_capacity(params.len());

        for decl in params {
            let plan = self.materialize(decl)?;
            fetch_args.push(format!("&{}", plan.slot));

            match &decl.kind {
                ParamKind::Required => {
                    bound.required += 1;
                    let indent = self.indent;
                    self.bind_supplied(&plan, None, indent, &mut bound.code, &mut bound.guards)?;
                }
                ParamKind::Optional { default } => {
                    bound.optional += 1;
                    self.bind_optional(&plan, default, &mut bound)?;
                }
            }

            if plan.separate {
                bound.separated.push(decl.name.clone());
            }
            self.consult_inference(decl, &mut bound);
        }

        if !params.is_empty() {
            bound.fetch = Some(FrameToken::FetchParams {
                required: bound.required,
                optional: bound.optional,
                args: fetch_args,
            });
        }
        Ok(bound)
    }

    /// Declare the backing variables of `decl` and decide how it is received.
    fn materialize<'p>(&mut self, decl: &'p ParameterDecl) -> Result<Plan<'p>> {
        let ty = decl.effective_type();
        if ty.is_internal() || matches!(ty, LowLevelType::Void | LowLevelType::Unknown) {
            return Err(unsupported(decl, ty));
        }
        if let Some(class) = &decl.cast {
            if ty != LowLevelType::Object {
                return Err(unsupported(decl, ty));
            }
            if let Some(default) = decl.default_value() {
                if !default.is_null() {
                    return Err(CompilationError::InvalidCastDefault {
                        parameter: decl.name.clone(),
                        class: class.as_str().to_string(),
                        span: decl.span,
                    });
                }
            }
        }

        let slot_name = ty.has_param_slot().then(|| format!("{}_param", decl.name));
        for name in std::iter::once(&decl.name).chain(slot_name.as_ref()) {
            if self.symbols.contains(name) {
                return Err(CompilationError::ParameterNameClash {
                    parameter: decl.name.clone(),
                    variable: name.clone(),
                    span: decl.span,
                });
            }
        }

        let local = self.symbols.declare(&decl.name, ty, decl.span)?;
        local.set_flag(VarFlags::EXTERNAL);
        if decl.is_const {
            local.set_flag(VarFlags::READ_ONLY);
        }

        let slot = if let Some(slot_name) = slot_name {
            if matches!(ty, LowLevelType::String | LowLevelType::Array) {
                local.set_flag(VarFlags::LOCAL_ONLY);
            }
            local.set_init_state(InitState::Initialized);

            let slot = self
                .symbols
                .declare(&slot_name, LowLevelType::Variable, decl.span)?;
            slot.set_flag(VarFlags::EXTERNAL | VarFlags::PARAM_SLOT);
            slot.set_init_state(if decl.is_optional() {
                InitState::MustInitNull
            } else {
                InitState::Initialized
            });
            slot_name
        } else {
            local.set_init_state(if decl.is_optional() {
                InitState::MustInitNull
            } else {
                InitState::Initialized
            });
            decl.name.clone()
        };

        if let Some(class) = &decl.cast {
            self.symbols.add_class_constraint(&decl.name, class.clone())?;
        }

        let separate = ty.is_boxed() && self.mutations.estimate(&decl.name).needs_separation();
        log::trace!(
            "binding parameter '{}' as {} (slot {}, separate: {})",
            decl.name,
            ty,
            slot,
            separate
        );

        Ok(Plan {
            decl,
            ty,
            slot,
            separate,
        })
    }

    /// `if (!slot) { default } else { supplied }`.
    fn bind_optional(
        &mut self,
        plan: &Plan<'_>,
        default: &Literal,
        bound: &mut BoundParameters,
    ) -> Result<()> {
        let indent = self.indent;
        bound.code.code(indent, format!("if (!{}) {{", plan.slot));

        let local = self
            .symbols
            .get(&plan.decl.name)
            .ok_or_else(|| internal(plan.decl))?;
        let init = self.synthesizer.synthesize(
            local,
            default,
            self.mutations.estimate(&plan.decl.name),
            plan.decl.span,
        )?;
        if init.allocates {
            self.growth.request();
        }
        bound.code.code_lines(indent + 1, init.lines);

        let mut supplied = EmissionBuffer::new();
        self.bind_supplied(plan, Some(default), indent + 1, &mut supplied, &mut bound.guards)?;
        if !supplied.is_empty() {
            bound.code.code(indent, "} else {");
            bound.code.append(supplied);
        }
        bound.code.code(indent, "}");
        Ok(())
    }

    /// Code run when the argument was supplied.
    fn bind_supplied(
        &mut self,
        plan: &Plan<'_>,
        default: Option<&Literal>,
        indent: usize,
        out: &mut EmissionBuffer,
        guards: &mut Vec<(String, ArgumentGuard)>,
    ) -> Result<()> {
        let decl = plan.decl;

        if let Some(class) = &decl.cast {
            let accepts_null = default.is_some_and(Literal::is_null);
            let guard = ArgumentGuard::instance_of(&decl.name, &plan.slot, class, accepts_null);
            emit_guard(guard, indent, out, guards);
        }

        if !plan.ty.has_param_slot() {
            if plan.separate {
                self.separate(&plan.slot, indent, out);
            }
            return Ok(());
        }

        if decl.mandatory {
            let tag = BoxTag::for_type(plan.ty).ok_or_else(|| unsupported(decl, plan.ty))?;
            let guard = ArgumentGuard::strict(&decl.name, &plan.slot, plan.ty, tag);
            emit_guard(guard, indent, out, guards);
        }
        let (line, allocates) = if decl.mandatory {
            unbox(&decl.name, plan.ty, &plan.slot)
        } else {
            coerce(&decl.name, plan.ty, &plan.slot)
        }
        .ok_or_else(|| unsupported(decl, plan.ty))?;
        if allocates {
            self.growth.request();
        }
        out.code(indent, line);

        // The converted local shares storage with the argument.
        if plan.separate {
            let target = self
                .symbols
                .get(&decl.name)
                .map(|local| local.boxed_ref())
                .ok_or_else(|| internal(decl))?;
            self.separate(&target, indent, out);
        }
        Ok(())
    }

    /// Separates the zval the body will write through: the argument itself
    /// for polymorphic parameters, the converted local otherwise.
    fn separate(&mut self, target: &str, indent: usize, out: &mut EmissionBuffer) {
        out.code(indent, format!("ZEPHIR_SEPARATE_PARAM({target});"));
        self.growth.request();
    }

    fn consult_inference(&self, decl: &ParameterDecl, bound: &mut BoundParameters) {
        if decl.ty.is_some() || decl.cast.is_some() {
            return;
        }
        let Some(inferred) = self.inference.and_then(|t| t.inferred_type_of(&decl.name)) else {
            return;
        };
        log::debug!(
            "inference proposes {} for parameter '{}'; keeping boxed binding",
            inferred,
            decl.name
        );
        bound.inferred.push((decl.name.clone(), inferred));
    }
}

fn emit_guard(
    guard: ArgumentGuard,
    indent: usize,
    out: &mut EmissionBuffer,
    guards: &mut Vec<(String, ArgumentGuard)>,
) {
    guard.emit(indent, out);
    guards.push((guard.error().parameter().to_string(), guard));
}

/// Conversion after a passed strict check.
fn unbox(name: &str, ty: LowLevelType, slot: &str) -> Option<(String, bool)> {
    let plain = |expr: String| Some((format!("{name} = {expr};"), false));
    match ty {
        LowLevelType::Int | LowLevelType::Long => plain(format!("Z_LVAL_P({slot})")),
        LowLevelType::UInt | LowLevelType::ULong | LowLevelType::Char | LowLevelType::UChar => {
            let c_type = ty.c_type()?;
            plain(format!("({c_type}) Z_LVAL_P({slot})"))
        }
        LowLevelType::Double => plain(format!("Z_DVAL_P({slot})")),
        LowLevelType::Bool => plain(format!("(Z_TYPE_P({slot}) == IS_TRUE)")),
        LowLevelType::String => Some((format!("zephir_get_strval(&{name}, {slot});"), true)),
        LowLevelType::Array => Some((format!("ZEPHIR_OBS_COPY_OR_DUP(&{name}, {slot});"), true)),
        _ => None,
    }
}

/// Unchecked conversion of a non-mandatory parameter.
fn coerce(name: &str, ty: LowLevelType, slot: &str) -> Option<(String, bool)> {
    let plain = |func: &str| Some((format!("{name} = {func}({slot});"), false));
    if ty.is_integer() {
        return match ty {
            LowLevelType::Char | LowLevelType::UChar => plain("zephir_get_charval"),
            _ => plain("zephir_get_intval"),
        };
    }
    match ty {
        LowLevelType::Double => plain("zephir_get_doubleval"),
        LowLevelType::Bool => plain("zephir_get_boolval"),
        LowLevelType::String => Some((format!("zephir_get_strval(&{name}, {slot});"), true)),
        LowLevelType::Array => Some((format!("zephir_get_arrval(&{name}, {slot});"), true)),
        _ => None,
    }
}

fn unsupported(decl: &ParameterDecl, ty: LowLevelType) -> CompilationError {
    CompilationError::UnsupportedParameterType {
        parameter: decl.name.clone(),
        ty,
        span: decl.span,
    }
}

fn internal(decl: &ParameterDecl) -> CompilationError {
    CompilationError::Internal {
        message: format!("parameter '{}' vanished from the symbol table", decl.name),
    }
}
