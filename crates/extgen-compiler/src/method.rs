//! Method compilation unit.
//!
//! [`MethodCompiler`] drives the compilation of one method from its
//! declaration to finalized C:
//!
//! - Validating modifiers
//! - Binding parameters into a fresh Variable Model
//! - Compiling the body through a [`BodyCompiler`]
//! - Handling the implicit exit
//! - Seeding boxed locals that carry a default value
//! - Rendering declarations and assembling the method
//! - Resolving every frame placeholder in one finalize pass
//!
//! Each call to [`MethodCompiler::compile`] owns its symbol table, emission
//! buffer and growth flag; nothing is shared between methods except the
//! read-only runtime constants.
//!
//! # Example
//!
//! ```ignore
//! let ctx = CompileContext::new("App\\Greeter");
//! let decl = MethodDecl::new("hello").with_param(ParameterDecl::new("name"));
//! let mut diagnostics = Diagnostics::new();
//! let method = MethodCompiler::new(&ctx).compile(&decl, &mut EmptyBody, &mut diagnostics)?;
//! println!("{}", method.code);
//! ```

use std::fmt;

use extgen_core::{
    ClassName, CompilationError, Diagnostics, LowLevelType, MethodDecl, MethodKind, Modifiers,
    RuntimeConstants, Visibility,
};

use crate::Result;
use crate::body::{BodyCompiler, BodyContext};
use crate::declarations::DeclarationEmitter;
use crate::defaults::DefaultSynthesizer;
use crate::emit::{EmissionBuffer, FrameToken, StackGrowth};
use crate::mutation::{MutationProvider, OptimizationFacts};
use crate::options::CompilerOptions;
use crate::params::{ArgumentGuard, ParameterBinder};
use crate::symbols::SymbolTable;

/// Everything a method compilation reads but does not own.
#[derive(Debug, Clone)]
pub struct CompileContext<'c> {
    /// The class the method belongs to.
    pub class: ClassName,
    pub options: CompilerOptions,
    /// Facts the optimization passes produced for this method.
    pub facts: OptimizationFacts,
    pub constants: &'c RuntimeConstants,
}

impl CompileContext<'static> {
    /// Context with default options and the process-wide constants.
    pub fn new(class: impl Into<ClassName>) -> Self {
        Self {
            class: class.into(),
            options: CompilerOptions::default(),
            facts: OptimizationFacts::default(),
            constants: RuntimeConstants::global(),
        }
    }
}

impl<'c> CompileContext<'c> {
    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_facts(mut self, facts: OptimizationFacts) -> Self {
        self.facts = facts;
        self
    }

    /// Use a different constants registry, e.g. one built for a test.
    pub fn with_constants<'n>(self, constants: &'n RuntimeConstants) -> CompileContext<'n> {
        CompileContext {
            class: self.class,
            options: self.options,
            facts: self.facts,
            constants,
        }
    }
}

/// The method-table registration line of a compiled method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodEntry {
    pub class_prefix: String,
    pub name: String,
    pub arginfo: String,
    pub flags: String,
}

impl MethodEntry {
    fn new(class: &ClassName, decl: &MethodDecl) -> Self {
        let class_prefix = class.c_prefix();
        Self {
            arginfo: format!(
                "arginfo_{}_{}",
                class_prefix.to_ascii_lowercase(),
                decl.name.to_ascii_lowercase()
            ),
            class_prefix,
            name: decl.name.clone(),
            flags: access_flags(decl),
        }
    }
}

impl fmt::Display for MethodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PHP_ME({}, {}, {}, {})",
            self.class_prefix, self.name, self.arginfo, self.flags
        )
    }
}

/// A finalized method.
#[derive(Debug, Clone)]
pub struct CompiledMethod {
    pub name: String,
    /// The complete `PHP_METHOD` definition.
    pub code: String,
    /// Whether the managed-frame rendering was chosen.
    pub stack_grown: bool,
    pub required: usize,
    pub optional: usize,
    /// Parameters separated from the caller's storage.
    pub separated: Vec<String>,
    /// Runtime argument checks, keyed by parameter name.
    pub guards: Vec<(String, ArgumentGuard)>,
    /// Native types the inference pass proposed for untyped parameters.
    pub inferred_promotions: Vec<(String, LowLevelType)>,
    pub entry: MethodEntry,
}

/// Compiles methods against one [`CompileContext`].
pub struct MethodCompiler<'a, 'c> {
    ctx: &'a CompileContext<'c>,
}

impl<'a, 'c> MethodCompiler<'a, 'c> {
    pub fn new(ctx: &'a CompileContext<'c>) -> Self {
        Self { ctx }
    }

    /// Compile `decl` with `body` generating its statements.
    ///
    /// Unused-variable findings go to `diagnostics`; any error aborts the
    /// whole method.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(
        &self,
        decl: &MethodDecl,
        body: &mut dyn BodyCompiler,
        diagnostics: &mut Diagnostics,
    ) -> Result<CompiledMethod> {
        log::debug!("compiling method {}::{}", self.ctx.class, decl.name);
        validate_modifiers(decl)?;

        let options = &self.ctx.options;
        let mutations = self.ctx.facts.mutation_provider(options);
        let synthesizer = DefaultSynthesizer::new(self.ctx.constants);

        let mut symbols = SymbolTable::new();
        let mut growth = StackGrowth::new();

        let bound = ParameterBinder::new(&mut symbols, &mut growth, mutations, synthesizer)
            .with_inference(self.ctx.facts.inference(options))
            .bind(&decl.parameters)?;

        let mut context = BodyContext::new(&decl.name, &mut symbols, &mut growth);
        let outcome = body.compile_body(&mut context)?;
        let mut statements = context.into_buffer();

        if outcome.falls_through() {
            if decl.has_return_types() {
                return Err(CompilationError::MissingReturnOnTypedMethod {
                    method: decl.name.clone(),
                    span: decl.span,
                });
            }
            statements.frame(1, FrameToken::Restore);
        }

        let seeded = seed_boxed_defaults(&symbols, &mut growth, synthesizer, mutations)?;
        let declarations = DeclarationEmitter::new(&symbols).emit()?;

        if options.report_unused {
            symbols.report_unused(&decl.name, diagnostics);
        }

        let mut out = EmissionBuffer::new();
        out.code(
            0,
            format!("PHP_METHOD({}, {}) {{", self.ctx.class.c_prefix(), decl.name),
        );
        out.code_lines(1, declarations.declarations.iter().cloned());
        if !decl.is_static() {
            out.code(1, "zval *this_ptr = getThis();");
        }
        if !declarations.declarations.is_empty() || !decl.is_static() {
            out.blank();
        }
        if !declarations.initializers.is_empty() {
            out.code_lines(1, declarations.initializers);
            out.blank();
        }

        out.frame(1, FrameToken::Acquire);
        if let Some(fetch) = bound.fetch {
            out.frame(1, fetch);
        }
        out.append(seeded);
        out.append(bound.code);
        out.append(statements);
        out.code(0, "}");

        let finalized = growth.finalize(out);
        log::debug!(
            "compiled method {}::{} ({} required, {} optional, frame: {})",
            self.ctx.class,
            decl.name,
            bound.required,
            bound.optional,
            finalized.grown
        );

        Ok(CompiledMethod {
            name: decl.name.clone(),
            code: finalized.code,
            stack_grown: finalized.grown,
            required: bound.required,
            optional: bound.optional,
            separated: bound.separated,
            guards: bound.guards,
            inferred_promotions: bound.inferred,
            entry: MethodEntry::new(&self.ctx.class, decl),
        })
    }
}

/// Compile one method with a fresh [`MethodCompiler`].
pub fn compile(
    decl: &MethodDecl,
    ctx: &CompileContext<'_>,
    body: &mut dyn BodyCompiler,
    diagnostics: &mut Diagnostics,
) -> Result<CompiledMethod> {
    MethodCompiler::new(ctx).compile(decl, body, diagnostics)
}

/// Reject modifier combinations the runtime cannot register.
pub fn validate_modifiers(decl: &MethodDecl) -> Result<()> {
    let modifiers = decl.modifiers;
    let conflict = |first, second| CompilationError::VisibilityConflict {
        method: decl.name.clone(),
        first,
        second,
        span: decl.span,
    };

    let visibilities: Vec<&'static str> = [
        (Modifiers::PUBLIC, "public"),
        (Modifiers::PROTECTED, "protected"),
        (Modifiers::PRIVATE, "private"),
    ]
    .into_iter()
    .filter(|(flag, _)| modifiers.contains(*flag))
    .map(|(_, name)| name)
    .collect();
    if let [first, second, ..] = visibilities[..] {
        return Err(conflict(first, second));
    }

    if modifiers.contains(Modifiers::ABSTRACT) {
        if modifiers.contains(Modifiers::FINAL) {
            return Err(conflict("abstract", "final"));
        }
        if modifiers.contains(Modifiers::PRIVATE) {
            return Err(conflict("abstract", "private"));
        }
    }

    let role = match decl.kind {
        MethodKind::Regular => None,
        MethodKind::Constructor => Some("constructor"),
        MethodKind::Destructor => Some("destructor"),
    };
    if let Some(role) = role {
        if modifiers.contains(Modifiers::STATIC) {
            return Err(CompilationError::IllegalConstructorModifier {
                method: decl.name.clone(),
                role,
                modifier: "static",
                span: decl.span,
            });
        }
    }
    Ok(())
}

/// Runtime method-entry flags, e.g. `ZEND_ACC_PUBLIC | ZEND_ACC_STATIC`.
pub fn access_flags(decl: &MethodDecl) -> String {
    let modifiers = decl.modifiers;
    let mut flags = vec![match decl.visibility() {
        Visibility::Public => "ZEND_ACC_PUBLIC",
        Visibility::Protected => "ZEND_ACC_PROTECTED",
        Visibility::Private => "ZEND_ACC_PRIVATE",
    }];
    for (flag, name) in [
        (Modifiers::STATIC, "ZEND_ACC_STATIC"),
        (Modifiers::FINAL, "ZEND_ACC_FINAL"),
        (Modifiers::ABSTRACT, "ZEND_ACC_ABSTRACT"),
        (Modifiers::DEPRECATED, "ZEND_ACC_DEPRECATED"),
    ] {
        if modifiers.contains(flag) {
            flags.push(name);
        }
    }
    if decl.is_constructor() {
        flags.push("ZEND_ACC_CTOR");
    }
    flags.join(" | ")
}

/// Initialization code for boxed locals carrying a default value; they never
/// get a C initializer.
fn seed_boxed_defaults(
    symbols: &SymbolTable,
    growth: &mut StackGrowth,
    synthesizer: DefaultSynthesizer<'_>,
    mutations: &dyn MutationProvider,
) -> Result<EmissionBuffer> {
    let mut out = EmissionBuffer::new();
    for var in symbols.iter().filter(|v| v.ty().is_boxed() && !v.is_external()) {
        let Some(literal) = var.default_init_value() else {
            continue;
        };
        let init = synthesizer.synthesize(var, literal, mutations.estimate(var.name()), var.span())?;
        if init.allocates {
            growth.request();
        }
        out.code_lines(1, init.lines);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyOutcome, EmptyBody, StatementKind};
    use extgen_core::{Literal, ParameterDecl, ReturnHint, Span};

    fn compile_empty(decl: &MethodDecl) -> Result<CompiledMethod> {
        let ctx = CompileContext::new("App\\Greeter");
        compile(decl, &ctx, &mut EmptyBody, &mut Diagnostics::new())
    }

    #[test]
    fn empty_method_has_no_frame() {
        let method = compile_empty(&MethodDecl::new("noop")).unwrap();
        assert!(!method.stack_grown);
        assert_eq!(
            method.code,
            "PHP_METHOD(App_Greeter, noop) {\n\tzval *this_ptr = getThis();\n\n}\n"
        );
    }

    #[test]
    fn static_method_has_no_receiver() {
        let decl = MethodDecl::new("make").with_modifiers(Modifiers::PUBLIC | Modifiers::STATIC);
        let method = compile_empty(&decl).unwrap();
        assert_eq!(method.code, "PHP_METHOD(App_Greeter, make) {\n}\n");
        assert_eq!(method.entry.flags, "ZEND_ACC_PUBLIC | ZEND_ACC_STATIC");
    }

    #[test]
    fn typed_method_must_return() {
        let decl = MethodDecl::new("count").with_return_hint(ReturnHint::Type(LowLevelType::Int));
        let err = compile_empty(&decl).unwrap_err();
        assert!(matches!(err, CompilationError::MissingReturnOnTypedMethod { .. }));
    }

    #[test]
    fn void_hint_does_not_require_return() {
        let decl = MethodDecl::new("run").with_return_hint(ReturnHint::Void);
        assert!(compile_empty(&decl).is_ok());
    }

    #[test]
    fn conflicting_visibility() {
        let decl = MethodDecl::new("f").with_modifiers(Modifiers::PUBLIC | Modifiers::PRIVATE);
        let err = validate_modifiers(&decl).unwrap_err();
        assert_eq!(
            err,
            CompilationError::VisibilityConflict {
                method: "f".into(),
                first: "public",
                second: "private",
                span: Span::default(),
            }
        );
    }

    #[test]
    fn abstract_cannot_be_final() {
        let decl = MethodDecl::new("f")
            .with_modifiers(Modifiers::PUBLIC | Modifiers::ABSTRACT | Modifiers::FINAL);
        assert!(matches!(
            validate_modifiers(&decl),
            Err(CompilationError::VisibilityConflict { first: "abstract", second: "final", .. })
        ));
    }

    #[test]
    fn static_constructor_is_illegal() {
        let decl = MethodDecl::new("__construct")
            .with_kind(MethodKind::Constructor)
            .with_modifiers(Modifiers::PUBLIC | Modifiers::STATIC);
        assert!(matches!(
            validate_modifiers(&decl),
            Err(CompilationError::IllegalConstructorModifier { role: "constructor", .. })
        ));
    }

    #[test]
    fn method_entry_line() {
        let decl = MethodDecl::new("__construct").with_kind(MethodKind::Constructor);
        let ctx = CompileContext::new("App\\Greeter");
        let method = compile(&decl, &ctx, &mut EmptyBody, &mut Diagnostics::new()).unwrap();
        assert_eq!(
            method.entry.to_string(),
            "PHP_ME(App_Greeter, __construct, arginfo_app_greeter___construct, ZEND_ACC_PUBLIC | ZEND_ACC_CTOR)"
        );
    }

    struct SeededLocal;

    impl BodyCompiler for SeededLocal {
        fn compile_body(&mut self, body: &mut BodyContext<'_>) -> Result<BodyOutcome> {
            body.declare_local("greeting", LowLevelType::Variable, Span::default())?;
            body.symbols_mut()
                .set_default_init_value("greeting", Literal::string("hi"))?;
            body.record_use("greeting")?;
            body.emit_return(0, crate::emit::ReturnMacro::Ctor("greeting".into()));
            Ok(BodyOutcome::ending_with(StatementKind::Return))
        }
    }

    #[test]
    fn boxed_local_default_is_synthesized_after_acquire() {
        let ctx = CompileContext::new("App\\Greeter");
        let decl = MethodDecl::new("greet");
        let method = compile(&decl, &ctx, &mut SeededLocal, &mut Diagnostics::new()).unwrap();

        assert!(method.stack_grown);
        let acquire = method.code.find("ZEPHIR_MM_GROW();").unwrap();
        let seed = method.code.find("ZVAL_STRING(greeting, \"hi\");").unwrap();
        assert!(acquire < seed);
        assert!(method.code.contains("zval *greeting;"));
        assert!(method.code.contains("RETURN_MM_CTOR(greeting);"));
    }

    #[test]
    fn unused_parameter_is_reported_as_info() {
        let decl = MethodDecl::new("f").with_param(ParameterDecl::new("a"));
        let ctx = CompileContext::new("C");
        let mut diagnostics = Diagnostics::new();
        compile(&decl, &ctx, &mut EmptyBody, &mut diagnostics).unwrap();

        assert_eq!(diagnostics.warning_count(), 0);
        assert_eq!(diagnostics.infos().count(), 1);
    }

    #[test]
    fn unused_reports_can_be_disabled() {
        let decl = MethodDecl::new("f").with_param(ParameterDecl::new("a"));
        let ctx = CompileContext::new("C")
            .with_options(CompilerOptions::new().without_unused_reports());
        let mut diagnostics = Diagnostics::new();
        compile(&decl, &ctx, &mut EmptyBody, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());
    }
}
