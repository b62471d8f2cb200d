//! Method and parameter declarations as handed over by the front end.
//!
//! These are read-only inputs to the method compiler. Optionality is encoded
//! in [`ParamKind`] rather than by the presence of a default field, so binding
//! code matches on the kind instead of probing for keys.

use bitflags::bitflags;

use crate::{ClassName, Literal, LowLevelType, Span};

bitflags! {
    /// Modifiers written on a method declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u16 {
        const PUBLIC     = 1 << 0;
        const PROTECTED  = 1 << 1;
        const PRIVATE    = 1 << 2;
        const STATIC     = 1 << 3;
        const FINAL      = 1 << 4;
        const ABSTRACT   = 1 << 5;
        const DEPRECATED = 1 << 6;
    }
}

/// Resolved member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// Special roles a method can play in its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MethodKind {
    #[default]
    Regular,
    Constructor,
    Destructor,
}

/// A declared return-type hint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnHint {
    Type(LowLevelType),
    Class(ClassName),
    Void,
}

/// Whether a parameter must be supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Required,
    Optional { default: Literal },
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDecl {
    pub name: String,
    /// Declared low-level type; `None` binds as a generic boxed value.
    pub ty: Option<LowLevelType>,
    /// Class constraint (`Foo name`), accepting instances of `Foo`.
    pub cast: Option<ClassName>,
    pub kind: ParamKind,
    /// Strict type checking instead of coercion.
    pub mandatory: bool,
    pub is_const: bool,
    pub span: Span,
}

impl ParameterDecl {
    /// A required, untyped parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            cast: None,
            kind: ParamKind::Required,
            mandatory: false,
            is_const: false,
            span: Span::default(),
        }
    }

    pub fn typed(name: impl Into<String>, ty: LowLevelType) -> Self {
        Self {
            ty: Some(ty),
            ..Self::new(name)
        }
    }

    pub fn with_default(mut self, default: Literal) -> Self {
        self.kind = ParamKind::Optional { default };
        self
    }

    pub fn with_cast(mut self, class: impl Into<ClassName>) -> Self {
        self.cast = Some(class.into());
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Low-level type the parameter binds to.
    pub fn effective_type(&self) -> LowLevelType {
        match (self.ty, &self.cast) {
            (Some(ty), _) => ty,
            (None, Some(_)) => LowLevelType::Object,
            (None, None) => LowLevelType::Variable,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.kind, ParamKind::Optional { .. })
    }

    pub fn default_value(&self) -> Option<&Literal> {
        match &self.kind {
            ParamKind::Required => None,
            ParamKind::Optional { default } => Some(default),
        }
    }
}

/// A method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    pub kind: MethodKind,
    pub modifiers: Modifiers,
    pub parameters: Vec<ParameterDecl>,
    pub return_hints: Vec<ReturnHint>,
    pub span: Span,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MethodKind::Regular,
            modifiers: Modifiers::PUBLIC,
            parameters: Vec::new(),
            return_hints: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn with_kind(mut self, kind: MethodKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_param(mut self, param: ParameterDecl) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_return_hint(mut self, hint: ReturnHint) -> Self {
        self.return_hints.push(hint);
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub fn number_of_parameters(&self) -> usize {
        self.parameters.len()
    }

    pub fn number_of_required_parameters(&self) -> usize {
        self.parameters.iter().filter(|p| !p.is_optional()).count()
    }

    pub fn number_of_optional_parameters(&self) -> usize {
        self.parameters.iter().filter(|p| p.is_optional()).count()
    }

    /// Whether a non-void return type is declared.
    pub fn has_return_types(&self) -> bool {
        self.return_hints
            .iter()
            .any(|hint| !matches!(hint, ReturnHint::Void))
    }

    pub fn is_void(&self) -> bool {
        self.return_hints.iter().any(|hint| matches!(hint, ReturnHint::Void))
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }

    /// Resolved visibility; an unmarked method is public.
    pub fn visibility(&self) -> Visibility {
        if self.modifiers.contains(Modifiers::PRIVATE) {
            Visibility::Private
        } else if self.modifiers.contains(Modifiers::PROTECTED) {
            Visibility::Protected
        } else {
            Visibility::Public
        }
    }
}
