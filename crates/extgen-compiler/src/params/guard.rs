//! Runtime argument checks.
//!
//! An [`ArgumentGuard`] describes which incoming values a parameter accepts.
//! It renders to the C check placed in the binding prologue and can be
//! evaluated against a [`ValueProbe`], which is how its accept/reject
//! behavior is verified without a C toolchain.

use extgen_core::{ArgumentTypeError, ClassName, LowLevelType, c_string_literal};

use crate::emit::{EmissionBuffer, FrameToken, ReturnMacro};

/// Boxed type tags checked by strict parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxTag {
    Long,
    Double,
    Bool,
    String,
    Array,
}

impl BoxTag {
    /// Tag a strictly typed parameter of `ty` must carry.
    pub fn for_type(ty: LowLevelType) -> Option<BoxTag> {
        if ty.is_integer() {
            return Some(BoxTag::Long);
        }
        match ty {
            LowLevelType::Double => Some(BoxTag::Double),
            LowLevelType::Bool => Some(BoxTag::Bool),
            LowLevelType::String => Some(BoxTag::String),
            LowLevelType::Array => Some(BoxTag::Array),
            _ => None,
        }
    }

    /// C condition that holds when `subject` does not carry this tag.
    fn mismatch(self, subject: &str) -> String {
        match self {
            BoxTag::Long => format!("Z_TYPE_P({subject}) != IS_LONG"),
            BoxTag::Double => format!("Z_TYPE_P({subject}) != IS_DOUBLE"),
            BoxTag::Bool => {
                format!("Z_TYPE_P({subject}) != IS_TRUE && Z_TYPE_P({subject}) != IS_FALSE")
            }
            BoxTag::String => format!("Z_TYPE_P({subject}) != IS_STRING"),
            BoxTag::Array => format!("Z_TYPE_P({subject}) != IS_ARRAY"),
        }
    }
}

/// What a guarded value must be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Tag(BoxTag),
    Instance(ClassName),
}

/// A stand-in for a runtime value, used to evaluate guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueProbe {
    Null,
    Long,
    Double,
    Bool(bool),
    String,
    Array,
    Object {
        class: ClassName,
        ancestors: Vec<ClassName>,
    },
}

impl ValueProbe {
    pub fn object(class: impl Into<ClassName>) -> Self {
        ValueProbe::Object {
            class: class.into(),
            ancestors: Vec::new(),
        }
    }

    fn is_instance_of(&self, target: &ClassName) -> bool {
        match self {
            ValueProbe::Object { class, ancestors } => {
                class.hash() == target.hash() || ancestors.iter().any(|a| a.hash() == target.hash())
            }
            _ => false,
        }
    }
}

/// A runtime check on one incoming argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentGuard {
    parameter: String,
    subject: String,
    expected: String,
    requirement: Requirement,
    accepts_null: bool,
}

impl ArgumentGuard {
    /// Strict type check of a mandatory parameter.
    pub fn strict(parameter: &str, subject: &str, ty: LowLevelType, tag: BoxTag) -> Self {
        Self {
            parameter: parameter.to_string(),
            subject: subject.to_string(),
            expected: ty.name().to_string(),
            requirement: Requirement::Tag(tag),
            accepts_null: false,
        }
    }

    /// Instance-of check of a class-cast parameter.
    pub fn instance_of(parameter: &str, subject: &str, class: &ClassName, accepts_null: bool) -> Self {
        Self {
            parameter: parameter.to_string(),
            subject: subject.to_string(),
            expected: class.as_str().trim_start_matches('\\').to_string(),
            requirement: Requirement::Instance(class.clone()),
            accepts_null,
        }
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn accepts_null(&self) -> bool {
        self.accepts_null
    }

    /// The error raised when the guard rejects a value.
    pub fn error(&self) -> ArgumentTypeError {
        match self.requirement {
            Requirement::Tag(_) => ArgumentTypeError::WrongType {
                parameter: self.parameter.clone(),
                expected: self.expected.clone(),
            },
            Requirement::Instance(_) => ArgumentTypeError::NotAnInstance {
                parameter: self.parameter.clone(),
                expected: self.expected.clone(),
            },
        }
    }

    /// Whether the generated check lets `value` through.
    pub fn accepts(&self, value: &ValueProbe) -> bool {
        if *value == ValueProbe::Null {
            return self.accepts_null;
        }
        match &self.requirement {
            Requirement::Tag(tag) => matches!(
                (tag, value),
                (BoxTag::Long, ValueProbe::Long)
                    | (BoxTag::Double, ValueProbe::Double)
                    | (BoxTag::Bool, ValueProbe::Bool(_))
                    | (BoxTag::String, ValueProbe::String)
                    | (BoxTag::Array, ValueProbe::Array)
            ),
            Requirement::Instance(class) => value.is_instance_of(class),
        }
    }

    /// C condition that holds when the argument must be rejected.
    pub fn rejection_condition(&self) -> String {
        let subject = &self.subject;
        let mismatch = match &self.requirement {
            Requirement::Tag(tag) => tag.mismatch(subject),
            Requirement::Instance(class) => {
                format!("!(zephir_instance_of_ev({subject}, {}))", class.class_entry())
            }
        };
        if self.accepts_null {
            format!("Z_TYPE_P({subject}) != IS_NULL && {mismatch}")
        } else {
            mismatch
        }
    }

    /// Emit the check: on rejection throw and leave before the body runs.
    pub fn emit(&self, indent: usize, out: &mut EmissionBuffer) {
        out.code(indent, format!("if (UNEXPECTED({})) {{", self.rejection_condition()));
        out.code(
            indent + 1,
            format!(
                "zephir_throw_exception_string(spl_ce_InvalidArgumentException, SL({}));",
                c_string_literal(&self.error().to_string())
            ),
        );
        out.frame(indent + 1, FrameToken::Return(ReturnMacro::Null));
        out.code(indent, "}");
    }
}
