//! Process-wide boxed singleton constants.
//!
//! The target runtime exposes one immutable boxed `null`, `true` and `false`.
//! Generated code may point a boxed variable at one of these instead of
//! allocating, provided the variable is never mutated in place afterwards.
//!
//! The registry is built once on first use and never torn down. Compilation
//! units receive it by reference so tests can substitute their own.

use lazy_static::lazy_static;

/// Which singleton a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SingletonKind {
    Null,
    True,
    False,
}

impl SingletonKind {
    pub fn for_bool(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

/// Names of the shared boxed constants in the generated translation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConstants {
    null: String,
    true_value: String,
    false_value: String,
}

impl RuntimeConstants {
    pub fn new(
        null: impl Into<String>,
        true_value: impl Into<String>,
        false_value: impl Into<String>,
    ) -> Self {
        Self {
            null: null.into(),
            true_value: true_value.into(),
            false_value: false_value.into(),
        }
    }

    /// The registry shared by all compilation units in the process.
    pub fn global() -> &'static RuntimeConstants {
        &GLOBAL_CONSTANTS
    }

    /// C symbol of the given singleton.
    pub fn symbol(&self, kind: SingletonKind) -> &str {
        match kind {
            SingletonKind::Null => &self.null,
            SingletonKind::True => &self.true_value,
            SingletonKind::False => &self.false_value,
        }
    }

    /// Address-of expression suitable for rebinding a `zval *`.
    pub fn address_of(&self, kind: SingletonKind) -> String {
        format!("&{}", self.symbol(kind))
    }
}

impl Default for RuntimeConstants {
    fn default() -> Self {
        Self::new("__$null", "__$true", "__$false")
    }
}

lazy_static! {
    static ref GLOBAL_CONSTANTS: RuntimeConstants = {
        log::trace!("initializing runtime constant registry");
        RuntimeConstants::default()
    };
}
