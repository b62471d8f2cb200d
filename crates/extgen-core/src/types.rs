//! The closed set of low-level types a variable may be compiled to.

use std::fmt;
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Native representation of a compiled variable.
///
/// The ordinal (via `u8::from`) is the order in which declaration groups are
/// rendered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u8)]
pub enum LowLevelType {
    Int = 0,
    UInt,
    Long,
    ULong,
    Char,
    UChar,
    Bool,
    Double,
    /// String held in boxed storage.
    String,
    /// Array held in boxed storage.
    Array,
    /// Generic boxed value.
    Variable,
    /// Generic boxed value declared as `mixed`.
    Mixed,
    Object,
    Callable,
    Resource,
    /// `zend_class_entry *`
    ClassEntry,
    /// `zephir_fcall_cache_entry *`
    FcallCache,
    /// `HashTable *`
    HashTable,
    /// `HashPosition`
    HashPosition,
    /// `zend_object_iterator *`
    ObjectIterator,
    /// No storage; only meaningful as a return hint.
    Void,
    /// A type that has not been resolved yet.
    Unknown,
}

impl LowLevelType {
    /// Integer family: every signed/unsigned width and the char types.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int | Self::UInt | Self::Long | Self::ULong | Self::Char | Self::UChar
        )
    }

    /// Types stored in a boxed `zval`.
    pub fn is_boxed(self) -> bool {
        matches!(
            self,
            Self::String
                | Self::Array
                | Self::Variable
                | Self::Mixed
                | Self::Object
                | Self::Callable
                | Self::Resource
        )
    }

    /// Boxed kinds that accept any incoming value without conversion.
    pub fn is_polymorphic(self) -> bool {
        matches!(
            self,
            Self::Variable | Self::Mixed | Self::Object | Self::Callable | Self::Resource
        )
    }

    /// Runtime-internal pointer types that only the body compiler creates.
    pub fn is_internal(self) -> bool {
        matches!(
            self,
            Self::ClassEntry
                | Self::FcallCache
                | Self::HashTable
                | Self::HashPosition
                | Self::ObjectIterator
        )
    }

    /// Whether a parameter of this type receives the raw value in an
    /// auxiliary `<name>_param` slot before conversion.
    pub fn has_param_slot(self) -> bool {
        self.is_integer()
            || matches!(self, Self::Bool | Self::Double | Self::String | Self::Array)
    }

    /// C base type used in declarations, `None` for types that cannot be declared.
    pub fn c_type(self) -> Option<&'static str> {
        let c = match self {
            Self::Int => "zend_long",
            Self::UInt => "zend_ulong",
            Self::Long => "long",
            Self::ULong => "unsigned long",
            Self::Char => "char",
            Self::UChar => "unsigned char",
            Self::Bool => "zend_bool",
            Self::Double => "double",
            Self::String
            | Self::Array
            | Self::Variable
            | Self::Mixed
            | Self::Object
            | Self::Callable
            | Self::Resource => "zval",
            Self::ClassEntry => "zend_class_entry",
            Self::FcallCache => "zephir_fcall_cache_entry",
            Self::HashTable => "HashTable",
            Self::HashPosition => "HashPosition",
            Self::ObjectIterator => "zend_object_iterator",
            Self::Void | Self::Unknown => return None,
        };
        Some(c)
    }

    /// Internal types always declared behind one pointer.
    pub fn is_pointer_type(self) -> bool {
        matches!(
            self,
            Self::ClassEntry | Self::FcallCache | Self::HashTable | Self::ObjectIterator
        )
    }

    /// The name used in source code and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Long => "long",
            Self::ULong => "ulong",
            Self::Char => "char",
            Self::UChar => "uchar",
            Self::Bool => "bool",
            Self::Double => "double",
            Self::String => "string",
            Self::Array => "array",
            Self::Variable => "variable",
            Self::Mixed => "mixed",
            Self::Object => "object",
            Self::Callable => "callable",
            Self::Resource => "resource",
            Self::ClassEntry => "zend_class_entry",
            Self::FcallCache => "zephir_fcall_cache_entry",
            Self::HashTable => "HashTable",
            Self::HashPosition => "HashPosition",
            Self::ObjectIterator => "zend_object_iterator",
            Self::Void => "void",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LowLevelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a source type name has no low-level counterpart.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type name '{0}'")]
pub struct UnknownTypeName(pub String);

impl FromStr for LowLevelType {
    type Err = UnknownTypeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s {
            "int" => Self::Int,
            "uint" => Self::UInt,
            "long" => Self::Long,
            "ulong" => Self::ULong,
            "char" => Self::Char,
            "uchar" => Self::UChar,
            "bool" | "boolean" => Self::Bool,
            "double" | "float" => Self::Double,
            "string" | "istring" => Self::String,
            "array" => Self::Array,
            "var" | "variable" => Self::Variable,
            "mixed" => Self::Mixed,
            "object" => Self::Object,
            "callable" => Self::Callable,
            "resource" => Self::Resource,
            "void" => Self::Void,
            other => return Err(UnknownTypeName(other.to_string())),
        };
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polymorphic_types_have_no_param_slot() {
        for ty in [
            LowLevelType::Variable,
            LowLevelType::Mixed,
            LowLevelType::Object,
            LowLevelType::Callable,
            LowLevelType::Resource,
        ] {
            assert!(ty.is_polymorphic());
            assert!(!ty.has_param_slot(), "{ty} should bind directly");
        }
        assert!(LowLevelType::String.has_param_slot());
        assert!(LowLevelType::Int.has_param_slot());
    }

    #[test]
    fn parse_aliases() {
        assert_eq!("float".parse::<LowLevelType>(), Ok(LowLevelType::Double));
        assert_eq!("var".parse::<LowLevelType>(), Ok(LowLevelType::Variable));
        assert!("number".parse::<LowLevelType>().is_err());
    }

    #[test]
    fn ordinal_round_trip() {
        let ordinal: u8 = LowLevelType::Array.into();
        assert_eq!(LowLevelType::try_from(ordinal).ok(), Some(LowLevelType::Array));
        assert!(LowLevelType::try_from(200u8).is_err());
    }

    #[test]
    fn void_and_unknown_are_not_declarable() {
        assert!(LowLevelType::Void.c_type().is_none());
        assert!(LowLevelType::Unknown.c_type().is_none());
        assert_eq!(LowLevelType::HashTable.c_type(), Some("HashTable"));
    }
}
