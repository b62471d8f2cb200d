//! Deterministic identity for nominal class types.
//!
//! Class-cast constraints on parameters and object variables are compared by
//! [`TypeHash`], computed from the fully qualified class name with XXHash64.
//! Two spellings of the same name always hash identically, so constraint sets
//! never need a name-to-id registry.

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain marker mixed into class-name hashes.
const CLASS_DOMAIN: u64 = 0x2fac10b63a6cc57c;

/// A 64-bit hash identifying a nominal class.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Hash a fully qualified class name.
    ///
    /// Leading namespace separators are ignored and the comparison is
    /// case-insensitive, matching how the runtime resolves class names.
    pub fn from_name(name: &str) -> Self {
        let normalized = name.trim_start_matches('\\').to_ascii_lowercase();
        TypeHash(CLASS_DOMAIN ^ xxh64(normalized.as_bytes(), 0))
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

/// A class name as written in the source, together with its hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassName {
    name: String,
    hash: TypeHash,
}

impl ClassName {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let hash = TypeHash::from_name(&name);
        Self { name, hash }
    }

    /// The name as written (namespace separators included).
    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn hash(&self) -> TypeHash {
        self.hash
    }

    /// The C identifier of the class entry global, e.g. `Foo\Bar` becomes
    /// `foo_bar_ce`.
    pub fn class_entry(&self) -> String {
        let mut entry = self
            .name
            .trim_start_matches('\\')
            .replace('\\', "_")
            .to_ascii_lowercase();
        entry.push_str("_ce");
        entry
    }

    /// The C-level prefix used in `PHP_METHOD`, e.g. `Foo\Bar` becomes `Foo_Bar`.
    pub fn c_prefix(&self) -> String {
        self.name.trim_start_matches('\\').replace('\\', "_")
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for ClassName {
    fn from(name: &str) -> Self {
        ClassName::new(name)
    }
}
