//! Qualifier Value Object
//!
//! String keys identifying resolvable instances, and the canonical
//! type-name derivation used when no explicit key is given.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// The canonical dependency key for a type.
///
/// Constructor parameters and injectable members that carry no explicit
/// qualifier are keyed by the declared type's name, which is what this
/// returns. The same derivation backs [`Qualifier::of`], so a type
/// registered without an explicit qualifier is found by consumers that
/// depend on its type name.
pub fn key_of<T: ?Sized>() -> &'static str {
    std::any::type_name::<T>()
}

/// Value Object: Qualifier
///
/// An opaque string key uniquely identifying one resolvable instance
/// within a container.
///
/// ## Business Rules
///
/// - Two qualifiers are equal iff their strings are equal
/// - One qualifier maps to at most one resolved instance
/// - When no explicit key is chosen, the canonical qualifier for a type
///   is its `std::any::type_name`
///
/// ## Example
///
/// ```rust
/// use bodkin_domain::Qualifier;
///
/// let explicit = Qualifier::new("engine.primary");
/// let derived = Qualifier::of::<String>();
///
/// assert_eq!(explicit.as_str(), "engine.primary");
/// assert!(derived.as_str().contains("String"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Qualifier(String);

impl Qualifier {
    /// Create a qualifier from an explicit string key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The canonical type-derived qualifier for `T`
    pub fn of<T: ?Sized>() -> Self {
        Self(key_of::<T>().to_string())
    }

    /// The qualifier key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the qualifier, returning the owned key
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Qualifier {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for Qualifier {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl AsRef<str> for Qualifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Allows map lookups keyed by Qualifier to accept plain &str.
impl Borrow<str> for Qualifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}
