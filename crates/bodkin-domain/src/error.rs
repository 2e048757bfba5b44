//! Error handling types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::qualifier::Qualifier;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// One pending qualifier and the dependency keys it is still waiting for.
///
/// Collected into [`Error::UnresolvableGraph`] when a resolution pass makes
/// no progress. `missing` is sorted so reports are stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmetDependencies {
    /// The qualifier that could not be resolved
    pub qualifier: Qualifier,
    /// Dependency keys not present in the resolved set, sorted
    pub missing: Vec<String>,
}

impl UnmetDependencies {
    /// Create a report entry for one stuck qualifier
    pub fn new(qualifier: impl Into<Qualifier>, mut missing: Vec<String>) -> Self {
        missing.sort();
        missing.dedup();
        Self {
            qualifier: qualifier.into(),
            missing,
        }
    }
}

impl std::fmt::Display for UnmetDependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' (missing: {})", self.qualifier, self.missing.join(", "))
    }
}

fn fmt_pending(pending: &[UnmetDependencies]) -> String {
    pending
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Main error type for the Bodkin container
#[derive(Error, Debug)]
pub enum Error {
    /// A registered type has no usable construction recipe
    #[error("No construction path for type '{type_name}'")]
    NoConstructionPath {
        /// The type that cannot be built
        type_name: String,
    },

    /// A resolution pass made no progress while qualifiers were still pending
    #[error("Unresolvable dependency graph: {}", fmt_pending(.pending))]
    UnresolvableGraph {
        /// Every still-pending qualifier with its unmet dependency keys
        pending: Vec<UnmetDependencies>,
    },

    /// A typed lookup found no instance exposed as the requested type
    #[error("Unknown type: no instance exposed as '{type_name}'")]
    UnknownType {
        /// The requested type name
        type_name: String,
    },

    /// A qualifier lookup found no resolved instance
    #[error("Unknown qualifier: no instance resolved for '{qualifier}'")]
    UnknownQualifier {
        /// The requested qualifier key
        qualifier: String,
    },

    /// On-demand construction found candidates, but none with satisfied dependencies
    #[error("No satisfiable recipe for type '{type_name}': every candidate has unresolved dependencies")]
    NoSatisfiableRecipe {
        /// The type that could not be built on demand
        type_name: String,
    },

    /// A post-construction member could not be populated
    #[error("Failed to assign member '{member}' on type '{type_name}': {message}")]
    MemberAssignment {
        /// The type being populated
        type_name: String,
        /// The member that could not be set
        member: String,
        /// Description of the assignment failure
        message: String,
    },

    /// A construction recipe failed while the graph was being built
    #[error("Failed to construct instance for qualifier '{qualifier}'")]
    Construction {
        /// The qualifier being constructed
        qualifier: String,
        /// The underlying recipe failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A resolved qualifier exists but was never exposed as the requested type
    #[error("Type mismatch: qualifier '{qualifier}' is not exposed as '{expected}'")]
    TypeMismatch {
        /// The qualifier that was found
        qualifier: String,
        /// The type the caller asked for
        expected: String,
    },

    /// Generic string-based error, for ad-hoc recipe failures
    #[error("{0}")]
    String(String),
}

// Graph resolution error creation methods
impl Error {
    /// Create a no-construction-path error
    pub fn no_construction_path<S: Into<String>>(type_name: S) -> Self {
        Self::NoConstructionPath {
            type_name: type_name.into(),
        }
    }

    /// Create an unresolvable-graph error from the stuck qualifiers
    pub fn unresolvable(pending: Vec<UnmetDependencies>) -> Self {
        Self::UnresolvableGraph { pending }
    }

    /// Create a construction error wrapping a failed recipe
    pub fn construction<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        qualifier: S,
        source: E,
    ) -> Self {
        Self::Construction {
            qualifier: qualifier.into(),
            source: Box::new(source),
        }
    }
}

// Lookup error creation methods
impl Error {
    /// Create an unknown-type error
    pub fn unknown_type<S: Into<String>>(type_name: S) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    /// Create an unknown-qualifier error
    pub fn unknown_qualifier<S: Into<String>>(qualifier: S) -> Self {
        Self::UnknownQualifier {
            qualifier: qualifier.into(),
        }
    }

    /// Create a type-mismatch error
    pub fn type_mismatch<S: Into<String>, T: Into<String>>(qualifier: S, expected: T) -> Self {
        Self::TypeMismatch {
            qualifier: qualifier.into(),
            expected: expected.into(),
        }
    }
}

// On-demand construction error creation methods
impl Error {
    /// Create a no-satisfiable-recipe error
    pub fn no_satisfiable_recipe<S: Into<String>>(type_name: S) -> Self {
        Self::NoSatisfiableRecipe {
            type_name: type_name.into(),
        }
    }

    /// Create a member-assignment error
    pub fn member_assignment<S: Into<String>, M: Into<String>, D: Into<String>>(
        type_name: S,
        member: M,
        message: D,
    ) -> Self {
        Self::MemberAssignment {
            type_name: type_name.into(),
            member: member.into(),
            message: message.into(),
        }
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}
