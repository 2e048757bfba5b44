//! Registration surface for the container
//!
//! [`RegistryBuilder`] collects qualifier-keyed [`NodeSet`]s and hands them
//! to the resolver. It is the single inbound boundary of the core: whatever
//! discovers injectable types (hand-written wiring, a code generator, a
//! compile-time slice) ends up calling one of the registration methods
//! below.

use std::collections::HashMap;

use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::debug;

use bodkin_domain::{Blueprint, Error, Injectable, NodeSet, Qualifier, Result};

use crate::registry::Registry;
use crate::resolver;

/// Single-use builder for a [`Registry`].
///
/// Registration order matters twice: the resolver scans qualifiers in
/// first-registration order, and within one qualifier candidate recipes run
/// in the order they were added. Re-registering a qualifier replaces its
/// candidates but keeps its original scan position.
///
/// ## Example
///
/// ```rust
/// use bodkin::{Blueprint, Recipe, RegistryBuilder};
///
/// struct Limits {
///     max_connections: u32,
/// }
///
/// let registry = RegistryBuilder::new()
///     .register(
///         Blueprint::<Limits>::qualified("limits")
///             .with_recipe(Recipe::new(|_| Ok(Limits { max_connections: 64 }))),
///     )
///     .build()
///     .unwrap();
///
/// assert!(registry.has_qualifier("limits"));
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    pending: IndexMap<Qualifier, NodeSet>,
}

impl RegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            pending: IndexMap::new(),
        }
    }

    /// Register `T` under the qualifier its blueprint names.
    ///
    /// For a blueprint built with [`Blueprint::new`] that is the canonical
    /// type name of `T`, which makes the instance reachable by consumers
    /// declaring [`Recipe::needs_type`](bodkin_domain::Recipe::needs_type).
    pub fn with_type<T: Injectable>(self) -> Self {
        self.register(T::blueprint())
    }

    /// Register `T` under an explicit qualifier, overriding its blueprint's
    /// own key
    pub fn with_type_qualified<T: Injectable>(self, qualifier: impl Into<Qualifier>) -> Self {
        self.register(T::blueprint().with_qualifier(qualifier))
    }

    /// Register an explicit blueprint.
    ///
    /// A second registration for the same qualifier replaces the earlier
    /// candidate set entirely; it does not merge. The qualifier keeps the
    /// scan position of its first registration.
    pub fn register<C: Send + Sync + 'static>(mut self, blueprint: Blueprint<C>) -> Self {
        let set = NodeSet::derive(blueprint);
        debug!(
            qualifier = %set.qualifier(),
            type_name = set.type_name(),
            candidates = set.len(),
            "registered construction recipes"
        );
        self.pending.insert(set.qualifier().clone(), set);
        self
    }

    /// Accumulate a blueprint's candidates into the qualifier's existing
    /// set instead of replacing it.
    ///
    /// Creates the set when the qualifier is new. Candidates equal to one
    /// already present (same qualifier, same dependency keys) are dropped.
    pub fn merge<C: Send + Sync + 'static>(mut self, blueprint: Blueprint<C>) -> Self {
        let set = NodeSet::derive(blueprint);
        debug!(
            qualifier = %set.qualifier(),
            type_name = set.type_name(),
            candidates = set.len(),
            "merged construction recipes"
        );
        match self.pending.entry(set.qualifier().clone()) {
            Entry::Occupied(mut slot) => slot.get_mut().merge(set),
            Entry::Vacant(slot) => {
                slot.insert(set);
            }
        }
        self
    }

    /// Number of registered qualifiers
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing has been registered yet
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Resolve the graph and freeze the result.
    ///
    /// Fails with [`Error::NoConstructionPath`] if any registered qualifier
    /// ended up with zero candidate recipes, with
    /// [`Error::UnresolvableGraph`] when a resolution pass makes no
    /// progress, and with [`Error::Construction`] /
    /// [`Error::MemberAssignment`] when a recipe or member setter fails.
    /// There is no partial registry on failure; the builder is consumed
    /// either way.
    pub fn build(self) -> Result<Registry> {
        for set in self.pending.values() {
            if set.is_empty() {
                return Err(Error::no_construction_path(set.type_name()));
            }
        }

        // The frozen registry keeps the full candidate mapping so the
        // on-demand path can prefer build-time registrations.
        let recipes: HashMap<String, NodeSet> = self
            .pending
            .iter()
            .map(|(qualifier, set)| (qualifier.as_str().to_owned(), set.clone()))
            .collect();

        let resolution = resolver::resolve(self.pending)?;
        Ok(Registry::freeze(resolution, recipes))
    }
}
