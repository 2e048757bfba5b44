//! Frozen registry: lookups, on-demand creation, member injection
//!
//! The [`Registry`] is the terminal product of a successful build. Nothing
//! in it mutates after [`freeze`](Registry::freeze); every accessor is a
//! read, which is what makes unsynchronized concurrent use safe. The only
//! construction that happens after the freeze is the on-demand path
//! ([`Registry::create`] / [`Registry::creator`]), and that always yields a
//! fresh, unshared instance without touching the frozen mappings.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use bodkin_domain::{
    AnyInstance, Error, Injectable, NodeSet, Qualifier, RecipeNode, Resolved, ResolvedInstance,
    ResolvedMap, Result, key_of,
};

use crate::resolver::Resolution;

struct RegistryInner {
    by_qualifier: ResolvedMap,
    by_type: HashMap<TypeId, Arc<ResolvedInstance>>,
    order: Vec<(Qualifier, Arc<ResolvedInstance>)>,
    recipes: HashMap<String, NodeSet>,
}

/// Immutable result of a successful graph resolution.
///
/// Cloning is cheap (shared inner state) and every clone reads the same
/// frozen mappings.
///
/// ## Business Rules
///
/// - Each resolved qualifier maps to exactly one instance, forever
/// - An instance is reachable under its registration qualifier, under every
///   exposed `TypeId` and under every exposed type's name
/// - When registrations share an exposed type, the later-resolved instance
///   owns the shared keys (last one wins)
///
/// ## Example
///
/// ```rust
/// use bodkin::{Blueprint, Recipe, RegistryBuilder};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// struct FixedClock;
///
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 {
///         42
///     }
/// }
///
/// let registry = RegistryBuilder::new()
///     .register(
///         Blueprint::<FixedClock>::qualified("clock.fixed")
///             .with_recipe(Recipe::new(|_| Ok(FixedClock)))
///             .exposes::<dyn Clock>(|concrete| concrete),
///     )
///     .build()
///     .unwrap();
///
/// let by_type: Arc<dyn Clock> = registry.get::<dyn Clock>().unwrap();
/// let by_key: Arc<FixedClock> = registry.get_qualified("clock.fixed").unwrap();
/// assert_eq!(by_type.now(), by_key.now());
/// ```
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    pub(crate) fn freeze(resolution: Resolution, recipes: HashMap<String, NodeSet>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                by_qualifier: resolution.by_qualifier,
                by_type: resolution.by_type,
                order: resolution.order,
                recipes,
            }),
        }
    }

    /// The instance exposed as `T`, if any
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + 'static,
    {
        self.inner
            .by_type
            .get(&TypeId::of::<T>())
            .and_then(|record| record.get::<T>())
    }

    /// The instance under `qualifier` as type `T`.
    ///
    /// Absent qualifier and present-but-never-exposed-as-`T` both yield
    /// `None`; use [`Registry::try_get_qualified`] to distinguish them.
    pub fn get_qualified<T>(&self, qualifier: &str) -> Option<Arc<T>>
    where
        T: ?Sized + 'static,
    {
        self.inner
            .by_qualifier
            .get(qualifier)
            .and_then(|record| record.get::<T>())
    }

    /// The instance exposed as `T`, or [`Error::UnknownType`]
    pub fn try_get<T>(&self) -> Result<Arc<T>>
    where
        T: ?Sized + 'static,
    {
        self.get::<T>()
            .ok_or_else(|| Error::unknown_type(key_of::<T>()))
    }

    /// The instance under `qualifier` as type `T`.
    ///
    /// Fails with [`Error::UnknownQualifier`] when nothing is resolved
    /// under the key, and with [`Error::TypeMismatch`] when the resolved
    /// instance was never exposed as `T`.
    pub fn try_get_qualified<T>(&self, qualifier: &str) -> Result<Arc<T>>
    where
        T: ?Sized + 'static,
    {
        match self.inner.by_qualifier.get(qualifier) {
            None => Err(Error::unknown_qualifier(qualifier)),
            Some(record) => record
                .get::<T>()
                .ok_or_else(|| Error::type_mismatch(qualifier, key_of::<T>())),
        }
    }

    /// Whether any instance is exposed as `T`
    pub fn has<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.inner.by_type.contains_key(&TypeId::of::<T>())
    }

    /// Whether any instance is resolved under the qualifier
    pub fn has_qualifier(&self, qualifier: &str) -> bool {
        self.inner.by_qualifier.contains_key(qualifier)
    }

    /// Number of resolved registrations (not lookup keys)
    pub fn len(&self) -> usize {
        self.inner.order.len()
    }

    /// Whether the registry holds no instances
    pub fn is_empty(&self) -> bool {
        self.inner.order.is_empty()
    }

    /// Every key an instance can be looked up under: registration
    /// qualifiers plus exposed type names, in no particular order
    pub fn qualifiers(&self) -> impl Iterator<Item = &str> {
        self.inner.by_qualifier.keys().map(String::as_str)
    }

    /// Every constructed instance exactly once, as its type-erased concrete
    /// handle, in construction order.
    ///
    /// An instance reachable under several keys still appears a single time.
    pub fn instances(&self) -> impl Iterator<Item = AnyInstance> {
        self.inner
            .order
            .iter()
            .map(|(_, record)| Arc::clone(record.concrete()))
    }

    /// Construct a fresh `T` against the frozen registry.
    ///
    /// The instance is owned by the caller and is not recorded in the
    /// registry; repeated calls construct repeatedly. Works for types that
    /// were never registered at build time, as long as some candidate
    /// recipe has all its dependency keys already resolved.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use bodkin::{Blueprint, Injectable, Recipe, RegistryBuilder};
    ///
    /// struct Toggle {
    ///     enabled: bool,
    /// }
    ///
    /// impl Injectable for Toggle {
    ///     fn blueprint() -> Blueprint<Self> {
    ///         Blueprint::new().with_recipe(Recipe::new(|_| Ok(Toggle { enabled: true })))
    ///     }
    /// }
    ///
    /// let registry = RegistryBuilder::new().build().unwrap();
    /// let toggle = registry.create::<Toggle>().unwrap();
    /// assert!(toggle.enabled);
    /// ```
    pub fn create<T: Injectable>(&self) -> Result<T> {
        self.creator::<T>()?.create()
    }

    /// Select a recipe for `T` eagerly and return a reusable factory.
    ///
    /// Selection errors ([`Error::NoConstructionPath`] when no candidate
    /// exists, [`Error::NoSatisfiableRecipe`] when none has its
    /// dependencies resolved) surface here, not at
    /// [`Creator::create`] time.
    pub fn creator<T: Injectable>(&self) -> Result<Creator<T>> {
        let type_name = key_of::<T>();
        let node = self.select_node::<T>(type_name)?;
        debug!(
            type_name,
            qualifier = %node.qualifier(),
            "selected on-demand recipe"
        );
        Ok(Creator {
            node,
            inner: Arc::clone(&self.inner),
            _marker: PhantomData,
        })
    }

    /// Populate `instance`'s injectable members from the frozen registry.
    ///
    /// The members come from `T`'s blueprint; recipes and exposures are
    /// ignored on this path. Fails with [`Error::UnknownQualifier`] when a
    /// member's dependency key is not resolved and with
    /// [`Error::MemberAssignment`] when the resolved instance does not fit
    /// the member's declared type.
    pub fn inject<T: Injectable>(&self, instance: T) -> Result<T> {
        let mut instance = instance;
        let blueprint = T::blueprint();
        let resolved = Resolved::new(&self.inner.by_qualifier);
        for member in blueprint.members() {
            member.populate(&mut instance, resolved)?;
        }
        Ok(instance)
    }

    /// First candidate for `T` whose dependency keys are all resolved.
    ///
    /// A build-time registration under `T`'s type-name qualifier wins;
    /// otherwise a fresh candidate set is derived from the blueprint,
    /// re-keyed to the type name.
    fn select_node<T: Injectable>(&self, type_name: &'static str) -> Result<RecipeNode> {
        let derived;
        let set = match self.inner.recipes.get(type_name) {
            Some(registered) if !registered.is_empty() => registered,
            _ => {
                derived = NodeSet::derive(T::blueprint().with_qualifier(type_name));
                &derived
            }
        };

        if set.is_empty() {
            return Err(Error::no_construction_path(type_name));
        }

        let resolved = Resolved::new(&self.inner.by_qualifier);
        set.nodes()
            .iter()
            .find(|node| node.is_satisfied(resolved))
            .cloned()
            .ok_or_else(|| Error::no_satisfiable_recipe(type_name))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("instances", &self.inner.order.len())
            .field("qualifiers", &self.inner.by_qualifier.len())
            .field("types", &self.inner.by_type.len())
            .finish()
    }
}

/// Reusable on-demand factory for one type, bound to a frozen registry.
///
/// Produced by [`Registry::creator`] after recipe selection already
/// succeeded; each [`Creator::create`] call runs the selected recipe
/// against the registry and yields a fresh owned instance.
pub struct Creator<T> {
    node: RecipeNode,
    inner: Arc<RegistryInner>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Injectable> Creator<T> {
    /// Construct and populate one fresh instance
    pub fn create(&self) -> Result<T> {
        let boxed = self.node.produce(Resolved::new(&self.inner.by_qualifier))?;
        boxed.downcast::<T>().map(|value| *value).map_err(|_| {
            // Reachable when the build-time set under T's type name was
            // registered with a different concrete type.
            Error::type_mismatch(self.node.qualifier().as_str(), key_of::<T>())
        })
    }
}

impl<T> fmt::Debug for Creator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Creator")
            .field("type_name", &self.node.type_name())
            .field("qualifier", &self.node.qualifier())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RegistryBuilder;
    use bodkin_domain::{Blueprint, Recipe};

    struct Beacon {
        signal: u32,
    }

    #[test]
    fn test_lookup_roundtrip() {
        let registry = RegistryBuilder::new()
            .register(
                Blueprint::<Beacon>::qualified("beacon")
                    .with_recipe(Recipe::new(|_| Ok(Beacon { signal: 7 }))),
            )
            .build()
            .unwrap();

        let by_qualifier = registry.get_qualified::<Beacon>("beacon").unwrap();
        let by_type = registry.get::<Beacon>().unwrap();
        assert_eq!(by_qualifier.signal, 7);
        assert!(Arc::ptr_eq(&by_qualifier, &by_type));
        assert!(registry.has::<Beacon>());
        assert_eq!(registry.len(), 1);
    }
}
