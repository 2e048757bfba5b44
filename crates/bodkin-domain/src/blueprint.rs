//! Blueprints: caller-supplied construction metadata
//!
//! A [`Blueprint`] is the declarative description of one injectable type:
//! its qualifier, the candidate [`Recipe`]s that can construct it, the
//! injectable [`Member`]s populated after construction, and the
//! [`Exposure`] list of additional types it is queryable under. It is the
//! explicit-registration stand-in for what an annotation processor would
//! derive from constructor signatures and field annotations.

use std::any::TypeId;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::instance::{Handle, Resolved};
use crate::qualifier::{Qualifier, key_of};

/// Construction callback: builds a `C` from already-resolved dependencies
pub type ConstructFn<C> = dyn Fn(Resolved<'_>) -> Result<C> + Send + Sync;

type AssignFn<C> = Box<dyn Fn(&mut C, Resolved<'_>) -> Result<()> + Send + Sync>;

type CastFn<C> = Box<dyn Fn(&Arc<C>) -> Handle + Send + Sync>;

/// One candidate way to construct an instance.
///
/// Every dependency key declared with [`Recipe::needs`] or
/// [`Recipe::needs_type`] must be resolved before the recipe can run; the
/// construct callback then reads those dependencies from the resolved view.
///
/// ## Business Rules
///
/// - Dependency keys are a set: declaring the same key twice is a no-op
/// - A recipe is immutable once handed to a blueprint
/// - Marking any recipe preferred excludes every non-preferred candidate
///   of the same blueprint (explicit wins over implicit)
///
/// ## Example
///
/// ```rust
/// use bodkin_domain::Recipe;
///
/// struct Pool { size: usize }
///
/// let recipe = Recipe::new(|_| Ok(Pool { size: 4 }))
///     .needs("config.pool")
///     .preferred();
///
/// assert!(recipe.is_preferred());
/// assert!(recipe.dependency_keys().contains("config.pool"));
/// ```
pub struct Recipe<C> {
    dependency_keys: BTreeSet<String>,
    preferred: bool,
    construct: Arc<ConstructFn<C>>,
}

impl<C> Recipe<C> {
    /// Create a recipe from a construction callback
    pub fn new(construct: impl Fn(Resolved<'_>) -> Result<C> + Send + Sync + 'static) -> Self {
        Self {
            dependency_keys: BTreeSet::new(),
            preferred: false,
            construct: Arc::new(construct),
        }
    }

    /// Declare a dependency on an explicit qualifier key
    pub fn needs(mut self, key: impl Into<String>) -> Self {
        self.dependency_keys.insert(key.into());
        self
    }

    /// Declare a dependency keyed by the declared type name of `T`
    pub fn needs_type<T: ?Sized>(mut self) -> Self {
        self.dependency_keys.insert(key_of::<T>().to_string());
        self
    }

    /// Mark this recipe as the explicitly chosen construction path
    pub fn preferred(mut self) -> Self {
        self.preferred = true;
        self
    }

    /// The qualifier keys this recipe waits for
    pub fn dependency_keys(&self) -> &BTreeSet<String> {
        &self.dependency_keys
    }

    /// Whether this recipe carries the preferred marker
    pub fn is_preferred(&self) -> bool {
        self.preferred
    }

    /// Run the construction callback against a resolved view
    pub fn construct(&self, resolved: Resolved<'_>) -> Result<C> {
        (self.construct)(resolved)
    }

    pub(crate) fn into_parts(self) -> (BTreeSet<String>, Arc<ConstructFn<C>>) {
        (self.dependency_keys, self.construct)
    }
}

impl<C> fmt::Debug for Recipe<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recipe")
            .field("dependency_keys", &self.dependency_keys)
            .field("preferred", &self.preferred)
            .finish()
    }
}

/// One injectable member, populated after construction.
///
/// A member contributes its dependency key to every candidate recipe of
/// its blueprint: whichever recipe runs, the member's dependency must be
/// resolved first, because population happens right after construction.
pub struct Member<C> {
    name: String,
    key: String,
    assign: AssignFn<C>,
}

impl<C> Member<C> {
    /// Member keyed by the declared type name of `V`.
    ///
    /// The setter receives the resolved instance as `Arc<V>` and is
    /// responsible for storing it on the target.
    pub fn of_type<V>(
        name: impl Into<String>,
        set: impl Fn(&mut C, Arc<V>) + Send + Sync + 'static,
    ) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
    {
        Self::qualified(name, key_of::<V>(), set)
    }

    /// Member keyed by an explicit qualifier override.
    ///
    /// A missing key fails population with [`Error::UnknownQualifier`]; a
    /// key resolved to an instance that was never exposed as `V` fails
    /// with [`Error::MemberAssignment`].
    pub fn qualified<V>(
        name: impl Into<String>,
        key: impl Into<String>,
        set: impl Fn(&mut C, Arc<V>) + Send + Sync + 'static,
    ) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
    {
        let name = name.into();
        let key = key.into();
        let assign = {
            let name = name.clone();
            let key = key.clone();
            move |target: &mut C, resolved: Resolved<'_>| -> Result<()> {
                if !resolved.contains(&key) {
                    return Err(Error::unknown_qualifier(&key));
                }
                let value = resolved.get::<V>(&key).ok_or_else(|| {
                    Error::member_assignment(
                        key_of::<C>(),
                        &name,
                        format!("instance under '{key}' is not exposed as '{}'", key_of::<V>()),
                    )
                })?;
                set(target, value);
                Ok(())
            }
        };
        Self {
            name,
            key,
            assign: Box::new(assign),
        }
    }

    /// Diagnostic name of the member
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The qualifier key this member is filled from
    pub fn dependency_key(&self) -> &str {
        &self.key
    }

    /// Fill the member on `target` from the resolved view
    pub fn populate(&self, target: &mut C, resolved: Resolved<'_>) -> Result<()> {
        (self.assign)(target, resolved)
    }
}

impl<C> fmt::Debug for Member<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("key", &self.key)
            .finish()
    }
}

/// One entry of the exposed-as list: a target type plus its upcast.
///
/// Exposing an instance as `E` makes it retrievable both by `TypeId` of
/// `E` and under the dependency key `key_of::<E>()`. The upcast is
/// usually a one-token unsized coercion (`|c| c` for `E = dyn Trait`).
pub struct Exposure<C> {
    type_id: TypeId,
    type_name: &'static str,
    cast: CastFn<C>,
}

impl<C: Send + Sync + 'static> Exposure<C> {
    /// Expose the concrete type as `E` through the given upcast
    pub fn new<E>(cast: impl Fn(Arc<C>) -> Arc<E> + Send + Sync + 'static) -> Self
    where
        E: ?Sized + Send + Sync + 'static,
    {
        Self {
            type_id: TypeId::of::<E>(),
            type_name: key_of::<E>(),
            cast: Box::new(move |concrete| Arc::new(cast(Arc::clone(concrete))) as Handle),
        }
    }

    /// `TypeId` of the exposed type
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the exposed type, used as a dependency key alias
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Build the type-erased retrieval handle for one constructed instance
    pub fn handle(&self, concrete: &Arc<C>) -> Handle {
        (self.cast)(concrete)
    }
}

impl<C> fmt::Debug for Exposure<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exposure")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Declarative description of one injectable type.
///
/// ## Business Rules
///
/// - The qualifier defaults to the canonical type name of `C`
/// - Recipe order is registration order; the first satisfiable candidate
///   wins during resolution
/// - Every member's dependency key is merged into every candidate recipe
/// - The concrete type is always exposed; `exposes` adds further lookup
///   types on top
///
/// ## Example
///
/// ```rust
/// use bodkin_domain::{Blueprint, Member, Recipe};
/// use std::sync::Arc;
///
/// struct Cache;
/// struct Service {
///     cache: Option<Arc<Cache>>,
/// }
///
/// let blueprint: Blueprint<Service> = Blueprint::qualified("service.main")
///     .with_recipe(Recipe::new(|_| Ok(Service { cache: None })))
///     .with_member(Member::of_type::<Cache>("cache", |service: &mut Service, cache| {
///         service.cache = Some(cache);
///     }));
///
/// assert_eq!(blueprint.qualifier().as_str(), "service.main");
/// assert_eq!(blueprint.recipes().len(), 1);
/// ```
pub struct Blueprint<C> {
    qualifier: Qualifier,
    recipes: Vec<Recipe<C>>,
    members: Vec<Member<C>>,
    exposures: Vec<Exposure<C>>,
}

impl<C: Send + Sync + 'static> Blueprint<C> {
    /// Blueprint under the canonical type-derived qualifier
    pub fn new() -> Self {
        Self::qualified(Qualifier::of::<C>())
    }

    /// Blueprint under an explicit qualifier
    pub fn qualified(qualifier: impl Into<Qualifier>) -> Self {
        Self {
            qualifier: qualifier.into(),
            recipes: Vec::new(),
            members: Vec::new(),
            exposures: Vec::new(),
        }
    }

    /// Replace the qualifier, keeping recipes, members and exposures
    pub fn with_qualifier(mut self, qualifier: impl Into<Qualifier>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    /// Add a candidate construction recipe
    pub fn with_recipe(mut self, recipe: Recipe<C>) -> Self {
        self.recipes.push(recipe);
        self
    }

    /// Add an injectable member
    pub fn with_member(mut self, member: Member<C>) -> Self {
        self.members.push(member);
        self
    }

    /// Expose the instance as `E`, making it queryable by that type and
    /// under its type name
    pub fn exposes<E>(mut self, cast: impl Fn(Arc<C>) -> Arc<E> + Send + Sync + 'static) -> Self
    where
        E: ?Sized + Send + Sync + 'static,
    {
        self.exposures.push(Exposure::new(cast));
        self
    }

    /// The qualifier this blueprint registers under
    pub fn qualifier(&self) -> &Qualifier {
        &self.qualifier
    }

    /// Candidate recipes in registration order
    pub fn recipes(&self) -> &[Recipe<C>] {
        &self.recipes
    }

    /// Injectable members in registration order
    pub fn members(&self) -> &[Member<C>] {
        &self.members
    }

    /// Additional exposed types in registration order
    pub fn exposures(&self) -> &[Exposure<C>] {
        &self.exposures
    }

    #[allow(clippy::type_complexity)]
    pub(crate) fn into_parts(self) -> (Qualifier, Vec<Recipe<C>>, Vec<Member<C>>, Vec<Exposure<C>>) {
        (self.qualifier, self.recipes, self.members, self.exposures)
    }
}

impl<C: Send + Sync + 'static> Default for Blueprint<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Blueprint<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("qualifier", &self.qualifier)
            .field("recipes", &self.recipes.len())
            .field("members", &self.members.len())
            .field("exposures", &self.exposures.len())
            .finish()
    }
}

/// Types that can describe their own construction.
///
/// The implementation is the hand-written equivalent of the metadata an
/// annotation processor would generate: it names the qualifier, the
/// constructor candidates and the injectable members. Implementing it
/// lets the container register the type directly (`with_type`) and
/// derive fresh recipes on demand (`create`/`inject`).
///
/// ## Example
///
/// ```rust
/// use bodkin_domain::{Blueprint, Injectable, Recipe, key_of};
///
/// struct Settings {
///     retries: u32,
/// }
///
/// impl Injectable for Settings {
///     fn blueprint() -> Blueprint<Self> {
///         Blueprint::new().with_recipe(Recipe::new(|_| Ok(Settings { retries: 3 })))
///     }
/// }
///
/// assert_eq!(Settings::blueprint().qualifier().as_str(), key_of::<Settings>());
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// The registration metadata for this type
    fn blueprint() -> Blueprint<Self>;
}
