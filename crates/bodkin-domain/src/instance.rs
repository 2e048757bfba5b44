//! Resolved instance storage
//!
//! A constructed instance is stored once, type-erased, together with one
//! retrieval handle per type it is exposed as. Handles carry an `Arc<E>`
//! payload so trait-object exposures stay clonable and downcastable.
//!
//! ## Architecture
//!
//! ```text
//! construct() ──> concrete anchor (Arc<dyn Any>, payload C)
//!                      │
//!                      ├── handle: TypeId(C)        -> Arc<C>
//!                      ├── handle: TypeId(dyn Svc)  -> Arc<dyn Svc>
//!                      └── handle: TypeId(dyn Repo) -> Arc<dyn Repo>
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::qualifier::key_of;

/// A constructed instance with its concrete type erased.
///
/// The payload is the concrete value itself, so `downcast_ref::<C>()`
/// recovers it.
pub type AnyInstance = Arc<dyn Any + Send + Sync>;

/// A type-erased retrieval handle for one exposed type `E`.
///
/// The payload is an `Arc<E>`, not `E`, which is what makes unsized
/// exposures (`E = dyn Trait`) storable and retrievable.
pub type Handle = Arc<dyn Any + Send + Sync>;

/// Qualifier-keyed map of resolved instances.
///
/// Several keys may point at the same record: the registration qualifier
/// plus the type name of every exposure all resolve to one instance.
pub type ResolvedMap = HashMap<String, Arc<ResolvedInstance>>;

/// One constructed instance and its typed retrieval handles.
pub struct ResolvedInstance {
    type_name: &'static str,
    concrete: AnyInstance,
    handles: HashMap<TypeId, Handle>,
    exposed: Vec<(TypeId, &'static str)>,
}

impl ResolvedInstance {
    /// Assemble a record from its parts.
    ///
    /// `exposed` lists the types `handles` is keyed by, in declaration
    /// order, concrete type first.
    pub fn new(
        type_name: &'static str,
        concrete: AnyInstance,
        handles: HashMap<TypeId, Handle>,
        exposed: Vec<(TypeId, &'static str)>,
    ) -> Self {
        Self {
            type_name,
            concrete,
            handles,
            exposed,
        }
    }

    /// Name of the concrete type this record was built from
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The type-erased concrete instance
    pub fn concrete(&self) -> &AnyInstance {
        &self.concrete
    }

    /// Retrieve the instance as exposed type `E`, if it was exposed as `E`
    pub fn get<E: ?Sized + 'static>(&self) -> Option<Arc<E>> {
        self.handles
            .get(&TypeId::of::<E>())
            .and_then(|handle| handle.downcast_ref::<Arc<E>>())
            .cloned()
    }

    /// Whether this instance is exposed as the given type
    pub fn exposes(&self, type_id: TypeId) -> bool {
        self.handles.contains_key(&type_id)
    }

    /// Every type this instance is exposed as, concrete type first
    pub fn exposed_types(&self) -> &[(TypeId, &'static str)] {
        &self.exposed
    }
}

impl fmt::Debug for ResolvedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedInstance")
            .field("type_name", &self.type_name)
            .field("exposed", &self.exposed.iter().map(|(_, name)| name).collect::<Vec<_>>())
            .finish()
    }
}

/// Read view over the instances resolved so far.
///
/// This is what construction recipes and member setters see: lookups by
/// dependency key, nothing else. During graph resolution the view covers
/// the instances of completed and same-pass work; after the build it
/// covers the frozen registry.
#[derive(Clone, Copy)]
pub struct Resolved<'a> {
    instances: &'a ResolvedMap,
}

impl<'a> Resolved<'a> {
    /// Wrap a qualifier-keyed instance map
    pub fn new(instances: &'a ResolvedMap) -> Self {
        Self { instances }
    }

    /// Whether any instance is resolved under the given key
    pub fn contains(&self, key: &str) -> bool {
        self.instances.contains_key(key)
    }

    /// The instance under `key` as type `E`, if present and exposed as `E`
    pub fn get<E: ?Sized + 'static>(&self, key: &str) -> Option<Arc<E>> {
        self.instances.get(key).and_then(|instance| instance.get::<E>())
    }

    /// The instance under `key` as type `E`, or an error naming what failed.
    ///
    /// Missing key yields [`Error::UnknownQualifier`]; a present key whose
    /// instance was never exposed as `E` yields [`Error::TypeMismatch`].
    pub fn require<E: ?Sized + 'static>(&self, key: &str) -> Result<Arc<E>> {
        match self.instances.get(key) {
            None => Err(Error::unknown_qualifier(key)),
            Some(instance) => instance
                .get::<E>()
                .ok_or_else(|| Error::type_mismatch(key, key_of::<E>())),
        }
    }

    /// Shorthand for [`Resolved::require`] keyed by the type name of `E`
    pub fn require_type<E: ?Sized + 'static>(&self) -> Result<Arc<E>> {
        self.require::<E>(key_of::<E>())
    }
}

impl fmt::Debug for Resolved<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("keys", &self.instances.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    #[derive(Debug)]
    struct English;

    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    fn english_record() -> ResolvedInstance {
        let concrete = Arc::new(English);
        let mut handles: HashMap<TypeId, Handle> = HashMap::new();
        handles.insert(TypeId::of::<English>(), Arc::new(concrete.clone()));
        handles.insert(
            TypeId::of::<dyn Greeter>(),
            Arc::new(concrete.clone() as Arc<dyn Greeter>),
        );
        ResolvedInstance::new(
            key_of::<English>(),
            concrete,
            handles,
            vec![
                (TypeId::of::<English>(), key_of::<English>()),
                (TypeId::of::<dyn Greeter>(), key_of::<dyn Greeter>()),
            ],
        )
    }

    #[test]
    fn test_get_by_concrete_type() {
        let record = english_record();
        let instance = record.get::<English>();
        assert!(instance.is_some(), "concrete type handle must be present");
    }

    #[test]
    fn test_get_by_trait_object() {
        let record = english_record();
        let greeter = record.get::<dyn Greeter>().expect("trait handle must be present");
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn test_get_unexposed_type_is_none() {
        let record = english_record();
        assert!(record.get::<String>().is_none());
    }

    #[test]
    fn test_trait_and_concrete_handles_share_the_instance() {
        let record = english_record();
        let concrete = record.get::<English>().unwrap();
        let greeter = record.get::<dyn Greeter>().unwrap();
        let concrete_ptr = Arc::as_ptr(&concrete).cast::<()>();
        let greeter_ptr = Arc::as_ptr(&greeter).cast::<()>();
        assert_eq!(concrete_ptr, greeter_ptr, "handles must point at one allocation");
    }

    #[test]
    fn test_resolved_require_reports_missing_key() {
        let map = ResolvedMap::new();
        let view = Resolved::new(&map);
        let err = view.require::<English>("absent").unwrap_err();
        assert!(matches!(err, Error::UnknownQualifier { .. }));
    }

    #[test]
    fn test_resolved_require_reports_type_mismatch() {
        let mut map = ResolvedMap::new();
        map.insert("english".to_string(), Arc::new(english_record()));
        let view = Resolved::new(&map);
        let err = view.require::<String>("english").unwrap_err();
        match err {
            Error::TypeMismatch { qualifier, expected } => {
                assert_eq!(qualifier, "english");
                assert_eq!(expected, key_of::<String>());
            }
            other => panic!("Expected TypeMismatch error, got {other:?}"),
        }
    }

    #[test]
    fn test_resolved_get_by_key_and_type() {
        let mut map = ResolvedMap::new();
        map.insert("english".to_string(), Arc::new(english_record()));
        let view = Resolved::new(&map);
        assert!(view.contains("english"));
        assert!(view.get::<dyn Greeter>("english").is_some());
        assert!(view.get::<dyn Greeter>("french").is_none());
    }
}
