//! Recipe nodes: type-erased construction units
//!
//! A [`Blueprint`] is generic over the type it builds; the resolution
//! engine is not. [`NodeSet::derive`] bridges the two by erasing each
//! candidate recipe into a [`RecipeNode`] that constructs, populates and
//! exposes the instance behind `dyn Any` handles, so sets for different
//! types can live in one graph.

use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::blueprint::{Blueprint, ConstructFn, Exposure, Member, Recipe};
use crate::error::{Error, Result};
use crate::instance::{Handle, Resolved, ResolvedInstance};
use crate::qualifier::{Qualifier, key_of};

type MakeFn<C> = dyn Fn(Resolved<'_>) -> Result<C> + Send + Sync;
type InstantiateFn = dyn Fn(Resolved<'_>) -> Result<ResolvedInstance> + Send + Sync;
type ProduceFn = dyn Fn(Resolved<'_>) -> Result<Box<dyn Any + Send + Sync>> + Send + Sync;

/// One type-erased candidate construction for one qualifier.
///
/// The node owns the full construction pipeline: run the recipe callback,
/// populate every injectable member, then hand the instance out either as
/// a shared [`ResolvedInstance`] (graph resolution) or as an owned boxed
/// value (on-demand creation). Two nodes are equal when they target the
/// same qualifier with the same dependency keys.
pub struct RecipeNode {
    qualifier: Qualifier,
    type_name: &'static str,
    dependency_keys: BTreeSet<String>,
    instantiate: Arc<InstantiateFn>,
    produce: Arc<ProduceFn>,
}

impl RecipeNode {
    fn assemble<C: Send + Sync + 'static>(
        qualifier: Qualifier,
        dependency_keys: BTreeSet<String>,
        construct: Arc<ConstructFn<C>>,
        members: Arc<Vec<Member<C>>>,
        exposures: Arc<Vec<Exposure<C>>>,
    ) -> Self {
        let type_name = key_of::<C>();

        let make: Arc<MakeFn<C>> = {
            let wrap = qualifier.clone();
            Arc::new(move |resolved: Resolved<'_>| -> Result<C> {
                let mut value = construct(resolved)
                    .map_err(|source| Error::construction(wrap.as_str(), source))?;
                for member in members.iter() {
                    member.populate(&mut value, resolved)?;
                }
                Ok(value)
            })
        };

        let instantiate: Arc<InstantiateFn> = {
            let make = Arc::clone(&make);
            Arc::new(move |resolved: Resolved<'_>| -> Result<ResolvedInstance> {
                let value = Arc::new(make(resolved)?);
                let mut handles: HashMap<TypeId, Handle> =
                    HashMap::with_capacity(exposures.len() + 1);
                let mut exposed: Vec<(TypeId, &'static str)> =
                    Vec::with_capacity(exposures.len() + 1);
                handles.insert(TypeId::of::<C>(), Arc::new(Arc::clone(&value)) as Handle);
                exposed.push((TypeId::of::<C>(), type_name));
                for exposure in exposures.iter() {
                    // Re-exposing an already-covered type keeps the first handle.
                    if handles.contains_key(&exposure.type_id()) {
                        continue;
                    }
                    handles.insert(exposure.type_id(), exposure.handle(&value));
                    exposed.push((exposure.type_id(), exposure.type_name()));
                }
                Ok(ResolvedInstance::new(type_name, value, handles, exposed))
            })
        };

        let produce: Arc<ProduceFn> = Arc::new(move |resolved: Resolved<'_>| {
            let value = make(resolved)?;
            Ok(Box::new(value) as Box<dyn Any + Send + Sync>)
        });

        Self {
            qualifier,
            type_name,
            dependency_keys,
            instantiate,
            produce,
        }
    }

    /// The qualifier this node resolves
    pub fn qualifier(&self) -> &Qualifier {
        &self.qualifier
    }

    /// Name of the concrete type this node constructs
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Dependency keys that must be resolved before this node can run
    pub fn dependency_keys(&self) -> &BTreeSet<String> {
        &self.dependency_keys
    }

    /// Whether every dependency key is present in the resolved view
    pub fn is_satisfied(&self, resolved: Resolved<'_>) -> bool {
        self.dependency_keys.iter().all(|key| resolved.contains(key))
    }

    /// Construct, populate and expose one shared instance
    pub fn instantiate(&self, resolved: Resolved<'_>) -> Result<ResolvedInstance> {
        (self.instantiate)(resolved)
    }

    /// Construct and populate one owned instance, boxed for downcasting
    pub fn produce(&self, resolved: Resolved<'_>) -> Result<Box<dyn Any + Send + Sync>> {
        (self.produce)(resolved)
    }
}

impl Clone for RecipeNode {
    fn clone(&self) -> Self {
        Self {
            qualifier: self.qualifier.clone(),
            type_name: self.type_name,
            dependency_keys: self.dependency_keys.clone(),
            instantiate: Arc::clone(&self.instantiate),
            produce: Arc::clone(&self.produce),
        }
    }
}

impl PartialEq for RecipeNode {
    fn eq(&self, other: &Self) -> bool {
        self.qualifier == other.qualifier && self.dependency_keys == other.dependency_keys
    }
}

impl Eq for RecipeNode {}

impl fmt::Debug for RecipeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipeNode")
            .field("qualifier", &self.qualifier)
            .field("type_name", &self.type_name)
            .field("dependency_keys", &self.dependency_keys)
            .finish()
    }
}

/// Every candidate node for one qualifier, in registration order.
///
/// ## Business Rules
///
/// - If any recipe is marked preferred, only preferred recipes become
///   candidates
/// - Each member's dependency key is merged into every candidate, since
///   population follows construction unconditionally
/// - Duplicate candidates (same qualifier, same dependency keys) keep the
///   first occurrence
#[derive(Clone, Debug)]
pub struct NodeSet {
    qualifier: Qualifier,
    type_name: &'static str,
    nodes: Vec<RecipeNode>,
}

impl NodeSet {
    /// Erase a blueprint into its candidate nodes
    pub fn derive<C: Send + Sync + 'static>(blueprint: Blueprint<C>) -> Self {
        let (qualifier, recipes, members, exposures) = blueprint.into_parts();
        let member_keys: Vec<String> = members
            .iter()
            .map(|member| member.dependency_key().to_string())
            .collect();
        let members = Arc::new(members);
        let exposures = Arc::new(exposures);

        let any_preferred = recipes.iter().any(Recipe::is_preferred);
        let mut nodes: Vec<RecipeNode> = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            if any_preferred && !recipe.is_preferred() {
                continue;
            }
            let (mut keys, construct) = recipe.into_parts();
            keys.extend(member_keys.iter().cloned());
            let node = RecipeNode::assemble(
                qualifier.clone(),
                keys,
                construct,
                Arc::clone(&members),
                Arc::clone(&exposures),
            );
            if !nodes.contains(&node) {
                nodes.push(node);
            }
        }

        Self {
            qualifier,
            type_name: key_of::<C>(),
            nodes,
        }
    }

    /// Append another set's candidates, skipping duplicates.
    ///
    /// Keeps this set's qualifier and type name; callers only merge sets
    /// registered under the same qualifier.
    pub fn merge(&mut self, other: NodeSet) {
        for node in other.nodes {
            if !self.nodes.contains(&node) {
                self.nodes.push(node);
            }
        }
    }

    /// The qualifier all candidates resolve
    pub fn qualifier(&self) -> &Qualifier {
        &self.qualifier
    }

    /// Name of the concrete type the candidates construct
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Candidate nodes in registration order
    pub fn nodes(&self) -> &[RecipeNode] {
        &self.nodes
    }

    /// Number of candidate nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the set has no candidates left
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
