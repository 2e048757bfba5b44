//! Fixed-point graph resolution
//!
//! Turns the registered qualifier-to-candidates mapping into constructed
//! instances by repeated passes: each pass scans the pending qualifiers in
//! registration order and instantiates every one whose dependency keys are
//! already resolved. A pass that resolves nothing while work remains means
//! the graph is unsatisfiable, whether through a cycle or a reference to a
//! key nobody registered; the two are reported identically as the set of
//! blocked qualifiers and their missing keys.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info};

use bodkin_domain::{
    Error, NodeSet, Qualifier, Resolved, ResolvedInstance, ResolvedMap, Result, UnmetDependencies,
};

/// Everything a successful resolution produces, handed to the registry to
/// freeze.
pub(crate) struct Resolution {
    /// Every resolvable key (registration qualifiers plus exposed type
    /// names) mapped to its instance record
    pub by_qualifier: ResolvedMap,
    /// Every exposed `TypeId` mapped to its instance record
    pub by_type: HashMap<TypeId, Arc<ResolvedInstance>>,
    /// One entry per resolved registration, in construction order
    pub order: Vec<(Qualifier, Arc<ResolvedInstance>)>,
}

/// Resolve the graph or report why it is stuck.
///
/// The scan is interleaved: a qualifier later in a pass already sees the
/// instances constructed earlier in the same pass. That only shortens pass
/// counts; the outcome is the same as a phase-separated sweep. Within one
/// qualifier the first satisfiable candidate wins, and each qualifier
/// contributes at most one instantiation per pass.
pub(crate) fn resolve(mut pending: IndexMap<Qualifier, NodeSet>) -> Result<Resolution> {
    let mut by_qualifier = ResolvedMap::new();
    let mut by_type: HashMap<TypeId, Arc<ResolvedInstance>> = HashMap::new();
    let mut order: Vec<(Qualifier, Arc<ResolvedInstance>)> = Vec::new();
    let mut pass = 0usize;

    while !pending.is_empty() {
        pass += 1;
        let mut resolved_this_pass: Vec<Qualifier> = Vec::new();

        for (qualifier, set) in &pending {
            let runnable = set
                .nodes()
                .iter()
                .find(|node| node.is_satisfied(Resolved::new(&by_qualifier)));
            let Some(node) = runnable else { continue };

            let record = Arc::new(node.instantiate(Resolved::new(&by_qualifier))?);

            by_qualifier.insert(qualifier.as_str().to_owned(), Arc::clone(&record));
            // Exposure fan-out: the instance becomes reachable under every
            // exposed TypeId and under each exposed type's name, so a type
            // name works as a dependency key. Later instances sharing an
            // exposure silently overwrite earlier ones (last one wins).
            for (type_id, type_name) in record.exposed_types() {
                by_type.insert(*type_id, Arc::clone(&record));
                by_qualifier.insert((*type_name).to_owned(), Arc::clone(&record));
            }

            order.push((qualifier.clone(), Arc::clone(&record)));
            resolved_this_pass.push(qualifier.clone());
        }

        if resolved_this_pass.is_empty() {
            return Err(Error::unresolvable(stuck_report(&pending, &by_qualifier)));
        }

        for qualifier in &resolved_this_pass {
            pending.shift_remove(qualifier);
        }

        debug!(
            pass,
            resolved = resolved_this_pass.len(),
            remaining = pending.len(),
            "resolution pass complete"
        );
    }

    info!(
        instances = order.len(),
        keys = by_qualifier.len(),
        types = by_type.len(),
        "dependency graph resolved"
    );

    Ok(Resolution {
        by_qualifier,
        by_type,
        order,
    })
}

/// Describe every blocked qualifier by the union of the dependency keys its
/// candidates are waiting for.
fn stuck_report(
    pending: &IndexMap<Qualifier, NodeSet>,
    by_qualifier: &ResolvedMap,
) -> Vec<UnmetDependencies> {
    pending
        .iter()
        .map(|(qualifier, set)| {
            let missing: Vec<String> = set
                .nodes()
                .iter()
                .flat_map(|node| node.dependency_keys().iter())
                .filter(|key| !by_qualifier.contains_key(key.as_str()))
                .cloned()
                .collect();
            UnmetDependencies::new(qualifier.clone(), missing)
        })
        .collect()
}
