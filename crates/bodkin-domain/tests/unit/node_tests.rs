//! Tests for blueprint-to-node derivation
//!
//! `NodeSet::derive` is where the description of a type (recipes, members,
//! exposures) turns into schedulable graph nodes. These tests pin the
//! candidate filtering policy (explicitly preferred recipes win), the
//! merging of member keys into every candidate, duplicate elimination and
//! the construct-then-populate pipeline of a single node.

use std::sync::Arc;

use bodkin_domain::{
    Blueprint, Error, Member, NodeSet, Recipe, Resolved, ResolvedMap, key_of,
};

struct Engine {
    label: &'static str,
}

struct Dashboard {
    label: &'static str,
    engine: Option<Arc<Engine>>,
}

fn dashboard(label: &'static str) -> Dashboard {
    Dashboard {
        label,
        engine: None,
    }
}

/// A resolved map holding one engine, reachable under "engine" and under
/// its type name.
fn resolved_engine() -> ResolvedMap {
    let set = NodeSet::derive(
        Blueprint::<Engine>::qualified("engine")
            .with_recipe(Recipe::new(|_| Ok(Engine { label: "v8" }))),
    );
    let record = Arc::new(
        set.nodes()[0]
            .instantiate(Resolved::new(&ResolvedMap::new()))
            .expect("engine recipe has no dependencies"),
    );

    let mut map = ResolvedMap::new();
    map.insert("engine".to_string(), Arc::clone(&record));
    for (_, type_name) in record.exposed_types() {
        map.insert((*type_name).to_string(), Arc::clone(&record));
    }
    map
}

// ============================================================================
// Candidate selection policy
// ============================================================================

#[test]
fn test_every_recipe_is_a_candidate_when_none_is_preferred() {
    let set = NodeSet::derive(
        Blueprint::<Dashboard>::qualified("dashboard")
            .with_recipe(Recipe::new(|_| Ok(dashboard("first"))).needs("a"))
            .with_recipe(Recipe::new(|_| Ok(dashboard("second"))).needs("b")),
    );

    assert_eq!(set.len(), 2);
    assert!(set.nodes()[0].dependency_keys().contains("a"));
    assert!(set.nodes()[1].dependency_keys().contains("b"));
}

#[test]
fn test_preferred_recipe_excludes_the_rest() {
    let set = NodeSet::derive(
        Blueprint::<Dashboard>::qualified("dashboard")
            .with_recipe(Recipe::new(|_| Ok(dashboard("implicit"))))
            .with_recipe(Recipe::new(|_| Ok(dashboard("explicit"))).needs("a").preferred())
            .with_recipe(Recipe::new(|_| Ok(dashboard("also implicit"))).needs("b")),
    );

    assert_eq!(set.len(), 1, "only the preferred recipe may remain");
    assert!(set.nodes()[0].dependency_keys().contains("a"));
}

#[test]
fn test_member_keys_join_every_candidate() {
    let set = NodeSet::derive(
        Blueprint::<Dashboard>::qualified("dashboard")
            .with_recipe(Recipe::new(|_| Ok(dashboard("first"))).needs("a"))
            .with_recipe(Recipe::new(|_| Ok(dashboard("second"))))
            .with_member(Member::qualified::<Engine>("engine", "engine", |d: &mut Dashboard, e| {
                d.engine = Some(e);
            })),
    );

    for node in set.nodes() {
        assert!(
            node.dependency_keys().contains("engine"),
            "member key must gate every candidate, missing on {node:?}"
        );
    }
}

#[test]
fn test_duplicate_candidates_keep_the_first_occurrence() {
    let set = NodeSet::derive(
        Blueprint::<Dashboard>::qualified("dashboard")
            .with_recipe(Recipe::new(|_| Ok(dashboard("first"))).needs("engine"))
            .with_recipe(Recipe::new(|_| Ok(dashboard("second"))).needs("engine")),
    );

    assert_eq!(set.len(), 1, "identical (qualifier, keys) pairs collapse");

    let record = set.nodes()[0]
        .instantiate(Resolved::new(&resolved_engine()))
        .unwrap();
    let built = record.get::<Dashboard>().unwrap();
    assert_eq!(built.label, "first", "the surviving candidate is the first");
}

#[test]
fn test_merge_appends_only_unseen_candidates() {
    let mut set = NodeSet::derive(
        Blueprint::<Dashboard>::qualified("dashboard")
            .with_recipe(Recipe::new(|_| Ok(dashboard("first"))).needs("a")),
    );
    set.merge(NodeSet::derive(
        Blueprint::<Dashboard>::qualified("dashboard")
            .with_recipe(Recipe::new(|_| Ok(dashboard("dup"))).needs("a"))
            .with_recipe(Recipe::new(|_| Ok(dashboard("second"))).needs("b")),
    ));

    assert_eq!(set.len(), 2);
    assert!(set.nodes()[1].dependency_keys().contains("b"));
}

// ============================================================================
// Node construction pipeline
// ============================================================================

#[test]
fn test_instantiate_constructs_then_populates() {
    let set = NodeSet::derive(
        Blueprint::<Dashboard>::qualified("dashboard")
            .with_recipe(Recipe::new(|_| Ok(dashboard("main"))))
            .with_member(Member::qualified::<Engine>("engine", "engine", |d: &mut Dashboard, e| {
                d.engine = Some(e);
            })),
    );

    let resolved = resolved_engine();
    let record = set.nodes()[0]
        .instantiate(Resolved::new(&resolved))
        .unwrap();

    let built = record.get::<Dashboard>().unwrap();
    assert_eq!(built.label, "main");
    let engine = built.engine.as_ref().expect("member must be populated");
    let shared = resolved.get("engine").unwrap().get::<Engine>().unwrap();
    assert!(
        Arc::ptr_eq(engine, &shared),
        "populated member must be the resolved instance"
    );
}

#[test]
fn test_node_satisfaction_tracks_the_resolved_view() {
    let set = NodeSet::derive(
        Blueprint::<Dashboard>::qualified("dashboard")
            .with_recipe(Recipe::new(|_| Ok(dashboard("main"))).needs("engine")),
    );
    let node = &set.nodes()[0];

    let empty = ResolvedMap::new();
    assert!(!node.is_satisfied(Resolved::new(&empty)));
    assert!(node.is_satisfied(Resolved::new(&resolved_engine())));
}

#[test]
fn test_instantiate_wraps_recipe_failure() {
    let set = NodeSet::derive(
        Blueprint::<Dashboard>::qualified("dashboard").with_recipe(Recipe::new(|_| {
            Err::<Dashboard, _>(Error::from("gauge cluster offline"))
        })),
    );

    let err = set.nodes()[0]
        .instantiate(Resolved::new(&ResolvedMap::new()))
        .unwrap_err();

    match err {
        Error::Construction { qualifier, source } => {
            assert_eq!(qualifier, "dashboard");
            assert!(source.to_string().contains("gauge cluster offline"));
        }
        other => panic!("Expected Construction error, got {other:?}"),
    }
}

#[test]
fn test_derived_set_records_the_concrete_type() {
    let set = NodeSet::derive(
        Blueprint::<Engine>::new().with_recipe(Recipe::new(|_| Ok(Engine { label: "v8" }))),
    );

    assert_eq!(set.type_name(), key_of::<Engine>());
    assert_eq!(set.qualifier().as_str(), key_of::<Engine>());
    assert_eq!(set.nodes()[0].type_name(), key_of::<Engine>());
}

#[test]
fn test_zero_recipe_blueprint_derives_an_empty_set() {
    let set = NodeSet::derive(Blueprint::<Engine>::qualified("engine"));
    assert!(set.is_empty(), "no recipes means nothing schedulable");
}
