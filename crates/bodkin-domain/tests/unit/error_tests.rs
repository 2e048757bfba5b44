//! Tests for the error contract
//!
//! Display strings double as user-facing diagnostics and the
//! unresolvable-graph report is consumed by tooling, so both shapes are
//! pinned here.

use bodkin_domain::{Error, UnmetDependencies};
use serde_json::json;

#[test]
fn test_unmet_dependencies_sorts_and_dedups_missing_keys() {
    let entry = UnmetDependencies::new(
        "service",
        vec!["zeta".to_string(), "alpha".to_string(), "alpha".to_string()],
    );

    assert_eq!(entry.missing, vec!["alpha".to_string(), "zeta".to_string()]);
}

#[test]
fn test_unresolvable_display_names_every_blocked_qualifier() {
    let err = Error::unresolvable(vec![
        UnmetDependencies::new("api", vec!["database".to_string()]),
        UnmetDependencies::new("database", vec!["config".to_string()]),
    ]);

    let rendered = err.to_string();
    assert!(rendered.contains("'api' (missing: database)"), "{rendered}");
    assert!(rendered.contains("'database' (missing: config)"), "{rendered}");
}

#[test]
fn test_unresolvable_report_serializes_for_tooling() {
    let report = vec![UnmetDependencies::new(
        "api",
        vec!["cache".to_string(), "database".to_string()],
    )];

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(
        value,
        json!([{ "qualifier": "api", "missing": ["cache", "database"] }])
    );
}

#[test]
fn test_construction_error_preserves_the_source() {
    let err = Error::construction("database", Error::from("connection refused"));

    assert!(err.to_string().contains("database"));
    let source = std::error::Error::source(&err).expect("source must be kept");
    assert!(source.to_string().contains("connection refused"));
}

#[test]
fn test_lookup_error_displays() {
    assert_eq!(
        Error::unknown_qualifier("cache.remote").to_string(),
        "Unknown qualifier: no instance resolved for 'cache.remote'"
    );
    assert_eq!(
        Error::unknown_type("app::Cache").to_string(),
        "Unknown type: no instance exposed as 'app::Cache'"
    );
    assert_eq!(
        Error::type_mismatch("cache.remote", "app::Cache").to_string(),
        "Type mismatch: qualifier 'cache.remote' is not exposed as 'app::Cache'"
    );
}

#[test]
fn test_creation_error_displays() {
    assert_eq!(
        Error::no_construction_path("app::Cache").to_string(),
        "No construction path for type 'app::Cache'"
    );
    assert_eq!(
        Error::no_satisfiable_recipe("app::Cache").to_string(),
        "No satisfiable recipe for type 'app::Cache': every candidate has unresolved dependencies"
    );
    assert_eq!(
        Error::member_assignment("app::Service", "cache", "wrong type").to_string(),
        "Failed to assign member 'cache' on type 'app::Service': wrong type"
    );
}
