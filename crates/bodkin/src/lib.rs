//! # Bodkin
//!
//! A qualifier-keyed dependency-injection container with fixed-point graph
//! resolution.
//!
//! Callers register types (or explicit factory recipes) under string
//! qualifiers; building the container resolves the dependency graph into a
//! frozen, immutable object set. Construction order is discovered
//! iteratively: every pass instantiates whichever pending qualifiers have
//! all their dependency keys resolved, until the graph is done or provably
//! stuck.
//!
//! ## Features
//!
//! - **Qualifier wiring**: Dependencies are declared and satisfied by
//!   opaque string keys, defaulting to type names
//! - **Candidate recipes**: A type may carry several construction recipes;
//!   marking one preferred excludes the rest
//! - **Exposure lists**: An instance is retrievable under its concrete
//!   type plus any explicitly exposed trait objects
//! - **Frozen result**: The [`Registry`] never mutates after a successful
//!   build and is safe for unsynchronized concurrent reads
//! - **On-demand construction**: [`Registry::create`] builds fresh
//!   instances of injectable types after the freeze, registered or not
//!
//! ## Example
//!
//! ```rust
//! use bodkin::{Blueprint, Injectable, Recipe, RegistryBuilder, Resolved};
//! use std::sync::Arc;
//!
//! struct Config {
//!     url: String,
//! }
//!
//! impl Injectable for Config {
//!     fn blueprint() -> Blueprint<Self> {
//!         Blueprint::new().with_recipe(Recipe::new(|_| {
//!             Ok(Config { url: "localhost:5432".to_string() })
//!         }))
//!     }
//! }
//!
//! struct Database {
//!     config: Arc<Config>,
//! }
//!
//! impl Injectable for Database {
//!     fn blueprint() -> Blueprint<Self> {
//!         Blueprint::new().with_recipe(
//!             Recipe::new(|resolved: Resolved<'_>| {
//!                 Ok(Database {
//!                     config: resolved.require_type::<Config>()?,
//!                 })
//!             })
//!             .needs_type::<Config>(),
//!         )
//!     }
//! }
//!
//! fn main() -> bodkin::Result<()> {
//!     let registry = RegistryBuilder::new()
//!         .with_type::<Config>()
//!         .with_type::<Database>()
//!         .build()?;
//!
//!     let database = registry.try_get::<Database>()?;
//!     assert_eq!(database.config.url, "localhost:5432");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The workspace keeps pure domain types apart from the container engine:
//!
//! - `domain` (the `bodkin-domain` crate) - qualifiers, blueprints, erased
//!   recipe nodes, resolved-instance storage, errors
//! - `builder` - the registration surface ([`RegistryBuilder`])
//! - `resolver` - the fixed-point construction loop
//! - `registry` - the frozen result ([`Registry`]) with typed lookups,
//!   on-demand creation and member injection
//!
//! Discovery of injectable types is deliberately not part of the core:
//! whatever enumerates candidates (hand-written wiring, generated code, a
//! compile-time slice) calls the same registration entry points.

/// Domain layer - qualifiers, blueprints, recipe nodes, errors
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use bodkin_domain::*;
}

pub mod builder;
pub mod registry;

mod resolver;

// Re-export commonly used domain types at the crate root
pub use domain::*;

// Re-export the container surface at the crate root
pub use builder::RegistryBuilder;
pub use registry::{Creator, Registry};
