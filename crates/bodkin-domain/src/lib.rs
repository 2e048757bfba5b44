//! Domain Layer - Bodkin
//!
//! This crate contains the pure types and contracts of the Bodkin
//! dependency-injection container. It knows nothing about resolution
//! scheduling; it only describes what can be built and how one finished
//! instance is stored and retrieved.
//!
//! ## Architecture
//!
//! The domain layer:
//! - Defines [`Qualifier`], the string key a resolved instance lives under
//! - Defines [`Blueprint`], the caller-supplied construction metadata
//!   (candidate recipes, injectable members, exposed lookup types)
//! - Erases blueprints into [`NodeSet`]s of [`RecipeNode`]s the resolution
//!   engine can schedule without knowing concrete types
//! - Stores constructed instances as [`ResolvedInstance`] records with one
//!   typed retrieval handle per exposed type
//! - Owns the error contract ([`Error`], [`Result`])
//!
//! ## Dependencies
//!
//! This crate depends only on:
//! - `serde`: For the serializable diagnostic types
//! - `thiserror`: For the error enum
//!
//! No I/O, no async, no logging.

pub mod blueprint;
pub mod error;
pub mod instance;
pub mod node;
pub mod qualifier;

pub use blueprint::{Blueprint, ConstructFn, Exposure, Injectable, Member, Recipe};
pub use error::{Error, Result, UnmetDependencies};
pub use instance::{AnyInstance, Handle, Resolved, ResolvedInstance, ResolvedMap};
pub use node::{NodeSet, RecipeNode};
pub use qualifier::{Qualifier, key_of};
