//! Configuration resolver: sort/type aliasing, HDDL/goal-model variable
//! mappings, and semantic mappings from knowledge-base shape to the
//! predicate/function vocabulary.
//!
//! This crate does not parse configuration files; it resolves already-parsed
//! [`Configuration`] records into the lookup structures the rest of the
//! compiler consumes, and validates them up front via [`typecheck`].

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod init;
pub mod mapping;
pub mod resolver;
pub mod typecheck;

pub use config::{Configuration, VarMapping};
pub use error::ConfigError;
pub use init::initialize_world;
pub use mapping::{MappedType, PredicateQuantifier, RelationshipType, SemanticMapping};
pub use resolver::ConfigResolver;

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
