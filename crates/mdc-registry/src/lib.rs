//! Domain registry: sorts, predicate/function signatures, tasks and methods.
//!
//! # Overview
//!
//! - [`SortRegistry`]: the `object`-rooted sort tree and object membership.
//! - [`Task`] / [`Method`]: the HDDL-style domain (abstract tasks, primitive
//!   tasks, decomposition methods with a partial subtask ordering).
//! - [`Literal`]: ground/partially-ground predicate and comparison literals
//!   shared by preconditions, effects and world-state facts.
//! - [`Registry`] / [`FrozenRegistry`]: accumulate declarations, then seal
//!   them for the rest of the compiler pipeline.
//!
//! # Example
//!
//! ```rust
//! use mdc_registry::{Registry, Task, Parameter};
//!
//! let mut reg = Registry::new();
//! reg.declare_task(Task::primitive("go_to", vec![Parameter::new("?r", "robot")], vec![], vec![])).unwrap();
//! let frozen = reg.freeze();
//! assert!(frozen.task("go_to").is_some());
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod literal;
pub mod registry;
pub mod schema;
pub mod sort;
pub mod task;

pub use error::RegistryError;
pub use literal::{CompareOp, Literal};
pub use registry::{FrozenRegistry, Registry};
pub use schema::{FunctionDef, PredicateDef};
pub use sort::{SortName, SortNode, SortRegistry};
pub use task::{Method, Parameter, Subtask, Task};

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
