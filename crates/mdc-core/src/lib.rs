//! Mission decomposition compiler core: compiles a declarative,
//! multi-robot goal model, grounded against a domain and a knowledge base,
//! into a trimmed mission-decomposition graph, its ordering/exclusion
//! constraints, and every valid mission decomposition.
//!
//! The pipeline runs in three stages, each a pure function over the
//! previous stage's output:
//!
//! 1. [`instance`]: task-instance expansion (depth-first walk of the goal
//!    model, resolving `Query` goals and replicating `forAll` scopes).
//! 2. [`annotation`]: runtime-annotation tree construction, paired with
//!    [`decomposition`]'s per-instance TDG path enumeration.
//! 3. [`mdc_graph::assemble`] (ATGraph assembly), [`mdc_compose::extract_constraints`]
//!    (constraint extraction), and [`enumerator`] (valid-mission enumeration).
//!
//! [`pipeline::Pipeline::compile`] is the single public entry point bundling
//! all three.

#![warn(missing_docs)]

pub mod annotation;
pub mod decomposition;
pub mod enumerator;
pub mod error;
pub mod goal_model;
pub mod ids;
pub mod instance;
pub mod pipeline;

pub use enumerator::MissionDecomposition;
pub use error::PipelineError;
pub use goal_model::{GoalModel, GoalType};
pub use ids::{AtInstanceId, DecompositionId};
pub use instance::{AtInstance, TaskInstanceExpansion};
pub use pipeline::{CompiledMission, Pipeline};

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
