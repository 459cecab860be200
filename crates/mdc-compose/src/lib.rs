//! Constraint extraction over a trimmed mission-decomposition graph.
//!
//! Walks a [`mdc_graph::TrimmedAtGraph`] bottom-up, combining branches
//! according to the runtime-annotation operator (or implicit AND/OR goal
//! decomposition) above them, and emits the minimal set of binary
//! constraints the valid-mission enumerator needs: `SEQ` ordering,
//! `FALLBACK` alternation, and `EXEC-EXCLUSIVE` robot-sharing prohibitions.
//! `PAR` is the default and never survives to the public output.

#![warn(missing_docs)]

pub mod constraints;
pub mod error;

pub use constraints::{can_unite, extract_constraints, Constraint, EmittedConstraintKind};
pub use error::CompositionError;

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
