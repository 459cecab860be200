//! Task decomposition graph (TDG) and mission decomposition graph (ATGraph).
//!
//! # Overview
//!
//! - [`tdg`]: the AND/OR graph of one abstract task's possible ground
//!   decompositions, with cycle-safe construction and full path enumeration.
//! - [`atgraph`]: the tagged-union mission decomposition graph assembled from
//!   task instances, runtime-annotation operators and chosen decomposition
//!   paths, including context-dependency resolution.

#![warn(missing_docs)]

pub mod atgraph;
pub mod error;
pub mod tdg;

pub use atgraph::{
    assemble, AnnotationNode, AtGraphBuilder, AtGraphEdge, AtGraphNode, ContextRequirement,
    DecompositionKind, DecompositionOption, Operator, TrimmedAtGraph,
};
pub use error::GraphError;
pub use tdg::{DecompositionPath, PrimitiveStep, Tdg, TdgEdge, TdgNode};

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
