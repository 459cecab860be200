//! Knowledge-base tree, attribute paths, and symbolic world state.
//!
//! # Overview
//!
//! - [`kb::KnowledgeBase`]: an arena-backed typed tree of world objects with
//!   attributes and named child collections.
//! - [`path::AttrPath`]: hierarchical addressing into the knowledge base,
//!   used by configuration semantic mappings and goal-model query expressions.
//! - [`state::WorldState`]: the symbolic open-world fact set threaded through
//!   TDG path enumeration and valid-mission enumeration.

#![warn(missing_docs)]

pub mod error;
pub mod kb;
pub mod path;
pub mod state;

pub use error::WorldError;
pub use kb::{AttrValue, KbNode, KbNodeId, KnowledgeBase, ScalarValue};
pub use path::AttrPath;
pub use state::WorldState;

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
