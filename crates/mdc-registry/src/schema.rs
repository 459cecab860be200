//! Predicate and function signatures.

use serde::{Deserialize, Serialize};

use crate::sort::SortName;

/// Declared signature of a predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredicateDef {
    /// Predicate name.
    pub name: String,
    /// Sorts of each argument position, in order.
    pub arg_sorts: Vec<SortName>,
}

/// Declared signature of a numeric function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    /// Function name.
    pub name: String,
    /// Sorts of each argument position, in order.
    pub arg_sorts: Vec<SortName>,
}
