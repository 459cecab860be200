//! Raw configuration records, as handed to this crate by an external
//! domain/configuration-file parser.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::mapping::SemanticMapping;

/// A single HDDL-variable-to-goal-model-variable binding rule, scoped to one
/// task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarMapping {
    /// The task this mapping applies to.
    pub task_id: String,
    /// HDDL-side variable name.
    pub hddl_var: String,
    /// Goal-model-side variable name.
    pub gm_var: String,
}

/// A fully-parsed configuration, not yet resolved into lookup structures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    /// World-model kind names that should be treated as location sorts.
    pub location_types: HashSet<String>,
    /// Sort name -> world-model kind name aliasing.
    pub type_mapping: HashMap<String, String>,
    /// Variable-mapping rules, one entry per (task, variable) pair.
    pub var_mapping: Vec<VarMapping>,
    /// Semantic mappings from knowledge-base shape to predicate/function
    /// vocabulary.
    pub semantic_mappings: Vec<SemanticMapping>,
}

impl Configuration {
    /// An empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
