//! Pairs each abstract-task instance with the decomposition paths its TDG
//! enumerates.

use indexmap::IndexMap;
use mdc_graph::{DecompositionOption, Tdg};
use mdc_registry::{FrozenRegistry, Literal};
use mdc_world::WorldState;

use crate::ids::{AtInstanceId, DecompositionId};
use crate::instance::{TaskInstanceExpansion, VarBindingValue};
use crate::PipelineError;

/// A grounded pairing of an abstract-task instance with one of its
/// TDG-enumerated decomposition paths.
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// `"<instance-id>|<k>"`.
    pub id: DecompositionId,
    /// The instance this decomposition belongs to.
    pub instance_id: AtInstanceId,
    /// The TDG path this decomposition realizes.
    pub path: mdc_graph::DecompositionPath,
    /// Accumulated, variable-renamed preconditions of the path's steps.
    pub preconditions: Vec<Literal>,
    /// Accumulated, variable-renamed effects of the path's steps.
    pub effects: Vec<Literal>,
}

impl Decomposition {
    /// Convert to the shape [`mdc_graph::assemble`] expects.
    #[must_use]
    pub fn as_option(&self) -> DecompositionOption {
        DecompositionOption {
            id: self.id.to_string(),
            preconditions: self.preconditions.clone(),
            effects: self.effects.clone(),
        }
    }
}

/// For every instance in `expansion`, build its TDG and enumerate every
/// decomposition path, producing one [`Decomposition`] per path.
///
/// An abstract task whose methods all yield zero paths produces an empty
/// vector for that instance rather than an error: emptiness is only fatal
/// once the valid-mission enumerator actually needs to select a
/// decomposition for it (section 4.1's failure semantics).
///
/// # Errors
/// Propagates [`mdc_graph::GraphError`] (via [`PipelineError::Graph`]) if
/// an instance's task definition does not exist in `registry`.
pub fn build_decompositions(
    expansion: &TaskInstanceExpansion,
    registry: &FrozenRegistry,
    initial_world: &WorldState,
) -> Result<IndexMap<AtInstanceId, Vec<Decomposition>>, PipelineError> {
    let mut out = IndexMap::new();
    for (id, instance) in &expansion.instances {
        let tdg = Tdg::build(&instance.at, registry)?;
        let root_args: std::collections::HashMap<String, String> = instance
            .var_bindings
            .iter()
            .filter_map(|(k, v)| match v {
                VarBindingValue::Scalar(s) => Some((k.clone(), s.clone())),
                VarBindingValue::Collection(_) => None,
            })
            .collect();
        let paths = tdg.enumerate_paths(registry, &root_args, initial_world);
        let decomps: Vec<Decomposition> = paths
            .into_iter()
            .enumerate()
            .map(|(k, path)| {
                let preconditions = path.accumulated_preconditions().into_iter().cloned().collect();
                let effects = path.accumulated_effects().into_iter().cloned().collect();
                Decomposition {
                    id: DecompositionId::new(id, k),
                    instance_id: id.clone(),
                    path,
                    preconditions,
                    effects,
                }
            })
            .collect();
        tracing::debug!(instance = %id, count = decomps.len(), "enumerated decomposition paths");
        out.insert(id.clone(), decomps);
    }
    Ok(out)
}

/// Build the `instance id -> decomposition options` map [`mdc_graph::assemble`]
/// needs, from an already-built decomposition table.
#[must_use]
pub fn as_option_map(
    decompositions: &IndexMap<AtInstanceId, Vec<Decomposition>>,
) -> std::collections::HashMap<String, Vec<DecompositionOption>> {
    decompositions
        .iter()
        .map(|(id, decomps)| (id.to_string(), decomps.iter().map(Decomposition::as_option).collect()))
        .collect()
}
