//! The single synchronous entry point bundling all three compilation
//! stages: task-instance expansion, runtime-annotation + TDG enumeration,
//! and ATGraph assembly + constraint extraction + mission enumeration.

use mdc_compose::{extract_constraints, Constraint};
use mdc_config::{typecheck, ConfigResolver};
use mdc_graph::{assemble, TrimmedAtGraph};
use mdc_registry::FrozenRegistry;
use mdc_world::{KnowledgeBase, WorldState};

use crate::annotation;
use crate::decomposition::{self, Decomposition};
use crate::enumerator::{self, MissionDecomposition};
use crate::goal_model::GoalModel;
use crate::ids::AtInstanceId;
use crate::instance::{self, TaskInstanceExpansion};
use crate::PipelineError;

/// The fully-compiled output of a mission decomposition run.
pub struct CompiledMission {
    /// The assembled, trimmed mission-decomposition graph.
    pub atgraph: TrimmedAtGraph,
    /// The extracted SEQ/FALLBACK/EXEC-EXCLUSIVE constraints.
    pub constraints: Vec<Constraint>,
    /// Every valid mission decomposition.
    pub missions: Vec<MissionDecomposition>,
    /// Every task-instance expanded in stage 1, kept alongside the output
    /// so a caller can resolve a `MissionDecomposition`'s decomposition ids
    /// back to grounded [`instance::AtInstance`]s without re-running
    /// expansion.
    pub instances: TaskInstanceExpansion,
    /// Every decomposition considered during assembly, keyed by owning
    /// instance id.
    pub decompositions: indexmap::IndexMap<AtInstanceId, Vec<Decomposition>>,
}

/// Compiles a declarative goal model, grounded against a knowledge base and
/// a domain, into a trimmed mission-decomposition graph, its constraints,
/// and every valid mission decomposition.
///
/// Configuration validity (`var_mapping`/`semantic_mapping` well-formedness)
/// is checked once, eagerly, before stage 1 runs.
pub struct Pipeline;

impl Pipeline {
    /// Run all three stages. `initial_world` seeds the symbolic world used
    /// throughout TDG path enumeration, ATGraph assembly, and mission
    /// enumeration; pass [`WorldState::new`] for a KB-only initial state.
    ///
    /// # Errors
    /// Propagates any [`PipelineError`] raised by configuration validation
    /// or any of the three stages; the first failure aborts the run.
    pub fn compile(
        registry: &FrozenRegistry,
        goal_model: &GoalModel,
        kb: &KnowledgeBase,
        config: &ConfigResolver,
        initial_world: &WorldState,
    ) -> Result<CompiledMission, PipelineError> {
        tracing::info!("starting mission compilation");

        typecheck::check_var_mappings(config, registry)?;
        typecheck::check_configuration(config, registry)?;

        let instances = instance::expand(goal_model, kb, config, registry)?;
        tracing::debug!(count = instances.instances.len(), "stage 1 complete: task instances expanded");

        let decompositions = decomposition::build_decompositions(&instances, registry, initial_world)?;
        let options = decomposition::as_option_map(&decompositions);
        tracing::debug!("stage 1b complete: decomposition paths enumerated");

        let tree = annotation::build(goal_model, &instances)?;
        tracing::debug!("stage 2 complete: runtime-annotation tree built");

        let atgraph = assemble(&tree, &options, initial_world)?;
        tracing::debug!("stage 3a complete: ATGraph assembled");

        let constraints = extract_constraints(&atgraph, registry)?;
        tracing::debug!(count = constraints.len(), "stage 3b complete: constraints extracted");

        let missions = enumerator::enumerate(&atgraph, registry, initial_world)?;
        tracing::info!(count = missions.len(), "mission compilation complete");

        Ok(CompiledMission {
            atgraph,
            constraints,
            missions,
            instances,
            decompositions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal_model::{GmEdge, GmNode, GoalType};
    use mdc_config::Configuration;
    use mdc_graph::DecompositionKind;
    use mdc_registry::{Parameter, Registry, Task};

    #[test]
    fn single_primitive_task_compiles_to_one_mission() {
        let mut registry = Registry::new();
        registry
            .declare_task(Task::primitive("go", vec![Parameter::new("?r", "robot")], Vec::new(), Vec::new()))
            .unwrap();
        let registry = registry.freeze();

        let mut gm = GoalModel::new();
        let root = gm.add_node(GmNode::goal("root", GoalType::Achieve));
        let task = gm.add_node(GmNode::task("go"));
        gm.add_edge(root, task, GmEdge { decomposition: DecompositionKind::And, means_end: false });

        let kb = KnowledgeBase::new("world");
        let resolver = ConfigResolver::new(Configuration::new());
        let world = WorldState::new();

        let compiled = Pipeline::compile(&registry, &gm, &kb, &resolver, &world).unwrap();
        assert_eq!(compiled.missions.len(), 1);
        assert_eq!(compiled.missions[0].decompositions.len(), 1);
    }
}
