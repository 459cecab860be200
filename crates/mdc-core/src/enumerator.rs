//! Valid-mission enumerator: depth-first walk of a trimmed ATGraph,
//! maintaining a candidate list of jointly-consistent decomposition
//! selections and forking it at every OR choice point.

use std::collections::HashSet;

use mdc_graph::{AtGraphEdge, AtGraphNode, Operator, TrimmedAtGraph};
use mdc_registry::{FrozenRegistry, Literal};
use mdc_world::WorldState;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::ids::{AtInstanceId, DecompositionId};
use crate::PipelineError;

/// One partial (or, once enumeration completes, whole) mission
/// decomposition being built up across the DFS walk.
#[derive(Debug, Clone, Default)]
struct Candidate {
    /// Selected decompositions, in selection order.
    decompositions: Vec<DecompositionId>,
    /// The instance ids already committed in `decompositions`, for O(1)
    /// context-dependency membership checks.
    id_set: HashSet<AtInstanceId>,
    /// Effects committed by each selected instance, replayed (in
    /// `decompositions` order) to compute a task's live world.
    committed_effects: std::collections::HashMap<AtInstanceId, Vec<Literal>>,
}

/// One complete, jointly-consistent mission decomposition: an ordered
/// vector of decomposition selections, one per abstract-task instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionDecomposition {
    /// Selected decompositions, in DFS selection order.
    pub decompositions: Vec<DecompositionId>,
}

/// Walk `atgraph` depth-first from its root, producing every jointly
/// consistent mission decomposition.
///
/// # Errors
/// [`PipelineError::NoValidDecomposition`] if every candidate loses a task
/// (no available decomposition's preconditions hold against any
/// candidate's live world), [`PipelineError::ConflictingParallelEffects`]
/// if every candidate fails conflict resolution after a parallel operator,
/// [`PipelineError::BadDomain`] if `atgraph` carries no root (it was built
/// directly via [`mdc_graph::AtGraphBuilder::validate`] rather than
/// [`mdc_graph::assemble`]).
pub fn enumerate(
    atgraph: &TrimmedAtGraph,
    _registry: &FrozenRegistry,
    initial_world: &WorldState,
) -> Result<Vec<MissionDecomposition>, PipelineError> {
    let root = atgraph
        .root()
        .ok_or_else(|| PipelineError::BadDomain("ATGraph has no root; not built via assemble".to_string()))?;
    let seed = Candidate::default();
    let candidates = process(atgraph, initial_world, root, vec![seed])?;
    tracing::info!(count = candidates.len(), "valid-mission enumeration complete");
    Ok(candidates
        .into_iter()
        .map(|c| MissionDecomposition { decompositions: c.decompositions })
        .collect())
}

/// Outgoing edges of `node` of kind `kind`, in the order they were added to
/// the builder (same recovery technique as [`crate::goal_model::GoalModel::children`]).
fn ordered_targets(atgraph: &TrimmedAtGraph, node: NodeIndex, kind: AtGraphEdge) -> Vec<NodeIndex> {
    let mut out: Vec<(NodeIndex, usize)> = atgraph
        .graph()
        .edges_directed(node, Direction::Outgoing)
        .filter(|e| *e.weight() == kind)
        .map(|e| (e.target(), e.id().index()))
        .collect();
    out.sort_by_key(|(_, order)| *order);
    out.into_iter().map(|(n, _)| n).collect()
}

/// Source nodes of incoming [`AtGraphEdge::ContextDependency`] edges into
/// `node`.
fn context_providers(atgraph: &TrimmedAtGraph, node: NodeIndex) -> Vec<NodeIndex> {
    atgraph
        .graph()
        .edges_directed(node, Direction::Incoming)
        .filter(|e| *e.weight() == AtGraphEdge::ContextDependency)
        .map(|e| e.source())
        .collect()
}

/// Whether every context-dependency provider of `node` is already present
/// in `candidate`'s selection (its owning decomposition already chosen).
fn context_satisfied(atgraph: &TrimmedAtGraph, node: NodeIndex, candidate: &Candidate) -> bool {
    context_providers(atgraph, node).iter().all(|&provider| {
        let AtGraphNode::Path { id, .. } = &atgraph.graph()[provider] else {
            return false;
        };
        DecompositionId::parse(id).is_ok() && candidate.decompositions.iter().any(|d| d.as_str() == id)
    })
}

/// Replay `candidate`'s committed effects (in selection order) over
/// `initial_world` to compute its live world at this point in the walk.
fn live_world(initial_world: &WorldState, candidate: &Candidate) -> WorldState {
    let mut world = initial_world.clone();
    for dec_id in &candidate.decompositions {
        if let Ok((instance, _)) = DecompositionId::parse(dec_id.as_str()) {
            if let Some(effects) = candidate.committed_effects.get(&instance) {
                for lit in effects {
                    world.apply_effect(lit);
                }
            }
        }
    }
    world
}

/// `true` if no literal in `effects` contradicts another (same grounded
/// predicate, opposite sign).
fn effects_conflict(effects: &[Literal]) -> bool {
    for (i, a) in effects.iter().enumerate() {
        for b in &effects[i + 1..] {
            if *b == a.negate() {
                return true;
            }
        }
    }
    false
}

fn process(
    atgraph: &TrimmedAtGraph,
    initial_world: &WorldState,
    node: NodeIndex,
    candidates: Vec<Candidate>,
) -> Result<Vec<Candidate>, PipelineError> {
    match &atgraph.graph()[node] {
        AtGraphNode::AtInstance(instance_id) => process_at_instance(atgraph, initial_world, node, instance_id, candidates),
        AtGraphNode::Goal { id, achieve_condition } => {
            process_goal(atgraph, initial_world, node, id, achieve_condition.as_deref(), candidates)
        }
        AtGraphNode::Operator(op) => process_operator(atgraph, initial_world, node, *op, candidates),
        AtGraphNode::Path { .. } => Ok(candidates),
    }
}

fn process_at_instance(
    atgraph: &TrimmedAtGraph,
    initial_world: &WorldState,
    node: NodeIndex,
    instance_id: &str,
    candidates: Vec<Candidate>,
) -> Result<Vec<Candidate>, PipelineError> {
    let instance = AtInstanceId::new(instance_id)
        .map_err(|e| PipelineError::TypeError(format!("invalid instance id {instance_id}: {e}")))?;
    let paths = ordered_targets(atgraph, node, AtGraphEdge::NormalAnd);
    let had_candidates = !candidates.is_empty();

    let mut out = Vec::new();
    for candidate in candidates {
        let live = live_world(initial_world, &candidate);
        for &path_idx in &paths {
            let AtGraphNode::Path { id, preconditions, effects } = &atgraph.graph()[path_idx] else {
                continue;
            };
            let holds = preconditions.iter().all(|pre| !live.contradicts(pre));
            if !holds {
                continue;
            }
            if !context_satisfied(atgraph, path_idx, &candidate) {
                continue;
            }
            let Ok((parsed_instance, k)) = DecompositionId::parse(id) else {
                continue;
            };
            let dec_id = DecompositionId::new(&parsed_instance, k);
            let mut next = candidate.clone();
            next.decompositions.push(dec_id);
            next.id_set.insert(instance.clone());
            next.committed_effects.insert(instance.clone(), effects.clone());
            out.push(next);
        }
    }

    if out.is_empty() && had_candidates {
        return Err(PipelineError::NoValidDecomposition(instance_id.to_string()));
    }
    Ok(out)
}

fn process_goal(
    atgraph: &TrimmedAtGraph,
    initial_world: &WorldState,
    node: NodeIndex,
    goal_id: &str,
    achieve_condition: Option<&[Literal]>,
    candidates: Vec<Candidate>,
) -> Result<Vec<Candidate>, PipelineError> {
    let or_children = ordered_targets(atgraph, node, AtGraphEdge::NormalOr);
    let result = if !or_children.is_empty() {
        fork(atgraph, initial_world, &or_children, candidates)?
    } else {
        let and_children = ordered_targets(atgraph, node, AtGraphEdge::NormalAnd);
        sequence(atgraph, initial_world, &and_children, candidates)?
    };
    close_achieve_scope(initial_world, goal_id, achieve_condition, result)
}

/// Applied when a goal's AND/OR children finish processing: for an `Achieve`
/// goal that declared an achieve-condition, drop every candidate whose live
/// world (cumulative committed effects replayed over `initial_world`) doesn't
/// hold every literal of the condition. Errors if that empties the list.
fn close_achieve_scope(
    initial_world: &WorldState,
    goal_id: &str,
    achieve_condition: Option<&[Literal]>,
    candidates: Vec<Candidate>,
) -> Result<Vec<Candidate>, PipelineError> {
    let Some(literals) = achieve_condition else {
        return Ok(candidates);
    };
    let had_candidates = !candidates.is_empty();
    let surviving: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| {
            let live = live_world(initial_world, c);
            literals.iter().all(|lit| live.holds(lit))
        })
        .collect();
    if surviving.is_empty() && had_candidates {
        return Err(PipelineError::AchieveConditionViolated(goal_id.to_string()));
    }
    Ok(surviving)
}

fn process_operator(
    atgraph: &TrimmedAtGraph,
    initial_world: &WorldState,
    node: NodeIndex,
    op: Operator,
    candidates: Vec<Candidate>,
) -> Result<Vec<Candidate>, PipelineError> {
    if op == Operator::Or {
        let children = ordered_targets(atgraph, node, AtGraphEdge::NormalOr);
        return fork(atgraph, initial_world, &children, candidates);
    }
    let children = ordered_targets(atgraph, node, AtGraphEdge::NormalAnd);
    if op == Operator::Par {
        return parallel(atgraph, initial_world, &children, candidates);
    }
    // Seq and Fallback both commit children's effects in declaration order;
    // their constraint-level distinction is produced by `mdc-compose`, not
    // by this enumerator.
    sequence(atgraph, initial_world, &children, candidates)
}

/// Process children one after another, each seeing the previous children's
/// committed effects.
fn sequence(
    atgraph: &TrimmedAtGraph,
    initial_world: &WorldState,
    children: &[NodeIndex],
    mut candidates: Vec<Candidate>,
) -> Result<Vec<Candidate>, PipelineError> {
    for &child in children {
        candidates = process(atgraph, initial_world, child, candidates)?;
    }
    Ok(candidates)
}

/// Process each child against the same starting candidate list; branches do
/// not merge, they multiply the mission space.
fn fork(
    atgraph: &TrimmedAtGraph,
    initial_world: &WorldState,
    children: &[NodeIndex],
    candidates: Vec<Candidate>,
) -> Result<Vec<Candidate>, PipelineError> {
    let mut out = Vec::new();
    let mut last_err = None;
    for &child in children {
        match process(atgraph, initial_world, child, candidates.clone()) {
            Ok(mut branch) => out.append(&mut branch),
            Err(e) => last_err = Some(e),
        }
    }
    if out.is_empty() {
        if let Some(e) = last_err {
            return Err(e);
        }
    }
    Ok(out)
}

/// Process children in sequence (so later children still see earlier
/// committed effects, matching spec.md 4.6's per-candidate-world
/// commitment), then scan each resulting candidate's newly-committed
/// effects for a conflicting pair and drop it if one is found.
fn parallel(
    atgraph: &TrimmedAtGraph,
    initial_world: &WorldState,
    children: &[NodeIndex],
    candidates: Vec<Candidate>,
) -> Result<Vec<Candidate>, PipelineError> {
    let before: Vec<HashSet<AtInstanceId>> = candidates.iter().map(|c| c.id_set.clone()).collect();
    let after = sequence(atgraph, initial_world, children, candidates)?;

    let mut out = Vec::new();
    for candidate in after {
        // `before` was computed per input candidate; conservatively treat
        // every effect committed by an instance not present in *any* of the
        // original snapshots as "newly committed by this PAR branch".
        let newly_committed: Vec<Literal> = candidate
            .id_set
            .iter()
            .filter(|id| !before.iter().any(|b| b.contains(*id)))
            .filter_map(|id| candidate.committed_effects.get(id))
            .flatten()
            .cloned()
            .collect();
        if effects_conflict(&newly_committed) {
            continue;
        }
        out.push(candidate);
    }

    if out.is_empty() {
        return Err(PipelineError::ConflictingParallelEffects {
            a: "<parallel branch>".to_string(),
            b: "<parallel branch>".to_string(),
        });
    }
    Ok(out)
}
