//! Constraint extraction: walks a trimmed ATGraph and produces the minimal
//! set of binary inter-decomposition constraints a downstream allocator
//! needs (sequencing, fallback alternation, and robot-sharing exclusion).
//!
//! The teacher's `CompositionStrategy` trait existed so callers could choose
//! a strategy per artifact kind at runtime. Here the runtime-annotation
//! operator at each node *is* the strategy selector, so this module is a
//! single recursive stage function with a `match` on operator kind rather
//! than a trait-object registry (spec.md section 9).

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use mdc_graph::{AtGraphEdge, AtGraphNode, Operator, TrimmedAtGraph};
use mdc_registry::{FrozenRegistry, Literal};

use crate::error::CompositionError;

/// Kind of a constraint surviving into the extractor's output.
///
/// `PAR` and the `NON-EXISTENT` sentinel of spec.md section 3 never appear
/// here: they are intermediate-only (see [`IntermediateKind`]), so "the
/// extractor never outputs PAR constraints" is a compile-time guarantee
/// rather than a runtime assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmittedConstraintKind {
    /// `a` must be ordered strictly before `b`.
    Seq,
    /// Attempt `a`; only fall through to `b` if `a` fails.
    Fallback,
    /// `a` and `b` may not share a robot-typed argument.
    ExecExclusive,
}

/// A single binary constraint between two decompositions, identified by
/// their `"<at-id>|<k>"` ids (spec.md section 3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Constraint kind.
    pub kind: EmittedConstraintKind,
    /// First decomposition id.
    pub a: String,
    /// Second decomposition id.
    pub b: String,
    /// `group` flag of the enclosing scope, set only for [`EmittedConstraintKind::ExecExclusive`].
    pub group: Option<bool>,
    /// `divisible` flag of the enclosing scope, set only for [`EmittedConstraintKind::ExecExclusive`].
    pub divisible: Option<bool>,
}

impl Constraint {
    fn seq(a: String, b: String) -> Self {
        Self { kind: EmittedConstraintKind::Seq, a, b, group: None, divisible: None }
    }

    fn fallback(a: String, b: String) -> Self {
        Self { kind: EmittedConstraintKind::Fallback, a, b, group: None, divisible: None }
    }

    fn exec_exclusive(a: String, b: String, group: bool, divisible: bool) -> Self {
        Self {
            kind: EmittedConstraintKind::ExecExclusive,
            a,
            b,
            group: Some(group),
            divisible: Some(divisible),
        }
    }
}

/// Intermediate-only constraint kind used while recursing; `Par` never
/// survives to the public [`Constraint`] type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntermediateKind {
    Seq,
    Par,
    Fallback,
}

#[derive(Debug, Clone)]
struct Intermediate {
    kind: IntermediateKind,
    a: String,
    b: String,
}

/// What a subtree contributes to its enclosing combinator: the decomposition
/// ids that could be first/last executed, every decomposition id reachable
/// underneath it (for context-dependency and exec-exclusive cross-referencing),
/// and the constraints already settled within it.
#[derive(Debug, Clone, Default)]
struct BranchInfo {
    firsts: Vec<String>,
    lasts: Vec<String>,
    all_ids: HashSet<String>,
    local: Vec<Intermediate>,
}

impl BranchInfo {
    fn leaf(ids: Vec<String>) -> Self {
        Self {
            firsts: ids.clone(),
            lasts: ids.clone(),
            all_ids: ids.into_iter().collect(),
            local: Vec::new(),
        }
    }

    fn merge_ids<'a>(branches: impl Iterator<Item = &'a BranchInfo>) -> HashSet<String> {
        branches.flat_map(|b| b.all_ids.iter().cloned()).collect()
    }
}

/// Extract the minimal set of SEQ/FALLBACK/EXEC-EXCLUSIVE constraints from
/// `atgraph`, per spec.md section 4.5.
///
/// # Errors
/// Returns [`CompositionError::MissingRoot`] if `atgraph` was not produced by
/// [`mdc_graph::assemble`].
pub fn extract_constraints(
    atgraph: &TrimmedAtGraph,
    registry: &FrozenRegistry,
) -> Result<Vec<Constraint>, CompositionError> {
    let root = atgraph.root().ok_or(CompositionError::MissingRoot)?;
    let info = walk(atgraph, root);

    let mut local = info.local;
    promote_context_dependencies(atgraph, &mut local);

    let mut out: Vec<Constraint> = local
        .into_iter()
        .filter_map(|i| match i.kind {
            IntermediateKind::Seq => Some(Constraint::seq(i.a, i.b)),
            IntermediateKind::Fallback => Some(Constraint::fallback(i.a, i.b)),
            IntermediateKind::Par => None, // default when no SEQ forces it; drop
        })
        .collect();

    out.extend(exec_exclusive_constraints(atgraph, registry));
    Ok(out)
}

/// Recurse over the trimmed ATGraph, dispatching on node kind.
fn walk(atgraph: &TrimmedAtGraph, node: NodeIndex) -> BranchInfo {
    match &atgraph.graph()[node] {
        AtGraphNode::AtInstance(_) => {
            let ids = ordered_children(atgraph, node, AtGraphEdge::NormalAnd)
                .into_iter()
                .filter_map(|c| match &atgraph.graph()[c] {
                    AtGraphNode::Path { id, .. } => Some(id.clone()),
                    _ => None,
                })
                .collect();
            BranchInfo::leaf(ids)
        }
        AtGraphNode::Path { id, .. } => BranchInfo::leaf(vec![id.clone()]),
        AtGraphNode::Operator(op) => {
            let kind = if *op == Operator::Or { AtGraphEdge::NormalOr } else { AtGraphEdge::NormalAnd };
            let branches: Vec<BranchInfo> = ordered_children(atgraph, node, kind)
                .into_iter()
                .map(|c| walk(atgraph, c))
                .collect();
            match op {
                Operator::Seq => combine_seq(branches),
                Operator::Par => combine_par(atgraph, branches),
                Operator::Fallback => combine_fallback(branches),
                Operator::Or => combine_or(branches),
            }
        }
        AtGraphNode::Goal { .. } => {
            let or_children = ordered_children(atgraph, node, AtGraphEdge::NormalOr);
            if !or_children.is_empty() {
                combine_or(or_children.into_iter().map(|c| walk(atgraph, c)).collect())
            } else {
                // AND-decomposed goal with no wrapping runtime-annotation operator:
                // children compose with no declared order, i.e. parallel by
                // default (promoted to SEQ only if a context dependency forces it).
                let and_children = ordered_children(atgraph, node, AtGraphEdge::NormalAnd);
                combine_par(atgraph, and_children.into_iter().map(|c| walk(atgraph, c)).collect())
            }
        }
    }
}

/// Outgoing neighbors of `node` linked by `kind`, in the order they were
/// added to the graph (petgraph's adjacency list yields most-recently-added
/// first, so we sort by ascending edge index to recover declaration order).
fn ordered_children(atgraph: &TrimmedAtGraph, node: NodeIndex, kind: AtGraphEdge) -> Vec<NodeIndex> {
    let mut edges: Vec<_> = atgraph
        .graph()
        .edges_directed(node, Direction::Outgoing)
        .filter(|e| *e.weight() == kind)
        .collect();
    edges.sort_by_key(|e| e.id().index());
    edges.into_iter().map(|e| e.target()).collect()
}

fn combine_seq(branches: Vec<BranchInfo>) -> BranchInfo {
    if branches.is_empty() {
        return BranchInfo::default();
    }
    let mut local: Vec<Intermediate> = branches.iter().flat_map(|b| b.local.clone()).collect();

    for w in branches.windows(2) {
        for a in &w[0].lasts {
            for b in &w[1].firsts {
                local.push(Intermediate { kind: IntermediateKind::Seq, a: a.clone(), b: b.clone() });
            }
        }
    }

    // Lift any PAR contributed by a child branch to SEQ if it crosses this
    // SEQ's own branch boundary (spec.md section 4.5).
    let branch_of = |id: &str| branches.iter().position(|b| b.all_ids.contains(id));
    for inter in &mut local {
        if inter.kind != IntermediateKind::Par {
            continue;
        }
        if let (Some(ia), Some(ib)) = (branch_of(&inter.a), branch_of(&inter.b)) {
            if ia < ib {
                inter.kind = IntermediateKind::Seq;
            } else if ib < ia {
                inter.kind = IntermediateKind::Seq;
                std::mem::swap(&mut inter.a, &mut inter.b);
            }
        }
    }

    BranchInfo {
        firsts: branches[0].firsts.clone(),
        lasts: branches[branches.len() - 1].lasts.clone(),
        all_ids: BranchInfo::merge_ids(branches.iter()),
        local,
    }
}

fn combine_par(atgraph: &TrimmedAtGraph, branches: Vec<BranchInfo>) -> BranchInfo {
    if branches.is_empty() {
        return BranchInfo::default();
    }
    let owner = owner_index_of(atgraph);
    let mut local: Vec<Intermediate> = branches.iter().flat_map(|b| b.local.clone()).collect();

    for i in 0..branches.len() {
        for j in (i + 1)..branches.len() {
            for a in &branches[i].all_ids {
                for b in &branches[j].all_ids {
                    if already_execution_constrained(atgraph, &owner, a, b) {
                        continue; // subsumed by an EXEC-EXCLUSIVE constraint instead
                    }
                    local.push(Intermediate { kind: IntermediateKind::Par, a: a.clone(), b: b.clone() });
                }
            }
        }
    }

    BranchInfo {
        firsts: branches.iter().flat_map(|b| b.firsts.clone()).collect(),
        lasts: branches.iter().flat_map(|b| b.lasts.clone()).collect(),
        all_ids: BranchInfo::merge_ids(branches.iter()),
        local,
    }
}

fn combine_fallback(branches: Vec<BranchInfo>) -> BranchInfo {
    if branches.is_empty() {
        return BranchInfo::default();
    }
    let mut local: Vec<Intermediate> = branches.iter().flat_map(|b| b.local.clone()).collect();
    for w in branches.windows(2) {
        for a in &w[0].firsts {
            for b in &w[1].firsts {
                local.push(Intermediate { kind: IntermediateKind::Fallback, a: a.clone(), b: b.clone() });
            }
        }
    }
    BranchInfo {
        firsts: branches.iter().flat_map(|b| b.firsts.clone()).collect(),
        lasts: branches.iter().flat_map(|b| b.lasts.clone()).collect(),
        all_ids: BranchInfo::merge_ids(branches.iter()),
        local,
    }
}

fn combine_or(branches: Vec<BranchInfo>) -> BranchInfo {
    // OR forks the mission space; branches never combine with each other.
    BranchInfo {
        firsts: branches.iter().flat_map(|b| b.firsts.clone()).collect(),
        lasts: branches.iter().flat_map(|b| b.lasts.clone()).collect(),
        all_ids: BranchInfo::merge_ids(branches.iter()),
        local: branches.into_iter().flat_map(|b| b.local).collect(),
    }
}

/// Map every decomposition id to the [`NodeIndex`] of its owning `AtInstance`.
fn owner_index_of(atgraph: &TrimmedAtGraph) -> HashMap<String, NodeIndex> {
    let mut map = HashMap::new();
    for idx in atgraph.graph().node_indices() {
        if matches!(atgraph.graph()[idx], AtGraphNode::AtInstance(_)) {
            for child in ordered_children(atgraph, idx, AtGraphEdge::NormalAnd) {
                if let AtGraphNode::Path { id, .. } = &atgraph.graph()[child] {
                    map.insert(id.clone(), idx);
                }
            }
        }
    }
    map
}

fn already_execution_constrained(
    atgraph: &TrimmedAtGraph,
    owner: &HashMap<String, NodeIndex>,
    a: &str,
    b: &str,
) -> bool {
    match (owner.get(a), owner.get(b)) {
        (Some(&oa), Some(&ob)) => oa != ob && atgraph.exec_constraint_flags(oa, ob).is_some(),
        _ => false,
    }
}

/// Collect every decomposition id reachable from `node` by following
/// `NORMAL-AND`/`NORMAL-OR` edges (ignoring context-dependency and
/// execution-constraint edges, which do not represent containment).
fn decomp_ids_under(atgraph: &TrimmedAtGraph, node: NodeIndex) -> HashSet<String> {
    let mut out = HashSet::new();
    let mut stack = vec![node];
    let mut visited = HashSet::new();
    while let Some(cur) = stack.pop() {
        if !visited.insert(cur) {
            continue;
        }
        match &atgraph.graph()[cur] {
            AtGraphNode::Path { id, .. } => {
                out.insert(id.clone());
            }
            _ => {
                for next in ordered_children(atgraph, cur, AtGraphEdge::NormalAnd) {
                    stack.push(next);
                }
                for next in ordered_children(atgraph, cur, AtGraphEdge::NormalOr) {
                    stack.push(next);
                }
            }
        }
    }
    out
}

/// For every `CONTEXT-DEPENDENCY` edge `provider -> dependent`, promote any
/// `PAR(a, b)` (in either orientation) where `a` is under `provider` and `b`
/// is under `dependent` to `SEQ(a, b)` (spec.md section 4.5).
fn promote_context_dependencies(atgraph: &TrimmedAtGraph, local: &mut [Intermediate]) {
    for edge in atgraph.graph().edge_references() {
        if *edge.weight() != AtGraphEdge::ContextDependency {
            continue;
        }
        let provider_ids = decomp_ids_under(atgraph, edge.source());
        let dependent_ids = decomp_ids_under(atgraph, edge.target());
        for inter in local.iter_mut() {
            if inter.kind != IntermediateKind::Par {
                continue;
            }
            let forward = provider_ids.contains(&inter.a) && dependent_ids.contains(&inter.b);
            let backward = provider_ids.contains(&inter.b) && dependent_ids.contains(&inter.a);
            if forward {
                inter.kind = IntermediateKind::Seq;
            } else if backward {
                inter.kind = IntermediateKind::Seq;
                std::mem::swap(&mut inter.a, &mut inter.b);
            }
        }
    }
}

/// Whether `d1` can coexist with `d2`.
///
/// Returns `false` if `d1`'s effects contradict `d2`'s preconditions
/// (same grounded predicate/function+args, opposite sign or mismatched
/// value), or if `exclusion` is set and the two share a robot-typed
/// argument.
#[must_use]
pub fn can_unite(
    d1_effects: &[Literal],
    d1_args: &[String],
    d2_preconditions: &[Literal],
    d2_args: &[String],
    exclusion: bool,
    registry: &FrozenRegistry,
) -> bool {
    if effects_contradict(d1_effects, d2_preconditions) {
        return false;
    }
    if exclusion && share_robot_argument(d1_args, d2_args, registry) {
        return false;
    }
    true
}

fn effects_contradict(effects: &[Literal], preconditions: &[Literal]) -> bool {
    for e in effects {
        for p in preconditions {
            if literals_contradict(e, p) {
                return true;
            }
        }
    }
    false
}

fn literals_contradict(a: &Literal, b: &Literal) -> bool {
    match (a, b) {
        (
            Literal::Predicate { name: n1, args: a1, positive: p1 },
            Literal::Predicate { name: n2, args: a2, positive: p2 },
        ) => n1 == n2 && a1 == a2 && p1 != p2,
        (
            Literal::Comparison { function: f1, args: a1, op: o1, value: v1 },
            Literal::Comparison { function: f2, args: a2, op: o2, value: v2 },
        ) => {
            f1 == f2
                && a1 == a2
                && *o1 == mdc_registry::CompareOp::Eq
                && *o2 == mdc_registry::CompareOp::Eq
                && (v1 - v2).abs() > f64::EPSILON
        }
        _ => false,
    }
}

fn literal_args(l: &Literal) -> &[String] {
    match l {
        Literal::Predicate { args, .. } | Literal::Comparison { args, .. } => args,
    }
}

fn share_robot_argument(d1_args: &[String], d2_args: &[String], registry: &FrozenRegistry) -> bool {
    let robots_1: HashSet<&str> = d1_args
        .iter()
        .map(String::as_str)
        .filter(|a| registry.sorts().is_in_sort(a, "robot"))
        .collect();
    d2_args
        .iter()
        .any(|a| registry.sorts().is_in_sort(a, "robot") && robots_1.contains(a.as_str()))
}

/// Derive the flat argument set of a decomposition from the union of its
/// preconditions' and effects' literal arguments (the ATGraph's `Path` node
/// only retains accumulated literals, not a per-step argument list).
fn args_of(literals: &[Literal]) -> Vec<String> {
    let mut set: HashSet<String> = HashSet::new();
    for l in literals {
        for a in literal_args(l) {
            set.insert(a.clone());
        }
    }
    let mut out: Vec<String> = set.into_iter().collect();
    out.sort();
    out
}

fn exec_exclusive_constraints(atgraph: &TrimmedAtGraph, registry: &FrozenRegistry) -> Vec<Constraint> {
    let mut seen_pairs: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
    let mut out = Vec::new();
    for edge in atgraph.graph().edge_references() {
        if *edge.weight() != AtGraphEdge::ExecutionConstraint {
            continue;
        }
        let (a, b) = (edge.source(), edge.target());
        let key = if a.index() <= b.index() { (a, b) } else { (b, a) };
        if !seen_pairs.insert(key) {
            continue;
        }
        let Some((group, divisible)) = atgraph.exec_constraint_flags(a, b) else {
            continue;
        };
        let paths_a = path_nodes_of(atgraph, a);
        let paths_b = path_nodes_of(atgraph, b);
        for (id1, pre1, eff1) in &paths_a {
            for (id2, pre2, eff2) in &paths_b {
                let args1 = args_of(&[pre1.clone(), eff1.clone()].concat());
                let args2 = args_of(&[pre2.clone(), eff2.clone()].concat());
                // "consistent ... ignoring robot identities" (spec.md section 4.5):
                // filter with exclusion=false, the robot-sharing check itself is
                // what the emitted constraint exists to forbid at enumeration time.
                if can_unite(eff1, &args1, pre2, &args2, false, registry) {
                    out.push(Constraint::exec_exclusive(id1.clone(), id2.clone(), group, divisible));
                }
            }
        }
    }
    out
}

fn path_nodes_of(atgraph: &TrimmedAtGraph, at_instance: NodeIndex) -> Vec<(String, Vec<Literal>, Vec<Literal>)> {
    ordered_children(atgraph, at_instance, AtGraphEdge::NormalAnd)
        .into_iter()
        .filter_map(|c| match &atgraph.graph()[c] {
            AtGraphNode::Path { id, preconditions, effects } => {
                Some((id.clone(), preconditions.clone(), effects.clone()))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdc_graph::{AnnotationNode, DecompositionKind, DecompositionOption};
    use mdc_registry::Registry;
    use mdc_world::WorldState;

    fn leaf(id: &str) -> AnnotationNode {
        AnnotationNode::TaskLeaf { instance_id: id.into() }
    }

    fn option(id: &str, preconditions: Vec<Literal>, effects: Vec<Literal>) -> DecompositionOption {
        DecompositionOption { id: id.into(), preconditions, effects }
    }

    fn registry() -> FrozenRegistry {
        let mut reg = Registry::new();
        reg.sorts_mut().add_object("robot", "r1").unwrap();
        reg.sorts_mut().add_object("robot", "r2").unwrap();
        reg.freeze()
    }

    #[test]
    fn seq_operator_yields_seq_constraint() {
        let tree = AnnotationNode::Operator {
            op: Operator::Seq,
            children: vec![leaf("t1"), leaf("t2")],
        };
        let mut decomps = HashMap::new();
        decomps.insert("t1".to_string(), vec![option("t1|0", vec![], vec![])]);
        decomps.insert("t2".to_string(), vec![option("t2|0", vec![], vec![])]);
        let atgraph = mdc_graph::assemble(&tree, &decomps, &WorldState::new()).unwrap();
        let registry = registry();
        let constraints = extract_constraints(&atgraph, &registry).unwrap();
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].kind, EmittedConstraintKind::Seq);
        assert_eq!(constraints[0].a, "t1|0");
        assert_eq!(constraints[0].b, "t2|0");
    }

    #[test]
    fn par_operator_with_independent_effects_yields_no_constraints() {
        let tree = AnnotationNode::Operator {
            op: Operator::Par,
            children: vec![leaf("t1"), leaf("t2")],
        };
        let mut decomps = HashMap::new();
        decomps.insert("t1".to_string(), vec![option("t1|0", vec![], vec![])]);
        decomps.insert("t2".to_string(), vec![option("t2|0", vec![], vec![])]);
        let atgraph = mdc_graph::assemble(&tree, &decomps, &WorldState::new()).unwrap();
        let registry = registry();
        let constraints = extract_constraints(&atgraph, &registry).unwrap();
        assert!(constraints.is_empty());
    }

    #[test]
    fn context_dependency_promotes_par_to_seq() {
        let needed = Literal::predicate("clean", vec!["room1".into()]);
        let tree = AnnotationNode::Operator {
            op: Operator::Par,
            children: vec![
                leaf("t1"),
                AnnotationNode::Goal {
                    id: "g2".into(),
                    decomposition: DecompositionKind::And,
                    context: Some(mdc_graph::ContextRequirement { literals: vec![needed.clone()] }),
                    group: true,
                    divisible: true,
                    achieve_condition: None,
                    children: vec![leaf("t2")],
                },
            ],
        };
        let mut decomps = HashMap::new();
        decomps.insert("t1".to_string(), vec![option("t1|0", vec![], vec![needed])]);
        decomps.insert("t2".to_string(), vec![option("t2|0", vec![], vec![])]);
        let atgraph = mdc_graph::assemble(&tree, &decomps, &WorldState::new()).unwrap();
        let registry = registry();
        let constraints = extract_constraints(&atgraph, &registry).unwrap();
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].kind, EmittedConstraintKind::Seq);
        assert_eq!(constraints[0].a, "t1|0");
        assert_eq!(constraints[0].b, "t2|0");
    }

    #[test]
    fn non_group_scope_yields_exec_exclusive_constraint() {
        let tree = AnnotationNode::Goal {
            id: "g1".into(),
            decomposition: DecompositionKind::And,
            context: None,
            group: false,
            divisible: true,
            achieve_condition: None,
            children: vec![leaf("t1"), leaf("t2")],
        };
        let mut decomps = HashMap::new();
        decomps.insert(
            "t1".to_string(),
            vec![option("t1|0", vec![], vec![Literal::predicate("holding", vec!["r1".into()])])],
        );
        decomps.insert(
            "t2".to_string(),
            vec![option("t2|0", vec![], vec![Literal::predicate("holding", vec!["r2".into()])])],
        );
        let atgraph = mdc_graph::assemble(&tree, &decomps, &WorldState::new()).unwrap();
        let registry = registry();
        let constraints = extract_constraints(&atgraph, &registry).unwrap();
        let exclusive: Vec<_> = constraints
            .iter()
            .filter(|c| c.kind == EmittedConstraintKind::ExecExclusive)
            .collect();
        assert_eq!(exclusive.len(), 1);
        assert_eq!(exclusive[0].group, Some(false));
    }

    #[test]
    fn can_unite_detects_contradicting_effects() {
        let registry = registry();
        let effects = vec![Literal::predicate("clean", vec!["room1".into()])];
        let preconditions = vec![Literal::not_predicate("clean", vec!["room1".into()])];
        assert!(!can_unite(&effects, &[], &preconditions, &[], false, &registry));
    }

    #[test]
    fn can_unite_detects_shared_robot_argument() {
        let registry = registry();
        assert!(!can_unite(
            &[],
            &["r1".to_string()],
            &[],
            &["r1".to_string()],
            true,
            &registry
        ));
        assert!(can_unite(&[], &["r1".to_string()], &[], &["r1".to_string()], false, &registry));
    }
}
