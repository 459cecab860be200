//! Mission decomposition graph (ATGraph): the tagged-union graph produced by
//! combining task instances, goal runtime-annotation operators, and chosen
//! decomposition paths, together with its context-dependency and
//! execution-constraint edges.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::{debug, warn};

use mdc_registry::Literal;
use mdc_world::WorldState;

use crate::error::GraphError;

/// Runtime-annotation operator kind, attached to [`AtGraphNode::Operator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Sequential composition (`;`).
    Seq,
    /// Parallel composition (`#`). Never survives into extracted constraints;
    /// every `Par` subtree is either lifted to `Seq` via a context
    /// dependency or resolved during mission enumeration.
    Par,
    /// First success wins.
    Fallback,
    /// Method-choice style alternation over goal decomposition.
    Or,
}

/// A node in the ATGraph.
#[derive(Debug, Clone)]
pub enum AtGraphNode {
    /// A runtime-annotation operator combining its children.
    Operator(Operator),
    /// A goal-model goal, identified by its id.
    Goal {
        /// Stable goal-model id.
        id: String,
        /// Literals the goal must leave holding in the live world at the
        /// point its scope closes, if it declared an achieve-condition.
        achieve_condition: Option<Vec<Literal>>,
    },
    /// An abstract-task instance, identified by its instance id.
    AtInstance(String),
    /// A chosen decomposition path for an instance, identified by its
    /// decomposition id, carrying the accumulated preconditions and effects
    /// of its steps (effects are used by context-dependency search;
    /// preconditions by `can_unite` in the constraint extractor).
    Path {
        /// Decomposition id.
        id: String,
        /// Accumulated preconditions of the path's steps.
        preconditions: Vec<Literal>,
        /// Accumulated effects of the path's steps.
        effects: Vec<Literal>,
    },
}

/// Edge kind in the ATGraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtGraphEdge {
    /// AND-decomposition edge (operator/goal to its required children).
    NormalAnd,
    /// OR-decomposition edge (goal/operator to one of its alternatives).
    NormalOr,
    /// A context dependency discovered during left-to-right search: the
    /// source is the earlier task that establishes an effect, and the
    /// target is the dependent subtree whose context required it -- the
    /// source must appear strictly before the target in any valid mission.
    ContextDependency,
    /// An execution-exclusivity constraint between two instances that may
    /// not run concurrently.
    ExecutionConstraint,
}

/// Builder for an ATGraph; mutation is only possible before [`AtGraphBuilder::validate`].
#[derive(Default)]
pub struct AtGraphBuilder {
    graph: DiGraph<AtGraphNode, AtGraphEdge>,
}

impl AtGraphBuilder {
    /// New, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its index.
    pub fn add_node(&mut self, node: AtGraphNode) -> NodeIndex {
        self.graph.add_node(node)
    }

    /// Add an edge between two existing nodes.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, kind: AtGraphEdge) {
        self.graph.add_edge(from, to, kind);
    }

    /// Search left-to-right, bottom-up from `from` for an earlier
    /// [`AtGraphNode::Path`] whose effects satisfy `needed`: first the
    /// node's already-visited predecessors (parent chain), then, within
    /// each ancestor's children, any sibling added before `from` (lower
    /// [`NodeIndex`], since the builder assigns indices in program order).
    /// Returns the first match, or `None` if no earlier path satisfies it.
    #[must_use]
    pub fn search_left_to_right(&self, from: NodeIndex, needed: &Literal) -> Option<NodeIndex> {
        let mut candidates: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| idx < from)
            .collect();
        candidates.sort_by(|a, b| b.index().cmp(&a.index())); // nearest first
        candidates.into_iter().find(|&idx| {
            matches!(&self.graph[idx], AtGraphNode::Path { effects, .. } if effects.contains(needed))
        })
    }

    /// Add a context-dependency edge from `dependent` to whichever earlier
    /// path establishes `needed`, if one is found.
    ///
    /// Returns `true` if a dependency edge was installed.
    pub fn resolve_context(&mut self, dependent: NodeIndex, needed: &Literal) -> bool {
        if let Some(provider) = self.search_left_to_right(dependent, needed) {
            self.add_edge(dependent, provider, AtGraphEdge::ContextDependency);
            true
        } else {
            debug!("context dependency unresolved for {:?}", needed);
            false
        }
    }

    /// Seal the graph. Checks it is acyclic once context-dependency and
    /// execution-constraint edges (which never introduce semantic cycles by
    /// construction, since they only ever point strictly backward) are
    /// accounted for.
    ///
    /// # Errors
    /// Returns [`GraphError::ValidationFailed`] if the underlying AND/OR
    /// structure (ignoring back-pointing dependency edges) contains a cycle.
    pub fn validate(self) -> Result<TrimmedAtGraph, GraphError> {
        let structural: DiGraph<(), ()> = self.graph.filter_map(
            |_, _| Some(()),
            |_, edge| matches!(edge, AtGraphEdge::NormalAnd | AtGraphEdge::NormalOr).then_some(()),
        );
        if petgraph::algo::is_cyclic_directed(&structural) {
            return Err(GraphError::ValidationFailed(
                "AND/OR structure contains a cycle".to_string(),
            ));
        }
        Ok(TrimmedAtGraph {
            graph: self.graph,
            root: None,
            exec_constraint_flags: HashMap::new(),
        })
    }
}

/// A validated, sealed ATGraph. Can only be produced by [`AtGraphBuilder::validate`]
/// or [`assemble`].
pub struct TrimmedAtGraph {
    graph: DiGraph<AtGraphNode, AtGraphEdge>,
    /// Root node of the assembled tree, `None` when built directly via
    /// [`AtGraphBuilder::validate`] rather than [`assemble`].
    root: Option<NodeIndex>,
    /// `(group, divisible)` flags for each [`AtGraphEdge::ExecutionConstraint`]
    /// edge, keyed by the unordered pair it connects. Side table rather than
    /// an edge payload so [`AtGraphEdge`] stays a plain `Copy` enum usable as
    /// a filter key in [`TrimmedAtGraph::edges_of_kind`].
    exec_constraint_flags: HashMap<(NodeIndex, NodeIndex), (bool, bool)>,
}

impl TrimmedAtGraph {
    /// The underlying graph.
    #[must_use]
    pub fn graph(&self) -> &DiGraph<AtGraphNode, AtGraphEdge> {
        &self.graph
    }

    /// Root node of the assembled mission tree, if this graph came from
    /// [`assemble`].
    #[must_use]
    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    /// Outgoing edges of `node` of a given kind.
    pub fn edges_of_kind(&self, node: NodeIndex, kind: AtGraphEdge) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .filter(move |e| *e.weight() == kind)
            .map(|e| e.target())
    }

    /// `(group, divisible)` flags of the execution-constraint edge between
    /// `a` and `b`, if one exists (order-independent).
    #[must_use]
    pub fn exec_constraint_flags(&self, a: NodeIndex, b: NodeIndex) -> Option<(bool, bool)> {
        let key = if a.index() <= b.index() { (a, b) } else { (b, a) };
        self.exec_constraint_flags.get(&key).copied()
    }
}

/// Decomposition kind carried by a [`AnnotationNode::Goal`], mirroring the
/// AND/OR decomposition edges of the source goal-model tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompositionKind {
    /// Every child is required.
    And,
    /// Exactly one child is chosen, forking the mission space.
    Or,
}

/// A context condition attached to a goal: a conjunction of literals that
/// must all hold (directly or via a context-dependency edge to an earlier
/// task) for the goal's subtree to survive assembly.
#[derive(Debug, Clone, Default)]
pub struct ContextRequirement {
    /// Literals that must all hold.
    pub literals: Vec<Literal>,
}

/// The runtime-annotation tree as handed to [`assemble`] -- produced by the
/// task-instance/annotation-builder stage upstream of this crate.
#[derive(Debug, Clone)]
pub enum AnnotationNode {
    /// An operator combining its children (`;`, `#`, `FALLBACK`, `OR`).
    Operator {
        /// Operator kind.
        op: Operator,
        /// Children, in declaration order.
        children: Vec<AnnotationNode>,
    },
    /// A goal-model goal.
    Goal {
        /// Stable goal-model id.
        id: String,
        /// AND/OR decomposition kind of this goal's children.
        decomposition: DecompositionKind,
        /// Context condition, if any was declared.
        context: Option<ContextRequirement>,
        /// Whether this goal's subtree permits splitting robots across its
        /// tasks (`false` forces mutual exclusion, see execution constraints).
        group: bool,
        /// Whether this goal's subtree permits partial completion.
        divisible: bool,
        /// Literals the goal must leave holding in the live world at the
        /// point its scope closes (`Some` only for `Achieve` goals that
        /// declared one).
        achieve_condition: Option<Vec<Literal>>,
        /// Children, in declaration order.
        children: Vec<AnnotationNode>,
    },
    /// A task-instance leaf: one abstract-task instance, to be expanded
    /// into an ATASK node plus one DECOMPOSITION node per available path.
    TaskLeaf {
        /// Abstract-task instance id.
        instance_id: String,
    },
}

/// One decomposition path available for a given abstract-task instance, as
/// fed into [`assemble`] (already computed by the TDG, section 4.1).
#[derive(Debug, Clone)]
pub struct DecompositionOption {
    /// Decomposition id, `"<instance-id>|<k>"`.
    pub id: String,
    /// Accumulated preconditions of the path's steps.
    pub preconditions: Vec<Literal>,
    /// Accumulated effects of the path's steps.
    pub effects: Vec<Literal>,
}

/// Assemble the mission-decomposition graph from a runtime-annotation tree.
///
/// `decompositions` maps each `TaskLeaf`'s instance id to the decomposition
/// options the TDG enumerated for it. `initial_world` seeds the live
/// symbolic world used for context evaluation; every decomposition's
/// effects are optimistically folded into that world as its ATASK/PATH
/// nodes are emitted (open-world, best-effort accumulation -- true
/// per-candidate precondition simulation is the valid-mission enumerator's
/// job, not this stage's).
///
/// # Errors
/// Returns [`GraphError::UnsatisfiedContext`] if the whole tree collapses
/// (every branch pruned by an unresolvable context), and propagates
/// [`GraphError::ValidationFailed`] from the final acyclicity check.
pub fn assemble(
    tree: &AnnotationNode,
    decompositions: &HashMap<String, Vec<DecompositionOption>>,
    initial_world: &WorldState,
) -> Result<TrimmedAtGraph, GraphError> {
    let mut asm = Assembler {
        builder: AtGraphBuilder::new(),
        world: initial_world.clone(),
        decompositions,
        next_scope_id: 0,
        exec_scopes: HashMap::new(),
        exec_flags: HashMap::new(),
    };
    let root = asm.build(tree, None);
    let Some(root) = root else {
        return Err(GraphError::UnsatisfiedContext(root_id(tree)));
    };
    asm.collect_exec_constraints();
    let trimmed = asm.builder.validate()?;
    Ok(TrimmedAtGraph {
        exec_constraint_flags: asm.exec_flags,
        root: Some(root),
        ..trimmed
    })
}

fn root_id(tree: &AnnotationNode) -> String {
    match tree {
        AnnotationNode::Goal { id, .. } => id.clone(),
        AnnotationNode::Operator { .. } => "<root operator>".to_string(),
        AnnotationNode::TaskLeaf { instance_id } => instance_id.clone(),
    }
}

/// An active non-group-or-non-divisible scope: a scope-local id (assigned
/// from a monotonic counter, not a [`NodeIndex`] -- a scope is opened before
/// any node of its subtree exists, so a graph-derived index could collide
/// with a nested scope's), plus the flags every member's execution-constraint
/// edge should carry.
#[derive(Debug, Clone, Copy)]
struct ExecScope {
    id: u32,
    group: bool,
    divisible: bool,
}

struct Assembler<'a> {
    builder: AtGraphBuilder,
    world: WorldState,
    /// Decomposition options available for each task-leaf instance id.
    decompositions: &'a HashMap<String, Vec<DecompositionOption>>,
    /// Next [`ExecScope::id`] to hand out.
    next_scope_id: u32,
    /// Members collected per exclusive scope, keyed by the scope's id.
    exec_scopes: HashMap<u32, (bool, bool, Vec<NodeIndex>)>,
    exec_flags: HashMap<(NodeIndex, NodeIndex), (bool, bool)>,
}

impl<'a> Assembler<'a> {
    /// Build `node`, returning its graph index, or `None` if the whole
    /// subtree was pruned (zero surviving children, or an unresolvable
    /// context). A single surviving child collapses the wrapping
    /// operator/goal node away (the "OP nodes with fewer than two NORMAL
    /// children" trimming pass of spec.md section 4.4, performed at build
    /// time instead of as a separate post-pass).
    fn build(&mut self, node: &AnnotationNode, scope: Option<ExecScope>) -> Option<NodeIndex> {
        match node {
            AnnotationNode::Operator { op, children } => {
                let edge_kind = if *op == Operator::Or {
                    AtGraphEdge::NormalOr
                } else {
                    AtGraphEdge::NormalAnd
                };
                let built: Vec<NodeIndex> = children.iter().filter_map(|c| self.build(c, scope)).collect();
                self.finish_wrapper(AtGraphNode::Operator(*op), edge_kind, built)
            }
            AnnotationNode::Goal {
                id,
                decomposition,
                context,
                group,
                divisible,
                achieve_condition,
                children,
            } => {
                let inherited = scope
                    .map(|s| (s.group, s.divisible))
                    .unwrap_or((true, true));
                let effective_group = inherited.0 && *group;
                let effective_divisible = inherited.1 && *divisible;
                // Only this node's own declaration starts a new innermost
                // scope; a restriction merely inherited from an ancestor
                // keeps propagating the ancestor's scope unchanged.
                let own_restriction = !*group || !*divisible;
                let child_scope = if own_restriction {
                    let id = self.next_scope_id;
                    self.next_scope_id += 1;
                    Some(ExecScope {
                        id,
                        group: effective_group,
                        divisible: effective_divisible,
                    })
                } else {
                    scope
                };

                let providers = match context {
                    Some(ctx) => {
                        let from = NodeIndex::new(self.builder.graph.node_count());
                        match self.resolve_or_fail(&ctx.literals, from) {
                            Some(p) => p,
                            None => {
                                warn!("context unsatisfiable for goal {id}, pruning subtree");
                                return None;
                            }
                        }
                    }
                    None => Vec::new(),
                };

                let edge_kind = match decomposition {
                    DecompositionKind::And => AtGraphEdge::NormalAnd,
                    DecompositionKind::Or => AtGraphEdge::NormalOr,
                };
                let built: Vec<NodeIndex> =
                    children.iter().filter_map(|c| self.build(c, child_scope)).collect();
                let goal_node = AtGraphNode::Goal {
                    id: id.clone(),
                    achieve_condition: achieve_condition.clone(),
                };
                let goal_idx = self.finish_wrapper(goal_node, edge_kind, built)?;
                for (literal, provider) in providers {
                    // Edge points provider -> dependent, matching section 4.4's "from
                    // that earlier task to the current node": the provider must
                    // appear strictly before the dependent in any valid mission.
                    self.builder.add_edge(provider, goal_idx, AtGraphEdge::ContextDependency);
                    debug!("installed context dependency for goal {id} on {literal:?}");
                }
                if let Some(s) = child_scope {
                    self.exec_scopes.entry(s.id).or_insert((s.group, s.divisible, Vec::new()));
                }
                Some(goal_idx)
            }
            AnnotationNode::TaskLeaf { instance_id } => {
                let options = self.decompositions_for(instance_id);
                if options.is_empty() {
                    return None;
                }
                let at_idx = self.builder.add_node(AtGraphNode::AtInstance(instance_id.clone()));
                for opt in options {
                    let path_idx = self.builder.add_node(AtGraphNode::Path {
                        id: opt.id.clone(),
                        preconditions: opt.preconditions.clone(),
                        effects: opt.effects.clone(),
                    });
                    self.builder.add_edge(at_idx, path_idx, AtGraphEdge::NormalAnd);
                    for eff in &opt.effects {
                        self.world.apply_effect(eff);
                    }
                }
                if let Some(s) = scope {
                    self.exec_scopes.entry(s.id).or_insert((s.group, s.divisible, Vec::new())).2.push(at_idx);
                }
                Some(at_idx)
            }
        }
    }

    /// Collapse a wrapper (operator/goal) node given its already-built
    /// surviving children: zero children prunes the wrapper entirely, one
    /// child elides the wrapper (trimming), two or more materialize it.
    fn finish_wrapper(
        &mut self,
        node: AtGraphNode,
        edge_kind: AtGraphEdge,
        children: Vec<NodeIndex>,
    ) -> Option<NodeIndex> {
        match children.len() {
            0 => None,
            1 => Some(children[0]),
            _ => {
                let idx = self.builder.add_node(node);
                for child in children {
                    self.builder.add_edge(idx, child, edge_kind);
                }
                Some(idx)
            }
        }
    }

    /// For every literal in `literals`, either confirm it already holds in
    /// the live world, or find an earlier [`AtGraphNode::Path`] whose
    /// effects establish it. Returns the `(literal, provider)` pairs that
    /// need a context-dependency edge, or `None` if any literal is
    /// unresolvable.
    fn resolve_or_fail(&self, literals: &[Literal], from: NodeIndex) -> Option<Vec<(Literal, NodeIndex)>> {
        let mut deferred = Vec::new();
        for lit in literals {
            if self.world.holds(lit) {
                continue;
            }
            match self.builder.search_left_to_right(from, lit) {
                Some(provider) => deferred.push((lit.clone(), provider)),
                None => return None,
            }
        }
        Some(deferred)
    }

    fn collect_exec_constraints(&mut self) {
        for (_, (group, divisible, members)) in &self.exec_scopes {
            for i in 0..members.len() {
                for j in (i + 1)..members.len() {
                    let (a, b) = (members[i], members[j]);
                    self.builder.add_edge(a, b, AtGraphEdge::ExecutionConstraint);
                    self.builder.add_edge(b, a, AtGraphEdge::ExecutionConstraint);
                    let key = if a.index() <= b.index() { (a, b) } else { (b, a) };
                    self.exec_flags.insert(key, (*group, *divisible));
                }
            }
        }
    }

    /// Decomposition options available for a task-leaf instance, or an
    /// empty vec if the instance has none (the caller prunes that subtree).
    fn decompositions_for(&self, instance_id: &str) -> Vec<DecompositionOption> {
        self.decompositions
            .get(instance_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_search_finds_earlier_providing_path() {
        let mut builder = AtGraphBuilder::new();
        let needed = Literal::predicate("clean", vec!["room1".into()]);
        let provider = builder.add_node(AtGraphNode::Path {
            id: "p1".into(),
            preconditions: vec![],
            effects: vec![needed.clone()],
        });
        let dependent = builder.add_node(AtGraphNode::Path {
            id: "p2".into(),
            preconditions: vec![],
            effects: vec![],
        });
        assert_eq!(builder.search_left_to_right(dependent, &needed), Some(provider));
    }

    #[test]
    fn context_search_misses_when_only_later_path_provides() {
        let mut builder = AtGraphBuilder::new();
        let needed = Literal::predicate("clean", vec!["room1".into()]);
        let dependent = builder.add_node(AtGraphNode::Path {
            id: "p1".into(),
            preconditions: vec![],
            effects: vec![],
        });
        builder.add_node(AtGraphNode::Path {
            id: "p2".into(),
            preconditions: vec![],
            effects: vec![needed.clone()],
        });
        assert_eq!(builder.search_left_to_right(dependent, &needed), None);
    }

    #[test]
    fn validate_rejects_and_or_cycle() {
        let mut builder = AtGraphBuilder::new();
        let a = builder.add_node(AtGraphNode::Operator(Operator::Seq));
        let b = builder.add_node(AtGraphNode::Operator(Operator::Seq));
        builder.add_edge(a, b, AtGraphEdge::NormalAnd);
        builder.add_edge(b, a, AtGraphEdge::NormalAnd);
        assert!(builder.validate().is_err());
    }

    #[test]
    fn validate_accepts_acyclic_graph() {
        let mut builder = AtGraphBuilder::new();
        let a = builder.add_node(AtGraphNode::Operator(Operator::Seq));
        let b = builder.add_node(AtGraphNode::AtInstance("i1".into()));
        builder.add_edge(a, b, AtGraphEdge::NormalAnd);
        assert!(builder.validate().is_ok());
    }

    fn leaf(id: &str) -> AnnotationNode {
        AnnotationNode::TaskLeaf { instance_id: id.into() }
    }

    fn option(id: &str, effects: Vec<Literal>) -> DecompositionOption {
        DecompositionOption {
            id: id.into(),
            preconditions: Vec::new(),
            effects,
        }
    }

    #[test]
    fn assemble_two_leaves_in_sequence() {
        let tree = AnnotationNode::Operator {
            op: Operator::Seq,
            children: vec![leaf("t1"), leaf("t2")],
        };
        let mut decomps = HashMap::new();
        decomps.insert("t1".to_string(), vec![option("t1|0", vec![])]);
        decomps.insert("t2".to_string(), vec![option("t2|0", vec![])]);
        let world = WorldState::new();
        let atgraph = assemble(&tree, &decomps, &world).expect("assembles");
        assert!(atgraph.root().is_some());
    }

    #[test]
    fn assemble_prunes_instance_with_no_decompositions() {
        let tree = leaf("t1");
        let decomps = HashMap::new();
        let world = WorldState::new();
        let err = assemble(&tree, &decomps, &world).unwrap_err();
        assert!(matches!(err, GraphError::UnsatisfiedContext(_)));
    }

    #[test]
    fn assemble_resolves_context_against_earlier_path() {
        let needed = Literal::predicate("clean", vec!["room1".into()]);
        let tree = AnnotationNode::Operator {
            op: Operator::Seq,
            children: vec![
                leaf("t1"),
                AnnotationNode::Goal {
                    id: "g2".into(),
                    decomposition: DecompositionKind::And,
                    context: Some(ContextRequirement { literals: vec![needed.clone()] }),
                    group: true,
                    divisible: true,
                    achieve_condition: None,
                    children: vec![leaf("t2")],
                },
            ],
        };
        let mut decomps = HashMap::new();
        decomps.insert("t1".to_string(), vec![option("t1|0", vec![needed])]);
        decomps.insert("t2".to_string(), vec![option("t2|0", vec![])]);
        let world = WorldState::new();
        let atgraph = assemble(&tree, &decomps, &world).expect("assembles");
        assert!(atgraph.root().is_some());
    }

    #[test]
    fn assemble_installs_execution_constraint_for_non_group_scope() {
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
        decomps.insert("t1".to_string(), vec![option("t1|0", vec![])]);
        decomps.insert("t2".to_string(), vec![option("t2|0", vec![])]);
        let world = WorldState::new();
        let atgraph = assemble(&tree, &decomps, &world).expect("assembles");
        let instances: Vec<NodeIndex> = atgraph
            .graph()
            .node_indices()
            .filter(|&i| matches!(atgraph.graph()[i], AtGraphNode::AtInstance(_)))
            .collect();
        assert_eq!(instances.len(), 2);
        let flags = atgraph.exec_constraint_flags(instances[0], instances[1]);
        assert_eq!(flags, Some((false, true)));
    }
}
