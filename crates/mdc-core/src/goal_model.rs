//! The goal model: a directed graph of goal and task nodes describing a
//! mission declaratively, ahead of any grounding against a knowledge base.

use std::collections::HashMap;

use mdc_graph::DecompositionKind;
use mdc_registry::Literal;
use mdc_world::ScalarValue;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

/// How a node's runtime behavior is interpreted during task-instance
/// expansion and annotation construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalType {
    /// A primitive task, executed directly.
    Perform,
    /// A goal that decomposes into subtasks until a condition holds.
    Achieve,
    /// A goal that resolves a select expression against the knowledge
    /// base and binds the result as a controlled variable.
    Query,
    /// A goal repeated while a condition holds (not a `forAll` binding).
    Loop,
    /// A goal created only when a triggering event or condition fires.
    Trigger,
}

/// How many robots a task instance requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RobotNumber {
    /// Exactly this many robots.
    Fixed(u32),
    /// Between `min` and `max` robots, inclusive.
    Range(u32, u32),
}

impl Default for RobotNumber {
    fn default() -> Self {
        Self::Fixed(1)
    }
}

/// A `Query` goal's select expression, resolved against the knowledge
/// base during task-instance expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectExpr {
    /// Select objects for which `predicate(obj) == expected` holds in the
    /// current world.
    Predicate(String, bool),
    /// Select objects whose attribute equals a scalar value.
    AttrEq(String, ScalarValue),
    /// Select objects whose attribute does not equal a scalar value.
    AttrNeq(String, ScalarValue),
}

/// Whether a `Query` goal's result is bound as a single scalar or as a
/// collection driving a `forAll` replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryVarKind {
    /// A single ground value is expected; more or fewer is an error.
    Scalar,
    /// Zero or more values are expected, bound as a collection.
    Collection,
}

/// A property queried from the knowledge base by a `Query` goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueriedProperty {
    /// Name the result is bound to, referenced by descendant nodes.
    pub controlled_var: String,
    /// The selection expression evaluated against the knowledge base.
    pub select: SelectExpr,
    /// Whether the binding is scalar or a collection.
    pub query_var: QueryVarKind,
}

/// The condition under which an `Achieve` goal's scope is considered
/// satisfied, checked against the live world at scope-exit during
/// valid-mission enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchieveCondition {
    /// Literals that must all hold in the world at scope-exit.
    pub literals: Vec<Literal>,
}

/// What causes a `Trigger` goal's subtree to be instantiated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CreationCondition {
    /// Instantiated when a named event fires.
    Trigger(String),
    /// Instantiated when a literal condition holds in the world.
    Condition(Vec<Literal>),
}

/// A single node in the goal model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmNode {
    /// Stable id, unique within the goal model (not yet the expanded
    /// task-instance id, which is derived from this one plus a `forAll`
    /// scope suffix).
    pub id: String,
    /// Whether this is a goal (decomposes further) or a task (leaf,
    /// grounds directly to a primitive or abstract task in the domain).
    pub is_task: bool,
    /// How this node behaves at runtime.
    pub goal_type: GoalType,
    /// Present when `goal_type == Query`.
    pub queried_property: Option<QueriedProperty>,
    /// Present when `goal_type == Achieve`.
    pub achieve_condition: Option<AchieveCondition>,
    /// Present when `goal_type == Trigger`.
    pub creation_condition: Option<CreationCondition>,
    /// Variable bound once per active `forAll` scope this node is
    /// iterated under, if any (set during expansion, not by the author).
    pub controlled_vars: Vec<String>,
    /// Variables this node reads but does not bind.
    pub monitored_vars: Vec<String>,
    /// Location this node's task instance is grounded at, if fixed by
    /// the author rather than inherited from an enclosing scope.
    pub location: Option<String>,
    /// Task parameters, referencing controlled/monitored variables or
    /// literal object names.
    pub params: Vec<String>,
    /// How many robots a task instance of this node requires.
    pub robot_number: RobotNumber,
    /// Whether this node's subtree permits splitting robots across its
    /// tasks (`false` forces mutual exclusion between siblings).
    pub group: bool,
    /// Whether this node's subtree permits partial completion.
    pub divisible: bool,
    /// Whether this node is repeated for as long as its condition holds
    /// (only meaningful when `goal_type == Loop`).
    pub periodic: bool,
    /// Repetition period in seconds, when `periodic` is set.
    pub period: Option<f64>,
    /// Wall-clock deadline in seconds from mission start, if any.
    pub deadline: Option<f64>,
    /// The runtime-annotation string governing how this node's children
    /// combine (`;`, `#`, `FALLBACK`, `OR`, parenthesised combinations).
    /// Empty for leaf task nodes.
    pub annotation: String,
}

impl GmNode {
    /// Construct a task-kind node (`is_task = true`, `goal_type =
    /// Perform`) with otherwise-default fields.
    #[must_use]
    pub fn task(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_task: true,
            goal_type: GoalType::Perform,
            queried_property: None,
            achieve_condition: None,
            creation_condition: None,
            controlled_vars: Vec::new(),
            monitored_vars: Vec::new(),
            location: None,
            params: Vec::new(),
            robot_number: RobotNumber::default(),
            group: true,
            divisible: true,
            periodic: false,
            period: None,
            deadline: None,
            annotation: String::new(),
        }
    }

    /// Construct a goal-kind node with the given [`GoalType`] and
    /// otherwise-default fields.
    #[must_use]
    pub fn goal(id: impl Into<String>, goal_type: GoalType) -> Self {
        Self {
            id: id.into(),
            is_task: false,
            goal_type,
            queried_property: None,
            achieve_condition: None,
            creation_condition: None,
            controlled_vars: Vec::new(),
            monitored_vars: Vec::new(),
            location: None,
            params: Vec::new(),
            robot_number: RobotNumber::default(),
            group: true,
            divisible: true,
            periodic: false,
            period: None,
            deadline: None,
            annotation: String::new(),
        }
    }
}

/// An edge in the goal model, from a parent goal to one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GmEdge {
    /// Whether the parent requires all children (`And`) or exactly one
    /// (`Or`).
    pub decomposition: DecompositionKind,
    /// Whether this is a means-end edge: a single child standing in for
    /// the parent goal's only way of being achieved, collapsed away
    /// during annotation construction rather than wrapped in an operator.
    pub means_end: bool,
}

/// Errors arising from goal-model construction and traversal.
#[derive(Debug, thiserror::Error)]
pub enum GoalModelError {
    /// The graph has no node with in-degree zero, or more than one.
    #[error("goal model must have exactly one root, found {0}")]
    NotExactlyOneRoot(usize),
    /// A non-root node has more than one parent.
    #[error("node {0} has more than one parent")]
    MultipleParents(String),
}

/// The goal model: a directed graph of [`GmNode`]s connected by [`GmEdge`]s.
///
/// Exactly one node has in-degree zero (the root); every other node has
/// exactly one incoming edge.
#[derive(Debug, Clone, Default)]
pub struct GoalModel {
    graph: DiGraph<GmNode, GmEdge>,
    index_of: HashMap<String, NodeIndex>,
}

impl GoalModel {
    /// An empty goal model.
    #[must_use]
    pub fn new() -> Self {
        Self { graph: DiGraph::new(), index_of: HashMap::new() }
    }

    /// Add a node, returning its graph index. Panics if `node.id` was
    /// already added.
    pub fn add_node(&mut self, node: GmNode) -> NodeIndex {
        assert!(!self.index_of.contains_key(&node.id), "duplicate goal-model node id {}", node.id);
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index_of.insert(id, idx);
        idx
    }

    /// Connect `parent` to `child` with the given edge metadata.
    pub fn add_edge(&mut self, parent: NodeIndex, child: NodeIndex, edge: GmEdge) {
        self.graph.add_edge(parent, child, edge);
    }

    /// Look up a node's graph index by its stable id.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index_of.get(id).copied()
    }

    /// Borrow a node by its stable id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GmNode> {
        self.index_of(id).map(|idx| &self.graph[idx])
    }

    /// Mutably borrow a node by its stable id (used to set fields such as
    /// `annotation` after construction).
    pub fn node_mut(&mut self, id: &str) -> Option<&mut GmNode> {
        let idx = self.index_of(id)?;
        Some(&mut self.graph[idx])
    }

    /// The underlying graph.
    #[must_use]
    pub fn graph(&self) -> &DiGraph<GmNode, GmEdge> {
        &self.graph
    }

    /// Children of a node, in declaration (edge-insertion) order.
    #[must_use]
    pub fn children(&self, idx: NodeIndex) -> Vec<(NodeIndex, GmEdge)> {
        let mut out: Vec<(NodeIndex, GmEdge, usize)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), *e.weight(), e.id().index()))
            .collect();
        out.sort_by_key(|(_, _, order)| *order);
        out.into_iter().map(|(n, e, _)| (n, e)).collect()
    }

    /// The unique root: the node with in-degree zero.
    ///
    /// # Errors
    /// Returns [`GoalModelError::NotExactlyOneRoot`] unless exactly one
    /// such node exists, and [`GoalModelError::MultipleParents`] if any
    /// non-root node has more than one incoming edge.
    pub fn root(&self) -> Result<NodeIndex, GoalModelError> {
        let roots: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| self.graph.edges_directed(idx, Direction::Incoming).count() == 0)
            .collect();
        if roots.len() != 1 {
            return Err(GoalModelError::NotExactlyOneRoot(roots.len()));
        }
        for idx in self.graph.node_indices() {
            let parents = self.graph.edges_directed(idx, Direction::Incoming).count();
            if parents > 1 {
                return Err(GoalModelError::MultipleParents(self.graph[idx].id.clone()));
            }
        }
        Ok(roots[0])
    }
}
