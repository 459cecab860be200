//! Task Decomposition Graph: the AND/OR graph of one abstract task's
//! possible ground decompositions.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use mdc_registry::{FrozenRegistry, Literal};
use mdc_world::WorldState;

use crate::error::GraphError;

/// A node in the TDG.
#[derive(Debug, Clone)]
pub enum TdgNode {
    /// An abstract task, OR-decomposed by its declared methods.
    Abstract(String),
    /// One of an abstract task's methods, AND-decomposing into subtasks.
    Method(String),
    /// A primitive (leaf) task.
    Primitive(String),
    /// A task whose expansion would recurse into an ancestor already being
    /// expanded. Contributes no decomposition paths; any method containing
    /// this node as a subtask is thereby excluded from enumeration, matching
    /// the cycle-exclusion behavior of the original decomposer.
    Cycle(String),
}

/// AND/OR edge kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TdgEdge {
    /// Abstract task -> method (pick exactly one).
    And,
    /// Method -> subtask (all required, per [`Method::ordering`](mdc_registry::Method::ordering)).
    Or,
}

/// One grounded step of a decomposition path, with arguments and
/// literals already renamed into the path's root-task variable namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveStep {
    /// Name of the primitive task this step instantiates.
    pub task_name: String,
    /// Arguments, in the task's declared parameter order.
    pub args: Vec<String>,
    /// Preconditions, variable-renamed.
    pub preconditions: Vec<Literal>,
    /// Effects, variable-renamed.
    pub effects: Vec<Literal>,
}

/// A single fully-ground sequence of primitive steps realizing one way to
/// decompose a root task.
#[derive(Debug, Clone, Default)]
pub struct DecompositionPath {
    /// Steps, in execution order.
    pub steps: Vec<PrimitiveStep>,
}

impl DecompositionPath {
    /// The union of all step preconditions, in step order -- used for a
    /// cheap feasibility pre-check before a full per-step world-state walk.
    #[must_use]
    pub fn accumulated_preconditions(&self) -> Vec<&Literal> {
        self.steps.iter().flat_map(|s| &s.preconditions).collect()
    }

    /// The union of all step effects, in step order.
    #[must_use]
    pub fn accumulated_effects(&self) -> Vec<&Literal> {
        self.steps.iter().flat_map(|s| &s.effects).collect()
    }
}

/// The Task Decomposition Graph for a single root abstract task.
pub struct Tdg {
    graph: DiGraph<TdgNode, TdgEdge>,
    root: NodeIndex,
}

impl Tdg {
    /// Build the TDG rooted at `root_task`.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownTask`] if `root_task` is undeclared.
    pub fn build(root_task: &str, registry: &FrozenRegistry) -> Result<Self, GraphError> {
        if registry.task(root_task).is_none() {
            return Err(GraphError::UnknownTask(root_task.to_string()));
        }
        let mut graph = DiGraph::new();
        let mut ancestors = Vec::new();
        let mut completed = HashMap::new();
        let root = build_task_node(root_task, registry, &mut graph, &mut ancestors, &mut completed)?;
        Ok(Self { graph, root })
    }

    /// The underlying graph, for inspection/visualization.
    #[must_use]
    pub fn graph(&self) -> &DiGraph<TdgNode, TdgEdge> {
        &self.graph
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Enumerate every fully-ground decomposition path for the root task,
    /// given the root's own argument bindings (formal parameter name ->
    /// ground object or passed-through variable name) and an initial
    /// symbolic world against which preconditions are checked.
    #[must_use]
    pub fn enumerate_paths(
        &self,
        registry: &FrozenRegistry,
        root_args: &HashMap<String, String>,
        initial_world: &WorldState,
    ) -> Vec<DecompositionPath> {
        let sequences = expand_node(self.root, &self.graph, registry, root_args);
        let mut paths = Vec::new();
        for steps in sequences {
            let mut world = initial_world.clone();
            let mut ok = true;
            for step in &steps {
                for pre in &step.preconditions {
                    if !world.check_and_extend(pre) {
                        ok = false;
                        break;
                    }
                }
                if !ok {
                    break;
                }
                for eff in &step.effects {
                    world.apply_effect(eff);
                }
            }
            if ok {
                paths.push(DecompositionPath { steps });
            } else {
                debug!("decomposition path discarded: precondition contradiction");
            }
        }
        paths
    }
}

fn build_task_node(
    task_name: &str,
    registry: &FrozenRegistry,
    graph: &mut DiGraph<TdgNode, TdgEdge>,
    ancestors: &mut Vec<String>,
    completed: &mut HashMap<String, NodeIndex>,
) -> Result<NodeIndex, GraphError> {
    if let Some(&idx) = completed.get(task_name) {
        return Ok(idx);
    }
    if ancestors.contains(&task_name.to_string()) {
        return Ok(graph.add_node(TdgNode::Cycle(task_name.to_string())));
    }
    let task = registry
        .task(task_name)
        .ok_or_else(|| GraphError::UnknownTask(task_name.to_string()))?;

    if !task.is_abstract {
        let idx = graph.add_node(TdgNode::Primitive(task_name.to_string()));
        completed.insert(task_name.to_string(), idx);
        return Ok(idx);
    }

    let methods = registry.methods_for(task_name);
    if methods.is_empty() {
        return Err(GraphError::NoMethodsForTask(task_name.to_string()));
    }

    ancestors.push(task_name.to_string());
    let abstract_idx = graph.add_node(TdgNode::Abstract(task_name.to_string()));
    for method in methods {
        let method_idx = graph.add_node(TdgNode::Method(method.name.clone()));
        graph.add_edge(abstract_idx, method_idx, TdgEdge::Or);
        for subtask in &method.subtasks {
            let sub_idx = build_task_node(&subtask.task_name, registry, graph, ancestors, completed)?;
            graph.add_edge(method_idx, sub_idx, TdgEdge::And);
        }
    }
    ancestors.pop();
    completed.insert(task_name.to_string(), abstract_idx);
    Ok(abstract_idx)
}

/// All alternative step-sequences realizing `node`, with its own args/vars
/// renamed through `var_map` (method-local name -> root-task-namespace name).
fn expand_node(
    node: NodeIndex,
    graph: &DiGraph<TdgNode, TdgEdge>,
    registry: &FrozenRegistry,
    var_map: &HashMap<String, String>,
) -> Vec<Vec<PrimitiveStep>> {
    match &graph[node] {
        TdgNode::Cycle(_) => Vec::new(),
        TdgNode::Primitive(task_name) => {
            let Some(task) = registry.task(task_name) else {
                return Vec::new();
            };
            let args: Vec<String> = task
                .params
                .iter()
                .map(|p| var_map.get(&p.name).cloned().unwrap_or_else(|| p.name.clone()))
                .collect();
            let step = PrimitiveStep {
                task_name: task_name.clone(),
                args,
                preconditions: task.preconditions.iter().map(|l| l.rename_args(var_map)).collect(),
                effects: task.effects.iter().map(|l| l.rename_args(var_map)).collect(),
            };
            vec![vec![step]]
        }
        TdgNode::Abstract(_) => {
            // OR: union over every method child's alternatives.
            graph
                .neighbors(node)
                .flat_map(|method_idx| expand_node(method_idx, graph, registry, var_map))
                .collect()
        }
        TdgNode::Method(method_name) => expand_method(node, method_name, graph, registry, var_map),
    }
}

fn expand_method(
    node: NodeIndex,
    method_name: &str,
    graph: &DiGraph<TdgNode, TdgEdge>,
    registry: &FrozenRegistry,
    var_map: &HashMap<String, String>,
) -> Vec<Vec<PrimitiveStep>> {
    let Some(method) = find_method(method_name, registry) else {
        return Vec::new();
    };

    // Map each subtask id to its TDG child node, in declaration order, so we
    // can pair subtask definitions (args, target task params) with their
    // already-built subtree.
    let children: Vec<NodeIndex> = graph.neighbors(node).collect();
    let mut children_rev = children;
    children_rev.reverse(); // petgraph neighbors() yields most-recently-added first

    let mut per_subtask_alternatives: Vec<Vec<Vec<PrimitiveStep>>> = Vec::new();
    for (subtask, &child) in method.subtasks.iter().zip(children_rev.iter()) {
        let Some(target_task) = registry.task(&subtask.task_name) else {
            return Vec::new();
        };
        let mut subtask_map = HashMap::new();
        for (i, target_param) in target_task.params.iter().enumerate() {
            if let Some(arg) = subtask.args.get(i) {
                let resolved = var_map.get(arg).cloned().unwrap_or_else(|| arg.clone());
                subtask_map.insert(target_param.name.clone(), resolved);
            }
        }
        let alternatives = expand_node(child, graph, registry, &subtask_map);
        if alternatives.is_empty() {
            return Vec::new(); // this subtask has no finite expansion; method is unusable
        }
        per_subtask_alternatives.push(alternatives);
    }

    let precondition_step = method.precondition_task.as_ref().map(|pt| PrimitiveStep {
        task_name: pt.name.clone(),
        args: pt
            .params
            .iter()
            .map(|p| var_map.get(&p.name).cloned().unwrap_or_else(|| p.name.clone()))
            .collect(),
        preconditions: pt.preconditions.iter().map(|l| l.rename_args(var_map)).collect(),
        effects: Vec::new(),
    });

    let mut results = Vec::new();
    for order in method.all_topological_orders() {
        for combo in cartesian_product(&per_subtask_alternatives) {
            let mut steps = Vec::new();
            if let Some(pre) = &precondition_step {
                steps.push(pre.clone());
            }
            for subtask_id in &order {
                let pos = method.subtasks.iter().position(|s| s.id == *subtask_id).unwrap();
                steps.extend(combo[pos].clone());
            }
            results.push(steps);
        }
    }
    results
}

fn find_method<'a>(name: &str, registry: &'a FrozenRegistry) -> Option<&'a mdc_registry::Method> {
    registry.tasks().find_map(|t| {
        registry
            .methods_for(&t.name)
            .iter()
            .find(|m| m.name == name)
    })
}

fn cartesian_product<T: Clone>(lists: &[Vec<T>]) -> Vec<Vec<T>> {
    lists.iter().fold(vec![Vec::new()], |acc, list| {
        acc.into_iter()
            .flat_map(|prefix| {
                list.iter().map(move |item| {
                    let mut next = prefix.clone();
                    next.push(item.clone());
                    next
                })
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdc_registry::{Method, Parameter, Registry, Subtask, Task};

    fn build_simple_registry() -> FrozenRegistry {
        let mut reg = Registry::new();
        reg.declare_task(Task::primitive(
            "pick_up",
            vec![Parameter::new("?r", "robot")],
            vec![],
            vec![Literal::predicate("holding", vec!["?r".into()])],
        ))
        .unwrap();
        reg.declare_task(Task::primitive(
            "drop",
            vec![Parameter::new("?r", "robot")],
            vec![Literal::predicate("holding", vec!["?r".into()])],
            vec![],
        ))
        .unwrap();
        reg.declare_task(Task::abstract_task("fetch", vec![Parameter::new("?r", "robot")]))
            .unwrap();
        reg.declare_method(Method {
            name: "fetch_m1".into(),
            task_name: "fetch".into(),
            params: vec![Parameter::new("?r", "robot")],
            subtasks: vec![
                Subtask { id: 1, task_name: "pick_up".into(), args: vec!["?r".into()] },
                Subtask { id: 2, task_name: "drop".into(), args: vec!["?r".into()] },
            ],
            ordering: vec![(1, 2)],
            precondition_task: None,
        })
        .unwrap();
        reg.freeze()
    }

    #[test]
    fn builds_and_enumerates_single_method() {
        let registry = build_simple_registry();
        let tdg = Tdg::build("fetch", &registry).unwrap();
        let mut root_args = HashMap::new();
        root_args.insert("?r".to_string(), "robot1".to_string());
        let paths = tdg.enumerate_paths(&registry, &root_args, &WorldState::new());
        assert_eq!(paths.len(), 1);
        let steps = &paths[0].steps;
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].task_name, "pick_up");
        assert_eq!(steps[0].args, vec!["robot1"]);
        assert_eq!(steps[1].task_name, "drop");
    }

    #[test]
    fn unknown_root_task_errors() {
        let registry = build_simple_registry();
        let err = Tdg::build("does_not_exist", &registry).unwrap_err();
        assert!(matches!(err, GraphError::UnknownTask(_)));
    }

    #[test]
    fn self_recursive_method_yields_no_paths() {
        let mut reg = Registry::new();
        reg.declare_task(Task::abstract_task("loopy", vec![])).unwrap();
        reg.declare_method(Method {
            name: "loopy_m".into(),
            task_name: "loopy".into(),
            params: vec![],
            subtasks: vec![Subtask { id: 1, task_name: "loopy".into(), args: vec![] }],
            ordering: vec![],
            precondition_task: None,
        })
        .unwrap();
        let registry = reg.freeze();
        let tdg = Tdg::build("loopy", &registry).unwrap();
        let paths = tdg.enumerate_paths(&registry, &HashMap::new(), &WorldState::new());
        assert!(paths.is_empty());
    }
}
