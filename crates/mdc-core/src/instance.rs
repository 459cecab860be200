//! Task-instance manager: depth-first expansion of a [`GoalModel`] into
//! ground [`AtInstance`]s.

use std::collections::HashMap;

use indexmap::IndexMap;
use mdc_config::ConfigResolver;
use mdc_registry::{FrozenRegistry, Literal};
use mdc_world::{AttrValue, KnowledgeBase, ScalarValue};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::goal_model::{GoalModel, GoalType, QueryVarKind, SelectExpr};
use crate::ids::AtInstanceId;
use crate::PipelineError;

/// How many robots a concrete instance requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RobotNum {
    /// Exactly this many.
    Fixed(u32),
    /// Between `min` and `max`, inclusive.
    Range(u32, u32),
}

/// The location(s) a concrete instance is grounded at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocationValue {
    /// A single location object name.
    Single(String),
    /// A collection of location object names (one per forAll replica, or
    /// an unresolved-forAll task's full span).
    Collection(Vec<String>),
}

/// A resolved variable binding: either a single object name or a
/// collection of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VarBindingValue {
    /// A single bound value.
    Scalar(String),
    /// A bound collection (a query resolved to `Set(...)`, or a forAll's
    /// iterated collection).
    Collection(Vec<String>),
}

/// A ground abstract-task instance, immutable once produced by [`expand`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtInstance {
    /// Unique id across the mission.
    pub id: AtInstanceId,
    /// HDDL task name.
    pub name: String,
    /// Task-definition name this instance grounds (kept as a name rather
    /// than a direct reference so instances stay cheap to clone).
    pub at: String,
    /// How many robots this instance requires.
    pub robot_num: RobotNum,
    /// Grounded location(s), if any.
    pub location: Option<LocationValue>,
    /// Resolved variable bindings in scope at this instance.
    pub var_bindings: HashMap<String, VarBindingValue>,
    /// Grounded parameter list.
    pub params: Vec<String>,
    /// Literals that must fire as events before this instance is
    /// eligible (from an enclosing `Trigger` goal).
    pub triggering_events: Vec<Literal>,
}

/// The result of walking a [`GoalModel`]: every emitted instance, indexed
/// by the goal-model task node id that produced it (more than one entry
/// per task id when it sits under one or more active `forAll` scopes).
#[derive(Debug, Clone, Default)]
pub struct TaskInstanceExpansion {
    /// Emitted instance ids, grouped by the goal-model task node id that
    /// produced them, in replication order.
    pub instances_by_task: HashMap<String, Vec<AtInstanceId>>,
    /// Every emitted instance, keyed by its id, in emission order.
    pub instances: IndexMap<AtInstanceId, AtInstance>,
}

#[derive(Debug, Clone)]
struct ForAllScope {
    iterated_var: String,
    iteration_var: String,
    values: Vec<String>,
}

struct Walker<'a> {
    gm: &'a GoalModel,
    kb: &'a KnowledgeBase,
    config: &'a ConfigResolver,
    registry: &'a FrozenRegistry,
    scopes: Vec<ForAllScope>,
    bindings: HashMap<String, VarBindingValue>,
    events: Vec<Literal>,
    out: TaskInstanceExpansion,
}

impl<'a> Walker<'a> {
    fn resolve_query(&self, select: &SelectExpr, kind: QueryVarKind) -> Result<VarBindingValue, PipelineError> {
        let matches: Vec<String> = self
            .kb
            .iter()
            .filter(|(_, node)| match select {
                SelectExpr::Predicate(name, expected) => true_holds(node, name) == *expected,
                SelectExpr::AttrEq(attr, expected) => {
                    node.attributes.get(attr).is_some_and(|v| attr_equals(v, expected))
                }
                SelectExpr::AttrNeq(attr, expected) => {
                    !node.attributes.get(attr).is_some_and(|v| attr_equals(v, expected))
                }
            })
            .map(|(_, node)| node.name.clone())
            .collect();

        match kind {
            QueryVarKind::Scalar => {
                if matches.len() != 1 {
                    return Err(PipelineError::InvalidQuery(format!(
                        "expected exactly one match, found {}",
                        matches.len()
                    )));
                }
                Ok(VarBindingValue::Scalar(matches.into_iter().next().unwrap()))
            }
            QueryVarKind::Collection => Ok(VarBindingValue::Collection(matches)),
        }
    }

    fn walk(&mut self, idx: NodeIndex, active_forall: &[usize]) -> Result<(), PipelineError> {
        let node = self.gm.graph()[idx].clone();

        let mut pushed_scope = false;
        let mut pushed_binding: Option<String> = None;
        let mut pushed_event = false;
        let mut local_forall = active_forall.to_vec();

        if node.goal_type == GoalType::Query {
            let qp = node.queried_property.as_ref().ok_or_else(|| {
                PipelineError::InvalidQuery(format!("goal {} has no queried property", node.id))
            })?;
            let value = self.resolve_query(&qp.select, qp.query_var)?;
            self.bindings.insert(qp.controlled_var.clone(), value);
            pushed_binding = Some(qp.controlled_var.clone());
        }

        if let Some(CreationConditionTrigger(lit)) = trigger_of(&node) {
            self.events.push(lit);
            pushed_event = true;
        }

        // forAll scope: modeled via `controlled_vars` carrying exactly two
        // names (iterated_var, iteration_var) plus a resolved binding for
        // iterated_var already present from an earlier Query.
        if node.goal_type == GoalType::Achieve {
            if let [iterated_var, iteration_var] = node.controlled_vars.as_slice() {
                if let Some(VarBindingValue::Collection(values)) = self.bindings.get(iterated_var) {
                    self.scopes.push(ForAllScope {
                        iterated_var: iterated_var.clone(),
                        iteration_var: iteration_var.clone(),
                        values: values.clone(),
                    });
                    local_forall.push(self.scopes.len() - 1);
                    pushed_scope = true;
                }
            }
        }

        if node.is_task {
            self.emit_task_instances(&node, &local_forall)?;
        }

        for (child, _edge) in self.gm.children(idx) {
            self.walk(child, &local_forall)?;
        }

        if pushed_scope {
            self.scopes.pop();
        }
        if pushed_event {
            self.events.pop();
        }
        if let Some(var) = pushed_binding {
            self.bindings.remove(&var);
        }
        Ok(())
    }

    fn emit_task_instances(
        &mut self,
        node: &crate::goal_model::GmNode,
        active_forall: &[usize],
    ) -> Result<(), PipelineError> {
        if self.registry.task(&node.id).is_none() {
            tracing::warn!(task = %node.id, "task node has no matching definition in the frozen registry");
        }

        if active_forall.is_empty() {
            let instance = self.build_instance(node, &node.id, &[])?;
            self.push_instance(&node.id, instance);
            return Ok(());
        }

        let scope_idx = *active_forall.last().unwrap();
        let values = self.scopes[scope_idx].values.clone();
        let iteration_var = self.scopes[scope_idx].iteration_var.clone();

        let consumes_iteration_var = node.params.iter().any(|p| p == &iteration_var)
            || node.location.as_deref() == Some(iteration_var.as_str());
        if !consumes_iteration_var {
            // "Unsolved forAll": the task doesn't reference the iteration
            // variable directly, but still replicates per element, provided
            // its location's kind is a configured high-level location type.
            let compatible = node
                .location
                .as_ref()
                .is_some_and(|loc| self.config.is_location_type(loc));
            if !compatible {
                return Err(PipelineError::UnboundVariable {
                    var: iteration_var,
                    node: node.id.clone(),
                });
            }
        }

        for (k, value) in values.iter().enumerate() {
            let id_str = format!("{}#{}", node.id, k);
            let mut instance = self.build_instance(node, &id_str, &[(iteration_var.clone(), value.clone())])?;
            instance.var_bindings.insert(iteration_var.clone(), VarBindingValue::Scalar(value.clone()));
            self.push_instance(&node.id, instance);
        }
        Ok(())
    }

    fn push_instance(&mut self, task_node_id: &str, instance: AtInstance) {
        self.out
            .instances_by_task
            .entry(task_node_id.to_string())
            .or_default()
            .push(instance.id.clone());
        self.out.instances.insert(instance.id.clone(), instance);
    }

    fn build_instance(
        &self,
        node: &crate::goal_model::GmNode,
        id_str: &str,
        extra: &[(String, String)],
    ) -> Result<AtInstance, PipelineError> {
        let id = AtInstanceId::new(id_str)
            .map_err(|e| PipelineError::TypeError(format!("invalid instance id {id_str}: {e}")))?;

        let mut var_bindings = self.bindings.clone();
        for (k, v) in extra {
            var_bindings.insert(k.clone(), VarBindingValue::Scalar(v.clone()));
        }

        for param in &node.params {
            if param.starts_with('?') && !var_bindings.contains_key(param) {
                return Err(PipelineError::UnboundVariable {
                    var: param.clone(),
                    node: node.id.clone(),
                });
            }
        }

        let location = node.location.as_ref().map(|loc| {
            if let Some(VarBindingValue::Scalar(v)) = var_bindings.get(loc) {
                LocationValue::Single(v.clone())
            } else if let Some(VarBindingValue::Collection(vs)) = var_bindings.get(loc) {
                LocationValue::Collection(vs.clone())
            } else {
                LocationValue::Single(loc.clone())
            }
        });

        Ok(AtInstance {
            id,
            name: node.id.clone(),
            at: node.id.clone(),
            robot_num: match node.robot_number {
                crate::goal_model::RobotNumber::Fixed(n) => RobotNum::Fixed(n),
                crate::goal_model::RobotNumber::Range(a, b) => RobotNum::Range(a, b),
            },
            location,
            var_bindings,
            params: node.params.clone(),
            triggering_events: self.events.clone(),
        })
    }
}

struct CreationConditionTrigger(Literal);

fn trigger_of(node: &crate::goal_model::GmNode) -> Option<CreationConditionTrigger> {
    match &node.creation_condition {
        Some(crate::goal_model::CreationCondition::Trigger(name)) => {
            Some(CreationConditionTrigger(Literal::predicate(name.clone(), vec![])))
        }
        Some(crate::goal_model::CreationCondition::Condition(lits)) => {
            lits.first().cloned().map(CreationConditionTrigger)
        }
        None => None,
    }
}

fn true_holds(node: &mdc_world::KbNode, predicate_name: &str) -> bool {
    node.attributes.get(predicate_name).is_some_and(|v| attr_truthy(v))
}

fn attr_truthy(v: &AttrValue) -> bool {
    matches!(v, AttrValue::Scalar(ScalarValue::Bool(true)))
}

fn attr_equals(v: &AttrValue, expected: &ScalarValue) -> bool {
    matches!(v, AttrValue::Scalar(s) if s == expected)
}

/// Walk `goal_model` depth-first, resolving `Query` goals against `kb`,
/// tracking active `forAll` iteration scopes, and emitting one
/// [`AtInstance`] per task node per active scope.
///
/// # Errors
/// [`PipelineError::InvalidQuery`] if a query's select expression cannot
/// be evaluated, [`PipelineError::UnboundVariable`] if a task parameter
/// references a variable with no active binding.
pub fn expand(
    goal_model: &GoalModel,
    kb: &KnowledgeBase,
    config: &ConfigResolver,
    registry: &FrozenRegistry,
) -> Result<TaskInstanceExpansion, PipelineError> {
    tracing::debug!("expanding task instances");
    let root = goal_model
        .root()
        .map_err(|e| PipelineError::BadDomain(e.to_string()))?;
    let mut walker = Walker {
        gm: goal_model,
        kb,
        config,
        registry,
        scopes: Vec::new(),
        bindings: HashMap::new(),
        events: Vec::new(),
        out: TaskInstanceExpansion::default(),
    };
    walker.walk(root, &[])?;
    tracing::info!(count = walker.out.instances.len(), "task-instance expansion complete");
    Ok(walker.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal_model::{GmEdge, GmNode};
    use mdc_config::Configuration;
    use mdc_graph::DecompositionKind;
    use mdc_registry::Registry;

    fn empty_env() -> (ConfigResolver, FrozenRegistry) {
        let resolver = ConfigResolver::new(Configuration::new());
        let registry = Registry::new().freeze();
        (resolver, registry)
    }

    #[test]
    fn single_task_emits_one_instance() {
        let mut gm = GoalModel::new();
        let root = gm.add_node(GmNode::goal("root", GoalType::Achieve));
        let task = gm.add_node(GmNode::task("go"));
        gm.add_edge(root, task, GmEdge { decomposition: DecompositionKind::And, means_end: false });

        let kb = KnowledgeBase::new("world");
        let (resolver, registry) = empty_env();
        let expansion = expand(&gm, &kb, &resolver, &registry).unwrap();
        assert_eq!(expansion.instances.len(), 1);
        assert_eq!(expansion.instances_by_task.get("go").unwrap().len(), 1);
    }

    #[test]
    fn unbound_variable_fails() {
        let mut gm = GoalModel::new();
        let root = gm.add_node(GmNode::goal("root", GoalType::Achieve));
        let mut task = GmNode::task("go");
        task.params = vec!["?missing".to_string()];
        let task = gm.add_node(task);
        gm.add_edge(root, task, GmEdge { decomposition: DecompositionKind::And, means_end: false });

        let kb = KnowledgeBase::new("world");
        let (resolver, registry) = empty_env();
        let err = expand(&gm, &kb, &resolver, &registry).unwrap_err();
        assert!(matches!(err, PipelineError::UnboundVariable { .. }));
    }
}
