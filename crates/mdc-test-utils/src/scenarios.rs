//! The six worked end-to-end scenarios: one function each, returning a
//! self-contained [`Scenario`] ready to hand to
//! `mdc_core::Pipeline::compile`.

use mdc_config::{Configuration, ConfigResolver};
use mdc_core::goal_model::{
    AchieveCondition, CreationCondition, GmEdge, GmNode, GoalModel, GoalType, QueriedProperty, QueryVarKind,
    SelectExpr,
};
use mdc_graph::DecompositionKind;
use mdc_registry::{FrozenRegistry, Literal, Method, Parameter, Registry, Subtask, Task};
use mdc_world::{AttrValue, KnowledgeBase, ScalarValue, WorldState};

use crate::empty_config;

/// Everything `Pipeline::compile` needs for one worked scenario.
pub struct Scenario {
    pub registry: FrozenRegistry,
    pub goal_model: GoalModel,
    pub kb: KnowledgeBase,
    pub config: ConfigResolver,
    pub world: WorldState,
}

fn and_edge() -> GmEdge {
    GmEdge { decomposition: DecompositionKind::And, means_end: false }
}

fn or_edge() -> GmEdge {
    GmEdge { decomposition: DecompositionKind::Or, means_end: false }
}

/// 1. Two cleanings in sequence: `forAll r in [RoomA, RoomB]: clean(r)`,
/// joined `SEQ`. One method for `clean`, so each replica has exactly one
/// decomposition path; expect one valid mission and a `SEQ` constraint
/// between the two replicas.
#[must_use]
pub fn two_cleanings_in_sequence() -> Scenario {
    let mut registry = Registry::new();
    registry
        .declare_task(Task::primitive(
            "do_clean",
            vec![Parameter::new("?r", "location")],
            Vec::new(),
            vec![Literal::predicate("cleaned", vec!["?r".into()])],
        ))
        .unwrap();
    registry.declare_task(Task::abstract_task("clean", vec![Parameter::new("?r", "location")])).unwrap();
    registry
        .declare_method(Method {
            name: "clean_m1".into(),
            task_name: "clean".into(),
            params: vec![Parameter::new("?r", "location")],
            subtasks: vec![Subtask { id: 1, task_name: "do_clean".into(), args: vec!["?r".into()] }],
            ordering: Vec::new(),
            precondition_task: None,
        })
        .unwrap();
    let registry = registry.freeze();

    let mut kb = KnowledgeBase::new("world");
    let root_kb = kb.root();
    for name in ["RoomA", "RoomB"] {
        let id = kb.add_child(root_kb, "rooms", name, "location");
        kb.set_attribute(id, "is_room", AttrValue::Scalar(ScalarValue::Bool(true)));
    }

    let mut gm = GoalModel::new();
    let mut query = GmNode::goal("rooms_query", GoalType::Query);
    query.queried_property = Some(QueriedProperty {
        controlled_var: "rooms".to_string(),
        select: SelectExpr::Predicate("is_room".to_string(), true),
        query_var: QueryVarKind::Collection,
    });
    let root = gm.add_node(query);

    let mut g1 = GmNode::goal("g1", GoalType::Achieve);
    g1.annotation = "SEQ".to_string();
    g1.controlled_vars = vec!["rooms".to_string(), "?r".to_string()];
    let g1_idx = gm.add_node(g1);
    gm.add_edge(root, g1_idx, and_edge());

    let mut task = GmNode::task("clean");
    task.params = vec!["?r".to_string()];
    let task_idx = gm.add_node(task);
    gm.add_edge(g1_idx, task_idx, and_edge());

    Scenario { registry, goal_model: gm, kb, config: empty_config(), world: WorldState::new() }
}

/// 2. `G1 = PAR(T1, T2)` with disjoint effects: both orders are equally
/// valid, so exactly one mission decomposition results (the DFS-order one)
/// and no constraints are emitted.
#[must_use]
pub fn parallel_independent_tasks() -> Scenario {
    let mut registry = Registry::new();
    registry
        .declare_task(Task::primitive("t1", Vec::new(), Vec::new(), vec![Literal::predicate("e1", Vec::new())]))
        .unwrap();
    registry
        .declare_task(Task::primitive("t2", Vec::new(), Vec::new(), vec![Literal::predicate("e2", Vec::new())]))
        .unwrap();
    let registry = registry.freeze();

    let mut gm = GoalModel::new();
    let mut g1 = GmNode::goal("g1", GoalType::Achieve);
    g1.annotation = "t1#t2".to_string();
    let root = gm.add_node(g1);
    let t1 = gm.add_node(GmNode::task("t1"));
    let t2 = gm.add_node(GmNode::task("t2"));
    gm.add_edge(root, t1, and_edge());
    gm.add_edge(root, t2, and_edge());

    Scenario {
        registry,
        goal_model: gm,
        kb: KnowledgeBase::new("world"),
        config: empty_config(),
        world: WorldState::new(),
    }
}

/// 3. `G1 = PAR(T1, T2)` but T2 is wrapped in a scope whose context
/// requires a predicate only T1's decomposition sets; the assembler installs
/// a CONTEXT-DEPENDENCY edge, which forces a `SEQ` constraint and prunes the
/// T2-first mission.
#[must_use]
pub fn context_dependency_forces_order() -> Scenario {
    let mut registry = Registry::new();
    registry
        .declare_task(Task::primitive("t1", Vec::new(), Vec::new(), vec![Literal::predicate("p", Vec::new())]))
        .unwrap();
    registry.declare_task(Task::primitive("t2", Vec::new(), Vec::new(), Vec::new())).unwrap();
    let registry = registry.freeze();

    let mut gm = GoalModel::new();
    let mut g1 = GmNode::goal("g1", GoalType::Achieve);
    g1.annotation = "t1#g2".to_string();
    let root = gm.add_node(g1);
    let t1 = gm.add_node(GmNode::task("t1"));
    gm.add_edge(root, t1, and_edge());

    let mut g2 = GmNode::goal("g2", GoalType::Achieve);
    g2.creation_condition = Some(CreationCondition::Condition(vec![Literal::predicate("p", Vec::new())]));
    let g2_idx = gm.add_node(g2);
    gm.add_edge(root, g2_idx, and_edge());
    let t2 = gm.add_node(GmNode::task("t2"));
    gm.add_edge(g2_idx, t2, and_edge());

    Scenario {
        registry,
        goal_model: gm,
        kb: KnowledgeBase::new("world"),
        config: empty_config(),
        world: WorldState::new(),
    }
}

/// 4. `G1(Achieve, forAll r in Rooms: clean(r))` where `clean` has two
/// methods of differing cost: `clean_full` (sets `cleaned(r)`) and
/// `clean_quick` (a no-op). Closing `g1`'s achieve-scope checks every
/// replica's committed effects against `cleaned(r)`; only `clean_full`
/// satisfies it, so `clean_quick` is pruned from the surviving missions.
#[must_use]
pub fn achieve_condition_filter() -> Scenario {
    let mut registry = Registry::new();
    registry
        .declare_task(Task::primitive(
            "do_full_clean",
            vec![Parameter::new("?r", "location")],
            Vec::new(),
            vec![Literal::predicate("cleaned", vec!["?r".into()])],
        ))
        .unwrap();
    registry
        .declare_task(Task::primitive("do_quick_clean", vec![Parameter::new("?r", "location")], Vec::new(), Vec::new()))
        .unwrap();
    registry.declare_task(Task::abstract_task("clean", vec![Parameter::new("?r", "location")])).unwrap();
    registry
        .declare_method(Method {
            name: "clean_full".into(),
            task_name: "clean".into(),
            params: vec![Parameter::new("?r", "location")],
            subtasks: vec![Subtask { id: 1, task_name: "do_full_clean".into(), args: vec!["?r".into()] }],
            ordering: Vec::new(),
            precondition_task: None,
        })
        .unwrap();
    registry
        .declare_method(Method {
            name: "clean_quick".into(),
            task_name: "clean".into(),
            params: vec![Parameter::new("?r", "location")],
            subtasks: vec![Subtask { id: 1, task_name: "do_quick_clean".into(), args: vec!["?r".into()] }],
            ordering: Vec::new(),
            precondition_task: None,
        })
        .unwrap();
    let registry = registry.freeze();

    let mut kb = KnowledgeBase::new("world");
    let root_kb = kb.root();
    let id = kb.add_child(root_kb, "rooms", "RoomA", "location");
    kb.set_attribute(id, "is_room", AttrValue::Scalar(ScalarValue::Bool(true)));

    let mut gm = GoalModel::new();
    let mut query = GmNode::goal("rooms_query", GoalType::Query);
    query.queried_property = Some(QueriedProperty {
        controlled_var: "rooms".to_string(),
        select: SelectExpr::Predicate("is_room".to_string(), true),
        query_var: QueryVarKind::Collection,
    });
    let root = gm.add_node(query);

    let mut g1 = GmNode::goal("g1", GoalType::Achieve);
    g1.controlled_vars = vec!["rooms".to_string(), "?r".to_string()];
    g1.achieve_condition = Some(AchieveCondition { literals: vec![Literal::predicate("cleaned", vec!["?r".into()])] });
    let g1_idx = gm.add_node(g1);
    gm.add_edge(root, g1_idx, and_edge());

    let mut task = GmNode::task("clean");
    task.params = vec!["?r".to_string()];
    let task_idx = gm.add_node(task);
    gm.add_edge(g1_idx, task_idx, and_edge());

    Scenario { registry, goal_model: gm, kb, config: empty_config(), world: WorldState::new() }
}

/// 5. `G1 = OR(T1, T2)`: two independent single-task missions.
#[must_use]
pub fn or_decomposition_multiple_missions() -> Scenario {
    let mut registry = Registry::new();
    registry.declare_task(Task::primitive("t1", Vec::new(), Vec::new(), Vec::new())).unwrap();
    registry.declare_task(Task::primitive("t2", Vec::new(), Vec::new(), Vec::new())).unwrap();
    let registry = registry.freeze();

    let mut gm = GoalModel::new();
    let root = gm.add_node(GmNode::goal("g1", GoalType::Achieve));
    let t1 = gm.add_node(GmNode::task("t1"));
    let t2 = gm.add_node(GmNode::task("t2"));
    gm.add_edge(root, t1, or_edge());
    gm.add_edge(root, t2, or_edge());

    Scenario {
        registry,
        goal_model: gm,
        kb: KnowledgeBase::new("world"),
        config: empty_config(),
        world: WorldState::new(),
    }
}

/// 6. A `Group=false` scope containing two tasks bound to the same robot:
/// expect an EXEC-EXCLUSIVE constraint between their decompositions.
#[must_use]
pub fn non_group_scope_forces_exclusion() -> Scenario {
    let mut registry = Registry::new();
    registry.sorts_mut().add_object("robot", "r1").unwrap();
    registry
        .declare_task(Task::primitive(
            "t1",
            vec![Parameter::new("?bot", "robot")],
            Vec::new(),
            vec![Literal::predicate("holding", vec!["?bot".into()])],
        ))
        .unwrap();
    registry
        .declare_task(Task::primitive(
            "t2",
            vec![Parameter::new("?bot", "robot")],
            vec![Literal::predicate("holding", vec!["?bot".into()])],
            Vec::new(),
        ))
        .unwrap();
    let registry = registry.freeze();

    let mut kb = KnowledgeBase::new("world");
    let root_kb = kb.root();
    let id = kb.add_child(root_kb, "robots", "r1", "robot");
    kb.set_attribute(id, "is_robot", AttrValue::Scalar(ScalarValue::Bool(true)));

    let mut gm = GoalModel::new();
    let mut query = GmNode::goal("bot_query", GoalType::Query);
    query.queried_property = Some(QueriedProperty {
        controlled_var: "?bot".to_string(),
        select: SelectExpr::Predicate("is_robot".to_string(), true),
        query_var: QueryVarKind::Scalar,
    });
    let root = gm.add_node(query);

    let mut g1 = GmNode::goal("g1", GoalType::Achieve);
    g1.group = false;
    let g1_idx = gm.add_node(g1);
    gm.add_edge(root, g1_idx, and_edge());

    let mut t1 = GmNode::task("t1");
    t1.params = vec!["?bot".to_string()];
    let t1_idx = gm.add_node(t1);
    gm.add_edge(g1_idx, t1_idx, and_edge());

    let mut t2 = GmNode::task("t2");
    t2.params = vec!["?bot".to_string()];
    let t2_idx = gm.add_node(t2);
    gm.add_edge(g1_idx, t2_idx, and_edge());

    Scenario { registry, goal_model: gm, kb, config: empty_config(), world: WorldState::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdc_core::Pipeline;

    #[test]
    fn two_cleanings_compiles_to_one_mission_with_seq_constraint() {
        let s = two_cleanings_in_sequence();
        let compiled = Pipeline::compile(&s.registry, &s.goal_model, &s.kb, &s.config, &s.world).unwrap();
        assert_eq!(compiled.missions.len(), 1);
        assert_eq!(compiled.missions[0].decompositions.len(), 2);
        assert!(compiled
            .constraints
            .iter()
            .any(|c| c.kind == mdc_compose::EmittedConstraintKind::Seq));
    }

    #[test]
    fn parallel_independent_tasks_has_no_constraints() {
        let s = parallel_independent_tasks();
        let compiled = Pipeline::compile(&s.registry, &s.goal_model, &s.kb, &s.config, &s.world).unwrap();
        assert_eq!(compiled.missions.len(), 1);
        assert!(compiled.constraints.is_empty());
    }

    #[test]
    fn context_dependency_yields_seq_and_prunes_alternate_order() {
        let s = context_dependency_forces_order();
        let compiled = Pipeline::compile(&s.registry, &s.goal_model, &s.kb, &s.config, &s.world).unwrap();
        assert_eq!(compiled.missions.len(), 1);
        assert_eq!(compiled.missions[0].decompositions[0].as_str(), "t1|0");
        assert!(compiled
            .constraints
            .iter()
            .any(|c| c.kind == mdc_compose::EmittedConstraintKind::Seq));
    }

    #[test]
    fn achieve_condition_filter_prunes_the_no_op_decomposition() {
        let s = achieve_condition_filter();
        let compiled = Pipeline::compile(&s.registry, &s.goal_model, &s.kb, &s.config, &s.world).unwrap();
        assert_eq!(compiled.missions.len(), 1);
    }

    #[test]
    fn or_decomposition_yields_two_missions() {
        let s = or_decomposition_multiple_missions();
        let compiled = Pipeline::compile(&s.registry, &s.goal_model, &s.kb, &s.config, &s.world).unwrap();
        assert_eq!(compiled.missions.len(), 2);
        assert_eq!(compiled.missions[0].decompositions.len(), 1);
        assert_eq!(compiled.missions[1].decompositions.len(), 1);
    }

    #[test]
    fn non_group_scope_yields_exec_exclusive_constraint() {
        let s = non_group_scope_forces_exclusion();
        let compiled = Pipeline::compile(&s.registry, &s.goal_model, &s.kb, &s.config, &s.world).unwrap();
        assert!(compiled
            .constraints
            .iter()
            .any(|c| c.kind == mdc_compose::EmittedConstraintKind::ExecExclusive));
    }
}
