//! Benchmarks valid-mission enumeration against a goal model with several
//! chained OR goals, the case that makes the enumerator's candidate set grow
//! combinatorially (one candidate per surviving combination of branches).

use criterion::{criterion_group, criterion_main, Criterion};

use mdc_config::{Configuration, ConfigResolver};
use mdc_core::goal_model::{GmEdge, GmNode, GoalModel, GoalType};
use mdc_core::Pipeline;
use mdc_graph::DecompositionKind;
use mdc_registry::{Registry, Task};
use mdc_world::{KnowledgeBase, WorldState};

fn or_edge() -> GmEdge {
    GmEdge { decomposition: DecompositionKind::Or, means_end: false }
}

fn and_edge() -> GmEdge {
    GmEdge { decomposition: DecompositionKind::And, means_end: false }
}

/// `width` sibling OR-goals under one root AND-goal, each OR-ing between two
/// no-op primitives: `2^width` surviving missions.
fn fanned_out_scenario(width: u32) -> (Registry, GoalModel) {
    let mut registry = Registry::new();
    let mut gm = GoalModel::new();
    let root = gm.add_node(GmNode::goal("root", GoalType::Achieve));

    for i in 0..width {
        let left = format!("t{i}_left");
        let right = format!("t{i}_right");
        registry.declare_task(Task::primitive(left.clone(), Vec::new(), Vec::new(), Vec::new())).unwrap();
        registry.declare_task(Task::primitive(right.clone(), Vec::new(), Vec::new(), Vec::new())).unwrap();

        let branch = gm.add_node(GmNode::goal(format!("g{i}"), GoalType::Achieve));
        gm.add_edge(root, branch, and_edge());
        let left_node = gm.add_node(GmNode::task(left));
        let right_node = gm.add_node(GmNode::task(right));
        gm.add_edge(branch, left_node, or_edge());
        gm.add_edge(branch, right_node, or_edge());
    }

    (registry, gm)
}

fn bench_mission_enumeration(c: &mut Criterion) {
    let (registry, goal_model) = fanned_out_scenario(6);
    let registry = registry.freeze();
    let kb = KnowledgeBase::new("world");
    let config = ConfigResolver::new(Configuration::new());
    let world = WorldState::new();

    c.bench_function("pipeline_compile_fanout_64_missions", |b| {
        b.iter(|| Pipeline::compile(&registry, &goal_model, &kb, &config, &world).unwrap());
    });
}

criterion_group!(benches, bench_mission_enumeration);
criterion_main!(benches);
