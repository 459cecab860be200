//! Fixture builders shared by the mission decomposition compiler's test
//! suites, plus the worked scenarios in [`scenarios`].

#![allow(missing_docs)]

pub mod scenarios;

use mdc_config::{Configuration, ConfigResolver};
use mdc_registry::{FrozenRegistry, Literal, Parameter, Registry, Task};
use mdc_world::{AttrValue, KbNodeId, KnowledgeBase, ScalarValue};

/// A frozen registry with a single primitive task taking one parameter and
/// unconditionally asserting one positive effect predicate over it.
pub fn primitive_registry(task_name: &str, param: &str, sort: &str, effect_predicate: &str) -> FrozenRegistry {
    let mut registry = Registry::new();
    registry
        .declare_task(Task::primitive(
            task_name,
            vec![Parameter::new(param, sort)],
            Vec::new(),
            vec![Literal::predicate(effect_predicate.to_string(), vec![param.to_string()])],
        ))
        .unwrap();
    registry.freeze()
}

/// An empty configuration resolver: no var mappings, semantic mappings, or
/// location-type aliasing declared.
#[must_use]
pub fn empty_config() -> ConfigResolver {
    ConfigResolver::new(Configuration::new())
}

/// A knowledge base whose root has a `"rooms"` collection of `location`
/// objects each flagged `is_room = true`, so `SelectExpr::Predicate("is_room",
/// true)` resolves to exactly this set.
pub fn kb_with_rooms(names: &[&str]) -> KnowledgeBase {
    let mut kb = KnowledgeBase::new("world");
    let root = kb.root();
    for name in names {
        let id = kb.add_child(root, "rooms", *name, "location");
        kb.set_attribute(id, "is_room", AttrValue::Scalar(ScalarValue::Bool(true)));
    }
    kb
}

/// A knowledge base with a single `robot` object flagged `is_robot = true`,
/// returning both the base and the new node's id.
pub fn kb_with_one_robot(name: &str) -> (KnowledgeBase, KbNodeId) {
    let mut kb = KnowledgeBase::new("world");
    let root = kb.root();
    let id = kb.add_child(root, "robots", name, "robot");
    kb.set_attribute(id, "is_robot", AttrValue::Scalar(ScalarValue::Bool(true)));
    (kb, id)
}
