//! World-state initializer: materializes ground predicate and
//! function-valued literals from the knowledge base by applying the
//! configuration's semantic mappings.
//!
//! This lives here rather than in `mdc-world` because it needs both the
//! knowledge base (`mdc-world`) and the semantic mapping vocabulary
//! (`mdc-config`) -- putting it in `mdc-world` would make that crate depend
//! on its own downstream consumer. See `DESIGN.md` for the resulting
//! placement note.

use mdc_registry::{CompareOp, Literal};
use mdc_world::{AttrValue, KbNodeId, KnowledgeBase, ScalarValue, WorldState};

use crate::mapping::{MappedType, PredicateQuantifier, RelationshipType, SemanticMapping};
use crate::resolver::ConfigResolver;

/// Build the initial [`WorldState`] by applying every semantic mapping in
/// `resolver` to every matching node of `kb`.
///
/// No hard-coded function literals are ever emitted here: every
/// function-valued fact comes from a `mapped_type = function` semantic
/// mapping, per the source material's "dead knowledge-manager
/// initializations" notice.
#[must_use]
pub fn initialize_world(kb: &KnowledgeBase, resolver: &ConfigResolver) -> WorldState {
    let mut world = WorldState::new();
    for mapping in &resolver.config().semantic_mappings {
        match mapping {
            SemanticMapping::Attribute {
                relates_to,
                name,
                predicate_type,
                mapped_type,
            } => apply_attribute_mapping(kb, resolver, relates_to, name, *predicate_type, mapped_type, &mut world),
            SemanticMapping::Ownership {
                owner,
                owned,
                relationship_type,
                attribute_name,
                mapped_type,
            } => apply_relational_mapping(
                kb,
                resolver,
                owner,
                owned,
                *relationship_type,
                attribute_name,
                mapped_type,
                &mut world,
            ),
            SemanticMapping::Relationship {
                main_entity,
                related_entity,
                relationship_type,
                attribute_name,
                mapped_type,
            } => apply_relational_mapping(
                kb,
                resolver,
                main_entity,
                related_entity,
                *relationship_type,
                attribute_name,
                mapped_type,
                &mut world,
            ),
        }
    }
    world
}

/// Nodes of `kb` whose `kind` is aliased (via `resolver`'s `type_mapping`) to
/// `sort`, or whose `kind` literally equals `sort` when no alias is declared.
fn nodes_of_sort<'a>(kb: &'a KnowledgeBase, resolver: &ConfigResolver, sort: &str) -> Vec<(KbNodeId, &'a mdc_world::KbNode)> {
    let kind = resolver.kind_for_sort(sort).unwrap_or(sort);
    kb.iter().filter(|(_, n)| n.kind == kind).collect()
}

fn scalar_truthy(v: &ScalarValue) -> bool {
    match v {
        ScalarValue::Bool(b) => *b,
        ScalarValue::Int(i) => *i != 0,
        ScalarValue::Float(f) => *f != 0.0,
        ScalarValue::Str(s) => !s.is_empty(),
    }
}

fn scalar_as_f64(v: &ScalarValue) -> Option<f64> {
    match v {
        ScalarValue::Int(i) => Some(*i as f64),
        ScalarValue::Float(f) => Some(*f),
        _ => None,
    }
}

fn apply_attribute_mapping(
    kb: &KnowledgeBase,
    resolver: &ConfigResolver,
    relates_to: &str,
    attr_name: &str,
    quantifier: Option<PredicateQuantifier>,
    mapped_type: &MappedType,
    world: &mut WorldState,
) {
    for (id, node) in nodes_of_sort(kb, resolver, relates_to) {
        let Some(value) = node.attributes.get(attr_name) else {
            continue;
        };
        match mapped_type {
            MappedType::Predicate(pred_name) => {
                let holds = match value {
                    AttrValue::Scalar(s) => scalar_truthy(s),
                    AttrValue::List(items) => match quantifier.unwrap_or(PredicateQuantifier::Exists) {
                        PredicateQuantifier::Exists => items.iter().any(scalar_truthy),
                        PredicateQuantifier::ForAll => !items.is_empty() && items.iter().all(scalar_truthy),
                    },
                    AttrValue::Ref(_) => true,
                };
                let lit = if holds {
                    Literal::predicate(pred_name.clone(), vec![node.name.clone()])
                } else {
                    Literal::not_predicate(pred_name.clone(), vec![node.name.clone()])
                };
                world.apply_effect(&lit);
            }
            MappedType::Function(fn_name) => {
                if let AttrValue::Scalar(s) = value {
                    if let Some(n) = scalar_as_f64(s) {
                        world.apply_effect(&Literal::Comparison {
                            function: fn_name.clone(),
                            args: vec![node.name.clone()],
                            op: CompareOp::Eq,
                            value: n,
                        });
                    }
                }
            }
        }
        let _ = id;
    }
}

fn apply_relational_mapping(
    kb: &KnowledgeBase,
    resolver: &ConfigResolver,
    main_sort: &str,
    related_sort: &str,
    relationship_type: RelationshipType,
    attribute_name: &str,
    mapped_type: &MappedType,
    world: &mut WorldState,
) {
    let MappedType::Predicate(pred_name) = mapped_type else {
        // Relational mappings only ever produce predicates in this domain;
        // a function-valued relationship has no sensible numeric shape.
        return;
    };
    for (id, node) in nodes_of_sort(kb, resolver, main_sort) {
        let related_names: Vec<String> = match relationship_type {
            RelationshipType::Owns => kb
                .children_of(id, attribute_name)
                .into_iter()
                .filter_map(|cid| kb.node(cid))
                .map(|n| n.name.clone())
                .collect(),
            RelationshipType::RelatesTo => match node.attributes.get(attribute_name) {
                Some(AttrValue::Scalar(ScalarValue::Str(s))) => vec![s.clone()],
                Some(AttrValue::Ref(rid)) => kb.node(*rid).map(|n| n.name.clone()).into_iter().collect(),
                Some(AttrValue::List(items)) => items
                    .iter()
                    .filter_map(|v| match v {
                        ScalarValue::Str(s) => Some(s.clone()),
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            },
        };
        for related_name in related_names {
            world.apply_effect(&Literal::predicate(
                pred_name.clone(),
                vec![node.name.clone(), related_name],
            ));
        }
    }
    let _ = related_sort;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;

    fn kb_with_robot(battery: f64, clean: bool) -> KnowledgeBase {
        let mut kb = KnowledgeBase::new("world");
        let root = kb.root();
        let r1 = kb.add_child(root, "robots", "r1", "robot");
        kb.set_attribute(r1, "battery", AttrValue::Scalar(ScalarValue::Float(battery)));
        kb.set_attribute(r1, "is_clean", AttrValue::Scalar(ScalarValue::Bool(clean)));
        kb
    }

    #[test]
    fn attribute_mapping_to_function_emits_comparison() {
        let kb = kb_with_robot(42.0, true);
        let mut config = Configuration::new();
        config.type_mapping.insert("robot".into(), "robot".into());
        config.semantic_mappings.push(SemanticMapping::Attribute {
            relates_to: "robot".into(),
            name: "battery".into(),
            predicate_type: None,
            mapped_type: MappedType::Function("battery_level".into()),
        });
        let resolver = ConfigResolver::new(config);
        let world = initialize_world(&kb, &resolver);
        assert!(world.holds(&Literal::Comparison {
            function: "battery_level".into(),
            args: vec!["r1".into()],
            op: CompareOp::Eq,
            value: 42.0,
        }));
    }

    #[test]
    fn attribute_mapping_to_predicate_reflects_boolean() {
        let kb = kb_with_robot(10.0, true);
        let mut config = Configuration::new();
        config.type_mapping.insert("robot".into(), "robot".into());
        config.semantic_mappings.push(SemanticMapping::Attribute {
            relates_to: "robot".into(),
            name: "is_clean".into(),
            predicate_type: None,
            mapped_type: MappedType::Predicate("clean".into()),
        });
        let resolver = ConfigResolver::new(config);
        let world = initialize_world(&kb, &resolver);
        assert!(world.holds(&Literal::predicate("clean", vec!["r1".into()])));
    }

    #[test]
    fn ownership_mapping_emits_relation_per_child() {
        let mut kb = KnowledgeBase::new("world");
        let root = kb.root();
        let room = kb.add_child(root, "rooms", "room1", "location");
        kb.add_child(room, "occupants", "r1", "robot");
        let mut config = Configuration::new();
        config.type_mapping.insert("robotlocation".into(), "location".into());
        config.semantic_mappings.push(SemanticMapping::Ownership {
            owner: "robotlocation".into(),
            owned: "robot".into(),
            relationship_type: RelationshipType::Owns,
            attribute_name: "occupants".into(),
            mapped_type: MappedType::Predicate("at".into()),
        });
        let resolver = ConfigResolver::new(config);
        let world = initialize_world(&kb, &resolver);
        assert!(world.holds(&Literal::predicate("at", vec!["room1".into(), "r1".into()])));
    }
}
