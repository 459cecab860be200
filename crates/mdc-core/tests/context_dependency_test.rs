use mdc_compose::EmittedConstraintKind;
use mdc_core::Pipeline;
use mdc_test_utils::scenarios::context_dependency_forces_order;

#[test]
fn context_dependency_prunes_the_alternate_ordering() {
    let s = context_dependency_forces_order();
    let compiled = Pipeline::compile(&s.registry, &s.goal_model, &s.kb, &s.config, &s.world).unwrap();

    // Only one order survives: t1 establishes `p` before g2's subtree runs.
    assert_eq!(compiled.missions.len(), 1);
    let ids: Vec<&str> = compiled.missions[0].decompositions.iter().map(|d| d.as_str()).collect();
    assert_eq!(ids, vec!["t1|0", "t2|0"]);

    assert!(compiled
        .constraints
        .iter()
        .any(|c| c.kind == EmittedConstraintKind::Seq && c.a == "t1|0" && c.b == "t2|0"));
}
