use mdc_compose::EmittedConstraintKind;
use mdc_core::Pipeline;
use mdc_test_utils::scenarios::non_group_scope_forces_exclusion;

#[test]
fn shared_robot_argument_under_a_non_group_scope_yields_exec_exclusive() {
    let s = non_group_scope_forces_exclusion();
    let compiled = Pipeline::compile(&s.registry, &s.goal_model, &s.kb, &s.config, &s.world).unwrap();

    let exclusive: Vec<_> = compiled
        .constraints
        .iter()
        .filter(|c| c.kind == EmittedConstraintKind::ExecExclusive)
        .collect();
    assert_eq!(exclusive.len(), 1);
    assert_eq!(exclusive[0].group, Some(false));
}
