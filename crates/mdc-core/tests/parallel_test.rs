use mdc_core::Pipeline;
use mdc_test_utils::scenarios::parallel_independent_tasks;

#[test]
fn independent_par_tasks_compile_to_one_unconstrained_mission() {
    let s = parallel_independent_tasks();
    let compiled = Pipeline::compile(&s.registry, &s.goal_model, &s.kb, &s.config, &s.world).unwrap();

    assert!(compiled.constraints.is_empty());
    assert_eq!(compiled.missions.len(), 1);
    assert_eq!(compiled.missions[0].decompositions.len(), 2);
    assert_eq!(compiled.instances.instances.len(), 2);
}
