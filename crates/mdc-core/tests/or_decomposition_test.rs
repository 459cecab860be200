use mdc_core::Pipeline;
use mdc_test_utils::scenarios::or_decomposition_multiple_missions;

#[test]
fn or_goal_forks_into_two_single_task_missions() {
    let s = or_decomposition_multiple_missions();
    let compiled = Pipeline::compile(&s.registry, &s.goal_model, &s.kb, &s.config, &s.world).unwrap();

    assert_eq!(compiled.missions.len(), 2);
    let first_ids: Vec<&str> = compiled.missions[0].decompositions.iter().map(|d| d.as_str()).collect();
    let second_ids: Vec<&str> = compiled.missions[1].decompositions.iter().map(|d| d.as_str()).collect();
    assert_eq!(first_ids, vec!["t1|0"]);
    assert_eq!(second_ids, vec!["t2|0"]);
    assert!(compiled.constraints.is_empty());
}
