use mdc_registry::Literal;
use mdc_world::WorldState;
use proptest::prelude::*;

fn predicate_strategy() -> impl Strategy<Value = Literal> {
    ("[a-z]{1,6}", prop::collection::vec("[a-z]{1,6}", 0..4))
        .prop_map(|(name, args)| Literal::predicate(name, args))
}

proptest! {
    #[test]
    fn apply_effect_always_makes_it_hold(lit in predicate_strategy()) {
        let mut world = WorldState::new();
        world.apply_effect(&lit);
        prop_assert!(world.holds(&lit));
        prop_assert!(!world.holds(&lit.negate()));
    }

    #[test]
    fn apply_effect_is_idempotent(lit in predicate_strategy()) {
        let mut once = WorldState::new();
        once.apply_effect(&lit);
        let mut twice = WorldState::new();
        twice.apply_effect(&lit);
        twice.apply_effect(&lit);
        prop_assert_eq!(once.facts().cloned().collect::<Vec<_>>(), twice.facts().cloned().collect::<Vec<_>>());
    }

    #[test]
    fn applying_negation_after_effect_overwrites_it(lit in predicate_strategy()) {
        let mut world = WorldState::new();
        world.apply_effect(&lit);
        world.apply_effect(&lit.negate());
        prop_assert!(!world.holds(&lit));
        prop_assert!(world.holds(&lit.negate()));
    }
}
