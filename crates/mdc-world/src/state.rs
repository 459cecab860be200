//! Symbolic world state: the set of literals believed true during path
//! enumeration and mission enumeration, under an open-world assumption.

use std::collections::HashSet;

use mdc_registry::Literal;

/// A symbolic snapshot of ground/partially-ground literals.
///
/// Under the open-world assumption, absence of a literal means "unknown",
/// not "false" -- only an explicit negative literal counts as a known
/// falsehood. [`WorldState::check_and_extend`] therefore only rejects a
/// candidate literal when its negation is already known true, and otherwise
/// commits it optimistically.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    facts: HashSet<Literal>,
}

impl WorldState {
    /// Empty world state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// World state seeded with a fixed set of literals.
    #[must_use]
    pub fn from_literals(facts: impl IntoIterator<Item = Literal>) -> Self {
        Self {
            facts: facts.into_iter().collect(),
        }
    }

    /// Whether `literal` is known true.
    #[must_use]
    pub fn holds(&self, literal: &Literal) -> bool {
        self.facts.contains(literal)
    }

    /// Whether `literal`'s negation is known true (a contradiction if we
    /// were to also assert `literal`).
    #[must_use]
    pub fn contradicts(&self, literal: &Literal) -> bool {
        self.facts.contains(&literal.negate())
    }

    /// Check a precondition literal against this world state and, if it does
    /// not contradict known facts, commit it (open-world best-effort
    /// accumulation). Returns `false` if `literal` contradicts an existing
    /// fact, in which case the caller must discard the candidate path.
    pub fn check_and_extend(&mut self, literal: &Literal) -> bool {
        if self.contradicts(literal) {
            return false;
        }
        self.facts.insert(literal.clone());
        true
    }

    /// Apply an effect literal unconditionally (effects are always committed,
    /// replacing any contradicting fact).
    pub fn apply_effect(&mut self, literal: &Literal) {
        self.facts.remove(&literal.negate());
        self.facts.insert(literal.clone());
    }

    /// Iterate over all known facts.
    pub fn facts(&self) -> impl Iterator<Item = &Literal> {
        self.facts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdc_registry::Literal;

    #[test]
    fn contradicting_literal_is_rejected() {
        let mut world = WorldState::from_literals([Literal::not_predicate(
            "at",
            vec!["r1".into(), "room1".into()],
        )]);
        let proposed = Literal::predicate("at", vec!["r1".into(), "room1".into()]);
        assert!(!world.check_and_extend(&proposed));
    }

    #[test]
    fn non_contradicting_literal_is_committed() {
        let mut world = WorldState::new();
        let proposed = Literal::predicate("at", vec!["r1".into(), "room1".into()]);
        assert!(world.check_and_extend(&proposed));
        assert!(world.holds(&proposed));
    }

    #[test]
    fn apply_effect_overwrites_negation() {
        let mut world = WorldState::from_literals([Literal::not_predicate(
            "clean",
            vec!["room1".into()],
        )]);
        world.apply_effect(&Literal::predicate("clean", vec!["room1".into()]));
        assert!(world.holds(&Literal::predicate("clean", vec!["room1".into()])));
        assert!(!world.holds(&Literal::not_predicate("clean", vec!["room1".into()])));
    }
}
