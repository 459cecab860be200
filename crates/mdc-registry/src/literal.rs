//! Ground and partially-ground literals shared by preconditions, effects,
//! and world-state facts.

use serde::{Deserialize, Serialize};

/// Comparison operator for function-valued literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `>`
    Gt,
    /// `<`
    Lt,
}

/// A single predicate or comparison literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    // `Eq`/`Hash` are implemented manually below (`Comparison` carries an
    // `f64`, which derives neither), so world states can hold these in a
    // `HashSet`.
    /// A predicate applied to object arguments, possibly negated.
    Predicate {
        /// Predicate name.
        name: String,
        /// Argument object names, in declared order.
        args: Vec<String>,
        /// `false` for a negated literal (`not (at r l)`).
        positive: bool,
    },
    /// A numeric function compared against a constant.
    Comparison {
        /// Function name.
        function: String,
        /// Argument object names.
        args: Vec<String>,
        /// Comparison operator.
        op: CompareOp,
        /// Right-hand side constant.
        value: f64,
    },
}

impl Eq for Literal {}

impl std::hash::Hash for Literal {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Self::Predicate { name, args, positive } => {
                0u8.hash(state);
                name.hash(state);
                args.hash(state);
                positive.hash(state);
            }
            Self::Comparison { function, args, op, value } => {
                1u8.hash(state);
                function.hash(state);
                args.hash(state);
                (*op as u8).hash(state);
                value.to_bits().hash(state);
            }
        }
    }
}

impl Literal {
    /// Convenience constructor for a positive predicate literal.
    #[inline]
    #[must_use]
    pub fn predicate(name: impl Into<String>, args: Vec<String>) -> Self {
        Self::Predicate {
            name: name.into(),
            args,
            positive: true,
        }
    }

    /// Convenience constructor for a negated predicate literal.
    #[inline]
    #[must_use]
    pub fn not_predicate(name: impl Into<String>, args: Vec<String>) -> Self {
        Self::Predicate {
            name: name.into(),
            args,
            positive: false,
        }
    }

    /// The logical negation of this literal.
    #[must_use]
    pub fn negate(&self) -> Self {
        match self {
            Self::Predicate { name, args, positive } => Self::Predicate {
                name: name.clone(),
                args: args.clone(),
                positive: !positive,
            },
            Self::Comparison { function, args, op, value } => {
                let op = match op {
                    CompareOp::Eq => CompareOp::Eq, // `!=` is not representable; Eq negation handled by caller
                    CompareOp::Gt => CompareOp::Lt,
                    CompareOp::Lt => CompareOp::Gt,
                };
                Self::Comparison {
                    function: function.clone(),
                    args: args.clone(),
                    op,
                    value: *value,
                }
            }
        }
    }

    /// Rewrite every argument name through `rename`, leaving unmapped names
    /// untouched. Used when substituting method-local variable names into a
    /// containing task's namespace during decomposition-path construction.
    #[must_use]
    pub fn rename_args(&self, rename: &std::collections::HashMap<String, String>) -> Self {
        let map_args = |args: &[String]| -> Vec<String> {
            args.iter()
                .map(|a| rename.get(a).cloned().unwrap_or_else(|| a.clone()))
                .collect()
        };
        match self {
            Self::Predicate { name, args, positive } => Self::Predicate {
                name: name.clone(),
                args: map_args(args),
                positive: *positive,
            },
            Self::Comparison { function, args, op, value } => Self::Comparison {
                function: function.clone(),
                args: map_args(args),
                op: *op,
                value: *value,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn negate_predicate_flips_sign() {
        let l = Literal::predicate("at", vec!["r1".into(), "room1".into()]);
        let n = l.negate();
        assert!(matches!(n, Literal::Predicate { positive: false, .. }));
    }

    #[test]
    fn rename_args_substitutes_known_names() {
        let l = Literal::predicate("at", vec!["?r".into(), "room1".into()]);
        let mut map = HashMap::new();
        map.insert("?r".to_string(), "robot3".to_string());
        let renamed = l.rename_args(&map);
        match renamed {
            Literal::Predicate { args, .. } => assert_eq!(args, vec!["robot3", "room1"]),
            _ => panic!("expected predicate"),
        }
    }

    #[test]
    fn comparison_negate_swaps_gt_lt() {
        let l = Literal::Comparison {
            function: "battery".into(),
            args: vec!["r1".into()],
            op: CompareOp::Gt,
            value: 50.0,
        };
        match l.negate() {
            Literal::Comparison { op, .. } => assert_eq!(op, CompareOp::Lt),
            _ => panic!("expected comparison"),
        }
    }
}
