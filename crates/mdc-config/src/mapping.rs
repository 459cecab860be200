//! Semantic mappings from knowledge-base shape to predicate/function vocabulary.

use serde::{Deserialize, Serialize};

/// Whether a semantic mapping targets a predicate or a function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MappedType {
    /// Maps to a predicate of the given name.
    Predicate(String),
    /// Maps to a function of the given name.
    Function(String),
}

/// Quantifier carried by an attribute-style semantic mapping, distinguishing
/// e.g. "exists a room with this attribute" from "every room has it".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredicateQuantifier {
    /// At least one matching child.
    Exists,
    /// Every matching child.
    ForAll,
}

/// The kind of relationship a mapping expresses between two sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipType {
    /// One side owns the other (knowledge-base parent/child collection).
    Owns,
    /// Side-by-side relationship with no ownership implication.
    RelatesTo,
}

/// A single semantic mapping entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SemanticMapping {
    /// An attribute on objects of sort `relates_to` maps to a predicate or
    /// function named by `mapped_type`.
    Attribute {
        /// Sort the attribute belongs to.
        relates_to: String,
        /// Attribute name in the knowledge base.
        name: String,
        /// Quantifier, if the attribute is collection-valued.
        predicate_type: Option<PredicateQuantifier>,
        /// Target predicate/function.
        mapped_type: MappedType,
    },
    /// An ownership relationship between two sorts maps to a predicate or
    /// function.
    Ownership {
        /// Owning sort.
        owner: String,
        /// Owned sort.
        owned: String,
        /// Relationship kind.
        relationship_type: RelationshipType,
        /// Knowledge-base attribute/collection name expressing the relationship.
        attribute_name: String,
        /// Target predicate/function.
        mapped_type: MappedType,
    },
    /// A general relationship between two sorts maps to a predicate or function.
    Relationship {
        /// Primary sort.
        main_entity: String,
        /// Related sort.
        related_entity: String,
        /// Relationship kind.
        relationship_type: RelationshipType,
        /// Knowledge-base attribute/collection name expressing the relationship.
        attribute_name: String,
        /// Target predicate/function.
        mapped_type: MappedType,
    },
}

impl SemanticMapping {
    /// The predicate or function this mapping ultimately targets.
    #[must_use]
    pub fn mapped_type(&self) -> &MappedType {
        match self {
            Self::Attribute { mapped_type, .. }
            | Self::Ownership { mapped_type, .. }
            | Self::Relationship { mapped_type, .. } => mapped_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_type_accessor() {
        let m = SemanticMapping::Attribute {
            relates_to: "robot".into(),
            name: "battery".into(),
            predicate_type: None,
            mapped_type: MappedType::Function("battery_level".into()),
        };
        assert_eq!(m.mapped_type(), &MappedType::Function("battery_level".into()));
    }
}
