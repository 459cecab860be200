//! The knowledge-base tree: a typed tree of world objects with attributes
//! and named child collections, as consumed by goal-model query resolution
//! and semantic-mapping lookups.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Identifier of a node within a [`KnowledgeBase`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KbNodeId(pub usize);

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    /// String value.
    Str(String),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
}

/// An attribute value: scalar, list of scalars, or a reference to another node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// Single scalar.
    Scalar(ScalarValue),
    /// List of scalars (used for e.g. a robot's declared capabilities).
    List(Vec<ScalarValue>),
    /// Reference to another knowledge-base node.
    Ref(KbNodeId),
}

/// A single node in the knowledge-base tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbNode {
    /// World-object kind, e.g. `"location"`, `"robot"`.
    pub kind: String,
    /// Object name, unique within its parent collection.
    pub name: String,
    /// Attribute map.
    pub attributes: HashMap<String, AttrValue>,
    /// Named child collections (e.g. `"rooms"`, `"robots"`).
    pub children: HashMap<String, Vec<KbNodeId>>,
}

/// An arena-backed knowledge-base tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    nodes: Vec<KbNode>,
    root: KbNodeId,
}

impl KnowledgeBase {
    /// Create a new knowledge base with a single root node of kind `"world"`.
    #[must_use]
    pub fn new(root_name: impl Into<String>) -> Self {
        let root_node = KbNode {
            kind: "world".to_string(),
            name: root_name.into(),
            attributes: HashMap::new(),
            children: HashMap::new(),
        };
        Self {
            nodes: vec![root_node],
            root: KbNodeId(0),
        }
    }

    /// The root node id.
    #[inline]
    #[must_use]
    pub fn root(&self) -> KbNodeId {
        self.root
    }

    /// Look up a node by id.
    #[inline]
    #[must_use]
    pub fn node(&self, id: KbNodeId) -> Option<&KbNode> {
        self.nodes.get(id.0)
    }

    /// Mutable lookup by id.
    #[inline]
    pub fn node_mut(&mut self, id: KbNodeId) -> Option<&mut KbNode> {
        self.nodes.get_mut(id.0)
    }

    /// Add a new child node named `name` of kind `kind` under `parent`'s
    /// `collection`. Returns the new node's id.
    pub fn add_child(
        &mut self,
        parent: KbNodeId,
        collection: &str,
        name: impl Into<String>,
        kind: impl Into<String>,
    ) -> KbNodeId {
        let id = KbNodeId(self.nodes.len());
        self.nodes.push(KbNode {
            kind: kind.into(),
            name: name.into(),
            attributes: HashMap::new(),
            children: HashMap::new(),
        });
        self.nodes[parent.0]
            .children
            .entry(collection.to_string())
            .or_default()
            .push(id);
        id
    }

    /// Find a child of `parent` named `name` within `collection`.
    #[must_use]
    pub fn find_child(&self, parent: KbNodeId, collection: &str, name: &str) -> Option<KbNodeId> {
        let parent_node = self.nodes.get(parent.0)?;
        let ids = parent_node.children.get(collection)?;
        ids.iter()
            .copied()
            .find(|id| self.nodes.get(id.0).is_some_and(|n| n.name == name))
    }

    /// All children of `parent` within `collection`.
    #[must_use]
    pub fn children_of(&self, parent: KbNodeId, collection: &str) -> Vec<KbNodeId> {
        self.nodes
            .get(parent.0)
            .and_then(|n| n.children.get(collection))
            .cloned()
            .unwrap_or_default()
    }

    /// Set an attribute value on a node.
    pub fn set_attribute(&mut self, id: KbNodeId, attr: impl Into<String>, value: AttrValue) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.attributes.insert(attr.into(), value);
        }
    }

    /// Get an attribute value on a node.
    #[must_use]
    pub fn attribute(&self, id: KbNodeId, attr: &str) -> Option<&AttrValue> {
        self.nodes.get(id.0)?.attributes.get(attr)
    }

    /// Iterate over every node in the arena (including the root), in
    /// insertion order. Used by the world-state initializer to sweep the
    /// whole tree applying semantic mappings without knowing the shape of
    /// the domain up front.
    pub fn iter(&self) -> impl Iterator<Item = (KbNodeId, &KbNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (KbNodeId(i), node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_find_child() {
        let mut kb = KnowledgeBase::new("w");
        let root = kb.root();
        let room1 = kb.add_child(root, "rooms", "room1", "location");
        assert_eq!(kb.find_child(root, "rooms", "room1"), Some(room1));
        assert_eq!(kb.find_child(root, "rooms", "room2"), None);
    }

    #[test]
    fn children_of_collection() {
        let mut kb = KnowledgeBase::new("w");
        let root = kb.root();
        kb.add_child(root, "rooms", "room1", "location");
        kb.add_child(root, "rooms", "room2", "location");
        assert_eq!(kb.children_of(root, "rooms").len(), 2);
        assert_eq!(kb.children_of(root, "robots").len(), 0);
    }

    #[test]
    fn attributes_round_trip() {
        let mut kb = KnowledgeBase::new("w");
        let root = kb.root();
        let r1 = kb.add_child(root, "robots", "r1", "robot");
        kb.set_attribute(r1, "battery", AttrValue::Scalar(ScalarValue::Float(80.0)));
        assert_eq!(
            kb.attribute(r1, "battery"),
            Some(&AttrValue::Scalar(ScalarValue::Float(80.0)))
        );
    }
}
