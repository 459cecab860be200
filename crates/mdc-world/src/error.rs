//! Errors raised while resolving or initializing world state.

/// Errors arising from knowledge-base and world-state operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// An attribute path could not be resolved against the knowledge base.
    #[error("unresolved attribute path: {0}")]
    UnresolvedPath(String),

    /// A semantic mapping referenced an attribute that does not exist on
    /// the target node.
    #[error("missing attribute {attr} on node {node}")]
    MissingAttribute {
        /// Attribute name.
        attr: String,
        /// Node name the attribute was expected on.
        node: String,
    },
}
