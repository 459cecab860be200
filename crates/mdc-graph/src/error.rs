//! Errors raised while constructing or querying graphs.

/// Errors arising from TDG and ATGraph construction.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A task referenced by a method or the TDG root does not exist.
    #[error("unknown task: {0}")]
    UnknownTask(String),

    /// An abstract task has no declared methods.
    #[error("abstract task {0} has no methods")]
    NoMethodsForTask(String),

    /// Validation of a constructed graph failed.
    #[error("graph validation failed: {0}")]
    ValidationFailed(String),

    /// An ATGraph node referenced another node id that does not exist.
    #[error("referential integrity violation: node {0} not found")]
    DanglingReference(String),

    /// A goal's context condition holds in no reachable world and no
    /// earlier task in the annotation tree can be made to force it.
    #[error("unsatisfied context for goal {0}: no earlier task establishes it")]
    UnsatisfiedContext(String),
}
