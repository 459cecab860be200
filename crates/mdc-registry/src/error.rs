//! Errors raised while building or querying the registry.

/// Errors arising from sort, task, and method registration.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A sort was referenced before being declared.
    #[error("unknown sort: {0}")]
    UnknownSort(String),

    /// A sort was declared more than once.
    #[error("sort already declared: {0}")]
    DuplicateSort(String),

    /// A task was referenced before being declared.
    #[error("unknown task: {0}")]
    UnknownTask(String),

    /// A task was declared more than once.
    #[error("task already declared: {0}")]
    DuplicateTask(String),

    /// A method references an abstract task that does not exist.
    #[error("method {method} references unknown task {task}")]
    MethodTaskMismatch {
        /// Method name.
        method: String,
        /// Referenced task name.
        task: String,
    },

    /// A primitive task was given methods, or an abstract task was given a body.
    #[error("task {0} abstractness does not match its usage")]
    AbstractnessMismatch(String),
}
