//! Errors raised while resolving or validating configuration.

/// Errors arising from configuration resolution and up-front validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A `var_mapping` entry named a task that does not exist.
    #[error("var_mapping references unknown task: {0}")]
    UnknownTaskInVarMapping(String),

    /// A semantic mapping named a sort that does not exist.
    #[error("semantic mapping references unknown sort: {0}")]
    UnknownSortInMapping(String),

    /// No semantic mapping was found for a required attribute/relationship
    /// during context or precondition grounding.
    #[error("no semantic mapping found for attribute {attr} on sort {sort}")]
    MissingSemanticMapping {
        /// Attribute name.
        attr: String,
        /// Sort name.
        sort: String,
    },
}
