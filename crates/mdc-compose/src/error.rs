//! Errors raised while extracting constraints from a trimmed ATGraph.

/// Errors arising from constraint extraction.
#[derive(Debug, thiserror::Error)]
pub enum CompositionError {
    /// The supplied [`mdc_graph::TrimmedAtGraph`] was not produced by
    /// [`mdc_graph::assemble`] and carries no root node to recurse from.
    #[error("trimmed ATGraph has no root node")]
    MissingRoot,
}
