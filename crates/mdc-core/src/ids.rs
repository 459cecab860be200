//! Derived, human-legible identifiers.
//!
//! Most entities in this crate would use opaque `Ulid`-backed ids, but
//! abstract-task instances and decompositions need ids whose *shape*
//! downstream code (and humans reading a mission report) can rely on:
//! `"<gm-task-id>#<expansion-index>..."` for instances, `"<at-id>|<k>"`
//! for decompositions.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Errors raised constructing a derived id from a raw string.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The supplied string was empty.
    #[error("id must not be empty")]
    Empty,
    /// An [`AtInstanceId`] contained a `|`, which would make decomposition
    /// ids derived from it ambiguous to parse.
    #[error("instance id must not contain '|': {0}")]
    ContainsPipe(String),
}

/// Identifier of an abstract-task instance, unique across a compiled
/// mission.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AtInstanceId(String);

impl AtInstanceId {
    /// Validate and wrap a raw instance id.
    ///
    /// # Errors
    /// [`IdError::Empty`] if `raw` is empty, [`IdError::ContainsPipe`] if
    /// it contains `|` (which is the decomposition-id separator).
    pub fn new(raw: impl Into<String>) -> Result<Self, IdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(IdError::Empty);
        }
        if raw.contains('|') {
            return Err(IdError::ContainsPipe(raw));
        }
        Ok(Self(raw))
    }

    /// Borrow the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AtInstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a decomposition: an abstract-task instance paired with
/// one TDG-enumerated path, in the form `"<at-id>|<k>"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DecompositionId(String);

impl DecompositionId {
    /// Build a decomposition id from its owning instance id and path
    /// index.
    #[must_use]
    pub fn new(instance: &AtInstanceId, k: usize) -> Self {
        Self(format!("{instance}|{k}"))
    }

    /// Parse a previously-formatted decomposition id back into its
    /// owning instance id and path index.
    ///
    /// # Errors
    /// [`IdError::Empty`] if the string has no `|`-separated path index,
    /// or if the instance-id half fails [`AtInstanceId::new`].
    pub fn parse(raw: &str) -> Result<(AtInstanceId, usize), IdError> {
        let (instance, k) = raw.rsplit_once('|').ok_or(IdError::Empty)?;
        let k: usize = k.parse().map_err(|_| IdError::Empty)?;
        Ok((AtInstanceId::new(instance)?, k))
    }

    /// Borrow the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DecompositionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
