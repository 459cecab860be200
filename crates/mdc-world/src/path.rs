//! Attribute paths for addressing nodes within the knowledge base.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::kb::{KbNodeId, KnowledgeBase};

/// Hierarchical path into the knowledge-base tree.
///
/// # Examples
/// - `["warehouse", "room1"]` -> `warehouse.room1`
/// - `["robotteam", "alpha", "battery"]` -> `robotteam.alpha.battery`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttrPath(Vec<String>);

impl AttrPath {
    /// Create a new path from segments.
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Create a path from a single segment.
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// The empty (root) path.
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path segments.
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this path is the root.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parent path, `None` at the root.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Last segment.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Append a segment, returning a new path.
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Whether this path is a prefix of (or equal to) `other`.
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Resolve this path against a [`KnowledgeBase`], walking named child
    /// collections starting at the KB root: odd segments select a
    /// collection name, the following segment selects a member by name
    /// within it.
    #[must_use]
    pub fn resolve_in(&self, kb: &KnowledgeBase) -> Option<KbNodeId> {
        let mut current = kb.root();
        let mut segs = self.0.iter().peekable();
        while let Some(collection) = segs.next() {
            let name = segs.next()?;
            current = kb.find_child(current, collection, name)?;
        }
        Some(current)
    }
}

impl Display for AttrPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for AttrPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let segments: Vec<String> = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment)
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;
        Ok(Self(segments))
    }
}

impl From<Vec<String>> for AttrPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl Default for AttrPath {
    fn default() -> Self {
        Self::root()
    }
}

/// Errors arising from parsing an [`AttrPath`].
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Path contains an empty segment (`a..b`).
    #[error("path contains empty segment")]
    EmptySegment,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::KnowledgeBase;

    #[test]
    fn path_parent_and_last() {
        let p = AttrPath::new(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(p.last(), Some("c"));
        assert_eq!(p.parent().unwrap().segments(), &["a", "b"]);
    }

    #[test]
    fn path_from_str_round_trips() {
        let p: AttrPath = "robotteam.alpha".parse().unwrap();
        assert_eq!(p.to_string(), "robotteam.alpha");
    }

    #[test]
    fn path_is_prefix_of() {
        let a: AttrPath = "a.b".parse().unwrap();
        let b: AttrPath = "a.b.c".parse().unwrap();
        assert!(a.is_prefix_of(&b));
        assert!(!b.is_prefix_of(&a));
    }

    #[test]
    fn path_from_str_empty_segment_fails() {
        let result: Result<AttrPath, _> = "a..b".parse();
        assert!(matches!(result, Err(PathError::EmptySegment)));
    }

    #[test]
    fn resolve_in_walks_collections() {
        let mut kb = KnowledgeBase::new("world");
        let root = kb.root();
        kb.add_child(root, "rooms", "room1", "location");
        let path: AttrPath = "rooms.room1".parse().unwrap();
        assert!(path.resolve_in(&kb).is_some());
    }

    #[test]
    fn resolve_in_missing_segment_is_none() {
        let kb = KnowledgeBase::new("world");
        let path: AttrPath = "rooms.missing".parse().unwrap();
        assert!(path.resolve_in(&kb).is_none());
    }
}
