//! Sort hierarchy (the type system of the domain).
//!
//! Sorts form a single-rooted tree under `object`. A sort may be declared a
//! subsort of exactly one parent; membership and subsort checks both walk the
//! parent chain rather than maintaining a transitive-closure table, since
//! hierarchies in practice are shallow.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Name of a sort. Interning is not worth it at this scale; sorts are
/// looked up a handful of times per compile, not per world-state check.
pub type SortName = String;

/// A single node in the sort tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortNode {
    /// Name of this sort.
    pub name: SortName,
    /// Direct parent, `None` only for the root (`object`).
    pub parent: Option<SortName>,
}

/// Registry of declared sorts plus the objects that inhabit each one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortRegistry {
    nodes: HashMap<SortName, SortNode>,
    /// Objects known to inhabit each sort (direct membership only; a query
    /// for "all robots" must also walk subsorts via [`SortRegistry::objects_of`]).
    members: HashMap<SortName, HashSet<String>>,
}

impl SortRegistry {
    /// Empty registry containing only the `object` root.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        let mut reg = Self::default();
        reg.nodes.insert(
            "object".to_string(),
            SortNode {
                name: "object".to_string(),
                parent: None,
            },
        );
        reg
    }

    /// Registry preloaded with the builtin sorts every mission domain needs:
    /// `object`, `capability`, `robot`, `robotlocation`, `location`, `robotteam`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        for (name, parent) in [
            ("capability", "object"),
            ("robot", "object"),
            ("location", "object"),
            ("robotlocation", "location"),
            ("robotteam", "object"),
        ] {
            reg.nodes.insert(
                name.to_string(),
                SortNode {
                    name: name.to_string(),
                    parent: Some(parent.to_string()),
                },
            );
        }
        reg
    }

    /// Declare a new sort as a subsort of `parent`.
    ///
    /// # Errors
    /// Returns [`RegistryError::UnknownSort`] if `parent` has not been
    /// declared, and [`RegistryError::DuplicateSort`] if `name` already exists.
    pub fn declare_sort(
        &mut self,
        name: impl Into<SortName>,
        parent: impl Into<SortName>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let parent = parent.into();
        if self.nodes.contains_key(&name) {
            return Err(RegistryError::DuplicateSort(name));
        }
        if !self.nodes.contains_key(&parent) {
            return Err(RegistryError::UnknownSort(parent));
        }
        self.nodes.insert(
            name.clone(),
            SortNode {
                name,
                parent: Some(parent),
            },
        );
        Ok(())
    }

    /// Register `object_name` as a direct member of `sort`.
    ///
    /// # Errors
    /// Returns [`RegistryError::UnknownSort`] if `sort` is not declared.
    pub fn add_object(
        &mut self,
        sort: &str,
        object_name: impl Into<String>,
    ) -> Result<(), RegistryError> {
        if !self.nodes.contains_key(sort) {
            return Err(RegistryError::UnknownSort(sort.to_string()));
        }
        self.members
            .entry(sort.to_string())
            .or_default()
            .insert(object_name.into());
        Ok(())
    }

    /// Whether `sort` has been declared.
    #[inline]
    #[must_use]
    pub fn contains(&self, sort: &str) -> bool {
        self.nodes.contains_key(sort)
    }

    /// Whether `child` is `parent` or a (possibly indirect) subsort of it.
    #[must_use]
    pub fn is_subsort_of(&self, child: &str, parent: &str) -> bool {
        if child == parent {
            return true;
        }
        let mut cur = child;
        while let Some(node) = self.nodes.get(cur) {
            match &node.parent {
                Some(p) if p == parent => return true,
                Some(p) => cur = p,
                None => return false,
            }
        }
        false
    }

    /// Whether `object_name` is a direct or indirect member of `sort`
    /// (declared in `sort` itself or any of its subsorts).
    #[must_use]
    pub fn is_in_sort(&self, object_name: &str, sort: &str) -> bool {
        self.members.iter().any(|(member_sort, objs)| {
            objs.contains(object_name) && self.is_subsort_of(member_sort, sort)
        })
    }

    /// All objects that are direct or indirect members of `sort`.
    #[must_use]
    pub fn objects_of(&self, sort: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .members
            .iter()
            .filter(|(member_sort, _)| self.is_subsort_of(member_sort, sort))
            .flat_map(|(_, objs)| objs.iter().cloned())
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_wired() {
        let reg = SortRegistry::with_builtins();
        assert!(reg.is_subsort_of("robotlocation", "location"));
        assert!(reg.is_subsort_of("robot", "object"));
        assert!(!reg.is_subsort_of("robot", "location"));
    }

    #[test]
    fn declare_unknown_parent_fails() {
        let mut reg = SortRegistry::new();
        let err = reg.declare_sort("drone", "vehicle").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownSort(_)));
    }

    #[test]
    fn object_membership_follows_subsorts() {
        let mut reg = SortRegistry::with_builtins();
        reg.declare_sort("drone", "robot").unwrap();
        reg.add_object("drone", "uav1").unwrap();
        assert!(reg.is_in_sort("uav1", "robot"));
        assert!(reg.is_in_sort("uav1", "object"));
        assert!(!reg.is_in_sort("uav1", "location"));
    }

    #[test]
    fn objects_of_dedups_and_sorts() {
        let mut reg = SortRegistry::with_builtins();
        reg.add_object("robot", "r2").unwrap();
        reg.add_object("robot", "r1").unwrap();
        assert_eq!(reg.objects_of("robot"), vec!["r1".to_string(), "r2".to_string()]);
    }
}
