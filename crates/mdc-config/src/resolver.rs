//! Resolved configuration: memoized reverse lookups over a [`Configuration`].

use std::collections::HashMap;

use crate::config::{Configuration, VarMapping};
use crate::mapping::SemanticMapping;

/// A [`Configuration`] plus reverse-lookup maps built once at construction.
///
/// The lookups never change after construction (there is no live
/// configuration reload in this pipeline), so a plain `HashMap` built eagerly
/// is sufficient; there is no need for an invalidating cache.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    config: Configuration,
    /// world-model kind -> sort name (reverse of `type_mapping`).
    kind_to_sort: HashMap<String, String>,
    /// (task_id, gm_var) -> hddl_var
    gm_to_hddl: HashMap<(String, String), String>,
    /// (task_id, hddl_var) -> gm_var
    hddl_to_gm: HashMap<(String, String), String>,
}

impl ConfigResolver {
    /// Build a resolver, computing reverse lookups from `config`.
    #[must_use]
    pub fn new(config: Configuration) -> Self {
        let kind_to_sort = config
            .type_mapping
            .iter()
            .map(|(sort, kind)| (kind.clone(), sort.clone()))
            .collect();
        let mut gm_to_hddl = HashMap::new();
        let mut hddl_to_gm = HashMap::new();
        for VarMapping { task_id, hddl_var, gm_var } in &config.var_mapping {
            gm_to_hddl.insert((task_id.clone(), gm_var.clone()), hddl_var.clone());
            hddl_to_gm.insert((task_id.clone(), hddl_var.clone()), gm_var.clone());
        }
        Self {
            config,
            kind_to_sort,
            gm_to_hddl,
            hddl_to_gm,
        }
    }

    /// Sort name aliased to world-model kind `kind`, if declared.
    #[must_use]
    pub fn sort_for_kind(&self, kind: &str) -> Option<&str> {
        self.kind_to_sort.get(kind).map(String::as_str)
    }

    /// World-model kind aliased from sort `sort`, if declared.
    #[must_use]
    pub fn kind_for_sort(&self, sort: &str) -> Option<&str> {
        self.config.type_mapping.get(sort).map(String::as_str)
    }

    /// HDDL variable bound to goal-model variable `gm_var` for `task_id`.
    #[must_use]
    pub fn hddl_var(&self, task_id: &str, gm_var: &str) -> Option<&str> {
        self.gm_to_hddl
            .get(&(task_id.to_string(), gm_var.to_string()))
            .map(String::as_str)
    }

    /// Goal-model variable bound to HDDL variable `hddl_var` for `task_id`.
    #[must_use]
    pub fn gm_var(&self, task_id: &str, hddl_var: &str) -> Option<&str> {
        self.hddl_to_gm
            .get(&(task_id.to_string(), hddl_var.to_string()))
            .map(String::as_str)
    }

    /// Whether `kind` was declared as a location-type world-model kind.
    #[must_use]
    pub fn is_location_type(&self, kind: &str) -> bool {
        self.config.location_types.contains(kind)
    }

    /// Semantic mappings that relate to `sort` (as `relates_to`, `owner`,
    /// `owned`, `main_entity`, or `related_entity`).
    #[must_use]
    pub fn mappings_for_sort(&self, sort: &str) -> Vec<&SemanticMapping> {
        self.config
            .semantic_mappings
            .iter()
            .filter(|m| match m {
                SemanticMapping::Attribute { relates_to, .. } => relates_to == sort,
                SemanticMapping::Ownership { owner, owned, .. } => owner == sort || owned == sort,
                SemanticMapping::Relationship {
                    main_entity,
                    related_entity,
                    ..
                } => main_entity == sort || related_entity == sort,
            })
            .collect()
    }

    /// Access to the underlying raw configuration.
    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Configuration {
        let mut config = Configuration::new();
        config.type_mapping.insert("robotlocation".into(), "room".into());
        config.var_mapping.push(VarMapping {
            task_id: "clean".into(),
            hddl_var: "?r".into(),
            gm_var: "room".into(),
        });
        config
    }

    #[test]
    fn kind_and_sort_lookups_are_bidirectional() {
        let resolver = ConfigResolver::new(sample());
        assert_eq!(resolver.kind_for_sort("robotlocation"), Some("room"));
        assert_eq!(resolver.sort_for_kind("room"), Some("robotlocation"));
    }

    #[test]
    fn var_mapping_lookups_are_bidirectional_and_task_scoped() {
        let resolver = ConfigResolver::new(sample());
        assert_eq!(resolver.hddl_var("clean", "room"), Some("?r"));
        assert_eq!(resolver.gm_var("clean", "?r"), Some("room"));
        assert_eq!(resolver.hddl_var("other_task", "room"), None);
    }
}
