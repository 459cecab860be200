//! Up-front configuration and variable-mapping validation.
//!
//! Run once before task-instance expansion so type and mapping errors are
//! reported at the earliest possible point rather than discovered mid-walk.

use mdc_registry::FrozenRegistry;

use crate::error::ConfigError;
use crate::mapping::SemanticMapping;
use crate::resolver::ConfigResolver;

/// Check that every `var_mapping` entry names a task that exists in the
/// registry.
///
/// # Errors
/// Returns [`ConfigError::UnknownTaskInVarMapping`] on the first offending
/// entry.
pub fn check_var_mappings(
    resolver: &ConfigResolver,
    registry: &FrozenRegistry,
) -> Result<(), ConfigError> {
    for mapping in &resolver.config().var_mapping {
        if registry.task(&mapping.task_id).is_none() {
            return Err(ConfigError::UnknownTaskInVarMapping(mapping.task_id.clone()));
        }
    }
    Ok(())
}

/// Check that every semantic mapping references sorts that exist in the
/// registry, and that every sort named by a `var_mapping`'s task parameters
/// is covered by `type_mapping`.
///
/// # Errors
/// Returns [`ConfigError::UnknownSortInMapping`] if a semantic mapping names
/// an undeclared sort.
pub fn check_configuration(
    resolver: &ConfigResolver,
    registry: &FrozenRegistry,
) -> Result<(), ConfigError> {
    for mapping in &resolver.config().semantic_mappings {
        let sorts_to_check: Vec<&str> = match mapping {
            SemanticMapping::Attribute { relates_to, .. } => vec![relates_to.as_str()],
            SemanticMapping::Ownership { owner, owned, .. } => {
                vec![owner.as_str(), owned.as_str()]
            }
            SemanticMapping::Relationship {
                main_entity,
                related_entity,
                ..
            } => vec![main_entity.as_str(), related_entity.as_str()],
        };
        for sort in sorts_to_check {
            if !registry.sorts().contains(sort) {
                return Err(ConfigError::UnknownSortInMapping(sort.to_string()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Configuration, VarMapping};
    use crate::mapping::{MappedType, SemanticMapping};
    use mdc_registry::{Parameter, Registry, Task};

    fn registry_with_clean_task() -> FrozenRegistry {
        let mut reg = Registry::new();
        reg.declare_task(Task::abstract_task("clean", vec![Parameter::new("?r", "robotlocation")]))
            .unwrap();
        reg.freeze()
    }

    #[test]
    fn unknown_task_in_var_mapping_is_caught() {
        let mut config = Configuration::new();
        config.var_mapping.push(VarMapping {
            task_id: "missing_task".into(),
            hddl_var: "?r".into(),
            gm_var: "room".into(),
        });
        let resolver = ConfigResolver::new(config);
        let registry = registry_with_clean_task();
        let err = check_var_mappings(&resolver, &registry).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTaskInVarMapping(_)));
    }

    #[test]
    fn known_task_passes() {
        let mut config = Configuration::new();
        config.var_mapping.push(VarMapping {
            task_id: "clean".into(),
            hddl_var: "?r".into(),
            gm_var: "room".into(),
        });
        let resolver = ConfigResolver::new(config);
        let registry = registry_with_clean_task();
        assert!(check_var_mappings(&resolver, &registry).is_ok());
    }

    #[test]
    fn unknown_sort_in_semantic_mapping_is_caught() {
        let mut config = Configuration::new();
        config.semantic_mappings.push(SemanticMapping::Attribute {
            relates_to: "nonexistent_sort".into(),
            name: "battery".into(),
            predicate_type: None,
            mapped_type: MappedType::Function("battery_level".into()),
        });
        let resolver = ConfigResolver::new(config);
        let registry = registry_with_clean_task();
        let err = check_configuration(&resolver, &registry).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSortInMapping(_)));
    }
}
