//! The frozen domain registry consumed by every downstream compiler stage.

use indexmap::IndexMap;

use crate::error::RegistryError;
use crate::schema::{FunctionDef, PredicateDef};
use crate::sort::SortRegistry;
use crate::task::{Method, Task};

/// A mutable registry under construction.
///
/// Callers (an external domain-file parser) populate a `Registry`, then call
/// [`Registry::freeze`] once all declarations are known. Every compiler stage
/// after that point only ever sees a [`FrozenRegistry`], so accidental
/// mid-compile mutation is a compile error rather than a runtime bug.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    sorts: SortRegistry,
    predicates: IndexMap<String, PredicateDef>,
    functions: IndexMap<String, FunctionDef>,
    tasks: IndexMap<String, Task>,
    /// Methods keyed by the abstract task name they decompose, preserving
    /// declaration order (OR-branch enumeration order must be deterministic).
    methods: IndexMap<String, Vec<Method>>,
}

impl Registry {
    /// New registry with the builtin sorts preloaded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sorts: SortRegistry::with_builtins(),
            ..Default::default()
        }
    }

    /// Mutable access to the sort hierarchy.
    #[inline]
    pub fn sorts_mut(&mut self) -> &mut SortRegistry {
        &mut self.sorts
    }

    /// Register a predicate signature.
    pub fn declare_predicate(&mut self, def: PredicateDef) {
        self.predicates.insert(def.name.clone(), def);
    }

    /// Register a function signature.
    pub fn declare_function(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.clone(), def);
    }

    /// Register a task definition.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateTask`] if already declared.
    pub fn declare_task(&mut self, task: Task) -> Result<(), RegistryError> {
        if self.tasks.contains_key(&task.name) {
            return Err(RegistryError::DuplicateTask(task.name));
        }
        self.tasks.insert(task.name.clone(), task);
        Ok(())
    }

    /// Register a decomposition method.
    ///
    /// # Errors
    /// Returns [`RegistryError::MethodTaskMismatch`] if the decomposed task
    /// is unknown or not abstract.
    pub fn declare_method(&mut self, method: Method) -> Result<(), RegistryError> {
        match self.tasks.get(&method.task_name) {
            Some(t) if t.is_abstract => {}
            Some(_) => return Err(RegistryError::AbstractnessMismatch(method.task_name)),
            None => {
                return Err(RegistryError::MethodTaskMismatch {
                    method: method.name,
                    task: method.task_name,
                })
            }
        }
        self.methods.entry(method.task_name.clone()).or_default().push(method);
        Ok(())
    }

    /// Seal this registry for use by the rest of the pipeline.
    #[must_use]
    pub fn freeze(self) -> FrozenRegistry {
        FrozenRegistry {
            sorts: self.sorts,
            predicates: self.predicates,
            functions: self.functions,
            tasks: self.tasks,
            methods: self.methods,
        }
    }
}

/// An immutable, validated view of a [`Registry`].
#[derive(Debug, Clone)]
pub struct FrozenRegistry {
    sorts: SortRegistry,
    predicates: IndexMap<String, PredicateDef>,
    functions: IndexMap<String, FunctionDef>,
    tasks: IndexMap<String, Task>,
    methods: IndexMap<String, Vec<Method>>,
}

impl FrozenRegistry {
    /// The sort hierarchy.
    #[inline]
    #[must_use]
    pub fn sorts(&self) -> &SortRegistry {
        &self.sorts
    }

    /// Look up a task definition by name.
    #[inline]
    #[must_use]
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// All declared tasks, in declaration order.
    #[inline]
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Methods that decompose the abstract task `task_name`, in declaration
    /// order (this order is the OR-branch enumeration order).
    #[inline]
    #[must_use]
    pub fn methods_for(&self, task_name: &str) -> &[Method] {
        self.methods.get(task_name).map_or(&[], Vec::as_slice)
    }

    /// Look up a predicate signature.
    #[inline]
    #[must_use]
    pub fn predicate(&self, name: &str) -> Option<&PredicateDef> {
        self.predicates.get(name)
    }

    /// Look up a function signature.
    #[inline]
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Parameter;

    #[test]
    fn freeze_preserves_declaration_order_of_methods() {
        let mut reg = Registry::new();
        reg.declare_task(Task::abstract_task("clean", vec![Parameter::new("?r", "robotlocation")]))
            .unwrap();
        reg.declare_method(Method {
            name: "m1".into(),
            task_name: "clean".into(),
            params: Vec::new(),
            subtasks: Vec::new(),
            ordering: Vec::new(),
            precondition_task: None,
        })
        .unwrap();
        reg.declare_method(Method {
            name: "m2".into(),
            task_name: "clean".into(),
            params: Vec::new(),
            subtasks: Vec::new(),
            ordering: Vec::new(),
            precondition_task: None,
        })
        .unwrap();
        let frozen = reg.freeze();
        let names: Vec<_> = frozen.methods_for("clean").iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["m1", "m2"]);
    }

    #[test]
    fn declare_method_for_unknown_task_fails() {
        let mut reg = Registry::new();
        let err = reg
            .declare_method(Method {
                name: "m1".into(),
                task_name: "missing".into(),
                params: Vec::new(),
                subtasks: Vec::new(),
                ordering: Vec::new(),
                precondition_task: None,
            })
            .unwrap_err();
        assert!(matches!(err, RegistryError::MethodTaskMismatch { .. }));
    }

    #[test]
    fn declare_method_for_primitive_task_fails() {
        let mut reg = Registry::new();
        reg.declare_task(Task::primitive("go", vec![], vec![], vec![])).unwrap();
        let err = reg
            .declare_method(Method {
                name: "m1".into(),
                task_name: "go".into(),
                params: Vec::new(),
                subtasks: Vec::new(),
                ordering: Vec::new(),
                precondition_task: None,
            })
            .unwrap_err();
        assert!(matches!(err, RegistryError::AbstractnessMismatch(_)));
    }
}
