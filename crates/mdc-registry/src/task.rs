//! Task and method definitions (the HDDL domain).

use serde::{Deserialize, Serialize};

use crate::literal::Literal;
use crate::sort::SortName;

/// A formal parameter of a task or method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name, e.g. `?r`.
    pub name: String,
    /// Declared sort.
    pub sort: SortName,
}

impl Parameter {
    /// Construct a new parameter.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, sort: impl Into<SortName>) -> Self {
        Self {
            name: name.into(),
            sort: sort.into(),
        }
    }
}

/// A task definition: abstract (decomposed by methods) or primitive (has a
/// precondition/effect body directly).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Task name.
    pub name: String,
    /// Formal parameters.
    pub params: Vec<Parameter>,
    /// `true` if this task has no body and is decomposed by [`Method`]s.
    pub is_abstract: bool,
    /// Precondition literals, empty for abstract tasks.
    pub preconditions: Vec<Literal>,
    /// Effect literals, empty for abstract tasks.
    pub effects: Vec<Literal>,
}

impl Task {
    /// Construct a new abstract task (no body).
    #[inline]
    #[must_use]
    pub fn abstract_task(name: impl Into<String>, params: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            params,
            is_abstract: true,
            preconditions: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// Construct a new primitive task.
    #[inline]
    #[must_use]
    pub fn primitive(
        name: impl Into<String>,
        params: Vec<Parameter>,
        preconditions: Vec<Literal>,
        effects: Vec<Literal>,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            is_abstract: false,
            preconditions,
            effects,
        }
    }
}

/// A subtask reference inside a method body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    /// Local id, unique within the owning method's subtask list. Used to
    /// express [`Method::ordering`] edges.
    pub id: u32,
    /// Name of the task this subtask instantiates.
    pub task_name: String,
    /// Arguments bound from the method's own parameters, in the order the
    /// referenced task declares its own parameters.
    pub args: Vec<String>,
}

/// A decomposition method for an abstract task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    /// Method name, unique among methods decomposing the same task.
    pub name: String,
    /// Name of the abstract task this method decomposes.
    pub task_name: String,
    /// Method parameters (a superset of the decomposed task's parameters).
    pub params: Vec<Parameter>,
    /// Subtasks this method expands to.
    pub subtasks: Vec<Subtask>,
    /// Partial ordering over `subtasks` by id: `(a, b)` means `a` must
    /// precede `b`. Absence of an edge between two ids means they may run
    /// in either order (or in parallel, at path-enumeration time).
    pub ordering: Vec<(u32, u32)>,
    /// Synthetic leading task capturing this method's own precondition, if
    /// any was declared. Always primitive, with no effects.
    pub precondition_task: Option<Task>,
}

impl Method {
    /// All topological orderings of [`Method::subtasks`] consistent with
    /// [`Method::ordering`]. Used by TDG path enumeration, which must
    /// consider every admissible subtask sequence rather than just one.
    #[must_use]
    pub fn all_topological_orders(&self) -> Vec<Vec<u32>> {
        let ids: Vec<u32> = self.subtasks.iter().map(|s| s.id).collect();
        let mut successors: std::collections::HashMap<u32, Vec<u32>> =
            std::collections::HashMap::new();
        let mut indegree: std::collections::HashMap<u32, u32> =
            ids.iter().map(|id| (*id, 0)).collect();
        for (a, b) in &self.ordering {
            successors.entry(*a).or_default().push(*b);
            *indegree.entry(*b).or_insert(0) += 1;
        }

        let mut results = Vec::new();
        let mut current = Vec::new();
        let mut remaining = indegree;
        let mut used: std::collections::HashSet<u32> = std::collections::HashSet::new();
        backtrack(&ids, &successors, &mut remaining, &mut used, &mut current, &mut results);
        results
    }
}

fn backtrack(
    all_ids: &[u32],
    successors: &std::collections::HashMap<u32, Vec<u32>>,
    indegree: &mut std::collections::HashMap<u32, u32>,
    used: &mut std::collections::HashSet<u32>,
    current: &mut Vec<u32>,
    results: &mut Vec<Vec<u32>>,
) {
    if current.len() == all_ids.len() {
        results.push(current.clone());
        return;
    }
    let ready: Vec<u32> = all_ids
        .iter()
        .copied()
        .filter(|id| !used.contains(id) && indegree.get(id).copied().unwrap_or(0) == 0)
        .collect();
    for id in ready {
        used.insert(id);
        current.push(id);
        let succs = successors.get(&id).cloned().unwrap_or_default();
        for s in &succs {
            *indegree.get_mut(s).unwrap() -= 1;
        }
        backtrack(all_ids, successors, indegree, used, current, results);
        for s in &succs {
            *indegree.get_mut(s).unwrap() += 1;
        }
        current.pop();
        used.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subtask(id: u32, name: &str) -> Subtask {
        Subtask {
            id,
            task_name: name.to_string(),
            args: Vec::new(),
        }
    }

    #[test]
    fn unordered_subtasks_yield_all_permutations() {
        let m = Method {
            name: "m".into(),
            task_name: "t".into(),
            params: Vec::new(),
            subtasks: vec![subtask(1, "a"), subtask(2, "b")],
            ordering: Vec::new(),
            precondition_task: None,
        };
        let orders = m.all_topological_orders();
        assert_eq!(orders.len(), 2);
    }

    #[test]
    fn fully_ordered_subtasks_yield_one_order() {
        let m = Method {
            name: "m".into(),
            task_name: "t".into(),
            params: Vec::new(),
            subtasks: vec![subtask(1, "a"), subtask(2, "b"), subtask(3, "c")],
            ordering: vec![(1, 2), (2, 3)],
            precondition_task: None,
        };
        let orders = m.all_topological_orders();
        assert_eq!(orders, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn partial_order_respects_constraint() {
        let m = Method {
            name: "m".into(),
            task_name: "t".into(),
            params: Vec::new(),
            subtasks: vec![subtask(1, "a"), subtask(2, "b"), subtask(3, "c")],
            ordering: vec![(1, 3)],
            precondition_task: None,
        };
        let orders = m.all_topological_orders();
        assert_eq!(orders.len(), 3);
        for order in &orders {
            let pos1 = order.iter().position(|x| *x == 1).unwrap();
            let pos3 = order.iter().position(|x| *x == 3).unwrap();
            assert!(pos1 < pos3);
        }
    }
}
