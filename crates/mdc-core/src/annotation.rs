//! Runtime-annotation builder: turns a goal model plus its task-instance
//! expansion into the operator tree [`mdc_graph::assemble`] consumes.

use mdc_graph::{AnnotationNode, ContextRequirement, DecompositionKind, Operator};
use mdc_registry::Literal;
use petgraph::graph::NodeIndex;

use crate::goal_model::{CreationCondition, GoalModel, GoalType};
use crate::instance::{TaskInstanceExpansion, VarBindingValue};
use crate::ids::AtInstanceId;
use crate::PipelineError;

/// The runtime-annotation tree handed to [`mdc_graph::assemble`].
pub type AnnotationTree = AnnotationNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tok<'a> {
    LParen,
    RParen,
    Op(Operator),
    Ident(&'a str),
}

fn tokenize(text: &str) -> Result<Vec<Tok<'_>>, PipelineError> {
    let mut out = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\n' => i += 1,
            '(' => {
                out.push(Tok::LParen);
                i += 1;
            }
            ')' => {
                out.push(Tok::RParen);
                i += 1;
            }
            ';' => {
                out.push(Tok::Op(Operator::Seq));
                i += 1;
            }
            '#' => {
                out.push(Tok::Op(Operator::Par));
                i += 1;
            }
            c if c.is_alphanumeric() || c == '_' || c == '?' => {
                let start = i;
                while i < bytes.len() {
                    let c = bytes[i] as char;
                    if c.is_alphanumeric() || c == '_' || c == '?' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let word = &text[start..i];
                out.push(match word {
                    "FALLBACK" => Tok::Op(Operator::Fallback),
                    "OR" => Tok::Op(Operator::Or),
                    _ => Tok::Ident(word),
                });
            }
            _ => {
                return Err(PipelineError::BadDomain(format!(
                    "unexpected character '{c}' in runtime annotation"
                )))
            }
        }
    }
    Ok(out)
}

enum OpExpr {
    Leaf(String),
    Op(Operator, Vec<OpExpr>),
}

fn parse_atom<'a>(tokens: &[Tok<'a>], pos: &mut usize) -> Result<OpExpr, PipelineError> {
    match tokens.get(*pos) {
        Some(Tok::LParen) => {
            *pos += 1;
            let expr = parse_expr(tokens, pos)?;
            match tokens.get(*pos) {
                Some(Tok::RParen) => {
                    *pos += 1;
                    Ok(expr)
                }
                _ => Err(PipelineError::BadDomain("unbalanced parentheses in runtime annotation".into())),
            }
        }
        Some(Tok::Ident(name)) => {
            *pos += 1;
            Ok(OpExpr::Leaf((*name).to_string()))
        }
        other => Err(PipelineError::BadDomain(format!(
            "expected a term in runtime annotation, found {other:?}"
        ))),
    }
}

fn parse_expr<'a>(tokens: &[Tok<'a>], pos: &mut usize) -> Result<OpExpr, PipelineError> {
    let first = parse_atom(tokens, pos)?;
    let op = match tokens.get(*pos) {
        Some(Tok::Op(op)) => *op,
        _ => return Ok(first),
    };
    let mut children = vec![first];
    loop {
        match tokens.get(*pos) {
            Some(Tok::Op(o)) if *o == op => {
                *pos += 1;
                children.push(parse_atom(tokens, pos)?);
            }
            Some(Tok::Op(_)) => {
                return Err(PipelineError::BadDomain(
                    "mixing different operators at the same nesting level requires parentheses".into(),
                ))
            }
            _ => break,
        }
    }
    Ok(OpExpr::Op(op, children))
}

/// Parse a runtime-annotation string into an operator expression tree over
/// leaf identifiers (raw goal-model child ids).
fn parse_annotation(text: &str) -> Result<OpExpr, PipelineError> {
    let tokens = tokenize(text)?;
    let mut pos = 0;
    let expr = parse_expr(&tokens, &mut pos)?;
    if pos != tokens.len() {
        return Err(PipelineError::BadDomain("trailing tokens in runtime annotation".into()));
    }
    Ok(expr)
}

/// Operator joining the replicas of a rewritten Achieve-with-forAll goal.
/// A bare `SEQ`/`FALLBACK`/`OR` token names the join explicitly; anything
/// else (including no annotation at all) falls back to PAR, matching the
/// goal-model convention that parallel replication is the default join.
fn forall_replica_op(annotation: &str) -> Operator {
    match annotation.trim() {
        "SEQ" | ";" => Operator::Seq,
        "FALLBACK" => Operator::Fallback,
        "OR" => Operator::Or,
        _ => Operator::Par,
    }
}

struct Builder<'a> {
    gm: &'a GoalModel,
    instances: &'a TaskInstanceExpansion,
}

impl<'a> Builder<'a> {
    fn task_leaf(&self, task_node_id: &str, replica: Option<usize>) -> Result<AnnotationNode, PipelineError> {
        let ids = self.instances.instances_by_task.get(task_node_id).ok_or_else(|| {
            PipelineError::UnboundVariable {
                var: task_node_id.to_string(),
                node: task_node_id.to_string(),
            }
        })?;
        let k = replica.unwrap_or(0).min(ids.len().saturating_sub(1));
        let instance_id: &AtInstanceId = ids.get(k).ok_or_else(|| {
            PipelineError::UnboundVariable {
                var: task_node_id.to_string(),
                node: task_node_id.to_string(),
            }
        })?;
        Ok(AnnotationNode::TaskLeaf { instance_id: instance_id.to_string() })
    }

    fn convert(&self, expr: &OpExpr, idx: NodeIndex, replica: Option<usize>) -> Result<AnnotationNode, PipelineError> {
        match expr {
            OpExpr::Leaf(child_id) => self.build_child_by_id(idx, child_id, replica),
            OpExpr::Op(op, kids) => {
                let children = kids
                    .iter()
                    .map(|k| self.convert(k, idx, replica))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(AnnotationNode::Operator { op: *op, children })
            }
        }
    }

    fn build_child_by_id(&self, parent: NodeIndex, child_id: &str, replica: Option<usize>) -> Result<AnnotationNode, PipelineError> {
        let child_idx = self
            .gm
            .children(parent)
            .into_iter()
            .map(|(idx, _)| idx)
            .find(|&idx| self.gm.graph()[idx].id == child_id)
            .ok_or_else(|| PipelineError::BadDomain(format!("unknown child '{child_id}' in runtime annotation")))?;
        self.build_node(child_idx, replica)
    }

    fn forall_count(&self, idx: NodeIndex) -> usize {
        let node = &self.gm.graph()[idx];
        if node.is_task {
            return self.instances.instances_by_task.get(&node.id).map_or(1, Vec::len);
        }
        self.gm
            .children(idx)
            .into_iter()
            .map(|(child, _)| self.forall_count(child))
            .max()
            .unwrap_or(1)
    }

    fn build_node(&self, idx: NodeIndex, replica: Option<usize>) -> Result<AnnotationNode, PipelineError> {
        let node = self.gm.graph()[idx].clone();

        if node.is_task {
            return self.task_leaf(&node.id, replica);
        }

        let is_forall_achieve = node.goal_type == GoalType::Achieve && node.controlled_vars.len() == 2;

        if is_forall_achieve && replica.is_none() {
            let n = self.forall_count(idx);
            let children = (0..n)
                .map(|k| self.build_goal_body(idx, &node, Some(k), false))
                .collect::<Result<Vec<_>, _>>()?;
            // The goal's own annotation names how replicas join (defaults to
            // PAR when absent); a forAll goal has no *children*-combining
            // annotation of its own, so per-replica bodies below are built
            // from its raw children directly (`use_annotation = false`).
            let op = forall_replica_op(&node.annotation);
            return Ok(AnnotationNode::Operator { op, children });
        }

        self.build_goal_body(idx, &node, replica, true)
    }

    /// The concrete value a forAll-achieve goal's iteration variable is bound
    /// to for replica `k`, read off any task instance in `idx`'s subtree
    /// (every task under the same replica shares the same per-replica
    /// binding, since [`TaskInstanceExpansion`] threads it through as each
    /// instance's `var_bindings`).
    fn forall_binding(&self, idx: NodeIndex, iteration_var: &str, k: usize) -> Option<String> {
        let node = &self.gm.graph()[idx];
        if node.is_task {
            let instance_id = self.instances.instances_by_task.get(&node.id)?.get(k)?;
            let instance = self.instances.instances.get(instance_id)?;
            return match instance.var_bindings.get(iteration_var) {
                Some(VarBindingValue::Scalar(v)) => Some(v.clone()),
                _ => None,
            };
        }
        self.gm
            .children(idx)
            .into_iter()
            .find_map(|(child, _)| self.forall_binding(child, iteration_var, k))
    }

    /// Ground `node`'s achieve-condition literals for this build, substituting
    /// a forAll-achieve goal's iteration variable with the concrete value
    /// bound for `replica`.
    fn grounded_achieve_condition(
        &self,
        idx: NodeIndex,
        node: &crate::goal_model::GmNode,
        replica: Option<usize>,
    ) -> Option<Vec<Literal>> {
        let literals = &node.achieve_condition.as_ref()?.literals;
        if let ([_, iteration_var], Some(k)) = (node.controlled_vars.as_slice(), replica) {
            if let Some(value) = self.forall_binding(idx, iteration_var, k) {
                let mut rename = std::collections::HashMap::new();
                rename.insert(iteration_var.clone(), value);
                return Some(literals.iter().map(|l| l.rename_args(&rename)).collect());
            }
        }
        Some(literals.clone())
    }

    fn build_goal_body(
        &self,
        idx: NodeIndex,
        node: &crate::goal_model::GmNode,
        replica: Option<usize>,
        use_annotation: bool,
    ) -> Result<AnnotationNode, PipelineError> {
        let raw_children = self.gm.children(idx);
        let decomposition = raw_children.first().map_or(DecompositionKind::And, |(_, edge)| edge.decomposition);

        let context = match &node.creation_condition {
            Some(CreationCondition::Condition(lits)) => Some(ContextRequirement { literals: lits.clone() }),
            _ => None,
        };

        let children = if !use_annotation || node.annotation.trim().is_empty() {
            raw_children
                .iter()
                .map(|(child, _)| self.build_node(*child, replica))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            let expr = parse_annotation(&node.annotation)?;
            if decomposition == DecompositionKind::Or && matches!(expr, OpExpr::Op(Operator::Seq, _)) {
                return Err(PipelineError::CycleInWrapper(node.id.clone()));
            }
            vec![self.convert(&expr, idx, replica)?]
        };

        Ok(AnnotationNode::Goal {
            id: node.id.clone(),
            decomposition,
            context,
            group: node.group,
            divisible: node.divisible,
            achieve_condition: self.grounded_achieve_condition(idx, node, replica),
            children,
        })
    }
}

/// Build the runtime-annotation tree rooted at `goal_model`'s root,
/// resolving task leaves against `instances`.
///
/// # Errors
/// [`PipelineError::CycleInWrapper`] if an OR-decomposed goal declares a
/// `SEQ` runtime annotation; [`PipelineError::BadDomain`] for malformed
/// annotation text or dangling child references.
pub fn build(goal_model: &GoalModel, instances: &TaskInstanceExpansion) -> Result<AnnotationTree, PipelineError> {
    tracing::debug!("building runtime-annotation tree");
    let root = goal_model.root().map_err(|e| PipelineError::BadDomain(e.to_string()))?;
    let builder = Builder { gm: goal_model, instances };
    let tree = builder.build_node(root, None)?;
    tracing::info!("runtime-annotation tree built");
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal_model::{GmEdge, GmNode};
    use crate::ids::AtInstanceId;
    use indexmap::IndexMap;
    use mdc_graph::DecompositionKind as GmDecompositionKind;

    fn instance(id: &str) -> (AtInstanceId, crate::instance::AtInstance) {
        let inst_id = AtInstanceId::new(id).unwrap();
        (
            inst_id.clone(),
            crate::instance::AtInstance {
                id: inst_id,
                name: id.to_string(),
                at: id.to_string(),
                robot_num: crate::instance::RobotNum::Fixed(1),
                location: None,
                var_bindings: Default::default(),
                params: vec![],
                triggering_events: vec![],
            },
        )
    }

    #[test]
    fn seq_annotation_wraps_children_in_one_operator() {
        let mut gm = GoalModel::new();
        let root = gm.add_node(GmNode::goal("root", GoalType::Achieve));
        let t1 = gm.add_node(GmNode::task("t1"));
        let t2 = gm.add_node(GmNode::task("t2"));
        gm.add_edge(root, t1, GmEdge { decomposition: GmDecompositionKind::And, means_end: false });
        gm.add_edge(root, t2, GmEdge { decomposition: GmDecompositionKind::And, means_end: false });
        gm.node_mut("root").unwrap().annotation = "t1;t2".to_string();

        let mut instances = crate::instance::TaskInstanceExpansion::default();
        let mut map = IndexMap::new();
        let (id1, inst1) = instance("t1");
        let (id2, inst2) = instance("t2");
        map.insert(id1.clone(), inst1);
        map.insert(id2.clone(), inst2);
        instances.instances = map;
        instances.instances_by_task.insert("t1".to_string(), vec![id1]);
        instances.instances_by_task.insert("t2".to_string(), vec![id2]);

        let tree = build(&gm, &instances).unwrap();
        match tree {
            AnnotationNode::Goal { children, .. } => {
                assert_eq!(children.len(), 1);
                match &children[0] {
                    AnnotationNode::Operator { op, children } => {
                        assert_eq!(*op, Operator::Seq);
                        assert_eq!(children.len(), 2);
                    }
                    other => panic!("expected operator, got {other:?}"),
                }
            }
            other => panic!("expected goal, got {other:?}"),
        }
    }

    #[test]
    fn or_goal_with_seq_annotation_is_an_error() {
        let mut gm = GoalModel::new();
        let root = gm.add_node(GmNode::goal("root", GoalType::Achieve));
        let t1 = gm.add_node(GmNode::task("t1"));
        let t2 = gm.add_node(GmNode::task("t2"));
        gm.add_edge(root, t1, GmEdge { decomposition: GmDecompositionKind::Or, means_end: false });
        gm.add_edge(root, t2, GmEdge { decomposition: GmDecompositionKind::Or, means_end: false });
        gm.node_mut("root").unwrap().annotation = "t1;t2".to_string();

        let mut instances = crate::instance::TaskInstanceExpansion::default();
        let (id1, inst1) = instance("t1");
        let (id2, inst2) = instance("t2");
        instances.instances.insert(id1.clone(), inst1);
        instances.instances.insert(id2.clone(), inst2);
        instances.instances_by_task.insert("t1".to_string(), vec![id1]);
        instances.instances_by_task.insert("t2".to_string(), vec![id2]);

        let err = build(&gm, &instances).unwrap_err();
        assert!(matches!(err, PipelineError::CycleInWrapper(_)));
    }

    #[test]
    fn forall_achieve_with_seq_annotation_joins_replicas_sequentially() {
        let mut gm = GoalModel::new();
        let mut root_node = GmNode::goal("root", GoalType::Achieve);
        root_node.annotation = "SEQ".to_string();
        root_node.controlled_vars = vec!["rooms".to_string(), "?r".to_string()];
        let root = gm.add_node(root_node);
        let task = gm.add_node(GmNode::task("clean"));
        gm.add_edge(root, task, GmEdge { decomposition: GmDecompositionKind::And, means_end: false });

        let mut instances = crate::instance::TaskInstanceExpansion::default();
        let (id1, inst1) = instance("clean#0");
        let (id2, inst2) = instance("clean#1");
        instances.instances.insert(id1.clone(), inst1);
        instances.instances.insert(id2.clone(), inst2);
        instances.instances_by_task.insert("clean".to_string(), vec![id1, id2]);

        let tree = build(&gm, &instances).unwrap();
        match tree {
            AnnotationNode::Operator { op, children } => {
                assert_eq!(op, Operator::Seq);
                assert_eq!(children.len(), 2);
            }
            other => panic!("expected operator, got {other:?}"),
        }
    }
}
