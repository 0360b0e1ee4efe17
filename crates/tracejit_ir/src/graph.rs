//! Computation graph.

use crate::error::IrError;
use crate::node::{Node, NodeId, Operation};
use crate::shape::Shape;
use crate::types::{DType, ScalarValue};
use crate::Result;
use std::collections::HashMap;

/// A dataflow graph of operations.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Nodes indexed by id.
    nodes: HashMap<NodeId, Node>,
    /// Next available node id.
    next_id: NodeId,
    /// Placeholder nodes, in dynamic-argument order.
    inputs: Vec<NodeId>,
    /// Result nodes, in return order.
    outputs: Vec<NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. All operand ids must already exist.
    pub fn add_node(
        &mut self,
        op: Operation,
        inputs: Vec<NodeId>,
        dtype: DType,
        shape: Shape,
    ) -> Result<NodeId> {
        for &input_id in &inputs {
            if !self.nodes.contains_key(&input_id) {
                return Err(IrError::UnknownNode(input_id));
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                id,
                op,
                inputs,
                dtype,
                shape,
            },
        );
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> &HashMap<NodeId, Node> {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Mark a placeholder node as a graph input.
    pub fn add_input(&mut self, id: NodeId) -> Result<()> {
        if !self.nodes.contains_key(&id) {
            return Err(IrError::UnknownNode(id));
        }
        if !self.inputs.contains(&id) {
            self.inputs.push(id);
        }
        Ok(())
    }

    /// Mark a node as a graph output.
    pub fn add_output(&mut self, id: NodeId) -> Result<()> {
        if !self.nodes.contains_key(&id) {
            return Err(IrError::UnknownNode(id));
        }
        self.outputs.push(id);
        Ok(())
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    /// Replace a node's operation with a scalar constant, dropping its
    /// operand edges. Used by constant folding.
    pub fn fold_to_constant(&mut self, id: NodeId, value: ScalarValue) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(IrError::UnknownNode(id))?;
        node.op = Operation::Constant { value };
        node.inputs.clear();
        Ok(())
    }

    /// Remove a node. Fails if any remaining node still references it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        if !self.nodes.contains_key(&id) {
            return Err(IrError::UnknownNode(id));
        }
        for node in self.nodes.values() {
            if node.id != id && node.inputs.contains(&id) {
                return Err(IrError::StillReferenced { node: id, by: node.id });
            }
        }
        self.nodes.remove(&id);
        self.inputs.retain(|&n| n != id);
        self.outputs.retain(|&n| n != id);
        Ok(())
    }

    /// Node ids reachable from the outputs.
    pub fn live_nodes(&self) -> Vec<NodeId> {
        let mut live = Vec::new();
        let mut seen = HashMap::new();
        let mut stack: Vec<NodeId> = self.outputs.clone();

        while let Some(id) = stack.pop() {
            if seen.insert(id, ()).is_some() {
                continue;
            }
            live.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.inputs.iter().copied());
            }
        }

        live.sort_unstable();
        live
    }

    /// Topologically sorted node ids, dependencies first.
    pub fn topological_order(&self) -> Result<Vec<NodeId>> {
        let mut visited = HashMap::new();
        let mut order = Vec::new();

        // Visit in id order for deterministic results.
        let mut node_ids: Vec<_> = self.nodes.keys().copied().collect();
        node_ids.sort_unstable();

        for &node_id in &node_ids {
            self.dfs_topo(node_id, &mut visited, &mut order)?;
        }
        Ok(order)
    }

    fn dfs_topo(
        &self,
        node_id: NodeId,
        visited: &mut HashMap<NodeId, bool>,
        order: &mut Vec<NodeId>,
    ) -> Result<()> {
        if let Some(&in_progress) = visited.get(&node_id) {
            if in_progress {
                return Err(IrError::Cycle(node_id));
            }
            return Ok(());
        }

        visited.insert(node_id, true);
        if let Some(node) = self.nodes.get(&node_id) {
            for &input_id in &node.inputs {
                self.dfs_topo(input_id, visited, order)?;
            }
        }
        visited.insert(node_id, false);
        order.push(node_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::BinaryOp;

    fn placeholder(graph: &mut Graph, index: usize) -> NodeId {
        let id = graph
            .add_node(
                Operation::Placeholder {
                    index,
                    name: format!("arg{index}"),
                },
                vec![],
                DType::F64,
                Shape::Matrix(2, 2),
            )
            .unwrap();
        graph.add_input(id).unwrap();
        id
    }

    #[test]
    fn test_empty_graph() {
        let graph = Graph::new();
        assert!(graph.is_empty());
        assert!(graph.topological_order().unwrap().is_empty());
    }

    #[test]
    fn test_add_node_validates_operands() {
        let mut graph = Graph::new();
        let err = graph
            .add_node(
                Operation::Binary { op: BinaryOp::Add },
                vec![7],
                DType::F64,
                Shape::Scalar,
            )
            .unwrap_err();
        assert_eq!(err, IrError::UnknownNode(7));
    }

    #[test]
    fn test_topological_order() {
        let mut graph = Graph::new();
        let a = placeholder(&mut graph, 0);
        let b = placeholder(&mut graph, 1);
        let c = graph
            .add_node(
                Operation::Binary { op: BinaryOp::Add },
                vec![a, b],
                DType::F64,
                Shape::Matrix(2, 2),
            )
            .unwrap();

        let order = graph.topological_order().unwrap();
        assert_eq!(order.len(), 3);
        assert!(order.iter().position(|&n| n == a).unwrap() < order.iter().position(|&n| n == c).unwrap());
        assert!(order.iter().position(|&n| n == b).unwrap() < order.iter().position(|&n| n == c).unwrap());
    }

    #[test]
    fn test_live_nodes_excludes_unreachable() {
        let mut graph = Graph::new();
        let a = placeholder(&mut graph, 0);
        let dead = graph
            .add_node(
                Operation::Unary {
                    op: crate::node::UnaryOp::Neg,
                },
                vec![a],
                DType::F64,
                Shape::Matrix(2, 2),
            )
            .unwrap();
        graph.add_output(a).unwrap();

        let live = graph.live_nodes();
        assert!(live.contains(&a));
        assert!(!live.contains(&dead));
    }

    #[test]
    fn test_remove_referenced_node_fails() {
        let mut graph = Graph::new();
        let a = placeholder(&mut graph, 0);
        let b = graph
            .add_node(
                Operation::Unary {
                    op: crate::node::UnaryOp::Neg,
                },
                vec![a],
                DType::F64,
                Shape::Matrix(2, 2),
            )
            .unwrap();

        assert!(graph.remove_node(a).is_err());
        graph.remove_node(b).unwrap();
        graph.remove_node(a).unwrap();
        assert!(graph.is_empty());
    }
}
