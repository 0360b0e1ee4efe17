//! Graph optimization passes.

use crate::kernels;
use crate::Result;
use tracejit_ir::{Graph, Operation, ScalarValue, Shape};
use tracing::{debug, trace};

/// A rewrite over a graph.
pub trait OptimizationPass {
    /// Run the pass. Returns true if the graph was modified.
    fn run(&mut self, graph: &mut Graph) -> Result<bool>;

    fn name(&self) -> &'static str;
}

/// Runs a sequence of passes in order.
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn OptimizationPass>>,
}

impl PassManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pass(&mut self, pass: Box<dyn OptimizationPass>) {
        self.passes.push(pass);
    }

    pub fn run_all(&mut self, graph: &mut Graph) -> Result<()> {
        for pass in &mut self.passes {
            let changed = pass.run(graph)?;
            if changed {
                debug!(pass = pass.name(), "pass modified the graph");
            } else {
                trace!(pass = pass.name(), "pass made no changes");
            }
        }
        Ok(())
    }
}

/// The standard pipeline: fold constants, then drop dead nodes.
pub fn default_passes() -> PassManager {
    let mut pm = PassManager::new();
    pm.add_pass(Box::new(ConstantFolding));
    pm.add_pass(Box::new(DeadNodeElimination));
    pm
}

/// Evaluates scalar unary/binary operations whose operands are constants.
pub struct ConstantFolding;

impl OptimizationPass for ConstantFolding {
    fn run(&mut self, graph: &mut Graph) -> Result<bool> {
        let mut changed = false;

        // Topological order folds chains in one sweep.
        for node_id in graph.topological_order()? {
            let Some(node) = graph.node(node_id) else { continue };
            if node.shape != Shape::Scalar {
                continue;
            }

            let folded = match &node.op {
                Operation::Binary { op } => {
                    let op = *op;
                    match (
                        self.constant_operand(graph, node_id, 0),
                        self.constant_operand(graph, node_id, 1),
                    ) {
                        (Some(a), Some(b)) => Some(kernels::binary(op, a, b)),
                        _ => None,
                    }
                }
                Operation::Unary { op } => {
                    let op = *op;
                    self.constant_operand(graph, node_id, 0)
                        .map(|a| kernels::unary(op, a))
                }
                _ => None,
            };

            if let Some(value) = folded {
                let dtype = graph
                    .node(node_id)
                    .map(|n| n.dtype)
                    .unwrap_or(tracejit_ir::DType::F64);
                graph.fold_to_constant(node_id, ScalarValue::from_f64(dtype, value))?;
                changed = true;
            }
        }
        Ok(changed)
    }

    fn name(&self) -> &'static str {
        "constant-folding"
    }
}

impl ConstantFolding {
    fn constant_operand(&self, graph: &Graph, node_id: usize, operand: usize) -> Option<f64> {
        let node = graph.node(node_id)?;
        let input = graph.node(*node.inputs.get(operand)?)?;
        match input.op {
            Operation::Constant { value } => Some(value.as_f64()),
            _ => None,
        }
    }
}

/// Removes nodes unreachable from the graph outputs.
pub struct DeadNodeElimination;

impl OptimizationPass for DeadNodeElimination {
    fn run(&mut self, graph: &mut Graph) -> Result<bool> {
        let live = graph.live_nodes();
        // Placeholders stay: the call signature still carries the argument
        // even when the staging function ignores it.
        let dead: Vec<_> = graph
            .nodes()
            .values()
            .filter(|n| {
                !live.contains(&n.id) && !matches!(n.op, Operation::Placeholder { .. })
            })
            .map(|n| n.id)
            .collect();

        // Remove in reverse topological order so no dead node is still
        // referenced when its turn comes.
        let mut order = graph.topological_order()?;
        order.reverse();
        let mut changed = false;
        for id in order {
            if dead.contains(&id) {
                graph.remove_node(id)?;
                changed = true;
            }
        }
        Ok(changed)
    }

    fn name(&self) -> &'static str {
        "dead-node-elimination"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracejit_ir::{BinaryOp, DType, GraphBuilder, UnaryOp};

    fn folded_graph() -> Graph {
        let mut builder = GraphBuilder::new();
        let a = builder
            .placeholder(0, "a", DType::F64, Shape::Vector(3))
            .unwrap();
        let two = builder.constant(ScalarValue::F64(2.0)).unwrap();
        let three = builder.constant(ScalarValue::F64(3.0)).unwrap();
        // (2 * 3) is foldable; the add against `a` is not.
        let six = builder.binary(BinaryOp::Mul, two, three).unwrap();
        let out = builder.binary(BinaryOp::Add, a, six).unwrap();
        builder.output(out).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_constant_folding() {
        let mut graph = folded_graph();
        let changed = ConstantFolding.run(&mut graph).unwrap();
        assert!(changed);

        let folded = graph
            .nodes()
            .values()
            .filter(|n| matches!(n.op, Operation::Constant { value: ScalarValue::F64(v) } if v == 6.0))
            .count();
        assert_eq!(folded, 1);
    }

    #[test]
    fn test_folding_chains_in_one_sweep() {
        let mut builder = GraphBuilder::new();
        let two = builder.constant(ScalarValue::F64(2.0)).unwrap();
        let neg = builder.unary(UnaryOp::Neg, two).unwrap();
        let out = builder.binary(BinaryOp::Mul, neg, neg).unwrap();
        builder.output(out).unwrap();
        let mut graph = builder.build().unwrap();

        ConstantFolding.run(&mut graph).unwrap();
        let out_node = graph.node(graph.outputs()[0]).unwrap();
        assert!(
            matches!(out_node.op, Operation::Constant { value: ScalarValue::F64(v) } if v == 4.0)
        );
    }

    #[test]
    fn test_dead_node_elimination() {
        let mut graph = folded_graph();
        ConstantFolding.run(&mut graph).unwrap();
        let before = graph.len();
        let changed = DeadNodeElimination.run(&mut graph).unwrap();
        assert!(changed);
        // The folded node's two constant operands are now unreferenced.
        assert_eq!(graph.len(), before - 2);
    }

    #[test]
    fn test_default_pipeline_is_stable() {
        let mut graph = folded_graph();
        default_passes().run_all(&mut graph).unwrap();
        let len = graph.len();
        default_passes().run_all(&mut graph).unwrap();
        assert_eq!(graph.len(), len);
    }
}
