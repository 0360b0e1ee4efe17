//! Lowering: graph to linear slot program.

use crate::error::ExecError;
use crate::program::{InputSpec, Instr, Program, Step};
use crate::Result;
use tracejit_ir::{Graph, NodeId, Operation};
use std::collections::HashMap;

/// Lower a graph to an executable [`Program`].
///
/// Only nodes reachable from the outputs are lowered; each live node gets one
/// slot, and every instruction carries its result dtype and shape so
/// execution allocates without consulting the graph.
pub fn lower(graph: &Graph) -> Result<Program> {
    if graph.outputs().is_empty() {
        return Err(ExecError::Malformed {
            what: "graph has no outputs".into(),
        });
    }

    let live = graph.live_nodes();
    let order = graph.topological_order()?;

    let mut slot_of: HashMap<NodeId, usize> = HashMap::new();
    let mut inputs = Vec::new();
    let mut instrs = Vec::new();

    for node_id in order {
        let node = graph
            .node(node_id)
            .ok_or_else(|| malformed(node_id, "missing node"))?;
        // Placeholders always get a slot, even when unused: the signature
        // still includes the argument and execution must accept it.
        let is_placeholder = matches!(node.op, Operation::Placeholder { .. });
        if !live.contains(&node_id) && !is_placeholder {
            continue;
        }

        let slot = slot_of.len();
        slot_of.insert(node_id, slot);

        let operand = |i: usize| -> Result<usize> {
            let id = *node
                .inputs
                .get(i)
                .ok_or_else(|| malformed(node_id, "missing operand"))?;
            slot_of
                .get(&id)
                .copied()
                .ok_or_else(|| malformed(node_id, "operand not yet lowered"))
        };

        let step = match &node.op {
            Operation::Placeholder { index, .. } => {
                inputs.push(InputSpec {
                    slot,
                    position: *index,
                    dtype: node.dtype,
                    shape: node.shape,
                });
                continue;
            }
            Operation::Constant { value } => Step::Const { value: value.as_f64() },
            Operation::Binary { op } => Step::Binary {
                op: *op,
                lhs: operand(0)?,
                rhs: operand(1)?,
            },
            Operation::Unary { op } => Step::Unary {
                op: *op,
                src: operand(0)?,
            },
            Operation::MatMul => Step::MatMul {
                lhs: operand(0)?,
                rhs: operand(1)?,
            },
            Operation::Transpose => Step::Transpose { src: operand(0)? },
            Operation::Reduce { op, axis } => Step::Reduce {
                op: *op,
                axis: *axis,
                src: operand(0)?,
            },
            Operation::Select => Step::Select {
                cond: operand(0)?,
                on_true: operand(1)?,
                on_false: operand(2)?,
            },
        };

        instrs.push(Instr {
            dst: slot,
            dtype: node.dtype,
            shape: node.shape,
            step,
        });
    }

    inputs.sort_by_key(|spec| spec.position);
    // Placeholder positions must be dense: one per dynamic argument.
    for (i, spec) in inputs.iter().enumerate() {
        if spec.position != i {
            return Err(ExecError::Unsupported {
                what: format!("placeholder positions are not contiguous at {i}"),
            });
        }
    }

    let outputs = graph
        .outputs()
        .iter()
        .map(|id| {
            slot_of
                .get(id)
                .copied()
                .ok_or_else(|| malformed(*id, "output not lowered"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Program::new(slot_of.len(), inputs, instrs, outputs))
}

fn malformed(node: NodeId, what: &str) -> ExecError {
    ExecError::Malformed {
        what: format!("node {node}: {what}"),
    }
}
