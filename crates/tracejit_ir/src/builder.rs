//! Fluent interface for composing graphs with shape and dtype checking.

use crate::error::IrError;
use crate::graph::Graph;
use crate::node::{BinaryOp, NodeId, Operation, ReduceOp, UnaryOp};
use crate::shape::{Axis, Shape};
use crate::types::{DType, ScalarValue};
use crate::Result;

/// Builder for constructing validated graphs.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dynamic-argument placeholder. `index` is the position among
    /// dynamic arguments.
    pub fn placeholder(
        &mut self,
        index: usize,
        name: impl Into<String>,
        dtype: DType,
        shape: Shape,
    ) -> Result<NodeId> {
        let id = self.graph.add_node(
            Operation::Placeholder {
                index,
                name: name.into(),
            },
            vec![],
            dtype,
            shape,
        )?;
        self.graph.add_input(id)?;
        Ok(id)
    }

    /// Add a scalar constant.
    pub fn constant(&mut self, value: ScalarValue) -> Result<NodeId> {
        self.graph.add_node(
            Operation::Constant { value },
            vec![],
            value.dtype(),
            Shape::Scalar,
        )
    }

    /// Element-wise binary operation with scalar broadcast. Comparisons
    /// produce `Bool`; arithmetic preserves the operand dtype.
    pub fn binary(&mut self, op: BinaryOp, a: NodeId, b: NodeId) -> Result<NodeId> {
        let (a_dtype, a_shape) = self.node_info(a)?;
        let (b_dtype, b_shape) = self.node_info(b)?;

        if a_dtype != b_dtype {
            return Err(IrError::DTypeMismatch {
                op: "binary",
                lhs: a_dtype,
                rhs: b_dtype,
            });
        }
        if !op.is_comparison() && !a_dtype.is_numeric() {
            return Err(IrError::InvalidOperand {
                op: "binary",
                expected: "numeric",
                found: a_dtype,
            });
        }

        let shape = Shape::ewise(a_shape, b_shape).ok_or(IrError::DimensionMismatch {
            op: "binary",
            lhs: a_shape,
            rhs: b_shape,
        })?;
        let dtype = if op.is_comparison() { DType::Bool } else { a_dtype };

        self.graph
            .add_node(Operation::Binary { op }, vec![a, b], dtype, shape)
    }

    /// Element-wise unary operation. `Not` requires and yields `Bool`.
    pub fn unary(&mut self, op: UnaryOp, a: NodeId) -> Result<NodeId> {
        let (dtype, shape) = self.node_info(a)?;

        match op {
            UnaryOp::Not if dtype != DType::Bool => {
                return Err(IrError::InvalidOperand {
                    op: "not",
                    expected: "bool",
                    found: dtype,
                });
            }
            UnaryOp::Not => {}
            _ if !dtype.is_numeric() => {
                return Err(IrError::InvalidOperand {
                    op: "unary",
                    expected: "numeric",
                    found: dtype,
                });
            }
            _ => {}
        }

        self.graph
            .add_node(Operation::Unary { op }, vec![a], dtype, shape)
    }

    /// Multiplication: matrix×matrix, matrix×vector or vector×matrix.
    pub fn matmul(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let (a_dtype, a_shape) = self.node_info(a)?;
        let (b_dtype, b_shape) = self.node_info(b)?;

        if a_dtype != b_dtype {
            return Err(IrError::DTypeMismatch {
                op: "matmul",
                lhs: a_dtype,
                rhs: b_dtype,
            });
        }
        if !a_dtype.is_numeric() {
            return Err(IrError::InvalidOperand {
                op: "matmul",
                expected: "numeric",
                found: a_dtype,
            });
        }

        let shape = Shape::matmul(a_shape, b_shape).ok_or(IrError::DimensionMismatch {
            op: "matmul",
            lhs: a_shape,
            rhs: b_shape,
        })?;

        self.graph
            .add_node(Operation::MatMul, vec![a, b], a_dtype, shape)
    }

    /// Matrix transposition.
    pub fn transpose(&mut self, a: NodeId) -> Result<NodeId> {
        let (dtype, shape) = self.node_info(a)?;
        let out = shape.transpose().ok_or(IrError::InvalidShape {
            op: "transpose",
            shape,
        })?;
        self.graph
            .add_node(Operation::Transpose, vec![a], dtype, out)
    }

    /// Reduction over an axis, or over all elements when `axis` is `None`.
    pub fn reduce(&mut self, op: ReduceOp, axis: Option<Axis>, a: NodeId) -> Result<NodeId> {
        let (dtype, shape) = self.node_info(a)?;
        if !dtype.is_numeric() {
            return Err(IrError::InvalidOperand {
                op: "reduce",
                expected: "numeric",
                found: dtype,
            });
        }
        let out = shape.reduce(axis).ok_or(IrError::InvalidShape {
            op: "reduce",
            shape,
        })?;
        self.graph
            .add_node(Operation::Reduce { op, axis }, vec![a], dtype, out)
    }

    /// Element-wise selection: where `cond` holds, take `on_true`, otherwise
    /// `on_false`. The condition must be `Bool` and may be a scalar.
    pub fn select(&mut self, cond: NodeId, on_true: NodeId, on_false: NodeId) -> Result<NodeId> {
        let (cond_dtype, cond_shape) = self.node_info(cond)?;
        let (t_dtype, t_shape) = self.node_info(on_true)?;
        let (f_dtype, f_shape) = self.node_info(on_false)?;

        if cond_dtype != DType::Bool {
            return Err(IrError::InvalidOperand {
                op: "select",
                expected: "bool",
                found: cond_dtype,
            });
        }
        if t_dtype != f_dtype {
            return Err(IrError::DTypeMismatch {
                op: "select",
                lhs: t_dtype,
                rhs: f_dtype,
            });
        }
        if t_shape != f_shape {
            return Err(IrError::DimensionMismatch {
                op: "select",
                lhs: t_shape,
                rhs: f_shape,
            });
        }
        let shape = Shape::ewise(cond_shape, t_shape).ok_or(IrError::DimensionMismatch {
            op: "select",
            lhs: cond_shape,
            rhs: t_shape,
        })?;

        self.graph.add_node(
            Operation::Select,
            vec![cond, on_true, on_false],
            t_dtype,
            shape,
        )
    }

    /// Mark a node as a graph output.
    pub fn output(&mut self, node: NodeId) -> Result<()> {
        self.graph.add_output(node)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Consume the builder, returning the graph. Fails if no outputs were
    /// marked.
    pub fn build(self) -> Result<Graph> {
        if self.graph.outputs().is_empty() {
            return Err(IrError::NoOutputs);
        }
        Ok(self.graph)
    }

    fn node_info(&self, id: NodeId) -> Result<(DType, Shape)> {
        let node = self.graph.node(id).ok_or(IrError::UnknownNode(id))?;
        Ok((node.dtype, node.shape))
    }
}
