use crate::node::NodeId;
use crate::shape::Shape;
use crate::types::DType;
use thiserror::Error;

/// Errors produced while building or traversing a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IrError {
    #[error("unknown node id {0}")]
    UnknownNode(NodeId),

    #[error("cycle detected in graph at node {0}")]
    Cycle(NodeId),

    #[error("{op}: incompatible shapes {lhs} and {rhs}")]
    DimensionMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    #[error("{op}: operand dtypes differ, {lhs} vs {rhs}")]
    DTypeMismatch {
        op: &'static str,
        lhs: DType,
        rhs: DType,
    },

    #[error("{op}: expected a {expected} operand, got {found}")]
    InvalidOperand {
        op: &'static str,
        expected: &'static str,
        found: DType,
    },

    #[error("{op}: not defined for shape {shape}")]
    InvalidShape { op: &'static str, shape: Shape },

    #[error("graph has no outputs")]
    NoOutputs,

    #[error("node {node} still referenced by node {by}")]
    StillReferenced { node: NodeId, by: NodeId },
}
