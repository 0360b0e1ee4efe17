//! Node and operation kinds.

use crate::shape::{Axis, Shape};
use crate::types::{DType, ScalarValue};
use std::fmt;

/// Unique node identifier within one graph.
pub type NodeId = usize;

/// A single node: an operation, its operands and its inferred result type.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub op: Operation,
    pub inputs: Vec<NodeId>,
    pub dtype: DType,
    pub shape: Shape,
}

/// Operation kinds representable in a trace.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Dynamic argument placeholder. `index` is the position among dynamic
    /// arguments, which is also the position in the compiled program's
    /// input list.
    Placeholder { index: usize, name: String },

    /// Scalar constant.
    Constant { value: ScalarValue },

    /// Element-wise binary operation (with scalar broadcast).
    Binary { op: BinaryOp },

    /// Element-wise unary operation.
    Unary { op: UnaryOp },

    /// Matrix×matrix, matrix×vector or vector×matrix multiplication.
    MatMul,

    /// Matrix transposition.
    Transpose,

    /// Reduction over an axis, or over all elements when `axis` is `None`.
    Reduce { op: ReduceOp, axis: Option<Axis> },

    /// Element-wise ternary selection: `cond ? on_true : on_false`.
    ///
    /// This is the graph-level replacement for host-language branching on a
    /// dynamic value.
    Select,
}

/// Element-wise binary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    /// Comparisons yield `Bool` regardless of operand dtype.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

/// Element-wise unary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Abs,
    Sqrt,
    Exp,
    Log,
    Not,
}

/// Reduction operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    Sum,
    Min,
    Max,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Min => "min",
            BinaryOp::Max => "max",
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
            BinaryOp::Lt => "lt",
            BinaryOp::Le => "le",
            BinaryOp::Gt => "gt",
            BinaryOp::Ge => "ge",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Abs => "abs",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Exp => "exp",
            UnaryOp::Log => "log",
            UnaryOp::Not => "not",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for ReduceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReduceOp::Sum => "sum",
            ReduceOp::Min => "min",
            ReduceOp::Max => "max",
        };
        write!(f, "{name}")
    }
}
