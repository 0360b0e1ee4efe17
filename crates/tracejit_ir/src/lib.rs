//! Dataflow graph representation for traced numerical programs.
//!
//! A trace records exactly one execution of a staging function as a graph of
//! operations over placeholders and constants. Shapes and element types are
//! checked as the graph is built, so a malformed program is rejected before
//! it ever reaches lowering.

pub mod builder;
pub mod error;
pub mod graph;
pub mod node;
pub mod shape;
pub mod types;

pub use builder::GraphBuilder;
pub use error::IrError;
pub use graph::Graph;
pub use node::{BinaryOp, Node, NodeId, Operation, ReduceOp, UnaryOp};
pub use shape::{Axis, Shape};
pub use types::{DType, ScalarValue};

pub type Result<T> = std::result::Result<T, IrError>;
