use tracejit_ir::{DType, IrError, Shape};
use thiserror::Error;

/// Errors from lowering a graph or executing a program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    #[error("tensor data length {found} does not match shape {shape}")]
    LengthMismatch { shape: Shape, found: usize },

    #[error("expected a scalar, got shape {0}")]
    NotAScalar(Shape),

    #[error("program expects {expected} tensor arguments, got {found}")]
    WrongArgCount { expected: usize, found: usize },

    /// An actual argument does not match the signature the program was
    /// compiled for.
    #[error(
        "input {index}: expected {expected_dtype} tensor of shape \
         {expected_shape}, found {found_dtype} of shape {found_shape}"
    )]
    SignatureMismatch {
        index: usize,
        expected_dtype: DType,
        expected_shape: Shape,
        found_dtype: DType,
        found_shape: Shape,
    },

    /// The graph contains a construct the backend cannot lower.
    #[error("cannot lower graph: {what}")]
    Unsupported { what: String },

    /// Internal consistency failure while lowering or executing.
    #[error("malformed program: {what}")]
    Malformed { what: String },

    #[error(transparent)]
    Graph(#[from] IrError),
}
