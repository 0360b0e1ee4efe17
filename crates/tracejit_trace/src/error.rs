use tracejit_ir::IrError;
use thiserror::Error;

/// Errors surfaced while tracing a staging function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    /// The staging function tried to read the concrete contents of a value
    /// that depends on a dynamic argument. Tracing captures exactly one
    /// execution path, so a host-language branch on such a value would bake
    /// a silently wrong program; use `select` instead.
    #[error(
        "cannot read the contents of a traced value derived from a dynamic \
         argument; use select() for data-dependent choices"
    )]
    DataDependentBranch,

    #[error("concrete_bool: value has dtype {0}, expected bool")]
    NotABool(tracejit_ir::DType),

    #[error("argument {index} out of range (function takes {len})")]
    ArgOutOfRange { index: usize, len: usize },

    #[error("argument {index} is static, but a tensor argument was requested")]
    TensorArgExpected { index: usize },

    #[error("argument {index} is a tensor, but a static argument was requested")]
    StaticArgExpected { index: usize },

    #[error("static argument {index} is not a {expected}")]
    WrongStaticKind {
        index: usize,
        expected: &'static str,
    },

    #[error(transparent)]
    Graph(#[from] IrError),
}
