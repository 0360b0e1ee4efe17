//! Optimization, lowering and execution of traced graphs.
//!
//! A validated graph is optimized (dead-node elimination, constant folding),
//! then lowered into a [`Program`]: a linear instruction sequence over a flat
//! slot file with per-input dtype/shape expectations burned in. The program
//! is the compiled artifact the cache hands out; executing it never touches
//! the graph again.

pub mod error;
mod kernels;
pub mod lower;
pub mod optimize;
pub mod program;
pub mod tensor;

pub use error::ExecError;
pub use lower::lower;
pub use optimize::{default_passes, ConstantFolding, DeadNodeElimination, OptimizationPass, PassManager};
pub use program::Program;
pub use tensor::Tensor;

pub type Result<T> = std::result::Result<T, ExecError>;
