use thiserror::Error;
use tracejit_cache::SignatureError;
use tracejit_exec::ExecError;
use tracejit_ir::IrError;
use tracejit_trace::TraceError;

/// Any failure surfaced by [`crate::Jit::call`].
///
/// Tracing, signature and compilation failures are surfaced immediately to
/// the caller; nothing is retried and nothing falls back silently.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("trace error: {0}")]
    Trace(#[from] TraceError),

    #[error("graph error: {0}")]
    Graph(#[from] IrError),

    #[error("compile/execute error: {0}")]
    Exec(#[from] ExecError),

    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),
}
