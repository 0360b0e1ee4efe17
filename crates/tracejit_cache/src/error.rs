use thiserror::Error;

/// Errors raised while forming a call signature.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignatureError {
    /// A static argument must support equality and hashing; NaN breaks both.
    #[error("static float {value} cannot be hashed (NaN breaks equality)")]
    UnhashableStatic { value: f64 },
}
