//! Tracing layer: records one execution of a staging function as a graph.
//!
//! Dynamic arguments appear as opaque [`TracedValue`] handles carrying only
//! their element type and shape. A staging function combines handles through
//! [`TraceCtx`] methods; the one escape hatch for reading concrete contents
//! ([`TraceCtx::concrete_scalar`]) works only on constants, so control flow
//! that would depend on a dynamic value's data fails at trace time instead
//! of baking a single branch into the compiled program.

pub mod context;
pub mod error;
pub mod value;

pub use context::TraceCtx;
pub use error::TraceError;
pub use value::TracedValue;

pub type Result<T> = std::result::Result<T, TraceError>;
