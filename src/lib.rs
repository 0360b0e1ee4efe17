//! Trace-once JIT with a signature-keyed compilation cache.
//!
//! A [`Jit`] wraps a staging function. The first call with a given argument
//! signature runs the staging function once against abstract placeholders,
//! records the computation as a dataflow graph, optimizes and lowers it to a
//! compiled [`Program`], and caches the program. Later calls with the same
//! signature skip tracing entirely and replay the cached program on the new
//! inputs.
//!
//! A signature abstracts each dynamic tensor argument to its element type
//! and shape and keeps each static argument as its concrete value. Calling
//! with a new shape, dtype, or static value compiles a new specialization;
//! calling with different tensor contents of the same shape does not.
//!
//! ```
//! use tracejit::{Arg, Jit, Tensor};
//!
//! let scale = Jit::new("scale", |ctx, args| {
//!     let x = args.tensor(0)?;
//!     let factor = args.static_float(1)?;
//!     let k = ctx.constant(factor)?;
//!     Ok(vec![ctx.mul(x, k)?])
//! });
//!
//! let x = Tensor::vector(vec![1.0, 2.0, 3.0]);
//! let out = scale.call(&[Arg::tensor(x), Arg::float(2.0)?])?;
//! assert_eq!(out[0].data(), &[2.0, 4.0, 6.0]);
//! assert_eq!(scale.stats().compilations, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod jit;

pub use error::Error;
pub use jit::{Jit, StageFn, TraceArgs};

pub use tracejit_cache::{
    Arg, ArgDescriptor, CacheConfig, CacheStats, Signature, SignatureError, StaticValue,
};
pub use tracejit_exec::{ExecError, Program, Tensor};
pub use tracejit_ir::{Axis, DType, IrError, Shape};
pub use tracejit_trace::{TraceCtx, TraceError, TracedValue};
pub use tracejit_utils::init_logging;
