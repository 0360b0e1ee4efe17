//! Signature-keyed compilation cache.
//!
//! A call signature abstracts dynamic tensor arguments to (dtype, shape) and
//! keeps static arguments as concrete values. The cache maps signatures to
//! compiled programs and guarantees at most one artifact per signature, with
//! the compile step serialised under the cache lock.

pub mod config;
pub mod error;
pub mod function_cache;
pub mod signature;

pub use config::CacheConfig;
pub use error::SignatureError;
pub use function_cache::{CacheStats, CompiledCache};
pub use signature::{Arg, ArgDescriptor, Signature, StaticValue};
