//! Call arguments, descriptors and signatures.

use crate::error::SignatureError;
use ahash::AHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracejit_exec::Tensor;
use tracejit_ir::{DType, Shape};

/// A concrete value usable as a static argument.
///
/// Static arguments participate in the call signature by value, so every
/// variant is hashable and comparable. Floats are keyed by IEEE bit pattern;
/// NaN is rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StaticValue {
    Int(i64),
    Bool(bool),
    Str(String),
    /// IEEE-754 bits of a non-NaN `f64`.
    Float(u64),
}

impl StaticValue {
    pub fn float(value: f64) -> Result<Self, SignatureError> {
        if value.is_nan() {
            return Err(SignatureError::UnhashableStatic { value });
        }
        Ok(StaticValue::Float(value.to_bits()))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            StaticValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StaticValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StaticValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            StaticValue::Float(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }
}

impl From<i64> for StaticValue {
    fn from(v: i64) -> Self {
        StaticValue::Int(v)
    }
}

impl From<bool> for StaticValue {
    fn from(v: bool) -> Self {
        StaticValue::Bool(v)
    }
}

impl From<&str> for StaticValue {
    fn from(v: &str) -> Self {
        StaticValue::Str(v.to_owned())
    }
}

impl fmt::Display for StaticValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticValue::Int(v) => write!(f, "{v}"),
            StaticValue::Bool(v) => write!(f, "{v}"),
            StaticValue::Str(v) => write!(f, "{v:?}"),
            StaticValue::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
        }
    }
}

/// One concrete call argument.
#[derive(Debug, Clone)]
pub enum Arg {
    /// Dynamic argument: only dtype and shape enter the signature.
    Tensor(Tensor),
    /// Static argument: the value itself enters the signature.
    Static(StaticValue),
}

impl Arg {
    pub fn tensor(t: Tensor) -> Self {
        Arg::Tensor(t)
    }

    pub fn int(v: i64) -> Self {
        Arg::Static(StaticValue::Int(v))
    }

    pub fn boolean(v: bool) -> Self {
        Arg::Static(StaticValue::Bool(v))
    }

    pub fn str(v: impl Into<String>) -> Self {
        Arg::Static(StaticValue::Str(v.into()))
    }

    pub fn float(v: f64) -> Result<Self, SignatureError> {
        Ok(Arg::Static(StaticValue::float(v)?))
    }
}

/// Descriptor derived from one argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgDescriptor {
    Dynamic { dtype: DType, shape: Shape },
    Static(StaticValue),
}

/// The ordered descriptor tuple for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    descriptors: Vec<ArgDescriptor>,
}

impl Signature {
    /// Derive the signature of a call.
    pub fn of(args: &[Arg]) -> Self {
        let descriptors = args
            .iter()
            .map(|arg| match arg {
                Arg::Tensor(t) => ArgDescriptor::Dynamic {
                    dtype: t.dtype(),
                    shape: t.shape(),
                },
                Arg::Static(v) => ArgDescriptor::Static(v.clone()),
            })
            .collect();
        Self { descriptors }
    }

    pub fn descriptors(&self) -> &[ArgDescriptor] {
        &self.descriptors
    }

    /// Number of dynamic arguments.
    pub fn dynamic_count(&self) -> usize {
        self.descriptors
            .iter()
            .filter(|d| matches!(d, ArgDescriptor::Dynamic { .. }))
            .count()
    }

    /// Stable 64-bit digest, for logging.
    pub fn digest(&self) -> u64 {
        let mut hasher = AHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.descriptors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match d {
                ArgDescriptor::Dynamic { dtype, shape } => write!(f, "{dtype}{shape}")?,
                ArgDescriptor::Static(v) => write!(f, "static {v}")?,
            }
        }
        write!(f, ")")
    }
}
