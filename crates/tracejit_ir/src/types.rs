//! Element types for graph values.

use std::fmt;

/// Element type of a tensor or scalar.
///
/// Runtime buffers store `f64` uniformly; the dtype governs graph typing and
/// call-signature identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    F64,
    I32,
    I64,
    Bool,
}

impl DType {
    /// Whether arithmetic operations are defined for this dtype.
    pub fn is_numeric(self) -> bool {
        !matches!(self, DType::Bool)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F32 => write!(f, "f32"),
            DType::F64 => write!(f, "f64"),
            DType::I32 => write!(f, "i32"),
            DType::I64 => write!(f, "i64"),
            DType::Bool => write!(f, "bool"),
        }
    }
}

/// A typed scalar constant embedded in the graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    F32(f32),
    F64(f64),
    I32(i32),
    I64(i64),
    Bool(bool),
}

impl ScalarValue {
    pub fn dtype(self) -> DType {
        match self {
            ScalarValue::F32(_) => DType::F32,
            ScalarValue::F64(_) => DType::F64,
            ScalarValue::I32(_) => DType::I32,
            ScalarValue::I64(_) => DType::I64,
            ScalarValue::Bool(_) => DType::Bool,
        }
    }

    /// Value as the uniform `f64` runtime representation.
    ///
    /// Booleans map to `1.0`/`0.0`.
    pub fn as_f64(self) -> f64 {
        match self {
            ScalarValue::F32(v) => f64::from(v),
            ScalarValue::F64(v) => v,
            ScalarValue::I32(v) => f64::from(v),
            ScalarValue::I64(v) => v as f64,
            ScalarValue::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Build a scalar of the given dtype from the runtime representation.
    pub fn from_f64(dtype: DType, value: f64) -> Self {
        match dtype {
            DType::F32 => ScalarValue::F32(value as f32),
            DType::F64 => ScalarValue::F64(value),
            DType::I32 => ScalarValue::I32(value as i32),
            DType::I64 => ScalarValue::I64(value as i64),
            DType::Bool => ScalarValue::Bool(value != 0.0),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::F32(v) => write!(f, "{v}f32"),
            ScalarValue::F64(v) => write!(f, "{v}f64"),
            ScalarValue::I32(v) => write!(f, "{v}i32"),
            ScalarValue::I64(v) => write!(f, "{v}i64"),
            ScalarValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_runtime_repr() {
        let v = ScalarValue::I64(42);
        assert_eq!(ScalarValue::from_f64(DType::I64, v.as_f64()), v);

        let b = ScalarValue::Bool(true);
        assert_eq!(b.as_f64(), 1.0);
        assert_eq!(ScalarValue::from_f64(DType::Bool, 1.0), b);
    }

    #[test]
    fn test_dtype() {
        assert_eq!(ScalarValue::F64(0.5).dtype(), DType::F64);
        assert!(DType::F32.is_numeric());
        assert!(!DType::Bool.is_numeric());
    }
}
