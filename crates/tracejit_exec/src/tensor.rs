//! Dense tensor values.

use crate::error::ExecError;
use crate::Result;
use tracejit_ir::{DType, Shape};

/// A dense rank-0/1/2 value.
///
/// Elements are stored as `f64` regardless of dtype (booleans as `1.0`/`0.0`,
/// matrices in row-major order); the dtype tags the value for graph typing
/// and signature identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    dtype: DType,
    shape: Shape,
    data: Vec<f64>,
}

impl Tensor {
    /// A scalar of dtype `f64`.
    pub fn scalar(value: f64) -> Self {
        Self {
            dtype: DType::F64,
            shape: Shape::Scalar,
            data: vec![value],
        }
    }

    /// A vector of dtype `f64`.
    pub fn vector(data: Vec<f64>) -> Self {
        Self {
            dtype: DType::F64,
            shape: Shape::Vector(data.len()),
            data,
        }
    }

    /// A row-major matrix of dtype `f64`.
    pub fn matrix(nrows: usize, ncols: usize, data: Vec<f64>) -> Result<Self> {
        let shape = Shape::Matrix(nrows, ncols);
        if data.len() != shape.len() {
            return Err(ExecError::LengthMismatch {
                shape,
                found: data.len(),
            });
        }
        Ok(Self {
            dtype: DType::F64,
            shape,
            data,
        })
    }

    /// A matrix from nested rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(nrows * ncols);
        for row in &rows {
            if row.len() != ncols {
                return Err(ExecError::LengthMismatch {
                    shape: Shape::Matrix(nrows, ncols),
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Self::matrix(nrows, ncols, data)
    }

    /// A matrix filled by `f(row, col)`.
    pub fn from_fn(nrows: usize, ncols: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for i in 0..nrows {
            for j in 0..ncols {
                data.push(f(i, j));
            }
        }
        Self {
            dtype: DType::F64,
            shape: Shape::Matrix(nrows, ncols),
            data,
        }
    }

    pub(crate) fn new(dtype: DType, shape: Shape, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), shape.len());
        Self { dtype, shape, data }
    }

    /// Re-tag the tensor with a different dtype without converting data.
    #[must_use]
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn as_scalar(&self) -> Result<f64> {
        match self.shape {
            Shape::Scalar => Ok(self.data[0]),
            other => Err(ExecError::NotAScalar(other)),
        }
    }

    /// Element at `(row, col)` of a matrix, row-major.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        match self.shape {
            Shape::Matrix(m, n) if row < m && col < n => Some(self.data[row * n + col]),
            _ => None,
        }
    }
}
