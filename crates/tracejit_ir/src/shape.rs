//! Concrete shape tracking and inference.
//!
//! Every traced call sees fully concrete argument shapes, so dimensions are
//! plain sizes. Inference rules reject incompatible operands before a node
//! enters the graph.

use std::fmt;

/// Reduction axis for matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Collapse each row to one value, yielding a vector of length `nrows`.
    Rows,
    /// Collapse each column to one value, yielding a vector of length `ncols`.
    Columns,
}

/// Shape of a value: rank 0, 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Vector(usize),
    Matrix(usize, usize),
}

impl Shape {
    /// Number of dimensions.
    pub fn rank(self) -> usize {
        match self {
            Shape::Scalar => 0,
            Shape::Vector(_) => 1,
            Shape::Matrix(_, _) => 2,
        }
    }

    /// Total element count.
    pub fn len(self) -> usize {
        match self {
            Shape::Scalar => 1,
            Shape::Vector(n) => n,
            Shape::Matrix(m, n) => m * n,
        }
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Result shape of an element-wise combination with scalar broadcast.
    pub fn ewise(a: Shape, b: Shape) -> Option<Shape> {
        match (a, b) {
            (Shape::Scalar, s) | (s, Shape::Scalar) => Some(s),
            (Shape::Vector(n1), Shape::Vector(n2)) if n1 == n2 => Some(a),
            (Shape::Matrix(m1, n1), Shape::Matrix(m2, n2)) if m1 == m2 && n1 == n2 => Some(a),
            _ => None,
        }
    }

    /// Result shape of multiplication: matrix×matrix, matrix×vector or
    /// vector×matrix.
    pub fn matmul(a: Shape, b: Shape) -> Option<Shape> {
        match (a, b) {
            (Shape::Matrix(m, k1), Shape::Matrix(k2, n)) if k1 == k2 => Some(Shape::Matrix(m, n)),
            (Shape::Matrix(m, k1), Shape::Vector(k2)) if k1 == k2 => Some(Shape::Vector(m)),
            (Shape::Vector(k1), Shape::Matrix(k2, n)) if k1 == k2 => Some(Shape::Vector(n)),
            _ => None,
        }
    }

    /// Result shape of transposition.
    pub fn transpose(self) -> Option<Shape> {
        match self {
            Shape::Matrix(m, n) => Some(Shape::Matrix(n, m)),
            _ => None,
        }
    }

    /// Result shape of a reduction. `axis == None` collapses to a scalar.
    pub fn reduce(self, axis: Option<Axis>) -> Option<Shape> {
        match (self, axis) {
            (Shape::Vector(_) | Shape::Matrix(_, _), None) => Some(Shape::Scalar),
            (Shape::Matrix(m, _), Some(Axis::Rows)) => Some(Shape::Vector(m)),
            (Shape::Matrix(_, n), Some(Axis::Columns)) => Some(Shape::Vector(n)),
            _ => None,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar => write!(f, "()"),
            Shape::Vector(n) => write!(f, "({n})"),
            Shape::Matrix(m, n) => write!(f, "({m}, {n})"),
        }
    }
}
