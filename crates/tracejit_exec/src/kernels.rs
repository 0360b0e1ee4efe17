//! Scalar kernels shared by constant folding and program execution.
//!
//! Booleans use the `1.0`/`0.0` runtime convention throughout.

use tracejit_ir::{BinaryOp, ReduceOp, UnaryOp};

pub(crate) fn binary(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Min => a.min(b),
        BinaryOp::Max => a.max(b),
        BinaryOp::Eq => bool_to_f64(a == b),
        BinaryOp::Ne => bool_to_f64(a != b),
        BinaryOp::Lt => bool_to_f64(a < b),
        BinaryOp::Le => bool_to_f64(a <= b),
        BinaryOp::Gt => bool_to_f64(a > b),
        BinaryOp::Ge => bool_to_f64(a >= b),
    }
}

pub(crate) fn unary(op: UnaryOp, a: f64) -> f64 {
    match op {
        UnaryOp::Neg => -a,
        UnaryOp::Abs => a.abs(),
        UnaryOp::Sqrt => a.sqrt(),
        UnaryOp::Exp => a.exp(),
        UnaryOp::Log => a.ln(),
        UnaryOp::Not => bool_to_f64(a == 0.0),
    }
}

pub(crate) fn reduce_identity(op: ReduceOp) -> f64 {
    match op {
        ReduceOp::Sum => 0.0,
        ReduceOp::Min => f64::INFINITY,
        ReduceOp::Max => f64::NEG_INFINITY,
    }
}

pub(crate) fn reduce_combine(op: ReduceOp, acc: f64, x: f64) -> f64 {
    match op {
        ReduceOp::Sum => acc + x,
        ReduceOp::Min => acc.min(x),
        ReduceOp::Max => acc.max(x),
    }
}

fn bool_to_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_kernels() {
        assert_eq!(binary(BinaryOp::Lt, 1.0, 2.0), 1.0);
        assert_eq!(binary(BinaryOp::Ge, 1.0, 2.0), 0.0);
    }

    #[test]
    fn test_reduce_kernels() {
        let xs = [3.0, -1.0, 2.0];
        for (op, expected) in [
            (ReduceOp::Sum, 4.0),
            (ReduceOp::Min, -1.0),
            (ReduceOp::Max, 3.0),
        ] {
            let got = xs
                .iter()
                .fold(reduce_identity(op), |acc, &x| reduce_combine(op, acc, x));
            assert_eq!(got, expected);
        }
    }
}
