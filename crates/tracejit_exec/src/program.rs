//! The compiled artifact: a linear slot program.

use crate::error::ExecError;
use crate::kernels;
use crate::tensor::Tensor;
use crate::Result;
use tracejit_ir::{Axis, BinaryOp, DType, ReduceOp, Shape, UnaryOp};

/// Expectation for one dynamic argument, burned in at lowering time.
#[derive(Debug, Clone, Copy)]
pub struct InputSpec {
    pub(crate) slot: usize,
    pub(crate) position: usize,
    pub(crate) dtype: DType,
    pub(crate) shape: Shape,
}

/// One lowered operation.
#[derive(Debug, Clone)]
pub struct Instr {
    pub(crate) dst: usize,
    pub(crate) dtype: DType,
    pub(crate) shape: Shape,
    pub(crate) step: Step,
}

#[derive(Debug, Clone)]
pub(crate) enum Step {
    Const { value: f64 },
    Binary { op: BinaryOp, lhs: usize, rhs: usize },
    Unary { op: UnaryOp, src: usize },
    MatMul { lhs: usize, rhs: usize },
    Transpose { src: usize },
    Reduce { op: ReduceOp, axis: Option<Axis>, src: usize },
    Select { cond: usize, on_true: usize, on_false: usize },
}

/// A compiled, immutable, directly executable program.
///
/// Produced once per distinct call signature and owned by the cache behind
/// an `Arc`. Replaying it never re-runs the staging function.
#[derive(Debug)]
pub struct Program {
    n_slots: usize,
    inputs: Vec<InputSpec>,
    instrs: Vec<Instr>,
    outputs: Vec<usize>,
}

impl Program {
    pub(crate) fn new(
        n_slots: usize,
        inputs: Vec<InputSpec>,
        instrs: Vec<Instr>,
        outputs: Vec<usize>,
    ) -> Self {
        Self {
            n_slots,
            inputs,
            instrs,
            outputs,
        }
    }

    pub fn n_slots(&self) -> usize {
        self.n_slots
    }

    pub fn instr_count(&self) -> usize {
        self.instrs.len()
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Execute with concrete dynamic arguments, in placeholder order.
    ///
    /// Arguments are revalidated against the burned-in dtype/shape
    /// expectations; the cache key normally guarantees a match, so a failure
    /// here means the caller bypassed the cache.
    pub fn execute(&self, args: &[Tensor]) -> Result<Vec<Tensor>> {
        if args.len() != self.inputs.len() {
            return Err(ExecError::WrongArgCount {
                expected: self.inputs.len(),
                found: args.len(),
            });
        }

        let mut slots: Vec<Option<Tensor>> = vec![None; self.n_slots];

        for spec in &self.inputs {
            let arg = &args[spec.position];
            if arg.dtype() != spec.dtype || arg.shape() != spec.shape {
                return Err(ExecError::SignatureMismatch {
                    index: spec.position,
                    expected_dtype: spec.dtype,
                    expected_shape: spec.shape,
                    found_dtype: arg.dtype(),
                    found_shape: arg.shape(),
                });
            }
            slots[spec.slot] = Some(arg.clone());
        }

        for instr in &self.instrs {
            let result = eval(instr, &slots)?;
            slots[instr.dst] = Some(result);
        }

        self.outputs
            .iter()
            .map(|&slot| {
                slots[slot]
                    .clone()
                    .ok_or_else(|| ExecError::Malformed {
                        what: format!("output slot {slot} never written"),
                    })
            })
            .collect()
    }
}

fn eval(instr: &Instr, slots: &[Option<Tensor>]) -> Result<Tensor> {
    let get = |slot: usize| -> Result<&Tensor> {
        slots
            .get(slot)
            .and_then(Option::as_ref)
            .ok_or_else(|| ExecError::Malformed {
                what: format!("slot {slot} read before write"),
            })
    };

    let data = match &instr.step {
        Step::Const { value } => vec![*value],
        Step::Binary { op, lhs, rhs } => {
            let (a, b) = (get(*lhs)?, get(*rhs)?);
            ewise2(instr.shape, a, b, |x, y| kernels::binary(*op, x, y))
        }
        Step::Unary { op, src } => {
            get(*src)?.data().iter().map(|&x| kernels::unary(*op, x)).collect()
        }
        Step::MatMul { lhs, rhs } => matmul(get(*lhs)?, get(*rhs)?)?,
        Step::Transpose { src } => transpose(get(*src)?)?,
        Step::Reduce { op, axis, src } => reduce(*op, *axis, get(*src)?),
        Step::Select {
            cond,
            on_true,
            on_false,
        } => {
            let (c, t, f) = (get(*cond)?, get(*on_true)?, get(*on_false)?);
            let n = instr.shape.len();
            (0..n)
                .map(|i| {
                    if broadcast(c, i) != 0.0 {
                        broadcast(t, i)
                    } else {
                        broadcast(f, i)
                    }
                })
                .collect()
        }
    };

    if data.len() != instr.shape.len() {
        return Err(ExecError::Malformed {
            what: format!(
                "instruction for slot {} produced {} elements for shape {}",
                instr.dst,
                data.len(),
                instr.shape
            ),
        });
    }
    Ok(Tensor::new(instr.dtype, instr.shape, data))
}

/// Element of `t` under scalar broadcast.
fn broadcast(t: &Tensor, i: usize) -> f64 {
    match t.shape() {
        Shape::Scalar => t.data()[0],
        _ => t.data()[i],
    }
}

fn ewise2(out: Shape, a: &Tensor, b: &Tensor, f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    (0..out.len()).map(|i| f(broadcast(a, i), broadcast(b, i))).collect()
}

fn matmul(a: &Tensor, b: &Tensor) -> Result<Vec<f64>> {
    match (a.shape(), b.shape()) {
        (Shape::Matrix(m, k), Shape::Matrix(k2, n)) if k == k2 => {
            let mut out = vec![0.0; m * n];
            for i in 0..m {
                for j in 0..n {
                    let mut sum = 0.0;
                    for kk in 0..k {
                        sum += a.data()[i * k + kk] * b.data()[kk * n + j];
                    }
                    out[i * n + j] = sum;
                }
            }
            Ok(out)
        }
        (Shape::Matrix(m, k), Shape::Vector(k2)) if k == k2 => {
            let mut out = vec![0.0; m];
            for i in 0..m {
                let mut sum = 0.0;
                for kk in 0..k {
                    sum += a.data()[i * k + kk] * b.data()[kk];
                }
                out[i] = sum;
            }
            Ok(out)
        }
        (Shape::Vector(k), Shape::Matrix(k2, n)) if k == k2 => {
            let mut out = vec![0.0; n];
            for j in 0..n {
                let mut sum = 0.0;
                for kk in 0..k {
                    sum += a.data()[kk] * b.data()[kk * n + j];
                }
                out[j] = sum;
            }
            Ok(out)
        }
        _ => Err(ExecError::Malformed {
            what: format!("matmul on shapes {} and {}", a.shape(), b.shape()),
        }),
    }
}

fn transpose(a: &Tensor) -> Result<Vec<f64>> {
    match a.shape() {
        Shape::Matrix(m, n) => {
            let mut out = vec![0.0; m * n];
            for i in 0..m {
                for j in 0..n {
                    out[j * m + i] = a.data()[i * n + j];
                }
            }
            Ok(out)
        }
        other => Err(ExecError::Malformed {
            what: format!("transpose on shape {other}"),
        }),
    }
}

fn reduce(op: ReduceOp, axis: Option<Axis>, a: &Tensor) -> Vec<f64> {
    match (a.shape(), axis) {
        (Shape::Matrix(m, n), Some(Axis::Rows)) => (0..m)
            .map(|i| {
                (0..n).fold(kernels::reduce_identity(op), |acc, j| {
                    kernels::reduce_combine(op, acc, a.data()[i * n + j])
                })
            })
            .collect(),
        (Shape::Matrix(m, n), Some(Axis::Columns)) => (0..n)
            .map(|j| {
                (0..m).fold(kernels::reduce_identity(op), |acc, i| {
                    kernels::reduce_combine(op, acc, a.data()[i * n + j])
                })
            })
            .collect(),
        _ => {
            let total = a
                .data()
                .iter()
                .fold(kernels::reduce_identity(op), |acc, &x| {
                    kernels::reduce_combine(op, acc, x)
                });
            vec![total]
        }
    }
}
