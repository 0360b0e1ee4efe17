//! The trace context: a graph builder with an abstract-value surface.

use crate::error::TraceError;
use crate::value::TracedValue;
use crate::Result;
use tracejit_ir::{
    Axis, BinaryOp, DType, Graph, GraphBuilder, Operation, ReduceOp, ScalarValue, Shape, UnaryOp,
};

/// Records one execution of a staging function.
///
/// Every method appends a node to the underlying graph and returns an opaque
/// handle. The context is handed to the staging function by the driver; user
/// code never constructs one directly.
#[derive(Debug, Default)]
pub struct TraceCtx {
    builder: GraphBuilder,
}

impl TraceCtx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Introduce a placeholder for the `index`-th dynamic argument.
    ///
    /// Called by the driver before the staging function runs.
    pub fn placeholder(
        &mut self,
        index: usize,
        name: impl Into<String>,
        dtype: DType,
        shape: Shape,
    ) -> Result<TracedValue> {
        let id = self.builder.placeholder(index, name, dtype, shape)?;
        Ok(TracedValue::new(id, dtype, shape))
    }

    /// An `f64` scalar constant.
    pub fn constant(&mut self, value: f64) -> Result<TracedValue> {
        self.constant_of(ScalarValue::F64(value))
    }

    /// A typed scalar constant.
    pub fn constant_of(&mut self, value: ScalarValue) -> Result<TracedValue> {
        let id = self.builder.constant(value)?;
        Ok(TracedValue::new(id, value.dtype(), Shape::Scalar))
    }

    pub fn add(&mut self, a: TracedValue, b: TracedValue) -> Result<TracedValue> {
        self.binary(BinaryOp::Add, a, b)
    }

    pub fn sub(&mut self, a: TracedValue, b: TracedValue) -> Result<TracedValue> {
        self.binary(BinaryOp::Sub, a, b)
    }

    pub fn mul(&mut self, a: TracedValue, b: TracedValue) -> Result<TracedValue> {
        self.binary(BinaryOp::Mul, a, b)
    }

    pub fn div(&mut self, a: TracedValue, b: TracedValue) -> Result<TracedValue> {
        self.binary(BinaryOp::Div, a, b)
    }

    pub fn min(&mut self, a: TracedValue, b: TracedValue) -> Result<TracedValue> {
        self.binary(BinaryOp::Min, a, b)
    }

    pub fn max(&mut self, a: TracedValue, b: TracedValue) -> Result<TracedValue> {
        self.binary(BinaryOp::Max, a, b)
    }

    pub fn eq(&mut self, a: TracedValue, b: TracedValue) -> Result<TracedValue> {
        self.binary(BinaryOp::Eq, a, b)
    }

    pub fn ne(&mut self, a: TracedValue, b: TracedValue) -> Result<TracedValue> {
        self.binary(BinaryOp::Ne, a, b)
    }

    pub fn lt(&mut self, a: TracedValue, b: TracedValue) -> Result<TracedValue> {
        self.binary(BinaryOp::Lt, a, b)
    }

    pub fn le(&mut self, a: TracedValue, b: TracedValue) -> Result<TracedValue> {
        self.binary(BinaryOp::Le, a, b)
    }

    pub fn gt(&mut self, a: TracedValue, b: TracedValue) -> Result<TracedValue> {
        self.binary(BinaryOp::Gt, a, b)
    }

    pub fn ge(&mut self, a: TracedValue, b: TracedValue) -> Result<TracedValue> {
        self.binary(BinaryOp::Ge, a, b)
    }

    pub fn neg(&mut self, a: TracedValue) -> Result<TracedValue> {
        self.unary(UnaryOp::Neg, a)
    }

    pub fn abs(&mut self, a: TracedValue) -> Result<TracedValue> {
        self.unary(UnaryOp::Abs, a)
    }

    pub fn sqrt(&mut self, a: TracedValue) -> Result<TracedValue> {
        self.unary(UnaryOp::Sqrt, a)
    }

    pub fn exp(&mut self, a: TracedValue) -> Result<TracedValue> {
        self.unary(UnaryOp::Exp, a)
    }

    pub fn log(&mut self, a: TracedValue) -> Result<TracedValue> {
        self.unary(UnaryOp::Log, a)
    }

    pub fn not(&mut self, a: TracedValue) -> Result<TracedValue> {
        self.unary(UnaryOp::Not, a)
    }

    /// Matrix×matrix, matrix×vector or vector×matrix multiplication.
    pub fn matmul(&mut self, a: TracedValue, b: TracedValue) -> Result<TracedValue> {
        let id = self.builder.matmul(a.id, b.id)?;
        Ok(self.wrap(id))
    }

    pub fn transpose(&mut self, a: TracedValue) -> Result<TracedValue> {
        let id = self.builder.transpose(a.id)?;
        Ok(self.wrap(id))
    }

    pub fn reduce_sum(&mut self, a: TracedValue, axis: Option<Axis>) -> Result<TracedValue> {
        let id = self.builder.reduce(ReduceOp::Sum, axis, a.id)?;
        Ok(self.wrap(id))
    }

    pub fn reduce_min(&mut self, a: TracedValue, axis: Option<Axis>) -> Result<TracedValue> {
        let id = self.builder.reduce(ReduceOp::Min, axis, a.id)?;
        Ok(self.wrap(id))
    }

    pub fn reduce_max(&mut self, a: TracedValue, axis: Option<Axis>) -> Result<TracedValue> {
        let id = self.builder.reduce(ReduceOp::Max, axis, a.id)?;
        Ok(self.wrap(id))
    }

    /// Element-wise data-dependent choice, evaluated inside the compiled
    /// program. This is the replacement for host-language `if` on dynamic
    /// values.
    pub fn select(
        &mut self,
        cond: TracedValue,
        on_true: TracedValue,
        on_false: TracedValue,
    ) -> Result<TracedValue> {
        let id = self.builder.select(cond.id, on_true.id, on_false.id)?;
        Ok(self.wrap(id))
    }

    /// Read a value's concrete scalar contents at trace time.
    ///
    /// Succeeds only for constants. Any value derived from a dynamic
    /// placeholder fails with [`TraceError::DataDependentBranch`], even when
    /// its contents happen to be computable; predictability over cleverness.
    pub fn concrete_scalar(&self, value: TracedValue) -> Result<f64> {
        let node = self
            .builder
            .graph()
            .node(value.id)
            .ok_or(TraceError::Graph(tracejit_ir::IrError::UnknownNode(value.id)))?;
        match &node.op {
            Operation::Constant { value } => Ok(value.as_f64()),
            _ => Err(TraceError::DataDependentBranch),
        }
    }

    /// Read a boolean constant at trace time. Same restrictions as
    /// [`Self::concrete_scalar`].
    pub fn concrete_bool(&self, value: TracedValue) -> Result<bool> {
        if value.dtype != DType::Bool {
            return Err(TraceError::NotABool(value.dtype));
        }
        Ok(self.concrete_scalar(value)? != 0.0)
    }

    /// Finish the trace, marking `outputs` as the program results.
    pub fn finish(mut self, outputs: &[TracedValue]) -> Result<Graph> {
        for out in outputs {
            self.builder.output(out.id)?;
        }
        Ok(self.builder.build()?)
    }

    fn binary(&mut self, op: BinaryOp, a: TracedValue, b: TracedValue) -> Result<TracedValue> {
        let id = self.builder.binary(op, a.id, b.id)?;
        Ok(self.wrap(id))
    }

    fn unary(&mut self, op: UnaryOp, a: TracedValue) -> Result<TracedValue> {
        let id = self.builder.unary(op, a.id)?;
        Ok(self.wrap(id))
    }

    fn wrap(&self, id: tracejit_ir::NodeId) -> TracedValue {
        // The builder validated the node an instant ago.
        let node = self.builder.graph().node(id).map(|n| (n.dtype, n.shape));
        let (dtype, shape) = node.unwrap_or((DType::F64, Shape::Scalar));
        TracedValue::new(id, dtype, shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_simple_expression() {
        let mut ctx = TraceCtx::new();
        let a = ctx
            .placeholder(0, "a", DType::F64, Shape::Matrix(2, 3))
            .unwrap();
        let b = ctx
            .placeholder(1, "b", DType::F64, Shape::Matrix(3, 2))
            .unwrap();

        let c = ctx.matmul(a, b).unwrap();
        assert_eq!(c.shape(), Shape::Matrix(2, 2));

        let graph = ctx.finish(&[c]).unwrap();
        assert_eq!(graph.inputs().len(), 2);
        assert_eq!(graph.outputs().len(), 1);
    }

    #[test]
    fn test_concrete_read_of_constant() {
        let mut ctx = TraceCtx::new();
        let k = ctx.constant(2.5).unwrap();
        assert_eq!(ctx.concrete_scalar(k).unwrap(), 2.5);
    }

    #[test]
    fn test_concrete_read_of_placeholder_fails() {
        let mut ctx = TraceCtx::new();
        let a = ctx.placeholder(0, "a", DType::F64, Shape::Scalar).unwrap();
        assert_eq!(
            ctx.concrete_scalar(a).unwrap_err(),
            TraceError::DataDependentBranch
        );
    }

    #[test]
    fn test_concrete_read_of_derived_value_fails() {
        let mut ctx = TraceCtx::new();
        let a = ctx.placeholder(0, "a", DType::F64, Shape::Scalar).unwrap();
        let zero = ctx.constant(0.0).unwrap();
        let mask = ctx.gt(a, zero).unwrap();
        assert_eq!(
            ctx.concrete_bool(mask).unwrap_err(),
            TraceError::DataDependentBranch
        );
    }

    #[test]
    fn test_concrete_bool_requires_bool() {
        let mut ctx = TraceCtx::new();
        let k = ctx.constant(1.0).unwrap();
        assert_eq!(
            ctx.concrete_bool(k).unwrap_err(),
            TraceError::NotABool(DType::F64)
        );
    }

    #[test]
    fn test_finish_without_outputs_fails() {
        let mut ctx = TraceCtx::new();
        ctx.placeholder(0, "a", DType::F64, Shape::Scalar).unwrap();
        assert!(matches!(
            ctx.finish(&[]).unwrap_err(),
            TraceError::Graph(tracejit_ir::IrError::NoOutputs)
        ));
    }
}
