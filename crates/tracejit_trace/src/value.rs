use tracejit_ir::{DType, NodeId, Shape};

/// Opaque handle to a value inside a trace.
///
/// Carries the node id plus the inferred dtype and shape; never the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracedValue {
    pub(crate) id: NodeId,
    pub(crate) dtype: DType,
    pub(crate) shape: Shape,
}

impl TracedValue {
    pub(crate) fn new(id: NodeId, dtype: DType, shape: Shape) -> Self {
        Self { id, dtype, shape }
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }
}
