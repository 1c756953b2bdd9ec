use crate::language::ir::Program;
use crate::language::primitive::Primitive;
use crate::language::types::Type;
use crate::runtime::{
    emitter::{Emitter, TraceVal},
    error::{IrError, IrResult},
};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Default)]
pub struct ConcreteEvaluator;

impl Emitter for ConcreteEvaluator {
    fn emit(
        &self,
        primitive: &Primitive,
        result_ty: &Type,
        args: Vec<TraceVal>,
        subprograms: &[Arc<Program>],
    ) -> IrResult<TraceVal> {
        let values = args
            .into_iter()
            .map(|arg| match arg {
                TraceVal::Value(value) => Ok(value),
                other => Err(IrError::NotConcrete {
                    primitive: primitive.to_string(),
                    found: other.kind().to_string(),
                }),
            })
            .collect::<IrResult<Vec<_>>>()?;
        primitive
            .evaluate(result_ty, subprograms, &values)
            .map(TraceVal::Value)
    }
}
