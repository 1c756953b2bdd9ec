use crate::language::ir::Program;
use crate::language::primitive::Primitive;
use crate::language::types::Type;
use crate::runtime::{
    builder::materialize,
    emitter::{Emitter, TraceVal},
    error::{IrError, IrResult},
    interpreter::apply_program,
};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace};

/// Translates frontend-level programs into backend-level ones by wrapping an
/// inner, backend-level emitter.
#[derive(Clone)]
pub struct LevelLoweringEmitter {
    inner: Rc<dyn Emitter>,
}

impl LevelLoweringEmitter {
    pub fn new(inner: Rc<dyn Emitter>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &dyn Emitter {
        self.inner.as_ref()
    }

    pub fn lower_to_rep(&self, value: TraceVal) -> IrResult<TraceVal> {
        match value {
            TraceVal::Lowered(lowered) => Ok(lowered.rep),
            TraceVal::Value(value) => Ok(TraceVal::Value(value)),
            TraceVal::Var(var) => Err(IrError::internal(format!(
                "trace handle {var} reached the lowering emitter without being lifted"
            ))),
        }
    }

    pub fn lift_rep(&self, ty: &Type, rep: TraceVal) -> TraceVal {
        match rep {
            TraceVal::Value(value) => TraceVal::Value(value),
            rep => TraceVal::lowered(ty.clone(), rep),
        }
    }

    pub fn lower_type(&self, ty: &Type) -> Type {
        lower_type(ty)
    }

    pub fn lower_subprogram(&self, program: &Program) -> IrResult<Program> {
        lower_program(program)
    }
}

impl Emitter for LevelLoweringEmitter {
    fn emit(
        &self,
        primitive: &Primitive,
        result_ty: &Type,
        args: Vec<TraceVal>,
        subprograms: &[Arc<Program>],
    ) -> IrResult<TraceVal> {
        if let Some(rule) = primitive.lowering_rule() {
            trace!(%primitive, "applying explicit lowering rule");
            return rule(self, result_ty, &args);
        }
        if primitive.is_callable() {
            return Err(IrError::unimplemented(format!(
                "lowering of callable `{primitive}`"
            )));
        }
        let args_low = args
            .into_iter()
            .map(|arg| self.lower_to_rep(arg))
            .collect::<IrResult<Vec<_>>>()?;
        let subprograms_low = subprograms
            .iter()
            .map(|sub| self.lower_subprogram(sub).map(Arc::new))
            .collect::<IrResult<Vec<_>>>()?;
        let result_ty_low = self.lower_type(result_ty);
        let rep = self
            .inner
            .emit(primitive, &result_ty_low, args_low, &subprograms_low)?;
        Ok(self.lift_rep(result_ty, rep))
    }
}

pub fn lower_program(program: &Program) -> IrResult<Program> {
    debug!(equations = program.equations.len(), "lowering program");
    let high_ty = program.ty();
    let low_arg_types: Vec<Type> = high_ty.arg_types.iter().map(lower_type).collect();
    materialize(&low_arg_types, |emitter, arg_reps| {
        let lowering = LevelLoweringEmitter::new(emitter);
        let args_high = high_ty
            .arg_types
            .iter()
            .zip(arg_reps)
            .map(|(ty, rep)| lowering.lift_rep(ty, rep))
            .collect();
        let result_high = apply_program(&lowering, program, args_high)?;
        lowering.lower_to_rep(result_high)
    })
}

/// `Type` is a closed enum with no per-level variants and no way to attach
/// a lowering rule, so every type passes through unchanged. Values are
/// handled the same way by `lower_to_rep` and `lift_rep`.
fn lower_type(ty: &Type) -> Type {
    ty.clone()
}
