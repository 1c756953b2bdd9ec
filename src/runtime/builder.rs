use crate::language::ir::{Atom, Equation, Program, Var};
use crate::language::primitive::Primitive;
use crate::language::types::Type;
use crate::runtime::{
    emitter::{Emitter, TraceVal},
    environment::is_bound_in_replay,
    error::{IrError, IrResult},
    interpreter::apply_program,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

pub struct ProgramBuilder {
    params: Vec<Var>,
    equations: RefCell<Vec<Equation>>,
}

impl ProgramBuilder {
    pub fn new(arg_types: &[Type]) -> Self {
        Self {
            params: arg_types.iter().cloned().map(Var::fresh).collect(),
            equations: RefCell::new(Vec::new()),
        }
    }

    pub fn param_handles(&self) -> Vec<TraceVal> {
        self.params.iter().cloned().map(TraceVal::Var).collect()
    }

    pub fn len(&self) -> usize {
        self.equations.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn build(&self, result: TraceVal) -> IrResult<Program> {
        let result = to_atom(result)?;
        let equations = self.equations.take();
        Ok(Program::new(self.params.clone(), equations, result))
    }
}

fn to_atom(arg: TraceVal) -> IrResult<Atom> {
    match arg {
        TraceVal::Var(var) => Ok(Atom::Var(var)),
        TraceVal::Value(value) => Ok(Atom::Value(value)),
        TraceVal::Lowered(lowered) => Err(IrError::internal(format!(
            "a lowered value of type {} reached a program builder",
            lowered.ty
        ))),
    }
}

/// A sub-program that captures variables bound by a replay in progress is
/// re-traced so its captures point at the handles that replay produced.
fn rebind_captures(subprogram: &Arc<Program>) -> IrResult<Arc<Program>> {
    let captured = subprogram.free_vars();
    if !captured.iter().any(is_bound_in_replay) {
        return Ok(subprogram.clone());
    }
    debug!(captures = captured.len(), "re-tracing sub-program with captures");
    let arg_types = subprogram.ty().arg_types;
    let program = materialize(&arg_types, |emitter, params| {
        apply_program(emitter.as_ref(), subprogram, params)
    })?;
    Ok(Arc::new(program))
}

impl Emitter for ProgramBuilder {
    fn emit(
        &self,
        primitive: &Primitive,
        result_ty: &Type,
        args: Vec<TraceVal>,
        subprograms: &[Arc<Program>],
    ) -> IrResult<TraceVal> {
        let args = args.into_iter().map(to_atom).collect::<IrResult<Vec<_>>>()?;
        let subprograms = subprograms
            .iter()
            .map(rebind_captures)
            .collect::<IrResult<Vec<_>>>()?;
        let binder = Var::fresh(result_ty.clone());
        self.equations.borrow_mut().push(Equation {
            binder: binder.clone(),
            primitive: primitive.clone(),
            args,
            subprograms,
        });
        Ok(TraceVal::Var(binder))
    }
}

/// Builds a program by running `stream` against a fresh builder.
pub fn materialize<F>(arg_types: &[Type], stream: F) -> IrResult<Program>
where
    F: FnOnce(Rc<dyn Emitter>, Vec<TraceVal>) -> IrResult<TraceVal>,
{
    let builder = Rc::new(ProgramBuilder::new(arg_types));
    let params = builder.param_handles();
    let result = stream(builder.clone(), params)?;
    let program = builder.build(result)?;
    debug!(
        params = program.params.len(),
        equations = program.equations.len(),
        "materialized program"
    );
    Ok(program)
}
