use crate::language::ir::{Atom, Program};
use crate::runtime::{
    emitter::{Emitter, TraceVal},
    environment::Environment,
    error::{IrError, IrResult},
};
use tracing::trace;

pub fn apply_program(
    emitter: &dyn Emitter,
    program: &Program,
    args: Vec<TraceVal>,
) -> IrResult<TraceVal> {
    if args.len() != program.params.len() {
        return Err(IrError::ArityMismatch {
            name: "program".into(),
            expected: program.params.len(),
            received: args.len(),
        });
    }
    let env = Environment::push_scope();
    for (param, arg) in program.params.iter().zip(args) {
        env.declare(param, arg);
    }
    for eqn in &program.equations {
        let args = eqn
            .args
            .iter()
            .map(|atom| interpret_atom(&env, atom))
            .collect::<IrResult<Vec<_>>>()?;
        trace!(primitive = %eqn.primitive, binder = %eqn.binder, "replaying equation");
        let result = emitter.emit(&eqn.primitive, eqn.binder.ty(), args, &eqn.subprograms)?;
        env.declare(&eqn.binder, result);
    }
    interpret_atom(&env, &program.result)
}

fn interpret_atom(env: &Environment, atom: &Atom) -> IrResult<TraceVal> {
    match atom {
        Atom::Var(var) => env.get(var),
        Atom::Value(value) => Ok(TraceVal::Value(value.clone())),
    }
}
