//! Host-facing layer: the ambient "current emitter" and the conversion of
//! host values into trace values.
//!
//! Internally emitters are passed around explicitly. The ambient slot only
//! exists so user code can call `add(x, y)` without naming an emitter.

mod canonicalize;

pub use canonicalize::{canonicalize, register_canonicalizer, HostValue};

use crate::config::TraceConfig;
use crate::language::ir::Program;
use crate::language::primitive::Primitive;
use crate::language::types::Type;
use crate::runtime::{
    builder::ProgramBuilder,
    emitter::{Emitter, TraceVal},
    error::IrResult,
    eval::ConcreteEvaluator,
    lowering::LevelLoweringEmitter,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

thread_local! {
    static CURRENT_EMITTERS: RefCell<Vec<Rc<dyn Emitter>>> = RefCell::new(Vec::new());
}

/// The emitter installed when nothing else is: concrete evaluation, behind a
/// lowering layer unless the configuration turns it off.
pub fn top_level_emitter(config: &TraceConfig) -> Rc<dyn Emitter> {
    let evaluator: Rc<dyn Emitter> = Rc::new(ConcreteEvaluator);
    if config.lowering {
        Rc::new(LevelLoweringEmitter::new(evaluator))
    } else {
        evaluator
    }
}

fn ensure_bottom(stack: &mut Vec<Rc<dyn Emitter>>) {
    if stack.is_empty() {
        stack.push(top_level_emitter(&TraceConfig::from_env()));
    }
}

pub fn current_emitter() -> Rc<dyn Emitter> {
    CURRENT_EMITTERS.with(|stack| {
        let mut stack = stack.borrow_mut();
        ensure_bottom(&mut stack);
        match stack.last() {
            Some(emitter) => emitter.clone(),
            None => top_level_emitter(&TraceConfig::default()),
        }
    })
}

/// Keeps an emitter installed as current until dropped.
///
/// Dropping restores whatever was current before, on normal exit, `?`
/// returns and unwinding alike. Scopes nest strictly.
#[must_use = "the emitter is uninstalled as soon as the scope is dropped"]
pub struct EmitterScope {
    depth: usize,
}

pub fn set_current_emitter(emitter: Rc<dyn Emitter>) -> EmitterScope {
    CURRENT_EMITTERS.with(|stack| {
        let mut stack = stack.borrow_mut();
        ensure_bottom(&mut stack);
        stack.push(emitter);
        EmitterScope { depth: stack.len() }
    })
}

impl Drop for EmitterScope {
    fn drop(&mut self) {
        CURRENT_EMITTERS.with(|stack| {
            stack.borrow_mut().truncate(self.depth.saturating_sub(1));
        });
    }
}

/// Runs `f` with `emitter` as the current emitter.
pub fn with_emitter<R>(emitter: Rc<dyn Emitter>, f: impl FnOnce() -> R) -> R {
    let _scope = set_current_emitter(emitter);
    f()
}

/// Number of emitters installed on this thread, the default one included.
pub fn emitter_depth() -> usize {
    CURRENT_EMITTERS.with(|stack| stack.borrow().len())
}

/// Canonicalizes `args`, computes the result type and forwards the
/// application to the current emitter.
pub fn emit_primitive(
    primitive: &Primitive,
    args: &[&dyn HostValue],
    subprograms: &[Arc<Program>],
) -> IrResult<TraceVal> {
    let emitter = current_emitter();
    let args = args
        .iter()
        .map(|arg| canonicalize(*arg))
        .collect::<IrResult<Vec<_>>>()?;
    let arg_types: Vec<Type> = args.iter().map(TraceVal::ty).collect();
    let subprogram_types: Vec<_> = subprograms.iter().map(|sub| sub.ty()).collect();
    let result_ty = primitive.result_type(&subprogram_types, &arg_types)?;
    emitter.emit(primitive, &result_ty, args, subprograms)
}

/// Turns host code that reads the ambient emitter into a stream that takes
/// its emitter explicitly, as `materialize` expects.
pub fn explicit_stream<F, T>(
    f: F,
) -> impl FnOnce(Rc<dyn Emitter>, Vec<TraceVal>) -> IrResult<TraceVal>
where
    F: FnOnce(&[TraceVal]) -> IrResult<T>,
    T: HostValue,
{
    move |emitter, args| {
        let _scope = set_current_emitter(emitter);
        let result = f(args.as_slice())?;
        canonicalize(&result)
    }
}

/// Traces host code into a program with one parameter per entry of
/// `arg_types`.
pub fn trace<F, T>(f: F, arg_types: &[Type]) -> IrResult<Program>
where
    F: FnOnce(&[TraceVal]) -> IrResult<T>,
    T: HostValue,
{
    let builder = Rc::new(ProgramBuilder::new(arg_types));
    let params = builder.param_handles();
    let result = {
        let _scope = set_current_emitter(builder.clone());
        let result = f(params.as_slice())?;
        canonicalize(&result)?
    };
    let program = builder.build(result)?;
    debug!(
        params = program.params.len(),
        equations = program.equations.len(),
        "traced program"
    );
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::add;
    use crate::runtime::builder::materialize;
    use crate::runtime::error::IrError;
    use crate::runtime::value::Value;

    #[test]
    fn default_emitter_evaluates() {
        let result = add(&1.0f32, &2.0f32).unwrap();
        assert_eq!(result, TraceVal::Value(Value::f32(3.0)));
    }

    #[test]
    fn scopes_restore_previous_emitter() {
        let base = emitter_depth().max(1);
        let _ = current_emitter();
        {
            let _outer = set_current_emitter(Rc::new(ConcreteEvaluator));
            assert_eq!(emitter_depth(), base + 1);
            {
                let _inner = set_current_emitter(Rc::new(ProgramBuilder::new(&[])));
                assert_eq!(emitter_depth(), base + 2);
            }
            assert_eq!(emitter_depth(), base + 1);
        }
        assert_eq!(emitter_depth(), base);
    }

    #[test]
    fn scopes_restore_on_error_and_panic() {
        let _ = current_emitter();
        let base = emitter_depth();
        let failed = trace(|_| -> IrResult<TraceVal> { Err(IrError::internal("boom")) }, &[]);
        assert!(failed.is_err());
        assert_eq!(emitter_depth(), base);

        let unwound = std::panic::catch_unwind(|| {
            with_emitter(Rc::new(ConcreteEvaluator), || panic!("inside scope"))
        });
        assert!(unwound.is_err());
        assert_eq!(emitter_depth(), base);
    }

    #[test]
    fn trace_records_through_ambient_builder() {
        let program = trace(|params| add(&params[0], &1.0f32), &[Type::float()]).unwrap();
        assert_eq!(program.params.len(), 1);
        assert_eq!(program.equations.len(), 1);
        assert_eq!(program.ty().result_type, Type::float());
    }

    #[test]
    fn trace_accepts_plain_host_results() {
        let program = trace(|_| Ok(9.0f32), &[]).unwrap();
        assert!(program.equations.is_empty());
        assert_eq!(program.result.ty(), Type::float());
    }

    #[test]
    fn explicit_stream_feeds_materialize() {
        let program = materialize(
            &[Type::float()],
            explicit_stream(|params| add(&params[0], &params[0])),
        )
        .unwrap();
        assert_eq!(program.equations.len(), 1);
    }

    #[test]
    fn type_rules_run_before_emitting() {
        let err = add(&1.0f32, &true).unwrap_err();
        assert!(matches!(err, IrError::TypeMismatch { .. }));
    }
}
