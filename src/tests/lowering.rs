use crate::embedding::{emit_primitive, trace, HostValue};
use crate::language::ir::Program;
use crate::language::primitive::{expect_arity, IrLevel, LoweringRule, Op, Primitive};
use crate::language::types::Type;
use crate::ops::{add, cond, greater, jvp, mul, sin, Mul};
use crate::runtime::{
    apply_program, emitter::TraceVal, error::IrError, error::IrResult, lower_program,
    value::Value, ConcreteEvaluator, Emitter, LevelLoweringEmitter,
};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Frontend-only `x * x`, lowered to a backend `mul`.
struct Square {
    rule: Option<LoweringRule>,
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("square")
    }
}

impl Op for Square {
    fn result_type(&self, arg_types: &[Type]) -> IrResult<Type> {
        expect_arity(self, arg_types, 1)?;
        Ok(arg_types[0].clone())
    }

    fn evaluate(&self, result_ty: &Type, args: &[Value]) -> IrResult<Value> {
        Primitive::op(Mul).evaluate(result_ty, &[], &[args[0].clone(), args[0].clone()])
    }

    fn level(&self) -> IrLevel {
        IrLevel::Frontend
    }

    fn lowering_rule(&self) -> Option<LoweringRule> {
        self.rule
    }
}

fn lower_square(
    lowering: &LevelLoweringEmitter,
    result_ty: &Type,
    args: &[TraceVal],
) -> IrResult<TraceVal> {
    let rep = lowering.lower_to_rep(args[0].clone())?;
    let out = lowering.inner().emit(
        &Primitive::op(Mul),
        &lowering.lower_type(result_ty),
        vec![rep.clone(), rep],
        &[],
    )?;
    Ok(lowering.lift_rep(result_ty, out))
}

fn square(x: &dyn HostValue) -> IrResult<TraceVal> {
    emit_primitive(&Primitive::op(Square { rule: Some(lower_square) }), &[x], &[])
}

fn run(program: &Program, args: &[f32]) -> Value {
    let args = args.iter().map(|x| Value::f32(*x).into()).collect();
    apply_program(&ConcreteEvaluator, program, args)
        .unwrap()
        .into_value()
        .unwrap()
}

#[test]
fn backend_programs_lower_to_the_same_shape() {
    let program = trace(
        |params| {
            let x = add(&params[0], &1.0f32)?;
            let p = greater(&x, &1.0f32)?;
            cond(&p, || add(&x, &sin(&1.0f32)?), || Ok(1.0f32))
        },
        &[Type::float()],
    )
    .unwrap();
    assert_eq!(program.level(), IrLevel::Backend);

    let lowered = lower_program(&program).unwrap();
    assert!(lowered.validate(&HashSet::new()).is_ok());
    assert_eq!(lowered.level(), IrLevel::Backend);
    assert_eq!(lowered.ty(), program.ty());
    assert_eq!(lowered.to_string(), program.to_string());
    for x in [0.5, -3.0, 4.0] {
        assert_eq!(run(&lowered, &[x]), run(&program, &[x]));
    }
}

#[test]
fn explicit_rules_replace_frontend_primitives() {
    let program = trace(
        |params| add(&square(&params[0])?, &1.0f32),
        &[Type::float()],
    )
    .unwrap();
    assert_eq!(program.level(), IrLevel::Frontend);

    let lowered = lower_program(&program).unwrap();
    assert_eq!(lowered.level(), IrLevel::Backend);
    assert_eq!(
        lowered.to_string(),
        "(v0:f32[]) =>\n  v1:f32[] = mul(v0:f32[], v0:f32[])\n  v2:f32[] = add(v1:f32[], 1.0)\n  return v2:f32[]"
    );
    for x in [0.0, 3.0, -1.5] {
        assert_eq!(run(&lowered, &[x]), Value::f32(x * x + 1.0));
        assert_eq!(run(&lowered, &[x]), run(&program, &[x]));
    }
}

#[test]
fn rules_apply_when_evaluating_through_the_lowering_emitter() {
    let lowering = LevelLoweringEmitter::new(Rc::new(ConcreteEvaluator));
    let program = trace(|params| square(&params[0]), &[Type::float()]).unwrap();
    let result = apply_program(&lowering, &program, vec![Value::f32(3.0).into()]).unwrap();
    assert_eq!(result, TraceVal::Value(Value::f32(9.0)));
}

#[test]
fn primitives_without_rules_pass_through() {
    let unruled = || Primitive::op(Square { rule: None });
    let program = trace(
        |params| emit_primitive(&unruled(), &[&params[0]], &[]),
        &[Type::float()],
    )
    .unwrap();
    let lowered = lower_program(&program).unwrap();
    assert_eq!(lowered.equations.len(), 1);
    assert_eq!(lowered.equations[0].primitive.to_string(), "square");
    assert_eq!(lowered.to_string(), program.to_string());
    assert_eq!(run(&lowered, &[3.0]), Value::f32(9.0));

    let eager = emit_primitive(&unruled(), &[&3.0f32], &[]).unwrap();
    assert_eq!(eager, TraceVal::Value(Value::f32(9.0)));
}

#[test]
fn callables_cannot_lower() {
    let body = Arc::new(trace(|params| sin(&params[0]), &[Type::float()]).unwrap());
    let program = trace(
        |params| jvp(body, &params[0], &1.0f32),
        &[Type::float()],
    )
    .unwrap();
    assert_eq!(program.equations[0].primitive.to_string(), "jvp");
    assert_eq!(program.level(), IrLevel::Frontend);
    let err = lower_program(&program).unwrap_err();
    assert!(matches!(err, IrError::Unimplemented { .. }));
}

#[test]
fn trace_handles_never_reach_the_lowering_emitter() {
    let lowering = LevelLoweringEmitter::new(Rc::new(ConcreteEvaluator));
    let stray = TraceVal::Var(crate::Var::fresh(Type::float()));
    let err = lowering
        .emit(&Primitive::op(Mul), &Type::float(), vec![stray.clone(), stray], &[])
        .unwrap_err();
    assert!(err.is_internal());
}

#[test]
fn nested_branches_lower_with_their_captures() {
    let program = trace(
        |params| {
            let x = mul(&params[0], &2.0f32)?;
            let outer = greater(&x, &0.0f32)?;
            cond(
                &outer,
                || {
                    let inner = greater(&x, &10.0f32)?;
                    cond(&inner, || add(&x, &x), || add(&x, &1.0f32))
                },
                || Ok(0.0f32),
            )
        },
        &[Type::float()],
    )
    .unwrap();

    let lowered = lower_program(&program).unwrap();
    assert!(lowered.validate(&HashSet::new()).is_ok());
    let inner_branch = &lowered.equations[2].subprograms[0].equations[1].subprograms[0];
    assert_eq!(inner_branch.free_vars(), vec![lowered.equations[0].binder.clone()]);
    assert_eq!(lowered.to_string(), program.to_string());
    for x in [10.0, 1.0, -1.0] {
        assert_eq!(run(&lowered, &[x]), run(&program, &[x]));
    }
}
