//! The demo primitive set: scalar arithmetic, comparison, tuples and a
//! structured conditional.

use crate::embedding::{emit_primitive, trace, HostValue};
use crate::language::ir::Program;
use crate::language::primitive::{expect_arity, CallableOp, IrLevel, Op, Primitive, StructuredOp};
use crate::language::types::{DType, ProgramType, Type};
use crate::runtime::{
    emitter::TraceVal,
    error::{IrError, IrResult},
    eval::ConcreteEvaluator,
    interpreter::apply_program,
    value::{Array, ArrayData, Value},
};
use std::fmt;
use std::sync::Arc;

fn array_arg<'a>(op: &dyn fmt::Display, value: &'a Value) -> IrResult<&'a Array> {
    value.as_array().ok_or_else(|| {
        IrError::type_mismatch(op, format!("expected an array, found a {}", value.type_name()))
    })
}

fn same_array_types(op: &dyn fmt::Display, arg_types: &[Type]) -> IrResult<Type> {
    expect_arity(op, arg_types, 2)?;
    let (x, y) = (&arg_types[0], &arg_types[1]);
    if x != y {
        return Err(IrError::type_mismatch(op, format!("{x} != {y}")));
    }
    match x {
        Type::Array(_) => Ok(x.clone()),
        other => Err(IrError::type_mismatch(op, format!("{other} is not an array type"))),
    }
}

fn numeric_array_type(op: &dyn fmt::Display, ty: &Type) -> IrResult<()> {
    match ty.as_array() {
        Some(array) if array.dtype != DType::Bool => Ok(()),
        _ => Err(IrError::type_mismatch(op, format!("{ty} is not numeric"))),
    }
}

fn expect_values(op: &dyn fmt::Display, args: &[Value], expected: usize) -> IrResult<()> {
    if args.len() != expected {
        return Err(IrError::ArityMismatch {
            name: op.to_string(),
            expected,
            received: args.len(),
        });
    }
    Ok(())
}

fn zip_numeric(
    op: &dyn fmt::Display,
    args: &[Value],
    on_f32: fn(f32, f32) -> f32,
    on_i32: fn(i32, i32) -> i32,
) -> IrResult<Value> {
    expect_values(op, args, 2)?;
    let (x, y) = (array_arg(op, &args[0])?, array_arg(op, &args[1])?);
    if x.data.len() != y.data.len() {
        return Err(IrError::type_mismatch(
            op,
            format!("operands hold {} and {} elements", x.data.len(), y.data.len()),
        ));
    }
    let data = match (&x.data, &y.data) {
        (ArrayData::F32(a), ArrayData::F32(b)) => {
            ArrayData::F32(a.iter().zip(b).map(|(a, b)| on_f32(*a, *b)).collect())
        }
        (ArrayData::I32(a), ArrayData::I32(b)) => {
            ArrayData::I32(a.iter().zip(b).map(|(a, b)| on_i32(*a, *b)).collect())
        }
        _ => {
            return Err(IrError::type_mismatch(
                op,
                format!("unsupported operands {} and {}", x.data.dtype(), y.data.dtype()),
            ))
        }
    };
    Ok(Value::Array(Array::new(x.shape.clone(), data)))
}

macro_rules! binary_arith_op {
    ($name:ident, $display:literal, $f32_op:expr, $i32_op:expr) => {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str($display)
            }
        }

        impl Op for $name {
            fn result_type(&self, arg_types: &[Type]) -> IrResult<Type> {
                let ty = same_array_types(self, arg_types)?;
                numeric_array_type(self, &ty)?;
                Ok(ty)
            }

            fn evaluate(&self, _result_ty: &Type, args: &[Value]) -> IrResult<Value> {
                zip_numeric(self, args, $f32_op, $i32_op)
            }
        }
    };
}

binary_arith_op!(Add, "add", |a, b| a + b, |a, b| a.wrapping_add(b));
binary_arith_op!(Sub, "sub", |a, b| a - b, |a, b| a.wrapping_sub(b));
binary_arith_op!(Mul, "mul", |a, b| a * b, |a, b| a.wrapping_mul(b));

#[derive(Clone, Copy, Debug, Default)]
pub struct Neg;

impl fmt::Display for Neg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("neg")
    }
}

impl Op for Neg {
    fn result_type(&self, arg_types: &[Type]) -> IrResult<Type> {
        expect_arity(self, arg_types, 1)?;
        numeric_array_type(self, &arg_types[0])?;
        Ok(arg_types[0].clone())
    }

    fn evaluate(&self, _result_ty: &Type, args: &[Value]) -> IrResult<Value> {
        expect_values(self, args, 1)?;
        let x = array_arg(self, &args[0])?;
        let data = match &x.data {
            ArrayData::F32(items) => ArrayData::F32(items.iter().map(|v| -v).collect()),
            ArrayData::I32(items) => ArrayData::I32(items.iter().map(|v| v.wrapping_neg()).collect()),
            ArrayData::Bool(_) => return Err(IrError::type_mismatch(self, "cannot negate b1")),
        };
        Ok(Value::Array(Array::new(x.shape.clone(), data)))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Sin;

impl fmt::Display for Sin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("sin")
    }
}

impl Op for Sin {
    fn result_type(&self, arg_types: &[Type]) -> IrResult<Type> {
        expect_arity(self, arg_types, 1)?;
        match arg_types[0].as_array() {
            Some(array) if array.dtype == DType::F32 => Ok(arg_types[0].clone()),
            _ => Err(IrError::type_mismatch(
                self,
                format!("{} is not a float array", arg_types[0]),
            )),
        }
    }

    fn evaluate(&self, _result_ty: &Type, args: &[Value]) -> IrResult<Value> {
        expect_values(self, args, 1)?;
        let x = array_arg(self, &args[0])?;
        match &x.data {
            ArrayData::F32(items) => Ok(Value::Array(Array::new(
                x.shape.clone(),
                ArrayData::F32(items.iter().map(|v| v.sin()).collect()),
            ))),
            other => Err(IrError::type_mismatch(
                self,
                format!("cannot take sin of {}", other.dtype()),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Gt;

impl fmt::Display for Gt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("gt")
    }
}

impl Op for Gt {
    fn result_type(&self, arg_types: &[Type]) -> IrResult<Type> {
        let ty = same_array_types(self, arg_types)?;
        numeric_array_type(self, &ty)?;
        let shape = ty.as_array().map(|a| a.shape.clone()).unwrap_or_default();
        Ok(Type::Array(crate::language::types::ArrayType::new(
            shape,
            DType::Bool,
        )))
    }

    fn evaluate(&self, _result_ty: &Type, args: &[Value]) -> IrResult<Value> {
        expect_values(self, args, 2)?;
        let (x, y) = (array_arg(self, &args[0])?, array_arg(self, &args[1])?);
        let flags = match (&x.data, &y.data) {
            (ArrayData::F32(a), ArrayData::F32(b)) => a.iter().zip(b).map(|(a, b)| a > b).collect(),
            (ArrayData::I32(a), ArrayData::I32(b)) => a.iter().zip(b).map(|(a, b)| a > b).collect(),
            _ => return Err(IrError::type_mismatch(self, "operands must share a numeric dtype")),
        };
        Ok(Value::Array(Array::new(x.shape.clone(), ArrayData::Bool(flags))))
    }
}

/// Reads element `index` of a tuple.
#[derive(Clone, Copy, Debug)]
pub struct ProjectTuple {
    pub index: usize,
}

impl fmt::Display for ProjectTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proj[{}]", self.index)
    }
}

impl Op for ProjectTuple {
    fn result_type(&self, arg_types: &[Type]) -> IrResult<Type> {
        expect_arity(self, arg_types, 1)?;
        let elements = arg_types[0].tuple_elements().ok_or_else(|| {
            IrError::type_mismatch(self, format!("{} is not a tuple", arg_types[0]))
        })?;
        elements.get(self.index).cloned().ok_or_else(|| {
            IrError::type_mismatch(
                self,
                format!("index {} out of range for {}", self.index, arg_types[0]),
            )
        })
    }

    fn evaluate(&self, _result_ty: &Type, args: &[Value]) -> IrResult<Value> {
        expect_values(self, args, 1)?;
        match &args[0] {
            Value::Tuple(items) => items.get(self.index).cloned().ok_or_else(|| {
                IrError::type_mismatch(self, format!("index {} out of range", self.index))
            }),
            other => Err(IrError::type_mismatch(
                self,
                format!("expected a tuple, found a {}", other.type_name()),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ConstructTuple;

impl fmt::Display for ConstructTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("tuple")
    }
}

impl Op for ConstructTuple {
    fn result_type(&self, arg_types: &[Type]) -> IrResult<Type> {
        Ok(Type::Tuple(arg_types.to_vec()))
    }

    fn evaluate(&self, _result_ty: &Type, args: &[Value]) -> IrResult<Value> {
        Ok(Value::Tuple(args.to_vec()))
    }
}

/// Two-way branch over zero-parameter sub-programs. Only the branch picked
/// by the concrete predicate runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cond;

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("cond")
    }
}

impl StructuredOp for Cond {
    fn result_type(&self, subprogram_types: &[ProgramType], arg_types: &[Type]) -> IrResult<Type> {
        expect_arity(self, arg_types, 1)?;
        if subprogram_types.len() != 2 {
            return Err(IrError::ArityMismatch {
                name: "cond branches".into(),
                expected: 2,
                received: subprogram_types.len(),
            });
        }
        if arg_types[0] != Type::bool() {
            return Err(IrError::type_mismatch(
                self,
                format!("predicate must be b1[], found {}", arg_types[0]),
            ));
        }
        let (then_ty, else_ty) = (&subprogram_types[0], &subprogram_types[1]);
        if !then_ty.arg_types.is_empty() || !else_ty.arg_types.is_empty() {
            return Err(IrError::type_mismatch(self, "branches take no parameters"));
        }
        if then_ty.result_type != else_ty.result_type {
            return Err(IrError::type_mismatch(
                self,
                format!(
                    "branch results differ: {} vs {}",
                    then_ty.result_type, else_ty.result_type
                ),
            ));
        }
        Ok(then_ty.result_type.clone())
    }

    fn evaluate(
        &self,
        _result_ty: &Type,
        subprograms: &[Arc<Program>],
        args: &[Value],
    ) -> IrResult<Value> {
        expect_values(self, args, 1)?;
        if subprograms.len() != 2 {
            return Err(IrError::ArityMismatch {
                name: "cond branches".into(),
                expected: 2,
                received: subprograms.len(),
            });
        }
        let predicate = args[0]
            .as_bool()
            .ok_or_else(|| IrError::type_mismatch(self, "predicate is not a b1 scalar"))?;
        let branch = if predicate { &subprograms[0] } else { &subprograms[1] };
        let result = apply_program(&ConcreteEvaluator, branch, Vec::new())?;
        match result {
            TraceVal::Value(value) => Ok(value),
            other => Err(IrError::NotConcrete {
                primitive: self.to_string(),
                found: other.kind().to_string(),
            }),
        }
    }
}

/// Forward-mode differentiation of a program. Declared, not implemented.
#[derive(Clone, Copy, Debug, Default)]
pub struct Jvp;

impl fmt::Display for Jvp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("jvp")
    }
}

impl CallableOp for Jvp {
    fn level(&self) -> IrLevel {
        IrLevel::Frontend
    }
}

pub fn add(x: &dyn HostValue, y: &dyn HostValue) -> IrResult<TraceVal> {
    emit_primitive(&Primitive::op(Add), &[x, y], &[])
}

pub fn sub(x: &dyn HostValue, y: &dyn HostValue) -> IrResult<TraceVal> {
    emit_primitive(&Primitive::op(Sub), &[x, y], &[])
}

pub fn mul(x: &dyn HostValue, y: &dyn HostValue) -> IrResult<TraceVal> {
    emit_primitive(&Primitive::op(Mul), &[x, y], &[])
}

pub fn neg(x: &dyn HostValue) -> IrResult<TraceVal> {
    emit_primitive(&Primitive::op(Neg), &[x], &[])
}

pub fn sin(x: &dyn HostValue) -> IrResult<TraceVal> {
    emit_primitive(&Primitive::op(Sin), &[x], &[])
}

pub fn greater(x: &dyn HostValue, y: &dyn HostValue) -> IrResult<TraceVal> {
    emit_primitive(&Primitive::op(Gt), &[x, y], &[])
}

pub fn project(tuple: &dyn HostValue, index: usize) -> IrResult<TraceVal> {
    emit_primitive(&Primitive::op(ProjectTuple { index }), &[tuple], &[])
}

pub fn make_tuple(items: &[&dyn HostValue]) -> IrResult<TraceVal> {
    emit_primitive(&Primitive::op(ConstructTuple), items, &[])
}

/// Traces both branches and emits a `cond` owning them.
///
/// Branches may use trace values from the surrounding code; the resulting
/// sub-programs then capture them instead of taking parameters.
pub fn cond<T, E, A, B>(predicate: &dyn HostValue, then_fn: T, else_fn: E) -> IrResult<TraceVal>
where
    T: FnOnce() -> IrResult<A>,
    E: FnOnce() -> IrResult<B>,
    A: HostValue,
    B: HostValue,
{
    let then_program = trace(|_| then_fn(), &[])?;
    let else_program = trace(|_| else_fn(), &[])?;
    emit_primitive(
        &Primitive::structured(Cond),
        &[predicate],
        &[Arc::new(then_program), Arc::new(else_program)],
    )
}

pub fn jvp(
    program: Arc<Program>,
    primal: &dyn HostValue,
    tangent: &dyn HostValue,
) -> IrResult<TraceVal> {
    emit_primitive(&Primitive::callable(Jvp), &[primal, tangent], &[program])
}
