use crate::language::ir::Program;
use crate::language::types::{ProgramType, Type};
use crate::runtime::{
    emitter::TraceVal,
    error::{IrError, IrResult},
    lowering::LevelLoweringEmitter,
    value::Value,
};
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IrLevel {
    Backend = 1,
    Frontend = 2,
}

/// Rewrites one application of a frontend primitive in terms of the
/// lowering emitter's inner emitter.
pub type LoweringRule =
    fn(lowering: &LevelLoweringEmitter, result_ty: &Type, args: &[TraceVal]) -> IrResult<TraceVal>;

pub trait Op: fmt::Display + Send + Sync {
    fn result_type(&self, arg_types: &[Type]) -> IrResult<Type>;

    fn evaluate(&self, result_ty: &Type, args: &[Value]) -> IrResult<Value>;

    fn level(&self) -> IrLevel {
        IrLevel::Backend
    }

    fn lowering_rule(&self) -> Option<LoweringRule> {
        None
    }

    fn jvp(&self, _primals: &[TraceVal], _tangents: &[TraceVal]) -> IrResult<(TraceVal, TraceVal)> {
        Err(IrError::unimplemented(format!("jvp rule for `{self}`")))
    }
}

pub trait StructuredOp: fmt::Display + Send + Sync {
    fn result_type(&self, subprogram_types: &[ProgramType], arg_types: &[Type]) -> IrResult<Type>;

    fn evaluate(
        &self,
        result_ty: &Type,
        subprograms: &[Arc<Program>],
        args: &[Value],
    ) -> IrResult<Value>;

    fn level(&self) -> IrLevel {
        IrLevel::Backend
    }

    fn lowering_rule(&self) -> Option<LoweringRule> {
        None
    }

    fn jvp(
        &self,
        _subprograms: &[Arc<Program>],
        _primals: &[TraceVal],
        _tangents: &[TraceVal],
    ) -> IrResult<(TraceVal, TraceVal)> {
        Err(IrError::unimplemented(format!("jvp rule for `{self}`")))
    }
}

/// Opaque multi-step operation. Nothing in the core can evaluate, lower or
/// differentiate one yet.
pub trait CallableOp: fmt::Display + Send + Sync {
    fn level(&self) -> IrLevel {
        IrLevel::Frontend
    }

    fn evaluate(&self, _args: &[Value]) -> IrResult<Value> {
        Err(IrError::unimplemented(format!("evaluation of callable `{self}`")))
    }
}

#[derive(Clone)]
pub enum Primitive {
    Op(Arc<dyn Op>),
    Structured(Arc<dyn StructuredOp>),
    Callable(Arc<dyn CallableOp>),
}

impl Primitive {
    pub fn op(op: impl Op + 'static) -> Self {
        Primitive::Op(Arc::new(op))
    }

    pub fn structured(op: impl StructuredOp + 'static) -> Self {
        Primitive::Structured(Arc::new(op))
    }

    pub fn callable(op: impl CallableOp + 'static) -> Self {
        Primitive::Callable(Arc::new(op))
    }

    pub fn level(&self) -> IrLevel {
        match self {
            Primitive::Op(op) => op.level(),
            Primitive::Structured(op) => op.level(),
            Primitive::Callable(op) => op.level(),
        }
    }

    pub fn lowering_rule(&self) -> Option<LoweringRule> {
        match self {
            Primitive::Op(op) => op.lowering_rule(),
            Primitive::Structured(op) => op.lowering_rule(),
            Primitive::Callable(_) => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Primitive::Callable(_))
    }

    /// Result type of an application. Callable primitives defer theirs, so
    /// they report `Type::None`.
    pub fn result_type(
        &self,
        subprogram_types: &[ProgramType],
        arg_types: &[Type],
    ) -> IrResult<Type> {
        match self {
            Primitive::Op(op) => {
                if !subprogram_types.is_empty() {
                    return Err(IrError::type_mismatch(
                        op,
                        "leaf operations do not take sub-programs",
                    ));
                }
                op.result_type(arg_types)
            }
            Primitive::Structured(op) => op.result_type(subprogram_types, arg_types),
            Primitive::Callable(_) => Ok(Type::None),
        }
    }

    pub fn evaluate(
        &self,
        result_ty: &Type,
        subprograms: &[Arc<Program>],
        args: &[Value],
    ) -> IrResult<Value> {
        match self {
            Primitive::Op(op) => op.evaluate(result_ty, args),
            Primitive::Structured(op) => op.evaluate(result_ty, subprograms, args),
            Primitive::Callable(op) => op.evaluate(args),
        }
    }

    pub fn jvp(
        &self,
        subprograms: &[Arc<Program>],
        primals: &[TraceVal],
        tangents: &[TraceVal],
    ) -> IrResult<(TraceVal, TraceVal)> {
        match self {
            Primitive::Op(op) => op.jvp(primals, tangents),
            Primitive::Structured(op) => op.jvp(subprograms, primals, tangents),
            Primitive::Callable(op) => Err(IrError::unimplemented(format!(
                "jvp rule for callable `{op}`"
            ))),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Op(op) => write!(f, "{op}"),
            Primitive::Structured(op) => write!(f, "{op}"),
            Primitive::Callable(op) => write!(f, "{op}"),
        }
    }
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Primitive::Op(_) => "Op",
            Primitive::Structured(_) => "Structured",
            Primitive::Callable(_) => "Callable",
        };
        write!(f, "{kind}({self})")
    }
}

pub fn expect_arity(name: impl fmt::Display, arg_types: &[Type], expected: usize) -> IrResult<()> {
    if arg_types.len() != expected {
        return Err(IrError::ArityMismatch {
            name: name.to_string(),
            expected,
            received: arg_types.len(),
        });
    }
    Ok(())
}
