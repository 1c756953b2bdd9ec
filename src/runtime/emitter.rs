use crate::language::ir::{Program, Var};
use crate::language::primitive::Primitive;
use crate::language::types::Type;
use crate::runtime::error::IrResult;
use crate::runtime::value::Value;
use std::fmt;
use std::sync::Arc;

pub trait Emitter {
    fn emit(
        &self,
        primitive: &Primitive,
        result_ty: &Type,
        args: Vec<TraceVal>,
        subprograms: &[Arc<Program>],
    ) -> IrResult<TraceVal>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum TraceVal {
    Value(Value),
    Var(Var),
    /// A value one IR level up that is represented by `rep` one level down.
    Lowered(Box<LoweredVal>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoweredVal {
    pub ty: Type,
    pub rep: TraceVal,
}

impl TraceVal {
    pub fn lowered(ty: Type, rep: TraceVal) -> Self {
        TraceVal::Lowered(Box::new(LoweredVal { ty, rep }))
    }

    pub fn ty(&self) -> Type {
        match self {
            TraceVal::Value(value) => value.ty(),
            TraceVal::Var(var) => var.ty().clone(),
            TraceVal::Lowered(lowered) => lowered.ty.clone(),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            TraceVal::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            TraceVal::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TraceVal::Value(_) => "value",
            TraceVal::Var(_) => "trace handle",
            TraceVal::Lowered(_) => "lowered value",
        }
    }
}

impl From<Value> for TraceVal {
    fn from(value: Value) -> Self {
        TraceVal::Value(value)
    }
}

impl From<Var> for TraceVal {
    fn from(var: Var) -> Self {
        TraceVal::Var(var)
    }
}

impl fmt::Display for TraceVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceVal::Value(value) => write!(f, "{value}"),
            TraceVal::Var(var) => write!(f, "{var}"),
            TraceVal::Lowered(lowered) => write!(f, "lowered({}: {})", lowered.rep, lowered.ty),
        }
    }
}
