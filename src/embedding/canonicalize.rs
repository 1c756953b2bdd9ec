use crate::runtime::{
    emitter::TraceVal,
    error::{IrError, IrResult},
    value::{Array, ArrayData, Value},
};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// Anything user code may hand to a primitive-emitting helper.
pub trait HostValue: Any {
    fn as_any(&self) -> &dyn Any;
    fn host_type_name(&self) -> &'static str;
}

impl<T: Any> HostValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn host_type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

type Canonicalizer = Arc<dyn Fn(&dyn Any) -> IrResult<TraceVal> + Send + Sync>;

static CANONICALIZERS: OnceLock<RwLock<HashMap<TypeId, Canonicalizer>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<TypeId, Canonicalizer>> {
    CANONICALIZERS.get_or_init(|| RwLock::new(default_canonicalizers()))
}

fn wrap<T: Any>(f: impl Fn(&T) -> IrResult<TraceVal> + Send + Sync + 'static) -> Canonicalizer {
    Arc::new(move |value: &dyn Any| match value.downcast_ref::<T>() {
        Some(value) => f(value),
        None => Err(IrError::internal(format!(
            "canonicalizer for {} received another type",
            type_name::<T>()
        ))),
    })
}

fn default_canonicalizers() -> HashMap<TypeId, Canonicalizer> {
    let mut map: HashMap<TypeId, Canonicalizer> = HashMap::new();
    map.insert(TypeId::of::<f32>(), wrap(|x: &f32| Ok(Value::f32(*x).into())));
    map.insert(
        TypeId::of::<f64>(),
        wrap(|x: &f64| Ok(Value::f32(*x as f32).into())),
    );
    map.insert(TypeId::of::<bool>(), wrap(|x: &bool| Ok(Value::bool(*x).into())));
    map.insert(TypeId::of::<i32>(), wrap(|x: &i32| Ok(Value::i32(*x).into())));
    map.insert(
        TypeId::of::<Array>(),
        wrap(|x: &Array| Ok(Value::Array(x.clone()).into())),
    );
    map.insert(
        TypeId::of::<Vec<f32>>(),
        wrap(|x: &Vec<f32>| {
            Ok(Value::Array(Array::new(vec![x.len()], ArrayData::F32(x.clone()))).into())
        }),
    );
    // Tuples of trace values need the current emitter to build.
    map.insert(
        TypeId::of::<Vec<TraceVal>>(),
        wrap(|items: &Vec<TraceVal>| {
            let args: Vec<&dyn HostValue> = items.iter().map(|item| item as &dyn HostValue).collect();
            crate::ops::make_tuple(&args)
        }),
    );
    map
}

/// Registers (or replaces) the conversion used for host values of type `T`.
pub fn register_canonicalizer<T: Any>(
    f: impl Fn(&T) -> IrResult<TraceVal> + Send + Sync + 'static,
) {
    let mut map = registry().write().unwrap_or_else(|poisoned| poisoned.into_inner());
    map.insert(TypeId::of::<T>(), wrap(f));
}

/// Converts a host value into something an emitter accepts.
pub fn canonicalize(value: &dyn HostValue) -> IrResult<TraceVal> {
    let any = value.as_any();
    if let Some(trace_val) = any.downcast_ref::<TraceVal>() {
        return Ok(trace_val.clone());
    }
    if let Some(concrete) = any.downcast_ref::<Value>() {
        return Ok(TraceVal::Value(concrete.clone()));
    }
    let canonicalizer = {
        let map = registry().read().unwrap_or_else(|poisoned| poisoned.into_inner());
        map.get(&any.type_id()).cloned()
    };
    match canonicalizer {
        Some(f) => f(any),
        None => Err(IrError::UnrecognizedHostType {
            type_name: value.host_type_name().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::types::{ArrayType, DType, Type};

    #[test]
    fn host_scalars_become_values() {
        assert_eq!(canonicalize(&1.5f32).unwrap(), TraceVal::Value(Value::f32(1.5)));
        assert_eq!(canonicalize(&2.0f64).unwrap(), TraceVal::Value(Value::f32(2.0)));
        assert_eq!(canonicalize(&true).unwrap(), TraceVal::Value(Value::bool(true)));
        assert_eq!(canonicalize(&3i32).unwrap(), TraceVal::Value(Value::i32(3)));
        let vector = canonicalize(&vec![1.0f32, 2.0]).unwrap();
        assert_eq!(
            vector.ty(),
            Type::Array(ArrayType::new(vec![2], DType::F32))
        );
    }

    #[test]
    fn canonical_values_pass_through() {
        let value = TraceVal::Value(Value::i32(4));
        assert_eq!(canonicalize(&value).unwrap(), value);
        assert_eq!(
            canonicalize(&Value::bool(false)).unwrap(),
            TraceVal::Value(Value::bool(false))
        );
    }

    #[test]
    fn unknown_host_types_are_named() {
        let err = canonicalize(&"text").unwrap_err();
        match err {
            IrError::UnrecognizedHostType { type_name } => assert!(type_name.contains("str")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn custom_canonicalizers_are_used() {
        struct Celsius(f32);
        register_canonicalizer(|c: &Celsius| Ok(Value::f32(c.0 + 273.15).into()));
        let converted = canonicalize(&Celsius(0.0)).unwrap();
        assert_eq!(converted, TraceVal::Value(Value::f32(273.15)));
    }

    #[test]
    fn trace_value_lists_become_tuples() {
        let items: Vec<TraceVal> = vec![Value::f32(1.0).into(), Value::bool(true).into()];
        assert_eq!(
            canonicalize(&items).unwrap(),
            TraceVal::Value(Value::Tuple(vec![Value::f32(1.0), Value::bool(true)]))
        );

        let program = crate::embedding::trace(
            |params| Ok(vec![params[0].clone(), Value::f32(1.0).into()]),
            &[Type::float()],
        )
        .unwrap();
        assert_eq!(program.equations.len(), 1);
        assert_eq!(program.equations[0].primitive.to_string(), "tuple");
        assert_eq!(
            program.ty().result_type,
            Type::tuple([Type::float(), Type::float()])
        );
        assert_eq!(
            program.to_string(),
            "(v0:f32[]) =>\n  v1:(f32[],f32[]) = tuple(v0:f32[], 1.0)\n  return v1:(f32[],f32[])"
        );
    }
}
