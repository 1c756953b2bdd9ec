use crate::language::types::{ArrayType, DType, Type};
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum ArrayData {
    Bool(Vec<bool>),
    I32(Vec<i32>),
    F32(Vec<f32>),
}

impl ArrayData {
    pub fn dtype(&self) -> DType {
        match self {
            ArrayData::Bool(_) => DType::Bool,
            ArrayData::I32(_) => DType::I32,
            ArrayData::F32(_) => DType::F32,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            ArrayData::Bool(items) => items.len(),
            ArrayData::I32(items) => items.len(),
            ArrayData::F32(items) => items.len(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Array {
    pub shape: Vec<usize>,
    pub data: ArrayData,
}

impl Array {
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Self {
        Self { shape, data }
    }

    pub fn scalar_f32(value: f32) -> Self {
        Self::new(Vec::new(), ArrayData::F32(vec![value]))
    }

    pub fn scalar_i32(value: i32) -> Self {
        Self::new(Vec::new(), ArrayData::I32(vec![value]))
    }

    pub fn scalar_bool(value: bool) -> Self {
        Self::new(Vec::new(), ArrayData::Bool(vec![value]))
    }

    pub fn ty(&self) -> ArrayType {
        ArrayType::new(self.shape.clone(), self.data.dtype())
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_items<T: fmt::Debug>(
            f: &mut fmt::Formatter<'_>,
            items: &[T],
            scalar: bool,
        ) -> fmt::Result {
            if scalar {
                if let Some(item) = items.first() {
                    return write!(f, "{item:?}");
                }
            }
            write!(f, "[")?;
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{item:?}")?;
            }
            write!(f, "]")
        }
        let scalar = self.is_scalar();
        match &self.data {
            ArrayData::Bool(items) => write_items(f, items, scalar),
            ArrayData::I32(items) => write_items(f, items, scalar),
            ArrayData::F32(items) => write_items(f, items, scalar),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    None,
    Array(Array),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn f32(value: f32) -> Self {
        Value::Array(Array::scalar_f32(value))
    }

    pub fn i32(value: i32) -> Self {
        Value::Array(Array::scalar_i32(value))
    }

    pub fn bool(value: bool) -> Self {
        Value::Array(Array::scalar_bool(value))
    }

    pub fn ty(&self) -> Type {
        match self {
            Value::None => Type::None,
            Value::Array(array) => Type::Array(array.ty()),
            Value::Tuple(items) => Type::Tuple(items.iter().map(Value::ty).collect()),
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self.as_array()? {
            Array {
                shape,
                data: ArrayData::F32(items),
            } if shape.is_empty() => items.first().copied(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.as_array()? {
            Array {
                shape,
                data: ArrayData::Bool(items),
            } if shape.is_empty() => items.first().copied(),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Array(_) => "array",
            Value::Tuple(_) => "tuple",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Array(array) => write!(f, "{array}"),
            Value::Tuple(values) => {
                write!(f, "(")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_render_like_literals() {
        assert_eq!(Value::f32(3.0).to_string(), "3.0");
        assert_eq!(Value::bool(true).to_string(), "true");
        assert_eq!(Value::i32(7).to_string(), "7");
        assert_eq!(
            Value::Tuple(vec![Value::f32(1.0), Value::f32(2.5)]).to_string(),
            "(1.0, 2.5)"
        );
    }

    #[test]
    fn vectors_render_in_brackets() {
        let array = Array::new(vec![3], ArrayData::I32(vec![1, 2, 3]));
        assert_eq!(Value::Array(array).to_string(), "[1 2 3]");
    }

    #[test]
    fn value_types_follow_contents() {
        assert_eq!(Value::f32(1.0).ty(), Type::float());
        assert_eq!(
            Value::Tuple(vec![Value::f32(1.0), Value::bool(false)]).ty(),
            Type::tuple([Type::float(), Type::bool()])
        );
        assert_eq!(Value::bool(true).as_bool(), Some(true));
        assert_eq!(Value::i32(2).as_f32(), None);
    }
}
