use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    I32,
    F32,
}

impl DType {
    pub fn short_name(self) -> &'static str {
        match self {
            DType::Bool => "b1",
            DType::I32 => "i32",
            DType::F32 => "f32",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArrayType {
    pub shape: Vec<usize>,
    pub dtype: DType,
}

impl ArrayType {
    pub fn new(shape: Vec<usize>, dtype: DType) -> Self {
        Self { shape, dtype }
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    None,
    Array(ArrayType),
    Tuple(Vec<Type>),
}

impl Type {
    pub fn scalar(dtype: DType) -> Self {
        Type::Array(ArrayType::new(Vec::new(), dtype))
    }

    pub fn bool() -> Self {
        Self::scalar(DType::Bool)
    }

    pub fn int() -> Self {
        Self::scalar(DType::I32)
    }

    pub fn float() -> Self {
        Self::scalar(DType::F32)
    }

    pub fn tuple(elements: impl IntoIterator<Item = Type>) -> Self {
        Type::Tuple(elements.into_iter().collect())
    }

    pub fn as_array(&self) -> Option<&ArrayType> {
        match self {
            Type::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn tuple_elements(&self) -> Option<&[Type]> {
        match self {
            Type::Tuple(elements) => Some(elements),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::None => write!(f, "None"),
            Type::Array(array) => {
                write!(f, "{}[", array.dtype)?;
                for (idx, dim) in array.shape.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{dim}")?;
                }
                write!(f, "]")
            }
            Type::Tuple(elements) => {
                write!(f, "(")?;
                for (idx, ty) in elements.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{ty}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProgramType {
    pub arg_types: Vec<Type>,
    pub result_type: Type,
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.arg_types.iter().map(|ty| ty.to_string()).collect();
        write!(f, "({}) -> {}", rendered.join(", "), self.result_type)
    }
}
