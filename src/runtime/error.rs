use miette::Diagnostic;
use thiserror::Error;

pub type IrResult<T> = Result<T, IrError>;

#[derive(Debug, Error, Diagnostic, Clone, PartialEq)]
pub enum IrError {
    #[error("Type mismatch in `{primitive}`: {message}")]
    #[diagnostic(code(trace_ir::type_mismatch))]
    TypeMismatch { primitive: String, message: String },

    #[error("`{name}` expected {expected} arguments but received {received}")]
    #[diagnostic(code(trace_ir::arity))]
    ArityMismatch {
        name: String,
        expected: usize,
        received: usize,
    },

    #[error("`{primitive}` needs concrete arguments, got {found}")]
    #[diagnostic(
        code(trace_ir::not_concrete),
        help("replay the program through a tracing emitter instead of the evaluator")
    )]
    NotConcrete { primitive: String, found: String },

    #[error("No binding for variable `{var}` in any enclosing environment")]
    #[diagnostic(
        code(trace_ir::missing_binding),
        help("this indicates a builder or lowering defect, not a user error")
    )]
    MissingBinding { var: String },

    #[error("Unrecognized host type: {type_name}")]
    #[diagnostic(
        code(trace_ir::host_type),
        help("register a canonicalizer for this type with `register_canonicalizer`")
    )]
    UnrecognizedHostType { type_name: String },

    #[error("Not implemented: {what}")]
    #[diagnostic(code(trace_ir::unimplemented))]
    Unimplemented { what: String },

    #[error("Invalid program: {message}")]
    #[diagnostic(code(trace_ir::invalid_program))]
    InvalidProgram { message: String },

    #[error("Could not parse type `{input}`: {message}")]
    #[diagnostic(code(trace_ir::type_parse))]
    TypeParse { input: String, message: String },

    #[error("Internal error: {message}")]
    #[diagnostic(code(trace_ir::internal))]
    Internal { message: String },
}

impl IrError {
    pub fn type_mismatch(primitive: impl ToString, message: impl Into<String>) -> Self {
        IrError::TypeMismatch {
            primitive: primitive.to_string(),
            message: message.into(),
        }
    }

    pub fn unimplemented(what: impl Into<String>) -> Self {
        IrError::Unimplemented { what: what.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        IrError::Internal {
            message: message.into(),
        }
    }

    /// True for failures that point at a defect in the crate or at an
    /// extension point nobody implemented, as opposed to a bad traced program.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            IrError::MissingBinding { .. }
                | IrError::Unimplemented { .. }
                | IrError::InvalidProgram { .. }
                | IrError::Internal { .. }
        )
    }
}
