#![allow(clippy::collapsible_if)]

pub mod config;
pub mod diagnostics;
pub mod embedding;
pub mod formatter;
pub mod language;
pub mod logging;
pub mod ops;
pub mod runtime;

pub use embedding::trace;
pub use language::ir::{Atom, Equation, Program, Var};
pub use language::primitive::{IrLevel, Primitive};
pub use language::types::{DType, Type};
pub use runtime::error::{IrError, IrResult};
pub use runtime::value::Value;

#[cfg(test)]
mod tests;
