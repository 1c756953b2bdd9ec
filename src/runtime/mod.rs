pub mod builder;
pub mod emitter;
pub mod environment;
pub mod error;
pub mod eval;
pub mod interpreter;
pub mod lowering;
pub mod value;

pub use builder::{materialize, ProgramBuilder};
pub use emitter::{Emitter, TraceVal};
pub use eval::ConcreteEvaluator;
pub use interpreter::apply_program;
pub use lowering::{lower_program, LevelLoweringEmitter};
