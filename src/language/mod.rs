pub mod ir;
pub mod parser;
pub mod primitive;
pub mod types;
