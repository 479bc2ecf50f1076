pub mod analyzer;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod model;
pub mod sim;

pub mod prelude {
    pub use crate::analyzer::{analyze, analyze_dir, AnalyzerOptions, AssetReport};
    pub use crate::codegen::{compile, compile_with, CodegenOptions, CompiledGame};
    pub use crate::error::{BuildError, SimError};
    pub use crate::ir::{
        emit, record, with_scope, AssignOp, BinaryOp, Expr, Stmt, Value, ValueKind,
    };
    pub use crate::model::GameModel;
    pub use crate::sim::Simulator;
}
