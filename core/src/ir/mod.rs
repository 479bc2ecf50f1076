pub mod easing;
pub mod expr;
pub mod record;
pub mod stmt;
pub mod value;

pub use easing::Easing;
pub use expr::{BinaryOp, DomainExpr, Expr, UnaryOp};
pub use record::{current_scope, depth, emit, record, require, with_scope, Recorder};
pub use stmt::{
    flatten, walk, AnimStmt, AnimTarget, AssignOp, Button, CameraStmt, Channel, CutsceneStmt,
    DialogStmt, DisplayStmt, FlatStep, Heuristic, InputStmt, LinkStmt, MachineStmt, MenuStmt,
    MixerStmt, PaletteStmt, PathStmt, PhysicsStmt, PoolStmt, SaveStmt, SoundStmt, Stmt,
    TransitionNode, TransitionStep, TransitionStmt, TweenStmt, WipeDir,
};
pub use value::{Value, ValueKind};
