use std::path::PathBuf;

/// Fatal build errors. These short-circuit a build immediately; recoverable
/// problems (unknown references, empty animations) accumulate into the
/// codegen validation report instead.
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("no active recorder; statements can only be emitted inside record()")]
    RecorderMissing,

    #[error("unhandled IR statement: {0}")]
    UnhandledStatement(String),

    #[error("tilemap {name:?}: {reason}")]
    TilemapInvalid { name: String, reason: String },

    #[error("nav grid {name:?}: {reason}")]
    NavGridInvalid { name: String, reason: String },

    #[error("failed to read asset directory {path:?}")]
    AssetDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Semantic errors surfaced by the simulator. The emitted C has no error
/// channel for these; on hardware the behavior is whatever the target does.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("unknown variable {0:?}")]
    UnknownVariable(String),

    #[error("unknown array {0:?}")]
    UnknownArray(String),

    #[error("array index {index} out of bounds for {array:?} (len {len})")]
    IndexOutOfBounds {
        array: String,
        index: i64,
        len: usize,
    },

    #[error("unknown sprite {0:?}")]
    UnknownSprite(String),

    #[error("unknown pool {0:?}")]
    UnknownPool(String),

    #[error("unknown scene {0:?}")]
    UnknownScene(String),

    #[error("unknown state machine {0:?}")]
    UnknownMachine(String),

    #[error("unknown state {state:?} in machine {machine:?}")]
    UnknownState { machine: String, state: String },

    #[error("unknown animation {anim:?} on {target:?}")]
    UnknownAnimation { target: String, anim: String },

    #[error("unknown mixer group {0:?}")]
    UnknownMixerGroup(String),

    #[error("unknown dialog {0:?}")]
    UnknownDialog(String),

    #[error("unknown menu {0:?}")]
    UnknownMenu(String),

    #[error("unknown nav grid {0:?}")]
    UnknownNavGrid(String),

    #[error("unknown cutscene {0:?}")]
    UnknownCutscene(String),

    #[error("unknown path {0:?}")]
    UnknownPath(String),

    #[error("unknown save field {0:?}")]
    UnknownSaveField(String),

    #[error("while loop exceeded {0} iterations")]
    LoopGuard(u32),
}
