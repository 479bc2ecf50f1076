use crate::ir::{Expr, Stmt};

/// One game scene with its lifecycle hooks.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub name: String,
    pub on_enter: Vec<Stmt>,
    pub on_frame: Vec<Stmt>,
    pub on_exit: Vec<Stmt>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A finite state machine updated by IR `Machine` statements.
#[derive(Clone, Debug)]
pub struct StateMachine {
    pub name: String,
    /// Declaration order fixes the state constants.
    pub states: Vec<MachineState>,
}

impl StateMachine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
        }
    }

    pub fn state_index(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s.name == name)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MachineState {
    pub name: String,
    pub on_enter: Vec<Stmt>,
    pub on_tick: Vec<Stmt>,
    pub on_exit: Vec<Stmt>,
    /// Animation auto-played on entry.
    pub animation: Option<BoundAnim>,
    /// Checked in declaration order each tick; first hit wins.
    pub transitions: Vec<StateTransition>,
}

impl MachineState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct BoundAnim {
    pub sprite: String,
    pub anim: String,
    /// Gate outgoing transitions until the animation has completed.
    pub lock_until_complete: bool,
}

#[derive(Clone, Debug)]
pub struct StateTransition {
    pub cond: Expr,
    pub to: String,
    pub action: Vec<Stmt>,
}

/// A timed script: each step runs its statements, then waits.
#[derive(Clone, Debug)]
pub struct Cutscene {
    pub name: String,
    pub steps: Vec<CutsceneStep>,
    pub on_skip: Vec<Stmt>,
}

impl Cutscene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            on_skip: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CutsceneStep {
    /// Frames to hold after the step body runs.
    pub frames: u16,
    pub body: Vec<Stmt>,
}
