//! IR statements.
//!
//! One closed sum with the core control flow inline and a sub-enum per
//! feature family. Consumers dispatch exhaustively; the code generator
//! routes the family arms through its category handlers in a fixed order.

use super::easing::Easing;
use super::expr::Expr;

/// Compound-assignment operator on a named variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    And,
    Or,
}

impl AssignOp {
    pub fn c_token(self) -> &'static str {
        match self {
            AssignOp::Set => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::And => "&=",
            AssignOp::Or => "|=",
        }
    }
}

/// Joypad buttons with the target SDK's bit layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Button {
    #[inline]
    pub fn mask(self) -> u8 {
        match self {
            Button::Right => 0x01,
            Button::Left => 0x02,
            Button::Up => 0x04,
            Button::Down => 0x08,
            Button::A => 0x10,
            Button::B => 0x20,
            Button::Select => 0x40,
            Button::Start => 0x80,
        }
    }

    /// SDK constant name.
    pub fn c_name(self) -> &'static str {
        match self {
            Button::Right => "J_RIGHT",
            Button::Left => "J_LEFT",
            Button::Up => "J_UP",
            Button::Down => "J_DOWN",
            Button::A => "J_A",
            Button::B => "J_B",
            Button::Select => "J_SELECT",
            Button::Start => "J_START",
        }
    }
}

/// The four hardware sound channels, in register order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Pulse1,
    Pulse2,
    Wave,
    Noise,
}

impl Channel {
    #[inline]
    pub fn index(self) -> u8 {
        match self {
            Channel::Pulse1 => 0,
            Channel::Pulse2 => 1,
            Channel::Wave => 2,
            Channel::Noise => 3,
        }
    }

    pub const ALL: [Channel; 4] = [Channel::Pulse1, Channel::Pulse2, Channel::Wave, Channel::Noise];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WipeDir {
    Left,
    Right,
    Up,
    Down,
}

/// What an animation statement drives: a named sprite's animation state,
/// or the current entry of a pool (the slot bound by the enclosing pool
/// hook or for-each).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AnimTarget {
    Sprite(String),
    Pool(String),
}

/// A* heuristic selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Heuristic {
    Manhattan,
    Chebyshev,
    Euclidean,
}

// ---------------------------------------------------------------------------
// Feature statement families
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum SoundStmt {
    Play { effect: String },
    Stop { channel: Channel },
    Mute { channel: Channel, muted: bool },
    Pan { channel: Channel, left: bool, right: bool },
    /// Master volume 0..100; converted to the 0..7 hardware range.
    MasterVolume(Expr),
    MusicPlay { track: String },
    MusicPause,
    MusicResume,
    MusicStop,
    MusicFade { target: u8, frames: u16 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum MixerStmt {
    SetVolume { group: String, volume: Expr },
    Fade { group: String, target: u8, frames: u16 },
    Mute { group: String, muted: bool },
    ToggleMute { group: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum AnimStmt {
    Play { target: AnimTarget, anim: String },
    Stop { target: AnimTarget },
    Pause { target: AnimTarget },
    Resume { target: AnimTarget },
    /// Playback speed in percent; 100 is authored speed.
    SetSpeed { target: AnimTarget, speed: Expr },
    SetFrame { target: AnimTarget, frame: Expr },
    /// Append to the replay queue drained when the current animation ends.
    Queue { target: AnimTarget, anim: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum MachineStmt {
    Start { machine: String, state: String },
    Goto { machine: String, state: String },
    Update { machine: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum PoolStmt {
    Spawn { pool: String },
    SpawnAt { pool: String, x: Expr, y: Expr },
    /// Spawn if a slot is free; writes 1/0 into `flag`.
    TrySpawn { pool: String, flag: String },
    /// Despawn the entry currently bound by the enclosing hook/for-each.
    Despawn { pool: String },
    DespawnAll { pool: String },
    ForEach { pool: String, body: Vec<Stmt> },
    /// Despawn every entry matching `cond`, visiting back-to-front so the
    /// scan survives in-loop removal.
    DespawnWhere { pool: String, cond: Expr },
    Update { pool: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum CameraStmt {
    SetPosition { x: Expr, y: Expr },
    Follow { sprite: String },
    StopFollow,
    /// Write the scroll registers immediately instead of waiting for the
    /// next camera update.
    Snap,
    SetBounds { x: u16, y: u16, width: u16, height: u16 },
    Shake { intensity: u8, frames: u16 },
    ShakeStop,
    Update,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TransitionStep {
    FadeOut(u16),
    FadeIn(u16),
    Flash { color: u16, frames: u16 },
    Wipe { dir: WipeDir, frames: u16 },
    Iris { open: bool, frames: u16 },
    Wait(u16),
    Shake { intensity: u8, decay: u8, frames: u16 },
    Callback(Vec<Stmt>),
}

/// A composed transition: primitives arranged in sequences and parallels.
#[derive(Clone, Debug, PartialEq)]
pub enum TransitionNode {
    Step(TransitionStep),
    Sequence(Vec<TransitionNode>),
    Parallel(Vec<TransitionNode>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum TransitionStmt {
    /// A single primitive step, optionally changing scene and/or running a
    /// callback when it completes.
    Start {
        step: TransitionStep,
        to_scene: Option<String>,
        on_complete: Option<Vec<Stmt>>,
    },
    /// A composed tree, flattened to a byte stream walked by the runtime
    /// sequencer.
    Composed {
        node: TransitionNode,
        to_scene: Option<String>,
    },
    Cancel,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PaletteStmt {
    Apply { palette: String },
    SetColor { palette: String, index: u8, color: u16 },
    Flash { color: u16, frames: u16 },
    Fade { frames: u16 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum DisplayStmt {
    Clear,
    ShowSprites,
    HideSprites,
    ShowBackground,
    HideBackground,
    PrintAt { x: u8, y: u8, text: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum DialogStmt {
    Show { dialog: String },
    Hide { dialog: String },
    /// Load text into the dialog buffer and restart the typewriter.
    Say { dialog: String, text: String },
    /// Present options; the chosen index lands in `result`.
    Choice {
        dialog: String,
        options: Vec<String>,
        result: String,
    },
    Tick { dialog: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum MenuStmt {
    Show { menu: String },
    Hide { menu: String },
    Toggle { menu: String },
    /// Show, focus, and reset the cursor.
    Open { menu: String },
    Close { menu: String },
    /// Run the menu's cancel hook and close.
    Cancel { menu: String },
    /// Run the hook of the item under the cursor.
    Select { menu: String },
    MoveTo { menu: String, index: Expr },
    Tick { menu: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum SaveStmt {
    Load { slot: u8 },
    Save { slot: u8 },
    Erase { slot: u8 },
    Copy { from: u8, to: u8 },
    FieldWrite { field: String, value: Expr },
    ArrayWrite { field: String, index: Expr, value: Expr },
}

#[derive(Clone, Debug, PartialEq)]
pub enum TweenStmt {
    Start {
        var: String,
        /// Defaults to the variable's current value.
        from: Option<Expr>,
        to: Expr,
        frames: u16,
        easing: Easing,
    },
    Cancel { var: String },
    CancelAll,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PathStmt {
    /// Run A* on a nav grid; tile coordinates.
    Find {
        path: String,
        grid: String,
        from_x: Expr,
        from_y: Expr,
        to_x: Expr,
        to_y: Expr,
        heuristic: Heuristic,
    },
    Advance { path: String },
    /// Step the named position variables one pixel toward the current
    /// waypoint, advancing within a 4-pixel threshold.
    Follow {
        path: String,
        x_var: String,
        y_var: String,
    },
    Reset { path: String },
    GridSetTile {
        grid: String,
        x: Expr,
        y: Expr,
        walkable: bool,
    },
    GridSetWeight {
        grid: String,
        x: Expr,
        y: Expr,
        weight: Expr,
    },
    /// Restore the grid to its authored state.
    GridInit { grid: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum CutsceneStmt {
    Start { cutscene: String },
    Update { cutscene: String },
    Skip { cutscene: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum LinkStmt {
    Init,
    Update,
    Send { value: Expr },
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputStmt {
    Reset { buffer: String },
    Fill { buffer: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum PhysicsStmt {
    /// Apply world gravity to one body described by its variables.
    Apply { y_var: String, vel_y_var: String },
    /// Apply gravity to every registered body.
    WorldUpdate,
    /// Ground the sprite on the other's hitbox when they overlap.
    CollisionResponse { sprite: String, other: String },
}

// ---------------------------------------------------------------------------
// The statement sum
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Assign {
        target: String,
        op: AssignOp,
        value: Expr,
    },
    ArrayAssign {
        array: String,
        index: Expr,
        value: Expr,
    },
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },
    /// Ordered condition branches with an optional fallback.
    When {
        branches: Vec<(Expr, Vec<Stmt>)>,
        otherwise: Option<Vec<Stmt>>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    /// Inclusive counter loop.
    For {
        counter: String,
        start: i64,
        end: i64,
        body: Vec<Stmt>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// Escape hatch: one line of C, emitted verbatim, ignored in simulation.
    Raw(String),
    SceneChange(String),

    Sound(SoundStmt),
    Mixer(MixerStmt),
    Anim(AnimStmt),
    Machine(MachineStmt),
    Pool(PoolStmt),
    Camera(CameraStmt),
    Transition(TransitionStmt),
    Palette(PaletteStmt),
    Display(DisplayStmt),
    Dialog(DialogStmt),
    Menu(MenuStmt),
    Save(SaveStmt),
    Tween(TweenStmt),
    Path(PathStmt),
    Cutscene(CutsceneStmt),
    Link(LinkStmt),
    Input(InputStmt),
    Physics(PhysicsStmt),
}

/// Visit `stmts` and every nested statement list in program order.
/// Transition callbacks (both primitive `on_complete` hooks and `Callback`
/// steps inside composed trees) count as nested lists.
pub fn walk<'a>(stmts: &'a [Stmt], visit: &mut impl FnMut(&'a Stmt)) {
    for stmt in stmts {
        visit(stmt);
        match stmt {
            Stmt::If { then, otherwise, .. } => {
                walk(then, visit);
                walk(otherwise, visit);
            }
            Stmt::When { branches, otherwise } => {
                for (_, body) in branches {
                    walk(body, visit);
                }
                if let Some(body) = otherwise {
                    walk(body, visit);
                }
            }
            Stmt::While { body, .. } | Stmt::For { body, .. } => walk(body, visit),
            Stmt::Pool(PoolStmt::ForEach { body, .. }) => walk(body, visit),
            Stmt::Transition(TransitionStmt::Start { step, on_complete, .. }) => {
                if let TransitionStep::Callback(body) = step {
                    walk(body, visit);
                }
                if let Some(body) = on_complete {
                    walk(body, visit);
                }
            }
            Stmt::Transition(TransitionStmt::Composed { node, .. }) => {
                walk_node(node, visit);
            }
            _ => {}
        }
    }
}

fn walk_node<'a>(node: &'a TransitionNode, visit: &mut impl FnMut(&'a Stmt)) {
    match node {
        TransitionNode::Step(TransitionStep::Callback(body)) => walk(body, visit),
        TransitionNode::Step(_) => {}
        TransitionNode::Sequence(children) | TransitionNode::Parallel(children) => {
            for child in children {
                walk_node(child, visit);
            }
        }
    }
}

/// One flattened step of a composed transition, as the runtime sequencer
/// consumes it. Sequences flatten into their parent; a parallel keeps its
/// children as one step; anything deeper degrades to a no-op.
#[derive(Clone, Debug, PartialEq)]
pub enum FlatStep {
    FadeOut(u16),
    FadeIn(u16),
    Flash { color: u16, frames: u16 },
    Wipe { dir: WipeDir, frames: u16 },
    Iris { open: bool, frames: u16 },
    Wait(u16),
    Shake { intensity: u8, decay: u8, frames: u16 },
    Callback(Vec<Stmt>),
    Parallel(Vec<FlatStep>),
    /// Placeholder for unsupported nesting; encodes as `(0, 0)`.
    Nop,
}

/// Flatten a composed-transition tree into sequencer steps.
pub fn flatten(node: &TransitionNode) -> Vec<FlatStep> {
    match node {
        TransitionNode::Step(step) => vec![flatten_step(step)],
        TransitionNode::Sequence(children) => children.iter().flat_map(flatten).collect(),
        TransitionNode::Parallel(children) => {
            let inner = children
                .iter()
                .map(|child| match child {
                    TransitionNode::Step(step) => flatten_step(step),
                    // Nested sequences inside parallels are not supported.
                    _ => FlatStep::Nop,
                })
                .collect();
            vec![FlatStep::Parallel(inner)]
        }
    }
}

fn flatten_step(step: &TransitionStep) -> FlatStep {
    match step {
        TransitionStep::FadeOut(frames) => FlatStep::FadeOut(*frames),
        TransitionStep::FadeIn(frames) => FlatStep::FadeIn(*frames),
        TransitionStep::Flash { color, frames } => FlatStep::Flash {
            color: *color,
            frames: *frames,
        },
        TransitionStep::Wipe { dir, frames } => FlatStep::Wipe {
            dir: *dir,
            frames: *frames,
        },
        TransitionStep::Iris { open, frames } => FlatStep::Iris {
            open: *open,
            frames: *frames,
        },
        TransitionStep::Wait(frames) => FlatStep::Wait(*frames),
        TransitionStep::Shake {
            intensity,
            decay,
            frames,
        } => FlatStep::Shake {
            intensity: *intensity,
            decay: *decay,
            frames: *frames,
        },
        TransitionStep::Callback(body) => FlatStep::Callback(body.clone()),
    }
}
