//! Mutable state bags backing a simulation run. One set is built fresh
//! from the game model per run; nothing persists across runs.

use indexmap::IndexMap;

use crate::ir::{FlatStep, Stmt, Value};

/// Sprite animation state, mirroring the emitted `_<sprite>_*` variables.
#[derive(Clone, Debug, Default)]
pub struct AnimState {
    /// Index into the sprite's animation map; `None` mirrors `ANIM_NONE`.
    pub anim: Option<usize>,
    pub frame: usize,
    pub timer: i64,
    pub speed: i64,
    pub flags: u8,
    pub queue: Vec<usize>,
}

impl AnimState {
    pub fn new() -> Self {
        Self {
            speed: 100,
            ..Default::default()
        }
    }
}

pub const FLAG_LOOPING: u8 = 0x01;
pub const FLAG_PAUSED: u8 = 0x02;
pub const FLAG_REVERSED: u8 = 0x04;
pub const FLAG_COMPLETE: u8 = 0x08;

/// State machine runtime state: 255-style "no state" is `None`.
#[derive(Clone, Debug, Default)]
pub struct MachineSim {
    pub state: Option<usize>,
    pub next: Option<usize>,
    pub changed: bool,
}

#[derive(Clone, Debug)]
pub struct TweenSlot {
    pub active: bool,
    pub var: String,
    pub from: i64,
    pub to: i64,
    pub timer: i64,
    pub duration: i64,
    pub table: [u8; 256],
}

impl Default for TweenSlot {
    fn default() -> Self {
        Self {
            active: false,
            var: String::new(),
            from: 0,
            to: 0,
            timer: 0,
            duration: 0,
            table: [0; 256],
        }
    }
}

impl TweenSlot {
    pub fn idle() -> Self {
        Self {
            table: [0; 256],
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DialogState {
    pub active: bool,
    pub text: String,
    pub pos: usize,
    pub timer: i64,
    pub choosing: bool,
    pub choice: usize,
    pub choice_count: usize,
    pub choice_result: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct MenuState {
    pub open: bool,
    pub cursor: usize,
}

#[derive(Clone, Debug, Default)]
pub struct CutsceneState {
    pub active: bool,
    pub timer: i64,
    pub step: usize,
}

#[derive(Clone, Debug, Default)]
pub struct MixerGroupState {
    pub volume: i64,
    pub muted: bool,
    pub priority: i64,
    pub fade_active: bool,
    pub fade_start: i64,
    pub fade_target: i64,
    pub fade_timer: i64,
    pub fade_duration: i64,
}

#[derive(Clone, Debug, Default)]
pub struct PathState {
    pub found: bool,
    pub waypoints: Vec<(u8, u8)>,
    pub step: usize,
}

/// The single-slot primitive transition plus the sequencer.
#[derive(Clone, Debug, Default)]
pub struct TransitionSim {
    pub active: bool,
    pub timer: i64,
    pub duration: i64,
    pub callback: Option<Vec<Stmt>>,
    pub target_scene: Option<String>,
    pub seq: Option<SeqSim>,
}

#[derive(Clone, Debug)]
pub struct SeqSim {
    pub steps: Vec<FlatStep>,
    pub step: usize,
    pub wait: i64,
}

/// One in-memory save slot: scalar fields plus array fields.
#[derive(Clone, Debug, Default)]
pub struct SaveSnapshot {
    pub fields: IndexMap<String, Value>,
    pub arrays: IndexMap<String, Vec<Value>>,
}
