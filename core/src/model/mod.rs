//! The frozen game model: a normalized description of everything the
//! builders declared, consumed read-only by the code generator and the
//! simulator. IR statement lists hang off the lifecycle slots they were
//! recorded for and are immutable once the model is built.

pub mod audio;
pub mod interact;
pub mod pool;
pub mod scene;
pub mod sprite;
pub mod video;

use indexmap::IndexMap;

use crate::ir::{Stmt, ValueKind};

pub use audio::{AudioMixer, MixerGroup, MusicTrack, SoundEffect};
pub use interact::{
    Dialog, InputBuffer, Menu, MenuItem, PhysicsBody, PhysicsWorld, SaveField, SaveSchema,
};
pub use pool::{Pool, PoolField};
pub use scene::{
    BoundAnim, Cutscene, CutsceneStep, MachineState, Scene, StateMachine, StateTransition,
};
pub use sprite::{Animation, Hitbox, OwnedPosition, Sprite, SpritePalette};
pub use video::{CameraDef, NavGrid, Palette, PaletteKind, TileAsset, Tilemap};

/// Default dialog text buffer size in bytes.
pub const DIALOG_BUFFER_SIZE: usize = 80;

/// Nav grids are capped at 32x32 cells.
pub const NAV_GRID_MAX: u8 = 32;

/// A user variable with its declared kind and initial value.
#[derive(Clone, Debug)]
pub struct Variable {
    pub name: String,
    pub kind: ValueKind,
    pub initial: i64,
}

impl Variable {
    pub fn new(name: impl Into<String>, kind: ValueKind, initial: i64) -> Self {
        Self {
            name: name.into(),
            kind,
            initial,
        }
    }
}

/// Everything a game declares. Insertion order is definition order and
/// fixes emitted constants, so every collection is an ordered map.
#[derive(Clone, Debug, Default)]
pub struct GameModel {
    pub name: String,
    /// Color-hardware support; palette and sprite-prop features are elided
    /// without it.
    pub gbc: bool,
    pub start_scene: String,
    pub variables: IndexMap<String, Variable>,
    pub scenes: IndexMap<String, Scene>,
    pub sprites: IndexMap<String, Sprite>,
    pub pools: IndexMap<String, Pool>,
    pub machines: IndexMap<String, StateMachine>,
    pub palettes: IndexMap<String, Palette>,
    pub nav_grids: IndexMap<String, NavGrid>,
    pub dialogs: IndexMap<String, Dialog>,
    pub menus: IndexMap<String, Menu>,
    pub cutscenes: IndexMap<String, Cutscene>,
    pub sounds: IndexMap<String, SoundEffect>,
    pub music: IndexMap<String, MusicTrack>,
    pub mixer: Option<AudioMixer>,
    pub camera: Option<CameraDef>,
    pub physics: Option<PhysicsWorld>,
    pub save: Option<SaveSchema>,
    pub input_buffers: IndexMap<String, InputBuffer>,
    pub tile_assets: IndexMap<String, TileAsset>,
    pub tilemaps: IndexMap<String, Tilemap>,
    /// Emit link-cable plumbing.
    pub link_cable: bool,
}

impl GameModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_variable(&mut self, var: Variable) -> &mut Self {
        self.variables.insert(var.name.clone(), var);
        self
    }

    pub fn add_scene(&mut self, scene: Scene) -> &mut Self {
        self.scenes.insert(scene.name.clone(), scene);
        self
    }

    pub fn add_sprite(&mut self, sprite: Sprite) -> &mut Self {
        self.sprites.insert(sprite.name.clone(), sprite);
        self
    }

    pub fn add_pool(&mut self, pool: Pool) -> &mut Self {
        self.pools.insert(pool.name.clone(), pool);
        self
    }

    pub fn add_machine(&mut self, machine: StateMachine) -> &mut Self {
        self.machines.insert(machine.name.clone(), machine);
        self
    }

    /// Every IR list in the model, in emission order. Used for pre-scan
    /// passes that must see each statement exactly once.
    pub fn all_ir(&self) -> Vec<&[Stmt]> {
        let mut lists: Vec<&[Stmt]> = Vec::new();
        for scene in self.scenes.values() {
            lists.push(&scene.on_enter);
            lists.push(&scene.on_frame);
            lists.push(&scene.on_exit);
        }
        for machine in self.machines.values() {
            for state in &machine.states {
                lists.push(&state.on_enter);
                lists.push(&state.on_tick);
                lists.push(&state.on_exit);
                for t in &state.transitions {
                    lists.push(&t.action);
                }
            }
        }
        for pool in self.pools.values() {
            lists.push(&pool.on_spawn);
            lists.push(&pool.on_despawn);
            lists.push(&pool.on_frame);
            for anim in pool.animations.values() {
                if let Some(body) = &anim.on_complete {
                    lists.push(body);
                }
                for body in anim.frame_events.values() {
                    lists.push(body);
                }
            }
        }
        for sprite in self.sprites.values() {
            for anim in sprite.animations.values() {
                if let Some(body) = &anim.on_complete {
                    lists.push(body);
                }
                for body in anim.frame_events.values() {
                    lists.push(body);
                }
            }
        }
        for menu in self.menus.values() {
            for item in &menu.items {
                lists.push(&item.on_select);
            }
            lists.push(&menu.on_cancel);
        }
        for cutscene in self.cutscenes.values() {
            for step in &cutscene.steps {
                lists.push(&step.body);
            }
            lists.push(&cutscene.on_skip);
        }
        lists
    }
}
