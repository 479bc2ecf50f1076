//! In-process IR interpreter ("simulation").
//!
//! Executes the same IR as the code generator against an in-memory model
//! of variables, sprites, and pools, so DSL programs can be validated
//! without emulation. State is built fresh per run; statements that only
//! matter on the device (display writes, raw C, dialog drawing, save
//! I/O to cartridge RAM) are accepted and tracked or ignored, never an
//! error. Semantic errors (division by zero, unknown references, runaway
//! loops) surface as [`SimError`].

mod astar;
mod eval;
mod exec;
mod state;

use indexmap::IndexMap;

use crate::codegen::MAX_TWEENS;
use crate::error::SimError;
use crate::ir::{Channel, Stmt, Value, ValueKind};
use crate::model::GameModel;

pub(crate) use state::{
    AnimState, CutsceneState, DialogState, MachineSim, MenuState, MixerGroupState, PathState,
    SaveSnapshot, SeqSim, TransitionSim, TweenSlot, FLAG_COMPLETE, FLAG_LOOPING, FLAG_PAUSED,
    FLAG_REVERSED,
};

/// `while` iteration cap; exceeding it is an "infinite loop" error.
pub const LOOP_GUARD: u32 = 10_000;

pub struct Simulator<'a> {
    pub(crate) game: &'a GameModel,
    pub(crate) vars: IndexMap<String, Value>,
    /// Pool parallel arrays, nav-grid working copies, keyed by the same
    /// names the emitted C uses.
    pub(crate) arrays: IndexMap<String, Vec<Value>>,
    pub(crate) anims: IndexMap<String, AnimState>,
    pub(crate) machines: IndexMap<String, MachineSim>,
    pub(crate) tweens: Vec<TweenSlot>,
    pub(crate) dialogs: IndexMap<String, DialogState>,
    pub(crate) menus: IndexMap<String, MenuState>,
    pub(crate) cutscenes: IndexMap<String, CutsceneState>,
    pub(crate) mixer: IndexMap<String, MixerGroupState>,
    pub(crate) music_playing: bool,
    pub(crate) music_paused: bool,
    pub(crate) save_work: SaveSnapshot,
    pub(crate) save_slots: Vec<Option<SaveSnapshot>>,
    pub(crate) paths: IndexMap<String, PathState>,
    pub(crate) camera_x: i64,
    pub(crate) camera_y: i64,
    pub(crate) camera_follow: Option<String>,
    pub(crate) camera_bounds: Option<(i64, i64, i64, i64)>,
    pub(crate) camera_shake_timer: i64,
    pub(crate) camera_shake_intensity: i64,
    pub(crate) transition: TransitionSim,
    pub(crate) scene: String,
    pub(crate) scene_just_changed: bool,
    pub(crate) frame: u64,
    pub(crate) joypad: u8,
    pub(crate) joypad_prev: u8,
    joypad_next: u8,
    pub(crate) input_buffers: IndexMap<String, i64>,
    pub(crate) link_data: u8,
    pub(crate) rng: u32,
}

impl<'a> Simulator<'a> {
    pub fn new(game: &'a GameModel) -> Self {
        let mut vars = IndexMap::new();
        for var in game.variables.values() {
            vars.insert(var.name.clone(), Value::new(var.kind, var.initial));
        }
        // Sprite-owned positions mirror into their variable names.
        for sprite in game.sprites.values() {
            if let Some(pos) = &sprite.position {
                vars.insert(pos.x_var.clone(), Value::u8(pos.x));
                vars.insert(pos.y_var.clone(), Value::u8(pos.y));
            }
        }

        let mut arrays = IndexMap::new();
        for pool in game.pools.values() {
            let n = pool.size as usize;
            let zero = |kind| vec![Value::new(kind, 0); n];
            arrays.insert(format!("{}_active", pool.name), zero(ValueKind::U8));
            if pool.has_position {
                arrays.insert(format!("{}_x", pool.name), zero(ValueKind::U8));
                arrays.insert(format!("{}_y", pool.name), zero(ValueKind::U8));
            }
            if pool.has_velocity {
                arrays.insert(format!("{}_vel_x", pool.name), zero(ValueKind::I8));
                arrays.insert(format!("{}_vel_y", pool.name), zero(ValueKind::I8));
            }
            for field in &pool.fields {
                arrays.insert(format!("{}_{}", pool.name, field.name), zero(field.kind));
            }
            if !pool.animations.is_empty() {
                arrays.insert(
                    format!("{}_anim", pool.name),
                    vec![Value::u8(255); n],
                );
                arrays.insert(format!("{}_frame", pool.name), zero(ValueKind::U8));
                arrays.insert(format!("{}_timer", pool.name), zero(ValueKind::U8));
                arrays.insert(format!("{}_anim_complete", pool.name), zero(ValueKind::U8));
            }
            vars.insert(pool.slot_var(), Value::u8(0));
            vars.insert(format!("{}_pool_count", pool.name), Value::u8(0));
        }
        for grid in game.nav_grids.values() {
            arrays.insert(
                format!("{}_weights", grid.name),
                grid.cell_weights()
                    .into_iter()
                    .map(Value::u8)
                    .collect(),
            );
        }

        let mut anims = IndexMap::new();
        for sprite in game.sprites.values() {
            if !sprite.animations.is_empty() {
                anims.insert(sprite.name.clone(), AnimState::new());
            }
        }
        let machines = game
            .machines
            .keys()
            .map(|k| (k.clone(), MachineSim::default()))
            .collect();
        let dialogs = game
            .dialogs
            .keys()
            .map(|k| (k.clone(), DialogState::default()))
            .collect();
        let menus = game
            .menus
            .keys()
            .map(|k| (k.clone(), MenuState::default()))
            .collect();
        let cutscenes = game
            .cutscenes
            .keys()
            .map(|k| (k.clone(), CutsceneState::default()))
            .collect();
        let mixer = game
            .mixer
            .as_ref()
            .map(|m| {
                m.groups
                    .iter()
                    .map(|(name, g)| {
                        (
                            name.clone(),
                            MixerGroupState {
                                volume: g.volume as i64,
                                muted: g.muted,
                                priority: g.priority as i64,
                                ..Default::default()
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        let mut save_work = SaveSnapshot::default();
        let mut save_slots = Vec::new();
        if let Some(schema) = &game.save {
            for field in &schema.fields {
                match field.array_len {
                    Some(len) => {
                        save_work.arrays.insert(
                            field.name.clone(),
                            vec![Value::new(field.kind, 0); len as usize],
                        );
                    }
                    None => {
                        save_work
                            .fields
                            .insert(field.name.clone(), Value::new(field.kind, 0));
                    }
                }
            }
            save_slots = vec![None; schema.slots as usize];
        }
        let input_buffers = game
            .input_buffers
            .keys()
            .map(|k| (k.clone(), 0))
            .collect();
        let (camera_x, camera_y, camera_bounds) = game
            .camera
            .as_ref()
            .map(|c| {
                (
                    c.x as i64,
                    c.y as i64,
                    c.bounds
                        .map(|(x, y, w, h)| (x as i64, y as i64, w as i64, h as i64)),
                )
            })
            .unwrap_or((0, 0, None));

        Self {
            game,
            vars,
            arrays,
            anims,
            machines,
            tweens: vec![TweenSlot::idle(); MAX_TWEENS],
            dialogs,
            menus,
            cutscenes,
            mixer,
            music_playing: false,
            music_paused: false,
            save_work,
            save_slots,
            paths: IndexMap::new(),
            camera_x,
            camera_y,
            camera_follow: None,
            camera_bounds,
            camera_shake_timer: 0,
            camera_shake_intensity: 0,
            transition: TransitionSim::default(),
            scene: game.start_scene.clone(),
            scene_just_changed: true,
            frame: 0,
            joypad: 0,
            joypad_prev: 0,
            joypad_next: 0,
            input_buffers,
            link_data: 0,
            rng: 0x2545_F491,
        }
    }

    // -- public surface ----------------------------------------------------

    /// Run one main-loop iteration in emitted-code order: joypad, input
    /// buffers, scene (pending enter, then frame), animations, audio
    /// fades, transitions, tweens, frame counter.
    pub fn execute_frame(&mut self) -> Result<(), SimError> {
        self.joypad_prev = self.joypad;
        self.joypad = self.joypad_next;
        self.update_input_buffers();

        if self.scene_just_changed {
            self.scene_just_changed = false;
            let game = self.game;
            let scene = game
                .scenes
                .get(&self.scene)
                .ok_or_else(|| SimError::UnknownScene(self.scene.clone()))?;
            self.execute_stmts(&scene.on_enter)?;
        }
        let game = self.game;
        let scene = game
            .scenes
            .get(&self.scene)
            .ok_or_else(|| SimError::UnknownScene(self.scene.clone()))?;
        self.execute_stmts(&scene.on_frame)?;

        self.update_animations()?;
        self.update_mixer_fades();
        self.update_transition()?;
        self.update_sequence()?;
        self.update_tweens()?;
        self.frame += 1;
        Ok(())
    }

    pub fn execute_stmts(&mut self, stmts: &[Stmt]) -> Result<(), SimError> {
        for stmt in stmts {
            self.execute_stmt(stmt)?;
        }
        Ok(())
    }

    /// Install the scene that the next frame will enter.
    pub fn enter_scene(&mut self, name: &str) -> Result<(), SimError> {
        if !self.game.scenes.contains_key(name) {
            return Err(SimError::UnknownScene(name.to_string()));
        }
        self.scene = name.to_string();
        self.scene_just_changed = true;
        Ok(())
    }

    pub fn var(&self, name: &str) -> Result<Value, SimError> {
        self.vars
            .get(name)
            .copied()
            .ok_or_else(|| SimError::UnknownVariable(name.to_string()))
    }

    pub fn set_var(&mut self, name: &str, value: Value) -> Result<(), SimError> {
        self.write_var(name, value)
    }

    /// Joypad state seen by the next frame.
    pub fn set_joypad(&mut self, mask: u8) {
        self.joypad_next = mask;
    }

    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn camera(&self) -> (i64, i64) {
        (self.camera_x, self.camera_y)
    }

    pub fn transition_active(&self) -> bool {
        self.transition.active || self.transition.seq.is_some()
    }

    pub fn array(&self, name: &str) -> Option<&[Value]> {
        self.arrays.get(name).map(|v| v.as_slice())
    }

    pub fn pool_count(&self, pool: &str) -> Result<i64, SimError> {
        self.var(&format!("{pool}_pool_count")).map(|v| v.raw)
    }

    /// Name of the sprite's current animation, if one is playing.
    pub fn sprite_anim(&self, sprite: &str) -> Option<&str> {
        let state = self.anims.get(sprite)?;
        let idx = state.anim?;
        self.game
            .sprites
            .get(sprite)
            .and_then(|s| s.animations.get_index(idx))
            .map(|(name, _)| name.as_str())
    }

    /// Mixer priority gate, as the emitted `_mixer_can_play`.
    pub fn mixer_can_play(&self, channel: Channel, priority: u8) -> bool {
        let Some(mixer) = self.game.mixer.as_ref() else {
            return true;
        };
        match mixer.group_for(channel) {
            Some((name, _)) => {
                let state = &self.mixer[name];
                priority as i64 >= state.priority
            }
            None => true,
        }
    }

    // -- frame machinery ---------------------------------------------------

    pub(crate) fn write_var(&mut self, name: &str, value: Value) -> Result<(), SimError> {
        match self.vars.get_mut(name) {
            Some(slot) => {
                *slot = value.cast(slot.kind);
                Ok(())
            }
            None => Err(SimError::UnknownVariable(name.to_string())),
        }
    }

    pub(crate) fn array_read(&self, name: &str, index: i64) -> Result<Value, SimError> {
        let array = self
            .arrays
            .get(name)
            .ok_or_else(|| SimError::UnknownArray(name.to_string()))?;
        array
            .get(index as usize)
            .copied()
            .ok_or(SimError::IndexOutOfBounds {
                array: name.to_string(),
                index,
                len: array.len(),
            })
    }

    pub(crate) fn array_write(&mut self, name: &str, index: i64, value: Value) -> Result<(), SimError> {
        let array = self
            .arrays
            .get_mut(name)
            .ok_or_else(|| SimError::UnknownArray(name.to_string()))?;
        let len = array.len();
        match array.get_mut(index as usize) {
            Some(slot) => {
                *slot = value.cast(slot.kind);
                Ok(())
            }
            None => Err(SimError::IndexOutOfBounds {
                array: name.to_string(),
                index,
                len,
            }),
        }
    }

    /// Scene change: exit now, enter at the next frame's prologue.
    pub(crate) fn change_scene(&mut self, name: &str) -> Result<(), SimError> {
        if !self.game.scenes.contains_key(name) {
            return Err(SimError::UnknownScene(name.to_string()));
        }
        let game = self.game;
        if let Some(current) = game.scenes.get(&self.scene) {
            self.execute_stmts(&current.on_exit)?;
        }
        self.scene = name.to_string();
        self.scene_just_changed = true;
        Ok(())
    }

    fn update_input_buffers(&mut self) {
        let defs: Vec<(String, u8, u8)> = self
            .game
            .input_buffers
            .values()
            .map(|b| (b.name.clone(), b.button.mask(), b.window))
            .collect();
        for (name, mask, window) in defs {
            let entry = self.input_buffers.entry(name).or_insert(0);
            if *entry > 0 {
                *entry -= 1;
            }
            if self.joypad & mask != 0 && self.joypad_prev & mask == 0 {
                *entry = window as i64;
            }
        }
    }

    fn update_animations(&mut self) -> Result<(), SimError> {
        let names: Vec<String> = self.anims.keys().cloned().collect();
        for name in names {
            self.update_sprite_anim(&name)?;
        }
        Ok(())
    }

    fn update_sprite_anim(&mut self, name: &str) -> Result<(), SimError> {
        let game = self.game;
        let Some(sprite) = game.sprites.get(name) else {
            return Ok(());
        };
        let (anim_idx, flags, speed, timer) = {
            let st = &self.anims[name];
            (st.anim, st.flags, st.speed, st.timer)
        };
        let Some(ai) = anim_idx else {
            return Ok(());
        };
        if flags & FLAG_PAUSED != 0 {
            return Ok(());
        }
        let ticks = if speed >= 100 { speed / 100 } else { 1 };
        if timer > ticks {
            self.anims[name].timer = timer - ticks;
            return Ok(());
        }
        let def = sprite.animations.get_index(ai).map(|(_, a)| a).unwrap();
        let len = def.frames.len().max(1);

        let mut ended = false;
        {
            let st = self.anims.get_mut(name).unwrap();
            if flags & FLAG_REVERSED != 0 {
                if st.frame == 0 {
                    ended = true;
                } else {
                    st.frame -= 1;
                }
            } else if st.frame + 1 >= len {
                ended = true;
            } else {
                st.frame += 1;
            }
        }
        if ended {
            if flags & FLAG_LOOPING != 0 {
                let st = self.anims.get_mut(name).unwrap();
                st.frame = if flags & FLAG_REVERSED != 0 { len - 1 } else { 0 };
            } else {
                self.anims.get_mut(name).unwrap().flags |= FLAG_COMPLETE;
                if let Some(body) = &def.on_complete {
                    self.execute_stmts(body)?;
                }
                let replaced = self.anims[name].flags & FLAG_COMPLETE == 0;
                if replaced {
                    // The completion hook started a new animation.
                    return Ok(());
                }
                let next = {
                    let st = self.anims.get_mut(name).unwrap();
                    if st.queue.is_empty() {
                        st.anim = None;
                        return Ok(());
                    }
                    st.queue.remove(0)
                };
                let ndef = sprite.animations.get_index(next).map(|(_, a)| a).unwrap();
                let st = self.anims.get_mut(name).unwrap();
                st.anim = Some(next);
                st.frame = 0;
                st.timer = ndef.delay as i64;
                st.flags = if ndef.looping { FLAG_LOOPING } else { 0 };
            }
        }

        let (cur, frame) = {
            let st = &self.anims[name];
            (st.anim, st.frame)
        };
        if let Some(ci) = cur {
            let cdef = sprite.animations.get_index(ci).map(|(_, a)| a).unwrap();
            if let Some(body) = cdef.frame_events.get(&(frame as u8)) {
                self.execute_stmts(body)?;
            }
            let delay = cdef.delay as i64;
            let st = self.anims.get_mut(name).unwrap();
            st.timer = if st.speed > 0 && st.speed < 100 {
                (delay * 100) / st.speed
            } else {
                delay
            };
        }
        Ok(())
    }

    fn update_mixer_fades(&mut self) {
        for state in self.mixer.values_mut() {
            if !state.fade_active {
                continue;
            }
            state.fade_timer += 1;
            if state.fade_timer >= state.fade_duration {
                state.volume = state.fade_target;
                state.fade_active = false;
            } else {
                state.volume = state.fade_start
                    + (state.fade_target - state.fade_start) * state.fade_timer
                        / state.fade_duration;
            }
        }
    }

    fn update_transition(&mut self) -> Result<(), SimError> {
        if !self.transition.active {
            return Ok(());
        }
        self.transition.timer += 1;
        if self.transition.timer >= self.transition.duration {
            self.transition.active = false;
            if self.transition.seq.is_none() {
                if let Some(target) = self.transition.target_scene.take() {
                    self.change_scene(&target)?;
                }
            }
            if let Some(body) = self.transition.callback.take() {
                self.execute_stmts(&body)?;
            }
        }
        Ok(())
    }

    fn update_sequence(&mut self) -> Result<(), SimError> {
        if self.transition.seq.is_none() {
            return Ok(());
        }
        {
            let seq = self.transition.seq.as_mut().unwrap();
            if seq.wait > 0 {
                seq.wait -= 1;
                return Ok(());
            }
        }
        if self.transition.active {
            return Ok(());
        }
        let next = {
            let seq = self.transition.seq.as_mut().unwrap();
            if seq.step >= seq.steps.len() {
                None
            } else {
                let step = seq.steps[seq.step].clone();
                seq.step += 1;
                Some(step)
            }
        };
        match next {
            Some(step) => self.start_flat_step(&step)?,
            None => {
                self.transition.seq = None;
                if let Some(target) = self.transition.target_scene.take() {
                    self.change_scene(&target)?;
                }
            }
        }
        Ok(())
    }

    fn start_flat_step(&mut self, step: &crate::ir::FlatStep) -> Result<(), SimError> {
        use crate::ir::FlatStep;
        match step {
            FlatStep::FadeOut(f)
            | FlatStep::FadeIn(f)
            | FlatStep::Wipe { frames: f, .. }
            | FlatStep::Iris { frames: f, .. }
            | FlatStep::Flash { frames: f, .. } => {
                self.transition.active = true;
                self.transition.timer = 0;
                self.transition.duration = *f as i64;
            }
            FlatStep::Wait(f) => {
                if let Some(seq) = self.transition.seq.as_mut() {
                    seq.wait = *f as i64;
                }
            }
            FlatStep::Shake {
                intensity, frames, ..
            } => {
                self.camera_shake_intensity = *intensity as i64;
                self.camera_shake_timer = *frames as i64;
            }
            FlatStep::Callback(body) => self.execute_stmts(body)?,
            FlatStep::Parallel(children) => {
                for child in children {
                    self.start_flat_step(child)?;
                }
            }
            FlatStep::Nop => {}
        }
        Ok(())
    }

    fn update_tweens(&mut self) -> Result<(), SimError> {
        for i in 0..self.tweens.len() {
            if !self.tweens[i].active {
                continue;
            }
            let slot = &mut self.tweens[i];
            slot.timer += 1;
            let value = if slot.timer >= slot.duration {
                slot.active = false;
                slot.to
            } else {
                // Rounded progress; matches the emitted integer math.
                let progress = (slot.timer * 255 + slot.duration / 2) / slot.duration;
                let eased = slot.table[progress as usize] as i64;
                slot.from + (slot.to - slot.from) * eased / 255
            };
            let var = self.tweens[i].var.clone();
            let kind = self.var(&var)?.kind;
            let clamped = match kind {
                ValueKind::U8 => value.clamp(0, 255),
                _ => value,
            };
            self.write_var(&var, Value::new(kind, clamped))?;
        }
        Ok(())
    }
}
