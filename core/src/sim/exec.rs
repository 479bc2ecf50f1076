//! Statement execution. One exhaustive dispatch mirroring the code
//! generator's lowering, so a DSL program behaves identically in tests
//! and in the emitted C.

use crate::error::SimError;
use crate::ir::{
    flatten, AnimStmt, AnimTarget, AssignOp, BinaryOp, CameraStmt, CutsceneStmt, DialogStmt,
    InputStmt, LinkStmt, MachineStmt, MenuStmt, MixerStmt, PathStmt, PhysicsStmt, PoolStmt,
    SaveStmt, SoundStmt, Stmt, TransitionStep, TransitionStmt, TweenStmt, Value, ValueKind,
};

use super::{astar, SeqSim, Simulator, AnimState, FLAG_LOOPING, FLAG_PAUSED, LOOP_GUARD};

impl Simulator<'_> {
    pub fn execute_stmt(&mut self, stmt: &Stmt) -> Result<(), SimError> {
        match stmt {
            Stmt::Assign { target, op, value } => {
                let value = self.eval(value)?;
                let current = self.var(target)?;
                let next = match op {
                    AssignOp::Set => value.cast(current.kind),
                    AssignOp::Add => BinaryOp::Add.apply(current, value)?,
                    AssignOp::Sub => BinaryOp::Sub.apply(current, value)?,
                    AssignOp::Mul => BinaryOp::Mul.apply(current, value)?,
                    AssignOp::And => BinaryOp::And.apply(current, value)?,
                    AssignOp::Or => BinaryOp::Or.apply(current, value)?,
                };
                self.write_var(target, next)
            }
            Stmt::ArrayAssign { array, index, value } => {
                let index = self.eval(index)?.raw;
                let value = self.eval(value)?;
                self.array_write(array, index, value)
            }
            Stmt::If { cond, then, otherwise } => {
                if self.eval(cond)?.is_truthy() {
                    self.execute_stmts(then)
                } else {
                    self.execute_stmts(otherwise)
                }
            }
            Stmt::When { branches, otherwise } => {
                for (cond, body) in branches {
                    if self.eval(cond)?.is_truthy() {
                        return self.execute_stmts(body);
                    }
                }
                if let Some(body) = otherwise {
                    self.execute_stmts(body)?;
                }
                Ok(())
            }
            Stmt::While { cond, body } => {
                let mut iterations = 0u32;
                while self.eval(cond)?.is_truthy() {
                    iterations += 1;
                    if iterations > LOOP_GUARD {
                        return Err(SimError::LoopGuard(LOOP_GUARD));
                    }
                    self.execute_stmts(body)?;
                }
                Ok(())
            }
            Stmt::For { counter, start, end, body } => {
                if !self.vars.contains_key(counter) {
                    self.vars
                        .insert(counter.clone(), Value::new(ValueKind::I16, 0));
                }
                let mut i = *start;
                while i <= *end {
                    let kind = self.var(counter)?.kind;
                    self.write_var(counter, Value::new(kind, i))?;
                    self.execute_stmts(body)?;
                    i += 1;
                }
                Ok(())
            }
            // No in-simulator meaning.
            Stmt::Call { .. } | Stmt::Raw(_) | Stmt::Display(_) | Stmt::Palette(_) => Ok(()),
            Stmt::SceneChange(scene) => self.change_scene(scene),

            Stmt::Sound(s) => self.exec_sound(s),
            Stmt::Mixer(m) => self.exec_mixer(m),
            Stmt::Anim(a) => self.exec_anim(a),
            Stmt::Machine(m) => self.exec_machine(m),
            Stmt::Pool(p) => self.exec_pool(p),
            Stmt::Camera(c) => self.exec_camera(c),
            Stmt::Transition(t) => self.exec_transition(t),
            Stmt::Dialog(d) => self.exec_dialog(d),
            Stmt::Menu(m) => self.exec_menu(m),
            Stmt::Save(s) => self.exec_save(s),
            Stmt::Tween(t) => self.exec_tween(t),
            Stmt::Path(p) => self.exec_path(p),
            Stmt::Cutscene(c) => self.exec_cutscene(c),
            Stmt::Link(l) => self.exec_link(l),
            Stmt::Input(i) => self.exec_input(i),
            Stmt::Physics(p) => self.exec_physics(p),
        }
    }

    // -- audio -------------------------------------------------------------

    fn exec_sound(&mut self, stmt: &SoundStmt) -> Result<(), SimError> {
        match stmt {
            SoundStmt::MusicPlay { .. } => {
                self.music_playing = true;
                self.music_paused = false;
            }
            SoundStmt::MusicPause => self.music_paused = true,
            SoundStmt::MusicResume => self.music_paused = false,
            SoundStmt::MusicStop => self.music_playing = false,
            // Register writes are device-only.
            _ => {}
        }
        Ok(())
    }

    fn exec_mixer(&mut self, stmt: &MixerStmt) -> Result<(), SimError> {
        let group = match stmt {
            MixerStmt::SetVolume { group, .. }
            | MixerStmt::Fade { group, .. }
            | MixerStmt::Mute { group, .. }
            | MixerStmt::ToggleMute { group } => group.clone(),
        };
        if !self.mixer.contains_key(&group) {
            return Err(SimError::UnknownMixerGroup(group));
        }
        match stmt {
            MixerStmt::SetVolume { volume, .. } => {
                let volume = self.eval(volume)?.raw.clamp(0, 100);
                self.mixer[&group].volume = volume;
            }
            MixerStmt::Fade { target, frames, .. } => {
                let state = &mut self.mixer[&group];
                state.fade_start = state.volume;
                state.fade_target = *target as i64;
                state.fade_timer = 0;
                state.fade_duration = (*frames).max(1) as i64;
                state.fade_active = true;
            }
            MixerStmt::Mute { muted, .. } => self.mixer[&group].muted = *muted,
            MixerStmt::ToggleMute { .. } => {
                let state = &mut self.mixer[&group];
                state.muted = !state.muted;
            }
        }
        Ok(())
    }

    // -- animation ---------------------------------------------------------

    fn exec_anim(&mut self, stmt: &AnimStmt) -> Result<(), SimError> {
        match stmt {
            AnimStmt::Play { target, anim } => match target {
                AnimTarget::Sprite(sprite) => self.anim_play_sprite(sprite, anim),
                AnimTarget::Pool(pool) => self.anim_play_pool(pool, anim),
            },
            AnimStmt::Stop { target } => match target {
                AnimTarget::Sprite(sprite) => {
                    self.sprite_anim_state(sprite)?.anim = None;
                    Ok(())
                }
                AnimTarget::Pool(pool) => {
                    let slot = self.pool_slot(pool)?;
                    self.array_write(&format!("{pool}_anim"), slot, Value::u8(255))
                }
            },
            AnimStmt::Pause { target } => {
                if let AnimTarget::Sprite(sprite) = target {
                    self.sprite_anim_state(sprite)?.flags |= FLAG_PAUSED;
                }
                Ok(())
            }
            AnimStmt::Resume { target } => {
                if let AnimTarget::Sprite(sprite) = target {
                    self.sprite_anim_state(sprite)?.flags &= !FLAG_PAUSED;
                }
                Ok(())
            }
            AnimStmt::SetSpeed { target, speed } => {
                let speed = self.eval(speed)?.raw;
                if let AnimTarget::Sprite(sprite) = target {
                    self.sprite_anim_state(sprite)?.speed = speed;
                }
                Ok(())
            }
            AnimStmt::SetFrame { target, frame } => {
                let frame = self.eval(frame)?.raw;
                match target {
                    AnimTarget::Sprite(sprite) => {
                        self.sprite_anim_state(sprite)?.frame = frame.max(0) as usize;
                        Ok(())
                    }
                    AnimTarget::Pool(pool) => {
                        let slot = self.pool_slot(pool)?;
                        self.array_write(
                            &format!("{pool}_frame"),
                            slot,
                            Value::new(ValueKind::U8, frame),
                        )
                    }
                }
            }
            AnimStmt::Queue { target, anim } => {
                let AnimTarget::Sprite(sprite) = target else {
                    return Ok(());
                };
                let idx = self
                    .game
                    .sprites
                    .get(sprite)
                    .ok_or_else(|| SimError::UnknownSprite(sprite.clone()))?
                    .animations
                    .get_index_of(anim)
                    .ok_or_else(|| SimError::UnknownAnimation {
                        target: sprite.clone(),
                        anim: anim.clone(),
                    })?;
                let state = self.sprite_anim_state(sprite)?;
                if state.queue.len() < crate::codegen::ANIM_QUEUE_MAX {
                    state.queue.push(idx);
                }
                Ok(())
            }
        }
    }

    fn sprite_anim_state(&mut self, sprite: &str) -> Result<&mut AnimState, SimError> {
        if !self.game.sprites.contains_key(sprite) {
            return Err(SimError::UnknownSprite(sprite.to_string()));
        }
        Ok(self
            .anims
            .entry(sprite.to_string())
            .or_insert_with(AnimState::new))
    }

    pub(crate) fn anim_play_sprite(&mut self, sprite: &str, anim: &str) -> Result<(), SimError> {
        let game = self.game;
        let def = game
            .sprites
            .get(sprite)
            .ok_or_else(|| SimError::UnknownSprite(sprite.to_string()))?;
        let idx = def
            .animations
            .get_index_of(anim)
            .ok_or_else(|| SimError::UnknownAnimation {
                target: sprite.to_string(),
                anim: anim.to_string(),
            })?;
        let a = &def.animations[idx];
        let (delay, looping) = (a.delay as i64, a.looping);
        let state = self.sprite_anim_state(sprite)?;
        state.anim = Some(idx);
        state.frame = 0;
        state.timer = delay;
        state.flags = if looping { FLAG_LOOPING } else { 0 };
        state.queue.clear();
        Ok(())
    }

    fn anim_play_pool(&mut self, pool: &str, anim: &str) -> Result<(), SimError> {
        let game = self.game;
        let def = game
            .pools
            .get(pool)
            .ok_or_else(|| SimError::UnknownPool(pool.to_string()))?;
        let idx = def
            .animations
            .get_index_of(anim)
            .ok_or_else(|| SimError::UnknownAnimation {
                target: pool.to_string(),
                anim: anim.to_string(),
            })?;
        let delay = def.animations[idx].delay;
        let slot = self.pool_slot(pool)?;
        self.array_write(&format!("{pool}_anim"), slot, Value::u8(idx as u8))?;
        self.array_write(&format!("{pool}_frame"), slot, Value::u8(0))?;
        self.array_write(&format!("{pool}_timer"), slot, Value::u8(delay))?;
        self.array_write(&format!("{pool}_anim_complete"), slot, Value::u8(0))
    }

    // -- state machines ----------------------------------------------------

    fn exec_machine(&mut self, stmt: &MachineStmt) -> Result<(), SimError> {
        match stmt {
            MachineStmt::Start { machine, state } | MachineStmt::Goto { machine, state } => {
                let idx = self
                    .game
                    .machines
                    .get(machine)
                    .ok_or_else(|| SimError::UnknownMachine(machine.clone()))?
                    .state_index(state)
                    .ok_or_else(|| SimError::UnknownState {
                        machine: machine.clone(),
                        state: state.clone(),
                    })?;
                let m = self
                    .machines
                    .get_mut(machine)
                    .ok_or_else(|| SimError::UnknownMachine(machine.clone()))?;
                m.next = Some(idx);
                m.changed = true;
                Ok(())
            }
            MachineStmt::Update { machine } => self.machine_update(machine),
        }
    }

    fn machine_update(&mut self, name: &str) -> Result<(), SimError> {
        let game = self.game;
        let def = game
            .machines
            .get(name)
            .ok_or_else(|| SimError::UnknownMachine(name.to_string()))?;
        let (changed, state, next) = {
            let m = self
                .machines
                .get(name)
                .ok_or_else(|| SimError::UnknownMachine(name.to_string()))?;
            (m.changed, m.state, m.next)
        };
        if changed {
            if let Some(si) = state {
                self.execute_stmts(&def.states[si].on_exit)?;
            }
            self.machines[name].state = next;
            if let Some(si) = next {
                let st = &def.states[si];
                self.execute_stmts(&st.on_enter)?;
                if let Some(bound) = &st.animation {
                    self.anim_play_sprite(&bound.sprite, &bound.anim)?;
                }
            }
            self.machines[name].changed = false;
        }
        let Some(si) = self.machines[name].state else {
            return Ok(());
        };
        let st = &def.states[si];
        self.execute_stmts(&st.on_tick)?;
        let gated = st
            .animation
            .as_ref()
            .filter(|b| b.lock_until_complete)
            .map(|b| {
                self.anims
                    .get(&b.sprite)
                    .map(|a| a.anim.is_some())
                    .unwrap_or(false)
            })
            .unwrap_or(false);
        if gated {
            return Ok(());
        }
        for transition in &st.transitions {
            if self.eval(&transition.cond)?.is_truthy() {
                self.execute_stmts(&transition.action)?;
                let to = def
                    .state_index(&transition.to)
                    .ok_or_else(|| SimError::UnknownState {
                        machine: name.to_string(),
                        state: transition.to.clone(),
                    })?;
                let m = self.machines.get_mut(name).unwrap();
                m.next = Some(to);
                m.changed = true;
                break;
            }
        }
        Ok(())
    }

    // -- pools -------------------------------------------------------------

    fn pool_slot(&self, pool: &str) -> Result<i64, SimError> {
        self.var(&format!("_{pool}_i")).map(|v| v.raw)
    }

    fn exec_pool(&mut self, stmt: &PoolStmt) -> Result<(), SimError> {
        let name = match stmt {
            PoolStmt::Spawn { pool }
            | PoolStmt::SpawnAt { pool, .. }
            | PoolStmt::TrySpawn { pool, .. }
            | PoolStmt::Despawn { pool }
            | PoolStmt::DespawnAll { pool }
            | PoolStmt::ForEach { pool, .. }
            | PoolStmt::DespawnWhere { pool, .. }
            | PoolStmt::Update { pool } => pool.clone(),
        };
        if !self.game.pools.contains_key(&name) {
            return Err(SimError::UnknownPool(name));
        }
        match stmt {
            PoolStmt::Spawn { pool } => self.pool_spawn_at(pool, 0, 0),
            PoolStmt::SpawnAt { pool, x, y } => {
                let x = self.eval(x)?.raw;
                let y = self.eval(y)?.raw;
                self.pool_spawn_at(pool, x, y)
            }
            PoolStmt::TrySpawn { pool, flag } => {
                let size = self.game.pools[pool].size as i64;
                let count = self.pool_count(pool)?;
                if count < size {
                    self.pool_spawn_at(pool, 0, 0)?;
                    self.write_var(flag, Value::u8(1))
                } else {
                    self.write_var(flag, Value::u8(0))
                }
            }
            PoolStmt::Despawn { pool } => {
                let slot = self.pool_slot(pool)?;
                self.pool_despawn(pool, slot)
            }
            PoolStmt::DespawnAll { pool } => {
                let size = self.game.pools[pool].size as i64;
                for i in 0..size {
                    if self.array_read(&format!("{pool}_active"), i)?.is_truthy() {
                        self.pool_despawn(pool, i)?;
                    }
                }
                Ok(())
            }
            PoolStmt::ForEach { pool, body } => {
                let size = self.game.pools[pool].size as i64;
                let slot_var = self.game.pools[pool].slot_var();
                for i in 0..size {
                    if !self.array_read(&format!("{pool}_active"), i)?.is_truthy() {
                        continue;
                    }
                    self.write_var(&slot_var, Value::new(ValueKind::U8, i))?;
                    self.execute_stmts(body)?;
                }
                Ok(())
            }
            PoolStmt::DespawnWhere { pool, cond } => {
                // Back-to-front, so removal cannot disturb unvisited slots.
                let size = self.game.pools[pool].size as i64;
                let slot_var = self.game.pools[pool].slot_var();
                for i in (0..size).rev() {
                    if !self.array_read(&format!("{pool}_active"), i)?.is_truthy() {
                        continue;
                    }
                    self.write_var(&slot_var, Value::new(ValueKind::U8, i))?;
                    if self.eval(cond)?.is_truthy() {
                        self.pool_despawn(pool, i)?;
                    }
                }
                Ok(())
            }
            PoolStmt::Update { pool } => self.pool_update(pool),
        }
    }

    fn pool_spawn_at(&mut self, pool: &str, x: i64, y: i64) -> Result<(), SimError> {
        let game = self.game;
        let def = &game.pools[pool];
        let size = def.size as i64;
        let active = format!("{pool}_active");
        let mut free = None;
        for i in 0..size {
            if !self.array_read(&active, i)?.is_truthy() {
                free = Some(i);
                break;
            }
        }
        let Some(i) = free else {
            return Ok(());
        };
        self.array_write(&active, i, Value::u8(1))?;
        self.write_var(&def.slot_var(), Value::new(ValueKind::U8, i))?;
        if def.has_position {
            self.array_write(&format!("{pool}_x"), i, Value::new(ValueKind::U8, x))?;
            self.array_write(&format!("{pool}_y"), i, Value::new(ValueKind::U8, y))?;
        }
        if def.has_velocity {
            self.array_write(&format!("{pool}_vel_x"), i, Value::i8(0))?;
            self.array_write(&format!("{pool}_vel_y"), i, Value::i8(0))?;
        }
        for field in &def.fields {
            self.array_write(
                &format!("{pool}_{}", field.name),
                i,
                Value::new(field.kind, field.default),
            )?;
        }
        if !def.animations.is_empty() {
            self.array_write(&format!("{pool}_anim"), i, Value::u8(255))?;
            self.array_write(&format!("{pool}_frame"), i, Value::u8(0))?;
            self.array_write(&format!("{pool}_timer"), i, Value::u8(0))?;
            self.array_write(&format!("{pool}_anim_complete"), i, Value::u8(0))?;
        }
        let count = self.var(&format!("{pool}_pool_count"))?;
        self.write_var(
            &format!("{pool}_pool_count"),
            Value::new(ValueKind::U8, count.raw + 1),
        )?;
        self.execute_stmts(&def.on_spawn)
    }

    fn pool_despawn(&mut self, pool: &str, idx: i64) -> Result<(), SimError> {
        let game = self.game;
        let def = &game.pools[pool];
        self.write_var(&def.slot_var(), Value::new(ValueKind::U8, idx))?;
        self.execute_stmts(&def.on_despawn)?;
        self.array_write(&format!("{pool}_active"), idx, Value::u8(0))?;
        let count = self.var(&format!("{pool}_pool_count"))?;
        if count.raw > 0 {
            self.write_var(
                &format!("{pool}_pool_count"),
                Value::new(ValueKind::U8, count.raw - 1),
            )?;
        }
        Ok(())
    }

    fn pool_update(&mut self, pool: &str) -> Result<(), SimError> {
        let game = self.game;
        let def = &game.pools[pool];
        let size = def.size as i64;
        let slot_var = def.slot_var();
        let has_anims = !def.animations.is_empty();
        for i in 0..size {
            if !self.array_read(&format!("{pool}_active"), i)?.is_truthy() {
                continue;
            }
            self.write_var(&slot_var, Value::new(ValueKind::U8, i))?;
            self.execute_stmts(&def.on_frame)?;
            if def.has_velocity && def.has_position {
                let x = self.array_read(&format!("{pool}_x"), i)?;
                let vx = self.array_read(&format!("{pool}_vel_x"), i)?;
                self.array_write(
                    &format!("{pool}_x"),
                    i,
                    Value::new(ValueKind::U8, x.raw + vx.raw),
                )?;
                let y = self.array_read(&format!("{pool}_y"), i)?;
                let vy = self.array_read(&format!("{pool}_vel_y"), i)?;
                self.array_write(
                    &format!("{pool}_y"),
                    i,
                    Value::new(ValueKind::U8, y.raw + vy.raw),
                )?;
            }
            if has_anims {
                self.pool_anim_advance(pool, i)?;
            }
        }
        if !def.despawn_when.is_empty() {
            for i in (0..size).rev() {
                if !self.array_read(&format!("{pool}_active"), i)?.is_truthy() {
                    continue;
                }
                self.write_var(&slot_var, Value::new(ValueKind::U8, i))?;
                let mut hit = false;
                for cond in &def.despawn_when {
                    if self.eval(cond)?.is_truthy() {
                        hit = true;
                        break;
                    }
                }
                if hit {
                    self.pool_despawn(pool, i)?;
                }
            }
        }
        Ok(())
    }

    /// Pool animations are plain frame counters: no speed modulation, no
    /// queue. Completion latches the per-entry flag and stops the anim.
    fn pool_anim_advance(&mut self, pool: &str, i: i64) -> Result<(), SimError> {
        let anim = self.array_read(&format!("{pool}_anim"), i)?.raw;
        if anim == 255 {
            return Ok(());
        }
        let timer = self.array_read(&format!("{pool}_timer"), i)?.raw;
        if timer > 1 {
            return self.array_write(
                &format!("{pool}_timer"),
                i,
                Value::new(ValueKind::U8, timer - 1),
            );
        }
        let game = self.game;
        let def = &game.pools[pool];
        let (_, a) = def.animations.get_index(anim as usize).ok_or_else(|| {
            SimError::UnknownAnimation {
                target: pool.to_string(),
                anim: format!("#{anim}"),
            }
        })?;
        let len = a.frames.len().max(1) as i64;
        let frame = self.array_read(&format!("{pool}_frame"), i)?.raw;
        if frame + 1 >= len {
            if a.looping {
                self.array_write(&format!("{pool}_frame"), i, Value::u8(0))?;
            } else {
                self.array_write(&format!("{pool}_anim_complete"), i, Value::u8(1))?;
                self.array_write(&format!("{pool}_anim"), i, Value::u8(255))?;
                return Ok(());
            }
        } else {
            self.array_write(
                &format!("{pool}_frame"),
                i,
                Value::new(ValueKind::U8, frame + 1),
            )?;
        }
        self.array_write(
            &format!("{pool}_timer"),
            i,
            Value::new(ValueKind::U8, a.delay as i64),
        )
    }

    // -- camera ------------------------------------------------------------

    fn exec_camera(&mut self, stmt: &CameraStmt) -> Result<(), SimError> {
        match stmt {
            CameraStmt::SetPosition { x, y } => {
                self.camera_x = self.eval(x)?.raw;
                self.camera_y = self.eval(y)?.raw;
            }
            CameraStmt::Follow { sprite } => {
                if !self.game.sprites.contains_key(sprite) {
                    return Err(SimError::UnknownSprite(sprite.clone()));
                }
                self.camera_follow = Some(sprite.clone());
            }
            CameraStmt::StopFollow => self.camera_follow = None,
            CameraStmt::Snap => {}
            CameraStmt::SetBounds { x, y, width, height } => {
                self.camera_bounds =
                    Some((*x as i64, *y as i64, *width as i64, *height as i64));
            }
            CameraStmt::Shake { intensity, frames } => {
                self.camera_shake_intensity = *intensity as i64;
                self.camera_shake_timer = *frames as i64;
            }
            CameraStmt::ShakeStop => {
                self.camera_shake_timer = 0;
                self.camera_shake_intensity = 0;
            }
            CameraStmt::Update => self.camera_update()?,
        }
        Ok(())
    }

    fn camera_update(&mut self) -> Result<(), SimError> {
        if let Some(sprite) = self.camera_follow.clone() {
            let def = self
                .game
                .sprites
                .get(&sprite)
                .ok_or_else(|| SimError::UnknownSprite(sprite.clone()))?;
            if let Some((x_var, y_var)) = def.position_vars() {
                let x = self.var(x_var)?.raw;
                let y = self.var(y_var)?.raw;
                self.camera_x = (x - 80).max(0);
                self.camera_y = (y - 72).max(0);
            }
        }
        if let Some((bx, by, bw, bh)) = self.camera_bounds {
            self.camera_x = self.camera_x.clamp(bx, (bx + bw - 160).max(bx));
            self.camera_y = self.camera_y.clamp(by, (by + bh - 144).max(by));
        }
        if self.camera_shake_timer > 0 {
            self.camera_shake_timer -= 1;
            if self.camera_shake_timer & 7 == 0 && self.camera_shake_intensity > 0 {
                self.camera_shake_intensity -= 1;
            }
        }
        Ok(())
    }

    // -- transitions -------------------------------------------------------

    fn exec_transition(&mut self, stmt: &TransitionStmt) -> Result<(), SimError> {
        match stmt {
            TransitionStmt::Start {
                step,
                to_scene,
                on_complete,
            } => {
                if let Some(scene) = to_scene {
                    if !self.game.scenes.contains_key(scene) {
                        return Err(SimError::UnknownScene(scene.clone()));
                    }
                }
                if let TransitionStep::Callback(body) = step {
                    let body = body.clone();
                    return self.execute_stmts(&body);
                }
                self.transition.target_scene = to_scene.clone();
                self.transition.callback = on_complete.clone();
                let frames = match step {
                    TransitionStep::FadeOut(f)
                    | TransitionStep::FadeIn(f)
                    | TransitionStep::Wait(f) => *f,
                    TransitionStep::Flash { frames, .. }
                    | TransitionStep::Wipe { frames, .. }
                    | TransitionStep::Iris { frames, .. } => *frames,
                    TransitionStep::Shake {
                        intensity, frames, ..
                    } => {
                        self.camera_shake_intensity = *intensity as i64;
                        self.camera_shake_timer = *frames as i64;
                        *frames
                    }
                    TransitionStep::Callback(_) => unreachable!(),
                };
                self.transition.active = true;
                self.transition.timer = 0;
                self.transition.duration = frames as i64;
            }
            TransitionStmt::Composed { node, to_scene } => {
                if let Some(scene) = to_scene {
                    if !self.game.scenes.contains_key(scene) {
                        return Err(SimError::UnknownScene(scene.clone()));
                    }
                }
                self.transition.target_scene = to_scene.clone();
                self.transition.seq = Some(SeqSim {
                    steps: flatten(node),
                    step: 0,
                    wait: 0,
                });
            }
            TransitionStmt::Cancel => {
                self.transition.active = false;
                self.transition.seq = None;
                self.transition.callback = None;
                self.transition.target_scene = None;
            }
        }
        Ok(())
    }

    // -- dialogs and menus -------------------------------------------------

    fn exec_dialog(&mut self, stmt: &DialogStmt) -> Result<(), SimError> {
        let name = match stmt {
            DialogStmt::Show { dialog }
            | DialogStmt::Hide { dialog }
            | DialogStmt::Say { dialog, .. }
            | DialogStmt::Choice { dialog, .. }
            | DialogStmt::Tick { dialog } => dialog.clone(),
        };
        if !self.dialogs.contains_key(&name) {
            return Err(SimError::UnknownDialog(name));
        }
        match stmt {
            DialogStmt::Show { dialog } => self.dialogs[dialog].active = true,
            DialogStmt::Hide { dialog } => {
                let state = &mut self.dialogs[dialog];
                state.active = false;
                state.choosing = false;
            }
            DialogStmt::Say { dialog, text } => {
                let state = &mut self.dialogs[dialog];
                state.active = true;
                state.choosing = false;
                state.text = text.clone();
                state.pos = 0;
                state.timer = 0;
            }
            DialogStmt::Choice {
                dialog,
                options,
                result,
            } => {
                if !self.vars.contains_key(result) {
                    return Err(SimError::UnknownVariable(result.clone()));
                }
                let state = &mut self.dialogs[dialog];
                state.active = true;
                state.choosing = true;
                state.choice = 0;
                state.choice_count = options.len();
                state.choice_result = Some(result.clone());
            }
            DialogStmt::Tick { dialog } => self.dialog_tick(dialog)?,
        }
        Ok(())
    }

    fn dialog_tick(&mut self, dialog: &str) -> Result<(), SimError> {
        let delay = self.game.dialogs[dialog].delay as i64;
        let (active, choosing) = {
            let state = &self.dialogs[dialog];
            (state.active, state.choosing)
        };
        if !active {
            return Ok(());
        }
        if choosing {
            let up = self.just_pressed(0x04);
            let down = self.just_pressed(0x08);
            let confirm = self.just_pressed(0x10);
            let state = &mut self.dialogs[dialog];
            if up && state.choice > 0 {
                state.choice -= 1;
            }
            if down && state.choice + 1 < state.choice_count {
                state.choice += 1;
            }
            if confirm {
                let choice = state.choice as i64;
                let result = state.choice_result.take();
                state.choosing = false;
                state.active = false;
                if let Some(result) = result {
                    self.write_var(&result, Value::new(ValueKind::U8, choice))?;
                }
            }
            return Ok(());
        }
        let state = &mut self.dialogs[dialog];
        if state.pos >= state.text.len() {
            return Ok(());
        }
        if state.timer > 0 {
            state.timer -= 1;
            return Ok(());
        }
        state.timer = delay;
        state.pos += 1;
        Ok(())
    }

    fn just_pressed(&self, mask: u8) -> bool {
        self.joypad & mask != 0 && self.joypad_prev & mask == 0
    }

    fn exec_menu(&mut self, stmt: &MenuStmt) -> Result<(), SimError> {
        let name = match stmt {
            MenuStmt::Show { menu }
            | MenuStmt::Hide { menu }
            | MenuStmt::Toggle { menu }
            | MenuStmt::Open { menu }
            | MenuStmt::Close { menu }
            | MenuStmt::Cancel { menu }
            | MenuStmt::Select { menu }
            | MenuStmt::MoveTo { menu, .. }
            | MenuStmt::Tick { menu } => menu.clone(),
        };
        if !self.menus.contains_key(&name) {
            return Err(SimError::UnknownMenu(name));
        }
        match stmt {
            MenuStmt::Show { menu } => self.menus[menu].open = true,
            MenuStmt::Hide { menu } | MenuStmt::Close { menu } => {
                self.menus[menu].open = false;
            }
            MenuStmt::Toggle { menu } => {
                let state = &mut self.menus[menu];
                state.open = !state.open;
            }
            MenuStmt::Open { menu } => {
                let state = &mut self.menus[menu];
                state.open = true;
                state.cursor = 0;
            }
            MenuStmt::Cancel { menu } => {
                let body = self.game.menus[menu].on_cancel.clone();
                self.execute_stmts(&body)?;
                self.menus[menu].open = false;
            }
            MenuStmt::Select { menu } => self.menu_select(menu)?,
            MenuStmt::MoveTo { menu, index } => {
                let index = self.eval(index)?.raw.max(0) as usize;
                let count = self.game.menus[menu].items.len();
                self.menus[menu].cursor = index.min(count.saturating_sub(1));
            }
            MenuStmt::Tick { menu } => self.menu_tick(menu)?,
        }
        Ok(())
    }

    fn menu_select(&mut self, menu: &str) -> Result<(), SimError> {
        let cursor = self.menus[menu].cursor;
        let game = self.game;
        if let Some(item) = game.menus[menu].items.get(cursor) {
            self.execute_stmts(&item.on_select)?;
        }
        Ok(())
    }

    fn menu_tick(&mut self, menu: &str) -> Result<(), SimError> {
        if !self.menus[menu].open {
            return Ok(());
        }
        let count = self.game.menus[menu].items.len();
        if self.just_pressed(0x04) && self.menus[menu].cursor > 0 {
            self.menus[menu].cursor -= 1;
        }
        if self.just_pressed(0x08) && self.menus[menu].cursor + 1 < count {
            self.menus[menu].cursor += 1;
        }
        if self.just_pressed(0x10) {
            self.menu_select(menu)?;
        }
        if self.just_pressed(0x20) {
            let body = self.game.menus[menu].on_cancel.clone();
            self.execute_stmts(&body)?;
            self.menus[menu].open = false;
        }
        Ok(())
    }

    // -- saves -------------------------------------------------------------

    fn exec_save(&mut self, stmt: &SaveStmt) -> Result<(), SimError> {
        match stmt {
            SaveStmt::Load { slot } => {
                if let Some(Some(snapshot)) = self.save_slots.get(*slot as usize) {
                    self.save_work = snapshot.clone();
                }
                Ok(())
            }
            SaveStmt::Save { slot } => {
                let snapshot = self.save_work.clone();
                if let Some(entry) = self.save_slots.get_mut(*slot as usize) {
                    *entry = Some(snapshot);
                }
                Ok(())
            }
            SaveStmt::Erase { slot } => {
                if let Some(entry) = self.save_slots.get_mut(*slot as usize) {
                    *entry = None;
                }
                Ok(())
            }
            SaveStmt::Copy { from, to } => {
                let snapshot = self
                    .save_slots
                    .get(*from as usize)
                    .cloned()
                    .unwrap_or(None);
                if let Some(entry) = self.save_slots.get_mut(*to as usize) {
                    *entry = snapshot;
                }
                Ok(())
            }
            SaveStmt::FieldWrite { field, value } => {
                let value = self.eval(value)?;
                match self.save_work.fields.get_mut(field) {
                    Some(slot) => {
                        *slot = value.cast(slot.kind);
                        Ok(())
                    }
                    None => Err(SimError::UnknownSaveField(field.clone())),
                }
            }
            SaveStmt::ArrayWrite { field, index, value } => {
                let index = self.eval(index)?.raw;
                let value = self.eval(value)?;
                let array = self
                    .save_work
                    .arrays
                    .get_mut(field)
                    .ok_or_else(|| SimError::UnknownSaveField(field.clone()))?;
                let len = array.len();
                match array.get_mut(index as usize) {
                    Some(slot) => {
                        *slot = value.cast(slot.kind);
                        Ok(())
                    }
                    None => Err(SimError::IndexOutOfBounds {
                        array: field.clone(),
                        index,
                        len,
                    }),
                }
            }
        }
    }

    // -- tweens ------------------------------------------------------------

    fn exec_tween(&mut self, stmt: &TweenStmt) -> Result<(), SimError> {
        match stmt {
            TweenStmt::Start {
                var,
                from,
                to,
                frames,
                easing,
            } => {
                let current = self.var(var)?;
                let from = match from {
                    Some(e) => self.eval(e)?.raw,
                    None => current.raw,
                };
                let to = self.eval(to)?.raw;
                if let Some(slot) = self.tweens.iter_mut().find(|t| !t.active) {
                    slot.active = true;
                    slot.var = var.clone();
                    slot.from = from;
                    slot.to = to;
                    slot.timer = 0;
                    slot.duration = (*frames).max(1) as i64;
                    slot.table = easing.bake_table();
                }
                Ok(())
            }
            TweenStmt::Cancel { var } => {
                for slot in &mut self.tweens {
                    if slot.active && slot.var == *var {
                        slot.active = false;
                    }
                }
                Ok(())
            }
            TweenStmt::CancelAll => {
                for slot in &mut self.tweens {
                    slot.active = false;
                }
                Ok(())
            }
        }
    }

    // -- paths -------------------------------------------------------------

    fn exec_path(&mut self, stmt: &PathStmt) -> Result<(), SimError> {
        match stmt {
            PathStmt::Find {
                path,
                grid,
                from_x,
                from_y,
                to_x,
                to_y,
                heuristic,
            } => {
                let def = self
                    .game
                    .nav_grids
                    .get(grid)
                    .ok_or_else(|| SimError::UnknownNavGrid(grid.clone()))?;
                let (w, h) = (def.width, def.height);
                let fx = self.eval(from_x)?.raw as u8;
                let fy = self.eval(from_y)?.raw as u8;
                let tx = self.eval(to_x)?.raw as u8;
                let ty = self.eval(to_y)?.raw as u8;
                let weights: Vec<u8> = self
                    .arrays
                    .get(&format!("{grid}_weights"))
                    .ok_or_else(|| SimError::UnknownNavGrid(grid.clone()))?
                    .iter()
                    .map(|v| v.raw as u8)
                    .collect();
                let found = astar::find_path(&weights, w, h, (fx, fy), (tx, ty), *heuristic);
                let state = self.paths.entry(path.clone()).or_default();
                match found {
                    Some(waypoints) => {
                        state.found = true;
                        state.waypoints = waypoints;
                    }
                    None => {
                        state.found = false;
                        state.waypoints.clear();
                    }
                }
                state.step = 0;
                Ok(())
            }
            PathStmt::Advance { path } => {
                let state = self
                    .paths
                    .get_mut(path)
                    .ok_or_else(|| SimError::UnknownPath(path.clone()))?;
                if state.step < state.waypoints.len() {
                    state.step += 1;
                }
                Ok(())
            }
            PathStmt::Follow { path, x_var, y_var } => {
                let (wx, wy, done) = {
                    let state = self
                        .paths
                        .get(path)
                        .ok_or_else(|| SimError::UnknownPath(path.clone()))?;
                    match state.waypoints.get(state.step) {
                        Some((wx, wy)) => (*wx as i64 * 8, *wy as i64 * 8, false),
                        None => (0, 0, true),
                    }
                };
                if done {
                    return Ok(());
                }
                let mut x = self.var(x_var)?.raw;
                let mut y = self.var(y_var)?.raw;
                if x < wx {
                    x += 1;
                } else if x > wx {
                    x -= 1;
                }
                if y < wy {
                    y += 1;
                } else if y > wy {
                    y -= 1;
                }
                self.write_var(x_var, Value::new(ValueKind::U8, x))?;
                self.write_var(y_var, Value::new(ValueKind::U8, y))?;
                // Waypoint proximity threshold: 4 pixels.
                if (x - wx).abs() < 4 && (y - wy).abs() < 4 {
                    self.paths.get_mut(path).unwrap().step += 1;
                }
                Ok(())
            }
            PathStmt::Reset { path } => {
                let state = self.paths.entry(path.clone()).or_default();
                state.found = false;
                state.waypoints.clear();
                state.step = 0;
                Ok(())
            }
            PathStmt::GridSetTile { grid, x, y, walkable } => {
                let width = self
                    .game
                    .nav_grids
                    .get(grid)
                    .ok_or_else(|| SimError::UnknownNavGrid(grid.clone()))?
                    .width as i64;
                let x = self.eval(x)?.raw;
                let y = self.eval(y)?.raw;
                self.array_write(
                    &format!("{grid}_weights"),
                    y * width + x,
                    Value::u8(*walkable as u8),
                )
            }
            PathStmt::GridSetWeight { grid, x, y, weight } => {
                let width = self
                    .game
                    .nav_grids
                    .get(grid)
                    .ok_or_else(|| SimError::UnknownNavGrid(grid.clone()))?
                    .width as i64;
                let x = self.eval(x)?.raw;
                let y = self.eval(y)?.raw;
                let weight = self.eval(weight)?;
                self.array_write(&format!("{grid}_weights"), y * width + x, weight)
            }
            PathStmt::GridInit { grid } => {
                let def = self
                    .game
                    .nav_grids
                    .get(grid)
                    .ok_or_else(|| SimError::UnknownNavGrid(grid.clone()))?;
                let fresh: Vec<Value> = def.cell_weights().into_iter().map(Value::u8).collect();
                self.arrays.insert(format!("{grid}_weights"), fresh);
                Ok(())
            }
        }
    }

    // -- cutscenes, link, input, physics -----------------------------------

    fn exec_cutscene(&mut self, stmt: &CutsceneStmt) -> Result<(), SimError> {
        let name = match stmt {
            CutsceneStmt::Start { cutscene }
            | CutsceneStmt::Update { cutscene }
            | CutsceneStmt::Skip { cutscene } => cutscene.clone(),
        };
        if !self.cutscenes.contains_key(&name) {
            return Err(SimError::UnknownCutscene(name));
        }
        match stmt {
            CutsceneStmt::Start { cutscene } => {
                let state = &mut self.cutscenes[cutscene];
                state.active = true;
                state.step = 0;
                state.timer = 0;
                Ok(())
            }
            CutsceneStmt::Update { cutscene } => self.cutscene_update(cutscene),
            CutsceneStmt::Skip { cutscene } => {
                let game = self.game;
                let body = &game.cutscenes[cutscene].on_skip;
                self.execute_stmts(body)?;
                self.cutscenes[cutscene].active = false;
                Ok(())
            }
        }
    }

    fn cutscene_update(&mut self, name: &str) -> Result<(), SimError> {
        let (active, timer, step) = {
            let state = &self.cutscenes[name];
            (state.active, state.timer, state.step)
        };
        if !active {
            return Ok(());
        }
        if timer > 0 {
            self.cutscenes[name].timer = timer - 1;
            return Ok(());
        }
        let game = self.game;
        let def = &game.cutscenes[name];
        match def.steps.get(step) {
            Some(cut_step) => {
                self.execute_stmts(&cut_step.body)?;
                let state = &mut self.cutscenes[name];
                state.timer = cut_step.frames as i64;
                state.step += 1;
            }
            None => self.cutscenes[name].active = false,
        }
        Ok(())
    }

    fn exec_link(&mut self, stmt: &LinkStmt) -> Result<(), SimError> {
        match stmt {
            LinkStmt::Init => {
                self.link_data = 0;
                Ok(())
            }
            LinkStmt::Update => Ok(()),
            LinkStmt::Send { value } => {
                // Loopback: the simulated cable echoes what was sent.
                self.link_data = self.eval(value)?.raw as u8;
                Ok(())
            }
        }
    }

    fn exec_input(&mut self, stmt: &InputStmt) -> Result<(), SimError> {
        let (buffer, fill) = match stmt {
            InputStmt::Reset { buffer } => (buffer, false),
            InputStmt::Fill { buffer } => (buffer, true),
        };
        let window = self
            .game
            .input_buffers
            .get(buffer)
            .map(|b| b.window as i64)
            .ok_or_else(|| SimError::UnknownVariable(buffer.clone()))?;
        let entry = self
            .input_buffers
            .get_mut(buffer)
            .ok_or_else(|| SimError::UnknownVariable(buffer.clone()))?;
        *entry = if fill { window } else { 0 };
        Ok(())
    }

    fn exec_physics(&mut self, stmt: &PhysicsStmt) -> Result<(), SimError> {
        let Some(world) = self.game.physics.as_ref() else {
            return Ok(());
        };
        let gravity = world.gravity as i64;
        let max_fall = world.max_fall as i64;
        match stmt {
            PhysicsStmt::Apply { y_var, vel_y_var } => {
                self.physics_step(y_var, vel_y_var, gravity, max_fall, None)
            }
            PhysicsStmt::WorldUpdate => {
                let bodies: Vec<(String, String, Option<u8>)> = world
                    .bodies
                    .iter()
                    .map(|b| (b.y_var.clone(), b.vel_y_var.clone(), b.floor))
                    .collect();
                for (y, vel, floor) in bodies {
                    self.physics_step(&y, &vel, gravity, max_fall, floor)?;
                }
                Ok(())
            }
            PhysicsStmt::CollisionResponse { sprite, other } => {
                let overlap = self
                    .eval(&crate::ir::Expr::Domain(
                        crate::ir::DomainExpr::SpritesCollide(sprite.clone(), other.clone()),
                    ))?
                    .is_truthy();
                if !overlap {
                    return Ok(());
                }
                let game = self.game;
                let s = &game.sprites[sprite];
                let o = &game.sprites[other];
                let (Some((_, sy)), Some((_, oy))) = (s.position_vars(), o.position_vars())
                else {
                    return Ok(());
                };
                let height = s.hitbox.map(|h| h.height).unwrap_or(s.height) as i64;
                let top = o.hitbox.map(|h| h.y).unwrap_or(0) as i64;
                let other_y = self.var(oy)?.raw;
                self.write_var(sy, Value::new(ValueKind::U8, other_y + top - height))
            }
        }
    }

    fn physics_step(
        &mut self,
        y_var: &str,
        vel_var: &str,
        gravity: i64,
        max_fall: i64,
        floor: Option<u8>,
    ) -> Result<(), SimError> {
        let mut vel = self.var(vel_var)?.raw + gravity;
        if vel > max_fall {
            vel = max_fall;
        }
        let mut y = self.var(y_var)?.raw + vel;
        if let Some(floor) = floor {
            if y > floor as i64 {
                y = floor as i64;
                vel = 0;
            }
        }
        let vel_kind = self.var(vel_var)?.kind;
        let y_kind = self.var(y_var)?.kind;
        self.write_var(vel_var, Value::new(vel_kind, vel))?;
        self.write_var(y_var, Value::new(y_kind, y))
    }
}
