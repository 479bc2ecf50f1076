//! Animation lowering: play/stop/pause/queue statements, the per-sprite
//! update functions, and the baked frame tables.
//!
//! Pool animations are deliberately simpler than sprite animations: no
//! speed modulation, no pause, no queue. A pool entry carries anim,
//! frame, timer, and a completion flag, advanced inside the pool update.

use crate::error::BuildError;
use crate::ir::{AnimStmt, AnimTarget, Stmt};
use crate::model::Animation;

use super::{anim_const, Generator, ANIM_QUEUE_MAX};

/// A resolved animation target: a sprite name, or a pool name plus the
/// expression indexing the current slot.
enum AnimSlot {
    Sprite(String),
    Pool(String, String),
}

/// Animation flag bits; positions are fixed runtime contract.
pub(crate) const FLAG_LOOPING: u8 = 0x01;
pub(crate) const FLAG_PAUSED: u8 = 0x02;
pub(crate) const FLAG_REVERSED: u8 = 0x04;
pub(crate) const FLAG_COMPLETE: u8 = 0x08;

impl Generator<'_> {
    /// Category handler for animation statements.
    pub(crate) fn anim_stmt(&mut self, stmt: &Stmt) -> Result<bool, BuildError> {
        let Stmt::Anim(a) = stmt else {
            return Ok(false);
        };
        match a {
            AnimStmt::Play { target, anim } => self.lower_anim_play(target, anim),
            AnimStmt::Stop { target } => match self.anim_target(target, "stop") {
                Some(AnimSlot::Sprite(s)) => self.out.line(format!("_{s}_anim = ANIM_NONE;")),
                Some(AnimSlot::Pool(p, i)) => {
                    self.out.line(format!("{p}_anim[{i}] = ANIM_NONE;"))
                }
                None => {}
            },
            AnimStmt::Pause { target } => {
                if let Some(s) = self.sprite_only(target, "pause") {
                    self.out.line(format!("_{s}_flags |= ANIM_FLAG_PAUSED;"));
                }
            }
            AnimStmt::Resume { target } => {
                if let Some(s) = self.sprite_only(target, "resume") {
                    self.out
                        .line(format!("_{s}_flags &= (UINT8)~ANIM_FLAG_PAUSED;"));
                }
            }
            AnimStmt::SetSpeed { target, speed } => {
                if let Some(s) = self.sprite_only(target, "set speed") {
                    let speed = self.expr(speed);
                    self.out.line(format!("_{s}_speed = {speed};"));
                }
            }
            AnimStmt::SetFrame { target, frame } => match self.anim_target(target, "set frame") {
                Some(AnimSlot::Sprite(s)) => {
                    let frame = self.expr(frame);
                    let oam = self.game.sprites[&s].oam_slot;
                    self.out.line(format!("_{s}_frame = {frame};"));
                    self.out.open(format!("if (_{s}_anim != ANIM_NONE)"));
                    self.out.line(format!(
                        "set_sprite_tile({oam}, {s}_anims[_{s}_anim][_{s}_frame]);"
                    ));
                    self.out.close();
                }
                Some(AnimSlot::Pool(p, i)) => {
                    let frame = self.expr(frame);
                    self.out.line(format!("{p}_frame[{i}] = {frame};"));
                }
                None => {}
            },
            AnimStmt::Queue { target, anim } => {
                let Some(s) = self.sprite_only(target, "queue") else {
                    return Ok(true);
                };
                let Some(constant) = self.sprite_anim_const(&s, anim) else {
                    return Ok(true);
                };
                self.out
                    .open(format!("if (_{s}_queue_len < {ANIM_QUEUE_MAX})"));
                self.out
                    .line(format!("_{s}_queue[_{s}_queue_len] = {constant};"));
                self.out.line(format!("_{s}_queue_len += 1;"));
                self.out.close();
            }
        }
        Ok(true)
    }

    fn lower_anim_play(&mut self, target: &AnimTarget, anim: &str) {
        match self.anim_target(target, "play") {
            Some(AnimSlot::Sprite(s)) => {
                let Some(constant) = self.sprite_anim_const(&s, anim) else {
                    return;
                };
                let sprite = &self.game.sprites[&s];
                let def = &sprite.animations[anim];
                let oam = sprite.oam_slot;
                let delay = def.delay;
                let flags = if def.looping { FLAG_LOOPING } else { 0 };
                let first = self.frame_tile(&s, anim, 0);
                self.out.line(format!("_{s}_anim = {constant};"));
                self.out.line(format!("_{s}_frame = 0;"));
                self.out.line(format!("_{s}_timer = {delay};"));
                self.out.line(format!("_{s}_flags = 0x{flags:02X};"));
                self.out.line(format!("_{s}_queue_len = 0;"));
                self.out.line(format!("set_sprite_tile({oam}, {first});"));
            }
            Some(AnimSlot::Pool(p, i)) => {
                let Some(def) = self.game.pools[&p].animations.get(anim) else {
                    self.verror("anim", format!("unknown animation {anim:?} on pool {p:?}"));
                    return;
                };
                let delay = def.delay;
                let constant = anim_const(&p, anim);
                self.out.line(format!("{p}_anim[{i}] = {constant};"));
                self.out.line(format!("{p}_frame[{i}] = 0;"));
                self.out.line(format!("{p}_timer[{i}] = {delay};"));
                self.out.line(format!("{p}_anim_complete[{i}] = 0;"));
            }
            None => {}
        }
    }

    /// Resolve an animation target, reporting unknown references.
    fn anim_target(&mut self, target: &AnimTarget, what: &str) -> Option<AnimSlot> {
        match target {
            AnimTarget::Sprite(s) => {
                if self.game.sprites.contains_key(s) {
                    Some(AnimSlot::Sprite(s.clone()))
                } else {
                    self.verror("anim", format!("unknown sprite {s:?} in animation {what}"));
                    None
                }
            }
            AnimTarget::Pool(p) => {
                if let Some(pool) = self.game.pools.get(p) {
                    Some(AnimSlot::Pool(p.clone(), pool.slot_var()))
                } else {
                    self.verror("anim", format!("unknown pool {p:?} in animation {what}"));
                    None
                }
            }
        }
    }

    /// Pool animations are not speed-modulated; sprite-only operations on
    /// a pool target degrade to a validation error.
    fn sprite_only(&mut self, target: &AnimTarget, what: &str) -> Option<String> {
        match self.anim_target(target, what)? {
            AnimSlot::Sprite(s) => Some(s),
            AnimSlot::Pool(p, _) => {
                self.verror(
                    "anim",
                    format!("pool {p:?} animations do not support {what}"),
                );
                None
            }
        }
    }

    pub(crate) fn sprite_anim_const(&mut self, sprite: &str, anim: &str) -> Option<String> {
        if self
            .game
            .sprites
            .get(sprite)
            .is_some_and(|s| s.animations.contains_key(anim))
        {
            Some(anim_const(sprite, anim))
        } else {
            self.verror(
                "anim",
                format!("unknown animation {anim:?} on sprite {sprite:?}"),
            );
            None
        }
    }

    /// Tile index for one frame, adjusted by the asset's base slot.
    fn frame_tile(&self, sprite: &str, anim: &str, frame: usize) -> u8 {
        let s = &self.game.sprites[sprite];
        let base = self.sprite_bases.get(&s.asset).copied().unwrap_or(0);
        let def = &s.animations[anim];
        base.wrapping_add(def.frames.get(frame).copied().unwrap_or(0))
    }

    // -- update functions --------------------------------------------------

    pub(crate) fn gen_anim_helpers(&mut self) -> Result<(), BuildError> {
        let sprites: Vec<String> = self
            .game
            .sprites
            .values()
            .filter(|s| !s.animations.is_empty())
            .map(|s| s.name.clone())
            .collect();
        if sprites.is_empty() {
            return Ok(());
        }
        for name in &sprites {
            self.gen_play_queued(name);
            self.gen_sprite_updater(name)?;
        }
        self.begin_fn("void update_animations(void)");
        for name in &sprites {
            self.out.line(format!("update_anim_{name}();"));
        }
        self.end_fn();
        Ok(())
    }

    fn gen_play_queued(&mut self, s: &str) {
        self.begin_fn(&format!("void _{s}_play_queued(void)"));
        self.out.line("UINT8 i;");
        self.out.line(format!("_{s}_anim = _{s}_queue[0];"));
        self.out.open(format!("for (i = 1; i < _{s}_queue_len; ++i)"));
        self.out.line(format!("_{s}_queue[i - 1] = _{s}_queue[i];"));
        self.out.close();
        self.out.line(format!("_{s}_queue_len -= 1;"));
        self.out.line(format!("_{s}_frame = 0;"));
        self.out.line(format!("_{s}_timer = {s}_anim_delays[_{s}_anim];"));
        self.out.line(format!(
            "_{s}_flags = {s}_anim_loops[_{s}_anim] ? ANIM_FLAG_LOOPING : 0;"
        ));
        self.end_fn();
    }

    fn gen_sprite_updater(&mut self, s: &str) -> Result<(), BuildError> {
        let sprite = &self.game.sprites[s];
        let oam = sprite.oam_slot;
        let completions: Vec<(String, Animation)> = sprite
            .animations
            .iter()
            .filter(|(_, a)| a.on_complete.is_some())
            .map(|(n, a)| (n.clone(), a.clone()))
            .collect();
        let events: Vec<(String, Animation)> = sprite
            .animations
            .iter()
            .filter(|(_, a)| !a.frame_events.is_empty())
            .map(|(n, a)| (n.clone(), a.clone()))
            .collect();
        let s = s.to_string();

        self.begin_fn(&format!("void update_anim_{s}(void)"));
        self.out.line("UINT8 ticks;");
        self.out.line("UINT8 ended;");
        self.out.open(format!(
            "if (_{s}_anim == ANIM_NONE || (_{s}_flags & ANIM_FLAG_PAUSED))"
        ));
        self.out.line("return;");
        self.out.close();
        self.out
            .line(format!("ticks = (_{s}_speed >= 100) ? (_{s}_speed / 100) : 1;"));
        self.out.open(format!("if (_{s}_timer > ticks)"));
        self.out.line(format!("_{s}_timer -= ticks;"));
        self.out.line("return;");
        self.out.close();
        self.out.line("ended = 0;");
        self.out.open(format!("if (_{s}_flags & ANIM_FLAG_REVERSED)"));
        self.out.open(format!("if (_{s}_frame == 0)"));
        self.out.line("ended = 1;");
        self.out.chain("} else {");
        self.out.line(format!("_{s}_frame -= 1;"));
        self.out.close();
        self.out.chain("} else {");
        self.out
            .open(format!("if (_{s}_frame + 1 >= {s}_anim_lens[_{s}_anim])"));
        self.out.line("ended = 1;");
        self.out.chain("} else {");
        self.out.line(format!("_{s}_frame += 1;"));
        self.out.close();
        self.out.close();

        self.out.open("if (ended)");
        self.out.open(format!("if (_{s}_flags & ANIM_FLAG_LOOPING)"));
        self.out.line(format!(
            "_{s}_frame = (_{s}_flags & ANIM_FLAG_REVERSED) ? {s}_anim_lens[_{s}_anim] - 1 : 0;"
        ));
        self.out.chain("} else {");
        self.out.line(format!("_{s}_flags |= ANIM_FLAG_COMPLETE;"));
        if !completions.is_empty() {
            self.out.open(format!("switch (_{s}_anim)"));
            for (anim, def) in &completions {
                self.out.open(format!("case {}:", anim_const(&s, anim)));
                if let Some(body) = &def.on_complete {
                    self.stmts(body)?;
                }
                self.out.line("break;");
                self.out.close();
            }
            self.out.close();
            // A completion hook may have started a new animation; the
            // cleared COMPLETE flag marks that.
            self.out
                .open(format!("if (!(_{s}_flags & ANIM_FLAG_COMPLETE))"));
            self.out.line("return;");
            self.out.close();
        }
        self.out.open(format!("if (_{s}_queue_len)"));
        self.out.line(format!("_{s}_play_queued();"));
        self.out.chain("} else {");
        self.out.line(format!("_{s}_anim = ANIM_NONE;"));
        self.out.line("return;");
        self.out.close();
        self.out.close();
        self.out.close();

        self.out.line(format!(
            "set_sprite_tile({oam}, {s}_anims[_{s}_anim][_{s}_frame]);"
        ));
        if !events.is_empty() {
            self.out.open(format!("switch (_{s}_anim)"));
            for (anim, def) in &events {
                self.out.open(format!("case {}:", anim_const(&s, anim)));
                self.out.open(format!("switch (_{s}_frame)"));
                for (frame, body) in &def.frame_events {
                    self.out.open(format!("case {frame}:"));
                    self.stmts(body)?;
                    self.out.line("break;");
                    self.out.close();
                }
                self.out.close();
                self.out.line("break;");
                self.out.close();
            }
            self.out.close();
        }
        self.out.line(format!(
            "_{s}_timer = (_{s}_speed > 0 && _{s}_speed < 100) ? \
             ({s}_anim_delays[_{s}_anim] * 100) / _{s}_speed : {s}_anim_delays[_{s}_anim];"
        ));
        self.end_fn();
        Ok(())
    }

    // -- data --------------------------------------------------------------

    /// Per-sprite animation constants, frame arrays, metadata tables, and
    /// runtime state variables.
    pub(crate) fn emit_anim_data(&mut self) {
        let sprites: Vec<String> = self
            .game
            .sprites
            .values()
            .filter(|s| !s.animations.is_empty())
            .map(|s| s.name.clone())
            .collect();
        let pools: Vec<String> = self
            .game
            .pools
            .values()
            .filter(|p| !p.animations.is_empty())
            .map(|p| p.name.clone())
            .collect();
        if sprites.is_empty() && pools.is_empty() {
            return;
        }
        self.out.line("#define ANIM_NONE 255");
        self.out.line(format!("#define ANIM_FLAG_LOOPING 0x{FLAG_LOOPING:02X}"));
        self.out.line(format!("#define ANIM_FLAG_PAUSED 0x{FLAG_PAUSED:02X}"));
        self.out
            .line(format!("#define ANIM_FLAG_REVERSED 0x{FLAG_REVERSED:02X}"));
        self.out
            .line(format!("#define ANIM_FLAG_COMPLETE 0x{FLAG_COMPLETE:02X}"));
        self.out.blank();

        for name in sprites {
            self.emit_sprite_anim_tables(&name);
        }
        for name in pools {
            self.emit_pool_anim_tables(&name);
        }
    }

    fn emit_sprite_anim_tables(&mut self, s: &str) {
        let sprite = self.game.sprites[s].clone();
        let base = self
            .sprite_bases
            .get(&sprite.asset)
            .copied()
            .unwrap_or(0);
        for (idx, (anim, _)) in sprite.animations.iter().enumerate() {
            self.out
                .line(format!("#define {} {idx}", anim_const(s, anim)));
        }
        for (anim, def) in &sprite.animations {
            let frames = self.anim_frame_bytes(s, anim, def, base);
            self.out.line(format!(
                "const UINT8 {s}_{anim}_frames[] = {{{}}};",
                frames
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        let names: Vec<&String> = sprite.animations.keys().collect();
        self.out.line(format!(
            "const UINT8 *{s}_anims[] = {{{}}};",
            names
                .iter()
                .map(|a| format!("{s}_{a}_frames"))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        self.out.line(format!(
            "const UINT8 {s}_anim_lens[] = {{{}}};",
            sprite
                .animations
                .values()
                .map(|a| a.frames.len().max(1).to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        self.out.line(format!(
            "const UINT8 {s}_anim_delays[] = {{{}}};",
            sprite
                .animations
                .values()
                .map(|a| a.delay.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        self.out.line(format!(
            "const UINT8 {s}_anim_loops[] = {{{}}};",
            sprite
                .animations
                .values()
                .map(|a| (a.looping as u8).to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        self.out.line(format!("UINT8 _{s}_anim = ANIM_NONE;"));
        self.out.line(format!("UINT8 _{s}_frame = 0;"));
        self.out.line(format!("UINT8 _{s}_timer = 0;"));
        self.out.line(format!("UINT8 _{s}_speed = 100;"));
        self.out.line(format!("UINT8 _{s}_flags = 0;"));
        self.out
            .line(format!("UINT8 _{s}_queue[{ANIM_QUEUE_MAX}];"));
        self.out.line(format!("UINT8 _{s}_queue_len = 0;"));
        self.out.blank();
    }

    fn emit_pool_anim_tables(&mut self, p: &str) {
        let pool = self.game.pools[p].clone();
        let base = pool
            .sprite
            .as_ref()
            .and_then(|a| self.sprite_bases.get(a).copied())
            .unwrap_or(0);
        for (idx, (anim, _)) in pool.animations.iter().enumerate() {
            self.out
                .line(format!("#define {} {idx}", anim_const(p, anim)));
        }
        for (anim, def) in &pool.animations {
            let frames = self.anim_frame_bytes(p, anim, def, base);
            self.out.line(format!(
                "const UINT8 {p}_{anim}_frames[] = {{{}}};",
                frames
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        let names: Vec<&String> = pool.animations.keys().collect();
        self.out.line(format!(
            "const UINT8 *{p}_anims[] = {{{}}};",
            names
                .iter()
                .map(|a| format!("{p}_{a}_frames"))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        self.out.line(format!(
            "const UINT8 {p}_anim_lens[] = {{{}}};",
            pool.animations
                .values()
                .map(|a| a.frames.len().max(1).to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        self.out.line(format!(
            "const UINT8 {p}_anim_delays[] = {{{}}};",
            pool.animations
                .values()
                .map(|a| a.delay.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        self.out.line(format!(
            "const UINT8 {p}_anim_loops[] = {{{}}};",
            pool.animations
                .values()
                .map(|a| (a.looping as u8).to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        self.out.blank();
    }

    /// Base-adjusted frame bytes; empty animations degrade to a one-frame
    /// placeholder with a warning comment.
    fn anim_frame_bytes(&mut self, owner: &str, anim: &str, def: &Animation, base: u8) -> Vec<u8> {
        if def.frames.is_empty() {
            log::warn!("animation {owner}.{anim} has no frames; emitting placeholder");
            self.out.line(format!(
                "/* WARNING: animation {owner}.{anim} has no frames; 1-frame placeholder */"
            ));
            return vec![base];
        }
        def.frames.iter().map(|f| base.wrapping_add(*f)).collect()
    }
}
