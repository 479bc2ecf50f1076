//! Remaining feature families: tween slots, input buffers, link cable,
//! cutscenes, and physics, plus the shared collision helper.

use crate::error::BuildError;
use crate::ir::{
    CutsceneStmt, Easing, InputStmt, LinkStmt, PhysicsStmt, Stmt, TweenStmt, ValueKind,
};
use crate::model::Cutscene;

use super::{Generator, MAX_TWEENS};

/// Fixed easing ids indexing the emitted `_ease_tables` pointer table.
pub(crate) fn easing_id(e: Easing) -> u8 {
    match e {
        Easing::Linear => 0,
        Easing::EaseInQuad => 1,
        Easing::EaseOutQuad => 2,
        Easing::EaseInOutQuad => 3,
        Easing::EaseInCubic => 4,
        Easing::EaseOutCubic => 5,
        Easing::EaseOutBounce => 6,
        Easing::EaseOutElastic => 7,
    }
}

/// Tween target type codes matching the runtime switch.
fn tween_type(kind: ValueKind) -> u8 {
    match kind {
        ValueKind::U8 => 0,
        ValueKind::U16 => 1,
        ValueKind::I8 => 2,
        ValueKind::I16 => 3,
    }
}

impl Generator<'_> {
    /// Category handler for the tail families: tween, input buffer, link,
    /// cutscene, physics.
    pub(crate) fn misc_stmt(&mut self, stmt: &Stmt) -> Result<bool, BuildError> {
        match stmt {
            Stmt::Tween(t) => {
                self.lower_tween(t);
                Ok(true)
            }
            Stmt::Input(i) => {
                self.lower_input(i);
                Ok(true)
            }
            Stmt::Link(l) => {
                self.lower_link(l);
                Ok(true)
            }
            Stmt::Cutscene(c) => {
                self.lower_cutscene(c);
                Ok(true)
            }
            Stmt::Physics(p) => {
                self.lower_physics(p);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn lower_tween(&mut self, stmt: &TweenStmt) {
        match stmt {
            TweenStmt::Start {
                var,
                from,
                to,
                frames,
                easing,
            } => {
                let Some(kind) = self.game.variables.get(var).map(|v| v.kind) else {
                    self.verror("tween", format!("unknown variable {var:?}"));
                    return;
                };
                self.easings.insert(*easing);
                let from = match from {
                    Some(e) => self.expr(e),
                    None => format!("(INT16){var}"),
                };
                let to = self.expr(to);
                let id = easing_id(*easing);
                self.out.line(format!(
                    "_tween_start((UINT8 *)&{var}, {}, {from}, {to}, {frames}, {id});",
                    tween_type(kind)
                ));
            }
            TweenStmt::Cancel { var } => {
                if self.known_vars.contains(var) {
                    self.out.line(format!("_tween_cancel((UINT8 *)&{var});"));
                } else {
                    self.verror("tween", format!("unknown variable {var:?}"));
                }
            }
            TweenStmt::CancelAll => {
                self.out
                    .line(format!("memset(_tween_active, 0, {MAX_TWEENS});"));
            }
        }
    }

    fn lower_input(&mut self, stmt: &InputStmt) {
        let (buffer, fill) = match stmt {
            InputStmt::Reset { buffer } => (buffer, false),
            InputStmt::Fill { buffer } => (buffer, true),
        };
        let Some(def) = self.game.input_buffers.get(buffer) else {
            self.verror("input", format!("unknown input buffer {buffer:?}"));
            return;
        };
        let value = if fill { def.window } else { 0 };
        self.out.line(format!("_inbuf_{buffer} = {value};"));
    }

    fn lower_link(&mut self, stmt: &LinkStmt) {
        if !self.game.link_cable {
            self.verror("link", "link statement without link cable support");
            return;
        }
        match stmt {
            LinkStmt::Init => self.out.line("link_init();"),
            LinkStmt::Update => self.out.line("link_update();"),
            LinkStmt::Send { value } => {
                let value = self.expr(value);
                self.out.line(format!("link_send({value});"));
            }
        }
    }

    fn lower_cutscene(&mut self, stmt: &CutsceneStmt) {
        let name = match stmt {
            CutsceneStmt::Start { cutscene }
            | CutsceneStmt::Update { cutscene }
            | CutsceneStmt::Skip { cutscene } => cutscene.clone(),
        };
        if !self.game.cutscenes.contains_key(&name) {
            self.verror("cutscene", format!("unknown cutscene {name:?}"));
            return;
        }
        match stmt {
            CutsceneStmt::Start { .. } => {
                self.out.line(format!("_{name}_active = 1;"));
                self.out.line(format!("_{name}_step = 0;"));
                self.out.line(format!("_{name}_timer = 0;"));
            }
            CutsceneStmt::Update { .. } => {
                self.out.line(format!("update_cutscene_{name}();"));
            }
            CutsceneStmt::Skip { .. } => {
                self.out.line(format!("skip_cutscene_{name}();"));
            }
        }
    }

    fn lower_physics(&mut self, stmt: &PhysicsStmt) {
        let Some(world) = self.game.physics.clone() else {
            self.verror("physics", "physics statement without a physics world");
            return;
        };
        match stmt {
            PhysicsStmt::Apply { y_var, vel_y_var } => {
                if !self.known_vars.contains(y_var) || !self.known_vars.contains(vel_y_var) {
                    self.verror(
                        "physics",
                        format!("unknown body variables ({y_var:?}, {vel_y_var:?})"),
                    );
                    return;
                }
                self.out.line(format!("{vel_y_var} += {};", world.gravity));
                self.out.open(format!("if ({vel_y_var} > {})", world.max_fall));
                self.out.line(format!("{vel_y_var} = {};", world.max_fall));
                self.out.close();
                self.out.line(format!("{y_var} += {vel_y_var};"));
            }
            PhysicsStmt::WorldUpdate => self.out.line("update_physics();"),
            PhysicsStmt::CollisionResponse { sprite, other } => {
                let overlap = self.sprites_collide_c(sprite, other);
                let Some((overlap, land_y)) = overlap else {
                    return;
                };
                self.out.open(format!("if ({overlap})"));
                self.out.line(land_y);
                self.out.close();
            }
        }
    }

    /// Overlap test plus the grounding assignment for collision response.
    fn sprites_collide_c(&mut self, sprite: &str, other: &str) -> Option<(String, String)> {
        let overlap = {
            use crate::ir::DomainExpr;
            let expr = crate::ir::Expr::Domain(DomainExpr::SpritesCollide(
                sprite.to_string(),
                other.to_string(),
            ));
            self.expr(&expr)
        };
        if overlap == "0" {
            return None;
        }
        let s = self.game.sprites.get(sprite)?;
        let o = self.game.sprites.get(other)?;
        let (_, sy) = s.position_vars()?;
        let (_, oy) = o.position_vars()?;
        let height = s.hitbox.map(|h| h.height).unwrap_or(s.height);
        let top = o.hitbox.map(|h| h.y).unwrap_or(0);
        Some((
            overlap,
            format!("{sy} = {oy} + ({top}) - {height};"),
        ))
    }

    // -- helper functions --------------------------------------------------

    pub(crate) fn gen_collision_helpers(&mut self) -> Result<(), BuildError> {
        self.begin_fn(
            "UINT8 _rect_overlap(UINT8 ax, UINT8 ay, UINT8 aw, UINT8 ah, \
             UINT8 bx, UINT8 by, UINT8 bw, UINT8 bh)",
        );
        self.out.line("if (ax + aw <= bx) { return 0; }");
        self.out.line("if (bx + bw <= ax) { return 0; }");
        self.out.line("if (ay + ah <= by) { return 0; }");
        self.out.line("if (by + bh <= ay) { return 0; }");
        self.out.line("return 1;");
        self.end_fn();
        Ok(())
    }

    pub(crate) fn gen_tween_helpers(&mut self) -> Result<(), BuildError> {
        self.begin_fn(
            "void _tween_start(UINT8 *target, UINT8 ttype, INT16 from, INT16 to, \
             UINT16 duration, UINT8 easing)",
        );
        self.out.line("UINT8 i;");
        self.out.open(format!("for (i = 0; i < {MAX_TWEENS}; ++i)"));
        self.out.open("if (!_tween_active[i])");
        self.out.line("_tween_active[i] = 1;");
        self.out.line("_tween_target_var[i] = target;");
        self.out.line("_tween_target_type[i] = ttype;");
        self.out.line("_tween_from[i] = from;");
        self.out.line("_tween_to[i] = to;");
        self.out.line("_tween_timer[i] = 0;");
        self.out.line("_tween_duration[i] = duration ? duration : 1;");
        self.out.line("_tween_easing[i] = easing;");
        self.out.line("return;");
        self.out.close();
        self.out.close();
        self.end_fn();

        self.begin_fn("UINT8 _tween_is_active(UINT8 *target)");
        self.out.line("UINT8 i;");
        self.out.open(format!("for (i = 0; i < {MAX_TWEENS}; ++i)"));
        self.out
            .open("if (_tween_active[i] && _tween_target_var[i] == target)");
        self.out.line("return 1;");
        self.out.close();
        self.out.close();
        self.out.line("return 0;");
        self.end_fn();

        self.begin_fn("void _tween_cancel(UINT8 *target)");
        self.out.line("UINT8 i;");
        self.out.open(format!("for (i = 0; i < {MAX_TWEENS}; ++i)"));
        self.out
            .open("if (_tween_active[i] && _tween_target_var[i] == target)");
        self.out.line("_tween_active[i] = 0;");
        self.out.close();
        self.out.close();
        self.end_fn();

        self.begin_fn("void update_tweens(void)");
        self.out.line("UINT8 i;");
        self.out.line("UINT8 progress;");
        self.out.line("UINT8 eased;");
        self.out.line("INT16 value;");
        self.out.open(format!("for (i = 0; i < {MAX_TWEENS}; ++i)"));
        self.out.line("if (!_tween_active[i]) { continue; }");
        self.out.line("_tween_timer[i] += 1;");
        self.out.open("if (_tween_timer[i] >= _tween_duration[i])");
        self.out.line("value = _tween_to[i];");
        self.out.line("_tween_active[i] = 0;");
        self.out.chain("} else {");
        // Rounded progress keeps integer tween steps exact.
        self.out.line(
            "progress = (UINT8)(((UINT32)_tween_timer[i] * 255 + _tween_duration[i] / 2) \
             / _tween_duration[i]);",
        );
        self.out
            .line("eased = _ease_tables[_tween_easing[i]][progress];");
        self.out.line(
            "value = _tween_from[i] + \
             (INT16)(((INT32)(_tween_to[i] - _tween_from[i]) * eased) / 255);",
        );
        self.out.close();
        self.out.open("switch (_tween_target_type[i])");
        self.out.open("case 0:");
        self.out.line("if (value < 0) { value = 0; }");
        self.out.line("if (value > 255) { value = 255; }");
        self.out.line("*_tween_target_var[i] = (UINT8)value;");
        self.out.line("break;");
        self.out.close();
        self.out
            .line("case 1: *(UINT16 *)_tween_target_var[i] = (UINT16)value; break;");
        self.out
            .line("case 2: *(INT8 *)_tween_target_var[i] = (INT8)value; break;");
        self.out
            .line("default: *(INT16 *)_tween_target_var[i] = value; break;");
        self.out.close();
        self.out.close();
        self.end_fn();
        Ok(())
    }

    pub(crate) fn gen_input_helpers(&mut self) -> Result<(), BuildError> {
        if self.game.input_buffers.is_empty() {
            return Ok(());
        }
        let buffers: Vec<(String, String, u8)> = self
            .game
            .input_buffers
            .values()
            .map(|b| (b.name.clone(), b.button.c_name().to_string(), b.window))
            .collect();
        self.begin_fn("void update_input_buffers(void)");
        for (name, button, window) in buffers {
            self.out.open(format!("if (_inbuf_{name})"));
            self.out.line(format!("_inbuf_{name} -= 1;"));
            self.out.close();
            self.out.open(format!(
                "if ((_joypad & {button}) && !(_joypad_prev & {button}))"
            ));
            self.out.line(format!("_inbuf_{name} = {window};"));
            self.out.close();
        }
        self.end_fn();
        Ok(())
    }

    pub(crate) fn gen_link_helpers(&mut self) -> Result<(), BuildError> {
        if !self.game.link_cable {
            return Ok(());
        }
        self.begin_fn("void link_init(void)");
        self.out.line("SB_REG = 0;");
        self.out.line("SC_REG = 0;");
        self.out.line("_link_data = 0;");
        self.out.line("_link_ready = 0;");
        self.end_fn();

        self.begin_fn("void link_update(void)");
        self.out.open("if (!(SC_REG & 0x80))");
        self.out.line("_link_data = SB_REG;");
        self.out.line("_link_ready = 1;");
        self.out.close();
        self.end_fn();

        self.begin_fn("void link_send(UINT8 value)");
        self.out.line("SB_REG = value;");
        self.out.line("SC_REG = 0x81;");
        self.end_fn();
        Ok(())
    }

    pub(crate) fn gen_cutscene_helpers(&mut self) -> Result<(), BuildError> {
        let cutscenes: Vec<Cutscene> = self.game.cutscenes.values().cloned().collect();
        for cutscene in &cutscenes {
            let c = cutscene.name.clone();
            self.begin_fn(&format!("void update_cutscene_{c}(void)"));
            self.out.line(format!("if (!_{c}_active) {{ return; }}"));
            self.out.open(format!("if (_{c}_timer)"));
            self.out.line(format!("_{c}_timer -= 1;"));
            self.out.line("return;");
            self.out.close();
            self.out.open(format!("switch (_{c}_step)"));
            for (i, step) in cutscene.steps.iter().enumerate() {
                self.out.open(format!("case {i}:"));
                self.stmts(&step.body)?;
                self.out.line(format!("_{c}_timer = {};", step.frames));
                self.out.line("break;");
                self.out.close();
            }
            self.out.open("default:");
            self.out.line(format!("_{c}_active = 0;"));
            self.out.line("return;");
            self.out.close();
            self.out.close();
            self.out.line(format!("_{c}_step += 1;"));
            self.end_fn();

            self.begin_fn(&format!("void skip_cutscene_{c}(void)"));
            self.stmts(&cutscene.on_skip)?;
            self.out.line(format!("_{c}_active = 0;"));
            self.end_fn();
        }
        Ok(())
    }

    pub(crate) fn gen_physics_helpers(&mut self) -> Result<(), BuildError> {
        let Some(world) = self.game.physics.clone() else {
            return Ok(());
        };
        self.begin_fn("void update_physics(void)");
        for body in &world.bodies {
            let (y, vel) = (body.y_var.clone(), body.vel_y_var.clone());
            self.out.line(format!("{vel} += {};", world.gravity));
            self.out.open(format!("if ({vel} > {})", world.max_fall));
            self.out.line(format!("{vel} = {};", world.max_fall));
            self.out.close();
            self.out.line(format!("{y} += {vel};"));
            if let Some(floor) = body.floor {
                self.out.open(format!("if ({y} > {floor})"));
                self.out.line(format!("{y} = {floor};"));
                self.out.line(format!("{vel} = 0;"));
                self.out.close();
            }
        }
        self.end_fn();
        Ok(())
    }

    // -- data --------------------------------------------------------------

    /// Tween slots, baked easing tables, and the id-indexed pointer table.
    /// Only referenced easings get a table; every other id falls back to
    /// the linear table.
    pub(crate) fn emit_tween_data(&mut self) {
        self.out.line(format!("#define MAX_TWEENS {MAX_TWEENS}"));
        self.out
            .line(format!("UINT8 _tween_active[{MAX_TWEENS}];"));
        self.out
            .line(format!("UINT8 *_tween_target_var[{MAX_TWEENS}];"));
        self.out
            .line(format!("UINT8 _tween_target_type[{MAX_TWEENS}];"));
        self.out.line(format!("INT16 _tween_from[{MAX_TWEENS}];"));
        self.out.line(format!("INT16 _tween_to[{MAX_TWEENS}];"));
        self.out
            .line(format!("UINT16 _tween_timer[{MAX_TWEENS}];"));
        self.out
            .line(format!("UINT16 _tween_duration[{MAX_TWEENS}];"));
        self.out
            .line(format!("UINT8 _tween_easing[{MAX_TWEENS}];"));
        let easings: Vec<Easing> = self.easings.iter().copied().collect();
        for easing in &easings {
            let table = easing.bake_table();
            self.out
                .open(format!("const UINT8 _ease_{}[256] =", easing.c_name()));
            for chunk in table.chunks(16) {
                self.out.line(format!(
                    "{},",
                    chunk
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
            self.out.close_with("};");
        }
        let all = [
            Easing::Linear,
            Easing::EaseInQuad,
            Easing::EaseOutQuad,
            Easing::EaseInOutQuad,
            Easing::EaseInCubic,
            Easing::EaseOutCubic,
            Easing::EaseOutBounce,
            Easing::EaseOutElastic,
        ];
        let entries = all
            .iter()
            .map(|e| {
                if self.easings.contains(e) {
                    format!("_ease_{}", e.c_name())
                } else {
                    "_ease_linear".to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        self.out
            .line(format!("const UINT8 *_ease_tables[8] = {{{entries}}};"));
        self.out.blank();
    }

    pub(crate) fn emit_misc_data(&mut self) {
        self.out.line("UINT8 _audio_tmp = 0;");
        if self.game.link_cable {
            self.out.line("UINT8 _link_data = 0;");
            self.out.line("UINT8 _link_ready = 0;");
        }
        let buffers: Vec<String> = self.game.input_buffers.keys().cloned().collect();
        for name in buffers {
            self.out.line(format!("UINT8 _inbuf_{name} = 0;"));
        }
        let cutscenes: Vec<String> = self.game.cutscenes.keys().cloned().collect();
        for name in cutscenes {
            self.out.line(format!("UINT8 _{name}_active = 0;"));
            self.out.line(format!("UINT16 _{name}_timer = 0;"));
            self.out.line(format!("UINT8 _{name}_step = 0;"));
        }
        for i in 0..self.loop_nonce {
            self.out.line(format!("UINT8 _loop{i};"));
        }
        let counters: Vec<String> = self.extra_counters.iter().cloned().collect();
        for counter in counters {
            self.out.line(format!("UINT8 {counter};"));
        }
        self.out.blank();
    }
}
