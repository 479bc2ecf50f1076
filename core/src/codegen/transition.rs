//! Transition lowering.
//!
//! A single primitive transition runs inline on the `_transition_*` state.
//! Composed trees are flattened and encoded into a compact byte stream
//! walked one step at a time by the runtime sequencer:
//!
//! ```text
//! [step_count, step_type, duration, [extra params], ..., 0]
//! ```
//!
//! Flash and shake carry two extra parameter bytes, callbacks carry their
//! table id, and a parallel step carries a nested count followed by that
//! many flat records. Nested sequences inside parallels are not supported
//! and encode as `(0, 0)` no-ops. Completion callbacks are deduplicated
//! by equality into a per-generator table.

use crate::error::BuildError;
use crate::ir::{
    flatten, FlatStep, Stmt, TransitionNode, TransitionStep, TransitionStmt, WipeDir,
};

use super::{scene_const, Generator};

pub const TSTEP_END: u8 = 0;
pub const TSTEP_FADE_OUT: u8 = 1;
pub const TSTEP_FADE_IN: u8 = 2;
pub const TSTEP_FLASH: u8 = 3;
pub const TSTEP_WIPE_L: u8 = 4;
pub const TSTEP_WIPE_R: u8 = 5;
pub const TSTEP_WIPE_U: u8 = 6;
pub const TSTEP_WIPE_D: u8 = 7;
pub const TSTEP_IRIS_OUT: u8 = 8;
pub const TSTEP_IRIS_IN: u8 = 9;
pub const TSTEP_WAIT: u8 = 10;
pub const TSTEP_SHAKE: u8 = 11;
pub const TSTEP_CALLBACK: u8 = 12;
pub const TSTEP_PARALLEL: u8 = 13;

/// Encode a composed-transition tree. Callback steps resolve to the
/// sentinel id 255; the generator's internal path interns real ids.
pub fn encode_sequence(node: &TransitionNode) -> Vec<u8> {
    encode_with(node, &mut |_| 255)
}

fn encode_with<F: FnMut(&[Stmt]) -> u8>(node: &TransitionNode, resolve: &mut F) -> Vec<u8> {
    let steps = flatten(node);
    let mut out = vec![steps.len() as u8];
    for step in &steps {
        encode_step(step, &mut out, resolve);
    }
    out.push(TSTEP_END);
    out
}

fn encode_step<F: FnMut(&[Stmt]) -> u8>(step: &FlatStep, out: &mut Vec<u8>, resolve: &mut F) {
    let dur = |frames: u16| frames.min(255) as u8;
    match step {
        FlatStep::FadeOut(frames) => out.extend([TSTEP_FADE_OUT, dur(*frames)]),
        FlatStep::FadeIn(frames) => out.extend([TSTEP_FADE_IN, dur(*frames)]),
        FlatStep::Flash { color, frames } => out.extend([
            TSTEP_FLASH,
            dur(*frames),
            (*color & 0xFF) as u8,
            (*color >> 8) as u8,
        ]),
        FlatStep::Wipe { dir, frames } => {
            let t = match dir {
                WipeDir::Left => TSTEP_WIPE_L,
                WipeDir::Right => TSTEP_WIPE_R,
                WipeDir::Up => TSTEP_WIPE_U,
                WipeDir::Down => TSTEP_WIPE_D,
            };
            out.extend([t, dur(*frames)]);
        }
        FlatStep::Iris { open, frames } => {
            let t = if *open { TSTEP_IRIS_IN } else { TSTEP_IRIS_OUT };
            out.extend([t, dur(*frames)]);
        }
        FlatStep::Wait(frames) => out.extend([TSTEP_WAIT, dur(*frames)]),
        FlatStep::Shake {
            intensity,
            decay,
            frames,
        } => out.extend([TSTEP_SHAKE, dur(*frames), *intensity, *decay]),
        FlatStep::Callback(body) => {
            let id = resolve(body);
            out.extend([TSTEP_CALLBACK, 0, id]);
        }
        FlatStep::Parallel(children) => {
            out.push(TSTEP_PARALLEL);
            out.push(children.len() as u8);
            for child in children {
                encode_step(child, out, resolve);
            }
        }
        FlatStep::Nop => out.extend([TSTEP_END, 0]),
    }
}

impl Generator<'_> {
    /// Category handler for transition statements.
    pub(crate) fn transition_stmt(&mut self, stmt: &Stmt) -> Result<bool, BuildError> {
        let Stmt::Transition(t) = stmt else {
            return Ok(false);
        };
        match t {
            TransitionStmt::Start {
                step,
                to_scene,
                on_complete,
            } => {
                if let TransitionStep::Callback(body) = step {
                    // A bare callback step has nothing to sequence.
                    let id = self.intern_callback(body);
                    self.out.line(format!("_run_transition_callback({id});"));
                    return Ok(true);
                }
                self.lower_target_scene(to_scene.as_deref());
                match on_complete {
                    Some(body) => {
                        let id = self.intern_callback(body);
                        self.out.line(format!("_transition_callback = {id};"));
                    }
                    None => self.out.line("_transition_callback = 255;"),
                }
                self.lower_primitive(step);
            }
            TransitionStmt::Composed { node, to_scene } => {
                let encoded = encode_with(node, &mut |body| self.intern_callback(body));
                let id = self.intern_sequence(encoded);
                self.lower_target_scene(to_scene.as_deref());
                self.out.line(format!("_trans_seq_id = {id};"));
                self.out.line("_trans_seq_step = 0;");
                self.out.line("_trans_seq_timer = 0;");
                self.out.line("_trans_seq_active = 1;");
            }
            TransitionStmt::Cancel => {
                self.out.line("_transition_type = TSTEP_END;");
                self.out.line("_trans_seq_active = 0;");
                self.out.line("_transition_callback = 255;");
                self.out.line("_trans_target_scene = SCENE_NONE;");
                self.out.line("_apply_fade(0);");
            }
        }
        Ok(true)
    }

    fn lower_target_scene(&mut self, to_scene: Option<&str>) {
        match to_scene {
            Some(scene) if self.game.scenes.contains_key(scene) => {
                self.out
                    .line(format!("_trans_target_scene = {};", scene_const(scene)));
            }
            Some(scene) => {
                self.verror("transition", format!("unknown scene {scene:?}"));
                self.out.line("_trans_target_scene = SCENE_NONE;");
            }
            None => self.out.line("_trans_target_scene = SCENE_NONE;"),
        }
    }

    fn lower_primitive(&mut self, step: &TransitionStep) {
        let (type_name, frames) = match step {
            TransitionStep::FadeOut(f) => ("TSTEP_FADE_OUT", *f),
            TransitionStep::FadeIn(f) => ("TSTEP_FADE_IN", *f),
            TransitionStep::Flash { color, frames } => {
                self.out
                    .line(format!("_transition_flash_color = 0x{color:04X};"));
                ("TSTEP_FLASH", *frames)
            }
            TransitionStep::Wipe { dir, frames } => (
                match dir {
                    WipeDir::Left => "TSTEP_WIPE_L",
                    WipeDir::Right => "TSTEP_WIPE_R",
                    WipeDir::Up => "TSTEP_WIPE_U",
                    WipeDir::Down => "TSTEP_WIPE_D",
                },
                *frames,
            ),
            TransitionStep::Iris { open, frames } => {
                self.out.line("_transition_center_x = 80;");
                self.out.line("_transition_center_y = 72;");
                (if *open { "TSTEP_IRIS_IN" } else { "TSTEP_IRIS_OUT" }, *frames)
            }
            TransitionStep::Wait(f) => ("TSTEP_WAIT", *f),
            TransitionStep::Shake {
                intensity, frames, ..
            } => {
                self.out
                    .line(format!("_camera_shake_intensity = {intensity};"));
                self.out.line(format!("_camera_shake_timer = {frames};"));
                ("TSTEP_SHAKE", *frames)
            }
            TransitionStep::Callback(_) => unreachable!("handled by the caller"),
        };
        self.out.line(format!("_transition_type = {type_name};"));
        self.out.line("_transition_timer = 0;");
        self.out.line(format!("_transition_duration = {frames};"));
    }

    // -- helper functions --------------------------------------------------

    /// Callback bodies become numbered functions so the dispatch switch
    /// stays flat. Bodies can intern further callbacks; loop until the
    /// table stops growing.
    pub(crate) fn gen_callback_runner(&mut self) -> Result<(), BuildError> {
        let mut i = 0;
        while i < self.callbacks.len() {
            let body = self.callbacks[i].clone();
            self.begin_fn(&format!("void _trans_cb_{i}(void)"));
            self.stmts(&body)?;
            self.end_fn();
            i += 1;
        }
        self.begin_fn("void _run_transition_callback(UINT8 id)");
        if self.callbacks.is_empty() {
            self.out.line("(void)id;");
        } else {
            self.out.open("switch (id)");
            for id in 0..self.callbacks.len() {
                self.out.line(format!("case {id}: _trans_cb_{id}(); break;"));
            }
            self.out.close();
        }
        self.end_fn();
        Ok(())
    }

    pub(crate) fn gen_transition_helpers(&mut self) -> Result<(), BuildError> {
        self.gen_update_transition();
        self.gen_sequence_update();
        Ok(())
    }

    fn gen_update_transition(&mut self) {
        self.begin_fn("void update_transition(void)");
        self.out.line("UINT8 level;");
        self.out.line("if (_transition_type == TSTEP_END) { return; }");
        self.out.line("_transition_timer += 1;");
        self.out.line(
            "level = (_transition_duration > 0) ? \
             (UINT8)((_transition_timer * 3) / _transition_duration) : 3;",
        );
        self.out.line("if (level > 3) { level = 3; }");
        self.out.open("switch (_transition_type)");
        // Wipes and irises fall back to the palette fade; only the
        // scene-change timing is contractual.
        self.out.line("case TSTEP_FADE_OUT:");
        self.out.line("case TSTEP_WIPE_L:");
        self.out.line("case TSTEP_WIPE_R:");
        self.out.line("case TSTEP_WIPE_U:");
        self.out.line("case TSTEP_WIPE_D:");
        self.out.open("case TSTEP_IRIS_OUT:");
        self.out.line("_apply_fade(level);");
        self.out.line("break;");
        self.out.close();
        self.out.line("case TSTEP_FADE_IN:");
        self.out.open("case TSTEP_IRIS_IN:");
        self.out.line("_apply_fade(3 - level);");
        self.out.line("break;");
        self.out.close();
        self.out.open("case TSTEP_FLASH:");
        self.out.line("BGP_REG = 0x00;");
        self.out.line("OBP0_REG = 0x00;");
        self.out.line("break;");
        self.out.close();
        self.out.open("default:");
        self.out.line("break;");
        self.out.close();
        self.out.close();
        self.out.open("if (_transition_timer >= _transition_duration)");
        self.out.open("if (_transition_type == TSTEP_FLASH)");
        self.out.line("_apply_fade(0);");
        self.out.close();
        self.out.line("_transition_type = TSTEP_END;");
        self.out.open("if (_trans_target_scene != SCENE_NONE && !_trans_seq_active)");
        self.out.line("change_scene(_trans_target_scene);");
        self.out.line("_trans_target_scene = SCENE_NONE;");
        self.out.close();
        self.out.open("if (_transition_callback != 255)");
        self.out.line("_run_transition_callback(_transition_callback);");
        self.out.line("_transition_callback = 255;");
        self.out.close();
        self.out.close();
        self.end_fn();
    }

    fn gen_sequence_update(&mut self) {
        if self.sequences.is_empty() {
            self.begin_fn("void update_trans_sequence(void)");
            self.out.line("_trans_seq_active = 0;");
            self.end_fn();
            return;
        }

        self.begin_fn("UINT8 _trans_step_size(const UINT8 *step)");
        self.out.line("UINT8 n;");
        self.out.line("UINT8 size;");
        self.out.line("UINT8 i;");
        self.out.open("switch (step[0])");
        self.out.line("case TSTEP_FLASH:");
        self.out.line("case TSTEP_SHAKE: return 4;");
        self.out.line("case TSTEP_CALLBACK: return 3;");
        self.out.open("case TSTEP_PARALLEL:");
        self.out.line("n = step[1];");
        self.out.line("size = 2;");
        self.out.open("for (i = 0; i < n; ++i)");
        self.out.line("size += _trans_step_size(step + size);");
        self.out.close();
        self.out.line("return size;");
        self.out.close();
        self.out.line("default: return 2;");
        self.out.close();
        self.end_fn();

        self.begin_fn("void _trans_start_step(UINT8 t, UINT8 d, UINT8 p1, UINT8 p2)");
        self.out.open("switch (t)");
        self.out.line("case TSTEP_END: break;");
        self.out.line("case TSTEP_WAIT: _trans_seq_timer = d; break;");
        self.out.open("case TSTEP_SHAKE:");
        self.out.line("_camera_shake_intensity = p1;");
        self.out.line("_camera_shake_timer = d;");
        self.out.line("(void)p2;");
        self.out.line("break;");
        self.out.close();
        self.out.line("case TSTEP_CALLBACK: _run_transition_callback(p1); break;");
        self.out.open("case TSTEP_FLASH:");
        self.out
            .line("_transition_flash_color = p1 | ((UINT16)p2 << 8);");
        self.out.line("_transition_type = TSTEP_FLASH;");
        self.out.line("_transition_timer = 0;");
        self.out.line("_transition_duration = d;");
        self.out.line("break;");
        self.out.close();
        self.out.open("default:");
        self.out.line("_transition_type = t;");
        self.out.line("_transition_timer = 0;");
        self.out.line("_transition_duration = d;");
        self.out.line("break;");
        self.out.close();
        self.out.close();
        self.end_fn();

        self.begin_fn("void update_trans_sequence(void)");
        self.out.line("const UINT8 *seq;");
        self.out.line("UINT8 count;");
        self.out.line("UINT8 offset;");
        self.out.line("UINT8 i;");
        self.out.line("UINT8 t;");
        self.out.line("UINT8 d;");
        self.out.line("UINT8 n;");
        self.out.line("UINT8 inner;");
        self.out.line("if (!_trans_seq_active) { return; }");
        self.out.open("if (_trans_seq_timer)");
        self.out.line("_trans_seq_timer -= 1;");
        self.out.line("return;");
        self.out.close();
        self.out.line("if (_transition_type != TSTEP_END) { return; }");
        self.out.line("seq = _trans_seqs[_trans_seq_id];");
        self.out.line("count = seq[0];");
        self.out.open("if (_trans_seq_step >= count)");
        self.out.line("_trans_seq_active = 0;");
        self.out.open("if (_trans_target_scene != SCENE_NONE)");
        self.out.line("change_scene(_trans_target_scene);");
        self.out.line("_trans_target_scene = SCENE_NONE;");
        self.out.close();
        self.out.line("return;");
        self.out.close();
        self.out.line("offset = 1;");
        self.out.open("for (i = 0; i < _trans_seq_step; ++i)");
        self.out.line("offset += _trans_step_size(seq + offset);");
        self.out.close();
        self.out.line("t = seq[offset];");
        self.out.line("d = seq[offset + 1];");
        self.out.line("_trans_seq_step += 1;");
        self.out.open("if (t == TSTEP_PARALLEL)");
        self.out.line("n = seq[offset + 1];");
        self.out.line("inner = offset + 2;");
        self.out.open("for (i = 0; i < n; ++i)");
        self.out
            .open("if (seq[inner] == TSTEP_FLASH || seq[inner] == TSTEP_SHAKE)");
        self.out.line(
            "_trans_start_step(seq[inner], seq[inner + 1], seq[inner + 2], seq[inner + 3]);",
        );
        self.out.chain("} else if (seq[inner] == TSTEP_CALLBACK) {");
        self.out
            .line("_trans_start_step(seq[inner], 0, seq[inner + 2], 0);");
        self.out.chain("} else {");
        self.out
            .line("_trans_start_step(seq[inner], seq[inner + 1], 0, 0);");
        self.out.close();
        self.out.line("inner += _trans_step_size(seq + inner);");
        self.out.close();
        self.out.chain("} else if (t == TSTEP_FLASH || t == TSTEP_SHAKE) {");
        self.out
            .line("_trans_start_step(t, d, seq[offset + 2], seq[offset + 3]);");
        self.out.chain("} else if (t == TSTEP_CALLBACK) {");
        self.out.line("_trans_start_step(t, 0, seq[offset + 2], 0);");
        self.out.chain("} else {");
        self.out.line("_trans_start_step(t, d, 0, 0);");
        self.out.close();
        self.end_fn();
    }

    // -- data --------------------------------------------------------------

    pub(crate) fn emit_transition_data(&mut self) {
        for (name, value) in [
            ("TSTEP_END", TSTEP_END),
            ("TSTEP_FADE_OUT", TSTEP_FADE_OUT),
            ("TSTEP_FADE_IN", TSTEP_FADE_IN),
            ("TSTEP_FLASH", TSTEP_FLASH),
            ("TSTEP_WIPE_L", TSTEP_WIPE_L),
            ("TSTEP_WIPE_R", TSTEP_WIPE_R),
            ("TSTEP_WIPE_U", TSTEP_WIPE_U),
            ("TSTEP_WIPE_D", TSTEP_WIPE_D),
            ("TSTEP_IRIS_OUT", TSTEP_IRIS_OUT),
            ("TSTEP_IRIS_IN", TSTEP_IRIS_IN),
            ("TSTEP_WAIT", TSTEP_WAIT),
            ("TSTEP_SHAKE", TSTEP_SHAKE),
            ("TSTEP_CALLBACK", TSTEP_CALLBACK),
            ("TSTEP_PARALLEL", TSTEP_PARALLEL),
        ] {
            self.out.line(format!("#define {name} {value}"));
        }
        self.out.line("UINT8 _transition_type = 0;");
        self.out.line("UINT16 _transition_timer = 0;");
        self.out.line("UINT16 _transition_duration = 0;");
        self.out.line("UINT16 _transition_flash_color = 0;");
        self.out.line("UINT8 _transition_center_x = 80;");
        self.out.line("UINT8 _transition_center_y = 72;");
        self.out.line("UINT8 _transition_callback = 255;");
        self.out.line("UINT8 _trans_target_scene = SCENE_NONE;");
        self.out.line("UINT8 _trans_seq_id = 255;");
        self.out.line("UINT8 _trans_seq_step = 0;");
        self.out.line("UINT16 _trans_seq_timer = 0;");
        self.out.line("UINT8 _trans_seq_active = 0;");
        self.out
            .line("const UINT8 _fade_levels[4] = {0xE4, 0xF9, 0xFE, 0xFF};");
        if self.game.gbc {
            self.out.line("UINT16 _pal_buf[4];");
        }
        let sequences = self.sequences.clone();
        for (id, bytes) in sequences.iter().enumerate() {
            self.out.line(format!(
                "const UINT8 _trans_seq_{id}[] = {{{}}};",
                bytes
                    .iter()
                    .map(|b| b.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        if !sequences.is_empty() {
            self.out.line(format!(
                "const UINT8 *_trans_seqs[] = {{{}}};",
                (0..sequences.len())
                    .map(|i| format!("_trans_seq_{i}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        self.out.blank();
    }
}
