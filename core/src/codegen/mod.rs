//! C code generator.
//!
//! Lowers a frozen [`GameModel`] plus its recorded IR into one C
//! translation unit. Core control flow is lowered inline; every other
//! statement family is offered to the category handlers in a fixed order,
//! first claim wins, and falling off the end of the chain is a fatal
//! error. All monotonic state (loop nonces, transition callback table,
//! composed-sequence table, path ids) lives on the generator instance and
//! dies with it.

mod anim;
mod camera;
mod data;
mod dialog;
mod display;
mod machine;
mod menu;
mod misc;
mod path;
mod pool;
mod save;
mod scenes;
mod sound;
mod transition;
mod writer;

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::ir::{DomainExpr, Easing, Expr, Stmt, UnaryOp};
use crate::model::GameModel;

pub use transition::{
    encode_sequence, TSTEP_CALLBACK, TSTEP_END, TSTEP_FADE_IN, TSTEP_FADE_OUT, TSTEP_FLASH,
    TSTEP_IRIS_IN, TSTEP_IRIS_OUT, TSTEP_PARALLEL, TSTEP_SHAKE, TSTEP_WAIT, TSTEP_WIPE_D,
    TSTEP_WIPE_L, TSTEP_WIPE_R, TSTEP_WIPE_U,
};
pub use writer::CWriter;

/// Fixed tween slot count in the emitted runtime.
pub const MAX_TWEENS: usize = 16;

/// Longest runtime path, in waypoints.
pub const PATH_MAX: usize = 64;

/// Animation queue depth per sprite.
pub const ANIM_QUEUE_MAX: usize = 4;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CodegenOptions {
    /// Log accumulated validation errors at the end of a build.
    pub warn_on_validation_errors: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            warn_on_validation_errors: true,
        }
    }
}

/// A recoverable validation problem: the offending statement is skipped
/// (or degraded) and the build continues.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationError {
    pub context: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The emitted translation unit plus everything recoverable that went
/// wrong while producing it.
#[derive(Clone, Debug)]
pub struct CompiledGame {
    pub source: String,
    pub validation: ValidationReport,
}

/// Compile with default options.
pub fn compile(game: &GameModel) -> Result<CompiledGame, BuildError> {
    compile_with(game, CodegenOptions::default())
}

pub fn compile_with(game: &GameModel, opts: CodegenOptions) -> Result<CompiledGame, BuildError> {
    let mut generator = Generator::new(game, opts);
    let compiled = generator.run();
    // Monotonic tables must not leak across builds.
    generator.clear_state();
    compiled
}

// ---------------------------------------------------------------------------
// Naming discipline
// ---------------------------------------------------------------------------

/// Uppercase a name for constant identifiers; anything that is not
/// alphanumeric becomes an underscore.
pub(crate) fn upper(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

pub(crate) fn scene_const(name: &str) -> String {
    format!("SCENE_{}", upper(name))
}

pub(crate) fn state_const(machine: &str, state: &str) -> String {
    format!("STATE_{}_{}", upper(machine), upper(state))
}

pub(crate) fn anim_const(owner: &str, anim: &str) -> String {
    format!("ANIM_{}_{}", upper(owner), upper(anim))
}

/// Escape a Rust string into a C string literal body.
pub(crate) fn c_str(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

pub(crate) struct Generator<'a> {
    pub(crate) game: &'a GameModel,
    pub(crate) opts: CodegenOptions,
    /// Writer for the section currently being generated.
    pub(crate) out: CWriter,
    /// Prototypes for every emitted function, in emission order.
    pub(crate) protos: Vec<String>,
    pub(crate) validation: Vec<ValidationError>,
    /// Monotonic nonce for generated loop counters.
    pub(crate) loop_nonce: u32,
    /// Transition completion callbacks, deduplicated by equality.
    pub(crate) callbacks: Vec<Vec<Stmt>>,
    /// Encoded composed-transition byte streams, deduplicated by equality.
    pub(crate) sequences: Vec<Vec<u8>>,
    /// Path names interned in first-use order; index is the path id.
    pub(crate) paths: IndexSet<String>,
    /// Easing curves referenced by any tween; Linear is always present.
    pub(crate) easings: BTreeSet<Easing>,
    /// Resolvable scalar names: user variables, pool slot indices, loop
    /// counters discovered so far.
    pub(crate) known_vars: HashSet<String>,
    /// Resolvable array names with their lengths.
    pub(crate) known_arrays: HashMap<String, usize>,
    /// For-loop counters that are not user variables; declared as globals.
    pub(crate) extra_counters: IndexSet<String>,
    /// First sprite tile index per asset, for assets drawn as sprites.
    pub(crate) sprite_bases: IndexMap<String, u8>,
    /// First background tile index per asset, for tileset assets.
    pub(crate) bkg_bases: IndexMap<String, u8>,
}

impl<'a> Generator<'a> {
    pub(crate) fn new(game: &'a GameModel, opts: CodegenOptions) -> Self {
        let mut generator = Self {
            game,
            opts,
            out: CWriter::new(),
            protos: Vec::new(),
            validation: Vec::new(),
            loop_nonce: 0,
            callbacks: Vec::new(),
            sequences: Vec::new(),
            paths: IndexSet::new(),
            easings: BTreeSet::new(),
            known_vars: HashSet::new(),
            known_arrays: HashMap::new(),
            extra_counters: IndexSet::new(),
            sprite_bases: IndexMap::new(),
            bkg_bases: IndexMap::new(),
        };
        generator.easings.insert(Easing::Linear);
        generator.index_names();
        generator
    }

    /// Reset every per-instance monotonic table. A fresh generator is made
    /// per `compile` call; this exists for callers that reuse one.
    pub(crate) fn clear_state(&mut self) {
        self.protos.clear();
        self.validation.clear();
        self.loop_nonce = 0;
        self.callbacks.clear();
        self.sequences.clear();
        self.paths.clear();
        self.easings.clear();
        self.easings.insert(Easing::Linear);
        self.extra_counters.clear();
        self.out = CWriter::new();
    }

    /// Build the name tables used to resolve IR references.
    fn index_names(&mut self) {
        for name in self.game.variables.keys() {
            self.known_vars.insert(name.clone());
        }
        for sprite in self.game.sprites.values() {
            if let Some(pos) = &sprite.position {
                self.known_vars.insert(pos.x_var.clone());
                self.known_vars.insert(pos.y_var.clone());
            }
        }
        for pool in self.game.pools.values() {
            let size = pool.size as usize;
            self.known_vars.insert(pool.slot_var());
            self.known_vars.insert(format!("{}_pool_count", pool.name));
            self.known_arrays.insert(format!("{}_active", pool.name), size);
            if pool.has_position {
                self.known_arrays.insert(format!("{}_x", pool.name), size);
                self.known_arrays.insert(format!("{}_y", pool.name), size);
            }
            if pool.has_velocity {
                self.known_arrays.insert(format!("{}_vel_x", pool.name), size);
                self.known_arrays.insert(format!("{}_vel_y", pool.name), size);
            }
            for field in &pool.fields {
                self.known_arrays
                    .insert(format!("{}_{}", pool.name, field.name), size);
            }
            if !pool.animations.is_empty() {
                self.known_arrays.insert(format!("{}_anim", pool.name), size);
                self.known_arrays.insert(format!("{}_frame", pool.name), size);
                self.known_arrays.insert(format!("{}_timer", pool.name), size);
                self.known_arrays
                    .insert(format!("{}_anim_complete", pool.name), size);
            }
        }
        for grid in self.game.nav_grids.values() {
            self.known_arrays.insert(
                format!("{}_weights", grid.name),
                grid.width as usize * grid.height as usize,
            );
        }
        // Tile bases: sprite space for sprite/pool assets, background space
        // for tileset assets, allocated in definition order.
        let mut next_sprite = 0u8;
        let mut next_bkg = 0u8;
        for asset in self.game.tile_assets.values() {
            let used_by_sprites = self
                .game
                .sprites
                .values()
                .any(|s| s.asset == asset.name)
                || self
                    .game
                    .pools
                    .values()
                    .any(|p| p.sprite.as_deref() == Some(asset.name.as_str()));
            let used_by_maps = self
                .game
                .tilemaps
                .values()
                .any(|m| m.tileset.as_deref() == Some(asset.name.as_str()));
            if used_by_sprites {
                self.sprite_bases.insert(asset.name.clone(), next_sprite);
                next_sprite = next_sprite.wrapping_add(asset.tile_count() as u8);
            }
            if used_by_maps || !used_by_sprites {
                self.bkg_bases.insert(asset.name.clone(), next_bkg);
                next_bkg = next_bkg.wrapping_add(asset.tile_count() as u8);
            }
        }
    }

    // -- plumbing ----------------------------------------------------------

    /// Run `f` against a fresh writer and return the text it produced.
    pub(crate) fn section(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), BuildError>,
    ) -> Result<String, BuildError> {
        let saved = std::mem::take(&mut self.out);
        f(self)?;
        Ok(std::mem::replace(&mut self.out, saved).finish())
    }

    /// Open a function body and record its prototype.
    pub(crate) fn begin_fn(&mut self, signature: &str) {
        self.protos.push(format!("{signature};"));
        self.out.open(signature);
    }

    pub(crate) fn end_fn(&mut self) {
        self.out.close();
        self.out.blank();
    }

    /// Record a validation error, log it, and emit a marker comment in
    /// place of the offending statement.
    pub(crate) fn verror(&mut self, context: &str, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{context}: {message}");
        self.out.line(format!("/* ERROR: {message} */"));
        self.validation.push(ValidationError {
            context: context.to_string(),
            message,
        });
    }

    pub(crate) fn next_loop_counter(&mut self) -> String {
        let name = format!("_loop{}", self.loop_nonce);
        self.loop_nonce += 1;
        name
    }

    /// Intern a transition callback, returning its id.
    pub(crate) fn intern_callback(&mut self, body: &[Stmt]) -> u8 {
        if let Some(pos) = self.callbacks.iter().position(|c| c == body) {
            return pos as u8;
        }
        self.callbacks.push(body.to_vec());
        (self.callbacks.len() - 1) as u8
    }

    /// Intern an encoded sequence stream, returning its id.
    pub(crate) fn intern_sequence(&mut self, encoded: Vec<u8>) -> u8 {
        if let Some(pos) = self.sequences.iter().position(|s| *s == encoded) {
            return pos as u8;
        }
        self.sequences.push(encoded);
        (self.sequences.len() - 1) as u8
    }

    /// Intern a path name, returning its id.
    pub(crate) fn intern_path(&mut self, name: &str) -> usize {
        self.paths.insert_full(name.to_string()).0
    }

    // -- top level ---------------------------------------------------------

    fn run(&mut self) -> Result<CompiledGame, BuildError> {
        log::debug!("compiling {:?}", self.game.name);

        // Function bodies first: they fill the monotonic tables the data
        // section bakes (callbacks, sequences, easings, paths, counters).
        let scenes = self.section(Self::gen_scene_functions)?;
        let palette_helpers = self.section(Self::gen_palette_helpers)?;
        let collision = self.section(Self::gen_collision_helpers)?;
        let mixer = self.section(Self::gen_mixer_helpers)?;
        let dialogs = self.section(Self::gen_dialog_helpers)?;
        let menus = self.section(Self::gen_menu_helpers)?;
        let pools = self.section(Self::gen_pool_helpers)?;
        let machines = self.section(Self::gen_machine_helpers)?;
        let anims = self.section(Self::gen_anim_helpers)?;
        let saves = self.section(Self::gen_save_helpers)?;
        let cameras = self.section(Self::gen_camera_helpers)?;
        let tweens = self.section(Self::gen_tween_helpers)?;
        let path_helpers = self.section(Self::gen_path_helpers)?;
        let links = self.section(Self::gen_link_helpers)?;
        let cutscenes = self.section(Self::gen_cutscene_helpers)?;
        let physics = self.section(Self::gen_physics_helpers)?;
        let inputs = self.section(Self::gen_input_helpers)?;
        let music = self.section(Self::gen_music_helpers)?;
        // Callbacks can intern further callbacks; runs to a fixed point.
        let callback_runner = self.section(Self::gen_callback_runner)?;
        let transitions = self.section(Self::gen_transition_helpers)?;
        let mainish = self.section(Self::gen_main)?;
        let data = self.section(Self::gen_data)?;

        let mut out = CWriter::new();
        out.raw(&self.preamble());
        out.raw(&data);
        if !self.protos.is_empty() {
            out.line("/* --- forward declarations --- */");
            let protos = std::mem::take(&mut self.protos);
            for proto in &protos {
                out.line(proto);
            }
            out.blank();
        }
        for text in [
            palette_helpers,
            collision,
            mixer,
            music,
            dialogs,
            menus,
            pools,
            machines,
            anims,
            saves,
            callback_runner,
            transitions,
            cameras,
            tweens,
            path_helpers,
            links,
            cutscenes,
            physics,
            inputs,
            scenes,
            mainish,
        ] {
            out.raw(&text);
        }

        let validation = ValidationReport {
            errors: self.validation.clone(),
        };
        if self.opts.warn_on_validation_errors && !validation.is_clean() {
            for err in &validation.errors {
                log::warn!("validation: {} ({})", err.message, err.context);
            }
        }
        Ok(CompiledGame {
            source: out.finish(),
            validation,
        })
    }

    fn preamble(&self) -> String {
        let mut p = String::new();
        p.push_str("/* Generated by gbforge. Do not edit. */\n");
        p.push_str("#include <gb/gb.h>\n");
        if self.game.gbc {
            p.push_str("#include <gb/cgb.h>\n");
        }
        p.push_str("#include <gb/hardware.h>\n");
        p.push_str("#include <stdint.h>\n");
        p.push_str("#include <stdio.h>\n");
        p.push_str("#include <string.h>\n");
        p.push_str("#include <rand.h>\n");
        if !self.game.music.is_empty() {
            p.push_str("#include <hUGEDriver.h>\n");
        }
        p.push('\n');
        p.push_str("typedef uint8_t  UINT8;\n");
        p.push_str("typedef int8_t   INT8;\n");
        p.push_str("typedef uint16_t UINT16;\n");
        p.push_str("typedef int16_t  INT16;\n");
        p.push_str("typedef uint32_t UINT32;\n");
        p.push_str("typedef int32_t  INT32;\n");
        p.push('\n');
        p
    }

    // -- statement dispatch ------------------------------------------------

    pub(crate) fn stmts(&mut self, list: &[Stmt]) -> Result<(), BuildError> {
        for stmt in list {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    pub(crate) fn stmt(&mut self, stmt: &Stmt) -> Result<(), BuildError> {
        match stmt {
            Stmt::Assign { target, op, value } => {
                if !self.known_vars.contains(target) {
                    self.verror("assign", format!("unknown variable {target:?}"));
                    return Ok(());
                }
                let value = self.expr(value);
                let target = target.clone();
                self.out.line(format!("{target} {} {value};", op.c_token()));
            }
            Stmt::ArrayAssign { array, index, value } => {
                if !self.known_arrays.contains_key(array) {
                    self.verror("assign", format!("unknown array {array:?}"));
                    return Ok(());
                }
                let index = self.expr(index);
                let value = self.expr(value);
                self.out.line(format!("{array}[{index}] = {value};"));
            }
            Stmt::If { cond, then, otherwise } => {
                let cond = self.expr(cond);
                self.out.open(format!("if ({cond})"));
                self.stmts(then)?;
                if !otherwise.is_empty() {
                    self.out.chain("} else {");
                    self.stmts(otherwise)?;
                }
                self.out.close();
            }
            Stmt::When { branches, otherwise } => {
                if branches.is_empty() {
                    if let Some(body) = otherwise {
                        self.stmts(body)?;
                    }
                    return Ok(());
                }
                for (i, (cond, body)) in branches.iter().enumerate() {
                    let cond = self.expr(cond);
                    if i == 0 {
                        self.out.open(format!("if ({cond})"));
                    } else {
                        self.out.chain(&format!("}} else if ({cond}) {{"));
                    }
                    self.stmts(body)?;
                }
                if let Some(body) = otherwise {
                    self.out.chain("} else {");
                    self.stmts(body)?;
                }
                self.out.close();
            }
            Stmt::While { cond, body } => {
                let cond = self.expr(cond);
                self.out.open(format!("while ({cond})"));
                self.stmts(body)?;
                self.out.close();
            }
            Stmt::For { counter, start, end, body } => {
                if !self.known_vars.contains(counter) {
                    self.known_vars.insert(counter.clone());
                    self.extra_counters.insert(counter.clone());
                }
                self.out.open(format!(
                    "for ({counter} = {start}; {counter} <= {end}; ++{counter})"
                ));
                self.stmts(body)?;
                self.out.close();
            }
            Stmt::Call { name, args } => {
                let args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
                self.out.line(format!("{name}({});", args.join(", ")));
            }
            Stmt::Raw(text) => {
                self.out.line(text);
            }
            Stmt::SceneChange(scene) => {
                if !self.game.scenes.contains_key(scene) {
                    self.verror("scene", format!("unknown scene {scene:?}"));
                    return Ok(());
                }
                self.out.line(format!("change_scene({});", scene_const(scene)));
            }
            other => {
                if self.sound_stmt(other)?
                    || self.display_stmt(other)?
                    || self.anim_stmt(other)?
                    || self.machine_stmt(other)?
                    || self.save_stmt(other)?
                    || self.dialog_stmt(other)?
                    || self.menu_stmt(other)?
                    || self.pool_stmt(other)?
                    || self.camera_stmt(other)?
                    || self.transition_stmt(other)?
                    || self.path_stmt(other)?
                    || self.misc_stmt(other)?
                {
                    return Ok(());
                }
                return Err(BuildError::UnhandledStatement(format!("{other:?}")));
            }
        }
        Ok(())
    }

    // -- expression lowering -----------------------------------------------

    pub(crate) fn expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Lit(v) => format!("{}", v.raw),
            Expr::Var(name) => {
                if self.known_vars.contains(name) {
                    name.clone()
                } else {
                    self.everror(format!("unknown variable {name:?}"))
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let l = self.expr(lhs);
                let r = self.expr(rhs);
                format!("({l} {} {r})", op.c_token())
            }
            Expr::Unary { op, operand } => {
                let v = self.expr(operand);
                match op {
                    UnaryOp::Neg => format!("(-{v})"),
                    UnaryOp::Not => format!("(!{v})"),
                    UnaryOp::BNot => format!("(~{v})"),
                }
            }
            Expr::Ternary { cond, then, otherwise } => {
                let c = self.expr(cond);
                let t = self.expr(then);
                let o = self.expr(otherwise);
                format!("({c} ? {t} : {o})")
            }
            Expr::Call { name, args } => {
                let args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
                format!("{name}({})", args.join(", "))
            }
            Expr::Index { array, index } => {
                if !self.known_arrays.contains_key(array) {
                    return self.everror(format!("unknown array {array:?}"));
                }
                let i = self.expr(index);
                format!("{array}[{i}]")
            }
            Expr::Domain(d) => self.domain_expr(d),
        }
    }

    /// Record an expression-position validation error; evaluates to 0.
    fn everror(&mut self, message: String) -> String {
        log::warn!("expr: {message}");
        self.validation.push(ValidationError {
            context: "expr".to_string(),
            message,
        });
        "0".to_string()
    }

    fn domain_expr(&mut self, d: &DomainExpr) -> String {
        match d {
            DomainExpr::PoolCount(pool) => {
                if self.game.pools.contains_key(pool) {
                    format!("{pool}_pool_count")
                } else {
                    self.everror(format!("unknown pool {pool:?}"))
                }
            }
            DomainExpr::CameraX => "_camera_x".to_string(),
            DomainExpr::CameraY => "_camera_y".to_string(),
            DomainExpr::TransitionActive => "((_transition_type != 0) || _trans_seq_active)".to_string(),
            DomainExpr::SaveField(field) => {
                if self.save_field_ok(field, false) {
                    format!("_save_data.{field}")
                } else {
                    self.everror(format!("unknown save field {field:?}"))
                }
            }
            DomainExpr::SaveArray { field, index } => {
                if self.save_field_ok(field, true) {
                    let i = self.expr(index);
                    format!("_save_data.{field}[{i}]")
                } else {
                    self.everror(format!("unknown save array field {field:?}"))
                }
            }
            DomainExpr::PathFound(path) => {
                let id = self.intern_path(path);
                format!("_path_{id}_found")
            }
            DomainExpr::MixerVolume(group) => {
                if self.mixer_group_ok(group) {
                    format!("_mixer_{group}_volume")
                } else {
                    self.everror(format!("unknown mixer group {group:?}"))
                }
            }
            DomainExpr::MixerCanPlay { channel, priority } => {
                format!("_mixer_can_play({}, {priority})", channel.index())
            }
            DomainExpr::FrameCount => "_frame_count".to_string(),
            DomainExpr::Pressed(button) => {
                format!("((_joypad & {}) != 0)", button.c_name())
            }
            DomainExpr::JustPressed(button) => {
                let b = button.c_name();
                format!("(((_joypad & {b}) != 0) && ((_joypad_prev & {b}) == 0))")
            }
            DomainExpr::InputBuffered(buffer) => {
                if self.game.input_buffers.contains_key(buffer) {
                    format!("(_inbuf_{buffer} != 0)")
                } else {
                    self.everror(format!("unknown input buffer {buffer:?}"))
                }
            }
            DomainExpr::AnimDone(target) => self.anim_done_expr(target),
            DomainExpr::DialogActive(dialog) => {
                if self.game.dialogs.contains_key(dialog) {
                    format!("_{dialog}_active")
                } else {
                    self.everror(format!("unknown dialog {dialog:?}"))
                }
            }
            DomainExpr::MenuCursor(menu) => {
                if self.game.menus.contains_key(menu) {
                    format!("_{menu}_cursor")
                } else {
                    self.everror(format!("unknown menu {menu:?}"))
                }
            }
            DomainExpr::TweenActive(var) => {
                if self.known_vars.contains(var) {
                    format!("_tween_is_active((UINT8 *)&{var})")
                } else {
                    self.everror(format!("unknown variable {var:?}"))
                }
            }
            DomainExpr::SpritesCollide(a, b) => self.sprites_collide_expr(a, b),
            DomainExpr::LinkData => {
                if self.game.link_cable {
                    "_link_data".to_string()
                } else {
                    self.everror("link data read without link cable support".to_string())
                }
            }
            DomainExpr::Rand => "((UINT8)rand())".to_string(),
        }
    }

    fn save_field_ok(&self, field: &str, array: bool) -> bool {
        self.game
            .save
            .as_ref()
            .and_then(|s| s.field(field))
            .is_some_and(|f| f.array_len.is_some() == array)
    }

    fn mixer_group_ok(&self, group: &str) -> bool {
        self.game
            .mixer
            .as_ref()
            .is_some_and(|m| m.groups.contains_key(group))
    }

    fn sprites_collide_expr(&mut self, a: &str, b: &str) -> String {
        let (Some(sa), Some(sb)) = (self.game.sprites.get(a), self.game.sprites.get(b)) else {
            return self.everror(format!("unknown sprite in collision ({a:?}, {b:?})"));
        };
        let (Some((ax, ay)), Some((bx, by))) = (sa.position_vars(), sb.position_vars()) else {
            return self.everror(format!("collision needs positioned sprites ({a:?}, {b:?})"));
        };
        let ha = sa
            .hitbox
            .unwrap_or(crate::model::Hitbox { x: 0, y: 0, width: sa.width, height: sa.height });
        let hb = sb
            .hitbox
            .unwrap_or(crate::model::Hitbox { x: 0, y: 0, width: sb.width, height: sb.height });
        format!(
            "_rect_overlap({ax} + ({}), {ay} + ({}), {}, {}, {bx} + ({}), {by} + ({}), {}, {})",
            ha.x, ha.y, ha.width, ha.height, hb.x, hb.y, hb.width, hb.height
        )
    }

    fn anim_done_expr(&mut self, target: &crate::ir::AnimTarget) -> String {
        use crate::ir::AnimTarget;
        match target {
            AnimTarget::Sprite(sprite) => {
                if self.game.sprites.contains_key(sprite) {
                    format!("((_{sprite}_flags & ANIM_FLAG_COMPLETE) != 0)")
                } else {
                    self.everror(format!("unknown sprite {sprite:?}"))
                }
            }
            AnimTarget::Pool(pool) => {
                if let Some(p) = self.game.pools.get(pool) {
                    format!("{pool}_anim_complete[{}]", p.slot_var())
                } else {
                    self.everror(format!("unknown pool {pool:?}"))
                }
            }
        }
    }
}
