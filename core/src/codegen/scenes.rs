//! Scene functions, the scene switchboard, and the fixed init/main pair.
//!
//! A scene change runs the old scene's exit immediately, but the new
//! scene's enter waits for the next frame's prologue; `update_scene`
//! settles the pending enter before dispatching the frame hook.

use crate::error::BuildError;
use crate::model::{PaletteKind, Scene};

use super::{scene_const, Generator};

impl Generator<'_> {
    pub(crate) fn gen_scene_functions(&mut self) -> Result<(), BuildError> {
        let scenes: Vec<Scene> = self.game.scenes.values().cloned().collect();
        for scene in &scenes {
            let name = &scene.name;
            self.begin_fn(&format!("void scene_{name}_enter(void)"));
            self.stmts(&scene.on_enter)?;
            self.end_fn();
            self.begin_fn(&format!("void scene_{name}_frame(void)"));
            self.stmts(&scene.on_frame)?;
            self.end_fn();
            self.begin_fn(&format!("void scene_{name}_exit(void)"));
            self.stmts(&scene.on_exit)?;
            self.end_fn();
        }
        Ok(())
    }

    pub(crate) fn gen_main(&mut self) -> Result<(), BuildError> {
        let scene_names: Vec<String> = self.game.scenes.keys().cloned().collect();

        self.begin_fn("void change_scene(UINT8 scene)");
        self.out.open("switch (_current_scene)");
        for name in &scene_names {
            self.out.line(format!(
                "case {}: scene_{name}_exit(); break;",
                scene_const(name)
            ));
        }
        self.out.close();
        self.out.line("_current_scene = scene;");
        self.out.line("_scene_just_changed = 1;");
        self.end_fn();

        self.begin_fn("void update_scene(void)");
        self.out.open("if (_scene_just_changed)");
        self.out.line("_scene_just_changed = 0;");
        self.out.open("switch (_current_scene)");
        for name in &scene_names {
            self.out.line(format!(
                "case {}: scene_{name}_enter(); break;",
                scene_const(name)
            ));
        }
        self.out.close();
        self.out.close();
        self.out.open("switch (_current_scene)");
        for name in &scene_names {
            self.out.line(format!(
                "case {}: scene_{name}_frame(); break;",
                scene_const(name)
            ));
        }
        self.out.close();
        self.end_fn();

        self.gen_init()?;
        self.gen_main_loop();
        Ok(())
    }

    fn gen_init(&mut self) -> Result<(), BuildError> {
        self.begin_fn("void init(void)");
        self.out.line("DISPLAY_OFF;");
        if self.game.gbc {
            let palettes: Vec<(String, u8, PaletteKind)> = self
                .game
                .palettes
                .values()
                .map(|p| (p.name.clone(), p.slot, p.kind))
                .collect();
            for (name, slot, kind) in palettes {
                let setter = match kind {
                    PaletteKind::Background => "set_bkg_palette",
                    PaletteKind::Sprite => "set_sprite_palette",
                };
                self.out.line(format!("{setter}({slot}, 1, {name}_palette);"));
            }
        }
        let sprite_loads: Vec<(String, u8, usize)> = self
            .sprite_bases
            .iter()
            .map(|(asset, base)| {
                (
                    asset.clone(),
                    *base,
                    self.game.tile_assets[asset].tile_count(),
                )
            })
            .collect();
        for (asset, base, count) in sprite_loads {
            self.out
                .line(format!("set_sprite_data({base}, {count}, {asset}_tiles);"));
        }
        let sprites: Vec<(String, u8, Option<(String, String, u8, u8)>, u8)> = self
            .game
            .sprites
            .values()
            .map(|s| {
                let pos = s.position.as_ref().map(|p| {
                    (p.x_var.clone(), p.y_var.clone(), p.x, p.y)
                });
                let base = self.sprite_bases.get(&s.asset).copied().unwrap_or(0);
                (s.name.clone(), s.oam_slot, pos, base)
            })
            .collect();
        for (_, oam, _, base) in &sprites {
            self.out.line(format!("set_sprite_tile({oam}, {base});"));
        }
        if self.game.gbc {
            let props: Vec<(u8, u8)> = self
                .game
                .sprites
                .values()
                .filter_map(|s| s.palette.as_ref().map(|p| (s.oam_slot, p.index)))
                .collect();
            for (oam, index) in props {
                self.out.line(format!("set_sprite_prop({oam}, {index});"));
            }
        }
        let bkg_loads: Vec<(String, u8, usize)> = self
            .bkg_bases
            .iter()
            .map(|(asset, base)| {
                (
                    asset.clone(),
                    *base,
                    self.game.tile_assets[asset].tile_count(),
                )
            })
            .collect();
        for (asset, base, count) in bkg_loads {
            self.out
                .line(format!("set_bkg_data({base}, {count}, {asset}_tiles);"));
        }
        if let Some(map) = self.game.tilemaps.values().next() {
            let (name, w, h) = (map.name.clone(), map.width, map.height);
            self.out
                .line(format!("set_bkg_tiles(0, 0, {w}, {h}, {name}_map);"));
        }
        let grids: Vec<(String, usize)> = self
            .game
            .nav_grids
            .values()
            .map(|g| (g.name.clone(), g.width as usize * g.height as usize))
            .collect();
        for (name, cells) in grids {
            self.out
                .line(format!("memcpy({name}_weights, {name}_weights_rom, {cells});"));
        }
        let vars: Vec<(String, i64, bool)> = self
            .game
            .variables
            .values()
            .map(|v| (v.name.clone(), v.initial, v.kind.is_signed()))
            .collect();
        for (name, initial, signed) in vars {
            if signed {
                self.out.line(format!("{name} = {initial};"));
            } else {
                self.out.line(format!("{name} = {initial}u;"));
            }
        }
        for (_, _, pos, _) in &sprites {
            if let Some((x_var, y_var, x, y)) = pos {
                self.out.line(format!("{x_var} = {x}u;"));
                self.out.line(format!("{y_var} = {y}u;"));
            }
        }
        for (_, oam, pos, _) in &sprites {
            if let Some((x_var, y_var, _, _)) = pos {
                self.out.line(format!(
                    "move_sprite({oam}, {x_var} + 8, {y_var} + 16);"
                ));
            }
        }
        self.out.line("_frame_count = 0;");
        if self.game.scenes.contains_key(&self.game.start_scene) {
            self.out.line(format!(
                "_current_scene = {};",
                scene_const(&self.game.start_scene)
            ));
            self.out.line("_scene_just_changed = 1;");
        } else {
            let start = self.game.start_scene.clone();
            self.verror("scene", format!("unknown start scene {start:?}"));
            self.out.line("_current_scene = SCENE_NONE;");
        }
        self.out.line("NR52_REG = 0x80;");
        self.out.line("NR51_REG = 0xFF;");
        self.out.line("NR50_REG = 0x77;");
        if self.game.mixer.is_some() {
            self.out.line("_mixer_apply_volume();");
        }
        self.out.line("SHOW_BKG;");
        self.out.line("SHOW_SPRITES;");
        self.out.line("DISPLAY_ON;");
        self.end_fn();
        Ok(())
    }

    fn gen_main_loop(&mut self) {
        let any_anims = self.game.sprites.values().any(|s| !s.animations.is_empty());
        let any_music = !self.game.music.is_empty() || self.game.mixer.is_some();
        let any_inputs = !self.game.input_buffers.is_empty();

        self.begin_fn("void main(void)");
        self.out.line("init();");
        self.out.open("while (1)");
        self.out.line("_joypad_prev = _joypad;");
        self.out.line("_joypad = joypad();");
        if any_inputs {
            self.out.line("update_input_buffers();");
        }
        self.out.line("update_scene();");
        if any_anims {
            self.out.line("update_animations();");
        }
        if any_music {
            self.out.line("update_music();");
        }
        self.out.line("update_transition();");
        self.out.line("update_trans_sequence();");
        self.out.line("update_tweens();");
        self.out.line("_frame_count += 1;");
        self.out.line("vsync();");
        self.out.close();
        self.end_fn();
    }
}
