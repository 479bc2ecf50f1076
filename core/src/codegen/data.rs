//! Data section orchestration: constants, state variables, and every
//! baked table, in the fixed order the translation unit promises.

use crate::error::BuildError;
use crate::model::{Tilemap, NAV_GRID_MAX};

use super::{scene_const, Generator};

impl Generator<'_> {
    pub(crate) fn gen_data(&mut self) -> Result<(), BuildError> {
        self.out.line("/* --- data --- */");
        self.out.line("#define SCENE_NONE 255");
        let scene_names: Vec<String> = self.game.scenes.keys().cloned().collect();
        for (idx, name) in scene_names.iter().enumerate() {
            self.out
                .line(format!("#define {} {idx}", scene_const(name)));
        }
        self.out.line("UINT8 _current_scene = SCENE_NONE;");
        self.out.line("UINT8 _scene_just_changed = 0;");
        self.out.line("UINT16 _frame_count = 0;");
        self.out.line("UINT8 _joypad = 0;");
        self.out.line("UINT8 _joypad_prev = 0;");
        self.out.blank();

        // User variables plus sprite-owned positions; initial values are
        // assigned in init().
        let vars: Vec<(String, &'static str)> = self
            .game
            .variables
            .values()
            .map(|v| (v.name.clone(), v.kind.c_type()))
            .collect();
        for (name, c_type) in vars {
            self.out.line(format!("{c_type} {name};"));
        }
        let owned: Vec<(String, String)> = self
            .game
            .sprites
            .values()
            .filter_map(|s| {
                s.position
                    .as_ref()
                    .map(|p| (p.x_var.clone(), p.y_var.clone()))
            })
            .collect();
        for (x_var, y_var) in owned {
            self.out.line(format!("UINT8 {x_var};"));
            self.out.line(format!("UINT8 {y_var};"));
        }
        self.out.blank();

        self.emit_tile_data();
        self.emit_map_data()?;
        self.emit_palette_data();
        self.emit_sfx_players();
        self.emit_anim_data();
        self.emit_pool_data();
        self.emit_machine_data();
        self.emit_mixer_data();
        self.emit_music_data();
        self.emit_transition_data();
        self.emit_tween_data();
        self.emit_dialog_data();
        self.emit_menu_data();
        self.emit_save_data();
        self.emit_camera_data();
        self.emit_misc_data();
        self.emit_path_data()?;
        Ok(())
    }

    /// 16 bytes per tile, 16 values per emitted line.
    fn emit_tile_data(&mut self) {
        let assets: Vec<(String, Vec<u8>)> = self
            .game
            .tile_assets
            .values()
            .map(|a| (a.name.clone(), a.data.clone()))
            .collect();
        for (name, data) in assets {
            self.out.open(format!("const UINT8 {name}_tiles[] ="));
            for chunk in data.chunks(16) {
                self.out.line(format!(
                    "{},",
                    chunk
                        .iter()
                        .map(|b| format!("0x{b:02X}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
            self.out.close_with("};");
        }
        if !self.game.tile_assets.is_empty() {
            self.out.blank();
        }
    }

    fn emit_map_data(&mut self) -> Result<(), BuildError> {
        let maps: Vec<Tilemap> = self.game.tilemaps.values().cloned().collect();
        for map in &maps {
            let cells = map.width as usize * map.height as usize;
            if map.width > NAV_GRID_MAX || map.height > NAV_GRID_MAX {
                return Err(BuildError::TilemapInvalid {
                    name: map.name.clone(),
                    reason: format!(
                        "{}x{} exceeds the {NAV_GRID_MAX}x{NAV_GRID_MAX} hardware map; \
                         split the map or scroll a larger world in code",
                        map.width, map.height
                    ),
                });
            }
            if map.tiles.len() != cells {
                return Err(BuildError::TilemapInvalid {
                    name: map.name.clone(),
                    reason: format!(
                        "tile data is {} bytes, expected width*height = {cells}",
                        map.tiles.len()
                    ),
                });
            }
            let name = &map.name;
            self.out.open(format!("const UINT8 {name}_map[{cells}] ="));
            for chunk in map.tiles.chunks(16) {
                self.out.line(format!(
                    "{},",
                    chunk
                        .iter()
                        .map(|b| format!("0x{b:02X}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
            self.out.close_with("};");
            if let Some(collision) = &map.collision {
                self.out
                    .open(format!("const UINT8 {name}_collision[{cells}] ="));
                for chunk in collision.chunks(16) {
                    self.out.line(format!(
                        "{},",
                        chunk
                            .iter()
                            .map(|b| format!("0x{b:02X}"))
                            .collect::<Vec<_>>()
                            .join(", ")
                    ));
                }
                self.out.close_with("};");
            }
        }
        if !maps.is_empty() {
            self.out.blank();
        }
        Ok(())
    }

    /// Palette arrays stay mutable so set-color can retarget them.
    fn emit_palette_data(&mut self) {
        if !self.game.gbc {
            return;
        }
        let palettes: Vec<(String, [u16; 4])> = self
            .game
            .palettes
            .values()
            .map(|p| (p.name.clone(), p.colors))
            .collect();
        for (name, colors) in &palettes {
            self.out.line(format!(
                "UINT16 {name}_palette[4] = {{0x{:04X}, 0x{:04X}, 0x{:04X}, 0x{:04X}}};",
                colors[0], colors[1], colors[2], colors[3]
            ));
        }
        if !palettes.is_empty() {
            self.out.blank();
        }
    }
}
