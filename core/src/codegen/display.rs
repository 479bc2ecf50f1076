//! Display and palette lowering.
//!
//! Palette flash/fade reuse the transition primitives so a single runtime
//! drives all screen-level effects. Color-hardware palette operations are
//! elided when the game does not declare GBC support.

use crate::error::BuildError;
use crate::ir::{DisplayStmt, PaletteStmt, Stmt};
use crate::model::PaletteKind;

use super::transition::{TSTEP_FADE_OUT, TSTEP_FLASH};
use super::{c_str, Generator};

impl Generator<'_> {
    /// Category handler for display and palette statements.
    pub(crate) fn display_stmt(&mut self, stmt: &Stmt) -> Result<bool, BuildError> {
        match stmt {
            Stmt::Display(d) => {
                self.lower_display(d);
                Ok(true)
            }
            Stmt::Palette(p) => {
                self.lower_palette(p);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn lower_display(&mut self, stmt: &DisplayStmt) {
        match stmt {
            DisplayStmt::Clear => self.out.line("cls();"),
            DisplayStmt::ShowSprites => self.out.line("SHOW_SPRITES;"),
            DisplayStmt::HideSprites => self.out.line("HIDE_SPRITES;"),
            DisplayStmt::ShowBackground => self.out.line("SHOW_BKG;"),
            DisplayStmt::HideBackground => self.out.line("HIDE_BKG;"),
            DisplayStmt::PrintAt { x, y, text } => {
                self.out.line(format!("gotoxy({x}, {y});"));
                self.out.line(format!("printf(\"{}\");", c_str(text)));
            }
        }
    }

    fn lower_palette(&mut self, stmt: &PaletteStmt) {
        match stmt {
            PaletteStmt::Apply { palette } => {
                let Some(pal) = self.game.palettes.get(palette) else {
                    self.verror("palette", format!("unknown palette {palette:?}"));
                    return;
                };
                if !self.game.gbc {
                    return;
                }
                let setter = match pal.kind {
                    PaletteKind::Background => "set_bkg_palette",
                    PaletteKind::Sprite => "set_sprite_palette",
                };
                self.out
                    .line(format!("{setter}({}, 1, {}_palette);", pal.slot, pal.name));
            }
            PaletteStmt::SetColor { palette, index, color } => {
                let Some(pal) = self.game.palettes.get(palette) else {
                    self.verror("palette", format!("unknown palette {palette:?}"));
                    return;
                };
                if !self.game.gbc {
                    return;
                }
                let setter = match pal.kind {
                    PaletteKind::Background => "set_bkg_palette",
                    PaletteKind::Sprite => "set_sprite_palette",
                };
                let (slot, name) = (pal.slot, pal.name.clone());
                self.out
                    .line(format!("{name}_palette[{index}] = 0x{color:04X};"));
                self.out.line(format!("{setter}({slot}, 1, {name}_palette);"));
            }
            PaletteStmt::Flash { color, frames } => {
                self.out.line(format!("_transition_type = {TSTEP_FLASH};"));
                self.out.line("_transition_timer = 0;");
                self.out.line(format!("_transition_duration = {frames};"));
                self.out
                    .line(format!("_transition_flash_color = 0x{color:04X};"));
            }
            PaletteStmt::Fade { frames } => {
                self.out.line(format!("_transition_type = {TSTEP_FADE_OUT};"));
                self.out.line("_transition_timer = 0;");
                self.out.line(format!("_transition_duration = {frames};"));
            }
        }
    }

    /// Palette interpolation and the shared fade applier, used by the
    /// transition runtime.
    pub(crate) fn gen_palette_helpers(&mut self) -> Result<(), BuildError> {
        if self.game.gbc {
            self.begin_fn("UINT16 _palette_scale(UINT16 color, UINT8 level)");
            self.out.line("UINT8 r = color & 0x1F;");
            self.out.line("UINT8 g = (color >> 5) & 0x1F;");
            self.out.line("UINT8 b = (color >> 10) & 0x1F;");
            self.out.line("r = (r * (3 - level)) / 3;");
            self.out.line("g = (g * (3 - level)) / 3;");
            self.out.line("b = (b * (3 - level)) / 3;");
            self.out
                .line("return r | ((UINT16)g << 5) | ((UINT16)b << 10);");
            self.end_fn();
        }

        self.begin_fn("void _apply_fade(UINT8 level)");
        self.out.line("BGP_REG = _fade_levels[level];");
        self.out.line("OBP0_REG = _fade_levels[level];");
        if self.game.gbc {
            let palettes: Vec<(String, u8, PaletteKind)> = self
                .game
                .palettes
                .values()
                .map(|p| (p.name.clone(), p.slot, p.kind))
                .collect();
            for (name, slot, kind) in palettes {
                for i in 0..4 {
                    self.out.line(format!(
                        "_pal_buf[{i}] = _palette_scale({name}_palette[{i}], level);"
                    ));
                }
                let setter = match kind {
                    PaletteKind::Background => "set_bkg_palette",
                    PaletteKind::Sprite => "set_sprite_palette",
                };
                self.out.line(format!("{setter}({slot}, 1, _pal_buf);"));
            }
        }
        self.end_fn();
        Ok(())
    }
}
