//! Dialog lowering: the text window, the typewriter, and choices.
//!
//! Each dialog owns a fixed text buffer; `say` loads it and the tick
//! function types one character per `delay` ticks. Choices print their
//! options immediately and turn the tick into cursor navigation until
//! the player confirms.

use crate::error::BuildError;
use crate::ir::{DialogStmt, Stmt};
use crate::model::Dialog;

use super::{c_str, upper, Generator};

impl Generator<'_> {
    /// Category handler for dialog statements.
    pub(crate) fn dialog_stmt(&mut self, stmt: &Stmt) -> Result<bool, BuildError> {
        let Stmt::Dialog(d) = stmt else {
            return Ok(false);
        };
        let name = match d {
            DialogStmt::Show { dialog }
            | DialogStmt::Hide { dialog }
            | DialogStmt::Say { dialog, .. }
            | DialogStmt::Choice { dialog, .. }
            | DialogStmt::Tick { dialog } => dialog.clone(),
        };
        let Some(def) = self.game.dialogs.get(&name).cloned() else {
            self.verror("dialog", format!("unknown dialog {name:?}"));
            return Ok(true);
        };
        match d {
            DialogStmt::Show { .. } => self.out.line(format!("_dialog_{name}_show();")),
            DialogStmt::Hide { .. } => self.out.line(format!("_dialog_{name}_hide();")),
            DialogStmt::Say { text, .. } => {
                self.out
                    .line(format!("_dialog_{name}_say(\"{}\");", c_str(text)));
            }
            DialogStmt::Choice { options, result, .. } => {
                if !self.known_vars.contains(result) {
                    self.verror("dialog", format!("unknown variable {result:?} for choice"));
                    return Ok(true);
                }
                self.out.line(format!(
                    "_dialog_{name}_choice({}, &{result});",
                    options.len()
                ));
                for (i, option) in options.iter().enumerate() {
                    self.out.line(format!(
                        "gotoxy({}, {});",
                        def.x + 2,
                        def.y as usize + 1 + i
                    ));
                    self.out.line(format!("printf(\"{}\");", c_str(option)));
                }
            }
            DialogStmt::Tick { .. } => self.out.line(format!("_dialog_{name}_tick();")),
        }
        Ok(true)
    }

    pub(crate) fn gen_dialog_helpers(&mut self) -> Result<(), BuildError> {
        let dialogs: Vec<Dialog> = self.game.dialogs.values().cloned().collect();
        for dialog in &dialogs {
            self.gen_dialog_functions(dialog);
        }
        Ok(())
    }

    fn gen_dialog_functions(&mut self, dialog: &Dialog) {
        let d = dialog.name.clone();
        let buf = format!("{}_BUFFER_SIZE", upper(&d));
        let (x, y, w, h, delay) = (dialog.x, dialog.y, dialog.width, dialog.height, dialog.delay);
        let blank = " ".repeat(w as usize + 2);

        self.begin_fn(&format!("void _dialog_{d}_draw_frame(void)"));
        self.out.line("UINT8 row;");
        self.out.open(format!("for (row = 0; row < {}; ++row)", h + 2));
        self.out.line(format!("gotoxy({x}, {y} + row);"));
        self.out.line(format!("printf(\"{blank}\");"));
        self.out.close();
        self.end_fn();

        self.begin_fn(&format!("void _dialog_{d}_show(void)"));
        self.out.line(format!("_{d}_active = 1;"));
        self.out.line(format!("_dialog_{d}_draw_frame();"));
        self.end_fn();

        self.begin_fn(&format!("void _dialog_{d}_hide(void)"));
        self.out.line(format!("_{d}_active = 0;"));
        self.out.line(format!("_{d}_choosing = 0;"));
        self.out.line(format!("_dialog_{d}_draw_frame();"));
        self.end_fn();

        self.begin_fn(&format!("void _dialog_{d}_say(const char *text)"));
        self.out.line(format!("strncpy(_{d}_buffer, text, {buf} - 1);"));
        self.out.line(format!("_{d}_buffer[{buf} - 1] = '\\0';"));
        self.out.line(format!("_{d}_len = (UINT8)strlen(_{d}_buffer);"));
        self.out.line(format!("_{d}_pos = 0;"));
        self.out.line(format!("_{d}_timer = 0;"));
        self.out.line(format!("_{d}_active = 1;"));
        self.out.line(format!("_{d}_choosing = 0;"));
        self.out.line(format!("_dialog_{d}_draw_frame();"));
        self.end_fn();

        self.begin_fn(&format!("void _dialog_{d}_draw_cursor(void)"));
        self.out.line("UINT8 i;");
        self.out.open(format!("for (i = 0; i < _{d}_choice_count; ++i)"));
        self.out.line(format!("gotoxy({}, {y} + 1 + i);", x + 1));
        self.out
            .line(format!("printf(i == _{d}_choice ? \">\" : \" \");"));
        self.out.close();
        self.end_fn();

        self.begin_fn(&format!("void _dialog_{d}_choice(UINT8 count, UINT8 *result)"));
        self.out.line(format!("_{d}_choice_count = count;"));
        self.out.line(format!("_{d}_choice_result = result;"));
        self.out.line(format!("_{d}_choice = 0;"));
        self.out.line(format!("_{d}_choosing = 1;"));
        self.out.line(format!("_{d}_active = 1;"));
        self.out.line(format!("_dialog_{d}_draw_frame();"));
        self.out.line(format!("_dialog_{d}_draw_cursor();"));
        self.end_fn();

        self.begin_fn(&format!("void _dialog_{d}_tick(void)"));
        self.out.line(format!("if (!_{d}_active) {{ return; }}"));
        self.out.open(format!("if (_{d}_choosing)"));
        self.out.open(format!(
            "if ((_joypad & J_UP) && !(_joypad_prev & J_UP) && _{d}_choice > 0)"
        ));
        self.out.line(format!("_{d}_choice -= 1;"));
        self.out.line(format!("_dialog_{d}_draw_cursor();"));
        self.out.close();
        self.out.open(format!(
            "if ((_joypad & J_DOWN) && !(_joypad_prev & J_DOWN) && _{d}_choice + 1 < _{d}_choice_count)"
        ));
        self.out.line(format!("_{d}_choice += 1;"));
        self.out.line(format!("_dialog_{d}_draw_cursor();"));
        self.out.close();
        self.out.open("if ((_joypad & J_A) && !(_joypad_prev & J_A))");
        self.out.line(format!("*_{d}_choice_result = _{d}_choice;"));
        self.out.line(format!("_dialog_{d}_hide();"));
        self.out.close();
        self.out.line("return;");
        self.out.close();
        self.out.line(format!("if (_{d}_pos >= _{d}_len) {{ return; }}"));
        self.out.open(format!("if (_{d}_timer)"));
        self.out.line(format!("_{d}_timer -= 1;"));
        self.out.line("return;");
        self.out.close();
        self.out.line(format!("_{d}_timer = {delay};"));
        self.out.line(format!(
            "gotoxy({} + (_{d}_pos % {w}), {} + (_{d}_pos / {w}));",
            x + 1,
            y + 1
        ));
        self.out.line(format!("printf(\"%c\", _{d}_buffer[_{d}_pos]);"));
        self.out.line(format!("_{d}_pos += 1;"));
        self.end_fn();
    }

    /// Dialog buffers and per-dialog state.
    pub(crate) fn emit_dialog_data(&mut self) {
        if self.game.dialogs.is_empty() {
            return;
        }
        self.out.line(format!(
            "#define DIALOG_BUFFER_SIZE {}",
            crate::model::DIALOG_BUFFER_SIZE
        ));
        let dialogs: Vec<Dialog> = self.game.dialogs.values().cloned().collect();
        for dialog in &dialogs {
            let d = &dialog.name;
            let buf = format!("{}_BUFFER_SIZE", upper(d));
            self.out
                .line(format!("#define {buf} {}", dialog.buffer_size));
            self.out.line(format!("char _{d}_buffer[{buf}];"));
            self.out.line(format!("UINT8 _{d}_len = 0;"));
            self.out.line(format!("UINT8 _{d}_pos = 0;"));
            self.out.line(format!("UINT8 _{d}_timer = 0;"));
            self.out.line(format!("UINT8 _{d}_active = 0;"));
            self.out.line(format!("UINT8 _{d}_choosing = 0;"));
            self.out.line(format!("UINT8 _{d}_choice = 0;"));
            self.out.line(format!("UINT8 _{d}_choice_count = 0;"));
            self.out.line(format!("UINT8 *_{d}_choice_result = 0;"));
            self.out.blank();
        }
    }
}
