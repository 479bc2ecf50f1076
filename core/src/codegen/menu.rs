//! Menu lowering: item tables, drawing, navigation, and selection.

use crate::error::BuildError;
use crate::ir::{MenuStmt, Stmt};
use crate::model::Menu;

use super::{c_str, Generator};

impl Generator<'_> {
    /// Category handler for menu statements.
    pub(crate) fn menu_stmt(&mut self, stmt: &Stmt) -> Result<bool, BuildError> {
        let Stmt::Menu(m) = stmt else {
            return Ok(false);
        };
        let name = match m {
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
        let Some(def) = self.game.menus.get(&name) else {
            self.verror("menu", format!("unknown menu {name:?}"));
            return Ok(true);
        };
        let count = def.items.len();
        match m {
            MenuStmt::Show { .. } => {
                self.out.line(format!("_{name}_open = 1;"));
                self.out.line(format!("_menu_{name}_draw();"));
            }
            MenuStmt::Hide { .. } => {
                self.out.line(format!("_{name}_open = 0;"));
                self.out.line(format!("_menu_{name}_clear();"));
            }
            MenuStmt::Toggle { .. } => {
                self.out.open(format!("if (_{name}_open)"));
                self.out.line(format!("_{name}_open = 0;"));
                self.out.line(format!("_menu_{name}_clear();"));
                self.out.chain("} else {");
                self.out.line(format!("_{name}_open = 1;"));
                self.out.line(format!("_menu_{name}_draw();"));
                self.out.close();
            }
            MenuStmt::Open { .. } => {
                self.out.line(format!("_{name}_cursor = 0;"));
                self.out.line(format!("_{name}_open = 1;"));
                self.out.line(format!("_menu_{name}_draw();"));
            }
            MenuStmt::Close { .. } => {
                self.out.line(format!("_{name}_open = 0;"));
                self.out.line(format!("_menu_{name}_clear();"));
            }
            MenuStmt::Cancel { .. } => {
                self.out.line(format!("_menu_{name}_cancel();"));
            }
            MenuStmt::Select { .. } => {
                self.out.line(format!("_menu_{name}_select();"));
            }
            MenuStmt::MoveTo { index, .. } => {
                let index = self.expr(index);
                self.out.line(format!("_{name}_cursor = {index};"));
                self.out
                    .open(format!("if (_{name}_cursor >= {count})"));
                self.out.line(format!("_{name}_cursor = {};", count.saturating_sub(1)));
                self.out.close();
                self.out.line(format!("_menu_{name}_draw();"));
            }
            MenuStmt::Tick { .. } => {
                self.out.line(format!("_menu_{name}_tick();"));
            }
        }
        Ok(true)
    }

    pub(crate) fn gen_menu_helpers(&mut self) -> Result<(), BuildError> {
        let menus: Vec<Menu> = self.game.menus.values().cloned().collect();
        for menu in &menus {
            self.gen_menu_functions(menu)?;
        }
        Ok(())
    }

    fn gen_menu_functions(&mut self, menu: &Menu) -> Result<(), BuildError> {
        let m = menu.name.clone();
        let (x, y) = (menu.x, menu.y);
        let count = menu.items.len();
        let widest = menu.items.iter().map(|i| i.label.len()).max().unwrap_or(0);
        let blank = " ".repeat(widest + 1);

        self.begin_fn(&format!("void _menu_{m}_draw(void)"));
        self.out.line("UINT8 i;");
        self.out.open(format!("for (i = 0; i < {count}; ++i)"));
        self.out.line(format!("gotoxy({x}, {y} + i);"));
        self.out
            .line(format!("printf(i == _{m}_cursor ? \">\" : \" \");"));
        self.out.line(format!("printf(\"%s\", _{m}_items[i]);"));
        self.out.close();
        self.end_fn();

        self.begin_fn(&format!("void _menu_{m}_clear(void)"));
        self.out.line("UINT8 i;");
        self.out.open(format!("for (i = 0; i < {count}; ++i)"));
        self.out.line(format!("gotoxy({x}, {y} + i);"));
        self.out.line(format!("printf(\"{blank}\");"));
        self.out.close();
        self.end_fn();

        self.begin_fn(&format!("void _menu_{m}_select(void)"));
        self.out.open(format!("switch (_{m}_cursor)"));
        for (i, item) in menu.items.iter().enumerate() {
            self.out.open(format!("case {i}:"));
            self.stmts(&item.on_select)?;
            self.out.line("break;");
            self.out.close();
        }
        self.out.close();
        self.end_fn();

        self.begin_fn(&format!("void _menu_{m}_cancel(void)"));
        self.stmts(&menu.on_cancel)?;
        self.out.line(format!("_{m}_open = 0;"));
        self.out.line(format!("_menu_{m}_clear();"));
        self.end_fn();

        self.begin_fn(&format!("void _menu_{m}_tick(void)"));
        self.out.line(format!("if (!_{m}_open) {{ return; }}"));
        self.out.open(format!(
            "if ((_joypad & J_UP) && !(_joypad_prev & J_UP) && _{m}_cursor > 0)"
        ));
        self.out.line(format!("_{m}_cursor -= 1;"));
        self.out.line(format!("_menu_{m}_draw();"));
        self.out.close();
        self.out.open(format!(
            "if ((_joypad & J_DOWN) && !(_joypad_prev & J_DOWN) && _{m}_cursor + 1 < {count})"
        ));
        self.out.line(format!("_{m}_cursor += 1;"));
        self.out.line(format!("_menu_{m}_draw();"));
        self.out.close();
        self.out.open("if ((_joypad & J_A) && !(_joypad_prev & J_A))");
        self.out.line(format!("_menu_{m}_select();"));
        self.out.close();
        self.out.open("if ((_joypad & J_B) && !(_joypad_prev & J_B))");
        self.out.line(format!("_menu_{m}_cancel();"));
        self.out.close();
        self.end_fn();
        Ok(())
    }

    /// Menu item tables and cursor state.
    pub(crate) fn emit_menu_data(&mut self) {
        let menus: Vec<Menu> = self.game.menus.values().cloned().collect();
        for menu in &menus {
            let m = &menu.name;
            let labels = menu
                .items
                .iter()
                .map(|i| format!("\"{}\"", c_str(&i.label)))
                .collect::<Vec<_>>()
                .join(", ");
            self.out.line(format!(
                "const char *_{m}_items[{}] = {{{labels}}};",
                menu.items.len()
            ));
            self.out.line(format!("UINT8 _{m}_cursor = 0;"));
            self.out.line(format!("UINT8 _{m}_open = 0;"));
            self.out.blank();
        }
    }
}
