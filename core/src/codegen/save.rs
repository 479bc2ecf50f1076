//! Save lowering: the schema struct, cartridge-RAM slot copies, and
//! field writes against the working copy.

use crate::error::BuildError;
use crate::ir::{SaveStmt, Stmt};
use crate::model::SaveSchema;

use super::Generator;

/// Cartridge RAM window base address.
const SRAM_BASE: &str = "0xA000";

impl Generator<'_> {
    /// Category handler for save statements.
    pub(crate) fn save_stmt(&mut self, stmt: &Stmt) -> Result<bool, BuildError> {
        let Stmt::Save(s) = stmt else {
            return Ok(false);
        };
        if self.game.save.is_none() {
            self.verror("save", "save statement without a save schema");
            return Ok(true);
        }
        match s {
            SaveStmt::Load { slot } => {
                if self.save_slot_ok(*slot) {
                    self.out.line(format!("load_game({slot});"));
                }
            }
            SaveStmt::Save { slot } => {
                if self.save_slot_ok(*slot) {
                    self.out.line(format!("save_game({slot});"));
                }
            }
            SaveStmt::Erase { slot } => {
                if self.save_slot_ok(*slot) {
                    self.out.line(format!("erase_save({slot});"));
                }
            }
            SaveStmt::Copy { from, to } => {
                if self.save_slot_ok(*from) && self.save_slot_ok(*to) {
                    self.out.line(format!("copy_save({from}, {to});"));
                }
            }
            SaveStmt::FieldWrite { field, value } => {
                if !self.save_field_exists(field, false) {
                    self.verror("save", format!("unknown save field {field:?}"));
                    return Ok(true);
                }
                let value = self.expr(value);
                self.out.line(format!("_save_data.{field} = {value};"));
            }
            SaveStmt::ArrayWrite { field, index, value } => {
                if !self.save_field_exists(field, true) {
                    self.verror("save", format!("unknown save array field {field:?}"));
                    return Ok(true);
                }
                let index = self.expr(index);
                let value = self.expr(value);
                self.out
                    .line(format!("_save_data.{field}[{index}] = {value};"));
            }
        }
        Ok(true)
    }

    fn save_slot_ok(&mut self, slot: u8) -> bool {
        let slots = self.game.save.as_ref().map(|s| s.slots).unwrap_or(0);
        if slot < slots {
            true
        } else {
            self.verror("save", format!("save slot {slot} out of range (0..{slots})"));
            false
        }
    }

    fn save_field_exists(&self, field: &str, array: bool) -> bool {
        self.game
            .save
            .as_ref()
            .and_then(|s| s.field(field))
            .is_some_and(|f| f.array_len.is_some() == array)
    }

    pub(crate) fn gen_save_helpers(&mut self) -> Result<(), BuildError> {
        if self.game.save.is_none() {
            return Ok(());
        }

        self.begin_fn("void save_game(UINT8 slot)");
        self.out
            .line(format!("_save_data_t *sram = (_save_data_t *){SRAM_BASE};"));
        self.out.line("ENABLE_RAM;");
        self.out.line("_save_data.magic = SAVE_MAGIC;");
        self.out.line("sram[slot] = _save_data;");
        self.out.line("DISABLE_RAM;");
        self.end_fn();

        self.begin_fn("void load_game(UINT8 slot)");
        self.out
            .line(format!("_save_data_t *sram = (_save_data_t *){SRAM_BASE};"));
        self.out.line("ENABLE_RAM;");
        self.out.open("if (sram[slot].magic == SAVE_MAGIC)");
        self.out.line("_save_data = sram[slot];");
        self.out.close();
        self.out.line("DISABLE_RAM;");
        self.end_fn();

        self.begin_fn("void erase_save(UINT8 slot)");
        self.out
            .line(format!("_save_data_t *sram = (_save_data_t *){SRAM_BASE};"));
        self.out.line("ENABLE_RAM;");
        self.out.line("sram[slot].magic = 0;");
        self.out.line("DISABLE_RAM;");
        self.end_fn();

        self.begin_fn("void copy_save(UINT8 from, UINT8 to)");
        self.out
            .line(format!("_save_data_t *sram = (_save_data_t *){SRAM_BASE};"));
        self.out.line("ENABLE_RAM;");
        self.out.line("sram[to] = sram[from];");
        self.out.line("DISABLE_RAM;");
        self.end_fn();
        Ok(())
    }

    /// Save struct type, working copy, and slot constants.
    pub(crate) fn emit_save_data(&mut self) {
        let Some(schema): Option<SaveSchema> = self.game.save.clone() else {
            return;
        };
        self.out.line(format!("#define SAVE_MAGIC 0x{:04X}", schema.magic));
        self.out.line(format!("#define SAVE_SLOTS {}", schema.slots));
        self.out.open("typedef struct");
        self.out.line("UINT16 magic;");
        for field in &schema.fields {
            match field.array_len {
                Some(len) => self.out.line(format!(
                    "{} {}[{len}];",
                    field.kind.c_type(),
                    field.name
                )),
                None => self
                    .out
                    .line(format!("{} {};", field.kind.c_type(), field.name)),
            }
        }
        self.out.close_with("} _save_data_t;");
        self.out.line("_save_data_t _save_data;");
        self.out.blank();
    }
}
