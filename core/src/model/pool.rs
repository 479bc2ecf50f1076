use indexmap::IndexMap;

use crate::ir::{Expr, Stmt, ValueKind};

use super::sprite::Animation;

/// A fixed-capacity entity pool backed by parallel arrays and a contiguous
/// OAM slot range.
#[derive(Clone, Debug)]
pub struct Pool {
    pub name: String,
    pub size: u8,
    /// First OAM slot; the pool owns `size` slots from here.
    pub oam_start: u8,
    pub has_position: bool,
    pub has_velocity: bool,
    /// Sprite asset drawn for each live entry, if any.
    pub sprite: Option<String>,
    pub fields: Vec<PoolField>,
    pub animations: IndexMap<String, Animation>,
    pub on_spawn: Vec<Stmt>,
    pub on_despawn: Vec<Stmt>,
    pub on_frame: Vec<Stmt>,
    /// Disjunction: any true condition despawns the entry.
    pub despawn_when: Vec<Expr>,
}

impl Pool {
    pub fn new(name: impl Into<String>, size: u8, oam_start: u8) -> Self {
        Self {
            name: name.into(),
            size,
            oam_start,
            has_position: true,
            has_velocity: false,
            sprite: None,
            fields: Vec::new(),
            animations: IndexMap::new(),
            on_spawn: Vec::new(),
            on_despawn: Vec::new(),
            on_frame: Vec::new(),
            despawn_when: Vec::new(),
        }
    }

    /// Name of the generated slot-index variable bound during hooks.
    pub fn slot_var(&self) -> String {
        format!("_{}_i", self.name)
    }
}

/// A custom per-entry state field. Unique by name within a pool; backed by
/// an array of the pool's size.
#[derive(Clone, Debug)]
pub struct PoolField {
    pub name: String,
    pub kind: ValueKind,
    pub default: i64,
}
