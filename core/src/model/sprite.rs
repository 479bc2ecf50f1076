use indexmap::IndexMap;

use crate::ir::Stmt;

/// A hardware sprite with a stable OAM slot and optional animation set.
#[derive(Clone, Debug)]
pub struct Sprite {
    pub name: String,
    /// Tile asset the frames index into.
    pub asset: String,
    /// Pixel size (8x8 or 8x16 on the target).
    pub width: u8,
    pub height: u8,
    /// Assigned once by the builder; never reused.
    pub oam_slot: u8,
    /// Position owned by the sprite: two generated variables plus their
    /// initial values.
    pub position: Option<OwnedPosition>,
    /// Position bound to externally provided variables (x, y).
    pub binding: Option<(String, String)>,
    pub palette: Option<SpritePalette>,
    pub animations: IndexMap<String, Animation>,
    pub hitbox: Option<Hitbox>,
}

impl Sprite {
    pub fn new(name: impl Into<String>, asset: impl Into<String>, oam_slot: u8) -> Self {
        Self {
            name: name.into(),
            asset: asset.into(),
            width: 8,
            height: 8,
            oam_slot,
            position: None,
            binding: None,
            palette: None,
            animations: IndexMap::new(),
            hitbox: None,
        }
    }

    /// Names of the variables holding this sprite's position, owned or bound.
    pub fn position_vars(&self) -> Option<(&str, &str)> {
        if let Some(pos) = &self.position {
            Some((&pos.x_var, &pos.y_var))
        } else {
            self.binding.as_ref().map(|(x, y)| (x.as_str(), y.as_str()))
        }
    }
}

#[derive(Clone, Debug)]
pub struct OwnedPosition {
    pub x_var: String,
    pub y_var: String,
    pub x: u8,
    pub y: u8,
}

#[derive(Clone, Debug)]
pub struct SpritePalette {
    pub palette: String,
    /// Hardware palette index 0..7.
    pub index: u8,
}

/// One named animation: tile indices relative to the owning asset.
#[derive(Clone, Debug)]
pub struct Animation {
    pub frames: Vec<u8>,
    /// Ticks between frames at 100% speed.
    pub delay: u8,
    pub looping: bool,
    pub on_complete: Option<Vec<Stmt>>,
    /// Frame index -> statements run when that frame is reached.
    pub frame_events: IndexMap<u8, Vec<Stmt>>,
}

impl Animation {
    pub fn new(frames: Vec<u8>, delay: u8, looping: bool) -> Self {
        Self {
            frames,
            delay,
            looping,
            on_complete: None,
            frame_events: IndexMap::new(),
        }
    }
}

/// Collision rectangle relative to the sprite's top-left pixel.
#[derive(Clone, Copy, Debug)]
pub struct Hitbox {
    pub x: i8,
    pub y: i8,
    pub width: u8,
    pub height: u8,
}
