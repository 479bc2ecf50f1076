use crate::ir::{Button, Stmt, ValueKind};

/// A text window with a typewriter effect.
#[derive(Clone, Debug)]
pub struct Dialog {
    pub name: String,
    /// Window position and inner size, in tiles.
    pub x: u8,
    pub y: u8,
    pub width: u8,
    pub height: u8,
    /// Ticks between typed characters.
    pub delay: u8,
    pub buffer_size: usize,
}

impl Dialog {
    pub fn new(name: impl Into<String>, x: u8, y: u8, width: u8, height: u8) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            width,
            height,
            delay: 2,
            buffer_size: super::DIALOG_BUFFER_SIZE,
        }
    }
}

/// A navigable item list.
#[derive(Clone, Debug)]
pub struct Menu {
    pub name: String,
    pub x: u8,
    pub y: u8,
    pub items: Vec<MenuItem>,
    pub on_cancel: Vec<Stmt>,
}

impl Menu {
    pub fn new(name: impl Into<String>, x: u8, y: u8) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            items: Vec::new(),
            on_cancel: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MenuItem {
    pub label: String,
    pub on_select: Vec<Stmt>,
}

/// Battery-backed save layout. Fields become a struct mirrored into
/// cartridge RAM slots.
#[derive(Clone, Debug)]
pub struct SaveSchema {
    pub slots: u8,
    /// Sentinel distinguishing initialized slots from garbage.
    pub magic: u16,
    pub fields: Vec<SaveField>,
}

impl SaveSchema {
    pub fn field(&self, name: &str) -> Option<&SaveField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Clone, Debug)]
pub struct SaveField {
    pub name: String,
    pub kind: ValueKind,
    /// `Some(n)` makes this an n-element array field.
    pub array_len: Option<u8>,
}

/// A buffered input window: holds for `window` frames after the press.
#[derive(Clone, Debug)]
pub struct InputBuffer {
    pub name: String,
    pub button: Button,
    pub window: u8,
}

/// Global physics parameters plus the bodies updated by world ticks.
#[derive(Clone, Debug)]
pub struct PhysicsWorld {
    /// Added to each body's vertical velocity every tick.
    pub gravity: i8,
    /// Terminal fall speed.
    pub max_fall: i8,
    pub bodies: Vec<PhysicsBody>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self {
            gravity: 1,
            max_fall: 7,
            bodies: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PhysicsBody {
    pub y_var: String,
    pub vel_y_var: String,
    /// Pixel row the body rests on, if grounded motion applies.
    pub floor: Option<u8>,
}
