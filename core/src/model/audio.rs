use indexmap::IndexMap;

use crate::ir::Channel;

/// Mixer: named channel groups with shared volume, mute, and priority.
#[derive(Clone, Debug, Default)]
pub struct AudioMixer {
    pub groups: IndexMap<String, MixerGroup>,
}

impl AudioMixer {
    /// Group owning `channel`, if any. A channel belongs to at most one
    /// group; unowned channels always pass the priority gate.
    pub fn group_for(&self, channel: Channel) -> Option<(&str, &MixerGroup)> {
        self.groups
            .iter()
            .find(|(_, g)| g.channels.contains(&channel))
            .map(|(name, g)| (name.as_str(), g))
    }
}

#[derive(Clone, Debug)]
pub struct MixerGroup {
    /// Sequential id assigned by the builder.
    pub id: u8,
    /// 0..100.
    pub volume: u8,
    pub muted: bool,
    /// Sounds below this priority are refused on owned channels.
    pub priority: u8,
    pub channels: Vec<Channel>,
}

/// One synthesized effect, played by a generated register-writing function.
#[derive(Clone, Debug)]
pub struct SoundEffect {
    pub name: String,
    pub channel: Channel,
    pub priority: u8,
    /// 11-bit period for pulse/wave; polynomial counter byte for noise.
    pub frequency: u16,
    /// Pulse duty 0..3.
    pub duty: u8,
    /// Initial envelope volume 0..15.
    pub volume: u8,
    /// Envelope pace 0..7 (0 holds the volume).
    pub fade: u8,
    /// Length counter 0..63; 0 plays until retriggered.
    pub length: u8,
    /// Raw sweep byte (pulse 1 only).
    pub sweep: u8,
}

impl SoundEffect {
    pub fn new(name: impl Into<String>, channel: Channel) -> Self {
        Self {
            name: name.into(),
            channel,
            priority: 0,
            frequency: 0x600,
            duty: 2,
            volume: 15,
            fade: 3,
            length: 0,
            sweep: 0,
        }
    }
}

/// A tracker song linked in by the music driver.
#[derive(Clone, Debug)]
pub struct MusicTrack {
    pub name: String,
    /// Linker symbol of the song data.
    pub symbol: String,
}
