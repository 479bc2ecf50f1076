//! Sound, music, and mixer lowering.
//!
//! Sound effects become dedicated register-writing player functions gated
//! through the mixer priority check when a mixer owns the channel. Mixer
//! groups keep per-group volume/mute/priority/fade state; the applied
//! master volume is the maximum over non-muted groups, converted from
//! 0..100 to the hardware 0..7 range and written to NR50 symmetrically.

use crate::error::BuildError;
use crate::ir::{Channel, MixerStmt, SoundStmt, Stmt};
use crate::model::SoundEffect;

use super::Generator;

impl Generator<'_> {
    /// Category handler for the audio family (sound, music, mixer).
    pub(crate) fn sound_stmt(&mut self, stmt: &Stmt) -> Result<bool, BuildError> {
        match stmt {
            Stmt::Sound(s) => {
                self.lower_sound(s);
                Ok(true)
            }
            Stmt::Mixer(m) => {
                self.lower_mixer(m);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn lower_sound(&mut self, stmt: &SoundStmt) {
        match stmt {
            SoundStmt::Play { effect } => {
                if self.game.sounds.contains_key(effect) {
                    self.out.line(format!("play_sfx_{effect}();"));
                } else {
                    self.verror("sound", format!("unknown sound effect {effect:?}"));
                }
            }
            SoundStmt::Stop { channel } => {
                for line in stop_channel_lines(*channel) {
                    self.out.line(line);
                }
            }
            SoundStmt::Mute { channel, muted } => {
                let mask = 0x11u8 << channel.index();
                if *muted {
                    self.out.line(format!("NR51_REG &= 0x{:02X};", !mask));
                } else {
                    self.out.line(format!("NR51_REG |= 0x{mask:02X};"));
                }
            }
            SoundStmt::Pan { channel, left, right } => {
                let mask = 0x11u8 << channel.index();
                let mut bits = 0u8;
                if *left {
                    bits |= 0x10 << channel.index();
                }
                if *right {
                    bits |= 0x01 << channel.index();
                }
                self.out.line(format!(
                    "NR51_REG = (NR51_REG & 0x{:02X}) | 0x{bits:02X};",
                    !mask
                ));
            }
            SoundStmt::MasterVolume(volume) => {
                let volume = self.expr(volume);
                self.out.line(format!("_audio_tmp = ({volume} * 7) / 100;"));
                self.out.line("NR50_REG = (_audio_tmp << 4) | _audio_tmp;");
            }
            SoundStmt::MusicPlay { track } => {
                let Some(track) = self.game.music.get(track) else {
                    self.verror("music", format!("unknown music track {track:?}"));
                    return;
                };
                let symbol = track.symbol.clone();
                self.out.line(format!("hUGE_init(&{symbol});"));
                self.out.line("_music_playing = 1;");
                self.out.line("_music_paused = 0;");
            }
            SoundStmt::MusicPause => {
                self.out.line("_music_paused = 1;");
                if !self.game.music.is_empty() {
                    for ch in 0..3 {
                        self.out.line(format!("hUGE_mute_channel({ch}, 1);"));
                    }
                }
            }
            SoundStmt::MusicResume => {
                self.out.line("_music_paused = 0;");
                if !self.game.music.is_empty() {
                    for ch in 0..3 {
                        self.out.line(format!("hUGE_mute_channel({ch}, 0);"));
                    }
                }
            }
            SoundStmt::MusicStop => {
                self.out.line("_music_playing = 0;");
                for channel in Channel::ALL {
                    for line in stop_channel_lines(channel) {
                        self.out.line(line);
                    }
                }
            }
            SoundStmt::MusicFade { target, frames } => {
                let routed = self
                    .game
                    .mixer
                    .as_ref()
                    .is_some_and(|m| m.groups.contains_key("music"));
                if routed {
                    self.lower_mixer(&MixerStmt::Fade {
                        group: "music".to_string(),
                        target: *target,
                        frames: *frames,
                    });
                } else {
                    self.out.line("_music_fade_start = _music_volume;");
                    self.out.line(format!("_music_fade_target = {target};"));
                    self.out.line("_music_fade_timer = 0;");
                    self.out.line(format!("_music_fade_duration = {frames};"));
                    self.out.line("_music_fade_active = 1;");
                }
            }
        }
    }

    fn lower_mixer(&mut self, stmt: &MixerStmt) {
        let group_name = match stmt {
            MixerStmt::SetVolume { group, .. }
            | MixerStmt::Fade { group, .. }
            | MixerStmt::Mute { group, .. }
            | MixerStmt::ToggleMute { group } => group.clone(),
        };
        let known = self
            .game
            .mixer
            .as_ref()
            .is_some_and(|m| m.groups.contains_key(&group_name));
        if !known {
            self.verror("mixer", format!("unknown mixer group {group_name:?}"));
            return;
        }
        match stmt {
            MixerStmt::SetVolume { group, volume } => {
                let volume = self.expr(volume);
                self.out.line(format!("_mixer_set_volume_{group}({volume});"));
            }
            MixerStmt::Fade { group, target, frames } => {
                self.out
                    .line(format!("_mixer_{group}_fade_start = _mixer_{group}_volume;"));
                self.out.line(format!("_mixer_{group}_fade_target = {target};"));
                self.out.line(format!("_mixer_{group}_fade_timer = 0;"));
                self.out
                    .line(format!("_mixer_{group}_fade_duration = {frames};"));
                self.out.line(format!("_mixer_{group}_fade_active = 1;"));
            }
            MixerStmt::Mute { group, muted } => {
                self.out
                    .line(format!("_mixer_{group}_muted = {};", *muted as u8));
                self.out.line("_mixer_apply_volume();");
            }
            MixerStmt::ToggleMute { group } => {
                self.out
                    .line(format!("_mixer_{group}_muted = !_mixer_{group}_muted;"));
                self.out.line("_mixer_apply_volume();");
            }
        }
    }

    // -- helper functions --------------------------------------------------

    pub(crate) fn gen_mixer_helpers(&mut self) -> Result<(), BuildError> {
        let Some(mixer) = self.game.mixer.as_ref() else {
            return Ok(());
        };
        let groups: Vec<(String, u8)> = mixer
            .groups
            .iter()
            .map(|(name, g)| (name.clone(), g.id))
            .collect();

        self.begin_fn("void _mixer_apply_volume(void)");
        self.out.line("UINT8 master = 0;");
        self.out.line("UINT8 hw;");
        for (name, _) in &groups {
            self.out.open(format!(
                "if (!_mixer_{name}_muted && _mixer_{name}_volume > master)"
            ));
            self.out.line(format!("master = _mixer_{name}_volume;"));
            self.out.close();
        }
        self.out.line("hw = (master * 7) / 100;");
        self.out.line("NR50_REG = (hw << 4) | hw;");
        self.end_fn();

        self.begin_fn("UINT8 _mixer_can_play(UINT8 channel, UINT8 priority)");
        self.out.line("UINT8 group = _mixer_channel_group[channel];");
        self.out.open("if (group == 255)");
        self.out.line("return 1;");
        self.out.close();
        self.out.open("switch (group)");
        for (name, id) in &groups {
            self.out
                .line(format!("case {id}: return priority >= _mixer_{name}_priority;"));
        }
        self.out.close();
        self.out.line("return 1;");
        self.end_fn();

        for (name, _) in &groups {
            self.begin_fn(&format!("void _mixer_set_volume_{name}(UINT8 vol)"));
            self.out.open("if (vol > 100)");
            self.out.line("vol = 100;");
            self.out.close();
            self.out.line(format!("_mixer_{name}_volume = vol;"));
            self.out.line("_mixer_apply_volume();");
            self.end_fn();
        }

        self.begin_fn("void update_mixer_fades(void)");
        self.out.line("UINT8 changed = 0;");
        for (name, _) in &groups {
            self.out.open(format!("if (_mixer_{name}_fade_active)"));
            self.out.line(format!("_mixer_{name}_fade_timer += 1;"));
            self.out.open(format!(
                "if (_mixer_{name}_fade_timer >= _mixer_{name}_fade_duration)"
            ));
            self.out
                .line(format!("_mixer_{name}_volume = _mixer_{name}_fade_target;"));
            self.out.line(format!("_mixer_{name}_fade_active = 0;"));
            self.out.chain("} else {");
            self.out.line(format!(
                "_mixer_{name}_volume = _mixer_{name}_fade_start + \
                 (INT16)(_mixer_{name}_fade_target - _mixer_{name}_fade_start) * \
                 (INT16)_mixer_{name}_fade_timer / (INT16)_mixer_{name}_fade_duration;"
            ));
            self.out.close();
            self.out.line("changed = 1;");
            self.out.close();
        }
        self.out.open("if (changed)");
        self.out.line("_mixer_apply_volume();");
        self.out.close();
        self.end_fn();
        Ok(())
    }

    /// One `update_music` covers the driver tick, the music fade, and the
    /// mixer fades, matching the main loop's "music tick + fade" slot.
    pub(crate) fn gen_music_helpers(&mut self) -> Result<(), BuildError> {
        let has_music = !self.game.music.is_empty();
        let has_mixer = self.game.mixer.is_some();
        if !has_music && !has_mixer {
            return Ok(());
        }
        self.begin_fn("void update_music(void)");
        if has_music {
            self.out.open("if (_music_playing && !_music_paused)");
            self.out.line("hUGE_dosound();");
            self.out.close();
        }
        if has_music && !has_mixer {
            self.out.open("if (_music_fade_active)");
            self.out.line("_music_fade_timer += 1;");
            self.out.open("if (_music_fade_timer >= _music_fade_duration)");
            self.out.line("_music_volume = _music_fade_target;");
            self.out.line("_music_fade_active = 0;");
            self.out.chain("} else {");
            self.out.line(
                "_music_volume = _music_fade_start + \
                 (INT16)(_music_fade_target - _music_fade_start) * \
                 (INT16)_music_fade_timer / (INT16)_music_fade_duration;",
            );
            self.out.close();
            self.out.line("_audio_tmp = (_music_volume * 7) / 100;");
            self.out.line("NR50_REG = (_audio_tmp << 4) | _audio_tmp;");
            self.out.close();
        }
        if has_mixer {
            self.out.line("update_mixer_fades();");
        }
        self.end_fn();
        Ok(())
    }

    // -- data --------------------------------------------------------------

    /// Sound-effect player functions live in the data section, after the
    /// raw data arrays and before the animation tables.
    pub(crate) fn emit_sfx_players(&mut self) {
        let effects: Vec<SoundEffect> = self.game.sounds.values().cloned().collect();
        let gated = self.game.mixer.is_some();
        for sfx in &effects {
            self.begin_fn(&format!("void play_sfx_{}(void)", sfx.name));
            if gated {
                self.out.open(format!(
                    "if (!_mixer_can_play({}, {}))",
                    sfx.channel.index(),
                    sfx.priority
                ));
                self.out.line("return;");
                self.out.close();
            }
            for (reg, value) in sfx_registers(sfx) {
                self.out.line(format!("{reg} = 0x{value:02X};"));
            }
            self.end_fn();
        }
    }

    pub(crate) fn emit_mixer_data(&mut self) {
        let Some(mixer) = self.game.mixer.as_ref() else {
            return;
        };
        let mut lines: Vec<String> = Vec::new();
        for (name, group) in &mixer.groups {
            lines.push(format!("UINT8 _mixer_{name}_volume = {};", group.volume));
            lines.push(format!("UINT8 _mixer_{name}_muted = {};", group.muted as u8));
            lines.push(format!("UINT8 _mixer_{name}_priority = {};", group.priority));
            lines.push(format!("UINT8 _mixer_{name}_fade_active = 0;"));
            lines.push(format!("UINT8 _mixer_{name}_fade_start = 0;"));
            lines.push(format!("UINT8 _mixer_{name}_fade_target = 0;"));
            lines.push(format!("UINT16 _mixer_{name}_fade_timer = 0;"));
            lines.push(format!("UINT16 _mixer_{name}_fade_duration = 0;"));
        }
        // Channel -> owning group id; 255 marks an unowned channel.
        let mut table = [255u8; 4];
        for group in mixer.groups.values() {
            for channel in &group.channels {
                table[channel.index() as usize] = group.id;
            }
        }
        lines.push(format!(
            "const UINT8 _mixer_channel_group[4] = {{{}, {}, {}, {}}};",
            table[0], table[1], table[2], table[3]
        ));
        for line in lines {
            self.out.line(line);
        }
        self.out.blank();
    }

    pub(crate) fn emit_music_data(&mut self) {
        if self.game.music.is_empty() {
            return;
        }
        let symbols: Vec<String> = self.game.music.values().map(|t| t.symbol.clone()).collect();
        for symbol in symbols {
            self.out.line(format!("extern const hUGESong_t {symbol};"));
        }
        self.out.line("UINT8 _music_playing = 0;");
        self.out.line("UINT8 _music_paused = 0;");
        if self.game.mixer.is_none() {
            self.out.line("UINT8 _music_volume = 100;");
            self.out.line("UINT8 _music_fade_active = 0;");
            self.out.line("UINT8 _music_fade_start = 0;");
            self.out.line("UINT8 _music_fade_target = 0;");
            self.out.line("UINT16 _music_fade_timer = 0;");
            self.out.line("UINT16 _music_fade_duration = 0;");
        }
        self.out.blank();
    }
}

/// Register writes silencing one channel.
fn stop_channel_lines(channel: Channel) -> Vec<String> {
    match channel {
        Channel::Pulse1 => vec!["NR12_REG = 0x00;".into(), "NR14_REG = 0x80;".into()],
        Channel::Pulse2 => vec!["NR22_REG = 0x00;".into(), "NR24_REG = 0x80;".into()],
        Channel::Wave => vec!["NR30_REG = 0x00;".into()],
        Channel::Noise => vec!["NR42_REG = 0x00;".into(), "NR44_REG = 0x80;".into()],
    }
}

/// Synthesize the register byte sequence for one effect.
fn sfx_registers(sfx: &SoundEffect) -> Vec<(&'static str, u8)> {
    let freq = sfx.frequency & 0x07FF;
    let length_enable = if sfx.length > 0 { 0x40 } else { 0x00 };
    let envelope = ((sfx.volume & 0x0F) << 4) | (sfx.fade & 0x07);
    match sfx.channel {
        Channel::Pulse1 => vec![
            ("NR10_REG", sfx.sweep),
            ("NR11_REG", ((sfx.duty & 3) << 6) | (sfx.length & 0x3F)),
            ("NR12_REG", envelope),
            ("NR13_REG", (freq & 0xFF) as u8),
            ("NR14_REG", 0x80 | length_enable | (freq >> 8) as u8),
        ],
        Channel::Pulse2 => vec![
            ("NR21_REG", ((sfx.duty & 3) << 6) | (sfx.length & 0x3F)),
            ("NR22_REG", envelope),
            ("NR23_REG", (freq & 0xFF) as u8),
            ("NR24_REG", 0x80 | length_enable | (freq >> 8) as u8),
        ],
        Channel::Wave => {
            // Wave output level: 0 mute, 1 full, 2 half, 3 quarter.
            let level = match sfx.volume {
                0 => 0u8,
                12..=15 => 1,
                6..=11 => 2,
                _ => 3,
            };
            vec![
                ("NR30_REG", 0x80),
                ("NR31_REG", sfx.length),
                ("NR32_REG", level << 5),
                ("NR33_REG", (freq & 0xFF) as u8),
                ("NR34_REG", 0x80 | length_enable | (freq >> 8) as u8),
            ]
        }
        Channel::Noise => vec![
            ("NR41_REG", sfx.length & 0x3F),
            ("NR42_REG", envelope),
            ("NR43_REG", (sfx.frequency & 0xFF) as u8),
            ("NR44_REG", 0x80 | length_enable),
        ],
    }
}
