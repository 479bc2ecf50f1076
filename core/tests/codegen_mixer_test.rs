use gbforge_core::codegen::compile;
use gbforge_core::ir::{Channel, Expr, MixerStmt, SoundStmt, Stmt};
use gbforge_core::model::{AudioMixer, MixerGroup, SoundEffect};

mod common;
use common::empty_game;

fn mixer_game() -> gbforge_core::model::GameModel {
    let mut game = empty_game("main");
    let mut mixer = AudioMixer::default();
    mixer.groups.insert(
        "music".to_string(),
        MixerGroup {
            id: 0,
            volume: 80,
            muted: false,
            priority: 0,
            channels: vec![Channel::Pulse2, Channel::Wave],
        },
    );
    mixer.groups.insert(
        "sfx".to_string(),
        MixerGroup {
            id: 1,
            volume: 100,
            muted: false,
            priority: 5,
            channels: vec![Channel::Pulse1],
        },
    );
    game.mixer = Some(mixer);
    let mut laser = SoundEffect::new("laser", Channel::Pulse1);
    laser.priority = 5;
    game.sounds.insert("laser".to_string(), laser);
    game
}

// =============================================================================
// Channel ownership table
// =============================================================================

#[test]
fn test_channel_group_table() {
    let out = compile(&mixer_game()).unwrap().source;
    // Pulse1 -> sfx(1), Pulse2/Wave -> music(0), Noise unowned (255).
    assert!(out.contains("const UINT8 _mixer_channel_group[4] = {1, 0, 0, 255};"));
}

#[test]
fn test_group_state_variables() {
    let out = compile(&mixer_game()).unwrap().source;
    for name in [
        "UINT8 _mixer_music_volume = 80;",
        "UINT8 _mixer_music_muted = 0;",
        "UINT8 _mixer_music_priority = 0;",
        "UINT8 _mixer_sfx_volume = 100;",
        "UINT8 _mixer_sfx_priority = 5;",
        "UINT16 _mixer_sfx_fade_duration = 0;",
    ] {
        assert!(out.contains(name), "missing {name}");
    }
}

// =============================================================================
// Helpers
// =============================================================================

#[test]
fn test_master_volume_write() {
    let out = compile(&mixer_game()).unwrap().source;
    assert!(out.contains("void _mixer_apply_volume(void)"));
    assert!(out.contains("hw = (master * 7) / 100;"));
    assert!(out.contains("NR50_REG = (hw << 4) | hw;"));
}

#[test]
fn test_priority_gate_function() {
    let out = compile(&mixer_game()).unwrap().source;
    assert!(out.contains("UINT8 _mixer_can_play(UINT8 channel, UINT8 priority)"));
    assert!(out.contains("if (group == 255)"));
    assert!(out.contains("case 0: return priority >= _mixer_music_priority;"));
    assert!(out.contains("case 1: return priority >= _mixer_sfx_priority;"));
}

#[test]
fn test_sfx_player_is_priority_gated() {
    let out = compile(&mixer_game()).unwrap().source;
    assert!(out.contains("void play_sfx_laser(void)"));
    assert!(out.contains("if (!_mixer_can_play(0, 5))"));
    // Pulse 1 register writes with the trigger bit.
    assert!(out.contains("NR13_REG ="));
    assert!(out.contains("NR14_REG ="));
}

#[test]
fn test_mixer_statement_lowering() {
    let mut game = mixer_game();
    game.scenes.get_mut("main").unwrap().on_frame = vec![
        Stmt::Mixer(MixerStmt::SetVolume {
            group: "music".to_string(),
            volume: Expr::u8(40),
        }),
        Stmt::Mixer(MixerStmt::Fade {
            group: "sfx".to_string(),
            target: 0,
            frames: 60,
        }),
        Stmt::Mixer(MixerStmt::ToggleMute {
            group: "music".to_string(),
        }),
        Stmt::Sound(SoundStmt::Play {
            effect: "laser".to_string(),
        }),
    ];
    let out = compile(&game).unwrap().source;
    assert!(out.contains("_mixer_set_volume_music(40);"));
    assert!(out.contains("_mixer_sfx_fade_target = 0;"));
    assert!(out.contains("_mixer_sfx_fade_duration = 60;"));
    assert!(out.contains("_mixer_music_muted = !_mixer_music_muted;"));
    assert!(out.contains("play_sfx_laser();"));
}

#[test]
fn test_sound_routing_constants() {
    let out = compile(&mixer_game()).unwrap().source;
    // Sound hardware bring-up in init().
    assert!(out.contains("NR52_REG = 0x80;"));
    assert!(out.contains("NR51_REG = 0xFF;"));
    assert!(out.contains("NR50_REG = 0x77;"));
}
