use gbforge_core::codegen::compile;
use gbforge_core::ir::{AnimStmt, AnimTarget, Stmt};
use gbforge_core::model::{Animation, Sprite, TileAsset};

mod common;
use common::{animated_sprite, empty_game, test_tiles};

fn game_with_sprite() -> gbforge_core::model::GameModel {
    let mut game = empty_game("main");
    game.tile_assets
        .insert("hero".to_string(), TileAsset::new("hero", test_tiles()));
    game.add_sprite(animated_sprite("p", "hero", 0));
    game
}

// =============================================================================
// Updater shape
// =============================================================================

#[test]
fn test_updater_emitted_per_sprite() {
    let out = compile(&game_with_sprite()).unwrap().source;
    assert!(out.contains("void update_anim_p(void)"));
    assert!(out.contains("void _p_play_queued(void)"));
    assert!(out.contains("void update_animations(void)"));
    assert!(out.contains("update_anim_p();"));
}

#[test]
fn test_updater_speed_modulation() {
    let out = compile(&game_with_sprite()).unwrap().source;
    assert!(out.contains("ticks = (_p_speed >= 100) ? (_p_speed / 100) : 1;"));
    assert!(out.contains(
        "_p_timer = (_p_speed > 0 && _p_speed < 100) ? \
         (p_anim_delays[_p_anim] * 100) / _p_speed : p_anim_delays[_p_anim];"
    ));
}

#[test]
fn test_updater_completion_path() {
    let out = compile(&game_with_sprite()).unwrap().source;
    assert!(out.contains("_p_flags |= ANIM_FLAG_COMPLETE;"));
    assert!(out.contains("_p_anim = ANIM_NONE;"));
    assert!(out.contains("_p_play_queued();"));
}

#[test]
fn test_flag_bit_positions_are_stable() {
    let out = compile(&game_with_sprite()).unwrap().source;
    assert!(out.contains("#define ANIM_FLAG_LOOPING 0x01"));
    assert!(out.contains("#define ANIM_FLAG_PAUSED 0x02"));
    assert!(out.contains("#define ANIM_FLAG_REVERSED 0x04"));
    assert!(out.contains("#define ANIM_FLAG_COMPLETE 0x08"));
}

// =============================================================================
// Degradation
// =============================================================================

#[test]
fn test_empty_animation_gets_placeholder() {
    let mut game = empty_game("main");
    game.tile_assets
        .insert("hero".to_string(), TileAsset::new("hero", test_tiles()));
    let mut sprite = Sprite::new("p", "hero", 0);
    sprite
        .animations
        .insert("ghost".to_string(), Animation::new(vec![], 4, false));
    game.add_sprite(sprite);
    let out = compile(&game).unwrap().source;
    assert!(out.contains("1-frame placeholder"));
    assert!(out.contains("const UINT8 p_ghost_frames[] = {0};"));
    // Frame count coerced to 1 in the length table.
    assert!(out.contains("const UINT8 p_anim_lens[] = {1};"));
}

#[test]
fn test_unknown_sprite_reports_error_without_code() {
    let mut game = empty_game("main");
    game.scenes.get_mut("main").unwrap().on_frame = vec![Stmt::Anim(AnimStmt::Play {
        target: AnimTarget::Sprite("nobody".to_string()),
        anim: "walk".to_string(),
    })];
    let compiled = compile(&game).unwrap();
    assert!(!compiled.validation.is_clean());
    assert!(compiled.source.contains("/* ERROR:"));
    assert!(!compiled.source.contains("_nobody_anim ="));
}

// =============================================================================
// Pool animation arrays
// =============================================================================

#[test]
fn test_pool_anim_arrays_and_play() {
    let mut game = empty_game("main");
    game.tile_assets
        .insert("orb".to_string(), TileAsset::new("orb", test_tiles()));
    let mut pool = common::plain_pool("shots", 4, 2);
    pool.sprite = Some("orb".to_string());
    pool.animations
        .insert("spin".to_string(), Animation::new(vec![0, 1], 3, true));
    pool.on_spawn = vec![Stmt::Anim(AnimStmt::Play {
        target: AnimTarget::Pool("shots".to_string()),
        anim: "spin".to_string(),
    })];
    game.add_pool(pool);
    let out = compile(&game).unwrap().source;
    assert!(out.contains("UINT8 shots_anim[4];"));
    assert!(out.contains("UINT8 shots_anim_complete[4];"));
    assert!(out.contains("shots_anim[_shots_i] = ANIM_SHOTS_SPIN;"));
    assert!(out.contains("shots_anim_complete[_shots_i] = 0;"));
}
