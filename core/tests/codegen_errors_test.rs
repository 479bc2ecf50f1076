use gbforge_core::codegen::compile;
use gbforge_core::ir::{AssignOp, Expr, MixerStmt, Stmt};

mod common;
use common::empty_game;

// =============================================================================
// Unknown references degrade: report, skip, keep compiling
// =============================================================================

#[test]
fn test_unknown_variable_assignment_is_skipped() {
    let mut game = empty_game("main");
    game.scenes.get_mut("main").unwrap().on_frame = vec![Stmt::Assign {
        target: "ghost".to_string(),
        op: AssignOp::Set,
        value: Expr::u8(1),
    }];
    let compiled = compile(&game).unwrap();
    assert_eq!(compiled.validation.errors.len(), 1);
    assert!(compiled.source.contains("/* ERROR: unknown variable \"ghost\" */"));
    assert!(!compiled.source.contains("ghost = 1;"));
}

#[test]
fn test_unknown_scene_change_is_skipped() {
    let mut game = empty_game("main");
    game.scenes.get_mut("main").unwrap().on_frame =
        vec![Stmt::SceneChange("nowhere".to_string())];
    let compiled = compile(&game).unwrap();
    assert!(!compiled.validation.is_clean());
    assert!(!compiled.source.contains("change_scene(SCENE_NOWHERE);"));
}

#[test]
fn test_unknown_mixer_group_is_reported() {
    let mut game = empty_game("main");
    game.scenes.get_mut("main").unwrap().on_frame = vec![Stmt::Mixer(MixerStmt::Mute {
        group: "voice".to_string(),
        muted: true,
    })];
    let compiled = compile(&game).unwrap();
    assert!(!compiled.validation.is_clean());
}

#[test]
fn test_unknown_variable_in_expression_becomes_zero() {
    let mut game = empty_game("main");
    game.add_variable(common::u8_var("x", 0));
    game.scenes.get_mut("main").unwrap().on_frame = vec![common::set("x", Expr::var("ghost"))];
    let compiled = compile(&game).unwrap();
    assert!(!compiled.validation.is_clean());
    assert!(compiled.source.contains("x = 0;"));
}

#[test]
fn test_clean_game_has_clean_report() {
    let compiled = compile(&empty_game("main")).unwrap();
    assert!(compiled.validation.is_clean());
    assert!(!compiled.source.contains("/* ERROR:"));
}

#[test]
fn test_unknown_start_scene_is_reported() {
    let mut game = empty_game("main");
    game.start_scene = "missing".to_string();
    let compiled = compile(&game).unwrap();
    assert!(!compiled.validation.is_clean());
    assert!(compiled.source.contains("_current_scene = SCENE_NONE;"));
}

#[test]
fn test_oversized_tilemap_is_fatal() {
    use gbforge_core::error::BuildError;
    use gbforge_core::model::Tilemap;

    let mut game = empty_game("main");
    game.tilemaps.insert(
        "world".to_string(),
        Tilemap {
            name: "world".to_string(),
            width: 40,
            height: 40,
            tiles: vec![0; 1600],
            collision: None,
            tileset: None,
        },
    );
    assert!(matches!(
        compile(&game),
        Err(BuildError::TilemapInvalid { .. })
    ));
}
