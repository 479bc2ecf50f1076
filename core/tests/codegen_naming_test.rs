use gbforge_core::codegen::compile;
use gbforge_core::ir::{AnimStmt, AnimTarget, Stmt};
use gbforge_core::model::{Scene, TileAsset};

mod common;
use common::{animated_sprite, empty_game, plain_pool, test_tiles, u8_var};

fn sample_game() -> gbforge_core::model::GameModel {
    let mut game = empty_game("title");
    game.add_scene(Scene::new("level1"));
    game.add_variable(u8_var("score", 0));
    game.tile_assets
        .insert("hero".to_string(), TileAsset::new("hero", test_tiles()));
    game.add_sprite(animated_sprite("p", "hero", 0));
    game.add_pool(plain_pool("b", 3, 1));
    game
}

// =============================================================================
// Scene and state constants
// =============================================================================

#[test]
fn test_scene_constants_in_definition_order() {
    let out = compile(&sample_game()).unwrap().source;
    assert!(out.contains("#define SCENE_NONE 255"));
    assert!(out.contains("#define SCENE_TITLE 0"));
    assert!(out.contains("#define SCENE_LEVEL1 1"));
}

#[test]
fn test_scene_functions_exist() {
    let out = compile(&sample_game()).unwrap().source;
    for name in [
        "void scene_title_enter(void)",
        "void scene_title_frame(void)",
        "void scene_title_exit(void)",
        "void scene_level1_frame(void)",
    ] {
        assert!(out.contains(name), "missing {name}");
    }
}

// =============================================================================
// Sprite animation naming
// =============================================================================

#[test]
fn test_sprite_anim_state_variables() {
    let out = compile(&sample_game()).unwrap().source;
    for name in [
        "UINT8 _p_anim = ANIM_NONE;",
        "UINT8 _p_frame = 0;",
        "UINT8 _p_timer = 0;",
        "UINT8 _p_speed = 100;",
        "UINT8 _p_flags = 0;",
        "UINT8 _p_queue_len = 0;",
    ] {
        assert!(out.contains(name), "missing {name}");
    }
}

#[test]
fn test_sprite_anim_tables() {
    let out = compile(&sample_game()).unwrap().source;
    assert!(out.contains("const UINT8 p_walk_frames[]"));
    assert!(out.contains("const UINT8 p_idle_frames[]"));
    assert!(out.contains("const UINT8 *p_anims[]"));
    assert!(out.contains("#define ANIM_P_WALK 0"));
    assert!(out.contains("#define ANIM_P_IDLE 1"));
    assert!(out.contains("#define ANIM_NONE 255"));
}

#[test]
fn test_anim_play_lowering_uses_constants() {
    let mut game = sample_game();
    game.scenes.get_mut("title").unwrap().on_enter = vec![Stmt::Anim(AnimStmt::Play {
        target: AnimTarget::Sprite("p".to_string()),
        anim: "walk".to_string(),
    })];
    let out = compile(&game).unwrap().source;
    assert!(out.contains("_p_anim = ANIM_P_WALK;"));
    assert!(out.contains("_p_frame = 0;"));
}

// =============================================================================
// Pool naming
// =============================================================================

#[test]
fn test_pool_arrays_sized_to_capacity() {
    let out = compile(&sample_game()).unwrap().source;
    for name in [
        "UINT8 b_active[3];",
        "UINT8 b_x[3];",
        "UINT8 b_y[3];",
        "INT8 b_vel_x[3];",
        "INT8 b_vel_y[3];",
        "UINT8 b_pool_count = 0;",
        "UINT8 _b_i = 0;",
        "#define B_OAM_START 1",
    ] {
        assert!(out.contains(name), "missing {name}");
    }
}

#[test]
fn test_pool_functions_exist() {
    let out = compile(&sample_game()).unwrap().source;
    for name in [
        "void b_spawn(void)",
        "void b_spawn_at(UINT8 x, UINT8 y)",
        "void b_despawn(UINT8 idx)",
        "void b_despawn_all(void)",
        "void b_update(void)",
    ] {
        assert!(out.contains(name), "missing {name}");
    }
}

// =============================================================================
// Main loop ordering
// =============================================================================

#[test]
fn test_main_loop_sequence() {
    let out = compile(&sample_game()).unwrap().source;
    let main_at = out.find("void main(void)").unwrap();
    let tail = &out[main_at..];
    let joypad = tail.find("_joypad = joypad();").unwrap();
    let scene = tail.find("update_scene();").unwrap();
    let anims = tail.find("update_animations();").unwrap();
    let transition = tail.find("update_transition();").unwrap();
    let tweens = tail.find("update_tweens();").unwrap();
    let frames = tail.find("_frame_count += 1;").unwrap();
    let vsync = tail.find("vsync();").unwrap();
    assert!(joypad < scene);
    assert!(scene < anims);
    assert!(anims < transition);
    assert!(transition < tweens);
    assert!(tweens < frames);
    assert!(frames < vsync);
}

#[test]
fn test_init_turns_display_off_then_on() {
    let out = compile(&sample_game()).unwrap().source;
    let init_at = out.find("void init(void)").unwrap();
    let tail = &out[init_at..];
    let off = tail.find("DISPLAY_OFF;").unwrap();
    let vars = tail.find("score = 0u;").unwrap();
    let sound = tail.find("NR52_REG = 0x80;").unwrap();
    let on = tail.find("DISPLAY_ON;").unwrap();
    assert!(off < vars);
    assert!(vars < sound);
    assert!(sound < on);
}
