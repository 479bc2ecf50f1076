use gbforge_core::codegen::compile;
use gbforge_core::ir::{
    CameraStmt, CutsceneStmt, DialogStmt, Expr, Heuristic, LinkStmt, MenuStmt, PathStmt,
    PhysicsStmt, SaveStmt, Stmt, TweenStmt, ValueKind,
};
use gbforge_core::model::{
    CameraDef, Cutscene, CutsceneStep, Dialog, Menu, MenuItem, NavGrid, PhysicsBody,
    PhysicsWorld, SaveField, SaveSchema,
};

mod common;
use common::{empty_game, set, u8_var};

// =============================================================================
// Dialogs
// =============================================================================

#[test]
fn test_dialog_buffers_and_typewriter() {
    let mut game = empty_game("main");
    game.dialogs
        .insert("talk".to_string(), Dialog::new("talk", 0, 12, 18, 4));
    game.scenes.get_mut("main").unwrap().on_frame = vec![
        Stmt::Dialog(DialogStmt::Say {
            dialog: "talk".to_string(),
            text: "HELLO \"WORLD\"".to_string(),
        }),
        Stmt::Dialog(DialogStmt::Tick {
            dialog: "talk".to_string(),
        }),
    ];
    let out = compile(&game).unwrap().source;
    assert!(out.contains("#define DIALOG_BUFFER_SIZE 80"));
    assert!(out.contains("#define TALK_BUFFER_SIZE 80"));
    assert!(out.contains("char _talk_buffer[TALK_BUFFER_SIZE];"));
    assert!(out.contains("void _dialog_talk_tick(void)"));
    assert!(out.contains("_dialog_talk_say(\"HELLO \\\"WORLD\\\"\");"));
    assert!(out.contains("printf(\"%c\", _talk_buffer[_talk_pos]);"));
}

// =============================================================================
// Menus
// =============================================================================

#[test]
fn test_menu_tables_and_navigation() {
    let mut game = empty_game("main");
    game.add_variable(u8_var("chosen", 0));
    let mut menu = Menu::new("pause", 2, 2);
    menu.items.push(MenuItem {
        label: "RESUME".to_string(),
        on_select: vec![set("chosen", Expr::u8(1))],
    });
    menu.items.push(MenuItem {
        label: "QUIT".to_string(),
        on_select: vec![set("chosen", Expr::u8(2))],
    });
    game.menus.insert("pause".to_string(), menu);
    game.scenes.get_mut("main").unwrap().on_frame = vec![Stmt::Menu(MenuStmt::Tick {
        menu: "pause".to_string(),
    })];
    let out = compile(&game).unwrap().source;
    assert!(out.contains("const char *_pause_items[2] = {\"RESUME\", \"QUIT\"};"));
    assert!(out.contains("UINT8 _pause_cursor = 0;"));
    assert!(out.contains("void _menu_pause_select(void)"));
    assert!(out.contains("void _menu_pause_tick(void)"));
}

// =============================================================================
// Saves
// =============================================================================

#[test]
fn test_save_struct_and_slot_functions() {
    let mut game = empty_game("main");
    game.save = Some(SaveSchema {
        slots: 2,
        magic: 0x5A17,
        fields: vec![
            SaveField {
                name: "hp".to_string(),
                kind: ValueKind::U8,
                array_len: None,
            },
            SaveField {
                name: "inventory".to_string(),
                kind: ValueKind::U8,
                array_len: Some(8),
            },
        ],
    });
    game.scenes.get_mut("main").unwrap().on_frame = vec![
        Stmt::Save(SaveStmt::FieldWrite {
            field: "hp".to_string(),
            value: Expr::u8(10),
        }),
        Stmt::Save(SaveStmt::Save { slot: 0 }),
    ];
    let out = compile(&game).unwrap().source;
    assert!(out.contains("#define SAVE_MAGIC 0x5A17"));
    assert!(out.contains("#define SAVE_SLOTS 2"));
    assert!(out.contains("UINT8 inventory[8];"));
    assert!(out.contains("} _save_data_t;"));
    assert!(out.contains("void save_game(UINT8 slot)"));
    assert!(out.contains("ENABLE_RAM;"));
    assert!(out.contains("_save_data.hp = 10;"));
}

// =============================================================================
// Nav grids and paths
// =============================================================================

#[test]
fn test_navgrid_data_and_path_state() {
    let mut game = empty_game("main");
    game.add_variable(u8_var("mx", 0));
    game.add_variable(u8_var("my", 0));
    game.nav_grids
        .insert("field".to_string(), NavGrid::open("field", 8, 8));
    game.scenes.get_mut("main").unwrap().on_frame = vec![
        Stmt::Path(PathStmt::Find {
            path: "walk".to_string(),
            grid: "field".to_string(),
            from_x: Expr::u8(0),
            from_y: Expr::u8(0),
            to_x: Expr::u8(5),
            to_y: Expr::u8(5),
            heuristic: Heuristic::Manhattan,
        }),
        Stmt::Path(PathStmt::Follow {
            path: "walk".to_string(),
            x_var: "mx".to_string(),
            y_var: "my".to_string(),
        }),
    ];
    let out = compile(&game).unwrap().source;
    assert!(out.contains("const UINT8 field_weights_rom[64]"));
    assert!(out.contains("UINT8 field_weights[64];"));
    assert!(out.contains("memcpy(field_weights, field_weights_rom, 64);"));
    assert!(out.contains("UINT8 _path_0_x[PATH_MAX];"));
    assert!(out.contains("UINT8 _path_0_found = 0;"));
    assert!(out.contains("_path_0_found = _path_find(field_weights, 8, 8,"));
    assert!(out.contains("void _path_follow("));
}

// =============================================================================
// Camera, cutscenes, physics, link
// =============================================================================

#[test]
fn test_camera_update_and_scroll_write() {
    let mut game = empty_game("main");
    game.camera = Some(CameraDef {
        x: 0,
        y: 0,
        bounds: Some((0, 0, 256, 256)),
    });
    game.scenes.get_mut("main").unwrap().on_frame = vec![Stmt::Camera(CameraStmt::Update)];
    let out = compile(&game).unwrap().source;
    assert!(out.contains("void update_camera(void)"));
    assert!(out.contains("SCX_REG = (UINT8)(_camera_x + shake_x);"));
    assert!(out.contains("UINT8 _camera_bounded = 1;"));
}

#[test]
fn test_cutscene_stepper() {
    let mut game = empty_game("main");
    game.add_variable(u8_var("beat", 0));
    let mut cutscene = Cutscene::new("intro");
    cutscene.steps.push(CutsceneStep {
        frames: 30,
        body: vec![set("beat", Expr::u8(1))],
    });
    cutscene.steps.push(CutsceneStep {
        frames: 10,
        body: vec![set("beat", Expr::u8(2))],
    });
    game.cutscenes.insert("intro".to_string(), cutscene);
    game.scenes.get_mut("main").unwrap().on_frame = vec![Stmt::Cutscene(CutsceneStmt::Update {
        cutscene: "intro".to_string(),
    })];
    let out = compile(&game).unwrap().source;
    assert!(out.contains("void update_cutscene_intro(void)"));
    assert!(out.contains("void skip_cutscene_intro(void)"));
    assert!(out.contains("_intro_timer = 30;"));
}

#[test]
fn test_physics_world_update() {
    let mut game = empty_game("main");
    game.add_variable(u8_var("py", 0));
    game.add_variable(gbforge_core::model::Variable::new(
        "pvy",
        ValueKind::I8,
        0,
    ));
    game.physics = Some(PhysicsWorld {
        gravity: 1,
        max_fall: 6,
        bodies: vec![PhysicsBody {
            y_var: "py".to_string(),
            vel_y_var: "pvy".to_string(),
            floor: Some(136),
        }],
    });
    game.scenes.get_mut("main").unwrap().on_frame =
        vec![Stmt::Physics(PhysicsStmt::WorldUpdate)];
    let out = compile(&game).unwrap().source;
    assert!(out.contains("void update_physics(void)"));
    assert!(out.contains("pvy += 1;"));
    assert!(out.contains("if (pvy > 6)"));
    assert!(out.contains("if (py > 136)"));
}

#[test]
fn test_link_cable_helpers() {
    let mut game = empty_game("main");
    game.link_cable = true;
    game.scenes.get_mut("main").unwrap().on_frame = vec![
        Stmt::Link(LinkStmt::Update),
        Stmt::Link(LinkStmt::Send { value: Expr::u8(9) }),
    ];
    let out = compile(&game).unwrap().source;
    assert!(out.contains("void link_update(void)"));
    assert!(out.contains("link_send(9);"));
    assert!(out.contains("SC_REG = 0x81;"));
}

// =============================================================================
// Tween data
// =============================================================================

#[test]
fn test_only_referenced_easings_are_baked() {
    let mut game = empty_game("main");
    game.add_variable(u8_var("v", 0));
    game.scenes.get_mut("main").unwrap().on_enter = vec![Stmt::Tween(TweenStmt::Start {
        var: "v".to_string(),
        from: None,
        to: Expr::u8(10),
        frames: 10,
        easing: gbforge_core::ir::Easing::EaseOutBounce,
    })];
    let out = compile(&game).unwrap().source;
    assert!(out.contains("const UINT8 _ease_linear[256]"));
    assert!(out.contains("const UINT8 _ease_out_bounce[256]"));
    // Unreferenced curves fall back to the linear table.
    assert!(!out.contains("const UINT8 _ease_in_cubic[256]"));
    assert!(out.contains("#define MAX_TWEENS 16"));
    assert!(out.contains("const UINT8 *_ease_tables[8]"));
}
