use gbforge_core::codegen::compile;
use gbforge_core::sim::Simulator;
use gbforge_games::skyward_salvo;

// =============================================================================
// End to end: the recorded game compiles clean
// =============================================================================

#[test]
fn test_compiles_without_validation_errors() {
    let game = skyward_salvo();
    let compiled = compile(&game).unwrap();
    assert!(compiled.validation.is_clean(), "{:?}", compiled.validation);
}

#[test]
fn test_emits_expected_entities() {
    let game = skyward_salvo();
    let out = compile(&game).unwrap().source;
    for fragment in [
        "#define SCENE_TITLE 0",
        "#define SCENE_LEVEL 1",
        "UINT8 _ship_anim = ANIM_NONE;",
        "const UINT8 *ship_anims[]",
        "UINT8 bullets_active[4];",
        "#define BULLETS_OAM_START 1",
        "const UINT8 _mixer_channel_group[4] = {1, 0, 0, 255};",
        "void play_sfx_laser(void)",
        "UINT8 _inbuf_fire = 0;",
        "void update_input_buffers(void)",
        "const UINT8 _ease_out_quad[256]",
        "void main(void)",
    ] {
        assert!(out.contains(fragment), "missing {fragment}");
    }
}

// =============================================================================
// End to end: the same IR runs in the simulator
// =============================================================================

#[test]
fn test_title_tween_slides_in() {
    let game = skyward_salvo();
    let mut sim = Simulator::new(&game);
    sim.execute_frame().unwrap();
    let early = sim.var("title_y").unwrap().raw;
    assert!(early < 144);
    for _ in 0..30 {
        sim.execute_frame().unwrap();
    }
    assert_eq!(sim.var("title_y").unwrap().raw, 60);
}

#[test]
fn test_start_fades_into_level() {
    let game = skyward_salvo();
    let mut sim = Simulator::new(&game);
    sim.execute_frame().unwrap();
    sim.set_joypad(gbforge_core::ir::Button::Start.mask());
    sim.execute_frame().unwrap();
    assert!(sim.transition_active());
    assert_eq!(sim.scene(), "title");
    sim.set_joypad(0);
    for _ in 0..12 {
        sim.execute_frame().unwrap();
    }
    assert_eq!(sim.scene(), "level");
    assert!(!sim.transition_active());
}

fn enter_level(sim: &mut Simulator<'_>) {
    sim.execute_frame().unwrap();
    sim.set_joypad(gbforge_core::ir::Button::Start.mask());
    sim.execute_frame().unwrap();
    sim.set_joypad(0);
    for _ in 0..13 {
        sim.execute_frame().unwrap();
    }
    assert_eq!(sim.scene(), "level");
}

#[test]
fn test_buffered_fire_spawns_bullet() {
    let game = skyward_salvo();
    let mut sim = Simulator::new(&game);
    enter_level(&mut sim);

    sim.set_joypad(gbforge_core::ir::Button::A.mask());
    sim.execute_frame().unwrap();
    sim.set_joypad(0);
    assert_eq!(sim.pool_count("bullets").unwrap(), 1);
    assert_eq!(sim.var("score").unwrap().raw, 1);

    // The bullet rises two pixels per frame and despawns off the top.
    let y0 = sim.array("bullets_y").unwrap()[0].raw;
    sim.execute_frame().unwrap();
    let y1 = sim.array("bullets_y").unwrap()[0].raw;
    assert_eq!(y1, y0 - 2);
    for _ in 0..80 {
        sim.execute_frame().unwrap();
    }
    assert_eq!(sim.pool_count("bullets").unwrap(), 0);
}

#[test]
fn test_dpad_moves_ship() {
    let game = skyward_salvo();
    let mut sim = Simulator::new(&game);
    enter_level(&mut sim);
    let x0 = sim.var("ship_x").unwrap().raw;
    sim.set_joypad(gbforge_core::ir::Button::Right.mask());
    for _ in 0..5 {
        sim.execute_frame().unwrap();
    }
    assert_eq!(sim.var("ship_x").unwrap().raw, x0 + 5);
    sim.set_joypad(gbforge_core::ir::Button::Left.mask());
    for _ in 0..3 {
        sim.execute_frame().unwrap();
    }
    assert_eq!(sim.var("ship_x").unwrap().raw, x0 + 2);
}

#[test]
fn test_cruise_animation_plays_on_entry() {
    let game = skyward_salvo();
    let mut sim = Simulator::new(&game);
    enter_level(&mut sim);
    assert_eq!(sim.sprite_anim("ship"), Some("cruise"));
}
