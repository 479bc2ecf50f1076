use gbforge_core::ir::{Expr, Stmt};
use gbforge_core::model::Scene;
use gbforge_core::sim::Simulator;

mod common;
use common::{empty_game, set, u8_var};

// =============================================================================
// Scenario: scene change takes effect at the next frame's entry
// =============================================================================

fn scene_change_game() -> gbforge_core::model::GameModel {
    let mut game = empty_game("a");
    game.add_variable(u8_var("flag", 0));
    game.add_variable(u8_var("exited", 0));
    game.scenes.get_mut("a").unwrap().on_frame = vec![Stmt::SceneChange("b".to_string())];
    game.scenes.get_mut("a").unwrap().on_exit = vec![set("exited", Expr::u8(1))];
    let mut b = Scene::new("b");
    b.on_enter = vec![set("flag", Expr::u8(7))];
    game.add_scene(b);
    game
}

#[test]
fn test_exit_runs_now_enter_runs_next_frame() {
    let game = scene_change_game();
    let mut sim = Simulator::new(&game);

    sim.execute_frame().unwrap();
    // The change happened this frame: exit ran, scene is B, but B's
    // enter has not run yet.
    assert_eq!(sim.scene(), "b");
    assert_eq!(sim.var("exited").unwrap().raw, 1);
    assert_eq!(sim.var("flag").unwrap().raw, 0);

    sim.execute_frame().unwrap();
    assert_eq!(sim.var("flag").unwrap().raw, 7);
}

#[test]
fn test_enter_scene_defers_to_next_frame() {
    let game = scene_change_game();
    let mut sim = Simulator::new(&game);
    sim.enter_scene("b").unwrap();
    assert_eq!(sim.var("flag").unwrap().raw, 0);
    sim.execute_frame().unwrap();
    assert_eq!(sim.var("flag").unwrap().raw, 7);
}

#[test]
fn test_unknown_scene_is_error() {
    let game = scene_change_game();
    let mut sim = Simulator::new(&game);
    assert!(sim.enter_scene("nowhere").is_err());
}
