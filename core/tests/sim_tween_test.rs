use gbforge_core::ir::{Easing, Expr, Stmt, TweenStmt};
use gbforge_core::sim::Simulator;

mod common;
use common::{empty_game, u8_var};

fn tween_game(from: i64, to: Expr, frames: u16) -> gbforge_core::model::GameModel {
    let mut game = empty_game("main");
    game.add_variable(u8_var("v", from));
    game.scenes.get_mut("main").unwrap().on_enter = vec![Stmt::Tween(TweenStmt::Start {
        var: "v".to_string(),
        from: None,
        to,
        frames,
        easing: Easing::Linear,
    })];
    game
}

// =============================================================================
// Scenario: integer-exact linear tween
// =============================================================================

#[test]
fn test_linear_tween_steps_exactly() {
    let game = tween_game(200, Expr::u8(50), 10);
    let mut sim = Simulator::new(&game);
    for k in 1..=10i64 {
        sim.execute_frame().unwrap();
        assert_eq!(
            sim.var("v").unwrap().raw,
            200 - 15 * k,
            "frame {k} drifted"
        );
    }
    // The slot deactivated at completion.
    sim.execute_frame().unwrap();
    assert_eq!(sim.var("v").unwrap().raw, 50);
}

#[test]
fn test_tween_final_frame_is_exact_target() {
    let game = tween_game(0, Expr::u8(7), 3);
    let mut sim = Simulator::new(&game);
    for _ in 0..3 {
        sim.execute_frame().unwrap();
    }
    assert_eq!(sim.var("v").unwrap().raw, 7);
}

#[test]
fn test_u8_target_clamps_high() {
    let game = tween_game(200, Expr::u16(300), 4);
    let mut sim = Simulator::new(&game);
    for _ in 0..4 {
        sim.execute_frame().unwrap();
    }
    assert_eq!(sim.var("v").unwrap().raw, 255);
}

#[test]
fn test_u8_target_clamps_low() {
    let game = tween_game(10, Expr::i16(-50), 4);
    let mut sim = Simulator::new(&game);
    for _ in 0..4 {
        sim.execute_frame().unwrap();
    }
    assert_eq!(sim.var("v").unwrap().raw, 0);
}

#[test]
fn test_tween_cancel_freezes_value() {
    let mut game = tween_game(100, Expr::u8(0), 10);
    game.scenes.get_mut("main").unwrap().on_frame = vec![];
    let mut sim = Simulator::new(&game);
    sim.execute_frame().unwrap();
    let mid = sim.var("v").unwrap().raw;
    sim.execute_stmt(&Stmt::Tween(TweenStmt::Cancel {
        var: "v".to_string(),
    }))
    .unwrap();
    sim.execute_frame().unwrap();
    assert_eq!(sim.var("v").unwrap().raw, mid);
}

#[test]
fn test_slots_are_limited_to_sixteen() {
    let mut game = empty_game("main");
    for i in 0..20 {
        game.add_variable(u8_var(&format!("v{i}"), 0));
    }
    let starts: Vec<Stmt> = (0..20)
        .map(|i| {
            Stmt::Tween(TweenStmt::Start {
                var: format!("v{i}"),
                from: None,
                to: Expr::u8(100),
                frames: 10,
                easing: Easing::Linear,
            })
        })
        .collect();
    game.scenes.get_mut("main").unwrap().on_enter = starts;
    let mut sim = Simulator::new(&game);
    sim.execute_frame().unwrap();
    // Only the first sixteen found a slot.
    assert_ne!(sim.var("v15").unwrap().raw, 0);
    assert_eq!(sim.var("v16").unwrap().raw, 0);
    assert_eq!(sim.var("v19").unwrap().raw, 0);
}
