use gbforge_core::ir::{BinaryOp, Expr, MachineStmt, Stmt};
use gbforge_core::model::{MachineState, StateMachine, StateTransition};
use gbforge_core::sim::Simulator;

mod common;
use common::{bin, empty_game, set, u8_var};

fn machine_game() -> gbforge_core::model::GameModel {
    let mut game = empty_game("main");
    game.add_variable(u8_var("go", 0));
    game.add_variable(u8_var("entered", 0));
    game.add_variable(u8_var("acted", 0));
    game.add_variable(u8_var("left", 0));

    let mut machine = StateMachine::new("ai");
    let mut idle = MachineState::new("idle");
    idle.on_exit = vec![set("left", Expr::u8(1))];
    idle.transitions = vec![StateTransition {
        cond: bin(BinaryOp::Eq, Expr::var("go"), Expr::u8(1)),
        to: "run".to_string(),
        action: vec![set("acted", Expr::u8(1))],
    }];
    machine.states.push(idle);
    let mut run = MachineState::new("run");
    run.on_enter = vec![set("entered", Expr::u8(1))];
    machine.states.push(run);
    game.add_machine(machine);

    // Drive the machine from the scene, one update per frame.
    game.scenes.get_mut("main").unwrap().on_enter = vec![Stmt::Machine(MachineStmt::Start {
        machine: "ai".to_string(),
        state: "idle".to_string(),
    })];
    game.scenes.get_mut("main").unwrap().on_frame = vec![Stmt::Machine(MachineStmt::Update {
        machine: "ai".to_string(),
    })];
    game
}

// =============================================================================
// Two-cascade update: settle the change, then tick and check transitions
// =============================================================================

#[test]
fn test_transition_fires_in_declared_order() {
    let game = machine_game();
    let mut sim = Simulator::new(&game);

    // Frame 1: start is pending; the update enters idle and ticks it.
    sim.execute_frame().unwrap();
    assert_eq!(sim.var("entered").unwrap().raw, 0);
    assert_eq!(sim.var("acted").unwrap().raw, 0);

    // Condition met: the same update runs the action and latches next.
    sim.set_var("go", gbforge_core::ir::Value::u8(1)).unwrap();
    sim.execute_frame().unwrap();
    assert_eq!(sim.var("acted").unwrap().raw, 1);
    assert_eq!(sim.var("entered").unwrap().raw, 0);
    assert_eq!(sim.var("left").unwrap().raw, 0);

    // Next update settles the change: exit idle, enter run.
    sim.execute_frame().unwrap();
    assert_eq!(sim.var("left").unwrap().raw, 1);
    assert_eq!(sim.var("entered").unwrap().raw, 1);
}

#[test]
fn test_goto_unknown_state_is_error() {
    let game = machine_game();
    let mut sim = Simulator::new(&game);
    assert!(sim
        .execute_stmt(&Stmt::Machine(MachineStmt::Goto {
            machine: "ai".to_string(),
            state: "missing".to_string(),
        }))
        .is_err());
}
