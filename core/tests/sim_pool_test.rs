use gbforge_core::ir::{BinaryOp, Expr, PoolStmt, Stmt};
use gbforge_core::sim::Simulator;

mod common;
use common::{bin, empty_game, u16_var};

// =============================================================================
// Scenario: spawn/iterate/despawn ordering on a fixed-capacity pool
// =============================================================================

fn pool_game() -> gbforge_core::model::GameModel {
    let mut game = empty_game("main");
    game.add_variable(u16_var("trace", 0));
    game.add_variable(u16_var("despawn_trace", 0));
    let mut pool = common::plain_pool("b", 4, 0);
    // Record visit order: trace = trace * 10 + slot.
    pool.on_despawn = vec![common::set(
        "despawn_trace",
        bin(
            BinaryOp::Add,
            bin(BinaryOp::Mul, Expr::var("despawn_trace"), Expr::u16(10)),
            Expr::var("_b_i"),
        ),
    )];
    game.add_pool(pool);
    game
}

fn spawn_at(x: u8) -> Stmt {
    Stmt::Pool(PoolStmt::SpawnAt {
        pool: "b".to_string(),
        x: Expr::u8(x),
        y: Expr::u8(0),
    })
}

#[test]
fn test_spawn_fills_slots_in_order() {
    let game = pool_game();
    let mut sim = Simulator::new(&game);
    for x in [4, 20, 30, 5] {
        sim.execute_stmt(&spawn_at(x)).unwrap();
    }
    assert_eq!(sim.pool_count("b").unwrap(), 4);
    let xs: Vec<i64> = sim.array("b_x").unwrap().iter().map(|v| v.raw).collect();
    assert_eq!(xs, [4, 20, 30, 5]);
}

#[test]
fn test_for_each_visits_front_to_back() {
    let game = pool_game();
    let mut sim = Simulator::new(&game);
    for x in [4, 20, 30, 5] {
        sim.execute_stmt(&spawn_at(x)).unwrap();
    }
    sim.execute_stmt(&Stmt::Pool(PoolStmt::ForEach {
        pool: "b".to_string(),
        body: vec![common::set(
            "trace",
            bin(
                BinaryOp::Add,
                bin(BinaryOp::Mul, Expr::var("trace"), Expr::u16(10)),
                Expr::var("_b_i"),
            ),
        )],
    }))
    .unwrap();
    // Slots 0, 1, 2, 3 in order.
    assert_eq!(sim.var("trace").unwrap().raw, 123);
}

#[test]
fn test_despawn_where_visits_back_to_front() {
    let game = pool_game();
    let mut sim = Simulator::new(&game);
    for x in [4, 20, 30, 5] {
        sim.execute_stmt(&spawn_at(x)).unwrap();
    }
    // Matches slots 1 (x=20) and 2 (x=30); visiting back-to-front, slot 2
    // despawns before slot 1 and slot 3's visit is unaffected.
    sim.execute_stmt(&Stmt::Pool(PoolStmt::DespawnWhere {
        pool: "b".to_string(),
        cond: bin(
            BinaryOp::Gt,
            Expr::index("b_x", Expr::var("_b_i")),
            Expr::u8(10),
        ),
    }))
    .unwrap();
    assert_eq!(sim.var("despawn_trace").unwrap().raw, 21);
    assert_eq!(sim.pool_count("b").unwrap(), 2);
    let active: Vec<i64> = sim
        .array("b_active")
        .unwrap()
        .iter()
        .map(|v| v.raw)
        .collect();
    assert_eq!(active, [1, 0, 0, 1]);
}

#[test]
fn test_spawn_reuses_freed_slot() {
    let game = pool_game();
    let mut sim = Simulator::new(&game);
    for x in [1, 2, 3, 4] {
        sim.execute_stmt(&spawn_at(x)).unwrap();
    }
    sim.execute_stmt(&Stmt::Pool(PoolStmt::DespawnWhere {
        pool: "b".to_string(),
        cond: bin(
            BinaryOp::Eq,
            Expr::index("b_x", Expr::var("_b_i")),
            Expr::u8(2),
        ),
    }))
    .unwrap();
    assert_eq!(sim.pool_count("b").unwrap(), 3);
    sim.execute_stmt(&spawn_at(99)).unwrap();
    let xs: Vec<i64> = sim.array("b_x").unwrap().iter().map(|v| v.raw).collect();
    assert_eq!(xs, [1, 99, 3, 4]);
}

#[test]
fn test_try_spawn_reports_exhaustion() {
    let mut game = pool_game();
    game.add_variable(common::u8_var("ok", 0));
    let mut sim = Simulator::new(&game);
    for _ in 0..4 {
        sim.execute_stmt(&Stmt::Pool(PoolStmt::TrySpawn {
            pool: "b".to_string(),
            flag: "ok".to_string(),
        }))
        .unwrap();
        assert_eq!(sim.var("ok").unwrap().raw, 1);
    }
    sim.execute_stmt(&Stmt::Pool(PoolStmt::TrySpawn {
        pool: "b".to_string(),
        flag: "ok".to_string(),
    }))
    .unwrap();
    assert_eq!(sim.var("ok").unwrap().raw, 0);
    assert_eq!(sim.pool_count("b").unwrap(), 4);
}

#[test]
fn test_despawn_all_clears_pool() {
    let game = pool_game();
    let mut sim = Simulator::new(&game);
    for x in [1, 2, 3] {
        sim.execute_stmt(&spawn_at(x)).unwrap();
    }
    sim.execute_stmt(&Stmt::Pool(PoolStmt::DespawnAll {
        pool: "b".to_string(),
    }))
    .unwrap();
    assert_eq!(sim.pool_count("b").unwrap(), 0);
    // Hooks ran front-to-back: 0, 1, 2.
    assert_eq!(sim.var("despawn_trace").unwrap().raw, 12);
}
