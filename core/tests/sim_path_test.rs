use gbforge_core::ir::{DomainExpr, Expr, Heuristic, PathStmt, Stmt};
use gbforge_core::model::NavGrid;
use gbforge_core::sim::Simulator;

mod common;
use common::{empty_game, u8_var};

fn grid_game() -> gbforge_core::model::GameModel {
    let mut game = empty_game("main");
    game.add_variable(u8_var("mx", 0));
    game.add_variable(u8_var("my", 0));
    game.nav_grids
        .insert("field".to_string(), NavGrid::open("field", 8, 8));
    game
}

fn find(path: &str, tx: u8, ty: u8) -> Stmt {
    Stmt::Path(PathStmt::Find {
        path: path.to_string(),
        grid: "field".to_string(),
        from_x: Expr::u8(0),
        from_y: Expr::u8(0),
        to_x: Expr::u8(tx),
        to_y: Expr::u8(ty),
        heuristic: Heuristic::Manhattan,
    })
}

// =============================================================================
// Find / found flag
// =============================================================================

#[test]
fn test_find_reports_success() {
    let game = grid_game();
    let mut sim = Simulator::new(&game);
    sim.execute_stmt(&find("walk", 5, 0)).unwrap();
    let found = Expr::Domain(DomainExpr::PathFound("walk".to_string()));
    assert_eq!(sim.eval(&found).unwrap().raw, 1);
}

#[test]
fn test_blocked_goal_reports_failure() {
    let game = grid_game();
    let mut sim = Simulator::new(&game);
    sim.execute_stmt(&Stmt::Path(PathStmt::GridSetTile {
        grid: "field".to_string(),
        x: Expr::u8(5),
        y: Expr::u8(0),
        walkable: false,
    }))
    .unwrap();
    sim.execute_stmt(&find("walk", 5, 0)).unwrap();
    let found = Expr::Domain(DomainExpr::PathFound("walk".to_string()));
    assert_eq!(sim.eval(&found).unwrap().raw, 0);
}

#[test]
fn test_grid_init_restores_authored_cells() {
    let game = grid_game();
    let mut sim = Simulator::new(&game);
    sim.execute_stmt(&Stmt::Path(PathStmt::GridSetTile {
        grid: "field".to_string(),
        x: Expr::u8(5),
        y: Expr::u8(0),
        walkable: false,
    }))
    .unwrap();
    sim.execute_stmt(&Stmt::Path(PathStmt::GridInit {
        grid: "field".to_string(),
    }))
    .unwrap();
    sim.execute_stmt(&find("walk", 5, 0)).unwrap();
    let found = Expr::Domain(DomainExpr::PathFound("walk".to_string()));
    assert_eq!(sim.eval(&found).unwrap().raw, 1);
}

// =============================================================================
// Follow: one pixel per frame, advance within 4 pixels
// =============================================================================

#[test]
fn test_follow_walks_toward_waypoints() {
    let game = grid_game();
    let mut sim = Simulator::new(&game);
    sim.execute_stmt(&find("walk", 2, 0)).unwrap();
    let follow = Stmt::Path(PathStmt::Follow {
        path: "walk".to_string(),
        x_var: "mx".to_string(),
        y_var: "my".to_string(),
    });
    // Waypoints are (1,0) then (2,0): pixel targets 8 then 16.
    for _ in 0..30 {
        sim.execute_stmt(&follow).unwrap();
    }
    let x = sim.var("mx").unwrap().raw;
    assert!(x >= 13, "follower stalled at x={x}");
    assert_eq!(sim.var("my").unwrap().raw, 0);
}

#[test]
fn test_weighted_cells_change_route() {
    let game = grid_game();
    let mut sim = Simulator::new(&game);
    // Make the straight corridor expensive; the route around stays cheap.
    for x in 1..7u8 {
        sim.execute_stmt(&Stmt::Path(PathStmt::GridSetWeight {
            grid: "field".to_string(),
            x: Expr::u8(x),
            y: Expr::u8(0),
            weight: Expr::u8(50),
        }))
        .unwrap();
    }
    sim.execute_stmt(&find("walk", 7, 0)).unwrap();
    let found = Expr::Domain(DomainExpr::PathFound("walk".to_string()));
    assert_eq!(sim.eval(&found).unwrap().raw, 1);
}

#[test]
fn test_reset_clears_found_flag() {
    let game = grid_game();
    let mut sim = Simulator::new(&game);
    sim.execute_stmt(&find("walk", 3, 3)).unwrap();
    sim.execute_stmt(&Stmt::Path(PathStmt::Reset {
        path: "walk".to_string(),
    }))
    .unwrap();
    let found = Expr::Domain(DomainExpr::PathFound("walk".to_string()));
    assert_eq!(sim.eval(&found).unwrap().raw, 0);
}
