use gbforge_core::ir::{DialogStmt, DomainExpr, Expr, MenuStmt, Stmt};
use gbforge_core::model::{Dialog, Menu, MenuItem};
use gbforge_core::sim::Simulator;

mod common;
use common::{empty_game, set, u8_var};

fn dialog_game() -> gbforge_core::model::GameModel {
    let mut game = empty_game("main");
    game.add_variable(u8_var("picked", 9));
    let mut dialog = Dialog::new("talk", 0, 12, 18, 4);
    dialog.delay = 1;
    game.dialogs.insert("talk".to_string(), dialog);
    game
}

fn menu_game() -> gbforge_core::model::GameModel {
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
    menu.on_cancel = vec![set("chosen", Expr::u8(99))];
    game.menus.insert("pause".to_string(), menu);
    game
}

// =============================================================================
// Dialog typewriter
// =============================================================================

#[test]
fn test_say_activates_and_types() {
    let game = dialog_game();
    let mut sim = Simulator::new(&game);
    sim.execute_stmt(&Stmt::Dialog(DialogStmt::Say {
        dialog: "talk".to_string(),
        text: "HI".to_string(),
    }))
    .unwrap();
    let active = Expr::Domain(DomainExpr::DialogActive("talk".to_string()));
    assert_eq!(sim.eval(&active).unwrap().raw, 1);

    let tick = Stmt::Dialog(DialogStmt::Tick {
        dialog: "talk".to_string(),
    });
    // delay 1: a character lands every other tick.
    for _ in 0..4 {
        sim.execute_stmt(&tick).unwrap();
    }
    sim.execute_stmt(&Stmt::Dialog(DialogStmt::Hide {
        dialog: "talk".to_string(),
    }))
    .unwrap();
    assert_eq!(sim.eval(&active).unwrap().raw, 0);
}

#[test]
fn test_choice_writes_result_on_confirm() {
    let game = dialog_game();
    let mut sim = Simulator::new(&game);
    sim.execute_stmt(&Stmt::Dialog(DialogStmt::Choice {
        dialog: "talk".to_string(),
        options: vec!["YES".to_string(), "NO".to_string()],
        result: "picked".to_string(),
    }))
    .unwrap();

    // Move down, then confirm with A.
    sim.set_joypad(0x08);
    sim.execute_frame().unwrap();
    sim.execute_stmt(&Stmt::Dialog(DialogStmt::Tick {
        dialog: "talk".to_string(),
    }))
    .unwrap();
    sim.set_joypad(0x10);
    sim.execute_frame().unwrap();
    sim.execute_stmt(&Stmt::Dialog(DialogStmt::Tick {
        dialog: "talk".to_string(),
    }))
    .unwrap();
    assert_eq!(sim.var("picked").unwrap().raw, 1);
    let active = Expr::Domain(DomainExpr::DialogActive("talk".to_string()));
    assert_eq!(sim.eval(&active).unwrap().raw, 0);
}

// =============================================================================
// Menu navigation
// =============================================================================

#[test]
fn test_menu_cursor_and_select() {
    let game = menu_game();
    let mut sim = Simulator::new(&game);
    sim.execute_stmt(&Stmt::Menu(MenuStmt::Open {
        menu: "pause".to_string(),
    }))
    .unwrap();
    let cursor = Expr::Domain(DomainExpr::MenuCursor("pause".to_string()));
    assert_eq!(sim.eval(&cursor).unwrap().raw, 0);

    sim.set_joypad(0x08);
    sim.execute_frame().unwrap();
    sim.execute_stmt(&Stmt::Menu(MenuStmt::Tick {
        menu: "pause".to_string(),
    }))
    .unwrap();
    assert_eq!(sim.eval(&cursor).unwrap().raw, 1);

    sim.execute_stmt(&Stmt::Menu(MenuStmt::Select {
        menu: "pause".to_string(),
    }))
    .unwrap();
    assert_eq!(sim.var("chosen").unwrap().raw, 2);
}

#[test]
fn test_menu_cancel_runs_hook() {
    let game = menu_game();
    let mut sim = Simulator::new(&game);
    sim.execute_stmt(&Stmt::Menu(MenuStmt::Open {
        menu: "pause".to_string(),
    }))
    .unwrap();
    sim.execute_stmt(&Stmt::Menu(MenuStmt::Cancel {
        menu: "pause".to_string(),
    }))
    .unwrap();
    assert_eq!(sim.var("chosen").unwrap().raw, 99);
}

#[test]
fn test_move_to_clamps_to_item_count() {
    let game = menu_game();
    let mut sim = Simulator::new(&game);
    sim.execute_stmt(&Stmt::Menu(MenuStmt::MoveTo {
        menu: "pause".to_string(),
        index: Expr::u8(5),
    }))
    .unwrap();
    let cursor = Expr::Domain(DomainExpr::MenuCursor("pause".to_string()));
    assert_eq!(sim.eval(&cursor).unwrap().raw, 1);
}
