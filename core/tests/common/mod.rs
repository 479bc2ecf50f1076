use gbforge_core::ir::ValueKind;
use gbforge_core::ir::{AssignOp, BinaryOp, Expr, Stmt};
use gbforge_core::model::{Animation, GameModel, Pool, Scene, Sprite, Variable};

/// Minimal game: one scene, no entities. Tests grow it as needed.
pub fn empty_game(start: &str) -> GameModel {
    let mut game = GameModel::new("testgame");
    game.start_scene = start.to_string();
    game.add_scene(Scene::new(start));
    game
}

pub fn u8_var(name: &str, initial: i64) -> Variable {
    Variable::new(name, ValueKind::U8, initial)
}

pub fn u16_var(name: &str, initial: i64) -> Variable {
    Variable::new(name, ValueKind::U16, initial)
}

/// `target <op>= value`
pub fn assign(target: &str, op: AssignOp, value: Expr) -> Stmt {
    Stmt::Assign {
        target: target.to_string(),
        op,
        value,
    }
}

pub fn add(target: &str, value: Expr) -> Stmt {
    assign(target, AssignOp::Add, value)
}

pub fn set(target: &str, value: Expr) -> Stmt {
    assign(target, AssignOp::Set, value)
}

pub fn bin(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::bin(op, lhs, rhs)
}

/// Sprite with one 3-frame looping "walk" and a 2-frame one-shot "idle".
pub fn animated_sprite(name: &str, asset: &str, oam: u8) -> Sprite {
    let mut sprite = Sprite::new(name, asset, oam);
    sprite
        .animations
        .insert("walk".to_string(), Animation::new(vec![0, 1, 2], 4, true));
    sprite
        .animations
        .insert("idle".to_string(), Animation::new(vec![3, 4], 6, false));
    sprite
}

/// Position+velocity pool with no hooks.
pub fn plain_pool(name: &str, size: u8, oam_start: u8) -> Pool {
    let mut pool = Pool::new(name, size, oam_start);
    pool.has_velocity = true;
    pool
}

/// A flat 4-tile asset with distinct, busy tiles.
pub fn test_tiles() -> Vec<u8> {
    let mut data = Vec::new();
    for t in 0..4u8 {
        for i in 0..16u8 {
            data.push(t.wrapping_mul(37).wrapping_add(i.wrapping_mul(11)) ^ 0x5A);
        }
    }
    data
}
