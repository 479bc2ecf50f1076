//! Skyward Salvo: a small, complete shooter definition.
//!
//! Two scenes (title, level), a player ship with animations, a bullet
//! pool, a two-group mixer, a buffered fire button, a title tween, and a
//! fade transition between scenes. Every per-frame behavior is recorded
//! through the recording runtime, exactly as a DSL front end would emit
//! it.

use gbforge_core::ir::{
    emit, record, with_scope, AssignOp, BinaryOp, Button, Channel, DomainExpr, Easing, Expr,
    InputStmt, PoolStmt, SoundStmt, Stmt, TransitionStep, TransitionStmt, TweenStmt, ValueKind,
};
use gbforge_core::model::{
    Animation, AudioMixer, GameModel, InputBuffer, MixerGroup, OwnedPosition, Pool, Scene,
    SoundEffect, Sprite, TileAsset, Variable,
};

/// Screen row above which bullets leave play.
const BULLET_EXIT_Y: u8 = 16;

pub fn skyward_salvo() -> GameModel {
    with_scope("skyward_salvo", build)
}

fn build() -> GameModel {
    let mut game = GameModel::new("skyward_salvo");
    game.start_scene = "title".to_string();

    game.add_variable(Variable::new("score", ValueKind::U16, 0));
    game.add_variable(Variable::new("title_y", ValueKind::U8, 144));

    game.tile_assets
        .insert("ship".to_string(), TileAsset::new("ship", ship_tiles()));
    game.tile_assets
        .insert("bolt".to_string(), TileAsset::new("bolt", bolt_tiles()));

    let mut ship = Sprite::new("ship", "ship", 0);
    ship.position = Some(OwnedPosition {
        x_var: "ship_x".to_string(),
        y_var: "ship_y".to_string(),
        x: 80,
        y: 120,
    });
    ship.animations
        .insert("cruise".to_string(), Animation::new(vec![0, 1], 8, true));
    ship.animations
        .insert("bank".to_string(), Animation::new(vec![2, 3], 6, false));
    game.add_sprite(ship);

    game.add_pool(bullet_pool());

    let mut mixer = AudioMixer::default();
    mixer.groups.insert(
        "music".to_string(),
        MixerGroup {
            id: 0,
            volume: 70,
            muted: false,
            priority: 0,
            channels: vec![Channel::Pulse2, Channel::Wave],
        },
    );
    mixer.groups.insert(
        "sfx".to_string(),
        MixerGroup {
            id: 1,
            volume: 100,
            muted: false,
            priority: 4,
            channels: vec![Channel::Pulse1],
        },
    );
    game.mixer = Some(mixer);

    let mut laser = SoundEffect::new("laser", Channel::Pulse1);
    laser.priority = 6;
    laser.frequency = 0x700;
    laser.volume = 12;
    laser.fade = 2;
    game.sounds.insert("laser".to_string(), laser);

    game.input_buffers.insert(
        "fire".to_string(),
        InputBuffer {
            name: "fire".to_string(),
            button: Button::A,
            window: 6,
        },
    );

    game.add_scene(title_scene());
    game.add_scene(level_scene());
    game
}

fn bullet_pool() -> Pool {
    let mut pool = Pool::new("bullets", 4, 1);
    pool.has_velocity = true;
    pool.sprite = Some("bolt".to_string());
    // Newly spawned bullets travel straight up.
    pool.on_spawn = record(|| {
        emit(Stmt::ArrayAssign {
            array: "bullets_vel_y".to_string(),
            index: Expr::var("_bullets_i"),
            value: Expr::i8(-2),
        })
        .unwrap();
    });
    pool.despawn_when = vec![Expr::bin(
        BinaryOp::Lt,
        Expr::index("bullets_y", Expr::var("_bullets_i")),
        Expr::u8(BULLET_EXIT_Y),
    )];
    pool
}

fn title_scene() -> Scene {
    let mut scene = Scene::new("title");
    scene.on_enter = record(|| {
        emit(Stmt::Tween(TweenStmt::Start {
            var: "title_y".to_string(),
            from: None,
            to: Expr::u8(60),
            frames: 30,
            easing: Easing::EaseOutQuad,
        }))
        .unwrap();
    });
    let start_pressed = Expr::Domain(DomainExpr::JustPressed(Button::Start));
    let begin = record(|| {
        emit(Stmt::Transition(TransitionStmt::Start {
            step: TransitionStep::FadeOut(10),
            to_scene: Some("level".to_string()),
            on_complete: None,
        }))
        .unwrap();
    });
    scene.on_frame = record(|| {
        emit(Stmt::If {
            cond: start_pressed,
            then: begin,
            otherwise: vec![],
        })
        .unwrap();
    });
    scene
}

fn level_scene() -> Scene {
    let mut scene = Scene::new("level");
    scene.on_enter = record(|| {
        emit(Stmt::Anim(gbforge_core::ir::AnimStmt::Play {
            target: gbforge_core::ir::AnimTarget::Sprite("ship".to_string()),
            anim: "cruise".to_string(),
        }))
        .unwrap();
    });

    let move_left = record(|| {
        emit(Stmt::Assign {
            target: "ship_x".to_string(),
            op: AssignOp::Sub,
            value: Expr::u8(1),
        })
        .unwrap();
    });
    let move_right = record(|| {
        emit(Stmt::Assign {
            target: "ship_x".to_string(),
            op: AssignOp::Add,
            value: Expr::u8(1),
        })
        .unwrap();
    });
    let fire = record(|| {
        emit(Stmt::Pool(PoolStmt::SpawnAt {
            pool: "bullets".to_string(),
            x: Expr::var("ship_x"),
            y: Expr::var("ship_y"),
        }))
        .unwrap();
        emit(Stmt::Sound(SoundStmt::Play {
            effect: "laser".to_string(),
        }))
        .unwrap();
        emit(Stmt::Input(InputStmt::Reset {
            buffer: "fire".to_string(),
        }))
        .unwrap();
        emit(Stmt::Assign {
            target: "score".to_string(),
            op: AssignOp::Add,
            value: Expr::u16(1),
        })
        .unwrap();
    });

    scene.on_frame = record(|| {
        emit(Stmt::If {
            cond: Expr::Domain(DomainExpr::Pressed(Button::Left)),
            then: move_left,
            otherwise: vec![],
        })
        .unwrap();
        emit(Stmt::If {
            cond: Expr::Domain(DomainExpr::Pressed(Button::Right)),
            then: move_right,
            otherwise: vec![],
        })
        .unwrap();
        emit(Stmt::If {
            cond: Expr::bin(
                BinaryOp::LAnd,
                Expr::Domain(DomainExpr::InputBuffered("fire".to_string())),
                Expr::bin(
                    BinaryOp::Lt,
                    Expr::Domain(DomainExpr::PoolCount("bullets".to_string())),
                    Expr::u8(4),
                ),
            ),
            then: fire,
            otherwise: vec![],
        })
        .unwrap();
        emit(Stmt::Pool(PoolStmt::Update {
            pool: "bullets".to_string(),
        }))
        .unwrap();
    });
    scene
}

/// Four 8x8 ship frames: a filled hull with a per-frame exhaust stripe.
fn ship_tiles() -> Vec<u8> {
    let mut data = Vec::new();
    for frame in 0..4u8 {
        for row in 0..8u8 {
            let lo: u8 = match row {
                0 | 7 => 0x18,
                1 | 6 => 0x3C,
                _ => 0x7E,
            };
            let hi = if row == 7 { 0x18 >> frame.min(3) } else { lo >> 1 };
            data.push(lo);
            data.push(hi);
        }
    }
    data
}

/// Two bolt frames: a thin vertical streak, then a brighter one.
fn bolt_tiles() -> Vec<u8> {
    let mut data = Vec::new();
    for frame in 0..2u8 {
        for _row in 0..8u8 {
            data.push(0x18);
            data.push(if frame == 0 { 0x00 } else { 0x18 });
        }
    }
    data
}
