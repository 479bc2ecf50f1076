use gbforge_core::codegen::{compile, encode_sequence};
use gbforge_core::ir::{Stmt, TransitionNode, TransitionStep, TransitionStmt};

mod common;
use common::empty_game;

use TransitionNode::{Parallel, Sequence, Step};

// =============================================================================
// Byte stream encoding
// =============================================================================

#[test]
fn test_sequence_encoding_matches_contract() {
    let node = Sequence(vec![
        Step(TransitionStep::FadeOut(20)),
        Step(TransitionStep::Wait(10)),
        Step(TransitionStep::FadeIn(20)),
    ]);
    assert_eq!(encode_sequence(&node), vec![3, 1, 20, 10, 10, 2, 20, 0]);
}

#[test]
fn test_nested_sequences_flatten() {
    let node = Sequence(vec![
        Step(TransitionStep::FadeOut(5)),
        Sequence(vec![
            Step(TransitionStep::Wait(1)),
            Step(TransitionStep::Wait(2)),
        ]),
    ]);
    assert_eq!(encode_sequence(&node), vec![3, 1, 5, 10, 1, 10, 2, 0]);
}

#[test]
fn test_flash_and_shake_carry_extra_bytes() {
    let node = Sequence(vec![
        Step(TransitionStep::Flash {
            color: 0x7FFF,
            frames: 4,
        }),
        Step(TransitionStep::Shake {
            intensity: 3,
            decay: 1,
            frames: 30,
        }),
    ]);
    assert_eq!(
        encode_sequence(&node),
        vec![2, 3, 4, 0xFF, 0x7F, 11, 30, 3, 1, 0]
    );
}

#[test]
fn test_parallel_encodes_flat_records() {
    let node = Parallel(vec![
        Step(TransitionStep::FadeOut(8)),
        Step(TransitionStep::Shake {
            intensity: 2,
            decay: 0,
            frames: 8,
        }),
    ]);
    assert_eq!(encode_sequence(&node), vec![1, 13, 2, 1, 8, 11, 8, 2, 0, 0]);
}

#[test]
fn test_nested_sequence_inside_parallel_is_noop() {
    let node = Parallel(vec![
        Step(TransitionStep::FadeOut(8)),
        Sequence(vec![Step(TransitionStep::Wait(5))]),
    ]);
    assert_eq!(encode_sequence(&node), vec![1, 13, 2, 1, 8, 0, 0, 0]);
}

// =============================================================================
// Emission
// =============================================================================

#[test]
fn test_composed_transition_bakes_stream() {
    let mut game = empty_game("main");
    game.scenes.get_mut("main").unwrap().on_enter = vec![Stmt::Transition(
        TransitionStmt::Composed {
            node: Sequence(vec![
                Step(TransitionStep::FadeOut(20)),
                Step(TransitionStep::Wait(10)),
                Step(TransitionStep::FadeIn(20)),
            ]),
            to_scene: None,
        },
    )];
    let out = compile(&game).unwrap().source;
    assert!(out.contains("const UINT8 _trans_seq_0[] = {3, 1, 20, 10, 10, 2, 20, 0};"));
    assert!(out.contains("_trans_seq_id = 0;"));
    assert!(out.contains("_trans_seq_active = 1;"));
    assert!(out.contains("void update_trans_sequence(void)"));
}

#[test]
fn test_equal_sequences_share_one_id() {
    let node = Sequence(vec![
        Step(TransitionStep::FadeOut(20)),
        Step(TransitionStep::FadeIn(20)),
    ]);
    let mut game = empty_game("main");
    game.scenes.get_mut("main").unwrap().on_enter = vec![Stmt::Transition(
        TransitionStmt::Composed {
            node: node.clone(),
            to_scene: None,
        },
    )];
    game.scenes.get_mut("main").unwrap().on_frame = vec![Stmt::Transition(
        TransitionStmt::Composed {
            node,
            to_scene: None,
        },
    )];
    let out = compile(&game).unwrap().source;
    assert!(out.contains("_trans_seq_0"));
    assert!(!out.contains("_trans_seq_1"));
}

#[test]
fn test_step_constants_emitted() {
    let out = compile(&empty_game("main")).unwrap().source;
    for (name, value) in [
        ("TSTEP_END", 0),
        ("TSTEP_FADE_OUT", 1),
        ("TSTEP_FADE_IN", 2),
        ("TSTEP_FLASH", 3),
        ("TSTEP_WIPE_L", 4),
        ("TSTEP_WIPE_R", 5),
        ("TSTEP_WIPE_U", 6),
        ("TSTEP_WIPE_D", 7),
        ("TSTEP_IRIS_OUT", 8),
        ("TSTEP_IRIS_IN", 9),
        ("TSTEP_WAIT", 10),
        ("TSTEP_SHAKE", 11),
        ("TSTEP_CALLBACK", 12),
        ("TSTEP_PARALLEL", 13),
    ] {
        assert!(
            out.contains(&format!("#define {name} {value}")),
            "missing {name}"
        );
    }
}

#[test]
fn test_equal_callbacks_are_deduplicated() {
    let body = vec![Stmt::Assign {
        target: "score".to_string(),
        op: gbforge_core::ir::AssignOp::Set,
        value: gbforge_core::ir::Expr::u8(1),
    }];
    let mut game = empty_game("main");
    game.add_variable(common::u8_var("score", 0));
    game.scenes.get_mut("main").unwrap().on_enter = vec![
        Stmt::Transition(TransitionStmt::Start {
            step: TransitionStep::FadeOut(10),
            to_scene: None,
            on_complete: Some(body.clone()),
        }),
        Stmt::Transition(TransitionStmt::Start {
            step: TransitionStep::FadeIn(10),
            to_scene: None,
            on_complete: Some(body),
        }),
    ];
    let out = compile(&game).unwrap().source;
    assert!(out.contains("void _trans_cb_0(void)"));
    assert!(!out.contains("void _trans_cb_1(void)"));
    assert!(out.contains("_transition_callback = 0;"));
}
