use gbforge_core::error::BuildError;
use gbforge_core::ir::{
    current_scope, depth, emit, record, require, with_scope, AssignOp, Expr, Stmt,
};

fn assign(target: &str) -> Stmt {
    Stmt::Assign {
        target: target.to_string(),
        op: AssignOp::Set,
        value: Expr::u8(1),
    }
}

// =============================================================================
// Recording
// =============================================================================

#[test]
fn test_record_preserves_count_and_order() {
    let stmts = record(|| {
        emit(assign("a")).unwrap();
        emit(assign("b")).unwrap();
        emit(assign("c")).unwrap();
    });
    assert_eq!(stmts.len(), 3);
    let targets: Vec<&str> = stmts
        .iter()
        .map(|s| match s {
            Stmt::Assign { target, .. } => target.as_str(),
            _ => panic!("unexpected statement"),
        })
        .collect();
    assert_eq!(targets, ["a", "b", "c"]);
}

#[test]
fn test_record_is_reentrant() {
    let mut inner_stmts = Vec::new();
    let outer = record(|| {
        emit(assign("outer1")).unwrap();
        inner_stmts = record(|| {
            emit(assign("inner1")).unwrap();
            emit(assign("inner2")).unwrap();
        });
        emit(assign("outer2")).unwrap();
    });
    assert_eq!(inner_stmts.len(), 2);
    assert_eq!(outer.len(), 2);
    let outer_targets: Vec<&str> = outer
        .iter()
        .map(|s| match s {
            Stmt::Assign { target, .. } => target.as_str(),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(outer_targets, ["outer1", "outer2"]);
}

#[test]
fn test_emit_without_recorder_fails() {
    let err = emit(assign("orphan")).unwrap_err();
    assert!(matches!(err, BuildError::RecorderMissing));
}

#[test]
fn test_require_reports_missing_recorder() {
    assert!(require().is_err());
    record(|| {
        assert!(require().is_ok());
    });
    assert!(require().is_err());
}

#[test]
fn test_depth_tracks_nesting() {
    assert_eq!(depth(), 0);
    record(|| {
        assert_eq!(depth(), 1);
        record(|| {
            assert_eq!(depth(), 2);
        });
        assert_eq!(depth(), 1);
    });
    assert_eq!(depth(), 0);
}

// =============================================================================
// Game scopes
// =============================================================================

#[test]
fn test_with_scope_installs_and_restores() {
    assert_eq!(current_scope(), None);
    with_scope("alpha", || {
        assert_eq!(current_scope().as_deref(), Some("alpha"));
        with_scope("beta", || {
            assert_eq!(current_scope().as_deref(), Some("beta"));
        });
        assert_eq!(current_scope().as_deref(), Some("alpha"));
    });
    assert_eq!(current_scope(), None);
}

#[test]
fn test_scope_restored_after_panic() {
    let result = std::panic::catch_unwind(|| {
        with_scope("doomed", || {
            panic!("builder failed");
        })
    });
    assert!(result.is_err());
    assert_eq!(current_scope(), None);
}

#[test]
fn test_recorder_popped_after_panic() {
    let result = std::panic::catch_unwind(|| {
        record(|| {
            panic!("builder failed");
        })
    });
    assert!(result.is_err());
    assert_eq!(depth(), 0);
}
