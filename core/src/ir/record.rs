//! Task-local recording runtime.
//!
//! DSL builder calls are ordinary imperative calls that side-effect the
//! innermost recorder: `player.x += 2` becomes an `emit` of an assign
//! statement. The two-level state (current game scope, recorder stack) is
//! thread-local; one build never crosses threads and nothing here
//! suspends, so builds of different games may run on parallel threads
//! without sharing anything.

use std::cell::RefCell;

use crate::error::BuildError;

use super::stmt::Stmt;

/// Transient container for statements emitted within its dynamic extent.
/// Its statement list is moved into the game model when the builder closes.
#[derive(Debug, Default)]
pub struct Recorder {
    pub statements: Vec<Stmt>,
}

thread_local! {
    static SCOPES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    static RECORDERS: RefCell<Vec<Recorder>> = const { RefCell::new(Vec::new()) };
}

/// Install `scope` as the current game scope for the extent of `f`.
/// Nesting is permitted; each level restores on exit, unwinding included.
pub fn with_scope<T>(scope: impl Into<String>, f: impl FnOnce() -> T) -> T {
    struct Restore;
    impl Drop for Restore {
        fn drop(&mut self) {
            SCOPES.with(|s| {
                s.borrow_mut().pop();
            });
        }
    }

    SCOPES.with(|s| s.borrow_mut().push(scope.into()));
    let _restore = Restore;
    f()
}

/// Name of the innermost open game scope, if any.
pub fn current_scope() -> Option<String> {
    SCOPES.with(|s| s.borrow().last().cloned())
}

/// Push a fresh recorder, run `f`, pop, and return what it captured.
/// Reentrant: statements emitted inside a nested `record` land in the
/// inner list only.
pub fn record(f: impl FnOnce()) -> Vec<Stmt> {
    struct PopOnPanic;
    impl Drop for PopOnPanic {
        fn drop(&mut self) {
            if std::thread::panicking() {
                RECORDERS.with(|r| {
                    r.borrow_mut().pop();
                });
            }
        }
    }

    RECORDERS.with(|r| r.borrow_mut().push(Recorder::default()));
    let _guard = PopOnPanic;
    f();
    RECORDERS.with(|r| r.borrow_mut().pop())
        .map(|rec| rec.statements)
        .unwrap_or_default()
}

/// Append `stmt` to the innermost recorder.
pub fn emit(stmt: Stmt) -> Result<(), BuildError> {
    RECORDERS.with(|r| match r.borrow_mut().last_mut() {
        Some(rec) => {
            rec.statements.push(stmt);
            Ok(())
        }
        None => Err(BuildError::RecorderMissing),
    })
}

/// Fail unless a recorder is open.
pub fn require() -> Result<(), BuildError> {
    RECORDERS.with(|r| {
        if r.borrow().is_empty() {
            Err(BuildError::RecorderMissing)
        } else {
            Ok(())
        }
    })
}

/// Current recorder nesting depth.
pub fn depth() -> usize {
    RECORDERS.with(|r| r.borrow().len())
}
