//! State machine lowering.
//!
//! Each machine updates in two cascades: the first settles a pending
//! state change (exit old, copy next into state, enter new, auto-play the
//! bound animation), the second runs the current state's tick and checks
//! its outgoing transitions in declared order.

use crate::error::BuildError;
use crate::ir::{AnimStmt, AnimTarget, MachineStmt, Stmt};
use crate::model::StateMachine;

use super::{state_const, Generator};

impl Generator<'_> {
    /// Category handler for state machine statements.
    pub(crate) fn machine_stmt(&mut self, stmt: &Stmt) -> Result<bool, BuildError> {
        let Stmt::Machine(m) = stmt else {
            return Ok(false);
        };
        match m {
            MachineStmt::Start { machine, state } | MachineStmt::Goto { machine, state } => {
                let Some(def) = self.game.machines.get(machine) else {
                    self.verror("machine", format!("unknown state machine {machine:?}"));
                    return Ok(true);
                };
                if def.state_index(state).is_none() {
                    self.verror(
                        "machine",
                        format!("unknown state {state:?} in machine {machine:?}"),
                    );
                    return Ok(true);
                }
                self.out
                    .line(format!("_{machine}_next = {};", state_const(machine, state)));
                self.out.line(format!("_{machine}_changed = 1;"));
            }
            MachineStmt::Update { machine } => {
                if self.game.machines.contains_key(machine) {
                    self.out.line(format!("update_machine_{machine}();"));
                } else {
                    self.verror("machine", format!("unknown state machine {machine:?}"));
                }
            }
        }
        Ok(true)
    }

    pub(crate) fn gen_machine_helpers(&mut self) -> Result<(), BuildError> {
        let machines: Vec<StateMachine> = self.game.machines.values().cloned().collect();
        for machine in &machines {
            self.gen_machine_updater(machine)?;
        }
        Ok(())
    }

    fn gen_machine_updater(&mut self, machine: &StateMachine) -> Result<(), BuildError> {
        let m = machine.name.clone();
        self.begin_fn(&format!("void update_machine_{m}(void)"));

        self.out.open(format!("if (_{m}_changed)"));
        self.out.open(format!("switch (_{m}_state)"));
        for state in &machine.states {
            if state.on_exit.is_empty() {
                continue;
            }
            self.out.open(format!("case {}:", state_const(&m, &state.name)));
            self.stmts(&state.on_exit)?;
            self.out.line("break;");
            self.out.close();
        }
        self.out.close();
        self.out.line(format!("_{m}_state = _{m}_next;"));
        self.out.open(format!("switch (_{m}_state)"));
        for state in &machine.states {
            if state.on_enter.is_empty() && state.animation.is_none() {
                continue;
            }
            self.out.open(format!("case {}:", state_const(&m, &state.name)));
            self.stmts(&state.on_enter)?;
            if let Some(bound) = &state.animation {
                self.stmt(&Stmt::Anim(AnimStmt::Play {
                    target: AnimTarget::Sprite(bound.sprite.clone()),
                    anim: bound.anim.clone(),
                }))?;
            }
            self.out.line("break;");
            self.out.close();
        }
        self.out.close();
        self.out.line(format!("_{m}_changed = 0;"));
        self.out.close();

        self.out.open(format!("switch (_{m}_state)"));
        for state in &machine.states {
            if state.on_tick.is_empty() && state.transitions.is_empty() {
                continue;
            }
            self.out.open(format!("case {}:", state_const(&m, &state.name)));
            self.stmts(&state.on_tick)?;
            // Transitions may be gated until the bound animation finishes.
            let gate = state
                .animation
                .as_ref()
                .filter(|b| b.lock_until_complete)
                .map(|b| b.sprite.clone());
            if !state.transitions.is_empty() {
                if let Some(sprite) = &gate {
                    self.out.open(format!("if (_{sprite}_anim == ANIM_NONE)"));
                }
                for transition in &state.transitions {
                    if machine.state_index(&transition.to).is_none() {
                        self.verror(
                            "machine",
                            format!(
                                "unknown state {:?} in machine {m:?} transition",
                                transition.to
                            ),
                        );
                        continue;
                    }
                    let cond = self.expr(&transition.cond);
                    self.out.open(format!("if ({cond})"));
                    self.stmts(&transition.action)?;
                    self.out
                        .line(format!("_{m}_next = {};", state_const(&m, &transition.to)));
                    self.out.line(format!("_{m}_changed = 1;"));
                    self.out.line("break;");
                    self.out.close();
                }
                if gate.is_some() {
                    self.out.close();
                }
            }
            self.out.line("break;");
            self.out.close();
        }
        self.out.close();
        self.end_fn();
        Ok(())
    }

    /// State constants and per-machine runtime variables.
    pub(crate) fn emit_machine_data(&mut self) {
        let machines: Vec<StateMachine> = self.game.machines.values().cloned().collect();
        for machine in &machines {
            let m = &machine.name;
            for (idx, state) in machine.states.iter().enumerate() {
                self.out
                    .line(format!("#define {} {idx}", state_const(m, &state.name)));
            }
            self.out.line(format!("UINT8 _{m}_state = 255;"));
            self.out.line(format!("UINT8 _{m}_next = 255;"));
            self.out.line(format!("UINT8 _{m}_changed = 0;"));
            self.out.blank();
        }
    }
}
