//! Pool lowering: spawn/despawn lifecycle, iteration, and the per-frame
//! update with its back-to-front despawn pass.

use crate::error::BuildError;
use crate::ir::{PoolStmt, Stmt};
use crate::model::Pool;

use super::{upper, Generator};

impl Generator<'_> {
    /// Category handler for pool statements.
    pub(crate) fn pool_stmt(&mut self, stmt: &Stmt) -> Result<bool, BuildError> {
        let Stmt::Pool(p) = stmt else {
            return Ok(false);
        };
        let pool_name = match p {
            PoolStmt::Spawn { pool }
            | PoolStmt::SpawnAt { pool, .. }
            | PoolStmt::TrySpawn { pool, .. }
            | PoolStmt::Despawn { pool }
            | PoolStmt::DespawnAll { pool }
            | PoolStmt::ForEach { pool, .. }
            | PoolStmt::DespawnWhere { pool, .. }
            | PoolStmt::Update { pool } => pool.clone(),
        };
        let Some(pool) = self.game.pools.get(&pool_name) else {
            self.verror("pool", format!("unknown pool {pool_name:?}"));
            return Ok(true);
        };
        let size = pool.size;
        let slot = pool.slot_var();
        let b = pool_name;

        match p {
            PoolStmt::Spawn { .. } => {
                self.out.line(format!("{b}_spawn();"));
            }
            PoolStmt::SpawnAt { x, y, .. } => {
                let x = self.expr(x);
                let y = self.expr(y);
                self.out.line(format!("{b}_spawn_at({x}, {y});"));
            }
            PoolStmt::TrySpawn { flag, .. } => {
                if !self.known_vars.contains(flag) {
                    self.verror("pool", format!("unknown variable {flag:?} for try-spawn"));
                    return Ok(true);
                }
                self.out.line(format!("{flag} = 0;"));
                self.out.open(format!("if ({b}_pool_count < {size})"));
                self.out.line(format!("{b}_spawn();"));
                self.out.line(format!("{flag} = 1;"));
                self.out.close();
            }
            PoolStmt::Despawn { .. } => {
                self.out.line(format!("{b}_despawn({slot});"));
            }
            PoolStmt::DespawnAll { .. } => {
                self.out.line(format!("{b}_despawn_all();"));
            }
            PoolStmt::ForEach { body, .. } => {
                let counter = self.next_loop_counter();
                self.out
                    .open(format!("for ({counter} = 0; {counter} < {size}; ++{counter})"));
                self.out.open(format!("if (!{b}_active[{counter}])"));
                self.out.line("continue;");
                self.out.close();
                self.out.line(format!("{slot} = {counter};"));
                self.stmts(body)?;
                self.out.close();
            }
            PoolStmt::DespawnWhere { cond, .. } => {
                let counter = self.next_loop_counter();
                let cond = self.expr(cond);
                self.out
                    .open(format!("for ({counter} = {size}; {counter} > 0; --{counter})"));
                self.out.open(format!("if (!{b}_active[{counter} - 1])"));
                self.out.line("continue;");
                self.out.close();
                self.out.line(format!("{slot} = {counter} - 1;"));
                self.out.open(format!("if ({cond})"));
                self.out.line(format!("{b}_despawn({slot});"));
                self.out.close();
                self.out.close();
            }
            PoolStmt::Update { .. } => {
                self.out.line(format!("{b}_update();"));
            }
        }
        Ok(true)
    }

    pub(crate) fn gen_pool_helpers(&mut self) -> Result<(), BuildError> {
        let pools: Vec<Pool> = self.game.pools.values().cloned().collect();
        for pool in &pools {
            self.gen_pool_functions(pool)?;
        }
        Ok(())
    }

    fn gen_pool_functions(&mut self, pool: &Pool) -> Result<(), BuildError> {
        let b = pool.name.clone();
        let size = pool.size;
        let slot = pool.slot_var();
        let oam = format!("{}_OAM_START", upper(&b));
        let has_anims = !pool.animations.is_empty();
        let sprite_base = pool
            .sprite
            .as_ref()
            .and_then(|a| self.sprite_bases.get(a).copied())
            .unwrap_or(0);

        // spawn_at carries the common path; spawn is the origin shorthand.
        self.begin_fn(&format!("void {b}_spawn_at(UINT8 x, UINT8 y)"));
        self.out.line("UINT8 i;");
        if !pool.has_position {
            self.out.line("(void)x;");
            self.out.line("(void)y;");
        }
        self.out.open(format!("for (i = 0; i < {size}; ++i)"));
        self.out.open(format!("if (!{b}_active[i])"));
        self.out.line(format!("{b}_active[i] = 1;"));
        self.out.line(format!("{slot} = i;"));
        if pool.has_position {
            self.out.line(format!("{b}_x[i] = x;"));
            self.out.line(format!("{b}_y[i] = y;"));
        }
        if pool.has_velocity {
            self.out.line(format!("{b}_vel_x[i] = 0;"));
            self.out.line(format!("{b}_vel_y[i] = 0;"));
        }
        for field in &pool.fields {
            self.out
                .line(format!("{b}_{}[i] = {};", field.name, field.default));
        }
        if has_anims {
            self.out.line(format!("{b}_anim[i] = ANIM_NONE;"));
            self.out.line(format!("{b}_frame[i] = 0;"));
            self.out.line(format!("{b}_timer[i] = 0;"));
            self.out.line(format!("{b}_anim_complete[i] = 0;"));
        }
        self.out.line(format!("{b}_pool_count += 1;"));
        self.stmts(&pool.on_spawn)?;
        if pool.sprite.is_some() {
            self.out
                .line(format!("set_sprite_tile({oam} + i, {sprite_base});"));
            if pool.has_position {
                self.out.line(format!(
                    "move_sprite({oam} + i, {b}_x[i] + 8, {b}_y[i] + 16);"
                ));
            }
        }
        self.out.line("return;");
        self.out.close();
        self.out.close();
        self.end_fn();

        self.begin_fn(&format!("void {b}_spawn(void)"));
        self.out.line(format!("{b}_spawn_at(0, 0);"));
        self.end_fn();

        self.begin_fn(&format!("void {b}_despawn(UINT8 idx)"));
        self.out.line(format!("{slot} = idx;"));
        self.stmts(&pool.on_despawn)?;
        if pool.sprite.is_some() {
            self.out.line(format!("move_sprite({oam} + idx, 0, 0);"));
        }
        self.out.line(format!("{b}_active[idx] = 0;"));
        self.out.open(format!("if ({b}_pool_count)"));
        self.out.line(format!("{b}_pool_count -= 1;"));
        self.out.close();
        self.end_fn();

        self.begin_fn(&format!("void {b}_despawn_all(void)"));
        self.out.line("UINT8 i;");
        self.out.open(format!("for (i = 0; i < {size}; ++i)"));
        self.out.open(format!("if ({b}_active[i])"));
        self.out.line(format!("{b}_despawn(i);"));
        self.out.close();
        self.out.close();
        self.end_fn();

        if pool.sprite.is_some() {
            self.begin_fn(&format!("void {b}_show(void)"));
            self.out.line("UINT8 i;");
            self.out.open(format!("for (i = 0; i < {size}; ++i)"));
            self.out.open(format!("if ({b}_active[i])"));
            if pool.has_position {
                self.out.line(format!(
                    "move_sprite({oam} + i, {b}_x[i] + 8, {b}_y[i] + 16);"
                ));
            }
            self.out.close();
            self.out.close();
            self.end_fn();

            self.begin_fn(&format!("void {b}_hide(void)"));
            self.out.line("UINT8 i;");
            self.out.open(format!("for (i = 0; i < {size}; ++i)"));
            self.out.line(format!("move_sprite({oam} + i, 0, 0);"));
            self.out.close();
            self.end_fn();
        }

        self.begin_fn(&format!("void {b}_update(void)"));
        self.out.line("UINT8 i;");
        self.out.open(format!("for (i = 0; i < {size}; ++i)"));
        self.out.open(format!("if (!{b}_active[i])"));
        self.out.line("continue;");
        self.out.close();
        self.out.line(format!("{slot} = i;"));
        self.stmts(&pool.on_frame)?;
        if pool.has_velocity && pool.has_position {
            self.out.line(format!("{b}_x[i] += {b}_vel_x[i];"));
            self.out.line(format!("{b}_y[i] += {b}_vel_y[i];"));
        }
        if has_anims {
            self.out.open(format!("if ({b}_anim[i] != ANIM_NONE)"));
            self.out.open(format!("if ({b}_timer[i] > 1)"));
            self.out.line(format!("{b}_timer[i] -= 1;"));
            self.out.chain("} else {");
            self.out
                .open(format!("if ({b}_frame[i] + 1 >= {b}_anim_lens[{b}_anim[i]])"));
            self.out.open(format!("if ({b}_anim_loops[{b}_anim[i]])"));
            self.out.line(format!("{b}_frame[i] = 0;"));
            self.out.chain("} else {");
            self.out.line(format!("{b}_anim_complete[i] = 1;"));
            self.out.line(format!("{b}_anim[i] = ANIM_NONE;"));
            self.out.close();
            self.out.chain("} else {");
            self.out.line(format!("{b}_frame[i] += 1;"));
            self.out.close();
            self.out.open(format!("if ({b}_anim[i] != ANIM_NONE)"));
            self.out
                .line(format!("{b}_timer[i] = {b}_anim_delays[{b}_anim[i]];"));
            if pool.sprite.is_some() {
                self.out.line(format!(
                    "set_sprite_tile({oam} + i, {b}_anims[{b}_anim[i]][{b}_frame[i]]);"
                ));
            }
            self.out.close();
            self.out.close();
            self.out.close();
        }
        if pool.sprite.is_some() && pool.has_position {
            self.out.line(format!(
                "move_sprite({oam} + i, {b}_x[i] + 8, {b}_y[i] + 16);"
            ));
        }
        self.out.close();
        if !pool.despawn_when.is_empty() {
            // Back-to-front so a despawn cannot disturb unvisited entries.
            let conds: Vec<String> = pool
                .despawn_when
                .clone()
                .iter()
                .map(|c| self.expr(c))
                .collect();
            self.out.open(format!("for (i = {size}; i > 0; --i)"));
            self.out.open(format!("if (!{b}_active[i - 1])"));
            self.out.line("continue;");
            self.out.close();
            self.out.line(format!("{slot} = i - 1;"));
            self.out.open(format!("if ({})", conds.join(" || ")));
            self.out.line(format!("{b}_despawn(i - 1);"));
            self.out.close();
            self.out.close();
        }
        self.end_fn();
        Ok(())
    }

    /// Pool parallel arrays, counters, and the OAM range constant.
    pub(crate) fn emit_pool_data(&mut self) {
        let pools: Vec<Pool> = self.game.pools.values().cloned().collect();
        for pool in &pools {
            let b = &pool.name;
            let size = pool.size;
            self.out
                .line(format!("#define {}_OAM_START {}", upper(b), pool.oam_start));
            self.out.line(format!("UINT8 {b}_active[{size}];"));
            if pool.has_position {
                self.out.line(format!("UINT8 {b}_x[{size}];"));
                self.out.line(format!("UINT8 {b}_y[{size}];"));
            }
            if pool.has_velocity {
                self.out.line(format!("INT8 {b}_vel_x[{size}];"));
                self.out.line(format!("INT8 {b}_vel_y[{size}];"));
            }
            for field in &pool.fields {
                self.out.line(format!(
                    "{} {b}_{}[{size}];",
                    field.kind.c_type(),
                    field.name
                ));
            }
            if !pool.animations.is_empty() {
                self.out.line(format!("UINT8 {b}_anim[{size}];"));
                self.out.line(format!("UINT8 {b}_frame[{size}];"));
                self.out.line(format!("UINT8 {b}_timer[{size}];"));
                self.out.line(format!("UINT8 {b}_anim_complete[{size}];"));
            }
            self.out.line(format!("UINT8 {b}_pool_count = 0;"));
            self.out.line(format!("UINT8 {} = 0;", pool.slot_var()));
            self.out.blank();
        }
    }
}
