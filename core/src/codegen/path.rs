//! Nav-grid and pathfinding lowering.
//!
//! Grid data is baked one byte per cell (0 blocked, otherwise cost) into
//! a ROM copy plus a mutable working copy for the set-tile/set-weight
//! statements. Path finding is a runtime A* over the working copy; path
//! state is interned per author-chosen name into `_path_<N>` slots.

use crate::error::BuildError;
use crate::ir::{Heuristic, PathStmt, Stmt};
use crate::model::NavGrid;

use super::{upper, Generator, PATH_MAX};

impl Generator<'_> {
    /// Category handler for pathfinding statements.
    pub(crate) fn path_stmt(&mut self, stmt: &Stmt) -> Result<bool, BuildError> {
        let Stmt::Path(p) = stmt else {
            return Ok(false);
        };
        match p {
            PathStmt::Find {
                path,
                grid,
                from_x,
                from_y,
                to_x,
                to_y,
                heuristic,
            } => {
                let Some(g) = self.game.nav_grids.get(grid).cloned() else {
                    self.verror("path", format!("unknown nav grid {grid:?}"));
                    return Ok(true);
                };
                let id = self.intern_path(path);
                let (fx, fy) = (self.expr(from_x), self.expr(from_y));
                let (tx, ty) = (self.expr(to_x), self.expr(to_y));
                let h = heuristic_id(*heuristic);
                self.out.line(format!(
                    "_path_{id}_found = _path_find({}_weights, {}, {}, {fx}, {fy}, {tx}, {ty}, \
                     _path_{id}_x, _path_{id}_y, &_path_{id}_len, {h});",
                    g.name, g.width, g.height
                ));
                self.out.line(format!("_path_{id}_step = 0;"));
            }
            PathStmt::Advance { path } => {
                let id = self.intern_path(path);
                self.out
                    .open(format!("if (_path_{id}_step < _path_{id}_len)"));
                self.out.line(format!("_path_{id}_step += 1;"));
                self.out.close();
            }
            PathStmt::Follow { path, x_var, y_var } => {
                if !self.known_vars.contains(x_var) || !self.known_vars.contains(y_var) {
                    self.verror(
                        "path",
                        format!("unknown position variables ({x_var:?}, {y_var:?}) for follow"),
                    );
                    return Ok(true);
                }
                let id = self.intern_path(path);
                self.out.line(format!(
                    "_path_follow(_path_{id}_x, _path_{id}_y, _path_{id}_len, \
                     &_path_{id}_step, &{x_var}, &{y_var});"
                ));
            }
            PathStmt::Reset { path } => {
                let id = self.intern_path(path);
                self.out.line(format!("_path_{id}_found = 0;"));
                self.out.line(format!("_path_{id}_len = 0;"));
                self.out.line(format!("_path_{id}_step = 0;"));
            }
            PathStmt::GridSetTile { grid, x, y, walkable } => {
                let Some(g) = self.game.nav_grids.get(grid).cloned() else {
                    self.verror("path", format!("unknown nav grid {grid:?}"));
                    return Ok(true);
                };
                let x = self.expr(x);
                let y = self.expr(y);
                self.out.line(format!(
                    "{}_weights[({y}) * {} + ({x})] = {};",
                    g.name,
                    g.width,
                    *walkable as u8
                ));
            }
            PathStmt::GridSetWeight { grid, x, y, weight } => {
                let Some(g) = self.game.nav_grids.get(grid).cloned() else {
                    self.verror("path", format!("unknown nav grid {grid:?}"));
                    return Ok(true);
                };
                let x = self.expr(x);
                let y = self.expr(y);
                let weight = self.expr(weight);
                self.out.line(format!(
                    "{}_weights[({y}) * {} + ({x})] = {weight};",
                    g.name, g.width
                ));
            }
            PathStmt::GridInit { grid } => {
                let Some(g) = self.game.nav_grids.get(grid).cloned() else {
                    self.verror("path", format!("unknown nav grid {grid:?}"));
                    return Ok(true);
                };
                self.out.line(format!(
                    "memcpy({}_weights, {}_weights_rom, {});",
                    g.name,
                    g.name,
                    g.width as usize * g.height as usize
                ));
            }
        }
        Ok(true)
    }

    pub(crate) fn gen_path_helpers(&mut self) -> Result<(), BuildError> {
        if self.game.nav_grids.is_empty() {
            return Ok(());
        }

        self.begin_fn("UINT16 _path_heur(UINT8 x0, UINT8 y0, UINT8 x1, UINT8 y1, UINT8 kind)");
        self.out.line("UINT8 dx = x0 > x1 ? x0 - x1 : x1 - x0;");
        self.out.line("UINT8 dy = y0 > y1 ? y0 - y1 : y1 - y0;");
        self.out.open("switch (kind)");
        self.out.line("case 1: return dx > dy ? dx : dy;");
        // Octile distance approximates Euclidean in grid steps.
        self.out.line(
            "case 2: return dx > dy ? dx + dy - (dy >> 1) : dx + dy - (dx >> 1);",
        );
        self.out.line("default: return dx + dy;");
        self.out.close();
        self.end_fn();

        self.begin_fn(
            "void _path_relax(UINT16 from, UINT16 to, UINT8 *grid, UINT8 w, \
             UINT8 tx, UINT8 ty, UINT8 heuristic)",
        );
        self.out.line("UINT16 cost;");
        self.out
            .line("if (!grid[to] || _astar_state[to] == 2) { return; }");
        self.out.line("cost = _astar_g[from] + grid[to];");
        self.out.open("if (cost < _astar_g[to])");
        self.out.line("_astar_g[to] = cost;");
        self.out.line(
            "_astar_f[to] = cost + _path_heur((UINT8)(to % w), (UINT8)(to / w), tx, ty, heuristic);",
        );
        self.out.line("_astar_from[to] = from;");
        self.out.line("_astar_state[to] = 1;");
        self.out.close();
        self.end_fn();

        self.begin_fn(
            "UINT8 _path_find(UINT8 *grid, UINT8 w, UINT8 h, UINT8 sx, UINT8 sy, \
             UINT8 tx, UINT8 ty, UINT8 *out_x, UINT8 *out_y, UINT8 *out_len, UINT8 heuristic)",
        );
        self.out.line("UINT16 n = (UINT16)w * h;");
        self.out.line("UINT16 start = (UINT16)sy * w + sx;");
        self.out.line("UINT16 goal = (UINT16)ty * w + tx;");
        self.out.line("UINT16 current;");
        self.out.line("UINT16 best;");
        self.out.line("UINT16 i;");
        self.out.line("UINT8 cx;");
        self.out.line("UINT8 cy;");
        self.out.line("UINT8 len;");
        self.out.line("UINT8 tmp;");
        self.out.line("*out_len = 0;");
        self.out
            .line("if (sx >= w || sy >= h || tx >= w || ty >= h) { return 0; }");
        self.out.line("if (!grid[start] || !grid[goal]) { return 0; }");
        self.out.open("for (i = 0; i < n; ++i)");
        self.out.line("_astar_state[i] = 0;");
        self.out.line("_astar_g[i] = 0xFFFF;");
        self.out.close();
        self.out.line("_astar_g[start] = 0;");
        self.out
            .line("_astar_f[start] = _path_heur(sx, sy, tx, ty, heuristic);");
        self.out.line("_astar_from[start] = start;");
        self.out.line("_astar_state[start] = 1;");
        self.out.open("for (;;)");
        self.out.line("best = 0xFFFF;");
        self.out.line("current = 0xFFFF;");
        self.out.open("for (i = 0; i < n; ++i)");
        self.out
            .open("if (_astar_state[i] == 1 && _astar_f[i] < best)");
        self.out.line("best = _astar_f[i];");
        self.out.line("current = i;");
        self.out.close();
        self.out.close();
        self.out.line("if (current == 0xFFFF) { return 0; }");
        self.out.line("if (current == goal) { break; }");
        self.out.line("_astar_state[current] = 2;");
        self.out.line("cx = (UINT8)(current % w);");
        self.out.line("cy = (UINT8)(current / w);");
        self.out.open("if (cx > 0)");
        self.out
            .line("_path_relax(current, current - 1, grid, w, tx, ty, heuristic);");
        self.out.close();
        self.out.open("if (cx + 1 < w)");
        self.out
            .line("_path_relax(current, current + 1, grid, w, tx, ty, heuristic);");
        self.out.close();
        self.out.open("if (cy > 0)");
        self.out
            .line("_path_relax(current, current - w, grid, w, tx, ty, heuristic);");
        self.out.close();
        self.out.open("if (cy + 1 < h)");
        self.out
            .line("_path_relax(current, current + w, grid, w, tx, ty, heuristic);");
        self.out.close();
        self.out.close();
        self.out.line("len = 0;");
        self.out.line("current = goal;");
        self.out
            .open(format!("while (current != start && len < {PATH_MAX})"));
        self.out.line("out_x[len] = (UINT8)(current % w);");
        self.out.line("out_y[len] = (UINT8)(current / w);");
        self.out.line("len += 1;");
        self.out.line("current = _astar_from[current];");
        self.out.close();
        self.out.open("for (i = 0; i < len / 2; ++i)");
        self.out.line("tmp = out_x[i];");
        self.out.line("out_x[i] = out_x[len - 1 - i];");
        self.out.line("out_x[len - 1 - i] = tmp;");
        self.out.line("tmp = out_y[i];");
        self.out.line("out_y[i] = out_y[len - 1 - i];");
        self.out.line("out_y[len - 1 - i] = tmp;");
        self.out.close();
        self.out.line("*out_len = len;");
        self.out.line("return 1;");
        self.end_fn();

        self.begin_fn(
            "void _path_follow(const UINT8 *xs, const UINT8 *ys, UINT8 len, \
             UINT8 *step, UINT8 *px, UINT8 *py)",
        );
        self.out.line("UINT8 wx;");
        self.out.line("UINT8 wy;");
        self.out.line("UINT8 dx;");
        self.out.line("UINT8 dy;");
        self.out.line("if (*step >= len) { return; }");
        self.out.line("wx = xs[*step] * 8;");
        self.out.line("wy = ys[*step] * 8;");
        self.out
            .line("if (*px < wx) { *px += 1; } else if (*px > wx) { *px -= 1; }");
        self.out
            .line("if (*py < wy) { *py += 1; } else if (*py > wy) { *py -= 1; }");
        self.out.line("dx = *px > wx ? *px - wx : wx - *px;");
        self.out.line("dy = *py > wy ? *py - wy : wy - *py;");
        // Waypoint proximity threshold: 4 pixels.
        self.out.line("if (dx < 4 && dy < 4) { *step += 1; }");
        self.end_fn();
        Ok(())
    }

    /// Grid cell bytes (ROM + working copy), A* scratch, and path slots.
    pub(crate) fn emit_path_data(&mut self) -> Result<(), BuildError> {
        let grids: Vec<NavGrid> = self.game.nav_grids.values().cloned().collect();
        if grids.is_empty() && self.paths.is_empty() {
            return Ok(());
        }
        self.out.line(format!("#define PATH_MAX {PATH_MAX}"));
        let mut max_cells = 0usize;
        for grid in &grids {
            let g = &grid.name;
            if grid.width > crate::model::NAV_GRID_MAX || grid.height > crate::model::NAV_GRID_MAX {
                return Err(BuildError::NavGridInvalid {
                    name: g.clone(),
                    reason: format!(
                        "{}x{} exceeds the {max}x{max} pathfinding limit",
                        grid.width,
                        grid.height,
                        max = crate::model::NAV_GRID_MAX
                    ),
                });
            }
            let cells = grid.width as usize * grid.height as usize;
            max_cells = max_cells.max(cells);
            self.out
                .line(format!("#define {}_W {}", upper(g), grid.width));
            self.out
                .line(format!("#define {}_H {}", upper(g), grid.height));
            let bytes = grid
                .cell_weights()
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            self.out
                .line(format!("const UINT8 {g}_weights_rom[{cells}] = {{{bytes}}};"));
            self.out.line(format!("UINT8 {g}_weights[{cells}];"));
        }
        if !grids.is_empty() {
            self.out.line(format!("UINT16 _astar_g[{max_cells}];"));
            self.out.line(format!("UINT16 _astar_f[{max_cells}];"));
            self.out.line(format!("UINT16 _astar_from[{max_cells}];"));
            self.out.line(format!("UINT8 _astar_state[{max_cells}];"));
        }
        for id in 0..self.paths.len() {
            self.out.line(format!("UINT8 _path_{id}_x[PATH_MAX];"));
            self.out.line(format!("UINT8 _path_{id}_y[PATH_MAX];"));
            self.out.line(format!("UINT8 _path_{id}_len = 0;"));
            self.out.line(format!("UINT8 _path_{id}_step = 0;"));
            self.out.line(format!("UINT8 _path_{id}_found = 0;"));
        }
        self.out.blank();
        Ok(())
    }
}

fn heuristic_id(h: Heuristic) -> u8 {
    match h {
        Heuristic::Manhattan => 0,
        Heuristic::Chebyshev => 1,
        Heuristic::Euclidean => 2,
    }
}
