//! Camera lowering: follow, bounds clamping, shake, and the scroll
//! register write at the end of each camera update.

use crate::error::BuildError;
use crate::ir::{CameraStmt, Stmt};

use super::Generator;

/// Visible screen size in pixels.
const SCREEN_W: u16 = 160;
const SCREEN_H: u16 = 144;

impl Generator<'_> {
    /// Category handler for camera statements.
    pub(crate) fn camera_stmt(&mut self, stmt: &Stmt) -> Result<bool, BuildError> {
        let Stmt::Camera(c) = stmt else {
            return Ok(false);
        };
        match c {
            CameraStmt::SetPosition { x, y } => {
                let x = self.expr(x);
                let y = self.expr(y);
                self.out.line(format!("_camera_x = {x};"));
                self.out.line(format!("_camera_y = {y};"));
            }
            CameraStmt::Follow { sprite } => {
                match self.follow_index(sprite) {
                    Some(idx) => self.out.line(format!("_camera_follow = {idx};")),
                    None => self.verror(
                        "camera",
                        format!("unknown or position-less sprite {sprite:?} for follow"),
                    ),
                }
            }
            CameraStmt::StopFollow => self.out.line("_camera_follow = 0;"),
            CameraStmt::Snap => {
                self.out.line("SCX_REG = (UINT8)_camera_x;");
                self.out.line("SCY_REG = (UINT8)_camera_y;");
            }
            CameraStmt::SetBounds { x, y, width, height } => {
                self.out.line(format!("_camera_bound_x = {x};"));
                self.out.line(format!("_camera_bound_y = {y};"));
                self.out.line(format!("_camera_bound_w = {width};"));
                self.out.line(format!("_camera_bound_h = {height};"));
                self.out.line("_camera_bounded = 1;");
            }
            CameraStmt::Shake { intensity, frames } => {
                self.out
                    .line(format!("_camera_shake_intensity = {intensity};"));
                self.out.line(format!("_camera_shake_timer = {frames};"));
            }
            CameraStmt::ShakeStop => {
                self.out.line("_camera_shake_timer = 0;");
                self.out.line("_camera_shake_intensity = 0;");
            }
            CameraStmt::Update => self.out.line("update_camera();"),
        }
        Ok(true)
    }

    /// 1-based index into the follow switch; 0 means no follow target.
    fn follow_index(&self, sprite: &str) -> Option<usize> {
        self.game
            .sprites
            .values()
            .filter(|s| s.position_vars().is_some())
            .position(|s| s.name == sprite)
            .map(|i| i + 1)
    }

    pub(crate) fn gen_camera_helpers(&mut self) -> Result<(), BuildError> {
        let followables: Vec<(String, String)> = self
            .game
            .sprites
            .values()
            .filter_map(|s| {
                s.position_vars()
                    .map(|(x, y)| (x.to_string(), y.to_string()))
            })
            .collect();

        self.begin_fn("void update_camera(void)");
        self.out.line("INT8 shake_x = 0;");
        self.out.line("INT8 shake_y = 0;");
        if !followables.is_empty() {
            let half_w = SCREEN_W / 2;
            let half_h = SCREEN_H / 2;
            self.out.open("switch (_camera_follow)");
            for (idx, (x_var, y_var)) in followables.iter().enumerate() {
                self.out.open(format!("case {}:", idx + 1));
                self.out.line(format!(
                    "_camera_x = ({x_var} > {half_w}) ? {x_var} - {half_w} : 0;"
                ));
                self.out.line(format!(
                    "_camera_y = ({y_var} > {half_h}) ? {y_var} - {half_h} : 0;"
                ));
                self.out.line("break;");
                self.out.close();
            }
            self.out.close();
        }
        self.out.open("if (_camera_bounded)");
        self.out.open("if (_camera_x < _camera_bound_x)");
        self.out.line("_camera_x = _camera_bound_x;");
        self.out.close();
        self.out.open(format!(
            "if (_camera_x > _camera_bound_x + _camera_bound_w - {SCREEN_W})"
        ));
        self.out.line(format!(
            "_camera_x = _camera_bound_x + _camera_bound_w - {SCREEN_W};"
        ));
        self.out.close();
        self.out.open("if (_camera_y < _camera_bound_y)");
        self.out.line("_camera_y = _camera_bound_y;");
        self.out.close();
        self.out.open(format!(
            "if (_camera_y > _camera_bound_y + _camera_bound_h - {SCREEN_H})"
        ));
        self.out.line(format!(
            "_camera_y = _camera_bound_y + _camera_bound_h - {SCREEN_H};"
        ));
        self.out.close();
        self.out.close();
        self.out.open("if (_camera_shake_timer)");
        self.out.line("_camera_shake_timer -= 1;");
        self.out.line(
            "shake_x = (INT8)(rand() % (_camera_shake_intensity + 1)) - (_camera_shake_intensity / 2);",
        );
        self.out.line(
            "shake_y = (INT8)(rand() % (_camera_shake_intensity + 1)) - (_camera_shake_intensity / 2);",
        );
        // Intensity decays every 8 frames so long shakes settle.
        self.out.open("if ((_camera_shake_timer & 7) == 0 && _camera_shake_intensity)");
        self.out.line("_camera_shake_intensity -= 1;");
        self.out.close();
        self.out.close();
        self.out.line("SCX_REG = (UINT8)(_camera_x + shake_x);");
        self.out.line("SCY_REG = (UINT8)(_camera_y + shake_y);");
        self.end_fn();
        Ok(())
    }

    pub(crate) fn emit_camera_data(&mut self) {
        let (x, y, bounds) = match self.game.camera.as_ref() {
            Some(c) => (c.x, c.y, c.bounds),
            None => (0, 0, None),
        };
        self.out.line(format!("UINT16 _camera_x = {x};"));
        self.out.line(format!("UINT16 _camera_y = {y};"));
        self.out.line("UINT8 _camera_follow = 0;");
        self.out.line("UINT8 _camera_shake_timer = 0;");
        self.out.line("UINT8 _camera_shake_intensity = 0;");
        let (bx, by, bw, bh) = bounds.unwrap_or((0, 0, 0, 0));
        self.out
            .line(format!("UINT8 _camera_bounded = {};", bounds.is_some() as u8));
        self.out.line(format!("UINT16 _camera_bound_x = {bx};"));
        self.out.line(format!("UINT16 _camera_bound_y = {by};"));
        self.out.line(format!("UINT16 _camera_bound_w = {bw};"));
        self.out.line(format!("UINT16 _camera_bound_h = {bh};"));
        self.out.blank();
    }
}
