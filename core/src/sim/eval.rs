//! Expression evaluation over the simulator's state bag.

use crate::error::SimError;
use crate::ir::{AnimTarget, BinaryOp, DomainExpr, Expr, Value, ValueKind};

use super::{Simulator, FLAG_COMPLETE};

impl Simulator<'_> {
    pub fn eval(&mut self, expr: &Expr) -> Result<Value, SimError> {
        match expr {
            Expr::Lit(v) => Ok(*v),
            Expr::Var(name) => self.var(name),
            Expr::Binary { op, lhs, rhs } => {
                // Logical operators short-circuit like the emitted C.
                match op {
                    BinaryOp::LAnd => {
                        let l = self.eval(lhs)?;
                        if !l.is_truthy() {
                            return Ok(Value::flag(false));
                        }
                        let r = self.eval(rhs)?;
                        Ok(Value::flag(r.is_truthy()))
                    }
                    BinaryOp::LOr => {
                        let l = self.eval(lhs)?;
                        if l.is_truthy() {
                            return Ok(Value::flag(true));
                        }
                        let r = self.eval(rhs)?;
                        Ok(Value::flag(r.is_truthy()))
                    }
                    _ => {
                        let l = self.eval(lhs)?;
                        let r = self.eval(rhs)?;
                        op.apply(l, r)
                    }
                }
            }
            Expr::Unary { op, operand } => {
                let v = self.eval(operand)?;
                Ok(op.apply(v))
            }
            Expr::Ternary { cond, then, otherwise } => {
                if self.eval(cond)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            // Free calls have no in-simulator meaning.
            Expr::Call { .. } => Ok(Value::u8(0)),
            Expr::Index { array, index } => {
                let index = self.eval(index)?.raw;
                self.array_read(array, index)
            }
            Expr::Domain(d) => self.eval_domain(d),
        }
    }

    fn eval_domain(&mut self, d: &DomainExpr) -> Result<Value, SimError> {
        match d {
            DomainExpr::PoolCount(pool) => {
                if !self.game.pools.contains_key(pool) {
                    return Err(SimError::UnknownPool(pool.clone()));
                }
                self.var(&format!("{pool}_pool_count"))
            }
            DomainExpr::CameraX => Ok(Value::new(ValueKind::U16, self.camera_x)),
            DomainExpr::CameraY => Ok(Value::new(ValueKind::U16, self.camera_y)),
            DomainExpr::TransitionActive => Ok(Value::flag(self.transition_active())),
            DomainExpr::SaveField(field) => self
                .save_work
                .fields
                .get(field)
                .copied()
                .ok_or_else(|| SimError::UnknownSaveField(field.clone())),
            DomainExpr::SaveArray { field, index } => {
                let index = self.eval(index)?.raw;
                let array = self
                    .save_work
                    .arrays
                    .get(field)
                    .ok_or_else(|| SimError::UnknownSaveField(field.clone()))?;
                array
                    .get(index as usize)
                    .copied()
                    .ok_or(SimError::IndexOutOfBounds {
                        array: field.clone(),
                        index,
                        len: array.len(),
                    })
            }
            DomainExpr::PathFound(path) => {
                let found = self.paths.get(path).map(|p| p.found).unwrap_or(false);
                Ok(Value::flag(found))
            }
            DomainExpr::MixerVolume(group) => {
                let state = self
                    .mixer
                    .get(group)
                    .ok_or_else(|| SimError::UnknownMixerGroup(group.clone()))?;
                Ok(Value::new(ValueKind::U8, state.volume))
            }
            DomainExpr::MixerCanPlay { channel, priority } => {
                Ok(Value::flag(self.mixer_can_play(*channel, *priority)))
            }
            DomainExpr::FrameCount => Ok(Value::new(ValueKind::U16, self.frame as i64)),
            DomainExpr::Pressed(button) => Ok(Value::flag(self.joypad & button.mask() != 0)),
            DomainExpr::JustPressed(button) => Ok(Value::flag(
                self.joypad & button.mask() != 0 && self.joypad_prev & button.mask() == 0,
            )),
            DomainExpr::InputBuffered(buffer) => {
                let value = self
                    .input_buffers
                    .get(buffer)
                    .copied()
                    .ok_or_else(|| SimError::UnknownVariable(buffer.clone()))?;
                Ok(Value::flag(value > 0))
            }
            DomainExpr::AnimDone(target) => self.eval_anim_done(target),
            DomainExpr::DialogActive(dialog) => {
                let state = self
                    .dialogs
                    .get(dialog)
                    .ok_or_else(|| SimError::UnknownDialog(dialog.clone()))?;
                Ok(Value::flag(state.active))
            }
            DomainExpr::MenuCursor(menu) => {
                let state = self
                    .menus
                    .get(menu)
                    .ok_or_else(|| SimError::UnknownMenu(menu.clone()))?;
                Ok(Value::new(ValueKind::U8, state.cursor as i64))
            }
            DomainExpr::TweenActive(var) => Ok(Value::flag(
                self.tweens.iter().any(|t| t.active && t.var == *var),
            )),
            DomainExpr::SpritesCollide(a, b) => self.eval_sprites_collide(a, b),
            DomainExpr::LinkData => Ok(Value::u8(self.link_data)),
            DomainExpr::Rand => {
                // xorshift32; fixed seed keeps test runs reproducible.
                self.rng ^= self.rng << 13;
                self.rng ^= self.rng >> 17;
                self.rng ^= self.rng << 5;
                Ok(Value::u8((self.rng & 0xFF) as u8))
            }
        }
    }

    fn eval_anim_done(&mut self, target: &AnimTarget) -> Result<Value, SimError> {
        match target {
            AnimTarget::Sprite(sprite) => {
                let state = self
                    .anims
                    .get(sprite)
                    .ok_or_else(|| SimError::UnknownSprite(sprite.clone()))?;
                Ok(Value::flag(state.flags & FLAG_COMPLETE != 0))
            }
            AnimTarget::Pool(pool) => {
                if !self.game.pools.contains_key(pool) {
                    return Err(SimError::UnknownPool(pool.clone()));
                }
                let slot = self.var(&format!("_{pool}_i"))?.raw;
                self.array_read(&format!("{pool}_anim_complete"), slot)
            }
        }
    }

    fn eval_sprites_collide(&mut self, a: &str, b: &str) -> Result<Value, SimError> {
        let rect = |sim: &Self, name: &str| -> Result<(i64, i64, i64, i64), SimError> {
            let sprite = sim
                .game
                .sprites
                .get(name)
                .ok_or_else(|| SimError::UnknownSprite(name.to_string()))?;
            let (x_var, y_var) = sprite
                .position_vars()
                .ok_or_else(|| SimError::UnknownSprite(name.to_string()))?;
            let x = sim.var(x_var)?.raw;
            let y = sim.var(y_var)?.raw;
            let (hx, hy, hw, hh) = match sprite.hitbox {
                Some(h) => (h.x as i64, h.y as i64, h.width as i64, h.height as i64),
                None => (0, 0, sprite.width as i64, sprite.height as i64),
            };
            Ok((x + hx, y + hy, hw, hh))
        };
        let (ax, ay, aw, ah) = rect(self, a)?;
        let (bx, by, bw, bh) = rect(self, b)?;
        let overlap =
            ax + aw > bx && bx + bw > ax && ay + ah > by && by + bh > ay;
        Ok(Value::flag(overlap))
    }
}
