//! IR expressions.
//!
//! A closed sum: the generic arms (literals, variables, operators, calls,
//! array access) are understood by every consumer; the `Domain` arm is
//! opaque to the generic evaluator and lowered by whichever category
//! handler owns it.

use crate::error::SimError;

use super::stmt::{AnimTarget, Button, Channel};
use super::value::{Value, ValueKind};

/// Binary operators. Arithmetic, bitwise and shift results take the left
/// operand's kind; comparisons and logical operators produce a 0/1 flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    LAnd,
    LOr,
}

impl BinaryOp {
    /// C operator token.
    pub fn c_token(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::LAnd => "&&",
            BinaryOp::LOr => "||",
        }
    }

    /// Apply with wrap-after semantics. Division and modulo by zero are
    /// surfaced errors; on hardware the behavior is the target's.
    pub fn apply(self, lhs: Value, rhs: Value) -> Result<Value, SimError> {
        let kind = lhs.kind;
        let (a, b) = (lhs.raw, rhs.raw);
        let out = match self {
            BinaryOp::Add => Value::new(kind, a.wrapping_add(b)),
            BinaryOp::Sub => Value::new(kind, a.wrapping_sub(b)),
            BinaryOp::Mul => Value::new(kind, a.wrapping_mul(b)),
            BinaryOp::Div => {
                if b == 0 {
                    return Err(SimError::DivisionByZero);
                }
                Value::new(kind, a.wrapping_div(b))
            }
            BinaryOp::Mod => {
                if b == 0 {
                    return Err(SimError::DivisionByZero);
                }
                Value::new(kind, a.wrapping_rem(b))
            }
            BinaryOp::And => Value::new(kind, a & b),
            BinaryOp::Or => Value::new(kind, a | b),
            BinaryOp::Xor => Value::new(kind, a ^ b),
            // Shift count is taken modulo the width of the left operand.
            BinaryOp::Shl => Value::new(kind, a << b.rem_euclid(kind.bits() as i64)),
            BinaryOp::Shr => Value::new(kind, a >> b.rem_euclid(kind.bits() as i64)),
            BinaryOp::Eq => Value::flag(a == b),
            BinaryOp::Neq => Value::flag(a != b),
            BinaryOp::Lt => Value::flag(a < b),
            BinaryOp::Lte => Value::flag(a <= b),
            BinaryOp::Gt => Value::flag(a > b),
            BinaryOp::Gte => Value::flag(a >= b),
            BinaryOp::LAnd => Value::flag(a != 0 && b != 0),
            BinaryOp::LOr => Value::flag(a != 0 || b != 0),
        };
        Ok(out)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation (wraps).
    Neg,
    /// Logical not: 0 becomes 1, anything else becomes 0.
    Not,
    /// Bitwise complement.
    BNot,
}

impl UnaryOp {
    pub fn c_token(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BNot => "~",
        }
    }

    pub fn apply(self, v: Value) -> Value {
        match self {
            UnaryOp::Neg => Value::new(v.kind, v.raw.wrapping_neg()),
            UnaryOp::Not => Value::flag(v.raw == 0),
            UnaryOp::BNot => Value::new(v.kind, !v.raw),
        }
    }
}

/// IR expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Lit(Value),
    Var(String),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// Free function call; lowered verbatim, evaluates to 0 in simulation.
    Call { name: String, args: Vec<Expr> },
    /// Named array indexed by an expression (pool arrays, save arrays,
    /// nav-grid cells).
    Index { array: String, index: Box<Expr> },
    Domain(DomainExpr),
}

/// Feature-owned expressions. The generic evaluator treats these as
/// opaque; the owning category handler lowers them to C and the simulator
/// reads the matching piece of its state bag.
#[derive(Clone, Debug, PartialEq)]
pub enum DomainExpr {
    /// Number of live entries in a pool.
    PoolCount(String),
    CameraX,
    CameraY,
    TransitionActive,
    /// Read a scalar save field from the working copy.
    SaveField(String),
    /// Read one element of a save array field.
    SaveArray { field: String, index: Box<Expr> },
    /// 1 if the named path's last find succeeded.
    PathFound(String),
    /// Current volume (0..100) of a mixer group.
    MixerVolume(String),
    /// Priority gate: may a sound of this priority use the channel now?
    MixerCanPlay { channel: Channel, priority: u8 },
    FrameCount,
    /// Raw held state of a button this frame.
    Pressed(Button),
    /// Pressed this frame but not the previous one.
    JustPressed(Button),
    /// 1 while the named input buffer window is open.
    InputBuffered(String),
    /// 1 once a non-looping animation has run to its terminal frame.
    AnimDone(AnimTarget),
    DialogActive(String),
    MenuCursor(String),
    /// 1 while any tween slot is driving the named variable.
    TweenActive(String),
    /// Hitbox overlap test between two sprites.
    SpritesCollide(String, String),
    /// Last byte received over the link cable.
    LinkData,
    /// Hardware random byte. The simulator uses a fixed-seed generator so
    /// test runs are reproducible.
    Rand,
}

impl Expr {
    pub fn lit(v: Value) -> Self {
        Expr::Lit(v)
    }

    pub fn u8(v: u8) -> Self {
        Expr::Lit(Value::u8(v))
    }

    pub fn u16(v: u16) -> Self {
        Expr::Lit(Value::u16(v))
    }

    pub fn i8(v: i8) -> Self {
        Expr::Lit(Value::i8(v))
    }

    pub fn i16(v: i16) -> Self {
        Expr::Lit(Value::i16(v))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn bin(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn index(array: impl Into<String>, index: Expr) -> Self {
        Expr::Index {
            array: array.into(),
            index: Box::new(index),
        }
    }

    /// Literal with an explicit kind, for initializers.
    pub fn lit_of(kind: ValueKind, raw: i64) -> Self {
        Expr::Lit(Value::new(kind, raw))
    }
}
