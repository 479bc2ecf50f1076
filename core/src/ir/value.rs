//! Integer value semantics for the four hardware kinds.
//!
//! Every operation wraps after it completes, exactly as the 8-bit target
//! does: U8 mod 256, U16 mod 65536, I8/I16 two's-complement. Comparisons
//! and logical operators produce a kind-less 0/1 carried as U8.

use serde::{Deserialize, Serialize};

/// Semantic integer type of a variable or literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    U8,
    U16,
    I8,
    I16,
}

impl ValueKind {
    #[inline]
    pub fn bits(self) -> u32 {
        match self {
            ValueKind::U8 | ValueKind::I8 => 8,
            ValueKind::U16 | ValueKind::I16 => 16,
        }
    }

    #[inline]
    pub fn is_signed(self) -> bool {
        matches!(self, ValueKind::I8 | ValueKind::I16)
    }

    /// C type alias used in emitted code.
    pub fn c_type(self) -> &'static str {
        match self {
            ValueKind::U8 => "UINT8",
            ValueKind::U16 => "UINT16",
            ValueKind::I8 => "INT8",
            ValueKind::I16 => "INT16",
        }
    }

    /// Wrap a raw 64-bit intermediate result into this kind's domain.
    #[inline]
    pub fn wrap(self, raw: i64) -> i64 {
        let mask = (1u64 << self.bits()) - 1;
        let masked = (raw as u64) & mask;
        if self.is_signed() && masked > mask >> 1 {
            masked as i64 - (1i64 << self.bits())
        } else {
            masked as i64
        }
    }
}

/// A kinded integer. `raw` is always inside the kind's domain
/// (sign-extended for I8/I16).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Value {
    pub raw: i64,
    pub kind: ValueKind,
}

impl Value {
    #[inline]
    pub fn new(kind: ValueKind, raw: i64) -> Self {
        Self {
            raw: kind.wrap(raw),
            kind,
        }
    }

    #[inline]
    pub fn u8(v: u8) -> Self {
        Self::new(ValueKind::U8, v as i64)
    }

    #[inline]
    pub fn u16(v: u16) -> Self {
        Self::new(ValueKind::U16, v as i64)
    }

    #[inline]
    pub fn i8(v: i8) -> Self {
        Self::new(ValueKind::I8, v as i64)
    }

    #[inline]
    pub fn i16(v: i16) -> Self {
        Self::new(ValueKind::I16, v as i64)
    }

    /// Boolean result of a comparison or logical operator: kind-less 0/1.
    #[inline]
    pub fn flag(set: bool) -> Self {
        Self::new(ValueKind::U8, set as i64)
    }

    #[inline]
    pub fn is_truthy(self) -> bool {
        self.raw != 0
    }

    /// Re-wrap into another kind (assignment across kinds).
    #[inline]
    pub fn cast(self, kind: ValueKind) -> Self {
        Self::new(kind, self.raw)
    }
}
