use gbforge_core::error::SimError;
use gbforge_core::ir::{BinaryOp, UnaryOp, Value, ValueKind};

// =============================================================================
// Wrap arithmetic
// =============================================================================

#[test]
fn test_u8_add_wraps() {
    let r = BinaryOp::Add.apply(Value::u8(250), Value::u8(10)).unwrap();
    assert_eq!(r.raw, 4);
    assert_eq!(r.kind, ValueKind::U8);
}

#[test]
fn test_u16_add_wraps() {
    let r = BinaryOp::Add
        .apply(Value::u16(65530), Value::u16(10))
        .unwrap();
    assert_eq!(r.raw, 4);
}

#[test]
fn test_i8_overflow_wraps_negative() {
    let r = BinaryOp::Add.apply(Value::i8(127), Value::i8(1)).unwrap();
    assert_eq!(r.raw, -128);
}

#[test]
fn test_i16_underflow_wraps_positive() {
    let r = BinaryOp::Sub
        .apply(Value::i16(-32768), Value::i16(1))
        .unwrap();
    assert_eq!(r.raw, 32767);
}

#[test]
fn test_mul_wraps_after_operation() {
    let r = BinaryOp::Mul.apply(Value::u8(16), Value::u8(17)).unwrap();
    assert_eq!(r.raw, (16 * 17) % 256);
}

#[test]
fn test_sub_wraps_u8() {
    let r = BinaryOp::Sub.apply(Value::u8(3), Value::u8(5)).unwrap();
    assert_eq!(r.raw, 254);
}

// =============================================================================
// Comparisons and logic produce kind-less 0/1
// =============================================================================

#[test]
fn test_comparisons_are_flags() {
    for (op, expect) in [
        (BinaryOp::Eq, 0),
        (BinaryOp::Neq, 1),
        (BinaryOp::Lt, 1),
        (BinaryOp::Lte, 1),
        (BinaryOp::Gt, 0),
        (BinaryOp::Gte, 0),
    ] {
        let r = op.apply(Value::u8(3), Value::u8(5)).unwrap();
        assert_eq!(r.raw, expect, "{op:?}");
        assert_eq!(r.kind, ValueKind::U8);
    }
}

#[test]
fn test_signed_comparison_uses_sign() {
    let r = BinaryOp::Lt.apply(Value::i8(-5), Value::i8(3)).unwrap();
    assert_eq!(r.raw, 1);
}

#[test]
fn test_logical_ops() {
    assert_eq!(
        BinaryOp::LAnd
            .apply(Value::u8(7), Value::u8(1))
            .unwrap()
            .raw,
        1
    );
    assert_eq!(
        BinaryOp::LAnd
            .apply(Value::u8(7), Value::u8(0))
            .unwrap()
            .raw,
        0
    );
    assert_eq!(
        BinaryOp::LOr.apply(Value::u8(0), Value::u8(0)).unwrap().raw,
        0
    );
    assert_eq!(
        BinaryOp::LOr.apply(Value::u8(0), Value::u8(9)).unwrap().raw,
        1
    );
}

#[test]
fn test_not_truth_table() {
    assert_eq!(UnaryOp::Not.apply(Value::u8(0)).raw, 1);
    assert_eq!(UnaryOp::Not.apply(Value::u8(1)).raw, 0);
    assert_eq!(UnaryOp::Not.apply(Value::u8(200)).raw, 0);
}

#[test]
fn test_neg_and_bnot() {
    assert_eq!(UnaryOp::Neg.apply(Value::i8(-128)).raw, -128);
    assert_eq!(UnaryOp::BNot.apply(Value::u8(0x0F)).raw, 0xF0);
}

// =============================================================================
// Division, modulo, shifts
// =============================================================================

#[test]
fn test_div_by_zero_is_error() {
    assert_eq!(
        BinaryOp::Div.apply(Value::u8(10), Value::u8(0)),
        Err(SimError::DivisionByZero)
    );
    assert_eq!(
        BinaryOp::Mod.apply(Value::u16(10), Value::u16(0)),
        Err(SimError::DivisionByZero)
    );
}

#[test]
fn test_div_truncates() {
    assert_eq!(
        BinaryOp::Div.apply(Value::i8(-7), Value::i8(2)).unwrap().raw,
        -3
    );
}

#[test]
fn test_shift_count_is_modulo_width() {
    // 9 mod 8 = 1 for an 8-bit left operand.
    let r = BinaryOp::Shl.apply(Value::u8(1), Value::u8(9)).unwrap();
    assert_eq!(r.raw, 2);
    let r = BinaryOp::Shr.apply(Value::u16(0x8000), Value::u8(17)).unwrap();
    assert_eq!(r.raw, 0x4000);
}

#[test]
fn test_bitwise_ops_keep_kind() {
    let r = BinaryOp::Xor.apply(Value::u8(0xF0), Value::u8(0xFF)).unwrap();
    assert_eq!(r.raw, 0x0F);
    let r = BinaryOp::And.apply(Value::u8(0x3C), Value::u8(0x0F)).unwrap();
    assert_eq!(r.raw, 0x0C);
    let r = BinaryOp::Or.apply(Value::u8(0x30), Value::u8(0x03)).unwrap();
    assert_eq!(r.raw, 0x33);
}
