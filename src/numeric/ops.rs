//! C operator semantics over [`CValue`]
//!
//! Implements integer promotion, the usual arithmetic conversions, and the
//! full expression operator set. All integer arithmetic runs in `i128` with
//! wrapping operations, then [`CValue::int`] normalizes the result back to
//! the C result type, which reproduces two's-complement wraparound at every
//! width from 8 to 64 bits. Unsigned 64-bit multiplication can exceed even
//! `i128`, which is why the wrapping forms are load-bearing: the low 64 bits
//! stay exact.
//!
//! Division or modulo by zero and out-of-range shift counts are reported as
//! [`NumericError`] values, never panics.

use super::model::IntegerModel;
use super::value::{convert_to_type, CType, CValue, ScalarKind};
use std::fmt;

/// Binary operators, in source spelling order of the precedence ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        use BinOp::*;
        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            BitAnd => "&",
            BitOr => "|",
            BitXor => "^",
            Shl => "<<",
            Shr => ">>",
            Eq => "==",
            Ne => "!=",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            And => "&&",
            Or => "||",
        }
    }

    /// Comparison and logical operators always produce `int` 0 or 1.
    #[inline]
    pub fn yields_bool_int(&self) -> bool {
        use BinOp::*;
        matches!(self, Eq | Ne | Lt | Le | Gt | Ge | And | Or)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Prefix operators. `Deref` and `AddrOf` are reference operators and are
/// resolved by the evaluator, not computed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Plus,
    Neg,
    Not,
    BitNot,
    Deref,
    AddrOf,
}

impl UnOp {
    pub fn symbol(&self) -> &'static str {
        use UnOp::*;
        match self {
            Plus => "+",
            Neg => "-",
            Not => "!",
            BitNot => "~",
            Deref => "*",
            AddrOf => "&",
        }
    }
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Arithmetic failure. Carried into diagnostics by the folder and the
/// evaluator; the node that produced it yields no value.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericError {
    /// Integer `/` or `%` with a zero right operand.
    DivisionByZero,
    /// Shift count negative or not below the promoted operand width.
    InvalidShift {
        op: &'static str,
        count: i128,
        bits: u32,
    },
    /// Operator applied to a type it is not defined for, e.g. `%` on floats.
    UndefinedFor {
        op: &'static str,
        ty: CType,
    },
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::DivisionByZero => write!(f, "Division by zero"),
            NumericError::InvalidShift { op, count, bits } => {
                write!(
                    f,
                    "Invalid {} shift count {} for {}-bit operand",
                    op, count, bits
                )
            }
            NumericError::UndefinedFor { op, ty } => {
                write!(f, "Operation {} undefined for operand type {}", op, ty)
            }
        }
    }
}

impl std::error::Error for NumericError {}

/// C integer promotion. Bool and anything narrower than `int` widen to
/// signed `int`; pointers become unsigned integers of pointer width; wider
/// types and floats pass through.
pub fn integer_promotion(ty: &CType, model: &IntegerModel) -> CType {
    match ty.kind {
        ScalarKind::Float => *ty,
        ScalarKind::Bool => CType::int(model),
        ScalarKind::Pointer => CType::unsigned_bits(ty.bits),
        ScalarKind::Signed | ScalarKind::Unsigned => {
            if ty.bits < model.int_bits {
                CType::int(model)
            } else {
                *ty
            }
        }
    }
}

/// The usual arithmetic conversions: the common type both operands convert
/// to before a binary arithmetic or comparison operator applies.
pub fn usual_arithmetic_conversion(
    a: &CType,
    b: &CType,
    model: &IntegerModel,
) -> CType {
    // A float operand dominates; two floats pick the wider
    if a.is_float() && b.is_float() {
        return if a.bits >= b.bits { *a } else { *b };
    }
    if a.is_float() {
        return *a;
    }
    if b.is_float() {
        return *b;
    }

    let pa = integer_promotion(a, model);
    let pb = integer_promotion(b, model);
    if pa == pb {
        return pa;
    }
    if pa.is_signed() == pb.is_signed() {
        return if pa.bits >= pb.bits { pa } else { pb };
    }
    let (signed, unsigned) = if pa.is_signed() { (pa, pb) } else { (pb, pa) };
    // Unsigned wins at equal or greater width, otherwise the wider signed
    // type can represent every unsigned operand value
    if unsigned.bits >= signed.bits {
        unsigned
    } else {
        signed
    }
}

#[inline]
fn int_of(v: &CValue, ty: &CType) -> i128 {
    convert_to_type(v, ty).as_int().unwrap_or(0)
}

#[inline]
fn float_of(v: &CValue, ty: &CType) -> f64 {
    convert_to_type(v, ty).as_float().unwrap_or(0.0)
}

/// Apply a binary operator with C semantics.
///
/// `&&` and `||` are computed from already-evaluated operands here; the
/// evaluator short-circuits before calling in, this path serves the constant
/// folder.
pub fn apply_binary(
    op: BinOp,
    a: &CValue,
    b: &CValue,
    model: &IntegerModel,
) -> Result<CValue, NumericError> {
    use BinOp::*;
    match op {
        And => Ok(CValue::int(
            CType::int(model),
            (a.is_truthy() && b.is_truthy()) as i128,
        )),
        Or => Ok(CValue::int(
            CType::int(model),
            (a.is_truthy() || b.is_truthy()) as i128,
        )),
        Shl | Shr => apply_shift(op, a, b, model),
        Eq | Ne | Lt | Le | Gt | Ge => apply_comparison(op, a, b, model),
        Add | Sub | Mul | Div | Mod | BitAnd | BitOr | BitXor => {
            apply_arithmetic(op, a, b, model)
        }
    }
}

/// Shifts skip the usual arithmetic conversions: only the left operand is
/// promoted and the result takes its type. The count must lie in
/// `0..width`.
fn apply_shift(
    op: BinOp,
    a: &CValue,
    b: &CValue,
    model: &IntegerModel,
) -> Result<CValue, NumericError> {
    if a.ty().is_float() {
        return Err(NumericError::UndefinedFor {
            op: op.symbol(),
            ty: *a.ty(),
        });
    }
    let count = match b.as_int() {
        Some(c) => c,
        None => {
            return Err(NumericError::UndefinedFor {
                op: op.symbol(),
                ty: *b.ty(),
            })
        }
    };
    let lt = integer_promotion(a.ty(), model);
    if count < 0 || count >= lt.bits as i128 {
        return Err(NumericError::InvalidShift {
            op: op.symbol(),
            count,
            bits: lt.bits,
        });
    }
    let x = int_of(a, &lt);
    let raw = match op {
        BinOp::Shl => x.wrapping_shl(count as u32),
        // Normalized values make this arithmetic for signed and logical
        // for unsigned automatically
        _ => x >> count,
    };
    Ok(CValue::int(lt, raw))
}

fn apply_comparison(
    op: BinOp,
    a: &CValue,
    b: &CValue,
    model: &IntegerModel,
) -> Result<CValue, NumericError> {
    use BinOp::*;
    let ct = usual_arithmetic_conversion(a.ty(), b.ty(), model);
    let outcome = if ct.is_float() {
        let x = float_of(a, &ct);
        let y = float_of(b, &ct);
        match op {
            Eq => x == y,
            Ne => x != y,
            Lt => x < y,
            Le => x <= y,
            Gt => x > y,
            _ => x >= y,
        }
    } else {
        // Both sides normalized to the same signedness, so i128 ordering
        // matches C ordering, including the unsigned reinterpretation of
        // negative operands
        let x = int_of(a, &ct);
        let y = int_of(b, &ct);
        match op {
            Eq => x == y,
            Ne => x != y,
            Lt => x < y,
            Le => x <= y,
            Gt => x > y,
            _ => x >= y,
        }
    };
    Ok(CValue::int(CType::int(model), outcome as i128))
}

fn apply_arithmetic(
    op: BinOp,
    a: &CValue,
    b: &CValue,
    model: &IntegerModel,
) -> Result<CValue, NumericError> {
    use BinOp::*;
    let ct = usual_arithmetic_conversion(a.ty(), b.ty(), model);

    if ct.is_float() {
        let x = float_of(a, &ct);
        let y = float_of(b, &ct);
        let r = match op {
            Add => x + y,
            Sub => x - y,
            Mul => x * y,
            // IEEE semantics: float division by zero is infinity, not an
            // error
            Div => x / y,
            Mod | BitAnd | BitOr | BitXor => {
                return Err(NumericError::UndefinedFor {
                    op: op.symbol(),
                    ty: ct,
                })
            }
            _ => 0.0,
        };
        return Ok(CValue::float(ct, r));
    }

    let x = int_of(a, &ct);
    let y = int_of(b, &ct);
    let raw = match op {
        Add => x.wrapping_add(y),
        Sub => x.wrapping_sub(y),
        Mul => x.wrapping_mul(y),
        Div => {
            if y == 0 {
                return Err(NumericError::DivisionByZero);
            }
            x / y
        }
        Mod => {
            if y == 0 {
                return Err(NumericError::DivisionByZero);
            }
            // i128 remainder truncates toward zero, same as C
            x % y
        }
        BitAnd => x & y,
        BitOr => x | y,
        BitXor => x ^ y,
        _ => 0,
    };
    Ok(CValue::int(ct, raw))
}

/// Apply a prefix operator with C semantics.
pub fn apply_unary(
    op: UnOp,
    a: &CValue,
    model: &IntegerModel,
) -> Result<CValue, NumericError> {
    match op {
        UnOp::Plus => {
            let pt = integer_promotion(a.ty(), model);
            Ok(convert_to_type(a, &pt))
        }
        UnOp::Neg => {
            if let Some(f) = a.as_float() {
                return Ok(CValue::float(*a.ty(), -f));
            }
            let pt = integer_promotion(a.ty(), model);
            Ok(CValue::int(pt, int_of(a, &pt).wrapping_neg()))
        }
        UnOp::Not => Ok(CValue::int(
            CType::int(model),
            (!a.is_truthy()) as i128,
        )),
        UnOp::BitNot => {
            if a.ty().is_float() {
                return Err(NumericError::UndefinedFor {
                    op: "~",
                    ty: *a.ty(),
                });
            }
            let pt = integer_promotion(a.ty(), model);
            Ok(CValue::int(pt, !int_of(a, &pt)))
        }
        UnOp::Deref | UnOp::AddrOf => Err(NumericError::UndefinedFor {
            op: op.symbol(),
            ty: *a.ty(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const M: IntegerModel = IntegerModel::ILP32;

    fn int(v: i128) -> CValue {
        CValue::int(CType::int(&M), v)
    }

    fn uint(v: i128) -> CValue {
        CValue::int(CType::unsigned_int(&M), v)
    }

    fn f64v(v: f64) -> CValue {
        CValue::float(CType::float64(), v)
    }

    #[test]
    fn test_promotion() {
        assert_eq!(
            integer_promotion(&CType::signed_char(), &M),
            CType::int(&M)
        );
        assert_eq!(
            integer_promotion(&CType::unsigned_short(), &M),
            CType::int(&M)
        );
        assert_eq!(
            integer_promotion(&CType::unsigned_int(&M), &M),
            CType::unsigned_int(&M)
        );
        assert_eq!(integer_promotion(&CType::bool_(), &M), CType::int(&M));
    }

    #[test]
    fn test_uac_mixed_sign() {
        let t = usual_arithmetic_conversion(
            &CType::int(&M),
            &CType::unsigned_int(&M),
            &M,
        );
        assert_eq!(t, CType::unsigned_int(&M));
        // 64-bit signed absorbs 32-bit unsigned
        let t = usual_arithmetic_conversion(
            &CType::long_long(&M),
            &CType::unsigned_int(&M),
            &M,
        );
        assert_eq!(t, CType::long_long(&M));
    }

    #[test]
    fn test_uac_floats() {
        let t = usual_arithmetic_conversion(
            &CType::float32(),
            &CType::int(&M),
            &M,
        );
        assert_eq!(t, CType::float32());
        let t = usual_arithmetic_conversion(
            &CType::float32(),
            &CType::float64(),
            &M,
        );
        assert_eq!(t, CType::float64());
    }

    #[test]
    fn test_modulo() {
        let r = apply_binary(BinOp::Mod, &int(5), &int(2), &M).unwrap();
        assert_eq!(r.as_int(), Some(1));
        let r = apply_binary(BinOp::Mod, &int(-5), &int(2), &M).unwrap();
        assert_eq!(r.as_int(), Some(-1));
    }

    #[test]
    fn test_division_by_zero() {
        let e = apply_binary(BinOp::Div, &int(1), &int(0), &M).unwrap_err();
        assert_eq!(e.to_string(), "Division by zero");
        let e = apply_binary(BinOp::Mod, &int(1), &int(0), &M).unwrap_err();
        assert_eq!(e.to_string(), "Division by zero");
        // Float division by zero is IEEE infinity
        let r = apply_binary(BinOp::Div, &f64v(1.0), &f64v(0.0), &M).unwrap();
        assert_eq!(r.as_float(), Some(f64::INFINITY));
    }

    #[test]
    fn test_shift_errors() {
        let e = apply_binary(BinOp::Shl, &int(1), &int(32), &M).unwrap_err();
        assert!(e.to_string().contains("Invalid <<"));
        let e = apply_binary(BinOp::Shr, &int(1), &int(-1), &M).unwrap_err();
        assert!(e.to_string().contains("Invalid >>"));
    }

    #[test]
    fn test_shift_takes_promoted_left_type() {
        // u8 promotes to int, so a count of 10 is fine
        let v = CValue::int(CType::unsigned_char(), 1);
        let r = apply_binary(BinOp::Shl, &v, &int(10), &M).unwrap();
        assert_eq!(r.as_int(), Some(1024));
        assert_eq!(*r.ty(), CType::int(&M));
        // 64-bit left operand allows counts up to 63
        let big = CValue::int(CType::unsigned_long_long(&M), 1);
        let r = apply_binary(BinOp::Shl, &big, &int(63), &M).unwrap();
        assert_eq!(r.unsigned_bits(), 1u128 << 63);
    }

    #[test]
    fn test_signed_shift_is_arithmetic() {
        let r = apply_binary(BinOp::Shr, &int(-8), &int(1), &M).unwrap();
        assert_eq!(r.as_int(), Some(-4));
        let r = apply_binary(BinOp::Shr, &uint(0x8000_0000), &int(31), &M)
            .unwrap();
        assert_eq!(r.as_int(), Some(1));
    }

    #[test]
    fn test_unsigned_comparison_reinterprets() {
        // -1 < 1u is false in C: -1 converts to UINT_MAX
        let r = apply_binary(BinOp::Lt, &int(-1), &uint(1), &M).unwrap();
        assert_eq!(r.as_int(), Some(0));
        assert_eq!(*r.ty(), CType::int(&M));
    }

    #[test]
    fn test_wraparound() {
        let r = apply_binary(BinOp::Add, &int(i32::MAX as i128), &int(1), &M)
            .unwrap();
        assert_eq!(r.as_int(), Some(i32::MIN as i128));
        // Unsigned 64-bit multiply keeps exact low bits
        let big = CValue::int(CType::unsigned_long_long(&M), u64::MAX as i128);
        let r = apply_binary(BinOp::Mul, &big, &big, &M).unwrap();
        assert_eq!(r.unsigned_bits(), 1);
    }

    #[test]
    fn test_float_modulo_rejected() {
        let e = apply_binary(BinOp::Mod, &f64v(5.0), &f64v(2.0), &M)
            .unwrap_err();
        assert!(e.to_string().contains("undefined"));
        let e = apply_binary(BinOp::BitAnd, &f64v(1.0), &int(1), &M)
            .unwrap_err();
        assert!(matches!(e, NumericError::UndefinedFor { .. }));
    }

    #[test]
    fn test_unary() {
        let r = apply_unary(UnOp::Neg, &CValue::int(CType::signed_char(), 5), &M)
            .unwrap();
        assert_eq!(r.as_int(), Some(-5));
        assert_eq!(*r.ty(), CType::int(&M));
        let r = apply_unary(UnOp::BitNot, &CValue::int(CType::unsigned_char(), 200), &M)
            .unwrap();
        // ~ applies after promotion to int
        assert_eq!(r.as_int(), Some(-201));
        let r = apply_unary(UnOp::Not, &f64v(0.0), &M).unwrap();
        assert_eq!(r.as_int(), Some(1));
        assert!(apply_unary(UnOp::BitNot, &f64v(1.0), &M).is_err());
    }

    #[test]
    fn test_logical_ops_yield_int() {
        let r = apply_binary(BinOp::And, &int(2), &int(3), &M).unwrap();
        assert_eq!(r.as_int(), Some(1));
        let r = apply_binary(BinOp::Or, &int(0), &f64v(0.0), &M).unwrap();
        assert_eq!(r.as_int(), Some(0));
        assert_eq!(*r.ty(), CType::int(&M));
    }
}
