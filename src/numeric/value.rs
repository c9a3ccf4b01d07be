//! C scalar types and values
//!
//! A [`CValue`] is a number tagged with a [`CType`]. The representation is a
//! 128-bit integer or an `f64`, but a value is always kept normalized to its
//! type's width: unsigned values are masked, signed values are masked and
//! sign-extended. Arithmetic elsewhere may momentarily leave the range, the
//! constructors here pull it back, so no caller ever observes an
//! out-of-range value.

use super::model::IntegerModel;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The five scalar categories the engine distinguishes.
///
/// Pointers carry no pointee type. They behave as unsigned integers of
/// pointer width; the host decides what dereferencing means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Signed,
    Unsigned,
    Float,
    Pointer,
}

/// A C scalar type: a kind plus a width in bits (8, 16, 32, or 64).
///
/// Two types compare equal when kind and width match. The optional display
/// name (`"long"`, `"size_t"`) is cosmetic and ignored by comparisons, so
/// `long` and `int` are the same type on an ILP32 target.
#[derive(Debug, Clone, Copy)]
pub struct CType {
    pub kind: ScalarKind,
    pub bits: u32,
    name: Option<&'static str>,
}

impl PartialEq for CType {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.bits == other.bits
    }
}

impl Eq for CType {}

impl Hash for CType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.bits.hash(state);
    }
}

impl CType {
    const fn named(kind: ScalarKind, bits: u32, name: &'static str) -> Self {
        Self {
            kind,
            bits,
            name: Some(name),
        }
    }

    /// Signed integer of the given width, spelled as a fixed-width type.
    pub fn signed_bits(bits: u32) -> Self {
        Self {
            kind: ScalarKind::Signed,
            bits,
            name: None,
        }
    }

    /// Unsigned integer of the given width, spelled as a fixed-width type.
    pub fn unsigned_bits(bits: u32) -> Self {
        Self {
            kind: ScalarKind::Unsigned,
            bits,
            name: None,
        }
    }

    pub fn bool_() -> Self {
        Self::named(ScalarKind::Bool, 8, "bool")
    }

    pub fn signed_char() -> Self {
        Self::named(ScalarKind::Signed, 8, "char")
    }

    pub fn unsigned_char() -> Self {
        Self::named(ScalarKind::Unsigned, 8, "unsigned char")
    }

    pub fn short() -> Self {
        Self::named(ScalarKind::Signed, 16, "short")
    }

    pub fn unsigned_short() -> Self {
        Self::named(ScalarKind::Unsigned, 16, "unsigned short")
    }

    pub fn int(model: &IntegerModel) -> Self {
        Self::named(ScalarKind::Signed, model.int_bits, "int")
    }

    pub fn unsigned_int(model: &IntegerModel) -> Self {
        Self::named(ScalarKind::Unsigned, model.int_bits, "unsigned int")
    }

    pub fn long(model: &IntegerModel) -> Self {
        Self::named(ScalarKind::Signed, model.long_bits, "long")
    }

    pub fn unsigned_long(model: &IntegerModel) -> Self {
        Self::named(ScalarKind::Unsigned, model.long_bits, "unsigned long")
    }

    pub fn long_long(model: &IntegerModel) -> Self {
        Self::named(ScalarKind::Signed, model.long_long_bits, "long long")
    }

    pub fn unsigned_long_long(model: &IntegerModel) -> Self {
        Self::named(ScalarKind::Unsigned, model.long_long_bits, "unsigned long long")
    }

    pub fn float32() -> Self {
        Self::named(ScalarKind::Float, 32, "float")
    }

    pub fn float64() -> Self {
        Self::named(ScalarKind::Float, 64, "double")
    }

    pub fn pointer(model: &IntegerModel) -> Self {
        Self {
            kind: ScalarKind::Pointer,
            bits: model.ptr_bits,
            name: None,
        }
    }

    pub fn size_t(model: &IntegerModel) -> Self {
        Self::named(ScalarKind::Unsigned, model.ptr_bits, "size_t")
    }

    pub fn ptrdiff_t(model: &IntegerModel) -> Self {
        Self::named(ScalarKind::Signed, model.ptr_bits, "ptrdiff_t")
    }

    #[inline]
    pub fn is_float(&self) -> bool {
        self.kind == ScalarKind::Float
    }

    /// True for every kind whose representation is an integer, including
    /// bool and pointers.
    #[inline]
    pub fn is_integer(&self) -> bool {
        !self.is_float()
    }

    #[inline]
    pub fn is_signed(&self) -> bool {
        self.kind == ScalarKind::Signed
    }

    /// Bytes occupied by a value of this type.
    #[inline]
    pub fn byte_width(&self) -> u32 {
        self.bits / 8
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.name {
            return write!(f, "{}", name);
        }
        match self.kind {
            ScalarKind::Bool => write!(f, "bool"),
            ScalarKind::Signed => write!(f, "int{}_t", self.bits),
            ScalarKind::Unsigned => write!(f, "uint{}_t", self.bits),
            ScalarKind::Float => write!(f, "float{}", self.bits),
            ScalarKind::Pointer => write!(f, "void*"),
        }
    }
}

/// Reduces `v` to a `bits`-wide integer: mask for unsigned, mask and
/// sign-extend for signed.
#[inline]
pub(crate) fn normalize_int(v: i128, bits: u32, signed: bool) -> i128 {
    let mask = (1i128 << bits) - 1;
    let m = v & mask;
    if signed && (m >> (bits - 1)) & 1 == 1 {
        m - (1i128 << bits)
    } else {
        m
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Repr {
    Int(i128),
    Float(f64),
}

/// A typed scalar value, always normalized to its type's range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CValue {
    ty: CType,
    repr: Repr,
}

impl CValue {
    /// Integer-kind value. `raw` may be out of range; it is normalized to
    /// the type's width here.
    pub fn int(ty: CType, raw: i128) -> Self {
        debug_assert!(ty.is_integer());
        let v = match ty.kind {
            ScalarKind::Bool => (raw != 0) as i128,
            _ => normalize_int(raw, ty.bits, ty.is_signed()),
        };
        Self {
            ty,
            repr: Repr::Int(v),
        }
    }

    /// Float-kind value. 32-bit targets round through `f32` so a `float`
    /// value never holds more precision than the target type can.
    pub fn float(ty: CType, raw: f64) -> Self {
        debug_assert!(ty.is_float());
        let v = if ty.bits == 32 { raw as f32 as f64 } else { raw };
        Self {
            ty,
            repr: Repr::Float(v),
        }
    }

    #[inline]
    pub fn ty(&self) -> &CType {
        &self.ty
    }

    /// The integer payload, if this is an integer-kind value.
    #[inline]
    pub fn as_int(&self) -> Option<i128> {
        match self.repr {
            Repr::Int(v) => Some(v),
            Repr::Float(_) => None,
        }
    }

    /// The float payload, if this is a float-kind value.
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self.repr {
            Repr::Float(v) => Some(v),
            Repr::Int(_) => None,
        }
    }

    /// Numeric view as `f64`, lossy for integers above 2^53.
    #[inline]
    pub fn to_f64(&self) -> f64 {
        match self.repr {
            Repr::Int(v) => v as f64,
            Repr::Float(v) => v,
        }
    }

    /// C truth test: nonzero is true. NaN compares unequal to zero, so NaN
    /// is true.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        match self.repr {
            Repr::Int(v) => v != 0,
            Repr::Float(v) => v != 0.0,
        }
    }

    /// True when the value is exactly the integer `n`, whether it is stored
    /// as an integer or a float. Used by the identity eliminations.
    pub fn is_exact(&self, n: i128) -> bool {
        match self.repr {
            Repr::Int(v) => v == n,
            Repr::Float(v) => v == n as f64 && v.fract() == 0.0,
        }
    }

    /// The value reinterpreted as unsigned bits of its own width.
    pub fn unsigned_bits(&self) -> u128 {
        match self.repr {
            Repr::Int(v) => normalize_int(v, self.ty.bits, false) as u128,
            Repr::Float(v) => float_to_int(v) as u128,
        }
    }
}

/// Truncates toward zero. NaN becomes 0 and out-of-range values saturate at
/// the i128 bounds before normalization, so the conversion is total.
#[inline]
pub(crate) fn float_to_int(v: f64) -> i128 {
    v.trunc() as i128
}

/// C conversion of `v` to `target`.
///
/// Float to integer truncates toward zero, integer to float rounds to the
/// nearest representable, bool collapses by the truth test, and integer to
/// integer renormalizes at the new width.
pub fn convert_to_type(v: &CValue, target: &CType) -> CValue {
    match (target.kind, v.repr) {
        (ScalarKind::Float, Repr::Float(f)) => CValue::float(*target, f),
        (ScalarKind::Float, Repr::Int(i)) => CValue::float(*target, i as f64),
        (ScalarKind::Bool, _) => CValue::int(*target, v.is_truthy() as i128),
        (_, Repr::Int(i)) => CValue::int(*target, i),
        (_, Repr::Float(f)) => CValue::int(*target, float_to_int(f)),
    }
}

impl fmt::Display for CValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ty.kind, self.repr) {
            (ScalarKind::Bool, Repr::Int(v)) => {
                write!(f, "{}", if v != 0 { "true" } else { "false" })
            }
            (ScalarKind::Pointer, Repr::Int(v)) => {
                write!(f, "0x{:x}", v as u64)
            }
            (ScalarKind::Unsigned, Repr::Int(v)) => write!(f, "{}", v as u128 as u64),
            (_, Repr::Int(v)) => write!(f, "{}", v),
            (_, Repr::Float(v)) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_unsigned_wrap() {
        assert_eq!(normalize_int(300, 8, false), 44);
        assert_eq!(normalize_int(-1, 8, false), 255);
        assert_eq!(normalize_int(1 << 32, 32, false), 0);
    }

    #[test]
    fn test_normalize_signed_wrap() {
        assert_eq!(normalize_int(200, 8, true), -56);
        assert_eq!(normalize_int(128, 8, true), -128);
        assert_eq!(normalize_int(127, 8, true), 127);
        assert_eq!(normalize_int(-129, 8, true), 127);
    }

    #[test]
    fn test_normalize_idempotent() {
        for v in [-300i128, -1, 0, 1, 127, 128, 255, 300] {
            let once = normalize_int(v, 8, true);
            assert_eq!(normalize_int(once, 8, true), once);
        }
    }

    #[test]
    fn test_value_constructors() {
        let m = IntegerModel::ILP32;
        let v = CValue::int(CType::unsigned_char(), 300);
        assert_eq!(v.as_int(), Some(44));
        let b = CValue::int(CType::bool_(), 7);
        assert_eq!(b.as_int(), Some(1));
        let f = CValue::float(CType::float32(), 0.1);
        // f32 rounding applied at construction
        assert_eq!(f.as_float(), Some(0.1f32 as f64));
        let i = CValue::int(CType::int(&m), -1);
        assert_eq!(i.as_int(), Some(-1));
    }

    #[test]
    fn test_convert_float_to_int_truncates() {
        let m = IntegerModel::ILP32;
        let v = CValue::float(CType::float64(), -2.9);
        let c = convert_to_type(&v, &CType::int(&m));
        assert_eq!(c.as_int(), Some(-2));
        let nan = CValue::float(CType::float64(), f64::NAN);
        assert_eq!(convert_to_type(&nan, &CType::int(&m)).as_int(), Some(0));
    }

    #[test]
    fn test_convert_narrowing() {
        let m = IntegerModel::ILP32;
        let v = CValue::int(CType::int(&m), 0x1_0000_002a);
        let c = convert_to_type(&v, &CType::unsigned_char());
        assert_eq!(c.as_int(), Some(42));
    }

    #[test]
    fn test_type_equality_ignores_name() {
        let m = IntegerModel::ILP32;
        // long and int are both signed 32-bit under ILP32
        assert_eq!(CType::long(&m), CType::int(&m));
        assert_ne!(CType::long(&IntegerModel::LP64), CType::int(&m));
        assert_ne!(CType::unsigned_int(&m), CType::int(&m));
    }

    #[test]
    fn test_display() {
        let m = IntegerModel::LP64;
        assert_eq!(CType::long(&m).to_string(), "long");
        assert_eq!(CType::unsigned_bits(16).to_string(), "uint16_t");
        assert_eq!(CValue::int(CType::bool_(), 1).to_string(), "true");
        assert_eq!(
            CValue::int(CType::pointer(&m), 0x2000_0000).to_string(),
            "0x20000000"
        );
        assert_eq!(
            CValue::int(CType::unsigned_int(&m), -1).to_string(),
            "4294967295"
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(CValue::float(CType::float64(), f64::NAN).is_truthy());
        assert!(!CValue::float(CType::float64(), 0.0).is_truthy());
        assert!(CValue::int(CType::signed_char(), -1).is_truthy());
    }
}
