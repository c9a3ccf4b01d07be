//! Target integer model
//!
//! The width of `int`, `long`, `long long`, and pointers depends on the
//! debugged target, not on the machine running the debugger. Every literal,
//! promotion, and conversion takes the model as a parameter so one engine can
//! serve a 32-bit microcontroller and a 64-bit application core side by side.

/// Bit widths of the C integer types on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerModel {
    /// Width of `int` and `unsigned int`.
    pub int_bits: u32,
    /// Width of `long` and `unsigned long`.
    pub long_bits: u32,
    /// Width of `long long` and `unsigned long long`.
    pub long_long_bits: u32,
    /// Width of pointers, `size_t`, and `ptrdiff_t`.
    pub ptr_bits: u32,
}

impl IntegerModel {
    /// 32-bit targets: `int`, `long`, and pointers are 32-bit.
    pub const ILP32: IntegerModel = IntegerModel {
        int_bits: 32,
        long_bits: 32,
        long_long_bits: 64,
        ptr_bits: 32,
    };

    /// 64-bit targets: `long` and pointers widen to 64-bit.
    pub const LP64: IntegerModel = IntegerModel {
        int_bits: 32,
        long_bits: 64,
        long_long_bits: 64,
        ptr_bits: 64,
    };
}

impl Default for IntegerModel {
    /// Embedded targets are the common case, so ILP32 is the default.
    fn default() -> Self {
        IntegerModel::ILP32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_models() {
        assert_eq!(IntegerModel::ILP32.long_bits, 32);
        assert_eq!(IntegerModel::LP64.long_bits, 64);
        assert_eq!(IntegerModel::ILP32.long_long_bits, 64);
        assert_eq!(IntegerModel::default(), IntegerModel::ILP32);
        assert_ne!(IntegerModel::ILP32, IntegerModel::LP64);
    }
}
