// Property tests for the C numeric layer

use std::rc::Rc;

use futures::executor::block_on;
use proptest::prelude::*;

use viewexpr::numeric::{apply_binary, convert_to_type, parse_numeric_literal, BinOp};
use viewexpr::parser::Parser;
use viewexpr::{parse, CType, CValue, Evaluator, IntegerModel, NullHost};

const M: IntegerModel = IntegerModel::ILP32;

fn width() -> impl Strategy<Value = u32> {
    prop::sample::select(vec![8u32, 16, 32, 64])
}

proptest! {
    #[test]
    fn conversion_to_same_type_is_idempotent(
        v in any::<i64>(),
        bits in width(),
        signed in any::<bool>(),
    ) {
        let ty = if signed {
            CType::signed_bits(bits)
        } else {
            CType::unsigned_bits(bits)
        };
        let once = convert_to_type(&CValue::int(CType::signed_bits(64), v as i128), &ty);
        let twice = convert_to_type(&once, &ty);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn converted_values_stay_in_range(v in any::<i64>(), bits in width()) {
        let start = CValue::int(CType::signed_bits(64), v as i128);

        let unsigned = convert_to_type(&start, &CType::unsigned_bits(bits));
        let raw = unsigned.as_int().unwrap();
        prop_assert!(raw >= 0);
        prop_assert!(raw < 1i128 << bits);

        let signed = convert_to_type(&start, &CType::signed_bits(bits));
        let raw = signed.as_int().unwrap();
        let half = 1i128 << (bits - 1);
        prop_assert!(raw >= -half && raw < half);
    }

    #[test]
    fn commutative_operators_commute(
        a in any::<i64>(),
        b in any::<i64>(),
        idx in 0usize..7,
    ) {
        let ops = [
            BinOp::Add,
            BinOp::Mul,
            BinOp::BitAnd,
            BinOp::BitOr,
            BinOp::BitXor,
            BinOp::Eq,
            BinOp::Ne,
        ];
        let x = CValue::int(CType::signed_bits(64), a as i128);
        let y = CValue::int(CType::signed_bits(64), b as i128);
        let ab = apply_binary(ops[idx], &x, &y, &M).unwrap();
        let ba = apply_binary(ops[idx], &y, &x, &M).unwrap();
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn hex_literal_value_survives_parsing(v in any::<u64>()) {
        let text = format!("0x{:x}", v);
        let parsed = parse_numeric_literal(&text, &M).unwrap();
        prop_assert_eq!(parsed.unsigned_bits(), v as u128);
        // Re-converting to its own type changes nothing
        prop_assert_eq!(convert_to_type(&parsed, parsed.ty()), parsed);
    }

    #[test]
    fn decimal_literal_value_survives_parsing(v in 0i64..=i64::MAX) {
        let parsed = parse_numeric_literal(&v.to_string(), &M).unwrap();
        prop_assert_eq!(parsed.as_int(), Some(v as i128));
    }

    #[test]
    fn folding_constants_matches_evaluation(
        a in -1000i32..1000,
        b in -1000i32..1000,
        c in 1i32..100,
    ) {
        let src = format!("({} + {}) * {} / {}", a, b, c, c);
        let unfolded = Parser::new(&src, M).parse_root();
        let folded = parse(&src, M, false);
        prop_assert!(folded.const_value.is_some());
        let mut ev = Evaluator::new(Rc::new(NullHost), M);
        let x = block_on(ev.evaluate(&unfolded));
        let y = block_on(ev.evaluate(&folded));
        prop_assert_eq!(x.value, y.value);
    }
}
