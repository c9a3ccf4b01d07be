// Integration tests for constant folding through the public parse entry

use std::rc::Rc;

use futures::executor::block_on;

use viewexpr::numeric::BinOp;
use viewexpr::parser::Parser;
use viewexpr::{parse, Evaluator, IntegerModel, NodeKind, NullHost};

const M: IntegerModel = IntegerModel::ILP32;

#[test]
fn test_constant_value_table() {
    let cases: &[(&str, i128)] = &[
        ("1 + 2 * 3", 7),
        ("5 % 2", 1),
        ("(2 + 3) << 2", 20),
        ("7 > 3 ? 1 : 99", 1),
        ("'A' + 1", 66),
        ("~0", -1),
        ("!5", 0),
        ("1 == 1.0", 1),
        ("123i64", 123),
        ("sizeof(123i64)", 8),
        ("sizeof(int)", 4),
    ];
    for (src, expected) in cases {
        let parsed = parse(src, M, false);
        let cv = parsed
            .const_value
            .unwrap_or_else(|| panic!("{} did not fold", src));
        assert_eq!(cv.as_int(), Some(*expected), "{}", src);
    }
}

#[test]
fn test_hex_float_literal_value() {
    let parsed = parse("0x1.2p-3", M, false);
    let f = parsed.const_value.expect("constant").as_float().expect("float");
    assert!((f - 0.140625).abs() < 1e-12, "{}", f);
}

#[test]
fn test_division_by_zero_is_left_unfolded() {
    for src in ["1 / 0", "1 % 0", "100 / (3 - 3)"] {
        let parsed = parse(src, M, false);
        assert!(parsed.const_value.is_none(), "{} folded", src);
        assert!(!parsed.has_errors());
        assert!(
            parsed.diagnostics.iter().any(|d| d.message.contains("Division by zero")),
            "{}: {:?}",
            src,
            parsed.diagnostics
        );
    }
}

#[test]
fn test_invalid_shift_is_left_unfolded() {
    let parsed = parse("1 << 40", M, false);
    assert!(parsed.const_value.is_none());
    assert!(parsed.diagnostics.iter().any(|d| d.message.contains("Invalid <<")));

    let parsed = parse("1 >> -1", M, false);
    assert!(parsed.const_value.is_none());
    assert!(parsed.diagnostics.iter().any(|d| d.message.contains("Invalid >>")));
}

#[test]
fn test_identities_simplify_reference_expressions() {
    for src in ["x + 0", "0 + x", "x * 1", "x / 1", "x | 0", "x ^ 0", "x << 0", "x && 1", "x || 0"] {
        let parsed = parse(src, M, false);
        assert!(
            matches!(&parsed.root.kind, NodeKind::Ident(n) if n == "x"),
            "{} left {:?}",
            src,
            parsed.root.kind
        );
    }
}

#[test]
fn test_constant_tail_of_chain_merges() {
    let parsed = parse("x + 1 + 2", M, false);
    match &parsed.root.kind {
        NodeKind::Binary { op, left, right } => {
            assert_eq!(*op, BinOp::Add);
            assert!(matches!(&left.kind, NodeKind::Ident(n) if n == "x"));
            assert_eq!(right.cv.and_then(|c| c.as_int()), Some(3));
        }
        other => panic!("unexpected shape {:?}", other),
    }

    let parsed = parse("x * 2 * 3", M, false);
    match &parsed.root.kind {
        NodeKind::Binary { op, right, .. } => {
            assert_eq!(*op, BinOp::Mul);
            assert_eq!(right.cv.and_then(|c| c.as_int()), Some(6));
        }
        other => panic!("unexpected shape {:?}", other),
    }
}

#[test]
fn test_constant_condition_picks_branch() {
    let parsed = parse("1 ? x : y", M, false);
    assert!(matches!(&parsed.root.kind, NodeKind::Ident(n) if n == "x"));

    // The untaken side vanishes along with its side effect
    let parsed = parse("0 ? (x = 1) : 7", M, false);
    assert_eq!(parsed.const_value.and_then(|c| c.as_int()), Some(7));
}

#[test]
fn test_assignment_folds_value_but_keeps_node() {
    let parsed = parse("x = 1 + 2", M, false);
    assert!(parsed.const_value.is_none());
    match &parsed.root.kind {
        NodeKind::Assign { value, .. } => {
            assert_eq!(value.cv.and_then(|c| c.as_int()), Some(3));
        }
        other => panic!("unexpected shape {:?}", other),
    }
}

#[test]
fn test_printf_results_are_never_constant() {
    let parsed = parse("v=%d[1+2]", M, true);
    assert!(parsed.is_printf);
    assert!(parsed.const_value.is_none());
}

// Folding must never change what an expression evaluates to.
#[test]
fn test_folding_preserves_evaluation() {
    let sources = [
        "1 + 2 * 3",
        "10 / 4",
        "10.0 / 4",
        "7 % 3",
        "1 << 5 >> 2",
        "0x10 ^ 0b101",
        "5 > 2 ? 10 : 20",
        "!0 + !3",
        "~0xFF & 0xFFF",
        "(char)300",
        "(unsigned char)-1",
        "1.5 + 2",
        "'A' + 1",
        "-5 % 3",
        "2147483647 + 1",
        "3 == 3.0",
        "1 && 2 || 0",
        "(long long)1 << 40",
    ];
    let mut ev = Evaluator::new(Rc::new(NullHost), M);
    for src in sources {
        let unfolded = Parser::new(src, M).parse_root();
        let folded = parse(src, M, false);
        assert!(folded.const_value.is_some(), "{} did not fold", src);
        let a = block_on(ev.evaluate(&unfolded));
        let b = block_on(ev.evaluate(&folded));
        assert_eq!(a.value, b.value, "{} diverged", src);
    }
}
