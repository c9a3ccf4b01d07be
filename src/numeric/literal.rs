//! Numeric and quoted literal decoding
//!
//! Raw token text arrives here exactly as scanned, suffixes and all. Numeric
//! literals pick the smallest type that fits under the active
//! [`IntegerModel`], following the C rules: decimal literals consider signed
//! types only (unless a `u` suffix appears), while hex, binary, and octal
//! literals may fall to the unsigned type of the same rank.

use super::model::IntegerModel;
use super::value::{CType, CValue};
use std::fmt;

/// Literal decoding failure. The parser turns this into an error diagnostic
/// on the literal's span.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralError {
    pub message: String,
}

impl LiteralError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for LiteralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for LiteralError {}

/// Integer rank requested by a suffix.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Rank {
    Int,
    Long,
    LongLong,
    /// The `i64` suffix: exactly 64 bits regardless of model.
    Exact64,
}

/// Decode a numeric literal into a typed value.
///
/// Underscore separators are allowed anywhere between characters. Radix
/// prefixes `0x`, `0b`, and `0o` are recognized; everything else is decimal.
/// Hex literals with a `.` or a `p` exponent are hexadecimal floats.
pub fn parse_numeric_literal(
    raw: &str,
    model: &IntegerModel,
) -> Result<CValue, LiteralError> {
    let text: String = raw
        .chars()
        .filter(|&c| c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if text.is_empty() {
        return Err(LiteralError::new("empty numeric literal"));
    }

    if let Some(body) = text.strip_prefix("0x") {
        parse_radix_literal(body, 16, model)
    } else if let Some(body) = text.strip_prefix("0b") {
        parse_radix_literal(body, 2, model)
    } else if let Some(body) = text.strip_prefix("0o") {
        parse_radix_literal(body, 8, model)
    } else {
        parse_decimal_literal(&text, model)
    }
}

fn is_digit_in(c: char, radix: u32) -> bool {
    c.is_digit(radix)
}

/// Hex, binary, and octal literals. Only hex has a float form.
fn parse_radix_literal(
    body: &str,
    radix: u32,
    model: &IntegerModel,
) -> Result<CValue, LiteralError> {
    let chars: Vec<char> = body.chars().collect();
    let mut i = 0;

    let int_start = i;
    while i < chars.len() && is_digit_in(chars[i], radix) {
        i += 1;
    }
    let int_digits: String = chars[int_start..i].iter().collect();

    let mut frac_digits = String::new();
    let mut has_dot = false;
    if radix == 16 && i < chars.len() && chars[i] == '.' {
        has_dot = true;
        i += 1;
        while i < chars.len() && is_digit_in(chars[i], 16) {
            frac_digits.push(chars[i]);
            i += 1;
        }
    }

    let mut exponent: Option<i32> = None;
    if radix == 16 && i < chars.len() && chars[i] == 'p' {
        i += 1;
        let mut exp_text = String::new();
        if i < chars.len() && (chars[i] == '+' || chars[i] == '-') {
            exp_text.push(chars[i]);
            i += 1;
        }
        while i < chars.len() && chars[i].is_ascii_digit() {
            exp_text.push(chars[i]);
            i += 1;
        }
        if exp_text.is_empty() || exp_text.ends_with(['+', '-']) {
            return Err(LiteralError::new("exponent has no digits"));
        }
        let e: i32 = exp_text
            .parse()
            .map_err(|_| LiteralError::new("exponent out of range"))?;
        exponent = Some(e);
    }

    let suffix: String = chars[i..].iter().collect();

    if int_digits.is_empty() && frac_digits.is_empty() {
        return Err(LiteralError::new("missing digits after base prefix"));
    }

    if has_dot || exponent.is_some() {
        let exp = match exponent {
            Some(e) => e,
            None => {
                return Err(LiteralError::new(
                    "hexadecimal floating literal requires a 'p' exponent",
                ))
            }
        };
        let mut mantissa = 0.0f64;
        for c in int_digits.chars() {
            mantissa = mantissa * 16.0 + c.to_digit(16).unwrap_or(0) as f64;
        }
        let mut scale = 1.0 / 16.0;
        for c in frac_digits.chars() {
            mantissa += c.to_digit(16).unwrap_or(0) as f64 * scale;
            scale /= 16.0;
        }
        let value = mantissa * 2f64.powi(exp);
        return float_with_suffix(value, &suffix);
    }

    let magnitude = parse_magnitude(&int_digits, radix)?;
    let (unsigned, rank) = parse_int_suffix(&suffix)?;
    select_integer_type(magnitude, unsigned, rank, false, model)
}

/// Decimal literals, integer or floating.
fn parse_decimal_literal(
    text: &str,
    model: &IntegerModel,
) -> Result<CValue, LiteralError> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    let mut is_float = false;

    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i < chars.len() && chars[i] == '.' {
        is_float = true;
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < chars.len() && chars[i] == 'e' {
        let mut j = i + 1;
        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            is_float = true;
            i = j;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
        } else {
            return Err(LiteralError::new("exponent has no digits"));
        }
    }

    let number: String = chars[..i].iter().collect();
    let suffix: String = chars[i..].iter().collect();
    if number.is_empty() {
        return Err(LiteralError::new("empty numeric literal"));
    }

    // A bare f suffix turns a decimal literal into a float
    if is_float || suffix == "f" {
        let value: f64 = number
            .parse()
            .map_err(|_| LiteralError::new("invalid floating literal"))?;
        return float_with_suffix(value, &suffix);
    }

    let magnitude = parse_magnitude(&number, 10)?;
    let (unsigned, rank) = parse_int_suffix(&suffix)?;
    select_integer_type(magnitude, unsigned, rank, true, model)
}

fn parse_magnitude(digits: &str, radix: u32) -> Result<u128, LiteralError> {
    let v = u128::from_str_radix(digits, radix)
        .map_err(|_| LiteralError::new("numeric literal out of range"))?;
    if v > u64::MAX as u128 {
        return Err(LiteralError::new("numeric literal out of range"));
    }
    Ok(v)
}

fn parse_int_suffix(suffix: &str) -> Result<(bool, Rank), LiteralError> {
    let out = match suffix {
        "" => (false, Rank::Int),
        "u" => (true, Rank::Int),
        "l" => (false, Rank::Long),
        "ul" | "lu" => (true, Rank::Long),
        "ll" => (false, Rank::LongLong),
        "ull" | "llu" => (true, Rank::LongLong),
        "i64" => (false, Rank::Exact64),
        "ui64" => (true, Rank::Exact64),
        _ => {
            return Err(LiteralError::new(format!(
                "invalid numeric literal suffix '{}'",
                suffix
            )))
        }
    };
    Ok(out)
}

fn float_with_suffix(value: f64, suffix: &str) -> Result<CValue, LiteralError> {
    match suffix {
        "f" => Ok(CValue::float(CType::float32(), value)),
        "" | "l" => Ok(CValue::float(CType::float64(), value)),
        _ => Err(LiteralError::new(format!(
            "invalid floating literal suffix '{}'",
            suffix
        ))),
    }
}

#[inline]
fn fits_signed(v: u128, bits: u32) -> bool {
    v <= (1u128 << (bits - 1)) - 1
}

#[inline]
fn fits_unsigned(v: u128, bits: u32) -> bool {
    v <= (1u128 << bits) - 1
}

/// Smallest-type selection. `decimal` restricts the unsuffixed search to
/// signed types, per the C rules for base-10 literals.
fn select_integer_type(
    magnitude: u128,
    unsigned: bool,
    rank: Rank,
    decimal: bool,
    model: &IntegerModel,
) -> Result<CValue, LiteralError> {
    if rank == Rank::Exact64 {
        let ty = if unsigned {
            CType::unsigned_bits(64)
        } else {
            CType::signed_bits(64)
        };
        // The constructor wraps values above i64::MAX into the negative range
        return Ok(CValue::int(ty, magnitude as i128));
    }

    let ranks: &[(CType, CType)] = &[
        (CType::int(model), CType::unsigned_int(model)),
        (CType::long(model), CType::unsigned_long(model)),
        (CType::long_long(model), CType::unsigned_long_long(model)),
    ];
    let start = match rank {
        Rank::Int => 0,
        Rank::Long => 1,
        _ => 2,
    };

    for (signed_ty, unsigned_ty) in &ranks[start..] {
        if unsigned {
            if fits_unsigned(magnitude, unsigned_ty.bits) {
                return Ok(CValue::int(*unsigned_ty, magnitude as i128));
            }
        } else {
            if fits_signed(magnitude, signed_ty.bits) {
                return Ok(CValue::int(*signed_ty, magnitude as i128));
            }
            if !decimal && fits_unsigned(magnitude, unsigned_ty.bits) {
                return Ok(CValue::int(*unsigned_ty, magnitude as i128));
            }
        }
    }
    Err(LiteralError::new("numeric literal out of range"))
}

/// Decode the text of a quoted token (quotes included) into its value.
///
/// Recognized escapes: `\n \r \t \b \f \v \\ \" \'`, octal `\0nn`, hex
/// `\xNN`, and unicode `\uNNNN` or `\u{N...}`.
pub fn decode_quoted(raw: &str) -> Result<String, LiteralError> {
    let chars: Vec<char> = raw.chars().collect();
    let quote = match chars.first() {
        Some(&q @ ('"' | '\'')) => q,
        _ => return Err(LiteralError::new("malformed quoted literal")),
    };
    let what = if quote == '"' { "string" } else { "character" };

    let mut out = String::new();
    let mut i = 1;
    let mut closed = false;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if c == quote {
            closed = true;
            break;
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let esc = match chars.get(i) {
            Some(&e) => e,
            None => break,
        };
        i += 1;
        match esc {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000c}'),
            'v' => out.push('\u{000b}'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '0'..='7' => {
                let mut code = esc.to_digit(8).unwrap_or(0);
                let mut taken = 1;
                while taken < 3 {
                    match chars.get(i).and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            i += 1;
                            taken += 1;
                        }
                        None => break,
                    }
                }
                match char::from_u32(code) {
                    Some(c) => out.push(c),
                    None => {
                        return Err(LiteralError::new("invalid octal escape"))
                    }
                }
            }
            'x' => {
                let hi = chars.get(i).and_then(|c| c.to_digit(16));
                let lo = chars.get(i + 1).and_then(|c| c.to_digit(16));
                match (hi, lo) {
                    (Some(h), Some(l)) => {
                        i += 2;
                        // Always valid, the code is at most 0xff
                        if let Some(c) = char::from_u32(h * 16 + l) {
                            out.push(c);
                        }
                    }
                    _ => {
                        return Err(LiteralError::new(
                            "\\x escape requires two hex digits",
                        ))
                    }
                }
            }
            'u' => {
                let code = if chars.get(i) == Some(&'{') {
                    i += 1;
                    let mut code = 0u32;
                    let mut digits = 0;
                    while let Some(d) = chars.get(i).and_then(|c| c.to_digit(16))
                    {
                        code = code.saturating_mul(16).saturating_add(d);
                        i += 1;
                        digits += 1;
                    }
                    if digits == 0 || digits > 6 || chars.get(i) != Some(&'}') {
                        return Err(LiteralError::new(
                            "malformed \\u{...} escape",
                        ));
                    }
                    i += 1;
                    code
                } else {
                    let mut code = 0u32;
                    for k in 0..4 {
                        match chars.get(i + k).and_then(|c| c.to_digit(16)) {
                            Some(d) => code = code * 16 + d,
                            None => {
                                return Err(LiteralError::new(
                                    "\\u escape requires four hex digits",
                                ))
                            }
                        }
                    }
                    i += 4;
                    code
                };
                match char::from_u32(code) {
                    Some(c) => out.push(c),
                    None => {
                        return Err(LiteralError::new(
                            "invalid unicode escape",
                        ))
                    }
                }
            }
            other => {
                return Err(LiteralError::new(format!(
                    "unknown escape sequence \\{}",
                    other
                )))
            }
        }
    }

    if !closed {
        return Err(LiteralError::new(format!(
            "unterminated {} literal",
            what
        )));
    }
    Ok(out)
}

/// Decode a character literal token into an `int` value holding the code
/// point. Returns a warning message when extra characters were dropped.
pub fn char_literal_value(
    raw: &str,
    model: &IntegerModel,
) -> Result<(CValue, Option<String>), LiteralError> {
    let decoded = decode_quoted(raw)?;
    let mut chars = decoded.chars();
    let first = chars
        .next()
        .ok_or_else(|| LiteralError::new("empty character literal"))?;
    let warning = if chars.next().is_some() {
        Some("character literal has more than one character".to_string())
    } else {
        None
    };
    Ok((CValue::int(CType::int(model), first as i128), warning))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::value::ScalarKind;

    const M32: IntegerModel = IntegerModel::ILP32;
    const M64: IntegerModel = IntegerModel::LP64;

    #[test]
    fn test_plain_decimal() {
        let v = parse_numeric_literal("42", &M32).unwrap();
        assert_eq!(v.as_int(), Some(42));
        assert_eq!(v.ty().to_string(), "int");
    }

    #[test]
    fn test_underscores() {
        let v = parse_numeric_literal("1_000_000", &M32).unwrap();
        assert_eq!(v.as_int(), Some(1_000_000));
    }

    #[test]
    fn test_radix_prefixes() {
        assert_eq!(
            parse_numeric_literal("0xff", &M32).unwrap().as_int(),
            Some(255)
        );
        assert_eq!(
            parse_numeric_literal("0b1010", &M32).unwrap().as_int(),
            Some(10)
        );
        assert_eq!(
            parse_numeric_literal("0o17", &M32).unwrap().as_int(),
            Some(15)
        );
    }

    #[test]
    fn test_hex_float() {
        let v = parse_numeric_literal("0x1.2p-3", &M32).unwrap();
        assert_eq!(v.as_float(), Some(0.140625));
        assert_eq!(v.ty().to_string(), "double");
        let w = parse_numeric_literal("0x10p0", &M32).unwrap();
        assert_eq!(w.as_float(), Some(16.0));
    }

    #[test]
    fn test_hex_float_needs_exponent() {
        assert!(parse_numeric_literal("0x1.2", &M32).is_err());
    }

    #[test]
    fn test_exact64_suffix() {
        let v = parse_numeric_literal("123i64", &M32).unwrap();
        assert_eq!(v.as_int(), Some(123));
        assert_eq!(v.ty().bits, 64);
        assert_eq!(v.ty().kind, ScalarKind::Signed);
        // Same result under LP64
        let w = parse_numeric_literal("123i64", &M64).unwrap();
        assert_eq!(w.ty().bits, 64);
    }

    #[test]
    fn test_unsigned_suffixes() {
        let v = parse_numeric_literal("5u", &M32).unwrap();
        assert_eq!(v.ty().to_string(), "unsigned int");
        let w = parse_numeric_literal("5ull", &M32).unwrap();
        assert_eq!(w.ty().to_string(), "unsigned long long");
        assert_eq!(w.ty().bits, 64);
        let x = parse_numeric_literal("5lu", &M64).unwrap();
        assert_eq!(x.ty().bits, 64);
    }

    #[test]
    fn test_hex_falls_to_unsigned() {
        // Does not fit int32 signed, fits uint32
        let v = parse_numeric_literal("0x80000000", &M32).unwrap();
        assert_eq!(v.ty().to_string(), "unsigned int");
        assert_eq!(v.as_int(), Some(0x8000_0000));
    }

    #[test]
    fn test_decimal_stays_signed() {
        // 3 billion: skips unsigned int, lands in signed long long on ILP32
        let v = parse_numeric_literal("3000000000", &M32).unwrap();
        assert_eq!(v.ty().to_string(), "long long");
        // and in signed long on LP64
        let w = parse_numeric_literal("3000000000", &M64).unwrap();
        assert_eq!(w.ty().to_string(), "long");
    }

    #[test]
    fn test_decimal_out_of_range() {
        // Above i64::MAX with no u suffix
        assert!(parse_numeric_literal("9223372036854775808", &M32).is_err());
        let ok = parse_numeric_literal("9223372036854775808u", &M32).unwrap();
        assert_eq!(ok.ty().to_string(), "unsigned long long");
    }

    #[test]
    fn test_float_forms() {
        assert_eq!(
            parse_numeric_literal("1.5", &M32).unwrap().as_float(),
            Some(1.5)
        );
        assert_eq!(
            parse_numeric_literal("2e3", &M32).unwrap().as_float(),
            Some(2000.0)
        );
        let f = parse_numeric_literal("1.5f", &M32).unwrap();
        assert_eq!(f.ty().to_string(), "float");
    }

    #[test]
    fn test_bad_suffix() {
        assert!(parse_numeric_literal("1q", &M32).is_err());
        assert!(parse_numeric_literal("1uu", &M32).is_err());
    }

    #[test]
    fn test_decode_escapes() {
        assert_eq!(decode_quoted(r#""a\nb""#).unwrap(), "a\nb");
        assert_eq!(decode_quoted(r#""\x41\x42""#).unwrap(), "AB");
        assert_eq!(decode_quoted(r#""A""#).unwrap(), "A");
        assert_eq!(decode_quoted(r#""\u{1F600}""#).unwrap(), "\u{1F600}");
        assert_eq!(decode_quoted(r#""\012""#).unwrap(), "\n");
        assert_eq!(decode_quoted(r#""\"""#).unwrap(), "\"");
    }

    #[test]
    fn test_decode_errors() {
        assert!(decode_quoted(r#""\q""#).is_err());
        assert!(decode_quoted(r#""\x4""#).is_err());
        assert!(decode_quoted(r#""abc"#).is_err());
    }

    #[test]
    fn test_char_literal() {
        let (v, warn) = char_literal_value("'A'", &M32).unwrap();
        assert_eq!(v.as_int(), Some(65));
        assert!(warn.is_none());
        let (v, warn) = char_literal_value("'ab'", &M32).unwrap();
        assert_eq!(v.as_int(), Some(97));
        assert!(warn.is_some());
        assert!(char_literal_value("''", &M32).is_err());
        let (nl, _) = char_literal_value(r"'\n'", &M32).unwrap();
        assert_eq!(nl.as_int(), Some(10));
    }
}
