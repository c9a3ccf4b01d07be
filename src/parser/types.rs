//! Type name recognition
//!
//! Casts and `sizeof` need to know whether a parenthesized fragment names a
//! type. The scan here is speculative and silent: it consumes type words and
//! reports the resolved [`CType`] or rewinds and reports nothing, leaving
//! diagnostics to whichever interpretation the caller commits to.
//!
//! Recognized spellings are the C multi-word combinations (`unsigned long`,
//! `long long int`, `signed char`, ...), the `<stdint.h>` fixed-width names,
//! `size_t` and `ptrdiff_t`, and any of those followed by `*`.

use crate::numeric::{CType, IntegerModel};
use crate::parser::lexer::TokenKind;
use crate::parser::parse::Parser;

/// Parses `name` as a complete type name, e.g. for intrinsic arguments that
/// name a type. Trailing input disqualifies.
pub fn type_from_name(name: &str, model: &IntegerModel) -> Option<CType> {
    let mut parser = Parser::new(name, *model);
    let ty = parser.try_parse_type_name()?;
    parser.at_eof().then_some(ty)
}

#[derive(Default)]
struct TypeWords {
    signed: bool,
    unsigned: bool,
    longs: u32,
    short: bool,
    base: Option<&'static str>,
    fixed: Option<CType>,
}

impl TypeWords {
    /// Folds one word in; `false` means the word is no type word (stop
    /// scanning) and `true` means it was consumed. Contradictory
    /// combinations are deferred to [`TypeWords::resolve`].
    fn take(&mut self, word: &str, model: &IntegerModel) -> bool {
        match word {
            "signed" => self.signed = true,
            "unsigned" => self.unsigned = true,
            "long" => self.longs += 1,
            "short" => self.short = true,
            "int" => return self.set_base("int"),
            "char" => return self.set_base("char"),
            "float" => return self.set_base("float"),
            "double" => return self.set_base("double"),
            "void" => return self.set_base("void"),
            "bool" | "_Bool" => return self.set_base("bool"),
            "int8_t" => return self.set_fixed(CType::signed_bits(8)),
            "int16_t" => return self.set_fixed(CType::signed_bits(16)),
            "int32_t" => return self.set_fixed(CType::signed_bits(32)),
            "int64_t" => return self.set_fixed(CType::signed_bits(64)),
            "uint8_t" => return self.set_fixed(CType::unsigned_bits(8)),
            "uint16_t" => return self.set_fixed(CType::unsigned_bits(16)),
            "uint32_t" => return self.set_fixed(CType::unsigned_bits(32)),
            "uint64_t" => return self.set_fixed(CType::unsigned_bits(64)),
            "size_t" => return self.set_fixed(CType::size_t(model)),
            "ptrdiff_t" => return self.set_fixed(CType::ptrdiff_t(model)),
            _ => return false,
        }
        true
    }

    fn set_base(&mut self, base: &'static str) -> bool {
        if self.base.is_some() || self.fixed.is_some() {
            // Doubled base word; let resolve() reject the combination.
            self.base = Some("");
            return true;
        }
        self.base = Some(base);
        true
    }

    fn set_fixed(&mut self, ty: CType) -> bool {
        if self.base.is_some() || self.fixed.is_some() {
            self.base = Some("");
            return true;
        }
        self.fixed = Some(ty);
        true
    }

    fn any(&self) -> bool {
        self.signed
            || self.unsigned
            || self.longs > 0
            || self.short
            || self.base.is_some()
            || self.fixed.is_some()
    }

    /// Resolves the collected words into a type. `pointer` is whether one
    /// or more `*` followed.
    fn resolve(self, pointer: bool, model: &IntegerModel) -> Option<CType> {
        if pointer {
            // All object pointers share the model's pointer width; the
            // words before '*' only need to form a valid combination.
            // `void` names no value type but is the usual pointee.
            if self.base == Some("void") {
                let clean =
                    !self.signed && !self.unsigned && self.longs == 0 && !self.short;
                return clean.then_some(CType::pointer(model));
            }
            self.resolve(false, model)?;
            return Some(CType::pointer(model));
        }
        if self.signed && self.unsigned {
            return None;
        }
        if let Some(ty) = self.fixed {
            let plain = !self.signed && !self.unsigned && self.longs == 0 && !self.short;
            return (plain && self.base.is_none()).then_some(ty);
        }
        let modifiers = self.signed || self.unsigned || self.longs > 0 || self.short;
        match self.base {
            Some("float") => (!modifiers).then_some(CType::float32()),
            Some("double") => {
                // "long double" maps onto the same 64-bit float.
                let ok = !self.signed && !self.unsigned && !self.short && self.longs <= 1;
                ok.then_some(CType::float64())
            }
            Some("bool") => (!modifiers).then_some(CType::bool_()),
            Some("void") => None,
            Some("char") => {
                if self.longs > 0 || self.short {
                    return None;
                }
                Some(if self.unsigned {
                    CType::unsigned_char()
                } else {
                    CType::signed_char()
                })
            }
            Some("int") | None => {
                if self.base.is_none() && !modifiers {
                    return None;
                }
                if self.short && self.longs > 0 {
                    return None;
                }
                let ty = match (self.short, self.longs) {
                    (true, _) => {
                        if self.unsigned {
                            CType::unsigned_short()
                        } else {
                            CType::short()
                        }
                    }
                    (false, 0) => {
                        if self.unsigned {
                            CType::unsigned_int(model)
                        } else {
                            CType::int(model)
                        }
                    }
                    (false, 1) => {
                        if self.unsigned {
                            CType::unsigned_long(model)
                        } else {
                            CType::long(model)
                        }
                    }
                    (false, 2) => {
                        if self.unsigned {
                            CType::unsigned_long_long(model)
                        } else {
                            CType::long_long(model)
                        }
                    }
                    _ => return None,
                };
                Some(ty)
            }
            Some(_) => None,
        }
    }
}

impl Parser {
    /// Tries to read a type name at the current position. On success the
    /// words (and any `*`) are consumed; otherwise the position is restored
    /// and no diagnostic is issued.
    pub(crate) fn try_parse_type_name(&mut self) -> Option<CType> {
        let m = self.mark();
        let mut words = TypeWords::default();
        let model = self.model;
        while self.current.kind == TokenKind::Ident {
            if !words.take(&self.current.text, &model) {
                break;
            }
            self.bump();
        }
        if !words.any() {
            self.rewind(m);
            return None;
        }
        let mut pointer = false;
        while self.eat_punct("*") {
            pointer = true;
        }
        match words.resolve(pointer, &model) {
            Some(ty) => Some(ty),
            None => {
                self.rewind(m);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::ScalarKind;

    fn ty(name: &str) -> Option<CType> {
        type_from_name(name, &IntegerModel::ILP32)
    }

    #[test]
    fn test_plain_combinations() {
        assert_eq!(ty("int"), Some(CType::int(&IntegerModel::ILP32)));
        assert_eq!(ty("unsigned"), Some(CType::unsigned_int(&IntegerModel::ILP32)));
        assert_eq!(ty("signed"), Some(CType::int(&IntegerModel::ILP32)));
        assert_eq!(ty("long long int"), Some(CType::long_long(&IntegerModel::ILP32)));
        assert_eq!(ty("unsigned long"), Some(CType::unsigned_long(&IntegerModel::ILP32)));
        assert_eq!(ty("short int"), Some(CType::short()));
        assert_eq!(ty("unsigned char"), Some(CType::unsigned_char()));
        assert_eq!(ty("char"), Some(CType::signed_char()));
    }

    #[test]
    fn test_floats_and_bool() {
        assert_eq!(ty("float"), Some(CType::float32()));
        assert_eq!(ty("double"), Some(CType::float64()));
        assert_eq!(ty("long double"), Some(CType::float64()));
        assert_eq!(ty("bool"), Some(CType::bool_()));
        assert_eq!(ty("_Bool"), Some(CType::bool_()));
    }

    #[test]
    fn test_fixed_width() {
        assert_eq!(ty("uint16_t"), Some(CType::unsigned_bits(16)));
        assert_eq!(ty("int64_t"), Some(CType::signed_bits(64)));
        assert_eq!(ty("size_t"), Some(CType::size_t(&IntegerModel::ILP32)));
        // No modifiers on fixed-width names.
        assert_eq!(ty("unsigned int8_t"), None);
    }

    #[test]
    fn test_pointers() {
        let p = ty("void *");
        assert_eq!(p, Some(CType::pointer(&IntegerModel::ILP32)));
        assert_eq!(p.as_ref().map(|t| t.kind), Some(ScalarKind::Pointer));
        assert_eq!(ty("unsigned char **"), Some(CType::pointer(&IntegerModel::ILP32)));
        // Bare void is not a value type here.
        assert_eq!(ty("void"), None);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(ty("signed unsigned"), None);
        assert_eq!(ty("short long"), None);
        assert_eq!(ty("long long long"), None);
        assert_eq!(ty("long char"), None);
        assert_eq!(ty("unsigned float"), None);
        assert_eq!(ty("int int"), None);
        assert_eq!(ty("x"), None);
        // Trailing input disqualifies the whole name.
        assert_eq!(ty("int x"), None);
    }

    #[test]
    fn test_model_widths() {
        let lp64 = IntegerModel::LP64;
        assert_eq!(type_from_name("long", &lp64), Some(CType::long(&lp64)));
        assert_eq!(type_from_name("long", &lp64).map(|t| t.bits), Some(64));
        assert_eq!(ty("long").map(|t| t.bits), Some(32));
    }
}
