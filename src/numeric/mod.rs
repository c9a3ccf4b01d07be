//! The C numeric engine
//!
//! Everything about numbers lives here: the target [`IntegerModel`], typed
//! values ([`CValue`]/[`CType`]), literal decoding, and the operator
//! semantics ([`apply_binary`]/[`apply_unary`]) shared by the constant
//! folder and the evaluator. Using one implementation for both guarantees
//! that folding an expression and evaluating it produce the same number.

pub mod literal;
pub mod model;
pub mod ops;
pub mod value;

pub use literal::{char_literal_value, decode_quoted, parse_numeric_literal, LiteralError};
pub use model::IntegerModel;
pub use ops::{
    apply_binary, apply_unary, integer_promotion, usual_arithmetic_conversion,
    BinOp, NumericError, UnOp,
};
pub use value::{convert_to_type, CType, CValue, ScalarKind};
