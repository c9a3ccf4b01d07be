//! Descriptor expression parser
//!
//! Transforms one expression of descriptor text into a tree:
//! - [`lexer`]: tokenization (text → tokens)
//! - [`parse`]: parser state, diagnostics, error recovery
//! - [`expressions`]: the C operator ladder plus descriptor forms
//! - [`types`]: speculative type-name recognition for casts and `sizeof`
//! - [`printf`]: the `"text %spec[expr]"` format sub-language
//! - [`ast`]: tree definitions and the [`ast::ParseResult`] surface
//!
//! Hand-written recursive descent; parsing never fails, it degrades to
//! error nodes plus diagnostics.

pub mod ast;
pub mod expressions;
pub mod lexer;
pub mod parse;
pub mod printf;
pub mod types;

pub use ast::{
    AstNode, Intrinsic, NodeId, NodeKind, ParseResult, PrintfPiece, UpdateOp,
};
pub use parse::Parser;
pub use printf::looks_like_printf;
pub use types::type_from_name;

pub(crate) use parse::decode_entities;
pub(crate) use printf::parse_printf;
