//! # Introduction
//!
//! viewexpr parses and evaluates the C-like expression language embedded
//! in device view descriptors: the strings a debugger front end attaches
//! to peripheral registers, memory-mapped structures, and status lines.
//! Expressions read and write target memory through a pluggable
//! asynchronous host, never through this crate directly.
//!
//! ## Evaluation pipeline
//!
//! ```text
//! Text → Lexer → Parser → AST → Fold → Evaluator ⇄ Host
//! ```
//!
//! 1. [`parser`]: tokenises the text and builds an AST. Parsing never
//!    fails; malformed input degrades to error nodes plus diagnostics.
//! 2. [`numeric`]: the C numeric engine with integer models, typed
//!    values, literal decoding, and exact C promotion and overflow rules.
//! 3. [`fold`]: constant folding over the AST with the same numeric
//!    engine the evaluator uses, so folding can never change a result.
//! 4. [`eval`]: async tree-walking evaluation against an [`ExprHost`],
//!    with reference containers, caches, and printf rendering.
//! 5. [`cache`]: a parse cache keyed by text, integer model, and
//!    printf flag.
//!
//! ## Expression surface
//!
//! The full C operator ladder (assignment and compound assignment,
//! ternary, logical, bitwise, shifts, arithmetic), casts, `sizeof` and
//! `alignof`, member and index chains, colon paths (`Timer:load`), the
//! pseudo members `_count`/`_addr`, double-underscore intrinsics, and a
//! printf sub-language (`"v=%x[1+2]"`).

pub mod cache;
pub mod diag;
pub mod eval;
pub mod fold;
pub mod numeric;
pub mod parser;

pub use cache::ParseCache;
pub use diag::{Diagnostic, Severity, Span};
pub use eval::{
    EvalError, Evaluation, Evaluator, ExprHost, HostNodeId, IntrinsicArg,
    IntrinsicOutcome, NullHost, RefContainer,
};
pub use numeric::{CType, CValue, IntegerModel};
pub use parser::{
    looks_like_printf, AstNode, Intrinsic, NodeKind, ParseResult, PrintfPiece,
    UpdateOp,
};

/// Parses and folds one descriptor expression.
///
/// `printf` forces format-string treatment; without it the text is still
/// routed to the printf grammar when it contains `%%` or a `%spec[`
/// segment. Entity escapes left over from XML descriptor attributes
/// (`&amp;`, `&lt;`, ...) are decoded first, with a warning noting the
/// leakage.
pub fn parse(text: &str, model: IntegerModel, printf: bool) -> ParseResult {
    let decoded = parser::decode_entities(text);
    let source: &str = decoded.as_deref().unwrap_or(text);
    let mut parsed = if printf || parser::looks_like_printf(source) {
        parser::parse_printf(source, model)
    } else {
        parser::Parser::new(source, model).parse_root()
    };
    if decoded.is_some() {
        parsed.diagnostics.push(Diagnostic::warning(
            "entity escapes decoded in expression text",
            Span::new(0, text.chars().count()),
        ));
    }
    fold::fold_result(&mut parsed, &model);
    parsed
}
