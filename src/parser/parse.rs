//! Parser state and shared infrastructure
//!
//! This module provides the [`Parser`] struct and the helpers the grammar
//! rules are built from. The rules themselves live in sibling modules as
//! additional `impl Parser` blocks:
//! - `expressions`: the precedence ladder from comma down to primary
//! - `types`: speculative type-name recognition for casts and sizeof
//!
//! # Error handling
//!
//! Parsing never fails outright. Problems are appended to the diagnostic
//! list and an error node takes the place of whatever could not be parsed,
//! so a tree always comes back and the evaluator can still work the parts
//! that are sound.
//!
//! # Speculation
//!
//! `(x)` can open a cast or a parenthesized expression, and `sizeof(T)` can
//! name a type or an expression. The parser resolves both by marking the
//! lexer position, trying the type interpretation, and rewinding when it
//! does not pan out. [`Parser::mark`] and [`Parser::rewind`] carry that.

use crate::diag::{Diagnostic, Span};
use crate::numeric::{CValue, IntegerModel};
use crate::parser::ast::{AstNode, NodeId, NodeKind, ParseResult};
use crate::parser::lexer::{Lexer, Token, TokenKind};
use rustc_hash::FxHashSet;
use tracing::trace;

/// Replaces the XML character entities that show up when descriptor text is
/// copied straight out of a view file. Returns `None` when the text contains
/// none of them.
pub(crate) fn decode_entities(src: &str) -> Option<String> {
    if !src.contains('&') {
        return None;
    }
    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    let mut replaced = false;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let mut matched = None;
        for (entity, ch) in [
            ("&amp;", '&'),
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&quot;", '"'),
            ("&apos;", '\''),
        ] {
            if rest.starts_with(entity) {
                matched = Some((entity.len(), ch));
                break;
            }
        }
        match matched {
            Some((len, ch)) => {
                out.push(ch);
                rest = &rest[len..];
                replaced = true;
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    replaced.then_some(out)
}

/// Saved lexer position for speculative parsing.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mark {
    index: usize,
    prev_span: Span,
}

/// Recursive descent parser for one descriptor expression.
pub struct Parser {
    pub(crate) lexer: Lexer,
    /// One-token lookahead.
    pub(crate) current: Token,
    /// Lexer index where `current` was scanned from; rewind target.
    current_start: usize,
    /// Span of the last consumed token.
    pub(crate) prev_span: Span,
    pub(crate) model: IntegerModel,
    pub(crate) diags: Vec<Diagnostic>,
    pub(crate) symbols: FxHashSet<String>,
    pub(crate) next_id: NodeId,
    /// Whether a bare `Name:member` colon path may start here. Cleared
    /// inside the true branch of `?:`, restored inside brackets and parens.
    pub(crate) colon_ok: bool,
    /// Added to every token span; nonzero only for printf sub-expressions.
    span_offset: usize,
}

impl Parser {
    pub fn new(source: &str, model: IntegerModel) -> Self {
        Self::new_sub(source, model, 0, 0)
    }

    /// Parser over an embedded fragment: node ids continue from `first_id`
    /// and spans are shifted by `span_offset` into the enclosing text.
    pub(crate) fn new_sub(
        source: &str,
        model: IntegerModel,
        first_id: NodeId,
        span_offset: usize,
    ) -> Self {
        let mut parser = Self {
            lexer: Lexer::new(source),
            current: Token {
                kind: TokenKind::Eof,
                text: String::new(),
                span: Span::point(0),
            },
            current_start: 0,
            prev_span: Span::point(0),
            model,
            diags: Vec::new(),
            symbols: FxHashSet::default(),
            next_id: first_id,
            colon_ok: true,
            span_offset,
        };
        parser.fill();
        parser
    }

    /// Parses the whole input as a single expression. Leftover tokens are
    /// reported but the tree up to them is kept.
    ///
    /// This is the raw grammar entry; [`crate::parse`] layers entity
    /// decoding, printf detection, and constant folding on top.
    pub fn parse_root(mut self) -> ParseResult {
        let root = self.parse_root_expr();
        trace!(
            nodes = self.next_id,
            diagnostics = self.diags.len(),
            "parse_root complete"
        );
        self.finish(root, false)
    }

    /// Expression plus trailing-input check; shared with the printf scanner
    /// which runs one parser per bracket body.
    pub(crate) fn parse_root_expr(&mut self) -> AstNode {
        let root = self.parse_expr();
        if !self.at_eof() {
            let span = self.current.span;
            self.warning(span, "trailing input after expression");
        }
        root
    }

    pub(crate) fn finish(self, root: AstNode, is_printf: bool) -> ParseResult {
        ParseResult::new(root, self.diags, self.symbols, is_printf, None)
    }

    // ===== Token plumbing =====

    /// Scans the next token into `current`, returning the one it replaces.
    fn fill(&mut self) -> Token {
        self.current_start = self.lexer.index();
        let mut next = self.lexer.next();
        next.span = next.span.offset(self.span_offset);
        std::mem::replace(&mut self.current, next)
    }

    /// Consumes and returns the current token.
    pub(crate) fn bump(&mut self) -> Token {
        self.prev_span = self.current.span;
        self.fill()
    }

    #[inline]
    pub(crate) fn at_eof(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    #[inline]
    pub(crate) fn at_punct(&self, p: &str) -> bool {
        self.current.is_punct(p)
    }

    /// Consumes the punctuation token if it is next.
    pub(crate) fn eat_punct(&mut self, p: &str) -> bool {
        if self.at_punct(p) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Like [`Parser::eat_punct`] but reports a diagnostic when the token
    /// is missing. Nothing is consumed on a miss so the caller can recover.
    pub(crate) fn expect_punct(&mut self, p: &str, ctx: &str) -> bool {
        if self.eat_punct(p) {
            return true;
        }
        let span = self.current.span;
        let found = token_desc(&self.current);
        self.error(span, format!("expected '{}' {}, found {}", p, ctx, found));
        false
    }

    pub(crate) fn mark(&self) -> Mark {
        Mark {
            index: self.current_start,
            prev_span: self.prev_span,
        }
    }

    pub(crate) fn rewind(&mut self, mark: Mark) {
        self.lexer.set_index(mark.index);
        self.prev_span = mark.prev_span;
        self.fill();
    }

    // ===== Node and diagnostic construction =====

    pub(crate) fn node(&mut self, span: Span, kind: NodeKind) -> AstNode {
        let id = self.next_id;
        self.next_id += 1;
        AstNode::new(id, span, kind)
    }

    pub(crate) fn literal_node(&mut self, span: Span, value: CValue) -> AstNode {
        let id = self.next_id;
        self.next_id += 1;
        AstNode::literal(id, span, value)
    }

    pub(crate) fn error_node(&mut self, span: Span) -> AstNode {
        let id = self.next_id;
        self.next_id += 1;
        AstNode::error(id, span)
    }

    pub(crate) fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diags.push(Diagnostic::error(message, span));
    }

    pub(crate) fn warning(&mut self, span: Span, message: impl Into<String>) {
        self.diags.push(Diagnostic::warning(message, span));
    }

    /// Drops an identifier from the referenced-symbol set. Applied to
    /// assignment and update targets, colon path heads, callees, and
    /// intrinsic name arguments, none of which the host should prefetch.
    pub(crate) fn forget_symbol(&mut self, node: &AstNode) {
        if let NodeKind::Ident(name) = &node.kind {
            self.symbols.remove(name);
        }
    }
}

/// Token rendering for diagnostics.
pub(crate) fn token_desc(tok: &Token) -> String {
    match tok.kind {
        TokenKind::Eof => "end of input".to_string(),
        _ => format!("'{}'", tok.text),
    }
}
