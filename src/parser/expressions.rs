//! Expression grammar
//!
//! Recursive descent over the C operator ladder, one method per precedence
//! level, from the comma operator down to primaries. On top of the C core
//! the grammar adds the descriptor-specific forms: `Name:member` colon
//! paths, intrinsic calls, and pseudo-members resolved later by the
//! evaluator.
//!
//! All methods are `impl Parser` extensions; shared state and helpers live
//! in [`crate::parser::parse`].

use crate::numeric::{
    char_literal_value, decode_quoted, parse_numeric_literal, BinOp, UnOp,
};
use crate::parser::ast::{AstNode, Intrinsic, NodeKind, UpdateOp};
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{token_desc, Parser};

/// Maps an assignment token to its compound operator; `None` inside the
/// `Some` means plain `=`.
fn assign_op(text: &str) -> Option<Option<BinOp>> {
    let op = match text {
        "=" => None,
        "+=" => Some(BinOp::Add),
        "-=" => Some(BinOp::Sub),
        "*=" => Some(BinOp::Mul),
        "/=" => Some(BinOp::Div),
        "%=" => Some(BinOp::Mod),
        "<<=" => Some(BinOp::Shl),
        ">>=" => Some(BinOp::Shr),
        "&=" => Some(BinOp::BitAnd),
        "|=" => Some(BinOp::BitOr),
        "^=" => Some(BinOp::BitXor),
        _ => return None,
    };
    Some(op)
}

impl Parser {
    /// Comma operator, the lowest precedence level.
    pub(crate) fn parse_expr(&mut self) -> AstNode {
        let mut left = self.parse_assign();
        while self.eat_punct(",") {
            let right = self.parse_assign();
            let span = left.span.to(right.span);
            left = self.node(
                span,
                NodeKind::Comma {
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        left
    }

    /// Assignment, right-associative. Also the grammar level used for call
    /// arguments, where the comma must stay a separator.
    pub(crate) fn parse_assign(&mut self) -> AstNode {
        let target = self.parse_ternary();
        if self.current.kind != TokenKind::Punct {
            return target;
        }
        let op = match assign_op(&self.current.text) {
            Some(op) => op,
            None => return target,
        };
        self.bump();
        if !target.is_assignable() && !target.is_error() {
            self.error(target.span, "left side of assignment is not assignable");
        }
        self.forget_symbol(&target);
        let value = self.parse_assign();
        let span = target.span.to(value.span);
        self.node(
            span,
            NodeKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
        )
    }

    /// `cond ? a : b`. Colon paths are suppressed in the true branch so its
    /// closing `:` stays with the conditional.
    fn parse_ternary(&mut self) -> AstNode {
        let cond = self.parse_logical_or();
        if !self.eat_punct("?") {
            return cond;
        }
        let saved = std::mem::replace(&mut self.colon_ok, false);
        let then_branch = self.parse_assign();
        self.colon_ok = saved;
        let else_branch = if self.expect_punct(":", "in conditional expression") {
            self.parse_assign()
        } else {
            let at = self.current.span;
            self.error_node(at)
        };
        let span = cond.span.to(else_branch.span);
        self.node(
            span,
            NodeKind::Conditional {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
        )
    }

    fn binary(&mut self, op: BinOp, left: AstNode, right: AstNode) -> AstNode {
        let span = left.span.to(right.span);
        self.node(
            span,
            NodeKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        )
    }

    fn parse_logical_or(&mut self) -> AstNode {
        let mut left = self.parse_logical_and();
        while self.eat_punct("||") {
            let right = self.parse_logical_and();
            left = self.binary(BinOp::Or, left, right);
        }
        left
    }

    fn parse_logical_and(&mut self) -> AstNode {
        let mut left = self.parse_bit_or();
        while self.eat_punct("&&") {
            let right = self.parse_bit_or();
            left = self.binary(BinOp::And, left, right);
        }
        left
    }

    fn parse_bit_or(&mut self) -> AstNode {
        let mut left = self.parse_bit_xor();
        while self.eat_punct("|") {
            let right = self.parse_bit_xor();
            left = self.binary(BinOp::BitOr, left, right);
        }
        left
    }

    fn parse_bit_xor(&mut self) -> AstNode {
        let mut left = self.parse_bit_and();
        while self.eat_punct("^") {
            let right = self.parse_bit_and();
            left = self.binary(BinOp::BitXor, left, right);
        }
        left
    }

    fn parse_bit_and(&mut self) -> AstNode {
        let mut left = self.parse_equality();
        while self.eat_punct("&") {
            let right = self.parse_equality();
            left = self.binary(BinOp::BitAnd, left, right);
        }
        left
    }

    fn parse_equality(&mut self) -> AstNode {
        let mut left = self.parse_relational();
        loop {
            let op = if self.at_punct("==") {
                BinOp::Eq
            } else if self.at_punct("!=") {
                BinOp::Ne
            } else {
                break;
            };
            self.bump();
            let right = self.parse_relational();
            left = self.binary(op, left, right);
        }
        left
    }

    fn parse_relational(&mut self) -> AstNode {
        let mut left = self.parse_shift();
        loop {
            let op = if self.at_punct("<") {
                BinOp::Lt
            } else if self.at_punct("<=") {
                BinOp::Le
            } else if self.at_punct(">") {
                BinOp::Gt
            } else if self.at_punct(">=") {
                BinOp::Ge
            } else {
                break;
            };
            self.bump();
            let right = self.parse_shift();
            left = self.binary(op, left, right);
        }
        left
    }

    fn parse_shift(&mut self) -> AstNode {
        let mut left = self.parse_additive();
        loop {
            let op = if self.at_punct("<<") {
                BinOp::Shl
            } else if self.at_punct(">>") {
                BinOp::Shr
            } else {
                break;
            };
            self.bump();
            let right = self.parse_additive();
            left = self.binary(op, left, right);
        }
        left
    }

    fn parse_additive(&mut self) -> AstNode {
        let mut left = self.parse_multiplicative();
        loop {
            let op = if self.at_punct("+") {
                BinOp::Add
            } else if self.at_punct("-") {
                BinOp::Sub
            } else {
                break;
            };
            self.bump();
            let right = self.parse_multiplicative();
            left = self.binary(op, left, right);
        }
        left
    }

    fn parse_multiplicative(&mut self) -> AstNode {
        let mut left = self.parse_cast();
        loop {
            let op = if self.at_punct("*") {
                BinOp::Mul
            } else if self.at_punct("/") {
                BinOp::Div
            } else if self.at_punct("%") {
                BinOp::Mod
            } else {
                break;
            };
            self.bump();
            let right = self.parse_cast();
            left = self.binary(op, left, right);
        }
        left
    }

    /// `(type)expr`, resolved by speculation: try a type name after `(`,
    /// rewind to a parenthesized expression when that fails.
    fn parse_cast(&mut self) -> AstNode {
        if self.at_punct("(") {
            let open = self.current.span;
            let m = self.mark();
            self.bump();
            if let Some(ty) = self.try_parse_type_name() {
                if self.eat_punct(")") {
                    let operand = self.parse_cast();
                    let span = open.to(operand.span);
                    return self.node(
                        span,
                        NodeKind::Cast {
                            ty,
                            operand: Box::new(operand),
                        },
                    );
                }
            }
            self.rewind(m);
        }
        self.parse_unary()
    }

    fn parse_unary(&mut self) -> AstNode {
        if self.at_punct("++") || self.at_punct("--") {
            let op = if self.at_punct("++") {
                UpdateOp::Inc
            } else {
                UpdateOp::Dec
            };
            let op_span = self.current.span;
            self.bump();
            let target = self.parse_unary();
            if !target.is_assignable() && !target.is_error() {
                self.error(
                    target.span,
                    format!("operand of '{}' is not assignable", op.symbol()),
                );
            }
            self.forget_symbol(&target);
            let span = op_span.to(target.span);
            return self.node(
                span,
                NodeKind::Update {
                    op,
                    prefix: true,
                    target: Box::new(target),
                },
            );
        }

        for (punct, op) in [
            ("+", UnOp::Plus),
            ("-", UnOp::Neg),
            ("!", UnOp::Not),
            ("~", UnOp::BitNot),
            ("*", UnOp::Deref),
            ("&", UnOp::AddrOf),
        ] {
            if self.at_punct(punct) {
                let op_span = self.current.span;
                self.bump();
                let operand = self.parse_cast();
                let span = op_span.to(operand.span);
                return self.node(
                    span,
                    NodeKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                );
            }
        }

        if self.current.kind == TokenKind::Ident
            && matches!(self.current.text.as_str(), "sizeof" | "alignof" | "_Alignof")
        {
            return self.parse_sizeof_like();
        }

        self.parse_postfix()
    }

    /// `sizeof` and `alignof`, over either a parenthesized type name or an
    /// operand expression.
    fn parse_sizeof_like(&mut self) -> AstNode {
        let kw = self.bump();
        let alignof = kw.text != "sizeof";
        if self.at_punct("(") {
            let m = self.mark();
            self.bump();
            if let Some(ty) = self.try_parse_type_name() {
                if self.eat_punct(")") {
                    let span = kw.span.to(self.prev_span);
                    let kind = if alignof {
                        NodeKind::AlignofType { ty }
                    } else {
                        NodeKind::SizeofType { ty }
                    };
                    return self.node(span, kind);
                }
            }
            self.rewind(m);
        }
        let operand = self.parse_unary();
        let span = kw.span.to(operand.span);
        let kind = if alignof {
            NodeKind::AlignofExpr {
                operand: Box::new(operand),
            }
        } else {
            NodeKind::SizeofExpr {
                operand: Box::new(operand),
            }
        };
        self.node(span, kind)
    }

    fn parse_postfix(&mut self) -> AstNode {
        let mut expr = self.parse_primary();
        loop {
            if self.at_punct("[") {
                self.bump();
                let saved = std::mem::replace(&mut self.colon_ok, true);
                let index = self.parse_expr();
                self.colon_ok = saved;
                self.expect_punct("]", "after index expression");
                let span = expr.span.to(self.prev_span);
                expr = self.node(
                    span,
                    NodeKind::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                    },
                );
            } else if self.at_punct(".") || self.at_punct("->") {
                let arrow = self.at_punct("->");
                self.bump();
                if self.current.kind != TokenKind::Ident {
                    let span = self.current.span;
                    let found = token_desc(&self.current);
                    self.error(
                        span,
                        format!(
                            "expected member name after '{}', found {}",
                            if arrow { "->" } else { "." },
                            found
                        ),
                    );
                    break;
                }
                let name = self.bump();
                let span = expr.span.to(name.span);
                expr = self.node(
                    span,
                    NodeKind::Member {
                        base: Box::new(expr),
                        name: name.text,
                        arrow,
                    },
                );
            } else if self.at_punct("(") {
                expr = self.parse_call(expr);
            } else if self.at_punct("++") || self.at_punct("--") {
                let op = if self.at_punct("++") {
                    UpdateOp::Inc
                } else {
                    UpdateOp::Dec
                };
                let op_span = self.current.span;
                self.bump();
                if !expr.is_assignable() && !expr.is_error() {
                    self.error(
                        expr.span,
                        format!("operand of '{}' is not assignable", op.symbol()),
                    );
                }
                self.forget_symbol(&expr);
                let span = expr.span.to(op_span);
                expr = self.node(
                    span,
                    NodeKind::Update {
                        op,
                        prefix: false,
                        target: Box::new(expr),
                    },
                );
            } else if self.colon_ok && self.at_punct(":") {
                if !matches!(
                    expr.kind,
                    NodeKind::Ident(_) | NodeKind::ColonPath { .. }
                ) {
                    break;
                }
                // Only commit when an identifier follows the colon, so a
                // stray `:` elsewhere still surfaces as trailing input.
                let m = self.mark();
                self.bump();
                if self.current.kind != TokenKind::Ident {
                    self.rewind(m);
                    break;
                }
                let seg = self.bump();
                let span = expr.span.to(seg.span);
                let id = expr.id;
                let kind = std::mem::replace(&mut expr.kind, NodeKind::Error);
                let segments = match kind {
                    NodeKind::Ident(head) => {
                        self.symbols.remove(&head);
                        vec![head, seg.text]
                    }
                    NodeKind::ColonPath { mut segments } => {
                        segments.push(seg.text);
                        segments
                    }
                    other => {
                        expr.kind = other;
                        break;
                    }
                };
                expr = AstNode::new(id, span, NodeKind::ColonPath { segments });
            } else {
                break;
            }
        }
        expr
    }

    /// One argument of a name-taking intrinsic: a type name when one fills
    /// the argument exactly (so `__size_of(unsigned long)` parses), else an
    /// ordinary expression.
    fn parse_name_arg(&mut self) -> AstNode {
        let start = self.current.span;
        let m = self.mark();
        if let Some(ty) = self.try_parse_type_name() {
            if self.at_punct(",") || self.at_punct(")") {
                let span = start.to(self.prev_span);
                return self.node(span, NodeKind::TypeName { ty });
            }
            self.rewind(m);
        }
        self.parse_assign()
    }

    /// Converts `name(args)` into an intrinsic or a plain call node. The
    /// callee must be a bare identifier.
    fn parse_call(&mut self, callee: AstNode) -> AstNode {
        let intr = match &callee.kind {
            NodeKind::Ident(name) => Intrinsic::lookup(name),
            _ => None,
        };
        let names = intr.map(|i| i.takes_names()).unwrap_or(false);
        self.bump();
        let mut args = Vec::new();
        if !self.at_punct(")") && !self.at_eof() {
            loop {
                let saved = std::mem::replace(&mut self.colon_ok, true);
                let arg = if names {
                    self.parse_name_arg()
                } else {
                    self.parse_assign()
                };
                self.colon_ok = saved;
                args.push(arg);
                if !self.eat_punct(",") {
                    break;
                }
            }
        }
        self.expect_punct(")", "after call arguments");
        let span = callee.span.to(self.prev_span);

        let name = match &callee.kind {
            NodeKind::Ident(name) => name.clone(),
            _ => {
                self.error(callee.span, "call target must be a plain name");
                return self.error_node(span);
            }
        };

        match intr {
            Some(intr) => {
                let (lo, hi) = intr.arg_range();
                if args.len() < lo {
                    self.error(
                        span,
                        format!("{} expects at least {} argument(s)", name, lo),
                    );
                } else if args.len() > hi {
                    self.error(
                        span,
                        format!("{} expects at most {} argument(s)", name, hi),
                    );
                }
                if intr.takes_names() {
                    for arg in &args {
                        self.forget_symbol(arg);
                    }
                }
                self.node(span, NodeKind::Intrinsic { intr, args })
            }
            None => {
                self.forget_symbol(&callee);
                self.node(span, NodeKind::Call { callee: name, args })
            }
        }
    }

    fn parse_primary(&mut self) -> AstNode {
        match self.current.kind {
            TokenKind::Number => {
                let tok = self.bump();
                match parse_numeric_literal(&tok.text, &self.model) {
                    Ok(value) => self.literal_node(tok.span, value),
                    Err(e) => {
                        self.error(tok.span, e.message);
                        self.error_node(tok.span)
                    }
                }
            }
            TokenKind::Str => {
                let tok = self.bump();
                if tok.text.starts_with('\'') {
                    match char_literal_value(&tok.text, &self.model) {
                        Ok((value, warn)) => {
                            if let Some(w) = warn {
                                self.warning(tok.span, w);
                            }
                            self.literal_node(tok.span, value)
                        }
                        Err(e) => {
                            self.error(tok.span, e.message);
                            self.error_node(tok.span)
                        }
                    }
                } else {
                    match decode_quoted(&tok.text) {
                        Ok(text) => self.node(tok.span, NodeKind::Str(text)),
                        Err(e) => {
                            self.error(tok.span, e.message);
                            self.error_node(tok.span)
                        }
                    }
                }
            }
            TokenKind::Ident => {
                let tok = self.bump();
                if Intrinsic::lookup(&tok.text).is_none() {
                    self.symbols.insert(tok.text.clone());
                }
                self.node(tok.span, NodeKind::Ident(tok.text))
            }
            TokenKind::Punct if self.at_punct("(") => {
                self.bump();
                let saved = std::mem::replace(&mut self.colon_ok, true);
                let inner = self.parse_expr();
                self.colon_ok = saved;
                self.expect_punct(")", "after parenthesized expression");
                inner
            }
            TokenKind::Eof => {
                let span = self.current.span;
                self.error(span, "expected expression, found end of input");
                self.error_node(span)
            }
            _ => {
                let tok = self.bump();
                let found = token_desc(&tok);
                self.error(tok.span, format!("expected expression, found {}", found));
                self.error_node(tok.span)
            }
        }
    }
}
