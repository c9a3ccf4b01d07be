//! Constant folding
//!
//! `fold_tree` rewrites the tree bottom-up using the same numeric engine
//! the evaluator applies at runtime, so a folded constant and a live
//! evaluation cannot disagree. Operator nodes whose operands all carry
//! constants collapse into literals; one-sided identities drop the node
//! in favor of the live operand; the constant tail of a `+`/`-` or `*`
//! chain merges with a constant added by the parent operator. Assignments,
//! updates, and calls are never collapsed, though their operands still
//! fold. A folding attempt that hits an illegal operation records a
//! warning and leaves the node for the evaluator to report properly.

use crate::diag::{Diagnostic, Span};
use crate::numeric::{
    apply_binary, apply_unary, convert_to_type, BinOp, CType, CValue,
    IntegerModel, UnOp,
};
use crate::parser::{AstNode, NodeId, NodeKind, ParseResult, PrintfPiece};
use tracing::trace;

/// Folds a whole parse result in place, appending fold diagnostics and
/// recording the root constant when the expression reduced to one.
pub fn fold_result(parsed: &mut ParseResult, model: &IntegerModel) {
    let placeholder = AstNode::error(0, Span::point(0));
    let root = std::mem::replace(&mut parsed.root, placeholder);
    let mut diags = Vec::new();
    let folded = fold_tree(root, model, &mut diags);
    trace!(
        constant = folded.cv.is_some(),
        warnings = diags.len(),
        "fold_result complete"
    );
    parsed.diagnostics.append(&mut diags);
    parsed.const_value = if parsed.is_printf { None } else { folded.cv };
    parsed.root = folded;
}

/// Rewrites one subtree bottom-up.
pub fn fold_tree(
    node: AstNode,
    model: &IntegerModel,
    diags: &mut Vec<Diagnostic>,
) -> AstNode {
    let AstNode { id, span, cv, kind } = node;
    match kind {
        NodeKind::Binary { op, left, right } => {
            let left = fold_tree(*left, model, diags);
            let right = fold_tree(*right, model, diags);
            fold_binary(id, span, op, left, right, model, diags)
        }
        NodeKind::Unary { op, operand } => {
            let operand = fold_tree(*operand, model, diags);
            fold_unary(id, span, op, operand, model, diags)
        }
        NodeKind::Conditional {
            cond,
            then_branch,
            else_branch,
        } => {
            let cond = fold_tree(*cond, model, diags);
            if let Some(c) = cond.cv {
                // A constant test picks its branch outright; the untaken
                // side is dropped without being folded further.
                let chosen = if c.is_truthy() { *then_branch } else { *else_branch };
                return fold_tree(chosen, model, diags);
            }
            let then_branch = fold_tree(*then_branch, model, diags);
            let else_branch = fold_tree(*else_branch, model, diags);
            AstNode::new(
                id,
                span,
                NodeKind::Conditional {
                    cond: Box::new(cond),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                },
            )
        }
        NodeKind::Cast { ty, operand } => {
            let operand = fold_tree(*operand, model, diags);
            if let Some(v) = operand.cv {
                return AstNode::literal(id, span, convert_to_type(&v, &ty));
            }
            AstNode::new(
                id,
                span,
                NodeKind::Cast {
                    ty,
                    operand: Box::new(operand),
                },
            )
        }
        NodeKind::SizeofType { ty } | NodeKind::AlignofType { ty } => AstNode::literal(
            id,
            span,
            CValue::int(CType::size_t(model), ty.byte_width() as i128),
        ),
        NodeKind::SizeofExpr { operand } => {
            let operand = fold_tree(*operand, model, diags);
            if let Some(v) = operand.cv {
                return AstNode::literal(
                    id,
                    span,
                    CValue::int(CType::size_t(model), v.ty().byte_width() as i128),
                );
            }
            AstNode::new(
                id,
                span,
                NodeKind::SizeofExpr {
                    operand: Box::new(operand),
                },
            )
        }
        NodeKind::AlignofExpr { operand } => {
            let operand = fold_tree(*operand, model, diags);
            if let Some(v) = operand.cv {
                return AstNode::literal(
                    id,
                    span,
                    CValue::int(CType::size_t(model), v.ty().byte_width() as i128),
                );
            }
            AstNode::new(
                id,
                span,
                NodeKind::AlignofExpr {
                    operand: Box::new(operand),
                },
            )
        }
        NodeKind::Assign { op, target, value } => {
            let target = fold_tree(*target, model, diags);
            let value = fold_tree(*value, model, diags);
            AstNode::new(
                id,
                span,
                NodeKind::Assign {
                    op,
                    target: Box::new(target),
                    value: Box::new(value),
                },
            )
        }
        NodeKind::Update { op, prefix, target } => {
            let target = fold_tree(*target, model, diags);
            AstNode::new(
                id,
                span,
                NodeKind::Update {
                    op,
                    prefix,
                    target: Box::new(target),
                },
            )
        }
        NodeKind::Member { base, name, arrow } => {
            let base = fold_tree(*base, model, diags);
            AstNode::new(
                id,
                span,
                NodeKind::Member {
                    base: Box::new(base),
                    name,
                    arrow,
                },
            )
        }
        NodeKind::Index { base, index } => {
            let base = fold_tree(*base, model, diags);
            let index = fold_tree(*index, model, diags);
            AstNode::new(
                id,
                span,
                NodeKind::Index {
                    base: Box::new(base),
                    index: Box::new(index),
                },
            )
        }
        NodeKind::Call { callee, args } => {
            let args = args
                .into_iter()
                .map(|a| fold_tree(a, model, diags))
                .collect();
            AstNode::new(id, span, NodeKind::Call { callee, args })
        }
        NodeKind::Intrinsic { intr, args } => {
            let args = args
                .into_iter()
                .map(|a| fold_tree(a, model, diags))
                .collect();
            AstNode::new(id, span, NodeKind::Intrinsic { intr, args })
        }
        NodeKind::Comma { left, right } => {
            let left = fold_tree(*left, model, diags);
            let right = fold_tree(*right, model, diags);
            AstNode::new(
                id,
                span,
                NodeKind::Comma {
                    left: Box::new(left),
                    right: Box::new(right),
                },
            )
        }
        NodeKind::Printf { pieces } => {
            let pieces = pieces
                .into_iter()
                .map(|p| match p {
                    PrintfPiece::Text(t) => PrintfPiece::Text(t),
                    PrintfPiece::Arg { spec, expr } => PrintfPiece::Arg {
                        spec,
                        expr: fold_tree(expr, model, diags),
                    },
                })
                .collect();
            AstNode::new(id, span, NodeKind::Printf { pieces })
        }
        other => AstNode {
            id,
            span,
            cv,
            kind: other,
        },
    }
}

fn fold_unary(
    id: NodeId,
    span: Span,
    op: UnOp,
    operand: AstNode,
    model: &IntegerModel,
    diags: &mut Vec<Diagnostic>,
) -> AstNode {
    // Reference operators have no constant meaning.
    if !matches!(op, UnOp::Deref | UnOp::AddrOf) {
        if let Some(v) = operand.cv {
            match apply_unary(op, &v, model) {
                Ok(folded) => return AstNode::literal(id, span, folded),
                Err(err) => diags.push(Diagnostic::warning(err.to_string(), span)),
            }
        }
    }
    AstNode::new(
        id,
        span,
        NodeKind::Unary {
            op,
            operand: Box::new(operand),
        },
    )
}

fn fold_binary(
    id: NodeId,
    span: Span,
    op: BinOp,
    left: AstNode,
    right: AstNode,
    model: &IntegerModel,
    diags: &mut Vec<Diagnostic>,
) -> AstNode {
    if let (Some(l), Some(r)) = (left.cv, right.cv) {
        match apply_binary(op, &l, &r, model) {
            Ok(v) => return AstNode::literal(id, span, v),
            Err(err) => {
                diags.push(Diagnostic::warning(err.to_string(), span));
                return AstNode::new(
                    id,
                    span,
                    NodeKind::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                );
            }
        }
    }

    if let Some(c) = right.cv {
        if right_identity(op, &c) {
            return left;
        }
    }
    if let Some(c) = left.cv {
        if left_identity(op, &c) {
            return right;
        }
    }

    let mut left = left;
    if let Some(c2) = right.cv {
        if matches!(left.kind, NodeKind::Binary { .. }) {
            let left_id = left.id;
            let left_span = left.span;
            if let NodeKind::Binary {
                op: inner_op,
                left: inner_l,
                right: inner_r,
            } = left.kind
            {
                let combined = inner_r
                    .cv
                    .and_then(|c1| combine_chain(inner_op, op, &c1, &c2, model));
                if let Some(k) = combined {
                    let constant = AstNode::literal(inner_r.id, inner_r.span, k);
                    return AstNode::new(
                        id,
                        span,
                        NodeKind::Binary {
                            op: inner_op,
                            left: inner_l,
                            right: Box::new(constant),
                        },
                    );
                }
                left = AstNode::new(
                    left_id,
                    left_span,
                    NodeKind::Binary {
                        op: inner_op,
                        left: inner_l,
                        right: inner_r,
                    },
                );
            }
        }
    }
    AstNode::new(
        id,
        span,
        NodeKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
    )
}

/// `x op c → x` for an integer constant on the right.
fn right_identity(op: BinOp, c: &CValue) -> bool {
    match c.as_int() {
        Some(v) => match op {
            BinOp::And => v == 1,
            BinOp::Or => v == 0,
            BinOp::Add | BinOp::Sub => v == 0,
            BinOp::Mul | BinOp::Div => v == 1,
            BinOp::BitOr | BinOp::BitXor => v == 0,
            BinOp::Shl | BinOp::Shr => v == 0,
            _ => false,
        },
        None => false,
    }
}

/// `c op x → x` for an integer constant on the left. Only the operators
/// where the left side can be dropped without reordering are eligible.
fn left_identity(op: BinOp, c: &CValue) -> bool {
    match c.as_int() {
        Some(v) => match op {
            BinOp::Add => v == 0,
            BinOp::Mul => v == 1,
            BinOp::BitOr | BinOp::BitXor => v == 0,
            _ => false,
        },
        None => false,
    }
}

/// Merges `(x op1 c1) op2 c2` into `x op1 k` for additive and
/// multiplicative chains. Both constants must be integers of the same
/// type so the rewrite cannot change intermediate widths.
fn combine_chain(
    inner: BinOp,
    outer: BinOp,
    c1: &CValue,
    c2: &CValue,
    model: &IntegerModel,
) -> Option<CValue> {
    let additive = |op: BinOp| matches!(op, BinOp::Add | BinOp::Sub);
    let combine_op = if additive(inner) && additive(outer) {
        if inner == BinOp::Add {
            outer
        } else if outer == BinOp::Add {
            // (x - c1) + c2 == x - (c1 - c2)
            BinOp::Sub
        } else {
            // (x - c1) - c2 == x - (c1 + c2)
            BinOp::Add
        }
    } else if inner == BinOp::Mul && outer == BinOp::Mul {
        BinOp::Mul
    } else {
        return None;
    };
    if c1.as_int().is_none() || c2.as_int().is_none() {
        return None;
    }
    if c1.ty() != c2.ty() {
        return None;
    }
    apply_binary(combine_op, c1, c2, model).ok()
}
