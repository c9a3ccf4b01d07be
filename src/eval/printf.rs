//! Printf rendering
//!
//! Text pieces pass through untouched; each `%spec[expr]` segment
//! evaluates its expression and asks the host to format the result. The
//! host also receives the resolved container behind the value when one
//! can be recovered, so enum names and register-specific radixes can be
//! applied. Hosts that decline fall back to a small built-in formatter.

use crate::diag::Diagnostic;
use crate::eval::resolve::is_resolvable_ref;
use crate::eval::Evaluator;
use crate::numeric::CValue;
use crate::parser::{AstNode, NodeKind, PrintfPiece};

/// First reference-form node in evaluation order. Used to rebuild a
/// container when the segment expression computes over a reference
/// instead of being one, as in `%d[limit - 1]`.
fn first_reference(node: &AstNode) -> Option<&AstNode> {
    if is_resolvable_ref(node) {
        return Some(node);
    }
    match &node.kind {
        NodeKind::Unary { operand, .. } => first_reference(operand),
        NodeKind::Binary { left, right, .. } => {
            first_reference(left).or_else(|| first_reference(right))
        }
        NodeKind::Conditional {
            cond,
            then_branch,
            else_branch,
        } => first_reference(cond)
            .or_else(|| first_reference(then_branch))
            .or_else(|| first_reference(else_branch)),
        NodeKind::Cast { operand, .. } => first_reference(operand),
        NodeKind::Assign { target, value, .. } => {
            first_reference(target).or_else(|| first_reference(value))
        }
        NodeKind::Update { target, .. } => first_reference(target),
        NodeKind::Comma { left, right } => {
            first_reference(left).or_else(|| first_reference(right))
        }
        _ => None,
    }
}

/// Formats a value for the segment specs the crate understands natively.
/// Anything else renders through the value's own display form.
fn builtin_format(spec: &str, value: &CValue) -> String {
    match spec {
        "d" | "i" => match value.as_int() {
            Some(v) => v.to_string(),
            None => (value.to_f64() as i128).to_string(),
        },
        "u" => value.unsigned_bits().to_string(),
        "x" => format!("0x{:x}", value.unsigned_bits()),
        "X" => format!("0x{:X}", value.unsigned_bits()),
        "b" | "t" => if value.is_truthy() { "true" } else { "false" }.to_string(),
        _ => value.to_string(),
    }
}

impl Evaluator {
    pub(crate) async fn eval_printf(
        &mut self,
        root: &AstNode,
        diags: &mut Vec<Diagnostic>,
    ) -> String {
        let mut out = String::new();
        if let NodeKind::Printf { pieces } = &root.kind {
            for piece in pieces {
                match piece {
                    PrintfPiece::Text(t) => out.push_str(t),
                    PrintfPiece::Arg { spec, expr } => {
                        self.render_segment(spec, expr, &mut out, diags).await;
                    }
                }
            }
        }
        out
    }

    async fn render_segment(
        &mut self,
        spec: &str,
        expr: &AstNode,
        out: &mut String,
        diags: &mut Vec<Diagnostic>,
    ) {
        // A quoted string renders as its text, host not involved.
        if let NodeKind::Str(s) = &expr.kind {
            out.push_str(s);
            return;
        }
        let value = match self.eval_node(expr).await {
            Ok(v) => v,
            Err(e) => {
                // A failed segment renders as nothing; the rest of the
                // format string still goes through.
                diags.push(e.to_diagnostic());
                return;
            }
        };
        let with_container = if is_resolvable_ref(expr) {
            // Evaluating the reference left its container in place.
            true
        } else if let Some(reference) = first_reference(expr) {
            self.resolve_ref(reference, false).await.is_ok()
        } else {
            false
        };
        self.touch_host();
        let formatted = self
            .host
            .format_value(spec, &value, with_container.then_some(&self.ctx))
            .await;
        match formatted {
            Some(text) => out.push_str(&text),
            None => out.push_str(&builtin_format(spec, &value)),
        }
    }
}
