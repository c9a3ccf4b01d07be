//! Printf-style format expressions
//!
//! A descriptor value can be a format string instead of a plain expression:
//! `"v=%x[field + 1]"` renders the bracketed expression through the `x`
//! spec. The format text is scanned here, outside the normal grammar, into
//! alternating text and `%spec[expr]` segments. Each bracket body gets a
//! fresh [`Parser`] whose node ids continue the outer numbering and whose
//! spans are offset into the full text, so diagnostics from any segment
//! point at the right characters.
//!
//! `%%` is a literal percent. A `%spec` without a following `[` stays
//! literal text. An unbalanced `[` consumes the rest of the string as the
//! expression and warns.

use crate::diag::{Diagnostic, Span};
use crate::numeric::IntegerModel;
use crate::parser::ast::{AstNode, NodeId, NodeKind, ParseResult, PrintfPiece};
use crate::parser::parse::Parser;
use rustc_hash::FxHashSet;

#[inline]
fn is_spec_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-' | '#')
}

/// Whether the text carries printf markers: `%%` anywhere, or `%` plus a
/// spec run plus `[`. Spaces never occur in a spec, so `100 % tbl[i]`
/// stays an ordinary expression.
pub fn looks_like_printf(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '%' {
            if chars.get(i + 1) == Some(&'%') {
                return true;
            }
            let mut j = i + 1;
            while j < chars.len() && is_spec_char(chars[j]) {
                j += 1;
            }
            if chars.get(j) == Some(&'[') {
                return true;
            }
        }
        i += 1;
    }
    false
}

/// Index of the `]` matching an already-open bracket, starting the scan at
/// `start`. Nested brackets and quoted strings (with escapes) are skipped.
fn find_bracket_end(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            q @ ('"' | '\'') => {
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\\' {
                        i += 1;
                    } else if chars[i] == q {
                        break;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Parses format text into a root printf node. The returned tree is not
/// yet folded.
pub(crate) fn parse_printf(text: &str, model: IntegerModel) -> ParseResult {
    let chars: Vec<char> = text.chars().collect();
    let mut pieces: Vec<PrintfPiece> = Vec::new();
    let mut diags: Vec<Diagnostic> = Vec::new();
    let mut symbols: FxHashSet<String> = FxHashSet::default();
    let mut lit = String::new();
    // Id 0 is reserved for the printf root below.
    let mut next_id: NodeId = 1;

    let mut flush = |lit: &mut String, pieces: &mut Vec<PrintfPiece>| {
        if !lit.is_empty() {
            pieces.push(PrintfPiece::Text(std::mem::take(lit)));
        }
    };

    let mut parse_body =
        |body: &[char], at: usize, next_id: &mut NodeId| -> (AstNode, Vec<Diagnostic>, FxHashSet<String>) {
            let source: String = body.iter().collect();
            let mut sub = Parser::new_sub(&source, model, *next_id, at);
            let expr = sub.parse_root_expr();
            *next_id = sub.next_id;
            (expr, sub.diags, sub.symbols)
        };

    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '%' {
            lit.push(chars[i]);
            i += 1;
            continue;
        }
        if chars.get(i + 1) == Some(&'%') {
            lit.push('%');
            i += 2;
            continue;
        }
        let mut j = i + 1;
        while j < chars.len() && is_spec_char(chars[j]) {
            j += 1;
        }
        if chars.get(j) != Some(&'[') {
            lit.push('%');
            i += 1;
            continue;
        }
        let spec: String = chars[i + 1..j].iter().collect();
        let body_start = j + 1;
        let body_end = match find_bracket_end(&chars, body_start) {
            Some(end) => end,
            None => {
                diags.push(Diagnostic::warning(
                    "unbalanced '[' in format string",
                    Span::new(j, chars.len()),
                ));
                chars.len()
            }
        };
        flush(&mut lit, &mut pieces);
        let (expr, sub_diags, sub_symbols) =
            parse_body(&chars[body_start..body_end], body_start, &mut next_id);
        diags.extend(sub_diags);
        symbols.extend(sub_symbols);
        pieces.push(PrintfPiece::Arg { spec, expr });
        i = if body_end < chars.len() { body_end + 1 } else { body_end };
    }
    flush(&mut lit, &mut pieces);

    let root = AstNode::new(0, Span::new(0, chars.len()), NodeKind::Printf { pieces });
    ParseResult::new(root, diags, symbols, true, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(text: &str) -> Vec<PrintfPiece> {
        match parse_printf(text, IntegerModel::ILP32).root.kind {
            NodeKind::Printf { pieces } => pieces,
            other => panic!("expected printf root, got {:?}", other),
        }
    }

    #[test]
    fn test_detection() {
        assert!(looks_like_printf("v=%x[1+2]"));
        assert!(looks_like_printf("%d[x]"));
        assert!(looks_like_printf("done: %%"));
        assert!(looks_like_printf("%u.8[big]"));
        assert!(!looks_like_printf("100 % tbl[i]"));
        assert!(!looks_like_printf("a % b"));
        assert!(!looks_like_printf("plain text"));
        assert!(!looks_like_printf("%q no bracket"));
    }

    #[test]
    fn test_segments() {
        let p = pieces("count: %d[n] of %u[m]");
        assert_eq!(p.len(), 4);
        match &p[0] {
            PrintfPiece::Text(t) => assert_eq!(t, "count: "),
            other => panic!("expected text, got {:?}", other),
        }
        match &p[1] {
            PrintfPiece::Arg { spec, expr } => {
                assert_eq!(spec, "d");
                assert_eq!(expr.to_string(), "n");
            }
            other => panic!("expected arg, got {:?}", other),
        }
        match &p[3] {
            PrintfPiece::Arg { spec, .. } => assert_eq!(spec, "u"),
            other => panic!("expected arg, got {:?}", other),
        }
        let r = parse_printf("count: %d[n] of %u[m]", IntegerModel::ILP32);
        let mut names: Vec<_> = r.referenced_symbols().collect();
        names.sort_unstable();
        assert_eq!(names, ["m", "n"]);
        assert!(r.is_printf);
    }

    #[test]
    fn test_percent_escapes() {
        let p = pieces("a%%b");
        assert_eq!(p.len(), 1);
        match &p[0] {
            PrintfPiece::Text(t) => assert_eq!(t, "a%b"),
            other => panic!("expected text, got {:?}", other),
        }
        // Spec without bracket stays literal.
        let p = pieces("50% done");
        match &p[0] {
            PrintfPiece::Text(t) => assert_eq!(t, "50% done"),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_sub_expression_spans_and_ids() {
        let r = parse_printf("v=%x[1+2]", IntegerModel::ILP32);
        assert_eq!(r.root.id, 0);
        let p = match &r.root.kind {
            NodeKind::Printf { pieces } => pieces,
            other => panic!("expected printf root, got {:?}", other),
        };
        match &p[1] {
            PrintfPiece::Arg { expr, .. } => {
                // "1+2" occupies characters 5..8 of the full text.
                assert_eq!(expr.span, Span::new(5, 8));
                assert!(expr.id >= 1);
            }
            other => panic!("expected arg, got {:?}", other),
        }
    }

    #[test]
    fn test_ids_continue_across_segments() {
        let p = pieces("%d[a] %d[b]");
        let (first, second) = match (&p[0], &p[2]) {
            (
                PrintfPiece::Arg { expr: a, .. },
                PrintfPiece::Arg { expr: b, .. },
            ) => (a.id, b.id),
            other => panic!("unexpected shape {:?}", other),
        };
        assert_ne!(first, second);
        assert!(first >= 1 && second > first);
    }

    #[test]
    fn test_unbalanced_bracket() {
        let r = parse_printf("x %d[a + (b", IntegerModel::ILP32);
        assert!(r
            .diagnostics
            .iter()
            .any(|d| d.message.contains("unbalanced '['")));
        // The remainder still parsed as an expression.
        let p = match &r.root.kind {
            NodeKind::Printf { pieces } => pieces,
            other => panic!("expected printf root, got {:?}", other),
        };
        match p.last() {
            Some(PrintfPiece::Arg { expr, .. }) => {
                assert_eq!(expr.to_string(), "(a + b)")
            }
            other => panic!("expected arg, got {:?}", other),
        }
        assert!(r.symbols.contains("a") && r.symbols.contains("b"));
    }

    #[test]
    fn test_brackets_inside_body() {
        let p = pieces("%d[tbl[i] + 1]");
        assert_eq!(p.len(), 1);
        match &p[0] {
            PrintfPiece::Arg { expr, .. } => {
                assert_eq!(expr.to_string(), "(tbl[i] + 1)")
            }
            other => panic!("expected arg, got {:?}", other),
        }
        // A ']' inside a string does not close the segment.
        let p = pieces("%s[\"a]b\"]");
        match &p[0] {
            PrintfPiece::Arg { expr, .. } => {
                assert_eq!(expr.to_string(), "\"a]b\"")
            }
            other => panic!("expected arg, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_when_forced() {
        let r = parse_printf("hello", IntegerModel::ILP32);
        assert!(r.is_printf);
        match &r.root.kind {
            NodeKind::Printf { pieces } => {
                assert_eq!(pieces.len(), 1);
            }
            other => panic!("expected printf root, got {:?}", other),
        }
    }
}
