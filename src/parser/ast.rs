//! Expression tree
//!
//! Every node carries a dense id, a source span, and an optional constant
//! value filled in by the folder. The kind enum covers the whole expression
//! grammar: C operators, reference forms (members, indexing, colon paths),
//! casts and sizeof, intrinsic calls, and the printf form that only appears
//! at the root.
//!
//! Node ids are assigned by the parser and never reused within one parse;
//! replacement nodes built by the folder take over the id of the node they
//! replace. The evaluator's memo table relies on that.

use crate::diag::Diagnostic;
use crate::diag::Span;
use crate::numeric::{CType, CValue};
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use crate::numeric::{BinOp, UnOp};

/// Unique identifier for tree nodes within one parse.
pub type NodeId = usize;

/// `++` or `--`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Inc,
    Dec,
}

impl UpdateOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UpdateOp::Inc => "++",
            UpdateOp::Dec => "--",
        }
    }

    /// The arithmetic step the update applies.
    pub fn step(&self) -> BinOp {
        match self {
            UpdateOp::Inc => BinOp::Add,
            UpdateOp::Dec => BinOp::Sub,
        }
    }
}

/// Built-in functions served by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    GetRegVal,
    FindSymbol,
    SymbolExists,
    SizeOf,
    OffsetOf,
    CalcMemUsed,
    Running,
}

impl Intrinsic {
    pub fn lookup(name: &str) -> Option<Intrinsic> {
        let intr = match name {
            "__GetRegVal" => Intrinsic::GetRegVal,
            "__FindSymbol" => Intrinsic::FindSymbol,
            "__Symbol_exists" => Intrinsic::SymbolExists,
            "__size_of" => Intrinsic::SizeOf,
            "__Offset_of" => Intrinsic::OffsetOf,
            "__CalcMemUsed" => Intrinsic::CalcMemUsed,
            "__Running" => Intrinsic::Running,
            _ => return None,
        };
        Some(intr)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Intrinsic::GetRegVal => "__GetRegVal",
            Intrinsic::FindSymbol => "__FindSymbol",
            Intrinsic::SymbolExists => "__Symbol_exists",
            Intrinsic::SizeOf => "__size_of",
            Intrinsic::OffsetOf => "__Offset_of",
            Intrinsic::CalcMemUsed => "__CalcMemUsed",
            Intrinsic::Running => "__Running",
        }
    }

    /// Inclusive argument count range, checked at parse time.
    pub fn arg_range(&self) -> (usize, usize) {
        match self {
            Intrinsic::CalcMemUsed => (4, 4),
            Intrinsic::Running => (0, 0),
            _ => (1, 1),
        }
    }

    /// Whether the arguments name things (symbols, registers, types)
    /// rather than being evaluated as values.
    pub fn takes_names(&self) -> bool {
        !matches!(self, Intrinsic::CalcMemUsed | Intrinsic::Running)
    }
}

/// One segment of a printf-form expression: literal text or a formatted
/// embedded expression.
#[derive(Debug, Clone)]
pub enum PrintfPiece {
    Text(String),
    Arg { spec: String, expr: AstNode },
}

/// Expression node kinds.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Numeric or character literal; the value lives in [`AstNode::cv`].
    Number,
    /// Decoded string literal.
    Str(String),
    Ident(String),
    Member {
        base: Box<AstNode>,
        name: String,
        arrow: bool,
    },
    Index {
        base: Box<AstNode>,
        index: Box<AstNode>,
    },
    /// `Namespace:name` chains used by symbol files.
    ColonPath { segments: Vec<String> },
    Unary {
        op: UnOp,
        operand: Box<AstNode>,
    },
    Binary {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    Conditional {
        cond: Box<AstNode>,
        then_branch: Box<AstNode>,
        else_branch: Box<AstNode>,
    },
    /// `=` when `op` is `None`, compound assignment otherwise.
    Assign {
        op: Option<BinOp>,
        target: Box<AstNode>,
        value: Box<AstNode>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<AstNode>,
    },
    Cast {
        ty: CType,
        operand: Box<AstNode>,
    },
    /// A bare type name; only produced as an intrinsic argument, e.g.
    /// `__size_of(unsigned long)`.
    TypeName { ty: CType },
    SizeofType { ty: CType },
    SizeofExpr { operand: Box<AstNode> },
    AlignofType { ty: CType },
    AlignofExpr { operand: Box<AstNode> },
    /// Call of something that is not an intrinsic. Always an evaluation
    /// error, kept in the tree for diagnostics.
    Call {
        callee: String,
        args: Vec<AstNode>,
    },
    Intrinsic {
        intr: Intrinsic,
        args: Vec<AstNode>,
    },
    /// Root-only printf form.
    Printf { pieces: Vec<PrintfPiece> },
    Comma {
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    /// Placeholder where parsing failed; a diagnostic explains why.
    Error,
}

/// A node of the expression tree.
#[derive(Debug, Clone)]
pub struct AstNode {
    pub id: NodeId,
    pub span: Span,
    /// Constant value, when folding proved one.
    pub cv: Option<CValue>,
    pub kind: NodeKind,
}

impl AstNode {
    pub fn new(id: NodeId, span: Span, kind: NodeKind) -> Self {
        Self {
            id,
            span,
            cv: None,
            kind,
        }
    }

    /// Literal node carrying its value.
    pub fn literal(id: NodeId, span: Span, value: CValue) -> Self {
        Self {
            id,
            span,
            cv: Some(value),
            kind: NodeKind::Number,
        }
    }

    pub fn error(id: NodeId, span: Span) -> Self {
        Self::new(id, span, NodeKind::Error)
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self.kind, NodeKind::Error)
    }

    /// Reference forms: things that resolve to a target location.
    pub fn is_reference(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Ident(_)
                | NodeKind::Member { .. }
                | NodeKind::Index { .. }
                | NodeKind::ColonPath { .. }
                | NodeKind::Unary {
                    op: UnOp::Deref,
                    ..
                }
        )
    }

    /// Writable targets: identifiers, members, and indexed elements. Colon
    /// paths and dereferences resolve but cannot be assigned to.
    #[inline]
    pub fn is_assignable(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Ident(_) | NodeKind::Member { .. } | NodeKind::Index { .. }
        )
    }
}

fn fmt_args(f: &mut fmt::Formatter<'_>, args: &[AstNode]) -> fmt::Result {
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", a)?;
    }
    Ok(())
}

impl fmt::Display for AstNode {
    /// Parenthesized rendering, used by the command line tool and trace
    /// logging.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Number => match &self.cv {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "<number>"),
            },
            NodeKind::Str(s) => write!(f, "{:?}", s),
            NodeKind::Ident(name) => write!(f, "{}", name),
            NodeKind::Member { base, name, arrow } => {
                write!(f, "{}{}{}", base, if *arrow { "->" } else { "." }, name)
            }
            NodeKind::Index { base, index } => write!(f, "{}[{}]", base, index),
            NodeKind::ColonPath { segments } => {
                write!(f, "{}", segments.join(":"))
            }
            NodeKind::Unary { op, operand } => write!(f, "({}{})", op, operand),
            NodeKind::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op, right)
            }
            NodeKind::Conditional {
                cond,
                then_branch,
                else_branch,
            } => write!(f, "({} ? {} : {})", cond, then_branch, else_branch),
            NodeKind::Assign { op, target, value } => match op {
                Some(op) => write!(f, "({} {}= {})", target, op, value),
                None => write!(f, "({} = {})", target, value),
            },
            NodeKind::Update { op, prefix, target } => {
                if *prefix {
                    write!(f, "({}{})", op.symbol(), target)
                } else {
                    write!(f, "({}{})", target, op.symbol())
                }
            }
            NodeKind::Cast { ty, operand } => write!(f, "(({}){})", ty, operand),
            NodeKind::TypeName { ty } => write!(f, "{}", ty),
            NodeKind::SizeofType { ty } => write!(f, "sizeof({})", ty),
            NodeKind::SizeofExpr { operand } => write!(f, "sizeof({})", operand),
            NodeKind::AlignofType { ty } => write!(f, "alignof({})", ty),
            NodeKind::AlignofExpr { operand } => {
                write!(f, "alignof({})", operand)
            }
            NodeKind::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                fmt_args(f, args)?;
                write!(f, ")")
            }
            NodeKind::Intrinsic { intr, args } => {
                write!(f, "{}(", intr.name())?;
                fmt_args(f, args)?;
                write!(f, ")")
            }
            NodeKind::Printf { pieces } => {
                for piece in pieces {
                    match piece {
                        PrintfPiece::Text(t) => {
                            write!(f, "{}", t.replace('%', "%%"))?
                        }
                        PrintfPiece::Arg { spec, expr } => {
                            write!(f, "%{}[{}]", spec, expr)?
                        }
                    }
                }
                Ok(())
            }
            NodeKind::Comma { left, right } => {
                write!(f, "({}, {})", left, right)
            }
            NodeKind::Error => write!(f, "<error>"),
        }
    }
}

static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

/// Output of parsing one descriptor expression: the (folded) tree plus
/// everything a caller needs without walking it.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub root: AstNode,
    /// Parse and fold diagnostics, in order of discovery.
    pub diagnostics: Vec<Diagnostic>,
    /// External symbols the expression reads. Assignment targets, colon
    /// path heads, and intrinsic name arguments are excluded.
    pub symbols: FxHashSet<String>,
    /// Whether the root is a printf form producing text.
    pub is_printf: bool,
    /// Constant value of the whole expression, when folding proved one.
    pub const_value: Option<CValue>,
    stamp: u64,
}

impl ParseResult {
    pub(crate) fn new(
        root: AstNode,
        diagnostics: Vec<Diagnostic>,
        symbols: FxHashSet<String>,
        is_printf: bool,
        const_value: Option<CValue>,
    ) -> Self {
        Self {
            root,
            diagnostics,
            symbols,
            is_printf,
            const_value,
            stamp: NEXT_STAMP.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Identity of this parse, distinct across every tree ever produced.
    /// The evaluator memo uses it to notice a change of tree.
    #[inline]
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    /// True when the whole expression folded to a constant.
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.const_value.is_some()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    /// Names the host would be asked to resolve.
    pub fn referenced_symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::IntegerModel;

    #[test]
    fn test_intrinsic_lookup() {
        assert_eq!(
            Intrinsic::lookup("__CalcMemUsed"),
            Some(Intrinsic::CalcMemUsed)
        );
        assert_eq!(Intrinsic::lookup("__Running"), Some(Intrinsic::Running));
        assert_eq!(Intrinsic::lookup("printf"), None);
        assert_eq!(Intrinsic::CalcMemUsed.arg_range(), (4, 4));
        assert_eq!(Intrinsic::GetRegVal.arg_range(), (1, 1));
        assert!(Intrinsic::GetRegVal.takes_names());
        assert!(!Intrinsic::CalcMemUsed.takes_names());
    }

    #[test]
    fn test_display_roundtrip_shape() {
        let m = IntegerModel::ILP32;
        let one = AstNode::literal(0, Span::new(0, 1), CValue::int(CType::int(&m), 1));
        let x = AstNode::new(1, Span::new(2, 3), NodeKind::Ident("x".into()));
        let sum = AstNode::new(
            2,
            Span::new(0, 3),
            NodeKind::Binary {
                op: BinOp::Add,
                left: Box::new(one),
                right: Box::new(x),
            },
        );
        assert_eq!(sum.to_string(), "(1 + x)");
    }

    #[test]
    fn test_reference_forms() {
        let x = AstNode::new(0, Span::new(0, 1), NodeKind::Ident("x".into()));
        assert!(x.is_reference());
        assert!(x.is_assignable());
        let lit = AstNode::literal(
            1,
            Span::new(0, 1),
            CValue::int(CType::int(&IntegerModel::ILP32), 7),
        );
        assert!(!lit.is_reference());
        let deref = AstNode::new(
            2,
            Span::new(0, 2),
            NodeKind::Unary {
                op: UnOp::Deref,
                operand: Box::new(lit),
            },
        );
        assert!(deref.is_reference());
        assert!(!deref.is_assignable());
        let path = AstNode::new(
            3,
            Span::new(0, 3),
            NodeKind::ColonPath {
                segments: vec!["A".into(), "b".into()],
            },
        );
        assert!(path.is_reference());
        assert!(!path.is_assignable());
    }

    #[test]
    fn test_stamps_are_distinct() {
        let mk = || {
            ParseResult::new(
                AstNode::error(0, Span::point(0)),
                Vec::new(),
                FxHashSet::default(),
                false,
                None,
            )
        };
        assert_ne!(mk().stamp(), mk().stamp());
    }
}
