//! Evaluation error types
//!
//! This module defines [`EvalError`], which represents all errors that can
//! occur while evaluating a parsed expression against a host (as opposed to
//! parse errors, which are reported as diagnostics on the parse result).
//!
//! Every error carries the source span of the node that raised it, so the
//! front end can underline the offending part of the expression.

use crate::diag::{Diagnostic, Span};
use crate::numeric::NumericError;
use std::fmt;

/// Errors raised while evaluating an expression tree
#[derive(Debug, Clone)]
pub enum EvalError {
    /// The host knows no symbol by this name in the current scope
    UnknownSymbol { name: String, span: Span },

    /// The resolved container has no member by this name
    UnknownMember { name: String, span: Span },

    /// A value was requested from an expression that names no target
    NotAReference { span: Span },

    /// Resolution stopped before reaching a target node
    Unresolved { span: Span },

    /// The host declined to produce a value for the resolved target
    NoValue { what: &'static str, span: Span },

    /// The host declined a write to the resolved target
    WriteFailed { span: Span },

    /// Assignment to an expression form that cannot be written
    NotWritable { span: Span },

    /// Indexing a container whose element stride is unknown
    NoStride { span: Span },

    /// Array subscript did not evaluate to an integer
    BadIndex { span: Span },

    /// Arithmetic failure (division by zero, bad shift count, ...)
    Numeric { err: NumericError, span: Span },

    /// Call to a name that is neither an intrinsic nor known to the host
    UnknownFunction { name: String, span: Span },

    /// The host does not implement this intrinsic
    IntrinsicUnsupported { name: &'static str, span: Span },

    /// The host implements the intrinsic but produced no value
    IntrinsicNoValue { name: &'static str, span: Span },

    /// An intrinsic argument that must be a name was something else
    BadIntrinsicArg {
        name: &'static str,
        position: usize,
        span: Span,
    },

    /// A string literal or type name used where a value is required
    NotAValue { what: &'static str, span: Span },

    /// The node is an error placeholder left behind by the parser
    InvalidNode { span: Span },
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::UnknownSymbol { span, .. } => *span,
            EvalError::UnknownMember { span, .. } => *span,
            EvalError::NotAReference { span } => *span,
            EvalError::Unresolved { span } => *span,
            EvalError::NoValue { span, .. } => *span,
            EvalError::WriteFailed { span } => *span,
            EvalError::NotWritable { span } => *span,
            EvalError::NoStride { span } => *span,
            EvalError::BadIndex { span } => *span,
            EvalError::Numeric { span, .. } => *span,
            EvalError::UnknownFunction { span, .. } => *span,
            EvalError::IntrinsicUnsupported { span, .. } => *span,
            EvalError::IntrinsicNoValue { span, .. } => *span,
            EvalError::BadIntrinsicArg { span, .. } => *span,
            EvalError::NotAValue { span, .. } => *span,
            EvalError::InvalidNode { span } => *span,
        }
    }

    /// Converts the error into an error-severity diagnostic on its span.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string(), self.span())
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnknownSymbol { name, .. } => {
                write!(f, "Unknown symbol '{}'", name)
            }
            EvalError::UnknownMember { name, .. } => {
                write!(f, "Unknown member '{}'", name)
            }
            EvalError::NotAReference { .. } => {
                write!(f, "Expression does not name a readable target")
            }
            EvalError::Unresolved { .. } => {
                write!(f, "Reference did not resolve to a target")
            }
            EvalError::NoValue { what, .. } => {
                write!(f, "No value available for {}", what)
            }
            EvalError::WriteFailed { .. } => {
                write!(f, "Write to target failed")
            }
            EvalError::NotWritable { .. } => {
                write!(f, "Target is not writable")
            }
            EvalError::NoStride { .. } => {
                write!(f, "Element stride of the indexed container is unknown")
            }
            EvalError::BadIndex { .. } => {
                write!(f, "Array index is not an integer")
            }
            EvalError::Numeric { err, .. } => write!(f, "{}", err),
            EvalError::UnknownFunction { name, .. } => {
                write!(f, "Unknown function '{}'", name)
            }
            EvalError::IntrinsicUnsupported { name, .. } => {
                write!(f, "{} is not supported by this target", name)
            }
            EvalError::IntrinsicNoValue { name, .. } => {
                write!(f, "{} produced no value", name)
            }
            EvalError::BadIntrinsicArg { name, position, .. } => {
                write!(
                    f,
                    "Argument {} of {} must be a symbol name",
                    position, name
                )
            }
            EvalError::NotAValue { what, .. } => {
                write!(f, "A {} cannot be used as a value", what)
            }
            EvalError::InvalidNode { .. } => {
                write!(f, "Expression did not parse")
            }
        }
    }
}

impl std::error::Error for EvalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let span = Span::new(2, 5);
        let e = EvalError::UnknownSymbol {
            name: "load".into(),
            span,
        };
        assert_eq!(e.to_string(), "Unknown symbol 'load'");
        assert_eq!(e.span(), span);

        let e = EvalError::Numeric {
            err: NumericError::DivisionByZero,
            span,
        };
        assert_eq!(e.to_string(), "Division by zero");

        let e = EvalError::BadIntrinsicArg {
            name: "__FindSymbol",
            position: 1,
            span,
        };
        assert_eq!(
            e.to_string(),
            "Argument 1 of __FindSymbol must be a symbol name"
        );
    }

    #[test]
    fn test_to_diagnostic_carries_span() {
        let e = EvalError::BadIndex {
            span: Span::new(4, 7),
        };
        let d = e.to_diagnostic();
        assert!(d.is_error());
        assert_eq!(d.span, Span::new(4, 7));
        assert_eq!(d.message, "Array index is not an integer");
    }
}
