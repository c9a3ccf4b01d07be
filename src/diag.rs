//! Diagnostics shared by the parser, optimizer, and evaluator
//!
//! Every stage reports problems by appending [`Diagnostic`] records instead of
//! aborting. A descriptor expression with a typo still parses to a tree (with
//! error nodes substituted) and still evaluates as far as it can, so one bad
//! field never blanks out a whole view.

use std::fmt;

/// Half-open character range into the expression text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at a single position.
    #[inline]
    pub fn point(at: usize) -> Self {
        Self { start: at, end: at }
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Shifts the span right by `by` characters. Used when diagnostics from a
    /// printf sub-expression are merged into the outer text.
    #[inline]
    pub fn offset(self, by: usize) -> Span {
        Span {
            start: self.start + by,
            end: self.end + by,
        }
    }
}

/// How severe a diagnostic is.
///
/// Warnings and notes never prevent evaluation. Errors usually mean part of
/// the expression was replaced by an error node or produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single problem report attached to a character range.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
        }
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            span,
        }
    }

    pub fn info(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            span,
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.severity, self.span.start, self.span.end, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_union() {
        let a = Span::new(2, 5);
        let b = Span::new(4, 9);
        assert_eq!(a.to(b), Span::new(2, 9));
        assert_eq!(b.to(a), Span::new(2, 9));
    }

    #[test]
    fn test_span_offset() {
        assert_eq!(Span::new(1, 3).offset(10), Span::new(11, 13));
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::error("Division by zero", Span::new(4, 7));
        assert_eq!(d.to_string(), "error at 4..7: Division by zero");
        assert!(d.is_error());
        let w = Diagnostic::warning("trailing input", Span::point(9));
        assert!(!w.is_error());
    }
}
