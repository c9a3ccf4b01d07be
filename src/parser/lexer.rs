//! Tokenizer for descriptor expressions
//!
//! Produces a small token vocabulary: identifiers, numbers, quoted strings,
//! punctuation, and a catch-all for anything unrecognized. Numbers are
//! scanned as preprocessing numbers, one greedy run that keeps radix
//! prefixes, digits, dots, exponents, and suffix letters together; the
//! numeric engine decodes the raw text later. The scanner position can be
//! saved and restored, which the parser uses to disambiguate casts from
//! parenthesized expressions.

use crate::diag::Span;

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Ident,
    Number,
    /// String or character literal, quotes included in the text. Character
    /// literals start with `'`.
    Str,
    Punct,
    Unknown,
}

/// A scanned token: kind, raw text, and the character range it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    /// True when this is the punctuation token `s`.
    #[inline]
    pub fn is_punct(&self, s: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == s
    }
}

/// Three-character punctuation, matched before the shorter forms.
const PUNCT3: &[&str] = &["<<=", ">>="];

/// Two-character punctuation.
const PUNCT2: &[&str] = &[
    "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+=", "-=", "*=", "/=",
    "%=", "&=", "|=", "^=", "++", "--", "->",
];

/// Single-character punctuation.
const PUNCT1: &str = "+-*/%&|^~!<>=?:.,()[]";

/// One-token-at-a-time scanner over a character buffer.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(text: &str) -> Self {
        Self {
            input: text.chars().collect(),
            position: 0,
        }
    }

    /// Replace the input and rewind to the start.
    pub fn reset(&mut self, text: &str) {
        self.input = text.chars().collect();
        self.position = 0;
    }

    /// Current character index, valid as an argument to [`set_index`].
    ///
    /// [`set_index`]: Lexer::set_index
    #[inline]
    pub fn index(&self) -> usize {
        self.position
    }

    /// Rewind (or advance) to a previously observed index.
    #[inline]
    pub fn set_index(&mut self, index: usize) {
        self.position = index.min(self.input.len());
    }

    /// Scan the next token. At the end of input this returns `Eof` tokens
    /// forever.
    pub fn next(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.position;

        let c = match self.peek() {
            Some(c) => c,
            None => {
                return Token {
                    kind: TokenKind::Eof,
                    text: String::new(),
                    span: Span::point(start),
                }
            }
        };

        if c.is_ascii_alphabetic() || c == '_' {
            return self.scan_ident(start);
        }
        if c.is_ascii_digit()
            || (c == '.' && matches!(self.peek_ahead(1), Some(d) if d.is_ascii_digit()))
        {
            return self.scan_number(start);
        }
        if c == '"' || c == '\'' {
            return self.scan_quoted(start, c);
        }
        self.scan_punct(start, c)
    }

    fn scan_ident(&mut self, start: usize) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                text.push(c);
                self.position += 1;
            } else {
                break;
            }
        }
        Token {
            kind: TokenKind::Ident,
            text,
            span: Span::new(start, self.position),
        }
    }

    /// Preprocessing-number scan: digits, letters, underscores, and dots,
    /// plus a sign when it directly follows an exponent letter. `0x1.8p-3f`
    /// is one token.
    fn scan_number(&mut self, start: usize) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                text.push(c);
                self.position += 1;
                if matches!(c, 'e' | 'E' | 'p' | 'P') {
                    if let Some(sign @ ('+' | '-')) = self.peek() {
                        text.push(sign);
                        self.position += 1;
                    }
                }
            } else {
                break;
            }
        }
        Token {
            kind: TokenKind::Number,
            text,
            span: Span::new(start, self.position),
        }
    }

    /// Quoted literal scan. The raw text keeps its quotes; a backslash
    /// blindly carries the following character so an escaped quote does not
    /// terminate the scan. Unterminated literals are caught during
    /// decoding.
    fn scan_quoted(&mut self, start: usize, quote: char) -> Token {
        let mut text = String::new();
        text.push(quote);
        self.position += 1;
        while let Some(c) = self.peek() {
            text.push(c);
            self.position += 1;
            if c == '\\' {
                if let Some(next) = self.peek() {
                    text.push(next);
                    self.position += 1;
                }
                continue;
            }
            if c == quote {
                break;
            }
        }
        Token {
            kind: TokenKind::Str,
            text,
            span: Span::new(start, self.position),
        }
    }

    /// Longest-match punctuation scan.
    fn scan_punct(&mut self, start: usize, c: char) -> Token {
        for table in [PUNCT3, PUNCT2] {
            for &p in table {
                if self.looking_at(p) {
                    self.position += p.chars().count();
                    return Token {
                        kind: TokenKind::Punct,
                        text: p.to_string(),
                        span: Span::new(start, self.position),
                    };
                }
            }
        }
        self.position += 1;
        if PUNCT1.contains(c) {
            Token {
                kind: TokenKind::Punct,
                text: c.to_string(),
                span: Span::new(start, self.position),
            }
        } else {
            Token {
                kind: TokenKind::Unknown,
                text: c.to_string(),
                span: Span::new(start, self.position),
            }
        }
    }

    fn looking_at(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.peek_ahead(i) == Some(c))
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.position += 1;
        }
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    #[inline]
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(text);
        let mut out = Vec::new();
        loop {
            let t = lexer.next();
            let done = t.kind == TokenKind::Eof;
            out.push(t);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("regs.CR + 1");
        assert!(matches!(tokens[0].kind, TokenKind::Ident));
        assert_eq!(tokens[0].text, "regs");
        assert!(tokens[1].is_punct("."));
        assert_eq!(tokens[2].text, "CR");
        assert!(tokens[3].is_punct("+"));
        assert!(matches!(tokens[4].kind, TokenKind::Number));
        assert!(matches!(tokens[5].kind, TokenKind::Eof));
    }

    #[test]
    fn test_maximal_munch() {
        let tokens = kinds("a <<= b << c <= d < e");
        assert!(tokens[1].is_punct("<<="));
        assert!(tokens[3].is_punct("<<"));
        assert!(tokens[5].is_punct("<="));
        assert!(tokens[7].is_punct("<"));
    }

    #[test]
    fn test_number_is_one_token() {
        let tokens = kinds("0x1.8p-3f");
        assert!(matches!(tokens[0].kind, TokenKind::Number));
        assert_eq!(tokens[0].text, "0x1.8p-3f");
        assert!(matches!(tokens[1].kind, TokenKind::Eof));

        let tokens = kinds("1e+5+2");
        assert_eq!(tokens[0].text, "1e+5");
        assert!(tokens[1].is_punct("+"));
        assert_eq!(tokens[2].text, "2");
    }

    #[test]
    fn test_suffix_stays_attached() {
        let tokens = kinds("123ull+1");
        assert_eq!(tokens[0].text, "123ull");
        assert!(tokens[1].is_punct("+"));
    }

    #[test]
    fn test_leading_dot_number() {
        let tokens = kinds(".5 .x");
        assert_eq!(tokens[0].text, ".5");
        assert!(matches!(tokens[0].kind, TokenKind::Number));
        assert!(tokens[1].is_punct("."));
        assert!(matches!(tokens[2].kind, TokenKind::Ident));
    }

    #[test]
    fn test_strings_keep_quotes() {
        let tokens = kinds(r#""a\"b" 'c'"#);
        assert!(matches!(tokens[0].kind, TokenKind::Str));
        assert_eq!(tokens[0].text, r#""a\"b""#);
        assert_eq!(tokens[1].text, "'c'");
    }

    #[test]
    fn test_arrow_and_colon() {
        let tokens = kinds("p->q A:b");
        assert!(tokens[1].is_punct("->"));
        assert!(tokens[4].is_punct(":"));
    }

    #[test]
    fn test_unknown_char() {
        let tokens = kinds("a @ b");
        assert!(matches!(tokens[1].kind, TokenKind::Unknown));
        assert_eq!(tokens[1].text, "@");
    }

    #[test]
    fn test_rewind() {
        let mut lexer = Lexer::new("(int) x");
        let open = lexer.next();
        assert!(open.is_punct("("));
        let mark = lexer.index();
        assert_eq!(lexer.next().text, "int");
        assert!(lexer.next().is_punct(")"));
        lexer.set_index(mark);
        assert_eq!(lexer.next().text, "int");
    }

    #[test]
    fn test_spans() {
        let mut lexer = Lexer::new("  ab + 1");
        let t = lexer.next();
        assert_eq!(t.span, Span::new(2, 4));
        let t = lexer.next();
        assert_eq!(t.span, Span::new(5, 6));
    }
}
