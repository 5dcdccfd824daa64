//! Token model shared by the lexer, the syntax tree and the lint drivers.
//!
//! Tokens do not own text. They carry a byte span into the analyzed buffer,
//! and callers that need the text pass the buffer back in. This keeps tokens
//! `Copy`, keeps the syntax tree free of lifetimes, and preserves the
//! invariant that every token's text lies inside the source it was lexed
//! from.

/// Half-open byte range `[start, end)` into a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSpan {
    pub start: usize,
    pub end: usize,
}

impl ByteSpan {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Zero-length span anchored at `offset`.
    pub fn empty(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Resolve the span against the buffer it was produced from.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Closed set of lexical kinds produced by the lexer.
///
/// Single-character punctuation all maps to `Operator` except `;`, which
/// several checks match on directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    Identifier,
    SystemIdentifier,
    Keyword,
    Number,
    StringLiteral,
    /// `` `define ``
    PPDefine,
    /// `` `ifdef ``
    PPIfdef,
    /// `` `ifndef ``
    PPIfndef,
    /// `` `else ``
    PPElse,
    /// `` `elsif ``
    PPElsif,
    /// `` `endif ``
    PPEndif,
    /// `` `include ``
    PPInclude,
    /// The identifier argument of `` `define ``/`` `ifdef ``/`` `ifndef ``/`` `elsif ``.
    PPIdentifier,
    /// Any other `` `name `` (macro call).
    MacroIdentifier,
    EolComment,
    BlockComment,
    Space,
    Newline,
    Semicolon,
    Operator,
    /// Unrecognized input; surfaces as a syntax-error diagnostic.
    Error,
    Eof,
}

impl TokenKind {
    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::EolComment | TokenKind::BlockComment)
    }

    pub fn is_whitespace(self) -> bool {
        matches!(self, TokenKind::Space | TokenKind::Newline)
    }

    /// Trivia is excluded from the filtered token view and from the CST.
    pub fn is_trivia(self) -> bool {
        self.is_comment() || self.is_whitespace()
    }
}

/// A lexeme: kind tag plus the byte span it occupies.
///
/// Equality compares kind and exact span, so two tokens are equal only when
/// they denote the same occurrence in the same buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub span: ByteSpan,
}

impl Token {
    pub fn new(kind: TokenKind, span: ByteSpan) -> Self {
        Self { kind, span }
    }

    /// The distinguished end-of-file sentinel: zero length at the buffer end.
    pub fn eof(buffer_len: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: ByteSpan::empty(buffer_len),
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Byte offset where the token begins.
    pub fn left(&self) -> usize {
        self.span.start
    }

    /// Byte offset one past the token end.
    pub fn right(&self) -> usize {
        self.span.end
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }

    /// Location-insensitive comparison: same kind and same text contents.
    /// EOF tokens compare equivalent regardless of position.
    pub fn equivalent(&self, source: &str, other: &Token, other_source: &str) -> bool {
        self.kind == other.kind
            && (self.kind == TokenKind::Eof || self.text(source) == other.text(other_source))
    }
}

/// Rebuilds a contiguous buffer from `(kind, text)` pairs and returns tokens
/// whose spans index into that buffer. Test fixtures use this to fabricate
/// token streams without running the lexer.
pub fn concat_token_stream(parts: &[(TokenKind, &str)]) -> (String, Vec<Token>) {
    let mut buffer = String::with_capacity(parts.iter().map(|(_, t)| t.len()).sum());
    let mut tokens = Vec::with_capacity(parts.len() + 1);
    for (kind, text) in parts {
        let start = buffer.len();
        buffer.push_str(text);
        tokens.push(Token::new(*kind, ByteSpan::new(start, buffer.len())));
    }
    tokens.push(Token::eof(buffer.len()));
    (buffer, tokens)
}

/// Strips comment markers and surrounding whitespace from a comment token's
/// text: `// foo ` and `/* foo */` both yield `foo`.
pub fn strip_comment_text(text: &str) -> &str {
    let body = if let Some(rest) = text.strip_prefix("//") {
        rest
    } else if let Some(rest) = text.strip_prefix("/*") {
        rest.strip_suffix("*/").unwrap_or(rest)
    } else {
        text
    };
    body.trim()
}
