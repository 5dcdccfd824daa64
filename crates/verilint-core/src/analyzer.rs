//! Lex + parse driver: turns raw source into a [`TextStructure`] and the
//! list of syntax errors encountered on the way. Lex and parse failures are
//! recovered locally so linting can continue on the salvaged result.

use crate::lexer::lex;
use crate::parser::parse;
use crate::text_structure::TextStructure;
use crate::token::{ByteSpan, TokenKind};

/// One unrecognized token or unexpected construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SyntaxError {
    pub span: ByteSpan,
}

impl SyntaxError {
    /// Renders the canonical single-line form:
    /// `<path>:<line>:<col>: syntax error at token "<text>"`.
    pub fn message(&self, path: &str, text: &TextStructure) -> String {
        let position = text.line_map().lookup(self.span.start);
        format!(
            "{}:{}: syntax error at token \"{}\"",
            path,
            position,
            self.span.text(text.contents())
        )
    }
}

#[derive(Debug)]
pub struct AnalyzedSource {
    pub text: TextStructure,
    pub syntax_errors: Vec<SyntaxError>,
}

impl AnalyzedSource {
    pub fn is_clean(&self) -> bool {
        self.syntax_errors.is_empty()
    }
}

/// Lexes and parses `contents`. Always produces a usable `TextStructure`;
/// the error list reports what had to be salvaged.
pub fn analyze_source(contents: String) -> AnalyzedSource {
    let tokens = lex(&contents);
    let mut syntax_errors: Vec<SyntaxError> = tokens
        .iter()
        .filter(|token| token.kind == TokenKind::Error)
        .map(|token| SyntaxError { span: token.span })
        .collect();

    let parsed = parse(&tokens, &contents);
    syntax_errors.extend(parsed.errors);
    syntax_errors.sort();
    syntax_errors.dedup();

    AnalyzedSource {
        text: TextStructure::new(contents, tokens, Some(parsed.tree)),
        syntax_errors,
    }
}
