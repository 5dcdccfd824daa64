//! Best-effort SystemVerilog tokenizer.
//!
//! This is not a language implementation. It produces the closed
//! [`TokenKind`] set with enough fidelity for the lint drivers: comments,
//! whitespace split at newlines, string literals, numbers (including based
//! literals), identifiers against a small keyword set, preprocessor
//! directives with their identifier arguments, and single-character
//! punctuation. Anything unrecognized becomes an `Error` token and surfaces
//! as a syntax-error diagnostic while linting continues.

use crate::token::{ByteSpan, Token, TokenKind};

/// Keywords the structural parser distinguishes from plain identifiers.
fn is_keyword(text: &str) -> bool {
    matches!(
        text,
        "module"
            | "macromodule"
            | "endmodule"
            | "package"
            | "endpackage"
            | "class"
            | "endclass"
            | "interface"
            | "endinterface"
            | "function"
            | "endfunction"
            | "task"
            | "endtask"
            | "generate"
            | "endgenerate"
            | "always"
            | "always_comb"
            | "always_ff"
            | "always_latch"
            | "initial"
            | "final"
            | "begin"
            | "end"
            | "if"
            | "else"
            | "for"
            | "foreach"
            | "while"
            | "do"
            | "case"
            | "casex"
            | "casez"
            | "endcase"
            | "parameter"
            | "localparam"
            | "defparam"
            | "type"
            | "typedef"
            | "enum"
            | "struct"
            | "union"
            | "string"
            | "int"
            | "integer"
            | "logic"
            | "bit"
            | "byte"
            | "shortint"
            | "longint"
            | "reg"
            | "wire"
            | "real"
            | "time"
            | "signed"
            | "unsigned"
            | "input"
            | "output"
            | "inout"
            | "assign"
            | "posedge"
            | "negedge"
            | "or"
            | "and"
            | "not"
            | "void"
            | "return"
            | "automatic"
            | "static"
            | "const"
    )
}

fn is_identifier_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_identifier_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

fn is_number_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'\'' | b'.' | b'?')
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Set after `` `define ``/`` `ifdef ``/`` `ifndef ``/`` `elsif ``: the
    /// next identifier on the same line is the directive's argument.
    expect_pp_identifier: bool,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            expect_pp_identifier: false,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn take_while(&mut self, predicate: impl Fn(u8) -> bool) {
        while let Some(byte) = self.peek() {
            if predicate(byte) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn token_from(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, ByteSpan::new(start, self.pos))
    }

    fn next_token(&mut self) -> Option<Token> {
        let start = self.pos;
        let byte = self.peek()?;
        let token = match byte {
            b'\n' => {
                self.pos += 1;
                self.expect_pp_identifier = false;
                self.token_from(TokenKind::Newline, start)
            }
            b' ' | b'\t' | b'\r' => {
                self.take_while(|b| matches!(b, b' ' | b'\t' | b'\r'));
                self.token_from(TokenKind::Space, start)
            }
            b'/' if self.peek_at(1) == Some(b'/') => {
                self.take_while(|b| b != b'\n');
                self.token_from(TokenKind::EolComment, start)
            }
            b'/' if self.peek_at(1) == Some(b'*') => self.lex_block_comment(start),
            b'"' => self.lex_string(start),
            b'`' => self.lex_directive(start),
            b'\\' => {
                // Escaped identifier: backslash up to the next whitespace.
                self.pos += 1;
                self.take_while(|b| !b.is_ascii_whitespace());
                self.token_from(TokenKind::Identifier, start)
            }
            b'$' => {
                self.pos += 1;
                if self.peek().map(is_identifier_start).unwrap_or(false) {
                    self.take_while(is_identifier_char);
                    self.token_from(TokenKind::SystemIdentifier, start)
                } else {
                    self.token_from(TokenKind::Operator, start)
                }
            }
            b if is_identifier_start(b) => {
                self.take_while(is_identifier_char);
                let text = &self.source[start..self.pos];
                let kind = if self.expect_pp_identifier {
                    self.expect_pp_identifier = false;
                    TokenKind::PPIdentifier
                } else if is_keyword(text) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                };
                self.token_from(kind, start)
            }
            b if b.is_ascii_digit() => {
                self.take_while(is_number_char);
                self.token_from(TokenKind::Number, start)
            }
            b';' => {
                self.pos += 1;
                self.token_from(TokenKind::Semicolon, start)
            }
            b'(' | b')' | b'{' | b'}' | b'[' | b']' | b'<' | b'>' | b'+' | b'-' | b'*' | b'/'
            | b'%' | b'&' | b'|' | b'^' | b'~' | b'!' | b'?' | b':' | b',' | b'.' | b'#'
            | b'@' | b'=' | b'\'' => {
                self.pos += 1;
                self.token_from(TokenKind::Operator, start)
            }
            _ => {
                // Skip a full UTF-8 scalar so spans stay on char boundaries.
                let ch_len = self.source[start..]
                    .chars()
                    .next()
                    .map(char::len_utf8)
                    .unwrap_or(1);
                self.pos += ch_len;
                self.token_from(TokenKind::Error, start)
            }
        };
        Some(token)
    }

    fn lex_block_comment(&mut self, start: usize) -> Token {
        self.pos += 2;
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b'*' && self.peek_at(1) == Some(b'/') {
                self.pos += 2;
                return self.token_from(TokenKind::BlockComment, start);
            }
            self.pos += 1;
        }
        // Unterminated comment: consume to EOF and report.
        self.token_from(TokenKind::Error, start)
    }

    fn lex_string(&mut self, start: usize) -> Token {
        self.pos += 1;
        while let Some(byte) = self.peek() {
            match byte {
                b'\\' => self.pos += 2.min(self.bytes.len() - self.pos),
                b'"' => {
                    self.pos += 1;
                    return self.token_from(TokenKind::StringLiteral, start);
                }
                b'\n' => break,
                _ => self.pos += 1,
            }
        }
        // Unterminated string: stop at end of line.
        self.token_from(TokenKind::Error, start)
    }

    fn lex_directive(&mut self, start: usize) -> Token {
        self.pos += 1;
        if !self.peek().map(is_identifier_start).unwrap_or(false) {
            return self.token_from(TokenKind::Error, start);
        }
        self.take_while(is_identifier_char);
        let kind = match &self.source[start + 1..self.pos] {
            "define" => {
                self.expect_pp_identifier = true;
                TokenKind::PPDefine
            }
            "ifdef" => {
                self.expect_pp_identifier = true;
                TokenKind::PPIfdef
            }
            "ifndef" => {
                self.expect_pp_identifier = true;
                TokenKind::PPIfndef
            }
            "elsif" => {
                self.expect_pp_identifier = true;
                TokenKind::PPElsif
            }
            "else" => TokenKind::PPElse,
            "endif" => TokenKind::PPEndif,
            "include" => TokenKind::PPInclude,
            _ => TokenKind::MacroIdentifier,
        };
        self.token_from(kind, start)
    }
}

/// Tokenizes the whole buffer. The result always ends with the EOF sentinel
/// and covers every input byte exactly once.
pub fn lex(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens.push(Token::eof(source.len()));
    tokens
}

/// Re-lexes an embedded text fragment (macro body, string contents), calling
/// back for each token. Spans are relative to `text`, not to any enclosing
/// buffer.
pub fn relex(text: &str, mut callback: impl FnMut(Token)) {
    let mut lexer = Lexer::new(text);
    while let Some(token) = lexer.next_token() {
        callback(token);
    }
}
