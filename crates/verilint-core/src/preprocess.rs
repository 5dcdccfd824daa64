//! Best-effort collection of macro definitions from the token stream.
//!
//! Definition bodies are captured as raw text up to the end of the defining
//! line. Because the lexer tokenizes bodies inline, a `` `define `` nested
//! in another definition's body is found by the same scan.

use crate::lexer::relex;
use crate::token::{ByteSpan, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroParameter {
    pub name: String,
    pub default_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
    /// The `` `define `` directive token.
    pub header: Token,
    pub name: String,
    pub name_span: ByteSpan,
    /// True when the definition declares a formal parameter list.
    pub is_callable: bool,
    pub parameters: Vec<MacroParameter>,
    /// Body text with surrounding whitespace trimmed.
    pub body: String,
}

/// Scans a full token sequence for `` `define `` directives.
pub fn collect_macro_definitions(tokens: &[Token], source: &str) -> Vec<MacroDefinition> {
    let mut definitions = Vec::new();
    let mut index = 0;
    while index < tokens.len() {
        if tokens[index].kind == TokenKind::PPDefine {
            if let Some((definition, next)) = parse_definition(tokens, index, source) {
                definitions.push(definition);
                index = next;
                continue;
            }
        }
        index += 1;
    }
    definitions
}

fn parse_definition(
    tokens: &[Token],
    define_index: usize,
    source: &str,
) -> Option<(MacroDefinition, usize)> {
    let header = tokens[define_index];
    let mut index = define_index + 1;
    while index < tokens.len() && tokens[index].kind == TokenKind::Space {
        index += 1;
    }
    let name_token = tokens.get(index)?;
    if name_token.kind != TokenKind::PPIdentifier {
        return None;
    }
    let name_span = name_token.span;
    index += 1;

    // A parameter list only counts when the paren is glued to the name;
    // `\`define FOO (x)` defines FOO with body "(x)".
    let mut is_callable = false;
    let mut parameters = Vec::new();
    if let Some(paren) = tokens.get(index) {
        if paren.kind == TokenKind::Operator
            && paren.text(source) == "("
            && paren.left() == name_span.end
        {
            is_callable = true;
            index = parse_parameters(tokens, index + 1, source, &mut parameters);
        }
    }

    // Body: everything up to the end of the defining line.
    let body_start = tokens
        .get(index)
        .map(|t| t.left())
        .unwrap_or(source.len());
    while index < tokens.len()
        && tokens[index].kind != TokenKind::Newline
        && tokens[index].kind != TokenKind::Eof
    {
        index += 1;
    }
    let body_end = tokens
        .get(index)
        .map(|t| t.left())
        .unwrap_or(source.len());
    let body = trim_by_relex(&source[body_start..body_end]);

    Some((
        MacroDefinition {
            header,
            name: name_token.text(source).to_string(),
            name_span,
            is_callable,
            parameters,
            body,
        },
        index,
    ))
}

/// Parses `name [= default] {, name [= default]}` up to the closing paren.
/// Returns the index just past it.
fn parse_parameters(
    tokens: &[Token],
    mut index: usize,
    source: &str,
    parameters: &mut Vec<MacroParameter>,
) -> usize {
    let mut current_name: Option<String> = None;
    let mut default_span: Option<ByteSpan> = None;
    let mut in_default = false;
    let mut depth = 0usize;

    let mut finish =
        |name: &mut Option<String>, default: &mut Option<ByteSpan>, out: &mut Vec<MacroParameter>| {
            if let Some(name) = name.take() {
                out.push(MacroParameter {
                    name,
                    default_text: default.take().map(|span| span.text(source).trim().to_string()),
                });
            }
        };

    while index < tokens.len() {
        let token = tokens[index];
        match token.kind {
            TokenKind::Newline | TokenKind::Eof => break,
            TokenKind::Space => {}
            TokenKind::Operator if token.text(source) == "(" && in_default => depth += 1,
            TokenKind::Operator if token.text(source) == ")" => {
                if depth == 0 {
                    finish(&mut current_name, &mut default_span, parameters);
                    return index + 1;
                }
                depth -= 1;
                extend_span(&mut default_span, token.span);
            }
            TokenKind::Operator if token.text(source) == "," && depth == 0 => {
                finish(&mut current_name, &mut default_span, parameters);
                in_default = false;
            }
            TokenKind::Operator if token.text(source) == "=" && !in_default => {
                in_default = true;
            }
            TokenKind::Identifier if !in_default && current_name.is_none() => {
                current_name = Some(token.text(source).to_string());
            }
            _ if in_default => extend_span(&mut default_span, token.span),
            _ => {}
        }
        index += 1;
    }
    finish(&mut current_name, &mut default_span, parameters);
    index
}

fn extend_span(span: &mut Option<ByteSpan>, addition: ByteSpan) {
    *span = Some(match span {
        None => addition,
        Some(existing) => ByteSpan::new(existing.start.min(addition.start), existing.end.max(addition.end)),
    });
}

/// Trims whitespace tokens off both ends of a body fragment.
fn trim_by_relex(raw: &str) -> String {
    let mut first = None;
    let mut last = 0;
    relex(raw, |token| {
        if !token.kind.is_whitespace() && !token.is_eof() {
            first.get_or_insert(token.left());
            last = token.right();
        }
    });
    match first {
        None => String::new(),
        Some(start) => raw[start..last].to_string(),
    }
}
