//! The bundle handed to the lint drivers: source buffer, token sequence,
//! line map and syntax tree.

use crate::position::LineColumnMap;
use crate::syntax::Symbol;
use crate::token::Token;

/// Owns the source contents; tokens and the tree index into it by span and
/// are only meaningful alongside it.
#[derive(Debug)]
pub struct TextStructure {
    contents: String,
    tokens: Vec<Token>,
    line_map: LineColumnMap,
    /// `None` when the input was too ill-formed to salvage a tree.
    syntax_tree: Option<Symbol>,
}

impl TextStructure {
    pub fn new(contents: String, tokens: Vec<Token>, syntax_tree: Option<Symbol>) -> Self {
        let line_map = LineColumnMap::new(&contents);
        debug_assert!(tokens
            .iter()
            .all(|token| token.right() <= contents.len()));
        Self {
            contents,
            tokens,
            line_map,
            syntax_tree,
        }
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// The full token sequence, trivia and EOF sentinel included.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Non-trivia tokens: a strict subsequence of [`Self::tokens`].
    pub fn filtered_tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens
            .iter()
            .filter(|token| !token.kind.is_trivia() && !token.is_eof())
    }

    pub fn line_map(&self) -> &LineColumnMap {
        &self.line_map
    }

    pub fn syntax_tree(&self) -> Option<&Symbol> {
        self.syntax_tree.as_ref()
    }

    /// Source lines without their terminating newlines. A file ending in
    /// `\n` yields a final empty line.
    pub fn lines(&self) -> Vec<&str> {
        self.contents.split('\n').collect()
    }

    pub fn line_count(&self) -> usize {
        self.line_map.line_offsets().len()
    }

    /// Tokens whose start lies on the given line. A multi-line token counts
    /// on the line it begins.
    pub fn tokens_on_line(&self, line: usize) -> &[Token] {
        let start = self.line_map.start_of_line(line);
        let end = if line + 1 < self.line_count() {
            self.line_map.start_of_line(line + 1)
        } else {
            self.contents.len() + 1
        };
        let first = self.tokens.partition_point(|token| token.left() < start);
        let last = self.tokens.partition_point(|token| token.left() < end);
        &self.tokens[first..last]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::lex;

    fn structure(source: &str) -> TextStructure {
        TextStructure::new(source.to_string(), lex(source), None)
    }

    #[test]
    fn test_lines_split_without_newlines() {
        let text = structure("a\nbb\n");
        assert_eq!(vec!["a", "bb", ""], text.lines());
    }

    #[test]
    fn test_filtered_tokens_are_a_subsequence() {
        let text = structure("module m; // c\nendmodule\n");
        let all: Vec<Token> = text.tokens().to_vec();
        let filtered: Vec<Token> = text.filtered_tokens().copied().collect();
        // Every filtered token appears in the full sequence, in order.
        let mut cursor = all.iter();
        for token in &filtered {
            assert!(cursor.any(|t| t == token));
        }
        assert!(filtered.iter().all(|t| !t.kind.is_trivia()));
        assert!(filtered.len() < all.len());
    }

    #[test]
    fn test_tokens_on_line_groups_by_start() {
        let source = "module m;\n// note\nendmodule\n";
        let text = structure(source);
        let line0: Vec<&str> = text
            .tokens_on_line(0)
            .iter()
            .map(|t| t.text(source))
            .collect();
        assert_eq!(vec!["module", " ", "m", ";", "\n"], line0);
        let line1: Vec<&str> = text
            .tokens_on_line(1)
            .iter()
            .map(|t| t.text(source))
            .collect();
        assert_eq!(vec!["// note", "\n"], line1);
    }

    #[test]
    fn test_token_positions_agree_with_line_map() {
        let source = "module m;\nendmodule\n";
        let text = structure(source);
        for token in text.filtered_tokens() {
            let position = text.line_map().lookup(token.left());
            let line_text = text.lines()[position.line];
            let column_end = position.column + token.span.len();
            assert_eq!(token.text(source), &line_text[position.column..column_end]);
        }
    }
}
