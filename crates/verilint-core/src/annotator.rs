//! Simultaneous walk of the syntax tree and a filtered token view.
//!
//! As the pre-order walk reaches each leaf present in the filtered view,
//! the annotator is invoked on the adjacent token pair together with the
//! ancestor context each side was visited under. The formatting layer uses
//! this to decide inter-token spacing; it lives here because it shares the
//! visitor infrastructure.

use crate::context::SyntaxTreeContext;
use crate::syntax::{NodeTag, Symbol};
use crate::token::Token;

/// Calls `annotator(left, right, left_context, right_context)` for each
/// adjacent pair of `filtered_tokens` encountered among the tree's leaves.
pub fn annotate_tokens_using_syntax_context(
    tree: &Symbol,
    filtered_tokens: &[Token],
    mut annotator: impl FnMut(&Token, &Token, &[NodeTag], &[NodeTag]),
) {
    let mut walk = AnnotationWalk {
        filtered_tokens,
        cursor: 0,
        previous: None,
        annotator: &mut annotator,
    };
    let mut context = SyntaxTreeContext::new();
    walk.visit(tree, &mut context);
}

struct AnnotationWalk<'a, F>
where
    F: FnMut(&Token, &Token, &[NodeTag], &[NodeTag]),
{
    filtered_tokens: &'a [Token],
    cursor: usize,
    previous: Option<(Token, Vec<NodeTag>)>,
    annotator: &'a mut F,
}

impl<'a, F> AnnotationWalk<'a, F>
where
    F: FnMut(&Token, &Token, &[NodeTag], &[NodeTag]),
{
    fn visit<'t>(&mut self, symbol: &'t Symbol, context: &mut SyntaxTreeContext<'t>) {
        match symbol {
            Symbol::Leaf(token) => self.visit_leaf(token, context),
            Symbol::Node(node) => context.with_node(node, |context| {
                for child in node.present_children() {
                    self.visit(child, context);
                }
            }),
        }
    }

    fn visit_leaf(&mut self, leaf: &Token, context: &SyntaxTreeContext<'_>) {
        // Advance the filtered view to this leaf; tokens filtered out of
        // the view are skipped without annotation.
        while self
            .filtered_tokens
            .get(self.cursor)
            .map(|token| token.left() < leaf.left())
            .unwrap_or(false)
        {
            self.cursor += 1;
        }
        let Some(current) = self.filtered_tokens.get(self.cursor) else {
            return;
        };
        if current != leaf {
            return;
        }
        self.cursor += 1;
        let snapshot = context.tag_snapshot();
        if let Some((left, left_context)) = self.previous.take() {
            (self.annotator)(&left, leaf, &left_context, &snapshot);
        }
        self.previous = Some((*leaf, snapshot));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::analyzer::analyze_source;
    use crate::syntax::NodeTag;

    #[test]
    fn test_annotates_every_adjacent_pair() {
        let source = "module m;\nendmodule\n";
        let analyzed = analyze_source(source.to_string());
        let filtered: Vec<Token> = analyzed.text.filtered_tokens().copied().collect();
        let tree = analyzed.text.syntax_tree().unwrap();

        let mut pairs = Vec::new();
        annotate_tokens_using_syntax_context(tree, &filtered, |left, right, _, _| {
            pairs.push((
                left.text(analyzed.text.contents()).to_string(),
                right.text(analyzed.text.contents()).to_string(),
            ));
        });
        assert_eq!(
            vec![
                ("module".to_string(), "m".to_string()),
                ("m".to_string(), ";".to_string()),
                (";".to_string(), "endmodule".to_string()),
            ],
            pairs
        );
    }

    #[test]
    fn test_contexts_follow_each_side() {
        let source = "module m;\nalways @* x = y;\nendmodule\n";
        let analyzed = analyze_source(source.to_string());
        let filtered: Vec<Token> = analyzed.text.filtered_tokens().copied().collect();
        let tree = analyzed.text.syntax_tree().unwrap();

        let mut saw_always_pair = false;
        annotate_tokens_using_syntax_context(tree, &filtered, |left, right, lctx, rctx| {
            let left_text = left.text(analyzed.text.contents());
            let right_text = right.text(analyzed.text.contents());
            if left_text == ";" && right_text == "always" {
                // Left semicolon belongs to the header, right keyword to
                // the always statement.
                assert!(!lctx.contains(&NodeTag::AlwaysStatement));
                assert!(rctx.contains(&NodeTag::AlwaysStatement));
                saw_always_pair = true;
            }
        });
        assert!(saw_always_pair);
    }

    #[test]
    fn test_subset_view_skips_missing_tokens() {
        let source = "module m;\nendmodule\n";
        let analyzed = analyze_source(source.to_string());
        // Keep only identifier-ish tokens in the view.
        let filtered: Vec<Token> = analyzed
            .text
            .filtered_tokens()
            .filter(|t| t.span.len() > 1)
            .copied()
            .collect();
        let tree = analyzed.text.syntax_tree().unwrap();

        let mut count = 0;
        annotate_tokens_using_syntax_context(tree, &filtered, |_, _, _, _| count += 1);
        assert_eq!(filtered.len() - 1, count);
    }
}
