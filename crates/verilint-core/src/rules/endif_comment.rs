use std::collections::BTreeSet;

use crate::rules::{
    style_guide_citation, LintRuleDescriptor, TokenStreamLintRule, TokenStreamRule,
};
use crate::token::{strip_comment_text, Token, TokenKind};
use crate::violation::{LintRuleStatus, LintViolation};

static MESSAGE: &str = "`endif should be followed on the same line by a comment that matches \
                        the opening `ifdef/`ifndef.";

enum State {
    Normal,
    ExpectPPIdentifier,
    ExpectEndifComment,
}

/// Tracks the stack of `` `ifdef ``/`` `ifndef `` argument names; each
/// `` `endif `` must be followed on its own line (whitespace skipped) by a
/// comment equal to the name it closes.
pub(crate) struct EndifCommentRule {
    state: State,
    /// Nested conditional argument tokens, innermost last.
    conditional_scopes: Vec<Token>,
    last_endif: Option<Token>,
    violations: BTreeSet<LintViolation>,
}

impl Default for EndifCommentRule {
    fn default() -> Self {
        Self {
            state: State::Normal,
            conditional_scopes: Vec::new(),
            last_endif: None,
            violations: BTreeSet::new(),
        }
    }
}

impl EndifCommentRule {
    fn report_missing_comment(&mut self, expected: &str) {
        if let Some(endif) = self.last_endif {
            self.violations
                .insert(LintViolation::new(endif, format!("{MESSAGE} ({expected})")));
        }
    }
}

impl TokenStreamLintRule for EndifCommentRule {
    fn handle_token(&mut self, token: Token, source: &str) {
        match self.state {
            State::Normal => match token.kind {
                // `else and `elsif are neither examined nor used here.
                TokenKind::PPIfdef | TokenKind::PPIfndef => {
                    self.state = State::ExpectPPIdentifier;
                }
                TokenKind::PPEndif => {
                    self.last_endif = Some(token);
                    self.state = State::ExpectEndifComment;
                }
                _ => {}
            },
            State::ExpectPPIdentifier => {
                // Anything other than the argument would be a preprocessing
                // error, diagnosed elsewhere.
                if token.kind == TokenKind::PPIdentifier {
                    self.conditional_scopes.push(token);
                    self.state = State::Normal;
                }
            }
            State::ExpectEndifComment => {
                let Some(opening) = self.conditional_scopes.last().copied() else {
                    // Unbalanced `endif.
                    self.state = State::Normal;
                    return;
                };
                let expected = opening.text(source);
                match token.kind {
                    TokenKind::Space => {}
                    TokenKind::EolComment | TokenKind::BlockComment => {
                        // Allow either `// NAME` or `/* NAME */`.
                        if strip_comment_text(token.text(source)) != expected {
                            let expected = expected.to_string();
                            self.report_missing_comment(&expected);
                        }
                        self.conditional_scopes.pop();
                        self.state = State::Normal;
                    }
                    // Includes newline and EOF: the line ended without a
                    // comment.
                    _ => {
                        let expected = expected.to_string();
                        self.report_missing_comment(&expected);
                        self.conditional_scopes.pop();
                        self.state = State::Normal;
                    }
                }
            }
        }
    }

    fn report(&self) -> LintRuleStatus {
        LintRuleStatus::new(
            self.violations.clone(),
            ENDIF_COMMENT.descriptor.name,
            style_guide_citation(ENDIF_COMMENT.descriptor.topic),
        )
    }
}

pub const ENDIF_COMMENT: TokenStreamRule = TokenStreamRule {
    descriptor: LintRuleDescriptor {
        name: "endif-comment",
        topic: "endif-comment",
        desc: "Checks that a `endif directive is followed by a comment that matches the \
               name of the opening `ifdef or `ifndef.",
    },
    new_rule: || Box::new(EndifCommentRule::default()),
};

#[cfg(test)]
mod test {
    use crate::test_utils::{lint_source_with_rules, total_violations, violation_positions};

    #[test]
    fn test_missing_comment_is_reported_at_the_endif() {
        let source = "`ifdef SIM\nmodule foo; endmodule\n`endif\n";
        let statuses = lint_source_with_rules(source, "t.sv", "endif-comment");
        assert_eq!(
            vec![(3, 1)],
            violation_positions(&statuses, "endif-comment", source)
        );
    }

    #[test]
    fn test_matching_eol_comment_passes() {
        let source = "`ifdef SIM\n`endif // SIM\n";
        let statuses = lint_source_with_rules(source, "t.sv", "endif-comment");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_matching_block_comment_passes() {
        let source = "`ifndef TOP_GUARD\n`endif /* TOP_GUARD */\n";
        let statuses = lint_source_with_rules(source, "t.sv", "endif-comment");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_wrong_name_is_reported() {
        let source = "`ifdef SIM\n`endif // OTHER\n";
        let statuses = lint_source_with_rules(source, "t.sv", "endif-comment");
        assert_eq!(1, total_violations(&statuses));
        let status = &statuses
            .iter()
            .find(|s| s.rule_name == "endif-comment")
            .unwrap();
        assert!(status
            .violations
            .iter()
            .next()
            .unwrap()
            .reason()
            .ends_with("(SIM)"));
    }

    #[test]
    fn test_nested_conditionals_match_innermost_first() {
        let source = "\
`ifdef OUTER
`ifdef INNER
`endif // INNER
`endif // OUTER
";
        let statuses = lint_source_with_rules(source, "t.sv", "endif-comment");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_endif_at_eof_without_comment() {
        let source = "`ifdef SIM\n`endif";
        let statuses = lint_source_with_rules(source, "t.sv", "endif-comment");
        assert_eq!(1, total_violations(&statuses));
    }

    #[test]
    fn test_unbalanced_endif_is_ignored() {
        let source = "`endif\n";
        let statuses = lint_source_with_rules(source, "t.sv", "endif-comment");
        assert_eq!(0, total_violations(&statuses));
    }
}
