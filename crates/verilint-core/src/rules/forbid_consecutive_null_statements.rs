use std::collections::BTreeSet;

use crate::context::SyntaxTreeContext;
use crate::rules::{style_guide_citation, LintRuleDescriptor, SyntaxTreeLintRule, SyntaxTreeRule};
use crate::syntax::NodeTag;
use crate::token::{Token, TokenKind};
use crate::violation::{LintRuleStatus, LintViolation};

static MESSAGE: &str = "Do not use consecutive null statements like ';;'.";

enum State {
    Normal,
    ExpectNonSemicolon,
}

/// Flags `;;` outside of for-loop specifications, where `for (;;)` is
/// legitimate.
pub(crate) struct ForbidConsecutiveNullStatementsRule {
    state: State,
    violations: BTreeSet<LintViolation>,
}

impl Default for ForbidConsecutiveNullStatementsRule {
    fn default() -> Self {
        Self {
            state: State::Normal,
            violations: BTreeSet::new(),
        }
    }
}

impl SyntaxTreeLintRule for ForbidConsecutiveNullStatementsRule {
    fn handle_leaf(&mut self, leaf: Token, context: &SyntaxTreeContext<'_>, _source: &str) {
        if context.is_inside(NodeTag::ForSpec) {
            self.state = State::Normal;
            return;
        }
        match self.state {
            State::Normal => {
                if leaf.kind == TokenKind::Semicolon {
                    self.state = State::ExpectNonSemicolon;
                }
            }
            State::ExpectNonSemicolon => {
                if leaf.kind == TokenKind::Semicolon {
                    self.violations
                        .insert(LintViolation::with_context(leaf, MESSAGE, context));
                } else {
                    self.state = State::Normal;
                }
            }
        }
    }

    fn report(&self) -> LintRuleStatus {
        LintRuleStatus::new(
            self.violations.clone(),
            FORBID_CONSECUTIVE_NULL_STATEMENTS.descriptor.name,
            style_guide_citation(FORBID_CONSECUTIVE_NULL_STATEMENTS.descriptor.topic),
        )
    }
}

pub const FORBID_CONSECUTIVE_NULL_STATEMENTS: SyntaxTreeRule = SyntaxTreeRule {
    descriptor: LintRuleDescriptor {
        name: "forbid-consecutive-null-statements",
        topic: "redundant-semicolons",
        desc: "Checks that there are no occurrences of consecutive null statements \
               like ';;'.",
    },
    new_rule: || Box::new(ForbidConsecutiveNullStatementsRule::default()),
};

#[cfg(test)]
mod test {
    use crate::test_utils::{lint_source_with_rules, total_violations, violation_positions};

    #[test]
    fn test_double_semicolon_is_reported_at_the_second() {
        let source = "module m;\nwire w;;\nendmodule\n";
        let statuses =
            lint_source_with_rules(source, "t.sv", "forbid-consecutive-null-statements");
        assert_eq!(
            vec![(2, 8)],
            violation_positions(&statuses, "forbid-consecutive-null-statements", source)
        );
    }

    #[test]
    fn test_triple_semicolon_reports_twice() {
        let source = "module m;\nwire w;;;\nendmodule\n";
        let statuses =
            lint_source_with_rules(source, "t.sv", "forbid-consecutive-null-statements");
        assert_eq!(2, total_violations(&statuses));
    }

    #[test]
    fn test_for_loop_semicolons_are_exempt() {
        let source = "module m;\nalways @* begin\nfor (;;) x = y;\nend\nendmodule\n";
        let statuses =
            lint_source_with_rules(source, "t.sv", "forbid-consecutive-null-statements");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_single_semicolons_pass() {
        let source = "module m;\nwire a;\nwire b;\nendmodule\n";
        let statuses =
            lint_source_with_rules(source, "t.sv", "forbid-consecutive-null-statements");
        assert_eq!(0, total_violations(&statuses));
    }
}
