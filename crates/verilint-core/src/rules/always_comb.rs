use std::collections::BTreeSet;

use crate::context::SyntaxTreeContext;
use crate::parser::{always_has_event_control_star, get_always_keyword};
use crate::rules::{style_guide_citation, LintRuleDescriptor, SyntaxTreeLintRule, SyntaxTreeRule};
use crate::syntax::{NodeTag, SyntaxNode};
use crate::violation::{LintRuleStatus, LintViolation};

static MESSAGE: &str = "Use 'always_comb' instead of 'always @*'.";

/// Matches `always` statements whose event control covers all signals
/// (`@*` or `@(*)`); those should be `always_comb`.
#[derive(Default)]
pub(crate) struct AlwaysCombRule {
    violations: BTreeSet<LintViolation>,
}

impl SyntaxTreeLintRule for AlwaysCombRule {
    fn handle_node(&mut self, node: &SyntaxNode, context: &SyntaxTreeContext<'_>, source: &str) {
        if node.tag() != NodeTag::AlwaysStatement {
            return;
        }
        let Some(keyword) = get_always_keyword(node) else {
            return;
        };
        if keyword.text(source) == "always" && always_has_event_control_star(node, source) {
            self.violations
                .insert(LintViolation::with_context(keyword, MESSAGE, context));
        }
    }

    fn report(&self) -> LintRuleStatus {
        LintRuleStatus::new(
            self.violations.clone(),
            ALWAYS_COMB.descriptor.name,
            style_guide_citation(ALWAYS_COMB.descriptor.topic),
        )
    }
}

pub const ALWAYS_COMB: SyntaxTreeRule = SyntaxTreeRule {
    descriptor: LintRuleDescriptor {
        name: "always-comb",
        topic: "combinational-logic",
        desc: "Checks that there are no occurrences of 'always @*'. Use 'always_comb' \
               instead.",
    },
    new_rule: || Box::new(AlwaysCombRule::default()),
};

#[cfg(test)]
mod test {
    use crate::test_utils::{lint_source_with_rules, total_violations, violation_positions};

    #[test]
    fn test_always_star_is_reported() {
        let source = "module m;\nalways @* begin\nf = g + h;\nend\nendmodule\n";
        let statuses = lint_source_with_rules(source, "t.sv", "always-comb");
        assert_eq!(
            vec![(2, 1)],
            violation_positions(&statuses, "always-comb", source)
        );
    }

    #[test]
    fn test_parenthesized_star_is_reported() {
        let source = "module m;\nalways @(*) f = g;\nendmodule\n";
        let statuses = lint_source_with_rules(source, "t.sv", "always-comb");
        assert_eq!(1, total_violations(&statuses));
    }

    #[test]
    fn test_always_comb_passes() {
        let source = "module m;\nalways_comb begin\nf = g;\nend\nendmodule\n";
        let statuses = lint_source_with_rules(source, "t.sv", "always-comb");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_edge_sensitive_always_passes() {
        let source = "module m;\nalways @(posedge clk) q <= d;\nendmodule\n";
        let statuses = lint_source_with_rules(source, "t.sv", "always-comb");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_multiple_offenders_are_all_reported() {
        let source = "module m;\nalways @* a = b;\nalways @(*) c = d;\nendmodule\n";
        let statuses = lint_source_with_rules(source, "t.sv", "always-comb");
        assert_eq!(2, total_violations(&statuses));
    }
}
