use std::collections::BTreeSet;

use crate::rules::{style_guide_citation, LineLintRule, LineRule, LintRuleDescriptor, SourceLine};
use crate::token::ByteSpan;
use crate::violation::{LintRuleStatus, LintViolation};

static MESSAGE: &str = "Remove trailing spaces.";

/// Flags the trailing-whitespace run at the end of a line, anchored where
/// it starts.
#[derive(Default)]
pub(crate) struct NoTrailingSpacesRule {
    violations: BTreeSet<LintViolation>,
}

impl LineLintRule for NoTrailingSpacesRule {
    fn handle_line(&mut self, line: &SourceLine<'_>) {
        // Lines already exclude the newline, so any trailing whitespace is
        // a finding.
        let trimmed_length = line.text.trim_end().len();
        if trimmed_length < line.text.len() {
            let span = ByteSpan::new(
                line.offset + trimmed_length,
                line.offset + line.text.len(),
            );
            self.violations.insert(LintViolation::at_span(span, MESSAGE));
        }
    }

    fn report(&self) -> LintRuleStatus {
        LintRuleStatus::new(
            self.violations.clone(),
            NO_TRAILING_SPACES.descriptor.name,
            style_guide_citation(NO_TRAILING_SPACES.descriptor.topic),
        )
    }
}

pub const NO_TRAILING_SPACES: LineRule = LineRule {
    descriptor: LintRuleDescriptor {
        name: "no-trailing-spaces",
        topic: "trailing-spaces",
        desc: "Checks that there are no trailing spaces on any lines.",
    },
    new_rule: || Box::new(NoTrailingSpacesRule::default()),
};

#[cfg(test)]
mod test {
    use crate::test_utils::{lint_source_with_rules, total_violations, violation_positions};

    #[test]
    fn test_reports_where_trailing_whitespace_starts() {
        let source = "module m;  \nwire w;\t\nendmodule\n";
        let statuses = lint_source_with_rules(source, "t.sv", "no-trailing-spaces");
        assert_eq!(
            vec![(1, 10), (2, 8)],
            violation_positions(&statuses, "no-trailing-spaces", source)
        );
    }

    #[test]
    fn test_whitespace_only_line_is_flagged() {
        let source = "module m;\n   \nendmodule\n";
        let statuses = lint_source_with_rules(source, "t.sv", "no-trailing-spaces");
        assert_eq!(
            vec![(2, 1)],
            violation_positions(&statuses, "no-trailing-spaces", source)
        );
    }

    #[test]
    fn test_clean_lines_pass() {
        let source = "module m;\nendmodule\n";
        let statuses = lint_source_with_rules(source, "t.sv", "no-trailing-spaces");
        assert_eq!(0, total_violations(&statuses));
    }
}
