use std::collections::BTreeSet;

use crate::rules::{style_guide_citation, LineLintRule, LineRule, LintRuleDescriptor, SourceLine};
use crate::token::ByteSpan;
use crate::violation::{LintRuleStatus, LintViolation};

static MESSAGE: &str = "Use spaces, not tabs.";

/// Reports the first tab on each line.
#[derive(Default)]
pub(crate) struct NoTabsRule {
    violations: BTreeSet<LintViolation>,
}

impl LineLintRule for NoTabsRule {
    fn handle_line(&mut self, line: &SourceLine<'_>) {
        if let Some(tab_position) = line.text.find('\t') {
            let span = ByteSpan::new(line.offset + tab_position, line.offset + tab_position + 1);
            self.violations.insert(LintViolation::at_span(span, MESSAGE));
        }
    }

    fn report(&self) -> LintRuleStatus {
        LintRuleStatus::new(
            self.violations.clone(),
            NO_TABS.descriptor.name,
            style_guide_citation(NO_TABS.descriptor.topic),
        )
    }
}

pub const NO_TABS: LineRule = LineRule {
    descriptor: LintRuleDescriptor {
        name: "no-tabs",
        topic: "tabs",
        desc: "Checks that no tabs are used. Spaces should be used instead of tabs.",
    },
    new_rule: || Box::new(NoTabsRule::default()),
};

#[cfg(test)]
mod test {
    use crate::test_utils::{lint_source_with_rules, total_violations, violation_positions};

    #[test]
    fn test_reports_first_tab_per_line() {
        let source = "module\tm;\n\twire\tw;\nendmodule\n";
        let statuses = lint_source_with_rules(source, "t.sv", "no-tabs");
        assert_eq!(
            vec![(1, 7), (2, 1)],
            violation_positions(&statuses, "no-tabs", source)
        );
    }

    #[test]
    fn test_clean_file_has_no_findings() {
        let source = "module m;\n  wire w;\nendmodule\n";
        let statuses = lint_source_with_rules(source, "t.sv", "no-tabs");
        assert_eq!(0, total_violations(&statuses));
    }
}
