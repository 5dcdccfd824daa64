use std::collections::BTreeSet;

use anyhow::{bail, Context, Result};

use crate::rules::{
    parse_name_values, style_guide_citation, LineLintRule, LineRule, LintRuleDescriptor,
    SourceLine,
};
use crate::token::ByteSpan;
use crate::violation::{LintRuleStatus, LintViolation};

const DEFAULT_LINE_LENGTH: usize = 100;

/// Flags lines longer than the configured byte limit, anchored at the
/// first excess byte.
pub(crate) struct LineLengthRule {
    violations: BTreeSet<LintViolation>,
    max_length: usize,
}

impl Default for LineLengthRule {
    fn default() -> Self {
        Self {
            violations: BTreeSet::new(),
            max_length: DEFAULT_LINE_LENGTH,
        }
    }
}

impl LineLintRule for LineLengthRule {
    fn handle_line(&mut self, line: &SourceLine<'_>) {
        let length = line.text.len();
        if length > self.max_length {
            let span = ByteSpan::new(line.offset + self.max_length, line.offset + length);
            self.violations.insert(LintViolation::at_span(
                span,
                format!(
                    "Line length exceeds max: {}; is: {}",
                    self.max_length, length
                ),
            ));
        }
    }

    fn report(&self) -> LintRuleStatus {
        LintRuleStatus::new(
            self.violations.clone(),
            LINE_LENGTH.descriptor.name,
            style_guide_citation(LINE_LENGTH.descriptor.topic),
        )
    }

    fn configure(&mut self, configuration: &str) -> Result<()> {
        for (key, value) in parse_name_values(configuration)? {
            match key {
                "length" => {
                    self.max_length = value
                        .parse()
                        .with_context(|| format!("invalid length '{value}'"))?;
                }
                other => bail!("unknown parameter '{other}'"),
            }
        }
        Ok(())
    }
}

pub const LINE_LENGTH: LineRule = LineRule {
    descriptor: LintRuleDescriptor {
        name: "line-length",
        topic: "line-length",
        desc: "Checks that all lines do not exceed the maximum allowed length.",
    },
    new_rule: || Box::new(LineLengthRule::default()),
};

#[cfg(test)]
mod test {
    use crate::test_utils::{lint_source_with_rules, total_violations, violation_positions};

    #[test]
    fn test_default_limit_is_100() {
        let long = format!("// {}", "x".repeat(100));
        let source = format!("{long}\nshort\n");
        let statuses = lint_source_with_rules(&source, "t.sv", "line-length");
        assert_eq!(
            vec![(1, 101)],
            violation_positions(&statuses, "line-length", &source)
        );
        let status = statuses
            .iter()
            .find(|s| s.rule_name == "line-length")
            .unwrap();
        let reason = status.violations.iter().next().unwrap().reason().to_string();
        assert_eq!("Line length exceeds max: 100; is: 103", reason);
    }

    #[test]
    fn test_exactly_at_limit_passes() {
        let source = format!("// {}\n", "x".repeat(97));
        assert_eq!(100, source.len() - 1);
        let statuses = lint_source_with_rules(&source, "t.sv", "line-length");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_configured_limit() {
        let source = "// this comment line runs past forty bytes\n";
        let statuses = lint_source_with_rules(source, "t.sv", "line-length=length:40");
        assert_eq!(
            vec![(1, 41)],
            violation_positions(&statuses, "line-length", source)
        );
    }

    #[test]
    fn test_unknown_parameter_is_rejected() {
        use crate::rules::LineLintRule;
        let mut rule = super::LineLengthRule::default();
        assert!(rule.configure("bogus:1").is_err());
        assert!(rule.configure("length:80").is_ok());
        assert!(rule.configure("").is_ok());
    }
}
