use std::collections::BTreeSet;

use crate::rules::{
    is_lower_snake_case_with_digits, is_name_all_caps_underscores_digits, style_guide_citation,
    LintRuleDescriptor, TokenStreamLintRule, TokenStreamRule,
};
use crate::token::{Token, TokenKind};
use crate::violation::{LintRuleStatus, LintViolation};

static MESSAGE: &str = "Macro names must contain only CAPITALS, underscores, and digits.  \
                        Exception: UVM-like macros.";

enum State {
    Normal,
    ExpectPPIdentifier,
}

/// Checks `` `define `` names against ALL_CAPS, with the UVM exceptions:
/// `uvm_*` names must be lower_snake_case, `UVM_*` names ALL_CAPS.
pub(crate) struct MacroNameStyleRule {
    state: State,
    violations: BTreeSet<LintViolation>,
}

impl Default for MacroNameStyleRule {
    fn default() -> Self {
        Self {
            state: State::Normal,
            violations: BTreeSet::new(),
        }
    }
}

impl TokenStreamLintRule for MacroNameStyleRule {
    fn handle_token(&mut self, token: Token, source: &str) {
        match self.state {
            State::Normal => {
                if token.kind == TokenKind::PPDefine {
                    self.state = State::ExpectPPIdentifier;
                }
            }
            State::ExpectPPIdentifier => {
                if token.kind == TokenKind::PPIdentifier {
                    let name = token.text(source);
                    let ok = if name.starts_with("uvm_") {
                        is_lower_snake_case_with_digits(name)
                    } else if name.starts_with("UVM_") {
                        is_name_all_caps_underscores_digits(name)
                    } else {
                        is_name_all_caps_underscores_digits(name)
                    };
                    if !ok {
                        self.violations.insert(LintViolation::new(token, MESSAGE));
                    }
                    self.state = State::Normal;
                }
            }
        }
    }

    fn report(&self) -> LintRuleStatus {
        LintRuleStatus::new(
            self.violations.clone(),
            MACRO_NAME_STYLE.descriptor.name,
            style_guide_citation(MACRO_NAME_STYLE.descriptor.topic),
        )
    }
}

pub const MACRO_NAME_STYLE: TokenStreamRule = TokenStreamRule {
    descriptor: LintRuleDescriptor {
        name: "macro-name-style",
        topic: "defines",
        desc: "Checks that every macro name follows ALL_CAPS naming convention. \
               Exception: UVM-like macros.",
    },
    new_rule: || Box::new(MacroNameStyleRule::default()),
};

#[cfg(test)]
mod test {
    use crate::test_utils::{lint_source_with_rules, total_violations, violation_positions};

    #[test]
    fn test_all_caps_names_pass() {
        let source = "`define WIDTH 8\n`define DATA_BUS_2 16\n";
        let statuses = lint_source_with_rules(source, "t.sv", "macro-name-style");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_lowercase_name_is_reported_at_the_name() {
        let source = "`define width 8\n";
        let statuses = lint_source_with_rules(source, "t.sv", "macro-name-style");
        assert_eq!(
            vec![(1, 9)],
            violation_positions(&statuses, "macro-name-style", source)
        );
    }

    #[test]
    fn test_mixed_case_name_is_reported() {
        let source = "`define DataWidth 8\n";
        let statuses = lint_source_with_rules(source, "t.sv", "macro-name-style");
        assert_eq!(1, total_violations(&statuses));
    }

    #[test]
    fn test_uvm_lowercase_macros_are_exempt() {
        let source = "`define uvm_field_int_2 ...\n";
        let statuses = lint_source_with_rules(source, "t.sv", "macro-name-style");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_uvm_lowercase_with_caps_is_reported() {
        let source = "`define uvm_FieldInt x\n";
        let statuses = lint_source_with_rules(source, "t.sv", "macro-name-style");
        assert_eq!(1, total_violations(&statuses));
    }

    #[test]
    fn test_uvm_uppercase_macros_must_be_all_caps() {
        let source = "`define UVM_MAX_STREAMBITS 4096\n`define UVM_BadName 1\n";
        let statuses = lint_source_with_rules(source, "t.sv", "macro-name-style");
        assert_eq!(1, total_violations(&statuses));
    }

    #[test]
    fn test_macro_uses_are_not_checked() {
        let source = "module m;\ninitial $display(`some_macro);\nendmodule\n";
        let statuses = lint_source_with_rules(source, "t.sv", "macro-name-style");
        assert_eq!(0, total_violations(&statuses));
    }
}
