use std::collections::BTreeSet;

use crate::context::SyntaxTreeContext;
use crate::parser::{get_param_keyword, get_param_name_token};
use crate::rules::{
    is_name_all_caps_underscores_digits, is_upper_camel_case_with_digits, style_guide_citation,
    LintRuleDescriptor, SyntaxTreeLintRule, SyntaxTreeRule,
};
use crate::syntax::{NodeTag, SyntaxNode};
use crate::violation::{LintRuleStatus, LintViolation};

static PARAMETER_MESSAGE: &str = "Parameter names must be styled with UpperCamelCase or ALL_CAPS.";
static LOCALPARAM_MESSAGE: &str = "Localparam names must be styled with UpperCamelCase.";

/// Naming convention for `parameter` (UpperCamelCase or ALL_CAPS) and
/// `localparam` (UpperCamelCase) declarations.
#[derive(Default)]
pub(crate) struct ParameterNameStyleRule {
    violations: BTreeSet<LintViolation>,
}

impl SyntaxTreeLintRule for ParameterNameStyleRule {
    fn handle_node(&mut self, node: &SyntaxNode, context: &SyntaxTreeContext<'_>, source: &str) {
        if node.tag() != NodeTag::ParamDeclaration {
            return;
        }
        let Some(keyword) = get_param_keyword(node) else {
            return;
        };
        let Some(name_token) = get_param_name_token(node) else {
            return;
        };
        let name = name_token.text(source);
        match keyword.text(source) {
            "localparam" => {
                if !is_upper_camel_case_with_digits(name) {
                    self.violations.insert(LintViolation::with_context(
                        name_token,
                        LOCALPARAM_MESSAGE,
                        context,
                    ));
                }
            }
            "parameter" => {
                if !is_upper_camel_case_with_digits(name)
                    && !is_name_all_caps_underscores_digits(name)
                {
                    self.violations.insert(LintViolation::with_context(
                        name_token,
                        PARAMETER_MESSAGE,
                        context,
                    ));
                }
            }
            _ => {}
        }
    }

    fn report(&self) -> LintRuleStatus {
        LintRuleStatus::new(
            self.violations.clone(),
            PARAMETER_NAME_STYLE.descriptor.name,
            style_guide_citation(PARAMETER_NAME_STYLE.descriptor.topic),
        )
    }
}

pub const PARAMETER_NAME_STYLE: SyntaxTreeRule = SyntaxTreeRule {
    descriptor: LintRuleDescriptor {
        name: "parameter-name-style",
        topic: "constants",
        desc: "Checks that parameter names follow UpperCamelCase or ALL_CAPS and that \
               localparam names follow UpperCamelCase.",
    },
    new_rule: || Box::new(ParameterNameStyleRule::default()),
};
