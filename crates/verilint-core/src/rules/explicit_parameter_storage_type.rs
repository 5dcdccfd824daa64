use std::collections::BTreeSet;

use anyhow::{bail, Result};

use crate::context::SyntaxTreeContext;
use crate::parser::{
    get_param_name_token, get_param_type_info, is_param_type_declaration,
    param_has_string_assignment,
};
use crate::rules::{
    parse_name_values, style_guide_citation, LintRuleDescriptor, SyntaxTreeLintRule,
    SyntaxTreeRule,
};
use crate::syntax::{NodeTag, SyntaxNode};
use crate::violation::{LintRuleStatus, LintViolation};

static MESSAGE: &str = "Explicitly define a storage type for every parameter and localparam, ";

/// Every `parameter`/`localparam` must carry an explicit storage type.
/// `parameter type` declarations are exempt by construction; string-valued
/// parameters can be exempted via `exempt_type:string`.
#[derive(Default)]
pub(crate) struct ExplicitParameterStorageTypeRule {
    violations: BTreeSet<LintViolation>,
    exempt_string: bool,
}

impl SyntaxTreeLintRule for ExplicitParameterStorageTypeRule {
    fn handle_node(&mut self, node: &SyntaxNode, context: &SyntaxTreeContext<'_>, source: &str) {
        if node.tag() != NodeTag::ParamDeclaration {
            return;
        }
        if is_param_type_declaration(node) {
            return;
        }
        let Some(type_info) = get_param_type_info(node) else {
            return;
        };
        if !type_info.is_empty() {
            return;
        }
        // We can't evaluate the RHS type; the exemption covers only the
        // plain string-literal case.
        if self.exempt_string && param_has_string_assignment(node, source) {
            return;
        }
        if let Some(name) = get_param_name_token(node) {
            self.violations.insert(LintViolation::with_context(
                name,
                format!("{MESSAGE}({}).", name.text(source)),
                context,
            ));
        }
    }

    /// The only allowed exemption is `string`, a common type some older
    /// tools cannot express a storage type for.
    fn configure(&mut self, configuration: &str) -> Result<()> {
        for (key, value) in parse_name_values(configuration)? {
            match (key, value) {
                ("exempt_type", "") => self.exempt_string = false,
                ("exempt_type", "string") => self.exempt_string = true,
                ("exempt_type", other) => bail!("exempt_type does not support '{other}'"),
                (other, _) => bail!("unknown parameter '{other}'"),
            }
        }
        Ok(())
    }

    fn report(&self) -> LintRuleStatus {
        LintRuleStatus::new(
            self.violations.clone(),
            EXPLICIT_PARAMETER_STORAGE_TYPE.descriptor.name,
            style_guide_citation(EXPLICIT_PARAMETER_STORAGE_TYPE.descriptor.topic),
        )
    }
}

pub const EXPLICIT_PARAMETER_STORAGE_TYPE: SyntaxTreeRule = SyntaxTreeRule {
    descriptor: LintRuleDescriptor {
        name: "explicit-parameter-storage-type",
        topic: "constants",
        desc: "Checks that every 'parameter' and 'localparam' is declared with an \
               explicit storage type.",
    },
    new_rule: || Box::new(ExplicitParameterStorageTypeRule::default()),
};

#[cfg(test)]
mod test {
    use crate::test_utils::{lint_source_with_rules, total_violations, violation_positions};

    #[test]
    fn test_untyped_parameter_is_reported_at_its_name() {
        let source = "module m;\nparameter N = 4;\nendmodule\n";
        let statuses =
            lint_source_with_rules(source, "t.sv", "explicit-parameter-storage-type");
        assert_eq!(
            vec![(2, 11)],
            violation_positions(&statuses, "explicit-parameter-storage-type", source)
        );
        let status = statuses
            .iter()
            .find(|s| s.rule_name == "explicit-parameter-storage-type")
            .unwrap();
        assert!(status
            .violations
            .iter()
            .next()
            .unwrap()
            .reason()
            .ends_with("(N)."));
    }

    #[test]
    fn test_typed_parameter_passes() {
        let source = "module m;\nparameter int N = 4;\nlocalparam logic [7:0] B = 8'h0f;\nendmodule\n";
        let statuses =
            lint_source_with_rules(source, "t.sv", "explicit-parameter-storage-type");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_type_parameter_passes() {
        let source = "module m;\nparameter type T = int;\nendmodule\n";
        let statuses =
            lint_source_with_rules(source, "t.sv", "explicit-parameter-storage-type");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_untyped_localparam_is_reported() {
        let source = "module m;\nlocalparam Depth = 16;\nendmodule\n";
        let statuses =
            lint_source_with_rules(source, "t.sv", "explicit-parameter-storage-type");
        assert_eq!(1, total_violations(&statuses));
    }

    #[test]
    fn test_string_exemption_only_when_configured() {
        let source = "module m;\nparameter Name = \"adder\";\nendmodule\n";
        let without = lint_source_with_rules(source, "t.sv", "explicit-parameter-storage-type");
        assert_eq!(1, total_violations(&without));

        let with = lint_source_with_rules(
            source,
            "t.sv",
            "explicit-parameter-storage-type=exempt_type:string",
        );
        assert_eq!(0, total_violations(&with));
    }

    #[test]
    fn test_invalid_exemption_value_is_rejected() {
        use crate::rules::SyntaxTreeLintRule;
        let mut rule = super::ExplicitParameterStorageTypeRule::default();
        assert!(rule.configure("exempt_type:integer").is_err());
        assert!(rule.configure("exempt_type:string").is_ok());
        assert!(rule.configure("").is_ok());
    }

    #[test]
    fn test_header_parameter_is_checked() {
        let source = "module m #(parameter W = 8) ();\nendmodule\n";
        let statuses =
            lint_source_with_rules(source, "t.sv", "explicit-parameter-storage-type");
        assert_eq!(1, total_violations(&statuses));
    }
}
