use std::collections::BTreeSet;

use crate::parser::{find_module_declarations, get_module_name_token};
use crate::rules::{
    style_guide_citation, LintRuleDescriptor, TextStructureLintRule, TextStructureRule,
};
use crate::text_structure::TextStructure;
use crate::violation::{LintRuleStatus, LintViolation};

static MESSAGE: &str = "Each file should have only one module declaration. Found: ";

/// Nested modules are allowed; more than one top-level module is reported
/// once, at the second declaration, with the total count.
#[derive(Default)]
pub(crate) struct OneModulePerFileRule {
    violations: BTreeSet<LintViolation>,
}

impl TextStructureLintRule for OneModulePerFileRule {
    fn lint(&mut self, text: &TextStructure, _filename: &str) {
        let Some(tree) = text.syntax_tree() else {
            return;
        };
        let top_level_modules: Vec<_> = find_module_declarations(tree)
            .into_iter()
            .filter(|(_, nested)| !nested)
            .map(|(module, _)| module)
            .collect();
        if top_level_modules.len() <= 1 {
            return;
        }
        if let Some(name_token) = get_module_name_token(top_level_modules[1]) {
            self.violations.insert(LintViolation::new(
                name_token,
                format!("{MESSAGE}{}", top_level_modules.len()),
            ));
        }
    }

    fn report(&self) -> LintRuleStatus {
        LintRuleStatus::new(
            self.violations.clone(),
            ONE_MODULE_PER_FILE.descriptor.name,
            style_guide_citation(ONE_MODULE_PER_FILE.descriptor.topic),
        )
    }
}

pub const ONE_MODULE_PER_FILE: TextStructureRule = TextStructureRule {
    descriptor: LintRuleDescriptor {
        name: "one-module-per-file",
        topic: "file-extensions",
        desc: "Checks that at most one module is declared per file.",
    },
    new_rule: || Box::new(OneModulePerFileRule::default()),
};

#[cfg(test)]
mod test {
    use crate::test_utils::{lint_source_with_rules, total_violations, violation_positions};

    #[test]
    fn test_single_module_passes() {
        let source = "module foo;\nendmodule\n";
        let statuses = lint_source_with_rules(source, "foo.sv", "one-module-per-file");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_second_module_is_reported_with_count() {
        let source = "module a;\nendmodule\nmodule b;\nendmodule\nmodule c;\nendmodule\n";
        let statuses = lint_source_with_rules(source, "a.sv", "one-module-per-file");
        // One finding, at the second declaration, counting all three.
        assert_eq!(
            vec![(3, 8)],
            violation_positions(&statuses, "one-module-per-file", source)
        );
        let status = statuses
            .iter()
            .find(|s| s.rule_name == "one-module-per-file")
            .unwrap();
        assert!(status
            .violations
            .iter()
            .next()
            .unwrap()
            .reason()
            .ends_with("Found: 3"));
    }

    #[test]
    fn test_nested_modules_are_allowed() {
        let source = "module outer;\nmodule inner;\nendmodule\nendmodule\n";
        let statuses = lint_source_with_rules(source, "outer.sv", "one-module-per-file");
        assert_eq!(0, total_violations(&statuses));
    }
}
