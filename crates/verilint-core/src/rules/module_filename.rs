use std::collections::BTreeSet;
use std::path::Path;

use crate::parser::{find_module_declarations, get_module_name_token};
use crate::rules::{
    style_guide_citation, LintRuleDescriptor, TextStructureLintRule, TextStructureRule,
};
use crate::text_structure::TextStructure;
use crate::violation::{LintRuleStatus, LintViolation};

static MESSAGE: &str =
    "Declared module does not match the first dot-delimited component of file name: ";

/// At least one non-nested module must match the basename stem of the
/// file; otherwise the last module declaration is reported.
#[derive(Default)]
pub(crate) struct ModuleFilenameRule {
    violations: BTreeSet<LintViolation>,
}

impl TextStructureLintRule for ModuleFilenameRule {
    fn lint(&mut self, text: &TextStructure, filename: &str) {
        let Some(tree) = text.syntax_tree() else {
            return;
        };
        let source = text.contents();

        // Nested module declarations don't name the file.
        let top_level_modules: Vec<_> = find_module_declarations(tree)
            .into_iter()
            .filter(|(_, nested)| !nested)
            .map(|(module, _)| module)
            .collect();
        if top_level_modules.is_empty() {
            return;
        }

        let basename = Path::new(filename)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let unit_name = basename.split('.').next().unwrap_or("");
        if unit_name.is_empty() {
            return;
        }

        let any_matches = top_level_modules.iter().any(|module| {
            get_module_name_token(module)
                .map(|token| token.text(source) == unit_name)
                .unwrap_or(false)
        });
        if any_matches {
            return;
        }

        // Report on the last module declaration only.
        if let Some(name_token) = top_level_modules
            .last()
            .and_then(|module| get_module_name_token(module))
        {
            self.violations.insert(LintViolation::new(
                name_token,
                format!("{MESSAGE}\"{unit_name}\""),
            ));
        }
    }

    fn report(&self) -> LintRuleStatus {
        LintRuleStatus::new(
            self.violations.clone(),
            MODULE_FILENAME.descriptor.name,
            style_guide_citation(MODULE_FILENAME.descriptor.topic),
        )
    }
}

pub const MODULE_FILENAME: TextStructureRule = TextStructureRule {
    descriptor: LintRuleDescriptor {
        name: "module-filename",
        topic: "file-names",
        desc: "If a module is declared, checks that at least one module matches the \
               first dot-delimited component of the file name.",
    },
    new_rule: || Box::new(ModuleFilenameRule::default()),
};

#[cfg(test)]
mod test {
    use crate::test_utils::{lint_source_with_rules, total_violations, violation_positions};

    #[test]
    fn test_mismatched_module_is_reported_at_its_name() {
        let source = "module bar;\nendmodule\n";
        let statuses = lint_source_with_rules(source, "foo.sv", "module-filename");
        assert_eq!(
            vec![(1, 8)],
            violation_positions(&statuses, "module-filename", source)
        );
        let status = statuses
            .iter()
            .find(|s| s.rule_name == "module-filename")
            .unwrap();
        assert!(status
            .violations
            .iter()
            .next()
            .unwrap()
            .reason()
            .contains("\"foo\""));
    }

    #[test]
    fn test_matching_module_passes() {
        let source = "module foo;\nendmodule\n";
        let statuses = lint_source_with_rules(source, "rtl/foo.sv", "module-filename");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_dotted_filename_uses_first_component() {
        let source = "module foo;\nendmodule\n";
        let statuses = lint_source_with_rules(source, "foo.behavioral.sv", "module-filename");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_one_of_many_matching_suppresses_finding() {
        let source = "module helper;\nendmodule\nmodule foo;\nendmodule\n";
        let statuses = lint_source_with_rules(source, "foo.sv", "module-filename");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_nested_module_name_does_not_count() {
        let source = "module bar;\nmodule foo;\nendmodule\nendmodule\n";
        let statuses = lint_source_with_rules(source, "foo.sv", "module-filename");
        assert_eq!(1, total_violations(&statuses));
    }

    #[test]
    fn test_file_without_modules_passes() {
        let source = "package foo_pkg;\nendpackage\n";
        let statuses = lint_source_with_rules(source, "foo.sv", "module-filename");
        assert_eq!(0, total_violations(&statuses));
    }

    #[test]
    fn test_report_points_at_last_module() {
        let source = "module a;\nendmodule\nmodule b;\nendmodule\n";
        let statuses = lint_source_with_rules(source, "foo.sv", "module-filename");
        assert_eq!(
            vec![(3, 8)],
            violation_positions(&statuses, "module-filename", source)
        );
    }
}
