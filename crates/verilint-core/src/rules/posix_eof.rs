use std::collections::BTreeSet;

use crate::rules::{
    style_guide_citation, LintRuleDescriptor, TextStructureLintRule, TextStructureRule,
};
use crate::text_structure::TextStructure;
use crate::token::ByteSpan;
use crate::violation::{AutoFix, LintRuleStatus, LintViolation, ReplacementEdit};

static MESSAGE: &str = "File must end with a newline.";

/// POSIX says files end with a newline. The finding points at the end of
/// the last line and carries an autofix appending one.
#[derive(Default)]
pub(crate) struct PosixEofRule {
    violations: BTreeSet<LintViolation>,
}

impl TextStructureLintRule for PosixEofRule {
    fn lint(&mut self, text: &TextStructure, _filename: &str) {
        let contents = text.contents();
        if contents.is_empty() || contents.ends_with('\n') {
            return;
        }
        let end = ByteSpan::empty(contents.len());
        let mut violation = LintViolation::at_span(end, MESSAGE);
        if let Ok(fix) = AutoFix::new(
            "Add newline at end of file",
            vec![ReplacementEdit {
                span: end,
                replacement: "\n".to_string(),
            }],
        ) {
            violation = violation.with_fixes(vec![fix]);
        }
        self.violations.insert(violation);
    }

    fn report(&self) -> LintRuleStatus {
        LintRuleStatus::new(
            self.violations.clone(),
            POSIX_EOF.descriptor.name,
            style_guide_citation(POSIX_EOF.descriptor.topic),
        )
    }
}

pub const POSIX_EOF: TextStructureRule = TextStructureRule {
    descriptor: LintRuleDescriptor {
        name: "posix-eof",
        topic: "posix-file-endings",
        desc: "Checks that the file ends with a newline.",
    },
    new_rule: || Box::new(PosixEofRule::default()),
};
