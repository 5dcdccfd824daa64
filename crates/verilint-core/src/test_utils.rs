//! Shared fixtures for unit tests: tree builders and a one-call lint
//! pipeline so rule tests stay short.

#![cfg(any(test, feature = "testing"))]

use crate::analyzer::analyze_source;
use crate::config::{LinterConfiguration, RuleBundle, RuleSet};
use crate::linter::lint_text_structure;
use crate::position::LineColumnMap;
use crate::syntax::{ChildSlot, NodeTag, Symbol, SyntaxNode};
use crate::token::Token;
use crate::violation::LintRuleStatus;

/// Builds an internal node with the given (possibly nil) children.
pub fn node(tag: NodeTag, children: Vec<ChildSlot>) -> Symbol {
    Symbol::Node(SyntaxNode::with_children(tag, children))
}

pub fn leaf(token: Token) -> Symbol {
    Symbol::Leaf(token)
}

/// Analyzes `source` and lints it with exactly the rules in `bundle`
/// (comma-separated, `rule` or `rule=config` entries).
pub fn lint_source_with_rules(
    source: &str,
    filename: &str,
    bundle: &str,
) -> Vec<LintRuleStatus> {
    let analyzed = analyze_source(source.to_string());
    let mut configuration = LinterConfiguration::default();
    configuration.use_rule_set(RuleSet::None);
    configuration.use_rule_bundle(
        &RuleBundle::parse_configuration(bundle, ',').expect("test bundle must parse"),
    );
    lint_text_structure(&analyzed.text, filename, &configuration).expect("test lint must run")
}

/// All violations of one rule as 1-based `(line, column)` pairs, sorted.
pub fn violation_positions(
    statuses: &[LintRuleStatus],
    rule_name: &str,
    source: &str,
) -> Vec<(usize, usize)> {
    let line_map = LineColumnMap::new(source);
    statuses
        .iter()
        .filter(|status| status.rule_name == rule_name)
        .flat_map(|status| status.violations.iter())
        .map(|violation| {
            let position = line_map.lookup(violation.span().start);
            (position.line + 1, position.column + 1)
        })
        .collect()
}

/// Total finding count across all statuses.
pub fn total_violations(statuses: &[LintRuleStatus]) -> usize {
    statuses.iter().map(|status| status.violations.len()).sum()
}
