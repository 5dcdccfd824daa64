//! Reporting types shared by every rule: violations, suggested fixes, the
//! per-rule status, and the diagnostic formatter.

use std::collections::BTreeSet;

use anyhow::{bail, Result};

use crate::context::SyntaxTreeContext;
use crate::position::LineColumnMap;
use crate::syntax::{leftmost_leaf, NodeTag, Symbol};
use crate::token::{ByteSpan, Token};

/// One text replacement within an autofix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplacementEdit {
    pub span: ByteSpan,
    pub replacement: String,
}

/// A set of non-overlapping edits plus a human-readable description.
/// Overlap is rejected at construction; the edits are normalized to offset
/// order so application is independent of how they were listed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AutoFix {
    description: String,
    edits: Vec<ReplacementEdit>,
}

impl AutoFix {
    pub fn new(description: impl Into<String>, edits: Vec<ReplacementEdit>) -> Result<Self> {
        let mut edits = edits;
        edits.sort();
        for pair in edits.windows(2) {
            if pair[1].span.start < pair[0].span.end {
                bail!(
                    "conflicting autofix edits: [{}, {}) overlaps [{}, {})",
                    pair[0].span.start,
                    pair[0].span.end,
                    pair[1].span.start,
                    pair[1].span.end
                );
            }
        }
        Ok(Self {
            description: description.into(),
            edits,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn edits(&self) -> &[ReplacementEdit] {
        &self.edits
    }

    /// Concatenates the unedited spans of `base` with the replacements in
    /// positional order.
    pub fn apply(&self, base: &str) -> String {
        let mut result = String::with_capacity(base.len());
        let mut cursor = 0;
        for edit in &self.edits {
            result.push_str(&base[cursor..edit.span.start]);
            result.push_str(&edit.replacement);
            cursor = edit.span.end;
        }
        result.push_str(&base[cursor..]);
        result
    }
}

/// A single finding. Ordered by source position of its anchoring span.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LintViolation {
    span: ByteSpan,
    reason: String,
    /// Ancestor tags of the offending token, outermost first. Empty for
    /// non-syntax-tree analyses.
    context: Vec<NodeTag>,
    /// Positions substituted for `@` placeholders in the reason.
    related: Vec<ByteSpan>,
    fixes: Vec<AutoFix>,
}

impl LintViolation {
    /// Token-stream or line-based finding.
    pub fn new(token: Token, reason: impl Into<String>) -> Self {
        Self::at_span(token.span, reason)
    }

    pub fn at_span(span: ByteSpan, reason: impl Into<String>) -> Self {
        Self {
            span,
            reason: reason.into(),
            context: Vec::new(),
            related: Vec::new(),
            fixes: Vec::new(),
        }
    }

    /// Syntax-tree finding localized to a single token.
    pub fn with_context(token: Token, reason: impl Into<String>, context: &SyntaxTreeContext) -> Self {
        let mut violation = Self::at_span(token.span, reason);
        violation.context = context.tag_snapshot();
        violation
    }

    /// Syntax-tree finding on a whole subtree, reported at its leftmost
    /// leaf.
    pub fn on_symbol(root: &Symbol, reason: impl Into<String>, context: &SyntaxTreeContext) -> Self {
        let span = leftmost_leaf(root)
            .map(|leaf| leaf.span)
            .unwrap_or_else(|| ByteSpan::empty(0));
        let mut violation = Self::at_span(span, reason);
        violation.context = context.tag_snapshot();
        violation
    }

    pub fn with_related(mut self, related: Vec<ByteSpan>) -> Self {
        self.related = related;
        self
    }

    pub fn with_fixes(mut self, fixes: Vec<AutoFix>) -> Self {
        self.fixes = fixes;
        self
    }

    pub fn span(&self) -> ByteSpan {
        self.span
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn context(&self) -> &[NodeTag] {
        &self.context
    }

    pub fn related(&self) -> &[ByteSpan] {
        &self.related
    }

    pub fn fixes(&self) -> &[AutoFix] {
        &self.fixes
    }
}

/// The outcome of running one rule over one file.
#[derive(Debug, Clone)]
pub struct LintRuleStatus {
    pub rule_name: &'static str,
    pub url: String,
    pub violations: BTreeSet<LintViolation>,
}

impl LintRuleStatus {
    pub fn new(
        violations: BTreeSet<LintViolation>,
        rule_name: &'static str,
        url: impl Into<String>,
    ) -> Self {
        Self {
            rule_name,
            url: url.into(),
            violations,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Drops every violation for which `is_waived` returns true.
    pub fn waive_violations(&mut self, mut is_waived: impl FnMut(&LintViolation) -> bool) {
        self.violations.retain(|violation| !is_waived(violation));
    }
}

/// Renders statuses and violations as diagnostic lines.
pub struct LintStatusFormatter {
    line_map: LineColumnMap,
}

impl LintStatusFormatter {
    /// Takes the original text to build the offset translation table.
    pub fn new(text: &str) -> Self {
        Self {
            line_map: LineColumnMap::new(text),
        }
    }

    /// One line per violation:
    /// `<path>:<line>:<col>[:<endline>:<endcol>]: <reason> <url> [<rule>]`.
    pub fn format_violation(
        &self,
        out: &mut String,
        violation: &LintViolation,
        path: &str,
        url: &str,
        rule_name: &str,
    ) {
        let start = self.line_map.lookup(violation.span().start);
        out.push_str(path);
        out.push(':');
        out.push_str(&start.to_string());
        let end = self.line_map.lookup(violation.span().end);
        if end.line != start.line {
            out.push(':');
            out.push_str(&end.to_string());
        }
        out.push_str(": ");
        out.push_str(&self.expand_reason(violation, path));
        out.push(' ');
        out.push_str(url);
        out.push_str(" [");
        out.push_str(rule_name);
        out.push(']');
        out.push('\n');
    }

    /// Violations of a single status, in their natural (positional) order.
    pub fn format_lint_rule_status(&self, out: &mut String, status: &LintRuleStatus, path: &str) {
        for violation in &status.violations {
            self.format_violation(out, violation, path, &status.url, status.rule_name);
        }
    }

    /// All violations across statuses, merged and sorted by position. When
    /// `lines` is non-empty each finding is followed by the offending
    /// source line and a caret aligned by character count, so multi-byte
    /// UTF-8 prefixes do not skew it.
    pub fn format_lint_rule_statuses(
        &self,
        out: &mut String,
        statuses: &[LintRuleStatus],
        path: &str,
        lines: &[&str],
    ) {
        let mut merged: Vec<(&LintViolation, &LintRuleStatus)> = statuses
            .iter()
            .flat_map(|status| status.violations.iter().map(move |v| (v, status)))
            .collect();
        merged.sort_by_key(|(violation, _)| violation.span());

        for (violation, status) in merged {
            self.format_violation(out, violation, path, &status.url, status.rule_name);
            let cursor = self.line_map.lookup(violation.span().start);
            if cursor.line < lines.len() {
                let line = lines[cursor.line];
                out.push_str(line);
                out.push('\n');
                let prefix_chars = line[..cursor.column.min(line.len())].chars().count();
                for _ in 0..prefix_chars {
                    out.push(' ');
                }
                out.push_str("^\n");
            }
        }
    }

    /// `@` in a reason refers to the next related position and expands to
    /// `<path>:<line>:<col>`; `\@` is a literal `@`.
    fn expand_reason(&self, violation: &LintViolation, path: &str) -> String {
        let reason = violation.reason();
        let mut result = String::with_capacity(reason.len());
        let mut related = violation.related().iter();
        let mut chars = reason.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '\\' => match chars.next() {
                    Some('@') => result.push('@'),
                    Some(other) => {
                        result.push('\\');
                        result.push(other);
                    }
                    None => result.push('\\'),
                },
                '@' => match related.next() {
                    Some(span) => {
                        let position = self.line_map.lookup(span.start);
                        result.push_str(path);
                        result.push(':');
                        result.push_str(&position.to_string());
                    }
                    None => result.push('@'),
                },
                other => result.push(other),
            }
        }
        result
    }
}
