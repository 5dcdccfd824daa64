//! The four category drivers and the orchestrator that runs them all over
//! one file, applying waivers before results are reported.

use std::fs;

use anyhow::{Context, Result};

use crate::config::LinterConfiguration;
use crate::context::SyntaxTreeContext;
use crate::position::LineColumnMap;
use crate::rules::{
    LineLintRule, SourceLine, SyntaxTreeLintRule, TextStructureLintRule, TokenStreamLintRule,
};
use crate::syntax::Symbol;
use crate::text_structure::TextStructure;
use crate::token::Token;
use crate::violation::LintRuleStatus;
use crate::waiver::{verilog_waiver_builder, LintWaiverBuilder};

/// Runs line rules across the source lines in order.
#[derive(Default)]
pub struct LineLinter {
    rules: Vec<Box<dyn LineLintRule>>,
}

impl LineLinter {
    pub fn add_rule(&mut self, rule: Box<dyn LineLintRule>) {
        self.rules.push(rule);
    }

    pub fn lint(&mut self, lines: &[SourceLine<'_>]) {
        for line in lines {
            for rule in &mut self.rules {
                rule.handle_line(line);
            }
        }
    }

    pub fn report_status(&self) -> Vec<LintRuleStatus> {
        self.rules.iter().map(|rule| rule.report()).collect()
    }
}

/// Runs token-stream rules across the full (pre-filter) token sequence.
#[derive(Default)]
pub struct TokenStreamLinter {
    rules: Vec<Box<dyn TokenStreamLintRule>>,
}

impl TokenStreamLinter {
    pub fn add_rule(&mut self, rule: Box<dyn TokenStreamLintRule>) {
        self.rules.push(rule);
    }

    pub fn lint(&mut self, tokens: &[Token], source: &str) {
        for token in tokens {
            for rule in &mut self.rules {
                rule.handle_token(*token, source);
            }
        }
    }

    pub fn report_status(&self) -> Vec<LintRuleStatus> {
        self.rules.iter().map(|rule| rule.report()).collect()
    }
}

/// Context-carrying pre-order walker: each visited node is pushed onto the
/// ancestor stack before its children are visited, so every rule sees its
/// ancestor chain.
#[derive(Default)]
pub struct SyntaxTreeLinter {
    rules: Vec<Box<dyn SyntaxTreeLintRule>>,
}

impl SyntaxTreeLinter {
    pub fn add_rule(&mut self, rule: Box<dyn SyntaxTreeLintRule>) {
        self.rules.push(rule);
    }

    pub fn lint(&mut self, tree: &Symbol, source: &str) {
        let mut context = SyntaxTreeContext::new();
        lint_symbol(&mut self.rules, tree, &mut context, source);
    }

    pub fn report_status(&self) -> Vec<LintRuleStatus> {
        self.rules.iter().map(|rule| rule.report()).collect()
    }
}

fn lint_symbol<'t>(
    rules: &mut Vec<Box<dyn SyntaxTreeLintRule>>,
    symbol: &'t Symbol,
    context: &mut SyntaxTreeContext<'t>,
    source: &str,
) {
    match symbol {
        Symbol::Leaf(token) => {
            for rule in rules.iter_mut() {
                rule.handle_symbol(symbol, context, source);
                rule.handle_leaf(*token, context, source);
            }
        }
        Symbol::Node(node) => {
            for rule in rules.iter_mut() {
                rule.handle_symbol(symbol, context, source);
                rule.handle_node(node, context, source);
            }
            context.with_node(node, |context| {
                for child in node.present_children() {
                    lint_symbol(rules, child, context, source);
                }
            });
        }
    }
}

/// Runs text-structure rules, each once over the whole structure.
#[derive(Default)]
pub struct TextStructureLinter {
    rules: Vec<Box<dyn TextStructureLintRule>>,
}

impl TextStructureLinter {
    pub fn add_rule(&mut self, rule: Box<dyn TextStructureLintRule>) {
        self.rules.push(rule);
    }

    pub fn lint(&mut self, text: &TextStructure, filename: &str) {
        for rule in &mut self.rules {
            rule.lint(text, filename);
        }
    }

    pub fn report_status(&self) -> Vec<LintRuleStatus> {
        self.rules.iter().map(|rule| rule.report()).collect()
    }
}

/// Whole-file linter: owns one driver per category and the waiver builder.
pub struct Linter {
    line_linter: LineLinter,
    token_stream_linter: TokenStreamLinter,
    syntax_tree_linter: SyntaxTreeLinter,
    text_structure_linter: TextStructureLinter,
    waiver_builder: LintWaiverBuilder,
}

impl Default for Linter {
    fn default() -> Self {
        Self::new()
    }
}

impl Linter {
    pub fn new() -> Self {
        Self {
            line_linter: LineLinter::default(),
            token_stream_linter: TokenStreamLinter::default(),
            syntax_tree_linter: SyntaxTreeLinter::default(),
            text_structure_linter: TextStructureLinter::default(),
            waiver_builder: verilog_waiver_builder(),
        }
    }

    /// Instantiates and configures every enabled rule, and loads external
    /// waiver files. `lintee_filename` scopes `--file`-filtered waivers.
    pub fn configure(
        &mut self,
        configuration: &LinterConfiguration,
        lintee_filename: &str,
    ) -> Result<()> {
        for rule in configuration.create_text_structure_rules()? {
            self.text_structure_linter.add_rule(rule);
        }
        for rule in configuration.create_line_rules()? {
            self.line_linter.add_rule(rule);
        }
        for rule in configuration.create_token_stream_rules()? {
            self.token_stream_linter.add_rule(rule);
        }
        for rule in configuration.create_syntax_tree_rules()? {
            self.syntax_tree_linter.add_rule(rule);
        }

        for waiver_file in &configuration.external_waivers {
            let content = fs::read_to_string(waiver_file)
                .with_context(|| format!("can't read waiver file {}", waiver_file.display()))?;
            if content.is_empty() {
                continue;
            }
            self.waiver_builder.apply_external_waivers(
                lintee_filename,
                &waiver_file.to_string_lossy(),
                &content,
            )?;
        }
        Ok(())
    }

    /// Runs all four category drivers. Waivers are collected (and content
    /// regexes resolved) first, so the map is final before any filtering.
    pub fn lint(&mut self, text: &TextStructure, filename: &str) {
        self.waiver_builder.process_token_ranges_by_line(text);
        self.waiver_builder
            .lint_waiver_mut()
            .regex_to_lines(text.contents(), text.line_map());

        self.text_structure_linter.lint(text, filename);

        let lines = text.lines();
        let source_lines: Vec<SourceLine> = lines
            .iter()
            .enumerate()
            .map(|(number, line_text)| SourceLine {
                text: line_text,
                number,
                offset: text.line_map().start_of_line(number),
            })
            .collect();
        self.line_linter.lint(&source_lines);

        self.token_stream_linter.lint(text.tokens(), text.contents());

        if let Some(tree) = text.syntax_tree() {
            self.syntax_tree_linter.lint(tree, text.contents());
        }
    }

    /// Collects every rule's status and removes violations on waived lines.
    pub fn report_status(&self, line_map: &LineColumnMap) -> Vec<LintRuleStatus> {
        let waiver = self.waiver_builder.lint_waiver();
        let mut statuses = Vec::new();
        let reported = self
            .line_linter
            .report_status()
            .into_iter()
            .chain(self.text_structure_linter.report_status())
            .chain(self.token_stream_linter.report_status())
            .chain(self.syntax_tree_linter.report_status());
        for mut status in reported {
            if let Some(line_set) = waiver.lookup_line_set(status.rule_name) {
                status.waive_violations(|violation| {
                    let line = line_map.lookup(violation.span().start).line;
                    line_set.contains(line)
                });
            }
            statuses.push(status);
        }
        statuses
    }
}

/// Configures a fresh linter, runs it over the text structure, and returns
/// the waived statuses.
pub fn lint_text_structure(
    text: &TextStructure,
    filename: &str,
    configuration: &LinterConfiguration,
) -> Result<Vec<LintRuleStatus>> {
    let mut linter = Linter::new();
    linter.configure(configuration, filename)?;
    linter.lint(text, filename);
    Ok(linter.report_status(text.line_map()))
}
