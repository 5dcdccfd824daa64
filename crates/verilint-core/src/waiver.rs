//! Waivers: suppressing findings of a given rule on given lines.
//!
//! Two sources feed one map: in-source comment directives
//! (`// verilog_lint: waive <rule>` and the waive-start/waive-stop range
//! form) and external waiver-config files
//! (`waive --rule=<rule> [--line=N[:M]] [--location=<regex>]`).

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;

use crate::position::LineColumnMap;
use crate::rules;
use crate::text_structure::TextStructure;
use crate::token::{strip_comment_text, Token, TokenKind};

/// Comment trigger word and commands recognized in source files.
pub const WAIVER_TRIGGER: &str = "verilog_lint";
pub const WAIVE_ONE_LINE_COMMAND: &str = "waive";
pub const WAIVE_START_COMMAND: &str = "waive-start";
pub const WAIVE_STOP_COMMAND: &str = "waive-stop";

/// Compact set of line numbers as sorted, disjoint half-open intervals.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineNumberSet {
    ranges: Vec<(usize, usize)>,
}

impl LineNumberSet {
    pub fn insert(&mut self, line: usize) {
        self.insert_range(line, line + 1);
    }

    /// Inserts `[begin, end)`, merging overlapping and adjacent intervals.
    pub fn insert_range(&mut self, begin: usize, end: usize) {
        if begin >= end {
            return;
        }
        let mut result = Vec::with_capacity(self.ranges.len() + 1);
        let mut merged = (begin, end);
        let mut placed = false;
        for &(start, stop) in &self.ranges {
            if stop < merged.0 {
                result.push((start, stop));
            } else if start > merged.1 {
                if !placed {
                    result.push(merged);
                    placed = true;
                }
                result.push((start, stop));
            } else {
                merged.0 = merged.0.min(start);
                merged.1 = merged.1.max(stop);
            }
        }
        if !placed {
            result.push(merged);
        }
        self.ranges = result;
    }

    pub fn contains(&self, line: usize) -> bool {
        let index = self.ranges.partition_point(|&(start, _)| start <= line);
        index > 0 && line < self.ranges[index - 1].1
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[(usize, usize)] {
        &self.ranges
    }
}

/// Per-rule waived line sets, plus content regexes pending conversion.
#[derive(Debug, Default)]
pub struct LintWaiver {
    waiver_map: BTreeMap<String, LineNumberSet>,
    regex_map: BTreeMap<String, Vec<Regex>>,
}

impl LintWaiver {
    pub fn waive_one_line(&mut self, rule_name: &str, line_number: usize) {
        self.waive_line_range(rule_name, line_number, line_number + 1);
    }

    pub fn waive_line_range(&mut self, rule_name: &str, line_begin: usize, line_end: usize) {
        self.waiver_map
            .entry(rule_name.to_string())
            .or_default()
            .insert_range(line_begin, line_end);
    }

    /// Registers a content regex; lines matching it are waived once
    /// [`Self::regex_to_lines`] runs.
    pub fn waive_with_regex(&mut self, rule_name: &str, pattern: &str) -> Result<()> {
        let regex = Regex::new(pattern)
            .with_context(|| format!("invalid waiver regex '{pattern}' for rule {rule_name}"))?;
        self.regex_map
            .entry(rule_name.to_string())
            .or_default()
            .push(regex);
        Ok(())
    }

    /// Converts the prepared regexes to waived line numbers against the
    /// actual source content. Must run before findings are filtered.
    pub fn regex_to_lines(&mut self, content: &str, line_map: &LineColumnMap) {
        let regex_map = std::mem::take(&mut self.regex_map);
        for (rule_name, regexes) in regex_map {
            for regex in regexes {
                for found in regex.find_iter(content) {
                    let line = line_map.lookup(found.start()).line;
                    self.waive_one_line(&rule_name, line);
                }
            }
        }
    }

    pub fn rule_is_waived_on_line(&self, rule_name: &str, line_number: usize) -> bool {
        self.waiver_map
            .get(rule_name)
            .map(|set| set.contains(line_number))
            .unwrap_or(false)
    }

    pub fn lookup_line_set(&self, rule_name: &str) -> Option<&LineNumberSet> {
        self.waiver_map.get(rule_name)
    }

    pub fn is_empty(&self) -> bool {
        self.waiver_map.values().all(LineNumberSet::is_empty) && self.regex_map.is_empty()
    }
}

/// Scans comment tokens for waiver directives and accumulates the map.
///
/// A directive on a line that carries other code waives that line; a
/// directive on a comment-only line waives the next line that carries code.
/// Blank lines in between do not consume the pending waiver.
pub struct LintWaiverBuilder {
    is_comment: fn(TokenKind) -> bool,
    is_space: fn(TokenKind) -> bool,
    trigger: &'static str,
    waive_one_line_command: &'static str,
    waive_start_command: &'static str,
    waive_stop_command: &'static str,
    unapplied_oneline_waivers: BTreeSet<String>,
    open_ranges: BTreeMap<String, usize>,
    waiver: LintWaiver,
}

impl LintWaiverBuilder {
    pub fn new(
        is_comment: fn(TokenKind) -> bool,
        is_space: fn(TokenKind) -> bool,
        trigger: &'static str,
        waive_one_line_command: &'static str,
        waive_start_command: &'static str,
        waive_stop_command: &'static str,
    ) -> Self {
        Self {
            is_comment,
            is_space,
            trigger,
            waive_one_line_command,
            waive_start_command,
            waive_stop_command,
            unapplied_oneline_waivers: BTreeSet::new(),
            open_ranges: BTreeMap::new(),
            waiver: LintWaiver::default(),
        }
    }

    pub fn lint_waiver(&self) -> &LintWaiver {
        &self.waiver
    }

    pub fn lint_waiver_mut(&mut self) -> &mut LintWaiver {
        &mut self.waiver
    }

    /// Processes one line's tokens and updates the waiver state.
    pub fn process_line(&mut self, tokens: &[Token], source: &str, line_number: usize) {
        let mut has_other_tokens = false;
        for token in tokens {
            if token.is_eof() || (self.is_space)(token.kind) {
                continue;
            }
            if (self.is_comment)(token.kind) {
                self.process_comment(token.text(source), line_number);
            } else {
                has_other_tokens = true;
            }
        }
        if has_other_tokens {
            // This line carries code: it is the target of its own waive
            // directives and consumes any pending from earlier
            // comment-only lines.
            let pending = std::mem::take(&mut self.unapplied_oneline_waivers);
            for rule_name in pending {
                self.waiver.waive_one_line(&rule_name, line_number);
            }
        }
    }

    fn process_comment(&mut self, comment_text: &str, line_number: usize) {
        let Some((command, rule_name)) = self.extract_waiver_directive(comment_text) else {
            return;
        };
        if command == self.waive_one_line_command {
            // Applied when the line is classified; see process_line.
            self.unapplied_oneline_waivers.insert(rule_name);
        } else if command == self.waive_start_command {
            self.open_ranges.entry(rule_name).or_insert(line_number);
        } else if command == self.waive_stop_command {
            if let Some(start) = self.open_ranges.remove(&rule_name) {
                // Inclusive of the stop line.
                self.waiver
                    .waive_line_range(&rule_name, start, line_number + 1);
            }
        }
    }

    /// Parses `<trigger>[:] <command> <rule-id>` out of a comment body.
    fn extract_waiver_directive(&self, comment_text: &str) -> Option<(String, String)> {
        let body = strip_comment_text(comment_text);
        let mut words = body.split_whitespace();
        let trigger = words.next()?;
        if trigger.trim_end_matches(':') != self.trigger {
            return None;
        }
        let command = words.next()?;
        if command != self.waive_one_line_command
            && command != self.waive_start_command
            && command != self.waive_stop_command
        {
            return None;
        }
        let rule_name = words.next()?;
        if !rules::is_registered_rule(rule_name) {
            return None;
        }
        Some((command.to_string(), rule_name.to_string()))
    }

    /// Scans a lexed text structure line by line.
    pub fn process_token_ranges_by_line(&mut self, text: &TextStructure) {
        for line_number in 0..text.line_count() {
            let tokens = text.tokens_on_line(line_number).to_vec();
            self.process_line(&tokens, text.contents(), line_number);
        }
    }

    /// Applies one external waiver-config file. `lintee_path` is the file
    /// being linted; directives with a `--file` filter that does not match
    /// it are skipped.
    pub fn apply_external_waivers(
        &mut self,
        lintee_path: &str,
        waiver_path: &str,
        config_content: &str,
    ) -> Result<()> {
        for (index, line) in config_content.lines().enumerate() {
            let location = format!("{}:{}", waiver_path, index + 1);
            let tokens = lex_waiver_config_line(line);
            if tokens.is_empty() {
                continue;
            }
            if let Some(error_token) = tokens.iter().find(|t| t.kind == ConfigTokenKind::Error) {
                bail!("{location}: unrecognized input '{}'", error_token.text);
            }
            self.apply_waiver_directive(&tokens, lintee_path)
                .with_context(|| format!("{location}: invalid waiver entry"))?;
        }
        Ok(())
    }

    fn apply_waiver_directive(&mut self, tokens: &[ConfigToken], lintee_path: &str) -> Result<()> {
        let command = tokens
            .first()
            .filter(|t| t.kind == ConfigTokenKind::Command)
            .ok_or_else(|| anyhow!("expected a command"))?;
        if command.text != "waive" {
            bail!("unknown command '{}'", command.text);
        }

        let mut rule_name: Option<&str> = None;
        let mut line_range: Option<(usize, usize)> = None;
        let mut content_regex: Option<&str> = None;
        let mut file_regex: Option<&str> = None;

        let mut iter = tokens[1..].iter();
        while let Some(token) = iter.next() {
            match token.kind {
                ConfigTokenKind::FlagWithArg => {
                    let argument = iter
                        .next()
                        .filter(|t| t.kind == ConfigTokenKind::Arg)
                        .ok_or_else(|| anyhow!("flag --{} is missing its value", token.text))?;
                    match token.text {
                        "rule" => rule_name = Some(argument.text),
                        "line" => line_range = Some(parse_line_range(argument.text)?),
                        "location" => content_regex = Some(argument.text),
                        "file" => file_regex = Some(argument.text),
                        other => bail!("unknown flag --{other}"),
                    }
                }
                ConfigTokenKind::Flag => bail!("flag --{} requires a value", token.text),
                ConfigTokenKind::Param => bail!("unexpected argument '{}'", token.text),
                _ => {}
            }
        }

        let rule_name = rule_name.ok_or_else(|| anyhow!("missing required flag --rule"))?;
        if !rules::is_registered_rule(rule_name) {
            bail!("unknown rule '{rule_name}'");
        }
        if line_range.is_none() && content_regex.is_none() {
            bail!("waive entry needs --line or --location");
        }
        if let Some(pattern) = file_regex {
            let regex = Regex::new(pattern)
                .with_context(|| format!("invalid --file regex '{pattern}'"))?;
            if !regex.is_match(lintee_path) {
                return Ok(());
            }
        }
        if let Some((begin, end)) = line_range {
            // External files use 1-based inclusive line numbers.
            self.waiver.waive_line_range(rule_name, begin - 1, end);
        }
        if let Some(pattern) = content_regex {
            self.waiver.waive_with_regex(rule_name, pattern)?;
        }
        Ok(())
    }
}

/// Parses `N` or `N:M` (1-based, inclusive).
fn parse_line_range(text: &str) -> Result<(usize, usize)> {
    let (begin, end) = match text.split_once(':') {
        None => {
            let line: usize = text.parse().context("invalid line number")?;
            (line, line)
        }
        Some((from, to)) => (
            from.parse().context("invalid line number")?,
            to.parse().context("invalid line number")?,
        ),
    };
    if begin == 0 || end < begin {
        bail!("invalid line range '{text}'");
    }
    Ok((begin, end))
}

/// Token kinds of the waiver-config lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigTokenKind {
    Command,
    Flag,
    FlagWithArg,
    Arg,
    Param,
    Newline,
    Comment,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigToken<'a> {
    pub kind: ConfigTokenKind,
    pub text: &'a str,
}

/// Lexes one config line. Shell-style `#` comments yield a single Comment
/// token; blank lines yield nothing.
pub fn lex_waiver_config_line(line: &str) -> Vec<ConfigToken<'_>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if let Some(comment) = trimmed.strip_prefix('#') {
        return vec![ConfigToken {
            kind: ConfigTokenKind::Comment,
            text: comment,
        }];
    }
    let mut tokens = Vec::new();
    for (index, word) in trimmed.split_whitespace().enumerate() {
        if index == 0 {
            tokens.push(ConfigToken {
                kind: ConfigTokenKind::Command,
                text: word,
            });
        } else if let Some(flag) = word.strip_prefix("--") {
            match flag.split_once('=') {
                Some((name, value)) => {
                    tokens.push(ConfigToken {
                        kind: ConfigTokenKind::FlagWithArg,
                        text: name,
                    });
                    tokens.push(ConfigToken {
                        kind: ConfigTokenKind::Arg,
                        text: value.trim_matches('"'),
                    });
                }
                None => tokens.push(ConfigToken {
                    kind: ConfigTokenKind::Flag,
                    text: flag,
                }),
            }
        } else if word.starts_with('-') {
            tokens.push(ConfigToken {
                kind: ConfigTokenKind::Error,
                text: word,
            });
        } else {
            tokens.push(ConfigToken {
                kind: ConfigTokenKind::Param,
                text: word,
            });
        }
    }
    tokens
}

/// Builder pre-wired for SystemVerilog comment and whitespace tokens and
/// the default trigger word.
pub fn verilog_waiver_builder() -> LintWaiverBuilder {
    LintWaiverBuilder::new(
        TokenKind::is_comment,
        TokenKind::is_whitespace,
        WAIVER_TRIGGER,
        WAIVE_ONE_LINE_COMMAND,
        WAIVE_START_COMMAND,
        WAIVE_STOP_COMMAND,
    )
}
