//! Lint-rule capability traits, the rule registry, and shared helpers.
//!
//! Each rule lives in its own file and exports one registration const; the
//! per-category tables below are the only other place a new rule touches.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::SyntaxTreeContext;
use crate::syntax::{Symbol, SyntaxNode};
use crate::text_structure::TextStructure;
use crate::token::Token;
use crate::violation::LintRuleStatus;

pub mod always_comb;
pub mod endif_comment;
pub mod explicit_parameter_storage_type;
pub mod forbid_consecutive_null_statements;
pub mod line_length;
pub mod macro_name_style;
pub mod module_filename;
pub mod no_tabs;
pub mod no_trailing_spaces;
pub mod one_module_per_file;
pub mod parameter_name_style;
pub mod posix_eof;

/// One source line handed to line rules: the text excludes the trailing
/// newline; `offset` is the line's absolute byte position so findings can
/// anchor into the buffer.
#[derive(Debug, Clone, Copy)]
pub struct SourceLine<'a> {
    pub text: &'a str,
    pub number: usize,
    pub offset: usize,
}

/// Default `configure`: only the empty string is accepted.
pub fn expect_empty_configuration(configuration: &str) -> Result<()> {
    if configuration.trim().is_empty() {
        Ok(())
    } else {
        bail!("rule does not take any configuration")
    }
}

/// Invoked once per source line.
pub trait LineLintRule {
    fn handle_line(&mut self, line: &SourceLine<'_>);
    fn report(&self) -> LintRuleStatus;
    fn configure(&mut self, configuration: &str) -> Result<()> {
        expect_empty_configuration(configuration)
    }
}

/// Invoked once per token of the full (pre-filter) stream.
pub trait TokenStreamLintRule {
    fn handle_token(&mut self, token: Token, source: &str);
    fn report(&self) -> LintRuleStatus;
    fn configure(&mut self, configuration: &str) -> Result<()> {
        expect_empty_configuration(configuration)
    }
}

/// Invoked on every leaf and node of the syntax tree, with ancestor
/// context. `handle_symbol` sees both; the narrower hooks only their kind.
pub trait SyntaxTreeLintRule {
    fn handle_symbol(&mut self, _symbol: &Symbol, _context: &SyntaxTreeContext<'_>, _source: &str) {
    }
    fn handle_leaf(&mut self, _leaf: Token, _context: &SyntaxTreeContext<'_>, _source: &str) {}
    fn handle_node(&mut self, _node: &SyntaxNode, _context: &SyntaxTreeContext<'_>, _source: &str) {
    }
    fn report(&self) -> LintRuleStatus;
    fn configure(&mut self, configuration: &str) -> Result<()> {
        expect_empty_configuration(configuration)
    }
}

/// Invoked once with the whole text structure.
pub trait TextStructureLintRule {
    fn lint(&mut self, text: &TextStructure, filename: &str);
    fn report(&self) -> LintRuleStatus;
    fn configure(&mut self, configuration: &str) -> Result<()> {
        expect_empty_configuration(configuration)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LintRuleDescriptor {
    pub name: &'static str,
    /// Style-guide topic; the reported URL derives from it.
    pub topic: &'static str,
    pub desc: &'static str,
}

pub struct LineRule {
    pub descriptor: LintRuleDescriptor,
    pub new_rule: fn() -> Box<dyn LineLintRule>,
}

pub struct TokenStreamRule {
    pub descriptor: LintRuleDescriptor,
    pub new_rule: fn() -> Box<dyn TokenStreamLintRule>,
}

pub struct SyntaxTreeRule {
    pub descriptor: LintRuleDescriptor,
    pub new_rule: fn() -> Box<dyn SyntaxTreeLintRule>,
}

pub struct TextStructureRule {
    pub descriptor: LintRuleDescriptor,
    pub new_rule: fn() -> Box<dyn TextStructureLintRule>,
}

pub static LINE_RULES: &[LineRule] = &[
    no_tabs::NO_TABS,
    no_trailing_spaces::NO_TRAILING_SPACES,
    line_length::LINE_LENGTH,
];

pub static TOKEN_STREAM_RULES: &[TokenStreamRule] = &[
    endif_comment::ENDIF_COMMENT,
    macro_name_style::MACRO_NAME_STYLE,
];

pub static SYNTAX_TREE_RULES: &[SyntaxTreeRule] = &[
    always_comb::ALWAYS_COMB,
    explicit_parameter_storage_type::EXPLICIT_PARAMETER_STORAGE_TYPE,
    forbid_consecutive_null_statements::FORBID_CONSECUTIVE_NULL_STATEMENTS,
    parameter_name_style::PARAMETER_NAME_STYLE,
];

pub static TEXT_STRUCTURE_RULES: &[TextStructureRule] = &[
    module_filename::MODULE_FILENAME,
    one_module_per_file::ONE_MODULE_PER_FILE,
    posix_eof::POSIX_EOF,
];

/// Rules enabled by `--ruleset=default`.
pub const DEFAULT_RULE_SET: &[&str] = &[
    "module-filename",
    "always-comb",
    "no-trailing-spaces",
    "no-tabs",
    "posix-eof",
    "line-length",
    "explicit-parameter-storage-type",
    "macro-name-style",
    "parameter-name-style",
    "forbid-consecutive-null-statements",
];

static LINE_REGISTRY: Lazy<BTreeMap<&'static str, &'static LineRule>> =
    Lazy::new(|| LINE_RULES.iter().map(|r| (r.descriptor.name, r)).collect());

static TOKEN_STREAM_REGISTRY: Lazy<BTreeMap<&'static str, &'static TokenStreamRule>> =
    Lazy::new(|| {
        TOKEN_STREAM_RULES
            .iter()
            .map(|r| (r.descriptor.name, r))
            .collect()
    });

static SYNTAX_TREE_REGISTRY: Lazy<BTreeMap<&'static str, &'static SyntaxTreeRule>> =
    Lazy::new(|| {
        SYNTAX_TREE_RULES
            .iter()
            .map(|r| (r.descriptor.name, r))
            .collect()
    });

static TEXT_STRUCTURE_REGISTRY: Lazy<BTreeMap<&'static str, &'static TextStructureRule>> =
    Lazy::new(|| {
        TEXT_STRUCTURE_RULES
            .iter()
            .map(|r| (r.descriptor.name, r))
            .collect()
    });

static ALL_DESCRIPTORS: Lazy<BTreeMap<&'static str, &'static LintRuleDescriptor>> =
    Lazy::new(|| {
        let mut map = BTreeMap::new();
        for rule in LINE_RULES {
            map.insert(rule.descriptor.name, &rule.descriptor);
        }
        for rule in TOKEN_STREAM_RULES {
            map.insert(rule.descriptor.name, &rule.descriptor);
        }
        for rule in SYNTAX_TREE_RULES {
            map.insert(rule.descriptor.name, &rule.descriptor);
        }
        for rule in TEXT_STRUCTURE_RULES {
            map.insert(rule.descriptor.name, &rule.descriptor);
        }
        map
    });

pub fn is_registered_rule(rule_name: &str) -> bool {
    ALL_DESCRIPTORS.contains_key(rule_name)
}

/// Returns the registry's own `'static` key for a rule name, which is safe
/// to hold for the life of the process.
pub fn registered_rule_name(rule_name: &str) -> Option<&'static str> {
    ALL_DESCRIPTORS.get_key_value(rule_name).map(|(key, _)| *key)
}

pub fn all_rule_names() -> impl Iterator<Item = &'static str> {
    ALL_DESCRIPTORS.keys().copied()
}

pub fn rule_descriptor(rule_name: &str) -> Option<&'static LintRuleDescriptor> {
    ALL_DESCRIPTORS.get(rule_name).copied()
}

pub fn create_line_rule(rule_name: &str) -> Option<Box<dyn LineLintRule>> {
    LINE_REGISTRY.get(rule_name).map(|r| (r.new_rule)())
}

pub fn create_token_stream_rule(rule_name: &str) -> Option<Box<dyn TokenStreamLintRule>> {
    TOKEN_STREAM_REGISTRY.get(rule_name).map(|r| (r.new_rule)())
}

pub fn create_syntax_tree_rule(rule_name: &str) -> Option<Box<dyn SyntaxTreeLintRule>> {
    SYNTAX_TREE_REGISTRY.get(rule_name).map(|r| (r.new_rule)())
}

pub fn create_text_structure_rule(rule_name: &str) -> Option<Box<dyn TextStructureLintRule>> {
    TEXT_STRUCTURE_REGISTRY.get(rule_name).map(|r| (r.new_rule)())
}

/// Style-guide citation attached to every finding of a rule.
pub fn style_guide_citation(topic: &str) -> String {
    format!("[Style: {topic}]")
}

/// Parses a rule configuration string of `key:value` pairs separated by
/// `;`. Empty input yields no pairs.
pub fn parse_name_values(configuration: &str) -> Result<Vec<(&str, &str)>> {
    let mut pairs = Vec::new();
    for entry in configuration.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        match entry.split_once(':') {
            Some((key, value)) => pairs.push((key.trim(), value.trim())),
            None => bail!("expected 'key:value', got '{entry}'"),
        }
    }
    Ok(pairs)
}

static ALL_CAPS_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^[A-Z0-9_]+$").unwrap());
static UPPER_CAMEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^[A-Z][a-zA-Z0-9]*$").unwrap());
static LOWER_SNAKE_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^[a-z][a-z0-9_]*$").unwrap());

pub fn is_name_all_caps_underscores_digits(name: &str) -> bool {
    ALL_CAPS_RE.is_match(name)
}

pub fn is_upper_camel_case_with_digits(name: &str) -> bool {
    UPPER_CAMEL_RE.is_match(name)
}

pub fn is_lower_snake_case_with_digits(name: &str) -> bool {
    LOWER_SNAKE_RE.is_match(name)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rule_names_are_unique_across_categories() {
        let total = LINE_RULES.len()
            + TOKEN_STREAM_RULES.len()
            + SYNTAX_TREE_RULES.len()
            + TEXT_STRUCTURE_RULES.len();
        assert_eq!(total, ALL_DESCRIPTORS.len());
    }

    #[test]
    fn test_default_rule_set_is_registered() {
        for rule_name in DEFAULT_RULE_SET {
            assert!(
                is_registered_rule(rule_name),
                "default rule '{rule_name}' is not registered"
            );
        }
    }

    #[test]
    fn test_create_returns_fresh_instances() {
        assert!(create_line_rule("no-tabs").is_some());
        assert!(create_line_rule("always-comb").is_none());
        assert!(create_syntax_tree_rule("always-comb").is_some());
        assert!(create_token_stream_rule("endif-comment").is_some());
        assert!(create_text_structure_rule("module-filename").is_some());
        assert!(create_text_structure_rule("not-a-rule").is_none());
    }

    #[test]
    fn test_registered_rule_name_returns_static_key() {
        let owned = String::from("no-tabs");
        assert_eq!(Some("no-tabs"), registered_rule_name(&owned));
        assert_eq!(None, registered_rule_name("nope"));
    }

    #[test]
    fn test_parse_name_values() {
        assert_eq!(Vec::<(&str, &str)>::new(), parse_name_values("").unwrap());
        assert_eq!(
            vec![("length", "120")],
            parse_name_values("length:120").unwrap()
        );
        assert_eq!(
            vec![("a", "1"), ("b", "2")],
            parse_name_values("a:1;b:2").unwrap()
        );
        assert!(parse_name_values("justakey").is_err());
    }

    #[test]
    fn test_naming_predicates() {
        assert!(is_name_all_caps_underscores_digits("WIDTH_8"));
        assert!(!is_name_all_caps_underscores_digits("Width"));
        assert!(is_upper_camel_case_with_digits("CacheSize2"));
        assert!(!is_upper_camel_case_with_digits("cache_size"));
        assert!(is_lower_snake_case_with_digits("uvm_info_2"));
        assert!(!is_lower_snake_case_with_digits("UvmInfo"));
    }

    #[test]
    fn test_citation_carries_the_topic() {
        assert_eq!("[Style: tabs]", style_guide_citation("tabs"));
    }
}
