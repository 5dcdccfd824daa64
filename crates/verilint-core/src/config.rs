//! Linter configuration: rule-set presets, rule bundles, project policies,
//! and resolution from command-line options.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::rules::{
    self, LineLintRule, SyntaxTreeLintRule, TextStructureLintRule, TokenStreamLintRule,
    DEFAULT_RULE_SET,
};

/// File name searched upward from the lint target when
/// `rules_config_search` is enabled.
pub const RULES_CONFIG_SEARCH_FILE: &str = ".rules.verible_lint";

/// Per-rule switch and configuration string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSetting {
    pub enabled: bool,
    pub configuration: String,
}

/// Base set of rules a configuration starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleSet {
    None,
    #[default]
    Default,
    All,
}

impl FromStr for RuleSet {
    type Err = anyhow::Error;

    fn from_str(text: &str) -> Result<Self> {
        match text {
            "none" => Ok(RuleSet::None),
            "default" => Ok(RuleSet::Default),
            "all" => Ok(RuleSet::All),
            other => bail!("invalid ruleset '{other}', expected default|all|none"),
        }
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RuleSet::None => "none",
            RuleSet::Default => "default",
            RuleSet::All => "all",
        };
        f.write_str(text)
    }
}

/// Explicit per-rule overrides on top of a rule set. Keys are the
/// registry's static rule names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleBundle {
    pub rules: BTreeMap<&'static str, RuleSetting>,
}

impl RuleBundle {
    /// Parses `[+|-]<rule>[=<config>]` entries split on `separator` (comma
    /// for flags, newline for config files). In newline mode, `#` starts a
    /// comment. Unknown rule names are rejected.
    pub fn parse_configuration(text: &str, separator: char) -> Result<RuleBundle> {
        let mut bundle = RuleBundle::default();
        for raw_entry in text.split(separator) {
            let mut entry = raw_entry.trim();
            if separator == '\n' {
                if let Some(comment_start) = entry.find('#') {
                    entry = entry[..comment_start].trim();
                }
            }
            if entry.is_empty() {
                continue;
            }
            let (enabled, rest) = match entry.strip_prefix('-') {
                Some(rest) => (false, rest),
                None => (true, entry.strip_prefix('+').unwrap_or(entry)),
            };
            let (name, configuration) = match rest.split_once('=') {
                Some((name, configuration)) => (name.trim(), configuration.trim().to_string()),
                None => (rest.trim(), String::new()),
            };
            let Some(rule_name) = rules::registered_rule_name(name) else {
                bail!("unknown rule '{name}'");
            };
            bundle.rules.insert(
                rule_name,
                RuleSetting {
                    enabled,
                    configuration,
                },
            );
        }
        Ok(bundle)
    }

    /// Deterministic inverse of [`Self::parse_configuration`]: enabled
    /// rules first, then disabled ones with a `-` prefix.
    pub fn unparse_configuration(&self, separator: char) -> String {
        let mut entries = Vec::with_capacity(self.rules.len());
        for (rule_name, setting) in self.rules.iter().filter(|(_, s)| s.enabled) {
            entries.push(render_entry("", rule_name, setting));
        }
        for (rule_name, setting) in self.rules.iter().filter(|(_, s)| !s.enabled) {
            entries.push(render_entry("-", rule_name, setting));
        }
        entries.join(&separator.to_string())
    }
}

fn render_entry(prefix: &str, rule_name: &str, setting: &RuleSetting) -> String {
    if setting.configuration.is_empty() {
        format!("{prefix}{rule_name}")
    } else {
        format!("{prefix}{rule_name}={}", setting.configuration)
    }
}

/// Blanket per-project rule adjustments keyed on path substrings. Applied
/// when any path substring (and no exclusion) occurs in the file path;
/// enabling wins over disabling.
#[derive(Debug, Clone)]
pub struct ProjectPolicy {
    pub name: &'static str,
    pub path_substrings: &'static [&'static str],
    pub path_exclusions: &'static [&'static str],
    pub owners: &'static [&'static str],
    pub disabled_rules: &'static [&'static str],
    pub enabled_rules: &'static [&'static str],
}

impl ProjectPolicy {
    pub fn matches_any_path(&self, filename: &str) -> Option<&'static str> {
        self.path_substrings
            .iter()
            .find(|substring| filename.contains(**substring))
            .copied()
    }

    pub fn matches_any_exclusions(&self, filename: &str) -> Option<&'static str> {
        self.path_exclusions
            .iter()
            .find(|substring| filename.contains(**substring))
            .copied()
    }

    /// All referenced rules must be registered; catches typos in policy
    /// tables.
    pub fn is_valid(&self) -> bool {
        self.disabled_rules
            .iter()
            .chain(self.enabled_rules.iter())
            .all(|rule| rules::is_registered_rule(rule))
    }

    /// Shell-style glob alternatives for diagnostics: `*path1* | *path2*`.
    pub fn list_path_globs(&self) -> String {
        self.path_substrings
            .iter()
            .map(|substring| format!("*{substring}*"))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Built-in policies applied to every configuration. Empty by default.
pub static BUILT_IN_POLICIES: &[ProjectPolicy] = &[];

/// Everything the top-level resolution needs, typically from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct LinterOptions {
    pub ruleset: RuleSet,
    pub rules: RuleBundle,
    pub config_file: Option<PathBuf>,
    pub rules_config_search: bool,
    pub linting_start_file: PathBuf,
    pub waiver_files: Vec<PathBuf>,
}

/// Tracks which rules are active and with what configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinterConfiguration {
    configuration: BTreeMap<&'static str, RuleSetting>,
    /// Paths of external lint-waiver configuration files.
    pub external_waivers: Vec<PathBuf>,
}

impl LinterConfiguration {
    pub fn turn_on(&mut self, rule: &str) {
        let rule_name = rules::registered_rule_name(rule).expect("unregistered rule");
        self.configuration.insert(
            rule_name,
            RuleSetting {
                enabled: true,
                configuration: String::new(),
            },
        );
    }

    pub fn turn_off(&mut self, rule: &str) {
        let rule_name = rules::registered_rule_name(rule).expect("unregistered rule");
        self.configuration.insert(
            rule_name,
            RuleSetting {
                enabled: false,
                configuration: String::new(),
            },
        );
    }

    pub fn rule_is_on(&self, rule: &str) -> bool {
        self.configuration
            .get(rule)
            .map(|setting| setting.enabled)
            .unwrap_or(false)
    }

    /// Clears the configuration and seeds it from a preset. Bundles and
    /// policies can be layered on afterwards.
    pub fn use_rule_set(&mut self, rule_set: RuleSet) {
        self.configuration.clear();
        match rule_set {
            RuleSet::None => {}
            RuleSet::All => {
                for rule_name in rules::all_rule_names() {
                    self.turn_on(rule_name);
                }
            }
            RuleSet::Default => {
                for rule_name in DEFAULT_RULE_SET {
                    self.turn_on(rule_name);
                }
            }
        }
    }

    pub fn use_rule_bundle(&mut self, bundle: &RuleBundle) {
        for (rule_name, setting) in &bundle.rules {
            self.configuration.insert(rule_name, setting.clone());
        }
    }

    pub fn use_project_policy(&mut self, policy: &ProjectPolicy, filename: &str) {
        if policy.matches_any_path(filename).is_none()
            || policy.matches_any_exclusions(filename).is_some()
        {
            return;
        }
        for rule in policy.disabled_rules {
            self.turn_off(rule);
        }
        for rule in policy.enabled_rules {
            self.turn_on(rule);
        }
    }

    /// Enabled rule names, sorted.
    pub fn active_rule_ids(&self) -> Vec<&'static str> {
        self.configuration
            .iter()
            .filter(|(_, setting)| setting.enabled)
            .map(|(rule_name, _)| *rule_name)
            .collect()
    }

    pub fn rule_configuration(&self, rule: &str) -> &str {
        self.configuration
            .get(rule)
            .map(|setting| setting.configuration.as_str())
            .unwrap_or("")
    }

    pub fn create_line_rules(&self) -> Result<Vec<Box<dyn LineLintRule>>> {
        let mut created = Vec::new();
        for rule_name in self.active_rule_ids() {
            if let Some(mut rule) = rules::create_line_rule(rule_name) {
                rule.configure(self.rule_configuration(rule_name))
                    .with_context(|| format!("configuring rule {rule_name}"))?;
                created.push(rule);
            }
        }
        Ok(created)
    }

    pub fn create_token_stream_rules(&self) -> Result<Vec<Box<dyn TokenStreamLintRule>>> {
        let mut created = Vec::new();
        for rule_name in self.active_rule_ids() {
            if let Some(mut rule) = rules::create_token_stream_rule(rule_name) {
                rule.configure(self.rule_configuration(rule_name))
                    .with_context(|| format!("configuring rule {rule_name}"))?;
                created.push(rule);
            }
        }
        Ok(created)
    }

    pub fn create_syntax_tree_rules(&self) -> Result<Vec<Box<dyn SyntaxTreeLintRule>>> {
        let mut created = Vec::new();
        for rule_name in self.active_rule_ids() {
            if let Some(mut rule) = rules::create_syntax_tree_rule(rule_name) {
                rule.configure(self.rule_configuration(rule_name))
                    .with_context(|| format!("configuring rule {rule_name}"))?;
                created.push(rule);
            }
        }
        Ok(created)
    }

    pub fn create_text_structure_rules(&self) -> Result<Vec<Box<dyn TextStructureLintRule>>> {
        let mut created = Vec::new();
        for rule_name in self.active_rule_ids() {
            if let Some(mut rule) = rules::create_text_structure_rule(rule_name) {
                rule.configure(self.rule_configuration(rule_name))
                    .with_context(|| format!("configuring rule {rule_name}"))?;
                created.push(rule);
            }
        }
        Ok(created)
    }

    /// Top-level resolution: preset, bundle overrides, rules-config file or
    /// upward search, built-in policies, waiver paths.
    pub fn configure_from_options(&mut self, options: &LinterOptions) -> Result<()> {
        self.use_rule_set(options.ruleset);
        self.use_rule_bundle(&options.rules);

        if let Some(config_file) = &options.config_file {
            let content = fs::read_to_string(config_file)
                .with_context(|| format!("can't read rules config {}", config_file.display()))?;
            let bundle = RuleBundle::parse_configuration(&content, '\n')
                .with_context(|| format!("in rules config {}", config_file.display()))?;
            self.use_rule_bundle(&bundle);
        } else if options.rules_config_search {
            if let Some(found) = search_upward_for_rules_config(&options.linting_start_file) {
                let content = fs::read_to_string(&found)
                    .with_context(|| format!("can't read rules config {}", found.display()))?;
                let bundle = RuleBundle::parse_configuration(&content, '\n')
                    .with_context(|| format!("in rules config {}", found.display()))?;
                self.use_rule_bundle(&bundle);
            }
        }

        let start_file = options.linting_start_file.to_string_lossy();
        for policy in BUILT_IN_POLICIES {
            self.use_project_policy(policy, &start_file);
        }

        self.external_waivers = options.waiver_files.clone();
        Ok(())
    }
}

/// Walks parent directories of the lint target looking for
/// [`RULES_CONFIG_SEARCH_FILE`].
fn search_upward_for_rules_config(start_file: &Path) -> Option<PathBuf> {
    let mut directory = if start_file.is_dir() {
        Some(start_file)
    } else {
        start_file.parent()
    };
    while let Some(current) = directory {
        let candidate = current.join(RULES_CONFIG_SEARCH_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        directory = current.parent();
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_ruleset_from_str_round_trip() {
        for rule_set in [RuleSet::None, RuleSet::Default, RuleSet::All] {
            assert_eq!(rule_set, rule_set.to_string().parse().unwrap());
        }
        assert!("bogus".parse::<RuleSet>().is_err());
    }

    #[test]
    fn test_rule_set_presets() {
        let mut config = LinterConfiguration::default();
        config.use_rule_set(RuleSet::None);
        assert!(config.active_rule_ids().is_empty());

        config.use_rule_set(RuleSet::All);
        assert_eq!(
            rules::all_rule_names().count(),
            config.active_rule_ids().len()
        );

        config.use_rule_set(RuleSet::Default);
        assert_eq!(DEFAULT_RULE_SET.len(), config.active_rule_ids().len());
        assert!(config.rule_is_on("no-tabs"));
        assert!(!config.rule_is_on("endif-comment"));
    }

    #[test]
    fn test_bundle_parse_enable_disable_and_config() {
        let bundle =
            RuleBundle::parse_configuration("no-tabs, -line-length , +endif-comment", ',').unwrap();
        assert!(bundle.rules["no-tabs"].enabled);
        assert!(!bundle.rules["line-length"].enabled);
        assert!(bundle.rules["endif-comment"].enabled);

        let with_config =
            RuleBundle::parse_configuration("line-length=length:120", ',').unwrap();
        assert_eq!("length:120", with_config.rules["line-length"].configuration);
    }

    #[test]
    fn test_bundle_rejects_unknown_rule() {
        let result = RuleBundle::parse_configuration("no-such-rule", ',');
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("no-such-rule"));
    }

    #[test]
    fn test_bundle_unparse_enabled_first_then_disabled() {
        let bundle =
            RuleBundle::parse_configuration("line-length=length:120,-no-tabs", ',').unwrap();
        assert_eq!(
            "line-length=length:120,-no-tabs",
            bundle.unparse_configuration(',')
        );
    }

    #[test]
    fn test_bundle_round_trip() {
        let inputs = [
            "no-tabs",
            "-posix-eof",
            "line-length=length:80,-no-tabs,always-comb",
            "",
        ];
        for input in inputs {
            let bundle = RuleBundle::parse_configuration(input, ',').unwrap();
            let unparsed = bundle.unparse_configuration(',');
            let reparsed = RuleBundle::parse_configuration(&unparsed, ',').unwrap();
            assert_eq!(bundle, reparsed, "round trip failed for '{input}'");
        }
    }

    #[test]
    fn test_newline_bundle_allows_comments_and_blanks() {
        let content = "# defaults for this project\nno-tabs\n\n-line-length # too noisy\n";
        let bundle = RuleBundle::parse_configuration(content, '\n').unwrap();
        assert!(bundle.rules["no-tabs"].enabled);
        assert!(!bundle.rules["line-length"].enabled);
        assert_eq!(2, bundle.rules.len());
    }

    #[test]
    fn test_project_policy_enable_wins() {
        static POLICY: ProjectPolicy = ProjectPolicy {
            name: "legacy-ip",
            path_substrings: &["legacy/"],
            path_exclusions: &["legacy/generated/"],
            owners: &["owner-a", "owner-b"],
            disabled_rules: &["no-tabs", "line-length"],
            enabled_rules: &["line-length"],
        };
        assert!(POLICY.is_valid());
        assert_eq!("*legacy/*", POLICY.list_path_globs());

        let mut config = LinterConfiguration::default();
        config.use_rule_set(RuleSet::Default);
        config.use_project_policy(&POLICY, "rtl/legacy/foo.sv");
        assert!(!config.rule_is_on("no-tabs"));
        assert!(config.rule_is_on("line-length"));

        // Excluded paths are untouched.
        let mut excluded = LinterConfiguration::default();
        excluded.use_rule_set(RuleSet::Default);
        excluded.use_project_policy(&POLICY, "rtl/legacy/generated/foo.sv");
        assert!(excluded.rule_is_on("no-tabs"));

        // Unrelated paths are untouched.
        let mut unrelated = LinterConfiguration::default();
        unrelated.use_rule_set(RuleSet::Default);
        unrelated.use_project_policy(&POLICY, "rtl/new/foo.sv");
        assert!(unrelated.rule_is_on("no-tabs"));
    }

    #[test]
    fn test_configure_from_options_with_rules_config_file() {
        let mut config_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(config_file, "-no-tabs").unwrap();
        writeln!(config_file, "endif-comment").unwrap();

        let mut config = LinterConfiguration::default();
        config
            .configure_from_options(&LinterOptions {
                ruleset: RuleSet::Default,
                config_file: Some(config_file.path().to_path_buf()),
                ..Default::default()
            })
            .unwrap();
        assert!(!config.rule_is_on("no-tabs"));
        assert!(config.rule_is_on("endif-comment"));
        // The rest of the default set is untouched.
        assert!(config.rule_is_on("line-length"));
    }

    #[test]
    fn test_configure_from_options_search_walks_upward() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("rtl").join("core");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            root.path().join(RULES_CONFIG_SEARCH_FILE),
            "-posix-eof\n",
        )
        .unwrap();
        let target = nested.join("core.sv");
        std::fs::write(&target, "module core; endmodule\n").unwrap();

        let mut config = LinterConfiguration::default();
        config
            .configure_from_options(&LinterOptions {
                ruleset: RuleSet::Default,
                rules_config_search: true,
                linting_start_file: target,
                ..Default::default()
            })
            .unwrap();
        assert!(!config.rule_is_on("posix-eof"));
        assert!(config.rule_is_on("no-tabs"));
    }

    #[test]
    fn test_bundle_overrides_layer_on_preset() {
        let mut config = LinterConfiguration::default();
        config
            .configure_from_options(&LinterOptions {
                ruleset: RuleSet::None,
                rules: RuleBundle::parse_configuration("no-tabs", ',').unwrap(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(vec!["no-tabs"], config.active_rule_ids());
    }

    #[test]
    fn test_rule_config_error_is_surfaced() {
        let mut config = LinterConfiguration::default();
        config.use_rule_set(RuleSet::None);
        config.use_rule_bundle(
            &RuleBundle::parse_configuration("no-tabs=bogus:1", ',').unwrap(),
        );
        let result = config.create_line_rules();
        let err = match result {
            Err(e) => e,
            Ok(_) => panic!("expected create_line_rules to return an error"),
        };
        assert!(format!("{:#}", err).contains("no-tabs"));
    }
}
