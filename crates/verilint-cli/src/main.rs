use std::cmp::max;
use std::fs;
use std::path::PathBuf;
use std::process::exit;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use rayon::prelude::*;

use verilint_core::analyzer::analyze_source;
use verilint_core::config::{LinterConfiguration, LinterOptions, RuleBundle, RuleSet};
use verilint_core::linter::lint_text_structure;
use verilint_core::rules;
use verilint_core::violation::LintStatusFormatter;

#[derive(Parser, Debug)]
#[command(
    name = "verilint",
    version,
    about = "verilint: SystemVerilog style linter"
)]
struct Cli {
    /// SystemVerilog files to lint
    #[arg(required_unless_present = "help_rules")]
    files: Vec<PathBuf>,

    /// Base set of rules: default|all|none
    #[arg(long, default_value = "default")]
    ruleset: String,

    /// Comma-separated rule overrides. No prefix or '+' enables a rule,
    /// '-' disables it; a configuration value follows '='.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    rules: String,

    /// Path to a newline-separated rules configuration file.
    /// Disables --rules_config_search if set.
    #[arg(long = "rules_config")]
    rules_config: Option<PathBuf>,

    /// Look for a '.rules.verible_lint' configuration file searching
    /// upward from each analyzed file.
    #[arg(long = "rules_config_search", default_value_t = false)]
    rules_config_search: bool,

    /// Comma-separated paths of external waiver configuration files.
    #[arg(long = "waiver_files", default_value = "")]
    waiver_files: String,

    /// Print the offending source line and a caret under each finding.
    #[arg(long = "show_context", default_value_t = false)]
    show_context: bool,

    /// Exit non-zero when the file has syntax errors.
    #[arg(long = "parse_fatal", default_value_t = true, action = ArgAction::Set)]
    parse_fatal: bool,

    /// Exit non-zero when lint findings remain after waivers.
    #[arg(long = "lint_fatal", default_value_t = true, action = ArgAction::Set)]
    lint_fatal: bool,

    /// Print rule descriptions ('all' or a rule name) and exit.
    #[arg(long = "help_rules")]
    help_rules: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => exit(code),
        Err(error) => {
            eprintln!("{error:#}");
            exit(2);
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    if let Some(topic) = &cli.help_rules {
        print!("{}", rule_descriptions(topic)?);
        return Ok(0);
    }

    let ruleset: RuleSet = cli.ruleset.parse()?;
    let bundle = RuleBundle::parse_configuration(&cli.rules, ',')?;
    let waiver_files: Vec<PathBuf> = cli
        .waiver_files
        .split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect();

    // One thread per file; outputs are buffered and printed in input order.
    let results: Vec<Result<(String, i32)>> = cli
        .files
        .par_iter()
        .map(|path| lint_one_file(path, cli, ruleset, &bundle, &waiver_files))
        .collect();

    let mut exit_code = 0;
    for result in results {
        match result {
            Ok((output, code)) => {
                print!("{output}");
                exit_code = max(exit_code, code);
            }
            Err(error) => {
                eprintln!("{error:#}");
                exit_code = max(exit_code, 2);
            }
        }
    }
    Ok(exit_code)
}

/// Lints a single file and returns its buffered report plus exit code:
/// 0 clean, 1 syntax error (with --parse_fatal) or findings (with
/// --lint_fatal). I/O and configuration failures become errors (exit 2).
fn lint_one_file(
    path: &PathBuf,
    cli: &Cli,
    ruleset: RuleSet,
    bundle: &RuleBundle,
    waiver_files: &[PathBuf],
) -> Result<(String, i32)> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("can't read '{}'", path.display()))?;

    // Configuration is per file: the rules-config search starts from the
    // lintee, and project policies match on its path.
    let mut configuration = LinterConfiguration::default();
    configuration.configure_from_options(&LinterOptions {
        ruleset,
        rules: bundle.clone(),
        config_file: cli.rules_config.clone(),
        rules_config_search: cli.rules_config_search,
        linting_start_file: path.clone(),
        waiver_files: waiver_files.to_vec(),
    })?;

    let analyzed = analyze_source(contents);
    let path_text = path.to_string_lossy();
    let mut output = String::new();
    let mut code = 0;

    if !analyzed.is_clean() {
        for error in &analyzed.syntax_errors {
            output.push_str(&error.message(&path_text, &analyzed.text));
            output.push('\n');
        }
        if cli.parse_fatal {
            code = 1;
        }
        // With error recovery the salvaged tree is still lintable.
    }

    let statuses = lint_text_structure(&analyzed.text, &path_text, &configuration)?;
    let total_findings: usize = statuses.iter().map(|status| status.violations.len()).sum();
    if total_findings > 0 {
        let formatter = LintStatusFormatter::new(analyzed.text.contents());
        let lines = if cli.show_context {
            analyzed.text.lines()
        } else {
            Vec::new()
        };
        formatter.format_lint_rule_statuses(&mut output, &statuses, &path_text, &lines);
        if cli.lint_fatal {
            code = max(code, 1);
        }
    }
    Ok((output, code))
}

/// `--help_rules=all` lists everything; a rule name prints just that one.
fn rule_descriptions(flag_value: &str) -> Result<String> {
    let width = 35;
    let mut out = String::new();
    let mut print_one = |name: &str| -> Result<()> {
        let descriptor = rules::rule_descriptor(name)
            .with_context(|| format!("rule '{name}' not found; use a rule name or \"all\""))?;
        let default_enabled = rules::DEFAULT_RULE_SET.contains(&descriptor.name);
        out.push_str(&format!("{:<width$}{}\n", descriptor.name, descriptor.desc));
        out.push_str(&format!(
            "{:<width$}Enabled by default: {}\n\n",
            " ", default_enabled
        ));
        Ok(())
    };
    if flag_value == "all" {
        for name in rules::all_rule_names() {
            print_one(name)?;
        }
    } else {
        print_one(flag_value)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_descriptions_all_lists_every_rule() {
        let text = rule_descriptions("all").unwrap();
        for name in rules::all_rule_names() {
            assert!(text.contains(name), "missing rule {name}");
        }
        assert!(text.contains("Enabled by default: true"));
        assert!(text.contains("Enabled by default: false"));
    }

    #[test]
    fn test_rule_descriptions_unknown_rule_errors() {
        assert!(rule_descriptions("not-a-rule").is_err());
        assert!(rule_descriptions("no-tabs").is_ok());
    }
}
