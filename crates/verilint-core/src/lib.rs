//! SystemVerilog style-lint engine.
//!
//! The pipeline: [`analyzer::analyze_source`] turns raw text into a
//! [`text_structure::TextStructure`] (tokens, line map, syntax tree), then
//! [`linter::lint_text_structure`] runs the configured rules over it and
//! returns waived [`violation::LintRuleStatus`]es, which
//! [`violation::LintStatusFormatter`] renders as line/column diagnostics.
//!
//! Rules come in four categories (line, token stream, syntax tree, text
//! structure), registered in [`rules`] and selected through
//! [`config::LinterConfiguration`]. Findings can be suppressed via
//! in-source comment directives or external waiver files ([`waiver`]).

pub mod analyzer;
pub mod annotator;
pub mod config;
pub mod context;
pub mod lexer;
pub mod linter;
pub mod parser;
pub mod position;
pub mod preprocess;
pub mod rules;
pub mod syntax;
pub mod test_utils;
pub mod text_structure;
pub mod token;
pub mod violation;
pub mod waiver;
