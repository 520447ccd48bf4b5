//! ruleset-merge Rule List Compiler
//!
//! This crate classifies lines of heterogeneous domain rule lists and
//! renders merged rule sets back into a single rule file.

pub mod parser;
pub mod builder;

pub use builder::{emit, Header, DEFAULT_HEADER_LINES, TIMESTAMP_FORMAT};
pub use parser::{classify, classify_text, parse_rule_list};
