//! ruleset-merge Core Library
//!
//! Rule model shared by the classifier, the emitter and the CLI.
//!
//! # Modules
//!
//! - `types`: rule kinds and per-line classification results
//! - `ruleset`: deduplicating rule sets, the aggregator and merge reports

pub mod ruleset;
pub mod types;

// Re-export commonly used types
pub use ruleset::{Aggregator, MergeReport, RuleSet};
pub use types::{ClassifiedRule, RuleKind};
