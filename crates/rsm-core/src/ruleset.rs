//! Deduplicating rule sets
//!
//! A [`RuleSet`] keeps one ordered set per [`RuleKind`]. Values are stored
//! exactly as the classifier extracted them: no case folding, no trailing
//! dot stripping. The same literal may live in several kinds at once.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::types::{ClassifiedRule, RuleKind};

/// Per-kind rule counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub domains: usize,
    pub domain_suffixes: usize,
    pub domain_keywords: usize,
}

impl MergeReport {
    pub fn total(&self) -> usize {
        self.domains + self.domain_suffixes + self.domain_keywords
    }

    pub fn count(&self, kind: RuleKind) -> usize {
        match kind {
            RuleKind::Domain => self.domains,
            RuleKind::DomainSuffix => self.domain_suffixes,
            RuleKind::DomainKeyword => self.domain_keywords,
        }
    }
}

/// Three deduplicated, code-point ordered sets of rule values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    domains: BTreeSet<String>,
    domain_suffixes: BTreeSet<String>,
    domain_keywords: BTreeSet<String>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. Returns `false` if it was already present.
    pub fn insert(&mut self, kind: RuleKind, value: impl Into<String>) -> bool {
        self.set_mut(kind).insert(value.into())
    }

    /// Insert a classified rule. Ignored rules are a no-op.
    pub fn insert_rule(&mut self, rule: ClassifiedRule) -> bool {
        match rule.into_parts() {
            Some((kind, value)) => self.insert(kind, value),
            None => false,
        }
    }

    pub fn contains(&self, kind: RuleKind, value: &str) -> bool {
        self.set(kind).contains(value)
    }

    /// Values of one kind, sorted.
    pub fn iter(&self, kind: RuleKind) -> impl Iterator<Item = &str> + '_ {
        self.set(kind).iter().map(String::as_str)
    }

    pub fn domains(&self) -> &BTreeSet<String> {
        &self.domains
    }

    pub fn domain_suffixes(&self) -> &BTreeSet<String> {
        &self.domain_suffixes
    }

    pub fn domain_keywords(&self) -> &BTreeSet<String> {
        &self.domain_keywords
    }

    /// Set union with another rule set. Returns the number of new values.
    pub fn union(&mut self, other: &RuleSet) -> usize {
        let mut added = 0usize;
        for kind in RuleKind::ALL {
            for value in other.set(kind) {
                if self.insert(kind, value.as_str()) {
                    added += 1;
                }
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.domains.len() + self.domain_suffixes.len() + self.domain_keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn report(&self) -> MergeReport {
        MergeReport {
            domains: self.domains.len(),
            domain_suffixes: self.domain_suffixes.len(),
            domain_keywords: self.domain_keywords.len(),
        }
    }

    fn set(&self, kind: RuleKind) -> &BTreeSet<String> {
        match kind {
            RuleKind::Domain => &self.domains,
            RuleKind::DomainSuffix => &self.domain_suffixes,
            RuleKind::DomainKeyword => &self.domain_keywords,
        }
    }

    fn set_mut(&mut self, kind: RuleKind) -> &mut BTreeSet<String> {
        match kind {
            RuleKind::Domain => &mut self.domains,
            RuleKind::DomainSuffix => &mut self.domain_suffixes,
            RuleKind::DomainKeyword => &mut self.domain_keywords,
        }
    }
}

impl Extend<ClassifiedRule> for RuleSet {
    fn extend<I: IntoIterator<Item = ClassifiedRule>>(&mut self, iter: I) {
        for rule in iter {
            self.insert_rule(rule);
        }
    }
}

impl FromIterator<ClassifiedRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = ClassifiedRule>>(iter: I) -> Self {
        let mut set = RuleSet::new();
        set.extend(iter);
        set
    }
}

/// Accumulates classified rules from any number of sources.
///
/// Owned by one pipeline run. Merging is not synchronized: callers that
/// fetch concurrently must still merge from a single task.
#[derive(Debug, Default)]
pub struct Aggregator {
    rules: RuleSet,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one source's rules. Returns how many values were new.
    pub fn merge<I>(&mut self, rules: I) -> usize
    where
        I: IntoIterator<Item = ClassifiedRule>,
    {
        let mut added = 0usize;
        for rule in rules {
            if self.rules.insert_rule(rule) {
                added += 1;
            }
        }
        added
    }

    pub fn snapshot(&self) -> &RuleSet {
        &self.rules
    }

    pub fn report(&self) -> MergeReport {
        self.rules.report()
    }

    pub fn into_rule_set(self) -> RuleSet {
        self.rules
    }
}
