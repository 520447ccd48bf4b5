//! Core type definitions for ruleset-merge
//!
//! These types are shared by the classifier, the rule sets and the
//! emitter, so the textual rule prefixes live in exactly one place.

use std::fmt;

// =============================================================================
// Rule Kinds (one per output section)
// =============================================================================

/// Kind of a domain rule.
///
/// The declaration order is the order the emitter writes sections in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleKind {
    /// Exact fully qualified domain name
    Domain,
    /// Domain and every subdomain of it
    DomainSuffix,
    /// Any domain containing the substring
    DomainKeyword,
}

impl RuleKind {
    /// All kinds, in emission order.
    pub const ALL: [RuleKind; 3] = [Self::Domain, Self::DomainSuffix, Self::DomainKeyword];

    /// Textual rule type, as it appears before the first comma.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Domain => "DOMAIN",
            Self::DomainSuffix => "DOMAIN-SUFFIX",
            Self::DomainKeyword => "DOMAIN-KEYWORD",
        }
    }

    /// Line prefix including the separating comma.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Domain => "DOMAIN,",
            Self::DomainSuffix => "DOMAIN-SUFFIX,",
            Self::DomainKeyword => "DOMAIN-KEYWORD,",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Classified Rules (one per input line)
// =============================================================================

/// Result of classifying a single line of a rule list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassifiedRule {
    Domain(String),
    DomainSuffix(String),
    DomainKeyword(String),
    /// Blank line, comment, or anything not recognized
    Ignored,
}

impl ClassifiedRule {
    pub fn new(kind: RuleKind, value: impl Into<String>) -> Self {
        let value = value.into();
        match kind {
            RuleKind::Domain => Self::Domain(value),
            RuleKind::DomainSuffix => Self::DomainSuffix(value),
            RuleKind::DomainKeyword => Self::DomainKeyword(value),
        }
    }

    /// Kind of the rule, `None` for ignored lines.
    pub fn kind(&self) -> Option<RuleKind> {
        match self {
            Self::Domain(_) => Some(RuleKind::Domain),
            Self::DomainSuffix(_) => Some(RuleKind::DomainSuffix),
            Self::DomainKeyword(_) => Some(RuleKind::DomainKeyword),
            Self::Ignored => None,
        }
    }

    /// Extracted payload, `None` for ignored lines.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Domain(v) | Self::DomainSuffix(v) | Self::DomainKeyword(v) => Some(v),
            Self::Ignored => None,
        }
    }

    /// Split into kind and owned payload.
    pub fn into_parts(self) -> Option<(RuleKind, String)> {
        match self {
            Self::Domain(v) => Some((RuleKind::Domain, v)),
            Self::DomainSuffix(v) => Some((RuleKind::DomainSuffix, v)),
            Self::DomainKeyword(v) => Some((RuleKind::DomainKeyword, v)),
            Self::Ignored => None,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }
}

impl fmt::Display for ClassifiedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind().zip(self.value()) {
            Some((kind, value)) => write!(f, "{}{}", kind.prefix(), value),
            None => f.write_str("<ignored>"),
        }
    }
}
