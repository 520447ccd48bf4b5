use rsm_core::types::{ClassifiedRule, RuleKind};

/// A matcher claims a line by returning `Some`, even if only to ignore it.
type LineMatcher = fn(&str) -> Option<ClassifiedRule>;

/// Evaluated top to bottom, first claim wins. `DOMAIN-SUFFIX,` must stay
/// ahead of `DOMAIN,` and the explicit prefixes ahead of the bare forms.
const MATCHERS: &[LineMatcher] = &[
    match_comment,
    match_suffix_rule,
    match_domain_rule,
    match_keyword_rule,
    match_dot_suffix,
    match_bare_domain,
];

/// Classify a single line of a rule list.
pub fn classify(line: &str) -> ClassifiedRule {
    let line = line.trim();
    MATCHERS
        .iter()
        .find_map(|matcher| matcher(line))
        .unwrap_or(ClassifiedRule::Ignored)
}

/// Classify every line of a document, ignored lines included.
pub fn classify_text(text: &str) -> impl Iterator<Item = ClassifiedRule> + '_ {
    text.lines().map(classify)
}

/// Parse a rule list into its recognized rules.
pub fn parse_rule_list(text: &str) -> Vec<ClassifiedRule> {
    classify_text(text).filter(|rule| !rule.is_ignored()).collect()
}

fn match_comment(line: &str) -> Option<ClassifiedRule> {
    if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
        Some(ClassifiedRule::Ignored)
    } else {
        None
    }
}

fn match_suffix_rule(line: &str) -> Option<ClassifiedRule> {
    match_prefixed(line, RuleKind::DomainSuffix)
}

fn match_domain_rule(line: &str) -> Option<ClassifiedRule> {
    match_prefixed(line, RuleKind::Domain)
}

fn match_keyword_rule(line: &str) -> Option<ClassifiedRule> {
    match_prefixed(line, RuleKind::DomainKeyword)
}

fn match_prefixed(line: &str, kind: RuleKind) -> Option<ClassifiedRule> {
    let value = line.strip_prefix(kind.prefix())?.trim();
    Some(ClassifiedRule::new(kind, value))
}

/// `.example.com` and `.example.com,extra` style suffix entries.
fn match_dot_suffix(line: &str) -> Option<ClassifiedRule> {
    let rest = line.strip_prefix('.')?.trim_start_matches('.');
    let host = match rest.split_once(',') {
        Some((host, _)) => host,
        None => rest,
    }
    .trim();

    if host.is_empty() {
        return Some(ClassifiedRule::Ignored);
    }
    Some(ClassifiedRule::DomainSuffix(host.to_string()))
}

fn match_bare_domain(line: &str) -> Option<ClassifiedRule> {
    if is_bare_domain(line) {
        Some(ClassifiedRule::DomainSuffix(line.to_string()))
    } else {
        None
    }
}

/// ASCII host made of alphanumerics, `-` and `.`, starting with an
/// alphanumeric and ending in a dot plus two or more letters.
fn is_bare_domain(line: &str) -> bool {
    let bytes = line.as_bytes();
    match bytes.first() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => return false,
    }

    if !bytes
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-')
    {
        return false;
    }

    match line.rfind('.') {
        Some(dot) => {
            let tld = &bytes[dot + 1..];
            tld.len() >= 2 && tld.iter().all(u8::is_ascii_alphabetic)
        }
        None => false,
    }
}
