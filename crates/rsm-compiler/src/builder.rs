use chrono::NaiveDateTime;

use rsm_core::ruleset::{MergeReport, RuleSet};
use rsm_core::types::RuleKind;

/// Format of the generation timestamp in the header.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Descriptive lines written at the top of the merged file.
pub const DEFAULT_HEADER_LINES: [&str; 2] = [
    "AI Services Merged Rules",
    "合并来源: ForestL18, MetaCubeX, Sukka, DustinWin",
];

/// Header block of an emitted rule file.
#[derive(Debug, Clone)]
pub struct Header {
    /// Free-form lines, written as `# <line>`
    pub lines: Vec<String>,
    pub generated_at: NaiveDateTime,
}

impl Header {
    pub fn new(lines: Vec<String>, generated_at: NaiveDateTime) -> Self {
        Self { lines, generated_at }
    }

    /// Header with the default descriptive lines.
    pub fn with_defaults(generated_at: NaiveDateTime) -> Self {
        Self::new(DEFAULT_HEADER_LINES.iter().map(|s| s.to_string()).collect(), generated_at)
    }
}

/// Render a rule set as a merged rule file.
///
/// Sections come out in `DOMAIN`, `DOMAIN-SUFFIX`, `DOMAIN-KEYWORD` order,
/// each sorted by code point. The counts line is taken from `report`.
pub fn emit(rules: &RuleSet, report: &MergeReport, header: &Header) -> String {
    let mut out = String::with_capacity(64 + rules.len() * 32);

    for line in header.lines.iter().flat_map(|l| l.split('\n')) {
        push_comment(&mut out, line);
    }
    push_comment(
        &mut out,
        &format!("生成时间: {}", header.generated_at.format(TIMESTAMP_FORMAT)),
    );
    push_comment(
        &mut out,
        &format!(
            "统计: {}={}, {}={}, {}={}",
            RuleKind::Domain,
            report.domains,
            RuleKind::DomainSuffix,
            report.domain_suffixes,
            RuleKind::DomainKeyword,
            report.domain_keywords,
        ),
    );
    out.push('\n');

    for kind in RuleKind::ALL {
        for value in rules.iter(kind) {
            out.push_str(kind.prefix());
            out.push_str(value);
            out.push('\n');
        }
    }

    log::debug!("emitted {} rules ({} bytes)", rules.len(), out.len());
    out
}

fn push_comment(out: &mut String, text: &str) {
    let text = text.trim_end();
    if text.is_empty() {
        out.push_str("#\n");
    } else {
        out.push_str("# ");
        out.push_str(text);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use rsm_core::ruleset::RuleSet;
    use rsm_core::types::{ClassifiedRule, RuleKind};

    use crate::parser::{classify_text, parse_rule_list};

    use super::*;

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(8, 30, 5))
            .expect("valid timestamp")
    }

    fn sample() -> RuleSet {
        parse_rule_list(
            "DOMAIN-SUFFIX,openai.com\n\
             .chatgpt.com\n\
             DOMAIN,api.openai.com\n\
             anthropic.com\n\
             DOMAIN-KEYWORD,openai\n\
             DOMAIN-KEYWORD,claude\n\
             DOMAIN,Api.example.com\n",
        )
        .into_iter()
        .collect()
    }

    #[test]
    fn emits_header_and_sorted_sections() {
        let rules = sample();
        let text = emit(&rules, &rules.report(), &Header::with_defaults(fixed_time()));

        let expected = "\
# AI Services Merged Rules
# 合并来源: ForestL18, MetaCubeX, Sukka, DustinWin
# 生成时间: 2024-05-01 08:30:05
# 统计: DOMAIN=2, DOMAIN-SUFFIX=3, DOMAIN-KEYWORD=2

DOMAIN,Api.example.com
DOMAIN,api.openai.com
DOMAIN-SUFFIX,anthropic.com
DOMAIN-SUFFIX,chatgpt.com
DOMAIN-SUFFIX,openai.com
DOMAIN-KEYWORD,claude
DOMAIN-KEYWORD,openai
";
        assert_eq!(text, expected);
    }

    #[test]
    fn counts_come_from_report() {
        let rules = sample();
        let report = MergeReport { domains: 7, domain_suffixes: 8, domain_keywords: 9 };
        let text = emit(&rules, &report, &Header::new(Vec::new(), fixed_time()));
        assert!(text.starts_with(
            "# 生成时间: 2024-05-01 08:30:05\n\
             # 统计: DOMAIN=7, DOMAIN-SUFFIX=8, DOMAIN-KEYWORD=9\n\n"
        ));
    }

    #[test]
    fn empty_rule_set_emits_header_only() {
        let rules = RuleSet::new();
        let header = Header::new(vec!["Title".to_string(), String::new()], fixed_time());
        let text = emit(&rules, &rules.report(), &header);
        assert_eq!(
            text,
            "# Title\n#\n# 生成时间: 2024-05-01 08:30:05\n\
             # 统计: DOMAIN=0, DOMAIN-SUFFIX=0, DOMAIN-KEYWORD=0\n\n"
        );
    }

    #[test]
    fn multi_line_header_entries_stay_commented() {
        let rules = RuleSet::new();
        let header = Header::new(vec!["first\nsecond".to_string()], fixed_time());
        let text = emit(&rules, &rules.report(), &header);
        assert!(text.starts_with("# first\n# second\n"));
        assert!(classify_text(&text).all(|rule| rule.is_ignored()));
    }

    #[test]
    fn reparsing_output_reproduces_rule_set() {
        let rules = sample();
        let text = emit(&rules, &rules.report(), &Header::with_defaults(fixed_time()));
        let reparsed: RuleSet = classify_text(&text).collect();
        assert_eq!(reparsed, rules);

        let suffixes: Vec<_> = text
            .lines()
            .filter_map(|l| l.strip_prefix(RuleKind::DomainSuffix.prefix()))
            .collect();
        let expected: Vec<_> = rules.iter(RuleKind::DomainSuffix).collect();
        assert_eq!(suffixes, expected);
    }

    #[test]
    fn same_literal_in_two_kinds_is_emitted_twice() {
        let rules: RuleSet = vec![
            ClassifiedRule::Domain("openai.com".to_string()),
            ClassifiedRule::DomainSuffix("openai.com".to_string()),
        ]
        .into_iter()
        .collect();
        let text = emit(&rules, &rules.report(), &Header::new(Vec::new(), fixed_time()));
        assert!(text.ends_with("DOMAIN,openai.com\nDOMAIN-SUFFIX,openai.com\n"));
    }

    #[test]
    fn empty_payload_is_emitted_and_reparsed() {
        let rules: RuleSet = parse_rule_list("DOMAIN,\nDOMAIN-KEYWORD,  \n").into_iter().collect();
        assert!(rules.contains(RuleKind::Domain, ""));
        assert!(rules.contains(RuleKind::DomainKeyword, ""));

        let text = emit(&rules, &rules.report(), &Header::new(Vec::new(), fixed_time()));
        assert!(text.ends_with("\n\nDOMAIN,\nDOMAIN-KEYWORD,\n"));

        let reparsed: RuleSet = classify_text(&text).collect();
        assert_eq!(reparsed, rules);
    }
}
