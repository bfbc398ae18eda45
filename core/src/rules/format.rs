//! Rule list formatting
//!
//! Pure transforms from rule entries to output text. Rendering the same input
//! twice yields identical bytes, so callers can re-render on every option
//! change.

use crate::models::{OutputMode, RenderOptions, RuleEntry};

use super::consolidate;

const DOMAIN_KEYWORD: &str = "DOMAIN";
const DOMAIN_SUFFIX_KEYWORD: &str = "DOMAIN-SUFFIX";

/// Format entries one per line.
///
/// In [`OutputMode::ProxyRule`] a non-empty `policy` is appended to each line
/// after a comma. In [`OutputMode::Plain`] the policy is ignored.
pub fn format_rules(entries: &[RuleEntry], mode: OutputMode, policy: Option<&str>) -> String {
    match mode {
        OutputMode::Plain => entries
            .iter()
            .map(|entry| entry.as_text())
            .collect::<Vec<_>>()
            .join("\n"),
        OutputMode::ProxyRule => {
            let suffix = match policy {
                Some(policy) if !policy.is_empty() => format!(",{policy}"),
                _ => String::new(),
            };
            entries
                .iter()
                .map(|entry| match entry {
                    RuleEntry::Wildcard(parent) => {
                        format!("{DOMAIN_SUFFIX_KEYWORD},{parent}{suffix}")
                    }
                    RuleEntry::Exact(host) => format!("{DOMAIN_KEYWORD},{host}{suffix}"),
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

/// Full pipeline from a raw host list to output text.
///
/// The policy is trimmed before use; a blank policy adds no suffix.
pub fn render_rules<S: AsRef<str>>(hosts: &[S], options: &RenderOptions) -> String {
    let entries = if options.wildcard {
        consolidate(hosts)
    } else {
        hosts.iter().map(|h| RuleEntry::from(h.as_ref())).collect()
    };
    let policy = options.policy.as_deref().map(str::trim);
    format_rules(&entries, options.mode, policy)
}

/// Number of rules in rendered text; blank text has none.
pub fn count_rules(text: &str) -> usize {
    if text.trim().is_empty() {
        0
    } else {
        text.split('\n').count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(items: &[&str]) -> Vec<RuleEntry> {
        items.iter().map(|s| RuleEntry::from(*s)).collect()
    }

    #[test]
    fn proxy_rule_mode_with_policy() {
        let text = format_rules(
            &entries(&["*.test.com", "shop.io"]),
            OutputMode::ProxyRule,
            Some("DIRECT"),
        );
        assert_eq!(text, "DOMAIN-SUFFIX,test.com,DIRECT\nDOMAIN,shop.io,DIRECT");
    }

    #[test]
    fn proxy_rule_mode_without_policy() {
        let input = entries(&["*.test.com", "shop.io"]);
        let expected = "DOMAIN-SUFFIX,test.com\nDOMAIN,shop.io";
        assert_eq!(format_rules(&input, OutputMode::ProxyRule, None), expected);
        assert_eq!(format_rules(&input, OutputMode::ProxyRule, Some("")), expected);
    }

    #[test]
    fn plain_mode_ignores_policy() {
        let text = format_rules(
            &entries(&["*.test.com", "shop.io"]),
            OutputMode::Plain,
            Some("DIRECT"),
        );
        assert_eq!(text, "*.test.com\nshop.io");
        assert!(!text.contains("DOMAIN"));
    }

    #[test]
    fn empty_input_renders_empty_text() {
        assert_eq!(format_rules(&[], OutputMode::Plain, None), "");
        assert_eq!(format_rules(&[], OutputMode::ProxyRule, Some("DIRECT")), "");
    }

    #[test]
    fn formatting_is_repeatable() {
        let input = entries(&["*.a.com", "b.com", "c.d.com"]);
        let first = format_rules(&input, OutputMode::ProxyRule, Some("PROXY"));
        let second = format_rules(&input, OutputMode::ProxyRule, Some("PROXY"));
        assert_eq!(first, second);
    }

    #[test]
    fn render_with_and_without_wildcards() {
        let hosts = ["a.test.com", "b.test.com", "shop.io"];
        let mut options = RenderOptions {
            wildcard: true,
            mode: OutputMode::ProxyRule,
            policy: Some("  DIRECT ".to_string()),
        };
        assert_eq!(
            render_rules(&hosts, &options),
            "DOMAIN-SUFFIX,test.com,DIRECT\nDOMAIN,shop.io,DIRECT"
        );

        options.wildcard = false;
        options.mode = OutputMode::Plain;
        assert_eq!(render_rules(&hosts, &options), "a.test.com\nb.test.com\nshop.io");
    }

    #[test]
    fn counts_rules_in_text() {
        assert_eq!(count_rules(""), 0);
        assert_eq!(count_rules("  \n"), 0);
        assert_eq!(count_rules("a.com"), 1);
        assert_eq!(count_rules("a.com\nb.com\n*.c.com"), 3);
    }
}
