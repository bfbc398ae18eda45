//! Exclusion rules
//!
//! A rule is a plain, case-sensitive substring. A request is excluded when any
//! non-empty rule occurs in its hostname or in its protocol string
//! (`scheme://`). There is no anchoring: `ads` also excludes `myads.net`.

/// Rules appended to every session so the browser's own pages are ignored
pub const BUILTIN_EXCLUSIONS: [&str; 3] = ["chrome-extension://", "chrome://", "devtools://"];

/// Returns true if some non-empty rule is contained in `hostname` or `protocol`.
pub fn is_excluded<S: AsRef<str>>(hostname: &str, protocol: &str, rules: &[S]) -> bool {
    rules
        .iter()
        .map(AsRef::as_ref)
        .filter(|rule| !rule.is_empty())
        .any(|rule| hostname.contains(rule) || protocol.contains(rule))
}

/// Split user input into rules: one per line, trimmed, blank lines dropped.
pub fn parse_exclusion_text(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ordered rule set of one session: user rules followed by the built-ins.
#[derive(Debug, Clone, Default)]
pub struct ExclusionMatcher {
    rules: Vec<String>,
}

impl ExclusionMatcher {
    pub fn new(user_rules: Vec<String>) -> Self {
        let mut rules = user_rules;
        rules.extend(BUILTIN_EXCLUSIONS.iter().map(|rule| rule.to_string()));
        Self { rules }
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    pub fn is_excluded(&self, hostname: &str, protocol: &str) -> bool {
        is_excluded(hostname, protocol, &self.rules)
    }
}
