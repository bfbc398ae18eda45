//! Rule list model
//!
//! Entries produced by wildcard consolidation and the options that control
//! how they are rendered.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use super::Preferences;

/// A single line of the output rule list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleEntry {
    /// A hostname matched exactly
    Exact(String),
    /// `*.<parent>`: every subdomain of the parent
    Wildcard(String),
}

impl RuleEntry {
    pub const WILDCARD_PREFIX: &'static str = "*.";

    pub fn exact(host: impl Into<String>) -> Self {
        RuleEntry::Exact(host.into())
    }

    pub fn wildcard(parent: impl Into<String>) -> Self {
        RuleEntry::Wildcard(parent.into())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, RuleEntry::Wildcard(_))
    }

    /// Rendered form used for ordering and plain output
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            RuleEntry::Exact(host) => Cow::Borrowed(host),
            RuleEntry::Wildcard(parent) => Cow::Owned(format!("{}{}", Self::WILDCARD_PREFIX, parent)),
        }
    }
}

impl From<&str> for RuleEntry {
    fn from(value: &str) -> Self {
        match value.strip_prefix(RuleEntry::WILDCARD_PREFIX) {
            Some(parent) => RuleEntry::Wildcard(parent.to_string()),
            None => RuleEntry::Exact(value.to_string()),
        }
    }
}

impl From<String> for RuleEntry {
    fn from(value: String) -> Self {
        RuleEntry::from(value.as_str())
    }
}

impl From<RuleEntry> for String {
    fn from(value: RuleEntry) -> Self {
        value.as_text().into_owned()
    }
}

impl fmt::Display for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl Ord for RuleEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_text()
            .cmp(&other.as_text())
            .then_with(|| self.is_wildcard().cmp(&other.is_wildcard()))
    }
}

impl PartialOrd for RuleEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Output syntax
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// One entry per line, verbatim
    #[default]
    Plain,
    /// `DOMAIN,<host>` / `DOMAIN-SUFFIX,<parent>` lines
    ProxyRule,
}

/// Options applied when turning a host list into output text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Merge sibling subdomains into `*.parent` entries
    pub wildcard: bool,
    pub mode: OutputMode,
    /// Policy token appended in proxy rule mode (e.g. `DIRECT`)
    pub policy: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            wildcard: true,
            mode: OutputMode::Plain,
            policy: None,
        }
    }
}

impl From<&Preferences> for RenderOptions {
    fn from(prefs: &Preferences) -> Self {
        Self {
            wildcard: prefs.use_wildcard,
            mode: if prefs.use_proxy_rule_mode {
                OutputMode::ProxyRule
            } else {
                OutputMode::Plain
            },
            policy: Some(prefs.policy_suffix.clone()).filter(|p| !p.trim().is_empty()),
        }
    }
}
