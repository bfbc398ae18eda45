//! Persisted user preferences
//!
//! Field names on the wire match the keys the preference store uses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    /// Last address an analysis was started for
    pub last_url: Option<String>,
    /// Exclusion rules as the user typed them, one per line
    pub saved_exclusions: String,
    pub auto_close_source: bool,
    pub use_wildcard: bool,
    pub use_proxy_rule_mode: bool,
    pub policy_suffix: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            last_url: None,
            saved_exclusions: String::new(),
            auto_close_source: true,
            use_wildcard: true,
            use_proxy_rule_mode: false,
            policy_suffix: String::new(),
        }
    }
}
