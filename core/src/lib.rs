//! # Domainscope Core
//!
//! Records which hosts a single browsing session contacts and reduces them to
//! a compact rule list: plain domains, or `DOMAIN` / `DOMAIN-SUFFIX` proxy
//! rules with an optional policy, with sibling subdomains optionally merged
//! into `*.parent` wildcards.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │            Browser bridge (JSON lines over stdio)            │
//! ├──────────────────────────────────────────────────────────────┤
//! │                      Domainscope Core                        │
//! │  ┌──────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │
//! │  │ Session  │──│ Exclusion │──│  Domain   │──│  Storage  │   │
//! │  │ Tracker  │  │  Matcher  │  │ Collector │  │ (SQLite)  │   │
//! │  └──────────┘  └───────────┘  └───────────┘  └───────────┘   │
//! │        │ result                                              │
//! │  ┌─────▼───────┐  ┌───────────┐                              │
//! │  │  Wildcard   │──│   Rule    │──▶ output text               │
//! │  │ Consolidator│  │ Formatter │                              │
//! │  └─────────────┘  └───────────┘                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod bridge;
pub mod models;
pub mod rules;
pub mod session;
pub mod storage;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
