//! Session recording
//!
//! This module contains the state machine that binds a recording session to
//! one browsing context, together with the exclusion rules and host set it
//! drives.

pub mod collector;
pub mod error;
pub mod exclusion;
pub mod host;
pub mod tracker;

pub use collector::DomainCollector;
pub use error::{HostError, SessionError};
pub use exclusion::{is_excluded, parse_exclusion_text, ExclusionMatcher, BUILTIN_EXCLUSIONS};
pub use host::{BrowserHost, ResultSink};
pub use tracker::*;
