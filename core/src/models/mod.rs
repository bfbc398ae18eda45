//! Data models for Domainscope
//!
//! Shared by the session tracker, the rule pipeline, storage and the bridge.

pub mod preferences;
pub mod protocol;
pub mod rule;
pub mod session;

pub use preferences::*;
pub use protocol::*;
pub use rule::*;
pub use session::*;
