//! Session model
//!
//! Identity, lifecycle phase and result types for a single recording session.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a browsing context (tab or page) as reported by the browser.
///
/// Browsers hand these out either as integers or strings; both forms are
/// accepted on the wire and normalised to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "ContextIdRepr", into = "String")]
pub struct ContextId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum ContextIdRepr {
    Number(i64),
    Text(String),
}

impl From<ContextIdRepr> for ContextId {
    fn from(value: ContextIdRepr) -> Self {
        match value {
            ContextIdRepr::Number(n) => ContextId(n.to_string()),
            ContextIdRepr::Text(s) => ContextId(s),
        }
    }
}

impl From<ContextId> for String {
    fn from(value: ContextId) -> Self {
        value.0
    }
}

impl ContextId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContextId {
    fn from(value: &str) -> Self {
        ContextId(value.to_string())
    }
}

impl From<String> for ContextId {
    fn from(value: String) -> Self {
        ContextId(value)
    }
}

impl From<i64> for ContextId {
    fn from(value: i64) -> Self {
        ContextId(value.to_string())
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for one recording session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        SessionId(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle phase of the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No session has been started yet
    Idle,
    /// A session is collecting hosts
    Recording,
    /// The last session finished and handed off its result
    Terminated,
}

/// Parameters for starting a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    /// Address the new browsing context is navigated to
    pub target_address: String,
    /// User supplied exclusion rules (substring patterns)
    pub exclusions: Vec<String>,
    /// Close the tracked context once the page finished loading
    pub close_source_on_finish: bool,
}

impl StartRequest {
    pub fn new(target_address: impl Into<String>) -> Self {
        Self {
            target_address: target_address.into(),
            exclusions: Vec::new(),
            close_source_on_finish: false,
        }
    }

    pub fn with_exclusions(mut self, exclusions: Vec<String>) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn close_source_on_finish(mut self, close: bool) -> Self {
        self.close_source_on_finish = close;
        self
    }
}

/// Snapshot handed to the result sink when a session terminates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub session_id: SessionId,
    /// Context the session was bound to, if it had been created
    pub context_id: Option<ContextId>,
    /// Collected hostnames, sorted ascending
    pub hosts: Vec<String>,
    /// Milliseconds since epoch
    pub finished_at: i64,
}

impl SessionResult {
    pub fn new(session_id: SessionId, context_id: Option<ContextId>, hosts: Vec<String>) -> Self {
        Self {
            session_id,
            context_id,
            hosts,
            finished_at: Utc::now().timestamp_millis(),
        }
    }
}

/// Diagnostic view of the tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub session_id: Option<SessionId>,
    pub context_id: Option<ContextId>,
    /// Number of distinct hosts collected so far
    pub collected: usize,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            session_id: None,
            context_id: None,
            collected: 0,
        }
    }
}
