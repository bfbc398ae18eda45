//! Browser bridge protocol
//!
//! Newline-delimited JSON exchanged with the process that drives the
//! browser. Events flow in, commands flow out.

use serde::{Deserialize, Serialize};

use super::ContextId;

/// Page status that marks a finished load
pub const STATUS_COMPLETE: &str = "complete";

/// Inbound notification from the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BridgeEvent {
    /// Reply to [`BridgeCommand::CreateContext`]
    ContextCreated { request_id: u64, context_id: ContextId },
    /// Negative reply to [`BridgeCommand::CreateContext`]
    ContextCreateFailed { request_id: u64, error: String },
    /// A network request was issued by a context
    Request { context_id: ContextId, url: String },
    /// Page lifecycle change (`loading`, `complete`, ...)
    Status { context_id: ContextId, status: String },
    /// A context was destroyed
    Closed { context_id: ContextId },
}

/// Outbound command to the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BridgeCommand {
    CreateContext { request_id: u64, address: String },
    CloseContext { context_id: ContextId },
    /// Final rule list of a session
    Result {
        context_id: Option<ContextId>,
        hosts: Vec<String>,
        text: String,
    },
}
