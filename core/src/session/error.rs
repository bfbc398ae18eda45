//! Errors surfaced by the session layer

use thiserror::Error;

use crate::models::ContextId;

/// Failures reported by a [`BrowserHost`](super::BrowserHost)
#[derive(Debug, Error)]
pub enum HostError {
    #[error("context {0} no longer exists")]
    ContextGone(ContextId),
    #[error("browser refused to create context: {0}")]
    CreateFailed(String),
    #[error("timed out waiting for the browser")]
    Timeout,
    #[error("browser bridge is closed")]
    BridgeClosed,
    #[error("bridge I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bridge protocol error: {0}")]
    Protocol(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("target address is empty")]
    EmptyTarget,
    #[error("could not open a browsing context for {address}: {source}")]
    ContextCreation {
        address: String,
        #[source]
        source: HostError,
    },
}
