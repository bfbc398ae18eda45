//! Collaborator contracts
//!
//! The tracker never talks to a browser directly. Whatever embeds it supplies
//! a [`BrowserHost`] for opening and closing contexts and a [`ResultSink`]
//! that receives the finished host list.

use futures::future::BoxFuture;
use tokio::sync::mpsc;

use super::HostError;
use crate::models::{ContextId, SessionResult};

pub trait BrowserHost: Send + Sync + 'static {
    /// Open a new browsing context navigated to `address`.
    fn create_context<'a>(&'a self, address: &'a str)
        -> BoxFuture<'a, Result<ContextId, HostError>>;

    /// Ask the browser to close a context. Fails with
    /// [`HostError::ContextGone`] if the context no longer exists.
    fn close_context(&self, context_id: ContextId) -> BoxFuture<'_, Result<(), HostError>>;
}

/// Receives exactly one result per terminated session
pub trait ResultSink: Send + Sync + 'static {
    fn deliver(&self, result: SessionResult);
}

impl ResultSink for mpsc::UnboundedSender<SessionResult> {
    fn deliver(&self, result: SessionResult) {
        if let Err(err) = self.send(result) {
            tracing::warn!(
                "Result receiver dropped; discarding result of session {}",
                err.0.session_id
            );
        }
    }
}
