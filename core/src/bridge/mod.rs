//! Browser bridge
//!
//! Connects the session tracker to an external process that drives the
//! browser, speaking newline-delimited JSON (see [`crate::models::protocol`]).

mod dispatch;
mod host;

pub use dispatch::{await_session_result, dispatch_event, run_event_loop, run_writer};
pub use host::{BridgeHost, DEFAULT_CREATE_TIMEOUT};
