use crate::models::{BridgeCommand, BridgeEvent, SessionResult};
use crate::session::{HostError, SessionTracker};
use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::BridgeHost;

/// Route one bridge event to the host or the tracker.
pub async fn dispatch_event(
    host: &BridgeHost,
    tracker: &SessionTracker<BridgeHost>,
    event: BridgeEvent,
) {
    match event {
        BridgeEvent::ContextCreated {
            request_id,
            context_id,
        } => host.resolve_created(request_id, context_id),
        BridgeEvent::ContextCreateFailed { request_id, error } => {
            host.resolve_failed(request_id, error)
        }
        BridgeEvent::Request { context_id, url } => {
            tracker.on_network_event(&context_id, &url);
        }
        BridgeEvent::Status { context_id, status } => {
            tracker.on_context_status(&context_id, &status);
        }
        BridgeEvent::Closed { context_id } => {
            host.mark_closed(&context_id);
            tracker.on_context_closed(&context_id).await;
        }
    }
}

/// Read events line by line and dispatch them in arrival order.
///
/// Returns when the input reaches EOF. Lines that are not valid events are
/// logged and skipped.
pub async fn run_event_loop<R>(
    reader: R,
    host: Arc<BridgeHost>,
    tracker: SessionTracker<BridgeHost>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("reading bridge input")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<BridgeEvent>(line) {
            Ok(event) => dispatch_event(&host, &tracker, event).await,
            Err(err) => tracing::warn!("Skipping malformed bridge message {:?}: {}", line, err),
        }
    }
    tracing::info!("Browser bridge input closed");
    host.abandon_pending();
    Ok(())
}

/// Serialize queued commands as JSON lines until the queue is closed.
pub async fn run_writer<W>(
    mut commands: mpsc::UnboundedReceiver<BridgeCommand>,
    mut writer: W,
) -> Result<(), HostError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(command) = commands.recv().await {
        let mut line = serde_json::to_vec(&command)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Wait for the session result while the event loop runs.
///
/// If the bridge input ends first, a session still inside its grace period is
/// finished with what it has collected. Returns `None` when no session result
/// was produced at all.
pub async fn await_session_result(
    results: &mut mpsc::UnboundedReceiver<SessionResult>,
    events: &mut JoinHandle<anyhow::Result<()>>,
    tracker: &SessionTracker<BridgeHost>,
) -> anyhow::Result<Option<SessionResult>> {
    tokio::select! {
        Some(result) = results.recv() => return Ok(Some(result)),
        outcome = &mut *events => outcome??,
    }

    if tracker.finish(true).await {
        tracing::info!("Bridge input ended during the session; keeping collected hosts");
    }
    Ok(results.try_recv().ok())
}
