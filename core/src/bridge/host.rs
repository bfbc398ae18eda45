use crate::models::{BridgeCommand, ContextId};
use crate::session::{BrowserHost, HostError};
use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// How long `create_context` waits for the browser to answer
pub const DEFAULT_CREATE_TIMEOUT: Duration = Duration::from_secs(30);

type PendingCreate = oneshot::Sender<Result<ContextId, String>>;

/// [`BrowserHost`] backed by the JSON-lines bridge.
///
/// Commands are queued on a channel drained by [`run_writer`](super::run_writer);
/// replies and lifecycle events are fed back in by the dispatch loop.
pub struct BridgeHost {
    outbound: Mutex<Option<mpsc::UnboundedSender<BridgeCommand>>>,
    pending: Mutex<HashMap<u64, PendingCreate>>,
    live: Mutex<HashSet<ContextId>>,
    next_request: AtomicU64,
    create_timeout: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BridgeHost {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BridgeCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let host = Self {
            outbound: Mutex::new(Some(tx)),
            pending: Mutex::new(HashMap::new()),
            live: Mutex::new(HashSet::new()),
            next_request: AtomicU64::new(0),
            create_timeout: DEFAULT_CREATE_TIMEOUT,
        };
        (host, rx)
    }

    pub fn with_create_timeout(mut self, timeout: Duration) -> Self {
        self.create_timeout = timeout;
        self
    }

    /// Queue a command for the browser
    pub fn send(&self, command: BridgeCommand) -> Result<(), HostError> {
        let guard = lock(&self.outbound);
        let sender = guard.as_ref().ok_or(HostError::BridgeClosed)?;
        sender.send(command).map_err(|_| HostError::BridgeClosed)
    }

    /// Stop accepting commands; the writer exits once the queue is drained.
    pub fn close(&self) {
        lock(&self.outbound).take();
    }

    pub fn resolve_created(&self, request_id: u64, context_id: ContextId) {
        lock(&self.live).insert(context_id.clone());
        match lock(&self.pending).remove(&request_id) {
            Some(pending) => {
                if pending.send(Ok(context_id)).is_err() {
                    tracing::debug!("Create request {} was abandoned", request_id);
                }
            }
            None => {
                tracing::warn!(
                    "Context {} created for unknown request {}",
                    context_id,
                    request_id
                );
            }
        }
    }

    pub fn resolve_failed(&self, request_id: u64, error: String) {
        match lock(&self.pending).remove(&request_id) {
            Some(pending) => {
                let _ = pending.send(Err(error));
            }
            None => {
                tracing::warn!("Create failure for unknown request {}: {}", request_id, error);
            }
        }
    }

    /// Forget a context the browser reported as destroyed.
    pub fn mark_closed(&self, context_id: &ContextId) -> bool {
        lock(&self.live).remove(context_id)
    }

    pub fn is_live(&self, context_id: &ContextId) -> bool {
        lock(&self.live).contains(context_id)
    }

    /// Fail every outstanding create request with [`HostError::BridgeClosed`].
    pub fn abandon_pending(&self) {
        let dropped = {
            let mut pending = lock(&self.pending);
            let count = pending.len();
            pending.clear();
            count
        };
        if dropped > 0 {
            tracing::warn!("Abandoned {} pending create requests", dropped);
        }
    }
}

impl BrowserHost for BridgeHost {
    fn create_context<'a>(
        &'a self,
        address: &'a str,
    ) -> BoxFuture<'a, Result<ContextId, HostError>> {
        Box::pin(async move {
            let request_id = self.next_request.fetch_add(1, Ordering::SeqCst) + 1;
            let (tx, rx) = oneshot::channel();
            lock(&self.pending).insert(request_id, tx);

            let command = BridgeCommand::CreateContext {
                request_id,
                address: address.to_string(),
            };
            if let Err(err) = self.send(command) {
                lock(&self.pending).remove(&request_id);
                return Err(err);
            }

            match tokio::time::timeout(self.create_timeout, rx).await {
                Ok(Ok(Ok(context_id))) => Ok(context_id),
                Ok(Ok(Err(reason))) => Err(HostError::CreateFailed(reason)),
                Ok(Err(_)) => Err(HostError::BridgeClosed),
                Err(_) => {
                    lock(&self.pending).remove(&request_id);
                    Err(HostError::Timeout)
                }
            }
        })
    }

    fn close_context(&self, context_id: ContextId) -> BoxFuture<'_, Result<(), HostError>> {
        Box::pin(async move {
            if !self.is_live(&context_id) {
                return Err(HostError::ContextGone(context_id));
            }
            self.send(BridgeCommand::CloseContext { context_id })
        })
    }
}
