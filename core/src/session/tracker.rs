//! Session tracker
//!
//! Owns the single active session and drives it through
//! `Idle -> Recording -> Terminated`. Network and page lifecycle events are
//! only honoured while the session is recording and only for the tracked
//! context. Termination goes through [`SessionTracker::finish`], which flips
//! the active flag under the lock, so a grace-period finish and a
//! closure-triggered finish can race without producing two results.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use url::Url;

use super::{BrowserHost, DomainCollector, ExclusionMatcher, ResultSink, SessionError};
use crate::models::{
    ContextId, SessionId, SessionPhase, SessionResult, SessionStatus, StartRequest,
    STATUS_COMPLETE,
};

/// Delay between a page finishing its load and the session ending
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Time allowed for late requests after a load completes
    pub grace_period: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

struct Session {
    id: SessionId,
    tracked_context: Option<ContextId>,
    is_active: bool,
    exclusions: ExclusionMatcher,
    collector: DomainCollector,
    close_source_on_finish: bool,
}

impl Session {
    fn new(request: &StartRequest) -> Self {
        Self {
            id: SessionId::generate(),
            tracked_context: None,
            is_active: true,
            exclusions: ExclusionMatcher::new(request.exclusions.clone()),
            collector: DomainCollector::new(),
            close_source_on_finish: request.close_source_on_finish,
        }
    }

    fn is_tracking(&self, context_id: &ContextId) -> bool {
        self.is_active && self.tracked_context.as_ref() == Some(context_id)
    }
}

/// Splits a request URL into `(hostname, "scheme://")`.
pub fn parse_request_url(request_url: &str) -> Result<(String, String), url::ParseError> {
    let url = Url::parse(request_url)?;
    let hostname = url.host_str().unwrap_or_default().to_string();
    let protocol = format!("{}://", url.scheme());
    Ok((hostname, protocol))
}

pub struct SessionTracker<H: BrowserHost> {
    session: Arc<Mutex<Option<Session>>>,
    host: Arc<H>,
    sink: Arc<dyn ResultSink>,
    config: TrackerConfig,
}

impl<H: BrowserHost> Clone for SessionTracker<H> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            host: Arc::clone(&self.host),
            sink: Arc::clone(&self.sink),
            config: self.config.clone(),
        }
    }
}

impl<H: BrowserHost> SessionTracker<H> {
    pub fn new(host: Arc<H>, sink: Arc<dyn ResultSink>) -> Self {
        Self::with_config(host, sink, TrackerConfig::default())
    }

    pub fn with_config(host: Arc<H>, sink: Arc<dyn ResultSink>, config: TrackerConfig) -> Self {
        Self {
            session: Arc::new(Mutex::new(None)),
            host,
            sink,
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin a new session, discarding whatever session came before it.
    ///
    /// The session is recording as soon as this is called; the context id is
    /// attached once the host has created the context. If creation fails the
    /// session is terminated without a result.
    pub async fn start(&self, request: StartRequest) -> Result<SessionId, SessionError> {
        let session = Session::new(&request);
        let session_id = session.id.clone();
        {
            let mut guard = self.lock();
            if let Some(previous) = guard.replace(session) {
                if previous.is_active {
                    tracing::info!(
                        "Discarding session {} ({} hosts) in favour of a new one",
                        previous.id,
                        previous.collector.len()
                    );
                }
            }
        }

        tracing::info!(
            "Session {} started for {} (exclusions={:?}, close_source_on_finish={})",
            session_id,
            request.target_address,
            request.exclusions,
            request.close_source_on_finish
        );

        let created = self.host.create_context(&request.target_address).await;
        match created {
            Ok(context_id) => {
                let mut guard = self.lock();
                match guard.as_mut() {
                    Some(session) if session.id == session_id && session.is_active => {
                        tracing::debug!("Session {} tracking context {}", session_id, context_id);
                        session.tracked_context = Some(context_id);
                    }
                    _ => {
                        tracing::debug!(
                            "Session {} ended before context {} was attached",
                            session_id,
                            context_id
                        );
                    }
                }
                Ok(session_id)
            }
            Err(source) => {
                if let Some(session) = self.lock().as_mut().filter(|s| s.id == session_id) {
                    session.is_active = false;
                }
                tracing::error!(
                    "Session {} could not open {}: {}",
                    session_id,
                    request.target_address,
                    source
                );
                Err(SessionError::ContextCreation {
                    address: request.target_address,
                    source,
                })
            }
        }
    }

    /// Record the host of a request issued by `context_id`.
    ///
    /// Returns true when a new hostname was added.
    pub fn on_network_event(&self, context_id: &ContextId, request_url: &str) -> bool {
        let mut guard = self.lock();
        let Some(session) = guard.as_mut().filter(|s| s.is_tracking(context_id)) else {
            return false;
        };

        let (hostname, protocol) = match parse_request_url(request_url) {
            Ok(parts) => parts,
            Err(err) => {
                tracing::warn!("Ignoring unparsable request URL {:?}: {}", request_url, err);
                return false;
            }
        };

        if hostname.is_empty() {
            return false;
        }
        if session.exclusions.is_excluded(&hostname, &protocol) {
            tracing::trace!("Excluded {}{}", protocol, hostname);
            return false;
        }

        let added = session.collector.add(&hostname);
        if added {
            tracing::debug!("Session {} collected {}", session.id, hostname);
        }
        added
    }

    /// Page lifecycle notification; only `complete` is acted upon.
    pub fn on_context_status(&self, context_id: &ContextId, status: &str) -> Option<JoinHandle<()>> {
        if status == STATUS_COMPLETE {
            self.on_context_load_complete(context_id)
        } else {
            None
        }
    }

    /// Schedule a finish after the grace period.
    ///
    /// Every matching load schedules its own finish; whichever fires first
    /// ends the session and the rest do nothing. The deferred finish is bound
    /// to the current session and will not end a session started later.
    pub fn on_context_load_complete(&self, context_id: &ContextId) -> Option<JoinHandle<()>> {
        let session_id = {
            let guard = self.lock();
            guard
                .as_ref()
                .filter(|s| s.is_tracking(context_id))
                .map(|s| s.id.clone())?
        };

        let grace = self.config.grace_period;
        tracing::debug!(
            "Context {} finished loading; session {} ends in {:?}",
            context_id,
            session_id,
            grace
        );

        let tracker = self.clone();
        Some(tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            tracker.finish_session(&session_id, false).await;
        }))
    }

    /// The tracked context went away; finish immediately.
    pub async fn on_context_closed(&self, context_id: &ContextId) {
        let session_id = {
            let guard = self.lock();
            match guard.as_ref().filter(|s| s.is_tracking(context_id)) {
                Some(session) => session.id.clone(),
                None => return,
            }
        };
        tracing::info!("Tracked context {} was closed", context_id);
        self.finish_session(&session_id, true).await;
    }

    /// Terminate the current session if it is still recording.
    ///
    /// Returns false when there was nothing to finish.
    pub async fn finish(&self, from_closure: bool) -> bool {
        let session_id = match self.lock().as_ref() {
            Some(session) => session.id.clone(),
            None => return false,
        };
        self.finish_session(&session_id, from_closure).await
    }

    async fn finish_session(&self, session_id: &SessionId, from_closure: bool) -> bool {
        let (result, close_target) = {
            let mut guard = self.lock();
            let Some(session) = guard.as_mut() else {
                return false;
            };
            if session.id != *session_id || !session.is_active {
                return false;
            }
            session.is_active = false;

            let result = SessionResult::new(
                session.id.clone(),
                session.tracked_context.clone(),
                session.collector.snapshot(),
            );
            let close_target = if session.close_source_on_finish && !from_closure {
                session.tracked_context.clone()
            } else {
                None
            };
            (result, close_target)
        };

        tracing::info!(
            "Session {} finished with {} hosts (from_closure={})",
            result.session_id,
            result.hosts.len(),
            from_closure
        );
        self.sink.deliver(result);

        if let Some(context_id) = close_target {
            // Best effort: the context may already be gone.
            if let Err(err) = self.host.close_context(context_id.clone()).await {
                tracing::debug!("Not closing source context {}: {}", context_id, err);
            }
        }
        true
    }

    pub fn status(&self) -> SessionStatus {
        match self.lock().as_ref() {
            None => SessionStatus::default(),
            Some(session) => SessionStatus {
                phase: if session.is_active {
                    SessionPhase::Recording
                } else {
                    SessionPhase::Terminated
                },
                session_id: Some(session.id.clone()),
                context_id: session.tracked_context.clone(),
                collected: session.collector.len(),
            },
        }
    }

    pub fn is_recording(&self) -> bool {
        self.lock().as_ref().is_some_and(|s| s.is_active)
    }

    pub fn tracked_context(&self) -> Option<ContextId> {
        self.lock()
            .as_ref()
            .filter(|s| s.is_active)
            .and_then(|s| s.tracked_context.clone())
    }
}
