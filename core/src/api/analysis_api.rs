//! Analysis API
//!
//! Entry points used by a front end: start an analysis from raw user input,
//! persist what the session produced and re-render it with the user's current
//! output options.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{
    ContextId, Preferences, RenderOptions, SessionId, SessionResult, StartRequest,
};
use crate::rules::{count_rules, render_rules};
use crate::session::{parse_exclusion_text, BrowserHost, SessionError, SessionTracker};
use crate::storage;

/// Initialize logging (call once at startup)
/// `storage_path` is used to store log files in release mode
#[allow(unused_variables)]
pub fn init_core(storage_path: Option<String>) -> Result<bool, String> {
    let level = resolve_log_level();

    #[cfg(debug_assertions)]
    {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .try_init();
    }

    #[cfg(not(debug_assertions))]
    {
        let log_dir = storage_path
            .as_ref()
            .map(|p| PathBuf::from(p).join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"));

        std::fs::create_dir_all(&log_dir).map_err(|e| {
            format!(
                "Failed to create log directory {}: {}",
                log_dir.display(),
                e
            )
        })?;
        let file_appender = tracing_appender::rolling::daily(&log_dir, "domainscope");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Logging lasts until process exit.
        std::mem::forget(guard);

        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(non_blocking)
            .try_init();
    }

    tracing::info!("Domainscope core initialized v{}", crate::VERSION);
    Ok(true)
}

pub fn resolve_log_level() -> tracing::level_filters::LevelFilter {
    use tracing::level_filters::LevelFilter;

    match std::env::var("RUST_LOG") {
        Ok(val) => match val.to_lowercase().as_str() {
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "info" => LevelFilter::INFO,
            "warn" | "warning" => LevelFilter::WARN,
            "error" => LevelFilter::ERROR,
            _ => LevelFilter::INFO,
        },
        Err(_) => LevelFilter::INFO,
    }
}

/// Platform data directory for the store, or `./domainscope_data`
pub fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("domainscope"))
        .unwrap_or_else(|| PathBuf::from("./domainscope_data"))
}

/// Raw input as collected from the user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub url: String,
    /// Exclusion rules, one per line
    pub exclusion_text: String,
    pub auto_close: bool,
}

impl AnalysisInput {
    /// Pre-fill from saved preferences
    pub fn from_preferences(prefs: &Preferences) -> Self {
        Self {
            url: prefs.last_url.clone().unwrap_or_default(),
            exclusion_text: prefs.saved_exclusions.clone(),
            auto_close: prefs.auto_close_source,
        }
    }
}

/// Validate input, remember it for next time and start a session.
///
/// An empty address is rejected before anything is saved or started.
pub async fn start_analysis<H: BrowserHost>(
    tracker: &SessionTracker<H>,
    input: AnalysisInput,
) -> Result<SessionId, String> {
    let url = input.url.trim().to_string();
    if url.is_empty() {
        return Err(SessionError::EmptyTarget.to_string());
    }
    let exclusion_text = input.exclusion_text.trim().to_string();
    let exclusions = parse_exclusion_text(&exclusion_text);

    // Remembering the input never blocks the session from starting.
    if storage::is_initialized() {
        match storage::load_preferences().await {
            Ok(mut prefs) => {
                prefs.last_url = Some(url.clone());
                prefs.saved_exclusions = exclusion_text;
                prefs.auto_close_source = input.auto_close;
                if let Err(e) = storage::save_preferences(&prefs).await {
                    tracing::warn!("Failed to save analysis preferences: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to load preferences, input not saved: {}", e),
        }
    }

    let request = StartRequest::new(url)
        .with_exclusions(exclusions)
        .close_source_on_finish(input.auto_close);
    tracker.start(request).await.map_err(|e| e.to_string())
}

/// Store a finished session so it can be rendered later
pub async fn record_result(result: &SessionResult) -> Result<(), String> {
    storage::persist_result(result)
        .await
        .map_err(|e| e.to_string())
}

/// Text ready for display or copying
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedResult {
    pub context_id: Option<ContextId>,
    pub host_count: usize,
    pub rule_count: usize,
    pub text: String,
}

impl RenderedResult {
    pub fn is_empty(&self) -> bool {
        self.host_count == 0
    }
}

/// Render a host list with the given options.
pub fn render_hosts(
    hosts: &[String],
    context_id: Option<ContextId>,
    options: &RenderOptions,
) -> RenderedResult {
    let text = render_rules(hosts, options);
    RenderedResult {
        context_id,
        host_count: hosts.len(),
        rule_count: count_rules(&text),
        text,
    }
}

/// Render the last stored result.
///
/// Without explicit options the saved toggles are used. Nothing stored yet
/// renders as an empty result.
pub async fn render_last_result(options: Option<RenderOptions>) -> Result<RenderedResult, String> {
    let options = match options {
        Some(options) => options,
        None => load_render_options().await?,
    };
    let last = storage::last_result().await.map_err(|e| e.to_string())?;
    let (hosts, context_id) = match last {
        Some(stored) => (stored.hosts, stored.context_id),
        None => (Vec::new(), None),
    };
    Ok(render_hosts(&hosts, context_id, &options))
}

pub async fn load_preferences() -> Result<Preferences, String> {
    storage::load_preferences().await.map_err(|e| e.to_string())
}

pub async fn load_render_options() -> Result<RenderOptions, String> {
    load_preferences()
        .await
        .map(|prefs| RenderOptions::from(&prefs))
}

/// Remember output toggles so the next render starts from them
pub async fn save_render_options(options: &RenderOptions) -> Result<(), String> {
    let mut prefs = load_preferences().await?;
    prefs.use_wildcard = options.wildcard;
    prefs.use_proxy_rule_mode = options.mode == crate::models::OutputMode::ProxyRule;
    prefs.policy_suffix = options.policy.clone().unwrap_or_default();
    storage::save_preferences(&prefs)
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OutputMode, SessionPhase};
    use crate::session::{HostError, ResultSink};
    use futures::future::BoxFuture;
    use serial_test::serial;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    struct StaticHost;

    impl BrowserHost for StaticHost {
        fn create_context<'a>(
            &'a self,
            _address: &'a str,
        ) -> BoxFuture<'a, Result<ContextId, HostError>> {
            Box::pin(async { Ok(ContextId::from(1)) })
        }

        fn close_context(&self, context_id: ContextId) -> BoxFuture<'_, Result<(), HostError>> {
            Box::pin(async move { Err(HostError::ContextGone(context_id)) })
        }
    }

    #[derive(Default)]
    struct Results(Mutex<Vec<SessionResult>>);

    impl ResultSink for Results {
        fn deliver(&self, result: SessionResult) {
            self.0.lock().unwrap().push(result);
        }
    }

    fn tracker() -> (SessionTracker<StaticHost>, Arc<Results>) {
        let sink = Arc::new(Results::default());
        (SessionTracker::new(Arc::new(StaticHost), sink.clone()), sink)
    }

    #[tokio::test]
    #[serial]
    async fn empty_url_is_rejected() {
        let dir = tempdir().unwrap();
        storage::reset_store_for_tests(dir.path()).unwrap();
        let (tracker, _sink) = tracker();

        let err = start_analysis(
            &tracker,
            AnalysisInput {
                url: "   ".to_string(),
                ..AnalysisInput::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err, "target address is empty");
        assert_eq!(tracker.status().phase, SessionPhase::Idle);
        assert_eq!(load_preferences().await.unwrap(), Preferences::default());
    }

    #[tokio::test]
    #[serial]
    async fn start_saves_input_and_applies_exclusions() {
        let dir = tempdir().unwrap();
        storage::reset_store_for_tests(dir.path()).unwrap();
        let (tracker, sink) = tracker();

        start_analysis(
            &tracker,
            AnalysisInput {
                url: " https://x.test ".to_string(),
                exclusion_text: "ads\n\n  cdn \n".to_string(),
                auto_close: false,
            },
        )
        .await
        .unwrap();

        let prefs = load_preferences().await.unwrap();
        assert_eq!(prefs.last_url.as_deref(), Some("https://x.test"));
        assert_eq!(prefs.saved_exclusions, "ads\n\n  cdn");
        assert!(!prefs.auto_close_source);

        let ctx = ContextId::from(1);
        tracker.on_network_event(&ctx, "https://ads.x.test/");
        tracker.on_network_event(&ctx, "https://cdn.x.test/");
        tracker.on_network_event(&ctx, "https://www.x.test/");
        tracker.finish(false).await;
        assert_eq!(sink.0.lock().unwrap()[0].hosts, vec!["www.x.test"]);
    }

    #[tokio::test]
    #[serial]
    async fn unreadable_preferences_do_not_block_start() {
        let dir = tempdir().unwrap();
        storage::reset_store_for_tests(dir.path()).unwrap();
        {
            let conn = rusqlite::Connection::open(dir.path().join("domainscope.sqlite")).unwrap();
            conn.execute(
                "INSERT INTO preferences (key, value, updated_at) VALUES ('useWildcard', '\"yes\"', 0)",
                [],
            )
            .unwrap();
        }
        assert!(load_preferences().await.is_err());
        let (tracker, sink) = tracker();

        start_analysis(
            &tracker,
            AnalysisInput {
                url: "https://x.test".to_string(),
                ..AnalysisInput::default()
            },
        )
        .await
        .unwrap();
        assert!(tracker.is_recording());

        tracker.on_network_event(&ContextId::from(1), "https://a.x.test/");
        tracker.finish(false).await;
        assert_eq!(sink.0.lock().unwrap()[0].hosts, vec!["a.x.test"]);
    }

    #[tokio::test]
    #[serial]
    async fn last_result_renders_with_saved_toggles() {
        let dir = tempdir().unwrap();
        storage::reset_store_for_tests(dir.path()).unwrap();

        let empty = render_last_result(None).await.unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.text, "");
        assert_eq!(empty.rule_count, 0);

        let result = SessionResult::new(
            SessionId::generate(),
            Some(ContextId::from(4)),
            vec![
                "a.test.com".to_string(),
                "b.test.com".to_string(),
                "shop.io".to_string(),
            ],
        );
        record_result(&result).await.unwrap();

        let plain = render_last_result(None).await.unwrap();
        assert_eq!(plain.text, "*.test.com\nshop.io");
        assert_eq!(plain.host_count, 3);
        assert_eq!(plain.rule_count, 2);

        save_render_options(&RenderOptions {
            wildcard: true,
            mode: OutputMode::ProxyRule,
            policy: Some("DIRECT".to_string()),
        })
        .await
        .unwrap();
        let proxy = render_last_result(None).await.unwrap();
        assert_eq!(proxy.text, "DOMAIN-SUFFIX,test.com,DIRECT\nDOMAIN,shop.io,DIRECT");
        assert_eq!(proxy.context_id, Some(ContextId::from(4)));

        let verbatim = render_last_result(Some(RenderOptions {
            wildcard: false,
            ..RenderOptions::default()
        }))
        .await
        .unwrap();
        assert_eq!(verbatim.text, "a.test.com\nb.test.com\nshop.io");
    }

    #[test]
    fn init_core_tolerates_repeated_calls() {
        let dir = tempdir().unwrap();
        let path = Some(dir.path().to_string_lossy().to_string());
        assert_eq!(init_core(path.clone()), Ok(true));
        assert_eq!(init_core(path), Ok(true));
    }

    #[test]
    fn input_prefills_from_preferences() {
        let prefs = Preferences {
            last_url: Some("https://x.test".to_string()),
            saved_exclusions: "ads".to_string(),
            ..Preferences::default()
        };
        let input = AnalysisInput::from_preferences(&prefs);
        assert_eq!(input.url, "https://x.test");
        assert_eq!(input.exclusion_text, "ads");
        assert!(input.auto_close);
    }
}
