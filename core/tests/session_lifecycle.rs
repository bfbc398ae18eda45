use std::sync::{Arc, Mutex};
use std::time::Duration;

use domainscope_core::models::{ContextId, OutputMode, RenderOptions, SessionResult, StartRequest};
use domainscope_core::rules::render_rules;
use domainscope_core::session::{BrowserHost, HostError, ResultSink, SessionTracker};
use futures::future::BoxFuture;

#[derive(Default)]
struct ScriptedHost {
    opened: Mutex<Vec<String>>,
    closed: Mutex<Vec<ContextId>>,
}

impl BrowserHost for ScriptedHost {
    fn create_context<'a>(
        &'a self,
        address: &'a str,
    ) -> BoxFuture<'a, Result<ContextId, HostError>> {
        Box::pin(async move {
            let mut opened = self.opened.lock().unwrap();
            opened.push(address.to_string());
            Ok(ContextId::from(opened.len() as i64 + 100))
        })
    }

    fn close_context(&self, context_id: ContextId) -> BoxFuture<'_, Result<(), HostError>> {
        Box::pin(async move {
            self.closed.lock().unwrap().push(context_id);
            Ok(())
        })
    }
}

#[derive(Default)]
struct Handoff(Mutex<Vec<SessionResult>>);

impl ResultSink for Handoff {
    fn deliver(&self, result: SessionResult) {
        self.0.lock().unwrap().push(result);
    }
}

#[tokio::test(start_paused = true)]
async fn records_session_and_renders_rules() {
    let host = Arc::new(ScriptedHost::default());
    let handoff = Arc::new(Handoff::default());
    let tracker = SessionTracker::new(host.clone(), handoff.clone());

    tracker
        .start(StartRequest::new("https://x.test"))
        .await
        .expect("session starts");
    assert_eq!(*host.opened.lock().unwrap(), vec!["https://x.test"]);
    let ctx = tracker.tracked_context().expect("context tracked");

    tracker.on_network_event(&ctx, "https://b.x.test/q");
    tracker.on_network_event(&ctx, "https://a.x.test/p");
    tracker.on_network_event(&ctx, "chrome-extension://abc/page");
    tracker.on_network_event(&ContextId::from(1), "https://unrelated.test/");

    let deferred = tracker
        .on_context_status(&ctx, "complete")
        .expect("finish scheduled");
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(handoff.0.lock().unwrap().is_empty());
    deferred.await.unwrap();

    let results = handoff.0.lock().unwrap().clone();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].hosts, vec!["a.x.test", "b.x.test"]);
    assert_eq!(results[0].context_id, Some(ctx));
    assert!(host.closed.lock().unwrap().is_empty());

    let options = RenderOptions {
        wildcard: true,
        mode: OutputMode::ProxyRule,
        policy: Some("DIRECT".to_string()),
    };
    assert_eq!(
        render_rules(&results[0].hosts, &options),
        "DOMAIN-SUFFIX,x.test,DIRECT"
    );
}

#[tokio::test(start_paused = true)]
async fn grace_timer_and_closure_produce_one_result() {
    let host = Arc::new(ScriptedHost::default());
    let handoff = Arc::new(Handoff::default());
    let tracker = SessionTracker::new(host.clone(), handoff.clone());

    tracker
        .start(StartRequest::new("https://x.test").close_source_on_finish(true))
        .await
        .unwrap();
    let ctx = tracker.tracked_context().unwrap();
    tracker.on_network_event(&ctx, "https://x.test/");

    let deferred = tracker.on_context_load_complete(&ctx).unwrap();
    deferred.await.unwrap();
    tracker.on_context_closed(&ctx).await;
    assert!(!tracker.finish(true).await);

    assert_eq!(handoff.0.lock().unwrap().len(), 1);
    assert_eq!(*host.closed.lock().unwrap(), vec![ctx]);
}
